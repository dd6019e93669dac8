// Copyright (C) 2017 Jesse Jones
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 3, or (at your option)
// any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program; if not, write to the Free Software Foundation,
// Inc., 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301, USA.
//! A bank with a few tellers and customers who give up if they have to wait
//! too long. Customers arrive at random, request a teller but renege once
//! their patience runs out, and are served for a random amount of time.
#[macro_use]
extern crate clap;
#[macro_use]
extern crate simkern;

use clap::{App, ArgMatches};
use rand::Rng;
use simkern::*;
use std::cell::RefCell;
use std::fmt::Display;
use std::io::{Write, stderr};
use std::process;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Clone)]
struct LocalConfig
{
	num_customers: u32,
	num_tellers: usize,
	mean_arrival: f64,	// seconds
	mean_patience: f64,
	mean_service: f64,
}

impl LocalConfig
{
	fn new() -> LocalConfig
	{
		// These are the defaults: all of them can be overriden using command line options.
		LocalConfig {
			num_customers: 20,
			num_tellers: 1,
			mean_arrival: 60.0,
			mean_patience: 120.0,
			mean_service: 90.0,
		}
	}
}

#[derive(Default)]
struct Stats
{
	served: u32,
	reneged: u32,
	waits: Vec<i64>,
}

fn fatal_err(message: &str) -> !
{
	let _ = writeln!(&mut stderr(), "{}", message);
	process::exit(1);
}

// Min and max are inclusive.
fn match_num<T>(matches: &ArgMatches, name: &str, min: T, max: T) -> T
		where T: Copy + Display + FromStr + PartialOrd
{
	match value_t!(matches.value_of(name), T) {
		Ok(value) if value < min => fatal_err(&format!("--{} should be greater than {}", name, min)),
		Ok(value) if value > max => fatal_err(&format!("--{} should be less than {}", name, max)),
		Ok(value) => value,
		_ => fatal_err(&format!("--{} should be a number", name)),
	}
}

fn exponential<R: Rng>(rng: &mut R, mean: f64) -> i64
{
	let u: f64 = rng.gen();
	(-mean*(1.0 - u).ln()).round() as i64
}

enum CustomerState
{
	Arriving,
	Waiting,
	Served,
	Leaving,
}

struct Customer
{
	teller: ResourceId,
	patience: i64,
	service: i64,
	arrived: Time,
	state: CustomerState,
	stats: Rc<RefCell<Stats>>,
}

impl Computation for Customer
{
	fn resume(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>
	{
		match self.state {
			CustomerState::Arriving => {
				self.arrived = ctx.now();
				log_debug!(ctx, "arrived, will wait at most {}s", self.patience);
				self.state = CustomerState::Waiting;
				Ok(Some(Command::renege(Request::new(self.teller), Renege::Hold(self.patience))))
			},
			CustomerState::Waiting => {
				let waited = ctx.now().since(self.arrived);
				if ctx.acquired(self.teller)? {
					log_info!(ctx, "served after waiting {}s", waited);
					let mut stats = self.stats.borrow_mut();
					stats.served += 1;
					stats.waits.push(waited);
					self.state = CustomerState::Served;
					Ok(Some(Command::hold(self.service)))
				} else {
					log_info!(ctx, "reneged after waiting {}s", waited);
					self.stats.borrow_mut().reneged += 1;
					Ok(None)
				}
			},
			CustomerState::Served => {
				self.state = CustomerState::Leaving;
				Ok(Some(Command::release(self.teller)))
			},
			CustomerState::Leaving => {
				log_debug!(ctx, "leaving");
				Ok(None)
			},
		}
	}
}

fn create_sim(local: LocalConfig, config: Config, stats: Rc<RefCell<Stats>>) -> Simulation
{
	let mut sim = Simulation::new(config);
	let teller = sim.add_resource(Resource::new("tellers", local.num_tellers));

	let mut count = 0;
	let result = sim.spawn("source", move |ctx: &mut Context| -> SimResult<Option<Command>> {
		if count == local.num_customers {
			return Ok(None);
		}
		count += 1;

		let patience = exponential(ctx.rng(), local.mean_patience);
		let service = exponential(ctx.rng(), local.mean_service);
		let customer = Customer {
			teller,
			patience,
			service,
			arrived: Time::ZERO,
			state: CustomerState::Arriving,
			stats: stats.clone(),
		};
		ctx.spawn(&format!("customer{:02}", count), customer)?;

		let delay = exponential(ctx.rng(), local.mean_arrival);
		Ok(Some(Command::hold(delay)))
	});
	if let Err(e) = result {
		fatal_err(&e.to_string());
	}

	sim
}

fn parse_options() -> (LocalConfig, Config)
{
	let mut local = LocalConfig::new();
	let mut config = Config::new();

	// see https://docs.rs/clap/2.34.0/clap/struct.Arg.html#method.from_usage for syntax
	let usage = format!(
		"--arrival=[SECS] 'Mean time between customer arrivals [{default_arrival}]'
		--customers=[N] 'Number of customers to generate [{default_customers}]'
		--log=[LEVEL:GLOB]... 'Overrides --log-level, glob is used to match process names'
		--log-level=[LEVEL] 'Default log level: {log_levels} [{default_level}]'
		--max-time=[TIME] 'Maximum time to run the simulation, use {time_suffixes} suffixes [no limit]'
		--no-colors 'Don't color code console output'
		--patience=[SECS] 'Mean time customers are willing to wait [{default_patience}]'
		--seed=[N] 'Random number generator seed [random]'
		--tellers=[N] 'Number of tellers [{default_tellers}]'",
		default_arrival = local.mean_arrival,
		default_customers = local.num_customers,
		default_patience = local.mean_patience,
		default_tellers = local.num_tellers,
		default_level = format!("{:?}", config.log_level).to_lowercase(),
		log_levels = log_levels(),
		time_suffixes = time_suffixes());

	let matches = App::new("bank")
		.version("1.0")
		.about("Simulates a bank with impatient customers.")
		.args_from_usage(&usage)
	.get_matches();

	if matches.is_present("arrival") {
		local.mean_arrival = match_num(&matches, "arrival", 1.0, 10_000.0);
	}

	if matches.is_present("customers") {
		local.num_customers = match_num(&matches, "customers", 1, 100_000);
	}

	if matches.is_present("patience") {
		local.mean_patience = match_num(&matches, "patience", 0.0, 10_000.0);
	}

	if matches.is_present("tellers") {
		local.num_tellers = match_num(&matches, "tellers", 1, 100);
	}

	if matches.is_present("seed") {
		config.seed = match_num(&matches, "seed", 1, u64::max_value());
	}

	if let Some(level) = matches.value_of("log-level") {
		if let Some(e) = config.parse_log_level(level) {
			fatal_err(&e);
		}
	}

	if let Some(values) = matches.values_of("log") {
		if let Some(e) = config.parse_log_levels(values.collect()) {
			fatal_err(&e);
		}
	}

	let max_time = matches.value_of("max-time").unwrap_or("");
	if !max_time.is_empty() {
		if let Some(e) = config.parse_max_time(max_time) {
			fatal_err(&e);
		}
	}

	config.colorize = !matches.is_present("no-colors");

	(local, config)
}

fn main()
{
	let (local, config) = parse_options();
	let stats = Rc::new(RefCell::new(Stats::default()));

	let mut sim = create_sim(local, config, stats.clone());
	let status = match sim.run() {
		Ok(status) => status,
		Err(e) => fatal_err(&e.to_string()),
	};

	let stats = stats.borrow();
	let mean_wait = if stats.waits.is_empty() {0.0} else {stats.waits.iter().sum::<i64>() as f64/stats.waits.len() as f64};
	log_info!(sim, "{}", status);
	log_info!(sim, "served {} customers (mean wait {:.1}s), {} reneged", stats.served, mean_wait, stats.reneged);
}
