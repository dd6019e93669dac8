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
//! A workshop with machines that make parts and occasionally break down. A
//! single repairman fixes broken machines. When nothing is broken he works on
//! less important jobs which are preempted as soon as a machine breaks.
#[macro_use]
extern crate clap;
#[macro_use]
extern crate simkern;

use clap::{App, ArgMatches};
use rand::Rng;
use simkern::*;
use std::cell::{Cell, RefCell};
use std::fmt::Display;
use std::io::{Write, stderr};
use std::process;
use std::rc::Rc;
use std::str::FromStr;

const REPAIR_PRIORITY: Priority = 1;
const OTHER_JOB_PRIORITY: Priority = 0;

#[derive(Clone)]
struct LocalConfig
{
	num_machines: usize,
	mean_part_time: f64,	// seconds
	mean_failure_time: f64,
	repair_time: i64,
	job_time: i64,
}

impl LocalConfig
{
	fn new() -> LocalConfig
	{
		// These are the defaults: all of them can be overriden using command line options.
		LocalConfig {
			num_machines: 10,
			mean_part_time: 600.0,
			mean_failure_time: 18_000.0,
			repair_time: 1_800,
			job_time: 1_800,
		}
	}
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
	1 + (-mean*(1.0 - u).ln()).round() as i64
}

enum MachineState
{
	Idle,
	Working,
	WaitingForRepair,
	Repairing,
	Repaired,
}

struct Machine
{
	repairman: ResourceId,
	state: MachineState,
	left: i64,	// time left on the current part
	broken: Rc<Cell<bool>>,
	parts: Rc<RefCell<Vec<u32>>>,
	number: usize,
	local: LocalConfig,
}

impl Machine
{
	fn next_part(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>
	{
		self.left = exponential(ctx.rng(), self.local.mean_part_time);
		self.state = MachineState::Working;
		Ok(Some(Command::hold(self.left)))
	}
}

impl Computation for Machine
{
	fn resume(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>
	{
		match self.state {
			MachineState::Idle => self.next_part(ctx),
			MachineState::Working if ctx.interrupted() => {
				self.left = ctx.interrupt_left().unwrap_or(0);
				ctx.interrupt_reset();
				self.broken.set(true);
				log_info!(ctx, "broke down with {}s left on the part", self.left);
				self.state = MachineState::WaitingForRepair;
				Ok(Some(Request::new(self.repairman).with_priority(REPAIR_PRIORITY).into()))
			},
			MachineState::Working => {
				self.parts.borrow_mut()[self.number] += 1;
				log_debug!(ctx, "made a part");
				self.next_part(ctx)
			},
			MachineState::WaitingForRepair => {
				self.state = MachineState::Repairing;
				Ok(Some(Command::hold(self.local.repair_time)))
			},
			MachineState::Repairing => {
				self.state = MachineState::Repaired;
				Ok(Some(Command::release(self.repairman)))
			},
			MachineState::Repaired => {
				self.broken.set(false);
				log_info!(ctx, "repaired");
				self.state = MachineState::Working;
				Ok(Some(Command::hold(self.left)))
			},
		}
	}
}

fn create_sim(local: LocalConfig, config: Config, parts: Rc<RefCell<Vec<u32>>>, jobs: Rc<Cell<u32>>) -> SimResult<Simulation>
{
	let mut sim = Simulation::new(config);
	let repairman = sim.add_resource(Resource::new("repairman", 1)
		.with_discipline(Discipline::Priority)
		.preemptable());

	for number in 0..local.num_machines {
		let broken = Rc::new(Cell::new(false));
		let machine = sim.spawn(&format!("machine{}", number), Machine {
			repairman,
			state: MachineState::Idle,
			left: 0,
			broken: broken.clone(),
			parts: parts.clone(),
			number,
			local: local.clone(),
		})?;

		// Breaks the machine down every so often (unless it's already broken).
		let mean_failure_time = local.mean_failure_time;
		let mut started = false;
		sim.spawn(&format!("breaker{}", number), move |ctx: &mut Context| -> SimResult<Option<Command>> {
			if started && !broken.get() {
				ctx.interrupt(machine)?;
			}
			started = true;
			Ok(Some(Command::hold(exponential(ctx.rng(), mean_failure_time))))
		})?;
	}

	// Less important work that the repairman does when nothing is broken.
	// Each job is a request, a hold, and a release.
	let job_time = local.job_time;
	let mut step = 0;
	sim.spawn("other jobs", move |_: &mut Context| -> SimResult<Option<Command>> {
		step = (step + 1) % 3;
		match step {
			1 => Ok(Some(Request::new(repairman).with_priority(OTHER_JOB_PRIORITY).into())),
			2 => Ok(Some(Command::hold(job_time))),
			_ => {
				jobs.set(jobs.get() + 1);
				Ok(Some(Command::release(repairman)))
			},
		}
	})?;

	Ok(sim)
}

fn parse_options() -> (LocalConfig, Config)
{
	let mut local = LocalConfig::new();
	let mut config = Config::new();

	// see https://docs.rs/clap/2.34.0/clap/struct.Arg.html#method.from_usage for syntax
	let usage = format!(
		"--failure=[SECS] 'Mean time between machine failures [{default_failure}]'
		--log=[LEVEL:GLOB]... 'Overrides --log-level, glob is used to match process names'
		--log-level=[LEVEL] 'Default log level: {log_levels} [{default_level}]'
		--machines=[N] 'Number of machines [{default_machines}]'
		--max-time=[TIME] 'Maximum time to run the simulation, use {time_suffixes} suffixes [28d]'
		--no-colors 'Don't color code console output'
		--repair=[SECS] 'Time it takes to fix a machine [{default_repair}]'
		--seed=[N] 'Random number generator seed [random]'",
		default_failure = local.mean_failure_time,
		default_machines = local.num_machines,
		default_repair = local.repair_time,
		default_level = format!("{:?}", config.log_level).to_lowercase(),
		log_levels = log_levels(),
		time_suffixes = time_suffixes());

	let matches = App::new("machine_shop")
		.version("1.0")
		.about("Simulates a machine shop with a repairman who can be preempted.")
		.args_from_usage(&usage)
	.get_matches();

	if matches.is_present("failure") {
		local.mean_failure_time = match_num(&matches, "failure", 1.0, 1_000_000.0);
	}

	if matches.is_present("machines") {
		local.num_machines = match_num(&matches, "machines", 1, 1_000);
	}

	if matches.is_present("repair") {
		local.repair_time = match_num(&matches, "repair", 1, 1_000_000);
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

	let max_time = matches.value_of("max-time").unwrap_or("28d");
	if let Some(e) = config.parse_max_time(max_time) {
		fatal_err(&e);
	}

	config.colorize = !matches.is_present("no-colors");

	(local, config)
}

fn main()
{
	let (local, config) = parse_options();
	let parts = Rc::new(RefCell::new(vec![0; local.num_machines]));
	let jobs = Rc::new(Cell::new(0));

	let mut sim = match create_sim(local, config, parts.clone(), jobs.clone()) {
		Ok(sim) => sim,
		Err(e) => fatal_err(&e.to_string()),
	};
	let status = match sim.run() {
		Ok(status) => status,
		Err(e) => fatal_err(&e.to_string()),
	};

	log_info!(sim, "{}", status);
	for (number, count) in parts.borrow().iter().enumerate() {
		log_info!(sim, "machine{} made {} parts", number, count);
	}
	log_info!(sim, "repairman finished {} other jobs", jobs.get());
}
