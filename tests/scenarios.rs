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
//! End-to-end models exercising several entities at once.
use proptest::prelude::*;
use simkern::*;
use std::cell::RefCell;
use std::rc::Rc;

fn quiet() -> Simulation
{
	let mut config = Config::new();
	config.log_level = LogLevel::Error;
	config.seed = 1;
	Simulation::new(config)
}

/// Repeatedly waits and then issues a command built by make, counting
/// how much of it completed.
fn repeat<F>(period: i64, mut make: F, done: Rc<RefCell<f64>>, size: f64) -> impl Computation
	where F: FnMut() -> Command + 'static
{
	let mut state = 0;
	move |_: &mut Context| -> SimResult<Option<Command>> {
		state += 1;
		match state % 2 {
			1 => {
				if state > 1 {
					*done.borrow_mut() += size;
				}
				Ok(Some(Command::hold(period)))
			},
			_ => Ok(Some(make())),
		}
	}
}

#[test]
fn level_conservation()
{
	let mut sim = quiet();
	let tank = sim.add_level(Level::new("tank").with_capacity(5.0)).unwrap();
	let produced = Rc::new(RefCell::new(0.0));
	let consumed = Rc::new(RefCell::new(0.0));
	sim.spawn("producer", repeat(1, move || Put::amount(tank, 2.0).into(), produced.clone(), 2.0)).unwrap();
	sim.spawn("consumer", repeat(2, move || Get::amount(tank, 3.0).into(), consumed.clone(), 3.0)).unwrap();

	let mut checks = 0;
	while sim.peek() <= Time(50) {
		assert!(sim.step().unwrap());
		if sim.peek() > sim.now() {
			// quiescent: every process that can run at this time has
			let amount = sim.level_amount(tank).unwrap();
			let pending_puts = 2.0*sim.putters(tank).unwrap().len() as f64;
			let balance = *produced.borrow() - *consumed.borrow();
			assert!(amount <= 5.0);
			assert_eq!(balance, amount, "at {} with {} blocked", sim.now(), pending_puts);
			checks += 1;
		}
	}
	assert!(checks > 20);
}

#[test]
fn preemption_preserves_remaining_service()
{
	let mut sim = quiet();
	let cpu = sim.add_resource(Resource::new("cpu", 1).with_discipline(Discipline::Priority).preemptable());
	let done = Rc::new(RefCell::new(Vec::new()));

	for &(name, arrive, priority, service) in [("low", 0, 1, 10), ("high", 1, 5, 5)].iter() {
		let done = done.clone();
		let mut state = 0;
		sim.spawn(name, move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			match state {
				1 => Ok(Some(Command::hold(arrive))),
				2 => Ok(Some(Request::new(cpu).with_priority(priority).into())),
				3 => Ok(Some(Command::hold(service))),
				4 => Ok(Some(Command::release(cpu))),
				_ => {
					done.borrow_mut().push((ctx.name().to_string(), ctx.now()));
					Ok(None)
				},
			}
		}).unwrap();
	}

	assert_eq!(sim.simulate(Time(100)).unwrap(), RunStatus::Exhausted{at: Time(15)});
	assert_eq!(*done.borrow(), vec![("high".to_string(), Time(6)), ("low".to_string(), Time(15))]);
}

// A numeric get that can't be satisfied blocks the gets behind it but a
// filter that selects nothing does not.
#[test]
fn store_head_of_line_asymmetry()
{
	let mut sim = quiet();
	let bin = sim.add_store(Store::new("bin")).unwrap();
	let got = Rc::new(RefCell::new(Vec::new()));

	let getter = |name: &'static str, get: Get, got: Rc<RefCell<Vec<(&'static str, Vec<i32>)>>>| {
		let mut get = Some(get);
		move |ctx: &mut Context| -> SimResult<Option<Command>> {
			match get.take() {
				Some(g) => Ok(Some(g.into())),
				None => {
					let items = ctx.take_items();
					let values = items.iter().filter_map(|i| i.downcast_ref::<i32>().cloned()).collect();
					got.borrow_mut().push((name, values));
					Ok(None)
				},
			}
		}
	};

	sim.spawn("red", getter("red", Get::filtered(bin, |items: &[Item]| {
		items.iter().enumerate().filter(|(_, i)| i.downcast_ref::<i32>() == Some(&-1)).map(|(n, _)| n).collect()
	}), got.clone())).unwrap();
	sim.spawn("one", getter("one", Get::items(bin, 1), got.clone())).unwrap();
	sim.spawn("many", getter("many", Get::items(bin, 10), got.clone())).unwrap();
	sim.spawn("last", getter("last", Get::items(bin, 1), got.clone())).unwrap();

	let mut put = false;
	sim.spawn("putter", move |_: &mut Context| -> SimResult<Option<Command>> {
		if put {
			Ok(None)
		} else {
			put = true;
			Ok(Some(Put::items(bin, vec![Box::new(1) as Item, Box::new(2) as Item]).into()))
		}
	}).unwrap();

	sim.simulate(Time(10)).unwrap();
	assert_eq!(*got.borrow(), vec![("one", vec![1])]);
	assert_eq!(sim.store_items(bin).unwrap().len(), 1);
	assert_eq!(sim.getters(bin).unwrap().len(), 3);
}

#[test]
fn filtered_gets_take_what_they_select()
{
	let mut sim = quiet();
	let items: Vec<Item> = (1..=6).map(|i| Box::new(i) as Item).collect();
	let bin = sim.add_store(Store::new("bin").with_items(items)).unwrap();
	let evens = Rc::new(RefCell::new(Vec::new()));

	let evens2 = evens.clone();
	let mut asked = false;
	sim.spawn("picky", move |ctx: &mut Context| -> SimResult<Option<Command>> {
		if asked {
			let items = ctx.take_items();
			*evens2.borrow_mut() = items.iter().filter_map(|i| i.downcast_ref::<i32>().cloned()).collect();
			Ok(None)
		} else {
			asked = true;
			Ok(Some(Get::filtered(bin, |items: &[Item]| {
				(0..items.len()).filter(|&n| items[n].downcast_ref::<i32>().map_or(false, |v| v % 2 == 0)).collect()
			}).into()))
		}
	}).unwrap();

	sim.simulate(Time(10)).unwrap();
	assert_eq!(*evens.borrow(), vec![2, 4, 6]);
	assert_eq!(sim.store_items(bin).unwrap().len(), 3);
}

#[test]
fn interrupts_of_idle_processes_have_no_effect()
{
	let mut sim = quiet();
	let sleeper = sim.spawn("sleeper", |_: &mut Context| -> SimResult<Option<Command>> {
		Ok(Some(Command::passivate()))
	}).unwrap();
	let quitter = sim.spawn("quitter", |_: &mut Context| -> SimResult<Option<Command>> {Ok(None)}).unwrap();
	sim.simulate(Time(5)).unwrap();

	assert!(sim.passive(sleeper).unwrap());
	assert_eq!(sim.interrupt(sleeper, None).unwrap(), None);
	assert!(!sim.interrupted(sleeper).unwrap());
	assert_eq!(sim.interrupt(quitter, None).unwrap(), None);
	assert_eq!(sim.peek(), Time::INFINITY);
}

#[test]
fn wait_until_sees_termination()
{
	let mut sim = quiet();
	let worker = sim.spawn("worker", |_: &mut Context| -> SimResult<Option<Command>> {
		Ok(None)
	}).unwrap();
	sim.cancel(worker).unwrap();
	sim.reactivate(worker, When::Delay(4), false).unwrap();

	let woke = Rc::new(RefCell::new(None));
	let woke2 = woke.clone();
	let mut waiting = false;
	sim.spawn("watcher", move |ctx: &mut Context| -> SimResult<Option<Command>> {
		if waiting {
			*woke2.borrow_mut() = Some(ctx.now());
			Ok(None)
		} else {
			waiting = true;
			Ok(Some(Command::wait_until(move |sim: &Simulation| sim.terminated(worker).unwrap_or(false))))
		}
	}).unwrap();

	sim.simulate(Time(100)).unwrap();
	assert_eq!(*woke.borrow(), Some(Time(4)));
}

#[test]
fn entities_from_other_simulations_are_rejected()
{
	let mut home = quiet();
	let mut away = quiet();
	let their_level = away.add_level(Level::new("tank")).unwrap();
	let their_event = away.add_event("go");
	let their_process = away.add_process("stranger");

	assert!(home.signal(their_event, None).is_err());
	assert!(home.level_amount(their_level).is_err());
	assert!(home.reactivate(their_process, When::Now, false).is_err());
	assert!(home.activate(their_process, |_: &mut Context| -> SimResult<Option<Command>> {Ok(None)}, When::Now, false).is_err());

	home.spawn("confused", move |_: &mut Context| -> SimResult<Option<Command>> {
		Ok(Some(Command::wait_event(their_event)))
	}).unwrap();
	match home.simulate(Time(10)).unwrap() {
		RunStatus::Aborted{error: SimulationError::ForeignEntity{kind, ..}, ..} => assert_eq!(kind, "event"),
		other => panic!("unexpected {}", other),
	}

	// nothing was registered with the other simulation
	assert!(!away.active(their_process).unwrap());
}

#[test]
fn logging_does_not_disturb_the_run()
{
	let mut config = Config::new();
	config.log_level = LogLevel::Excessive;
	config.colorize = false;
	config.seed = 3;
	assert_eq!(config.parse_log_levels(vec!["error:renege*"]), None);
	let mut sim = Simulation::new(config);
	let teller = sim.add_resource(Resource::new("teller", 1));

	let mut state = 0;
	sim.spawn("customer", move |ctx: &mut Context| -> SimResult<Option<Command>> {
		state += 1;
		log_debug!(ctx, "state {}", state);
		match state {
			1 => Ok(Some(Command::renege(Request::new(teller), Renege::Hold(2)))),
			2 => {
				let served = ctx.acquired(teller)?;
				log_info!(ctx, "served: {}", served);
				Ok(Some(Command::release(teller)))
			},
			_ => Ok(None),
		}
	}).unwrap();

	assert_eq!(sim.simulate(Time(10)).unwrap(), RunStatus::Exhausted{at: Time(0)});
}

/// A bank with one teller and customers who give up after their patience
/// runs out.
fn run_bank(arrivals: &[(i64, i64, i64)]) -> (Simulation, ResourceId, Rc<RefCell<Vec<(usize, bool)>>>)
{
	let mut sim = quiet();
	let teller = sim.add_resource(Resource::new("teller", 1));
	let outcomes = Rc::new(RefCell::new(Vec::new()));

	for (i, &(arrive, patience, service)) in arrivals.iter().enumerate() {
		let outcomes = outcomes.clone();
		let mut state = 0;
		sim.spawn(&format!("customer{}", i), move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			match state {
				1 => Ok(Some(Command::hold(arrive))),
				2 => Ok(Some(Command::renege(Request::new(teller), Renege::Hold(patience)))),
				3 => {
					let served = ctx.acquired(teller)?;
					outcomes.borrow_mut().push((i, served));
					Ok(Some(if served {Command::hold(service)} else {Command::passivate()}))
				},
				4 => Ok(Some(Command::release(teller))),
				_ => Ok(None),
			}
		}).unwrap();
	}

	sim.simulate(Time::INFINITY).unwrap();
	(sim, teller, outcomes)
}

proptest! {
	#[test]
	fn customers_are_served_or_renege_exactly_once(
		arrivals in prop::collection::vec((0i64..30, 0i64..8, 1i64..6), 1..15))
	{
		let (sim, teller, outcomes) = run_bank(&arrivals);

		let mut seen: Vec<usize> = outcomes.borrow().iter().map(|&(i, _)| i).collect();
		seen.sort();
		prop_assert_eq!(seen, (0..arrivals.len()).collect::<Vec<_>>());
		prop_assert!(sim.waiting(teller).unwrap().is_empty());
		prop_assert!(sim.holders(teller).unwrap().is_empty());
		prop_assert_eq!(sim.free_units(teller).unwrap(), 1);
	}
}
