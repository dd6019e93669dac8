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
//! Reneging: a process issues a blocking request, get, or put but gives up if
//! a timeout elapses or an event is signaled first. This is done with a
//! helper process that watches for the renege condition on behalf of the
//! blocked process.
use crate::buffer::*;
use crate::command::*;
use crate::context::*;
use crate::errors::*;
use crate::handle::*;
use crate::logging::*;
use crate::process::*;
use crate::simulation::*;

struct RenegeWatch
{
	target: usize,
	seat: Seat,
	trigger: Renege,
	waiting: bool,
}

impl Computation for RenegeWatch
{
	fn resume(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>
	{
		if !self.waiting {
			self.waiting = true;
			return Ok(Some(match self.trigger {
				Renege::Hold(delay) => Command::hold(delay),
				Renege::WaitEvent(event) => Command::wait_event(event),
			}));
		}

		let helper = ctx.me().index();
		ctx.sim_mut().renege_fired(helper, self.target, self.seat)?;
		Ok(None)
	}
}

impl Simulation
{
	pub(crate) fn renege(&mut self, index: usize, primary: Blocking, trigger: Renege) -> SimResult<()>
	{
		match trigger {
			Renege::Hold(delay) if delay < 0 => return Err(SimulationError::NegativeDelay(delay).into()),
			Renege::Hold(_) => {},
			Renege::WaitEvent(event) => self.owns(event)?,
		}

		let seat = primary.seat();
		match primary {
			Blocking::Request(request) => self.request(index, request)?,
			Blocking::Get(get) => self.get(index, get)?,
			Blocking::Put(put) => self.put(index, put)?,
		}

		let name = format!("renege watch for {}", self.processes.name(index));
		let helper = self.add_process(&name);
		self.activate(helper, RenegeWatch{target: index, seat, trigger, waiting: false}, When::Now, false)?;
		self.processes.get_mut(index).helper = Some(helper.index());
		Ok(())
	}

	// Called by the helper when the renege condition happens. If the target
	// is still blocked it is woken so that it can give up.
	fn renege_fired(&mut self, helper: usize, target: usize, seat: Seat) -> SimResult<()>
	{
		if self.processes.get(target).helper != Some(helper) {
			return Ok(());
		}
		self.processes.get_mut(target).helper = None;

		let blocked = match seat {
			Seat::Resource(resource) => self.resources[resource.index()].wait_queue.contains(target),
			Seat::Get(buffer) => self.is_getting(buffer, target)?,
			Seat::Put(buffer) => self.is_putting(buffer, target)?,
		};
		if blocked {
			let fired = self.processes.get(helper).events_fired.clone();
			self.processes.get_mut(target).events_fired = fired;
			self.log_for(LogLevel::Debug, Some(target), "reneging");
			let now = self.now();
			self.reschedule(target, now, false)?;
		}
		Ok(())
	}

	/// True if the process was granted the resource unit (or its get was
	/// satisfied). Otherwise the process reneged and is removed from the queue.
	pub(crate) fn acquired(&mut self, index: usize, target: Target) -> SimResult<bool>
	{
		let acquired = match target {
			Target::Resource(resource) => {
				self.owns(resource)?;
				let r = resource.index();
				let holding = self.resources[r].active_queue.contains(index);
				if !holding && self.resources[r].wait_queue.take_out(index).is_some() {
					let now = self.now();
					self.resources[r].observe(now);
				}
				holding
			},
			Target::Buffer(buffer) => {
				let blocked = self.is_getting(buffer, index)?;
				if blocked {
					self.stop_getting(buffer, index);
				}
				!blocked
			},
		};
		self.dismiss_helper(index);
		Ok(acquired)
	}

	/// Like acquired but for puts.
	pub(crate) fn stored(&mut self, index: usize, buffer: BufferId) -> SimResult<bool>
	{
		let blocked = self.is_putting(buffer, index)?;
		if blocked {
			self.stop_putting(buffer, index);
		}
		self.dismiss_helper(index);
		Ok(!blocked)
	}

	// The helper is no longer needed: make sure it can never wake up.
	pub(crate) fn dismiss_helper(&mut self, index: usize)
	{
		if let Some(helper) = self.processes.get_mut(index).helper.take() {
			if !self.processes.get(helper).is_terminated() {
				self.clock.cancel(helper);
				for event in self.events.iter_mut() {
					event.forget(helper);
				}
				self.processes.get_mut(helper).terminate();
				self.log_for(LogLevel::Excessive, Some(helper), "dismissed");
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::*;
	use crate::level::*;
	use crate::resource::*;
	use crate::sim_time::*;
	use crate::store::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	fn quiet() -> Simulation
	{
		let mut config = Config::new();
		config.log_level = LogLevel::Error;
		config.seed = 1;
		Simulation::new(config)
	}

	type Journal = Rc<RefCell<Vec<(String, Time, bool)>>>;

	// Arrives, requests the teller but gives up after patience ticks, and
	// if served holds for service ticks.
	fn impatient(teller: ResourceId, arrive: i64, patience: i64, service: i64, journal: Journal) -> impl Computation
	{
		let mut state = 0;
		move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			match state {
				1 => Ok(Some(Command::hold(arrive))),
				2 => Ok(Some(Command::renege(Request::new(teller), Renege::Hold(patience)))),
				3 => {
					let served = ctx.acquired(teller)?;
					journal.borrow_mut().push((ctx.name().to_string(), ctx.now(), served));
					if served {
						Ok(Some(Command::hold(service)))
					} else {
						Ok(None)
					}
				},
				4 => Ok(Some(Command::release(teller))),
				_ => Ok(None),
			}
		}
	}

	// Puts amount into the tank but gives up after patience ticks.
	fn impatient_put(tank: LevelId, amount: f64, patience: i64, journal: Journal) -> impl Computation
	{
		let mut state = 0;
		move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			if state == 1 {
				Ok(Some(Command::renege(Put::amount(tank, amount), Renege::Hold(patience))))
			} else {
				let stored = ctx.stored(tank)?;
				journal.borrow_mut().push((ctx.name().to_string(), ctx.now(), stored));
				Ok(None)
			}
		}
	}

	#[test]
	fn served_before_patience_runs_out()
	{
		let mut sim = quiet();
		let teller = sim.add_resource(Resource::new("teller", 1));
		let journal: Journal = Rc::new(RefCell::new(Vec::new()));
		sim.spawn("first", impatient(teller, 0, 100, 5, journal.clone())).unwrap();
		sim.spawn("second", impatient(teller, 1, 10, 5, journal.clone())).unwrap();

		sim.simulate(Time(200)).unwrap();
		assert_eq!(*journal.borrow(), vec![
			("first".to_string(), Time(0), true),
			("second".to_string(), Time(5), true)]);
		assert!(sim.processes.iter().all(|p| p.is_terminated()));
		assert_eq!(sim.peek(), Time::INFINITY);
	}

	#[test]
	fn reneges_when_patience_runs_out()
	{
		let mut sim = quiet();
		let teller = sim.add_resource(Resource::new("teller", 1));
		let journal: Journal = Rc::new(RefCell::new(Vec::new()));
		sim.spawn("first", impatient(teller, 0, 100, 20, journal.clone())).unwrap();
		let second = sim.spawn("second", impatient(teller, 1, 3, 5, journal.clone())).unwrap();

		sim.simulate(Time(10)).unwrap();
		assert_eq!(*journal.borrow(), vec![
			("first".to_string(), Time(0), true),
			("second".to_string(), Time(4), false)]);
		assert!(sim.waiting(teller).unwrap().is_empty());
		assert!(sim.terminated(second).unwrap());
	}

	#[test]
	fn reneging_get_on_event()
	{
		let mut sim = quiet();
		let tank = sim.add_level(Level::new("tank")).unwrap();
		let closing = sim.add_event("closing");
		let result = Rc::new(RefCell::new(None));

		let result2 = result.clone();
		let mut state = 0;
		sim.spawn("getter", move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			if state == 1 {
				Ok(Some(Command::renege(Get::amount(tank, 5.0), Renege::WaitEvent(closing))))
			} else {
				let got = ctx.acquired(tank)?;
				*result2.borrow_mut() = Some((ctx.now(), got, ctx.events_fired().to_vec()));
				Ok(None)
			}
		}).unwrap();

		let mut held = false;
		sim.spawn("closer", move |ctx: &mut Context| -> SimResult<Option<Command>> {
			if held {
				ctx.signal(closing, None)?;
				Ok(None)
			} else {
				held = true;
				Ok(Some(Command::hold(6)))
			}
		}).unwrap();

		sim.simulate(Time(100)).unwrap();
		assert_eq!(*result.borrow(), Some((Time(6), false, vec![closing])));
		assert!(sim.getters(tank).unwrap().is_empty());
	}

	#[test]
	fn dismissed_helpers_stop_waiting()
	{
		let mut sim = quiet();
		let tank = sim.add_level(Level::new("tank").with_initial(10.0)).unwrap();
		let closing = sim.add_event("closing");

		let mut state = 0;
		sim.spawn("getter", move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			if state == 1 {
				Ok(Some(Command::renege(Get::amount(tank, 5.0), Renege::WaitEvent(closing))))
			} else {
				assert!(ctx.acquired(tank)?);
				assert_eq!(ctx.got_amount(), 5.0);
				Ok(None)
			}
		}).unwrap();

		sim.simulate(Time(100)).unwrap();
		assert!(sim.processes.iter().all(|p| p.is_terminated()));

		// the dismissed helper no longer waits so the signal latches
		sim.signal(closing, None).unwrap();
		assert!(sim.occurred(closing).unwrap());
	}

	#[test]
	fn reneging_put_into_a_full_level()
	{
		let mut sim = quiet();
		let tank = sim.add_level(Level::new("tank").with_capacity(5.0).with_initial(5.0)).unwrap();
		let journal: Journal = Rc::new(RefCell::new(Vec::new()));
		sim.spawn("filler", impatient_put(tank, 2.0, 4, journal.clone())).unwrap();

		sim.simulate(Time(100)).unwrap();
		assert_eq!(*journal.borrow(), vec![("filler".to_string(), Time(4), false)]);
		assert!(sim.putters(tank).unwrap().is_empty());
		assert_eq!(sim.level_amount(tank).unwrap(), 5.0);
		assert!(sim.processes.iter().all(|p| p.is_terminated()));
	}

	#[test]
	fn reneging_put_stored_before_patience_runs_out()
	{
		let mut sim = quiet();
		let tank = sim.add_level(Level::new("tank").with_capacity(5.0).with_initial(5.0)).unwrap();
		let journal: Journal = Rc::new(RefCell::new(Vec::new()));
		sim.spawn("filler", impatient_put(tank, 2.0, 4, journal.clone())).unwrap();

		let mut state = 0;
		sim.spawn("drainer", move |_: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			match state {
				1 => Ok(Some(Command::hold(2))),
				2 => Ok(Some(Get::amount(tank, 3.0).into())),
				_ => Ok(None),
			}
		}).unwrap();

		sim.simulate(Time(100)).unwrap();
		assert_eq!(*journal.borrow(), vec![("filler".to_string(), Time(2), true)]);
		assert!(sim.putters(tank).unwrap().is_empty());
		assert_eq!(sim.level_amount(tank).unwrap(), 4.0);
		assert!(sim.processes.iter().all(|p| p.is_terminated()));
		assert_eq!(sim.peek(), Time::INFINITY);
	}

	#[test]
	fn reneging_filtered_get()
	{
		let mut sim = quiet();
		let odd: Vec<Item> = vec![Box::new(1) as Item, Box::new(3) as Item];
		let bin = sim.add_store(Store::new("bin").with_items(odd)).unwrap();
		let result = Rc::new(RefCell::new(None));

		let result2 = result.clone();
		let mut state = 0;
		sim.spawn("picky", move |ctx: &mut Context| -> SimResult<Option<Command>> {
			state += 1;
			if state == 1 {
				let evens = Get::filtered(bin, |items: &[Item]| -> Vec<usize> {
					(0..items.len()).filter(|&n| items[n].downcast_ref::<i32>().map_or(false, |v| v % 2 == 0)).collect()
				});
				Ok(Some(Command::renege(evens, Renege::Hold(5))))
			} else {
				let got = ctx.acquired(bin)?;
				*result2.borrow_mut() = Some((ctx.now(), got, ctx.take_items().len()));
				Ok(None)
			}
		}).unwrap();

		sim.simulate(Time(100)).unwrap();
		assert_eq!(*result.borrow(), Some((Time(5), false, 0)));
		assert!(sim.getters(bin).unwrap().is_empty());
		assert_eq!(sim.store_items(bin).unwrap().len(), 2);
	}
}
