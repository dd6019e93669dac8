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
use crate::buffer::*;
use crate::errors::*;
use crate::handle::*;
use crate::logging::*;
use crate::process::*;
use crate::sim_event::*;
use crate::sim_time::*;
use crate::simulation::*;
use crate::store::*;
use rand::rngs::StdRng;
use std::mem;

/// Passed into a process's computation each time it is resumed. This is how
/// a process finds out about itself (e.g. whether it was interrupted) and
/// acts on other entities without having to hold a reference to the
/// `Simulation` between resumptions.
pub struct Context<'a>
{
	sim: &'a mut Simulation,
	me: ProcessId,
}

impl<'a> Context<'a>
{
	pub(crate) fn new(sim: &'a mut Simulation, me: ProcessId) -> Context<'a>
	{
		Context{sim, me}
	}

	/// The process currently being executed.
	pub fn me(&self) -> ProcessId
	{
		self.me
	}

	pub fn name(&self) -> &str
	{
		self.sim.processes.name(self.me.index())
	}

	pub fn now(&self) -> Time
	{
		self.sim.now()
	}

	pub fn sim(&self) -> &Simulation
	{
		&*self.sim
	}

	/// Processes may add entities or processes as the simulation runs.
	pub fn sim_mut(&mut self) -> &mut Simulation
	{
		&mut *self.sim
	}

	pub fn rng(&mut self) -> &mut StdRng
	{
		self.sim.rng()
	}

	/// Normally the log_info!, log_debug!, etc macros are used instead of this.
	pub fn log(&self, level: LogLevel, message: &str)
	{
		self.sim.log_for(level, Some(self.me.index()), message);
	}

	// --- other processes -------------------------------------------------------
	pub fn activate<C>(&mut self, process: ProcessId, computation: C, when: When, prior: bool) -> SimResult<()>
		where C: Computation + 'static
	{
		self.sim.activate(process, computation, when, prior)
	}

	pub fn spawn<C>(&mut self, name: &str, computation: C) -> SimResult<ProcessId>
		where C: Computation + 'static
	{
		self.sim.spawn(name, computation)
	}

	pub fn reactivate(&mut self, process: ProcessId, when: When, prior: bool) -> SimResult<()>
	{
		self.sim.reactivate(process, when, prior)
	}

	pub fn cancel(&mut self, process: ProcessId) -> SimResult<()>
	{
		self.sim.cancel(process)
	}

	/// Interrupts the victim on behalf of this process.
	pub fn interrupt(&mut self, victim: ProcessId) -> SimResult<Option<i64>>
	{
		let me = self.me;
		self.sim.interrupt(victim, Some(me))
	}

	/// Wakes up processes waiting or queued on the event.
	pub fn signal(&mut self, event: EventId, param: Option<Param>) -> SimResult<()>
	{
		self.sim.signal(event, param)
	}

	pub fn stop_simulation(&mut self)
	{
		self.sim.stop();
	}

	// --- state of this process -------------------------------------------------
	/// True if the process was resumed because of an interrupt (and hasn't
	/// held since or called interrupt_reset).
	pub fn interrupted(&self) -> bool
	{
		self.process().is_interrupted()
	}

	pub fn interrupt_cause(&self) -> Option<ProcessId>
	{
		self.process().interrupt_cause()
	}

	/// Ticks that were left in the interrupted hold.
	pub fn interrupt_left(&self) -> Option<i64>
	{
		self.process().interrupt_left()
	}

	pub fn interrupt_reset(&mut self)
	{
		let p = self.process_mut();
		p.interrupted = false;
		p.interrupt_cause = None;
	}

	/// The events that woke this process from its last wait or queue.
	pub fn events_fired(&self) -> &[EventId]
	{
		self.process().events_fired()
	}

	/// Call this after resuming from a reneging request or get. Returns true
	/// if the resource unit was granted (or the get satisfied) and false if the
	/// process reneged, in which case it has been removed from the queue.
	pub fn acquired<T: Into<Target>>(&mut self, target: T) -> SimResult<bool>
	{
		let me = self.me.index();
		self.sim.acquired(me, target.into())
	}

	/// Like acquired but for a reneging put.
	pub fn stored<B: Into<BufferId>>(&mut self, buffer: B) -> SimResult<bool>
	{
		let me = self.me.index();
		self.sim.stored(me, buffer.into())
	}

	/// The amount received from the last get from a `Level`.
	pub fn got_amount(&self) -> f64
	{
		match self.process().got {
			Got::Amount(amount) => amount,
			_ => 0.0,
		}
	}

	/// The items received from the last get from a `Store`. Subsequent calls
	/// return an empty vector until the next get.
	pub fn take_items(&mut self) -> Vec<Item>
	{
		match mem::replace(&mut self.process_mut().got, Got::Nothing) {
			Got::Items(items) => items,
			_ => Vec::new(),
		}
	}

	fn process(&self) -> &Process
	{
		self.sim.processes.get(self.me.index())
	}

	fn process_mut(&mut self) -> &mut Process
	{
		self.sim.processes.get_mut(self.me.index())
	}
}
