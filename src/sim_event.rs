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
use crate::errors::*;
use crate::handle::*;
use crate::logging::*;
use crate::simulation::*;
use std::any::Any;
use std::collections::VecDeque;
use std::mem;
use std::rc::Rc;

define_handle!(
	/// Identifies a `SimEvent`.
	EventId, "event");

/// Payload passed along with a signal.
pub type Param = Rc<dyn Any>;

/// Used to synchronize processes. Processes can wait on an event (all waiters
/// are woken when it is signaled) or queue on it (only the first queued
/// process is woken). A signal that nobody is waiting for is latched: the
/// next process to wait or queue on the event continues immediately.
pub struct SimEvent
{
	pub name: String,
	occurred: bool,
	param: Option<Param>,
	waits: Vec<usize>,
	queues: VecDeque<usize>,
}

impl SimEvent
{
	fn new(name: &str) -> SimEvent
	{
		SimEvent{name: name.to_string(), occurred: false, param: None, waits: Vec::new(), queues: VecDeque::new()}
	}

	pub fn occurred(&self) -> bool
	{
		self.occurred
	}

	/// The param of the last signal.
	pub fn param(&self) -> Option<Param>
	{
		self.param.clone()
	}

	pub(crate) fn forget(&mut self, process: usize) -> bool
	{
		let before = self.waits.len() + self.queues.len();
		self.waits.retain(|&p| p != process);
		self.queues.retain(|&p| p != process);
		before != self.waits.len() + self.queues.len()
	}
}

impl Simulation
{
	pub fn add_event(&mut self, name: &str) -> EventId
	{
		self.events.push(SimEvent::new(name));
		EventId::new(self.id(), self.events.len() - 1)
	}

	pub fn event(&self, event: EventId) -> SimResult<&SimEvent>
	{
		self.owns(event)?;
		Ok(&self.events[event.index()])
	}

	pub fn occurred(&self, event: EventId) -> SimResult<bool>
	{
		Ok(self.event(event)?.occurred)
	}

	/// Wakes every process waiting on the event and the first process queued
	/// on it. If there are neither the signal is latched.
	pub fn signal(&mut self, event: EventId, param: Option<Param>) -> SimResult<()>
	{
		self.owns(event)?;
		let e = event.index();
		let now = self.now();
		self.events[e].param = param;

		if self.events[e].waits.is_empty() && self.events[e].queues.is_empty() {
			self.events[e].occurred = true;
			self.log_for(LogLevel::Debug, None, &format!("{} latched", self.events[e].name));
			return Ok(());
		}

		// Waiters are also removed from the other events they were waiting on.
		let waiters = mem::take(&mut self.events[e].waits);
		for waiter in waiters {
			let mut fired = vec![event];
			for (i, other) in self.events.iter_mut().enumerate() {
				if i != e {
					let before = other.waits.len();
					other.waits.retain(|&p| p != waiter);
					if other.waits.len() != before && other.occurred {
						fired.push(EventId::new(event.sim(), i));
					}
				}
			}
			self.processes.get_mut(waiter).events_fired = fired;
			self.log_for(LogLevel::Debug, Some(waiter), &format!("woken by {}", self.events[e].name));
			self.reschedule(waiter, now, true)?;
		}

		if let Some(queued) = self.events[e].queues.pop_front() {
			for (i, other) in self.events.iter_mut().enumerate() {
				if i != e {
					other.queues.retain(|&p| p != queued);
				}
			}
			self.processes.get_mut(queued).events_fired = vec![event];
			self.log_for(LogLevel::Debug, Some(queued), &format!("dequeued by {}", self.events[e].name));
			self.reschedule(queued, now, false)?;
		}
		Ok(())
	}

	pub(crate) fn wait_event(&mut self, index: usize, events: Vec<EventId>) -> SimResult<()>
	{
		if self.consume_occurred(index, &events)? {
			return Ok(());
		}
		for event in events {
			let waits = &mut self.events[event.index()].waits;
			if !waits.contains(&index) {
				waits.push(index);
			}
		}
		Ok(())
	}

	pub(crate) fn queue_event(&mut self, index: usize, events: Vec<EventId>) -> SimResult<()>
	{
		if self.consume_occurred(index, &events)? {
			return Ok(());
		}
		for event in events {
			let queues = &mut self.events[event.index()].queues;
			if !queues.contains(&index) {
				queues.push_back(index);
			}
		}
		Ok(())
	}

	// If any of the events has occurred then all the ones that have are
	// consumed and the process continues right away.
	fn consume_occurred(&mut self, index: usize, events: &[EventId]) -> SimResult<bool>
	{
		if events.is_empty() {
			return Err(SimulationError::EmptyEventList(self.processes.name(index).to_string()).into());
		}
		for &event in events {
			self.owns(event)?;
		}

		let mut fired = Vec::new();
		for &event in events {
			let ev = &mut self.events[event.index()];
			if ev.occurred {
				ev.occurred = false;
				if !fired.contains(&event) {
					fired.push(event);
				}
			}
		}

		if fired.is_empty() {
			Ok(false)
		} else {
			self.processes.get_mut(index).events_fired = fired;
			let now = self.now();
			self.post(index, now, true)?;
			Ok(true)
		}
	}
}
