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
use crate::command::*;
use crate::context::*;
use crate::discipline::*;
use crate::errors::*;
use crate::sim_event::*;
use crate::store::*;
use std::collections::HashMap;

define_handle!(
	/// To make lifetime management easier processes are referenced using a
	/// small handle instead of a rust reference.
	ProcessId, "process");

/// The resumable part of a process. Each call to resume runs the process
/// until it wants to suspend (it returns the command that says why) or until
/// it finishes (it returns None). Typically implementations are small state
/// machines with one state per resumption point. Closures also work.
pub trait Computation
{
	fn resume(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>;
}

impl<F> Computation for F where F: FnMut(&mut Context) -> SimResult<Option<Command>>
{
	fn resume(&mut self, ctx: &mut Context) -> SimResult<Option<Command>>
	{
		self(ctx)
	}
}

/// What a process received from its last get.
pub enum Got
{
	Nothing,
	Amount(f64),
	Items(Vec<Item>),
}

/// `Process`es model the entities within a `Simulation`, e.g. customers or
/// machines. A process is Passive (nothing scheduled), Active (its
/// computation will be resumed at some time), or Terminated. Whether a
/// process is Active is tracked by the `Simulation`'s clock.
pub struct Process
{
	/// The name of the process. Note that, in general, these are not unique.
	pub name: String,

	pub(crate) computation: Option<Box<dyn Computation>>,
	pub(crate) activated: bool,
	pub(crate) terminated: bool,

	pub(crate) interrupted: bool,
	pub(crate) interrupt_cause: Option<ProcessId>,
	pub(crate) interrupt_left: Option<i64>,

	pub(crate) priorities: HashMap<Seat, Priority>,
	pub(crate) preempted: u32,
	pub(crate) remaining_service: i64,

	pub(crate) got: Got,
	pub(crate) events_fired: Vec<EventId>,

	/// The process that enforces a pending renege condition.
	pub(crate) helper: Option<usize>,
}

impl Process
{
	pub(crate) fn new(name: &str) -> Process
	{
		Process {
			name: name.to_string(),
			computation: None,
			activated: false,
			terminated: false,
			interrupted: false,
			interrupt_cause: None,
			interrupt_left: None,
			priorities: HashMap::new(),
			preempted: 0,
			remaining_service: 0,
			got: Got::Nothing,
			events_fired: Vec::new(),
			helper: None,
		}
	}

	pub fn is_terminated(&self) -> bool
	{
		self.terminated
	}

	pub fn is_interrupted(&self) -> bool
	{
		self.interrupted && !self.terminated
	}

	/// The process that did the last interrupt (None if the simulation itself
	/// did the interrupt).
	pub fn interrupt_cause(&self) -> Option<ProcessId>
	{
		self.interrupt_cause
	}

	/// Ticks left in the interrupted hold (or the delay of the last hold).
	pub fn interrupt_left(&self) -> Option<i64>
	{
		self.interrupt_left
	}

	/// The priority the process last used for the resource or buffer queue.
	pub fn priority_at(&self, seat: Seat) -> Option<Priority>
	{
		self.priorities.get(&seat).cloned()
	}

	/// Non-zero while the process has been preempted from a resource.
	pub fn preempted(&self) -> u32
	{
		self.preempted
	}

	/// Events that woke the process the last time it waited or queued.
	pub fn events_fired(&self) -> &[EventId]
	{
		&self.events_fired
	}

	pub(crate) fn terminate(&mut self)
	{
		self.terminated = true;
		self.computation = None;
		self.helper = None;
	}
}
