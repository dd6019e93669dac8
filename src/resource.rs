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
use crate::discipline::*;
use crate::errors::*;
use crate::handle::*;
use crate::logging::*;
use crate::process::*;
use crate::sim_time::*;
use crate::simulation::*;
use crate::statistic::*;

define_handle!(ResourceId, "resource");

/// A fixed number of units (e.g. bank tellers) that processes request and
/// later release. Requesters that can't get a unit wait in a queue ordered
/// by the resource's discipline. If the resource is preemptable and uses the
/// Priority discipline a requester may evict the lowest priority holder.
pub struct Resource
{
	pub name: String,
	capacity: usize,
	free: usize,
	preemptable: bool,
	discipline: Discipline,
	pub(crate) wait_queue: WaitQueue<()>,
	pub(crate) active_queue: WaitQueue<()>,
	wait_monitor: Option<SharedStatistic>,
	active_monitor: Option<SharedStatistic>,
}

impl Resource
{
	pub fn new(name: &str, capacity: usize) -> Resource
	{
		Resource {
			name: name.to_string(),
			capacity,
			free: capacity,
			preemptable: false,
			discipline: Discipline::Fifo,
			wait_queue: WaitQueue::new(Discipline::Fifo),
			active_queue: WaitQueue::new(Discipline::Fifo),
			wait_monitor: None,
			active_monitor: None,
		}
	}

	pub fn with_discipline(self, discipline: Discipline) -> Resource
	{
		Resource{discipline, ..self}
	}

	/// Higher priority requesters may preempt lower priority holders.
	pub fn preemptable(self) -> Resource
	{
		Resource{preemptable: true, ..self}
	}

	/// Observes the wait queue length whenever it changes.
	pub fn wait_monitor(self, monitor: SharedStatistic) -> Resource
	{
		Resource{wait_monitor: Some(monitor), ..self}
	}

	/// Observes the number of holders whenever it changes.
	pub fn active_monitor(self, monitor: SharedStatistic) -> Resource
	{
		Resource{active_monitor: Some(monitor), ..self}
	}

	pub fn capacity(&self) -> usize
	{
		self.capacity
	}

	/// Number of units that are not held.
	pub fn free(&self) -> usize
	{
		self.free
	}

	pub fn is_preemptable(&self) -> bool
	{
		self.preemptable
	}

	pub(crate) fn observe(&self, now: Time)
	{
		observe(&self.wait_monitor, self.wait_queue.len() as f64, now);
		observe(&self.active_monitor, self.active_queue.len() as f64, now);
	}

	// The active queue is only kept in priority order when that matters,
	// i.e. when its tail may be preempted.
	fn finish_setup(mut self) -> Resource
	{
		self.wait_queue = WaitQueue::new(self.discipline);
		if self.preemptable {
			self.active_queue = WaitQueue::new(self.discipline);
		}
		self
	}

	// Grants a unit to the process if possible. A preempted holder that has
	// already terminated is simply dropped: it has nothing left to resume.
	fn try_grant<F>(&mut self, process: usize, priority: Priority, terminated: F) -> Grant
		where F: Fn(usize) -> bool
	{
		if self.free > 0 {
			self.free -= 1;
			self.active_queue.enter(Waiter::new(process, priority, ()));
			Grant::Granted
		} else if self.preemptable && self.active_queue.back().map_or(false, |w| priority > w.priority) {
			match self.active_queue.pop_back() {
				Some(victim) => {
					let index = victim.process;
					self.active_queue.enter(Waiter::new(process, priority, ()));
					if terminated(index) {
						Grant::Evicted(index)
					} else {
						self.wait_queue.enter_front(victim);
						Grant::Preempted(index)
					}
				},
				None => Grant::Blocked,
			}
		} else {
			self.wait_queue.enter(Waiter::new(process, priority, ()));
			Grant::Blocked
		}
	}

	// Frees the process's unit and hands it to the head of the wait queue.
	// Returns None if the process wasn't holding a unit.
	fn give_back(&mut self, process: usize) -> Option<Option<usize>>
	{
		self.active_queue.take_out(process)?;
		self.free += 1;
		match self.wait_queue.leave() {
			Some(next) => {
				let index = next.process;
				self.free -= 1;
				self.active_queue.enter(next);
				Some(Some(index))
			},
			None => Some(None),
		}
	}
}

enum Grant
{
	Granted,
	Blocked,
	Preempted(usize),
	Evicted(usize),
}

impl Simulation
{
	pub fn add_resource(&mut self, resource: Resource) -> ResourceId
	{
		self.resources.push(resource.finish_setup());
		ResourceId::new(self.id(), self.resources.len() - 1)
	}

	pub fn resource(&self, resource: ResourceId) -> SimResult<&Resource>
	{
		self.owns(resource)?;
		Ok(&self.resources[resource.index()])
	}

	pub fn free_units(&self, resource: ResourceId) -> SimResult<usize>
	{
		Ok(self.resource(resource)?.free)
	}

	/// Processes blocked on the resource, head first.
	pub fn waiting(&self, resource: ResourceId) -> SimResult<Vec<ProcessId>>
	{
		let r = self.resource(resource)?;
		Ok(self.process_ids(r.wait_queue.processes()))
	}

	/// Processes holding a unit of the resource.
	pub fn holders(&self, resource: ResourceId) -> SimResult<Vec<ProcessId>>
	{
		let r = self.resource(resource)?;
		Ok(self.process_ids(r.active_queue.processes()))
	}

	pub(crate) fn process_ids(&self, indexes: Vec<usize>) -> Vec<ProcessId>
	{
		indexes.into_iter().map(|i| ProcessId::new(self.id(), i)).collect()
	}

	pub(crate) fn request(&mut self, index: usize, request: Request) -> SimResult<()>
	{
		self.owns(request.resource)?;
		let r = request.resource.index();
		let now = self.now();
		self.processes.get_mut(index).priorities.insert(Seat::Resource(request.resource), request.priority);

		let processes = &self.processes;
		let grant = self.resources[r].try_grant(index, request.priority, |i| processes.get(i).terminated);
		self.resources[r].observe(now);
		match grant {
			Grant::Granted => self.post(index, now, true),
			Grant::Blocked => {
				self.log_for(LogLevel::Debug, Some(index), &format!("waiting for {}", self.resources[r].name));
				Ok(())
			},
			Grant::Preempted(victim) => {
				self.preempt(victim, r)?;
				self.post(index, now, true)
			},
			Grant::Evicted(victim) => {
				let message = format!("took {} from terminated {}", self.resources[r].name, self.processes.name(victim));
				self.log_for(LogLevel::Debug, Some(index), &message);
				self.post(index, now, true)
			},
		}
	}

	// Only the first preemption records how much of the victim's hold was
	// left: if it is preempted again from another resource the notice is
	// already gone.
	fn preempt(&mut self, victim: usize, r: usize) -> SimResult<()>
	{
		let now = self.now();
		let first = {
			let p = self.processes.get_mut(victim);
			p.preempted += 1;
			p.preempted == 1
		};
		if first {
			let left = self.clock.cancel(victim).map_or(0, |t| t.since(now));
			self.processes.get_mut(victim).remaining_service = left;
		}
		let message = format!("preempted from {} with {} ticks left", self.resources[r].name, self.processes.get(victim).remaining_service);
		self.log_for(LogLevel::Debug, Some(victim), &message);
		Ok(())
	}

	pub(crate) fn release(&mut self, index: usize, resource: ResourceId) -> SimResult<()>
	{
		self.owns(resource)?;
		let r = resource.index();
		let now = self.now();
		let next = match self.resources[r].give_back(index) {
			Some(next) => next,
			None => return Err(SimulationError::NotHolding{
				process: self.processes.name(index).to_string(),
				resource: self.resources[r].name.clone()}.into()),
		};
		self.resources[r].observe(now);

		if let Some(next) = next {
			let preempted = self.resources[r].preemptable && self.processes.get(next).preempted > 0;
			if preempted {
				let resume = {
					let p = self.processes.get_mut(next);
					p.preempted -= 1;
					if p.preempted == 0 {Some(p.remaining_service)} else {None}
				};
				if let Some(left) = resume {
					self.log_for(LogLevel::Debug, Some(next), &format!("resuming after preemption with {} ticks left", left));
					self.reschedule(next, now.plus(left), true)?;
				}
			} else {
				self.reschedule(next, now, true)?;
			}
		}

		self.post(index, now, true)
	}
}
