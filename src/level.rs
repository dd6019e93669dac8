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
use crate::discipline::*;
use crate::errors::*;
use crate::handle::*;
use crate::logging::*;
use crate::process::*;
use crate::sim_time::*;
use crate::simulation::*;
use crate::statistic::*;

define_handle!(LevelId, "level");

/// A buffer holding an amount of some undifferentiated stuff, e.g. liters of
/// fuel. Getters block until there is enough and putters block until there
/// is room. Both queues are served strictly head first: a head that can't be
/// satisfied blocks the entries behind it.
pub struct Level
{
	pub name: String,
	capacity: f64,
	amount: f64,
	pub(crate) get_queue: WaitQueue<f64>,
	pub(crate) put_queue: WaitQueue<f64>,
	amount_monitor: Option<SharedStatistic>,
	get_monitor: Option<SharedStatistic>,
	put_monitor: Option<SharedStatistic>,
}

impl Level
{
	/// An empty level with unbounded capacity and FIFO queues.
	pub fn new(name: &str) -> Level
	{
		Level {
			name: name.to_string(),
			capacity: UNBOUNDED,
			amount: 0.0,
			get_queue: WaitQueue::new(Discipline::Fifo),
			put_queue: WaitQueue::new(Discipline::Fifo),
			amount_monitor: None,
			get_monitor: None,
			put_monitor: None,
		}
	}

	pub fn with_capacity(self, capacity: f64) -> Level
	{
		Level{capacity, ..self}
	}

	pub fn with_initial(self, amount: f64) -> Level
	{
		Level{amount, ..self}
	}

	pub fn with_get_discipline(self, discipline: Discipline) -> Level
	{
		Level{get_queue: WaitQueue::new(discipline), ..self}
	}

	pub fn with_put_discipline(self, discipline: Discipline) -> Level
	{
		Level{put_queue: WaitQueue::new(discipline), ..self}
	}

	pub fn amount_monitor(self, monitor: SharedStatistic) -> Level
	{
		Level{amount_monitor: Some(monitor), ..self}
	}

	pub fn get_monitor(self, monitor: SharedStatistic) -> Level
	{
		Level{get_monitor: Some(monitor), ..self}
	}

	pub fn put_monitor(self, monitor: SharedStatistic) -> Level
	{
		Level{put_monitor: Some(monitor), ..self}
	}

	pub fn capacity(&self) -> f64
	{
		self.capacity
	}

	pub fn amount(&self) -> f64
	{
		self.amount
	}

	pub(crate) fn observe(&self, now: Time)
	{
		observe(&self.amount_monitor, self.amount, now);
		observe(&self.get_monitor, self.get_queue.len() as f64, now);
		observe(&self.put_monitor, self.put_queue.len() as f64, now);
	}

	fn validate(&self) -> Result<(), SimulationError>
	{
		if self.capacity.is_nan() || self.capacity < 0.0 {
			return Err(SimulationError::InvalidCapacity{entity: self.name.clone(), capacity: self.capacity});
		}
		check_amount(&self.name, self.amount)?;
		if self.amount > self.capacity {
			return Err(SimulationError::OverCapacity{buffer: self.name.clone(), initial: self.amount, capacity: self.capacity});
		}
		Ok(())
	}

	// Returns the getters that were satisfied along with what they got.
	fn serve_getters(&mut self) -> Vec<(usize, f64)>
	{
		let mut served = Vec::new();
		while self.get_queue.front().map_or(false, |w| w.demand <= self.amount) {
			if let Some(w) = self.get_queue.leave() {
				self.amount -= w.demand;
				served.push((w.process, w.demand));
			}
		}
		served
	}

	fn serve_putters(&mut self) -> Vec<usize>
	{
		let mut served = Vec::new();
		while self.put_queue.front().map_or(false, |w| w.demand + self.amount <= self.capacity) {
			if let Some(w) = self.put_queue.leave() {
				self.amount += w.demand;
				served.push(w.process);
			}
		}
		served
	}
}

fn check_amount(buffer: &str, amount: f64) -> Result<(), SimulationError>
{
	if amount.is_finite() && amount >= 0.0 {
		Ok(())
	} else {
		Err(SimulationError::InvalidAmount{buffer: buffer.to_string(), amount})
	}
}

impl Simulation
{
	pub fn add_level(&mut self, level: Level) -> SimResult<LevelId>
	{
		level.validate()?;
		self.levels.push(level);
		Ok(LevelId::new(self.id(), self.levels.len() - 1))
	}

	pub fn level(&self, level: LevelId) -> SimResult<&Level>
	{
		self.owns(level)?;
		Ok(&self.levels[level.index()])
	}

	/// The amount currently buffered.
	pub fn level_amount(&self, level: LevelId) -> SimResult<f64>
	{
		Ok(self.level(level)?.amount)
	}

	pub(crate) fn get_amount(&mut self, index: usize, level: LevelId, amount: f64, priority: Priority) -> SimResult<()>
	{
		self.owns(level)?;
		let l = level.index();
		check_amount(&self.levels[l].name, amount)?;
		self.processes.get_mut(index).priorities.insert(Seat::Get(BufferId::Level(level)), priority);

		let now = self.now();
		if amount <= self.levels[l].amount {
			self.levels[l].amount -= amount;
			self.processes.get_mut(index).got = Got::Amount(amount);
			self.post(index, now, true)?;

			let served = self.levels[l].serve_putters();
			for putter in served {
				self.reschedule(putter, now, false)?;
			}
		} else {
			self.levels[l].get_queue.enter(Waiter::new(index, priority, amount));
			self.log_for(LogLevel::Debug, Some(index), &format!("waiting to get {} from {}", amount, self.levels[l].name));
		}
		self.levels[l].observe(now);
		Ok(())
	}

	pub(crate) fn put_amount(&mut self, index: usize, level: LevelId, amount: f64, priority: Priority) -> SimResult<()>
	{
		self.owns(level)?;
		let l = level.index();
		check_amount(&self.levels[l].name, amount)?;
		self.processes.get_mut(index).priorities.insert(Seat::Put(BufferId::Level(level)), priority);

		let now = self.now();
		if amount + self.levels[l].amount > self.levels[l].capacity {
			self.levels[l].put_queue.enter(Waiter::new(index, priority, amount));
			self.log_for(LogLevel::Debug, Some(index), &format!("waiting to put {} into {}", amount, self.levels[l].name));
		} else {
			self.levels[l].amount += amount;
			let served = self.levels[l].serve_getters();
			for (getter, got) in served {
				self.processes.get_mut(getter).got = Got::Amount(got);
				self.reschedule(getter, now, false)?;
			}
			self.post(index, now, true)?;
		}
		self.levels[l].observe(now);
		Ok(())
	}
}
