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
//! Things shared by the two producer/consumer buffers: `Level` and `Store`.
use crate::command::*;
use crate::errors::*;
use crate::handle::*;
use crate::level::*;
use crate::process::*;
use crate::resource::*;
use crate::simulation::*;
use crate::store::*;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BufferId
{
	Level(LevelId),
	Store(StoreId),
}

impl From<LevelId> for BufferId
{
	fn from(level: LevelId) -> BufferId
	{
		BufferId::Level(level)
	}
}

impl From<StoreId> for BufferId
{
	fn from(store: StoreId) -> BufferId
	{
		BufferId::Store(store)
	}
}

impl fmt::Display for BufferId
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match *self {
			BufferId::Level(l) => write!(formatter, "{}", l),
			BufferId::Store(s) => write!(formatter, "{}", s),
		}
	}
}

/// A queue a process can be waiting in. Processes record their priority for
/// each seat since the same process may use different priorities with
/// different resources.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Seat
{
	Resource(ResourceId),
	Get(BufferId),
	Put(BufferId),
}

/// What `Context::acquired` tests: whether a resource unit was granted or
/// whether a get from a buffer was satisfied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target
{
	Resource(ResourceId),
	Buffer(BufferId),
}

impl From<ResourceId> for Target
{
	fn from(resource: ResourceId) -> Target
	{
		Target::Resource(resource)
	}
}

impl From<BufferId> for Target
{
	fn from(buffer: BufferId) -> Target
	{
		Target::Buffer(buffer)
	}
}

impl From<LevelId> for Target
{
	fn from(level: LevelId) -> Target
	{
		Target::Buffer(BufferId::Level(level))
	}
}

impl From<StoreId> for Target
{
	fn from(store: StoreId) -> Target
	{
		Target::Buffer(BufferId::Store(store))
	}
}

/// Sentinel capacity for buffers without a bound.
pub const UNBOUNDED: f64 = f64::INFINITY;

impl Simulation
{
	/// Processes blocked getting from the buffer, head first.
	pub fn getters<B: Into<BufferId>>(&self, buffer: B) -> SimResult<Vec<ProcessId>>
	{
		let indexes = match buffer.into() {
			BufferId::Level(l) => self.level(l)?.get_queue.processes(),
			BufferId::Store(s) => self.store(s)?.get_queue.processes(),
		};
		Ok(self.process_ids(indexes))
	}

	/// Processes blocked putting into the buffer, head first.
	pub fn putters<B: Into<BufferId>>(&self, buffer: B) -> SimResult<Vec<ProcessId>>
	{
		let indexes = match buffer.into() {
			BufferId::Level(l) => self.level(l)?.put_queue.processes(),
			BufferId::Store(s) => self.store(s)?.put_queue.processes(),
		};
		Ok(self.process_ids(indexes))
	}

	pub(crate) fn get(&mut self, index: usize, get: Get) -> SimResult<()>
	{
		match get {
			Get::Level{level, amount, priority} => self.get_amount(index, level, amount, priority),
			Get::Store{store, want, priority} => self.get_items(index, store, want, priority),
		}
	}

	pub(crate) fn put(&mut self, index: usize, put: Put) -> SimResult<()>
	{
		match put {
			Put::Level{level, amount, priority} => self.put_amount(index, level, amount, priority),
			Put::Store{store, items, priority} => self.put_items(index, store, items, priority),
		}
	}

	pub(crate) fn is_getting(&self, buffer: BufferId, index: usize) -> Result<bool, SimulationError>
	{
		match buffer {
			BufferId::Level(l) => {
				self.owns(l)?;
				Ok(self.levels[l.index()].get_queue.contains(index))
			},
			BufferId::Store(s) => {
				self.owns(s)?;
				Ok(self.stores[s.index()].get_queue.contains(index))
			},
		}
	}

	pub(crate) fn is_putting(&self, buffer: BufferId, index: usize) -> Result<bool, SimulationError>
	{
		match buffer {
			BufferId::Level(l) => {
				self.owns(l)?;
				Ok(self.levels[l.index()].put_queue.contains(index))
			},
			BufferId::Store(s) => {
				self.owns(s)?;
				Ok(self.stores[s.index()].put_queue.contains(index))
			},
		}
	}

	/// Removes the process from the buffer's get queue. Returns true if it was there.
	pub(crate) fn stop_getting(&mut self, buffer: BufferId, index: usize) -> bool
	{
		let now = self.now();
		match buffer {
			BufferId::Level(l) => {
				let level = &mut self.levels[l.index()];
				let removed = level.get_queue.take_out(index).is_some();
				if removed {
					level.observe(now);
				}
				removed
			},
			BufferId::Store(s) => {
				let store = &mut self.stores[s.index()];
				let removed = store.get_queue.take_out(index).is_some();
				if removed {
					store.observe(now);
				}
				removed
			},
		}
	}

	pub(crate) fn stop_putting(&mut self, buffer: BufferId, index: usize) -> bool
	{
		let now = self.now();
		match buffer {
			BufferId::Level(l) => {
				let level = &mut self.levels[l.index()];
				let removed = level.put_queue.take_out(index).is_some();
				if removed {
					level.observe(now);
				}
				removed
			},
			BufferId::Store(s) => {
				let store = &mut self.stores[s.index()];
				let removed = store.put_queue.take_out(index).is_some();
				if removed {
					store.observe(now);
				}
				removed
			},
		}
	}
}
