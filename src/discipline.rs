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
//! Wait and active queues of resources and buffers. Entries are moved between
//! queues by value so a process can't accidentally appear in two of them.
use std::collections::VecDeque;

/// Larger numbers are served first.
pub type Priority = i64;

pub const DEFAULT_PRIORITY: Priority = 0;

/// Ordering policy for a queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Discipline
{
	/// Entries leave in the order they entered.
	Fifo,

	/// Entries are kept in descending priority order, FIFO among equal priorities.
	Priority,
}

impl Discipline
{
	/// Index at which an entry with the given priority should be inserted.
	fn position<T>(self, entries: &VecDeque<Waiter<T>>, priority: Priority) -> usize
	{
		match self {
			Discipline::Fifo => entries.len(),
			Discipline::Priority => entries.iter().position(|w| w.priority < priority).unwrap_or(entries.len()),
		}
	}
}

/// A blocked (or active) process together with what it asked for, e.g. the
/// amount it wants to get from a `Level`.
pub struct Waiter<T>
{
	/// Index of the process within the simulation.
	pub process: usize,
	pub priority: Priority,
	pub demand: T,
}

impl<T> Waiter<T>
{
	pub fn new(process: usize, priority: Priority, demand: T) -> Waiter<T>
	{
		Waiter{process, priority, demand}
	}
}

pub struct WaitQueue<T>
{
	discipline: Discipline,
	entries: VecDeque<Waiter<T>>,
}

impl<T> WaitQueue<T>
{
	pub fn new(discipline: Discipline) -> WaitQueue<T>
	{
		WaitQueue{discipline, entries: VecDeque::new()}
	}

	pub fn discipline(&self) -> Discipline
	{
		self.discipline
	}

	/// Inserts the waiter according to the queue's discipline.
	pub fn enter(&mut self, waiter: Waiter<T>)
	{
		let index = self.discipline.position(&self.entries, waiter.priority);
		self.entries.insert(index, waiter);
	}

	/// Bypasses the discipline: used for preempted processes.
	pub fn enter_front(&mut self, waiter: Waiter<T>)
	{
		self.entries.push_front(waiter);
	}

	/// Removes the head of the queue.
	pub fn leave(&mut self) -> Option<Waiter<T>>
	{
		self.entries.pop_front()
	}

	/// Removes the entry for process (if any).
	pub fn take_out(&mut self, process: usize) -> Option<Waiter<T>>
	{
		let index = self.entries.iter().position(|w| w.process == process)?;
		self.entries.remove(index)
	}

	pub fn remove(&mut self, index: usize) -> Option<Waiter<T>>
	{
		self.entries.remove(index)
	}

	pub fn contains(&self, process: usize) -> bool
	{
		self.entries.iter().any(|w| w.process == process)
	}

	pub fn front(&self) -> Option<&Waiter<T>>
	{
		self.entries.front()
	}

	pub fn get(&self, index: usize) -> Option<&Waiter<T>>
	{
		self.entries.get(index)
	}

	/// For a priority queue this is the lowest priority entry.
	pub fn back(&self) -> Option<&Waiter<T>>
	{
		self.entries.back()
	}

	pub fn pop_back(&mut self) -> Option<Waiter<T>>
	{
		self.entries.pop_back()
	}

	pub fn len(&self) -> usize
	{
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}

	/// Process indexes from head to tail.
	pub fn processes(&self) -> Vec<usize>
	{
		self.entries.iter().map(|w| w.process).collect()
	}
}
