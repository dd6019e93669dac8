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
//! The clock owns the pending event notices and the current time.
use crate::errors::*;
use crate::sim_time::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A request to resume a process at a particular time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EventNotice
{
	pub time: Time,

	/// Breaks ties between notices with the same time. Prior notices use
	/// negative keys (most recent first) and normal notices use positive
	/// keys (oldest first). Keys are unique so they also identify a notice.
	pub key: i64,

	/// Index of the process to resume.
	pub process: usize,
}

impl Ord for EventNotice
{
	fn cmp(&self, other: &EventNotice) -> Ordering
	{
		// reversed because BinaryHeap returns the largest values first
		other.time.cmp(&self.time).then_with(|| other.key.cmp(&self.key))
	}
}

impl PartialOrd for EventNotice
{
	fn partial_cmp(&self, other: &EventNotice) -> Option<Ordering>
	{
		Some(self.cmp(other))
	}
}

/// Notices are never removed from the heap when they are cancelled. Instead
/// the clock remembers the one live notice for each process and notices that
/// no longer match are discarded as they reach the front.
pub struct Clock
{
	now: Time,
	heap: BinaryHeap<EventNotice>,
	live: Vec<Option<EventNotice>>,	// indexed by process
	counter: i64,
}

impl Clock
{
	pub fn new() -> Clock
	{
		Clock{now: Time::ZERO, heap: BinaryHeap::new(), live: Vec::new(), counter: 0}
	}

	pub fn now(&self) -> Time
	{
		self.now
	}

	/// Schedules process to resume at time. This supersedes any notice the
	/// process already had.
	pub fn post(&mut self, process: usize, time: Time, prior: bool) -> Result<EventNotice, KernelError>
	{
		if time < self.now {
			return Err(KernelError::PastScheduling{requested: time, now: self.now});
		}

		self.counter -= 1;
		let key = if prior {self.counter} else {-self.counter};
		let notice = EventNotice{time, key, process};
		if process >= self.live.len() {
			self.live.resize(process + 1, None);
		}
		self.live[process] = Some(notice);
		self.heap.push(notice);
		Ok(notice)
	}

	/// Returns the time the canceled notice was scheduled for.
	pub fn cancel(&mut self, process: usize) -> Option<Time>
	{
		self.live.get_mut(process).and_then(|n| n.take()).map(|n| n.time)
	}

	/// When the process is next scheduled to run.
	pub fn scheduled(&self, process: usize) -> Option<Time>
	{
		self.live.get(process).and_then(|n| n.map(|n| n.time))
	}

	/// Time of the next live notice or INFINITY if there are none.
	pub fn peek(&mut self) -> Time
	{
		self.discard_dead();
		self.heap.peek().map_or(Time::INFINITY, |n| n.time)
	}

	/// Removes the next live notice and advances the time to it. The
	/// process is no longer scheduled after this.
	pub fn pop(&mut self) -> Option<EventNotice>
	{
		self.discard_dead();
		let notice = self.heap.pop()?;
		self.live[notice.process] = None;
		self.now = notice.time;
		Some(notice)
	}

	/// Used when a run ends at a time limit with nothing left to do before it.
	pub fn advance_to(&mut self, time: Time)
	{
		if time > self.now && !time.is_infinite() {
			self.now = time;
		}
	}

	/// Number of live notices.
	pub fn len(&self) -> usize
	{
		self.live.iter().filter(|n| n.is_some()).count()
	}

	pub fn is_empty(&self) -> bool
	{
		self.live.iter().all(|n| n.is_none())
	}

	fn discard_dead(&mut self)
	{
		while let Some(top) = self.heap.peek() {
			if self.live.get(top.process).and_then(|n| *n) == Some(*top) {
				break;
			}
			self.heap.pop();
		}
	}
}

impl Default for Clock
{
	fn default() -> Self
	{
		Clock::new()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use proptest::prelude::*;

	fn drain(clock: &mut Clock) -> Vec<usize>
	{
		let mut result = Vec::new();
		while let Some(n) = clock.pop() {
			result.push(n.process);
		}
		result
	}

	#[test]
	fn time_ordering()
	{
		let mut clock = Clock::new();
		clock.post(0, Time(30), false).unwrap();
		clock.post(1, Time(10), false).unwrap();
		clock.post(2, Time(20), true).unwrap();
		assert_eq!(drain(&mut clock), vec![1, 2, 0]);
		assert_eq!(clock.now(), Time(30));
	}

	#[test]
	fn tie_break_law()
	{
		let mut clock = Clock::new();
		clock.post(0, Time(5), false).unwrap();
		clock.post(1, Time(5), true).unwrap();
		clock.post(2, Time(5), false).unwrap();
		clock.post(3, Time(5), true).unwrap();

		// prior before normal, prior LIFO, normal FIFO
		assert_eq!(drain(&mut clock), vec![3, 1, 0, 2]);
	}

	#[test]
	fn past_scheduling_is_fatal()
	{
		let mut clock = Clock::new();
		clock.post(0, Time(10), false).unwrap();
		clock.pop();
		let err = clock.post(0, Time(9), false).unwrap_err();
		assert_eq!(err, KernelError::PastScheduling{requested: Time(9), now: Time(10)});
	}

	#[test]
	fn cancel_is_lazy()
	{
		let mut clock = Clock::new();
		clock.post(0, Time(1), false).unwrap();
		clock.post(1, Time(2), false).unwrap();
		assert_eq!(clock.cancel(0), Some(Time(1)));
		assert_eq!(clock.cancel(0), None);
		assert_eq!(clock.scheduled(0), None);
		assert_eq!(clock.len(), 1);
		assert_eq!(clock.peek(), Time(2));
		assert_eq!(drain(&mut clock), vec![1]);
		assert_eq!(clock.peek(), Time::INFINITY);
	}

	#[test]
	fn repost_supersedes()
	{
		let mut clock = Clock::new();
		clock.post(0, Time(1), false).unwrap();
		clock.post(0, Time(7), false).unwrap();
		assert_eq!(clock.scheduled(0), Some(Time(7)));
		assert_eq!(drain(&mut clock), vec![0]);
		assert_eq!(clock.now(), Time(7));
	}

	proptest! {
		#[test]
		fn same_time_posts_follow_tie_break_law(priors in prop::collection::vec(any::<bool>(), 1..30)) {
			let mut clock = Clock::new();
			for (i, prior) in priors.iter().enumerate() {
				clock.post(i, Time(4), *prior).unwrap();
			}

			let mut expected: Vec<usize> = (0..priors.len()).filter(|i| priors[*i]).rev().collect();
			expected.extend((0..priors.len()).filter(|i| !priors[*i]));
			prop_assert_eq!(drain(&mut clock), expected);
		}
	}
}
