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
//! Processes suspend themselves by returning a `Command` from their computation.
//! The `Simulation` dispatches the command to the appropriate handler which then
//! decides when the process runs again.
use crate::buffer::*;
use crate::discipline::*;
use crate::level::*;
use crate::resource::*;
use crate::sim_event::*;
use crate::simulation::*;
use crate::store::*;
use std::fmt;

pub enum Command
{
	/// Resume after the delay (in ticks) elapses.
	Hold(i64),

	/// Sleep until some other process reactivates this one.
	Passivate,

	/// Acquire a unit of a resource, waiting if none are free.
	Request(Request),

	/// Give back a unit of a resource.
	Release(ResourceId),

	/// Wait until any of the events is signaled. Every process waiting
	/// on an event is woken when it is signaled.
	WaitEvent(Vec<EventId>),

	/// Like WaitEvent except that only the first process queued on an
	/// event is woken when it is signaled.
	QueueEvent(Vec<EventId>),

	/// Resume once the predicate is true. It's tested after every step.
	WaitUntil(Predicate),

	/// Take from a level or a store, waiting until enough is available.
	Get(Get),

	/// Add to a level or a store, waiting until there is room.
	Put(Put),

	/// Issue the blocking command but give up if the renege condition happens
	/// first. When the process resumes it should call `Context::acquired` (or
	/// `Context::stored` for puts) to find out which of the two happened.
	Renege(Blocking, Renege),
}

impl Command
{
	pub fn hold(delay: i64) -> Command
	{
		Command::Hold(delay)
	}

	pub fn passivate() -> Command
	{
		Command::Passivate
	}

	pub fn request(resource: ResourceId) -> Command
	{
		Command::Request(Request::new(resource))
	}

	pub fn release(resource: ResourceId) -> Command
	{
		Command::Release(resource)
	}

	pub fn wait_event(event: EventId) -> Command
	{
		Command::WaitEvent(vec![event])
	}

	pub fn wait_any(events: Vec<EventId>) -> Command
	{
		Command::WaitEvent(events)
	}

	pub fn queue_event(event: EventId) -> Command
	{
		Command::QueueEvent(vec![event])
	}

	pub fn queue_any(events: Vec<EventId>) -> Command
	{
		Command::QueueEvent(events)
	}

	pub fn wait_until<F>(predicate: F) -> Command
		where F: FnMut(&Simulation) -> bool + 'static
	{
		Command::WaitUntil(Box::new(predicate))
	}

	pub fn renege<B: Into<Blocking>>(primary: B, renege: Renege) -> Command
	{
		Command::Renege(primary.into(), renege)
	}
}

impl From<Request> for Command
{
	fn from(request: Request) -> Command
	{
		Command::Request(request)
	}
}

impl From<Get> for Command
{
	fn from(get: Get) -> Command
	{
		Command::Get(get)
	}
}

impl From<Put> for Command
{
	fn from(put: Put) -> Command
	{
		Command::Put(put)
	}
}

impl fmt::Debug for Command
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match *self {
			Command::Hold(delay) => write!(formatter, "hold {}", delay),
			Command::Passivate => write!(formatter, "passivate"),
			Command::Request(ref r) => write!(formatter, "{:?}", r),
			Command::Release(resource) => write!(formatter, "release {}", resource),
			Command::WaitEvent(ref events) => write!(formatter, "wait on {}", names(events)),
			Command::QueueEvent(ref events) => write!(formatter, "queue on {}", names(events)),
			Command::WaitUntil(_) => write!(formatter, "wait until"),
			Command::Get(ref g) => write!(formatter, "{:?}", g),
			Command::Put(ref p) => write!(formatter, "{:?}", p),
			Command::Renege(ref b, ref r) => write!(formatter, "{:?} or {:?}", b, r),
		}
	}
}

fn names(events: &[EventId]) -> String
{
	let names: Vec<String> = events.iter().map(|e| e.to_string()).collect();
	names.join(" | ")
}

#[derive(Clone, Copy, PartialEq)]
pub struct Request
{
	pub resource: ResourceId,
	pub priority: Priority,
}

impl Request
{
	pub fn new(resource: ResourceId) -> Request
	{
		Request{resource, priority: DEFAULT_PRIORITY}
	}

	pub fn with_priority(self, priority: Priority) -> Request
	{
		Request{priority, ..self}
	}
}

impl fmt::Debug for Request
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "request {} (priority {})", self.resource, self.priority)
	}
}

/// What a get from a `Store` asks for.
pub enum Want
{
	/// The first N items.
	Count(usize),

	/// Whatever items the filter selects (as indexes into the store's contents).
	/// The get is satisfied once the selection is non-empty.
	Filter(Filter),
}

pub enum Get
{
	Level { level: LevelId, amount: f64, priority: Priority },
	Store { store: StoreId, want: Want, priority: Priority },
}

impl Get
{
	pub fn amount(level: LevelId, amount: f64) -> Get
	{
		Get::Level{level, amount, priority: DEFAULT_PRIORITY}
	}

	pub fn items(store: StoreId, count: usize) -> Get
	{
		Get::Store{store, want: Want::Count(count), priority: DEFAULT_PRIORITY}
	}

	pub fn filtered<F>(store: StoreId, filter: F) -> Get
		where F: Fn(&[Item]) -> Vec<usize> + 'static
	{
		Get::Store{store, want: Want::Filter(Box::new(filter)), priority: DEFAULT_PRIORITY}
	}

	pub fn with_priority(self, priority: Priority) -> Get
	{
		match self {
			Get::Level{level, amount, ..} => Get::Level{level, amount, priority},
			Get::Store{store, want, ..} => Get::Store{store, want, priority},
		}
	}

	pub fn buffer(&self) -> BufferId
	{
		match *self {
			Get::Level{level, ..} => BufferId::Level(level),
			Get::Store{store, ..} => BufferId::Store(store),
		}
	}
}

impl fmt::Debug for Get
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match *self {
			Get::Level{level, amount, priority} => write!(formatter, "get {} from {} (priority {})", amount, level, priority),
			Get::Store{store, want: Want::Count(n), priority} => write!(formatter, "get {} from {} (priority {})", n, store, priority),
			Get::Store{store, want: Want::Filter(_), priority} => write!(formatter, "get filtered from {} (priority {})", store, priority),
		}
	}
}

pub enum Put
{
	Level { level: LevelId, amount: f64, priority: Priority },
	Store { store: StoreId, items: Vec<Item>, priority: Priority },
}

impl Put
{
	pub fn amount(level: LevelId, amount: f64) -> Put
	{
		Put::Level{level, amount, priority: DEFAULT_PRIORITY}
	}

	pub fn items(store: StoreId, items: Vec<Item>) -> Put
	{
		Put::Store{store, items, priority: DEFAULT_PRIORITY}
	}

	pub fn with_priority(self, priority: Priority) -> Put
	{
		match self {
			Put::Level{level, amount, ..} => Put::Level{level, amount, priority},
			Put::Store{store, items, ..} => Put::Store{store, items, priority},
		}
	}

	pub fn buffer(&self) -> BufferId
	{
		match *self {
			Put::Level{level, ..} => BufferId::Level(level),
			Put::Store{store, ..} => BufferId::Store(store),
		}
	}
}

impl fmt::Debug for Put
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match *self {
			Put::Level{level, amount, priority} => write!(formatter, "put {} into {} (priority {})", amount, level, priority),
			Put::Store{store, ref items, priority} => write!(formatter, "put {} items into {} (priority {})", items.len(), store, priority),
		}
	}
}

/// The commands that may be combined with a renege condition.
#[derive(Debug)]
pub enum Blocking
{
	Request(Request),
	Get(Get),
	Put(Put),
}

impl Blocking
{
	/// The queue the process will be waiting in if it blocks.
	pub fn seat(&self) -> Seat
	{
		match *self {
			Blocking::Request(ref r) => Seat::Resource(r.resource),
			Blocking::Get(ref g) => Seat::Get(g.buffer()),
			Blocking::Put(ref p) => Seat::Put(p.buffer()),
		}
	}
}

impl From<Request> for Blocking
{
	fn from(request: Request) -> Blocking
	{
		Blocking::Request(request)
	}
}

impl From<Get> for Blocking
{
	fn from(get: Get) -> Blocking
	{
		Blocking::Get(get)
	}
}

impl From<Put> for Blocking
{
	fn from(put: Put) -> Blocking
	{
		Blocking::Put(put)
	}
}

/// Why a blocked process gives up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Renege
{
	/// After this many ticks.
	Hold(i64),

	/// When the event is signaled.
	WaitEvent(EventId),
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::handle::*;

	#[test]
	fn builders()
	{
		let sim = SimId::next();
		let res = ResourceId::new(sim, 0);
		let level = LevelId::new(sim, 1);

		match Command::from(Request::new(res).with_priority(4)) {
			Command::Request(r) => assert_eq!(r.priority, 4),
			other => panic!("unexpected {:?}", other),
		}

		let get = Get::amount(level, 2.5).with_priority(3);
		assert_eq!(get.buffer(), BufferId::Level(level));
		match Command::renege(get, Renege::Hold(5)) {
			Command::Renege(b, Renege::Hold(5)) => assert_eq!(b.seat(), Seat::Get(BufferId::Level(level))),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn debug_summaries()
	{
		let sim = SimId::next();
		let res = ResourceId::new(sim, 2);
		assert_eq!(format!("{:?}", Command::hold(5)), "hold 5");
		assert_eq!(format!("{:?}", Command::release(res)), "release resource#2");
		let ev = EventId::new(sim, 0);
		let ev2 = EventId::new(sim, 1);
		assert_eq!(format!("{:?}", Command::wait_any(vec![ev, ev2])), "wait on event#0 | event#1");
	}
}
