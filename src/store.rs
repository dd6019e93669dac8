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
use std::any::Any;
use std::cmp::Ordering;

define_handle!(StoreId, "store");

/// Stores hold arbitrary objects: use downcast_ref to get at them.
pub type Item = Box<dyn Any>;

/// Selects items to get from a store by returning their indexes. Out of range
/// and repeated indexes are ignored.
pub type Filter = Box<dyn Fn(&[Item]) -> Vec<usize>>;

/// Used to keep the contents of a store sorted.
pub type Comparator = Box<dyn Fn(&Item, &Item) -> Ordering>;

/// A buffer of discrete items, e.g. parts waiting to be assembled. Gets for a
/// number of items are served head first like `Level`. But a filtered get
/// that selects nothing does not block the gets queued behind it.
pub struct Store
{
	pub name: String,
	capacity: usize,
	pub(crate) items: Vec<Item>,
	comparator: Option<Comparator>,
	pub(crate) get_queue: WaitQueue<Want>,
	pub(crate) put_queue: WaitQueue<Vec<Item>>,
	buffered_monitor: Option<SharedStatistic>,
	get_monitor: Option<SharedStatistic>,
	put_monitor: Option<SharedStatistic>,
}

impl Store
{
	/// An empty store with unbounded capacity and FIFO queues.
	pub fn new(name: &str) -> Store
	{
		Store {
			name: name.to_string(),
			capacity: usize::MAX,
			items: Vec::new(),
			comparator: None,
			get_queue: WaitQueue::new(Discipline::Fifo),
			put_queue: WaitQueue::new(Discipline::Fifo),
			buffered_monitor: None,
			get_monitor: None,
			put_monitor: None,
		}
	}

	pub fn with_capacity(self, capacity: usize) -> Store
	{
		Store{capacity, ..self}
	}

	pub fn with_items(self, items: Vec<Item>) -> Store
	{
		Store{items, ..self}
	}

	/// Contents are re-sorted after every put.
	pub fn sorted_by<F>(self, comparator: F) -> Store
		where F: Fn(&Item, &Item) -> Ordering + 'static
	{
		Store{comparator: Some(Box::new(comparator)), ..self}
	}

	pub fn with_get_discipline(self, discipline: Discipline) -> Store
	{
		Store{get_queue: WaitQueue::new(discipline), ..self}
	}

	pub fn with_put_discipline(self, discipline: Discipline) -> Store
	{
		Store{put_queue: WaitQueue::new(discipline), ..self}
	}

	/// Observes the number of buffered items.
	pub fn buffered_monitor(self, monitor: SharedStatistic) -> Store
	{
		Store{buffered_monitor: Some(monitor), ..self}
	}

	pub fn get_monitor(self, monitor: SharedStatistic) -> Store
	{
		Store{get_monitor: Some(monitor), ..self}
	}

	pub fn put_monitor(self, monitor: SharedStatistic) -> Store
	{
		Store{put_monitor: Some(monitor), ..self}
	}

	pub fn capacity(&self) -> usize
	{
		self.capacity
	}

	pub fn items(&self) -> &[Item]
	{
		&self.items
	}

	pub(crate) fn observe(&self, now: Time)
	{
		observe(&self.buffered_monitor, self.items.len() as f64, now);
		observe(&self.get_monitor, self.get_queue.len() as f64, now);
		observe(&self.put_monitor, self.put_queue.len() as f64, now);
	}

	fn has_room(&self, count: usize) -> bool
	{
		self.items.len().saturating_add(count) <= self.capacity
	}

	fn add(&mut self, items: Vec<Item>)
	{
		self.items.extend(items);
		if let Some(ref comparator) = self.comparator {
			self.items.sort_by(|a, b| comparator(a, b));
		}
	}

	// Returns None if the want can't be satisfied yet.
	fn take(&mut self, want: &Want) -> Option<Vec<Item>>
	{
		take_wanted(&mut self.items, want)
	}

	// An unsatisfied count stops the scan. An unsatisfied filter is skipped.
	fn serve_getters(&mut self) -> Vec<(usize, Vec<Item>)>
	{
		let mut served = Vec::new();
		let mut i = 0;
		while i < self.get_queue.len() {
			let (items, is_filter) = match self.get_queue.get(i) {
				Some(w) => (take_wanted(&mut self.items, &w.demand), matches!(w.demand, Want::Filter(_))),
				None => break,
			};
			match items {
				Some(items) => {
					if let Some(w) = self.get_queue.remove(i) {
						served.push((w.process, items));
					}
				},
				None if is_filter => i += 1,
				None => break,
			}
		}
		served
	}

	fn serve_putters(&mut self) -> Vec<usize>
	{
		let mut served = Vec::new();
		while self.put_queue.front().map_or(false, |w| self.has_room(w.demand.len())) {
			if let Some(w) = self.put_queue.leave() {
				self.add(w.demand);
				served.push(w.process);
			}
		}
		served
	}
}

fn take_wanted(items: &mut Vec<Item>, want: &Want) -> Option<Vec<Item>>
{
	match *want {
		Want::Count(count) if count <= items.len() => Some(items.drain(..count).collect()),
		Want::Count(_) => None,
		Want::Filter(ref filter) => {
			let selection = sanitize(filter(items), items.len());
			if selection.is_empty() {
				None
			} else {
				Some(take_selected(items, &selection))
			}
		},
	}
}

/// Drops out of range and duplicate indexes, preserving the order given.
fn sanitize(selection: Vec<usize>, len: usize) -> Vec<usize>
{
	let mut result: Vec<usize> = Vec::with_capacity(selection.len());
	for index in selection {
		if index < len && !result.contains(&index) {
			result.push(index);
		}
	}
	result
}

/// Removes the selected items, returning them in selection order. The
/// remaining items keep their relative order.
fn take_selected(items: &mut Vec<Item>, selection: &[usize]) -> Vec<Item>
{
	let mut slots: Vec<Option<Item>> = items.drain(..).map(Some).collect();
	let taken = selection.iter().filter_map(|&i| slots[i].take()).collect();
	items.extend(slots.into_iter().flatten());
	taken
}

impl Simulation
{
	pub fn add_store(&mut self, store: Store) -> SimResult<StoreId>
	{
		if store.items.len() > store.capacity {
			return Err(SimulationError::OverCapacity{
				buffer: store.name.clone(),
				initial: store.items.len() as f64,
				capacity: store.capacity as f64}.into());
		}

		let mut store = store;
		if let Some(comparator) = store.comparator.take() {
			store.items.sort_by(|a, b| comparator(a, b));
			store.comparator = Some(comparator);
		}
		self.stores.push(store);
		Ok(StoreId::new(self.id(), self.stores.len() - 1))
	}

	pub fn store(&self, store: StoreId) -> SimResult<&Store>
	{
		self.owns(store)?;
		Ok(&self.stores[store.index()])
	}

	/// The buffered items.
	pub fn store_items(&self, store: StoreId) -> SimResult<&[Item]>
	{
		Ok(&self.store(store)?.items)
	}

	pub(crate) fn get_items(&mut self, index: usize, store: StoreId, want: Want, priority: Priority) -> SimResult<()>
	{
		self.owns(store)?;
		let s = store.index();
		self.processes.get_mut(index).priorities.insert(Seat::Get(BufferId::Store(store)), priority);

		let now = self.now();
		match self.stores[s].take(&want) {
			Some(items) => {
				self.processes.get_mut(index).got = Got::Items(items);
				self.post(index, now, true)?;

				let served = self.stores[s].serve_putters();
				for putter in served {
					self.reschedule(putter, now, false)?;
				}
			},
			None => {
				self.stores[s].get_queue.enter(Waiter::new(index, priority, want));
				self.log_for(LogLevel::Debug, Some(index), &format!("waiting to get from {}", self.stores[s].name));
			},
		}
		self.stores[s].observe(now);
		Ok(())
	}

	pub(crate) fn put_items(&mut self, index: usize, store: StoreId, items: Vec<Item>, priority: Priority) -> SimResult<()>
	{
		self.owns(store)?;
		let s = store.index();
		self.processes.get_mut(index).priorities.insert(Seat::Put(BufferId::Store(store)), priority);

		let now = self.now();
		if self.stores[s].has_room(items.len()) {
			self.stores[s].add(items);
			let served = self.stores[s].serve_getters();
			for (getter, got) in served {
				self.processes.get_mut(getter).got = Got::Items(got);
				self.reschedule(getter, now, false)?;
			}
			self.post(index, now, true)?;
		} else {
			let count = items.len();
			self.stores[s].put_queue.enter(Waiter::new(index, priority, items));
			self.log_for(LogLevel::Debug, Some(index), &format!("waiting to put {} items into {}", count, self.stores[s].name));
		}
		self.stores[s].observe(now);
		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn boxed(values: &[i32]) -> Vec<Item>
	{
		values.iter().map(|&v| Box::new(v) as Item).collect()
	}

	fn values(items: &[Item]) -> Vec<i32>
	{
		items.iter().filter_map(|i| i.downcast_ref::<i32>().cloned()).collect()
	}

	#[test]
	fn sanitize_selection()
	{
		assert_eq!(sanitize(vec![3, 1, 3, 9, 0], 4), vec![3, 1, 0]);
		assert!(sanitize(vec![5], 2).is_empty());
	}

	#[test]
	fn take_selected_keeps_order()
	{
		let mut items = boxed(&[10, 11, 12, 13]);
		let taken = take_selected(&mut items, &[2, 0]);
		assert_eq!(values(&taken), vec![12, 10]);
		assert_eq!(values(&items), vec![11, 13]);
	}

	#[test]
	fn sorted_store()
	{
		let mut store = Store::new("bins").sorted_by(|a, b| {
			let a = a.downcast_ref::<i32>().cloned().unwrap_or(0);
			let b = b.downcast_ref::<i32>().cloned().unwrap_or(0);
			a.cmp(&b)
		});
		store.add(boxed(&[5, 1, 3]));
		assert_eq!(values(store.items()), vec![1, 3, 5]);
	}

	#[test]
	fn counts_block_but_filters_are_skipped()
	{
		let mut store = Store::new("parts");
		store.get_queue.enter(Waiter::new(0, 0, Want::Filter(Box::new(|items: &[Item]| -> Vec<usize> {
			items.iter().position(|i| i.downcast_ref::<i32>() == Some(&99)).into_iter().collect()
		}))));
		store.get_queue.enter(Waiter::new(1, 0, Want::Count(1)));
		store.get_queue.enter(Waiter::new(2, 0, Want::Count(5)));
		store.get_queue.enter(Waiter::new(3, 0, Want::Count(1)));

		store.add(boxed(&[7, 8]));
		let served = store.serve_getters();
		let who: Vec<usize> = served.iter().map(|&(p, _)| p).collect();
		assert_eq!(who, vec![1]);
		assert_eq!(store.get_queue.processes(), vec![0, 2, 3]);
		assert_eq!(values(store.items()), vec![8]);
	}

	#[test]
	fn room()
	{
		let store = Store::new("bin").with_capacity(2).with_items(boxed(&[1]));
		assert!(store.has_room(1));
		assert!(!store.has_room(2));
		assert!(Store::new("any").has_room(usize::MAX));
	}
}
