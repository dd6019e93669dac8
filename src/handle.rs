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
//! Entities are owned by the `Simulation` and referenced using small handles
//! instead of rust references. Each handle also records which simulation
//! created it so that handles cannot be used with some other instance.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SIM_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a `Simulation` instance. These are unique within the process.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SimId(u64);

impl SimId
{
	pub(crate) fn next() -> SimId
	{
		SimId(NEXT_SIM_ID.fetch_add(1, Ordering::Relaxed))
	}
}

impl fmt::Display for SimId
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "sim{}", self.0)
	}
}

/// Implemented by all the handle types.
pub trait Handle: Copy + fmt::Display
{
	/// Used in error messages, e.g. "resource".
	const KIND: &'static str;

	fn sim(&self) -> SimId;

	fn index(&self) -> usize;
}

macro_rules! define_handle
{
	($(#[$attr:meta])* $name:ident, $kind:expr) => (
		$(#[$attr])*
		#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
		pub struct $name
		{
			sim: $crate::handle::SimId,
			index: usize,
		}

		impl $name
		{
			pub(crate) fn new(sim: $crate::handle::SimId, index: usize) -> $name
			{
				$name{sim, index}
			}
		}

		impl $crate::handle::Handle for $name
		{
			const KIND: &'static str = $kind;

			fn sim(&self) -> $crate::handle::SimId
			{
				self.sim
			}

			fn index(&self) -> usize
			{
				self.index
			}
		}

		impl ::std::fmt::Display for $name
		{
			fn fmt(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result
			{
				write!(formatter, "{}#{}", $kind, self.index)
			}
		}
	);
}

#[cfg(test)]
mod tests
{
	use super::*;

	define_handle!(ThingId, "thing");

	#[test]
	fn sim_ids_are_unique()
	{
		let a = SimId::next();
		let b = SimId::next();
		assert_ne!(a, b);
	}

	#[test]
	fn handles_remember_their_sim()
	{
		let sim = SimId::next();
		let id = ThingId::new(sim, 3);
		assert_eq!(id.sim(), sim);
		assert_eq!(id.index(), 3);
		assert_eq!(format!("{}", id), "thing#3");
		assert_ne!(id, ThingId::new(SimId::next(), 3));
	}
}
