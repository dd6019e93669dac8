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
//! There are two classes of errors. A `SimulationError` is a problem with the
//! model, e.g. a negative hold delay. These are raised before any state changes
//! so a model may catch one and stop the run in a controlled way (`simulate`
//! does exactly that). A `KernelError` means one of the kernel's own invariants
//! was violated and the run cannot continue.
use crate::sim_time::*;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationError
{
	#[error("{kind} {handle} belongs to a different simulation")]
	ForeignEntity { kind: &'static str, handle: String },

	#[error("process {0} has already been activated")]
	AlreadyActivated(String),

	#[error("process {0} cannot be resumed (terminated or never activated)")]
	NotResumable(String),

	#[error("delay {0} is negative")]
	NegativeDelay(i64),

	#[error("can't schedule {delay} ticks after {now}: that is past the end of time")]
	TimeOverflow { now: Time, delay: i64 },

	#[error("{buffer}: amount {amount} is not a non-negative number")]
	InvalidAmount { buffer: String, amount: f64 },

	#[error("{entity}: capacity {capacity} is invalid")]
	InvalidCapacity { entity: String, capacity: f64 },

	#[error("{buffer}: initial contents ({initial}) exceed the capacity ({capacity})")]
	OverCapacity { buffer: String, initial: f64, capacity: f64 },

	#[error("process {process} does not hold a unit of {resource}")]
	NotHolding { process: String, resource: String },

	#[error("process {0} waited on an empty list of events")]
	EmptyEventList(String),

	/// Raised by model code from within a `Computation`.
	#[error("{0}")]
	Model(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum KernelError
{
	#[error("can't schedule an event at {requested} when the current time is {now}")]
	PastScheduling { requested: Time, now: Time },

	#[error("process {0} was scheduled after it terminated")]
	ResumedTerminated(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error
{
	#[error(transparent)]
	Simulation(#[from] SimulationError),

	#[error(transparent)]
	Kernel(#[from] KernelError),
}

/// What computations and the fallible `Simulation` and `Context` methods return.
pub type SimResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn past_scheduling_message()
	{
		let e = KernelError::PastScheduling{requested: Time(3), now: Time(10)};
		let s = e.to_string();
		assert!(s.contains("at 3"), "{}", s);
		assert!(s.contains("is 10"), "{}", s);
	}

	#[test]
	fn umbrella_is_transparent()
	{
		let e: Error = SimulationError::NegativeDelay(-2).into();
		assert_eq!(e.to_string(), "delay -2 is negative");
		assert!(matches!(e, Error::Simulation(_)));

		let e: Error = KernelError::ResumedTerminated("bob".to_string()).into();
		assert!(matches!(e, Error::Kernel(_)));
	}

	#[test]
	fn is_std_error()
	{
		let e: Box<dyn std::error::Error> = Box::new(SimulationError::Model("boom".to_string()));
		assert_eq!(e.to_string(), "boom");
	}
}
