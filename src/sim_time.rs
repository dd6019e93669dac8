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
use std::fmt;

/// To better support deterministic execution time is stored
/// using 64-bit integer ticks. `Config::time_units` says how
/// many ticks make up a second when times are logged or parsed.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Time(pub i64);	// signed so that differences and "time left" values are easy to express

impl Time
{
	pub const ZERO: Time = Time(0);

	/// Returned by `Simulation::peek` when nothing is scheduled.
	pub const INFINITY: Time = Time(i64::MAX);

	/// Returns the time `delay` ticks after self, saturating at INFINITY.
	pub fn plus(self, delay: i64) -> Time
	{
		Time(self.0.saturating_add(delay))
	}

	/// Like plus but returns None if the result can't be scheduled, i.e. it
	/// would reach INFINITY.
	pub fn checked_plus(self, delay: i64) -> Option<Time>
	{
		self.0.checked_add(delay).map(Time).filter(|t| !t.is_infinite())
	}

	/// Number of ticks from `earlier` to self.
	pub fn since(self, earlier: Time) -> i64
	{
		self.0 - earlier.0
	}

	pub fn is_infinite(self) -> bool
	{
		self == Time::INFINITY
	}
}

impl fmt::Display for Time
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		if self.is_infinite() {
			write!(formatter, "inf")
		} else {
			write!(formatter, "{}", self.0)
		}
	}
}
