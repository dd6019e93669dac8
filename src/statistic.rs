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
//! Resources and buffers can report their queue lengths and contents to an
//! external statistics collector. Anything with an `observe` method will do.
use crate::sim_time::*;
use std::cell::RefCell;
use std::rc::Rc;

pub trait Statistic
{
	fn observe(&mut self, value: f64, time: Time);
}

/// Collectors are shared with the model so that results can be read after a run.
pub type SharedStatistic = Rc<RefCell<dyn Statistic>>;

/// The simplest collector: records every observation.
impl Statistic for Vec<(Time, f64)>
{
	fn observe(&mut self, value: f64, time: Time)
	{
		self.push((time, value));
	}
}

pub(crate) fn observe(statistic: &Option<SharedStatistic>, value: f64, time: Time)
{
	if let Some(ref s) = *statistic {
		s.borrow_mut().observe(value, time);
	}
}
