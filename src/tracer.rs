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
use crate::command::*;
use crate::sim_time::*;

/// Tracers are notified as the `Simulation` dispatches commands. This keeps
/// tracing out of the dispatch code: register one with `Simulation::add_tracer`.
pub trait Tracer
{
	/// Called after a process yields a command but before the kernel acts on it.
	fn before_dispatch(&mut self, now: Time, process: &str, command: &Command)
	{
		let _ = (now, process, command);
	}

	/// Called once the command has been handled and waituntil conditions tested.
	fn after_dispatch(&mut self, now: Time, process: &str)
	{
		let _ = (now, process);
	}

	/// Called when a process finishes its computation.
	fn terminated(&mut self, now: Time, process: &str)
	{
		let _ = (now, process);
	}
}
