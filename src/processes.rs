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
use crate::process::*;

/// Contains all the `Process`es used within the `Simulation`, indexed by the
/// index of their `ProcessId`. Processes are never removed: terminated ones
/// simply drop their computation.
pub struct Processes
{
	processes: Vec<Process>,
	max_name_len: usize,	// used to align log output
}

impl Processes
{
	pub fn new() -> Processes
	{
		Processes{processes: Vec::new(), max_name_len: 0}
	}

	/// Returns the index of the new process.
	pub fn append(&mut self, process: Process) -> usize
	{
		self.max_name_len = self.max_name_len.max(process.name.chars().count());
		self.processes.push(process);
		self.processes.len() - 1
	}

	pub fn get(&self, index: usize) -> &Process
	{
		&self.processes[index]
	}

	pub fn get_mut(&mut self, index: usize) -> &mut Process
	{
		&mut self.processes[index]
	}

	pub fn name(&self, index: usize) -> &str
	{
		&self.processes[index].name
	}

	/// Iterates over all the processes.
	pub fn iter(&self) -> impl Iterator<Item=&Process>
	{
		self.processes.iter()
	}

	pub fn max_name_len(&self) -> usize
	{
		self.max_name_len
	}

	pub fn len(&self) -> usize
	{
		self.processes.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.processes.is_empty()
	}
}

impl Default for Processes
{
	fn default() -> Self
	{
		Processes::new()
	}
}
