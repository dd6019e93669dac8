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
use crate::logging::*;
use crate::sim_time::*;

/// Used to configure the `Simulation`.
pub struct Config
{
	/// Number of ticks in a second, e.g. use 1_000.0 for ms. This only
	/// affects how times are logged and how `parse_max_time` scales its
	/// argument. Defaults to 1.0.
	pub time_units: f64,

	/// The time `Simulation::run` stops at.
	/// Defaults to INFINITY.
	pub max_time: Time,

	/// Random number generator seed.
	/// Defaults to 0 which means seed with entropy. Note that if you want
	/// deterministic results you should use a fixed seed.
	pub seed: u64,

	/// Defaults to Info.
	pub log_level: LogLevel,

	/// The first glob that matches a process name overrides log_level.
	pub log_levels: Vec<(glob::Pattern, LogLevel)>,

	/// Use escape sequences to color code stdout.
	/// Defaults to true.
	pub colorize: bool,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to bright red. See https://en.wikipedia.org/wiki/ANSI_escape_code#Colors
	/// and https://aweirdimagination.net/2015/02/21/256-color-terminals for information on
	/// color escape codes.
	pub error_escape_code: String,

	/// Defaults to red.
	pub warning_escape_code: String,

	/// Defaults to bold black.
	pub info_escape_code: String,

	/// Defaults to black.
	pub debug_escape_code: String,

	/// Defaults to light gray.
	pub excessive_escape_code: String,
}

impl Config
{
	pub fn new() -> Config
	{
		Config {
			time_units: 1.0,
			max_time: Time::INFINITY,
			seed: 0,
			log_level: LogLevel::Info,
			log_levels: Vec::new(),
			colorize: true,
			error_escape_code: "\x1b[31;1m".to_string(),
			warning_escape_code: "\x1b[31m".to_string(),
			info_escape_code: "\x1b[30;1m".to_string(),
			debug_escape_code: "".to_string(),
			excessive_escape_code: "\x1b[1;38;5;244m".to_string(),
		}
	}

	/// Returns an error message if level isn't a valid level.
	pub fn parse_log_level(&mut self, level: &str) -> Option<String>
	{
		match LogLevel::parse(level) {
			Some(l) => {self.log_level = l; None},
			None => Some(format!("--log-level should be {}", log_levels())),
		}
	}

	/// Entries look like "LEVEL:GLOB", e.g. "debug:customer*".
	pub fn parse_log_levels(&mut self, values: Vec<&str>) -> Option<String>
	{
		for value in values {
			let parts: Vec<&str> = value.splitn(2, ':').collect();
			if parts.len() != 2 {
				return Some("--log should be formatted as LEVEL:GLOB".to_string());
			}

			let level = match LogLevel::parse(parts[0]) {
				Some(l) => l,
				None => return Some(format!("--log level should be {}", log_levels())),
			};

			match glob::Pattern::new(parts[1]) {
				Ok(pattern) => self.log_levels.push((pattern, level)),
				Err(e) => return Some(format!("--log glob '{}' is malformed: {}", parts[1], e.msg)),
			}
		}
		None
	}

	/// The value is a number with an optional time suffix, see time_suffixes.
	pub fn parse_max_time(&mut self, text: &str) -> Option<String>
	{
		let (digits, scale) = match text.chars().last() {
			Some('s') => (&text[..text.len()-1], 1.0),
			Some('m') => (&text[..text.len()-1], 60.0),
			Some('h') => (&text[..text.len()-1], 60.0*60.0),
			Some('d') => (&text[..text.len()-1], 24.0*60.0*60.0),
			_ => (text, 1.0),
		};

		match digits.parse::<f64>() {
			Ok(value) if value >= 0.0 => {
				self.max_time = Time((value*scale*self.time_units).round() as i64);
				None
			},
			_ => Some("--max-time should be a non-negative number with an optional time suffix".to_string()),
		}
	}

	/// Number of decimal places to use when logging times.
	pub fn precision(&self) -> usize
	{
		self.time_units.log10().max(0.0).ceil() as usize
	}
}

impl Default for Config
{
	fn default() -> Self
	{
		Config::new()
	}
}

/// For use in --help messages.
pub fn time_suffixes() -> &'static str
{
	"s, m, h, or d"
}
