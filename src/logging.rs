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
#![macro_use]

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd)]
pub enum LogLevel
{
	Error,	// update log_levels and parse if this changes
	Warning,
	Info,
	Debug,
	Excessive
}

impl LogLevel
{
	pub fn parse(text: &str) -> Option<LogLevel>
	{
		match text {
			"error" => Some(LogLevel::Error),
			"warning" => Some(LogLevel::Warning),
			"info" => Some(LogLevel::Info),
			"debug" => Some(LogLevel::Debug),
			"excessive" => Some(LogLevel::Excessive),
			_ => None,
		}
	}
}

/// For use in --help messages.
pub fn log_levels() -> &'static str
{
	"error, warning, info, debug, or excessive"
}

/// Generic macro that calls a `log` method, e.g. on `Context` or `Simulation`.
/// More often you'll use one of the other macros like log_info!.
#[macro_export]
macro_rules! log_at
{
	($target:expr, $level:expr) => ($target.log($level, ""));
	($target:expr, $level:expr, $msg:expr) => ($target.log($level, $msg));
	($target:expr, $level:expr, $fmt:expr, $($arg:tt)*) => ($target.log($level, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_error
{
	($target:expr) => ($target.log($crate::LogLevel::Error, ""));
	($target:expr, $msg:expr) => ($target.log($crate::LogLevel::Error, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log($crate::LogLevel::Error, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_warning
{
	($target:expr) => ($target.log($crate::LogLevel::Warning, ""));
	($target:expr, $msg:expr) => ($target.log($crate::LogLevel::Warning, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log($crate::LogLevel::Warning, &format!($fmt, $($arg)*)));
}

/// # Examples
///
/// ```ignore
/// log_info!(ctx);						// logs an empty line
/// log_info!(ctx, "hello");			// logs a string
/// log_info!(ctx, "x = {:?}", x);		// logs using a format string
/// ```
#[macro_export]
macro_rules! log_info
{
	($target:expr) => ($target.log($crate::LogLevel::Info, ""));
	($target:expr, $msg:expr) => ($target.log($crate::LogLevel::Info, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log($crate::LogLevel::Info, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_debug
{
	($target:expr) => ($target.log($crate::LogLevel::Debug, ""));
	($target:expr, $msg:expr) => ($target.log($crate::LogLevel::Debug, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log($crate::LogLevel::Debug, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_excessive
{
	($target:expr) => ($target.log($crate::LogLevel::Excessive, ""));
	($target:expr, $msg:expr) => ($target.log($crate::LogLevel::Excessive, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log($crate::LogLevel::Excessive, &format!($fmt, $($arg)*)));
}

#[cfg(test)]
mod tests
{
	use super::*;

	struct Sink
	{
		lines: Vec<(LogLevel, String)>,
	}

	impl Sink
	{
		fn log(&mut self, level: LogLevel, message: &str)
		{
			self.lines.push((level, message.to_string()));
		}
	}

	#[test]
	fn levels_are_ordered_by_verbosity()
	{
		assert!(LogLevel::Error < LogLevel::Warning);
		assert!(LogLevel::Debug < LogLevel::Excessive);
	}

	#[test]
	fn parse()
	{
		assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
		assert_eq!(LogLevel::parse("loud"), None);
	}

	#[test]
	fn macros_format()
	{
		let mut sink = Sink{lines: Vec::new()};
		log_info!(sink, "x = {}", 3);
		log_excessive!(sink);
		log_at!(sink, LogLevel::Warning, "careful");
		assert_eq!(sink.lines, vec![
			(LogLevel::Info, "x = 3".to_string()),
			(LogLevel::Excessive, "".to_string()),
			(LogLevel::Warning, "careful".to_string())]);
	}
}
