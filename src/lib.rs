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
#[macro_use]
mod handle;
#[macro_use]
pub mod logging;

pub mod buffer;
mod clock;
pub mod command;
pub mod config;
pub mod context;
pub mod discipline;
pub mod errors;
pub mod level;
pub mod process;
mod processes;
mod renege;
pub mod resource;
pub mod sim_event;
pub mod sim_time;
pub mod simulation;
pub mod statistic;
pub mod store;
pub mod tracer;

pub use buffer::*;
pub use command::*;
pub use config::*;
pub use context::*;
pub use discipline::*;
pub use errors::*;
pub use handle::{Handle, SimId};
pub use level::*;
pub use logging::*;
pub use process::*;
pub use resource::*;
pub use sim_event::*;
pub use sim_time::*;
pub use simulation::*;
pub use statistic::{SharedStatistic, Statistic};
pub use store::*;
pub use tracer::*;
