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
use crate::clock::*;
use crate::command::*;
use crate::config::*;
use crate::context::*;
use crate::errors::*;
use crate::handle::*;
use crate::level::*;
use crate::logging::*;
use crate::process::*;
use crate::processes::*;
use crate::resource::*;
use crate::sim_event::*;
use crate::sim_time::*;
use crate::store::*;
use crate::tracer::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::max;
use std::fmt;
use std::mem;

/// Tested after every step on behalf of a process waiting in a `WaitUntil`.
pub type Predicate = Box<dyn FnMut(&Simulation) -> bool>;

/// When `activate` and `reactivate` should schedule a process. Times before
/// the current time are treated as the current time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum When
{
	Now,
	At(Time),
	Delay(i64),
}

/// How a call to `simulate` ended.
#[derive(Clone, Debug, PartialEq)]
pub enum RunStatus
{
	/// The time limit was reached.
	Completed { at: Time },

	/// There were no more events to process.
	Exhausted { at: Time },

	/// A process (or the model) asked for the run to stop.
	Stopped { at: Time },

	/// A process raised a `SimulationError`.
	Aborted { at: Time, error: SimulationError },
}

impl fmt::Display for RunStatus
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match *self {
			RunStatus::Completed{at} => write!(formatter, "normal exit at time {}", at),
			RunStatus::Exhausted{at} => write!(formatter, "no more events at time {}", at),
			RunStatus::Stopped{at} => write!(formatter, "run stopped at time {}", at),
			RunStatus::Aborted{at, ref error} => write!(formatter, "simulation error at time {}: {}", at, error),
		}
	}
}

/// This is the top-level data structure. It owns the clock and all the entities
/// (processes, resources, buffers, and events) and executes the next pending
/// process in timestamp order until a time limit elapses or there are no
/// events left to process.
pub struct Simulation
{
	id: SimId,
	config: Config,
	precision: usize,	// number of decimal places to include when logging, derived from config.time_units
	pub(crate) clock: Clock,
	pub(crate) processes: Processes,
	pub(crate) resources: Vec<Resource>,
	pub(crate) levels: Vec<Level>,
	pub(crate) stores: Vec<Store>,
	pub(crate) events: Vec<SimEvent>,
	pub(crate) conditions: Vec<(usize, Predicate)>,
	tracers: Vec<Box<dyn Tracer>>,
	stopped: bool,
	rng: StdRng,
}

impl Simulation
{
	pub fn new(config: Config) -> Simulation
	{
		assert!(config.time_units > 0.0, "time units ({}) are not positive", config.time_units);

		let precision = config.precision();
		let rng = new_rng(config.seed);
		Simulation {
			id: SimId::next(),
			config,
			precision,
			clock: Clock::new(),
			processes: Processes::new(),
			resources: Vec::new(),
			levels: Vec::new(),
			stores: Vec::new(),
			events: Vec::new(),
			conditions: Vec::new(),
			tracers: Vec::new(),
			stopped: false,
			rng,
		}
	}

	pub fn id(&self) -> SimId
	{
		self.id
	}

	pub fn config(&self) -> &Config
	{
		&self.config
	}

	/// Resets the clock to zero and discards all pending notices and waituntil
	/// conditions. Normally called before the model is (re)built.
	pub fn initialize(&mut self)
	{
		self.clock = Clock::new();
		self.conditions.clear();
		self.stopped = false;
	}

	pub fn now(&self) -> Time
	{
		self.clock.now()
	}

	/// Time of the next pending event or INFINITY if there are none.
	pub fn peek(&mut self) -> Time
	{
		self.clock.peek()
	}

	/// Use this if you want to do something random when building the model.
	pub fn rng(&mut self) -> &mut StdRng
	{
		&mut self.rng
	}

	pub fn add_tracer(&mut self, tracer: Box<dyn Tracer>)
	{
		self.tracers.push(tracer);
	}

	// --- processes -------------------------------------------------------------
	/// Adds a Passive process. Use activate to give it something to do.
	pub fn add_process(&mut self, name: &str) -> ProcessId
	{
		assert!(!name.is_empty(), "name should not be empty");
		let index = self.processes.append(Process::new(name));
		ProcessId::new(self.id, index)
	}

	/// Adds a process and activates it at the current time.
	pub fn spawn<C>(&mut self, name: &str, computation: C) -> SimResult<ProcessId>
		where C: Computation + 'static
	{
		let process = self.add_process(name);
		self.activate(process, computation, When::Now, false)?;
		Ok(process)
	}

	/// Binds the computation to the process and schedules it. Prior processes
	/// run before normal processes scheduled for the same time.
	pub fn activate<C>(&mut self, process: ProcessId, computation: C, when: When, prior: bool) -> SimResult<()>
		where C: Computation + 'static
	{
		self.owns(process)?;
		let time = self.resolve(when)?;
		let index = process.index();
		{
			let p = self.processes.get_mut(index);
			if p.terminated {
				return Err(SimulationError::NotResumable(p.name.clone()).into());
			}
			if p.activated {
				return Err(SimulationError::AlreadyActivated(p.name.clone()).into());
			}
			p.computation = Some(Box::new(computation));
			p.activated = true;
		}
		self.post(index, time, prior)?;
		self.log_for(LogLevel::Debug, Some(index), &format!("activated for {}", self.format_time(time)));
		Ok(())
	}

	/// Cancels any pending notice for the process and schedules it again.
	pub fn reactivate(&mut self, process: ProcessId, when: When, prior: bool) -> SimResult<()>
	{
		self.owns(process)?;
		let time = self.resolve(when)?;
		let index = process.index();
		{
			let p = self.processes.get(index);
			if p.terminated || !p.activated {
				return Err(SimulationError::NotResumable(p.name.clone()).into());
			}
		}
		self.reschedule(index, time, prior)
	}

	/// Cancels the process's pending notice (if any), leaving it Passive.
	pub fn cancel(&mut self, process: ProcessId) -> SimResult<()>
	{
		self.owns(process)?;
		self.clock.cancel(process.index());
		Ok(())
	}

	/// Interrupts an Active process that isn't already interrupted: its pending
	/// notice is canceled, the time it had left is recorded, and it is resumed
	/// immediately so that it can check `Context::interrupted`. Returns the time
	/// the victim had left or None if the interrupt had no effect.
	pub fn interrupt(&mut self, victim: ProcessId, cause: Option<ProcessId>) -> SimResult<Option<i64>>
	{
		self.owns(victim)?;
		if let Some(c) = cause {
			self.owns(c)?;
		}

		let index = victim.index();
		let scheduled = match self.clock.scheduled(index) {
			Some(time) if !self.processes.get(index).interrupted => time,
			_ => return Ok(None),
		};

		let now = self.now();
		let left = scheduled.since(now);
		self.clock.cancel(index);
		{
			let p = self.processes.get_mut(index);
			p.interrupted = true;
			p.interrupt_cause = cause;
			p.interrupt_left = Some(left);
		}
		self.post(index, now, true)?;
		self.log_for(LogLevel::Debug, Some(index), &format!("interrupted with {} ticks left", left));
		Ok(Some(left))
	}

	pub fn process(&self, process: ProcessId) -> SimResult<&Process>
	{
		self.owns(process)?;
		Ok(self.processes.get(process.index()))
	}

	/// True if the process has a pending notice.
	pub fn active(&self, process: ProcessId) -> SimResult<bool>
	{
		self.owns(process)?;
		Ok(self.clock.scheduled(process.index()).is_some())
	}

	pub fn passive(&self, process: ProcessId) -> SimResult<bool>
	{
		self.owns(process)?;
		let index = process.index();
		Ok(self.clock.scheduled(index).is_none() && !self.processes.get(index).terminated)
	}

	pub fn terminated(&self, process: ProcessId) -> SimResult<bool>
	{
		Ok(self.process(process)?.is_terminated())
	}

	pub fn interrupted(&self, process: ProcessId) -> SimResult<bool>
	{
		Ok(self.process(process)?.is_interrupted())
	}

	/// When the process will next run (None if it isn't Active).
	pub fn scheduled_at(&self, process: ProcessId) -> SimResult<Option<Time>>
	{
		self.owns(process)?;
		Ok(self.clock.scheduled(process.index()))
	}

	// --- running ---------------------------------------------------------------
	/// Asks the current (or next) call to simulate to return.
	pub fn stop(&mut self)
	{
		self.stopped = true;
	}

	/// Runs until config.max_time.
	pub fn run(&mut self) -> Result<RunStatus, KernelError>
	{
		let until = self.config.max_time;
		self.simulate(until)
	}

	/// Executes events until the next one is after until, there are none left,
	/// or the run is stopped. Model errors end the run and are reported via the
	/// returned status. Kernel errors are returned as errors.
	pub fn simulate(&mut self, until: Time) -> Result<RunStatus, KernelError>
	{
		self.stopped = false;
		self.log_for(LogLevel::Info, None, &format!("simulating until {}", self.format_time(until)));

		let status = loop {
			if self.stopped {
				break RunStatus::Stopped{at: self.now()};
			}

			let next = self.clock.peek();
			if next.is_infinite() {
				break RunStatus::Exhausted{at: self.now()};
			}
			if next > until {
				self.clock.advance_to(until);
				break RunStatus::Completed{at: max(until, self.now())};
			}

			match self.step() {
				Ok(_) => {},
				Err(Error::Simulation(e)) => break RunStatus::Aborted{at: self.now(), error: e},
				Err(Error::Kernel(e)) => {
					self.log_for(LogLevel::Error, None, &e.to_string());
					return Err(e);
				},
			}
		};

		let level = if let RunStatus::Aborted{..} = status {LogLevel::Error} else {LogLevel::Info};
		self.log_for(level, None, &status.to_string());
		Ok(status)
	}

	/// Resumes the process with the earliest live notice and dispatches the
	/// command it yields. Returns false if there was nothing to do.
	pub fn step(&mut self) -> SimResult<bool>
	{
		let notice = match self.clock.pop() {
			Some(n) => n,
			None => return Ok(false),
		};

		let index = notice.process;
		let mut computation = {
			let p = self.processes.get_mut(index);
			match p.computation.take() {
				Some(c) if !p.terminated => c,
				_ => return Err(KernelError::ResumedTerminated(p.name.clone()).into()),
			}
		};

		let me = ProcessId::new(self.id, index);
		let result = {
			let mut ctx = Context::new(self, me);
			computation.resume(&mut ctx)
		};

		match result {
			Ok(Some(command)) => {
				self.processes.get_mut(index).computation = Some(computation);
				let now = self.now();
				for tracer in self.tracers.iter_mut() {
					tracer.before_dispatch(now, self.processes.name(index), &command);
				}
				if self.should_log(LogLevel::Excessive, Some(index)) {
					self.log_for(LogLevel::Excessive, Some(index), &format!("{:?}", command));
				}
				self.dispatch(index, command)?;
			},
			Ok(None) => {
				drop(computation);
				self.finish(index);
			},
			Err(e) => {
				self.processes.get_mut(index).computation = Some(computation);
				return Err(e);
			},
		}

		self.test_conditions()?;

		let now = self.now();
		for tracer in self.tracers.iter_mut() {
			tracer.after_dispatch(now, self.processes.name(index));
		}
		Ok(true)
	}

	// --- logging ---------------------------------------------------------------
	/// Logs on behalf of the model (as opposed to one of its processes).
	pub fn log(&self, level: LogLevel, message: &str)
	{
		self.log_for(level, None, message);
	}

	pub(crate) fn log_for(&self, level: LogLevel, process: Option<usize>, message: &str)
	{
		if self.should_log(level, process) {
			let t = self.format_time(self.now());
			let path = self.logged_name(process);
			if self.config.colorize {
				let begin_escape = match level {
					LogLevel::Error		=> &self.config.error_escape_code,
					LogLevel::Warning	=> &self.config.warning_escape_code,
					LogLevel::Info		=> &self.config.info_escape_code,
					LogLevel::Debug		=> &self.config.debug_escape_code,
					LogLevel::Excessive	=> &self.config.excessive_escape_code,
				};
				println!("{}{}   {} {}{}", begin_escape, t, path, message, end_escape());
			} else {
				let prefix = match level {
					LogLevel::Error		=> "Error",
					LogLevel::Warning	=> "Warn ",
					LogLevel::Info		=> "Info ",
					LogLevel::Debug		=> "Debug",
					LogLevel::Excessive	=> "Exces",
				};
				println!("{}  {} {}  {}", t, prefix, path, message);
			}
		}
	}

	fn logged_name(&self, process: Option<usize>) -> String
	{
		let name = match process {
			Some(index) => self.processes.name(index),
			None => "simulation",
		};
		let width = max(self.processes.max_name_len(), "simulation".len());
		format!("{0:<1$}", name, width)
	}

	fn should_log(&self, level: LogLevel, process: Option<usize>) -> bool
	{
		if !self.config.log_levels.is_empty() {	// short circuit some work if we have no overrides
			let name = match process {
				Some(index) => self.processes.name(index),
				None => "simulation",
			};

			for (pattern, plevel) in self.config.log_levels.iter() {
				if pattern.matches(name) {
					return level <= *plevel;
				}
			}
		}

		level <= self.config.log_level
	}

	pub(crate) fn format_time(&self, time: Time) -> String
	{
		if time.is_infinite() {
			"inf".to_string()
		} else {
			let t = (time.0 as f64)/self.config.time_units;
			format!("{0:.1$}", t, self.precision)
		}
	}

	// --- internals -------------------------------------------------------------
	pub(crate) fn owns<H: Handle>(&self, handle: H) -> Result<(), SimulationError>
	{
		if handle.sim() == self.id {
			Ok(())
		} else {
			Err(SimulationError::ForeignEntity{kind: H::KIND, handle: handle.to_string()})
		}
	}

	pub(crate) fn post(&mut self, index: usize, time: Time, prior: bool) -> SimResult<()>
	{
		if self.processes.get(index).terminated {
			return Err(KernelError::ResumedTerminated(self.processes.name(index).to_string()).into());
		}
		self.clock.post(index, time, prior)?;
		Ok(())
	}

	/// Cancels the process's pending notice (if any) and posts a new one.
	pub(crate) fn reschedule(&mut self, index: usize, time: Time, prior: bool) -> SimResult<()>
	{
		self.clock.cancel(index);
		self.post(index, time, prior)
	}

	fn resolve(&self, when: When) -> Result<Time, SimulationError>
	{
		let now = self.now();
		match when {
			When::Now => Ok(now),
			When::At(time) if time.is_infinite() => Err(SimulationError::TimeOverflow{now, delay: time.since(now)}),
			When::At(time) => Ok(max(time, now)),
			When::Delay(delay) if delay < 0 => Err(SimulationError::NegativeDelay(delay)),
			When::Delay(delay) => now.checked_plus(delay).ok_or(SimulationError::TimeOverflow{now, delay}),
		}
	}

	fn finish(&mut self, index: usize)
	{
		self.clock.cancel(index);
		self.dismiss_helper(index);
		self.purge(index);
		self.processes.get_mut(index).terminate();
		self.log_for(LogLevel::Excessive, Some(index), "terminated");

		let now = self.now();
		for tracer in self.tracers.iter_mut() {
			tracer.terminated(now, self.processes.name(index));
		}
	}

	// A process that finishes while still registered somewhere (e.g. it was
	// reactivated while blocked) must not be woken again.
	fn purge(&mut self, index: usize)
	{
		let now = self.now();
		for resource in self.resources.iter_mut() {
			if resource.wait_queue.take_out(index).is_some() {
				resource.observe(now);
			}
		}
		for level in self.levels.iter_mut() {
			let getting = level.get_queue.take_out(index).is_some();
			let putting = level.put_queue.take_out(index).is_some();
			if getting || putting {
				level.observe(now);
			}
		}
		for store in self.stores.iter_mut() {
			let getting = store.get_queue.take_out(index).is_some();
			let putting = store.put_queue.take_out(index).is_some();
			if getting || putting {
				store.observe(now);
			}
		}
		for event in self.events.iter_mut() {
			event.forget(index);
		}
		self.conditions.retain(|&(i, _)| i != index);
	}

	fn dispatch(&mut self, index: usize, command: Command) -> SimResult<()>
	{
		// Whatever the process was scheduled for (e.g. it reactivated itself)
		// is superseded by the command.
		self.clock.cancel(index);

		match command {
			Command::Hold(delay) => self.hold(index, delay),
			Command::Passivate => Ok(()),
			Command::Request(request) => self.request(index, request),
			Command::Release(resource) => self.release(index, resource),
			Command::WaitEvent(events) => self.wait_event(index, events),
			Command::QueueEvent(events) => self.queue_event(index, events),
			Command::WaitUntil(predicate) => self.wait_until(index, predicate),
			Command::Get(get) => self.get(index, get),
			Command::Put(put) => self.put(index, put),
			Command::Renege(primary, renege) => self.renege(index, primary, renege),
		}
	}

	fn hold(&mut self, index: usize, delay: i64) -> SimResult<()>
	{
		if delay < 0 {
			return Err(SimulationError::NegativeDelay(delay).into());
		}
		let now = self.now();
		let time = now.checked_plus(delay).ok_or(SimulationError::TimeOverflow{now, delay})?;

		{
			let p = self.processes.get_mut(index);
			p.interrupt_left = Some(delay);
			p.interrupted = false;
			p.interrupt_cause = None;
		}
		self.post(index, time, false)
	}

	fn wait_until(&mut self, index: usize, mut predicate: Predicate) -> SimResult<()>
	{
		if predicate(self) {
			let now = self.now();
			self.post(index, now, true)
		} else {
			self.conditions.push((index, predicate));
			Ok(())
		}
	}

	// Called after every step.
	fn test_conditions(&mut self) -> SimResult<()>
	{
		if self.conditions.is_empty() {
			return Ok(());
		}

		let pending = mem::take(&mut self.conditions);
		let mut ready = Vec::new();
		for (index, mut predicate) in pending {
			if predicate(self) {
				ready.push(index);
			} else {
				self.conditions.push((index, predicate));
			}
		}

		let now = self.now();
		for index in ready {
			self.log_for(LogLevel::Debug, Some(index), "condition satisfied");
			self.reschedule(index, now, false)?;
		}
		Ok(())
	}
}

fn end_escape() -> &'static str
{
	"\x1b[0m"
}

// StdRng is plenty good enough and, unlike thread_rng, can be seeded so that
// runs are reproducible.
fn new_rng(seed: u64) -> StdRng
{
	let seed = if seed != 0 {seed} else {time::OffsetDateTime::now_utc().unix_timestamp_nanos() as u64};
	StdRng::seed_from_u64(seed)
}
