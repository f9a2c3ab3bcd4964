/*!
Cooperative scheduler.

A fixed table of periodic [Task]s, built once and never resized. Every tick decrements each countdown,
an entry whose countdown is zero runs to completion and is rearmed with its period.
There is no priority and no preemption between tasks: a task that overruns simply delays the next tick,
the lost ticks are absorbed and never replayed.
*/

use defmt_or_log::{debug, trace};
use embassy_time::{Duration, Instant, Timer};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Callback invoked by the [Scheduler].
pub trait Task {
    fn run(&mut self);
}

impl<F: FnMut()> Task for F {
    fn run(&mut self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleError {
    /// the entry at this position has a period of 0 ticks
    ZeroPeriod(usize),
}

pub struct ScheduleEntry<'a> {
    period: u32,
    initial_delay: u32,
    countdown: u32,
    task: &'a mut dyn Task,
}

impl<'a> ScheduleEntry<'a> {
    /// `task` first runs after `initial_delay` ticks, then every `period` ticks.
    pub fn new(period: u32, initial_delay: u32, task: &'a mut dyn Task) -> Self {
        Self {
            period,
            initial_delay,
            countdown: initial_delay,
            task,
        }
    }
    pub fn period(&self) -> u32 {
        self.period
    }
    pub fn initial_delay(&self) -> u32 {
        self.initial_delay
    }
    /// ticks left before the next run
    pub fn countdown(&self) -> u32 {
        self.countdown
    }
}

/// Tick notification shared with the timer interrupt.
///
/// The interrupt only raises the flag; if it is still raised when the next tick comes,
/// that tick is counted as missed and dropped.
pub struct TickFlag {
    pending: AtomicBool,
    missed: AtomicU32,
}

impl TickFlag {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            missed: AtomicU32::new(0),
        }
    }
    /// Timer interrupt side.
    pub fn signal(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
    }
    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
    /// ticks that arrived while the previous one was still pending
    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Scheduler<'a, const N: usize> {
    entries: [ScheduleEntry<'a>; N],
    ticks: u32,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    pub fn new(entries: [ScheduleEntry<'a>; N]) -> Result<Self, ScheduleError> {
        if let Some(i) = entries.iter().position(|e| e.period == 0) {
            return Err(ScheduleError::ZeroPeriod(i));
        }
        Ok(Self { entries, ticks: 0 })
    }

    /// Advance every countdown by one tick, running due entries in table order.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.countdown == 0 {
                trace!("scheduler: tick {} running entry {}", self.ticks, i);
                entry.task.run();
                entry.countdown = entry.period;
            }
            entry.countdown -= 1;
        }
    }

    /// Run one tick if the timer raised the flag since the last poll.
    pub fn poll(&mut self, flag: &TickFlag) -> bool {
        if flag.take() {
            self.tick();
            true
        } else {
            false
        }
    }

    /// Drive the table from an embassy timer with the given tick length.
    ///
    /// After an overrun the next deadline is moved forward instead of firing the missed ticks back to back.
    pub async fn run(&mut self, tick: Duration) -> ! {
        let mut next = Instant::now() + tick;
        loop {
            Timer::at(next).await;
            self.tick();
            next += tick;
            let now = Instant::now();
            if next <= now {
                debug!("scheduler: overrun at tick {}, skipping ahead", self.ticks);
                next = now + tick;
            }
        }
    }

    /// ticks elapsed since startup, wrapping
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn entries(&self) -> &[ScheduleEntry<'a>] {
        &self.entries
    }
}
