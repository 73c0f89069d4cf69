//! Stopwatch for work sessions.
//!
//! Elapsed time is derived from a monotonic clock rather than counted in
//! ticks: a running timer remembers when it started and how much time was
//! banked by earlier runs, and the displayed value is computed from "now"
//! whenever it is sampled. Values are floored to the 10 ms tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::constants::TICK_MS;
use crate::models::{NewTimerRecord, hourly_rate};
use crate::utils::parse_positive_amount;

pub trait Clock: Send + Sync {
    /// Time since an arbitrary fixed origin; never goes backwards.
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("Timer is already running")]
    AlreadyRunning,
    #[error("Timer is not running")]
    NotRunning,
    #[error("Timer has no elapsed time to save")]
    NothingToFinish,
    #[error("Finished session is waiting for confirmation")]
    AwaitingConfirmation,
    #[error("No finished session to confirm")]
    NotFinished,
    #[error("Please enter a valid amount")]
    InvalidAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Running { since: Duration, banked_ms: u64 },
    Paused { banked_ms: u64 },
    Finished { elapsed_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Ready,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub elapsed_ms: u64,
    pub display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEngine {
    phase: Phase,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Ready,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match self.phase {
            Phase::Ready => TimerStatus::Ready,
            Phase::Running { .. } => TimerStatus::Running,
            Phase::Paused { .. } => TimerStatus::Paused,
            Phase::Finished { .. } => TimerStatus::Finished,
        }
    }

    /// Elapsed time as of `now`, floored to the tick.
    pub fn elapsed_ms(&self, now: Duration) -> u64 {
        match self.phase {
            Phase::Ready => 0,
            Phase::Running { since, banked_ms } => {
                quantize(banked_ms + now.saturating_sub(since).as_millis() as u64)
            }
            Phase::Paused { banked_ms } => banked_ms,
            Phase::Finished { elapsed_ms } => elapsed_ms,
        }
    }

    /// Starts from ready or resumes from pause.
    pub fn start(&mut self, now: Duration) -> Result<(), TimerError> {
        let banked_ms = match self.phase {
            Phase::Ready => 0,
            Phase::Paused { banked_ms } => banked_ms,
            Phase::Running { .. } => return Err(TimerError::AlreadyRunning),
            Phase::Finished { .. } => return Err(TimerError::AwaitingConfirmation),
        };
        self.phase = Phase::Running {
            since: now,
            banked_ms,
        };
        Ok(())
    }

    pub fn pause(&mut self, now: Duration) -> Result<(), TimerError> {
        match self.phase {
            Phase::Running { .. } => {
                self.phase = Phase::Paused {
                    banked_ms: self.elapsed_ms(now),
                };
                Ok(())
            }
            _ => Err(TimerError::NotRunning),
        }
    }

    /// Freezes the elapsed time for confirmation. Requires a non-zero time.
    pub fn finish(&mut self, now: Duration) -> Result<u64, TimerError> {
        match self.phase {
            Phase::Running { .. } | Phase::Paused { .. } => {
                let elapsed_ms = self.elapsed_ms(now);
                if elapsed_ms == 0 {
                    return Err(TimerError::NothingToFinish);
                }
                self.phase = Phase::Finished { elapsed_ms };
                Ok(elapsed_ms)
            }
            Phase::Ready => Err(TimerError::NothingToFinish),
            Phase::Finished { .. } => Err(TimerError::AwaitingConfirmation),
        }
    }

    /// Builds the record for a finished session. The timer stays finished
    /// until [`TimerEngine::reset`] is called once the record is stored.
    pub fn confirm(&self, amount_input: &str, date: String) -> Result<NewTimerRecord, TimerError> {
        let Phase::Finished { elapsed_ms } = self.phase else {
            return Err(TimerError::NotFinished);
        };
        let amount = parse_positive_amount(amount_input).map_err(|_| TimerError::InvalidAmount)?;
        Ok(NewTimerRecord {
            date,
            duration: elapsed_ms,
            amount,
            hourly_rate: hourly_rate(elapsed_ms, amount),
        })
    }

    /// Back to ready with zero elapsed time, discarding any finished session.
    pub fn reset(&mut self) {
        self.phase = Phase::Ready;
    }

    pub fn snapshot(&self, now: Duration) -> TimerSnapshot {
        let elapsed_ms = self.elapsed_ms(now);
        TimerSnapshot {
            status: self.status(),
            elapsed_ms,
            display: format_clock(elapsed_ms),
        }
    }
}

fn quantize(ms: u64) -> u64 {
    ms - ms % TICK_MS
}

/// `HH:MM:SS.cc` stopwatch display.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1000) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn running_time_is_floored_to_tick() {
        let mut timer = TimerEngine::new();
        timer.start(ms(1_000)).unwrap();
        assert_eq!(timer.elapsed_ms(ms(1_237)), 230);
        assert_eq!(timer.status(), TimerStatus::Running);
    }

    #[test]
    fn pause_banks_time_and_resume_continues() {
        let mut timer = TimerEngine::new();
        timer.start(ms(0)).unwrap();
        timer.pause(ms(1_505)).unwrap();
        assert_eq!(timer.elapsed_ms(ms(50_000)), 1_500);

        timer.start(ms(60_000)).unwrap();
        assert_eq!(timer.elapsed_ms(ms(60_500)), 2_000);
    }

    #[test]
    fn finish_requires_elapsed_time() {
        let mut timer = TimerEngine::new();
        assert_eq!(timer.finish(ms(0)), Err(TimerError::NothingToFinish));

        timer.start(ms(100)).unwrap();
        assert_eq!(timer.finish(ms(105)), Err(TimerError::NothingToFinish));
        assert_eq!(timer.status(), TimerStatus::Running);
    }

    #[test]
    fn finished_session_confirms_with_rate() {
        let mut timer = TimerEngine::new();
        timer.start(ms(0)).unwrap();
        assert_eq!(timer.finish(ms(125_000)), Ok(125_000));

        let record = timer.confirm("2500", "2024-01-01T00:00:00Z".to_string()).unwrap();
        assert_eq!(record.duration, 125_000);
        assert_eq!(record.amount, 2_500.0);
        assert_eq!(record.hourly_rate, 72_000.0);
        assert_eq!(timer.status(), TimerStatus::Finished);

        timer.reset();
        assert_eq!(timer.snapshot(ms(999_999)).elapsed_ms, 0);
    }

    #[test]
    fn invalid_amount_keeps_session_pending() {
        let mut timer = TimerEngine::new();
        timer.start(ms(0)).unwrap();
        timer.finish(ms(10_000)).unwrap();

        for input in ["", "0", "-10", "abc"] {
            assert_eq!(
                timer.confirm(input, String::new()),
                Err(TimerError::InvalidAmount)
            );
        }
        assert_eq!(timer.elapsed_ms(ms(20_000)), 10_000);
    }

    #[test]
    fn finished_timer_cannot_restart() {
        let mut timer = TimerEngine::new();
        timer.start(ms(0)).unwrap();
        timer.finish(ms(500)).unwrap();
        assert_eq!(timer.start(ms(600)), Err(TimerError::AwaitingConfirmation));
        assert_eq!(timer.pause(ms(600)), Err(TimerError::NotRunning));
    }

    #[test]
    fn confirm_without_finish_is_rejected() {
        let timer = TimerEngine::new();
        assert_eq!(
            timer.confirm("100", String::new()),
            Err(TimerError::NotFinished)
        );
    }

    #[test]
    fn clock_display_pads_fields() {
        assert_eq!(format_clock(0), "00:00:00.00");
        assert_eq!(format_clock(3_723_450), "01:02:03.45");
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }
}
