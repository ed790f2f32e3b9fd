// Turn clocks and cooperative deadlines
//
// Searches never get preempted. Every recursive entry calls
// `Deadline::check`, which turns "too little time left" into a
// `SearchError::Timeout` that unwinds through `?` up to the strategy driver.

use std::time::{Duration, Instant};

use crate::errors::{SearchError, SearchResult};

/// Capability returning the milliseconds left in the current turn.
pub trait Clock {
    fn time_left(&self) -> f64;
}

impl<F> Clock for F
where
    F: Fn() -> f64,
{
    fn time_left(&self) -> f64 {
        self()
    }
}

/// Wall clock for a single turn, started when the turn begins.
#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    started: Instant,
    limit: Duration,
}

impl TurnClock {
    pub fn start(limit: Duration) -> Self {
        TurnClock {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Clock for TurnClock {
    fn time_left(&self) -> f64 {
        self.limit.as_secs_f64() * 1000.0 - self.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock plus the safety margin a strategy keeps before the caller's
/// own limit.
#[derive(Clone, Copy)]
pub struct Deadline<'a> {
    clock: &'a dyn Clock,
    threshold_ms: f64,
}

impl<'a> Deadline<'a> {
    pub fn new(clock: &'a dyn Clock, threshold_ms: f64) -> Self {
        Deadline {
            clock,
            threshold_ms,
        }
    }

    pub fn remaining_ms(&self) -> f64 {
        self.clock.time_left()
    }

    pub fn expired(&self) -> bool {
        self.remaining_ms() < self.threshold_ms
    }

    pub fn check(&self) -> SearchResult<()> {
        let remaining_ms = self.remaining_ms();
        if remaining_ms < self.threshold_ms {
            Err(SearchError::Timeout { remaining_ms })
        } else {
            Ok(())
        }
    }
}

/// Test clock that reports plenty of time for a fixed number of reads and
/// then runs out.
#[cfg(test)]
pub(crate) struct CountdownClock {
    reads_left: std::cell::Cell<usize>,
}

#[cfg(test)]
impl CountdownClock {
    pub(crate) fn new(reads: usize) -> Self {
        CountdownClock {
            reads_left: std::cell::Cell::new(reads),
        }
    }
}

#[cfg(test)]
impl Clock for CountdownClock {
    fn time_left(&self) -> f64 {
        let left = self.reads_left.get();
        if left == 0 {
            return 0.0;
        }
        self.reads_left.set(left - 1);
        1_000_000.0
    }
}
