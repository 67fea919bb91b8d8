//! Count-up/count-down clock for timed holds.
//!
//! The timer is a pure tick-driven machine: the 1-second cadence comes from
//! the caller (the CLI sleeps between ticks, tests call `tick` directly), so
//! there is no background callback to leak. Dropping the timer is teardown.
//! Restarting means constructing a fresh timer.

/// What a tick (or skip) produced, for the consumer's update path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// The displayed value changed
    Updated(u32),
    /// The monitored duration was reached; fired exactly once
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Counts down to zero from the initial duration; zero is completion
    CountDown,
    /// Counts up from zero; the consumer decides when the target is reached
    CountUp,
}

/// A single countdown/count-up value driven by 1-second ticks
#[derive(Clone, Debug)]
pub struct Timer {
    mode: Mode,
    initial: u32,
    value: u32,
    running: bool,
    completed: bool,
}

impl Timer {
    /// Countdown from `seconds` to zero
    pub fn countdown(seconds: u32) -> Self {
        Self {
            mode: Mode::CountDown,
            initial: seconds,
            value: seconds,
            running: false,
            completed: false,
        }
    }

    /// Count up from zero
    pub fn countup() -> Self {
        Self {
            mode: Mode::CountUp,
            initial: 0,
            value: 0,
            running: false,
            completed: false,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start/pause toggle. A completed countdown stays stopped.
    pub fn toggle(&mut self) {
        if self.completed {
            return;
        }
        self.running = !self.running;
    }

    /// Advance one second. No-op while paused.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        match self.mode {
            Mode::CountUp => {
                self.value += 1;
                Some(TimerEvent::Updated(self.value))
            }
            Mode::CountDown => {
                self.value = self.value.saturating_sub(1);
                if self.value == 0 {
                    self.running = false;
                    self.complete()
                } else {
                    Some(TimerEvent::Updated(self.value))
                }
            }
        }
    }

    /// Return to the configured initial value, reporting it for the
    /// consumer's update callback
    pub fn reset(&mut self) -> u32 {
        self.value = self.initial;
        self.running = false;
        self.completed = false;
        self.value
    }

    /// Jump to the terminal value. Countdown completion fires at most once;
    /// a count-up has no terminal value, so skip is a no-op.
    pub fn skip(&mut self) -> Option<TimerEvent> {
        match self.mode {
            Mode::CountDown => {
                self.value = 0;
                self.running = false;
                self.complete()
            }
            Mode::CountUp => None,
        }
    }

    fn complete(&mut self) -> Option<TimerEvent> {
        if self.completed {
            return None;
        }
        self.completed = true;
        Some(TimerEvent::Completed)
    }
}
