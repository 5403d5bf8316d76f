use super::types::{DeviceState, RefCounts};

/// What the caller must do after consulting the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// First user (or last releaser): the real driver call is required
    Driver,
    /// Another user already holds the hardware in this state; count bumped
    Shared,
    /// Nothing to do
    Noop,
}

/// Rejected transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    NotOpened,
    NotPrepared,
    NotOpen,
}

impl Rejected {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejected::NotOpened => "not opened, open before prepare",
            Rejected::NotPrepared => "not yet prepared",
            Rejected::NotOpen => "close without a matching open",
        }
    }
}

/// Device state plus the open/prepare/start reference counts.
///
/// Acquiring transitions that need hardware come in two halves: the query
/// (`open`, `prepare`) only bumps the count when the hardware is already in
/// place, and the commit (`opened`, `prepared`) records a successful driver
/// call. A failed driver call therefore leaves the counts untouched.
///
/// ```text
///  Closed -> Opened -> Prepared -> Started <-> Stopped
///     ^                                           |
///     +------------------ close ------------------+
/// ```
#[derive(Debug, Clone, Default)]
pub struct DeviceLifecycle {
    state: DeviceState,
    counts: RefCounts,
}

impl DeviceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn counts(&self) -> RefCounts {
        self.counts
    }

    pub fn open(&mut self) -> Step {
        if self.counts.open > 0 {
            self.counts.open += 1;
            self.check();
            return Step::Shared;
        }
        Step::Driver
    }

    pub fn opened(&mut self) {
        self.state = DeviceState::Opened;
        self.counts.open += 1;
        self.check();
    }

    pub fn prepare(&mut self) -> Result<Step, Rejected> {
        if self.counts.open == 0 {
            return Err(Rejected::NotOpened);
        }
        if self.counts.prepare > 0 {
            self.counts.prepare += 1;
            self.check();
            return Ok(Step::Shared);
        }
        Ok(Step::Driver)
    }

    pub fn prepared(&mut self) {
        self.state = DeviceState::Prepared;
        self.counts.prepare += 1;
        self.check();
    }

    /// Starting is purely logical: no driver call backs it
    pub fn start(&mut self) -> Result<Step, Rejected> {
        if self.state < DeviceState::Prepared {
            return Err(Rejected::NotPrepared);
        }
        let step = if self.counts.start > 0 {
            Step::Shared
        } else {
            self.state = DeviceState::Started;
            Step::Noop
        };
        self.counts.start += 1;
        self.check();
        Ok(step)
    }

    /// Returns `Driver` for the last stopper, which must halt the hardware.
    /// The state moves to `Stopped` whether or not that call succeeds.
    pub fn stop(&mut self) -> Step {
        if self.counts.start == 0 {
            return Step::Noop;
        }
        self.counts.start -= 1;
        let step = if self.counts.start == 0 {
            self.state = DeviceState::Stopped;
            Step::Driver
        } else {
            Step::Shared
        };
        self.check();
        step
    }

    /// Returns `Driver` for the last closer. The lifecycle is reset to
    /// `Closed` at that point even if the driver close fails.
    pub fn close(&mut self) -> Result<Step, Rejected> {
        if self.counts.open == 0 {
            return Err(Rejected::NotOpen);
        }
        self.counts.open -= 1;
        if self.counts.open > 0 {
            self.check();
            return Ok(Step::Shared);
        }
        self.state = DeviceState::Closed;
        self.counts = RefCounts::default();
        self.check();
        Ok(Step::Driver)
    }

    /// Invariants tying the counts to each other and to the state
    pub fn is_consistent(&self) -> bool {
        let RefCounts { open, prepare, start } = self.counts;
        (prepare == 0 || open > 0)
            && (start == 0 || self.state == DeviceState::Started)
            && (open > 0 || (prepare == 0 && start == 0))
            && (open == 0) == (self.state == DeviceState::Closed)
    }

    fn check(&self) {
        debug_assert!(self.is_consistent(), "inconsistent lifecycle {:?}", self);
    }
}
