//! Event reporting
//!
//! The engine never fails a generation because of a notice; it only hands
//! deprecations to an [`EventReporter`] supplied by the test runner.

use parking_lot::Mutex;
use tracing::warn;

/// Receiver of notices raised while generating doubles
pub trait EventReporter: Send + Sync {
    /// Name of the test currently running, if any
    fn active_test(&self) -> Option<String>;

    /// Deprecation attributed to a running test
    fn test_deprecation(&self, test: &str, message: &str);

    /// Deprecation raised outside of any test
    fn process_deprecation(&self, message: &str);
}

/// Route a deprecation to the active test, or to process scope without one
pub fn report_deprecation(reporter: &dyn EventReporter, message: &str) {
    match reporter.active_test() {
        Some(test) => reporter.test_deprecation(&test, message),
        None => reporter.process_deprecation(message),
    }
}

/// Reporter that logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl EventReporter for TracingReporter {
    fn active_test(&self) -> Option<String> {
        None
    }

    fn test_deprecation(&self, test: &str, message: &str) {
        warn!(test = %test, "deprecated: {}", message);
    }

    fn process_deprecation(&self, message: &str) {
        warn!("deprecated: {}", message);
    }
}

/// A deprecation notice as recorded by [`CollectingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deprecation {
    Test { test: String, message: String },
    Process { message: String },
}

/// Reporter that keeps every notice in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    active: Mutex<Option<String>>,
    events: Mutex<Vec<Deprecation>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `test` as running (or no test, with `None`)
    pub fn set_active_test(&self, test: Option<&str>) {
        *self.active.lock() = test.map(str::to_string);
    }

    /// Notices recorded so far
    pub fn events(&self) -> Vec<Deprecation> {
        self.events.lock().clone()
    }
}

impl EventReporter for CollectingReporter {
    fn active_test(&self) -> Option<String> {
        self.active.lock().clone()
    }

    fn test_deprecation(&self, test: &str, message: &str) {
        self.events.lock().push(Deprecation::Test {
            test: test.to_string(),
            message: message.to_string(),
        });
    }

    fn process_deprecation(&self, message: &str) {
        self.events.lock().push(Deprecation::Process {
            message: message.to_string(),
        });
    }
}
