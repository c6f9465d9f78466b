//! The host-test surface the engine runs against: a named test handle with
//! non-fatal and fatal failure marking, child scopes for per-example
//! subtest isolation, and an isolated probe that captures failures without
//! propagating them.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{PropertyError, panic_payload_message};

/// Unwind payload used by [`TestCase::fatalf`]; the probe converts it back
/// into a captured failure. Reaching the top of a test unwinds it like any
/// other panic.
#[derive(Debug)]
pub struct FatalFailure;

/// A handle for the currently running test.
///
/// The capabilities the engine uses: a unique name, failure marking, and
/// [`TestCase::run_subtest`], which the sequential sampling loop runs each
/// example under when subtests are enabled (the child scope's name is the
/// replay key). Failure messages are recorded on the handle and written to
/// stderr, so a plain `#[test]` asserts on [`TestCase::failed`] after the
/// run.
#[derive(Debug)]
pub struct TestCase {
    name: String,
    failed: bool,
    messages: Vec<String>,
    /// Probe handles swallow output; the real test writes it to stderr.
    quiet: bool,
}

impl TestCase {
    /// A handle for a test with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failed: false,
            messages: Vec::new(),
            quiet: false,
        }
    }

    fn new_probe(name: impl Into<String>) -> Self {
        Self {
            quiet: true,
            ..Self::new(name)
        }
    }

    /// The unique name of this test or subtest scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark the test as failed.
    pub fn fail(&mut self) {
        self.failed = true;
    }

    /// Whether the test has been marked as failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Record a non-fatal failure and continue.
    pub fn errorf(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.quiet {
            eprintln!("--- {}: {}", self.name, message);
        }
        self.messages.push(message);
        self.failed = true;
    }

    /// Record a failure and stop the current test body by unwinding.
    pub fn fatalf(&mut self, message: impl Into<String>) -> ! {
        self.errorf(message);
        std::panic::panic_any(FatalFailure);
    }

    /// Failure messages recorded so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Run `body` in a named child scope. The child's failure marks this
    /// test as failed; the return value reports whether the child failed.
    pub fn run_subtest(&mut self, name: &str, body: impl FnOnce(&mut TestCase)) -> bool {
        let mut child = TestCase {
            quiet: self.quiet,
            ..TestCase::new(format!("{}/{}", self.name, name))
        };
        let outcome = run_probe_body(&mut child, body);
        let child_failed = child.failed || outcome.failed();
        if child_failed {
            self.fail();
        }
        child_failed
    }
}

/// The result of probing one property invocation.
#[derive(Debug)]
pub(crate) enum Outcome {
    Pass,
    Fail(PropertyError),
}

impl Outcome {
    pub fn failed(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }
}

fn run_probe_body(t: &mut TestCase, body: impl FnOnce(&mut TestCase)) -> Outcome {
    let result = catch_unwind(AssertUnwindSafe(|| body(t)));
    match result {
        Ok(()) => {
            if t.failed {
                Outcome::Fail(PropertyError::property_failed(t.messages.join("; ")))
            } else {
                Outcome::Pass
            }
        }
        Err(payload) => {
            if payload.is::<FatalFailure>() {
                Outcome::Fail(PropertyError::property_failed(t.messages.join("; ")))
            } else if let Some(err) = payload.downcast_ref::<PropertyError>() {
                Outcome::Fail(err.clone())
            } else {
                Outcome::Fail(PropertyError::property_panicked(panic_payload_message(
                    payload.as_ref(),
                )))
            }
        }
    }
}

/// Run one property invocation against an isolated reporter.
///
/// `Fail`, `Fatal`, and panics inside `body` are captured and converted to
/// an [`Outcome`]; nothing here marks a real test as failed.
pub(crate) fn probe(scope_name: &str, body: impl FnOnce(&mut TestCase)) -> Outcome {
    let mut child = TestCase::new_probe(scope_name);
    run_probe_body(&mut child, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errorf_marks_failed_and_records() {
        let mut t = TestCase::new_probe("t");
        assert!(!t.failed());
        t.errorf("first");
        t.errorf("second");
        assert!(t.failed());
        assert_eq!(t.messages(), &["first", "second"]);
    }

    #[test]
    fn test_probe_captures_pass() {
        let outcome = probe("p", |_t| {});
        assert!(!outcome.failed());
    }

    #[test]
    fn test_probe_captures_errorf() {
        let outcome = probe("p", |t| t.errorf("nope"));
        match outcome {
            Outcome::Fail(PropertyError::PropertyFailed { message, .. }) => {
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_probe_captures_fatalf_without_unwinding_caller() {
        let outcome = probe("p", |t| t.fatalf("bad"));
        assert!(outcome.failed());
    }

    #[test]
    fn test_probe_captures_plain_panic() {
        let outcome = probe("p", |_t| panic!("kaboom"));
        match outcome {
            Outcome::Fail(PropertyError::PropertyPanicked { payload, .. }) => {
                assert!(payload.contains("kaboom"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_subtest_failure_marks_parent() {
        let mut t = TestCase::new_probe("parent");
        let failed = t.run_subtest("child", |c| {
            assert_eq!(c.name(), "parent/child");
            c.errorf("child failed");
        });
        assert!(failed);
        assert!(t.failed());
    }

    #[test]
    fn test_subtest_pass_leaves_parent_clean() {
        let mut t = TestCase::new_probe("parent");
        let failed = t.run_subtest("child", |_c| {});
        assert!(!failed);
        assert!(!t.failed());
    }

    #[test]
    fn test_subtest_fatal_is_contained() {
        let mut t = TestCase::new_probe("parent");
        let failed = t.run_subtest("child", |c| c.fatalf("bad"));
        assert!(failed);
        assert!(t.failed());
    }
}
