//! Rendering of the failure report and replay key.

use std::fmt;

/// The textual failure surface. The first three lines are a documented
/// format: tooling parses them to replay the failing example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// The resolved run seed (engine-chosen when the config left it at 0).
    pub seed: u64,
    /// Examples evaluated up to and including the failing one.
    pub examples_run: u32,
    /// Shrink steps spent minimizing the counterexample.
    pub shrunk_steps: u32,
    /// `Debug` rendering of the minimized value.
    pub counterexample: String,
    /// Name of the host test that failed.
    pub test_name: String,
    /// Index of the failing example within the run.
    pub example_index: u32,
    /// Command tooling should re-run; defaults to the current process name.
    pub host_command: String,
    /// The shrink budget ran out before the walk finished.
    pub budget_exhausted: bool,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[propx] property failed; seed={}; examples_run={}; shrunk_steps={}",
            self.seed, self.examples_run, self.shrunk_steps
        )?;
        writeln!(f, "counterexample (min): {}", self.counterexample)?;
        write!(
            f,
            "replay: {} -run '^{}$/ex#l{}(/|$)' -propx.seed={}",
            self.host_command, self.test_name, self.example_index, self.seed
        )?;
        if self.budget_exhausted {
            write!(
                f,
                "\nnote: shrink budget exhausted; the minimum may not be local"
            )?;
        }
        Ok(())
    }
}

/// The subtest scope name for example `index`, which doubles as the replay
/// key.
pub fn example_scope(index: u32) -> String {
    format!("ex#l{}", index)
}

/// The command tooling should use to re-run this test binary.
pub fn default_host_command() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| {
            std::path::Path::new(arg0)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "cargo test".to_string())
}
