//! # Propx Stateful
//!
//! State-machine property testing on top of the propx engine: define
//! commands with preconditions, argument generators, a model transition,
//! and postconditions; the harness draws command sequences, threads the
//! model state through them, and shrinks failing sequences by dropping
//! commands first and then shrinking the retained arguments.
//!
//! ```rust
//! use propx::{Config, TestCase, boxed, uint_range};
//! use propx_stateful::{Command, StateMachine, test_state_machine};
//!
//! let machine: StateMachine<i64, u64> = StateMachine {
//!     initial_state: 0,
//!     commands: vec![Command {
//!         name: "add",
//!         precondition: |_s| true,
//!         args: boxed(uint_range(1, 10)),
//!         run: |s, a| s + *a as i64,
//!         postcondition: |s, a, next| *next == s + *a as i64,
//!     }],
//! };
//!
//! let mut t = TestCase::new("counter");
//! let cfg = Config { seed: 1, ..Config::default() };
//! test_state_machine(&mut t, &machine, cfg);
//! assert!(!t.failed());
//! ```

pub mod harness;
pub mod machine;

pub use harness::test_state_machine;
pub use machine::{Command, StateMachine, Step};

/// Re-exports for convenient imports.
pub mod prelude {
    pub use crate::harness::test_state_machine;
    pub use crate::machine::{Command, StateMachine, Step};
}
