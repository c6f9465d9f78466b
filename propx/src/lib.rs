//! # Propx - Property-Based Testing for Rust
//!
//! Propx samples random inputs for a property, detects failures, and
//! automatically shrinks any counterexample to a locally-minimal witness,
//! reported with a deterministic replay key.
//!
//! ## Quick Start
//!
//! ```rust
//! use propx::{Config, Size, TestCase, for_all, int};
//!
//! let mut t = TestCase::new("addition_identity");
//! let cfg = Config { seed: 1, ..Config::default() };
//! for_all(&mut t, cfg, int(Size { min: -100, max: 100 }))(|t, x| {
//!     if x + 0 != x {
//!         t.errorf(format!("addition identity failed for {}", x));
//!     }
//! });
//! assert!(!t.failed());
//! ```
//!
//! Generators compose: [`map`], [`filter`], [`bind`], [`one_of`],
//! [`pair_of`], and [`slice_of`] all preserve shrinking, and [`from`] turns
//! a plain function into a custom generator.

// Public modules
pub mod combinators;
pub mod config;
pub mod equal;
pub mod error;
pub mod execution;
pub mod generator;
pub mod primitives;
pub mod report;
pub mod rng;
pub mod shrink;
pub mod testcase;

// Re-export the main public API
pub use combinators::{
    Bind, Filter, Map, OneOf, Pair, PairGenerator, Tuple, bind, filter, map, one_of, pair_of,
    tuple_of,
};
pub use config::{Config, ShrinkStrategy, Size};
pub use equal::equal;
pub use error::PropertyError;
pub use execution::for_all;
pub use generator::{
    BoxGenerator, BoxShrinker, ConstantGenerator, FnGenerator, Generator, Shrinker, boxed,
    constant, from, no_shrink,
};
pub use primitives::{
    BoolGenerator, IntGenerator, SliceGenerator, StringGenerator, UintGenerator, boolean, int,
    int_range, slice_of, string, string_alpha, string_alpha_num, string_ascii, string_digits,
    uint, uint_range,
};
pub use report::{FailureReport, example_scope};
pub use rng::{ExampleRng, derive_rng, entropy_seed, mix};
pub use shrink::{ShrinkReport, minimize, set_shrink_strategy, shrink_strategy, tree_shrink};
pub use testcase::TestCase;
