//! Command descriptors and the state machine they drive.

use std::fmt;

use propx::BoxGenerator;

/// One command of a state machine under test.
///
/// `S` is the model state, `A` the argument payload shared by the machine's
/// commands (typically an enum or a small tuple). Hooks are plain function
/// pointers; argument generation goes through a core generator so drawn
/// arguments come with their shrinkers.
pub struct Command<S, A> {
    /// Name used in failure rendering.
    pub name: &'static str,
    /// Whether the command may run in the given state.
    pub precondition: fn(&S) -> bool,
    /// Generator for the command's arguments.
    pub args: BoxGenerator<A>,
    /// Apply the command to the model, producing the next state.
    pub run: fn(&S, &A) -> S,
    /// Check the transition `(before, args, after)`.
    pub postcondition: fn(&S, &A, &S) -> bool,
}

/// A state machine: an initial model state and the commands that act on it.
pub struct StateMachine<S, A> {
    pub initial_state: S,
    pub commands: Vec<Command<S, A>>,
}

/// One drawn command application within a generated sequence.
#[derive(Clone, PartialEq, Eq)]
pub struct Step<A> {
    /// Index into the machine's command set.
    pub command: usize,
    /// The command's name, carried for rendering.
    pub name: &'static str,
    /// The drawn arguments.
    pub args: A,
}

impl<A: fmt::Debug> fmt::Debug for Step<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.name, self.args)
    }
}
