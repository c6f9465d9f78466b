//! Sequence generation and the harness entry point: a thin layer over the
//! propx engine.

use std::fmt;

use rand::Rng;

use propx::{BoxShrinker, Config, Generator, Shrinker, Size, TestCase, for_all, from, tree_shrink};

use crate::machine::{StateMachine, Step};

/// Sequences longer than this add little coverage and slow shrinking down.
const MAX_SEQUENCE_LEN: usize = 16;

/// Test a state machine: draw command sequences, thread the model state
/// through them, and fail when a postcondition does not hold. Shrinking
/// removes commands first, then shrinks retained arguments.
pub fn test_state_machine<S, A>(t: &mut TestCase, sm: &StateMachine<S, A>, cfg: Config)
where
    S: Clone + fmt::Debug + Send + Sync,
    A: Clone + fmt::Debug + Send + Sync + 'static,
{
    let generator = sequence_generator(sm);
    for_all(t, cfg, generator)(|t, steps: Vec<Step<A>>| {
        check_sequence(t, sm, &steps);
    });
}

/// Draw a command sequence: at each step, pick uniformly among the commands
/// whose precondition holds in the current model state, draw its arguments,
/// and advance the state.
fn sequence_generator<'sm, S, A>(
    sm: &'sm StateMachine<S, A>,
) -> impl Generator<Vec<Step<A>>> + Send + Sync + 'sm
where
    S: Clone + Send + Sync,
    A: Clone + Send + Sync + 'static,
{
    from(move |rng: &mut dyn rand::RngCore, size: Size| {
        let (lo, hi) = size.len_bounds();
        let hi = hi.min(MAX_SEQUENCE_LEN);
        let lo = lo.min(hi);
        let len = rng.gen_range(lo..=hi);

        let mut state = sm.initial_state.clone();
        let mut steps = Vec::new();
        let mut arg_shrinkers = Vec::new();
        for _ in 0..len {
            let enabled: Vec<usize> = sm
                .commands
                .iter()
                .enumerate()
                .filter(|(_, c)| (c.precondition)(&state))
                .map(|(i, _)| i)
                .collect();
            if enabled.is_empty() {
                break;
            }
            let pick = enabled[rng.gen_range(0..enabled.len())];
            let cmd = &sm.commands[pick];
            let (args, shrinker) = cmd.args.generate(rng, size);
            state = (cmd.run)(&state, &args);
            steps.push(Step {
                command: pick,
                name: cmd.name,
                args,
            });
            arg_shrinkers.push(shrinker);
        }

        let shrinker = SequenceShrinker::new(steps.clone(), arg_shrinkers);
        let boxed: BoxShrinker<Vec<Step<A>>> = Box::new(shrinker);
        (steps, boxed)
    })
}

/// Re-execute a sequence against the model. A sequence whose preconditions
/// no longer hold (shrinking can cut a step another one depended on) is
/// vacuous, not a counterexample.
fn check_sequence<S, A>(t: &mut TestCase, sm: &StateMachine<S, A>, steps: &[Step<A>])
where
    S: Clone + fmt::Debug,
    A: fmt::Debug,
{
    let mut state = sm.initial_state.clone();
    for step in steps {
        let cmd = &sm.commands[step.command];
        if !(cmd.precondition)(&state) {
            return;
        }
        let next = (cmd.run)(&state, &step.args);
        if !(cmd.postcondition)(&state, &step.args, &next) {
            t.errorf(format!(
                "postcondition of {} failed: {:?} -> {:?} (args {:?})",
                step.name, state, next, step.args
            ));
            return;
        }
        state = next;
    }
}

/// Sequence lengths to try when shrinking, shortest first.
fn removal_candidates(kept: &[usize], min_len: usize) -> Vec<Vec<usize>> {
    let len = kept.len();
    if len <= min_len {
        return Vec::new();
    }
    let mut out: Vec<Vec<usize>> = Vec::new();
    let mut lengths = vec![min_len];
    let mut distance = len - min_len;
    while distance > 0 {
        let l = len - distance;
        if l != min_len && !lengths.contains(&l) {
            lengths.push(l);
        }
        distance /= 2;
    }
    for l in lengths {
        out.push(kept[..l].to_vec());
    }
    for i in 0..len {
        let mut shorter = kept.to_vec();
        shorter.remove(i);
        if !out.contains(&shorter) {
            out.push(shorter);
        }
    }
    out
}

/// Two phases, like the core slice shrinker: first drop commands (a tree
/// walk over retained-index lists), then shrink the retained arguments in
/// order, resetting the acceptance signal at each hand-off.
struct SequenceShrinker<A> {
    steps: Vec<Step<A>>,
    arg_shrinkers: Vec<BoxShrinker<A>>,
    structure: Option<BoxShrinker<Vec<usize>>>,
    last_kept: Option<Vec<usize>>,
    kept: Vec<usize>,
    current: Vec<Step<A>>,
    pos: usize,
    last_args: Option<A>,
    fresh_handoff: bool,
}

impl<A: Clone + 'static> SequenceShrinker<A> {
    fn new(steps: Vec<Step<A>>, arg_shrinkers: Vec<BoxShrinker<A>>) -> Self {
        let kept: Vec<usize> = (0..steps.len()).collect();
        let structure = tree_shrink(&kept, |kept: &Vec<usize>| removal_candidates(kept, 0));
        Self {
            steps,
            arg_shrinkers,
            structure: Some(structure),
            last_kept: None,
            kept,
            current: Vec::new(),
            pos: 0,
            last_args: None,
            fresh_handoff: true,
        }
    }
}

impl<A: Clone> Shrinker<Vec<Step<A>>> for SequenceShrinker<A> {
    fn next(&mut self, accept: bool) -> Option<Vec<Step<A>>> {
        if let Some(tree) = self.structure.as_mut() {
            if accept {
                if let Some(kept) = self.last_kept.clone() {
                    self.kept = kept;
                }
            }
            if let Some(kept) = tree.next(accept) {
                self.last_kept = Some(kept.clone());
                let value: Vec<Step<A>> = kept.iter().map(|&i| self.steps[i].clone()).collect();
                return Some(value);
            }
            self.structure = None;
            self.current = self.kept.iter().map(|&i| self.steps[i].clone()).collect();
            self.pos = 0;
            self.fresh_handoff = true;
        }

        let mut accept = if self.fresh_handoff { false } else { accept };
        self.fresh_handoff = false;

        while self.pos < self.kept.len() {
            if accept {
                if let Some(args) = self.last_args.take() {
                    self.current[self.pos].args = args;
                }
            }
            let original_index = self.kept[self.pos];
            if let Some(candidate) = self.arg_shrinkers[original_index].next(accept) {
                self.last_args = Some(candidate.clone());
                let mut value = self.current.clone();
                value[self.pos].args = candidate;
                return Some(value);
            }
            self.pos += 1;
            self.last_args = None;
            accept = false;
        }
        None
    }
}
