//! Combinators over the core generator protocol: mapping, filtering,
//! binding, choice, and pairing.

use std::marker::PhantomData;
use std::sync::Arc;

use rand::{Rng, RngCore, SeedableRng};

use crate::config::Size;
use crate::error::PropertyError;
use crate::generator::{BoxGenerator, BoxShrinker, Generator, Shrinker};
use crate::rng::ExampleRng;

/// A pair of values with named components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

/// Naming alias for [`Pair`].
pub type Tuple<A, B> = Pair<A, B>;

/// A generator producing `f(a)` for `a` drawn from the inner generator.
/// Shrinking maps the inner candidates through `f`, which must be pure.
pub struct Map<A, G, F> {
    inner: G,
    f: Arc<F>,
    _phantom: PhantomData<fn(A)>,
}

/// Apply a pure function to every generated value, preserving shrinking.
pub fn map<A, B, G, F>(inner: G, f: F) -> Map<A, G, F>
where
    G: Generator<A>,
    F: Fn(A) -> B,
{
    Map {
        inner,
        f: Arc::new(f),
        _phantom: PhantomData,
    }
}

impl<A, B, G, F> Generator<B> for Map<A, G, F>
where
    A: 'static,
    B: 'static,
    G: Generator<A>,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (B, BoxShrinker<B>) {
        let (a, mut sa) = self.inner.generate(rng, size);
        let value = (self.f)(a);
        let f = Arc::clone(&self.f);
        let shrinker = move |accept: bool| -> Option<B> { sa.next(accept).map(|a| f(a)) };
        (value, Box::new(shrinker))
    }
}

/// A generator that retries the inner generator until the predicate holds.
pub struct Filter<G, P> {
    inner: G,
    pred: Arc<P>,
    max_tries: u32,
}

/// Keep only values satisfying `pred`, sampling up to `max_tries` times.
/// Exhausting the budget is a generator error, surfaced to the engine
/// without shrinking. Shrink candidates that violate `pred` are skipped.
pub fn filter<T, G, P>(inner: G, pred: P, max_tries: u32) -> Filter<G, P>
where
    G: Generator<T>,
    P: Fn(&T) -> bool,
{
    Filter {
        inner,
        pred: Arc::new(pred),
        max_tries,
    }
}

impl<T, G, P> Generator<T> for Filter<G, P>
where
    T: 'static,
    G: Generator<T>,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (T, BoxShrinker<T>) {
        for _ in 0..self.max_tries {
            let (v, mut sv) = self.inner.generate(rng, size);
            if !(self.pred)(&v) {
                continue;
            }
            let pred = Arc::clone(&self.pred);
            let shrinker = move |mut accept: bool| -> Option<T> {
                loop {
                    let candidate = sv.next(accept)?;
                    if pred(&candidate) {
                        return Some(candidate);
                    }
                    // A candidate outside the predicate is never emitted,
                    // and never descended into.
                    accept = false;
                }
            };
            return (v, Box::new(shrinker));
        }
        std::panic::panic_any(PropertyError::generator_exhausted(self.max_tries));
    }
}

/// A generator whose output generator depends on the first drawn value.
pub struct Bind<A, G, F> {
    inner: G,
    f: Arc<F>,
    _phantom: PhantomData<fn(A)>,
}

/// Draw `a` from `ga`, then draw the result from `f(a)`. Shrinking first
/// shrinks the inner value from `f(a)`; once exhausted, it shrinks `a` and
/// re-draws from `f(a')` with a fresh shrinker, on a deterministic RNG
/// stream split off at generation time.
pub fn bind<A, B, G, G2, F>(inner: G, f: F) -> Bind<A, G, F>
where
    G: Generator<A>,
    G2: Generator<B>,
    F: Fn(A) -> G2,
{
    Bind {
        inner,
        f: Arc::new(f),
        _phantom: PhantomData,
    }
}

enum BindMode {
    Inner,
    Outer,
}

struct BindShrinker<A, B, F> {
    f: Arc<F>,
    size: Size,
    reseed: u64,
    sa: BoxShrinker<A>,
    inner: BoxShrinker<B>,
    /// Fresh shrinker of the most recent re-drawn value, adopted if that
    /// value is accepted.
    staged: Option<BoxShrinker<B>>,
    /// Acceptance owed to `sa` at its next draw.
    outer_accept: bool,
    mode: BindMode,
}

impl<A, B, G2, F> Shrinker<B> for BindShrinker<A, B, F>
where
    G2: Generator<B>,
    F: Fn(A) -> G2,
{
    fn next(&mut self, mut accept: bool) -> Option<B> {
        loop {
            match self.mode {
                BindMode::Inner => {
                    if let Some(b) = self.inner.next(accept) {
                        return Some(b);
                    }
                    // Hand-off to the outer value resets the signal.
                    self.mode = BindMode::Outer;
                    accept = false;
                }
                BindMode::Outer => {
                    if accept {
                        if let Some(staged) = self.staged.take() {
                            // The re-drawn value reproduced the failure:
                            // descend into its fresh shrinker, and let `sa`
                            // descend from the accepted outer value later.
                            self.inner = staged;
                            self.outer_accept = true;
                            self.mode = BindMode::Inner;
                            accept = false;
                            continue;
                        }
                    }
                    let Some(a) = self.sa.next(self.outer_accept) else {
                        // Exhausted for good: a stale staged shrinker must
                        // not come back to life on a later accept.
                        self.staged = None;
                        return None;
                    };
                    self.outer_accept = false;
                    let mut rng = ExampleRng::seed_from_u64(self.reseed);
                    let (b, sb) = (self.f)(a).generate(&mut rng, self.size);
                    self.staged = Some(sb);
                    return Some(b);
                }
            }
        }
    }
}

impl<A, B, G, G2, F> Generator<B> for Bind<A, G, F>
where
    A: 'static,
    B: 'static,
    G: Generator<A>,
    G2: Generator<B>,
    F: Fn(A) -> G2 + Send + Sync + 'static,
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (B, BoxShrinker<B>) {
        let (a, sa) = self.inner.generate(rng, size);
        let (b, sb) = (self.f)(a).generate(rng, size);
        let reseed = rng.next_u64();
        let shrinker = BindShrinker {
            f: Arc::clone(&self.f),
            size,
            reseed,
            sa,
            inner: sb,
            staged: None,
            outer_accept: false,
            mode: BindMode::Inner,
        };
        (b, Box::new(shrinker))
    }
}

/// A generator that picks uniformly among the supplied generators.
pub struct OneOf<T> {
    choices: Arc<Vec<BoxGenerator<T>>>,
}

/// Pick one of `choices` uniformly. Shrinking stays within the chosen
/// branch first; once exhausted, it proposes one value from each
/// earlier-listed branch (earlier = simpler), sampled at the canonical
/// smallest size on a deterministic RNG stream split off at generation.
pub fn one_of<T>(choices: Vec<BoxGenerator<T>>) -> OneOf<T> {
    if choices.is_empty() {
        panic!("one_of requires at least one generator");
    }
    OneOf {
        choices: Arc::new(choices),
    }
}

struct OneOfShrinker<T> {
    choices: Arc<Vec<BoxGenerator<T>>>,
    inner: BoxShrinker<T>,
    staged: Option<BoxShrinker<T>>,
    reseed: u64,
    /// Earlier branches not yet proposed, in listing order.
    remaining: std::vec::IntoIter<usize>,
}

impl<T: 'static> Shrinker<T> for OneOfShrinker<T> {
    fn next(&mut self, mut accept: bool) -> Option<T> {
        loop {
            if accept {
                if let Some(staged) = self.staged.take() {
                    self.inner = staged;
                    accept = false;
                    continue;
                }
            }
            if let Some(v) = self.inner.next(accept) {
                return Some(v);
            }
            let Some(branch) = self.remaining.next() else {
                self.staged = None;
                return None;
            };
            let mut rng = ExampleRng::seed_from_u64(self.reseed.wrapping_add(branch as u64));
            let (v, sv) = self.choices[branch].generate(&mut rng, Size::ZERO);
            self.staged = Some(sv);
            return Some(v);
        }
    }
}

impl<T: 'static> Generator<T> for OneOf<T> {
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (T, BoxShrinker<T>) {
        let k = rng.gen_range(0..self.choices.len());
        let (v, sv) = self.choices[k].generate(rng, size);
        let reseed = rng.next_u64();
        let shrinker = OneOfShrinker {
            choices: Arc::clone(&self.choices),
            inner: sv,
            staged: None,
            reseed,
            remaining: (0..k).collect::<Vec<_>>().into_iter(),
        };
        (v, Box::new(shrinker))
    }
}

/// A generator of [`Pair`]s.
pub struct PairGenerator<GA, GB> {
    ga: GA,
    gb: GB,
}

/// Generate both components. Shrinks the first component to exhaustion,
/// then the second; the held first component is the last accepted one, and
/// the acceptance signal is reset at the switch.
pub fn pair_of<A, B, GA, GB>(ga: GA, gb: GB) -> PairGenerator<GA, GB>
where
    GA: Generator<A>,
    GB: Generator<B>,
{
    PairGenerator { ga, gb }
}

/// Naming alias for [`pair_of`].
pub fn tuple_of<A, B, GA, GB>(ga: GA, gb: GB) -> PairGenerator<GA, GB>
where
    GA: Generator<A>,
    GB: Generator<B>,
{
    pair_of(ga, gb)
}

struct PairShrinker<A, B> {
    sa: BoxShrinker<A>,
    sb: BoxShrinker<B>,
    current_a: A,
    current_b: B,
    last_a: Option<A>,
    last_b: Option<B>,
    shrinking_first: bool,
}

impl<A: Clone, B: Clone> Shrinker<Pair<A, B>> for PairShrinker<A, B> {
    fn next(&mut self, mut accept: bool) -> Option<Pair<A, B>> {
        if self.shrinking_first {
            if accept {
                if let Some(a) = self.last_a.take() {
                    self.current_a = a;
                }
            }
            if let Some(a) = self.sa.next(accept) {
                self.last_a = Some(a.clone());
                return Some(Pair {
                    first: a,
                    second: self.current_b.clone(),
                });
            }
            // First component exhausted: switch to the second, resetting
            // the acceptance signal.
            self.shrinking_first = false;
            accept = false;
        }
        if accept {
            if let Some(b) = self.last_b.take() {
                self.current_b = b;
            }
        }
        if let Some(b) = self.sb.next(accept) {
            self.last_b = Some(b.clone());
            return Some(Pair {
                first: self.current_a.clone(),
                second: b,
            });
        }
        None
    }
}

impl<A, B, GA, GB> Generator<Pair<A, B>> for PairGenerator<GA, GB>
where
    A: Clone + 'static,
    B: Clone + 'static,
    GA: Generator<A>,
    GB: Generator<B>,
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (Pair<A, B>, BoxShrinker<Pair<A, B>>) {
        let (a, sa) = self.ga.generate(rng, size);
        let (b, sb) = self.gb.generate(rng, size);
        let value = Pair {
            first: a.clone(),
            second: b.clone(),
        };
        let shrinker = PairShrinker {
            sa,
            sb,
            current_a: a,
            current_b: b,
            last_a: None,
            last_b: None,
            shrinking_first: true,
        };
        (value, Box::new(shrinker))
    }
}
