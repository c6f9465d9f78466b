//! The core generator/shrinker contract.

use rand::RngCore;

use crate::config::Size;

/// Proposes simpler candidates derived from a value, guided by acceptance
/// feedback.
///
/// `accept` reports whether the *previous* candidate reproduced the failure:
/// accepted candidates become the point to descend from, rejected ones are
/// followed by a sibling at the same level. `accept` on the first call is
/// ignored. After `None`, every further call returns `None`.
pub trait Shrinker<T> {
    /// Produce the next candidate, or `None` when exhausted.
    fn next(&mut self, accept: bool) -> Option<T>;
}

/// Closures are shrinkers, so custom ones are authored the same way custom
/// generators are: a single `fn(accept) -> Option<T>`.
impl<T, F> Shrinker<T> for F
where
    F: FnMut(bool) -> Option<T>,
{
    fn next(&mut self, accept: bool) -> Option<T> {
        self(accept)
    }
}

/// A type-erased shrinker, as returned by every generator.
pub type BoxShrinker<T> = Box<dyn Shrinker<T>>;

/// The terminal shrinker: exhausted from the start.
pub fn no_shrink<T: 'static>() -> BoxShrinker<T> {
    Box::new(|_accept: bool| None)
}

/// Produces a value together with the shrinker that simplifies it.
///
/// Implementations must be pure with respect to `(rng-state, size)`:
/// identical inputs yield identical outputs.
pub trait Generator<T> {
    /// Generate a value and its shrinker using the provided RNG and size hint.
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (T, BoxShrinker<T>);
}

/// A type-erased generator, for heterogeneous collections of choices.
/// `Send + Sync` so composed generators stay shareable with the parallel
/// sampling workers.
pub type BoxGenerator<T> = Box<dyn Generator<T> + Send + Sync>;

impl<T> Generator<T> for BoxGenerator<T> {
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (T, BoxShrinker<T>) {
        (**self).generate(rng, size)
    }
}

/// Box a generator for use where type erasure is required (e.g. `one_of`).
pub fn boxed<T, G>(generator: G) -> BoxGenerator<T>
where
    G: Generator<T> + Send + Sync + 'static,
{
    Box::new(generator)
}

/// A generator defined by a plain function.
///
/// The single authoring surface for custom generators:
///
/// ```
/// use propx::{from, no_shrink, Size};
///
/// let answer = from(|_rng, _size| (42, no_shrink::<i32>()));
/// ```
pub struct FnGenerator<F> {
    f: F,
}

impl<T, F> Generator<T> for FnGenerator<F>
where
    F: Fn(&mut dyn RngCore, Size) -> (T, BoxShrinker<T>),
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (T, BoxShrinker<T>) {
        (self.f)(rng, size)
    }
}

/// Create a generator from a function `fn(rng, size) -> (value, shrinker)`.
pub fn from<T, F>(f: F) -> FnGenerator<F>
where
    F: Fn(&mut dyn RngCore, Size) -> (T, BoxShrinker<T>),
{
    FnGenerator { f }
}

/// A generator that always produces the same value, without shrinking.
#[derive(Debug, Clone)]
pub struct ConstantGenerator<T> {
    value: T,
}

impl<T: Clone + 'static> Generator<T> for ConstantGenerator<T> {
    fn generate(&self, _rng: &mut dyn RngCore, _size: Size) -> (T, BoxShrinker<T>) {
        (self.value.clone(), no_shrink())
    }
}

/// A terminal generator: always `v`, never shrinks.
pub fn constant<T: Clone + 'static>(value: T) -> ConstantGenerator<T> {
    ConstantGenerator { value }
}
