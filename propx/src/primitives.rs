//! Generators for primitive values: integers, booleans, strings, slices.

use rand::{Rng, RngCore};

use crate::config::Size;
use crate::generator::{BoxShrinker, Generator, Shrinker};
use crate::shrink::TreeShrinker;

/// Generator for signed integers in an inclusive range, shrinking toward
/// the in-range value closest to zero.
#[derive(Debug, Clone)]
pub struct IntGenerator {
    min: i64,
    max: i64,
}

/// Integers with the range taken from the size hint (`min <= x <= max`).
pub fn int(size: Size) -> IntGenerator {
    int_range(size.min, size.max)
}

/// Integers in an explicit inclusive range.
pub fn int_range(min: i64, max: i64) -> IntGenerator {
    if min > max {
        panic!("int_range requires min <= max, got [{}, {}]", min, max);
    }
    IntGenerator { min, max }
}

/// The in-range value closest to zero: the shrink target.
fn int_target(min: i64, max: i64) -> i64 {
    if min <= 0 && 0 <= max {
        0
    } else if min > 0 {
        min
    } else {
        max
    }
}

/// Candidates for `v`, simplest first: the target, then the geometric
/// ladder of values between the target and `v` (midpoint, then ever closer
/// to `v`, ending one step away). A negative value also proposes its
/// absolute value, whose subtree is the positive shrink path.
fn int_candidates(v: i64, min: i64, max: i64) -> Vec<i64> {
    let target = int_target(min, max);
    if v == target {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut push = |c: i64| {
        if c != v && min <= c && c <= max && !out.contains(&c) {
            out.push(c);
        }
    };
    push(target);
    let mut distance = v - target;
    while distance != 0 {
        push(v - distance);
        distance /= 2;
    }
    if v < 0 && v != i64::MIN {
        push(-v);
    }
    out
}

impl Generator<i64> for IntGenerator {
    fn generate(&self, rng: &mut dyn RngCore, _size: Size) -> (i64, BoxShrinker<i64>) {
        let v = rng.gen_range(self.min..=self.max);
        let (min, max) = (self.min, self.max);
        let shrinker = TreeShrinker::new(&v, move |v: &i64| int_candidates(*v, min, max));
        (v, Box::new(shrinker))
    }
}

/// Generator for unsigned integers in an inclusive range, shrinking toward
/// the range minimum.
#[derive(Debug, Clone)]
pub struct UintGenerator {
    min: u64,
    max: u64,
}

/// Unsigned integers with the range taken from the size hint (clamped to
/// be non-negative).
pub fn uint(size: Size) -> UintGenerator {
    uint_range(size.min.max(0) as u64, size.max.max(0) as u64)
}

/// Unsigned integers in an explicit inclusive range.
pub fn uint_range(min: u64, max: u64) -> UintGenerator {
    if min > max {
        panic!("uint_range requires min <= max, got [{}, {}]", min, max);
    }
    UintGenerator { min, max }
}

fn uint_candidates(v: u64, min: u64) -> Vec<u64> {
    if v == min {
        return Vec::new();
    }
    let mut out = vec![min];
    let mut distance = v - min;
    while distance > 0 {
        let c = v - distance;
        if c != min && !out.contains(&c) {
            out.push(c);
        }
        distance /= 2;
    }
    out
}

impl Generator<u64> for UintGenerator {
    fn generate(&self, rng: &mut dyn RngCore, _size: Size) -> (u64, BoxShrinker<u64>) {
        let v = rng.gen_range(self.min..=self.max);
        let min = self.min;
        let shrinker = TreeShrinker::new(&v, move |v: &u64| uint_candidates(*v, min));
        (v, Box::new(shrinker))
    }
}

/// Generator for booleans: 50/50, shrinking `true` to `false`.
#[derive(Debug, Clone)]
pub struct BoolGenerator;

/// Random booleans.
pub fn boolean() -> BoolGenerator {
    BoolGenerator
}

impl Generator<bool> for BoolGenerator {
    fn generate(&self, rng: &mut dyn RngCore, _size: Size) -> (bool, BoxShrinker<bool>) {
        let v = rng.gen_bool(0.5);
        let shrinker = TreeShrinker::new(&v, |v: &bool| if *v { vec![false] } else { Vec::new() });
        (v, Box::new(shrinker))
    }
}

/// The lengths to try when shrinking a string or slice of length `len`:
/// the minimum, then the geometric ladder back up toward `len - 1`.
fn length_ladder(len: usize, min_len: usize) -> Vec<usize> {
    if len <= min_len {
        return Vec::new();
    }
    let mut out = vec![min_len];
    let mut distance = len - min_len;
    while distance > 0 {
        let l = len - distance;
        if l != min_len && !out.contains(&l) {
            out.push(l);
        }
        distance /= 2;
    }
    out
}

/// Generator for strings over a fixed alphabet.
#[derive(Debug, Clone)]
pub struct StringGenerator {
    alphabet: Vec<char>,
    size: Size,
}

/// Strings over `alphabet`: length uniform in `size`'s bounds, each
/// character drawn uniformly. Shrinks by length first (prefixes are kept),
/// then individual characters toward the alphabet's first symbol.
pub fn string(alphabet: &str, size: Size) -> StringGenerator {
    let alphabet: Vec<char> = alphabet.chars().collect();
    if alphabet.is_empty() {
        panic!("string generator requires a non-empty alphabet");
    }
    StringGenerator { alphabet, size }
}

const ALPHA: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Strings of alphabetic characters.
pub fn string_alpha(size: Size) -> StringGenerator {
    string(ALPHA, size)
}

/// Strings of alphanumeric characters.
pub fn string_alpha_num(size: Size) -> StringGenerator {
    let alphanum = format!("{}{}", ALPHA, DIGITS);
    string(&alphanum, size)
}

/// Strings of decimal digits.
pub fn string_digits(size: Size) -> StringGenerator {
    string(DIGITS, size)
}

/// Strings of printable ASCII characters.
pub fn string_ascii(size: Size) -> StringGenerator {
    let printable: String = (b' '..=b'~').map(char::from).collect();
    string(&printable, size)
}

fn string_candidates(s: &[char], alphabet: &[char], min_len: usize) -> Vec<Vec<char>> {
    let mut out: Vec<Vec<char>> = Vec::new();

    // Length first: prefixes at each rung of the ladder.
    for l in length_ladder(s.len(), min_len) {
        out.push(s[..l].to_vec());
    }

    // Then characters, toward the alphabet's first symbol.
    for (i, c) in s.iter().enumerate() {
        let Some(k) = alphabet.iter().position(|a| a == c) else {
            continue;
        };
        for target in [0, k / 2] {
            if target != k {
                let mut chars = s.to_vec();
                chars[i] = alphabet[target];
                if !out.contains(&chars) {
                    out.push(chars);
                }
            }
        }
    }
    out
}

impl Generator<String> for StringGenerator {
    fn generate(&self, rng: &mut dyn RngCore, _size: Size) -> (String, BoxShrinker<String>) {
        let (lo, hi) = self.size.len_bounds();
        let len = rng.gen_range(lo..=hi);
        let chars: Vec<char> = (0..len)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect();
        let value: String = chars.iter().collect();

        let alphabet = self.alphabet.clone();
        let mut tree = TreeShrinker::new(&chars, move |s: &Vec<char>| {
            string_candidates(s, &alphabet, lo)
        });
        let shrinker = move |accept: bool| -> Option<String> {
            tree.next(accept).map(|chars| chars.into_iter().collect())
        };
        (value, Box::new(shrinker))
    }
}

/// Generator for `Vec<T>`.
pub struct SliceGenerator<T, G> {
    element: G,
    size: Size,
    _phantom: std::marker::PhantomData<T>,
}

/// Slices with length in `size`'s bounds and elements from `element`.
/// Shrinks by removing elements first, then by shrinking retained elements
/// with the shrinkers captured at generation time.
pub fn slice_of<T, G>(element: G, size: Size) -> SliceGenerator<T, G>
where
    G: Generator<T>,
{
    SliceGenerator {
        element,
        size,
        _phantom: std::marker::PhantomData,
    }
}

/// Structure candidates for slice shrinking: lists of retained original
/// indices, simplest first — prefixes at each ladder rung, then every
/// single-element removal.
fn kept_candidates(kept: &[usize], min_len: usize) -> Vec<Vec<usize>> {
    let len = kept.len();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for l in length_ladder(len, min_len) {
        out.push(kept[..l].to_vec());
    }
    if len > min_len {
        for i in 0..len {
            let mut shorter = kept.to_vec();
            shorter.remove(i);
            if !out.contains(&shorter) {
                out.push(shorter);
            }
        }
    }
    out
}

/// Two phases: first remove elements (a tree walk over retained-index
/// lists), then shrink the retained elements in place, first to last, with
/// the acceptance signal reset at each hand-off.
struct SliceShrinker<T> {
    elems: Vec<T>,
    shrinkers: Vec<BoxShrinker<T>>,
    structure: Option<TreeShrinker<Vec<usize>, Box<dyn Fn(&Vec<usize>) -> Vec<Vec<usize>>>>>,
    last_kept: Option<Vec<usize>>,
    kept: Vec<usize>,
    current: Vec<T>,
    pos: usize,
    last_elem: Option<T>,
    fresh_handoff: bool,
}

impl<T: Clone> Shrinker<Vec<T>> for SliceShrinker<T> {
    fn next(&mut self, accept: bool) -> Option<Vec<T>> {
        if let Some(tree) = self.structure.as_mut() {
            if accept {
                if let Some(kept) = self.last_kept.clone() {
                    self.kept = kept;
                }
            }
            if let Some(kept) = tree.next(accept) {
                self.last_kept = Some(kept.clone());
                let value: Vec<T> = kept.iter().map(|&i| self.elems[i].clone()).collect();
                return Some(value);
            }
            // Structure settled; move on to the retained elements.
            self.structure = None;
            self.current = self.kept.iter().map(|&i| self.elems[i].clone()).collect();
            self.pos = 0;
            self.fresh_handoff = true;
        }

        // The hand-off from the structure phase (and from each element to
        // the next) resets the acceptance signal.
        let mut accept = if self.fresh_handoff { false } else { accept };
        self.fresh_handoff = false;

        while self.pos < self.kept.len() {
            if accept {
                if let Some(v) = self.last_elem.take() {
                    self.current[self.pos] = v;
                }
            }
            let original_index = self.kept[self.pos];
            if let Some(candidate) = self.shrinkers[original_index].next(accept) {
                self.last_elem = Some(candidate.clone());
                let mut value = self.current.clone();
                value[self.pos] = candidate;
                return Some(value);
            }
            self.pos += 1;
            self.last_elem = None;
            accept = false;
        }
        None
    }
}

impl<T, G> Generator<Vec<T>> for SliceGenerator<T, G>
where
    T: Clone + 'static,
    G: Generator<T>,
{
    fn generate(&self, rng: &mut dyn RngCore, size: Size) -> (Vec<T>, BoxShrinker<Vec<T>>) {
        let (lo, hi) = self.size.len_bounds();
        let len = rng.gen_range(lo..=hi);
        let mut elems = Vec::with_capacity(len);
        let mut shrinkers = Vec::with_capacity(len);
        for _ in 0..len {
            let (v, s) = self.element.generate(rng, size);
            elems.push(v);
            shrinkers.push(s);
        }
        let value = elems.clone();

        let kept: Vec<usize> = (0..len).collect();
        let expand: Box<dyn Fn(&Vec<usize>) -> Vec<Vec<usize>>> =
            Box::new(move |kept: &Vec<usize>| kept_candidates(kept, lo));
        let shrinker = SliceShrinker {
            elems,
            shrinkers,
            structure: Some(TreeShrinker::new(&kept, expand)),
            last_kept: None,
            kept,
            current: Vec::new(),
            pos: 0,
            last_elem: None,
            fresh_handoff: true,
        };
        (value, Box::new(shrinker))
    }
}
