//! The property execution engine: sampling loop, parallel worker pool,
//! failure capture, and replay-key reporting.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::config::{Config, Size};
use crate::error::{PropertyError, panic_payload_message};
use crate::generator::Generator;
use crate::report::{FailureReport, default_host_command, example_scope};
use crate::rng::{derive_rng, entropy_seed};
use crate::shrink::{minimize, set_shrink_strategy};
use crate::testcase::{Outcome, TestCase, probe};

/// Run a property against `cfg.examples` generated values.
///
/// Curried call shape:
///
/// ```
/// use propx::{Config, Size, TestCase, for_all, int};
///
/// let mut t = TestCase::new("addition_identity");
/// let cfg = Config { seed: 1, ..Config::default() };
/// for_all(&mut t, cfg, int(Size { min: -100, max: 100 }))(|t, x| {
///     if x + 0 != x {
///         t.errorf(format!("addition identity failed for {}", x));
///     }
/// });
/// assert!(!t.failed());
/// ```
///
/// On failure the counterexample is shrunk to a local minimum and reported
/// with a deterministic replay key; the host test is marked as failed.
pub fn for_all<'t, T, G, P>(t: &'t mut TestCase, cfg: Config, generator: G) -> impl FnOnce(P) + 't
where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T> + Send + Sync + 't,
    P: Fn(&mut TestCase, T) + Send + Sync,
{
    move |property: P| run(t, cfg, &generator, &property)
}

/// The first thing a worker has to report for its slice of the run.
enum WorkerHit {
    PropertyFailure { index: u32 },
    GeneratorError { index: u32, error: PropertyError },
}

impl WorkerHit {
    fn index(&self) -> u32 {
        match self {
            WorkerHit::PropertyFailure { index } => *index,
            WorkerHit::GeneratorError { index, .. } => *index,
        }
    }
}

fn run<T, G, P>(t: &mut TestCase, cfg: Config, generator: &G, property: &P)
where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T> + Send + Sync,
    P: Fn(&mut TestCase, T) + Send + Sync,
{
    set_shrink_strategy(cfg.shrink_strategy);
    if cfg.examples == 0 {
        warn!("propx: examples=0, nothing to sample; passing");
        return;
    }
    let seed = if cfg.seed == 0 { entropy_seed() } else { cfg.seed };
    let test_name = t.name().to_string();

    let hit = if cfg.workers() <= 1 {
        run_sequential(t, &cfg, seed, generator, property)
    } else {
        run_parallel(&test_name, &cfg, seed, generator, property)
    };

    match hit {
        None => {}
        Some(WorkerHit::GeneratorError { index, error }) => {
            t.errorf(format!(
                "[propx] generator error at example {}: {}",
                index, error
            ));
        }
        Some(WorkerHit::PropertyFailure { index }) => {
            report_failure(t, &cfg, seed, index, generator, property);
        }
    }
}

/// The probe scope an example runs under; with subtests enabled its name is
/// the replay key.
fn scope_name(test_name: &str, cfg: &Config, index: u32) -> String {
    if cfg.use_subtests {
        format!("{}/{}", test_name, example_scope(index))
    } else {
        test_name.to_string()
    }
}

/// Draw the value for example `index`. A generator panic is a generation
/// error, surfaced without shrinking.
fn generate_example<T, G>(seed: u64, index: u32, generator: &G) -> Result<T, PropertyError>
where
    T: 'static,
    G: Generator<T>,
{
    let mut rng = derive_rng(seed, index as u64);
    let generated = catch_unwind(AssertUnwindSafe(|| {
        generator.generate(&mut rng, Size::default())
    }));
    match generated {
        Ok((value, _shrinker)) => Ok(value),
        Err(payload) => Err(match payload.downcast::<PropertyError>() {
            Ok(error) => *error,
            Err(payload) => {
                PropertyError::generation_failed(panic_payload_message(payload.as_ref()))
            }
        }),
    }
}

/// Generate example `index` and probe the property with it, without
/// touching any real test handle. Workers and the coordinator's
/// confirmation sweep go through here.
fn sample_one<T, G, P>(
    test_name: &str,
    cfg: &Config,
    seed: u64,
    index: u32,
    generator: &G,
    property: &P,
) -> Result<Outcome, PropertyError>
where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T>,
    P: Fn(&mut TestCase, T),
{
    let value = generate_example(seed, index, generator)?;
    let scope = scope_name(test_name, cfg, index);
    Ok(probe(&scope, move |probe_t| property(probe_t, value)))
}

fn run_sequential<T, G, P>(
    t: &mut TestCase,
    cfg: &Config,
    seed: u64,
    generator: &G,
    property: &P,
) -> Option<WorkerHit>
where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T>,
    P: Fn(&mut TestCase, T),
{
    let mut first_failure: Option<WorkerHit> = None;
    for index in 0..cfg.examples {
        let value = match generate_example(seed, index, generator) {
            Ok(value) => value,
            Err(error) => {
                // A broken generator outranks nothing: an earlier property
                // failure keeps the report.
                return first_failure.or(Some(WorkerHit::GeneratorError { index, error }));
            }
        };
        // With subtests enabled the example runs in a real child scope of
        // the host test, so a failing example marks it through the scope;
        // otherwise an isolated probe carries the verdict.
        let failed = if cfg.use_subtests {
            t.run_subtest(&example_scope(index), move |child| property(child, value))
        } else {
            probe(t.name(), move |probe_t| property(probe_t, value)).failed()
        };
        if failed {
            let hit = WorkerHit::PropertyFailure { index };
            if cfg.stop_on_first_failure {
                return Some(hit);
            }
            if first_failure.is_none() {
                first_failure = Some(hit);
            }
        }
    }
    first_failure
}

fn run_parallel<T, G, P>(
    test_name: &str,
    cfg: &Config,
    seed: u64,
    generator: &G,
    property: &P,
) -> Option<WorkerHit>
where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T> + Send + Sync,
    P: Fn(&mut TestCase, T) + Send + Sync,
{
    let workers = cfg.workers();
    let cancel = AtomicBool::new(false);
    let (tx, rx) = crossbeam::channel::bounded::<WorkerHit>(workers as usize);

    crossbeam::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            let cancel = &cancel;
            let (start, len) = partition(cfg.examples, workers, worker);
            scope.spawn(move |_| {
                debug!(
                    "propx: worker {} sampling examples {}..{}",
                    worker,
                    start,
                    start + len
                );
                let mut sent = false;
                for index in start..start + len {
                    // Cancellation is checked between examples only.
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    match sample_one(test_name, cfg, seed, index, generator, property) {
                        Err(error) => {
                            if !sent {
                                let _ = tx.send(WorkerHit::GeneratorError { index, error });
                                sent = true;
                            }
                            if cfg.stop_on_first_failure {
                                cancel.store(true, Ordering::Relaxed);
                            }
                            break;
                        }
                        Ok(outcome) => {
                            if outcome.failed() {
                                if !sent {
                                    let _ = tx.send(WorkerHit::PropertyFailure { index });
                                    sent = true;
                                }
                                if cfg.stop_on_first_failure {
                                    cancel.store(true, Ordering::Relaxed);
                                    break;
                                }
                            }
                        }
                    }
                }
            });
        }
    })
    .expect("propx: sampling worker panicked");
    drop(tx);

    // Deterministic selection: the failure with the smallest example index.
    let candidate = rx.iter().min_by_key(WorkerHit::index)?;

    // Cancellation may have stopped peers before they reached indices below
    // the candidate. Sweeping those sequentially pins the reported failure
    // to the globally smallest failing index, independent of scheduling.
    for index in 0..candidate.index() {
        match sample_one(test_name, cfg, seed, index, generator, property) {
            Err(error) => return Some(WorkerHit::GeneratorError { index, error }),
            Ok(outcome) if outcome.failed() => {
                return Some(WorkerHit::PropertyFailure { index });
            }
            Ok(_) => {}
        }
    }
    Some(candidate)
}

/// Contiguous index ranges, the remainder spread over the first workers.
fn partition(total: u32, workers: u32, worker: u32) -> (u32, u32) {
    let per = total / workers;
    let rem = total % workers;
    let start = worker * per + worker.min(rem);
    let len = per + u32::from(worker < rem);
    (start, len)
}

/// Shrink the chosen failure on this thread and emit the report.
///
/// The failing example is regenerated from `(seed, index)`: sampling is
/// deterministic in those alone, and rebuilding here keeps shrinkers from
/// ever crossing a thread boundary.
fn report_failure<T, G, P>(
    t: &mut TestCase,
    cfg: &Config,
    seed: u64,
    index: u32,
    generator: &G,
    property: &P,
) where
    T: Clone + fmt::Debug + 'static,
    G: Generator<T>,
    P: Fn(&mut TestCase, T),
{
    let mut rng = derive_rng(seed, index as u64);
    let (value, shrinker) = generator.generate(&mut rng, Size::default());
    let scope = scope_name(t.name(), cfg, index);

    let result = minimize(value, shrinker, cfg.max_shrink, |candidate| {
        let candidate = candidate.clone();
        probe(&scope, move |probe_t| property(probe_t, candidate)).failed()
    });

    match result {
        Ok(shrunk) => {
            let report = FailureReport {
                seed,
                examples_run: index + 1,
                shrunk_steps: shrunk.steps,
                counterexample: format!("{:?}", shrunk.minimal),
                test_name: t.name().to_string(),
                example_index: index,
                host_command: default_host_command(),
                budget_exhausted: shrunk.budget_exhausted,
            };
            t.errorf(report.to_string());
        }
        Err(invariant) => {
            // A framework bug: abort the run.
            t.fatalf(format!("[propx] {}", invariant));
        }
    }
}
