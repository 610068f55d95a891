//! Integer factorization built around modular arithmetic that collapses
//! into a factor whenever an inversion fails.
//!
//! The drivers share one shape: walk the primes up to a stage 1 bound, then
//! through a stage 2 window, and watch every modular inversion or batched
//! gcd for a divisor of the modulus. `ecm` runs Lenstra's elliptic curve
//! method on one random curve, `ecm_parallel` races many curves, `pm_one`
//! is Pollard's p-1 and `rho` his cycle method. `factorize` combines them
//! with trial division into a complete factorization.

pub mod arith;
pub mod cancel;
pub mod ecm;
pub mod factors;
pub mod gcd;
pub mod pmone;
pub mod primes;
pub mod random;
pub mod rho;
pub mod tridiv;

use std::thread;
use std::time::Duration;

use log::info;
use rug::Integer;

pub use crate::arith::curve::{Curve, Point};
pub use crate::arith::modular_arithmetic::FactorFound;
pub use crate::cancel::CancelToken;
pub use crate::ecm::{ecm, ecm_parallel};
pub use crate::factors::{Completeness, Fact, Factors, Status};
pub use crate::pmone::pm_one;
pub use crate::random::{LcgRandom, RandomSource};
pub use crate::rho::rho;

/// Terminal outcome of a driver that did not deliver a factor.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The trial ran to completion without discovering a factor.
    #[error("no factor found")]
    NoFactorFound,
    /// Context cancellation was observed at a poll point.
    #[error("cancelled")]
    Cancelled,
}

/// Primes up to this bound are removed by trial division before any of the
/// probabilistic methods run.
const TRIAL_BOUND: u32 = 10_000;

/// How long a rho attempt may run inside the portfolio before the bounded
/// methods take over.
const RHO_BUDGET: Duration = Duration::from_secs(1);

/// Factors n completely.
///
/// Trial division strips the small primes, then every remaining composite
/// is split by the first method that succeeds: a time-boxed rho attempt,
/// p-1, and finally repeated rounds of parallel curve trials. The returned
/// list is complete in the sense of [`Factors::is_complete`].
pub fn factorize<R: RandomSource>(
    ctx: &CancelToken,
    rng: &mut R,
    n: &Integer,
    b: u32,
    b1: u32,
    workers: usize,
) -> Result<Factors, Error> {
    let mut facts = Factors::new(Integer::from(n));
    facts.trial_division(TRIAL_BOUND);
    facts.prime_test(30, false);
    loop {
        let idx = facts
            .list
            .iter()
            .position(|f| matches!(f.stat, Status::Unknown | Status::Composite));
        let idx = match idx {
            Some(i) => i,
            None => return Ok(facts),
        };
        let v = Integer::from(&facts.list[idx].fac);
        info!("splitting {}", v);
        let d = split_one(ctx, rng, &v, b, b1, workers)?;
        let other = Integer::from(&v / &d);
        facts.record_split(idx, d, other);
        facts.prime_test(30, false);
    }
}

/// Finds one non-trivial divisor of the composite v.
fn split_one<R: RandomSource>(
    ctx: &CancelToken,
    rng: &mut R,
    v: &Integer,
    b: u32,
    b1: u32,
    workers: usize,
) -> Result<Integer, Error> {
    // rho is unbounded, so it only gets a slice of time before the bounded
    // methods take over
    let budget = ctx.child();
    let timer = budget.clone();
    thread::spawn(move || {
        thread::sleep(RHO_BUDGET);
        timer.cancel();
    });
    match rho(&budget, v) {
        Ok(d) => return Ok(d),
        Err(Error::Cancelled) if ctx.is_cancelled() => return Err(Error::Cancelled),
        Err(_) => (),
    }
    match pm_one(ctx, v, b, b1) {
        Ok(d) => return Ok(d),
        Err(Error::Cancelled) => return Err(Error::Cancelled),
        Err(Error::NoFactorFound) => (),
    }
    loop {
        match ecm_parallel(ctx, rng, v, b, b1, workers) {
            Ok(d) => return Ok(d),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(Error::NoFactorFound) => info!("no factor found, drawing new curves"),
        }
    }
}
