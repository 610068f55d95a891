use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use rug::Integer;

use crate::arith::curve::{Curve, Point};
use crate::arith::modular_arithmetic::{add_mod, multiply_mod, subtract_mod, FactorFound};
use crate::cancel::CancelToken;
use crate::primes::{self, prime_power};
use crate::random::{rand_below, LcgRandom, RandomSource};
use crate::Error;

/// Samples a curve together with a point on it.
///
/// b is derived as y^2 - x(x^2 + a), which puts (x, y) on the curve by
/// construction; singular curves are rejected and all three coordinates are
/// drawn again.
fn rand_curve<R: RandomSource>(rng: &mut R, n: &Integer) -> (Curve, Point) {
    loop {
        let x = rand_below(rng, n);
        let y = rand_below(rng, n);
        let a = rand_below(rng, n);
        let b = subtract_mod(
            &multiply_mod(&y, &y, n),
            &multiply_mod(&add_mod(&multiply_mod(&x, &x, n), &a, n), &x, n),
            n,
        );
        let curve = Curve::new(Integer::from(n), a, b);
        if !curve.is_singular() {
            return (curve, Point::affine(x, y));
        }
    }
}

/// Even multiples of the stage 2 base point, extended on demand.
///
/// `muls[i]` holds `[2(i+1)]P`, so the gap between two odd primes indexes
/// the table directly. Each extension is a single curve addition of the
/// smallest entry to the largest.
struct Multiples<'a> {
    curve: &'a Curve,
    muls: Vec<Point>,
}

impl<'a> Multiples<'a> {
    fn new(curve: &'a Curve, base: &Point) -> Result<Multiples<'a>, FactorFound> {
        let first = curve.double(base)?;
        Ok(Multiples {
            curve,
            muls: vec![first],
        })
    }

    fn get(&mut self, gap: u32) -> Result<&Point, FactorFound> {
        debug_assert!(gap >= 2 && gap % 2 == 0);
        let want = (gap / 2) as usize;
        while self.muls.len() < want {
            let next = self
                .curve
                .add(&self.muls[self.muls.len() - 1], &self.muls[0])?;
            self.muls.push(next);
        }
        Ok(&self.muls[want - 1])
    }
}

/// Tries to find a factor of n with a single random curve.
///
/// Stage 1 multiplies the point by every prime power up to b. If the point
/// survives without collapsing to neutral, stage 2 walks the primes in
/// (b, b1] hoping for one more prime factor in the group order; consecutive
/// point updates then differ by the prime gap, served from the even
/// multiples cache with one addition each. A failed inversion anywhere is
/// the factor.
pub fn ecm<R: RandomSource>(
    ctx: &CancelToken,
    rng: &mut R,
    n: &Integer,
    b: u32,
    b1: u32,
) -> Result<Integer, Error> {
    let (curve, mut point) = rand_curve(rng, n);
    debug!("trying a={} b={}", curve.a, curve.b);

    info!("stage 1");
    let mut found: Option<Integer> = None;
    let mut failure: Option<Error> = None;
    primes::iterate(2, b, |p| {
        if ctx.is_cancelled() {
            failure = Some(Error::Cancelled);
            return true;
        }
        let k = prime_power(p, b);
        match curve.mult(&point, &Integer::from(k)) {
            Ok(q) => {
                if q.is_neutral() {
                    // the whole group order divided out, nothing left to
                    // extract from this curve
                    failure = Some(Error::NoFactorFound);
                    return true;
                }
                point = q;
                false
            }
            Err(FactorFound(d)) => {
                found = Some(d);
                true
            }
        }
    });
    if let Some(d) = found {
        debug!("factor {} in stage 1", d);
        return Ok(d);
    }
    if let Some(e) = failure {
        return Err(e);
    }

    info!("stage 2");
    let mut cache = match Multiples::new(&curve, &point) {
        Ok(c) => c,
        Err(FactorFound(d)) => return Ok(d),
    };
    let mut prev: u32 = 0;
    primes::iterate(b + 1, b1, |p| {
        if ctx.is_cancelled() {
            failure = Some(Error::Cancelled);
            return true;
        }
        // the first prime is applied by scalar multiplication: the gap to
        // prev = 0 would be odd and the cache holds even multiples only
        let step = if prev == 0 {
            curve.mult(&point, &Integer::from(p))
        } else {
            cache.get(p - prev).and_then(|d| curve.add(&point, d))
        };
        match step {
            Ok(q) => {
                point = q;
                prev = p;
                false
            }
            Err(FactorFound(d)) => {
                found = Some(d);
                true
            }
        }
    });
    if let Some(d) = found {
        debug!("factor {} in stage 2", d);
        return Ok(d);
    }
    match failure {
        Some(e) => Err(e),
        None => Err(Error::NoFactorFound),
    }
}

/// Runs `workers` independent curve trials and returns the first factor.
///
/// Each worker draws its own generator, seeded with four bytes from the
/// caller's generator in spawn order. The first successful worker cancels
/// its peers through a child token; peers abandon their result when the
/// channel is gone. All workers are joined before returning.
pub fn ecm_parallel<R: RandomSource>(
    ctx: &CancelToken,
    rng: &mut R,
    n: &Integer,
    b: u32,
    b1: u32,
    workers: usize,
) -> Result<Integer, Error> {
    let child = ctx.child();
    let (sender, receiver) = mpsc::sync_channel::<Result<Integer, Error>>(1);
    info!("spawning {} curve trials", workers);
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let mut seed = [0u8; 4];
        rng.fill_bytes(&mut seed);
        let mut worker_rng = LcgRandom::new(u32::from_le_bytes(seed));
        let worker_ctx = child.clone();
        let n = Integer::from(n);
        let sender = sender.clone();
        handles.push(thread::spawn(move || {
            let res = ecm(&worker_ctx, &mut worker_rng, &n, b, b1);
            // the receiver is gone once a peer has won the race
            let _ = sender.send(res);
        }));
    }
    drop(sender);

    let mut outcome: Result<Integer, Error> = Err(Error::NoFactorFound);
    let mut finished = 0;
    while finished < workers {
        if ctx.is_cancelled() {
            outcome = Err(Error::Cancelled);
            break;
        }
        match receiver.recv_timeout(Duration::from_millis(20)) {
            Ok(Ok(fac)) => {
                outcome = Ok(fac);
                break;
            }
            Ok(Err(_)) => finished += 1,
            Err(mpsc::RecvTimeoutError::Timeout) => (),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    child.cancel();
    drop(receiver);
    for handle in handles {
        let _ = handle.join();
    }
    if ctx.is_cancelled() {
        if let Err(Error::NoFactorFound) = outcome {
            outcome = Err(Error::Cancelled);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divides(d: &Integer, n: &Integer) -> bool {
        Integer::from(n % d) == 0
    }

    #[test]
    fn seeded_curves_are_valid() {
        let n = Integer::from(2491);
        let mut rng = LcgRandom::new(1);
        for _ in 0..10 {
            let (curve, point) = rand_curve(&mut rng, &n);
            assert!(!curve.is_singular());
            assert!(curve.contains(&point));
            assert!(*point.x() < n && *point.y() < n);
        }
    }

    #[test]
    fn multiples_cache_matches_scalar_multiplication() {
        let curve = Curve::new(Integer::from(47), Integer::from(2), Integer::from(3));
        let base = Point::affine(Integer::from(12), Integer::from(4));
        let mut cache = Multiples::new(&curve, &base).unwrap();
        assert_eq!(
            *cache.get(2).unwrap(),
            curve.mult(&base, &Integer::from(2)).unwrap()
        );
        assert_eq!(
            *cache.get(8).unwrap(),
            curve.mult(&base, &Integer::from(8)).unwrap()
        );
        // an already cached entry is served again
        assert_eq!(
            *cache.get(4).unwrap(),
            curve.mult(&base, &Integer::from(4)).unwrap()
        );
    }

    #[test]
    fn finds_factor_of_small_semiprime() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(36);
        let n = Integer::from(2491);
        assert_eq!(ecm(&ctx, &mut rng, &n, 10, 100), Ok(Integer::from(53)));
    }

    #[test]
    fn finds_factor_in_stage_one() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(13);
        let n = Integer::from(43_217_358_712_783_469u64);
        assert_eq!(
            ecm(&ctx, &mut rng, &n, 1000, 10000),
            Ok(Integer::from(7_420_146_347u64))
        );
    }

    #[test]
    fn finds_factor_of_sixth_fermat_number() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(14);
        let n = Integer::from(Integer::u_pow_u(2, 64)) + 1;
        assert_eq!(ecm(&ctx, &mut rng, &n, 1000, 10000), Ok(Integer::from(274_177)));
    }

    #[test]
    fn finds_factor_of_seventh_fermat_number_in_stage_two() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(16);
        let n = Integer::from(Integer::u_pow_u(2, 128)) + 1;
        assert_eq!(
            ecm(&ctx, &mut rng, &n, 10000, 215_000),
            Ok(Integer::from(59_649_589_127_497_217u64))
        );
    }

    #[test]
    fn prime_modulus_yields_no_factor() {
        let ctx = CancelToken::new();
        let n = Integer::from(101);
        let mut rng = LcgRandom::new(5);
        assert_eq!(ecm(&ctx, &mut rng, &n, 10, 50), Err(Error::NoFactorFound));
        let mut rng = LcgRandom::new(99);
        assert_eq!(ecm(&ctx, &mut rng, &n, 10, 50), Err(Error::NoFactorFound));
    }

    #[test]
    fn cancelled_before_start() {
        let ctx = CancelToken::new();
        ctx.cancel();
        let mut rng = LcgRandom::new(36);
        let n = Integer::from(2491);
        assert_eq!(ecm(&ctx, &mut rng, &n, 10, 100), Err(Error::Cancelled));
    }

    #[test]
    fn parallel_returns_a_divisor() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(1);
        let n = Integer::from(2491);
        let d = ecm_parallel(&ctx, &mut rng, &n, 10, 100, 4).unwrap();
        assert!(d == 47 || d == 53);
    }

    #[test]
    fn parallel_splits_large_fermat_number() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(10);
        let n = Integer::from(Integer::u_pow_u(2, 128)) + 1;
        let d = ecm_parallel(&ctx, &mut rng, &n, 10000, 215_000, 200).unwrap();
        assert!(d > 1 && d < n);
        assert!(divides(&d, &n));
    }

    #[test]
    fn parallel_observes_outer_cancellation() {
        let ctx = CancelToken::new();
        ctx.cancel();
        let mut rng = LcgRandom::new(1);
        let n = Integer::from(Integer::u_pow_u(2, 128)) + 1;
        assert_eq!(
            ecm_parallel(&ctx, &mut rng, &n, 10000, 215_000, 2),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn parallel_reports_exhaustion_on_prime_modulus() {
        let ctx = CancelToken::new();
        let mut rng = LcgRandom::new(3);
        let n = Integer::from(101);
        assert_eq!(
            ecm_parallel(&ctx, &mut rng, &n, 10, 50, 3),
            Err(Error::NoFactorFound)
        );
    }
}
