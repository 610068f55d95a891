use log::debug;
use rug::Integer;

use crate::arith::modular_arithmetic::multiply_mod;
use crate::cancel::CancelToken;
use crate::gcd::{GcdIsN, RunningGcd};
use crate::primes::{self, prime_power};
use crate::Error;

/// Cached even powers of the stage 2 base, keyed by prime gap.
///
/// `powers[i]` holds `base^(2(i+1)) mod n`; extending the table costs one
/// modular multiplication per entry, the multiplicative analogue of the
/// even point multiples used by the curve method.
struct PowerCache {
    n: Integer,
    powers: Vec<Integer>,
}

impl PowerCache {
    fn new(base: &Integer, n: &Integer) -> PowerCache {
        PowerCache {
            n: Integer::from(n),
            powers: vec![multiply_mod(base, base, n)],
        }
    }

    fn get(&mut self, gap: u32) -> &Integer {
        debug_assert!(gap >= 2 && gap % 2 == 0);
        let want = (gap / 2) as usize;
        while self.powers.len() < want {
            let next = multiply_mod(&self.powers[0], &self.powers[self.powers.len() - 1], &self.n);
            self.powers.push(next);
        }
        &self.powers[want - 1]
    }
}

/// Pollard's p-1 method with the same two stage schedule as the curve
/// method, run against the multiplicative group of Z/nZ.
///
/// Finds a prime factor p of n when p-1 is b-smooth apart from at most one
/// prime in (b, b1]. Every iteration pushes a-1 through the batched gcd; a
/// collapsed batch ends the attempt without a factor.
pub fn pm_one(ctx: &CancelToken, n: &Integer, b: u32, b1: u32) -> Result<Integer, Error> {
    let mut a = Integer::from(3);
    let mut acc = RunningGcd::new(n, 20);
    let mut found: Option<Integer> = None;
    let mut failure: Option<Error> = None;

    primes::iterate(2, b, |p| {
        if ctx.is_cancelled() {
            failure = Some(Error::Cancelled);
            return true;
        }
        let k = prime_power(p, b);
        match a.clone().pow_mod(&Integer::from(k), n) {
            Ok(v) => a = v,
            Err(_) => {
                failure = Some(Error::NoFactorFound);
                return true;
            }
        }
        match acc.test(&Integer::from(&a - 1u32)) {
            Ok(Some(d)) => {
                found = Some(d);
                true
            }
            Ok(None) => false,
            Err(GcdIsN) => {
                failure = Some(Error::NoFactorFound);
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

    let mut cache = PowerCache::new(&a, n);
    let mut prev: u32 = 0;
    primes::iterate(b + 1, b1, |p| {
        if ctx.is_cancelled() {
            failure = Some(Error::Cancelled);
            return true;
        }
        if prev == 0 {
            // first prime by full exponentiation, the gap would be odd
            match a.clone().pow_mod(&Integer::from(p), n) {
                Ok(v) => a = v,
                Err(_) => {
                    failure = Some(Error::NoFactorFound);
                    return true;
                }
            }
        } else {
            a = multiply_mod(&a, cache.get(p - prev), n);
        }
        match acc.test(&Integer::from(&a - 1u32)) {
            Ok(Some(d)) => {
                found = Some(d);
                true
            }
            Ok(None) => {
                prev = p;
                false
            }
            Err(GcdIsN) => {
                failure = Some(Error::NoFactorFound);
                true
            }
        }
    });
    if let Some(d) = found {
        debug!("factor {} in stage 2", d);
        return Ok(d);
    }
    if let Some(e) = failure {
        return Err(e);
    }

    match acc.finish() {
        Ok(Some(d)) => Ok(d),
        _ => Err(Error::NoFactorFound),
    }
}
