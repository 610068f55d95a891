use log::debug;
use rug::Integer;

use crate::arith::modular_arithmetic::take_mod;
use crate::cancel::CancelToken;
use crate::gcd::{GcdIsN, RunningGcd};
use crate::Error;

/// Pollard's rho method with Floyd cycle detection.
///
/// Walks x -> x^2 + 1 mod n at two speeds and feeds |hare - tortoise| into
/// the batched gcd. Runs until a factor turns up, the batch collapses, or
/// the caller cancels; there is no natural exhaustion point.
pub fn rho(ctx: &CancelToken, n: &Integer) -> Result<Integer, Error> {
    let f = |x: &Integer| {
        let mut r = Integer::from(x * x);
        r += 1;
        take_mod(&r, n)
    };
    let a = Integer::from(2);
    let mut tortoise = f(&a);
    let mut hare = f(&f(&a));
    let mut acc = RunningGcd::new(n, 10);
    loop {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let diff = Integer::from(&hare - &tortoise).abs();
        match acc.test(&diff) {
            Ok(Some(d)) => {
                debug!("factor {}", d);
                return Ok(d);
            }
            Ok(None) => (),
            Err(GcdIsN) => return Err(Error::NoFactorFound),
        }
        tortoise = f(&tortoise);
        hare = f(&f(&hare));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_semiprime() {
        let ctx = CancelToken::new();
        let n = Integer::from(43_217_358_712_783_469u64);
        assert_eq!(rho(&ctx, &n), Ok(Integer::from(5_824_327)));
    }

    #[test]
    fn splits_product_of_million_range_primes() {
        let ctx = CancelToken::new();
        let n = Integer::from(1_000_003u64 * 1_000_033);
        assert_eq!(rho(&ctx, &n), Ok(Integer::from(1_000_033)));
    }

    #[test]
    fn collapsed_batch_is_no_factor() {
        // both prime factors of 2491 fall into the first batch of ten,
        // the gcd swallows them together
        let ctx = CancelToken::new();
        assert_eq!(rho(&ctx, &Integer::from(2491)), Err(Error::NoFactorFound));
    }

    #[test]
    fn cancelled_before_start() {
        let ctx = CancelToken::new();
        ctx.cancel();
        let n = Integer::from(43_217_358_712_783_469u64);
        assert_eq!(rho(&ctx, &n), Err(Error::Cancelled));
    }
}
