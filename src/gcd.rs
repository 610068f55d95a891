use rug::{Assign, Integer};

use crate::arith::modular_arithmetic::take_mod;

/// The accumulated product was a multiple of the modulus: several factors
/// collapsed into the same batch and the gcd lost them.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("accumulated gcd equals the modulus")]
pub struct GcdIsN;

/// Batches operands into one modular product so that a single gcd covers
/// `period` submissions. The gcd is the dominant cost of the Pollard style
/// methods, the product is cheap.
#[derive(Debug)]
pub struct RunningGcd {
    n: Integer,
    period: u32,
    it: u32,
    acc: Integer,
}

impl RunningGcd {
    pub fn new(n: &Integer, period: u32) -> RunningGcd {
        RunningGcd {
            n: Integer::from(n),
            period,
            it: 0,
            acc: Integer::from(1),
        }
    }

    /// Multiplies `a` into the batch. Every `period` submissions the batch is
    /// flushed; a proper divisor of n is returned as `Ok(Some(d))`.
    pub fn test(&mut self, a: &Integer) -> Result<Option<Integer>, GcdIsN> {
        self.it += 1;
        self.acc = take_mod(&Integer::from(&self.acc * a), &self.n);
        if self.it >= self.period {
            let fac = self.finish()?;
            if fac.is_some() {
                return Ok(fac);
            }
            self.it = 0;
            self.acc.assign(1);
        }
        Ok(None)
    }

    /// Flushes the batch unconditionally.
    pub fn finish(&self) -> Result<Option<Integer>, GcdIsN> {
        let d = Integer::from(&self.acc).gcd(&self.n);
        if d == 1 {
            return Ok(None);
        }
        if d == self.n {
            return Err(GcdIsN);
        }
        Ok(Some(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_reveals_shared_factor() {
        let n = Integer::from(35);
        let mut acc = RunningGcd::new(&n, 3);
        assert_eq!(acc.test(&Integer::from(2)), Ok(None));
        assert_eq!(acc.test(&Integer::from(3)), Ok(None));
        // 2 * 3 * 10 = 60 = 25 mod 35, gcd(25, 35) = 5
        assert_eq!(acc.test(&Integer::from(10)), Ok(Some(Integer::from(5))));
    }

    #[test]
    fn collapse_when_product_is_multiple_of_n() {
        let n = Integer::from(6);
        let mut acc = RunningGcd::new(&n, 2);
        assert_eq!(acc.test(&Integer::from(2)), Ok(None));
        assert_eq!(acc.test(&Integer::from(3)), Err(GcdIsN));
    }

    #[test]
    fn finish_flushes_a_partial_batch() {
        let n = Integer::from(35);
        let mut acc = RunningGcd::new(&n, 20);
        assert_eq!(acc.test(&Integer::from(5)), Ok(None));
        assert_eq!(acc.finish(), Ok(Some(Integer::from(5))));
    }

    #[test]
    fn finish_without_common_factor() {
        let n = Integer::from(35);
        let mut acc = RunningGcd::new(&n, 20);
        assert_eq!(acc.test(&Integer::from(4)), Ok(None));
        assert_eq!(acc.finish(), Ok(None));
    }

    #[test]
    fn counter_resets_after_a_clean_flush() {
        let n = Integer::from(91);
        let mut acc = RunningGcd::new(&n, 2);
        assert_eq!(acc.test(&Integer::from(2)), Ok(None));
        // gcd(6, 91) = 1, so this flush resets the batch
        assert_eq!(acc.test(&Integer::from(3)), Ok(None));
        // a fresh batch of one element must not flush yet
        assert_eq!(acc.test(&Integer::from(13)), Ok(None));
        assert_eq!(acc.test(&Integer::from(1)), Ok(Some(Integer::from(13))));
    }

    #[test]
    fn negative_operands_are_reduced() {
        let n = Integer::from(35);
        let mut acc = RunningGcd::new(&n, 1);
        assert_eq!(acc.test(&Integer::from(-30)), Ok(Some(Integer::from(5))));
    }
}
