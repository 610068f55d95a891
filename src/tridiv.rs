use std::mem;

use rug::Integer;

use crate::factors::{Fact, Factors, Status};
use crate::primes;

impl Factors {
    /// Splits off all prime factors up to `bound` by trial division.
    ///
    /// Every entry is divided by the primes in [p_bound, bound]; once the
    /// remainder drops below p^2 it is prime itself and the entry is done.
    /// Whatever survives the whole range is reinserted as Unknown.
    pub fn trial_division(&mut self, bound: u32) {
        let lo = self.p_bound.to_u32().unwrap_or(2);
        let old = mem::take(&mut self.list);
        for f in old {
            let exp = f.exp;
            let mut rest = f.fac;
            let mut finished = false;
            primes::iterate(lo, bound, |p| {
                let t = Integer::from(p);
                let t2 = Integer::from(&t * &t);
                loop {
                    if rest < t2 {
                        self.insert(Fact {
                            fac: rest.clone(),
                            exp,
                            stat: Status::Prime,
                        });
                        finished = true;
                        return true;
                    }
                    if rest.mod_u(p) != 0 {
                        return false;
                    }
                    rest /= &t;
                    self.insert(Fact {
                        fac: t.clone(),
                        exp,
                        stat: Status::Prime,
                    });
                }
            });
            if !finished {
                self.insert(Fact {
                    fac: rest,
                    exp,
                    stat: Status::Unknown,
                });
            }
        }
        self.p_bound = Integer::from(bound);
    }
}
