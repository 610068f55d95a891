use rug::integer::IsPrime;
use rug::Integer;

/// Primality classification of a recorded factor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Unknown,
    ProbPrime,
    Composite,
    Prime,
}

/// One entry of the factor list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fact {
    pub fac: Integer,
    pub exp: u32,
    pub stat: Status,
}

/// How far a factorization has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completeness {
    Incomplete,
    ProbablyComplete,
    Complete,
}

/// The factors found so far, in increasing order.
#[derive(Clone, Debug)]
pub struct Factors {
    pub list: Vec<Fact>,
    /// Bound used for trial division. Factors below p_bound^2 must be prime.
    pub p_bound: Integer,
}

impl Factors {
    /// Starts a factorization of `a`.
    pub fn new(a: Integer) -> Factors {
        Factors {
            list: vec![Fact {
                fac: a,
                exp: 1,
                stat: Status::Unknown,
            }],
            p_bound: Integer::from(1),
        }
    }

    /// Adds a factor, keeping the order and merging equal values.
    /// This operation does not preserve the represented product.
    pub fn insert(&mut self, f: Fact) {
        match self.list.binary_search_by(|e| e.fac.cmp(&f.fac)) {
            Ok(i) => {
                self.list[i].exp += f.exp;
                self.list[i].stat = merge_stat(self.list[i].stat, f.stat);
            }
            Err(i) => self.list.insert(i, f),
        }
    }

    /// Replaces the entry at `idx` by the two divisors a and b.
    /// Divisors below p_bound^2 need no further primality test.
    pub fn record_split(&mut self, idx: usize, a: Integer, b: Integer) {
        let old = self.list.remove(idx);
        let bound = Integer::from(&self.p_bound * &self.p_bound);
        for v in [a, b] {
            let stat = if bound > v {
                Status::Prime
            } else {
                Status::Unknown
            };
            self.insert(Fact {
                fac: v,
                exp: old.exp,
                stat,
            });
        }
    }

    /// Reports whether every factor is (probably) prime.
    pub fn is_complete(&self) -> Completeness {
        let mut res = Completeness::Complete;
        for f in &self.list {
            match f.stat {
                Status::Unknown | Status::Composite => return Completeness::Incomplete,
                Status::ProbPrime => res = Completeness::ProbablyComplete,
                Status::Prime => (),
            }
        }
        res
    }

    /// Runs a probable prime test on unclassified factors, and on probably
    /// prime ones again when `retest` is set.
    pub fn prime_test(&mut self, reps: u32, retest: bool) {
        for f in &mut self.list {
            if f.stat == Status::Unknown || retest && f.stat == Status::ProbPrime {
                f.stat = match f.fac.is_probably_prime(reps) {
                    IsPrime::No => Status::Composite,
                    IsPrime::Probably => Status::ProbPrime,
                    IsPrime::Yes => Status::Prime,
                };
            }
        }
    }
}

fn merge_stat(a: Status, b: Status) -> Status {
    use self::Status::*;
    match (a, b) {
        (Unknown, s) | (s, Unknown) => s,
        (ProbPrime, s) | (s, ProbPrime) => s,
        (x, y) if x == y => x,
        // Prime against Composite: the bookkeeping lost track somewhere
        _ => panic!("incompatible factor status"),
    }
}
