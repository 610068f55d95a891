use rug::ops::Pow;
use rug::Integer;

/// A non-trivial divisor of the modulus, surfaced by an inversion whose
/// operand shares a factor with n. This is the positive outcome of the whole
/// library, threaded through the error arm of the curve arithmetic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactorFound(pub Integer);

pub fn div_mod(a: &Integer, modulo: &Integer) -> (Integer, Integer) {
    <(Integer, Integer)>::from(a.div_rem_ref(modulo))
}

/// Remainder of a by the modulus, normalized to `[0, modulo)`.
pub fn take_mod(a: &Integer, modulo: &Integer) -> Integer {
    let rem = div_mod(a, modulo).1;
    if rem < 0 {
        rem + modulo
    } else {
        rem
    }
}

pub fn multiply_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a * b), modulo)
}

pub fn add_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a + b), modulo)
}

pub fn subtract_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a - b), modulo)
}

pub fn pow_mod(a: &Integer, n: u32, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a).pow(n), modulo)
}

/// Inverse of a modulo n, computed through the extended gcd.
///
/// When the gcd is not 1 the inverse does not exist, and the gcd itself is a
/// divisor of the modulus; it is surfaced as [`FactorFound`]. With a reduced
/// operand in `(0, n)` the divisor is proper.
pub fn invert_mod(a: &Integer, modulo: &Integer) -> Result<Integer, FactorFound> {
    let (d, inv, _) = take_mod(a, modulo).extended_gcd(Integer::from(modulo), Integer::new());
    if d != 1 {
        return Err(FactorFound(d));
    }
    Ok(take_mod(&inv, modulo))
}
