use rug::Integer;

use crate::arith::modular_arithmetic::{
    add_mod, invert_mod, multiply_mod, pow_mod, subtract_mod, take_mod, FactorFound,
};

/// A point on a Weierstrass curve over Z/nZ.
///
/// The neutral element carries no coordinates; asking it for one is a
/// programming error. Affine coordinates are kept reduced to `[0, n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Point {
    Neutral,
    Affine { x: Integer, y: Integer },
}

impl Point {
    pub fn affine(x: Integer, y: Integer) -> Point {
        Point::Affine { x, y }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Point::Neutral)
    }

    pub fn x(&self) -> &Integer {
        match self {
            Point::Affine { x, .. } => x,
            Point::Neutral => panic!("coordinate of the neutral point"),
        }
    }

    pub fn y(&self) -> &Integer {
        match self {
            Point::Affine { y, .. } => y,
            Point::Neutral => panic!("coordinate of the neutral point"),
        }
    }
}

/// The curve y^2 = x^3 + ax + b interpreted over Z/nZ.
///
/// n is not assumed prime. Whenever a slope denominator is not invertible
/// its gcd with n is a proper divisor and every operation short-circuits
/// with [`FactorFound`]; that collapse is the entire point of running the
/// group law over a composite modulus.
#[derive(Clone, Debug)]
pub struct Curve {
    pub n: Integer,
    pub a: Integer,
    pub b: Integer,
}

impl Curve {
    pub fn new(n: Integer, a: Integer, b: Integer) -> Curve {
        Curve { n, a, b }
    }

    /// A curve with vanishing discriminant has no group law.
    pub fn is_singular(&self) -> bool {
        let four_a3 = multiply_mod(&Integer::from(4), &pow_mod(&self.a, 3, &self.n), &self.n);
        let twenty_seven_b2 =
            multiply_mod(&Integer::from(27), &pow_mod(&self.b, 2, &self.n), &self.n);
        add_mod(&four_a3, &twenty_seven_b2, &self.n) == 0
    }

    /// Membership test, used by the seeding contract and the tests.
    pub fn contains(&self, p: &Point) -> bool {
        match p {
            Point::Neutral => true,
            Point::Affine { x, y } => {
                let left = multiply_mod(y, y, &self.n);
                let x2_a = add_mod(&multiply_mod(x, x, &self.n), &self.a, &self.n);
                let right = add_mod(&multiply_mod(&x2_a, x, &self.n), &self.b, &self.n);
                left == right
            }
        }
    }

    pub fn neg(&self, p: &Point) -> Point {
        match p {
            Point::Neutral => Point::Neutral,
            Point::Affine { x, y } => Point::Affine {
                x: x.clone(),
                y: take_mod(&Integer::from(-y), &self.n),
            },
        }
    }

    pub fn add(&self, p: &Point, q: &Point) -> Result<Point, FactorFound> {
        if p.is_neutral() {
            return Ok(q.clone());
        }
        if q.is_neutral() {
            return Ok(p.clone());
        }
        if p == q {
            return self.double(p);
        }
        if *p == self.neg(q) {
            return Ok(Point::Neutral);
        }
        self.raw_add(p, q)
    }

    pub fn double(&self, p: &Point) -> Result<Point, FactorFound> {
        let (x, y) = match p {
            Point::Neutral => return Ok(Point::Neutral),
            Point::Affine { x, y } => (x, y),
        };
        if *y == 0 {
            // 2-torsion
            return Ok(Point::Neutral);
        }
        let inv = invert_mod(&add_mod(y, y, &self.n), &self.n)?;
        let x2 = multiply_mod(x, x, &self.n);
        let num = add_mod(&multiply_mod(&Integer::from(3), &x2, &self.n), &self.a, &self.n);
        let lambda = multiply_mod(&num, &inv, &self.n);
        let rx = subtract_mod(
            &subtract_mod(&multiply_mod(&lambda, &lambda, &self.n), x, &self.n),
            x,
            &self.n,
        );
        let ry = subtract_mod(
            &multiply_mod(&lambda, &subtract_mod(x, &rx, &self.n), &self.n),
            y,
            &self.n,
        );
        Ok(Point::Affine { x: rx, y: ry })
    }

    /// Chord addition; assumes neither operand is neutral, p != q and
    /// p != -q, with both points on the curve.
    fn raw_add(&self, p: &Point, q: &Point) -> Result<Point, FactorFound> {
        let (px, py) = (p.x(), p.y());
        let (qx, qy) = (q.x(), q.y());
        let denom = subtract_mod(px, qx, &self.n);
        if denom == 0 {
            // Equal x but distinct points: the y difference is a zero
            // divisor because y_p^2 = y_q^2 mod n, so its gcd with n is a
            // proper factor (gcd(0, n) = n would not be).
            let d = subtract_mod(py, qy, &self.n).gcd(&self.n);
            return Err(FactorFound(d));
        }
        let inv = invert_mod(&denom, &self.n)?;
        let lambda = multiply_mod(&subtract_mod(py, qy, &self.n), &inv, &self.n);
        let rx = subtract_mod(
            &subtract_mod(&multiply_mod(&lambda, &lambda, &self.n), px, &self.n),
            qx,
            &self.n,
        );
        let ry = subtract_mod(
            &multiply_mod(&lambda, &subtract_mod(px, &rx, &self.n), &self.n),
            py,
            &self.n,
        );
        Ok(Point::Affine { x: rx, y: ry })
    }

    /// Scalar multiplication by shift-or-add over a private copy of |m|.
    ///
    /// While the low bit is set the point is accumulated and the bit
    /// cleared, otherwise the base is doubled and the scalar shifted; this
    /// keeps `[m]base + acc` invariant across iterations.
    pub fn mult(&self, p: &Point, m: &Integer) -> Result<Point, FactorFound> {
        let mut m = Integer::from(m);
        let mut base = p.clone();
        if m < 0 {
            base = self.neg(&base);
            m.abs_mut();
        }
        let mut acc = Point::Neutral;
        while m != 0 {
            if m.get_bit(0) {
                acc = self.add(&acc, &base)?;
                m.set_bit(0, false);
            } else {
                base = self.double(&base)?;
                m >>= 1;
            }
        }
        Ok(acc)
    }
}
