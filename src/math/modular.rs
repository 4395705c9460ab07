//! Modular arithmetic operations over Z_q.

/// Default ciphertext prime q = 2^60 - 2^14 + 1.
///
/// Satisfies q ≡ 1 (mod 16384), so it supports negacyclic NTTs for ring
/// dimensions up to 8192.
pub const DEFAULT_Q: u64 = 1152921504606830593;

/// Modular arithmetic operations over Z_q
pub struct ModQ;

impl ModQ {
    /// Add two values modulo q
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = (a as u128) + (b as u128);
        (sum % (q as u128)) as u64
    }

    /// Subtract two values modulo q
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        let prod = (a as u128) * (b as u128);
        (prod % (q as u128)) as u64
    }

    /// Negate a value modulo q
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        if val >= 0 {
            (val as u64) % q
        } else {
            let abs = val.unsigned_abs();
            let r = abs % q;
            if r == 0 {
                0
            } else {
                q - r
            }
        }
    }

    /// Convert from Z_q to the centered representative in [-q/2, q/2]
    #[inline]
    pub fn to_signed(val: u64, q: u64) -> i64 {
        if val <= q / 2 {
            val as i64
        } else {
            -((q - val) as i64)
        }
    }

    /// Modular exponentiation by square-and-multiply
    pub fn pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1u64 % q;
        base %= q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            exp >>= 1;
            base = Self::mul(base, base, q);
        }
        result
    }

    /// Deterministic Miller-Rabin primality test for 64-bit integers
    pub fn is_prime(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
        for &p in &WITNESSES {
            if n % p == 0 {
                return n == p;
            }
        }

        let mut d = n - 1;
        let mut r = 0;
        while d % 2 == 0 {
            d /= 2;
            r += 1;
        }

        'witness: for &a in &WITNESSES {
            let mut x = Self::pow(a, d, n);
            if x == 1 || x == n - 1 {
                continue;
            }
            for _ in 1..r {
                x = Self::mul(x, x, n);
                if x == n - 1 {
                    continue 'witness;
                }
            }
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u64 = DEFAULT_Q;

    #[test]
    fn test_add() {
        assert_eq!(ModQ::add(5, 7, Q), 12);
        assert_eq!(ModQ::add(Q - 1, 2, Q), 1);
    }

    #[test]
    fn test_sub() {
        assert_eq!(ModQ::sub(10, 3, Q), 7);
        assert_eq!(ModQ::sub(3, 10, Q), Q - 7);
    }

    #[test]
    fn test_mul() {
        assert_eq!(ModQ::mul(5, 7, Q), 35);
        let expected = ((1u128 << 60) % Q as u128) as u64;
        assert_eq!(ModQ::mul(1 << 30, 1 << 30, Q), expected);
    }

    #[test]
    fn test_negate() {
        assert_eq!(ModQ::negate(5, Q), Q - 5);
        assert_eq!(ModQ::negate(0, Q), 0);
    }

    #[test]
    fn test_from_signed() {
        assert_eq!(ModQ::from_signed(5, Q), 5);
        assert_eq!(ModQ::from_signed(-5, Q), Q - 5);
        assert_eq!(ModQ::from_signed(0, Q), 0);
        assert_eq!(ModQ::from_signed(-(65537 * 3), 65537), 0);
    }

    #[test]
    fn test_to_signed() {
        assert_eq!(ModQ::to_signed(5, Q), 5);
        assert_eq!(ModQ::to_signed(Q - 5, Q), -5);
    }

    #[test]
    fn test_pow() {
        assert_eq!(ModQ::pow(2, 10, Q), 1024);
        // Fermat's little theorem
        assert_eq!(ModQ::pow(3, Q - 1, Q), 1);
    }

    #[test]
    fn test_is_prime() {
        assert!(ModQ::is_prime(Q));
        assert!(ModQ::is_prime(65537));
        assert!(ModQ::is_prime(1099511480321));
        assert!(!ModQ::is_prime(65535));
        assert!(!ModQ::is_prime(1));
        assert!(!ModQ::is_prime(Q - 2));
    }
}
