use std::iter;

use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use rsa::BigUint;

pub trait ToBytesPadded {
    /// Returns the byte representation of `self` in big-endian byte order,
    /// left-padding the number with zeroes to the specified length.
    ///
    /// If `len` is less than or equal to the length of the byte representation
    /// of `self`, no padding will be added.
    fn to_bytes_be_padded(&self, len: usize) -> Vec<u8>;
}

impl ToBytesPadded for BigUint {
    fn to_bytes_be_padded(&self, len: usize) -> Vec<u8> {
        let v = self.to_bytes_be();
        if len > v.len() {
            iter::repeat(0)
                .take(len - v.len())
                .chain(v.into_iter())
                .collect()
        } else {
            v
        }
    }
}

/// Compute the inverse of `a` modulo `n` using the extended Euclidean algorithm.
///
/// Returns `None` when `a` and `n` are not coprime. A returned inverse is
/// always in `[1, n)`.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    if n <= &BigUint::one() {
        return None;
    }
    let a = a % n;
    if a.is_zero() {
        return None;
    }

    let mut t = BigUint::zero();
    let mut new_t = BigUint::one();
    let mut r = n.clone();
    let mut new_r = a;

    // Signs are tracked separately since the coefficients are unsigned
    let mut t_neg = false;
    let mut new_t_neg = false;

    while !new_r.is_zero() {
        let (quotient, remainder) = r.div_rem(&new_r);

        // t, new_t = new_t, t - quotient * new_t
        let qt = &quotient * &new_t;
        let (next_t, next_t_neg) = if t_neg == new_t_neg {
            if t >= qt {
                (t - &qt, t_neg)
            } else {
                (&qt - t, !t_neg)
            }
        } else {
            (t + &qt, t_neg)
        };
        t = new_t;
        t_neg = new_t_neg;
        new_t = next_t;
        new_t_neg = next_t_neg;

        // r, new_r = new_r, r mod new_r
        r = new_r;
        new_r = remainder;
    }

    if !r.is_one() {
        return None;
    }

    if t_neg {
        Some(n - &t)
    } else {
        Some(t)
    }
}

/// Draw a uniformly distributed integer in `[0, bound)`.
///
/// Candidates are read with exactly as many bits as `bound` has and rejected
/// when they overflow, so at most half of the draws are discarded on average.
pub fn random_below<R: RngCore + ?Sized>(rng: &mut R, bound: &BigUint) -> BigUint {
    debug_assert!(!bound.is_zero());
    let bits = bound.bits();
    let mut bytes = vec![0u8; (bits + 7) / 8];
    let excess = bytes.len() * 8 - bits;
    loop {
        rng.fill_bytes(&mut bytes);
        bytes[0] &= 0xff >> excess;
        let candidate = BigUint::from_bytes_be(&bytes);
        if &candidate < bound {
            return candidate;
        }
    }
}

/// Draw a random factor `r` in `[1, n)` that is invertible modulo `n`.
///
/// Returns `(r, r^-1 mod n)`. Non-invertible draws are discarded and the
/// loop starts over.
pub fn invertible_factor<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    n: &BigUint,
) -> (BigUint, BigUint) {
    loop {
        let mut r = random_below(rng, n);
        if r.is_zero() {
            r = BigUint::one();
        }
        match mod_inverse(&r, n) {
            Some(ir) => return (r, ir),
            None => log::trace!("random factor shares a prime with the modulus, redrawing"),
        }
    }
}
