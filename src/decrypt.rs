use rand::{CryptoRng, RngCore};
use rsa::BigUint;

use crate::keys::{Precomputed, RsaPrivateParts, RsaPublicParts};
use crate::num::invertible_factor;
use crate::Error;

/// Raw RSA encryption of `m` with the public key: `m^e mod n`.
pub fn rsa_encrypt(key: &RsaPublicParts, m: &BigUint) -> BigUint {
    m.modpow(key.e(), key.n())
}

/// Raw RSA decryption of `c` with the private key: `c^d mod n`.
///
/// If an `rng` is passed, the exponentiation runs on `c * r^e` for a fresh random `r`,
/// and the result is multiplied by `r^-1` afterwards, so that its timing doesn't depend
/// on `c`. This is unrelated to the blinding performed by the blind signature protocol.
///
/// CRT values are used when the key has them.
pub fn rsa_decrypt<R: RngCore + CryptoRng + ?Sized>(
    rng: Option<&mut R>,
    key: &RsaPrivateParts,
    c: &BigUint,
) -> Result<BigUint, Error> {
    let n = key.n();
    if c >= n {
        log::debug!("ciphertext is not below the modulus");
        return Err(Error::OutOfRange);
    }

    let mut ir = None;
    let c = match rng {
        Some(rng) => {
            // (c * r^e)^d = c^d * r (mod n)
            let (r, unblinder) = invertible_factor(rng, n);
            ir = Some(unblinder);
            (c * r.modpow(key.e(), n)) % n
        }
        None => c.clone(),
    };

    let m = match key.precomputed() {
        Some(precomputed) => {
            log::trace!("CRT exponentiation over {} primes", key.primes().len());
            crt_pow(&c, key.primes(), precomputed)
        }
        None => {
            log::trace!("exponentiation with the full private exponent");
            c.modpow(key.d(), n)
        }
    };

    match ir {
        Some(ir) => Ok((m * ir) % n),
        None => Ok(m),
    }
}

/// Same as [`rsa_decrypt`], then checks that the result encrypts back to `c`.
///
/// This catches faults in the CRT computation before a bad result can leak the primes.
pub fn rsa_decrypt_and_check<R: RngCore + CryptoRng + ?Sized>(
    rng: Option<&mut R>,
    key: &RsaPrivateParts,
    c: &BigUint,
) -> Result<BigUint, Error> {
    let m = rsa_decrypt(rng, key, c)?;
    if &rsa_encrypt(key.public(), &m) != c {
        log::debug!("private key operation failed its consistency check");
        return Err(Error::InternalError);
    }
    Ok(m)
}

/// Garner's recombination, generalized to any number of primes.
fn crt_pow(c: &BigUint, primes: &[BigUint], precomputed: &Precomputed) -> BigUint {
    let (p, q) = (&primes[0], &primes[1]);

    // m1 = c^dP mod p, m2 = c^dQ mod q
    let mut m = (c % p).modpow(&precomputed.dp, p);
    let m2 = (c % q).modpow(&precomputed.dq, q);

    // h = qInv * (m1 - m2) mod p
    let m2_mod_p = &m2 % p;
    if m < m2_mod_p {
        m += p;
    }
    let h = ((m - m2_mod_p) * &precomputed.qinv) % p;

    // m = m2 + h * q
    let mut m = h * q + m2;

    for value in &precomputed.crt_values {
        let prime = &value.prime;
        let mi = (c % prime).modpow(&value.exp, prime);
        let m_mod_prime = &m % prime;
        let mut h = mi;
        if h < m_mod_prime {
            h += prime;
        }
        let h = ((h - m_mod_prime) * &value.coeff) % prime;
        m += h * &value.r;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::tests::ReplayRng;
    use rand::rngs::ThreadRng;

    fn big(x: u64) -> BigUint {
        BigUint::from(x)
    }

    fn textbook_key() -> RsaPrivateParts {
        let mut key =
            RsaPrivateParts::from_components(big(3233), big(17), big(2753), vec![big(61), big(53)])
                .unwrap();
        key.precompute().unwrap();
        key
    }

    fn three_prime_key() -> RsaPrivateParts {
        let mut key = RsaPrivateParts::from_components(
            big(2431),
            big(7),
            big(103),
            vec![big(11), big(13), big(17)],
        )
        .unwrap();
        key.precompute().unwrap();
        key
    }

    fn decrypt_all_ways(key: &RsaPrivateParts, c: &BigUint) -> BigUint {
        let mut plain = key.clone();
        plain.clear_precomputed();
        let mut rng = rand::thread_rng();

        let expected = c.modpow(key.d(), key.n());
        assert_eq!(rsa_decrypt::<ThreadRng>(None, key, c).unwrap(), expected);
        assert_eq!(rsa_decrypt::<ThreadRng>(None, &plain, c).unwrap(), expected);
        assert_eq!(rsa_decrypt(Some(&mut rng), key, c).unwrap(), expected);
        assert_eq!(rsa_decrypt(Some(&mut rng), &plain, c).unwrap(), expected);
        expected
    }

    #[test]
    fn textbook_decryption() {
        let key = textbook_key();
        // 65^17 mod 3233 = 2790
        assert_eq!(rsa_encrypt(key.public(), &big(65)), big(2790));
        assert_eq!(decrypt_all_ways(&key, &big(2790)), big(65));
    }

    #[test]
    fn crt_matches_plain_exponentiation_for_every_input() {
        for key in [textbook_key(), three_prime_key()] {
            let n = key.n().clone();
            let mut c = big(0);
            while c < n {
                decrypt_all_ways(&key, &c);
                c += big(7);
            }
            decrypt_all_ways(&key, &(&n - big(1)));
        }
    }

    #[test]
    fn three_prime_round_trip() {
        let key = three_prime_key();
        for m in [0u64, 1, 2, 42, 1000, 2430] {
            let c = rsa_encrypt(key.public(), &big(m));
            assert_eq!(decrypt_all_ways(&key, &c), big(m));
        }
    }

    #[test]
    fn out_of_range_ciphertext() {
        let key = textbook_key();
        let mut rng = rand::thread_rng();
        assert_eq!(
            rsa_decrypt(Some(&mut rng), &key, &big(3233)),
            Err(Error::OutOfRange)
        );
        assert_eq!(
            rsa_decrypt::<ThreadRng>(None, &key, &big(100_000)),
            Err(Error::OutOfRange)
        );
        assert_eq!(
            rsa_decrypt_and_check(Some(&mut rng), &key, &big(3233)),
            Err(Error::OutOfRange)
        );
        assert!(rsa_decrypt(Some(&mut rng), &key, &big(3232)).is_ok());
    }

    #[test]
    fn exponent_blinding_draws_its_own_factor() {
        let key = textbook_key();
        // 61 is rejected, 2 is used as the timing blind
        let mut rng = ReplayRng(vec![vec![0x00, 61], vec![0x00, 0x02]]);
        let m = rsa_decrypt(Some(&mut rng), &key, &big(2790)).unwrap();
        assert_eq!(m, big(65));
        assert!(rng.0.is_empty());
    }

    #[test]
    fn checked_decryption_detects_bad_crt_values() {
        let mut key = textbook_key();
        assert_eq!(
            rsa_decrypt_and_check::<ThreadRng>(None, &key, &big(2790)),
            Ok(big(65))
        );
        if let Some(precomputed) = key.precomputed.as_mut() {
            precomputed.dp += big(1);
        }
        assert_eq!(
            rsa_decrypt_and_check::<ThreadRng>(None, &key, &big(2790)),
            Err(Error::InternalError)
        );
    }
}
