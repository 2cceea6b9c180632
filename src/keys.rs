use std::convert::TryFrom;

use num_traits::{One, Zero};
use rsa::traits::{PrivateKeyParts as _, PublicKeyParts as _};
use rsa::BigUint;

use crate::num::mod_inverse;
use crate::Error;

/// Raw components of an RSA public key
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaPublicParts {
    n: BigUint,
    e: BigUint,
}

impl RsaPublicParts {
    pub fn new(n: BigUint, e: BigUint) -> Result<Self, Error> {
        if n <= BigUint::one() || e <= BigUint::one() {
            return Err(Error::InvalidKey);
        }
        Ok(RsaPublicParts { n, e })
    }

    /// Modulus
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// Public exponent
    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Modulus length in bytes
    pub fn size(&self) -> usize {
        (self.n.bits() + 7) / 8
    }

    /// Parse a big-endian integer, rejecting anything that is not below the modulus.
    pub(crate) fn uint_from_be(&self, bytes: &[u8]) -> Result<BigUint, Error> {
        if bytes.len() > self.size() {
            log::debug!("input of {} bytes is wider than the modulus", bytes.len());
            return Err(Error::OutOfRange);
        }
        let x = BigUint::from_bytes_be(bytes);
        if x >= self.n {
            log::debug!("input is not below the modulus");
            return Err(Error::OutOfRange);
        }
        Ok(x)
    }
}

/// Values needed to fold in a prime beyond the first two during CRT recombination
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrtValue {
    /// The prime factor itself
    pub(crate) prime: BigUint,
    /// D mod (prime - 1)
    pub(crate) exp: BigUint,
    /// R^-1 mod prime
    pub(crate) coeff: BigUint,
    /// Product of all the primes before this one
    pub(crate) r: BigUint,
}

/// Precomputed CRT values
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Precomputed {
    /// D mod (p - 1)
    pub(crate) dp: BigUint,
    /// D mod (q - 1)
    pub(crate) dq: BigUint,
    /// q^-1 mod p
    pub(crate) qinv: BigUint,
    /// Additional primes, in key order
    pub(crate) crt_values: Vec<CrtValue>,
}

/// Raw components of an RSA private key, possibly with more than two primes
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RsaPrivateParts {
    public: RsaPublicParts,
    d: BigUint,
    primes: Vec<BigUint>,
    pub(crate) precomputed: Option<Precomputed>,
}

impl RsaPrivateParts {
    /// Assemble a private key from its components and check their consistency.
    ///
    /// CRT values are not computed; call [`RsaPrivateParts::precompute`] for faster decryption.
    pub fn from_components(
        n: BigUint,
        e: BigUint,
        d: BigUint,
        primes: Vec<BigUint>,
    ) -> Result<Self, Error> {
        let key = RsaPrivateParts {
            public: RsaPublicParts::new(n, e)?,
            d,
            primes,
            precomputed: None,
        };
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.primes.len() < 2 || self.d.is_zero() {
            return Err(Error::InvalidKey);
        }
        let one = BigUint::one();
        let mut modulus = BigUint::one();
        for prime in &self.primes {
            if prime <= &one {
                return Err(Error::InvalidKey);
            }
            modulus *= prime;
        }
        if &modulus != self.n() {
            return Err(Error::InvalidKey);
        }
        // e * d must be congruent to 1 modulo each p - 1
        let de = &self.d * self.e();
        for prime in &self.primes {
            if !(&de % (prime - &one)).is_one() {
                return Err(Error::InvalidKey);
            }
        }
        Ok(())
    }

    /// Compute the CRT values used to speed up private key operations.
    pub fn precompute(&mut self) -> Result<(), Error> {
        if self.precomputed.is_some() {
            return Ok(());
        }
        let one = BigUint::one();
        let (p, q) = (&self.primes[0], &self.primes[1]);
        let dp = &self.d % (p - &one);
        let dq = &self.d % (q - &one);
        let qinv = mod_inverse(q, p).ok_or(Error::InvalidKey)?;

        let mut r = p * q;
        let mut crt_values = Vec::with_capacity(self.primes.len() - 2);
        for prime in &self.primes[2..] {
            let exp = &self.d % (prime - &one);
            let coeff = mod_inverse(&r, prime).ok_or(Error::InvalidKey)?;
            crt_values.push(CrtValue {
                prime: prime.clone(),
                exp,
                coeff,
                r: r.clone(),
            });
            r *= prime;
        }

        self.precomputed = Some(Precomputed {
            dp,
            dq,
            qinv,
            crt_values,
        });
        Ok(())
    }

    /// Drop the CRT values; private key operations fall back to a single exponentiation.
    pub fn clear_precomputed(&mut self) {
        self.precomputed = None;
    }

    pub fn public(&self) -> &RsaPublicParts {
        &self.public
    }

    pub fn n(&self) -> &BigUint {
        self.public.n()
    }

    pub fn e(&self) -> &BigUint {
        self.public.e()
    }

    /// Private exponent
    pub fn d(&self) -> &BigUint {
        &self.d
    }

    /// Prime factors of the modulus
    pub fn primes(&self) -> &[BigUint] {
        &self.primes
    }

    pub fn precomputed(&self) -> Option<&Precomputed> {
        self.precomputed.as_ref()
    }
}

impl From<&rsa::RsaPublicKey> for RsaPublicParts {
    fn from(pk: &rsa::RsaPublicKey) -> Self {
        RsaPublicParts {
            n: pk.n().clone(),
            e: pk.e().clone(),
        }
    }
}

impl TryFrom<&rsa::RsaPrivateKey> for RsaPrivateParts {
    type Error = Error;

    fn try_from(sk: &rsa::RsaPrivateKey) -> Result<Self, Error> {
        let mut key = RsaPrivateParts::from_components(
            sk.n().clone(),
            sk.e().clone(),
            sk.d().clone(),
            sk.primes().to_vec(),
        )?;
        key.precompute()?;
        Ok(key)
    }
}
