//! RSA blind signatures, with CRT decryption and exponent blinding.
//!
//! A requester blinds a message for a signer, the signer signs it without learning
//! its content, and the requester unblinds the result into a signature that the signer
//! cannot link to the signing request. This is the building block of anonymous
//! credentials and anonymous ballots.
//!
//! Ordinary (non-blind) signatures use deterministic RSASSA-PKCS1-v1_5 padding over a
//! configurable digest.
//!
//! ```rust
//! use rsa_blind_sign::{DefaultRng, KeyPair, Options};
//!
//! # let rsa_sk = rsa::RsaPrivateKey::new(&mut DefaultRng, 1024).unwrap();
//! // [SIGNER]: load a key pair, parsed by the `rsa` crate
//! let kp = KeyPair::try_from_rsa(&rsa_sk)?;
//! let (pk, sk) = (kp.pk, kp.sk);
//!
//! // [REQUESTER]: blind a ballot for the signer whose public key is `pk`.
//! // The unblinder must be kept, and never sent to the signer.
//! let ballot = b"ballot!!";
//! let blinding_result = pk.blind(&mut DefaultRng, ballot)?;
//!
//! // [SIGNER]: sign the blinded ballot, without learning its content.
//! let blind_sig = sk.blind_sign(&mut DefaultRng, &blinding_result.blind_msg)?;
//!
//! // [REQUESTER]: strip the blinding factor. The result is a signature on the
//! // ballot itself, that the signer cannot link to the blinded ballot.
//! let sig = pk.unblind(&blind_sig, &blinding_result.unblinder)?;
//!
//! // [ANYONE]: check it with the public key only.
//! assert!(pk.check_blind_sig(ballot, &sig));
//!
//! // Ordinary signatures hash and pad the message first.
//! let options = Options::default();
//! let receipt = sk.sign(&mut DefaultRng, b"recorded entry", &options)?;
//! assert!(pk.check_sig(b"recorded entry", &receipt, &options));
//! # Ok::<(), rsa_blind_sign::Error>(())
//! ```

#[macro_use]
extern crate derive_new;

mod blind_rsa;
mod decrypt;
mod keys;
mod num;
mod pkcs1v15;

use derive_more::*;
use digest::DynDigest;
use hmac_sha256::Hash as Sha256;
use hmac_sha512::sha384::Hash as Sha384;
use hmac_sha512::Hash as Sha512;
use rand::{CryptoRng, RngCore};
use rsa::BigUint;
use std::convert::TryFrom;
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decrypt::{rsa_decrypt_and_check, rsa_encrypt};
use crate::num::ToBytesPadded as _;
use crate::pkcs1v15::emsa_pkcs1_v15_encode;

pub use crate::keys::{CrtValue, Precomputed, RsaPrivateParts, RsaPublicParts};
pub use crate::num::mod_inverse;

pub mod reexports {
    pub use {digest, hmac_sha256, hmac_sha512, rand, rsa};
}

/// The operating system's random number generator
pub use rand::rngs::OsRng as DefaultRng;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    InternalError,
    UnsupportedParameters,
    VerificationFailed,
    InvalidKey,
    OutOfRange,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InternalError => write!(f, "Internal Error"),
            Error::UnsupportedParameters => write!(f, "Unsupported parameters"),
            Error::VerificationFailed => write!(f, "Verification failed"),
            Error::InvalidKey => write!(f, "Invalid key"),
            Error::OutOfRange => write!(f, "Input is not below the modulus"),
        }
    }
}

/// Hash function used to compute message digests
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Hash {
    Sha256,
    Sha384,
    Sha512,
}

impl Default for Hash {
    fn default() -> Self {
        Hash::Sha256
    }
}

impl Hash {
    fn hasher(&self) -> Box<dyn DynDigest> {
        match self {
            Hash::Sha256 => Box::new(Sha256::new()),
            Hash::Sha384 => Box::new(Sha384::new()),
            Hash::Sha512 => Box::new(Sha512::new()),
        }
    }

    /// Hash `data` with this function
    pub fn digest(&self, data: impl AsRef<[u8]>) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data.as_ref());
        hasher.finalize().to_vec()
    }

    /// Length of a digest, in bytes
    pub fn output_size(&self) -> usize {
        self.hasher().output_size()
    }
}

/// Compute the 32-byte SHA-256 digest of `data`
pub fn hash(data: impl AsRef<[u8]>) -> Vec<u8> {
    Hash::Sha256.digest(data)
}

/// Options for ordinary signatures
#[derive(Clone, Debug, Default, Eq, PartialEq, From, Into, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Options {
    /// Hash function to use for hashing the message before padding
    pub hash: Hash,
}

/// An RSA public key
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
pub struct PublicKey(pub RsaPublicParts);

/// An RSA secret key
#[derive(Clone, Debug, AsRef, Deref, From, Into, new)]
pub struct SecretKey(pub RsaPrivateParts);

/// An RSA key pair
#[derive(Clone, Debug, From, Into, new)]
pub struct KeyPair {
    pub pk: PublicKey,
    pub sk: SecretKey,
}

/// The inverse of a blinding factor, required to unblind a blind signature
#[derive(Clone, Debug, AsRef, Deref, From, Into, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Unblinder(pub Vec<u8>);

/// A blinded message
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlindedMessage(pub Vec<u8>);

/// A blind signature
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlindSignature(pub Vec<u8>);

/// A signature, either ordinary or unblinded
#[derive(Clone, Debug, Eq, PartialEq, AsRef, Deref, From, Into, new)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signature(pub Vec<u8>);

/// Result of a blinding operation
#[derive(Clone, Debug)]
pub struct BlindingResult {
    pub blind_msg: BlindedMessage,
    pub unblinder: Unblinder,
}

impl AsRef<[u8]> for Unblinder {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for BlindedMessage {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for BlindSignature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl KeyPair {
    /// Build a key pair from a key parsed by the `rsa` crate
    pub fn try_from_rsa(sk: &rsa::RsaPrivateKey) -> Result<KeyPair, Error> {
        let sk = SecretKey::try_from(sk)?;
        let pk = sk.public_key();
        Ok(KeyPair { pk, sk })
    }
}

impl Signature {
    /// Verify that the ordinary signature is valid for the given public key and message
    pub fn verify(
        &self,
        pk: &PublicKey,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<(), Error> {
        pk.verify(self, msg, options)
    }
}

impl PublicKey {
    /// Build a public key from its modulus and exponent, as big-endian bytes
    pub fn from_components(n: impl AsRef<[u8]>, e: impl AsRef<[u8]>) -> Result<Self, Error> {
        let n = BigUint::from_bytes_be(n.as_ref());
        let e = BigUint::from_bytes_be(e.as_ref());
        Ok(PublicKey(RsaPublicParts::new(n, e)?))
    }

    /// Modulus length in bytes; every output of this crate has this length
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Blind a message to be signed.
    ///
    /// The message is used as a big-endian integer, without hashing: callers that
    /// need a digest must hash it themselves. It must be below the modulus.
    pub fn blind<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msg: impl AsRef<[u8]>,
    ) -> Result<BlindingResult, Error> {
        let m = self.0.uint_from_be(msg.as_ref())?;
        let (blind_msg, unblinder) = blind_rsa::blind(rng, &self.0, &m);
        let modulus_bytes = self.size();
        Ok(BlindingResult {
            blind_msg: BlindedMessage(blind_msg.to_bytes_be_padded(modulus_bytes)),
            unblinder: Unblinder(unblinder.to_bytes_be_padded(modulus_bytes)),
        })
    }

    /// Compute a signature on the original message from a blind signature
    pub fn unblind(
        &self,
        blind_sig: &BlindSignature,
        unblinder: &Unblinder,
    ) -> Result<Signature, Error> {
        let blind_sig = self.0.uint_from_be(blind_sig)?;
        let unblinder = self.0.uint_from_be(unblinder)?;
        let sig = blind_rsa::unblind(&self.0, &blind_sig, &unblinder);
        Ok(Signature(sig.to_bytes_be_padded(self.size())))
    }

    /// Check that `sig^e mod n` equals `msg`.
    ///
    /// This verifies both blind signatures on blinded messages and unblinded
    /// signatures on original messages. Malformed inputs simply don't verify.
    pub fn check_blind_sig(&self, msg: impl AsRef<[u8]>, sig: impl AsRef<[u8]>) -> bool {
        let (msg, sig) = match (
            self.0.uint_from_be(msg.as_ref()),
            self.0.uint_from_be(sig.as_ref()),
        ) {
            (Ok(msg), Ok(sig)) => (msg, sig),
            _ => return false,
        };
        rsa_encrypt(&self.0, &sig) == msg
    }

    /// Verify an ordinary signature
    pub fn verify(
        &self,
        sig: &Signature,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<(), Error> {
        let modulus_bytes = self.size();
        if sig.len() != modulus_bytes {
            return Err(Error::VerificationFailed);
        }
        let s = self
            .0
            .uint_from_be(sig)
            .map_err(|_| Error::VerificationFailed)?;
        let em = rsa_encrypt(&self.0, &s).to_bytes_be_padded(modulus_bytes);
        let msg_hash = options.hash.digest(msg);
        let expected = emsa_pkcs1_v15_encode(&msg_hash, modulus_bytes, &options.hash)
            .map_err(|_| Error::VerificationFailed)?;
        if em != expected {
            return Err(Error::VerificationFailed);
        }
        Ok(())
    }

    /// Check an ordinary signature, returning `false` for any invalid or malformed signature
    pub fn check_sig(&self, msg: impl AsRef<[u8]>, sig: &Signature, options: &Options) -> bool {
        self.verify(sig, msg, options).is_ok()
    }
}

impl SecretKey {
    /// Build a secret key from its components, as big-endian bytes, and precompute CRT values
    pub fn from_components<P: AsRef<[u8]>>(
        n: impl AsRef<[u8]>,
        e: impl AsRef<[u8]>,
        d: impl AsRef<[u8]>,
        primes: &[P],
    ) -> Result<Self, Error> {
        let mut sk = RsaPrivateParts::from_components(
            BigUint::from_bytes_be(n.as_ref()),
            BigUint::from_bytes_be(e.as_ref()),
            BigUint::from_bytes_be(d.as_ref()),
            primes
                .iter()
                .map(|p| BigUint::from_bytes_be(p.as_ref()))
                .collect(),
        )?;
        sk.precompute()?;
        Ok(SecretKey(sk))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public().clone())
    }

    /// Compute an ordinary signature: the digest of `msg`, PKCS#1 v1.5 padded, raised to `d`
    pub fn sign<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        msg: impl AsRef<[u8]>,
        options: &Options,
    ) -> Result<Signature, Error> {
        let modulus_bytes = self.0.public().size();
        let msg_hash = options.hash.digest(msg);
        let em = emsa_pkcs1_v15_encode(&msg_hash, modulus_bytes, &options.hash)?;
        let m = BigUint::from_bytes_be(&em);
        let sig = rsa_decrypt_and_check(Some(rng), &self.0, &m)?;
        Ok(Signature(sig.to_bytes_be_padded(modulus_bytes)))
    }

    /// Sign a blinded message.
    ///
    /// No hashing or padding is applied. A message that is not below the modulus
    /// is rejected with [`Error::OutOfRange`].
    pub fn blind_sign<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        blind_msg: impl AsRef<[u8]>,
    ) -> Result<BlindSignature, Error> {
        let blind_msg = self.0.public().uint_from_be(blind_msg.as_ref())?;
        let blind_sig = rsa_decrypt_and_check(Some(rng), &self.0, &blind_msg)?;
        Ok(BlindSignature(
            blind_sig.to_bytes_be_padded(self.0.public().size()),
        ))
    }

    /// Raw private key operation, `c^d mod n`, with exponent blinding
    pub fn decrypt<R: RngCore + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
        c: impl AsRef<[u8]>,
    ) -> Result<Vec<u8>, Error> {
        let c = self.0.public().uint_from_be(c.as_ref())?;
        let m = decrypt::rsa_decrypt(Some(rng), &self.0, &c)?;
        Ok(m.to_bytes_be_padded(self.0.public().size()))
    }

    /// Copy of this key without CRT values
    pub fn without_precomputation(&self) -> SecretKey {
        let mut sk = self.0.clone();
        sk.clear_precomputed();
        SecretKey(sk)
    }
}

impl From<&rsa::RsaPublicKey> for PublicKey {
    fn from(pk: &rsa::RsaPublicKey) -> Self {
        PublicKey(RsaPublicParts::from(pk))
    }
}

impl TryFrom<&rsa::RsaPrivateKey> for SecretKey {
    type Error = Error;

    fn try_from(sk: &rsa::RsaPrivateKey) -> Result<Self, Error> {
        Ok(SecretKey(RsaPrivateParts::try_from(sk)?))
    }
}
