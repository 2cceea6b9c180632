use rand::{CryptoRng, RngCore};
use rsa::BigUint;

use crate::keys::RsaPublicParts;
use crate::num::invertible_factor;

/// Blinds a message using the signer's public key and a fresh random factor.
///
/// # Arguments
///
/// * `rng` - A cryptographically secure random number generator
/// * `key` - The public key of the signer
/// * `m` - The message to blind, as a BigUint below the modulus
///
/// # Returns
///
/// A tuple containing the blinded message and the unblinder `r^-1 mod n`.
/// The factor `r` itself is dropped before returning.
pub fn blind<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    key: &RsaPublicParts,
    m: &BigUint,
) -> (BigUint, BigUint) {
    // Signing m * r^e yields (m * r^e)^d = m^d * r (mod n),
    // and the factor of r is then removed by multiplying by r^-1.
    let (r, unblinder) = invertible_factor(rng, key.n());
    let blind_factor = r.modpow(key.e(), key.n());
    let blind_msg = (m * &blind_factor) % key.n();

    (blind_msg, unblinder)
}

/// Unblinds a blind signature using the unblinder returned by [`blind`].
///
/// Only the modulus is needed, so this runs entirely on the requester's side.
pub fn unblind(key: &RsaPublicParts, blind_sig: &BigUint, unblinder: &BigUint) -> BigUint {
    (blind_sig * unblinder) % key.n()
}
