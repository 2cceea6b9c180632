use crate::{Error, Hash};

/// DER encoding of the DigestInfo header, up to the digest itself
fn digest_info_prefix(hash: &Hash) -> &'static [u8] {
    match hash {
        Hash::Sha256 => &[
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ],
        Hash::Sha384 => &[
            0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ],
        Hash::Sha512 => &[
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ],
    }
}

/// EMSA-PKCS1-v1_5 encoding (RFC 8017, section 9.2)
///
/// `EM = 0x00 || 0x01 || PS || 0x00 || DigestInfo`, where `PS` is at least
/// 8 bytes of `0xff` filling the message up to `em_len` bytes.
pub fn emsa_pkcs1_v15_encode(m_hash: &[u8], em_len: usize, hash: &Hash) -> Result<Vec<u8>, Error> {
    if m_hash.len() != hash.output_size() {
        return Err(Error::InternalError);
    }
    let prefix = digest_info_prefix(hash);
    let t_len = prefix.len() + m_hash.len();
    if em_len < t_len + 11 {
        return Err(Error::UnsupportedParameters);
    }
    let mut em = vec![0xff; em_len];
    em[0] = 0x00;
    em[1] = 0x01;
    em[em_len - t_len - 1] = 0x00;
    let (prefix_dst, hash_dst) = em[em_len - t_len..].split_at_mut(prefix.len());
    prefix_dst.copy_from_slice(prefix);
    hash_dst.copy_from_slice(m_hash);
    Ok(em)
}
