/*!
AES-256-CBC message encryption for the e2ee protocol.

Every message is encrypted under the session key with a freshly
generated random 16-byte IV; reusing an IV under the same key must never
happen, so one is drawn per call. PKCS#7 padding failure on decrypt is
the only integrity signal the protocol has: there is no MAC, so
corruption can also surface as garbage plaintext. Callers treat any
decrypt failure as fatal to the session.
*/

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::core::constants::sizes;
use crate::core::error::{CryptoError, Error, Result};
use crate::core::message::Frame;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric encryption and decryption under the established session key.
///
/// Stateless apart from the key: both messaging loops can share one
/// instance through an `Arc`.
pub struct Cipher {
    key: [u8; sizes::aes::KEY_SIZE],
}

impl Cipher {
    /// Create a new Cipher with the established session key.
    pub fn new(key: [u8; sizes::aes::KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Encrypt one message under a fresh random IV.
    ///
    /// Plaintext length is unbounded; the ciphertext is padded to the
    /// 16-byte block size (an empty message still produces one block).
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Frame> {
        let mut iv = [0u8; sizes::aes::IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(Frame::new(iv, ciphertext))
    }

    /// Decrypt one received frame.
    ///
    /// Fails on padding mismatch: wrong key, corrupted frame, or
    /// truncated input.
    pub fn decrypt(&self, frame: &Frame) -> Result<Vec<u8>> {
        Aes256CbcDec::new(&self.key.into(), &frame.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&frame.ciphertext)
            .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))
    }
}
