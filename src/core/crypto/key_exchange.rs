/*!
RSA key transport for the e2ee protocol.

The server side generates a 2048-bit RSA keypair and publishes its public
key as PKCS#1 PEM text; the client wraps the 32-byte AES session key
under that key with OAEP-SHA-256. The private key never leaves the
process; only the public key is ever serialized.
*/

use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::constants::sizes;
use crate::core::error::{CryptoError, Error, Result};

/// Owns the local RSA keypair and the peer's public key.
///
/// Which of the two is populated depends on the role: the server
/// generates a keypair and unwraps; the client imports the peer key and
/// wraps. Neither operation retries on failure.
pub struct KeyExchange {
    keypair: Option<RsaPrivateKey>,
    peer_public_key: Option<RsaPublicKey>,
}

impl KeyExchange {
    /// Create an empty key exchange; no key material yet.
    pub fn new() -> Self {
        Self {
            keypair: None,
            peer_public_key: None,
        }
    }

    /// Generate a fresh 2048-bit RSA keypair.
    ///
    /// Failure is fatal to the session; there is no retry.
    pub fn generate_keypair(&mut self) -> Result<()> {
        let keypair = RsaPrivateKey::new(&mut OsRng, sizes::rsa::KEY_BITS)
            .map_err(|_| Error::Crypto(CryptoError::KeyGenerationFailed))?;
        self.keypair = Some(keypair);
        Ok(())
    }

    /// Whether a local keypair has been generated.
    pub fn has_keypair(&self) -> bool {
        self.keypair.is_some()
    }

    /// Whether a peer public key has been imported.
    pub fn has_peer_key(&self) -> bool {
        self.peer_public_key.is_some()
    }

    /// Export the local public key as PKCS#1 PEM text.
    pub fn public_key_pem(&self) -> Result<String> {
        let keypair = self.local_keypair()?;
        RsaPublicKey::from(keypair)
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|_| Error::Crypto(CryptoError::KeyEncodeFailed))
    }

    /// Import the peer's public key from PEM text.
    ///
    /// The key is trusted as-is; the protocol has no certificate or
    /// fingerprint check. A fingerprint is logged for the operator.
    pub fn load_peer_public_key(&mut self, pem: &str) -> Result<()> {
        let key = RsaPublicKey::from_pkcs1_pem(pem)
            .map_err(|_| Error::Crypto(CryptoError::KeyParseFailed))?;
        debug!(fingerprint = %fingerprint(pem), "peer public key loaded");
        self.peer_public_key = Some(key);
        Ok(())
    }

    /// Generate a fresh 32-byte AES session key.
    ///
    /// Only the client role calls this; the server only ever unwraps the
    /// key it is sent.
    pub fn generate_session_key() -> [u8; sizes::aes::KEY_SIZE] {
        let mut key = [0u8; sizes::aes::KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Wrap the session key under the peer's public key (OAEP-SHA-256).
    ///
    /// The ciphertext is always [`sizes::rsa::WRAPPED_KEY_BYTES`] long
    /// for a 2048-bit peer key.
    pub fn wrap_session_key(&self, session_key: &[u8; sizes::aes::KEY_SIZE]) -> Result<Vec<u8>> {
        let peer = self.peer_key()?;
        let wrapped = peer
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), session_key)
            .map_err(|_| Error::Crypto(CryptoError::WrapFailed))?;
        debug_assert_eq!(wrapped.len(), sizes::rsa::WRAPPED_KEY_BYTES);
        Ok(wrapped)
    }

    /// Unwrap a session key with the local private key.
    ///
    /// Fails if the ciphertext has the wrong size, the padding does not
    /// verify, or the recovered key is not exactly 32 bytes.
    pub fn unwrap_session_key(&self, wrapped: &[u8]) -> Result<[u8; sizes::aes::KEY_SIZE]> {
        if wrapped.len() != sizes::rsa::WRAPPED_KEY_BYTES {
            return Err(Error::Crypto(CryptoError::DecryptionFailed));
        }
        let keypair = self.local_keypair()?;
        let plain = keypair
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))?;
        <[u8; sizes::aes::KEY_SIZE]>::try_from(plain.as_slice())
            .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))
    }

    fn local_keypair(&self) -> Result<&RsaPrivateKey> {
        self.keypair.as_ref().ok_or_else(|| Error::InvalidState {
            expected: "keypair generated".to_string(),
            actual: "no keypair".to_string(),
        })
    }

    fn peer_key(&self) -> Result<&RsaPublicKey> {
        self.peer_public_key.as_ref().ok_or_else(|| Error::InvalidState {
            expected: "peer key imported".to_string(),
            actual: "no peer key".to_string(),
        })
    }
}

impl Default for KeyExchange {
    fn default() -> Self {
        Self::new()
    }
}

/// Short SHA-256 fingerprint of a PEM key, for diagnostics only.
///
/// Logging a fingerprint does not authenticate anything; the protocol
/// accepts whatever key arrives.
pub fn fingerprint(pem: &str) -> String {
    let digest = Sha256::digest(pem.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    /// Keypair generation is the slow part; share one across tests.
    fn shared_keypair() -> &'static KeyExchange {
        static KX: OnceLock<KeyExchange> = OnceLock::new();
        KX.get_or_init(|| {
            let mut kx = KeyExchange::new();
            kx.generate_keypair().expect("keypair generation");
            kx
        })
    }

    #[test]
    fn test_public_key_pem_round_trip() {
        let server = shared_keypair();
        let pem = server.public_key_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN RSA PUBLIC KEY-----"));

        let mut client = KeyExchange::new();
        client.load_peer_public_key(&pem).unwrap();
        assert!(client.has_peer_key());
    }

    #[test]
    fn test_wrap_unwrap_round_trip() {
        let server = shared_keypair();
        let pem = server.public_key_pem().unwrap();

        let mut client = KeyExchange::new();
        client.load_peer_public_key(&pem).unwrap();

        let session_key = KeyExchange::generate_session_key();
        let wrapped = client.wrap_session_key(&session_key).unwrap();
        assert_eq!(wrapped.len(), sizes::rsa::WRAPPED_KEY_BYTES);

        let unwrapped = server.unwrap_session_key(&wrapped).unwrap();
        assert_eq!(unwrapped, session_key);
    }

    #[test]
    fn test_malformed_pem_is_rejected() {
        let mut kx = KeyExchange::new();
        let err = kx.load_peer_public_key("not a pem").unwrap_err();
        assert!(matches!(err, Error::Crypto(CryptoError::KeyParseFailed)));
    }

    #[test]
    fn test_wrong_size_ciphertext_is_rejected() {
        let server = shared_keypair();
        let err = server.unwrap_session_key(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, Error::Crypto(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_operations_without_keys_fail_fast() {
        let empty = KeyExchange::new();
        assert!(empty.public_key_pem().is_err());
        assert!(empty.wrap_session_key(&[0u8; 32]).is_err());
        assert!(empty.unwrap_session_key(&[0u8; 256]).is_err());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let pem = "-----BEGIN RSA PUBLIC KEY-----\nAAAA\n-----END RSA PUBLIC KEY-----\n";
        assert_eq!(fingerprint(pem), fingerprint(pem));
        assert_eq!(fingerprint(pem).len(), 16);
    }
}
