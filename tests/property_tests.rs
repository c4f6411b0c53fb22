//! Property tests for the cipher, the key transport, and the framing.

use std::collections::HashSet;
use std::io::{self, Cursor, Read};
use std::sync::OnceLock;

use proptest::prelude::*;

use e2ee_protocol::{Cipher, Frame, KeyExchange, recv_exact, sizes};

// Strategy for generating session keys
fn session_keys() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

// Strategy for generating plaintexts across block boundaries
fn plaintexts() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

proptest! {
    #[test]
    fn encrypt_decrypt_round_trip(key in session_keys(), plaintext in plaintexts()) {
        let cipher = Cipher::new(key);
        let frame = cipher.encrypt(&plaintext).unwrap();

        prop_assert!(frame.ciphertext.len() % sizes::aes::BLOCK_SIZE == 0);
        prop_assert!(!frame.ciphertext.is_empty());

        let decrypted = cipher.decrypt(&frame).unwrap();
        prop_assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn frame_codec_round_trip(iv in any::<[u8; 16]>(), blocks in 1usize..32) {
        let frame = Frame::new(iv, vec![0xA5u8; blocks * sizes::aes::BLOCK_SIZE]);
        let mut cursor = Cursor::new(frame.to_bytes().to_vec());
        let parsed = Frame::read_from(&mut cursor).unwrap();
        prop_assert_eq!(parsed, frame);
    }
}

/// Reader that delivers its data in fixed-size fragments, simulating a
/// transport that splits writes arbitrarily.
struct FragmentedReader {
    data: Vec<u8>,
    pos: usize,
    fragment: usize,
}

impl Read for FragmentedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.data.len() - self.pos;
        let n = remaining.min(self.fragment).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

proptest! {
    #[test]
    fn recv_exact_reassembles_fragmented_input(
        data in prop::collection::vec(any::<u8>(), 1..512),
        fragment in 1usize..7,
    ) {
        let mut reader = FragmentedReader { data: data.clone(), pos: 0, fragment };
        let out = recv_exact(&mut reader, data.len()).unwrap();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn frame_survives_fragmented_delivery(
        blocks in 1usize..16,
        fragment in 1usize..5,
    ) {
        let frame = Frame::new([9u8; 16], vec![0x5Au8; blocks * sizes::aes::BLOCK_SIZE]);
        let mut reader = FragmentedReader {
            data: frame.to_bytes().to_vec(),
            pos: 0,
            fragment,
        };
        let parsed = Frame::read_from(&mut reader).unwrap();
        prop_assert_eq!(parsed, frame);
    }
}

/// RSA keypair generation is the expensive part; share one transported
/// pair across the wrap/unwrap cases.
fn transported_pair() -> &'static (KeyExchange, KeyExchange) {
    static PAIR: OnceLock<(KeyExchange, KeyExchange)> = OnceLock::new();
    PAIR.get_or_init(|| {
        let mut server = KeyExchange::new();
        server.generate_keypair().expect("keypair generation");
        let pem = server.public_key_pem().expect("pem export");

        let mut client = KeyExchange::new();
        client.load_peer_public_key(&pem).expect("pem import");
        (server, client)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn wrap_unwrap_round_trip(session_key in session_keys()) {
        let (server, client) = transported_pair();

        let wrapped = client.wrap_session_key(&session_key).unwrap();
        prop_assert_eq!(wrapped.len(), sizes::rsa::WRAPPED_KEY_BYTES);

        let unwrapped = server.unwrap_session_key(&wrapped).unwrap();
        prop_assert_eq!(unwrapped, session_key);
    }
}

#[test]
fn iv_uniqueness_over_many_messages() {
    let cipher = Cipher::new([7u8; 32]);
    let mut seen = HashSet::new();

    for _ in 0..10_000 {
        let frame = cipher.encrypt(b"sample").unwrap();
        assert!(seen.insert(frame.iv), "IV collision under the same key");
    }
}
