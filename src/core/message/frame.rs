/*!
Message frame codec.

One frame carries one encrypted message and has the following format:

- IV (16 bytes): initialization vector for this message
- Ciphertext length (4 bytes, big-endian)
- Ciphertext (variable, padded to the 16-byte block size)

Both peers must use identical framing to interoperate. A frame is
ephemeral: constructed, transferred, and discarded per message.
*/

use std::io::{Read, Write};

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};

use crate::core::constants::{MAX_FRAME_SIZE, sizes};
use crate::core::error::{Error, Result};
use crate::core::transport::{recv_exact, send_exact};

/// One encrypted message unit: a fresh IV plus the CBC ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Initialization vector used for this message
    pub iv: [u8; sizes::aes::IV_SIZE],
    /// Padded ciphertext
    pub ciphertext: Vec<u8>,
}

impl Frame {
    /// Create a frame from its parts.
    pub fn new(iv: [u8; sizes::aes::IV_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { iv, ciphertext }
    }

    /// Encode the frame for the wire.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            sizes::aes::IV_SIZE + sizes::LEN_FIELD_SIZE + self.ciphertext.len(),
        );
        buf.put_slice(&self.iv);
        buf.put_u32(self.ciphertext.len() as u32);
        buf.put_slice(&self.ciphertext);
        buf.freeze()
    }

    /// Write the whole frame to a writer in one exact send.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        send_exact(writer, &self.to_bytes())
    }

    /// Read one frame: the IV, then the length, then exactly that many
    /// ciphertext bytes.
    ///
    /// The length is validated before the ciphertext is read; a bad
    /// length means the stream is out of sync or the peer is not
    /// speaking this protocol, and the session should terminate.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let iv_bytes = recv_exact(reader, sizes::aes::IV_SIZE)?;
        let mut iv = [0u8; sizes::aes::IV_SIZE];
        iv.copy_from_slice(&iv_bytes);

        let len_bytes = recv_exact(reader, sizes::LEN_FIELD_SIZE)?;
        let len = BigEndian::read_u32(&len_bytes) as usize;
        validate_len(len)?;

        let ciphertext = recv_exact(reader, len)?;
        Ok(Self { iv, ciphertext })
    }
}

fn validate_len(len: usize) -> Result<()> {
    if len == 0 || len % sizes::aes::BLOCK_SIZE != 0 {
        return Err(Error::InvalidFrame(format!(
            "ciphertext length {} is not a positive multiple of {}",
            len,
            sizes::aes::BLOCK_SIZE
        )));
    }
    if len > MAX_FRAME_SIZE {
        return Err(Error::InvalidFrame(format!(
            "ciphertext length {} exceeds the {} byte limit",
            len, MAX_FRAME_SIZE
        )));
    }
    Ok(())
}
