//! Fixed-width big-endian word encoding shared by the aggregator request
//! arguments and the transport payload.
//!
//! Every field occupies one 32-byte word. Integers are right-aligned
//! (left-padded with zeros), so a word written here decodes as a `uint256` on
//! EVM chains.

pub const WORD_LEN: usize = 32;

pub fn push_u64(out: &mut Vec<u8>, value: u64) {
    let mut word = [0u8; WORD_LEN];
    word[24..].copy_from_slice(&value.to_be_bytes());
    out.extend_from_slice(&word);
}

pub fn push_bytes32(out: &mut Vec<u8>, value: &[u8; 32]) {
    out.extend_from_slice(value);
}

/// Cursor over a sequence of words. Every read fails with `None` on a short
/// buffer or, for integers, when the high 24 bytes are not zero.
pub struct WordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WordReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn next_word(&mut self) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(WORD_LEN)?;
        let word = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(word)
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        let word = self.next_word()?;
        if word[..24].iter().any(|&b| b != 0) {
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&word[24..]);
        Some(u64::from_be_bytes(buf))
    }

    pub fn read_bytes32(&mut self) -> Option<[u8; 32]> {
        let word = self.next_word()?;
        let mut buf = [0u8; 32];
        buf.copy_from_slice(word);
        Some(buf)
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset == self.bytes.len()
    }
}
