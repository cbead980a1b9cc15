use crate::error::{MichelsonError, Result};

/// Nesting limit shared by the binary decoders.
pub(crate) const MAX_DEPTH: usize = 1024;

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let (&first, rest) = self.bytes.split_first().ok_or(MichelsonError::UnexpectedEof)?;
        self.bytes = rest;
        Ok(first)
    }

    pub(crate) fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < len {
            return Err(MichelsonError::UnexpectedEof);
        }

        let (head, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(head)
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32> {
        let bz = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bz[0], bz[1], bz[2], bz[3]]))
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.bytes.len() {
            0 => Ok(()),
            n => Err(MichelsonError::TrailingBytes(n)),
        }
    }
}
