use crate::common::DecodeError;

///Abstraction for walking through an entire gif source
///
/// Every read is bounds-checked against the borrowed slice; running off the end is
/// [`DecodeError::UnexpectedEof`] and leaves the offset where it was.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    source: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self { source, offset: 0 }
    }

    pub(crate) fn source(&self) -> &'a [u8] {
        self.source
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.offset >= self.source.len()
    }

    pub(crate) fn peek_byte(&self) -> Result<u8, DecodeError> {
        self.source
            .get(self.offset)
            .copied()
            .ok_or(DecodeError::UnexpectedEof)
    }

    pub(crate) fn take_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_byte()?;
        self.offset += 1;
        Ok(byte)
    }

    pub(crate) fn take_u16_le(&mut self) -> Result<u16, DecodeError> {
        self.take_arr().map(u16::from_le_bytes)
    }

    #[inline]
    pub(crate) fn take_arr<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take_slice(N)?;
        let mut arr = [0; N];
        arr.copy_from_slice(slice);
        Ok(arr)
    }

    pub(crate) fn take_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.source.len())
            .ok_or(DecodeError::UnexpectedEof)?;
        let slice = &self.source[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub(crate) fn seek_by(&mut self, len: usize) -> Result<(), DecodeError> {
        self.take_slice(len).map(|_| ())
    }

    pub(crate) fn seek_to(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.source.len() {
            return Err(DecodeError::UnexpectedEof);
        }
        self.offset = offset;
        Ok(())
    }
}

/// Flattens a chain of length-prefixed sub-blocks into one contiguous byte stream.
///
/// Length bytes never reach the consumer. Iteration ends at the zero-length terminator, or early
/// if the source runs out, in which case [`SubBlocks::truncated`] reports it.
pub struct SubBlocks<'a> {
    source: &'a [u8],
    offset: usize,
    remaining: usize,
    finished: bool,
    truncated: bool,
}

impl<'a> SubBlocks<'a> {
    /// `offset` must point at the first length byte of the chain.
    pub fn new(source: &'a [u8], offset: usize) -> Self {
        Self {
            source,
            offset,
            remaining: 0,
            finished: false,
            truncated: false,
        }
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn stop(&mut self, truncated: bool) -> Option<u8> {
        self.finished = true;
        self.truncated = truncated;
        None
    }
}

impl Iterator for SubBlocks<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.finished {
            return None;
        }
        while self.remaining == 0 {
            let Some(&len) = self.source.get(self.offset) else {
                return self.stop(true);
            };
            self.offset += 1;
            if len == 0 {
                return self.stop(false);
            }
            self.remaining = len as usize;
        }
        let Some(&byte) = self.source.get(self.offset) else {
            return self.stop(true);
        };
        self.offset += 1;
        self.remaining -= 1;
        Some(byte)
    }
}

/// Step over a sub-block chain, leaving the cursor just past its zero-length terminator.
pub fn skip_sub_blocks(bytes: &mut ByteCursor<'_>) -> Result<(), DecodeError> {
    loop {
        match bytes.take_byte()? {
            0 => return Ok(()),
            len => bytes.seek_by(len as usize)?,
        }
    }
}
