//! GIF flavoured LZW: code table and the decompressor state machine driving it.

use alloc::vec::Vec;
use log::trace;

use crate::bitstream::{BitReader, MAX_CODE_WIDTH};
use crate::common::DecodeError;

/// Maximum number of entries a 12-bit code table can hold.
pub const MAX_CODES: usize = 1 << MAX_CODE_WIDTH;

#[derive(Debug, Copy, Clone)]
struct Entry {
    /// Length of the sequence this code expands to.
    len: u16,
    /// Code of the sequence minus its last byte; `None` for roots and the reserved codes.
    prefix: Option<u16>,
    /// Last pixel index of the sequence.
    suffix: u8,
    /// First pixel index of the sequence.
    first: u8,
}

/// Code to pixel-index-sequence dictionary for one decode session.
///
/// Allocated once at [`MAX_CODES`] capacity and reused; clearing only truncates.
pub struct CodeTable {
    entries: Vec<Entry>,
    root_bits: u8,
}

impl CodeTable {
    pub fn new() -> Result<Self, DecodeError> {
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(MAX_CODES)
            .map_err(|_| DecodeError::OutOfMemory)?;
        Ok(Self {
            entries,
            root_bits: 0,
        })
    }

    /// Reset to the literal roots plus the clear and stop codes.
    pub fn init(&mut self, root_bits: u8) {
        debug_assert!((1..=8).contains(&root_bits));
        self.root_bits = root_bits;
        self.entries.clear();
        let roots = 1usize << root_bits;
        self.entries.extend((0..roots).map(|idx| Entry {
            len: 1,
            prefix: None,
            suffix: idx as u8,
            first: idx as u8,
        }));
        // clear and stop; never resolved, only occupy their slots
        let reserved = Entry {
            len: 0,
            prefix: None,
            suffix: 0,
            first: 0,
        };
        self.entries.extend([reserved, reserved]);
    }

    pub fn clear_code(&self) -> u16 {
        1 << self.root_bits
    }

    pub fn stop_code(&self) -> u16 {
        self.clear_code() + 1
    }

    /// Next code that [`CodeTable::add`] will assign, i.e. the table size.
    pub fn next_free(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_CODES
    }

    /// Whether `code` resolves to a pixel sequence.
    pub fn contains(&self, code: u16) -> bool {
        let code = code as usize;
        code < self.entries.len() && self.entries[code].len > 0
    }

    /// First pixel index of a known code's sequence.
    pub fn first_of(&self, code: u16) -> Option<u8> {
        self.contains(code).then(|| self.entries[code as usize].first)
    }

    /// Append `prefix`'s sequence followed by `suffix` as a new code.
    pub fn add(&mut self, prefix: u16, suffix: u8) -> Result<u16, DecodeError> {
        if self.is_full() {
            return Err(DecodeError::CodeTableOverflow);
        }
        if !self.contains(prefix) {
            return Err(DecodeError::InvalidCode(prefix));
        }
        let base = self.entries[prefix as usize];
        let code = self.next_free();
        self.entries.push(Entry {
            len: base.len + 1,
            prefix: Some(prefix),
            suffix,
            first: base.first,
        });
        trace!(
            "lzw: added code {} (prefix {}, suffix {}, len {})",
            code,
            prefix,
            suffix,
            base.len + 1
        );
        Ok(code)
    }

    /// Expand `code` into the front of `out`, in forward order.
    ///
    /// Returns the full sequence length and its first pixel index. The prefix chain is walked
    /// from the last byte backwards, each byte landing at its final position; bytes that would
    /// land past the end of `out` are dropped.
    pub fn resolve(&self, code: u16, out: &mut [u8]) -> Result<(usize, u8), DecodeError> {
        if !self.contains(code) {
            return Err(DecodeError::InvalidCode(code));
        }
        let entry = self.entries[code as usize];
        let len = entry.len as usize;
        let mut pos = len;
        let mut cur = Some(code);
        while let Some(c) = cur {
            let e = &self.entries[c as usize];
            pos -= 1;
            if let Some(slot) = out.get_mut(pos) {
                *slot = e.suffix;
            }
            cur = e.prefix;
        }
        debug_assert_eq!(pos, 0);
        Ok((len, entry.first))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    /// Right after start or a clear code; the next code must be a root.
    AwaitFirstCode,
    /// Regular decoding, remembering the previously emitted code.
    SteadyState { previous: u16 },
    /// Stop code seen.
    Done,
}

/// Drives a [`BitReader`] and a [`CodeTable`] to turn one image's LZW data into pixel indices.
///
/// The table is owned here so a session allocates it once and reuses it for every frame.
pub struct Decompressor {
    table: CodeTable,
}

impl Decompressor {
    pub fn new() -> Result<Self, DecodeError> {
        Ok(Self {
            table: CodeTable::new()?,
        })
    }

    /// Decode a flattened LZW stream into `out`.
    ///
    /// `min_code_size` is the byte that precedes the image data sub-blocks. Decoding runs until the
    /// stop code and returns how many indices the stream held; anything beyond `out.len()` is
    /// decoded but dropped. On error the contents of `out` are garbage.
    pub fn decode<I>(
        &mut self,
        min_code_size: u8,
        data: I,
        out: &mut [u8],
    ) -> Result<usize, DecodeError>
    where
        I: Iterator<Item = u8>,
    {
        if !(2..=8).contains(&min_code_size) {
            return Err(DecodeError::InvalidMinCodeSize(min_code_size));
        }
        let mut reader = BitReader::new(data);
        let table = &mut self.table;
        table.init(min_code_size);
        let clear = table.clear_code();
        let stop = table.stop_code();
        let mut width = min_code_size + 1;
        let mut state = State::AwaitFirstCode;
        let mut written = 0;

        while state != State::Done {
            let code = reader.read_code(width)?;
            if code == clear {
                trace!("lzw: clear code at pixel {}", written);
                table.init(min_code_size);
                width = min_code_size + 1;
                state = State::AwaitFirstCode;
                continue;
            }
            if code == stop {
                state = State::Done;
                continue;
            }

            let previous = match state {
                State::AwaitFirstCode => {
                    if code >= clear {
                        return Err(DecodeError::InvalidCode(code));
                    }
                    let (len, _) = table.resolve(code, tail(out, written))?;
                    written += len;
                    state = State::SteadyState { previous: code };
                    continue;
                }
                State::SteadyState { previous } => previous,
                State::Done => break,
            };

            let first = if table.contains(code) {
                let (len, first) = table.resolve(code, tail(out, written))?;
                written += len;
                first
            } else if code == table.next_free() && !table.is_full() {
                // KwKwK: the code being defined right now is previous + previous[0]
                let first = table
                    .first_of(previous)
                    .ok_or(DecodeError::InvalidCode(previous))?;
                let (len, _) = table.resolve(previous, tail(out, written))?;
                written += len;
                if let Some(slot) = out.get_mut(written) {
                    *slot = first;
                }
                written += 1;
                first
            } else {
                return Err(DecodeError::InvalidCode(code));
            };

            // a full table stops growing until the encoder sends a clear code
            if !table.is_full() {
                table.add(previous, first)?;
                if usize::from(table.next_free()) == 1 << width && width < MAX_CODE_WIDTH {
                    width += 1;
                    trace!("lzw: code width now {}", width);
                }
            }
            state = State::SteadyState { previous: code };
        }
        Ok(written)
    }
}

/// Unwritten remainder of `out`, empty once `written` runs past it.
fn tail(out: &mut [u8], written: usize) -> &mut [u8] {
    let start = written.min(out.len());
    &mut out[start..]
}
