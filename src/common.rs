use embedded_graphics::prelude::Size;
use thiserror::Error;

/// Known GIF block labels.
///
/// Note that the block uniquely specifies the layout of bytes that follow and how they are
/// framed. For example, the header always has a fixed length but is followed by a variable amount
/// of additional data. An image descriptor may be followed by a local color table depending on
/// information read in it. Therefore, it doesn't make sense to continue parsing after encountering
/// an unknown block as the semantics of following bytes are unclear.
///
/// The extension block provides a common framing for an arbitrary amount of application specific
/// data which may be ignored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Block {
    /// Image block.
    Image = 0x2C,
    /// Extension block.
    Extension = 0x21,
    /// Image trailer.
    Trailer = 0x3B,
}

impl Block {
    /// Classify the byte at `offset`; anything that isn't a known label is a malformed stream.
    pub fn from_u8(byte: u8, offset: usize) -> Result<Self, DecodeError> {
        match byte {
            0x2C => Ok(Block::Image),
            0x21 => Ok(Block::Extension),
            0x3B => Ok(Block::Trailer),
            _ => Err(DecodeError::MalformedStream { offset, byte }),
        }
    }
}

/// Known GIF Extension labels.
///
/// Note that we only interpret the graphics control extension; the others are named so the logs
/// can say what was skipped :)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtensionLabel {
    /// Graphics control extension, carries transparency and delay.
    Graphics,
    /// Application extension (NETSCAPE looping and friends).
    App,
    /// Plain text extension.
    Text,
    /// Comment extension.
    Comment,
    /// Anything else, skipped by its sub-block framing.
    Other(u8),
}

impl ExtensionLabel {
    pub fn from_u8(n: u8) -> Self {
        match n {
            0xf9 => ExtensionLabel::Graphics,
            0xff => ExtensionLabel::App,
            0x01 => ExtensionLabel::Text,
            0xfe => ExtensionLabel::Comment,
            other => ExtensionLabel::Other(other),
        }
    }
}

/// Image features the decoder deliberately does not implement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feature {
    /// Interlaced row ordering.
    Interlaced,
    /// Per-image local color table.
    LocalColorTable,
}

impl core::fmt::Display for Feature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Feature::Interlaced => f.write_str("interlaced image"),
            Feature::LocalColorTable => f.write_str("local color table"),
        }
    }
}

/// Errors that emerge when decoding a gif stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Source doesn't start with `GIF87a` or `GIF89a`
    #[error("not a GIF87a/GIF89a stream")]
    BadSignature,
    /// Logical screen descriptor has no global color table
    #[error("no global color table")]
    NoGlobalPalette,
    /// Color resolution other than 8 bits per primary
    #[error("{0} bits per primary color is not supported")]
    UnsupportedColorDepth(u8),
    /// Image uses a feature we don't decode
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(Feature),
    /// Unexpected byte where a known block was expected
    #[error("malformed stream: unexpected byte {byte:#04x} at offset {offset}")]
    MalformedStream { offset: usize, byte: u8 },
    /// Source buffer ended in the middle of a block
    #[error("unexpected end of source buffer")]
    UnexpectedEof,
    /// LZW data ran out before a stop code was read
    #[error("LZW bitstream underflow")]
    BitstreamUnderflow,
    /// Attempted to grow the LZW code table past 4096 entries
    #[error("LZW code table overflow")]
    CodeTableOverflow,
    /// LZW code that is neither in the table nor the next free slot
    #[error("invalid LZW code {0}")]
    InvalidCode(u16),
    /// LZW minimum code size outside 2..=8
    #[error("invalid LZW minimum code size {0}")]
    InvalidMinCodeSize(u8),
    /// LZW data stopped before every pixel was decoded
    #[error("image data stopped after {decoded} of {expected} pixels")]
    MissingPixels { expected: usize, decoded: usize },
    /// Pixel index with no global palette entry
    #[error("color index {0} is outside the global palette")]
    InvalidColorIndex(u8),
    /// Logical screen doesn't match the configured canvas
    #[error("canvas is {found:?}, expected {expected:?}")]
    CanvasMismatch { expected: Size, found: Size },
    /// Image descriptor reaches outside the logical screen
    #[error("frame extends outside the logical screen")]
    FrameOutOfBounds,
    /// Trailer reached and the loop policy says stop
    #[error("end of stream")]
    EndOfStream,
    /// Frame buffer allocation failed
    #[error("out of memory allocating frame")]
    OutOfMemory,
}

impl DecodeError {
    /// End of stream is a playback signal rather than a decode failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, DecodeError::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_labels() {
        assert_eq!(Block::from_u8(0x2C, 0).unwrap(), Block::Image);
        assert_eq!(Block::from_u8(0x21, 0).unwrap(), Block::Extension);
        assert_eq!(Block::from_u8(0x3B, 0).unwrap(), Block::Trailer);
        assert_eq!(
            Block::from_u8(0x42, 17),
            Err(DecodeError::MalformedStream {
                offset: 17,
                byte: 0x42
            })
        );
    }

    #[test]
    fn unknown_extensions_are_kept() {
        assert_eq!(ExtensionLabel::from_u8(0xf9), ExtensionLabel::Graphics);
        assert_eq!(ExtensionLabel::from_u8(0x10), ExtensionLabel::Other(0x10));
    }

    #[test]
    fn end_of_stream_is_not_a_failure() {
        assert!(DecodeError::EndOfStream.is_end_of_stream());
        assert!(!DecodeError::BitstreamUnderflow.is_end_of_stream());
    }
}
