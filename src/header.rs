use core::ops::{Add, BitAnd, Shr};

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::{Point, Size},
    primitives::Rectangle,
};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::common::{DecodeError, Feature};
use crate::iterators::ByteCursor;
use crate::options::DecodeOptions;

const SIGNATURE: &[u8; 3] = b"GIF";
const VERSIONS: [&[u8; 3]; 2] = [b"89a", b"87a"];

/// Everything in front of the first block: signature, logical screen descriptor and global
/// color table.
#[derive(Debug)]
pub struct Header {
    /// Gif size in pixels.
    pub screen_size: Size,
    /// Palette index of the background color.
    pub background_index: u8,
    /// Global color table
    pub palette: Palette,
}

/// Global color table, decoded once when the session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    table: SmallVec<[Rgb888; 256]>,
}

impl Palette {
    pub(crate) fn parse(len: usize, bytes: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let raw = bytes.take_slice(len * 3)?;
        let table = raw
            .chunks_exact(3)
            .map(|rgb| Rgb888::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Ok(Self { table })
    }

    /// Color for `index`, if the table has that many entries.
    pub fn get(&self, index: u8) -> Option<Rgb888> {
        self.table.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Rgb888> + '_ {
        self.table.iter().copied()
    }
}

impl Header {
    pub fn parser(
        bytes: &mut ByteCursor<'_>,
        options: &DecodeOptions,
    ) -> Result<Header, DecodeError> {
        let name: [u8; 6] = bytes.take_arr().map_err(|_| DecodeError::BadSignature)?;
        if &name[..3] != SIGNATURE || !VERSIONS.iter().any(|v| &name[3..] == *v) {
            debug!("bad signature {:?}", name);
            return Err(DecodeError::BadSignature);
        }

        let width = bytes.take_u16_le()? as u32;
        let height = bytes.take_u16_le()? as u32;
        let screen_size = Size { width, height };

        let packed = bytes.take_byte()?;
        let background_index = bytes.take_byte()?;
        // pixel aspect ratio, ignored
        bytes.take_byte()?;

        if let Some(expected) = options.canvas {
            if expected != screen_size {
                return Err(DecodeError::CanvasMismatch {
                    expected,
                    found: screen_size,
                });
            }
        }

        if packed.bitand(0x80) != 0x80 {
            debug!("no global color table");
            return Err(DecodeError::NoGlobalPalette);
        }

        let bits_per_primary = packed.bitand(0x70).shr(4u8).add(1);
        if options.check_color_resolution && bits_per_primary != 8 {
            return Err(DecodeError::UnsupportedColorDepth(bits_per_primary));
        }

        let num_entries = 1usize << packed.bitand(0x7).add(1);
        let palette = Palette::parse(num_entries, bytes)?;
        debug!(
            "{}x{} screen, {} color global table, first block at {}",
            width,
            height,
            num_entries,
            bytes.offset()
        );

        Ok(Header {
            screen_size,
            background_index,
            palette,
        })
    }
}

/// Process for displaying next image in the file
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    #[default]
    NotSpecified,
    DoNotDispose,
    RestoreBackground,
    RestorePrevious,
    /// Values 4-7, reserved by the format
    Reserved(u8),
}

impl DisposalMethod {
    fn from_u8(n: u8) -> Self {
        match n {
            0 => DisposalMethod::NotSpecified,
            1 => DisposalMethod::DoNotDispose,
            2 => DisposalMethod::RestoreBackground,
            3 => DisposalMethod::RestorePrevious,
            other => DisposalMethod::Reserved(other),
        }
    }
}

/// Graphic Control Extension body.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GraphicsControl {
    /// Control byte
    ctrl: u8,
    ///table index for a transparent color
    transparent_idx: u8,
    ///Delay time, in hundredths of a second
    delay_time: u16,
}

impl GraphicsControl {
    /// Parse the body following the `0x21 0xF9` introducer and label, terminator included.
    pub fn parse(bytes: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let offset = bytes.offset();
        let len = bytes.take_byte()?;
        if len != 4 {
            return Err(DecodeError::MalformedStream { offset, byte: len });
        }
        let ctrl = bytes.take_byte()?;
        let delay_time = bytes.take_u16_le()?;
        let transparent_idx = bytes.take_byte()?;

        let offset = bytes.offset();
        let terminator = bytes.take_byte()?;
        if terminator != 0 {
            return Err(DecodeError::MalformedStream {
                offset,
                byte: terminator,
            });
        }

        Ok(Self {
            ctrl,
            transparent_idx,
            delay_time,
        })
    }

    pub fn transparent_idx(&self) -> Option<u8> {
        self.ctrl.bitand(1).eq(&1).then_some(self.transparent_idx)
    }

    pub fn delay_centiseconds(&self) -> u16 {
        self.delay_time
    }

    pub fn disposal_method(&self) -> DisposalMethod {
        DisposalMethod::from_u8(self.ctrl.shr(2u8).bitand(0x7))
    }
}

/// Image descriptor, minus the `0x2C` separator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    origin: Point,
    size: Size,
}

impl ImageDescriptor {
    /// Parse the 9 descriptor bytes and check the frame fits `screen`.
    pub fn parser(bytes: &mut ByteCursor<'_>, screen: Size) -> Result<Self, DecodeError> {
        let left = bytes.take_u16_le()? as u32;
        let top = bytes.take_u16_le()? as u32;
        let width = bytes.take_u16_le()? as u32;
        let height = bytes.take_u16_le()? as u32;
        let packed = bytes.take_byte()?;

        if packed.bitand(0x40) == 0x40 {
            debug!("can't work with interlaced frame");
            return Err(DecodeError::UnsupportedFeature(Feature::Interlaced));
        }
        if packed.bitand(0x80) == 0x80 {
            debug!("can't work with local color table");
            return Err(DecodeError::UnsupportedFeature(Feature::LocalColorTable));
        }
        if left + width > screen.width || top + height > screen.height {
            warn!(
                "frame {}x{} at {},{} outside {}x{} screen",
                width, height, left, top, screen.width, screen.height
            );
            return Err(DecodeError::FrameOutOfBounds);
        }

        Ok(Self {
            origin: Point::new(left as i32, top as i32),
            size: Size::new(width, height),
        })
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(self.origin, self.size)
    }

    pub fn num_pixels(&self) -> usize {
        self.size.width as usize * self.size.height as usize
    }
}
