use alloc::vec::Vec;

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::{DrawTarget, Drawable, OriginDimensions, Pixel, Point, RgbColor, Size},
    primitives::Rectangle,
};
use log::{debug, warn};

use crate::{
    common::{Block, DecodeError, ExtensionLabel},
    header::{DisposalMethod, GraphicsControl, Header, ImageDescriptor, Palette},
    iterators::{skip_sub_blocks, ByteCursor, SubBlocks},
    lzw::Decompressor,
    options::{DecodeOptions, LoopPolicy},
};

/// One decode session over a caller-owned GIF buffer.
///
/// The session only ever borrows `source`; frames it hands out are owned by the caller. Exactly
/// one session should walk a buffer at a time, and callers that switch images from another
/// context must serialize that against [`GifDecoder::read_next_frame`] themselves.
pub struct GifDecoder<'a> {
    bytes: ByteCursor<'a>,
    header: Header,
    options: DecodeOptions,
    first_frame_offset: usize,
    /// Most recent graphic control extension, applies to the next image.
    control: Option<GraphicsControl>,
    lzw: Decompressor,
    ended: bool,
}

impl<'a> GifDecoder<'a> {
    /// Start a session with [`DecodeOptions::default`].
    pub fn new(source: &'a [u8]) -> Result<Self, DecodeError> {
        Self::with_options(source, DecodeOptions::default())
    }

    pub fn with_options(source: &'a [u8], options: DecodeOptions) -> Result<Self, DecodeError> {
        let mut bytes = ByteCursor::new(source);
        let header = Header::parser(&mut bytes, &options)?;
        let first_frame_offset = bytes.offset();

        Ok(Self {
            bytes,
            header,
            options,
            first_frame_offset,
            control: None,
            lzw: Decompressor::new()?,
            ended: false,
        })
    }

    pub fn screen_size(&self) -> Size {
        self.header.screen_size
    }

    pub fn palette(&self) -> &Palette {
        &self.header.palette
    }

    pub fn background_index(&self) -> u8 {
        self.header.background_index
    }

    /// Offset of the first block after the global color table.
    pub fn first_frame_offset(&self) -> usize {
        self.first_frame_offset
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Rewind to the first frame and forget any graphic control state.
    pub fn reset(&mut self) {
        // the offset came from parsing this very buffer
        let _ = self.bytes.seek_to(self.first_frame_offset);
        self.control = None;
        self.ended = false;
    }

    /// Decode the next image in the stream.
    ///
    /// Extension blocks in front of the image are consumed on the way; a graphic control
    /// extension updates the transparency and delay applied to this and later frames. At the
    /// trailer the [`LoopPolicy`] decides between wrapping to the first frame and
    /// [`DecodeError::EndOfStream`]. After any other error the session should be discarded.
    pub fn read_next_frame(&mut self) -> Result<Frame, DecodeError> {
        if self.ended {
            return Err(DecodeError::EndOfStream);
        }
        let descriptor = self.seek_to_next_image()?;
        debug!(
            "frame {}x{} at {},{}",
            descriptor.size().width,
            descriptor.size().height,
            descriptor.origin().x,
            descriptor.origin().y
        );

        let min_code_size = self.bytes.take_byte()?;
        let num_pixels = descriptor.num_pixels();
        let mut indices = try_alloc(num_pixels, 0u8)?;

        let mut blocks = SubBlocks::new(self.bytes.source(), self.bytes.offset());
        let decoded = match self.lzw.decode(min_code_size, &mut blocks, &mut indices) {
            Err(DecodeError::BitstreamUnderflow) if blocks.truncated() => {
                Err(DecodeError::UnexpectedEof)
            }
            other => other,
        }?;
        if decoded < num_pixels {
            return Err(DecodeError::MissingPixels {
                expected: num_pixels,
                decoded,
            });
        }
        if decoded > num_pixels {
            debug!("dropping {} excess pixels", decoded - num_pixels);
        }
        skip_sub_blocks(&mut self.bytes)?;

        let control = self.control.unwrap_or_default();
        let transparency = control.transparent_idx().map(|index| {
            let color = self.header.palette.get(index);
            if color.is_none() {
                warn!("transparent index {} outside the global palette", index);
            }
            Transparency { index, color }
        });

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(num_pixels)
            .map_err(|_| DecodeError::OutOfMemory)?;
        for &index in &indices {
            let color = match self.header.palette.get(index) {
                Some(color) => color,
                // never drawn, so it doesn't need a palette entry
                None if transparency.map(|t| t.index) == Some(index) => Rgb888::BLACK,
                None => return Err(DecodeError::InvalidColorIndex(index)),
            };
            pixels.push(color);
        }

        Ok(Frame {
            descriptor,
            indices,
            pixels,
            transparency,
            delay_centiseconds: control.delay_centiseconds(),
            disposal: control.disposal_method(),
        })
    }

    /// Walk blocks from the cursor until an image descriptor has been read.
    fn seek_to_next_image(&mut self) -> Result<ImageDescriptor, DecodeError> {
        let mut wrapped = false;
        loop {
            let offset = self.bytes.offset();
            match Block::from_u8(self.bytes.take_byte()?, offset)? {
                Block::Image => {
                    return ImageDescriptor::parser(&mut self.bytes, self.header.screen_size);
                }
                Block::Extension => {
                    let label = ExtensionLabel::from_u8(self.bytes.take_byte()?);
                    match label {
                        ExtensionLabel::Graphics => {
                            let control = GraphicsControl::parse(&mut self.bytes)?;
                            debug!(
                                "graphics control at {}: transparent {:?}, delay {}",
                                offset,
                                control.transparent_idx(),
                                control.delay_centiseconds()
                            );
                            self.control = Some(control);
                        }
                        _ => {
                            debug!("skipping {:?} extension at {}", label, offset);
                            skip_sub_blocks(&mut self.bytes)?;
                        }
                    }
                }
                Block::Trailer => {
                    debug!("trailer at {}", offset);
                    self.control = None;
                    match self.options.loop_policy {
                        LoopPolicy::Stop => {
                            self.ended = true;
                            return Err(DecodeError::EndOfStream);
                        }
                        // a second trailer without an image in between: nothing to play
                        LoopPolicy::Loop if wrapped => return Err(DecodeError::EndOfStream),
                        LoopPolicy::Loop => {
                            wrapped = true;
                            self.bytes.seek_to(self.first_frame_offset)?;
                        }
                    }
                }
            }
        }
    }
}

fn try_alloc<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, DecodeError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| DecodeError::OutOfMemory)?;
    buf.resize(len, fill);
    Ok(buf)
}

/// Frames until [`DecodeError::EndOfStream`]; never ends under [`LoopPolicy::Loop`] unless the
/// stream holds no images. Stops after the first error.
impl Iterator for GifDecoder<'_> {
    type Item = Result<Frame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next_frame() {
            Err(DecodeError::EndOfStream) => None,
            Err(err) => {
                self.ended = true;
                Some(Err(err))
            }
            Ok(frame) => Some(Ok(frame)),
        }
    }
}

impl OriginDimensions for GifDecoder<'_> {
    fn size(&self) -> Size {
        self.screen_size()
    }
}

/// Transparent palette entry of a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transparency {
    pub index: u8,
    /// Palette color behind `index`, `None` if the palette is shorter.
    pub color: Option<Rgb888>,
}

/// One decoded image, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    descriptor: ImageDescriptor,
    indices: Vec<u8>,
    pixels: Vec<Rgb888>,
    transparency: Option<Transparency>,
    delay_centiseconds: u16,
    disposal: DisposalMethod,
}

impl Frame {
    /// Top left corner within the logical screen.
    pub fn origin(&self) -> Point {
        self.descriptor.origin()
    }

    pub fn size(&self) -> Size {
        self.descriptor.size()
    }

    pub fn bounding_box(&self) -> Rectangle {
        self.descriptor.bounding_box()
    }

    /// Row-major colors, `width * height` of them.
    pub fn pixels(&self) -> &[Rgb888] {
        &self.pixels
    }

    /// Row-major global palette indices.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn transparency(&self) -> Option<Transparency> {
        self.transparency
    }

    pub fn is_transparent(&self, pixel: usize) -> bool {
        match (self.transparency, self.indices.get(pixel)) {
            (Some(t), Some(&index)) => t.index == index,
            _ => false,
        }
    }

    pub fn delay_centiseconds(&self) -> u16 {
        self.delay_centiseconds
    }

    /// Amount of time to show this frame for
    pub fn delay_ms(&self) -> u32 {
        u32::from(self.delay_centiseconds) * 10
    }

    pub fn disposal(&self) -> DisposalMethod {
        self.disposal
    }

    /// Opaque pixels at logical screen coordinates.
    pub fn visible_pixels(&self) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        let width = self.size().width as usize;
        let origin = self.origin();
        self.pixels
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.is_transparent(*i))
            .map(move |(i, color)| {
                let offset = Point::new((i % width) as i32, (i / width) as i32);
                Pixel(origin + offset, *color)
            })
    }
}

/// Any [`DrawTarget`] is a pixel sink; coordinates outside its area are its to reject.
impl Drawable for Frame {
    type Color = Rgb888;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        target.draw_iter(self.visible_pixels())
    }
}
