use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use std::vec::Vec;
use weezl::{encode::Encoder, BitOrder};

/// Sink with the LED panel's geometry; pixels outside the canvas are dropped.
pub(crate) struct Framebuffer<const WIDTH: usize, const HEIGHT: usize> {
    pub pixels: [[Rgb888; WIDTH]; HEIGHT],
    pub rejected: usize,
}

impl<const WIDTH: usize, const HEIGHT: usize> Framebuffer<WIDTH, HEIGHT> {
    pub fn new() -> Self {
        Self::filled(Rgb888::BLACK)
    }

    pub fn filled(color: Rgb888) -> Self {
        Self {
            pixels: [[color; WIDTH]; HEIGHT],
            rejected: 0,
        }
    }

    pub fn at(&self, x: usize, y: usize) -> Rgb888 {
        self.pixels[y][x]
    }
}

impl<const WIDTH: usize, const HEIGHT: usize> DrawTarget for Framebuffer<WIDTH, HEIGHT> {
    type Error = std::convert::Infallible;
    type Color = Rgb888;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Rgb888>>,
    {
        for Pixel(p, c) in pixels {
            match (usize::try_from(p.x), usize::try_from(p.y)) {
                (Ok(x), Ok(y)) if x < WIDTH && y < HEIGHT => self.pixels[y][x] = c,
                _ => self.rejected += 1,
            }
        }

        Ok(())
    }
}

impl<const WIDTH: usize, const HEIGHT: usize> OriginDimensions for Framebuffer<WIDTH, HEIGHT> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

pub(crate) const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
pub(crate) const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
pub(crate) const RED: [u8; 3] = [0xff, 0x00, 0x00];
pub(crate) const BLUE: [u8; 3] = [0x00, 0x00, 0xff];

/// Assembles GIF byte streams block by block for fixtures.
pub(crate) struct GifBuilder {
    width: u16,
    height: u16,
    palette: Vec<[u8; 3]>,
    body: Vec<u8>,
}

impl GifBuilder {
    /// `width`x`height` screen with a black, white, red, blue global palette.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            palette: std::vec![BLACK, WHITE, RED, BLUE],
            body: Vec::new(),
        }
    }

    pub fn panel() -> Self {
        Self::new(32, 16)
    }

    /// Replace the palette with a grey ramp of `len` entries (a power of two).
    pub fn grey_palette(mut self, len: usize) -> Self {
        self.palette = (0..len).map(|i| [i as u8; 3]).collect();
        self
    }

    fn size_bits(&self) -> u8 {
        (self.palette.len().trailing_zeros() as u8).max(1) - 1
    }

    pub fn min_code_size(&self) -> u8 {
        (self.size_bits() + 1).max(2)
    }

    pub fn graphics_control(mut self, transparent: Option<u8>, delay: u16) -> Self {
        let flags = u8::from(transparent.is_some()) | (1 << 2);
        self.body.extend([0x21, 0xF9, 0x04, flags]);
        self.body.extend(delay.to_le_bytes());
        self.body.extend([transparent.unwrap_or(0), 0x00]);
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.body.extend([0x21, 0xFE]);
        push_sub_blocks(&mut self.body, text);
        self
    }

    pub fn netscape_loop(mut self) -> Self {
        self.body.extend([0x21, 0xFF, 0x0B]);
        self.body.extend(b"NETSCAPE2.0");
        self.body.extend([0x03, 0x01, 0x00, 0x00, 0x00]);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend(bytes);
        self
    }

    /// Image descriptor followed by `min_code_size` and `data` split into sub-blocks.
    pub fn raw_image(
        mut self,
        origin: (u16, u16),
        size: (u16, u16),
        flags: u8,
        min_code_size: u8,
        data: &[u8],
    ) -> Self {
        self.body.push(0x2C);
        for v in [origin.0, origin.1, size.0, size.1] {
            self.body.extend(v.to_le_bytes());
        }
        self.body.extend([flags, min_code_size]);
        push_sub_blocks(&mut self.body, data);
        self
    }

    /// Image whose `indices` are compressed with the reference encoder.
    pub fn image(self, origin: (u16, u16), size: (u16, u16), indices: &[u8]) -> Self {
        let min_code_size = self.min_code_size();
        let data = Encoder::new(BitOrder::Lsb, min_code_size)
            .encode(indices)
            .unwrap();
        self.raw_image(origin, size, 0, min_code_size, &data)
    }

    pub fn build_without_trailer(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(b"GIF89a");
        out.extend(self.width.to_le_bytes());
        out.extend(self.height.to_le_bytes());
        // global table, 8 bits per primary, table size
        out.extend([0x80 | 0x70 | self.size_bits(), 0x00, 0x00]);
        for rgb in &self.palette {
            out.extend(rgb);
        }
        out.extend(&self.body);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.build_without_trailer();
        out.push(0x3B);
        out
    }
}

pub(crate) fn push_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend(chunk);
    }
    out.push(0);
}

/// Pack `(code, width)` pairs LSB first the way a GIF encoder does.
pub(crate) fn pack_codes(codes: &[(u16, u8)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc: u32 = 0;
    let mut bits: u8 = 0;
    for &(code, width) in codes {
        acc |= u32::from(code) << bits;
        bits += width;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Small xorshift so fixtures are reproducible without pulling in a rng crate.
pub(crate) fn noise(len: usize, modulo: u8, mut seed: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % u32::from(modulo)) as u8
        })
        .collect()
}

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
