//! A small and opinionated gif decoder for tiny indexed-color LED panels, no-std but usable anywhere.
//!
//! This crate decodes GIF87a/GIF89a streams held in memory into frames of [`Rgb888`] pixels that
//! can be drawn straight onto [`embedded_graphics`] [`DrawTarget`]s. It is built for a 32x16
//! panel with a global palette; interlaced images and local color tables are refused rather than
//! decoded.
//!
//! ```ignore
//! let mut decoder = ledgif::DecodeOptions::panel().decoder(GIF_BYTES)?;
//! loop {
//!     let frame = decoder.read_next_frame()?;
//!     frame.draw(&mut display)?;
//!     delay_ms(frame.delay_ms());
//! }
//! ```
//!
//! The session loops forever by default; use [`LoopPolicy::Stop`] to get
//! [`DecodeError::EndOfStream`] at the trailer instead. Memory for a frame is allocated with
//! `try_reserve`, so an exhausted heap shows up as [`DecodeError::OutOfMemory`].
//!
//! The minimum supported Rust version for ledgif is stable `1.81`.
//!
//! <!-- README-LINKS
//! [`embedded_graphics`]: https://docs.rs/embedded_graphics
//! [`DrawTarget`]: https://docs.rs/embedded-graphics/latest/embedded_graphics/draw_target/trait.DrawTarget.html
//! [`Rgb888`]: https://docs.rs/embedded-graphics/latest/embedded_graphics/pixelcolor/struct.Rgb888.html
//! README-LINKS -->
//!
//! [`DrawTarget`]: embedded_graphics::draw_target::DrawTarget
//! [`Rgb888`]: embedded_graphics::pixelcolor::Rgb888

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod bitstream;
mod common;
mod frame;
mod header;
mod iterators;
mod lzw;
mod options;
#[cfg(test)]
mod test_utils;

pub use bitstream::{BitReader, MAX_CODE_WIDTH};
pub use common::{Block, DecodeError, ExtensionLabel, Feature};
pub use frame::{Frame, GifDecoder, Transparency};
pub use header::{DisposalMethod, GraphicsControl, ImageDescriptor, Palette};
pub use iterators::SubBlocks;
pub use lzw::{CodeTable, Decompressor, MAX_CODES};
pub use options::{DecodeOptions, LoopPolicy, PANEL_SIZE};
