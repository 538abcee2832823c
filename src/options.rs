use embedded_graphics::prelude::Size;

use crate::common::DecodeError;
use crate::frame::GifDecoder;

/// Logical size of the LED panel this decoder was written for.
pub const PANEL_SIZE: Size = Size::new(32, 16);

/// What happens when the trailer block is reached.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LoopPolicy {
    /// Wrap to the first frame and keep playing forever.
    #[default]
    Loop,
    /// Report [`DecodeError::EndOfStream`] until the decoder is reset.
    Stop,
}

/// Decoder configuration.
///
/// ```
/// use ledgif::{DecodeOptions, LoopPolicy};
///
/// let options = DecodeOptions::panel().loop_policy(LoopPolicy::Stop);
/// assert_eq!(options.canvas, Some(ledgif::PANEL_SIZE));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Behaviour at the trailer.
    pub loop_policy: LoopPolicy,
    /// Required logical screen size, if any.
    pub canvas: Option<Size>,
    /// Reject streams whose color resolution isn't 8 bits per primary.
    pub check_color_resolution: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            loop_policy: LoopPolicy::Loop,
            canvas: None,
            check_color_resolution: true,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults plus the 32x16 canvas check.
    pub fn panel() -> Self {
        Self::default().canvas(Some(PANEL_SIZE))
    }

    pub fn loop_policy(mut self, loop_policy: LoopPolicy) -> Self {
        self.loop_policy = loop_policy;
        self
    }

    pub fn canvas(mut self, canvas: Option<Size>) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn check_color_resolution(mut self, check: bool) -> Self {
        self.check_color_resolution = check;
        self
    }

    /// Start a decode session over `source` with these options.
    pub fn decoder(self, source: &[u8]) -> Result<GifDecoder<'_>, DecodeError> {
        GifDecoder::with_options(source, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DecodeOptions::new();
        assert_eq!(options.loop_policy, LoopPolicy::Loop);
        assert_eq!(options.canvas, None);
        assert!(options.check_color_resolution);
    }

    #[test]
    fn builder_chains() {
        let options = DecodeOptions::panel()
            .loop_policy(LoopPolicy::Stop)
            .check_color_resolution(false);
        assert_eq!(options.canvas, Some(Size::new(32, 16)));
        assert_eq!(options.loop_policy, LoopPolicy::Stop);
        assert!(!options.check_color_resolution);
    }
}
