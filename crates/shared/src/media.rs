use std::fmt;
use std::sync::Arc;

/// Opaque raster handle handed from the conversion pipeline to renderers.
/// Pixel bytes are RGBA8 row-major; the codec that produced them is not this
/// crate's concern. Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SlideImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl SlideImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Neutral dark frame shown when no slide is available.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for _ in 0..(width as usize) * (height as usize) {
            pixels.extend_from_slice(&[0x10, 0x10, 0x12, 0xff]);
        }
        Self::from_rgba(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for SlideImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlideImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
