use std::fmt;

/// Pixel layouts a capture stream can deliver.
///
/// `Nv12` is the planar 4:2:0 layout the face detector consumes: a full
/// luma plane followed by a half-resolution interleaved chroma plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Nv12,
    Rgb24,
    Bgra32,
}

impl PixelFormat {
    /// Byte length of one frame at the given resolution.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let w = width as usize;
        let h = height as usize;
        match self {
            PixelFormat::Nv12 => w * h + 2 * (w.div_ceil(2) * h.div_ceil(2)),
            PixelFormat::Rgb24 => w * h * 3,
            PixelFormat::Bgra32 => w * h * 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Nv12 => "NV12",
            PixelFormat::Rgb24 => "RGB24",
            PixelFormat::Bgra32 => "BGRA32",
        };
        f.write_str(name)
    }
}

/// A single captured frame: pixel bytes in the layout `format` describes.
///
/// A frame is created for one detection cycle and dropped when that cycle
/// ends; nothing retains pixel data across cycles.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    format: PixelFormat,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, format: PixelFormat, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            format.buffer_len(width, height),
            "data length must match format and dimensions"
        );
        Self {
            data,
            format,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma plane of an `Nv12` frame, `None` for packed formats.
    pub fn luma_plane(&self) -> Option<&[u8]> {
        match self.format {
            PixelFormat::Nv12 => Some(&self.data[..self.width as usize * self.height as usize]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::nv12(PixelFormat::Nv12, 320, 240, 115_200)]
    #[case::nv12_tiny(PixelFormat::Nv12, 2, 2, 6)]
    #[case::nv12_odd(PixelFormat::Nv12, 3, 3, 17)]
    #[case::rgb24(PixelFormat::Rgb24, 320, 240, 230_400)]
    #[case::bgra32(PixelFormat::Bgra32, 320, 240, 307_200)]
    fn test_buffer_len(
        #[case] format: PixelFormat,
        #[case] width: u32,
        #[case] height: u32,
        #[case] expected: usize,
    ) {
        assert_eq!(format.buffer_len(width, height), expected);
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; PixelFormat::Rgb24.buffer_len(4, 2)];
        let frame = Frame::new(data.clone(), PixelFormat::Rgb24, 4, 2);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.format(), PixelFormat::Rgb24);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_luma_plane_of_nv12_frame() {
        let mut data = vec![0u8; PixelFormat::Nv12.buffer_len(4, 2)];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let frame = Frame::new(data, PixelFormat::Nv12, 4, 2);
        assert_eq!(frame.luma_plane(), Some(&[1, 2, 3, 4, 5, 6, 7, 8][..]));
    }

    #[test]
    fn test_luma_plane_absent_for_packed_formats() {
        let frame = Frame::new(vec![0u8; 12], PixelFormat::Rgb24, 2, 2);
        assert!(frame.luma_plane().is_none());
    }

    #[test]
    #[should_panic(expected = "data length must match format and dimensions")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], PixelFormat::Rgb24, 2, 2);
    }

    #[test]
    fn test_format_display_names() {
        assert_eq!(PixelFormat::Nv12.to_string(), "NV12");
        assert_eq!(PixelFormat::Rgb24.to_string(), "RGB24");
        assert_eq!(PixelFormat::Bgra32.to_string(), "BGRA32");
    }
}
