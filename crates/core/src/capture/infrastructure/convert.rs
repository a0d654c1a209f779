//! Pixel-layout conversions between the camera's decoded RGB output and
//! the formats the rest of the pipeline consumes.

/// Converts packed RGB24 into planar NV12 (BT.601 full range).
///
/// Chroma is averaged over each 2x2 block before conversion. Odd frame
/// edges reuse the pixels that exist.
pub fn rgb_to_nv12(rgb: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(rgb.len(), w * h * 3, "rgb buffer size mismatch");

    let chroma_stride = 2 * w.div_ceil(2);
    let mut out = vec![0u8; w * h + chroma_stride * h.div_ceil(2)];

    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 3;
            let (r, g, b) = (rgb[i] as f32, rgb[i + 1] as f32, rgb[i + 2] as f32);
            out[y * w + x] = clamp_u8(0.299 * r + 0.587 * g + 0.114 * b);
        }
    }

    let chroma_base = w * h;
    for by in (0..h).step_by(2) {
        for bx in (0..w).step_by(2) {
            let (mut r, mut g, mut b, mut n) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
            for dy in 0..2 {
                for dx in 0..2 {
                    let (px, py) = (bx + dx, by + dy);
                    if px < w && py < h {
                        let i = (py * w + px) * 3;
                        r += rgb[i] as f32;
                        g += rgb[i + 1] as f32;
                        b += rgb[i + 2] as f32;
                        n += 1.0;
                    }
                }
            }
            let (r, g, b) = (r / n, g / n, b / n);
            let ci = chroma_base + (by / 2) * chroma_stride + (bx / 2) * 2;
            out[ci] = clamp_u8(-0.169 * r - 0.331 * g + 0.5 * b + 128.0);
            out[ci + 1] = clamp_u8(0.5 * r - 0.419 * g - 0.081 * b + 128.0);
        }
    }

    out
}

/// Converts packed RGB24 into packed BGRA32 with opaque alpha.
pub fn rgb_to_bgra(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[2], px[1], px[0], 255]);
    }
    out
}

/// Packs RGB24 bytes into `0x00RRGGBB` words for a framebuffer window.
pub fn pack_rgb(rgb: &[u8]) -> Vec<u32> {
    rgb.chunks_exact(3)
        .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32)
        .collect()
}

fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use rstest::rstest;

    fn solid_rgb(r: u8, g: u8, b: u8, width: u32, height: u32) -> Vec<u8> {
        [r, g, b].repeat((width * height) as usize)
    }

    #[rstest]
    #[case::white(255, 255, 255, 255, 128, 128)]
    #[case::black(0, 0, 0, 0, 128, 128)]
    #[case::red(255, 0, 0, 76, 85, 255)]
    #[case::green(0, 255, 0, 150, 44, 21)]
    fn test_rgb_to_nv12_known_colors(
        #[case] r: u8,
        #[case] g: u8,
        #[case] b: u8,
        #[case] y: u8,
        #[case] u: u8,
        #[case] v: u8,
    ) {
        let nv12 = rgb_to_nv12(&solid_rgb(r, g, b, 4, 4), 4, 4);
        assert_eq!(nv12[0], y);
        assert_eq!(nv12[16], u);
        assert_eq!(nv12[17], v);
    }

    #[test]
    fn test_rgb_to_nv12_buffer_length() {
        let nv12 = rgb_to_nv12(&solid_rgb(10, 20, 30, 320, 240), 320, 240);
        assert_eq!(nv12.len(), PixelFormat::Nv12.buffer_len(320, 240));
    }

    #[test]
    fn test_rgb_to_nv12_odd_dimensions() {
        let nv12 = rgb_to_nv12(&solid_rgb(128, 128, 128, 3, 3), 3, 3);
        assert_eq!(nv12.len(), PixelFormat::Nv12.buffer_len(3, 3));
        // All-gray input keeps chroma neutral at the partial edge blocks.
        assert!(nv12[9..].iter().all(|&c| c == 128));
    }

    #[test]
    fn test_rgb_to_bgra_reorders_and_sets_alpha() {
        let bgra = rgb_to_bgra(&[10, 20, 30, 40, 50, 60]);
        assert_eq!(bgra, vec![30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn test_pack_rgb() {
        let packed = pack_rgb(&[0x12, 0x34, 0x56, 0xFF, 0x00, 0x7F]);
        assert_eq!(packed, vec![0x0012_3456, 0x00FF_007F]);
    }
}
