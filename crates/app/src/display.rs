use minifb::{Key, Window, WindowOptions};

use facetrack_core::capture::infrastructure::nokhwa_capture::PreviewHandle;
use facetrack_core::render::overlay_renderer::{OverlayRenderer, RectShape};
use facetrack_core::render::render_context::RenderQueue;
use facetrack_core::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};

/// Runs the preview window loop on the calling thread until the user
/// closes it (or presses Escape).
///
/// This thread owns the display surface: every overlay render happens
/// here, serialized with the rest of the drawing. The camera's blocking
/// frame delivery paces the loop at the stream rate.
pub fn run_window(
    preview: PreviewHandle,
    results: RenderQueue,
    window_scale: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let width = CAPTURE_WIDTH as usize * window_scale;
    let height = CAPTURE_HEIGHT as usize * window_scale;

    let mut window = Window::new("facetrack", width, height, WindowOptions::default())
        .map_err(|e| format!("window init failed: {e}"))?;
    let mut framebuf = vec![0u32; width * height];
    let mut overlay = OverlayRenderer::default();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        match preview.preview_pixels() {
            Ok((pixels, pw, ph)) => {
                blit_scaled(&pixels, pw as usize, ph as usize, &mut framebuf, width, height);
            }
            Err(e) => log::warn!("preview frame unavailable: {e}"),
        }

        // Keep the last overlay until a newer cycle replaces it.
        if let Some(result) = results.poll() {
            overlay.render(&result, width as f64, height as f64);
        }
        for shape in overlay.shapes() {
            draw_rect(&mut framebuf, width, height, shape);
        }

        window
            .update_with_buffer(&framebuf, width, height)
            .map_err(|e| format!("window update failed: {e}"))?;
    }

    Ok(())
}

/// Nearest-neighbor blit of the camera image into the window buffer.
fn blit_scaled(src: &[u32], src_w: usize, src_h: usize, dst: &mut [u32], dst_w: usize, dst_h: usize) {
    if src_w == 0 || src_h == 0 {
        return;
    }
    for y in 0..dst_h {
        let sy = (y * src_h / dst_h).min(src_h - 1);
        for x in 0..dst_w {
            let sx = (x * src_w / dst_w).min(src_w - 1);
            dst[y * dst_w + x] = src[sy * src_w + sx];
        }
    }
}

/// Draws one overlay rectangle: optional fill, then the stroked border.
fn draw_rect(fb: &mut [u32], fb_w: usize, fb_h: usize, shape: &RectShape) {
    let x0 = shape.x.round() as i64;
    let y0 = shape.y.round() as i64;
    let x1 = x0 + shape.width.round() as i64;
    let y1 = y0 + shape.height.round() as i64;

    if shape.fill.a != 0 {
        let fill = pack(shape.fill.r, shape.fill.g, shape.fill.b);
        fill_span(fb, fb_w, fb_h, x0, y0, x1, y1, fill);
    }

    if shape.stroke.a != 0 {
        let stroke = pack(shape.stroke.r, shape.stroke.g, shape.stroke.b);
        let t = (shape.stroke_width.round() as i64).max(1);
        fill_span(fb, fb_w, fb_h, x0, y0, x1, y0 + t, stroke);
        fill_span(fb, fb_w, fb_h, x0, y1 - t, x1, y1, stroke);
        fill_span(fb, fb_w, fb_h, x0, y0, x0 + t, y1, stroke);
        fill_span(fb, fb_w, fb_h, x1 - t, y0, x1, y1, stroke);
    }
}

/// Fills the pixel span `[x0, x1) x [y0, y1)`, clamped to the buffer.
fn fill_span(fb: &mut [u32], fb_w: usize, fb_h: usize, x0: i64, y0: i64, x1: i64, y1: i64, color: u32) {
    let x0 = x0.clamp(0, fb_w as i64) as usize;
    let y0 = y0.clamp(0, fb_h as i64) as usize;
    let x1 = x1.clamp(0, fb_w as i64) as usize;
    let y1 = y1.clamp(0, fb_h as i64) as usize;

    for y in y0..y1 {
        let row = y * fb_w;
        for px in &mut fb[row + x0..row + x1] {
            *px = color;
        }
    }
}

fn pack(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}
