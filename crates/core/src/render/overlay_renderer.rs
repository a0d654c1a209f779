use crate::shared::detection_result::DetectionResult;

/// RGBA color for overlay primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    pub const YELLOW: Color = Color {
        r: 255,
        g: 255,
        b: 0,
        a: 255,
    };
}

/// A rectangle primitive in display-surface coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

/// Visual style applied to every face box.
#[derive(Clone, Copy, Debug)]
pub struct BoxStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            fill: Color::TRANSPARENT,
            stroke: Color::YELLOW,
            stroke_width: 2.0,
        }
    }
}

/// Owns the overlay drawn over the live preview.
///
/// Every `render` call replaces the whole shape list, so boxes from an
/// earlier cycle never linger. Must only be driven from the thread that
/// owns the display surface.
pub struct OverlayRenderer {
    shapes: Vec<RectShape>,
    style: BoxStyle,
}

impl OverlayRenderer {
    pub fn new(style: BoxStyle) -> Self {
        Self {
            shapes: Vec::new(),
            style,
        }
    }

    /// Projects one cycle's detections onto a display of the given size.
    ///
    /// Face coordinates are divided by the per-axis frame/display scale
    /// factor. A zero-area display clears the overlay and draws nothing;
    /// so does an empty face list.
    pub fn render(&mut self, result: &DetectionResult, display_width: f64, display_height: f64) {
        self.shapes.clear();

        if result.faces.is_empty()
            || display_width <= 0.0
            || display_height <= 0.0
            || result.frame_width == 0
            || result.frame_height == 0
        {
            return;
        }

        let scale_x = result.frame_width as f64 / display_width;
        let scale_y = result.frame_height as f64 / display_height;

        for face in &result.faces {
            self.shapes.push(RectShape {
                x: face.x as f64 / scale_x,
                y: face.y as f64 / scale_y,
                width: face.width as f64 / scale_x,
                height: face.height as f64 / scale_y,
                fill: self.style.fill,
                stroke: self.style.stroke,
                stroke_width: self.style.stroke_width,
            });
        }
    }

    /// Current overlay, in the order the faces were reported.
    pub fn shapes(&self) -> &[RectShape] {
        &self.shapes
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(BoxStyle::default())
    }
}
