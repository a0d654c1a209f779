/// An axis-aligned face bounding box in the pixel space of the frame it
/// was detected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Builds a region from floating-point corner coordinates, clamped to
    /// the frame bounds. Returns `None` when the clamped box has no area.
    pub fn from_corners(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let x1 = x1.max(0.0);
        let y1 = y1.max(0.0);
        let x2 = x2.min(frame_width as f32);
        let y2 = y2.min(frame_height as f32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}
