//! Overlay drawing primitives for annotated frames.
//!
//! Purely cosmetic: boxes and label strips drawn straight into the RGB
//! pixel buffer. All coordinates are clipped to the frame.

use crate::frame::Frame;

pub type Color = [u8; 3];

pub const MATCH_COLOR: Color = [0, 255, 0];
pub const ALERT_COLOR: Color = [255, 0, 0];

const BOX_THICKNESS: i32 = 2;
const LABEL_STRIP_HEIGHT: i32 = 24;

/// Draw a rectangle outline.
pub fn draw_rect(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Color) {
    for t in 0..BOX_THICKNESS {
        fill_rect(frame, x, y + t, w, 1, color); // top
        fill_rect(frame, x, y + h - 1 - t, w, 1, color); // bottom
        fill_rect(frame, x + t, y, 1, h, color); // left
        fill_rect(frame, x + w - 1 - t, y, 1, h, color); // right
    }
}

/// Fill a rectangle, clipped to the frame bounds.
pub fn fill_rect(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Color) {
    if w <= 0 || h <= 0 {
        return;
    }
    let fw = frame.width as i32;
    let fh = frame.height as i32;

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(fw);
    let y1 = (y + h).min(fh);

    for py in y0..y1 {
        for px in x0..x1 {
            let off = (py as usize * frame.width as usize + px as usize) * 3;
            frame.data[off..off + 3].copy_from_slice(&color);
        }
    }
}

/// Annotate one face: outline box plus a filled label strip along the
/// bottom edge (where a windowed front-end would print the name).
pub fn draw_face_box(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: Color) {
    draw_rect(frame, x, y, w, h, color);
    fill_rect(frame, x, y + h - LABEL_STRIP_HEIGHT, w, LABEL_STRIP_HEIGHT, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> Frame {
        Frame {
            data: vec![0u8; (w * h * 3) as usize],
            width: w,
            height: h,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let off = ((y * frame.width + x) * 3) as usize;
        [frame.data[off], frame.data[off + 1], frame.data[off + 2]]
    }

    #[test]
    fn test_fill_rect_inside() {
        let mut f = blank(10, 10);
        fill_rect(&mut f, 2, 3, 4, 2, MATCH_COLOR);
        assert_eq!(pixel(&f, 2, 3), MATCH_COLOR);
        assert_eq!(pixel(&f, 5, 4), MATCH_COLOR);
        assert_eq!(pixel(&f, 1, 3), [0, 0, 0]);
        assert_eq!(pixel(&f, 6, 3), [0, 0, 0]);
    }

    #[test]
    fn test_fill_rect_clips_to_frame() {
        let mut f = blank(8, 8);
        // Partially off-frame on every side; must not panic.
        fill_rect(&mut f, -4, -4, 100, 100, ALERT_COLOR);
        assert_eq!(pixel(&f, 0, 0), ALERT_COLOR);
        assert_eq!(pixel(&f, 7, 7), ALERT_COLOR);
    }

    #[test]
    fn test_fill_rect_fully_outside_is_noop() {
        let mut f = blank(8, 8);
        fill_rect(&mut f, 50, 50, 10, 10, ALERT_COLOR);
        fill_rect(&mut f, -20, -20, 5, 5, ALERT_COLOR);
        assert!(f.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_rect_outline_leaves_center() {
        let mut f = blank(20, 20);
        draw_rect(&mut f, 2, 2, 16, 16, MATCH_COLOR);
        assert_eq!(pixel(&f, 2, 2), MATCH_COLOR);
        // Interior beyond the 2px border stays untouched.
        assert_eq!(pixel(&f, 10, 10), [0, 0, 0]);
    }

    #[test]
    fn test_draw_face_box_has_label_strip() {
        let mut f = blank(64, 64);
        draw_face_box(&mut f, 10, 10, 40, 40, MATCH_COLOR);
        // Inside the bottom strip.
        assert_eq!(pixel(&f, 30, 45), MATCH_COLOR);
        // Above the strip, inside the outline: untouched.
        assert_eq!(pixel(&f, 30, 20), [0, 0, 0]);
    }
}
