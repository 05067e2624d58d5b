//! Drawing overlays onto camera frames.
//!
//! Drawing is always an explicit step; the extractor never touches the frame
//! it was given.

use image::Rgb;

use crate::camera::RgbFrame;
use crate::landmark::{HandPose, CONNECTIVITY};

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const GRAY: Rgb<u8> = Rgb([170, 170, 170]);

/// Draws the hand skeleton (connectivity edges plus landmark markers) onto
/// `frame`. Landmark positions are normalized; they are scaled to the frame
/// here.
pub fn skeleton(frame: &mut RgbFrame, pose: &HandPose) {
    let (w, h) = (frame.width() as f32, frame.height() as f32);
    for (a, b) in CONNECTIVITY {
        let pa = pose.position(*a);
        let pb = pose.position(*b);
        line(
            frame,
            (pa[0] * w) as i32,
            (pa[1] * h) as i32,
            (pb[0] * w) as i32,
            (pb[1] * h) as i32,
            GREEN,
        );
    }
    for pos in pose.positions() {
        marker(frame, (pos[0] * w) as i32, (pos[1] * h) as i32, RED);
    }
}

/// Draws a line between two points, clipped to the frame.
pub fn line(frame: &mut RgbFrame, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = x0 as f32 + (x1 - x0) as f32 * t;
        let y = y0 as f32 + (y1 - y0) as f32 * t;
        put_pixel(frame, x as i32, y as i32, color);
    }
}

/// Draws a 3×3 marker centered on a point.
pub fn marker(frame: &mut RgbFrame, x: i32, y: i32, color: Rgb<u8>) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            put_pixel(frame, x + dx, y + dy, color);
        }
    }
}

fn put_pixel(frame: &mut RgbFrame, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

/// Draws a line of text using a 3×5 bitmap font.
///
/// Supports uppercase letters, digits, and a little punctuation; anything
/// else renders as a filled block. Lowercase input is drawn uppercase.
pub fn text(frame: &mut RgbFrame, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: i32) {
    let mut cx = x;
    for c in text.chars() {
        glyph(frame, cx, y, c, color, scale);
        cx += 4 * scale; // 3 columns + 1 column spacing
    }
}

/// Pixel height of text drawn at `scale`, including one row of spacing.
pub fn text_height(scale: i32) -> i32 {
    6 * scale
}

fn glyph(frame: &mut RgbFrame, x: i32, y: i32, c: char, color: Rgb<u8>, scale: i32) {
    // Each glyph is 5 rows of 3 bits, most significant bit on the left.
    let rows: [u8; 5] = match c.to_ascii_uppercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'B' => [0x6, 0x5, 0x6, 0x5, 0x6],
        'C' => [0x7, 0x4, 0x4, 0x4, 0x7],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x7, 0x4, 0x5, 0x5, 0x7],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'J' => [0x7, 0x1, 0x1, 0x5, 0x2],
        'K' => [0x5, 0x5, 0x6, 0x5, 0x5],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x5, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x7, 0x5, 0x5, 0x5, 0x7],
        'P' => [0x7, 0x5, 0x7, 0x4, 0x4],
        'Q' => [0x7, 0x5, 0x5, 0x7, 0x1],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'U' => [0x5, 0x5, 0x5, 0x5, 0x7],
        'V' => [0x5, 0x5, 0x5, 0x5, 0x2],
        'W' => [0x5, 0x5, 0x5, 0x7, 0x5],
        'X' => [0x5, 0x5, 0x2, 0x5, 0x5],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        'Z' => [0x7, 0x1, 0x2, 0x4, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        ',' => [0x0, 0x0, 0x0, 0x2, 0x4],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '%' => [0x5, 0x1, 0x2, 0x4, 0x5],
        '[' => [0x7, 0x4, 0x4, 0x4, 0x7],
        ']' => [0x7, 0x1, 0x1, 0x1, 0x7],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    };

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..3 {
            if bits & (0x4 >> col) == 0 {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    put_pixel(
                        frame,
                        x + col * scale + sx,
                        y + row as i32 * scale + sy,
                        color,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{HandPose, LANDMARK_COUNT};

    #[test]
    fn drawing_off_frame_does_not_panic() {
        let mut frame = RgbFrame::new(32, 32);
        line(&mut frame, -10, -10, 100, 100, GREEN);
        marker(&mut frame, -5, 40, RED);
        text(&mut frame, 28, 28, "RF: A", WHITE, 2);
    }

    #[test]
    fn skeleton_marks_landmark_pixels() {
        let mut frame = RgbFrame::new(64, 64);
        let positions = [[0.5, 0.5, 0.0]; LANDMARK_COUNT];
        let pose = HandPose::new(positions, 1.0, 0.0);
        skeleton(&mut frame, &pose);
        assert_eq!(*frame.get_pixel(32, 32), RED);
    }
}
