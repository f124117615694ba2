//! Label text rasterized with `fontdue` from an embedded DejaVu Sans Bold
//!
//! The font is compiled into the binary so labels look the same on every
//! host, including headless machines with no fonts installed.

use std::sync::OnceLock;

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

static LABEL_FONT: OnceLock<Option<Font>> = OnceLock::new();

/// The embedded label font, parsed on first use
fn label_font() -> Option<&'static Font> {
    LABEL_FONT
        .get_or_init(|| match Font::from_bytes(FONT_BYTES, FontSettings::default()) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(error = e, "embedded label font failed to parse; labels disabled");
                None
            }
        })
        .as_ref()
}

/// Height of one line of text at `px`, ascent to descent
pub fn line_height(px: f32) -> u32 {
    label_font()
        .and_then(|font| font.horizontal_line_metrics(px))
        .map_or(px, |m| m.ascent - m.descent)
        .ceil() as u32
}

/// Width of `text` at `px`, summed advances
pub fn text_width(text: &str, px: f32) -> u32 {
    let Some(font) = label_font() else {
        return 0;
    };
    text.chars()
        .map(|c| font.metrics(c, px).advance_width)
        .sum::<f32>()
        .ceil() as u32
}

/// Draw `text` with the top of its line box at `(x, y)`
///
/// Glyph coverage is blended over the existing pixels. Anything outside the
/// image is clipped.
pub fn draw_text(image: &mut RgbaImage, x: u32, y: u32, text: &str, px: f32, color: Rgba<u8>) {
    let Some(font) = label_font() else {
        return;
    };
    let ascent = font
        .horizontal_line_metrics(px)
        .map_or(px, |m| m.ascent);
    let baseline = y as f32 + ascent;
    let mut pen_x = x as f32;

    for c in text.chars() {
        let (metrics, coverage) = font.rasterize(c, px);
        let left = (pen_x.round() as i64) + i64::from(metrics.xmin);
        let top = (baseline.round() as i64) - i64::from(metrics.ymin) - metrics.height as i64;

        for (row, line) in coverage.chunks(metrics.width.max(1)).enumerate() {
            for (col, &alpha) in line.iter().enumerate() {
                if alpha == 0 {
                    continue;
                }
                let px_x = left + col as i64;
                let px_y = top + row as i64;
                if px_x < 0 || px_y < 0 {
                    continue;
                }
                let (px_x, px_y) = (px_x as u32, px_y as u32);
                if px_x < image.width() && px_y < image.height() {
                    blend(image.get_pixel_mut(px_x, px_y), color, alpha);
                }
            }
        }

        pen_x += metrics.advance_width;
    }
}

fn blend(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: u8) {
    let a = u16::from(coverage);
    for i in 0..3 {
        let mixed = (u16::from(color.0[i]) * a + u16::from(dst.0[i]) * (255 - a)) / 255;
        dst.0[i] = mixed as u8;
    }
    dst.0[3] = dst.0[3].max(coverage);
}
