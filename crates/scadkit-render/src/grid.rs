//! Compositing rendered views into one labeled grid image

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use scadkit_core::ImageSize;

use crate::font;

const BACKGROUND: Rgba<u8> = Rgba([34, 34, 40, 255]);
const LABEL_BACKGROUND: Rgba<u8> = Rgba([18, 18, 22, 255]);
const LABEL_COLOR: Rgba<u8> = Rgba([235, 235, 235, 255]);
const BORDER_COLOR: Rgba<u8> = Rgba([96, 96, 110, 255]);

/// Geometry of the composite image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    /// Size of the rendered image inside each cell
    pub cell: ImageSize,
    /// Height of the label strip under each image
    pub label_height: u32,
    /// Border thickness around each cell
    pub border: u32,
    /// Label font size in pixels
    pub text_px: f32,
}

impl GridLayout {
    /// 4×4 grid used by the views matrix
    pub fn matrix(cell: ImageSize) -> Self {
        let text_px = 18.0;
        Self {
            columns: 4,
            rows: 4,
            cell,
            label_height: font::line_height(text_px) + 10,
            border: 2,
            text_px,
        }
    }

    pub fn capacity(&self) -> usize {
        (self.columns * self.rows) as usize
    }

    /// Outer size of one cell including border and label strip
    pub fn cell_outer(&self) -> (u32, u32) {
        (
            self.cell.width + 2 * self.border,
            self.cell.height + self.label_height + 2 * self.border,
        )
    }

    /// Size of the whole composite
    pub fn canvas_size(&self) -> (u32, u32) {
        let (w, h) = self.cell_outer();
        (w * self.columns, h * self.rows)
    }
}

/// Composite `cells` row-major into a grid; unused cells stay blank
///
/// Images that do not match the layout's cell size are resized. Cells past
/// the grid's capacity are ignored.
pub fn compose(cells: &[(&str, RgbaImage)], layout: &GridLayout) -> RgbaImage {
    let (canvas_w, canvas_h) = layout.canvas_size();
    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, BACKGROUND);
    let (outer_w, outer_h) = layout.cell_outer();

    for (index, (label, image)) in cells.iter().take(layout.capacity()).enumerate() {
        let index = index as u32;
        let x0 = (index % layout.columns) * outer_w;
        let y0 = (index / layout.columns) * outer_h;

        draw_border(&mut canvas, x0, y0, outer_w, outer_h, layout.border);

        let inner_x = x0 + layout.border;
        let inner_y = y0 + layout.border;

        if image.dimensions() == (layout.cell.width, layout.cell.height) {
            imageops::overlay(&mut canvas, image, i64::from(inner_x), i64::from(inner_y));
        } else {
            let resized = imageops::resize(
                image,
                layout.cell.width,
                layout.cell.height,
                FilterType::Triangle,
            );
            imageops::overlay(&mut canvas, &resized, i64::from(inner_x), i64::from(inner_y));
        }

        let strip_y = inner_y + layout.cell.height;
        fill_rect(
            &mut canvas,
            inner_x,
            strip_y,
            layout.cell.width,
            layout.label_height,
            LABEL_BACKGROUND,
        );

        let text_w = font::text_width(label, layout.text_px);
        let text_h = font::line_height(layout.text_px);
        let text_x = inner_x + layout.cell.width.saturating_sub(text_w) / 2;
        let text_y = strip_y + layout.label_height.saturating_sub(text_h) / 2;
        font::draw_text(&mut canvas, text_x, text_y, label, layout.text_px, LABEL_COLOR);
    }

    canvas
}

fn draw_border(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, thickness: u32) {
    if thickness == 0 {
        return;
    }
    fill_rect(canvas, x, y, w, thickness, BORDER_COLOR);
    fill_rect(canvas, x, y + h - thickness, w, thickness, BORDER_COLOR);
    fill_rect(canvas, x, y, thickness, h, BORDER_COLOR);
    fill_rect(canvas, x + w - thickness, y, thickness, h, BORDER_COLOR);
}

/// Fill a rectangle, clipped to the image
fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(w).min(image.width());
    let y_end = y.saturating_add(h).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}
