//! Page layout arithmetic
//!
//! Everything here is pure: given the visible size of a source page and the
//! ruling options, compute where the scaled page goes on the A4 canvas and
//! where the ruled lines are drawn.
//!
//! Coordinates use a top-left origin with y growing downward, matching how a
//! reader scans the page. The PDF backend flips them into user space.

use serde::Serialize;

use crate::error::{PdfNotesError, Result};
use crate::options::{NotesOptions, MIN_LINE_SPACING_CM};

/// PostScript points per centimeter
pub const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// ISO 216 A4 in portrait, 210 × 297 mm
pub const A4: Size = Size {
    width: 21.0 * POINTS_PER_CM,
    height: 29.7 * POINTS_PER_CM,
};

/// Guard against `2.9999999` flooring to 2 when counting lines
const LINE_COUNT_EPSILON: f64 = 1e-9;

pub fn cm_to_pt(cm: f64) -> f64 {
    cm * POINTS_PER_CM
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Swap width and height
    pub const fn landscape(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A horizontal guide line at height `y` running from `x_start` to `x_end`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuledLine {
    pub y: f64,
    pub x_start: f64,
    pub x_end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide
    Vertical,
    /// Wider than tall, or square
    Horizontal,
}

impl Orientation {
    pub fn of(size: Size) -> Self {
        if size.height > size.width {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    /// Canvas a page of this orientation is placed on.
    ///
    /// Vertical pages go side by side with the ruled strip, so they get the
    /// landscape sheet; horizontal pages stack above it on a portrait sheet.
    pub fn target(self) -> Size {
        match self {
            Orientation::Vertical => A4.landscape(),
            Orientation::Horizontal => A4,
        }
    }
}

/// Largest uniform scale that fits `source` inside `target`
pub fn fit_scale(source: Size, target: Size) -> f64 {
    (target.height / source.height).min(target.width / source.width)
}

/// Complete placement of one source page on its output page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub source: Size,
    pub orientation: Orientation,
    pub target: Size,
    pub scale: f64,
    /// Where the scaled page lands
    pub content: Rect,
    /// Everything on the target the content does not cover
    pub margin: Rect,
    /// Part of the margin that carries lines, after edge insets
    pub ruled_area: Rect,
    pub lines: Vec<RuledLine>,
}

impl PageLayout {
    /// Lay out a source page of the given visible size.
    ///
    /// The content rectangle is anchored at the top-left corner. For vertical
    /// pages it spans the full height and the margin is the strip on the
    /// right; for horizontal pages it spans the full width and the margin is
    /// the strip at the bottom.
    pub fn compute(source: Size, options: &NotesOptions) -> Result<Self> {
        options.validate()?;
        if !source.is_drawable() {
            return Err(PdfNotesError::Pdf(format!(
                "Page has degenerate size {} x {}",
                source.width, source.height
            )));
        }

        let orientation = Orientation::of(source);
        let target = orientation.target();
        let scale = fit_scale(source, target);
        let scaled = Size::new(source.width * scale, source.height * scale);
        let inset = cm_to_pt(options.inset_cm);

        let (content, margin, ruled_area) = match orientation {
            Orientation::Vertical => {
                let content = Rect::new(0.0, 0.0, scaled.width, target.height);
                let margin = Rect::new(
                    scaled.width,
                    0.0,
                    target.width - scaled.width,
                    target.height,
                );
                // Inset from the top, bottom and right page edges
                let ruled = Rect::new(
                    margin.x,
                    inset,
                    (target.width - inset - margin.x).max(0.0),
                    (target.height - 2.0 * inset).max(0.0),
                );
                (content, margin, ruled)
            }
            Orientation::Horizontal => {
                let content = Rect::new(0.0, 0.0, target.width, scaled.height);
                let margin = Rect::new(
                    0.0,
                    scaled.height,
                    target.width,
                    target.height - scaled.height,
                );
                // Inset from the left and right page edges only
                let ruled = Rect::new(
                    inset,
                    margin.y,
                    (target.width - 2.0 * inset).max(0.0),
                    margin.height.max(0.0),
                );
                (content, margin, ruled)
            }
        };

        let lines = rule_lines(ruled_area, cm_to_pt(options.line_spacing_cm));

        Ok(Self {
            source,
            orientation,
            target,
            scale,
            content,
            margin,
            ruled_area,
            lines,
        })
    }

    pub fn scaled_size(&self) -> Size {
        Size::new(self.source.width * self.scale, self.source.height * self.scale)
    }
}

/// Lines at `area.y + k * spacing` for every k that fits, `floor(h / spacing)` in total.
///
/// Spacings below the 1 mm minimum yield no lines.
pub fn rule_lines(area: Rect, spacing_pt: f64) -> Vec<RuledLine> {
    if area.is_empty() || !(spacing_pt >= cm_to_pt(MIN_LINE_SPACING_CM)) {
        return Vec::new();
    }

    let count = (area.height / spacing_pt + LINE_COUNT_EPSILON).floor() as usize;
    (0..count)
        .map(|k| RuledLine {
            y: area.y + k as f64 * spacing_pt,
            x_start: area.x,
            x_end: area.right(),
        })
        .collect()
}
