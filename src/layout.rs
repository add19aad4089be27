//! Page-local layout in millimetres, origin top-left, on an A4 canvas.
//!
//! [`LayoutCursor`] is a plain value: composers hand it to a primitive and get a
//! new one back. It never outlives the page it was created for.

use crate::canvas::Canvas;
use crate::font::{Font, measure_text_width, wrap_text};
use crate::score::{Rgb, clamp_score, palette, score_color};
use crate::types::{Color, Pt};
use crate::view::format_number;
use tracing::debug;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 18.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - MARGIN_MM * 2.0;
pub const BRAND_HEIGHT_MM: f32 = 22.0;
pub const CONTENT_TOP_MM: f32 = BRAND_HEIGHT_MM + 10.0;
pub const TOTAL_PAGES: usize = 5;

pub const SECTION_TITLE_ADVANCE_MM: f32 = 12.0;
pub const PILL_WIDTH_MM: f32 = 22.0;
pub const PILL_HEIGHT_MM: f32 = 8.0;

pub fn mm(value: f32) -> Pt {
    Pt::from_mm(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page_number: usize,
    pub total_pages: usize,
    pub x: f32,
    pub y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub bottom_safety_margin: f32,
}

impl LayoutCursor {
    /// Cursor at the top of the content area, below the branded header.
    pub fn new(page_number: usize, bottom_safety_margin: f32) -> Self {
        debug_assert!((1..=TOTAL_PAGES).contains(&page_number));
        Self {
            page_number: page_number.clamp(1, TOTAL_PAGES),
            total_pages: TOTAL_PAGES,
            x: MARGIN_MM,
            y: CONTENT_TOP_MM,
            page_width: PAGE_WIDTH_MM,
            page_height: PAGE_HEIGHT_MM,
            margin: MARGIN_MM,
            bottom_safety_margin,
        }
    }

    pub fn at(self, y: f32) -> Self {
        Self { y, ..self }
    }

    pub fn advance(self, dy: f32) -> Self {
        self.at(self.y + dy)
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin * 2.0
    }

    pub fn right_edge(&self) -> f32 {
        self.page_width - self.margin
    }

    /// Lowest y at which a list row may still start.
    pub fn safety_limit(&self) -> f32 {
        self.page_height - self.bottom_safety_margin
    }

    pub fn in_safety_zone(&self) -> bool {
        self.y > self.safety_limit()
    }

    /// True when a block starting `offset` below the cursor begins above the
    /// safety zone.
    pub fn has_room_at(&self, offset: f32) -> bool {
        !self.advance(offset).in_safety_zone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: f32,
    pub font: Font,
    pub color: Rgb,
    pub align: Align,
}

impl TextStyle {
    pub fn regular(size: f32, color: Rgb) -> Self {
        Self {
            size,
            font: Font::Helvetica,
            color,
            align: Align::Left,
        }
    }

    pub fn bold(size: f32, color: Rgb) -> Self {
        Self {
            font: Font::HelveticaBold,
            ..Self::regular(size, color)
        }
    }

    pub fn weight(self, bold: bool) -> Self {
        Self {
            font: Font::for_weight(bold),
            ..self
        }
    }

    pub fn centered(self) -> Self {
        Self {
            align: Align::Center,
            ..self
        }
    }

    pub fn right(self) -> Self {
        Self {
            align: Align::Right,
            ..self
        }
    }
}

/// Width of `text` in millimetres.
pub fn text_width(text: &str, style: &TextStyle) -> f32 {
    measure_text_width(style.font, Pt::from_f32(style.size), text).to_mm()
}

/// Draws one line of text with its baseline at `y`; `x` is the anchor for the
/// style's alignment.
pub fn text(canvas: &mut Canvas, x: f32, y: f32, content: &str, style: &TextStyle) {
    if content.is_empty() {
        return;
    }
    let left = match style.align {
        Align::Left => x,
        Align::Center => x - text_width(content, style) / 2.0,
        Align::Right => x - text_width(content, style),
    };
    canvas.set_fill_color(style.color.into());
    canvas.set_font(style.font);
    canvas.set_font_size(Pt::from_f32(style.size));
    canvas.draw_string(mm(left), mm(y), content);
}

/// Draws pre-wrapped lines starting at baseline `y`, `line_height` apart.
pub fn text_lines(
    canvas: &mut Canvas,
    x: f32,
    y: f32,
    lines: &[String],
    line_height: f32,
    style: &TextStyle,
) {
    for (index, line) in lines.iter().enumerate() {
        text(canvas, x, y + index as f32 * line_height, line, style);
    }
}

pub fn wrap(content: &str, width: f32, style: &TextStyle) -> Vec<String> {
    wrap_text(style.font, Pt::from_f32(style.size), content, mm(width))
}

/// Keeps the wrapped lines whose baselines start above the safety zone. The
/// first line is always kept; when lines are cut the last kept one ends in "…".
pub fn fit_lines(cursor: LayoutCursor, mut lines: Vec<String>, line_height: f32) -> Vec<String> {
    let fit = (1..lines.len())
        .take_while(|index| cursor.has_room_at(*index as f32 * line_height))
        .count()
        + 1;
    if fit < lines.len() {
        lines.truncate(fit);
        if let Some(last) = lines.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
            last.push('\u{2026}');
        }
    }
    lines
}

/// Cuts `content` to `max_chars` characters, appending `marker` when it was cut.
pub fn truncate(content: &str, max_chars: usize, marker: &str) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut out: String = content.chars().take(max_chars).collect();
    out.push_str(marker);
    out
}

pub fn fill_rect(canvas: &mut Canvas, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
    canvas.set_fill_color(fill.into());
    canvas.draw_rect(mm(x), mm(y), mm(width), mm(height));
}

pub fn fill_rounded_rect(
    canvas: &mut Canvas,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
    fill: Rgb,
) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    canvas.set_fill_color(fill.into());
    canvas.rounded_rect_path(mm(x), mm(y), mm(width), mm(height), mm(radius));
    canvas.fill();
}

pub fn fill_circle(canvas: &mut Canvas, cx: f32, cy: f32, radius: f32, fill: Rgb) {
    canvas.set_fill_color(fill.into());
    canvas.circle_path(mm(cx), mm(cy), mm(radius));
    canvas.fill();
}

pub fn fill_triangle(canvas: &mut Canvas, points: [(f32, f32); 3], fill: Rgb) {
    canvas.set_fill_color(fill.into());
    canvas.move_to(mm(points[0].0), mm(points[0].1));
    canvas.line_to(mm(points[1].0), mm(points[1].1));
    canvas.line_to(mm(points[2].0), mm(points[2].1));
    canvas.close_path();
    canvas.fill();
}

pub fn line(canvas: &mut Canvas, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
    canvas.set_stroke_color(color.into());
    canvas.set_line_width(mm(width));
    canvas.move_to(mm(from.0), mm(from.1));
    canvas.line_to(mm(to.0), mm(to.1));
    canvas.stroke();
}

/// Generic rounded background behind a line item.
pub fn row_band(canvas: &mut Canvas, x: f32, y: f32, width: f32, height: f32, fill: Rgb) {
    fill_rounded_rect(canvas, x, y, width, height, 2.0, fill);
}

/// Accent tab plus bold heading. Returns the cursor moved past the title.
pub fn section_title(
    canvas: &mut Canvas,
    cursor: LayoutCursor,
    label: &str,
    accent: Rgb,
) -> LayoutCursor {
    fill_rect(canvas, cursor.margin, cursor.y, 3.0, 6.0, accent);
    text(
        canvas,
        cursor.margin + 6.0,
        cursor.y + 5.0,
        label,
        &TextStyle::bold(11.0, palette::INK),
    );
    cursor.advance(SECTION_TITLE_ADVANCE_MM)
}

/// Score badge whose bottom edge sits 2 mm below baseline `y`. Returns the x
/// just right of the badge.
pub fn score_pill(canvas: &mut Canvas, score: f64, x: f32, y: f32) -> f32 {
    let score = clamp_score(score);
    fill_rounded_rect(
        canvas,
        x,
        y - 6.0,
        PILL_WIDTH_MM,
        PILL_HEIGHT_MM,
        2.0,
        score_color(score),
    );
    text(
        canvas,
        x + PILL_WIDTH_MM / 2.0,
        y - 0.5,
        &format_number(score),
        &TextStyle::bold(9.0, palette::WHITE).centered(),
    );
    x + PILL_WIDTH_MM + 2.0
}

/// Gray track with a score-colored fill proportional to `score / 100`.
pub fn progress_bar(canvas: &mut Canvas, score: f64, x: f32, y: f32, width: f32, height: f32) {
    let score = clamp_score(score);
    fill_rounded_rect(canvas, x, y, width, height, 1.0, palette::TRACK);
    let filled = width * (score / 100.0) as f32;
    fill_rounded_rect(canvas, x, y, filled, height, 1.0, score_color(score));
}

/// Vector check mark (pass) or cross (fail), sitting on baseline `y`.
pub fn status_icon(canvas: &mut Canvas, pass: bool, x: f32, y: f32) {
    canvas.set_line_cap(1);
    if pass {
        let color = palette::GREEN;
        canvas.set_stroke_color(Color::from(color));
        canvas.set_line_width(mm(0.5));
        canvas.move_to(mm(x), mm(y - 1.4));
        canvas.line_to(mm(x + 1.0), mm(y - 0.3));
        canvas.line_to(mm(x + 3.0), mm(y - 2.9));
        canvas.stroke();
    } else {
        let color = palette::RED;
        line(canvas, (x + 0.2, y - 2.8), (x + 2.6, y - 0.4), 0.5, color);
        line(canvas, (x + 0.2, y - 0.4), (x + 2.6, y - 2.8), 0.5, color);
    }
}

/// Small gray note under a list whose tail was dropped.
pub fn overflow_marker(canvas: &mut Canvas, cursor: LayoutCursor, dropped: usize) -> LayoutCursor {
    let label = if dropped == 1 {
        "+1 more item not shown".to_string()
    } else {
        format!("+{dropped} more items not shown")
    };
    text(
        canvas,
        cursor.margin,
        cursor.y + 3.0,
        &label,
        &TextStyle::regular(7.0, palette::MUTED),
    );
    cursor.advance(5.0)
}

/// Draws `items` one row at a time. Before each row the cursor is checked
/// against the bottom safety zone; once inside it the remaining rows are dropped
/// and, when `marker` is set, a "+N more" note is drawn in their place.
pub fn bounded_rows<T>(
    canvas: &mut Canvas,
    mut cursor: LayoutCursor,
    items: &[T],
    marker: bool,
    list: &str,
    mut draw: impl FnMut(&mut Canvas, LayoutCursor, &T) -> LayoutCursor,
) -> LayoutCursor {
    for (index, item) in items.iter().enumerate() {
        if cursor.in_safety_zone() {
            let dropped = items.len() - index;
            debug!(
                page_number = cursor.page_number,
                list,
                dropped,
                y = cursor.y,
                "overflow: dropping rows"
            );
            if marker {
                cursor = overflow_marker(canvas, cursor, dropped);
            }
            return cursor;
        }
        cursor = draw(canvas, cursor, item);
    }
    cursor
}
