use super::{ComposeContext, page_canvas};
use crate::canvas::{Canvas, Page};
use crate::layout::{self, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_WIDTH_MM, TextStyle};
use crate::score::{Rgb, palette};
use crate::view::{ContentView, ImagesView, format_number};

const STAT_GAP_MM: f32 = 6.0;
const STAT_HALF_W_MM: f32 = (CONTENT_WIDTH_MM - STAT_GAP_MM) / 2.0;
const STAT_ROW_MM: f32 = 12.0;

struct Stat {
    label: &'static str,
    value: String,
    good: bool,
}

fn content_stats(content: &ContentView) -> Vec<Stat> {
    let stat = |label: &'static str, value: String, good: bool| Stat { label, value, good };
    vec![
        stat("Word Count", format_number(content.word_count), content.word_count >= 500.0),
        stat("Sentences", format_number(content.sentence_count), true),
        stat(
            "Avg Sentence Length",
            format!("{} words", format_number(content.avg_sentence_length)),
            content.avg_sentence_length <= 20.0,
        ),
        stat(
            "Avg Paragraph Length",
            format!("{} words", format_number(content.avg_paragraph_length)),
            content.avg_paragraph_length <= 100.0,
        ),
        stat(
            "Content / Code Ratio",
            format!("{}%", format_number(content.content_to_code_ratio)),
            content.content_to_code_ratio >= 15.0,
        ),
        stat(
            "Flesch Reading Ease",
            format_number(content.reading_ease_score),
            content.reading_ease_score >= 60.0,
        ),
        stat("H1 Headings", format_number(content.h1_count), content.h1_count == 1.0),
        stat("H2 Headings", format_number(content.h2_count), content.h2_count > 0.0),
    ]
}

struct ImageIssue {
    label: &'static str,
    count: f64,
    threshold: f64,
}

impl ImageIssue {
    fn is_issue(&self) -> bool {
        self.count > self.threshold && self.count > 0.0
    }
}

fn image_issues(images: &ImagesView) -> [ImageIssue; 4] {
    let issue = |label: &'static str, count: f64, threshold: f64| ImageIssue {
        label,
        count,
        threshold,
    };
    [
        issue("Missing Alt Text", images.missing_alt, 0.0),
        issue("Missing Dimensions", images.missing_dimensions, 0.0),
        issue("No Lazy Loading", images.no_lazy_loading, 3.0),
        issue("Old Format (JPG/PNG)", images.old_format, 0.0),
    ]
}

pub fn compose(ctx: &ComposeContext<'_>) -> Page {
    let mut canvas = page_canvas(4);
    let view = ctx.view;
    let accent = ctx.accent();
    let note = TextStyle::regular(8.0, Rgb::gray(80));

    let mut cursor = layout::section_title(&mut canvas, ctx.cursor(4), "Content Quality", accent);
    let content = &view.content;
    layout::score_pill(&mut canvas, content.score, MARGIN_MM, cursor.y + 5.0);
    layout::text(
        &mut canvas,
        MARGIN_MM + 28.0,
        cursor.y + 2.0,
        content.reading_level.as_deref().unwrap_or("\u{2014}"),
        &note,
    );
    layout::text(
        &mut canvas,
        MARGIN_MM + 28.0,
        cursor.y + 8.0,
        &format!("{} words", format_number(content.word_count)),
        &note,
    );
    cursor = cursor.advance(16.0);

    layout::progress_bar(&mut canvas, content.score, MARGIN_MM, cursor.y, CONTENT_WIDTH_MM, 4.0);
    cursor = cursor.advance(10.0);

    let stats = content_stats(content);
    for (index, stat) in stats.iter().enumerate() {
        let x = MARGIN_MM + (index % 2) as f32 * (STAT_HALF_W_MM + STAT_GAP_MM);
        let y = cursor.y + (index / 2) as f32 * STAT_ROW_MM;
        stat_card(&mut canvas, x, y, stat);
    }
    cursor = cursor.advance(stats.len().div_ceil(2) as f32 * STAT_ROW_MM + 10.0);

    cursor = layout::section_title(&mut canvas, cursor, "Image Optimization", accent);
    let images = &view.images;
    layout::score_pill(&mut canvas, images.score, MARGIN_MM, cursor.y + 5.0);
    layout::text(
        &mut canvas,
        MARGIN_MM + 28.0,
        cursor.y + 5.0,
        &format!("{} images found", format_number(images.total_images)),
        &note,
    );
    cursor = cursor.advance(14.0);

    for issue in image_issues(images) {
        issue_row(&mut canvas, cursor.y, &issue);
        cursor = cursor.advance(11.0);
    }

    canvas.finish()
}

fn stat_card(canvas: &mut Canvas, x: f32, y: f32, stat: &Stat) {
    let bar = if stat.good { palette::GREEN } else { palette::RED };
    layout::fill_rounded_rect(canvas, x, y, STAT_HALF_W_MM, 10.0, 2.0, palette::CARD);
    layout::fill_rounded_rect(canvas, x, y, 2.5, 10.0, 1.0, bar);
    layout::text(
        canvas,
        x + 5.0,
        y + 4.5,
        stat.label,
        &TextStyle::regular(7.0, Rgb::gray(100)),
    );
    layout::text(
        canvas,
        x + STAT_HALF_W_MM - 3.0,
        y + 4.5,
        &stat.value,
        &TextStyle::bold(7.0, palette::INK).right(),
    );
}

fn issue_row(canvas: &mut Canvas, y: f32, issue: &ImageIssue) {
    let bad = issue.is_issue();
    let tint = if bad { palette::FAIL_TINT } else { palette::CARD };
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 9.0, tint);
    let label_color = Rgb::new(if bad { 180 } else { 60 }, 40, 40);
    layout::text(
        canvas,
        MARGIN_MM + 4.0,
        y + 6.5,
        issue.label,
        &TextStyle::regular(8.0, label_color),
    );
    let value_color = if bad { palette::RED } else { palette::GREEN };
    layout::text(
        canvas,
        PAGE_WIDTH_MM - MARGIN_MM - 2.0,
        y + 6.5,
        &format_number(issue.count),
        &TextStyle::bold(8.0, value_color).right(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{compose, has_text, view};

    #[test]
    fn stat_thresholds() {
        let raw = r#"{"content_quality": {
            "word_count": 500, "avg_sentence_length": 21, "avg_paragraph_length": 100,
            "content_to_code_ratio": 14.5, "reading_ease_score": 60,
            "heading_structure": {"h1": 1, "h2": 0}
        }}"#;
        let stats = content_stats(&view(raw).content);
        let good: Vec<bool> = stats.iter().map(|s| s.good).collect();
        assert_eq!(good, vec![true, true, false, true, false, true, true, false]);
        assert_eq!(stats[2].value, "21 words");
        assert_eq!(stats[4].value, "14.5%");
    }

    #[test]
    fn lazy_loading_tolerates_three() {
        let raw = r#"{"image_optimization": {"issues": {"no_lazy_loading_count": 3, "missing_alt_count": 2}}}"#;
        let issues = image_issues(&view(raw).images);
        assert!(issues[0].is_issue());
        assert!(!issues[1].is_issue());
        assert!(!issues[2].is_issue());
        let raw = r#"{"image_optimization": {"issues": {"no_lazy_loading_count": 4}}}"#;
        assert!(image_issues(&view(raw).images)[2].is_issue());
    }

    #[test]
    fn empty_audit_content_page() {
        let page = compose("{}", super::compose);
        assert!(has_text(&page, "\u{2014}"));
        assert!(has_text(&page, "0 words"));
        assert!(has_text(&page, "0 images found"));
        assert!(has_text(&page, "Image Optimization"));
    }
}
