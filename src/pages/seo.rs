use super::{ComposeContext, page_canvas};
use crate::canvas::{Canvas, Page};
use crate::layout::{self, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_WIDTH_MM, TextStyle};
use crate::score::{Rgb, palette};
use crate::view::{StructuredDataView, TechnicalSeoView, format_number};

const TITLE_NOTE_MAX_CHARS: usize = 60;
const SD_NOTE_MAX_CHARS: usize = 50;
const MAX_RECOMMENDATIONS: usize = 4;
const NOTE_X_MM: f32 = PAGE_WIDTH_MM - MARGIN_MM - 2.0;

struct Check {
    label: &'static str,
    pass: bool,
    note: String,
}

impl Check {
    fn new(label: &'static str, pass: bool, note: impl Into<String>) -> Self {
        Self {
            label,
            pass,
            note: note.into(),
        }
    }
}

fn technical_checks(seo: &TechnicalSeoView) -> Vec<Check> {
    vec![
        Check::new(
            "Title Tag",
            seo.title_present,
            layout::truncate(&seo.title_content, TITLE_NOTE_MAX_CHARS, ""),
        ),
        Check::new(
            "Meta Description",
            seo.meta_description_present,
            format!("{} chars", format_number(seo.meta_description_length)),
        ),
        Check::new("Canonical URL", seo.canonical_present, ""),
        Check::new("Robots.txt", seo.robots_txt, ""),
        Check::new("Sitemap.xml", seo.sitemap_xml, ""),
        Check::new(
            "H1 Tag",
            seo.h1_count == 1.0,
            format!("{} found", format_number(seo.h1_count)),
        ),
    ]
}

fn structured_data_checks(sd: &StructuredDataView) -> Vec<Check> {
    vec![
        Check::new("JSON-LD", sd.has_json_ld, sd.json_ld_types.join(", ")),
        Check::new(
            "Open Graph",
            sd.has_open_graph,
            sd.open_graph_properties.join(", "),
        ),
        Check::new(
            "Twitter Card",
            sd.has_twitter_card,
            sd.twitter_card_type.clone(),
        ),
        Check::new("Microdata", sd.has_microdata, ""),
    ]
}

pub fn compose(ctx: &ComposeContext<'_>) -> Page {
    let mut canvas = page_canvas(3);
    let view = ctx.view;
    let accent = ctx.accent();

    let mut cursor = layout::section_title(&mut canvas, ctx.cursor(3), "Technical SEO", accent);
    for check in technical_checks(&view.technical_seo) {
        technical_row(&mut canvas, cursor.y, &check);
        cursor = cursor.advance(13.0);
    }
    cursor = cursor.advance(6.0);

    cursor = layout::section_title(&mut canvas, cursor, "Structured Data", accent);
    let sd = &view.structured_data;
    layout::score_pill(&mut canvas, sd.score, MARGIN_MM, cursor.y + 5.0);
    layout::text(
        &mut canvas,
        MARGIN_MM + 28.0,
        cursor.y + 2.0,
        &format!("Status: {}", sd.status.as_deref().unwrap_or("\u{2014}")),
        &TextStyle::regular(8.0, Rgb::gray(80)),
    );
    cursor = cursor.advance(12.0);

    for check in structured_data_checks(sd) {
        structured_data_row(&mut canvas, cursor.y, &check);
        cursor = cursor.advance(11.0);
    }

    let recommendations =
        &sd.recommendations[..sd.recommendations.len().min(MAX_RECOMMENDATIONS)];
    if !recommendations.is_empty() {
        cursor = cursor.advance(4.0);
        layout::text(
            &mut canvas,
            MARGIN_MM,
            cursor.y,
            "Recommendations",
            &TextStyle::bold(8.0, Rgb::gray(60)),
        );
        cursor = cursor.advance(6.0);
        let style = TextStyle::regular(8.0, Rgb::gray(80));
        layout::bounded_rows(
            &mut canvas,
            cursor,
            recommendations,
            ctx.config.overflow_marker,
            "recommendations",
            |canvas, cursor, recommendation| {
                layout::text(canvas, MARGIN_MM + 2.0, cursor.y, "\u{2022}", &style);
                let lines = layout::fit_lines(
                    cursor,
                    layout::wrap(recommendation, CONTENT_WIDTH_MM - 10.0, &style),
                    4.5,
                );
                layout::text_lines(canvas, MARGIN_MM + 8.0, cursor.y, &lines, 4.5, &style);
                cursor.advance(lines.len() as f32 * 4.5 + 2.0)
            },
        );
    }

    canvas.finish()
}

fn technical_row(canvas: &mut Canvas, y: f32, check: &Check) {
    let tint = if check.pass {
        palette::PASS_TINT
    } else {
        palette::FAIL_TINT
    };
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 10.0, tint);
    layout::status_icon(canvas, check.pass, MARGIN_MM + 4.0, y + 7.0);
    layout::text(
        canvas,
        MARGIN_MM + 11.0,
        y + 7.0,
        check.label,
        &TextStyle::regular(9.0, palette::INK).weight(!check.pass),
    );
    layout::text(
        canvas,
        NOTE_X_MM,
        y + 7.0,
        &check.note,
        &TextStyle::regular(7.0, Rgb::gray(120)).right(),
    );
}

fn structured_data_row(canvas: &mut Canvas, y: f32, check: &Check) {
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 9.0, palette::CARD);
    layout::status_icon(canvas, check.pass, MARGIN_MM + 4.0, y + 6.5);
    layout::text(
        canvas,
        MARGIN_MM + 11.0,
        y + 6.5,
        check.label,
        &TextStyle::regular(8.0, palette::INK),
    );
    layout::text(
        canvas,
        NOTE_X_MM,
        y + 6.5,
        &layout::truncate(&check.note, SD_NOTE_MAX_CHARS, "\u{2026}"),
        &TextStyle::regular(7.0, Rgb::gray(120)).right(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::pages::testing::{compose, compose_with, has_text, view};

    #[test]
    fn empty_audit_fails_every_check_with_placeholder_notes() {
        let page = compose("{}", super::compose);
        assert!(has_text(&page, "0 chars"));
        assert!(has_text(&page, "0 found"));
        assert!(has_text(&page, "Status: \u{2014}"));
        assert!(!has_text(&page, "Recommendations"));
    }

    #[test]
    fn h1_passes_only_when_exactly_one() {
        let checks = technical_checks(&view(r#"{"technical_seo": {"headings": {"h1": 1}}}"#).technical_seo);
        assert!(checks[5].pass);
        let checks = technical_checks(&view(r#"{"technical_seo": {"headings": {"h1": 2}}}"#).technical_seo);
        assert!(!checks[5].pass);
        assert_eq!(checks[5].note, "2 found");
    }

    #[test]
    fn json_ld_only_structured_data() {
        let raw = r#"{"structured_data": {
            "score": 40, "status": "partial", "has_json_ld": true,
            "json_ld_types": ["Organization", "WebSite", "BreadcrumbList", "LocalBusiness", "FAQPage"]
        }}"#;
        let checks = structured_data_checks(&view(raw).structured_data);
        let passes: Vec<bool> = checks.iter().map(|c| c.pass).collect();
        assert_eq!(passes, vec![true, false, false, false]);
        let page = compose(raw, super::compose);
        assert!(has_text(&page, "Status: partial"));
        let note = "Organization, WebSite, BreadcrumbList, LocalBusine\u{2026}";
        assert_eq!(note.chars().count(), SD_NOTE_MAX_CHARS + 1);
        assert!(has_text(&page, note));
    }

    #[test]
    fn title_note_is_cut_to_sixty_chars() {
        let title = "T".repeat(80);
        let raw = format!(r#"{{"technical_seo": {{"title": {{"present": true, "content": "{title}"}}}}}}"#);
        let page = compose(&raw, super::compose);
        assert!(has_text(&page, &"T".repeat(60)));
    }

    #[test]
    fn recommendations_are_capped_at_four() {
        let raw = r#"{"structured_data": {"recommendations": ["a", "b", "c", "d", "e"]}}"#;
        let page = compose(raw, super::compose);
        assert!(has_text(&page, "Recommendations"));
        assert!(has_text(&page, "d"));
        assert!(!has_text(&page, "e"));
        let bullets = page.texts().iter().filter(|t| **t == "\u{2022}").count();
        assert_eq!(bullets, 4);
    }

    #[test]
    fn long_recommendation_is_cut_at_safety_zone() {
        let long = vec!["improve"; 150].join(" ");
        let raw = format!(
            r#"{{"structured_data": {{"recommendations": ["{long}", "Add a logo"]}}}}"#
        );
        // recommendations start at y=206; a limit of 210 leaves room for one line
        let config = ReportConfig::default().with_bottom_safety_margin(297.0 - 210.0);
        let page = compose_with(&raw, super::compose, &config);
        let lines: Vec<&str> = page
            .texts()
            .into_iter()
            .filter(|t| t.starts_with("improve"))
            .collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with('\u{2026}'));
        assert!(!has_text(&page, "Add a logo"));
        assert!(has_text(&page, "+1 more item not shown"));

        let page = compose(&raw, super::compose);
        let wrapped = page.texts().iter().filter(|t| t.starts_with("improve")).count();
        assert!(wrapped > 1);
        assert!(has_text(&page, "Add a logo"));
    }
}
