use super::{ComposeContext, page_canvas};
use crate::canvas::{Canvas, Page};
use crate::layout::{self, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_WIDTH_MM, TextStyle};
use crate::score::{Rgb, palette, score_color};
use crate::view::{Metric, OpportunityView};

const CARD_GAP_MM: f32 = 4.0;
const CARD_HEIGHT_MM: f32 = 28.0;
const METRIC_ROW_MM: f32 = 12.0;
const MAX_OPPORTUNITIES: usize = 5;
const DESCRIPTION_MAX_CHARS: usize = 120;

pub fn compose(ctx: &ComposeContext<'_>) -> Page {
    let mut canvas = page_canvas(2);
    let view = ctx.view;
    let mut cursor = layout::section_title(&mut canvas, ctx.cursor(2), "Performance", ctx.accent());

    let vitals = &view.core_web_vitals;
    let cards = [
        ("Largest Contentful Paint", vitals.lcp.as_ref()),
        ("Cumulative Layout Shift", vitals.cls.as_ref()),
        ("Total Blocking Time", vitals.tbt.as_ref()),
    ];
    let card_w = (CONTENT_WIDTH_MM - CARD_GAP_MM * 2.0) / 3.0;
    for (slot, (label, metric)) in cards.into_iter().enumerate() {
        // an absent metric keeps its slot empty
        if let Some(metric) = metric {
            let x = MARGIN_MM + slot as f32 * (card_w + CARD_GAP_MM);
            vital_card(&mut canvas, x, cursor.y, card_w, label, metric);
        }
    }
    cursor = cursor.advance(CARD_HEIGHT_MM + 6.0);

    let secondary = &view.secondary_metrics;
    let more = [
        ("First Contentful Paint", secondary.first_contentful_paint.as_deref()),
        ("Speed Index", secondary.speed_index.as_deref()),
        ("Time to Interactive", secondary.time_to_interactive.as_deref()),
    ];
    let half = CONTENT_WIDTH_MM / 2.0;
    for (index, (label, value)) in more.iter().enumerate() {
        let Some(value) = value else { continue };
        let x = MARGIN_MM + (index % 2) as f32 * (half + 4.0);
        let y = cursor.y + (index / 2) as f32 * METRIC_ROW_MM;
        layout::text(&mut canvas, x, y, label, &TextStyle::regular(9.0, Rgb::gray(90)));
        layout::text(
            &mut canvas,
            x + half - 4.0,
            y,
            value,
            &TextStyle::bold(9.0, palette::INK).right(),
        );
    }
    cursor = cursor.advance(more.len().div_ceil(2) as f32 * METRIC_ROW_MM + 10.0);

    let opportunities = &view.opportunities[..view.opportunities.len().min(MAX_OPPORTUNITIES)];
    if !opportunities.is_empty() {
        cursor = layout::section_title(&mut canvas, cursor, "Top Opportunities", ctx.accent());
        layout::bounded_rows(
            &mut canvas,
            cursor,
            opportunities,
            ctx.config.overflow_marker,
            "opportunities",
            |canvas, cursor, opportunity| {
                opportunity_row(canvas, cursor.y, opportunity);
                cursor.advance(16.0)
            },
        );
    }

    canvas.finish()
}

fn vital_card(canvas: &mut Canvas, x: f32, y: f32, width: f32, label: &str, metric: &Metric) {
    let color = score_color(metric.score);
    layout::fill_rounded_rect(canvas, x, y, width, CARD_HEIGHT_MM, 3.0, palette::CARD);
    layout::fill_rounded_rect(canvas, x, y, width, 2.5, 1.0, color);
    layout::text(canvas, x + 5.0, y + 8.0, label, &TextStyle::regular(7.0, Rgb::gray(100)));
    layout::text(
        canvas,
        x + 5.0,
        y + 18.0,
        &metric.display_value,
        &TextStyle::bold(14.0, color),
    );
    layout::text(
        canvas,
        x + 5.0,
        y + 24.0,
        &rating_label(&metric.rating),
        &TextStyle::regular(7.0, Rgb::gray(120)),
    );
}

/// "needs-improvement" reads as "NEEDS IMPROVEMENT".
fn rating_label(rating: &str) -> String {
    rating.replace('-', " ").to_uppercase()
}

fn opportunity_row(canvas: &mut Canvas, y: f32, opportunity: &OpportunityView) {
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 13.0, palette::WARN_TINT);
    layout::text(
        canvas,
        MARGIN_MM + 4.0,
        y + 5.0,
        &opportunity.title,
        &TextStyle::bold(8.0, Rgb::gray(40)),
    );
    if let Some(ms) = opportunity.savings_ms {
        layout::text(
            canvas,
            PAGE_WIDTH_MM - MARGIN_MM - 2.0,
            y + 5.0,
            &format!("Save ~{}ms", ms.round() as i64),
            &TextStyle::regular(8.0, palette::SAVINGS).right(),
        );
    }
    let style = TextStyle::regular(8.0, Rgb::gray(80));
    let description = layout::truncate(&opportunity.description, DESCRIPTION_MAX_CHARS, "");
    if let Some(first) = layout::wrap(&description, CONTENT_WIDTH_MM - 8.0, &style).first() {
        layout::text(canvas, MARGIN_MM + 4.0, y + 10.0, first, &style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::pages::testing::{compose, compose_with, has_text};

    #[test]
    fn missing_vital_keeps_slot_and_rating_is_humanized() {
        let raw = r#"{"lighthouse": {"metrics": {"coreWebVitals": {
            "cls": {"displayValue": "0.02", "score": 0.99, "rating": "good"},
            "tbt": {"displayValue": "640 ms", "score": 0.31, "rating": "needs-improvement"}
        }}}}"#;
        let page = compose(raw, super::compose);
        assert!(!has_text(&page, "Largest Contentful Paint"));
        assert!(has_text(&page, "0.02"));
        assert!(has_text(&page, "NEEDS IMPROVEMENT"));
        let tbt_x = page
            .commands
            .iter()
            .find_map(|c| match c {
                crate::canvas::Command::DrawString { x, text, .. } if text == "Total Blocking Time" => {
                    Some(x.to_mm())
                }
                _ => None,
            })
            .expect("tbt card");
        let card_w = (CONTENT_WIDTH_MM - 8.0) / 3.0;
        assert!((tbt_x - (MARGIN_MM + 2.0 * (card_w + 4.0) + 5.0)).abs() < 0.01);
    }

    #[test]
    fn opportunities_are_capped_and_descriptions_truncated() {
        let long = "x".repeat(300);
        let items: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"title": "Fix {i}", "description": "{long}", "savings": {{"ms": 1234.6}}}}"#))
            .collect();
        let raw = format!(r#"{{"lighthouse": {{"opportunities": [{}]}}}}"#, items.join(","));
        let page = compose(&raw, super::compose);
        assert!(has_text(&page, "Fix 5"));
        assert!(!has_text(&page, "Fix 6"));
        assert!(has_text(&page, "Save ~1235ms"));
        let longest = page.texts().iter().map(|t| t.chars().count()).max().unwrap_or(0);
        assert!(longest <= DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn tight_safety_margin_drops_opportunities_with_marker() {
        let items: Vec<String> = (1..=5)
            .map(|i| format!(r#"{{"title": "Fix {i}", "description": "d"}}"#))
            .collect();
        let raw = format!(r#"{{"lighthouse": {{"opportunities": [{}]}}}}"#, items.join(","));
        // title at 32 -> 44 vitals -> 78 metrics -> 112 opportunities title -> rows from 124
        let config = ReportConfig::default().with_bottom_safety_margin(297.0 - 140.0);
        let page = compose_with(&raw, super::compose, &config);
        assert!(has_text(&page, "Fix 2"));
        assert!(!has_text(&page, "Fix 3"));
        assert!(has_text(&page, "+3 more items not shown"));
    }

    #[test]
    fn no_opportunities_means_no_heading() {
        let page = compose("{}", super::compose);
        assert!(!has_text(&page, "Top Opportunities"));
        assert!(has_text(&page, "Performance"));
    }
}
