use super::action_plan::{ActionItem, derive_action_plan};
use super::{ComposeContext, page_canvas};
use crate::canvas::{Canvas, Page};
use crate::layout::{
    self, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_WIDTH_MM, PILL_HEIGHT_MM, PILL_WIDTH_MM,
    SECTION_TITLE_ADVANCE_MM, TextStyle,
};
use crate::score::{Rgb, palette};
use crate::view::{BrokenLinkView, LinkStatus, SecurityView, format_number};
use tracing::debug;

const CHECK_GAP_MM: f32 = 6.0;
const CHECK_HALF_W_MM: f32 = (CONTENT_WIDTH_MM - CHECK_GAP_MM) / 2.0;
const MAX_BROKEN_LINKS: usize = 5;
const LINK_URL_MAX_CHARS: usize = 70;
const BADGE_WIDTH_MM: f32 = 18.0;

fn security_checks(security: &SecurityView) -> [(&'static str, bool); 5] {
    [
        ("HTTPS / SSL", security.https),
        ("HSTS Header", security.hsts),
        ("X-Frame-Options", security.x_frame_options),
        ("X-Content-Type-Options", security.x_content_type_options),
        ("Content-Security-Policy", security.content_security_policy),
    ]
}

/// Pill label and color. Anything other than pass or warning reads as a failure.
fn link_status_pill(status: LinkStatus) -> (&'static str, Rgb) {
    match status {
        LinkStatus::Pass => ("PASS", palette::GREEN),
        LinkStatus::Warning => ("WARNING", palette::AMBER),
        LinkStatus::Fail | LinkStatus::Unknown => ("FAIL", palette::RED),
    }
}

pub fn compose(ctx: &ComposeContext<'_>) -> Page {
    let mut canvas = page_canvas(5);
    let view = ctx.view;
    let accent = ctx.accent();
    let marker = ctx.config.overflow_marker;

    let mut cursor = layout::section_title(&mut canvas, ctx.cursor(5), "Security", accent);
    let checks = security_checks(&view.security);
    for (index, (label, pass)) in checks.iter().enumerate() {
        let x = MARGIN_MM + (index % 2) as f32 * (CHECK_HALF_W_MM + CHECK_GAP_MM);
        let y = cursor.y + (index / 2) as f32 * 12.0;
        let tint = if *pass {
            palette::PASS_TINT
        } else {
            palette::FAIL_TINT
        };
        layout::row_band(&mut canvas, x, y, CHECK_HALF_W_MM, 10.0, tint);
        layout::status_icon(&mut canvas, *pass, x + 4.0, y + 7.0);
        layout::text(
            &mut canvas,
            x + 11.0,
            y + 7.0,
            label,
            &TextStyle::regular(7.5, palette::INK),
        );
    }
    cursor = cursor.advance(checks.len().div_ceil(2) as f32 * 12.0 + 8.0);

    cursor = layout::section_title(&mut canvas, cursor, "Broken Links", accent);
    let links = &view.broken_links;
    let (pill_label, pill_color) = link_status_pill(links.status);
    layout::fill_rounded_rect(
        &mut canvas,
        MARGIN_MM,
        cursor.y,
        PILL_WIDTH_MM,
        PILL_HEIGHT_MM,
        2.0,
        pill_color,
    );
    layout::text(
        &mut canvas,
        MARGIN_MM + PILL_WIDTH_MM / 2.0,
        cursor.y + 5.5,
        pill_label,
        &TextStyle::bold(8.0, palette::WHITE).centered(),
    );
    layout::text(
        &mut canvas,
        MARGIN_MM + 26.0,
        cursor.y + 5.5,
        &format!(
            "{} links checked \u{2014} {} broken",
            format_number(links.total_checked),
            format_number(links.broken_count)
        ),
        &TextStyle::regular(8.0, Rgb::gray(60)),
    );
    cursor = cursor.advance(14.0);

    if links.broken_count > 0.0 && !links.links.is_empty() {
        layout::text(
            &mut canvas,
            MARGIN_MM,
            cursor.y,
            "BROKEN LINKS",
            &TextStyle::bold(7.0, Rgb::gray(100)),
        );
        cursor = cursor.advance(5.0);
        let shown = &links.links[..links.links.len().min(MAX_BROKEN_LINKS)];
        cursor = layout::bounded_rows(
            &mut canvas,
            cursor,
            shown,
            marker,
            "broken_links",
            |canvas, cursor, link| {
                broken_link_row(canvas, cursor.y, link);
                cursor.advance(11.0)
            },
        );
    }
    cursor = cursor.advance(8.0);

    // The plan is only started when its heading and first row both fit.
    if cursor.has_room_at(SECTION_TITLE_ADVANCE_MM) {
        cursor = layout::section_title(&mut canvas, cursor, "Recommended Action Plan", accent);
        let actions = derive_action_plan(view);
        layout::bounded_rows(
            &mut canvas,
            cursor,
            &actions,
            marker,
            "action_plan",
            |canvas, cursor, action| {
                action_row(canvas, cursor.y, action);
                cursor.advance(13.0)
            },
        );
    } else {
        debug!(y = cursor.y, "overflow: action plan skipped");
    }

    canvas.finish()
}

fn broken_link_row(canvas: &mut Canvas, y: f32, link: &BrokenLinkView) {
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 9.0, palette::FAIL_TINT);
    layout::text(
        canvas,
        MARGIN_MM + 4.0,
        y + 6.0,
        &layout::truncate(&link.url, LINK_URL_MAX_CHARS, "\u{2026}"),
        &TextStyle::regular(7.0, Rgb::gray(80)),
    );
    layout::text(
        canvas,
        PAGE_WIDTH_MM - MARGIN_MM - 2.0,
        y + 6.0,
        &link.status,
        &TextStyle::regular(7.0, palette::RED).right(),
    );
}

fn action_row(canvas: &mut Canvas, y: f32, action: &ActionItem) {
    layout::row_band(canvas, MARGIN_MM, y, CONTENT_WIDTH_MM, 10.0, palette::CARD);
    layout::row_band(canvas, MARGIN_MM, y, BADGE_WIDTH_MM, 10.0, action.priority.color());
    layout::text(
        canvas,
        MARGIN_MM + BADGE_WIDTH_MM / 2.0,
        y + 6.5,
        action.priority.label(),
        &TextStyle::bold(6.0, palette::WHITE).centered(),
    );
    layout::text(
        canvas,
        MARGIN_MM + 22.0,
        y + 4.0,
        &action.task,
        &TextStyle::regular(8.0, palette::INK),
    );
    layout::text(
        canvas,
        MARGIN_MM + 22.0,
        y + 9.0,
        action.impact,
        &TextStyle::regular(7.0, Rgb::gray(120)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::config::ReportConfig;
    use crate::pages::testing::{compose, compose_with, has_text};

    fn fills(page: &Page) -> Vec<Rgb> {
        page.commands
            .iter()
            .filter_map(|c| match c {
                Command::SetFillColor(color) => Some(*color),
                _ => None,
            })
            .map(|c| {
                Rgb::new(
                    (c.r * 255.0).round() as u8,
                    (c.g * 255.0).round() as u8,
                    (c.b * 255.0).round() as u8,
                )
            })
            .collect()
    }

    #[test]
    fn unknown_link_status_uses_fail_color() {
        let page = compose("{}", super::compose);
        assert!(has_text(&page, "FAIL"));
        assert!(has_text(&page, "0 links checked \u{2014} 0 broken"));
        assert!(!has_text(&page, "BROKEN LINKS"));
        assert!(fills(&page).contains(&palette::RED));
    }

    #[test]
    fn https_site_with_three_broken_links() {
        let long = format!("https://example.com/{}", "a".repeat(80));
        let raw = format!(
            r#"{{
            "security": {{"https": true}},
            "broken_links": {{"status": "warning", "total_checked": 120, "broken_count": 3,
                "broken_links": [
                    {{"url": "{long}", "status_code": 404}},
                    {{"url": "https://example.com/b", "status_code": "timeout"}},
                    {{"url": "https://example.com/c"}}
                ]}},
            "technical_seo": {{"meta_description": {{"present": true}}}},
            "structured_data": {{"has_json_ld": true, "has_open_graph": true}}
        }}"#
        );
        let page = compose(&raw, super::compose);
        assert!(has_text(&page, "WARNING"));
        assert!(has_text(&page, "120 links checked \u{2014} 3 broken"));
        assert!(has_text(&page, "404"));
        assert!(has_text(&page, "timeout"));
        assert!(has_text(&page, "Error"));
        let cut: String = long.chars().take(LINK_URL_MAX_CHARS).collect();
        assert!(has_text(&page, &format!("{cut}\u{2026}")));
        assert!(has_text(&page, "Recommended Action Plan"));
        assert!(has_text(&page, "Fix 3 broken link(s)"));
        assert!(!has_text(&page, "CRITICAL"));
    }

    #[test]
    fn broken_rows_are_capped_at_five() {
        let links: Vec<String> = (1..=8)
            .map(|i| format!(r#"{{"url": "https://example.com/{i}", "status_code": 404}}"#))
            .collect();
        let raw = format!(
            r#"{{"broken_links": {{"broken_count": 8, "broken_links": [{}]}}}}"#,
            links.join(",")
        );
        let page = compose(&raw, super::compose);
        assert!(has_text(&page, "https://example.com/5"));
        assert!(!has_text(&page, "https://example.com/6"));
    }

    #[test]
    fn action_plan_is_skipped_when_heading_cannot_fit() {
        let config = ReportConfig::default().with_bottom_safety_margin(250.0);
        let page = compose_with("{}", super::compose, &config);
        assert!(!has_text(&page, "Recommended Action Plan"));
        let page = compose("{}", super::compose);
        assert!(has_text(&page, "Recommended Action Plan"));
        assert!(has_text(&page, "CRITICAL"));
        assert!(has_text(&page, "Enable HTTPS / SSL certificate"));
    }

    #[test]
    fn full_page_draws_all_six_actions() {
        let links: Vec<String> = (1..=5)
            .map(|i| format!(r#"{{"url": "https://example.com/{i}", "status_code": 404}}"#))
            .collect();
        let raw = format!(
            r#"{{
            "broken_links": {{"status": "fail", "broken_count": 5, "broken_links": [{}]}},
            "image_optimization": {{"issues": {{"missing_alt_count": 1, "old_format_count": 4}}}}
        }}"#,
            links.join(",")
        );
        let page = compose(&raw, super::compose);
        assert!(has_text(&page, "https://example.com/5"));
        assert!(has_text(&page, "Fix 5 broken link(s)"));
        assert!(has_text(&page, "Add Open Graph meta tags"));
        assert!(has_text(&page, "Social sharing"));
        assert!(!has_text(&page, "Convert images to WebP/AVIF"));
        assert!(!page.texts().iter().any(|t| t.starts_with('+')));
    }
}
