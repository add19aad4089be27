use super::{ComposeContext, page_canvas};
use crate::canvas::{Canvas, Page};
use crate::layout::{
    self, CONTENT_WIDTH_MM, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TextStyle,
};
use crate::score::{Rgb, classify, palette};
use crate::view::{CategoryScore, format_number};

const BAND_HEIGHT_MM: f32 = PAGE_HEIGHT_MM * 0.45;
const STRIPE_TOP_MM: f32 = PAGE_HEIGHT_MM * 0.38;
const CONTENT_Y_MM: f32 = BAND_HEIGHT_MM + 10.0;
const BADGE_RADIUS_MM: f32 = 22.0;
const BADGE_CX_MM: f32 = PAGE_WIDTH_MM - MARGIN_MM - BADGE_RADIUS_MM;
const BADGE_CY_MM: f32 = 60.0;
const URL_CHIP_OPACITY: f32 = 0.18;
const URL_MAX_CHARS: usize = 90;

const GRID_ROW_MM: f32 = 18.0;
const GRID_CELL_H_MM: f32 = 14.0;

pub fn compose(ctx: &ComposeContext<'_>) -> Page {
    let mut canvas = page_canvas(1);
    let view = ctx.view;
    let accent = ctx.accent();

    layout::fill_rect(&mut canvas, 0.0, 0.0, PAGE_WIDTH_MM, BAND_HEIGHT_MM, accent);
    layout::fill_triangle(
        &mut canvas,
        [
            (0.0, BAND_HEIGHT_MM),
            (PAGE_WIDTH_MM, STRIPE_TOP_MM),
            (PAGE_WIDTH_MM, BAND_HEIGHT_MM),
        ],
        accent.offset(-15, -15, 20),
    );

    let heading = TextStyle::bold(28.0, palette::WHITE);
    layout::text(&mut canvas, MARGIN_MM, 55.0, "WEBSITE", &heading);
    layout::text(&mut canvas, MARGIN_MM, 69.0, "AUDIT REPORT", &heading);

    canvas.save_state();
    canvas.set_opacity(URL_CHIP_OPACITY, URL_CHIP_OPACITY);
    layout::fill_rounded_rect(&mut canvas, MARGIN_MM, 76.0, CONTENT_WIDTH_MM, 10.0, 2.0, palette::WHITE);
    canvas.restore_state();
    let url = if view.url.trim().is_empty() {
        "\u{2014}".to_string()
    } else {
        layout::truncate(view.url.trim(), URL_MAX_CHARS, "\u{2026}")
    };
    layout::text(
        &mut canvas,
        MARGIN_MM + 4.0,
        82.5,
        &url,
        &TextStyle::regular(10.0, palette::WHITE),
    );

    let (tier, tier_color) = classify(view.overall_score);
    layout::fill_circle(&mut canvas, BADGE_CX_MM, BADGE_CY_MM, BADGE_RADIUS_MM, palette::WHITE);
    layout::text(
        &mut canvas,
        BADGE_CX_MM,
        BADGE_CY_MM + 2.0,
        &format_number(view.overall_score),
        &TextStyle::bold(22.0, tier_color).centered(),
    );
    layout::text(
        &mut canvas,
        BADGE_CX_MM,
        BADGE_CY_MM + 8.0,
        "/ 100",
        &TextStyle::regular(7.0, Rgb::gray(80)).centered(),
    );
    layout::text(
        &mut canvas,
        BADGE_CX_MM,
        BADGE_CY_MM + 14.0,
        &tier.label().to_uppercase(),
        &TextStyle::regular(8.0, tier_color).centered(),
    );

    let y = CONTENT_Y_MM;
    layout::text(
        &mut canvas,
        MARGIN_MM,
        y + 8.0,
        "Prepared for",
        &TextStyle::bold(10.0, palette::INK),
    );
    let client = ctx.brand.client_name.trim();
    layout::text(
        &mut canvas,
        MARGIN_MM,
        y + 17.0,
        if client.is_empty() { "Client" } else { client },
        &TextStyle::regular(14.0, palette::INK),
    );
    let prepared_by = ctx.brand.prepared_by.trim();
    if !prepared_by.is_empty() {
        layout::text(
            &mut canvas,
            MARGIN_MM,
            y + 25.0,
            &format!("Prepared by: {prepared_by}"),
            &TextStyle::regular(9.0, Rgb::gray(100)),
        );
    }
    layout::text(
        &mut canvas,
        MARGIN_MM,
        y + 33.0,
        &format!("Audit date: {}", ctx.date_label),
        &TextStyle::regular(9.0, Rgb::gray(120)),
    );

    let grid_y = y + 48.0;
    layout::text(
        &mut canvas,
        MARGIN_MM,
        grid_y,
        "LIGHTHOUSE SCORES",
        &TextStyle::bold(8.0, Rgb::gray(60)),
    );
    let rows: Vec<&[CategoryScore]> = view.categories.chunks(2).collect();
    let cursor = ctx.cursor(1).at(grid_y + 6.0);
    layout::bounded_rows(
        &mut canvas,
        cursor,
        &rows,
        ctx.config.overflow_marker,
        "lighthouse_categories",
        |canvas, cursor, row| {
            for (col, category) in row.iter().enumerate() {
                category_cell(canvas, col, cursor.y, category);
            }
            cursor.advance(GRID_ROW_MM)
        },
    );

    canvas.finish()
}

fn category_cell(canvas: &mut Canvas, col: usize, y: f32, category: &CategoryScore) {
    let cell_w = CONTENT_WIDTH_MM / 2.0 - 4.0;
    let x = MARGIN_MM + col as f32 * (CONTENT_WIDTH_MM / 2.0 + 4.0);
    let (_, color) = classify(category.score);
    layout::fill_rounded_rect(canvas, x, y, cell_w, GRID_CELL_H_MM, 2.0, palette::CARD);
    layout::fill_rounded_rect(canvas, x, y, 3.0, GRID_CELL_H_MM, 1.0, color);
    layout::text(
        canvas,
        x + 6.0,
        y + 5.0,
        &category.title,
        &TextStyle::regular(7.0, palette::INK),
    );
    layout::text(
        canvas,
        x + 6.0,
        y + 11.0,
        &format_number(category.score),
        &TextStyle::bold(11.0, color),
    );
}

#[cfg(test)]
mod tests {
    use crate::canvas::Command;
    use crate::pages::testing::{compose, has_text};

    #[test]
    fn empty_audit_cover_uses_placeholders() {
        let page = compose("{}", super::compose);
        assert!(has_text(&page, "\u{2014}"));
        assert!(has_text(&page, "Client"));
        assert!(has_text(&page, "0"));
        assert!(has_text(&page, "POOR"));
        assert!(has_text(&page, "Audit date: 05 Jan 2024, 09:30"));
        assert!(!page.texts().iter().any(|t| t.starts_with("Prepared by")));
    }

    #[test]
    fn url_chip_is_translucent_and_restored() {
        let page = compose(r#"{"url": "https://example.com"}"#, super::compose);
        let opacity = page
            .commands
            .iter()
            .position(|c| matches!(c, Command::SetOpacity { .. }))
            .expect("opacity");
        assert_eq!(page.commands[opacity - 1], Command::SaveState);
        assert!(page.commands[opacity..].contains(&Command::RestoreState));
        assert!(has_text(&page, "https://example.com"));
    }

    #[test]
    fn category_grid_keeps_received_order() {
        let raw = r#"{
            "overall_score": 91,
            "lighthouse": {"categories": {
                "seo": {"title": "SEO", "score": 95},
                "performance": {"title": "Performance", "score": 42},
                "accessibility": {"title": "Accessibility", "score": 77}
            }}
        }"#;
        let page = compose(raw, super::compose);
        let texts = page.texts();
        let seo = texts.iter().position(|t| *t == "SEO").expect("seo");
        let perf = texts.iter().position(|t| *t == "Performance").expect("perf");
        let a11y = texts.iter().position(|t| *t == "Accessibility").expect("a11y");
        assert!(seo < perf && perf < a11y);
        assert!(has_text(&page, "EXCELLENT"));
    }
}
