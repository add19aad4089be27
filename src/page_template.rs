use crate::assets::LogoAsset;
use crate::brand::BrandConfig;
use crate::canvas::Canvas;
use crate::doc_context::DocContext;
use crate::layout::{
    self, BRAND_HEIGHT_MM, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, TextStyle, mm,
};
use crate::score::{Rgb, palette};
use crate::types::Size;
use std::sync::Arc;

pub const LOGO_RESOURCE_ID: &str = "logo";
const FOOTER_BASELINE_MM: f32 = PAGE_HEIGHT_MM - 10.0;

pub type OnPageCallback = Arc<dyn Fn(&mut Canvas, &DocContext) + Send + Sync>;

/// Page chrome applied to every page after its content has been composed.
#[derive(Clone)]
pub struct PageTemplate {
    pub name: String,
    pub page_size: Size,
    on_page: Option<OnPageCallback>,
}

impl PageTemplate {
    pub fn new(name: impl Into<String>, page_size: Size) -> Self {
        Self {
            name: name.into(),
            page_size,
            on_page: None,
        }
    }

    pub fn set_on_page<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Canvas, &DocContext) + Send + Sync + 'static,
    {
        self.on_page = Some(Arc::new(callback));
        self
    }

    pub fn on_page(&self) -> Option<&OnPageCallback> {
        self.on_page.as_ref()
    }

    /// A4 template drawing the agency header band and the footer line.
    pub fn branded(brand: &BrandConfig, logo: Option<&LogoAsset>, generated_label: String) -> Self {
        let chrome = HeaderChrome {
            accent: brand.accent(),
            agency_name: brand.agency_name().to_string(),
            logo_size: logo.map(|logo| logo.fitted_size(BRAND_HEIGHT_MM)),
        };
        let footer_text = brand.report_footer.clone();
        PageTemplate::new("branded", Size::a4()).set_on_page(move |canvas, ctx| {
            chrome.draw(canvas, ctx);
            draw_footer(canvas, &footer_text, &generated_label);
        })
    }
}

struct HeaderChrome {
    accent: Rgb,
    agency_name: String,
    logo_size: Option<(f32, f32)>,
}

impl HeaderChrome {
    fn draw(&self, canvas: &mut Canvas, ctx: &DocContext) {
        layout::fill_rect(canvas, 0.0, 0.0, PAGE_WIDTH_MM, BRAND_HEIGHT_MM, self.accent);

        let mut name_x = MARGIN_MM;
        if let Some((w, h)) = self.logo_size.filter(|(w, h)| *w > 0.0 && *h > 0.0) {
            let y = (BRAND_HEIGHT_MM - h) / 2.0;
            canvas.draw_image(mm(MARGIN_MM), mm(y), mm(w), mm(h), LOGO_RESOURCE_ID);
            name_x = MARGIN_MM + w + 6.0;
        }

        layout::text(
            canvas,
            name_x,
            14.0,
            &self.agency_name,
            &TextStyle::bold(11.0, palette::WHITE),
        );
        layout::text(
            canvas,
            PAGE_WIDTH_MM - MARGIN_MM,
            14.0,
            &ctx.page_label(),
            &TextStyle::regular(8.0, palette::WHITE).right(),
        );
    }
}

fn draw_footer(canvas: &mut Canvas, footer_text: &str, generated_label: &str) {
    let y = FOOTER_BASELINE_MM;
    let style = TextStyle::regular(7.0, palette::MUTED);
    layout::text(canvas, MARGIN_MM, y, footer_text, &style);
    layout::text(
        canvas,
        PAGE_WIDTH_MM - MARGIN_MM,
        y,
        generated_label,
        &style.right(),
    );
    layout::line(
        canvas,
        (MARGIN_MM, y - 4.0),
        (PAGE_WIDTH_MM - MARGIN_MM, y - 4.0),
        0.2,
        palette::RULE,
    );
}
