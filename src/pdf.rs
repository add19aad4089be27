use crate::canvas::{Command, Document, Page};
use crate::error::Result;
use crate::font::Font;
use crate::metrics::DocumentMetrics;
use crate::types::{Color, Pt};
use fixed::types::I32F32;
use image::GenericImageView;
use lopdf::{Dictionary, Document as LoDocument, Object, StringFormat, Stream, dictionary};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub(crate) struct PdfOptions {
    pub document_title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub producer: String,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            document_title: None,
            author: None,
            subject: None,
            producer: concat!("auditflow-report ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

const FONTS: [Font; 2] = [Font::Helvetica, Font::HelveticaBold];

struct ImageData {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

/// Serializes `document` into PDF bytes. The whole file is assembled in memory,
/// so a failure leaves nothing behind.
pub(crate) fn document_to_pdf(
    document: &Document,
    options: &PdfOptions,
    mut metrics: Option<&mut DocumentMetrics>,
) -> Result<Vec<u8>> {
    let mut doc = LoDocument::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut font_dict = Dictionary::new();
    for font in FONTS {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_name(),
            "Encoding" => "WinAnsiEncoding",
        });
        font_dict.set(font.resource_name(), id);
    }

    let mut image_names: HashMap<String, String> = HashMap::new();
    let mut xobject_dict = Dictionary::new();
    for (resource_id, bytes) in &document.images {
        let Some(image) = decode_image_bytes(bytes) else {
            warn!(resource = %resource_id, "pdf: image resource undecodable, skipping");
            continue;
        };
        let name = format!("Im{}", image_names.len() + 1);
        let image_id = add_image_objects(&mut doc, image);
        xobject_dict.set(name.as_str(), image_id);
        image_names.insert(resource_id.clone(), name);
    }

    let opacities = collect_opacities(&document.pages);
    let mut gs_names: HashMap<(u16, u16), String> = HashMap::new();
    let mut extgstate_dict = Dictionary::new();
    for (index, (fill, stroke)) in opacities.into_iter().enumerate() {
        let name = format!("GS{}", index + 1);
        let id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(fill as f32 / 1000.0),
            "CA" => Object::Real(stroke as f32 / 1000.0),
        });
        extgstate_dict.set(name.as_str(), id);
        gs_names.insert((fill, stroke), name);
    }

    let mut resources = dictionary! { "Font" => font_dict };
    if !xobject_dict.is_empty() {
        resources.set("XObject", xobject_dict);
    }
    if !extgstate_dict.is_empty() {
        resources.set("ExtGState", extgstate_dict);
    }
    let resources_id = doc.add_object(resources);

    let width = document.page_size.width.to_f32();
    let height = document.page_size.height.to_f32();
    let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
    for (index, page) in document.pages.iter().enumerate() {
        let content = render_page(page, document.page_size.height, &image_names, &gs_names);
        if let Some(metrics) = metrics.as_deref_mut() {
            if let Some(entry) = metrics.pages.get_mut(index) {
                entry.content_bytes = content.len();
            }
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(info_dictionary(options));
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    if let Some(metrics) = metrics {
        metrics.total_bytes = bytes.len();
    }
    debug!(pages = page_count, bytes = bytes.len(), "pdf: serialized");
    Ok(bytes)
}

fn info_dictionary(options: &PdfOptions) -> Dictionary {
    let mut info = Dictionary::new();
    if let Some(title) = options.document_title.as_deref() {
        info.set("Title", text_string(title));
    }
    if let Some(author) = options.author.as_deref() {
        info.set("Author", text_string(author));
    }
    if let Some(subject) = options.subject.as_deref() {
        info.set("Subject", text_string(subject));
    }
    info.set("Producer", text_string(&options.producer));
    info
}

// PDF text strings: literal when ASCII, UTF-16BE with BOM otherwise.
fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn add_image_objects(doc: &mut LoDocument, image: ImageData) -> lopdf::ObjectId {
    let smask_id = image.alpha.map(|alpha| {
        doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ))
    });
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    if let Some(smask_id) = smask_id {
        dict.set("SMask", smask_id);
    }
    doc.add_object(Stream::new(dict, image.rgb))
}

fn decode_image_bytes(data: &[u8]) -> Option<ImageData> {
    let decoded = image::load_from_memory(data).ok()?;
    let (width, height) = decoded.dimensions();
    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    Some(ImageData {
        width,
        height,
        rgb,
        alpha: has_alpha.then_some(alpha),
    })
}

fn opacity_key(fill: f32, stroke: f32) -> (u16, u16) {
    let q = |v: f32| ((v * 1000.0).round() as i32).clamp(0, 1000) as u16;
    (q(fill), q(stroke))
}

fn collect_opacities(pages: &[Page]) -> BTreeSet<(u16, u16)> {
    pages
        .iter()
        .flat_map(|page| page.commands.iter())
        .filter_map(|cmd| match cmd {
            Command::SetOpacity { fill, stroke } => Some(opacity_key(*fill, *stroke)),
            _ => None,
        })
        .collect()
}

fn render_page(
    page: &Page,
    page_height: Pt,
    image_map: &HashMap<String, String>,
    gs_map: &HashMap<(u16, u16), String>,
) -> String {
    let mut out = String::new();
    let mut current_font_size = Pt::from_f32(12.0);
    let mut current_font = Font::Helvetica;
    let mut text_state_stack: Vec<(Font, Pt)> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                text_state_stack.push((current_font, current_font_size));
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some((font, size)) = text_state_stack.pop() {
                    current_font = font;
                    current_font_size = size;
                }
                out.push_str("Q\n");
            }
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => out.push_str(&color_to_pdf_fill(*color)),
            Command::SetStrokeColor(color) => out.push_str(&color_to_pdf_stroke(*color)),
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetLineCap(cap) => {
                out.push_str(&format!("{} J\n", cap));
            }
            Command::SetOpacity { fill, stroke } => {
                if let Some(name) = gs_map.get(&opacity_key(*fill, *stroke)) {
                    out.push_str(&format!("/{} gs\n", name));
                }
            }
            Command::SetFont(font) => current_font = *font,
            Command::SetFontSize(size) => current_font_size = *size,
            Command::MoveTo { x, y } => {
                out.push_str(&format!("{} {} m\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::LineTo { x, y } => {
                out.push_str(&format!("{} {} l\n", fmt_pt(*x), fmt_pt(page_height - *y)));
            }
            Command::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} {} {} c\n",
                    fmt_pt(*x1),
                    fmt_pt(page_height - *y1),
                    fmt_pt(*x2),
                    fmt_pt(page_height - *y2),
                    fmt_pt(*x),
                    fmt_pt(page_height - *y),
                ));
            }
            Command::ClosePath => out.push_str("h\n"),
            Command::Fill => out.push_str("f\n"),
            Command::Stroke => out.push_str("S\n"),
            Command::DrawString { x, y, text } => {
                out.push_str("BT\n");
                out.push_str(&format!(
                    "/{} {} Tf\n",
                    current_font.resource_name(),
                    fmt_pt(current_font_size)
                ));
                out.push_str(&format!("{} {} Td\n", fmt_pt(*x), fmt_pt(page_height - *y)));
                out.push_str(&format!("({}) Tj\n", encode_winansi_pdf_string(text)));
                out.push_str("ET\n");
            }
            Command::DrawRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re\nf\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                if let Some(name) = image_map.get(resource_id) {
                    let draw_y = page_height - *y - *height;
                    out.push_str("q\n");
                    out.push_str(&format!(
                        "{} 0 0 {} {} {} cm\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(draw_y)
                    ));
                    out.push_str(&format!("/{} Do\n", name));
                    out.push_str("Q\n");
                }
            }
        }
    }

    out
}

fn encode_winansi_pdf_string(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        // Common ASCII fallbacks for symbols that are not WinAnsi.
        match ch {
            '\u{2265}' => {
                out.push_str(">=");
                continue;
            }
            '\u{2264}' => {
                out.push_str("<=");
                continue;
            }
            _ => {}
        }

        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{:03o}", b)),
            b => out.push(b as char),
        }
    }
    out
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = I32F32::from_num(value);
    let scaled = (fixed * I32F32::from_num(1000)).round();
    let milli: i64 = scaled.to_num();
    format_milli(milli)
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        format!("{}{}", sign, int_part)
    } else {
        let mut s = format!("{}{}.{:03}", sign, int_part, frac_part);
        while s.ends_with('0') {
            s.pop();
        }
        s
    }
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli_i64())
}

fn color_to_pdf_fill(color: Color) -> String {
    format!("{} {} {} rg\n", fmt(color.r), fmt(color.g), fmt(color.b))
}

fn color_to_pdf_stroke(color: Color) -> String {
    format!("{} {} {} RG\n", fmt(color.r), fmt(color.g), fmt(color.b))
}
