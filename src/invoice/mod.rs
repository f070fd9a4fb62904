//! Invoice document generation.
//!
//! The renderer fetches product thumbnails (best-effort, each failure
//! degrades to a textual placeholder), lays out a header, an order
//! metadata block and an itemized table, and returns the finished PDF as
//! a byte buffer. Nothing is written to disk.

mod fetch;

use image::{DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Image as PdfImage, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon, PolygonMode, Rgb, WindingOrder,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::entity::orders;
use crate::images::ImageResolver;

pub use fetch::{FETCH_TIMEOUT, FetchError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf generation failed: {0}")]
    Pdf(String),
}

/// One invoice table row, denormalized from the order item and its
/// product so the renderer has no persistence dependency.
#[derive(Debug, Clone)]
pub struct InvoiceLine {
    pub code: Option<String>,
    pub name: Option<String>,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub image: Option<String>,
}

#[derive(Clone)]
pub struct InvoiceRenderer {
    resolver: ImageResolver,
    client: reqwest::Client,
}

impl InvoiceRenderer {
    pub fn new(resolver: ImageResolver) -> Self {
        Self {
            resolver,
            client: reqwest::Client::new(),
        }
    }

    /// Render the invoice for a freshly created order. Thumbnails are
    /// fetched sequentially, one per line; any resolution, fetch or
    /// decode failure leaves a placeholder cell and never aborts the
    /// document.
    pub async fn render(
        &self,
        order: &orders::Model,
        lines: &[InvoiceLine],
    ) -> Result<Vec<u8>, RenderError> {
        let mut thumbnails = Vec::with_capacity(lines.len());
        for line in lines {
            thumbnails.push(self.load_thumbnail(line).await);
        }
        build_pdf(order, lines, &thumbnails)
    }

    async fn load_thumbnail(&self, line: &InvoiceLine) -> Option<DynamicImage> {
        let reference = line.image.as_deref()?;
        let url = self.resolver.resolve(reference)?;
        if !url.starts_with("http") {
            tracing::warn!(reference = %url, "image reference did not resolve to a fetchable URL");
            return None;
        }
        match fetch::fetch_image(&self.client, &url).await {
            Ok(image) => Some(image.thumbnail(256, 256)),
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "invoice image unavailable, using placeholder");
                None
            }
        }
    }
}

const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 17.5;
const TABLE_W: f64 = PAGE_W - 2.0 * MARGIN;

const HEADERS: [&str; 8] = [
    "SL",
    "Image",
    "Code",
    "Product Name",
    "Size",
    "Quantity",
    "Unit Price",
    "TOTAL",
];
const COL_WIDTHS: [f64; 8] = [9.0, 20.0, 20.0, 50.0, 13.0, 13.0, 25.0, 25.0];

const HEADER_ROW_H: f64 = 8.0;
const ITEM_ROW_H: f64 = 19.0;
const TOTAL_ROW_H: f64 = 8.0;
const THUMB_SIZE: f64 = 15.0;

const NAME_LIMIT: usize = 60;
const NAME_WRAP: usize = 30;

const PT_TO_MM: f64 = 0.352_778;

pub(crate) fn line_subtotal(line: &InvoiceLine) -> Decimal {
    line.unit_price * Decimal::from(line.quantity)
}

/// The grand total is the sum of the printed line subtotals, so the last
/// row always reconciles with the table above it.
pub(crate) fn compute_total(lines: &[InvoiceLine]) -> Decimal {
    lines.iter().map(line_subtotal).sum()
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_LIMIT {
        let prefix: String = name.chars().take(NAME_LIMIT - 3).collect();
        format!("{prefix}...")
    } else {
        name.to_string()
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
        // hard-split words longer than a full line
        while current.chars().count() > max_chars {
            let head: String = current.chars().take(max_chars).collect();
            let tail: String = current.chars().skip(max_chars).collect();
            lines.push(head);
            current = tail;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn mm(value: f64) -> Mm {
    Mm(value as _)
}

// Rough Helvetica average advance; close enough for centering short cells.
fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5 * PT_TO_MM
}

fn rect(x: f64, y_top: f64, w: f64, h: f64, mode: PolygonMode) -> Polygon {
    Polygon {
        rings: vec![vec![
            (Point::new(mm(x), mm(y_top)), false),
            (Point::new(mm(x + w), mm(y_top)), false),
            (Point::new(mm(x + w), mm(y_top - h)), false),
            (Point::new(mm(x), mm(y_top - h)), false),
        ]],
        mode,
        winding_order: WindingOrder::NonZero,
    }
}

fn title_color() -> Color {
    Color::Rgb(Rgb::new(0.902, 0.361, 0.0, None))
}

fn header_bg() -> Color {
    Color::Rgb(Rgb::new(1.0, 0.4, 0.0, None))
}

fn row_bg() -> Color {
    Color::Rgb(Rgb::new(0.96, 0.96, 0.96, None))
}

fn total_bg() -> Color {
    Color::Rgb(Rgb::new(0.976, 0.976, 0.976, None))
}

fn grid_color() -> Color {
    Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn centered_text(
    layer: &PdfLayerReference,
    text: &str,
    font: &IndirectFontRef,
    font_size: f64,
    center_x: f64,
    baseline_y: f64,
) {
    let x = center_x - text_width(text, font_size) / 2.0;
    layer.use_text(text, font_size as _, mm(x), mm(baseline_y), font);
}

fn column_x(index: usize) -> f64 {
    MARGIN + COL_WIDTHS[..index].iter().sum::<f64>()
}

fn prepare_layer(layer: &PdfLayerReference) {
    layer.set_outline_color(grid_color());
    layer.set_outline_thickness(0.5);
}

fn stroke_row(layer: &PdfLayerReference, y_top: f64, h: f64) {
    let mut x = MARGIN;
    for width in COL_WIDTHS {
        layer.add_polygon(rect(x, y_top, width, h, PolygonMode::Stroke));
        x += width;
    }
}

fn draw_table_header(layer: &PdfLayerReference, bold: &IndirectFontRef, y_top: f64) {
    layer.set_fill_color(header_bg());
    layer.add_polygon(rect(MARGIN, y_top, TABLE_W, HEADER_ROW_H, PolygonMode::Fill));
    stroke_row(layer, y_top, HEADER_ROW_H);

    layer.set_fill_color(white());
    for (index, title) in HEADERS.iter().enumerate() {
        let center = column_x(index) + COL_WIDTHS[index] / 2.0;
        centered_text(layer, title, bold, 10.0, center, y_top - 5.5);
    }
    layer.set_fill_color(black());
}

fn place_thumbnail(layer: &PdfLayerReference, thumbnail: &DynamicImage, x: f64, y_top: f64) {
    let rgb = DynamicImage::ImageRgb8(thumbnail.to_rgb8());
    let (px_w, px_h) = rgb.dimensions();
    if px_w == 0 || px_h == 0 {
        return;
    }
    let natural_w = px_w as f64 * 25.4 / 300.0;
    let natural_h = px_h as f64 * 25.4 / 300.0;
    let scale = (THUMB_SIZE / natural_w).min(THUMB_SIZE / natural_h);
    let draw_w = natural_w * scale;
    let draw_h = natural_h * scale;
    let col_w = COL_WIDTHS[1];
    let translate_x = x + (col_w - draw_w) / 2.0;
    let translate_y = y_top - (ITEM_ROW_H + draw_h) / 2.0;

    let pdf_image = PdfImage::from_dynamic_image(&rgb);
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(translate_x)),
            translate_y: Some(mm(translate_y)),
            scale_x: Some(scale as _),
            scale_y: Some(scale as _),
            dpi: Some(300.0),
            ..Default::default()
        },
    );
}

/// Pure layout over already-fetched thumbnails; `thumbnails[i]` pairs
/// with `lines[i]` and `None` renders the "-" placeholder cell.
pub(crate) fn build_pdf(
    order: &orders::Model,
    lines: &[InvoiceLine],
    thumbnails: &[Option<DynamicImage>],
) -> Result<Vec<u8>, RenderError> {
    let (doc, page_index, layer_index) =
        PdfDocument::new("Invoice", mm(PAGE_W), mm(PAGE_H), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let mut layer = doc.get_page(page_index).get_layer(layer_index);
    prepare_layer(&layer);

    let mut y = PAGE_H - MARGIN;

    // Title block
    layer.set_fill_color(title_color());
    centered_text(
        &layer,
        "FT FASHION INVOICE",
        &bold,
        22.0,
        PAGE_W / 2.0,
        y - 8.0,
    );
    layer.set_fill_color(black());
    y -= 18.0;

    // Order metadata block
    let item_count = lines.len().to_string();
    let metadata = [
        ("Order Code:", order.code.as_str()),
        (
            "Customer Name:",
            order.customer_name.as_deref().unwrap_or(""),
        ),
        (
            "Contact Number:",
            order.customer_phone.as_deref().unwrap_or(""),
        ),
        ("Email:", order.customer_email.as_str()),
        ("Total Items:", item_count.as_str()),
    ];
    for (label, value) in metadata {
        layer.use_text(label, 11.0, mm(MARGIN), mm(y), &bold);
        let value_x = MARGIN + text_width(label, 11.0) + 2.0;
        layer.use_text(value, 11.0, mm(value_x), mm(y), &regular);
        y -= 6.0;
    }
    y -= 6.0;

    // Itemized table
    draw_table_header(&layer, &bold, y);
    y -= HEADER_ROW_H;

    for (index, line) in lines.iter().enumerate() {
        if y - ITEM_ROW_H < MARGIN {
            let (page, new_layer) = doc.add_page(mm(PAGE_W), mm(PAGE_H), "Layer 1");
            layer = doc.get_page(page).get_layer(new_layer);
            prepare_layer(&layer);
            y = PAGE_H - MARGIN;
            draw_table_header(&layer, &bold, y);
            y -= HEADER_ROW_H;
        }

        layer.set_fill_color(row_bg());
        layer.add_polygon(rect(MARGIN, y, TABLE_W, ITEM_ROW_H, PolygonMode::Fill));
        stroke_row(&layer, y, ITEM_ROW_H);
        layer.set_fill_color(black());

        let middle = y - ITEM_ROW_H / 2.0 - 1.2;

        centered_text(
            &layer,
            &(index + 1).to_string(),
            &regular,
            9.0,
            column_x(0) + COL_WIDTHS[0] / 2.0,
            middle,
        );

        match &thumbnails[index] {
            Some(thumbnail) => place_thumbnail(&layer, thumbnail, column_x(1), y),
            None => centered_text(
                &layer,
                "-",
                &regular,
                9.0,
                column_x(1) + COL_WIDTHS[1] / 2.0,
                middle,
            ),
        }

        centered_text(
            &layer,
            line.code.as_deref().unwrap_or("-"),
            &regular,
            9.0,
            column_x(2) + COL_WIDTHS[2] / 2.0,
            middle,
        );

        let name = truncate_name(line.name.as_deref().unwrap_or(""));
        let name_lines = wrap_text(&name, NAME_WRAP);
        if name_lines.len() <= 1 {
            let text = name_lines.first().map(String::as_str).unwrap_or("");
            layer.use_text(text, 9.0, mm(column_x(3) + 1.5), mm(middle), &regular);
        } else {
            let mut line_y = y - 6.0;
            for name_line in name_lines.iter().take(3) {
                layer.use_text(
                    name_line.as_str(),
                    9.0,
                    mm(column_x(3) + 1.5),
                    mm(line_y),
                    &regular,
                );
                line_y -= 4.5;
            }
        }

        centered_text(
            &layer,
            line.size.as_deref().unwrap_or("-"),
            &regular,
            9.0,
            column_x(4) + COL_WIDTHS[4] / 2.0,
            middle,
        );
        centered_text(
            &layer,
            &line.quantity.to_string(),
            &regular,
            9.0,
            column_x(5) + COL_WIDTHS[5] / 2.0,
            middle,
        );
        centered_text(
            &layer,
            &money(line.unit_price),
            &regular,
            9.0,
            column_x(6) + COL_WIDTHS[6] / 2.0,
            middle,
        );
        centered_text(
            &layer,
            &money(line_subtotal(line)),
            &regular,
            9.0,
            column_x(7) + COL_WIDTHS[7] / 2.0,
            middle,
        );

        y -= ITEM_ROW_H;
    }

    // Total row
    if y - TOTAL_ROW_H < MARGIN {
        let (page, new_layer) = doc.add_page(mm(PAGE_W), mm(PAGE_H), "Layer 1");
        layer = doc.get_page(page).get_layer(new_layer);
        prepare_layer(&layer);
        y = PAGE_H - MARGIN;
    }
    layer.set_fill_color(total_bg());
    layer.add_polygon(rect(MARGIN, y, TABLE_W, TOTAL_ROW_H, PolygonMode::Fill));
    stroke_row(&layer, y, TOTAL_ROW_H);
    layer.set_fill_color(black());

    let total_middle = y - TOTAL_ROW_H / 2.0 - 1.2;
    centered_text(
        &layer,
        "Total:",
        &bold,
        9.0,
        column_x(6) + COL_WIDTHS[6] / 2.0,
        total_middle,
    );
    centered_text(
        &layer,
        &format!("{} BDT", money(compute_total(lines))),
        &bold,
        9.0,
        column_x(7) + COL_WIDTHS[7] / 2.0,
        total_middle,
    );

    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_order() -> orders::Model {
        orders::Model {
            id: Uuid::new_v4(),
            code: "ORD-20250801-123456".to_string(),
            customer_name: Some("Test Customer".to_string()),
            customer_phone: Some("01700000000".to_string()),
            customer_email: "a@b.com".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn sample_line(quantity: i32, price: Decimal) -> InvoiceLine {
        InvoiceLine {
            code: Some("123456".to_string()),
            name: Some("Blue Shirt".to_string()),
            size: Some("M".to_string()),
            quantity,
            unit_price: price,
            image: None,
        }
    }

    #[test]
    fn truncates_long_names_with_ellipsis() {
        let long = "x".repeat(80);
        let truncated = truncate_name(&long);
        assert_eq!(truncated.chars().count(), 60);
        assert!(truncated.ends_with("..."));

        let exact = "y".repeat(60);
        assert_eq!(truncate_name(&exact), exact);
    }

    #[test]
    fn wraps_words_and_hard_splits_long_tokens() {
        let wrapped = wrap_text("one two three", 7);
        assert_eq!(wrapped, vec!["one two", "three"]);

        let hard = wrap_text("abcdefghij", 4);
        assert_eq!(hard, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let lines = vec![
            sample_line(2, Decimal::new(1999, 2)),
            sample_line(1, Decimal::new(500, 2)),
        ];
        assert_eq!(money(compute_total(&lines)), "44.98");
    }

    #[test]
    fn worked_example_totals_to_39_98() {
        let lines = vec![sample_line(2, Decimal::new(1999, 2))];
        assert_eq!(format!("{} BDT", money(compute_total(&lines))), "39.98 BDT");
    }

    #[test]
    fn money_pads_to_two_decimals() {
        assert_eq!(money(Decimal::new(40, 0)), "40.00");
    }

    #[test]
    fn builds_a_pdf_without_thumbnails() {
        let order = sample_order();
        let lines = vec![
            sample_line(2, Decimal::new(1999, 2)),
            sample_line(1, Decimal::new(12550, 2)),
        ];
        let thumbnails = vec![None, None];

        let bytes = build_pdf(&order, &lines, &thumbnails).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn builds_a_pdf_with_an_embedded_thumbnail() {
        let order = sample_order();
        let lines = vec![sample_line(1, Decimal::new(100, 2))];
        let thumbnails = vec![Some(DynamicImage::new_rgb8(8, 8))];

        let bytes = build_pdf(&order, &lines, &thumbnails).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn paginates_large_carts() {
        let order = sample_order();
        let lines: Vec<InvoiceLine> = (0..40)
            .map(|_| sample_line(1, Decimal::new(999, 2)))
            .collect();
        let thumbnails: Vec<Option<DynamicImage>> = (0..40).map(|_| None).collect();

        let bytes = build_pdf(&order, &lines, &thumbnails).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
