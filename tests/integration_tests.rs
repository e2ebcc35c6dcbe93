//! Integration tests for the receipts pipeline.
//!
//! These tests validate:
//! - The composer's placement calls for a complete document
//! - Fail-fast validation before anything is placed
//! - PDF output exists and has valid format
//! - Logos from data URIs and files
//! - Layout config JSON round-trip and pagination

use receipts_rtl::canvas::{Align, BorderSide, CanvasCall, RecordingCanvas};
use receipts_rtl::document::{Company, Document, DocumentAttributes, DocumentKind};
use receipts_rtl::error::{ConfigError, Error};
use receipts_rtl::fonts::FontManager;
use receipts_rtl::layout_config::{LayoutBox, LayoutConfig};
use receipts_rtl::pipeline::{
    compute_layout_config, generate_pdf, record_calls, PipelineConfig,
};
use receipts_rtl::render::render_pdf;
use receipts_rtl::resources::{ImageData, LogoSource};
use receipts_rtl::templates;

// =====================================================================
// Helper
// =====================================================================

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn acme(email: Option<&str>) -> DocumentAttributes {
    DocumentAttributes {
        company: Some(Company {
            email: email.map(str::to_string),
            ..Company::new("Acme")
        }),
        recipient: Some(["Jane Doe"].into_iter().collect()),
        details: Some(vec![vec!["Date".into(), "2024-01-01".into()]]),
        line_items: Some(vec![
            vec!["Item".into(), "Qty".into(), "Price".into()],
            vec!["Widget".into(), "2".into(), "$10".into()],
        ]),
        ..DocumentAttributes::default()
    }
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = ::image::RgbImage::new(w, h);
    let mut buf = Vec::new();
    ::image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), ::image::ImageFormat::Png)
        .unwrap();
    buf
}

fn png_data_uri(w: u32, h: u32) -> String {
    ImageData {
        location: "test".into(),
        bytes: png(w, h),
    }
    .to_data_uri()
}

fn contents(row: &[receipts_rtl::canvas::Cell]) -> Vec<&str> {
    row.iter().map(|c| c.content.as_str()).collect()
}

fn image_boxes(layout: &LayoutConfig) -> Vec<&LayoutBox> {
    layout
        .all_boxes()
        .into_iter()
        .filter(|b| b.image.is_some())
        .collect()
}

// =====================================================================
// Composer scenario
// =====================================================================

#[test]
fn default_footer_without_email_is_rejected() {
    let err = record_calls(&acme(None), &default_config()).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingCompanyField("email"))
    ));
}

#[test]
fn complete_document_calls_in_order() {
    let canvas = record_calls(
        &acme(Some("a@b.com")),
        &PipelineConfig::for_kind(DocumentKind::Invoice),
    )
    .unwrap();

    let kinds: Vec<&str> = canvas
        .calls
        .iter()
        .map(|c| match c {
            CanvasCall::FontSize { .. } => "font_size",
            CanvasCall::Text { .. } => "text",
            CanvasCall::Image { .. } => "image",
            CanvasCall::Table { .. } => "table",
            CanvasCall::MoveDown { .. } => "move_down",
            CanvasCall::MoveUp { .. } => "move_up",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "font_size", "text", "move_up", "text", // header
            "move_down", "table", // details
            "move_down", "table", // billing
            "move_down", "table", // line items
            "move_down", "text", // footer
        ]
    );
    assert_eq!(canvas.calls[0], CanvasCall::FontSize { size: 8.0 });
}

#[test]
fn header_has_bold_name_left_and_title_right() {
    let canvas = record_calls(
        &acme(Some("a@b.com")),
        &PipelineConfig::for_kind(DocumentKind::Invoice),
    )
    .unwrap();
    let texts: Vec<_> = canvas.texts().collect();

    let (name, name_opts) = texts[0];
    assert_eq!(name, "Acme");
    assert!(name_opts.bold);
    assert_eq!(name_opts.align, Align::Left);

    let (title, title_opts) = texts[1];
    assert!(title_opts.bold);
    assert_eq!(title_opts.align, Align::Right);
    // Shaped presentation forms, not the logical letters.
    assert!(title.chars().all(|c| !('\u{0621}'..='\u{064A}').contains(&c)));
}

#[test]
fn rows_are_mirrored() {
    let canvas = record_calls(&acme(Some("a@b.com")), &default_config()).unwrap();
    let tables: Vec<_> = canvas.tables().collect();
    assert_eq!(tables.len(), 3);

    assert_eq!(contents(&tables[0].rows[0]), vec!["2024-01-01", "Date"]);
    assert_eq!(contents(&tables[1].rows[0]), vec!["Jane Doe", "<b>Acme</b>\na@b.com"]);
    assert_eq!(contents(&tables[2].rows[0]), vec!["Price", "Qty", "Item"]);
    assert_eq!(contents(&tables[2].rows[1]), vec!["$10", "2", "Widget"]);
}

#[test]
fn line_item_borders_cover_header_only_for_two_rows() {
    let canvas = record_calls(&acme(Some("a@b.com")), &default_config()).unwrap();
    let items = canvas.tables().nth(2).unwrap();
    assert_eq!(items.borders_for(0), &[BorderSide::Bottom]);
    assert!(items.borders_for(1).is_empty());
    assert_eq!(items.cell_style.border_color.as_deref(), Some("eeeeee"));
}

#[test]
fn default_footer_links_email() {
    let canvas = record_calls(&acme(Some("a@b.com")), &default_config()).unwrap();
    let (footer, opts) = canvas.texts().last().unwrap();
    assert!(opts.inline_format);
    assert_eq!(opts.align, Align::Right);
    assert!(footer.contains("mailto:a@b.com"));
    assert!(footer.contains("<b>a@b.com</b>"));
}

#[test]
fn custom_footer_replaces_default() {
    let mut attrs = acme(None);
    attrs.footer = Some("Thanks!".into());
    let canvas = record_calls(&attrs, &default_config()).unwrap();
    assert_eq!(canvas.texts().last().unwrap().0, "Thanks!");
}

#[test]
fn logo_replaces_company_name() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.company.as_mut().unwrap().logo = Some(png_data_uri(32, 16).into());
    attrs.logo_height = Some(24.0);
    let canvas = record_calls(&attrs, &PipelineConfig::for_kind(DocumentKind::Receipt)).unwrap();

    match &canvas.calls[1] {
        CanvasCall::Image { options, .. } => {
            assert_eq!(options.height, 24.0);
            assert_eq!(options.position, Align::Left);
        }
        other => panic!("Expected logo, got {other:?}"),
    }
    assert_eq!(canvas.calls[2], CanvasCall::MoveUp { amount: 24.0 });
    assert!(canvas.texts().all(|(t, _)| t != "Acme"));
}

#[test]
fn missing_logo_file_aborts() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.company.as_mut().unwrap().logo = Some("/no/such/logo.png".into());
    let err = record_calls(&attrs, &default_config()).unwrap_err();
    assert!(matches!(err, Error::Resource { .. }));
}

#[test]
fn malformed_markup_is_a_markup_error() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.details = Some(vec![vec!["<b>Date".into(), "2024-01-01".into()]]);
    let err = record_calls(&attrs, &default_config()).unwrap_err();
    assert!(matches!(err, Error::Markup(_)));
}

#[test]
fn blank_document_can_be_composed_piecewise() {
    let mut doc = Document::blank(RecordingCanvas::new(540.0), Some("Memo".into()));
    doc.render_footer("Hello").unwrap();
    let canvas = doc.into_canvas();
    assert_eq!(canvas.texts().count(), 1);
    assert_eq!(canvas.calls.len(), 3);
}

#[test]
fn calls_serialise_to_json() {
    let canvas = record_calls(&acme(Some("a@b.com")), &default_config()).unwrap();
    let json = canvas.to_json().unwrap();
    assert!(json.contains("\"call\": \"table\""));
    assert!(json.contains("\"call\": \"move_down\""));
}

// =====================================================================
// PDF generation tests
// =====================================================================

#[test]
fn generate_pdf_from_minimal_template() {
    let attrs = DocumentAttributes::from_json(templates::minimal_template()).unwrap();
    let (bytes, layout) = generate_pdf(&attrs, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(layout.pages.len(), 1);
}

#[test]
fn generate_pdf_from_every_template() {
    for json in [
        templates::invoice_template(),
        templates::receipt_template(),
        templates::statement_template(),
    ] {
        let attrs = DocumentAttributes::from_json(json).unwrap();
        let (bytes, _) = generate_pdf(&attrs, &PipelineConfig::for_kind(DocumentKind::Invoice)).unwrap();
        assert_valid_pdf(&bytes);
    }
}

#[test]
fn arabic_text_is_shaped_in_layout() {
    let attrs = DocumentAttributes::from_json(templates::invoice_template()).unwrap();
    let layout = compute_layout_config(&attrs, &default_config()).unwrap();
    let text: String = layout
        .all_boxes()
        .into_iter()
        .filter_map(|b| b.text.as_ref())
        .map(|t| t.plain_text())
        .collect();
    assert!(text.chars().any(|c| ('\u{FE70}'..='\u{FEFF}').contains(&c)));
    assert!(!text.chars().any(|c| ('\u{0628}'..='\u{064A}').contains(&c)));
}

#[test]
fn ampersands_in_header_print_literally() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.company.as_mut().unwrap().name = "R&D Labs".into();
    attrs.title = Some("Tom & Jerry".into());
    let layout = compute_layout_config(&attrs, &default_config()).unwrap();
    let texts: Vec<String> = layout
        .all_boxes()
        .into_iter()
        .filter_map(|b| b.text.as_ref())
        .map(|t| t.plain_text())
        .collect();
    assert_eq!(texts[0], "R&D Labs");
    assert_eq!(texts[1], "Tom & Jerry");
    assert!(!texts.iter().any(|t| t.contains("&amp;")));
}

#[test]
fn details_table_is_right_anchored() {
    let layout = compute_layout_config(&acme(Some("a@b.com")), &default_config()).unwrap();
    let rows: Vec<&LayoutBox> = layout.pages[0]
        .boxes
        .iter()
        .filter(|b| !b.children.is_empty())
        .collect();
    let details = rows[0];
    assert!((details.x + details.width - 576.0).abs() < 0.5);
    assert!(details.width < 540.0);
}

#[test]
fn column_width_mismatch_is_a_render_error() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.column_widths = Some(vec![100.0]);
    let err = compute_layout_config(&attrs, &default_config()).unwrap_err();
    assert!(matches!(err, Error::Render(_)));
}

#[test]
fn data_uri_logo_is_embedded() {
    let mut attrs = acme(Some("a@b.com"));
    attrs.company.as_mut().unwrap().logo = Some(png_data_uri(40, 20).into());
    let (bytes, layout) = generate_pdf(&attrs, &default_config()).unwrap();
    assert_valid_pdf(&bytes);

    let images = image_boxes(&layout);
    assert_eq!(images.len(), 1);
    assert!((images[0].height - 16.0).abs() < 0.01);
    assert!((images[0].width - 32.0).abs() < 0.01);
}

#[test]
fn file_logo_is_embedded() {
    let path = std::env::temp_dir().join(format!("receipts-logo-{}.png", std::process::id()));
    std::fs::write(&path, png(10, 10)).unwrap();

    let mut attrs = acme(Some("a@b.com"));
    attrs.company.as_mut().unwrap().logo = Some(LogoSource::Path(path.clone()));
    let result = generate_pdf(&attrs, &default_config());
    let _ = std::fs::remove_file(&path);

    let (bytes, layout) = result.unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(image_boxes(&layout).len(), 1);
}

// =====================================================================
// Pagination tests
// =====================================================================

#[test]
fn long_statement_spans_pages() {
    let attrs = DocumentAttributes::from_json(&templates::multi_page_template(200)).unwrap();
    let (bytes, layout) = generate_pdf(&attrs, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert!(layout.pages.len() > 1, "Expected multiple pages, got {}", layout.pages.len());
    for (i, page) in layout.pages.iter().enumerate() {
        assert_eq!(page.page_index, i);
        for b in &page.boxes {
            assert!(b.y + b.height <= layout.page_height_pt - 36.0 + 0.5);
        }
    }
}

// =====================================================================
// Layout config JSON round-trip
// =====================================================================

#[test]
fn render_from_layout_config_json() {
    let attrs = DocumentAttributes::from_json(templates::receipt_template()).unwrap();
    let config = compute_layout_config(&attrs, &default_config()).unwrap();
    let json = config.to_json().unwrap();
    let parsed = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(config.pages.len(), parsed.pages.len());
    let bytes = render_pdf(&parsed, &FontManager::default()).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn unknown_attribute_is_rejected() {
    let err = DocumentAttributes::from_json(r#"{"company": {"name": "Acme"}, "colour": "red"}"#)
        .unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
