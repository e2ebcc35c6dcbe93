//! Pipeline – ties together validation, composition, page placement and
//! rendering into a single function call.

use crate::canvas::{Canvas, RecordingCanvas};
use crate::document::{Document, DocumentAttributes, DocumentKind};
use crate::error::Result;
use crate::fonts::FontManager;
use crate::layout_config::LayoutConfig;
use crate::page::PageCanvas;
use crate::render::render_pdf;

/// Default page margin in points (half an inch).
pub const PAGE_MARGIN_PT: f32 = 36.0;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Preset that supplies the title when the attributes carry none.
    pub kind: Option<DocumentKind>,
    /// Page orientation; swaps the page size's width and height when `Landscape`.
    pub orientation: PageOrientation,
    /// Page margin in points (default: 36).
    pub page_margin: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            kind: None,
            orientation: PageOrientation::Portrait,
            page_margin: PAGE_MARGIN_PT,
        }
    }
}

impl PipelineConfig {
    pub fn for_kind(kind: DocumentKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Effective `(width, height)` of a page after applying orientation.
    pub fn page_dimensions(&self, attributes: &DocumentAttributes) -> (f32, f32) {
        let (w, h) = attributes.page_size.dimensions();
        match self.orientation {
            PageOrientation::Portrait => (w, h),
            PageOrientation::Landscape => (h, w),
        }
    }

    /// Width between the left and right margins.
    pub fn bounds_width(&self, attributes: &DocumentAttributes) -> f32 {
        self.page_dimensions(attributes).0 - 2.0 * self.page_margin
    }
}

/// Full pipeline: attributes → PDF bytes.
///
/// Returns `(pdf_bytes, layout_config)`.
pub fn generate_pdf(
    attributes: &DocumentAttributes,
    config: &PipelineConfig,
) -> Result<(Vec<u8>, LayoutConfig)> {
    let fonts = FontManager::for_document(attributes.font.as_ref())?;
    let layout = layout_with(attributes, config, fonts.clone())?;
    let pdf_bytes = render_pdf(&layout, &fonts)?;
    log::info!(
        "Generated {} byte PDF over {} page(s)",
        pdf_bytes.len(),
        layout.pages.len()
    );
    Ok((pdf_bytes, layout))
}

/// Generate only the layout config (no PDF rendering) – useful for testing.
pub fn compute_layout_config(
    attributes: &DocumentAttributes,
    config: &PipelineConfig,
) -> Result<LayoutConfig> {
    let fonts = FontManager::for_document(attributes.font.as_ref())?;
    layout_with(attributes, config, fonts)
}

/// Compose onto a [`RecordingCanvas`] and return it with the placement calls.
pub fn record_calls(
    attributes: &DocumentAttributes,
    config: &PipelineConfig,
) -> Result<RecordingCanvas> {
    let canvas = RecordingCanvas::new(config.bounds_width(attributes));
    let doc = Document::new(canvas, config.kind, attributes)?;
    Ok(doc.into_canvas())
}

fn layout_with(
    attributes: &DocumentAttributes,
    config: &PipelineConfig,
    fonts: FontManager,
) -> Result<LayoutConfig> {
    let (width, height) = config.page_dimensions(attributes);
    let canvas = PageCanvas::new(width, height, config.page_margin, fonts);
    log::debug!(
        "Composing {}x{} pt page, content width {}",
        width,
        height,
        canvas.bounds_width()
    );

    let doc = Document::new(canvas, config.kind, attributes)?;
    let title = doc.title().unwrap_or("receipt").to_string();
    Ok(doc.into_canvas().finish(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Company, PageSize};

    fn attributes() -> DocumentAttributes {
        DocumentAttributes {
            company: Some(Company {
                email: Some("billing@acme.test".into()),
                ..Company::new("Acme")
            }),
            recipient: Some(["Jane Doe", "1 Side St"].into_iter().collect()),
            details: Some(vec![vec!["Date".into(), "2024-01-01".into()]]),
            line_items: Some(vec![
                vec!["Item".into(), "Qty".into(), "Price".into()],
                vec!["Widget".into(), "2".into(), "$10".into()],
            ]),
            ..DocumentAttributes::default()
        }
    }

    #[test]
    fn pipeline_basic() {
        let (bytes, layout) = generate_pdf(&attributes(), &PipelineConfig::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.page_width_pt, 612.0);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let mut attrs = attributes();
        attrs.page_size = PageSize::A4;
        let config = PipelineConfig {
            orientation: PageOrientation::Landscape,
            ..PipelineConfig::default()
        };
        let layout = compute_layout_config(&attrs, &config).unwrap();
        assert_eq!(layout.page_width_pt, 841.89);
        assert_eq!(layout.page_height_pt, 595.28);
    }

    #[test]
    fn kind_names_the_layout() {
        let layout =
            compute_layout_config(&attributes(), &PipelineConfig::for_kind(DocumentKind::Invoice))
                .unwrap();
        assert_eq!(layout.title, "فاتورة");
    }

    #[test]
    fn recorded_width_is_page_minus_margins() {
        let canvas = record_calls(&attributes(), &PipelineConfig::default()).unwrap();
        assert_eq!(canvas.width, 540.0);
        assert_eq!(canvas.tables().count(), 3);
    }
}
