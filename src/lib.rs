//! # receipts-rtl – Arabic receipts, invoices and statements as PDF
//!
//! An attribute bag describing a company, a recipient, detail rows and line
//! items goes in; a right-to-left PDF comes out. The stages are:
//!
//! 1. **Validate** – fail fast on missing attributes ([`document`])
//! 2. **Localize** – shape Arabic letters and reorder to visual order,
//!    leaving inline markup intact ([`shaping`], [`bidi`], [`localize`])
//! 3. **Mirror** – reverse row-shaped data so logical column 0 lands on
//!    the right ([`mirror`])
//! 4. **Compose** – emit placement calls on a [`canvas::Canvas`]
//!    ([`document`])
//! 5. **Place** – wrap text, size tables, break pages ([`page`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! [`pipeline`] runs all of them in one call.

pub mod bidi;
pub mod canvas;
pub mod document;
pub mod error;
pub mod fonts;
pub mod inline;
pub mod layout_config;
pub mod localize;
pub mod markup;
pub mod mirror;
pub mod page;
pub mod pipeline;
pub mod render;
pub mod resources;
pub mod shaping;
pub mod templates;

// Re-exports for convenience
pub use document::{Company, Document, DocumentAttributes, DocumentKind, PageSize};
pub use error::{ConfigError, Error, MarkupError, Result};
pub use localize::Localizer;
pub use pipeline::{generate_pdf, PageOrientation, PipelineConfig};
