//! Document attributes and the composer that turns them into placement calls.
//!
//! Composition always runs header → details → billing → line items → footer.
//! Every string passes through the [`Localizer`] and every row-shaped block
//! through [`crate::mirror`] before it reaches the [`Canvas`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::canvas::{
    Align, BorderSide, Canvas, Cell, CellStyle, ImageOptions, Padding, RowBorders, TableSpec,
    TextOptions,
};
use crate::error::{ConfigError, Result};
use crate::fonts::FontFamily;
use crate::localize::Localizer;
use crate::markup;
use crate::mirror::{bordered_rows, mirror_row, mirror_table};
use crate::resources::{load_image, LogoSource};

/// Body text size.
pub const BASE_FONT_SIZE: f32 = 8.0;
/// Company name and title size.
pub const HEADER_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_LOGO_HEIGHT: f32 = 16.0;
const COMPANY_NAME_COLOR: &str = "4b5563";
const FOOTER_LINK_COLOR: &str = "326d92";
const LINE_ITEM_BORDER_COLOR: &str = "eeeeee";

const DETAILS_MARGIN_TOP: f32 = 16.0;
const BILLING_MARGIN_TOP: f32 = 16.0;
const LINE_ITEMS_MARGIN_TOP: f32 = 30.0;
const FOOTER_MARGIN_TOP: f32 = 30.0;

const CONTACT_US: &str = "اذا كان لديكم أسئلة، اتصلوا بنا في أي وقت عن طريق الايميل ";
const MAIL_SUBJECT: &str = "لدي سؤال بخصوص فاتورة";

const DEFAULT_DISPLAY: [&str; 3] = ["address", "phone", "email"];

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Issuing company.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: Option<LogoSource>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Field names shown in the billing block, in order.
    #[serde(default)]
    pub display: Option<Vec<String>>,
    /// Any other scalar fields, addressable from `display`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

/// An extra company field as text. Numbers and booleans keep their JSON
/// spelling; `null` is blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ScalarRepr")]
pub struct FieldValue(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarRepr {
    Null,
    Text(String),
    Bool(bool),
    Number(serde_json::Number),
}

impl From<ScalarRepr> for FieldValue {
    fn from(r: ScalarRepr) -> Self {
        match r {
            ScalarRepr::Null => FieldValue::default(),
            ScalarRepr::Text(text) => FieldValue(text),
            ScalarRepr::Bool(b) => FieldValue(b.to_string()),
            ScalarRepr::Number(n) => FieldValue(n.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue(s)
    }
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Look up a field by name; blank values count as missing.
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "name" => Some(self.name.as_str()),
            "address" => self.address.as_deref(),
            "phone" => self.phone.as_deref(),
            "email" => self.email.as_deref(),
            other => self.extra.get(other).map(|v| v.0.as_str()),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Values of the display fields, in display order, missing ones dropped.
    pub fn display_values(&self) -> Vec<&str> {
        match &self.display {
            Some(keys) => keys.iter().filter_map(|k| self.field(k)).collect(),
            None => DEFAULT_DISPLAY.iter().filter_map(|k| self.field(k)).collect(),
        }
    }
}

/// Recipient lines, top to bottom. Accepts a single string or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RecipientRepr")]
pub struct Recipient {
    pub lines: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientRepr {
    One(String),
    Many(Vec<String>),
}

impl From<RecipientRepr> for Recipient {
    fn from(r: RecipientRepr) -> Self {
        match r {
            RecipientRepr::One(line) => Recipient { lines: vec![line] },
            RecipientRepr::Many(lines) => Recipient { lines },
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Recipient {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Recipient {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
    Legal,
    Custom {
        width: f32,
        height: f32,
    },
}

impl PageSize {
    /// `(width, height)` in points, portrait.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

/// Everything needed to compose one document.
///
/// A bag with none of the content fields set produces a blank document that
/// can be filled by calling the sub-composers directly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentAttributes {
    pub company: Option<Company>,
    pub recipient: Option<Recipient>,
    /// `[label, value]` rows.
    pub details: Option<Vec<Vec<String>>>,
    /// First row is the header, last row the total.
    pub line_items: Option<Vec<Vec<String>>>,
    /// Widths in visual (mirrored) column order.
    pub column_widths: Option<Vec<f32>>,
    pub footer: Option<String>,
    pub title: Option<String>,
    pub logo_height: Option<f32>,
    pub font: Option<FontFamily>,
    #[serde(default)]
    pub page_size: PageSize,
}

impl DocumentAttributes {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// No content-bearing field is set.
    pub fn is_blank(&self) -> bool {
        self.company.is_none()
            && self.recipient.is_none()
            && self.details.is_none()
            && self.line_items.is_none()
            && self.footer.is_none()
    }

    pub fn logo_height(&self) -> f32 {
        self.logo_height.unwrap_or(DEFAULT_LOGO_HEIGHT)
    }

    /// Fail-fast checks, run before anything is placed.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.is_blank() {
            return Ok(());
        }
        let company = self.company.as_ref().ok_or(ConfigError::MissingKey("company"))?;
        if self.details.is_none() {
            return Err(ConfigError::MissingKey("details"));
        }
        if self.recipient.is_none() {
            return Err(ConfigError::MissingKey("recipient"));
        }
        if self.line_items.is_none() {
            return Err(ConfigError::MissingKey("line_items"));
        }
        if company.field("name").is_none() {
            return Err(ConfigError::MissingCompanyField("name"));
        }
        if self.footer.is_none() && company.field("email").is_none() {
            return Err(ConfigError::MissingCompanyField("email"));
        }
        Ok(())
    }
}

/// Preset document types; each supplies a default title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Receipt,
    Statement,
}

impl DocumentKind {
    pub fn title(self) -> &'static str {
        match self {
            DocumentKind::Invoice => "فاتورة",
            DocumentKind::Receipt => "إيصال",
            DocumentKind::Statement => "كشف حساب",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocumentKind::Invoice),
            "receipt" => Ok(DocumentKind::Receipt),
            "statement" => Ok(DocumentKind::Statement),
            other => Err(format!("unknown document kind `{other}`")),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Receipt => "receipt",
            DocumentKind::Statement => "statement",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Composes one document onto a canvas. Not reusable across documents.
pub struct Document<C: Canvas> {
    canvas: C,
    localizer: Localizer,
    title: Option<String>,
}

impl<C: Canvas> Document<C> {
    /// Validate `attributes` and compose the whole document.
    ///
    /// The title is `attributes.title`, else the kind's default title.
    pub fn new(canvas: C, kind: Option<DocumentKind>, attributes: &DocumentAttributes) -> Result<Self> {
        attributes.validate()?;
        let title = attributes
            .title
            .clone()
            .or_else(|| kind.map(|k| k.title().to_string()));
        let mut doc = Self::blank(canvas, title);
        doc.generate_from(attributes)?;
        Ok(doc)
    }

    /// A document with nothing placed yet, for piecewise composition.
    pub fn blank(mut canvas: C, title: Option<String>) -> Self {
        canvas.set_font_size(BASE_FONT_SIZE);
        Self {
            canvas,
            localizer: Localizer::default(),
            title,
        }
    }

    /// Swap the shaping/reordering pipeline.
    pub fn with_localizer(mut self, localizer: Localizer) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    /// Run every sub-composer in document order. Blank bags place nothing.
    pub fn generate_from(&mut self, attributes: &DocumentAttributes) -> Result<()> {
        attributes.validate()?;
        let (Some(company), Some(details), Some(recipient), Some(line_items)) = (
            attributes.company.as_ref(),
            attributes.details.as_ref(),
            attributes.recipient.as_ref(),
            attributes.line_items.as_ref(),
        ) else {
            log::debug!("Blank attributes; nothing to compose");
            return Ok(());
        };

        self.header(company, attributes.logo_height())?;
        self.render_details(details)?;
        self.render_billing_details(company, &recipient.lines)?;
        self.render_line_items(line_items, attributes.column_widths.as_deref())?;
        let footer = match &attributes.footer {
            Some(footer) => footer.clone(),
            None => Self::default_message(company)?,
        };
        self.render_footer(&footer)
    }

    /// Logo (or bold company name) on the left, title on the right, both
    /// on the same line.
    pub fn header(&mut self, company: &Company, height: f32) -> Result<()> {
        match &company.logo {
            Some(logo) => {
                let image = load_image(logo)?;
                self.canvas.image(
                    &image,
                    &ImageOptions {
                        height,
                        position: Align::Left,
                    },
                )?;
            }
            None => {
                let name = company
                    .field("name")
                    .ok_or(ConfigError::MissingCompanyField("name"))?;
                self.canvas.text(
                    &self.localizer.localize(name)?,
                    &TextOptions {
                        size: Some(HEADER_FONT_SIZE),
                        bold: true,
                        color: Some(COMPANY_NAME_COLOR.to_string()),
                        align: Align::Left,
                        inline_format: true,
                    },
                )?;
            }
        }

        if let Some(title) = self.title.clone() {
            self.canvas.move_up(height);
            self.canvas.text(
                &self.localizer.localize(&title)?,
                &TextOptions {
                    size: Some(HEADER_FONT_SIZE),
                    bold: true,
                    align: Align::Right,
                    inline_format: true,
                    ..TextOptions::default()
                },
            )?;
        }
        log::debug!("Composed header");
        Ok(())
    }

    /// `[label, value]` rows, mirrored to `[value, label]` and right-anchored.
    pub fn render_details(&mut self, details: &[Vec<String>]) -> Result<()> {
        self.canvas.move_down(DETAILS_MARGIN_TOP);
        if details.is_empty() {
            log::debug!("No details to compose");
            return Ok(());
        }

        let rows = mirror_table(details)
            .iter()
            .map(|row| self.localized_cells(row))
            .collect::<Result<Vec<_>>>()?;

        self.canvas.table(&TableSpec {
            rows,
            position: Align::Right,
            cell_style: CellStyle {
                borders: Vec::new(),
                padding: Padding::from([0.0, 0.0, 2.0, 8.0]),
                align: Align::Right,
                inline_format: true,
                border_color: None,
            },
            ..TableSpec::default()
        })?;
        log::debug!("Composed {} detail rows", details.len());
        Ok(())
    }

    /// Company block and recipient block side by side, company on the right.
    pub fn render_billing_details<S: AsRef<str>>(&mut self, company: &Company, recipient: &[S]) -> Result<()> {
        self.canvas.move_down(BILLING_MARGIN_TOP);

        let name = company
            .field("name")
            .ok_or(ConfigError::MissingCompanyField("name"))?;
        let company_details = company.display_values().join("\n");
        let mut company_block = format!("<b>{}</b>", self.localizer.localize(name)?);
        if !company_details.is_empty() {
            company_block.push('\n');
            company_block.push_str(&self.localizer.localize(&company_details)?);
        }

        let recipient_lines: Vec<&str> = recipient.iter().map(AsRef::as_ref).collect();
        let recipient_block = self.localizer.localize(&recipient_lines.join("\n"))?;

        let cell_padding = Padding::from([0.0, 0.0, 0.0, 12.0]);
        let pair = mirror_row(&[
            Cell::new(company_block).with_padding(cell_padding),
            Cell::new(recipient_block).with_padding(cell_padding),
        ]);

        let width = self.canvas.bounds_width();
        self.canvas.table(&TableSpec {
            rows: vec![pair],
            width: Some(width),
            cell_style: CellStyle {
                borders: Vec::new(),
                align: Align::Right,
                inline_format: true,
                ..CellStyle::default()
            },
            ..TableSpec::default()
        })?;
        log::debug!("Composed billing details");
        Ok(())
    }

    /// Line-item table: columns mirrored, header and total boundary bordered.
    pub fn render_line_items(&mut self, line_items: &[Vec<String>], column_widths: Option<&[f32]>) -> Result<()> {
        self.canvas.move_down(LINE_ITEMS_MARGIN_TOP);
        if line_items.is_empty() {
            log::debug!("No line items to compose");
            return Ok(());
        }

        let rows = mirror_table(line_items)
            .iter()
            .map(|row| self.localized_cells(row))
            .collect::<Result<Vec<_>>>()?;

        let row_borders = bordered_rows(rows.len())
            .into_iter()
            .map(|row| RowBorders {
                row,
                sides: vec![BorderSide::Bottom],
            })
            .collect();

        let width = self.canvas.bounds_width();
        self.canvas.table(&TableSpec {
            rows,
            width: Some(width),
            position: Align::Left,
            column_widths: column_widths.map(<[f32]>::to_vec),
            cell_style: CellStyle {
                borders: Vec::new(),
                border_color: Some(LINE_ITEM_BORDER_COLOR.to_string()),
                padding: Padding::uniform(6.0),
                align: Align::Right,
                inline_format: true,
            },
            row_borders,
        })?;
        log::debug!("Composed {} line-item rows", line_items.len());
        Ok(())
    }

    pub fn render_footer(&mut self, message: &str) -> Result<()> {
        self.canvas.move_down(FOOTER_MARGIN_TOP);
        self.canvas.text(
            &self.localizer.localize(message)?,
            &TextOptions {
                align: Align::Right,
                inline_format: true,
                ..TextOptions::default()
            },
        )?;
        log::debug!("Composed footer");
        Ok(())
    }

    /// "Contact us" footer in logical order, linking the company email.
    pub fn default_message(company: &Company) -> Result<String> {
        let email = company
            .field("email")
            .ok_or(ConfigError::MissingCompanyField("email"))?;
        let email = markup::escape(email);
        Ok(format!(
            "<color rgb='{FOOTER_LINK_COLOR}'><link href='mailto:{email}?subject={MAIL_SUBJECT}'><b>{email}</b></link></color> {CONTACT_US}"
        ))
    }

    fn localized_cells(&self, row: &[String]) -> Result<Vec<Cell>> {
        Ok(self
            .localizer
            .localize_all(row)?
            .into_iter()
            .map(Cell::new)
            .collect())
    }
}
