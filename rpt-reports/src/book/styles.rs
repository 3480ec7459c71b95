//! Cell formats used by every report
//!
//! Formats are built once per workbook and borrowed by the sheet writers.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatPattern};
use serde::{Deserialize, Serialize};

const HEADER_FILL: u32 = 0x1F4E78;
const HEADER_FONT: u32 = 0xFFFFFF;
const TOTAL_FILL: u32 = 0xDDEBF7;
const ALERT_FILL: u32 = 0xFFC7CE;
const ALERT_FONT: u32 = 0x9C0006;
const WARN_FILL: u32 = 0xFFEB9C;
const WARN_FONT: u32 = 0x9C5700;

/// How a column's values are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnStyle {
    Text,
    Integer,
    Number,
    Money,
    Percent,
    Date,
}

impl ColumnStyle {
    fn num_format(&self) -> Option<&'static str> {
        match self {
            ColumnStyle::Text => None,
            ColumnStyle::Integer => Some("#,##0"),
            ColumnStyle::Number => Some("#,##0.00"),
            ColumnStyle::Money => Some("$#,##0.00"),
            ColumnStyle::Percent => Some("0.0%"),
            ColumnStyle::Date => Some("mm/dd/yyyy"),
        }
    }
}

/// Fill used by conditional highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Light red fill, dark red text
    Alert,
    /// Yellow fill, brown text
    Warn,
}

/// Every format a report sheet needs
#[derive(Debug, Clone)]
pub struct Styles {
    pub caption: Format,
    pub sub_caption: Format,
    pub header: Format,
    pub notice: Format,
    pub alert: Format,
    pub warn: Format,
    body: [Format; 6],
    total: [Format; 6],
}

impl Styles {
    pub fn new() -> Self {
        let base = Format::new().set_border(FormatBorder::Thin);
        let total_base = base
            .clone()
            .set_bold()
            .set_background_color(TOTAL_FILL)
            .set_pattern(FormatPattern::Solid);

        let styles = [
            ColumnStyle::Text,
            ColumnStyle::Integer,
            ColumnStyle::Number,
            ColumnStyle::Money,
            ColumnStyle::Percent,
            ColumnStyle::Date,
        ];

        Self {
            caption: Format::new()
                .set_bold()
                .set_font_size(14)
                .set_align(FormatAlign::Left)
                .set_align(FormatAlign::VerticalCenter),
            sub_caption: Format::new().set_italic().set_align(FormatAlign::Left),
            header: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_font_color(HEADER_FONT)
                .set_background_color(HEADER_FILL)
                .set_pattern(FormatPattern::Solid)
                .set_border(FormatBorder::Thin),
            notice: Format::new().set_italic(),
            alert: Format::new()
                .set_font_color(ALERT_FONT)
                .set_background_color(ALERT_FILL)
                .set_pattern(FormatPattern::Solid),
            warn: Format::new()
                .set_font_color(WARN_FONT)
                .set_background_color(WARN_FILL)
                .set_pattern(FormatPattern::Solid),
            body: styles.map(|style| with_num_format(base.clone(), style)),
            total: styles.map(|style| with_num_format(total_base.clone(), style)),
        }
    }

    /// Body cell format for a column style
    pub fn body(&self, style: ColumnStyle) -> &Format {
        &self.body[style_index(style)]
    }

    /// Total-row cell format for a column style
    pub fn total(&self, style: ColumnStyle) -> &Format {
        &self.total[style_index(style)]
    }

    /// Conditional highlight format
    pub fn fill(&self, fill: Fill) -> &Format {
        match fill {
            Fill::Alert => &self.alert,
            Fill::Warn => &self.warn,
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::new()
    }
}

fn with_num_format(format: Format, style: ColumnStyle) -> Format {
    match style.num_format() {
        Some(num_format) => format.set_num_format(num_format),
        None => format,
    }
}

fn style_index(style: ColumnStyle) -> usize {
    match style {
        ColumnStyle::Text => 0,
        ColumnStyle::Integer => 1,
        ColumnStyle::Number => 2,
        ColumnStyle::Money => 3,
        ColumnStyle::Percent => 4,
        ColumnStyle::Date => 5,
    }
}
