/// Centimetres to points.
pub fn cm(value: f32) -> f32 {
    value / 2.54 * 72.0
}

pub(crate) fn pts_to_twips(pts: f32) -> i64 {
    (pts * 20.0).round() as i64
}

/// Page geometry in points. The default is A4 with GB/T 9704 margins.
#[derive(Clone, Debug, PartialEq)]
pub struct PageSetup {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub header_margin: f32,
    pub footer_margin: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            page_width: 595.3,
            page_height: 841.9,
            margin_top: cm(2.54),
            margin_bottom: cm(2.54),
            margin_left: cm(3.18),
            margin_right: cm(3.18),
            header_margin: cm(1.5),
            footer_margin: cm(1.75),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssembleOptions {
    pub page: PageSetup,
    /// First-line indent of the reference block's lead line.
    pub reference_indent_pt: f32,
    /// First-line indent of each entry when several attachments are listed.
    pub reference_item_indent_pt: f32,
    pub max_attachments: usize,
    /// Titles longer than this many characters are wrapped onto two lines.
    pub title_wrap_chars: usize,
    /// Footer page-number size.
    pub footer_font_size: f32,
    /// Creation time written to `docProps/core.xml`; the current time when
    /// unset. Fixing it makes output byte-for-byte reproducible.
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            page: PageSetup::default(),
            reference_indent_pt: 32.0,
            reference_item_indent_pt: 64.0,
            max_attachments: 3,
            title_wrap_chars: 20,
            footer_font_size: 14.0,
            timestamp: None,
        }
    }
}
