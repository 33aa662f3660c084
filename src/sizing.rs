use serde::Deserialize;

use crate::geometry::Size;
use crate::graph::{MIN_NODE_HEIGHT, MIN_NODE_WIDTH};
use crate::text_metrics::{FontSpec, MonospaceMeasure, TextMeasure};

/// Widest text block before a label starts to wrap.
pub const MAX_TEXT_WIDTH: f32 = 300.0;

pub const DEFAULT_PADDING: f32 = 30.0;

/// Settings for fitting a node around its label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    pub padding: f32,
    pub font_family: String,
    pub font_size: f32,
    pub char_width_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        let font = FontSpec::default();
        let measure = MonospaceMeasure::default();
        Self {
            padding: DEFAULT_PADDING,
            font_family: font.family,
            font_size: font.point_size,
            char_width_ratio: measure.char_width_ratio,
            line_height_ratio: measure.line_height_ratio,
        }
    }
}

impl SizingConfig {
    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            point_size: self.font_size,
        }
    }

    pub fn measure(&self) -> MonospaceMeasure {
        MonospaceMeasure {
            char_width_ratio: self.char_width_ratio,
            line_height_ratio: self.line_height_ratio,
        }
    }
}

/// Smallest node size that fits `label` with `padding` around it.
///
/// Width follows the unwrapped text up to `MAX_TEXT_WIDTH + padding`, past
/// which the label wraps and the height grows instead. Depends only on the
/// label, so applying it twice yields the same size.
pub fn auto_fit(label: &str, measure: &dyn TextMeasure, font: &FontSpec, padding: f32) -> Size {
    let unwrapped = measure.measure(label, font, None).width().ceil();
    let width = (unwrapped + padding).clamp(MIN_NODE_WIDTH, MAX_TEXT_WIDTH + padding);

    let block = measure.measure(label, font, Some(width - padding));
    let height = MIN_NODE_HEIGHT.max(block.height().ceil() + padding);

    Size::new(width, height)
}
