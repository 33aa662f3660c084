use unicode_width::UnicodeWidthStr;

use crate::geometry::Size;

/// Font a label is measured with.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub point_size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            point_size: 9.0,
        }
    }
}

/// Text measurement capability the sizing code depends on.
///
/// Hosts with a real text engine implement this over their font stack.
/// `wrap_width` of `None` measures the text without wrapping.
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: Option<f32>) -> Size;
}

/// Deterministic measure treating every display column as a fixed fraction
/// of the point size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub char_width_ratio: f32,
    pub line_height_ratio: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.5,
            line_height_ratio: 1.5,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font: &FontSpec, wrap_width: Option<f32>) -> Size {
        let column_width = font.point_size * self.char_width_ratio;
        let (columns, line_count) = match wrap_width {
            Some(width) if column_width > 0.0 => {
                let max_columns = ((width / column_width).floor() as usize).max(1);
                let lines = wrap_lines(text, max_columns);
                let columns = lines.iter().map(|l| display_width(l)).max().unwrap_or(0);
                (columns, lines.len())
            }
            _ => (multiline_width(text), text.split('\n').count()),
        };

        Size::new(
            columns as f32 * column_width,
            line_count as f32 * font.point_size * self.line_height_ratio,
        )
    }
}

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Maximum display width among the lines of `s`.
pub fn multiline_width(s: &str) -> usize {
    s.split('\n').map(display_width).max().unwrap_or(0)
}

/// Greedy word wrap of every line of `text` to `max_columns` display
/// columns. Words wider than a whole line are split between characters.
pub fn wrap_lines(text: &str, max_columns: usize) -> Vec<String> {
    let mut wrapped = Vec::new();

    for line in text.split('\n') {
        let mut current = String::new();
        for word in line.split(' ') {
            let separator = usize::from(!current.is_empty());
            if display_width(&current) + separator + display_width(word) <= max_columns {
                if separator == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }

            if !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                let mut buf = [0u8; 4];
                let ch_width = display_width(ch.encode_utf8(&mut buf));
                if !current.is_empty() && display_width(&current) + ch_width > max_columns {
                    wrapped.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
        }
        wrapped.push(current);
    }

    wrapped
}
