//! Card measurement.
//!
//! Card sizes come from the host (text layout, bitmaps); the layout only consumes them.

use crate::geom::Size;

#[derive(Debug, Clone, Copy)]
pub enum CardContent<'a> {
    Person {
        name: &'a str,
        dates: Option<&'a str>,
    },
    /// Collapsed branch showing only an aggregate count.
    Mini { count: usize },
}

pub trait CardMeasurer {
    fn measure_card(&self, card: CardContent<'_>) -> Size;

    /// Size of a marriage bond. Undated bonds are plain connectors with a fixed width.
    fn measure_bond(&self, label: Option<&str>, bond_width: f64) -> Size;
}

/// Character-count based measurer, deterministic across platforms.
#[derive(Debug, Clone)]
pub struct FixedCardMeasurer {
    pub char_width: f64,
    pub line_height: f64,
    pub padding: f64,
    pub min_width: f64,
}

impl Default for FixedCardMeasurer {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            line_height: 16.0,
            padding: 10.0,
            min_width: 40.0,
        }
    }
}

impl FixedCardMeasurer {
    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width
    }
}

impl CardMeasurer for FixedCardMeasurer {
    fn measure_card(&self, card: CardContent<'_>) -> Size {
        match card {
            CardContent::Person { name, dates } => {
                let mut width = self.text_width(name);
                let mut lines = 1.0;
                if let Some(d) = dates.filter(|d| !d.is_empty()) {
                    width = width.max(self.text_width(d));
                    lines += 1.0;
                }
                Size::new(
                    (width + 2.0 * self.padding).max(self.min_width),
                    lines * self.line_height + 2.0 * self.padding,
                )
            }
            CardContent::Mini { count } => {
                let text = count.to_string();
                Size::new(
                    self.text_width(&text) + self.padding,
                    self.line_height + self.padding / 2.0,
                )
            }
        }
    }

    fn measure_bond(&self, label: Option<&str>, bond_width: f64) -> Size {
        match label.filter(|l| !l.is_empty()) {
            Some(l) => Size::new(
                self.text_width(l) + self.padding,
                self.line_height + self.padding / 2.0,
            ),
            None => Size::new(bond_width, 0.0),
        }
    }
}
