use crate::geom::Rect;

/// Marriage connector between the partners of a family node.
#[derive(Debug, Clone, Default)]
pub struct Bond {
    pub rect: Rect,
    pub label: Option<String>,
    /// Horizontal overlap of a dated side-marriage oval over the adjacent partner card.
    pub overlap: f64,
}

impl Bond {
    pub fn center_x(&self) -> f64 {
        self.rect.x + self.rect.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.rect.y + self.rect.height / 2.0
    }

    pub fn is_dated(&self) -> bool {
        self.label.as_deref().is_some_and(|l| !l.is_empty())
    }
}
