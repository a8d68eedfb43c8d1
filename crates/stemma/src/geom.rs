//! Geometry primitives shared by every placeable diagram entity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Top-left anchored rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn set_size(&mut self, size: Size) {
        self.width = size.width;
        self.height = size.height;
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn set_center_x(&mut self, cx: f64) {
        self.x = cx - self.width / 2.0;
    }

    pub fn set_center_y(&mut self, cy: f64) {
        self.y = cy - self.height / 2.0;
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Reflects the rectangle about the vertical centerline of a `width`-wide canvas.
    pub fn mirror(&mut self, width: f64) {
        self.x = width - self.x - self.width;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_rects<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Self> {
        let mut it = rects.into_iter();
        let first = it.next()?;
        let mut b = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.right(),
            max_y: first.bottom(),
        };
        for r in it {
            b.include(r);
        }
        Some(b)
    }

    pub fn include(&mut self, r: &Rect) {
        self.min_x = self.min_x.min(r.x);
        self.min_y = self.min_y.min(r.y);
        self.max_x = self.max_x.max(r.right());
        self.max_y = self.max_y.max(r.bottom());
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
