//! Grouping of connector lines into renderable batches.
//!
//! Hosts rasterize each group into one bitmap, so no group may cover more than
//! `max_bitmap_size` horizontally or sit in more than one vertical band of that size.

use super::Line;
use crate::geom::Bounds;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineGroup {
    /// Vertical band, `floor(bottom / max_bitmap_size)`.
    pub bucket: i64,
    /// Left edge of the first line in the group.
    pub restart_x: f64,
    pub bounds: Bounds,
    pub lines: Vec<Line>,
}

impl LineGroup {
    fn new(bucket: i64, line: Line) -> Self {
        Self {
            bucket,
            restart_x: line.left(),
            bounds: line_bounds(&line),
            lines: vec![line],
        }
    }

    fn push(&mut self, line: Line) {
        let b = line_bounds(&line);
        self.bounds.min_x = self.bounds.min_x.min(b.min_x);
        self.bounds.min_y = self.bounds.min_y.min(b.min_y);
        self.bounds.max_x = self.bounds.max_x.max(b.max_x);
        self.bounds.max_y = self.bounds.max_y.max(b.max_y);
        self.lines.push(line);
    }
}

fn line_bounds(line: &Line) -> Bounds {
    Bounds {
        min_x: line.left(),
        min_y: line.top(),
        max_x: line.right(),
        max_y: line.bottom(),
    }
}

fn compare_lines(a: &Line, b: &Line) -> Ordering {
    a.left()
        .total_cmp(&b.left())
        .then_with(|| a.top().total_cmp(&b.top()))
        .then_with(|| a.right().total_cmp(&b.right()))
}

/// Sorts lines by their left edge and cuts them into groups no wider than `max_bitmap_size`,
/// one set of groups per vertical band.
pub fn batch_lines(lines: &[Line], max_bitmap_size: f64) -> Vec<LineGroup> {
    let max = if max_bitmap_size.is_finite() && max_bitmap_size > 0.0 {
        max_bitmap_size
    } else {
        f64::INFINITY
    };

    let mut sorted = lines.to_vec();
    sorted.sort_by(compare_lines);

    let mut buckets: BTreeMap<i64, Vec<LineGroup>> = BTreeMap::new();
    for line in sorted {
        let bucket = if max.is_finite() {
            (line.bottom() / max).floor() as i64
        } else {
            0
        };
        let groups = buckets.entry(bucket).or_default();
        match groups.last_mut() {
            Some(group)
                if line.left() < group.restart_x + max && line.right() <= group.restart_x + max =>
            {
                group.push(line);
            }
            _ => groups.push(LineGroup::new(bucket, line)),
        }
    }

    let groups: Vec<LineGroup> = buckets.into_values().flatten().collect();
    tracing::trace!(lines = lines.len(), groups = groups.len(), "lines batched");
    groups
}
