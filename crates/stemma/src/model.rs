//! Serializable layout result handed to renderers.

use crate::diagram::{Diagram, NodeKind};
use crate::line::{LineGroup, batch_lines};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramLayout {
    pub width: f64,
    pub height: f64,
    pub max_above: u32,
    pub max_below: u32,
    pub nodes: Vec<LayoutNode>,
    pub bonds: Vec<LayoutBond>,
    pub line_groups: Vec<LineGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutNodeKind {
    Person,
    Family,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: usize,
    pub kind: LayoutNodeKind,
    /// Person or family record id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    pub generation: i32,
    #[serde(default)]
    pub mini: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub count: usize,
    #[serde(default)]
    pub acquired: bool,
    #[serde(default)]
    pub fulcrum: bool,
    /// Family node a person is drawn inside of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<usize>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBond {
    /// Family node the bond belongs to.
    pub node: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

impl Diagram {
    /// Snapshot of the arranged diagram, with connector lines batched for rasterization.
    pub fn to_layout(&self) -> DiagramLayout {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut bonds = Vec::new();
        for (id, node) in self.nodes() {
            let rect = node.rect;
            let (kind, record, label, dates, acquired, family) = match &node.kind {
                NodeKind::Person(p) => (
                    LayoutNodeKind::Person,
                    p.record.clone(),
                    p.label.clone(),
                    p.dates.clone(),
                    p.acquired,
                    p.family.map(|f| f.0),
                ),
                NodeKind::Family(f) => {
                    bonds.push(LayoutBond {
                        node: id.0,
                        label: f.bond.label.clone(),
                        x: f.bond.rect.x,
                        y: f.bond.rect.y,
                        width: f.bond.rect.width,
                        height: f.bond.rect.height,
                    });
                    (
                        LayoutNodeKind::Family,
                        f.record.clone(),
                        String::new(),
                        None,
                        false,
                        None,
                    )
                }
            };
            nodes.push(LayoutNode {
                id: id.0,
                kind,
                record,
                label,
                dates,
                generation: node.generation,
                mini: node.mini,
                count: node.count,
                acquired,
                fulcrum: self.fulcrum == Some(id),
                family,
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            });
        }

        let lines: Vec<_> = self.lines().copied().collect();
        DiagramLayout {
            width: self.width,
            height: self.height,
            max_above: self.max_above(),
            max_below: self.max_below(),
            nodes,
            bonds,
            line_groups: batch_lines(&lines, self.options.max_bitmap_size),
        }
    }
}
