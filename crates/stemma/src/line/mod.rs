//! Connector lines between placed nodes.
//!
//! A `Connector` remembers which nodes it joins; its `Line` is recomputed from their current
//! geometry by [`Connector::update`], so connectors follow the nodes through mirroring and any
//! later re-arrangement.

pub mod batch;

pub use batch::{LineGroup, batch_lines};

use crate::diagram::{Diagram, GroupId, Match, NodeId, NodeKind};
use crate::geom::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// From the bottom of a guardian's stem to the top of one child.
    Curve,
    /// Between a node and a mini card.
    Straight,
    /// Dashed link from a blood person to a distant side marriage.
    Back,
    /// Link from a family to the side marriage next to it.
    Horizontal,
    /// Stem hanging from a guardian.
    Vertical,
    /// Arc joining two nodes that stand for the same family.
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Control point of an arc.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Point>,
}

impl Line {
    pub fn new(kind: LineKind, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            kind,
            x1,
            y1,
            x2,
            y2,
            via: None,
        }
    }

    pub fn dashed(&self) -> bool {
        self.kind == LineKind::Back
    }

    pub fn left(&self) -> f64 {
        let x = self.x1.min(self.x2);
        self.via.map_or(x, |p| x.min(p.x))
    }

    pub fn right(&self) -> f64 {
        let x = self.x1.max(self.x2);
        self.via.map_or(x, |p| x.max(p.x))
    }

    pub fn top(&self) -> f64 {
        let y = self.y1.min(self.y2);
        self.via.map_or(y, |p| y.min(p.y))
    }

    pub fn bottom(&self) -> f64 {
        let y = self.y1.max(self.y2);
        self.via.map_or(y, |p| y.max(p.y))
    }
}

#[derive(Debug, Clone)]
pub struct Connector {
    pub kind: LineKind,
    pub from: NodeId,
    pub to: NodeId,
    /// Sibling group a stem or curve belongs to.
    pub group: Option<GroupId>,
    pub line: Line,
}

impl Connector {
    pub fn new(kind: LineKind, from: NodeId, to: NodeId, group: Option<GroupId>) -> Self {
        Self {
            kind,
            from,
            to,
            group,
            line: Line::new(kind, 0.0, 0.0, 0.0, 0.0),
        }
    }

    /// Recomputes the line from the current geometry of the joined nodes.
    pub fn update(&mut self, diagram: &Diagram) {
        let from = &diagram.node(self.from).rect;
        let to = &diagram.node(self.to).rect;
        self.line = match self.kind {
            LineKind::Vertical => {
                let x = diagram.anchor_x(self.from);
                Line::new(
                    self.kind,
                    x,
                    diagram.stem_top(self.from),
                    x,
                    self.stem_bottom(diagram),
                )
            }
            LineKind::Curve => Line::new(
                self.kind,
                diagram.anchor_x(self.from),
                self.stem_bottom(diagram),
                to.center_x(),
                to.y,
            ),
            LineKind::Straight => Line::new(
                self.kind,
                diagram.anchor_x(self.from),
                from.bottom(),
                to.center_x(),
                to.y,
            ),
            LineKind::Horizontal | LineKind::Back => {
                let bond = diagram.node(self.to).bond().map_or(*to, |b| b.rect);
                let y = bond.center_y();
                if bond.center_x() >= from.center_x() {
                    Line::new(self.kind, from.right(), y, bond.x, y)
                } else {
                    Line::new(self.kind, from.x, y, bond.right(), y)
                }
            }
            LineKind::Duplicate => {
                let top = from.y.min(to.y) - diagram.options.duplicate_arc;
                let mut line =
                    Line::new(self.kind, from.center_x(), from.y, to.center_x(), to.y);
                line.via = Some(Point::new((from.center_x() + to.center_x()) / 2.0, top));
                line
            }
        };
    }

    /// Where the stem of a sibling group ends: halfway between the guardian and its youths.
    fn stem_bottom(&self, diagram: &Diagram) -> f64 {
        let guardian = diagram.node(self.from).rect.bottom();
        let top = self
            .group
            .map(|g| diagram.blood_persons(g))
            .into_iter()
            .flatten()
            .map(|p| diagram.node(p).rect.y)
            .reduce(f64::min)
            .unwrap_or_else(|| diagram.node(self.to).rect.y);
        (guardian + top) / 2.0
    }
}

impl Diagram {
    /// Top of a guardian's stem: the marriage bond for couples, the card bottom otherwise.
    pub(crate) fn stem_top(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Family(f) if f.partners.len() >= 2 || f.side.is_some() => {
                f.bond.rect.bottom()
            }
            _ => node.rect.bottom(),
        }
    }

    /// Rebuilds every connector from the current structure.
    pub(crate) fn build_connectors(&mut self) {
        let mut connectors = Vec::new();

        for (idx, group) in self.groups.iter().enumerate() {
            let id = GroupId(idx);
            let Some(guardian) = group.guardian else {
                continue;
            };
            if group.mini {
                for &mini in &group.youths {
                    connectors.push(Connector::new(LineKind::Straight, guardian, mini, None));
                }
                continue;
            }
            if group.union.is_none() || self.nodes[guardian.0].union.is_none() {
                continue;
            }
            let persons = self.blood_persons(id);
            let Some(&first) = persons.first() else {
                continue;
            };
            connectors.push(Connector::new(LineKind::Vertical, guardian, first, Some(id)));
            for p in persons {
                connectors.push(Connector::new(LineKind::Curve, guardian, p, Some(id)));
            }
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let id = NodeId(idx);
            match &node.kind {
                NodeKind::Person(_) if !node.mini => {
                    if let Some(origin) = node.origin.filter(|o| self.nodes[o.0].mini) {
                        connectors.push(Connector::new(LineKind::Straight, origin, id, None));
                    }
                }
                NodeKind::Family(f) if f.side.is_some() => {
                    let Some(person) = f.spouse_of else {
                        continue;
                    };
                    match f.matching {
                        Match::Middle => {
                            let main = self.nodes[person.0]
                                .as_person()
                                .and_then(|p| p.family)
                                .unwrap_or(person);
                            connectors.push(Connector::new(LineKind::Horizontal, main, id, None));
                        }
                        _ => connectors.push(Connector::new(LineKind::Back, person, id, None)),
                    }
                }
                _ => {}
            }
        }

        for &(a, b) in &self.duplicates {
            connectors.push(Connector::new(LineKind::Duplicate, a, b, None));
        }

        self.connectors = connectors;
        self.update_connectors();
        tracing::trace!(connectors = self.connectors.len(), "connectors built");
    }

    /// Recomputes every connector line from the current geometry.
    pub fn update_connectors(&mut self) {
        let mut connectors = std::mem::take(&mut self.connectors);
        for c in &mut connectors {
            c.update(self);
        }
        self.connectors = connectors;
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.connectors.iter().map(|c| &c.line)
    }
}
