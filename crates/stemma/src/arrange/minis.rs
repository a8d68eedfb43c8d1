//! Placement of collapsed ancestry and progeny cards.
//!
//! Minis are not row members: they are positioned relative to their owner once the rows are
//! settled, and only take part in the bounding box.

use crate::diagram::{Diagram, NodeId};

impl Diagram {
    pub(crate) fn place_minis(&mut self) {
        let space = self.options.mini_space;
        let mut placed = 0usize;

        for idx in 0..self.nodes.len() {
            let owner = NodeId(idx);
            let node = &self.nodes[idx];
            if node.mini {
                continue;
            }

            // Collapsed ancestry above a person.
            if let Some(origin) = node.origin.filter(|o| self.nodes[o.0].mini) {
                let rect = node.rect;
                let height = self.nodes[origin.0].rect.height;
                let width = self.nodes[origin.0].rect.width;
                self.set_node_x(origin, rect.center_x() - width / 2.0);
                self.set_node_center_y(origin, rect.y - space - height / 2.0);
                placed += 1;
            }

            // Collapsed progeny below a node.
            let Some(youth) = self.nodes[idx].youth else {
                continue;
            };
            if !self.groups[youth.0].mini {
                continue;
            }
            let anchor = self.anchor_x(owner);
            let bottom = self.nodes[idx].rect.bottom();
            for mini in self.groups[youth.0].youths.clone() {
                let rect = &mut self.nodes[mini.0].rect;
                rect.set_center_x(anchor);
                rect.y = bottom + space;
                placed += 1;
            }
        }

        tracing::trace!(placed, "minis placed");
    }
}
