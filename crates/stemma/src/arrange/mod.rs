//! Arrangement pipeline.
//!
//! The phases run in a fixed order over an already built [`Diagram`]:
//! unions, sizing, vertical placement, horizontal seeding and relaxation (see [`relax`]),
//! convergence cleanup, mini placement, normalization, optional mirroring and connectors.

pub mod minis;
pub mod relax;

use crate::diagram::{Diagram, GroupId, NodeId, NodeKind, Side, Union, UnionId, UnionRow};
use crate::geom::Bounds;
use crate::options::LayoutOptions;

impl Diagram {
    /// Lays out the diagram. Card and bond sizes must be set (see [`Diagram::measure`]).
    pub fn arrange(&mut self, options: &LayoutOptions) {
        self.options = options.clone();

        self.build_unions();
        self.size_families();
        self.place_rows();
        tracing::trace!(
            rows = self.union_rows.len(),
            unions = self.unions.len(),
            "vertical placement done"
        );

        self.seed_descendants();
        self.seed_ancestors();
        let iterations = self.relax();
        let shifted = self.balance_convergences();
        tracing::debug!(iterations, shifted, "relaxation done");

        self.place_minis();
        self.normalize();
        if !self.left_to_right {
            self.mirror();
        }
        self.build_connectors();
    }

    /// Partitions each row into unions.
    ///
    /// Groups are visited in row order; a group joins the previous union when that union
    /// holds a node with a partner descending from the group's guardian. That node becomes the
    /// union's convergence `ancestor`.
    pub(crate) fn build_unions(&mut self) {
        self.unions.clear();
        self.union_rows.clear();
        for node in &mut self.nodes {
            node.union = None;
            node.prev = None;
            node.next = None;
        }

        let rows: Vec<(i32, Vec<GroupId>)> = self
            .group_rows
            .iter()
            .map(|(g, row)| (*g, row.groups.clone()))
            .collect();

        for (generation, groups) in rows {
            let mut row_unions: Vec<UnionId> = Vec::new();
            for gid in groups {
                let guardian = self.groups[gid.0].guardian;
                let last = row_unions.last().copied();
                let convergence = match (last, guardian) {
                    (Some(u), Some(guardian)) => self.convergence_node(u, guardian),
                    _ => None,
                };
                let youths = self.groups[gid.0].youths.clone();
                match (convergence, last) {
                    (Some(ancestor), Some(u)) => {
                        let union = &mut self.unions[u.0];
                        union.groups.push(gid);
                        union.nodes.extend(youths);
                        union.ancestor = Some(ancestor);
                        self.groups[gid.0].union = Some(u);
                    }
                    _ if youths.is_empty() => {}
                    _ => {
                        let u = UnionId(self.unions.len());
                        self.unions.push(Union {
                            generation,
                            nodes: youths,
                            groups: vec![gid],
                            ..Default::default()
                        });
                        self.groups[gid.0].union = Some(u);
                        row_unions.push(u);
                    }
                }
            }

            let mut prev: Option<NodeId> = None;
            for (i, &u) in row_unions.iter().enumerate() {
                self.unions[u.0].prev = i.checked_sub(1).map(|p| row_unions[p]);
                self.unions[u.0].next = row_unions.get(i + 1).copied();
                for id in self.unions[u.0].nodes.clone() {
                    self.nodes[id.0].union = Some(u);
                    if let Some(p) = prev {
                        self.nodes[p.0].next = Some(id);
                        self.nodes[id.0].prev = Some(p);
                    }
                    prev = Some(id);
                }
            }

            let central = row_unions.get(row_unions.len() / 2).and_then(|u| {
                let nodes = &self.unions[u.0].nodes;
                nodes.get(nodes.len() / 2).copied()
            });
            self.union_rows.insert(
                generation,
                UnionRow {
                    generation,
                    unions: row_unions,
                    central,
                    ..Default::default()
                },
            );
        }
    }

    /// A node of union `u` with a partner whose origin is `guardian`, outside of the groups
    /// `guardian` already looks after.
    fn convergence_node(&self, u: UnionId, guardian: NodeId) -> Option<NodeId> {
        self.unions[u.0].nodes.iter().copied().find(|&id| {
            let node = &self.nodes[id.0];
            let own = node.group.and_then(|g| self.groups[g.0].guardian);
            own != Some(guardian)
                && node
                    .partners()
                    .iter()
                    .any(|p| self.nodes[p.0].origin == Some(guardian))
        })
    }

    /// Computes family node extents from their partners and bond, then lays the partners out
    /// inside them.
    pub(crate) fn size_families(&mut self) {
        for idx in 0..self.nodes.len() {
            let id = NodeId(idx);
            let Some(f) = self.nodes[idx].as_family() else {
                continue;
            };
            let partners = f.partners.clone();
            let side = f.side;
            let dated = f.bond.is_dated();
            let mut bond_width = f.bond.rect.width;
            // Only a side marriage's oval reaches over the card it is drawn against.
            let overlap = if dated && side.is_some() {
                self.options.marriage_overlap
            } else {
                0.0
            };

            let widths: f64 = partners.iter().map(|p| self.nodes[p.0].rect.width).sum();
            let height = partners
                .iter()
                .map(|p| self.nodes[p.0].rect.height)
                .reduce(f64::max)
                .unwrap_or(self.options.placeholder_height);
            let width = match (partners.len(), side) {
                (0, _) => bond_width,
                (1, Some(_)) => widths + bond_width - overlap,
                (1, None) => {
                    bond_width = 0.0;
                    widths
                }
                _ => widths + bond_width - 2.0 * overlap,
            };

            let node = &mut self.nodes[idx];
            node.rect.width = width;
            node.rect.height = height;
            if let NodeKind::Family(f) = &mut node.kind {
                f.bond.rect.width = bond_width;
                f.bond.overlap = overlap;
            }
            self.place_partners(id);
        }
    }

    /// Lays out partners and bond inside a family node, left to right, vertically centered.
    pub(crate) fn place_partners(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        let Some(f) = node.as_family() else {
            return;
        };
        let x0 = node.rect.x;
        let cy = node.rect.center_y();
        let partners = f.partners.clone();
        let side = f.side;
        let overlap = f.bond.overlap;
        let mut bond = f.bond.rect;

        match (partners.as_slice(), side) {
            ([], _) => bond.x = x0,
            ([spouse], Some(Side::Right)) => {
                bond.x = x0;
                self.nodes[spouse.0].rect.x = bond.right() - overlap;
            }
            ([spouse], Some(Side::Left)) => {
                self.nodes[spouse.0].rect.x = x0;
                bond.x = self.nodes[spouse.0].rect.right() - overlap;
            }
            ([single], None) => {
                self.nodes[single.0].rect.x = x0;
                bond.width = 0.0;
                bond.x = self.nodes[single.0].rect.center_x();
            }
            ([first, second, rest @ ..], _) => {
                self.nodes[first.0].rect.x = x0;
                bond.x = self.nodes[first.0].rect.right() - overlap;
                self.nodes[second.0].rect.x = bond.right() - overlap;
                let mut x = self.nodes[second.0].rect.right();
                for p in rest {
                    self.nodes[p.0].rect.x = x;
                    x += self.nodes[p.0].rect.width;
                }
            }
        }

        bond.set_center_y(cy);
        for p in &partners {
            self.nodes[p.0].rect.set_center_y(cy);
        }
        if let Some(f) = self.nodes[id.0].as_family_mut() {
            f.bond.rect = bond;
        }
    }

    /// Centers a node, its partners and bond on a horizontal axis.
    pub(crate) fn set_node_center_y(&mut self, id: NodeId, cy: f64) {
        self.nodes[id.0].rect.set_center_y(cy);
        let partners = match &mut self.nodes[id.0].kind {
            NodeKind::Family(f) => {
                f.bond.rect.set_center_y(cy);
                f.partners.clone()
            }
            NodeKind::Person(_) => return,
        };
        for p in partners {
            self.nodes[p.0].rect.set_center_y(cy);
        }
    }

    /// Stacks the rows top to bottom; each row is as tall as its tallest node.
    pub(crate) fn place_rows(&mut self) {
        let generations: Vec<i32> = self.union_rows.keys().copied().collect();
        let mut prev: Option<(f64, f64)> = None;
        for generation in generations {
            let nodes = self.row_nodes(generation);
            let max_height = nodes
                .iter()
                .map(|id| self.nodes[id.0].rect.height)
                .fold(0.0, f64::max);
            let axe = match prev {
                None => max_height / 2.0,
                Some((axe, height)) => {
                    axe + height / 2.0 + self.options.vertical_space + max_height / 2.0
                }
            };
            if let Some(row) = self.union_rows.get_mut(&generation) {
                row.y_axe = axe;
                row.max_height = max_height;
            }
            for id in nodes {
                self.set_node_center_y(id, axe);
            }
            prev = Some((axe, max_height));
        }
    }

    /// Translates the drawing so its bounding box starts at the origin and records its size.
    pub(crate) fn normalize(&mut self) {
        let rects = self.placed_rects();
        let Some(bounds) = Bounds::from_rects(&rects) else {
            self.width = 0.0;
            self.height = 0.0;
            return;
        };
        let (dx, dy) = (-bounds.min_x, -bounds.min_y);
        for node in &mut self.nodes {
            node.rect.translate(dx, dy);
            if let NodeKind::Family(f) = &mut node.kind {
                f.bond.rect.translate(dx, dy);
            }
        }
        self.width = bounds.width();
        self.height = bounds.height();
    }

    /// Reflects the diagram horizontally within its width and refreshes the connectors.
    ///
    /// Mirroring twice restores the original geometry.
    pub fn mirror(&mut self) {
        let width = self.width;
        for node in &mut self.nodes {
            node.rect.mirror(width);
            if let NodeKind::Family(f) = &mut node.kind {
                f.bond.rect.mirror(width);
            }
        }
        self.update_connectors();
    }
}
