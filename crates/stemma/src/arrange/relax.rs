//! Horizontal placement.
//!
//! Rows are seeded from the fulcrum row outwards (descendants first, then ancestors), then an
//! iterative relaxation pulls parents over their children and unions between their origins.
//! Every move keeps each row free of overlaps through [`Diagram::resolve_overlap`].

use crate::diagram::{Diagram, GroupId, NodeId, UnionId};

/// Shifts below this are treated as no movement.
const EPSILON: f64 = 1e-9;

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

impl Diagram {
    /// Removes overlaps in a row.
    ///
    /// Walks outward from the row's central node, first to the right then to the left. For
    /// every adjacent pair closer than the required gap, everything on the left moves left by
    /// half the overlap and everything on the right moves right by the other half.
    pub fn resolve_overlap(&mut self, generation: i32) {
        let Some(central) = self.union_rows.get(&generation).and_then(|r| r.central) else {
            return;
        };

        let mut cur = central;
        while let Some(next) = self.nodes[cur.0].next {
            self.separate(cur, next);
            cur = next;
        }
        let mut cur = central;
        while let Some(prev) = self.nodes[cur.0].prev {
            self.separate(prev, cur);
            cur = prev;
        }
    }

    fn separate(&mut self, left: NodeId, right: NodeId) {
        let overlap =
            self.nodes[left.0].rect.right() + self.gap(left, right) - self.nodes[right.0].rect.x;
        if overlap <= 0.0 {
            return;
        }
        let half = overlap / 2.0;
        let mut cur = Some(left);
        while let Some(id) = cur {
            self.move_node(id, -half);
            cur = self.nodes[id.0].prev;
        }
        let mut cur = Some(right);
        while let Some(id) = cur {
            self.move_node(id, half);
            cur = self.nodes[id.0].next;
        }
    }

    /// Places a row's nodes consecutively from x = 0 with the required gaps.
    fn seed_row(&mut self, generation: i32) {
        let mut x = 0.0;
        let mut prev: Option<NodeId> = None;
        for id in self.row_nodes(generation) {
            if let Some(p) = prev {
                x += self.gap(p, id);
            }
            self.set_node_x(id, x);
            x += self.nodes[id.0].rect.width;
            prev = Some(id);
        }
    }

    /// Moves every youth group of a row so its blood line is centered under its guardian.
    fn center_youths(&mut self, generation: i32) {
        for id in self.row_nodes(generation) {
            let Some(youth) = self.row_youth(id) else {
                continue;
            };
            let Some(center) = self.group_center(youth) else {
                continue;
            };
            let dx = self.anchor_x(id) - center;
            for y in self.groups[youth.0].youths.clone() {
                self.move_node(y, dx);
            }
        }
    }

    /// Seeds the fulcrum row and every row below it, top to bottom.
    pub(crate) fn seed_descendants(&mut self) {
        let generations: Vec<i32> = self.union_rows.range(0..).map(|(g, _)| *g).collect();
        let mut prev: Option<i32> = None;
        for generation in generations {
            self.seed_row(generation);
            if let Some(above) = prev {
                self.center_youths(above);
            }
            self.resolve_overlap(generation);
            prev = Some(generation);
        }
    }

    /// Seeds the ancestor rows bottom to top; each union moves so its members sit over their
    /// already placed youth groups.
    pub(crate) fn seed_ancestors(&mut self) {
        let generations: Vec<i32> = self.union_rows.range(..0).rev().map(|(g, _)| *g).collect();
        for generation in generations {
            self.seed_row(generation);
            for u in self.row_unions(generation) {
                if let Some(shift) = self.youth_pull(u) {
                    self.move_union(u, shift);
                }
            }
            self.resolve_overlap(generation);
        }
    }

    /// Iterative relaxation. Returns the number of iterations run.
    pub(crate) fn relax(&mut self) -> usize {
        let generations: Vec<i32> = self.union_rows.keys().copied().collect();
        let Some(&last) = generations.last() else {
            return 0;
        };
        let max_iterations = self.options.max_iterations;
        let threshold = self.options.convergence_threshold;

        for iteration in 1..=max_iterations {
            for node in &mut self.nodes {
                node.force = 0.0;
            }

            for &generation in generations.iter().filter(|g| **g >= 0) {
                self.outdistance(generation);
            }

            for &generation in generations.iter().rev().filter(|g| **g >= -1 && **g < last) {
                self.center_over_youths(generation);
                self.resolve_overlap(generation);
            }

            for &generation in generations.iter().rev().filter(|g| **g <= -2) {
                self.pull_ancestors(generation);
                self.resolve_overlap(generation);
            }

            let force: f64 = self.nodes.iter().map(|n| n.force.abs()).sum();
            tracing::trace!(iteration, force, "relaxation step");
            if force < threshold {
                return iteration;
            }
        }
        tracing::debug!(max_iterations, "relaxation stopped before converging");
        max_iterations
    }

    /// Moves youth groups toward alignment under their guardians.
    ///
    /// A group is never pushed outward away from its origin by its whole slack; it only travels
    /// toward the point under its guardian's anchor.
    ///
    /// A group moves by at most half the free space on the side it moves to, so two neighbours
    /// moving toward each other in the same pass cannot collide. Shifts are computed from the
    /// positions at the start of the pass.
    fn outdistance(&mut self, generation: i32) {
        let Some(row) = self.group_rows.get(&generation) else {
            return;
        };
        let mut shifts: Vec<(GroupId, f64)> = Vec::new();
        for &gid in &row.groups {
            let group = &self.groups[gid.0];
            let Some(guardian) = group.guardian else {
                continue;
            };
            if group.mini || group.union.is_none() || self.nodes[guardian.0].union.is_none() {
                continue;
            }
            let (Some(&first), Some(&last)) = (group.youths.first(), group.youths.last()) else {
                continue;
            };
            let Some(center) = self.group_center(gid) else {
                continue;
            };
            let want = self.anchor_x(guardian) - center;
            if want.abs() < EPSILON {
                continue;
            }
            let room = if want > 0.0 {
                self.nodes[last.0].next.map_or(f64::INFINITY, |n| {
                    self.nodes[n.0].rect.x - self.nodes[last.0].rect.right() - self.gap(last, n)
                })
            } else {
                self.nodes[first.0].prev.map_or(f64::INFINITY, |p| {
                    self.nodes[first.0].rect.x - self.nodes[p.0].rect.right() - self.gap(p, first)
                })
            };
            let shift = want.signum() * want.abs().min((room / 2.0).max(0.0));
            if shift.abs() >= EPSILON {
                shifts.push((gid, shift));
            }
        }
        for (gid, shift) in shifts {
            for id in self.groups[gid.0].youths.clone() {
                self.move_node(id, shift);
            }
        }
    }

    /// Re-centers every node of a row that has row youths over its youth group.
    fn center_over_youths(&mut self, generation: i32) {
        let deltas: Vec<(NodeId, f64)> = self
            .row_nodes(generation)
            .into_iter()
            .filter_map(|id| {
                let youth = self.row_youth(id)?;
                let center = self.group_center(youth)?;
                Some((id, center - self.anchor_x(id)))
            })
            .collect();
        for (id, dx) in deltas {
            self.move_node(id, dx);
            self.nodes[id.0].force += dx;
        }
    }

    /// Moves each union of an ancestor row by the average of its pulls, all unions at once.
    fn pull_ancestors(&mut self, generation: i32) {
        let shifts: Vec<(UnionId, f64)> = self
            .row_unions(generation)
            .into_iter()
            .map(|u| {
                let shift = match (self.origin_pull(u), self.youth_pull(u)) {
                    (Some(a), Some(b)) => (a + b) / 2.0,
                    (Some(a), None) | (None, Some(a)) => a,
                    (None, None) => 0.0,
                };
                (u, shift)
            })
            .collect();
        for (u, shift) in shifts {
            self.move_union(u, shift);
            for id in self.unions[u.0].nodes.clone() {
                self.nodes[id.0].force += shift;
            }
        }
    }

    fn row_unions(&self, generation: i32) -> Vec<UnionId> {
        self.union_rows
            .get(&generation)
            .map(|r| r.unions.clone())
            .unwrap_or_default()
    }

    fn move_union(&mut self, u: UnionId, dx: f64) {
        for id in self.unions[u.0].nodes.clone() {
            self.move_node(id, dx);
        }
    }

    /// Guardians of a union's groups that are placed in a row.
    fn union_origins(&self, u: UnionId) -> Vec<(GroupId, NodeId)> {
        self.unions[u.0]
            .groups
            .iter()
            .filter_map(|&g| {
                let guardian = self.groups[g.0].guardian?;
                self.nodes[guardian.0].union.map(|_| (g, guardian))
            })
            .collect()
    }

    /// Mean offset that would center each of the union's groups under its guardian.
    fn origin_pull(&self, u: UnionId) -> Option<f64> {
        let pulls: Vec<f64> = self
            .union_origins(u)
            .into_iter()
            .filter_map(|(g, guardian)| Some(self.anchor_x(guardian) - self.group_center(g)?))
            .collect();
        mean(&pulls)
    }

    /// Mean offset that would put the union's members over their youth groups.
    fn youth_pull(&self, u: UnionId) -> Option<f64> {
        let pulls: Vec<f64> = self.unions[u.0]
            .nodes
            .iter()
            .filter_map(|&id| {
                let youth = self.row_youth(id)?;
                Some(self.group_center(youth)? - self.anchor_x(id))
            })
            .collect();
        mean(&pulls)
    }

    /// Whether union `u` can move by `dx` without coming closer than the required gap to its
    /// neighbours.
    fn union_fits(&self, u: UnionId, dx: f64) -> bool {
        let nodes = &self.unions[u.0].nodes;
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return false;
        };
        if dx > 0.0 {
            self.nodes[last.0].next.is_none_or(|n| {
                let room =
                    self.nodes[n.0].rect.x - self.nodes[last.0].rect.right() - self.gap(last, n);
                dx <= room
            })
        } else {
            self.nodes[first.0].prev.is_none_or(|p| {
                let room =
                    self.nodes[first.0].rect.x - self.nodes[p.0].rect.right() - self.gap(p, first);
                -dx <= room
            })
        }
    }

    /// Cleanup for the parents' and fulcrum rows: a union whose groups hang from two or more
    /// guardians moves to the balanced position between them when its neighbours leave room.
    ///
    /// Moves are all-or-nothing and repeat until no union moves, so calling this again right
    /// away changes nothing and returns zero. Returns the total distance moved.
    pub fn balance_convergences(&mut self) -> f64 {
        let generations: Vec<i32> = self.union_rows.range(-1..=0).map(|(g, _)| *g).collect();
        let mut total = 0.0;
        for generation in generations {
            let unions = self.row_unions(generation);
            for _ in 0..=unions.len() {
                let mut moved = false;
                for &u in &unions {
                    if self.union_origins(u).len() < 2 {
                        continue;
                    }
                    let Some(shift) = self.origin_pull(u) else {
                        continue;
                    };
                    if shift.abs() < EPSILON || !self.union_fits(u, shift) {
                        continue;
                    }
                    self.move_union(u, shift);
                    total += shift.abs();
                    moved = true;
                }
                if !moved {
                    break;
                }
            }
        }
        total
    }
}
