//! The diagram graph: an arena of nodes, sibling groups, unions and rows.
//!
//! Every back-reference (`origin`, `union`, `prev`/`next`) is an index into the arena. Ownership
//! only flows down: guardian → youth group → nodes, row → groups/unions.

pub mod bond;
pub mod group;
pub mod node;
pub mod union;

pub use bond::Bond;
pub use group::{Group, GroupRow};
pub use node::{FamilyNode, Match, Node, NodeKind, PersonNode, Side};
pub use union::{Union, UnionRow};

use crate::geom::{Rect, Size};
use crate::line::Connector;
use crate::measure::{CardContent, CardMeasurer};
use crate::options::LayoutOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnionId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub(crate) nodes: Vec<Node>,
    pub(crate) groups: Vec<Group>,
    pub(crate) unions: Vec<Union>,
    pub(crate) group_rows: BTreeMap<i32, GroupRow>,
    pub(crate) union_rows: BTreeMap<i32, UnionRow>,
    pub(crate) fulcrum: Option<NodeId>,
    pub(crate) duplicates: Vec<(NodeId, NodeId)>,
    pub(crate) connectors: Vec<Connector>,
    pub(crate) options: LayoutOptions,
    pub(crate) left_to_right: bool,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl Diagram {
    pub fn new() -> Self {
        Self {
            left_to_right: true,
            ..Default::default()
        }
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_person(&mut self, generation: i32, person: PersonNode) -> NodeId {
        self.push_node(Node::new(NodeKind::Person(person), generation))
    }

    /// Adds a collapsed card standing for `count` hidden relatives.
    pub fn add_mini_person(&mut self, generation: i32, count: usize) -> NodeId {
        let mut node = Node::new(NodeKind::Person(PersonNode::default()), generation);
        node.mini = true;
        node.count = count;
        self.push_node(node)
    }

    /// Adds a family node; its partners are bound to it and moved to its generation.
    pub fn add_family(&mut self, generation: i32, family: FamilyNode) -> NodeId {
        let partners = family.partners.clone();
        let id = self.push_node(Node::new(NodeKind::Family(family), generation));
        for p in partners {
            let partner = &mut self.nodes[p.0];
            partner.generation = generation;
            if let NodeKind::Person(person) = &mut partner.kind {
                person.family = Some(id);
            }
        }
        id
    }

    pub fn set_mini(&mut self, id: NodeId, count: usize) {
        let node = &mut self.nodes[id.0];
        node.mini = true;
        node.count = count;
    }

    /// Opens a sibling group on `generation` under `guardian` and appends it to its row.
    pub fn add_group(&mut self, generation: i32, guardian: Option<NodeId>) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            generation,
            guardian,
            ..Default::default()
        });
        if let Some(g) = guardian {
            self.nodes[g.0].youth = Some(id);
        }
        self.group_rows
            .entry(generation)
            .or_insert_with(|| GroupRow {
                generation,
                groups: Vec::new(),
            })
            .groups
            .push(id);
        id
    }

    /// Hangs a collapsed progeny card under `owner`, outside of the rows.
    pub fn add_mini_progeny(&mut self, owner: NodeId, count: usize) -> GroupId {
        let generation = self.nodes[owner.0].generation + 1;
        let mini = self.add_mini_person(generation, count);
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            generation,
            guardian: Some(owner),
            youths: vec![mini],
            mini: true,
            union: None,
        });
        self.nodes[owner.0].youth = Some(id);
        let node = &mut self.nodes[mini.0];
        node.group = Some(id);
        node.origin = Some(owner);
        id
    }

    pub fn push_youth(&mut self, group: GroupId, node: NodeId) {
        let guardian = self.groups[group.0].guardian;
        self.groups[group.0].youths.push(node);
        let n = &mut self.nodes[node.0];
        n.group = Some(group);
        if n.origin.is_none() {
            n.origin = guardian;
        }
    }

    pub fn set_origin(&mut self, node: NodeId, origin: NodeId) {
        self.nodes[node.0].origin = Some(origin);
    }

    pub fn set_fulcrum(&mut self, node: NodeId) {
        self.fulcrum = Some(node);
    }

    /// Records two nodes standing for the same family record on one row.
    pub fn add_duplicate(&mut self, first: NodeId, second: NodeId) {
        self.duplicates.push((first, second));
    }

    pub fn set_card_size(&mut self, id: NodeId, size: Size) {
        self.nodes[id.0].rect.set_size(size);
    }

    pub fn set_bond_size(&mut self, id: NodeId, size: Size) {
        if let Some(f) = self.nodes[id.0].as_family_mut() {
            f.bond.rect.set_size(size);
        }
    }

    /// Assigns sizes to every card and bond still unsized.
    pub fn measure(&mut self, measurer: &dyn CardMeasurer, options: &LayoutOptions) {
        for node in &mut self.nodes {
            match &mut node.kind {
                NodeKind::Person(p) => {
                    if node.rect.width > 0.0 && node.rect.height > 0.0 {
                        continue;
                    }
                    let content = if node.mini {
                        CardContent::Mini { count: node.count }
                    } else {
                        CardContent::Person {
                            name: &p.label,
                            dates: p.dates.as_deref(),
                        }
                    };
                    node.rect.set_size(measurer.measure_card(content));
                }
                NodeKind::Family(f) => {
                    if f.bond.rect.width > 0.0 {
                        continue;
                    }
                    let size = measurer.measure_bond(f.bond.label.as_deref(), options.bond_width);
                    f.bond.rect.set_size(size);
                }
            }
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn union(&self, id: UnionId) -> &Union {
        &self.unions[id.0]
    }

    pub fn fulcrum(&self) -> Option<NodeId> {
        self.fulcrum
    }

    pub fn duplicates(&self) -> &[(NodeId, NodeId)] {
        &self.duplicates
    }

    pub fn group_row(&self, generation: i32) -> Option<&GroupRow> {
        self.group_rows.get(&generation)
    }

    pub fn union_row(&self, generation: i32) -> Option<&UnionRow> {
        self.union_rows.get(&generation)
    }

    pub fn generations(&self) -> impl Iterator<Item = i32> + '_ {
        self.group_rows.keys().copied()
    }

    /// Nodes of a row in left-to-right order (before mirroring).
    pub fn row_nodes(&self, generation: i32) -> Vec<NodeId> {
        if let Some(row) = self.union_rows.get(&generation) {
            return row
                .unions
                .iter()
                .flat_map(|u| self.unions[u.0].nodes.iter().copied())
                .collect();
        }
        self.group_rows
            .get(&generation)
            .map(|row| {
                row.groups
                    .iter()
                    .flat_map(|g| self.groups[g.0].youths.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of ancestor rows above the fulcrum row.
    pub fn max_above(&self) -> u32 {
        self.group_rows
            .keys()
            .next()
            .map(|g| (-*g).max(0) as u32)
            .unwrap_or(0)
    }

    /// Number of descendant rows below the fulcrum row.
    pub fn max_below(&self) -> u32 {
        self.group_rows
            .keys()
            .next_back()
            .map(|g| (*g).max(0) as u32)
            .unwrap_or(0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    // Geometry helpers shared by the arrangement phases.

    /// Moves a node horizontally, dragging its partners and bond along.
    pub fn move_node(&mut self, id: NodeId, dx: f64) {
        if dx == 0.0 {
            return;
        }
        self.nodes[id.0].rect.x += dx;
        let partners = match &mut self.nodes[id.0].kind {
            NodeKind::Family(f) => {
                f.bond.rect.x += dx;
                f.partners.clone()
            }
            NodeKind::Person(_) => return,
        };
        for p in partners {
            self.nodes[p.0].rect.x += dx;
        }
    }

    pub fn set_node_x(&mut self, id: NodeId, x: f64) {
        let dx = x - self.nodes[id.0].rect.x;
        self.move_node(id, dx);
    }

    /// Horizontal point under which a node's children hang.
    pub fn anchor_x(&self, id: NodeId) -> f64 {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Family(f) => f.bond.center_x(),
            NodeKind::Person(_) => node.rect.center_x(),
        }
    }

    /// Persons of `group`'s generation that descend from its guardian.
    pub(crate) fn blood_persons(&self, group: GroupId) -> Vec<NodeId> {
        let g = &self.groups[group.0];
        let scope: &[NodeId] = match g.union {
            Some(u) if g.guardian.is_some() => &self.unions[u.0].nodes,
            _ => &g.youths,
        };
        let mut out = Vec::new();
        for &id in scope {
            let node = &self.nodes[id.0];
            let persons: Vec<NodeId> = match &node.kind {
                NodeKind::Person(_) => vec![id],
                NodeKind::Family(f) => f.partners.clone(),
            };
            for p in persons {
                let person = &self.nodes[p.0];
                let blood = match g.guardian {
                    Some(guardian) => person.origin == Some(guardian),
                    None => !person.is_acquired(),
                };
                if blood {
                    out.push(p);
                }
            }
        }
        out
    }

    /// Horizontal extent of a group's blood line; acquired spouses at the ends are left out.
    pub(crate) fn blood_span(&self, group: GroupId) -> Option<(f64, f64)> {
        let persons = self.blood_persons(group);
        let rects: Vec<&Rect> = if persons.is_empty() {
            self.groups[group.0]
                .youths
                .iter()
                .map(|id| &self.nodes[id.0].rect)
                .collect()
        } else {
            persons.iter().map(|id| &self.nodes[id.0].rect).collect()
        };
        let left = rects.iter().map(|r| r.x).reduce(f64::min)?;
        let right = rects.iter().map(|r| r.right()).reduce(f64::max)?;
        Some((left, right))
    }

    pub(crate) fn group_center(&self, group: GroupId) -> Option<f64> {
        self.blood_span(group).map(|(l, r)| (l + r) / 2.0)
    }

    /// The youth group of `id` when it takes part in the row layout.
    pub(crate) fn row_youth(&self, id: NodeId) -> Option<GroupId> {
        let youth = self.nodes[id.0].youth?;
        let g = &self.groups[youth.0];
        (!g.mini && g.union.is_some()).then_some(youth)
    }

    pub(crate) fn gap(&self, left: NodeId, right: NodeId) -> f64 {
        let a = self.nodes[left.0].union;
        let b = self.nodes[right.0].union;
        if a.is_some() && a == b {
            self.options.horizontal_space
        } else {
            self.options.union_space
        }
    }

    /// Every placeable rectangle: nodes, partner cards, minis and bonds.
    pub(crate) fn placed_rects(&self) -> Vec<Rect> {
        let mut rects = Vec::with_capacity(self.nodes.len() * 2);
        for node in &self.nodes {
            if node.rect.width <= 0.0 && node.rect.height <= 0.0 {
                continue;
            }
            rects.push(node.rect);
            if let NodeKind::Family(f) = &node.kind {
                rects.push(f.bond.rect);
            }
        }
        rects
    }
}
