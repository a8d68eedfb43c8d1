use super::{NodeId, UnionId};

/// Nodes of one row that move horizontally together.
#[derive(Debug, Clone, Default)]
pub struct Union {
    pub generation: i32,
    pub nodes: Vec<NodeId>,
    pub groups: Vec<super::GroupId>,
    /// Node where two sibling groups meet, when the union merges them.
    pub ancestor: Option<NodeId>,
    pub prev: Option<UnionId>,
    pub next: Option<UnionId>,
}

#[derive(Debug, Clone, Default)]
pub struct UnionRow {
    pub generation: i32,
    pub unions: Vec<UnionId>,
    pub y_axe: f64,
    pub max_height: f64,
    pub central: Option<NodeId>,
}
