use super::{GroupId, NodeId, UnionId};

/// Siblings sharing one guardian.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub generation: i32,
    pub guardian: Option<NodeId>,
    pub youths: Vec<NodeId>,
    /// Collapsed progeny placed under the guardian, outside of the rows.
    pub mini: bool,
    pub union: Option<UnionId>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupRow {
    pub generation: i32,
    pub groups: Vec<GroupId>,
}
