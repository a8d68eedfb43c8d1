use super::{GroupId, NodeId, UnionId};
use crate::diagram::bond::Bond;
use crate::geom::Rect;
use serde::{Deserialize, Serialize};

/// Which side of the blood person a secondary marriage is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// A previous marriage, drawn before the person.
    Left,
    /// A following marriage, drawn after the person.
    Right,
}

/// Position of a family within the marriages of one person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Match {
    /// The only marriage.
    #[default]
    Sole,
    /// The marriage drawn together with the person.
    Near,
    /// A secondary marriage right next to the person's family.
    Middle,
    /// A secondary marriage with other marriages in between.
    Far,
}

#[derive(Debug, Clone, Default)]
pub struct PersonNode {
    /// Id of the person record, if any.
    pub record: Option<String>,
    pub label: String,
    pub dates: Option<String>,
    /// Partner by marriage rather than by descent.
    pub acquired: bool,
    /// Family node this person is drawn inside of.
    pub family: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct FamilyNode {
    /// Id of the family record, if any.
    pub record: Option<String>,
    pub partners: Vec<NodeId>,
    pub bond: Bond,
    pub side: Option<Side>,
    pub matching: Match,
    /// Blood person a side marriage belongs to.
    pub spouse_of: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Person(PersonNode),
    Family(FamilyNode),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub generation: i32,
    pub mini: bool,
    /// Aggregate count carried by a mini node.
    pub count: usize,
    pub rect: Rect,
    pub origin: Option<NodeId>,
    pub youth: Option<GroupId>,
    pub group: Option<GroupId>,
    pub union: Option<UnionId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub force: f64,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, generation: i32) -> Self {
        Self {
            kind,
            generation,
            mini: false,
            count: 0,
            rect: Rect::default(),
            origin: None,
            youth: None,
            group: None,
            union: None,
            prev: None,
            next: None,
            force: 0.0,
        }
    }

    pub fn is_family(&self) -> bool {
        matches!(self.kind, NodeKind::Family(_))
    }

    pub fn as_person(&self) -> Option<&PersonNode> {
        match &self.kind {
            NodeKind::Person(p) => Some(p),
            NodeKind::Family(_) => None,
        }
    }

    pub fn as_family(&self) -> Option<&FamilyNode> {
        match &self.kind {
            NodeKind::Family(f) => Some(f),
            NodeKind::Person(_) => None,
        }
    }

    pub(crate) fn as_family_mut(&mut self) -> Option<&mut FamilyNode> {
        match &mut self.kind {
            NodeKind::Family(f) => Some(f),
            NodeKind::Person(_) => None,
        }
    }

    pub fn origin(&self) -> Option<NodeId> {
        self.origin
    }

    pub fn partners(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Family(f) => &f.partners,
            NodeKind::Person(_) => &[],
        }
    }

    pub fn matching(&self) -> Match {
        match &self.kind {
            NodeKind::Family(f) => f.matching,
            NodeKind::Person(_) => Match::Sole,
        }
    }

    pub fn bond(&self) -> Option<&Bond> {
        self.as_family().map(|f| &f.bond)
    }

    pub fn center_x(&self) -> f64 {
        self.rect.center_x()
    }

    pub fn center_y(&self) -> f64 {
        self.rect.center_y()
    }

    pub fn is_acquired(&self) -> bool {
        self.as_person().is_some_and(|p| p.acquired)
    }
}
