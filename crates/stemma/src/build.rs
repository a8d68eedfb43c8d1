//! Building a diagram around a fulcrum person from pedigree records.
//!
//! Generation 0 is the fulcrum row, negative generations hold ancestors and positive ones
//! descendants. Branches cut by the depth options collapse into mini nodes carrying a count.

use crate::diagram::{Bond, Diagram, FamilyNode, GroupId, Match, NodeId, PersonNode, Side};
use crate::error::{Error, Result};
use crate::geom::Size;
use crate::options::{ANCESTOR_COUNT_CAP, DESCENDANT_COUNT_CAP, DiagramOptions};
use crate::pedigree::Kinship;
use rustc_hash::{FxHashMap, FxHashSet};

/// Where the fulcrum's own sibling group goes while an ancestor row is being built.
#[derive(Debug, Clone, Copy)]
struct FulcrumSlot {
    family: usize,
    person: usize,
}

/// An ancestor family placed above one partner of a family node.
#[derive(Debug, Clone, Copy)]
struct Origin {
    node: NodeId,
    family: usize,
    /// Partner (record index) the origin was built for.
    child: usize,
    expand: bool,
}

struct Builder<'k, 'a> {
    kin: &'k Kinship<'a>,
    /// Depths clamped to the row limits.
    opts: DiagramOptions,
    diagram: Diagram,
    /// Ancestor families already on a row, for pedigree collapse.
    placed: FxHashMap<(i32, usize), NodeId>,
    /// Ancestor families on the branch being expanded upwards.
    lineage: FxHashSet<usize>,
    /// Families whose progeny is being expanded on the current downward branch.
    descent: FxHashSet<usize>,
}

impl Diagram {
    /// Builds the diagram structure around `fulcrum`. Nodes are left unsized and unplaced.
    pub fn from_pedigree(
        kin: &Kinship<'_>,
        fulcrum: &str,
        opts: &DiagramOptions,
    ) -> Result<Diagram> {
        let person = kin.person_index(fulcrum).ok_or_else(|| Error::UnknownFulcrum {
            id: fulcrum.to_string(),
        })?;
        let mut builder = Builder {
            kin,
            opts: opts.bounded(),
            diagram: Diagram::new(),
            placed: FxHashMap::default(),
            lineage: FxHashSet::default(),
            descent: FxHashSet::default(),
        };
        builder.build(person);
        let mut diagram = builder.diagram;
        diagram.left_to_right = opts.left_to_right;
        tracing::debug!(
            fulcrum,
            nodes = diagram.nodes.len(),
            groups = diagram.groups.len(),
            above = diagram.max_above(),
            below = diagram.max_below(),
            "diagram built"
        );
        Ok(diagram)
    }
}

impl Builder<'_, '_> {
    fn build(&mut self, fulcrum: usize) {
        let parents = self.kin.parent_families(fulcrum);
        let family = match parents.len() {
            0 => None,
            n if self.opts.family_index >= n => {
                tracing::warn!(
                    requested = self.opts.family_index,
                    available = n,
                    "parent family index out of range; using the last family"
                );
                Some(parents[n - 1])
            }
            _ => Some(parents[self.opts.family_index]),
        };

        match family {
            Some(family) if self.opts.ancestors > 0 => {
                let parents = self.ancestor_node(family, -1);
                self.placed.insert((-1, family), parents);
                self.ancestry(
                    parents,
                    family,
                    -1,
                    true,
                    Some(FulcrumSlot {
                        family,
                        person: fulcrum,
                    }),
                );
            }
            Some(family) => {
                let group = self.diagram.add_group(0, None);
                let person = self.fulcrum_group(group, Some(family), fulcrum);
                self.mini_ancestry(person, family);
            }
            None => {
                let group = self.diagram.add_group(0, None);
                self.fulcrum_group(group, None, fulcrum);
            }
        }
    }

    /// Fills the fulcrum's sibling group on row 0; returns the fulcrum's person node.
    fn fulcrum_group(&mut self, group: GroupId, family: Option<usize>, fulcrum: usize) -> NodeId {
        let children: Vec<usize> = match family {
            Some(f) => self.kin.children(f).to_vec(),
            None => vec![fulcrum],
        };
        let mut node = None;
        for child in children {
            if child == fulcrum {
                node = Some(self.unit(group, child, 0, self.opts.descendants));
            } else if self.opts.siblings > 0 {
                self.unit(group, child, 0, self.opts.siblings - 1);
            }
        }
        let node = node.unwrap_or_else(|| self.unit(group, fulcrum, 0, self.opts.descendants));
        self.diagram.set_fulcrum(node);
        node
    }

    /// Places a family node of an ancestor row with everything hanging off it: the origins of
    /// its partners on the row above, and on its own row the partners' siblings.
    fn ancestry(
        &mut self,
        node: NodeId,
        family: usize,
        generation: i32,
        expand: bool,
        fulcrum: Option<FulcrumSlot>,
    ) {
        let partners = self.kin.partners(family).to_vec();
        let partner_nodes = self.diagram.node(node).partners().to_vec();
        let top = i32::try_from(self.opts.ancestors).map_or(i32::MIN, |n| -n);
        let entered = self.lineage.insert(family);

        let mut origins: [Option<Origin>; 2] = [None, None];
        if expand {
            let sides = match partners.len() {
                0 => vec![],
                1 => vec![(0, 0)],
                n => vec![(0, 0), (1, n - 1)],
            };
            for (slot, i) in sides {
                let (person, person_node) = (partners[i], partner_nodes[i]);
                let Some(&parents) = self.kin.parent_families(person).first() else {
                    continue;
                };
                if generation - 1 < top {
                    self.mini_ancestry(person_node, parents);
                    continue;
                }
                if self.lineage.contains(&parents) {
                    tracing::debug!(family = %self.kin.family(parents).id, "ancestry loops back");
                    self.mini_ancestry(person_node, parents);
                    continue;
                }
                let origin_node = self.ancestor_node(parents, generation - 1);
                let expand = match self.placed.get(&(generation - 1, parents)) {
                    Some(&first) => {
                        self.diagram.add_duplicate(first, origin_node);
                        false
                    }
                    None => {
                        self.placed.insert((generation - 1, parents), origin_node);
                        true
                    }
                };
                self.diagram.set_origin(person_node, origin_node);
                origins[slot] = Some(Origin {
                    node: origin_node,
                    family: parents,
                    child: person,
                    expand,
                });
            }
        }

        for origin in origins.iter().flatten() {
            self.ancestry(origin.node, origin.family, generation - 1, origin.expand, None);
        }

        let (show_siblings, depth) = if generation == -1 {
            (self.opts.uncles > 0, self.opts.uncles.saturating_sub(1))
        } else {
            (i64::from(self.opts.great_uncles) >= -i64::from(generation) - 1, 0)
        };

        match origins {
            [Some(left), right] => {
                let group = self.diagram.add_group(generation, Some(left.node));
                if show_siblings {
                    self.siblings(group, left, generation, depth);
                }
                self.diagram.push_youth(group, node);
                self.place_fulcrum(fulcrum);
                if let Some(right) = right {
                    let group = self.diagram.add_group(generation, Some(right.node));
                    if show_siblings {
                        self.siblings(group, right, generation, depth);
                    }
                }
            }
            [None, Some(right)] => {
                let group = self.diagram.add_group(generation, Some(right.node));
                self.diagram.push_youth(group, node);
                self.place_fulcrum(fulcrum);
                if show_siblings {
                    self.siblings(group, right, generation, depth);
                }
            }
            [None, None] => {
                let group = self.diagram.add_group(generation, None);
                self.diagram.push_youth(group, node);
                self.place_fulcrum(fulcrum);
            }
        }
        if entered {
            self.lineage.remove(&family);
        }
    }

    fn place_fulcrum(&mut self, slot: Option<FulcrumSlot>) {
        if let Some(slot) = slot {
            let guardian = self.placed.get(&(-1, slot.family)).copied();
            let group = self.diagram.add_group(0, guardian);
            self.fulcrum_group(group, Some(slot.family), slot.person);
        }
    }

    /// Siblings of the partner an origin was built for, each with its own progeny.
    fn siblings(&mut self, group: GroupId, origin: Origin, generation: i32, depth: u32) {
        let siblings: Vec<usize> = self
            .kin
            .children(origin.family)
            .iter()
            .copied()
            .filter(|&s| s != origin.child)
            .collect();
        for sibling in siblings {
            self.unit(group, sibling, generation, depth);
        }
    }

    /// Adds a blood person to `group`: either a plain person node, or their marriages as
    /// family nodes, with progeny down to `depth` more rows.
    fn unit(&mut self, group: GroupId, person: usize, generation: i32, depth: u32) -> NodeId {
        let guardian = self.diagram.group(group).guardian;
        let families = self.kin.spouse_families(person).to_vec();

        if families.is_empty() || !self.opts.show_spouses {
            let node = self.person_node(person, generation, false);
            self.diagram.push_youth(group, node);
            self.progeny(node, &families, generation, depth);
            return node;
        }

        let leads = self.kin.partners(families[0]).first() == Some(&person);
        let main = if leads { 0 } else { families.len() - 1 };
        let mut person_node = None;
        let mut sides = Vec::new();

        for (i, &family) in families.iter().enumerate() {
            if i == main {
                let partners: Vec<NodeId> = self
                    .kin
                    .partners(family)
                    .to_vec()
                    .into_iter()
                    .map(|p| {
                        if p == person {
                            let id = self.person_node(p, generation, false);
                            person_node = Some(id);
                            id
                        } else {
                            self.spouse_node(p, generation)
                        }
                    })
                    .collect();
                let matching = if families.len() == 1 {
                    Match::Sole
                } else {
                    Match::Near
                };
                let node = self.diagram.add_family(
                    generation,
                    FamilyNode {
                        record: Some(self.kin.family(family).id.clone()),
                        partners,
                        bond: self.bond(family),
                        matching,
                        ..Default::default()
                    },
                );
                self.diagram.push_youth(group, node);
                self.progeny(node, &[family], generation, depth);
            } else {
                let spouses: Vec<NodeId> = self
                    .kin
                    .partners(family)
                    .to_vec()
                    .into_iter()
                    .filter(|&p| p != person)
                    .map(|p| self.spouse_node(p, generation))
                    .collect();
                let matching = if i.abs_diff(main) == 1 {
                    Match::Middle
                } else {
                    Match::Far
                };
                let node = self.diagram.add_family(
                    generation,
                    FamilyNode {
                        record: Some(self.kin.family(family).id.clone()),
                        partners: spouses,
                        bond: self.bond(family),
                        side: Some(if i > main { Side::Right } else { Side::Left }),
                        matching,
                        spouse_of: None,
                    },
                );
                self.diagram.push_youth(group, node);
                self.progeny(node, &[family], generation, depth);
                sides.push(node);
            }
        }

        let person_node = match person_node {
            Some(id) => id,
            None => {
                // The person record is missing from its own family's partner list.
                let id = self.person_node(person, generation, false);
                self.diagram.push_youth(group, id);
                id
            }
        };
        if let Some(guardian) = guardian {
            self.diagram.set_origin(person_node, guardian);
        }
        for side in sides {
            if let Some(f) = self.diagram.nodes[side.0].as_family_mut() {
                f.spouse_of = Some(person_node);
            }
        }
        person_node
    }

    /// Progeny of `node` drawn from `families`: a sibling group on the next row, or a mini
    /// node once `depth` is exhausted.
    fn progeny(&mut self, node: NodeId, families: &[usize], generation: i32, depth: u32) {
        let children: Vec<usize> = families
            .iter()
            .flat_map(|&f| self.kin.children(f).iter().copied())
            .collect();
        if children.is_empty() {
            return;
        }
        let loops = families.iter().any(|f| self.descent.contains(f));
        if loops {
            tracing::debug!(node = node.0, "progeny loops back");
        }
        if depth == 0 || loops {
            let count = families
                .iter()
                .map(|&f| self.kin.count_family_descendants(f, DESCENDANT_COUNT_CAP))
                .sum::<usize>()
                .min(DESCENDANT_COUNT_CAP);
            if count == DESCENDANT_COUNT_CAP {
                tracing::debug!(count, "collapsed progeny count reached its cap");
            }
            self.diagram.add_mini_progeny(node, count);
            return;
        }
        self.descent.extend(families.iter().copied());
        let group = self.diagram.add_group(generation + 1, Some(node));
        for child in children {
            self.unit(group, child, generation + 1, depth - 1);
        }
        for f in families {
            self.descent.remove(f);
        }
    }

    /// Collapses the ancestry of `owner` into a mini family node above it.
    fn mini_ancestry(&mut self, owner: NodeId, family: usize) {
        let generation = self.diagram.node(owner).generation - 1;
        let partners: Vec<NodeId> = self
            .kin
            .partners(family)
            .to_vec()
            .into_iter()
            .map(|p| {
                let count = 1 + self.kin.count_ancestors(p, ANCESTOR_COUNT_CAP - 1);
                self.diagram.add_mini_person(generation, count)
            })
            .collect();
        let count = partners
            .iter()
            .map(|p| self.diagram.node(*p).count)
            .sum::<usize>()
            .min(ANCESTOR_COUNT_CAP);
        if count == ANCESTOR_COUNT_CAP {
            tracing::debug!(count, "collapsed ancestry count reached its cap");
        }
        let node = self.diagram.add_family(
            generation,
            FamilyNode {
                record: Some(self.kin.family(family).id.clone()),
                partners,
                ..Default::default()
            },
        );
        self.diagram.set_mini(node, count);
        self.diagram.set_origin(owner, node);
    }

    /// A family node for an ancestor couple; every partner is a blood relative.
    fn ancestor_node(&mut self, family: usize, generation: i32) -> NodeId {
        let partners: Vec<NodeId> = self
            .kin
            .partners(family)
            .to_vec()
            .into_iter()
            .map(|p| self.person_node(p, generation, false))
            .collect();
        self.diagram.add_family(
            generation,
            FamilyNode {
                record: Some(self.kin.family(family).id.clone()),
                partners,
                bond: self.bond(family),
                ..Default::default()
            },
        )
    }

    /// A partner by marriage; their own ancestry is shown collapsed.
    fn spouse_node(&mut self, person: usize, generation: i32) -> NodeId {
        let node = self.person_node(person, generation, true);
        if let Some(&parents) = self.kin.parent_families(person).first() {
            self.mini_ancestry(node, parents);
        }
        node
    }

    fn person_node(&mut self, person: usize, generation: i32, acquired: bool) -> NodeId {
        let record = self.kin.person(person);
        let node = self.diagram.add_person(
            generation,
            PersonNode {
                record: Some(record.id.clone()),
                label: record.name.clone(),
                dates: record.dates.clone(),
                acquired,
                family: None,
            },
        );
        if let (Some(width), Some(height)) = (record.width, record.height) {
            self.diagram.set_card_size(node, Size::new(width, height));
        }
        node
    }

    fn bond(&self, family: usize) -> Bond {
        Bond {
            label: self.kin.family(family).marriage.clone(),
            ..Default::default()
        }
    }
}
