//! Record-level input: persons and the families that join them.
//!
//! Parsing a genealogical format into these records is up to the caller. `Kinship` indexes a
//! validated `Pedigree` for the diagram builder and the collapsed-branch counters.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pedigree {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub families: Vec<Family>,
    /// Default fulcrum when the request does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulcrum: Option<String>,
}

impl Pedigree {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<String>,
    /// Card size computed by the host; wins over the measurer when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: String,
    #[serde(default)]
    pub partners: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    /// Marriage date label; a dated marriage is drawn as an oval overlapping the partner cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marriage: Option<String>,
}

/// Index over a validated pedigree. Persons and families are addressed by their position in
/// the pedigree vectors.
#[derive(Debug)]
pub struct Kinship<'a> {
    pedigree: &'a Pedigree,
    persons: IndexMap<&'a str, usize>,
    family_partners: Vec<Vec<usize>>,
    family_children: Vec<Vec<usize>>,
    parent_families: Vec<Vec<usize>>,
    spouse_families: Vec<Vec<usize>>,
}

impl<'a> Kinship<'a> {
    pub fn new(pedigree: &'a Pedigree) -> Result<Self> {
        let mut persons: IndexMap<&'a str, usize> = IndexMap::with_capacity(pedigree.persons.len());
        for (idx, p) in pedigree.persons.iter().enumerate() {
            if persons.insert(p.id.as_str(), idx).is_some() {
                return Err(Error::DuplicateId {
                    kind: "person",
                    id: p.id.clone(),
                });
            }
        }

        let mut family_ids: FxHashMap<&str, usize> = FxHashMap::default();
        let mut family_partners = Vec::with_capacity(pedigree.families.len());
        let mut family_children = Vec::with_capacity(pedigree.families.len());
        let mut parent_families = vec![Vec::new(); pedigree.persons.len()];
        let mut spouse_families = vec![Vec::new(); pedigree.persons.len()];

        for (fidx, f) in pedigree.families.iter().enumerate() {
            if family_ids.insert(f.id.as_str(), fidx).is_some() {
                return Err(Error::DuplicateId {
                    kind: "family",
                    id: f.id.clone(),
                });
            }
            let resolve = |id: &String| {
                persons.get(id.as_str()).copied().ok_or_else(|| Error::UnknownPerson {
                    family_id: f.id.clone(),
                    person_id: id.clone(),
                })
            };
            let partners = f.partners.iter().map(resolve).collect::<Result<Vec<_>>>()?;
            let children = f.children.iter().map(resolve).collect::<Result<Vec<_>>>()?;
            for &p in &partners {
                spouse_families[p].push(fidx);
            }
            for &c in &children {
                parent_families[c].push(fidx);
            }
            family_partners.push(partners);
            family_children.push(children);
        }

        Ok(Self {
            pedigree,
            persons,
            family_partners,
            family_children,
            parent_families,
            spouse_families,
        })
    }

    pub fn person_index(&self, id: &str) -> Option<usize> {
        self.persons.get(id).copied()
    }

    pub fn person(&self, idx: usize) -> &'a Person {
        &self.pedigree.persons[idx]
    }

    pub fn family(&self, idx: usize) -> &'a Family {
        &self.pedigree.families[idx]
    }

    pub fn partners(&self, family: usize) -> &[usize] {
        &self.family_partners[family]
    }

    pub fn children(&self, family: usize) -> &[usize] {
        &self.family_children[family]
    }

    /// Families in which `person` is a child, in pedigree order.
    pub fn parent_families(&self, person: usize) -> &[usize] {
        &self.parent_families[person]
    }

    /// Families in which `person` is a partner, in marriage order.
    pub fn spouse_families(&self, person: usize) -> &[usize] {
        &self.spouse_families[person]
    }

    pub fn has_parents(&self, person: usize) -> bool {
        !self.parent_families[person].is_empty()
    }

    pub fn has_children(&self, person: usize) -> bool {
        self.spouse_families[person]
            .iter()
            .any(|&f| !self.family_children[f].is_empty())
    }

    /// Number of ancestors above `person`, following the first parent family of every
    /// generation, stopping at `cap`.
    pub fn count_ancestors(&self, person: usize, cap: usize) -> usize {
        let mut count = 0;
        self.visit_ancestors(person, &mut count, cap);
        if count >= cap {
            tracing::warn!(person = %self.pedigree.persons[person].id, cap, "ancestor count capped");
        }
        count
    }

    fn visit_ancestors(&self, person: usize, count: &mut usize, cap: usize) {
        let Some(&family) = self.parent_families[person].first() else {
            return;
        };
        for &parent in &self.family_partners[family] {
            if *count >= cap {
                return;
            }
            *count += 1;
            self.visit_ancestors(parent, count, cap);
        }
    }

    /// Number of descendants of `person` across all their families, stopping at `cap`.
    pub fn count_descendants(&self, person: usize, cap: usize) -> usize {
        let mut count = 0;
        self.visit_descendants(person, &mut count, cap);
        if count >= cap {
            tracing::warn!(person = %self.pedigree.persons[person].id, cap, "descendant count capped");
        }
        count
    }

    /// Number of descendants issued from one family, stopping at `cap`.
    pub fn count_family_descendants(&self, family: usize, cap: usize) -> usize {
        let mut count = 0;
        self.visit_family(family, &mut count, cap);
        count
    }

    fn visit_descendants(&self, person: usize, count: &mut usize, cap: usize) {
        for &family in &self.spouse_families[person] {
            if *count >= cap {
                return;
            }
            self.visit_family(family, count, cap);
        }
    }

    fn visit_family(&self, family: usize, count: &mut usize, cap: usize) {
        for &child in &self.family_children[family] {
            if *count >= cap {
                return;
            }
            *count += 1;
            self.visit_descendants(child, count, cap);
        }
    }
}
