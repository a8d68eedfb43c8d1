//! Request-level configuration.
//!
//! `DiagramOptions` shapes which relatives end up in the diagram; `LayoutOptions` holds the
//! spacing constants and budgets used by the arrangement phases. Both deserialize from partial
//! JSON objects, missing keys falling back to the defaults.

use serde::{Deserialize, Serialize};

/// Ceiling for collapsed ancestry counts.
pub const ANCESTOR_COUNT_CAP: usize = 100;
/// Ceiling for collapsed progeny counts.
pub const DESCENDANT_COUNT_CAP: usize = 500;

/// Most ancestor rows a diagram expands; deeper branches collapse into minis.
pub const MAX_ANCESTOR_ROWS: u32 = ANCESTOR_COUNT_CAP as u32;
/// Most progeny rows below any expanded person.
pub const MAX_DESCENDANT_ROWS: u32 = DESCENDANT_COUNT_CAP as u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramOptions {
    /// Ancestor rows shown above the fulcrum.
    pub ancestors: u32,
    /// Rows above the parents whose ancestors' siblings are shown.
    pub great_uncles: u32,
    /// Generations of the fulcrum's progeny.
    pub descendants: u32,
    /// Generations of siblings and their progeny (0 hides siblings).
    pub siblings: u32,
    /// Generations of the parents' siblings and their progeny (0 hides uncles).
    pub uncles: u32,
    pub show_spouses: bool,
    pub left_to_right: bool,
    /// Which parent family of the fulcrum to follow when there are several.
    pub family_index: usize,
}

impl DiagramOptions {
    /// The same options with every depth clamped to the row limits.
    pub fn bounded(&self) -> Self {
        let clamp = |name: &str, value: u32, max: u32| {
            if value > max {
                tracing::warn!(option = name, requested = value, max, "depth clamped");
            }
            value.min(max)
        };
        Self {
            ancestors: clamp("ancestors", self.ancestors, MAX_ANCESTOR_ROWS),
            great_uncles: clamp("greatUncles", self.great_uncles, MAX_ANCESTOR_ROWS),
            descendants: clamp("descendants", self.descendants, MAX_DESCENDANT_ROWS),
            siblings: clamp("siblings", self.siblings, MAX_DESCENDANT_ROWS),
            uncles: clamp("uncles", self.uncles, MAX_DESCENDANT_ROWS),
            ..self.clone()
        }
    }
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            ancestors: 3,
            great_uncles: 1,
            descendants: 3,
            siblings: 2,
            uncles: 2,
            show_spouses: true,
            left_to_right: true,
            family_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    /// Gap between neighbours of the same union.
    pub horizontal_space: f64,
    /// Gap between neighbours of different unions.
    pub union_space: f64,
    /// Gap between generation rows.
    pub vertical_space: f64,
    /// Vertical gap between a mini node and its owner.
    pub mini_space: f64,
    /// Width of an undated marriage bond.
    pub bond_width: f64,
    /// How far a dated marriage oval overlaps the partner cards.
    pub marriage_overlap: f64,
    /// Height of a family node without partners.
    pub placeholder_height: f64,
    /// Height of the arc joining two duplicate nodes.
    pub duplicate_arc: f64,
    pub max_iterations: usize,
    /// The relaxation loop stops once the summed force drops below this.
    pub convergence_threshold: f64,
    /// Largest extent a single rendered line group may cover.
    pub max_bitmap_size: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            horizontal_space: 15.0,
            union_space: 40.0,
            vertical_space: 90.0,
            mini_space: 25.0,
            bond_width: 24.0,
            marriage_overlap: 5.0,
            placeholder_height: 20.0,
            duplicate_arc: 30.0,
            max_iterations: 30,
            convergence_threshold: 1.0,
            max_bitmap_size: 4096.0,
        }
    }
}

/// Both option sets, as read from a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemmaConfig {
    pub diagram: DiagramOptions,
    pub layout: LayoutOptions,
}

impl StemmaConfig {
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
