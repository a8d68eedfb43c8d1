#![forbid(unsafe_code)]

//! Headless layout of genealogical diagrams.
//!
//! A diagram is built around one focal person, the *fulcrum*: ancestors on the rows above,
//! descendants below, siblings and cousins on the sides. Layout is a fixed pipeline:
//!
//! 1. [`Diagram::from_pedigree`] builds nodes, sibling groups and rows from pedigree records.
//! 2. [`Diagram::measure`] sizes the cards.
//! 3. [`Diagram::arrange`] places everything and computes the connector lines.
//! 4. [`Diagram::to_layout`] produces a serializable [`DiagramLayout`].
//!
//! [`layout`] runs all four steps.

pub mod arrange;
pub mod build;
pub mod diagram;
pub mod error;
pub mod geom;
pub mod line;
pub mod measure;
pub mod model;
pub mod options;
pub mod pedigree;

pub use diagram::{Diagram, GroupId, NodeId, UnionId};
pub use error::{Error, Result};
pub use line::{Line, LineGroup, LineKind, batch_lines};
pub use measure::{CardContent, CardMeasurer, FixedCardMeasurer};
pub use model::{DiagramLayout, LayoutBond, LayoutNode, LayoutNodeKind};
pub use options::{DiagramOptions, LayoutOptions, StemmaConfig};
pub use pedigree::{Family, Kinship, Pedigree, Person};

/// Lays out the diagram of `pedigree` around the person with id `fulcrum`.
pub fn layout(
    pedigree: &Pedigree,
    fulcrum: &str,
    diagram_options: &DiagramOptions,
    layout_options: &LayoutOptions,
    measurer: &dyn CardMeasurer,
) -> Result<DiagramLayout> {
    let kinship = Kinship::new(pedigree)?;
    let mut diagram = Diagram::from_pedigree(&kinship, fulcrum, diagram_options)?;
    diagram.measure(measurer, layout_options);
    diagram.arrange(layout_options);
    Ok(diagram.to_layout())
}
