use stemma::diagram::NodeKind;
use stemma::{
    Diagram, DiagramOptions, Family, FixedCardMeasurer, Kinship, LayoutOptions, NodeId, Pedigree,
    Person,
};

fn person(id: &str) -> Person {
    Person {
        id: id.to_string(),
        name: id.to_string(),
        width: Some(100.0),
        height: Some(40.0),
        ..Default::default()
    }
}

fn family(id: &str, partners: &[&str], children: &[&str]) -> Family {
    Family {
        id: id.to_string(),
        partners: partners.iter().map(|s| s.to_string()).collect(),
        children: children.iter().map(|s| s.to_string()).collect(),
        marriage: None,
    }
}

/// Fulcrum, parents, grandparents and great-grandparents; each parent has one sibling.
fn three_generations() -> Pedigree {
    let ids = [
        "f", "fa", "mo", "uncle", "aunt", "gfa", "gma", "gfb", "gmb", "g1", "g2", "g3", "g4",
        "g5", "g6", "g7", "g8",
    ];
    Pedigree {
        persons: ids.iter().map(|id| person(id)).collect(),
        families: vec![
            family("parents", &["fa", "mo"], &["f"]),
            family("paternal", &["gfa", "gma"], &["uncle", "fa"]),
            family("maternal", &["gfb", "gmb"], &["mo", "aunt"]),
            family("gfa-parents", &["g1", "g2"], &["gfa"]),
            family("gma-parents", &["g3", "g4"], &["gma"]),
            family("gfb-parents", &["g5", "g6"], &["gfb"]),
            family("gmb-parents", &["g7", "g8"], &["gmb"]),
        ],
        fulcrum: Some("f".to_string()),
    }
}

fn arranged(pedigree: &Pedigree, opts: &DiagramOptions) -> Diagram {
    let kin = Kinship::new(pedigree).unwrap();
    let mut diagram = Diagram::from_pedigree(&kin, "f", opts).unwrap();
    diagram.measure(&FixedCardMeasurer::default(), &LayoutOptions::default());
    diagram.arrange(&LayoutOptions::default());
    diagram
}

fn family_node(diagram: &Diagram, record: &str) -> NodeId {
    diagram
        .nodes()
        .find(|(_, n)| match &n.kind {
            NodeKind::Family(f) => f.record.as_deref() == Some(record) && !n.mini,
            NodeKind::Person(_) => false,
        })
        .map(|(id, _)| id)
        .unwrap()
}

fn union_center(diagram: &Diagram, node: NodeId) -> f64 {
    let u = diagram.node(node).union.unwrap();
    let nodes = &diagram.union(u).nodes;
    let first = diagram.node(*nodes.first().unwrap()).rect;
    let last = diagram.node(*nodes.last().unwrap()).rect;
    (first.x + last.right()) / 2.0
}

fn assert_rows_separated(diagram: &Diagram) {
    let opts = LayoutOptions::default();
    for generation in diagram.generations() {
        let row = diagram.row_nodes(generation);
        for pair in row.windows(2) {
            let (a, b) = (diagram.node(pair[0]), diagram.node(pair[1]));
            let gap = if a.union == b.union {
                opts.horizontal_space
            } else {
                opts.union_space
            };
            assert!(
                b.rect.x >= a.rect.right() + gap - 1e-6,
                "row {generation}: {:?} overlaps {:?}",
                a.rect,
                b.rect
            );
        }
    }
}

#[test]
fn three_ancestor_rows_are_laid_out_without_overlap() {
    let diagram = arranged(&three_generations(), &DiagramOptions::default());

    assert_eq!(diagram.max_above(), 3);
    assert_eq!(diagram.max_below(), 0);
    assert_rows_separated(&diagram);
}

#[test]
fn parents_union_is_centered_between_grandparent_unions() {
    let diagram = arranged(&three_generations(), &DiagramOptions::default());

    let parents = family_node(&diagram, "parents");
    let paternal = family_node(&diagram, "paternal");
    let maternal = family_node(&diagram, "maternal");

    let middle = (union_center(&diagram, paternal) + union_center(&diagram, maternal)) / 2.0;
    assert!(
        (union_center(&diagram, parents) - middle).abs() <= 1.0,
        "parents at {}, grandparents midpoint at {middle}",
        union_center(&diagram, parents)
    );
}

#[test]
fn fulcrum_hangs_under_the_parents_bond() {
    let diagram = arranged(&three_generations(), &DiagramOptions::default());

    let fulcrum = diagram.fulcrum().unwrap();
    let parents = family_node(&diagram, "parents");
    assert!((diagram.node(fulcrum).rect.center_x() - diagram.anchor_x(parents)).abs() <= 1.0);
    assert!(diagram.node(fulcrum).rect.y > diagram.node(parents).rect.bottom());
}

#[test]
fn convergence_cleanup_is_idempotent() {
    let mut pedigree = three_generations();
    // Lopsided: three more paternal uncles.
    for (i, id) in ["u2", "u3", "u4"].into_iter().enumerate() {
        pedigree.persons.push(person(id));
        pedigree.families[1].children.insert(i, id.to_string());
    }

    let mut diagram = arranged(&pedigree, &DiagramOptions::default());
    assert_eq!(diagram.balance_convergences(), 0.0);
    assert_rows_separated(&diagram);
}

#[test]
fn resolve_overlap_restores_the_gaps() {
    let mut diagram = arranged(&three_generations(), &DiagramOptions::default());
    for generation in diagram.generations().collect::<Vec<_>>() {
        for id in diagram.row_nodes(generation) {
            diagram.set_node_x(id, 500.0);
        }
        diagram.resolve_overlap(generation);
    }
    assert_rows_separated(&diagram);
}

#[test]
fn row_nodes_share_the_row_axis() {
    let diagram = arranged(&three_generations(), &DiagramOptions::default());
    let opts = LayoutOptions::default();

    let mut axes: Vec<f64> = Vec::new();
    for generation in diagram.generations() {
        let row = diagram.row_nodes(generation);
        let axis = diagram.node(row[0]).rect.center_y();
        for id in &row {
            assert!((diagram.node(*id).rect.center_y() - axis).abs() < 1e-9);
        }
        axes.push(axis);
    }
    for pair in axes.windows(2) {
        // Equal card heights: rows are one card plus the vertical gap apart.
        assert!((pair[1] - pair[0] - (40.0 + opts.vertical_space)).abs() < 1e-9);
    }
}

#[test]
fn exhausted_relaxation_budget_still_separates_rows() {
    let pedigree = three_generations();
    let kin = Kinship::new(&pedigree).unwrap();
    for max_iterations in [1, 2] {
        let layout = LayoutOptions {
            max_iterations,
            // Summed force is never negative, so the loop runs its whole budget.
            convergence_threshold: 0.0,
            ..Default::default()
        };
        let mut diagram = Diagram::from_pedigree(&kin, "f", &DiagramOptions::default()).unwrap();
        diagram.measure(&FixedCardMeasurer::default(), &layout);
        diagram.arrange(&layout);

        assert_eq!(diagram.max_above(), 3);
        assert_rows_separated(&diagram);
        assert!(diagram.width() > 0.0);
    }
}
