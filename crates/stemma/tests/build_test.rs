use stemma::diagram::{Match, NodeKind, Side};
use stemma::{
    Diagram, DiagramOptions, Error, Family, FixedCardMeasurer, Kinship, LayoutOptions, LineKind,
    NodeId, Pedigree, Person,
};

fn person(id: &str) -> Person {
    Person {
        id: id.to_string(),
        name: format!("Person {id}"),
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

fn pedigree(persons: &[&str], families: Vec<Family>) -> Pedigree {
    Pedigree {
        persons: persons.iter().map(|id| person(id)).collect(),
        families,
        fulcrum: None,
    }
}

fn arranged(pedigree: &Pedigree, fulcrum: &str, opts: &DiagramOptions) -> Diagram {
    let kin = Kinship::new(pedigree).unwrap();
    let mut diagram = Diagram::from_pedigree(&kin, fulcrum, opts).unwrap();
    diagram.measure(&FixedCardMeasurer::default(), &LayoutOptions::default());
    diagram.arrange(&LayoutOptions::default());
    diagram
}

fn families_on_row(diagram: &Diagram, generation: i32) -> Vec<NodeId> {
    diagram
        .row_nodes(generation)
        .into_iter()
        .filter(|id| diagram.node(*id).is_family())
        .collect()
}

fn record(diagram: &Diagram, id: NodeId) -> String {
    match &diagram.node(id).kind {
        NodeKind::Family(f) => f.record.clone().unwrap_or_default(),
        NodeKind::Person(p) => p.record.clone().unwrap_or_default(),
    }
}

fn record_of(node: &stemma::diagram::Node) -> &str {
    match &node.kind {
        NodeKind::Family(f) => f.record.as_deref().unwrap_or_default(),
        NodeKind::Person(p) => p.record.as_deref().unwrap_or_default(),
    }
}

fn three_marriages(p_leads: bool) -> Pedigree {
    let first = if p_leads {
        family("m1", &["p", "s1"], &[])
    } else {
        family("m1", &["s1", "p"], &[])
    };
    pedigree(
        &["p", "s1", "s2", "s3", "c1", "c2"],
        vec![
            first,
            family("m2", &["p", "s2"], &["c1", "c2"]),
            family("m3", &["p", "s3"], &[]),
        ],
    )
}

#[test]
fn three_marriages_are_drawn_in_marriage_order() {
    let diagram = arranged(&three_marriages(true), "p", &DiagramOptions::default());

    let row = families_on_row(&diagram, 0);
    let records: Vec<String> = row.iter().map(|id| record(&diagram, *id)).collect();
    assert_eq!(records, ["m1", "m2", "m3"]);

    let bonds: Vec<_> = row
        .iter()
        .map(|id| diagram.node(*id).bond().unwrap().rect)
        .collect();
    for pair in bonds.windows(2) {
        assert!(pair[0].right() <= pair[1].x, "{:?} overlaps {:?}", pair[0], pair[1]);
    }

    let matching: Vec<Match> = row.iter().map(|id| diagram.node(*id).matching()).collect();
    assert_eq!(matching, [Match::Near, Match::Middle, Match::Far]);
    let sides: Vec<_> = row
        .iter()
        .map(|id| diagram.node(*id).as_family().unwrap().side)
        .collect();
    assert_eq!(sides, [None, Some(Side::Right), Some(Side::Right)]);
}

#[test]
fn trailing_partner_keeps_the_last_marriage_as_main() {
    let diagram = arranged(&three_marriages(false), "p", &DiagramOptions::default());

    let row = families_on_row(&diagram, 0);
    let records: Vec<String> = row.iter().map(|id| record(&diagram, *id)).collect();
    assert_eq!(records, ["m1", "m2", "m3"]);

    let matching: Vec<Match> = row.iter().map(|id| diagram.node(*id).matching()).collect();
    assert_eq!(matching, [Match::Far, Match::Middle, Match::Near]);
    assert_eq!(
        diagram.node(row[0]).as_family().unwrap().side,
        Some(Side::Left)
    );
}

#[test]
fn side_marriages_get_their_own_connectors() {
    let diagram = arranged(&three_marriages(true), "p", &DiagramOptions::default());

    let kinds: Vec<LineKind> = diagram.connectors().iter().map(|c| c.kind).collect();
    assert_eq!(kinds.iter().filter(|k| **k == LineKind::Horizontal).count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == LineKind::Back).count(), 1);
    assert!(diagram.lines().filter(|l| l.dashed()).all(|l| l.kind == LineKind::Back));

    // Both children of the second marriage hang from it.
    let curves: Vec<_> = diagram
        .connectors()
        .iter()
        .filter(|c| c.kind == LineKind::Curve)
        .collect();
    assert_eq!(curves.len(), 2);
    assert!(curves.iter().all(|c| record(&diagram, c.from) == "m2"));
}

#[test]
fn out_of_range_family_index_uses_the_last_parent_family() {
    let pedigree = pedigree(
        &["f", "a", "b", "c", "d"],
        vec![
            family("birth", &["a", "b"], &["f"]),
            family("adoptive", &["c", "d"], &["f"]),
        ],
    );
    let opts = DiagramOptions {
        family_index: 7,
        ..Default::default()
    };
    let diagram = arranged(&pedigree, "f", &opts);

    let parents = families_on_row(&diagram, -1);
    assert_eq!(parents.len(), 1);
    assert_eq!(record(&diagram, parents[0]), "adoptive");
}

#[test]
fn unknown_fulcrum_is_an_error() {
    let pedigree = pedigree(&["a"], vec![]);
    let kin = Kinship::new(&pedigree).unwrap();
    let err = Diagram::from_pedigree(&kin, "zz", &DiagramOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownFulcrum { ref id } if id == "zz"));
}

#[test]
fn broken_references_are_rejected() {
    let missing = pedigree(&["a"], vec![family("f1", &["a", "ghost"], &[])]);
    assert!(matches!(
        Kinship::new(&missing).unwrap_err(),
        Error::UnknownPerson { ref person_id, .. } if person_id == "ghost"
    ));

    let twice = pedigree(&["a", "a"], vec![]);
    assert!(matches!(
        Kinship::new(&twice).unwrap_err(),
        Error::DuplicateId { kind: "person", .. }
    ));
}

#[test]
fn acquired_spouses_carry_a_collapsed_ancestry() {
    let pedigree = pedigree(
        &["f", "s", "sf", "sm"],
        vec![
            family("marriage", &["f", "s"], &[]),
            family("in-laws", &["sf", "sm"], &["s"]),
        ],
    );
    let diagram = arranged(&pedigree, "f", &DiagramOptions::default());

    let spouse = diagram
        .nodes()
        .find(|(_, n)| n.is_acquired())
        .map(|(id, _)| id)
        .unwrap();
    let origin = diagram.node(spouse).origin().unwrap();
    let mini = diagram.node(origin);
    assert!(mini.mini);
    assert_eq!(mini.count, 2);
    assert!(mini.rect.bottom() < diagram.node(spouse).rect.y);

    let no_spouses = DiagramOptions {
        show_spouses: false,
        ..Default::default()
    };
    let diagram = arranged(&pedigree, "f", &no_spouses);
    assert!(diagram.nodes().all(|(_, n)| !n.is_acquired() && !n.mini));
}

#[test]
fn truncated_progeny_collapses_into_a_mini() {
    let pedigree = pedigree(
        &["f", "s", "c1", "c2", "g1"],
        vec![
            family("marriage", &["f", "s"], &["c1", "c2"]),
            family("c1-family", &["c1"], &["g1"]),
        ],
    );
    let opts = DiagramOptions {
        descendants: 0,
        ..Default::default()
    };
    let diagram = arranged(&pedigree, "f", &opts);

    assert_eq!(diagram.max_below(), 0);
    let mini = diagram
        .nodes()
        .find(|(_, n)| n.mini && n.generation == 1)
        .map(|(_, n)| n)
        .unwrap();
    assert_eq!(mini.count, 3);
}

#[test]
fn minis_hang_at_a_fixed_distance_from_their_owner() {
    let pedigree = pedigree(
        &["f", "s", "sf", "sm", "c1", "g1"],
        vec![
            family("marriage", &["f", "s"], &["c1"]),
            family("in-laws", &["sf", "sm"], &["s"]),
            family("c1-family", &["c1"], &["g1"]),
        ],
    );
    let opts = DiagramOptions {
        descendants: 0,
        ..Default::default()
    };
    let space = LayoutOptions::default().mini_space;
    let diagram = arranged(&pedigree, "f", &opts);

    let owner = diagram
        .nodes()
        .find(|(_, n)| !n.mini && record_of(n) == "marriage")
        .map(|(id, _)| id)
        .unwrap();
    let progeny = diagram
        .nodes()
        .find(|(_, n)| n.mini && n.generation == 1)
        .map(|(_, n)| n.rect)
        .unwrap();
    let owner_rect = diagram.node(owner).rect;
    assert!((progeny.y - (owner_rect.bottom() + space)).abs() < 1e-9);
    assert!((progeny.center_x() - diagram.anchor_x(owner)).abs() < 1e-9);

    let spouse = diagram
        .nodes()
        .find(|(_, n)| n.is_acquired())
        .map(|(_, n)| n)
        .unwrap();
    let origin = diagram.node(spouse.origin().unwrap()).rect;
    assert!((origin.bottom() - (spouse.rect.y - space)).abs() < 1e-9);
    assert!((origin.center_x() - spouse.rect.center_x()).abs() < 1e-9);
}

#[test]
fn cyclic_records_build_a_bounded_diagram() {
    // Each person is recorded as the other's parent.
    let cycle = pedigree(
        &["a", "b"],
        vec![family("fa", &["a"], &["b"]), family("fb", &["b"], &["a"])],
    );
    for depth in [200, 100_000, u32::MAX] {
        let opts = DiagramOptions {
            ancestors: depth,
            descendants: depth,
            siblings: depth,
            uncles: depth,
            great_uncles: depth,
            ..Default::default()
        };
        let diagram = arranged(&cycle, "a", &opts);

        assert!(diagram.nodes().count() < 20, "{} nodes", diagram.nodes().count());
        assert!(diagram.max_above() <= 3);
        assert!(diagram.max_below() <= 3);
        assert!(diagram.nodes().filter(|(_, n)| n.mini).all(|(_, n)| n.count > 0));
    }
}

#[test]
fn shared_grandparents_are_linked_as_duplicates() {
    // The parents are first cousins: both grandparent couples share one set of parents.
    let pedigree = pedigree(
        &["f", "fa", "mo", "ga", "gb", "gc", "gd", "x", "y"],
        vec![
            family("parents", &["fa", "mo"], &["f"]),
            family("paternal", &["ga", "gb"], &["fa"]),
            family("maternal", &["gc", "gd"], &["mo"]),
            family("common", &["x", "y"], &["ga", "gc"]),
        ],
    );
    let opts = DiagramOptions {
        ancestors: 3,
        ..Default::default()
    };
    let diagram = arranged(&pedigree, "f", &opts);

    assert_eq!(diagram.duplicates().len(), 1);
    let (a, b) = diagram.duplicates()[0];
    assert_eq!(record(&diagram, a), "common");
    assert_eq!(record(&diagram, b), "common");
    assert!(
        diagram
            .connectors()
            .iter()
            .any(|c| c.kind == LineKind::Duplicate)
    );
}
