use stemma::geom::Rect;
use stemma::{
    Diagram, DiagramOptions, Family, FixedCardMeasurer, Kinship, LayoutNodeKind, LayoutOptions,
    Line, LineKind, Pedigree, Person, batch_lines,
};

fn person(id: &str, name: &str, dates: Option<&str>) -> Person {
    Person {
        id: id.to_string(),
        name: name.to_string(),
        dates: dates.map(str::to_string),
        ..Default::default()
    }
}

fn family(id: &str, partners: &[&str], children: &[&str], marriage: Option<&str>) -> Family {
    Family {
        id: id.to_string(),
        partners: partners.iter().map(|s| s.to_string()).collect(),
        children: children.iter().map(|s| s.to_string()).collect(),
        marriage: marriage.map(str::to_string),
    }
}

/// Two generations up, two down, with uneven card sizes and dated marriages.
fn household() -> Pedigree {
    Pedigree {
        persons: vec![
            person("me", "Ada Lovelace", Some("1815-1852")),
            person("wm", "William King", None),
            person("fa", "Lord Byron", Some("1788-1824")),
            person("mo", "Anne Isabella Milbanke", Some("1792-1860")),
            person("gf", "Ralph Milbanke", None),
            person("gm", "Judith Noel", None),
            person("au", "Augusta Leigh", None),
            person("c1", "Byron", None),
            person("c2", "Annabella", None),
            person("c3", "Ralph", None),
            person("gc", "Grandchild", None),
            person("x1", "x1", None),
            person("x2", "x2", None),
        ],
        families: vec![
            family("byron", &["fa", "mo"], &["me"], Some("1815")),
            family("milbanke", &["gf", "gm"], &["mo"], None),
            family("byron-parents", &["x1", "x2"], &["fa", "au"], None),
            family("lovelace", &["wm", "me"], &["c1", "c2", "c3"], Some("1835")),
            family("c2-family", &["c2"], &["gc"], None),
        ],
        fulcrum: Some("me".to_string()),
    }
}

fn arranged(opts: &DiagramOptions) -> Diagram {
    let pedigree = household();
    let kin = Kinship::new(&pedigree).unwrap();
    let mut diagram = Diagram::from_pedigree(&kin, "me", opts).unwrap();
    diagram.measure(&FixedCardMeasurer::default(), &LayoutOptions::default());
    diagram.arrange(&LayoutOptions::default());
    diagram
}

fn all_rects(diagram: &Diagram) -> Vec<Rect> {
    let mut rects = Vec::new();
    for (_, node) in diagram.nodes() {
        rects.push(node.rect);
        if let Some(bond) = node.bond() {
            rects.push(bond.rect);
        }
    }
    rects
}

#[test]
fn normalized_bounds_start_at_the_origin() {
    let diagram = arranged(&DiagramOptions::default());
    let rects = all_rects(&diagram);

    let min_x = rects.iter().map(|r| r.x).fold(f64::INFINITY, f64::min);
    let min_y = rects.iter().map(|r| r.y).fold(f64::INFINITY, f64::min);
    assert!(min_x.abs() < 1e-9, "min x = {min_x}");
    assert!(min_y.abs() < 1e-9, "min y = {min_y}");
    for r in &rects {
        assert!(r.right() <= diagram.width() + 1e-9);
        assert!(r.bottom() <= diagram.height() + 1e-9);
    }
}

#[test]
fn mirroring_twice_restores_every_position() {
    let mut diagram = arranged(&DiagramOptions::default());
    let before = all_rects(&diagram);

    diagram.mirror();
    let mirrored = all_rects(&diagram);
    for (a, b) in before.iter().zip(&mirrored) {
        assert!((b.x - (diagram.width() - a.x - a.width)).abs() < 1e-9);
    }

    diagram.mirror();
    for (a, b) in before.iter().zip(&all_rects(&diagram)) {
        assert!((a.x - b.x).abs() < 1e-9);
        assert_eq!(a.y, b.y);
    }
}

#[test]
fn right_to_left_is_the_mirror_image() {
    let ltr = arranged(&DiagramOptions::default());
    let rtl = arranged(&DiagramOptions {
        left_to_right: false,
        ..Default::default()
    });

    assert!((ltr.width() - rtl.width()).abs() < 1e-9);
    for (a, b) in all_rects(&ltr).iter().zip(&all_rects(&rtl)) {
        assert!((b.x - (ltr.width() - a.x - a.width)).abs() < 1e-6);
    }
}

#[test]
fn couples_sit_either_side_of_their_bond() {
    let diagram = arranged(&DiagramOptions::default());

    let mut dated = 0;
    for (_, node) in diagram.nodes() {
        let (Some(bond), [left, right]) = (node.bond(), node.partners()) else {
            continue;
        };
        if bond.is_dated() {
            dated += 1;
        }
        let (left, right) = (diagram.node(*left).rect, diagram.node(*right).rect);
        assert!((bond.rect.x - left.right()).abs() < 1e-9);
        assert!((right.x - bond.rect.right()).abs() < 1e-9);
        let width = left.width + bond.rect.width + right.width;
        assert!((node.rect.width - width).abs() < 1e-9);
    }
    assert_eq!(dated, 2);
}

#[test]
fn dated_side_marriages_overlap_the_spouse() {
    let pedigree = Pedigree {
        persons: vec![
            person("p", "Pat", None),
            person("s1", "First Spouse", None),
            person("s2", "Second Spouse", None),
        ],
        families: vec![
            family("m1", &["p", "s1"], &[], Some("1900")),
            family("m2", &["p", "s2"], &[], Some("1910")),
        ],
        fulcrum: Some("p".to_string()),
    };
    let kin = Kinship::new(&pedigree).unwrap();
    let mut diagram = Diagram::from_pedigree(&kin, "p", &DiagramOptions::default()).unwrap();
    let opts = LayoutOptions::default();
    diagram.measure(&FixedCardMeasurer::default(), &opts);
    diagram.arrange(&opts);

    let side = diagram
        .nodes()
        .find(|(_, n)| n.as_family().and_then(|f| f.record.as_deref()) == Some("m2"))
        .map(|(_, n)| n)
        .expect("second marriage");
    let bond = side.bond().expect("bond");
    let spouse = diagram.node(side.partners()[0]).rect;
    assert!((bond.overlap - opts.marriage_overlap).abs() < 1e-9);
    assert!((spouse.x - (bond.rect.right() - opts.marriage_overlap)).abs() < 1e-9);
    let width = bond.rect.width + spouse.width - opts.marriage_overlap;
    assert!((side.rect.width - width).abs() < 1e-9);

    let main = diagram
        .nodes()
        .find(|(_, n)| n.as_family().and_then(|f| f.record.as_deref()) == Some("m1"))
        .map(|(_, n)| n)
        .expect("first marriage");
    let bond = main.bond().expect("bond");
    assert_eq!(bond.overlap, 0.0);
    let [left, right] = main.partners() else {
        panic!("couple expected");
    };
    let width = diagram.node(*left).rect.width + bond.rect.width + diagram.node(*right).rect.width;
    assert!((main.rect.width - width).abs() < 1e-9);
}

#[test]
fn children_are_joined_to_their_parents() {
    let diagram = arranged(&DiagramOptions::default());

    for c in diagram.connectors() {
        let from = diagram.node(c.from);
        let to = diagram.node(c.to);
        match c.kind {
            LineKind::Curve => {
                assert!((c.line.x1 - diagram.anchor_x(c.from)).abs() < 1e-9);
                assert!((c.line.x2 - to.rect.center_x()).abs() < 1e-9);
                assert!((c.line.y2 - to.rect.y).abs() < 1e-9);
                assert!(c.line.y1 > from.rect.bottom() && c.line.y1 < to.rect.y);
            }
            LineKind::Straight => {
                assert!(from.mini || to.mini);
            }
            _ => {}
        }
    }
    let curves = diagram
        .connectors()
        .iter()
        .filter(|c| c.kind == LineKind::Curve)
        .count();
    // Father and aunt, mother, fulcrum, three children, one grandchild.
    assert_eq!(curves, 8);
}

#[test]
fn layout_reports_every_node() {
    let pedigree = household();
    let layout = stemma::layout(
        &pedigree,
        "me",
        &DiagramOptions::default(),
        &LayoutOptions::default(),
        &FixedCardMeasurer::default(),
    )
    .unwrap();

    assert_eq!(layout.max_above, 2);
    assert_eq!(layout.max_below, 2);
    let fulcrum: Vec<_> = layout.nodes.iter().filter(|n| n.fulcrum).collect();
    assert_eq!(fulcrum.len(), 1);
    assert_eq!(fulcrum[0].record.as_deref(), Some("me"));
    assert_eq!(fulcrum[0].kind, LayoutNodeKind::Person);
    assert!(layout.bonds.iter().any(|b| b.label.as_deref() == Some("1835")));
    assert!(!layout.line_groups.is_empty());

    let json = serde_json::to_value(&layout).unwrap();
    assert!(json.get("lineGroups").is_some());
    assert!(json.get("maxAbove").is_some());
}

#[test]
fn evenly_spaced_lines_split_into_bounded_groups() {
    let lines: Vec<Line> = (0..5)
        .map(|i| {
            let x = f64::from(i) * 1000.0;
            Line::new(LineKind::Vertical, x, 0.0, x, 100.0)
        })
        .collect();
    let groups = batch_lines(&lines, 1000.0);

    assert!(groups.len() == 4 || groups.len() == 5);
    for g in &groups {
        assert!(g.bounds.width() <= 1000.0);
    }
    assert_eq!(groups.iter().map(|g| g.lines.len()).sum::<usize>(), 5);
}
