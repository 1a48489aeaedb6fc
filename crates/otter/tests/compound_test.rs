use otter::{CoseOptions, Edge, Graph, LayoutInfo, Node, Padding, SimulationState};

fn three_level_fixture() -> Graph {
    let mut grandparent = Node::new("grandparent", 1.0, 1.0);
    grandparent.padding = Padding::uniform(10.0);
    let mut parent = Node::new("parent", 1.0, 1.0).with_parent("grandparent");
    parent.padding = Padding {
        left: 3.0,
        right: 5.0,
        top: 7.0,
        bottom: 9.0,
    };
    Graph {
        nodes: vec![
            grandparent,
            parent,
            Node::new("child1", 40.0, 20.0).with_parent("parent").at(0.0, 0.0),
            Node::new("child2", 20.0, 40.0).with_parent("parent").at(5.0, 5.0),
            Node::new("child3", 20.0, 20.0)
                .with_parent("parent")
                .at(-30.0, 10.0)
                .locked(),
            Node::new("uncle", 30.0, 30.0).with_parent("grandparent").at(90.0, 0.0),
            Node::new("stranger", 30.0, 30.0).at(400.0, 300.0),
        ],
        edges: vec![
            Edge::new("c1-c2", "child1", "child2"),
            Edge::new("c1-uncle", "child1", "uncle"),
            Edge::new("c2-stranger", "child2", "stranger"),
        ],
    }
}

#[test]
fn compound_bounds_contain_descendants_after_every_pass() {
    let opts = CoseOptions::default();
    let mut info = LayoutInfo::build(&three_level_fixture(), &opts);
    assert!(info.compounds_contain_children(1e-9));

    let mut sim = SimulationState::new(&opts);
    let mut passes = 0;
    loop {
        let more = sim.step(&mut info, &opts);
        passes += 1;
        assert!(
            info.compounds_contain_children(1e-9),
            "containment broken after pass {passes}"
        );
        if !more {
            break;
        }
    }
    assert_eq!(passes, sim.iteration);
}

#[test]
fn compound_geometry_follows_its_bounds() {
    let opts = CoseOptions::default();
    let mut info = LayoutInfo::build(&three_level_fixture(), &opts);
    let mut sim = SimulationState::new(&opts);
    for _ in 0..25 {
        sim.step(&mut info, &opts);
    }
    for id in ["parent", "grandparent"] {
        let n = info.node(id).unwrap();
        let b = n.rect();
        assert!(((b.min_x + b.max_x) / 2.0 - n.position_x).abs() < 1e-9);
        assert!(((b.min_y + b.max_y) / 2.0 - n.position_y).abs() < 1e-9);
        assert!((b.width() - n.width).abs() < 1e-9);
        assert!((b.height() - n.height).abs() < 1e-9);
    }
}

#[test]
fn locked_child_keeps_its_position() {
    let opts = CoseOptions::default();
    let mut info = LayoutInfo::build(&three_level_fixture(), &opts);
    let mut sim = SimulationState::new(&opts);
    while sim.step(&mut info, &opts) {}
    let locked = info.node("child3").unwrap();
    assert_eq!((locked.position_x, locked.position_y), (-30.0, 10.0));
    assert!(info.compounds_contain_children(1e-9));
}

#[test]
fn nested_edges_get_longer_ideal_lengths() {
    let opts = CoseOptions::default();
    let info = LayoutInfo::build(&three_level_fixture(), &opts);
    let by_id = |id: &str| {
        info.edges
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.ideal_length)
            .unwrap()
    };
    assert!((by_id("c1-c2") - 32.0).abs() < 1e-9);
    // child1 climbs one level to meet uncle's group.
    assert!((by_id("c1-uncle") - 32.0 * 1.0 * 1.2).abs() < 1e-9);
    // child2 climbs two levels to reach the root group.
    assert!((by_id("c2-stranger") - 32.0 * 2.0 * 1.2).abs() < 1e-9);
}

#[test]
fn locked_compounds_stay_centered_on_their_children() {
    let mut g = three_level_fixture();
    g.nodes[1].locked = true;
    let opts = CoseOptions::default();
    let mut info = LayoutInfo::build(&g, &opts);
    let mut sim = SimulationState::new(&opts);
    loop {
        let more = sim.step(&mut info, &opts);
        let parent = info.node("parent").unwrap();
        let b = parent.rect();
        assert!(((b.min_x + b.max_x) / 2.0 - parent.position_x).abs() < 1e-9);
        assert!(((b.min_y + b.max_y) / 2.0 - parent.position_y).abs() < 1e-9);
        assert!(info.compounds_contain_children(1e-9));
        if !more {
            break;
        }
    }
}
