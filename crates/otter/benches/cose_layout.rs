use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use otter::{CoseOptions, Edge, Graph, Node, layout};
use std::hint::black_box;
use std::time::Duration;

fn grid(side: usize) -> Graph {
    let id = |r: usize, c: usize| format!("g{r}_{c}");
    let mut nodes = Vec::with_capacity(side * side);
    let mut edges = Vec::new();
    for r in 0..side {
        for c in 0..side {
            nodes.push(Node::new(id(r, c), 30.0, 30.0).at(c as f64 * 7.0, r as f64 * 5.0));
            if c + 1 < side {
                edges.push(Edge::new(format!("h{r}_{c}"), id(r, c), id(r, c + 1)));
            }
            if r + 1 < side {
                edges.push(Edge::new(format!("v{r}_{c}"), id(r, c), id(r + 1, c)));
            }
        }
    }
    Graph { nodes, edges }
}

/// `groups` compounds of `per_group` leaves each, chained leaf-to-leaf across groups.
fn compound_chain(groups: usize, per_group: usize) -> Graph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for g in 0..groups {
        let parent = format!("p{g}");
        nodes.push(Node::new(parent.clone(), 1.0, 1.0));
        for i in 0..per_group {
            let leaf = format!("p{g}_n{i}");
            nodes.push(
                Node::new(leaf.clone(), 25.0, 25.0)
                    .with_parent(parent.clone())
                    .at(g as f64 * 60.0 + i as f64 * 3.0, i as f64 * 4.0),
            );
            if i > 0 {
                edges.push(Edge::new(
                    format!("{leaf}_in"),
                    format!("p{g}_n{}", i - 1),
                    leaf.clone(),
                ));
            }
        }
        if g > 0 {
            edges.push(Edge::new(
                format!("link{g}"),
                format!("p{}_n0", g - 1),
                format!("p{g}_n0"),
            ));
        }
    }
    Graph { nodes, edges }
}

fn disconnected_pairs(count: usize) -> Graph {
    let mut nodes = Vec::with_capacity(count * 2);
    let mut edges = Vec::with_capacity(count);
    for i in 0..count {
        nodes.push(Node::new(format!("a{i}"), 20.0, 20.0));
        nodes.push(Node::new(format!("b{i}"), 20.0, 20.0));
        edges.push(Edge::new(format!("e{i}"), format!("a{i}"), format!("b{i}")));
    }
    Graph { nodes, edges }
}

fn bench_cose_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("cose_layout");
    group.measurement_time(Duration::from_secs(10));

    let opts = CoseOptions::default();
    let cases = [
        ("grid_8x8", grid(8), opts.clone()),
        ("grid_16x16", grid(16), opts.clone()),
        ("compound_10x8", compound_chain(10, 8), opts.clone()),
        (
            "random_pairs_50",
            disconnected_pairs(50),
            CoseOptions {
                randomize: true,
                random_seed: 7,
                ..opts.clone()
            },
        ),
    ];

    for (name, graph, opts) in &cases {
        group.bench_with_input(BenchmarkId::new("layout", name), graph, |b, graph| {
            b.iter(|| {
                let result = layout(black_box(graph), black_box(opts)).unwrap();
                black_box(result.iterations);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cose_layout);
criterion_main!(benches);
