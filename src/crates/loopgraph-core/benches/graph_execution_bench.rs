//! Benchmarks for graph execution: chain propagation and cyclic multi-pass
//! runs.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loopgraph_core::{
    Edge, ExecutionContext, ExecutionEngine, Graph, InputRecord, MultiPass, Node, OutputRecord,
    Port, SinglePass,
};
use serde_json::json;

/// Adds 1 to the sum of its inputs.
struct Relay(String);

#[async_trait]
impl Node for Relay {
    fn id(&self) -> &str {
        &self.0
    }

    fn type_tag(&self) -> &str {
        "relay"
    }

    fn input_ports(&self) -> Vec<Port> {
        vec![Port::input("in", "In")]
    }

    fn output_ports(&self) -> Vec<Port> {
        vec![Port::output("value", "Value")]
    }

    async fn compute(
        &self,
        inputs: &InputRecord,
        _ctx: &mut ExecutionContext,
    ) -> loopgraph_core::Result<OutputRecord> {
        let mut record = OutputRecord::new();
        record.insert(
            "value".to_string(),
            json!(inputs.get("in").copied().unwrap_or(0.0) + 1.0),
        );
        Ok(record)
    }
}

fn chain(n: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..n {
        graph = graph.add_node(Relay(format!("n{}", i))).unwrap();
    }
    for i in 1..n {
        graph = graph.add_edge(Edge::new(
            format!("e{}", i),
            format!("n{}", i - 1),
            "value",
            format!("n{}", i),
            "in",
        ));
    }
    graph
}

fn ring(n: usize) -> Graph {
    let mut graph = chain(n);
    graph = graph.add_edge(Edge::new("feedback", format!("n{}", n - 1), "value", "n0", "in"));
    graph
}

fn bench_single_pass_chain(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let graph = chain(100);
    c.bench_function("single_pass_chain_100", |b| {
        b.iter(|| {
            let mut engine = ExecutionEngine::new(SinglePass::new());
            rt.block_on(engine.execute(black_box(&graph), None)).unwrap()
        })
    });
}

fn bench_multi_pass_ring(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let graph = ring(50);
    c.bench_function("multi_pass_ring_50x10", |b| {
        b.iter(|| {
            let mut engine = ExecutionEngine::new(MultiPass::new(10).unwrap());
            rt.block_on(engine.execute(black_box(&graph), None)).unwrap()
        })
    });
}

fn bench_evaluation_order(c: &mut Criterion) {
    let graph = ring(500);
    c.bench_function("evaluation_order_ring_500", |b| {
        b.iter(|| loopgraph_core::evaluation_order(black_box(&graph)))
    });
}

criterion_group!(
    benches,
    bench_single_pass_chain,
    bench_multi_pass_ring,
    bench_evaluation_order
);
criterion_main!(benches);
