use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::{Config, DistanceMetric, Embedding, Graph, Node};

const DIM: usize = 128; // Default dimensionality for benchmarks

// --- Data Generation Helper Functions ---

fn generate_random_vector(dim: usize, rng: &mut StdRng) -> Embedding {
    let vec: Vec<f32> = (0..dim).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect();
    vec.into()
}

fn generate_test_data(num_vectors: usize, dim: usize, seed: u64) -> Vec<Node<u64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_vectors)
        .map(|i| Node::new(i as u64, generate_random_vector(dim, &mut rng)))
        .collect()
}

fn bench_config(seed: u64) -> Config {
    Config {
        seed: Some(seed),
        ..Config::default()
    }
}

// --- Benchmark Functions ---

fn bench_build_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_graph");
    let seed = 1u64;

    for n in [100usize, 1000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || generate_test_data(n, DIM, seed),
                |data| {
                    let graph =
                        Graph::new(bench_config(seed), DistanceMetric::Euclidean).unwrap();
                    graph.add(data).unwrap();
                    graph
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let seed = 2u64;

    let graph = Graph::new(bench_config(seed), DistanceMetric::Euclidean).unwrap();
    graph.add(generate_test_data(1000, DIM, seed)).unwrap();

    let mut rng = StdRng::seed_from_u64(seed + 1);
    let queries: Vec<Embedding> = (0..64)
        .map(|_| generate_random_vector(DIM, &mut rng))
        .collect();

    for k in [1usize, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            let mut i = 0;
            b.iter(|| {
                let query = &queries[i % queries.len()];
                i += 1;
                black_box(graph.search(query, k).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_delete_with_repair(c: &mut Criterion) {
    let mut group = c.benchmark_group("delete_with_repair");
    let seed = 3u64;
    let n = 500usize;
    group.throughput(Throughput::Elements(n as u64 / 2));

    group.bench_function(BenchmarkId::from_parameter(n), |b| {
        b.iter_batched(
            || {
                let graph =
                    Graph::new(bench_config(seed), DistanceMetric::Euclidean).unwrap();
                graph.add(generate_test_data(n, DIM, seed)).unwrap();
                graph
            },
            |graph| {
                for key in 0..(n as u64 / 2) {
                    graph.delete(black_box(&key)).unwrap();
                }
                graph
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build_graph,
    bench_search,
    bench_delete_with_repair
);
criterion_main!(benches);
