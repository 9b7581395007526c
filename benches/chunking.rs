//! Benchmarks for chunking and summary merging.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use abridge::{ChunkingConfig, IntelligentChunker, MergeStrategy, SummaryMerger};

fn sample_text(size: usize) -> String {
    // Generate realistic text with sentence structure
    let sentences = [
        "The expedition crossed the ridge before nightfall. ",
        "Supplies were running lower than anyone admitted. ",
        "A storm had closed the eastern pass for a week! ",
        "Who among the crew still trusted the old charts? ",
        "The captain wrote nothing of it in the log. ",
    ];
    let mut text = String::with_capacity(size);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text.truncate(size);
    text
}

fn sample_summaries(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "Chunk {i} covers the expedition's progress through the mountains. \
                 Supplies dwindled while the weather worsened steadily. \
                 The crew debated turning back at the {i}th waypoint."
            )
        })
        .collect()
}

fn bench_chunker(c: &mut Criterion) {
    let mut group = c.benchmark_group("intelligent_chunker");

    for size in [1_000, 10_000, 100_000] {
        let text = sample_text(size);
        let chunker = IntelligentChunker::new(ChunkingConfig::default()).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("chunk_text", size), &text, |b, text| {
            b.iter(|| chunker.chunk_text(black_box(text)))
        });
    }

    group.finish();
}

fn bench_merger(c: &mut Criterion) {
    let mut group = c.benchmark_group("summary_merger");

    for count in [4, 16, 64] {
        let summaries = sample_summaries(count);
        let merger = SummaryMerger::new();

        for (name, strategy) in [
            ("simple", MergeStrategy::Simple),
            ("semantic", MergeStrategy::Semantic),
            ("intelligent", MergeStrategy::Intelligent),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, count),
                &summaries,
                |b, summaries| {
                    b.iter(|| merger.merge_summaries(black_box(summaries), strategy, 5_000))
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_chunker, bench_merger);
criterion_main!(benches);
