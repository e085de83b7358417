#![allow(missing_docs)]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tagboard_core::{LineTokenizer, Tokenizer};

fn build_markdown(task_count: usize) -> String {
    let mut text = String::from("# Board\n\n");
    for idx in 0..task_count {
        let list = ["TODO", "DOING", "DONE"][idx % 3];
        text.push_str(&format!(
            "- [ ] #{list} Task number {idx} +bench @ci order:{order} owner:bench\n",
            order = idx * 10
        ));
        if idx % 4 == 0 {
            text.push_str("Some prose between tasks that is not a card.\n");
        }
    }
    text
}

fn build_source(task_count: usize) -> String {
    let mut text = String::from("fn main() {\n");
    for idx in 0..task_count {
        text.push_str(&format!("    let v{idx} = {idx}; // TODO: tidy value {idx}\n"));
        text.push_str("    /* plain comment */\n");
    }
    text.push_str("}\n");
    text
}

fn tokenize_benchmark(c: &mut Criterion) {
    let tokenizer = LineTokenizer::default();
    let mut group = c.benchmark_group("line_tokenizer");
    for &task_count in &[16usize, 256, 4096] {
        group.bench_with_input(
            BenchmarkId::new("markdown", task_count),
            &task_count,
            |b, &count| {
                b.iter_batched(
                    || build_markdown(count),
                    |text| {
                        black_box(tokenizer.parse("TODO.md", &text));
                    },
                    BatchSize::SmallInput,
                );
            },
        );
        group.bench_with_input(BenchmarkId::new("source", task_count), &task_count, |b, &count| {
            b.iter_batched(
                || build_source(count),
                |text| {
                    black_box(tokenizer.parse("src/main.rs", &text));
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, tokenize_benchmark);
criterion_main!(benches);
