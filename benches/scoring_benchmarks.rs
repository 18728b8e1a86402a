use churn_scoring::artifact::{ModelArtifact, PipelineArtifact};
use churn_scoring::models::RowBatch;
use churn_scoring::scoring::cleaning::clean_total_charges;
use churn_scoring::{OutputSchema, PartitionScorer, PollingPolicy};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::sync::Arc;

fn pipeline() -> Arc<dyn ModelArtifact> {
    let document = json!({
        "format_version": 1,
        "model_version": "bench",
        "estimator": { "kind": "logistic_regression", "intercept": -0.3 },
        "features": [
            { "type": "numeric", "column": "tenure", "mean": 32.4, "scale": 24.6, "coefficient": -1.2 },
            { "type": "numeric", "column": "TotalCharges", "mean": 2283.3, "scale": 2266.8, "coefficient": 0.4 },
            { "type": "categorical", "column": "Contract",
              "weights": { "Month-to-month": 0.9, "One year": -0.2, "Two year": -1.1 } }
        ]
    });
    Arc::new(PipelineArtifact::decode(&serde_json::to_vec(&document).unwrap()).unwrap())
}

fn batch(rows: usize) -> RowBatch {
    let contracts = ["Month-to-month", "One year", "Two year"];
    let cells: Vec<(String, String, String)> = (0..rows)
        .map(|i| {
            let charges = if i % 97 == 0 {
                " ".to_string()
            } else {
                format!("{:.2}", 18.8 + (i % 400) as f64 * 21.3)
            };
            (format!("{i:06}-BNCH"), (i % 73).to_string(), charges)
        })
        .collect();

    RowBatch::from_cells(
        &["customerID", "tenure", "TotalCharges", "Contract"],
        cells
            .iter()
            .enumerate()
            .map(|(i, (id, tenure, charges))| {
                vec![
                    Some(id.as_str()),
                    Some(tenure.as_str()),
                    Some(charges.as_str()),
                    Some(contracts[i % 3]),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn benchmark_score_batch(c: &mut Criterion) {
    let scorer = PartitionScorer::new(pipeline(), 0.5);
    let mut group = c.benchmark_group("score_batch");
    for rows in [1_000usize, 10_000] {
        let input = batch(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &input, |b, input| {
            b.iter(|| scorer.score_batch(black_box(input)).unwrap())
        });
    }
    group.finish();
}

fn benchmark_imputation(c: &mut Criterion) {
    let input = batch(10_000);
    c.bench_function("clean_total_charges_10k", |b| {
        b.iter(|| clean_total_charges(black_box(&input)))
    });
}

fn benchmark_schema_validation(c: &mut Criterion) {
    let scored = PartitionScorer::new(pipeline(), 0.5)
        .score_batch(&batch(10_000))
        .unwrap();
    let schema = OutputSchema::scored_records(0.5);
    c.bench_function("validate_scored_10k", |b| {
        b.iter(|| schema.validate(black_box(&scored)).unwrap())
    });
}

fn benchmark_backoff_schedule(c: &mut Criterion) {
    let policy = PollingPolicy::default();
    c.bench_function("backoff_schedule", |b| {
        b.iter(|| (1..=64).map(|attempt| policy.interval_for_attempt(black_box(attempt))).max())
    });
}

criterion_group!(
    benches,
    benchmark_score_batch,
    benchmark_imputation,
    benchmark_schema_validation,
    benchmark_backoff_schedule
);
criterion_main!(benches);
