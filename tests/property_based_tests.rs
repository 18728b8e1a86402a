mod common;

use common::strategies::*;
use common::ConstantArtifact;
use churn_scoring::models::{RowBatch, ScoredRecord};
use churn_scoring::scoring::cleaning::{clean_total_charges, coerce_numeric};
use churn_scoring::PartitionScorer;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn to_batch(rows: &[(String, u32, Option<String>)]) -> RowBatch {
    let tenures: Vec<String> = rows.iter().map(|(_, t, _)| t.to_string()).collect();
    RowBatch::from_cells(
        &["customerID", "tenure", "TotalCharges"],
        rows.iter()
            .zip(&tenures)
            .map(|((id, _, charges), tenure)| {
                vec![Some(id.as_str()), Some(tenure.as_str()), charges.as_deref()]
            })
            .collect(),
    )
    .unwrap()
}

proptest! {
    /// Property: output holds exactly the non-zero-tenure customers, each once, in input order
    #[test]
    fn scored_output_is_filtered_input_without_duplicates(
        rows in customer_rows_strategy(64),
        probability in probability_strategy(),
    ) {
        let scorer = PartitionScorer::new(Arc::new(ConstantArtifact::new(probability)), 0.5);
        let scored = scorer.score_batch(&to_batch(&rows)).unwrap();

        let expected: Vec<&str> = rows
            .iter()
            .filter(|(_, tenure, _)| *tenure != 0)
            .map(|(id, _, _)| id.as_str())
            .collect();
        let actual: Vec<&str> = scored.records().iter().map(|r| r.userid.as_str()).collect();
        prop_assert_eq!(&actual, &expected);

        let unique: HashSet<&str> = actual.iter().copied().collect();
        prop_assert_eq!(unique.len(), actual.len());
    }

    /// Property: prediction is 1 exactly when the probability reaches the threshold
    #[test]
    fn prediction_matches_threshold(
        probability in probability_strategy(),
        threshold in probability_strategy(),
    ) {
        let record = ScoredRecord::from_probability("7590-VHVEG", probability, threshold);
        prop_assert_eq!(record.prediction == 1, probability >= threshold);
        prop_assert!(record.prediction == 0 || record.prediction == 1);
    }

    /// Property: imputation only touches missing cells and uses the batch mean
    #[test]
    fn imputation_fills_missing_with_batch_mean(rows in customer_rows_strategy(64)) {
        let batch = to_batch(&rows);
        let cleaned = clean_total_charges(&batch);
        let coerced: Vec<Option<f64>> = rows
            .iter()
            .map(|(_, _, charges)| coerce_numeric(charges.as_deref()))
            .collect();
        let present: Vec<f64> = coerced.iter().flatten().copied().collect();

        prop_assert_eq!(cleaned.len(), rows.len());
        if present.is_empty() {
            prop_assert!(cleaned.iter().all(Option::is_none));
        } else {
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            for (original, value) in coerced.iter().zip(&cleaned) {
                match original {
                    Some(v) => prop_assert_eq!(*value, Some(*v)),
                    None => prop_assert!((value.unwrap() - mean).abs() < 1e-9),
                }
            }
        }
    }
}
