use proptest::prelude::*;

/// A raw `tenure` cell: mostly small non-negative integers, with plenty of zeros
pub fn tenure_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![
        2 => Just(0u32),
        5 => 1u32..=72,
    ]
}

/// A raw `TotalCharges` cell, sometimes blank or unparseable
pub fn total_charges_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        6 => (0.0f64..9000.0).prop_map(|v| Some(format!("{v:.2}"))),
        1 => Just(Some(" ".to_string())),
        1 => Just(Some("n/a".to_string())),
        1 => Just(None),
    ]
}

/// Unique customer rows `(id, tenure, total_charges)`
pub fn customer_rows_strategy(
    max_rows: usize,
) -> impl Strategy<Value = Vec<(String, u32, Option<String>)>> {
    prop::collection::vec((tenure_strategy(), total_charges_strategy()), 0..max_rows).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (tenure, charges))| (format!("{i:04}-CUST"), tenure, charges))
                .collect()
        },
    )
}

pub fn probability_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(0.5),
        Just(1.0),
        0.0f64..=1.0,
    ]
}
