//! Numeric cleaning and row filtering applied to every batch before inference.

use crate::models::RowBatch;
use crate::scoring::errors::ScoringError;

/// Parse a raw cell as a number; unparseable and non-finite values are missing
pub fn coerce_numeric(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Fill missing values with the mean of the present ones.
///
/// If nothing is present the values are returned unchanged.
pub fn impute_with_mean(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        return values.to_vec();
    }

    let mean = sum / count as f64;
    values.iter().map(|v| Some(v.unwrap_or(mean))).collect()
}

/// Coerce and impute the `TotalCharges` column of a batch.
///
/// The mean is taken over every record of this batch only.
pub fn clean_total_charges(batch: &RowBatch) -> Vec<Option<f64>> {
    let coerced: Vec<Option<f64>> = (0..batch.len())
        .map(|row| coerce_numeric(batch.total_charges_raw(row)))
        .collect();
    impute_with_mean(&coerced)
}

/// Parse `tenure`; it is a key column, so anything but a non-negative integer is fatal
pub fn parse_tenure(batch: &RowBatch, row: usize) -> Result<i64, ScoringError> {
    let malformed = |value: Option<&str>| ScoringError::MalformedRecord {
        row,
        column: crate::constants::columns::TENURE.to_string(),
        value: value.unwrap_or("").to_string(),
    };

    let raw = batch.tenure_raw(row);
    let text = raw.map(str::trim).ok_or_else(|| malformed(raw))?;

    let tenure = match text.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => v as i64,
            _ => return Err(malformed(raw)),
        },
    };

    if tenure < 0 {
        return Err(malformed(raw));
    }
    Ok(tenure)
}

/// Indices of the records that survive the `tenure == 0` filter, in order
pub fn surviving_rows(batch: &RowBatch) -> Result<Vec<usize>, ScoringError> {
    let mut rows = Vec::with_capacity(batch.len());
    for row in 0..batch.len() {
        if parse_tenure(batch, row)? != 0 {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: Vec<(&str, Option<&str>, Option<&str>)>) -> RowBatch {
        RowBatch::from_cells(
            &["customerID", "tenure", "TotalCharges"],
            rows.into_iter()
                .map(|(id, tenure, charges)| vec![Some(id), tenure, charges])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(Some("100")), Some(100.0));
        assert_eq!(coerce_numeric(Some(" 29.85 ")), Some(29.85));
        assert_eq!(coerce_numeric(Some("bad")), None);
        assert_eq!(coerce_numeric(Some(" ")), None);
        assert_eq!(coerce_numeric(Some("NaN")), None);
        assert_eq!(coerce_numeric(Some("inf")), None);
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn test_imputation_uses_batch_mean() {
        let b = batch(vec![
            ("A", Some("1"), Some("100")),
            ("B", Some("1"), Some("bad")),
            ("C", Some("1"), None),
            ("D", Some("1"), Some("300")),
        ]);
        assert_eq!(
            clean_total_charges(&b),
            vec![Some(100.0), Some(200.0), Some(200.0), Some(300.0)]
        );
    }

    #[test]
    fn test_imputation_with_nothing_present_leaves_missing() {
        assert_eq!(impute_with_mean(&[None, None]), vec![None, None]);
        assert!(impute_with_mean(&[]).is_empty());
    }

    #[test]
    fn test_parse_tenure() {
        let b = batch(vec![
            ("A", Some("5"), None),
            ("B", Some("0"), None),
            ("C", Some("12.0"), None),
            ("D", Some("-1"), None),
            ("E", None, None),
            ("F", Some("1.5"), None),
        ]);
        assert_eq!(parse_tenure(&b, 0).unwrap(), 5);
        assert_eq!(parse_tenure(&b, 1).unwrap(), 0);
        assert_eq!(parse_tenure(&b, 2).unwrap(), 12);
        assert!(parse_tenure(&b, 3).is_err());
        assert!(parse_tenure(&b, 4).is_err());
        assert!(parse_tenure(&b, 5).is_err());
    }

    #[test]
    fn test_surviving_rows_drops_zero_tenure() {
        let b = batch(vec![
            ("A", Some("5"), None),
            ("B", Some("0"), None),
            ("C", Some("7"), None),
        ]);
        assert_eq!(surviving_rows(&b).unwrap(), vec![0, 2]);
    }
}
