//! # Serialized Classification Pipeline
//!
//! A trained churn pipeline is stored as a JSON document describing its
//! per-column preprocessing (standard scaling for numeric columns, weighted
//! one-hot encoding for categorical ones) and a logistic estimator on top.

use super::errors::{ArtifactDecodeError, ArtifactError};
use crate::models::{FeatureMatrix, FeatureValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

/// Document format understood by [`PipelineArtifact::decode`]
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Estimator kinds that expose a positive-class probability
const PROBABILISTIC_ESTIMATORS: [&str; 1] = ["logistic_regression"];

/// A loaded, immutable classifier able to score a feature matrix.
///
/// Implementations are shared across scoring lanes without locking, so they
/// must not carry interior mutability that affects results.
pub trait ModelArtifact: Send + Sync + Debug {
    /// Version label of the trained model
    fn model_version(&self) -> &str;

    /// Columns that must be present in every batch handed to the artifact
    fn required_features(&self) -> &[String];

    /// Probability of the positive class for every row, in row order
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ArtifactError>;
}

/// On-disk representation of a trained pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDocument {
    pub format_version: u32,
    pub model_version: String,
    pub estimator: EstimatorSpec,
    pub features: Vec<FeatureSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSpec {
    pub kind: String,
    #[serde(default)]
    pub intercept: f64,
}

/// Preprocessing and weight of one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureSpec {
    Numeric {
        column: String,
        mean: f64,
        scale: f64,
        coefficient: f64,
    },
    Categorical {
        column: String,
        weights: HashMap<String, f64>,
    },
}

impl FeatureSpec {
    pub fn column(&self) -> &str {
        match self {
            Self::Numeric { column, .. } | Self::Categorical { column, .. } => column,
        }
    }
}

/// Logistic pipeline decoded from a [`PipelineDocument`]
#[derive(Debug, Clone)]
pub struct PipelineArtifact {
    document: PipelineDocument,
    required: Vec<String>,
}

impl PipelineArtifact {
    /// Decode and validate serialized pipeline bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, ArtifactDecodeError> {
        let document: PipelineDocument = serde_json::from_slice(bytes)
            .map_err(|e| ArtifactDecodeError::Corrupt(format!("invalid pipeline document: {e}")))?;
        Self::from_document(document)
    }

    /// Validate an in-memory document
    pub fn from_document(document: PipelineDocument) -> Result<Self, ArtifactDecodeError> {
        if document.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ArtifactDecodeError::Incompatible(format!(
                "unsupported format_version {} (expected {SUPPORTED_FORMAT_VERSION})",
                document.format_version
            )));
        }

        if !PROBABILISTIC_ESTIMATORS.contains(&document.estimator.kind.as_str()) {
            return Err(ArtifactDecodeError::Incompatible(format!(
                "estimator '{}' does not provide class probabilities",
                document.estimator.kind
            )));
        }

        if !document.estimator.intercept.is_finite() {
            return Err(ArtifactDecodeError::Incompatible(
                "estimator intercept is not finite".to_string(),
            ));
        }

        if document.features.is_empty() {
            return Err(ArtifactDecodeError::Incompatible(
                "pipeline declares no feature columns".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for feature in &document.features {
            if !seen.insert(feature.column()) {
                return Err(ArtifactDecodeError::Incompatible(format!(
                    "feature column '{}' declared more than once",
                    feature.column()
                )));
            }

            match feature {
                FeatureSpec::Numeric {
                    column,
                    mean,
                    scale,
                    coefficient,
                } => {
                    if !(mean.is_finite() && coefficient.is_finite() && scale.is_finite())
                        || *scale == 0.0
                    {
                        return Err(ArtifactDecodeError::Incompatible(format!(
                            "numeric feature '{column}' has invalid scaling parameters"
                        )));
                    }
                }
                FeatureSpec::Categorical { column, weights } => {
                    if weights.values().any(|w| !w.is_finite()) {
                        return Err(ArtifactDecodeError::Incompatible(format!(
                            "categorical feature '{column}' has a non-finite weight"
                        )));
                    }
                }
            }
        }

        let required = document
            .features
            .iter()
            .map(|f| f.column().to_string())
            .collect();

        Ok(Self { document, required })
    }

    pub fn document(&self) -> &PipelineDocument {
        &self.document
    }

    fn contribution(
        feature: &FeatureSpec,
        value: &FeatureValue,
        row: usize,
    ) -> Result<f64, ArtifactError> {
        match feature {
            FeatureSpec::Numeric {
                column,
                mean,
                scale,
                coefficient,
            } => {
                let x = match value {
                    FeatureValue::Number(x) if x.is_finite() => *x,
                    FeatureValue::Number(_) | FeatureValue::Missing => return Ok(0.0),
                    FeatureValue::Text(text) => match text.trim().parse::<f64>() {
                        Ok(x) if x.is_finite() => x,
                        _ => {
                            return Err(ArtifactError::InvalidFeatureValue {
                                column: column.clone(),
                                row,
                                value: text.clone(),
                            })
                        }
                    },
                };
                Ok(coefficient * (x - mean) / scale)
            }
            FeatureSpec::Categorical { weights, .. } => Ok(match value {
                FeatureValue::Text(text) => weights.get(text.as_str()).copied().unwrap_or(0.0),
                FeatureValue::Number(x) => weights.get(&x.to_string()).copied().unwrap_or(0.0),
                FeatureValue::Missing => 0.0,
            }),
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ModelArtifact for PipelineArtifact {
    fn model_version(&self) -> &str {
        &self.document.model_version
    }

    fn required_features(&self) -> &[String] {
        &self.required
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ArtifactError> {
        let bound = self
            .document
            .features
            .iter()
            .map(|spec| {
                features
                    .column_index(spec.column())
                    .map(|index| (spec, index))
                    .ok_or_else(|| ArtifactError::MissingFeature {
                        column: spec.column().to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        features
            .rows()
            .iter()
            .enumerate()
            .map(|(row, values)| {
                let mut z = self.document.estimator.intercept;
                for (spec, index) in &bound {
                    z += Self::contribution(spec, &values[*index], row)?;
                }
                Ok(sigmoid(z))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> serde_json::Value {
        json!({
            "format_version": 1,
            "model_version": "test-v1",
            "estimator": { "kind": "logistic_regression", "intercept": 0.0 },
            "features": [
                { "type": "numeric", "column": "tenure", "mean": 10.0, "scale": 5.0, "coefficient": -1.0 },
                { "type": "categorical", "column": "Contract",
                  "weights": { "Month-to-month": 1.5, "Two year": -2.0 } }
            ]
        })
    }

    fn decode(value: serde_json::Value) -> Result<PipelineArtifact, ArtifactDecodeError> {
        PipelineArtifact::decode(&serde_json::to_vec(&value).unwrap())
    }

    fn matrix(rows: Vec<Vec<FeatureValue>>) -> FeatureMatrix {
        let mut m = FeatureMatrix::new(vec!["tenure".to_string(), "Contract".to_string()]);
        for row in rows {
            m.push_row(row);
        }
        m
    }

    #[test]
    fn test_decode_valid_document() {
        let artifact = decode(document()).unwrap();
        assert_eq!(artifact.model_version(), "test-v1");
        assert_eq!(artifact.required_features(), ["tenure", "Contract"]);
    }

    #[test]
    fn test_malformed_json_is_corrupt() {
        let err = PipelineArtifact::decode(b"\x80\x04joblib-pickle").unwrap_err();
        assert!(matches!(err, ArtifactDecodeError::Corrupt(_)));
    }

    #[test]
    fn test_non_probabilistic_estimator_is_incompatible() {
        let mut doc = document();
        doc["estimator"]["kind"] = json!("linear_regression");
        let err = decode(doc).unwrap_err();
        assert!(matches!(err, ArtifactDecodeError::Incompatible(ref m) if m.contains("linear_regression")));
    }

    #[test]
    fn test_unknown_format_version_is_incompatible() {
        let mut doc = document();
        doc["format_version"] = json!(7);
        assert!(matches!(
            decode(doc).unwrap_err(),
            ArtifactDecodeError::Incompatible(_)
        ));
    }

    #[test]
    fn test_zero_scale_is_incompatible() {
        let mut doc = document();
        doc["features"][0]["scale"] = json!(0.0);
        assert!(matches!(
            decode(doc).unwrap_err(),
            ArtifactDecodeError::Incompatible(_)
        ));
    }

    #[test]
    fn test_predict_proba_logistic_math() {
        let artifact = decode(document()).unwrap();
        let probs = artifact
            .predict_proba(&matrix(vec![
                vec![FeatureValue::Number(10.0), FeatureValue::Text("Other".into())],
                vec![FeatureValue::Number(5.0), FeatureValue::Text("Month-to-month".into())],
                vec![FeatureValue::Missing, FeatureValue::Text("Two year".into())],
            ]))
            .unwrap();

        assert!((probs[0] - 0.5).abs() < 1e-12);
        // z = -1 * (5 - 10) / 5 + 1.5 = 2.5
        assert!((probs[1] - sigmoid(2.5)).abs() < 1e-12);
        // missing numeric contributes nothing; z = -2
        assert!((probs[2] - sigmoid(-2.0)).abs() < 1e-12);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_text_numeric_values_are_parsed() {
        let artifact = decode(document()).unwrap();
        let probs = artifact
            .predict_proba(&matrix(vec![vec![
                FeatureValue::Text(" 10 ".into()),
                FeatureValue::Missing,
            ]]))
            .unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_numeric_is_error() {
        let artifact = decode(document()).unwrap();
        let err = artifact
            .predict_proba(&matrix(vec![vec![
                FeatureValue::Text("ten".into()),
                FeatureValue::Missing,
            ]]))
            .unwrap_err();
        assert_eq!(
            err,
            ArtifactError::InvalidFeatureValue {
                column: "tenure".into(),
                row: 0,
                value: "ten".into()
            }
        );
    }

    #[test]
    fn test_missing_column_is_error() {
        let artifact = decode(document()).unwrap();
        let m = FeatureMatrix::new(vec!["tenure".to_string()]);
        assert!(matches!(
            artifact.predict_proba(&m).unwrap_err(),
            ArtifactError::MissingFeature { ref column } if column == "Contract"
        ));
    }
}
