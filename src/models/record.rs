use crate::constants::columns;
use std::sync::Arc;
use thiserror::Error;

/// Structural problems with a batch's header or row shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataModelError {
    #[error("Required column '{column}' missing from header [{available}]")]
    MissingColumn { column: String, available: String },

    #[error("Column '{column}' appears more than once in header")]
    DuplicateColumn { column: String },

    #[error("Record {row} has {actual} values, header declares {expected} columns")]
    RaggedRecord {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Column layout shared by every record of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSchema {
    columns: Vec<String>,
    customer_id: usize,
    tenure: usize,
    total_charges: usize,
}

impl BatchSchema {
    /// Build a schema from a header row, locating the required key columns
    pub fn from_header<I, S>(header: I) -> Result<Self, DataModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = header.into_iter().map(Into::into).collect();

        for (i, column) in columns.iter().enumerate() {
            if columns[..i].contains(column) {
                return Err(DataModelError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }

        let locate = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| DataModelError::MissingColumn {
                    column: name.to_string(),
                    available: columns.join(", "),
                })
        };

        let customer_id = locate(columns::CUSTOMER_ID)?;
        let tenure = locate(columns::TENURE)?;
        let total_charges = locate(columns::TOTAL_CHARGES)?;

        Ok(Self {
            columns,
            customer_id,
            tenure,
            total_charges,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    pub fn customer_id_index(&self) -> usize {
        self.customer_id
    }

    pub fn tenure_index(&self) -> usize {
        self.tenure
    }

    pub fn total_charges_index(&self) -> usize {
        self.total_charges
    }
}

/// One raw input row; `None` marks an empty cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    values: Vec<Option<String>>,
}

impl InputRecord {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered, finite run of records sharing one schema.
///
/// The unit of streaming between storage and the scorer. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    schema: Arc<BatchSchema>,
    records: Vec<InputRecord>,
}

impl RowBatch {
    pub fn new(
        schema: Arc<BatchSchema>,
        records: Vec<InputRecord>,
    ) -> Result<Self, DataModelError> {
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != schema.len())
        {
            return Err(DataModelError::RaggedRecord {
                row,
                expected: schema.len(),
                actual: record.len(),
            });
        }

        Ok(Self { schema, records })
    }

    /// Convenience constructor from string cells, used by tests and tools
    pub fn from_cells(
        header: &[&str],
        rows: Vec<Vec<Option<&str>>>,
    ) -> Result<Self, DataModelError> {
        let schema = Arc::new(BatchSchema::from_header(header.iter().copied())?);
        let records = rows
            .into_iter()
            .map(|row| InputRecord::new(row.into_iter().map(|v| v.map(String::from)).collect()))
            .collect();
        Self::new(schema, records)
    }

    pub fn schema(&self) -> &BatchSchema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<BatchSchema> {
        Arc::clone(&self.schema)
    }

    pub fn records(&self) -> &[InputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn customer_id(&self, row: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|r| r.value(self.schema.customer_id_index()))
    }

    pub fn tenure_raw(&self, row: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|r| r.value(self.schema.tenure_index()))
    }

    pub fn total_charges_raw(&self, row: usize) -> Option<&str> {
        self.records
            .get(row)
            .and_then(|r| r.value(self.schema.total_charges_index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_locates_key_columns() {
        let schema =
            BatchSchema::from_header(["gender", "customerID", "TotalCharges", "tenure"]).unwrap();
        assert_eq!(schema.customer_id_index(), 1);
        assert_eq!(schema.tenure_index(), 3);
        assert_eq!(schema.total_charges_index(), 2);
        assert!(schema.contains("gender"));
    }

    #[test]
    fn test_schema_rejects_missing_key_column() {
        let err = BatchSchema::from_header(["customerID", "tenure"]).unwrap_err();
        assert!(matches!(
            err,
            DataModelError::MissingColumn { ref column, .. } if column == "TotalCharges"
        ));
    }

    #[test]
    fn test_schema_rejects_duplicate_column() {
        let err =
            BatchSchema::from_header(["customerID", "tenure", "tenure", "TotalCharges"])
                .unwrap_err();
        assert_eq!(
            err,
            DataModelError::DuplicateColumn {
                column: "tenure".to_string()
            }
        );
    }

    #[test]
    fn test_batch_rejects_ragged_records() {
        let err = RowBatch::from_cells(
            &["customerID", "tenure", "TotalCharges"],
            vec![vec![Some("A"), Some("1"), Some("2")], vec![Some("B"), Some("1")]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DataModelError::RaggedRecord {
                row: 1,
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_batch_accessors() {
        let batch = RowBatch::from_cells(
            &["customerID", "tenure", "TotalCharges"],
            vec![vec![Some("A"), Some("5"), None]],
        )
        .unwrap();
        assert_eq!(batch.customer_id(0), Some("A"));
        assert_eq!(batch.tenure_raw(0), Some("5"));
        assert_eq!(batch.total_charges_raw(0), None);
        assert_eq!(batch.customer_id(1), None);
    }
}
