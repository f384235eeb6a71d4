//! Batch entry point: loads entities from a CSV column and reports boundary errors.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::pipeline::unique_entities;

pub const DEFAULT_COLUMN: &str = "entity";

/// Errors that abort a whole batch before any entity is processed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Query parameter is missing.")]
    MissingQuery,

    #[error("Could not read file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column '{0}' not found in the file.")]
    MissingColumn(String),

    #[error("No valid entities found in column '{0}'.")]
    NoEntities(String),
}

/// Printed instead of results when the batch cannot start.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub logs: Vec<String>,
}

impl From<&BatchError> for ErrorReport {
    fn from(e: &BatchError) -> Self {
        Self {
            error: e.to_string(),
            logs: vec![format!("Error: {e}")],
        }
    }
}

pub fn validate_query(query: &str) -> Result<&str, BatchError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(BatchError::MissingQuery);
    }
    Ok(trimmed)
}

pub fn load_entities_from_path(path: &Path, column: &str) -> Result<Vec<String>, BatchError> {
    let unreadable = |source: csv::Error| BatchError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|e| unreadable(e.into()))?;
    let entities = load_entities(file, column).map_err(|e| match e {
        BatchError::Unreadable { source, .. } => unreadable(source),
        other => other,
    })?;
    info!(path = %path.display(), %column, count = entities.len(), "entities loaded");
    Ok(entities)
}

/// Unique, non-blank values of `column`, in order of first appearance.
pub fn load_entities(reader: impl io::Read, column: &str) -> Result<Vec<String>, BatchError> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    read_column(reader, column).map_err(|e| match e {
        ColumnError::Csv(source) => BatchError::Unreadable {
            path: PathBuf::from("<input>"),
            source,
        },
        ColumnError::Batch(e) => e,
    })
}

enum ColumnError {
    Csv(csv::Error),
    Batch(BatchError),
}

fn read_column<R: io::Read>(
    mut reader: csv::Reader<R>,
    column: &str,
) -> Result<Vec<String>, ColumnError> {
    let index = reader
        .headers()
        .map_err(ColumnError::Csv)?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ColumnError::Batch(BatchError::MissingColumn(column.to_string())))?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(ColumnError::Csv)?;
        if let Some(value) = record.get(index) {
            values.push(value.to_string());
        }
    }

    let entities = unique_entities(values);
    if entities.is_empty() {
        return Err(ColumnError::Batch(BatchError::NoEntities(column.to_string())));
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_unique_entities_from_column() {
        let csv = "id,entity,city\n1,Acme,Mesa\n2,,Nowhere\n3,Globex,Cypress Creek\n4,Acme,Mesa\n";
        let entities = load_entities(csv.as_bytes(), "entity").unwrap();
        assert_eq!(entities, vec!["Acme", "Globex"]);
    }

    #[test]
    fn selects_requested_column() {
        let csv = "company,contact\nAcme,Wile\nGlobex,Hank\n";
        let entities = load_entities(csv.as_bytes(), "company").unwrap();
        assert_eq!(entities, vec!["Acme", "Globex"]);
    }

    #[test]
    fn short_rows_are_skipped() {
        let csv = "id,entity\n1,Acme\n2\n";
        let entities = load_entities(csv.as_bytes(), "entity").unwrap();
        assert_eq!(entities, vec!["Acme"]);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "id,name\n1,Acme\n";
        let err = load_entities(csv.as_bytes(), "entity").unwrap_err();
        assert_eq!(err.to_string(), "Column 'entity' not found in the file.");
    }

    #[test]
    fn empty_column_is_reported() {
        let csv = "entity\n\n  \n";
        let err = load_entities(csv.as_bytes(), "entity").unwrap_err();
        assert!(matches!(err, BatchError::NoEntities(ref c) if c == "entity"));
        assert_eq!(
            err.to_string(),
            "No valid entities found in column 'entity'."
        );
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = load_entities_from_path(Path::new("/nonexistent/entities.csv"), "entity")
            .unwrap_err();
        assert!(matches!(err, BatchError::Unreadable { .. }));
        assert!(err.to_string().contains("/nonexistent/entities.csv"));
    }

    #[test]
    fn loads_entities_from_file() {
        let path = std::env::temp_dir().join(format!("contact-scout-{}.csv", std::process::id()));
        std::fs::write(&path, "entity\nAcme\n Globex \nAcme\n").unwrap();

        let entities = load_entities_from_path(&path, "entity");
        let missing = load_entities_from_path(&path, "name");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(entities.unwrap(), vec!["Acme", "Globex"]);
        assert!(matches!(missing, Err(BatchError::MissingColumn(ref c)) if c == "name"));
    }

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(validate_query("  "), Err(BatchError::MissingQuery)));
        assert_eq!(validate_query(" contact email of ").unwrap(), "contact email of");
    }

    #[test]
    fn error_report_carries_message_and_log() {
        let report = ErrorReport::from(&BatchError::MissingColumn("name".into()));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Column 'name' not found in the file.",
                "logs": ["Error: Column 'name' not found in the file."]
            })
        );
    }
}
