use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use crate::cli::ImportArgs;
use crate::commands::resolve_config;
use crate::store::DocumentStore;

pub fn run(args: ImportArgs) -> Result<()> {
    let config = resolve_config(&args.store)?;
    let collection = args.collection.trim();
    if collection.is_empty() {
        bail!("collection must not be empty");
    }

    let documents = read_documents(&args.file)?;
    let mut store = DocumentStore::open(&config.store.db_path)
        .with_context(|| format!("failed to open {}", config.store.db_path.display()))?;
    let inserted = store
        .insert_documents(collection, &documents)
        .with_context(|| format!("failed to import into `{collection}`"))?;

    info!(
        path = %args.file.display(),
        collection,
        inserted,
        "import completed"
    );
    Ok(())
}

/// Accepts a JSON array of documents, a single document, or one document per
/// line.
fn read_documents(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_documents(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_documents(raw: &str) -> Result<Vec<Value>> {
    let documents = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(single) => vec![single],
        Err(_) => raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(index, line)| {
                serde_json::from_str::<Value>(line)
                    .with_context(|| format!("invalid JSON document on line {}", index + 1))
            })
            .collect::<Result<Vec<Value>>>()?,
    };

    if let Some(position) = documents.iter().position(|document| !document.is_object()) {
        bail!("document {} is not a JSON object", position + 1);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::parse_documents;

    #[test]
    fn accepts_array_object_and_json_lines() {
        assert_eq!(parse_documents(r#"[{"a": 1}, {"a": 2}]"#).unwrap().len(), 2);
        assert_eq!(parse_documents(r#"{"a": 1}"#).unwrap().len(), 1);
        assert_eq!(
            parse_documents("{\"a\": 1}\n\n{\"a\": 2}\n{\"a\": 3}\n").unwrap().len(),
            3
        );
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(parse_documents("[1, 2]").is_err());
        assert!(parse_documents("{\"a\": 1}\nnot json").is_err());
    }
}
