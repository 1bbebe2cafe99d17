use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open document store {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("document store query failed")]
    Query(#[from] rusqlite::Error),
    #[error("stored document in collection `{collection}` is not valid JSON")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid field name `{0}`")]
    FieldName(String),
}

// `doc_id` holds the child's `_id` as text; json_extract of the parent key
// yields the same text for strings and compact JSON for `{"$oid": ...}`.
const JOIN_BY_ID_SQL: &str = "
    SELECT parent.body, child.body
    FROM documents AS parent
    JOIN documents AS child
      ON child.collection = ?2
     AND child.doc_id = json_extract(parent.body, ?3)
    WHERE parent.collection = ?1
    ORDER BY parent.seq, child.seq
";

/// JSON documents grouped into named collections inside one SQLite file.
pub struct DocumentStore {
    connection: Connection,
}

impl DocumentStore {
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { connection })
    }

    /// Opens the store for writing, creating the file and schema if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn insert_documents(
        &mut self,
        collection: &str,
        documents: &[Value],
    ) -> Result<usize, StoreError> {
        let tx = self.connection.transaction()?;
        {
            let mut statement = tx.prepare(
                "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)",
            )?;
            for document in documents {
                let doc_id = document.get("_id").map(document_id_text);
                statement.execute(params![collection, doc_id, document.to_string()])?;
            }
        }
        tx.commit()?;

        debug!(collection, inserted = documents.len(), "documents inserted");
        Ok(documents.len())
    }

    pub fn collection_counts(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let mut statement = self.connection.prepare(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection",
        )?;
        let rows = statement.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    /// Pairs every parent document with each child whose `_id` equals the
    /// parent's `local_field`. Parents with no match are dropped.
    pub fn joined_documents(
        &self,
        parent_collection: &str,
        child_collection: &str,
        local_field: &str,
    ) -> Result<Vec<(Value, Value)>, StoreError> {
        let local_path = json_path(local_field)?;

        let mut statement = self.connection.prepare(JOIN_BY_ID_SQL)?;
        let rows = statement.query_map(
            params![parent_collection, child_collection, local_path],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;

        let mut pairs = Vec::new();
        for row in rows {
            let (parent_raw, child_raw) = row?;
            let parent = decode_document(parent_collection, &parent_raw)?;
            let child = decode_document(child_collection, &child_raw)?;
            pairs.push((parent, child));
        }
        Ok(pairs)
    }

    /// Documents of `collection` whose string `field` equals `value`, in
    /// insertion order.
    pub fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let path = json_path(field)?;
        let mut statement = self.connection.prepare(
            "
            SELECT body
            FROM documents
            WHERE collection = ?1
              AND json_extract(body, ?2) = ?3
            ORDER BY seq
            ",
        )?;
        let rows = statement.query_map(params![collection, path, value], |row| {
            row.get::<_, String>(0)
        })?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(decode_document(collection, &row?)?);
        }
        Ok(documents)
    }
}

fn configure_connection(connection: &Connection) -> Result<(), StoreError> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<(), StoreError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          collection TEXT NOT NULL,
          doc_id TEXT,
          body TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_collection
          ON documents(collection);

        CREATE INDEX IF NOT EXISTS idx_documents_collection_doc_id
          ON documents(collection, doc_id);
        ",
    )?;
    Ok(())
}

fn decode_document(collection: &str, raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Decode {
        collection: collection.to_string(),
        source,
    })
}

fn json_path(field: &str) -> Result<String, StoreError> {
    if field.is_empty() || field.contains('"') {
        return Err(StoreError::FieldName(field.to_string()));
    }
    Ok(format!("$.\"{field}\""))
}

fn document_id_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
