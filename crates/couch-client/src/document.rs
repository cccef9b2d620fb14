//! Document model shared by the store, the connector and the record mapper.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved key carrying the document id on the wire.
pub const ID_FIELD: &str = "_id";
/// Reserved key carrying the revision token on the wire.
pub const REV_FIELD: &str = "_rev";

/// Errors from decoding a JSON document body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Document body is not a JSON object")]
    NotAnObject,

    #[error("Document has no string '_id' field")]
    MissingId,

    #[error("Document '_rev' field is not a string")]
    InvalidRevision,
}

/// A stored document: user fields plus the `_id`/`_rev` metadata pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    /// Optimistic concurrency token; `None` until the store assigns one.
    pub revision: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field by name, including the reserved `_id` and `_rev` keys.
    pub fn get(&self, name: &str) -> Option<&str> {
        match name {
            ID_FIELD => Some(self.id.as_str()),
            REV_FIELD => self.revision.as_deref(),
            _ => self.fields.get(name).map(String::as_str),
        }
    }

    /// Encode as the JSON object sent to the store.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.fields {
            object.insert(name.clone(), Value::String(value.clone()));
        }
        object.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        if let Some(revision) = &self.revision {
            object.insert(REV_FIELD.to_string(), Value::String(revision.clone()));
        }
        Value::Object(object)
    }

    /// Decode a JSON object received from the store.
    ///
    /// Non-string values are kept as their JSON text.
    pub fn from_json(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(object) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let mut document = Document::default();
        let mut id = None;
        for (name, value) in object {
            match name.as_str() {
                ID_FIELD => match value {
                    Value::String(s) => id = Some(s),
                    _ => return Err(DocumentError::MissingId),
                },
                REV_FIELD => match value {
                    Value::String(s) => document.revision = Some(s),
                    _ => return Err(DocumentError::InvalidRevision),
                },
                _ => {
                    document.fields.insert(name, value_to_text(value));
                }
            }
        }
        document.id = id.ok_or(DocumentError::MissingId)?;
        Ok(document)
    }

    /// Decode a textual JSON document body.
    pub fn from_json_str(body: &str) -> Result<Self, DocumentError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
        Self::from_json(value)
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Key-ordered range query over all documents of a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Inclusive lower bound on the document id.
    pub start_key: String,
    /// Maximum number of rows to return.
    pub limit: usize,
    /// Whether rows should carry the full document body.
    pub include_docs: bool,
}

impl RangeQuery {
    pub fn from_key(start_key: impl Into<String>) -> Self {
        Self {
            start_key: start_key.into(),
            limit: usize::MAX,
            include_docs: false,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn include_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = include_docs;
        self
    }
}

/// One row of a range query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRow {
    pub id: String,
    /// Textual JSON body; present only when the query asked for documents.
    pub body: Option<String>,
}
