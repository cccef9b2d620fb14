//! Record <-> document conversion and metadata projection.

use crate::MapperError;
use couch_client::{Document, ViewRow, ID_FIELD, REV_FIELD};
use std::collections::{BTreeMap, BTreeSet};

/// Caller-facing field/value view of a document.
pub type Record = BTreeMap<String, String>;

/// Field names a caller asks for; `None` at call sites means "all fields".
pub type FieldSet = BTreeSet<String>;

/// Whether the `_id`/`_rev` pair is part of what a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataProjection {
    /// Reads return user fields only. `_id`/`_rev` appear only when a
    /// field subset names them explicitly.
    #[default]
    Strip,
    /// Reads always return `_id`/`_rev` alongside the selected fields.
    Include,
}

/// Converts records to documents and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMapper {
    projection: MetadataProjection,
}

impl RecordMapper {
    pub fn new(projection: MetadataProjection) -> Self {
        Self { projection }
    }

    pub fn projection(&self) -> MetadataProjection {
        self.projection
    }

    /// Build the document to insert under `key`. No revision is set; the
    /// store assigns one on creation.
    pub fn to_document(&self, key: &str, record: &Record) -> Document {
        Document {
            id: key.to_string(),
            revision: None,
            fields: user_fields(record),
        }
    }

    /// Select the fields of `document` a read returns.
    ///
    /// Requested fields the document does not have are left out.
    pub fn project(&self, document: &Document, fields: Option<&FieldSet>) -> Record {
        let mut record = match fields {
            None => document.fields.clone(),
            Some(fields) => fields
                .iter()
                .filter_map(|name| {
                    document
                        .get(name)
                        .map(|value| (name.clone(), value.to_string()))
                })
                .collect(),
        };

        if self.projection == MetadataProjection::Include {
            record.insert(ID_FIELD.to_string(), document.id.clone());
            if let Some(revision) = &document.revision {
                record.insert(REV_FIELD.to_string(), revision.clone());
            }
        }
        record
    }

    /// Overlay `partial` onto `document`, keeping its id and revision so the
    /// write-back passes the store's revision check.
    pub fn merge(&self, mut document: Document, partial: &Record) -> Document {
        document.fields.extend(user_fields(partial));
        document
    }

    /// Decode range query rows into records, in row order.
    ///
    /// Any row without a well-formed body fails the whole scan.
    pub fn scan_records(
        &self,
        rows: Vec<ViewRow>,
        fields: Option<&FieldSet>,
    ) -> Result<Vec<Record>, MapperError> {
        rows.into_iter()
            .map(|row| {
                let body = row.body.ok_or_else(|| MapperError::Malformed {
                    id: row.id.clone(),
                    reason: "row carries no document body".to_string(),
                })?;
                let document =
                    Document::from_json_str(&body).map_err(|e| MapperError::Malformed {
                        id: row.id.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(self.project(&document, fields))
            })
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::warn!("Scan aborted: {e}"))
    }
}

/// Drop reserved metadata keys a caller may have put in a record.
fn user_fields(record: &Record) -> BTreeMap<String, String> {
    record
        .iter()
        .filter(|(name, _)| name.as_str() != ID_FIELD && name.as_str() != REV_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn fields(names: &[&str]) -> FieldSet {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn stored() -> Document {
        Document::new("akey")
            .with_revision("3-abc")
            .with_field("field0", "a")
            .with_field("field1", "b")
    }

    fn row(id: &str, body: Option<String>) -> ViewRow {
        ViewRow {
            id: id.to_string(),
            body,
        }
    }

    #[test]
    fn test_to_document_uses_key_as_id() {
        let mapper = RecordMapper::default();
        let doc = mapper.to_document("akey", &record(&[("mapKey", "mapValue")]));

        assert_eq!(doc.id, "akey");
        assert_eq!(doc.revision, None);
        assert_eq!(doc.fields, record(&[("mapKey", "mapValue")]));
    }

    #[test]
    fn test_to_document_ignores_reserved_keys() {
        let mapper = RecordMapper::default();
        let doc = mapper.to_document("akey", &record(&[("_id", "other"), ("_rev", "9-x"), ("f", "v")]));

        assert_eq!(doc.id, "akey");
        assert_eq!(doc.revision, None);
        assert_eq!(doc.fields, record(&[("f", "v")]));
    }

    #[test]
    fn test_strip_all_fields_hides_metadata() {
        let mapper = RecordMapper::new(MetadataProjection::Strip);
        assert_eq!(
            mapper.project(&stored(), None),
            record(&[("field0", "a"), ("field1", "b")])
        );
    }

    #[test]
    fn test_strip_subset_returns_exactly_requested() {
        let mapper = RecordMapper::new(MetadataProjection::Strip);
        assert_eq!(
            mapper.project(&stored(), Some(&fields(&["field1", "missing"]))),
            record(&[("field1", "b")])
        );
    }

    #[test]
    fn test_strip_subset_returns_metadata_when_named() {
        let mapper = RecordMapper::new(MetadataProjection::Strip);
        assert_eq!(
            mapper.project(&stored(), Some(&fields(&["_id", "_rev"]))),
            record(&[("_id", "akey"), ("_rev", "3-abc")])
        );
    }

    #[test]
    fn test_include_all_fields_adds_metadata() {
        let mapper = RecordMapper::new(MetadataProjection::Include);
        assert_eq!(
            mapper.project(&stored(), None),
            record(&[
                ("_id", "akey"),
                ("_rev", "3-abc"),
                ("field0", "a"),
                ("field1", "b")
            ])
        );
    }

    #[test]
    fn test_include_subset_adds_metadata() {
        let mapper = RecordMapper::new(MetadataProjection::Include);
        assert_eq!(
            mapper.project(&stored(), Some(&fields(&["field0"]))),
            record(&[("_id", "akey"), ("_rev", "3-abc"), ("field0", "a")])
        );
    }

    #[test]
    fn test_merge_overlays_and_keeps_revision() {
        let mapper = RecordMapper::default();
        let merged = mapper.merge(
            stored(),
            &record(&[("field1", "B"), ("field2", "c"), ("_rev", "1-forged")]),
        );

        assert_eq!(merged.id, "akey");
        assert_eq!(merged.revision.as_deref(), Some("3-abc"));
        assert_eq!(
            merged.fields,
            record(&[("field0", "a"), ("field1", "B"), ("field2", "c")])
        );
    }

    #[test]
    fn test_merge_with_unchanged_value_is_identity_on_fields() {
        let mapper = RecordMapper::default();
        let merged = mapper.merge(stored(), &record(&[("field0", "a")]));
        assert_eq!(merged, stored());
    }

    #[test]
    fn test_scan_records_projects_each_row() {
        let mapper = RecordMapper::default();
        let rows = vec![
            row(
                "user1",
                Some(json!({"_id": "user1", "_rev": "1-a", "f": "x", "n": 7}).to_string()),
            ),
            row(
                "user2",
                Some(json!({"_id": "user2", "_rev": "1-b", "f": "y"}).to_string()),
            ),
        ];

        let records = mapper.scan_records(rows, None).unwrap();
        assert_eq!(
            records,
            vec![record(&[("f", "x"), ("n", "7")]), record(&[("f", "y")])]
        );
    }

    #[test]
    fn test_scan_records_with_field_subset() {
        let mapper = RecordMapper::default();
        let rows = vec![row(
            "user1",
            Some(json!({"_id": "user1", "_rev": "1-a", "f": "x", "g": "z"}).to_string()),
        )];

        let records = mapper.scan_records(rows, Some(&fields(&["g"]))).unwrap();
        assert_eq!(records, vec![record(&[("g", "z")])]);
    }

    #[test]
    fn test_scan_fails_on_malformed_body() {
        let mapper = RecordMapper::default();
        let rows = vec![
            row("user1", Some(json!({"_id": "user1", "f": "x"}).to_string())),
            row("user2", Some("{broken".to_string())),
            row("user3", Some(json!({"_id": "user3"}).to_string())),
        ];

        let err = mapper.scan_records(rows, None).unwrap_err();
        assert!(matches!(err, MapperError::Malformed { ref id, .. } if id == "user2"));
    }

    #[test]
    fn test_scan_fails_on_missing_or_non_object_body() {
        let mapper = RecordMapper::default();

        let err = mapper
            .scan_records(vec![row("user1", None)], None)
            .unwrap_err();
        assert!(matches!(err, MapperError::Malformed { .. }));

        let err = mapper
            .scan_records(vec![row("user1", Some("[1,2]".to_string()))], None)
            .unwrap_err();
        assert!(matches!(err, MapperError::Malformed { .. }));
    }
}
