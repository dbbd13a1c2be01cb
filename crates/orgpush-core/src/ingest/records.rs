//! Ingest records and their CSV encoding

use crate::error::Result;
use serde_json::{Map, Value};
use tracing::warn;

/// One row to insert: field name → value, in field order.
///
/// Empty and whitespace-only values are dropped on construction, so a record
/// can end up with no fields at all; such records are skipped by the upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestRecord {
    fields: Vec<(String, String)>,
}

impl IngestRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field; blank values remove it instead
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        self.fields.retain(|(existing, _)| *existing != name);
        if !value.trim().is_empty() {
            self.fields.push((name, value));
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build from a JSON object. Strings are taken as-is, `null` is dropped,
    /// other scalars use their JSON text.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        object
            .iter()
            .fold(Self::new(), |record, (name, value)| match value {
                Value::Null => record,
                Value::String(s) => record.with(name.as_str(), s.as_str()),
                other => record.with(name.as_str(), other.to_string()),
            })
    }
}

impl<K, V> FromIterator<(K, V)> for IngestRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |record, (name, value)| record.with(name, value))
    }
}

/// Records that survive cleaning, in input order
pub fn non_empty(records: &[IngestRecord]) -> Vec<&IngestRecord> {
    records.iter().filter(|r| !r.is_empty()).collect()
}

/// Keep the records that have a value under at least one header column.
///
/// The header is the field list of the first record, so a later record whose
/// fields all fall outside it would upload as a blank row.
pub fn with_header_values<'r>(records: &[&'r IngestRecord]) -> Vec<&'r IngestRecord> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let header: Vec<&str> = first.field_names().collect();

    let kept: Vec<&IngestRecord> = records
        .iter()
        .copied()
        .filter(|record| header.iter().any(|name| record.get(name).is_some()))
        .collect();

    let dropped = records.len() - kept.len();
    if dropped > 0 {
        warn!(
            dropped,
            "Records with no value under the CSV header were skipped"
        );
    }
    kept
}

/// Encode records as CSV with LF line endings.
///
/// The header is the field list of the first record. Later records fill those
/// columns by name; a missing field becomes an empty cell and fields outside
/// the header are not sent.
pub fn to_csv(records: &[&IngestRecord]) -> Result<String> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.field_names().collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&header)?;

    let mut dropped_fields = 0usize;
    for record in records {
        dropped_fields += record
            .field_names()
            .filter(|name| !header.contains(name))
            .count();
        writer.write_record(header.iter().map(|name| record.get(name).unwrap_or("")))?;
    }

    if dropped_fields > 0 {
        warn!(
            dropped_fields,
            "Fields not present in the first record were left out of the upload"
        );
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(normalize_line_endings(&text))
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_json(value: Value) -> Vec<IngestRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| IngestRecord::from_json(v.as_object().unwrap()))
            .collect()
    }

    #[test]
    fn test_blank_values_are_dropped() {
        let record = IngestRecord::new()
            .with("Name", "Acme")
            .with("Phone", "   ")
            .with("Website", "");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("Name"), Some("Acme"));
        assert_eq!(record.get("Phone"), None);
    }

    #[test]
    fn test_empty_record_is_skipped() {
        let records = from_json(json!([{"Name": "Acme"}, {"Name": ""}]));
        let kept = non_empty(&records);
        assert_eq!(kept.len(), 1);

        let csv = to_csv(&kept).unwrap();
        assert_eq!(csv, "Name\nAcme\n");
    }

    #[test]
    fn test_header_comes_from_first_record() {
        let records = vec![
            IngestRecord::new().with("Name", "Acme").with("Industry", "Retail"),
            IngestRecord::new().with("Name", "Globex").with("Rating", "Hot"),
        ];
        let csv = to_csv(&non_empty(&records)).unwrap();
        assert_eq!(csv, "Name,Industry\nAcme,Retail\nGlobex,\n");
    }

    #[test]
    fn test_values_are_quoted_and_newlines_normalized() {
        let records = vec![IngestRecord::new()
            .with("Name", "Acme, Inc.")
            .with("Description", "line one\r\nline two")];
        let csv = to_csv(&non_empty(&records)).unwrap();

        assert!(!csv.contains('\r'));
        assert_eq!(
            csv,
            "Name,Description\n\"Acme, Inc.\",\"line one\nline two\"\n"
        );
    }

    #[test]
    fn test_json_scalars() {
        let records = from_json(json!([{"Name": "Acme", "Employees": 42, "Active": true, "Parent": null}]));
        let record = &records[0];
        assert_eq!(record.get("Employees"), Some("42"));
        assert_eq!(record.get("Active"), Some("true"));
        assert_eq!(record.get("Parent"), None);
    }

    #[test]
    fn test_from_iterator_and_replace() {
        let mut record: IngestRecord = vec![("Name", "Acme"), ("City", "Paris")].into_iter().collect();
        record.insert("City", "Lyon");
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["Name", "City"]);
        assert_eq!(record.get("City"), Some("Lyon"));

        record.insert("City", " ");
        assert_eq!(record.get("City"), None);
    }

    #[test]
    fn test_record_without_header_values_is_skipped() {
        let records = from_json(json!([{"Name": "Acme"}, {"Phone": "555-0100"}, {"Phone": "1", "Name": "Globex"}]));
        let kept = with_header_values(&non_empty(&records));

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].get("Name"), Some("Globex"));
        assert_eq!(to_csv(&kept).unwrap(), "Name\nAcme\nGlobex\n");

        assert!(with_header_values(&[]).is_empty());
    }

    #[test]
    fn test_no_records_yields_empty_body() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }
}
