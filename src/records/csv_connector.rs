//! CSV Connector - parses raw CSV payloads into typed source records.

use crate::error::Result;
use crate::records::record::{FieldValue, RecordSet, SourceRecord};
use csv::ReaderBuilder;
use std::collections::BTreeMap;

/// Parse CSV text into a record set for one source system.
///
/// The header row drives column names; cells are coerced per
/// [`FieldValue::coerce`]. Short rows are padded with nulls.
pub fn parse_csv(system_id: &str, csv_text: &str) -> Result<RecordSet> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let mut fields = BTreeMap::new();

        for (idx, header) in headers.iter().enumerate() {
            let cell = row.get(idx).unwrap_or("");
            fields.insert(header.clone(), FieldValue::coerce(cell));
        }

        records.push(SourceRecord::new(fields));
    }

    Ok(RecordSet::new(system_id.to_string(), records))
}
