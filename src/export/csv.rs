use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::query::{Record, RecordStream};
use crate::utils::diagnostics::SharedDiagnostics;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// log every N records; 0 disables progress logging
    pub progress_every: u64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',', progress_every: 0 }
    }
}

/// Drain `stream` into a delimited file and return the number of records
/// written.
///
/// Records are buffered so the header can be the sorted union of every field
/// name; rows follow that order and leave missing fields empty.
pub async fn to_csv(
    mut stream: RecordStream<'_>,
    path: impl AsRef<Path>,
    options: &CsvOptions,
    diagnostics: &SharedDiagnostics,
) -> Result<u64> {
    let dataset = stream.dataset().to_string();
    let mut records = Vec::new();
    while let Some(record) = stream.next().await? {
        records.push(record);
        let n = records.len() as u64;
        if options.progress_every > 0 && n % options.progress_every == 0 {
            diagnostics.info(&format!("Fetched {} {} records", n, dataset));
        }
    }

    let file = std::fs::File::create(path.as_ref())?;
    let mut writer = std::io::BufWriter::new(file);
    let written = write_records(&mut writer, &records, options.delimiter)?;
    writer.flush()?;
    diagnostics.info(&format!(
        "Wrote {} {} records to {}",
        written,
        dataset,
        path.as_ref().display()
    ));
    Ok(written)
}

/// Write header + rows for `records` to any writer. Nothing is written for
/// an empty slice, since there are no columns to name.
pub fn write_records<W: Write>(writer: &mut W, records: &[Record], delimiter: u8) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }
    let columns: BTreeSet<&str> = records.iter().flat_map(|r| r.keys().map(String::as_str)).collect();
    let delim = char::from(delimiter);

    let header: Vec<String> = columns.iter().map(|c| escape_field(c, delim)).collect();
    writeln!(writer, "{}", header.join(&delim.to_string()))?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| escape_field(&render_value(record.get(*c)), delim))
            .collect();
        writeln!(writer, "{}", row.join(&delim.to_string()))?;
    }
    Ok(records.len() as u64)
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn escape_field(field: &str, delim: char) -> String {
    if field.contains(delim) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn header_is_sorted_union_of_fields() {
        let records = vec![
            record(json!({"b": 1, "a": "x"})),
            record(json!({"c": true, "a": null})),
        ];
        let mut out = Vec::new();
        let n = write_records(&mut out, &records, b',').unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "a,b,c\nx,1,\n,,true\n");
    }

    #[test]
    fn quotes_fields_that_need_it() {
        let records = vec![record(json!({"name": "Smith, \"Big\" Rig", "note": "two\nlines", "n": 1.5}))];
        let mut out = Vec::new();
        write_records(&mut out, &records, b',').unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "n,name,note\n1.5,\"Smith, \"\"Big\"\" Rig\",\"two\nlines\"\n"
        );
    }

    #[test]
    fn no_records_writes_nothing() {
        let mut out = Vec::new();
        assert_eq!(write_records(&mut out, &[], b',').unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn custom_delimiter() {
        let records = vec![record(json!({"a": "1,2", "b": "x|y"}))];
        let mut out = Vec::new();
        write_records(&mut out, &records, b'|').unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a|b\n1,2|\"x|y\"\n");
    }
}
