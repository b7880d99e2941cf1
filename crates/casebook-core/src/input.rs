//! JSON Lines input loader.
//!
//! One JSON object per line, keyed by field label (`"CB_NO"`, `"ARREST
//! DATE"`, …). Labels are normalized against the schema, so `"cb no"` and
//! `"CB_NO"` name the same field. Blank lines are ignored. A line that is
//! not an object, or has no identifier, becomes an [`InputError`] in place
//! of its record so the pipeline can skip and report it. `Malformed` carries
//! the file line; `MissingIdentifier` carries the record's position among the
//! yielded items, which is how the pipeline numbers its own input errors.

use std::io::BufRead;
use std::path::Path;

use serde_json::Value;

use crate::error::InputError;
use crate::schema::Schema;
use crate::types::CaseRecord;

pub fn read_jsonl(
    reader: impl BufRead,
    schema: &Schema,
) -> std::io::Result<Vec<Result<CaseRecord, InputError>>> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let number = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let position = out.len() + 1;
        out.push(parse_line(&line, number, position, schema));
    }
    Ok(out)
}

pub fn load_jsonl(
    path: impl AsRef<Path>,
    schema: &Schema,
) -> std::io::Result<Vec<Result<CaseRecord, InputError>>> {
    let file = std::fs::File::open(path)?;
    read_jsonl(std::io::BufReader::new(file), schema)
}

fn parse_line(
    line: &str,
    number: usize,
    position: usize,
    schema: &Schema,
) -> Result<CaseRecord, InputError> {
    let value: Value = serde_json::from_str(line).map_err(|e| InputError::Malformed {
        line: number,
        reason: e.to_string(),
    })?;
    let Value::Object(map) = value else {
        return Err(InputError::Malformed {
            line: number,
            reason: "expected a JSON object".to_string(),
        });
    };

    let (record, unknown) =
        CaseRecord::from_raw(schema, map.iter().map(|(k, v)| (k.as_str(), Some(v))));
    if !unknown.is_empty() {
        tracing::debug!(line = number, ?unknown, "ignoring labels outside the schema");
    }
    if record.cb_no().is_empty() {
        tracing::debug!(line = number, position, "record has no identifier");
        return Err(InputError::MissingIdentifier { position });
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use pretty_assertions::assert_eq;

    fn read(text: &str) -> Vec<Result<CaseRecord, InputError>> {
        read_jsonl(text.as_bytes(), &Schema::new().unwrap()).unwrap()
    }

    #[test]
    fn reads_records_by_label() {
        let rows = read(
            r#"{"CB_NO":"JH100001","ARREST DATE":"01/15/2024 10:30:00 PM","CHARGE 1 STATUTE":"720 ILCS 5.0/12-3.2-A-1","AGE":null}"#,
        );
        let rec = rows[0].as_ref().unwrap();
        assert_eq!(rec.cb_no(), "JH100001");
        assert_eq!(rec.get(Field::ArrestDate), "01/15/2024 10:30:00 PM");
        assert_eq!(rec.get(Field::Charge1Statute), "720 ILCS 5.0/12-3.2-A-1");
        assert_eq!(rec.get(Field::Age), "");
    }

    #[test]
    fn padded_identifier_is_trimmed() {
        let rows = read("{\"CB_NO\":\"  JH1 \"}\n{\"CB_NO\":\"   \"}\n");
        assert_eq!(rows[0].as_ref().unwrap().cb_no(), "JH1");
        assert_eq!(rows[1], Err(InputError::MissingIdentifier { position: 2 }));
    }

    #[test]
    fn numeric_identifiers_are_text() {
        let rows = read(r#"{"CB_NO":30012345}"#);
        assert_eq!(rows[0].as_ref().unwrap().cb_no(), "30012345");
    }

    #[test]
    fn bad_lines_become_errors_in_place() {
        let rows = read("{\"CB_NO\":\"A\"}\n\nnot json\n[1,2]\n{\"NAME\":\"x\"}\n{\"CB_NO\":\"B\"}\n");
        assert_eq!(rows.len(), 5);
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(InputError::Malformed { line: 3, .. })));
        assert!(matches!(rows[2], Err(InputError::Malformed { line: 4, .. })));
        assert_eq!(rows[3], Err(InputError::MissingIdentifier { position: 4 }));
        assert_eq!(rows[4].as_ref().unwrap().cb_no(), "B");
    }
}
