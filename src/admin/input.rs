// Command-line JSON payloads and the conversion of cells back to JSON.

use crate::admin::*;

use chrono::FixedOffset;
use roster_sync::text::normalize_key;
use roster_sync::{Cell, Record, Table};
use serde::de::DeserializeOwned;
use serde_json::Map as JSMap;

use std::fs;

use crate::admin::dates;

/// Reads a JSON argument. An argument starting with `@` names a file.
pub fn read_json_arg(arg: &str) -> AdminResult<JSValue> {
    let contents = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).context(OpeningJsonSnafu { path })?,
        None => arg.to_string(),
    };
    serde_json::from_str(&contents).context(ParsingJsonSnafu {})
}

pub fn typed_arg<T: DeserializeOwned>(arg: &str) -> AdminResult<T> {
    let js = read_json_arg(arg)?;
    serde_json::from_value(js).context(ParsingJsonSnafu {})
}

/// Reads a record argument. Dates are read in the offset `tz`.
pub fn record_arg(arg: &str, tz: &FixedOffset) -> AdminResult<Record> {
    record_from_json(&read_json_arg(arg)?, tz)
}

/// Converts a JSON object into a partial record keyed by normalized column
/// name. Text sent for a column whose name contains "data" is stored as a date
/// when it reads as one, in local time of `tz`.
pub fn record_from_json(js: &JSValue, tz: &FixedOffset) -> AdminResult<Record> {
    let obj = match js.as_object() {
        Some(o) => o,
        None => {
            return InvalidInputSnafu {
                message: "expected a JSON object",
            }
            .fail()
        }
    };
    let mut rec = Record::new();
    for (k, v) in obj.iter() {
        let key = normalize_key(k);
        let cell = match v {
            JSValue::Null => Cell::Empty,
            JSValue::Bool(b) => Cell::text(b.to_string()),
            JSValue::Number(n) => match n.as_f64() {
                Some(f) => Cell::Number(f),
                None => Cell::text(n.to_string()),
            },
            JSValue::String(s) if key.contains("data") => match dates::parse_text(s, tz) {
                Some(d) => Cell::Date(d),
                None => Cell::text(s.clone()),
            },
            JSValue::String(s) => Cell::text(s.clone()),
            JSValue::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|i| match i {
                        JSValue::String(s) => s.clone(),
                        x => x.to_string(),
                    })
                    .collect();
                Cell::text(parts.join(";"))
            }
            JSValue::Object(_) => {
                return InvalidInputSnafu {
                    message: format!("field '{}' cannot hold an object", k),
                }
                .fail()
            }
        };
        rec.insert(key, cell);
    }
    Ok(rec)
}

pub fn cell_json(cell: &Cell) -> JSValue {
    match cell {
        Cell::Empty => JSValue::String(String::new()),
        Cell::Number(n) => serde_json::Number::from_f64(*n)
            .map(JSValue::Number)
            .unwrap_or_else(|| JSValue::String(cell.to_text())),
        x => JSValue::String(x.to_text()),
    }
}

/// One row as a JSON object keyed by the header text as written in the sheet.
pub fn row_json(table: &Table, row: usize) -> JSValue {
    let mut obj: JSMap<String, JSValue> = JSMap::new();
    for (idx, h) in table.header().iter().enumerate() {
        if h.trim().is_empty() || obj.contains_key(h) {
            continue;
        }
        obj.insert(h.clone(), cell_json(table.get(row, idx)));
    }
    JSValue::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn record_keys_and_values() {
        let rec = record_from_json(&json!({
            " Nome ": "Ana Paiva",
            "Gênero": null,
            "Ordem": 3,
            "Data": "2025-03-10",
            "Membros": ["Ana Paiva", "João Costa"],
            "Ativo": true
        }), &brt())
        .unwrap();
        assert_eq!(rec.get("nome"), Some(&Cell::from("Ana Paiva")));
        assert_eq!(rec.get("gênero"), Some(&Cell::Empty));
        assert_eq!(rec.get("ordem"), Some(&Cell::Number(3.0)));
        let d = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(rec.get("data"), Some(&Cell::Date(d)));
        assert_eq!(rec.get("membros"), Some(&Cell::from("Ana Paiva;João Costa")));
        assert_eq!(rec.get("ativo"), Some(&Cell::from("true")));
    }

    #[test]
    fn instants_are_stored_in_local_time() {
        let rec = record_from_json(&json!({"DataHora": "2025-03-10T01:00:00Z"}), &brt()).unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        assert_eq!(rec.get("datahora"), Some(&Cell::Date(d)));
    }

    #[test]
    fn date_columns_keep_unparsable_text() {
        let rec = record_from_json(&json!({"Data de entrada": "em breve"}), &brt()).unwrap();
        assert_eq!(rec.get("data de entrada"), Some(&Cell::from("em breve")));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            record_from_json(&json!([1, 2]), &brt()),
            Err(AdminError::InvalidInput { .. })
        ));
        assert!(matches!(
            record_from_json(&json!({"nome": {"a": 1}}), &brt()),
            Err(AdminError::InvalidInput { .. })
        ));
        assert!(matches!(
            read_json_arg("{nope"),
            Err(AdminError::ParsingJson { .. })
        ));
    }

    #[test]
    fn rows_use_header_text() {
        let t = Table::with_rows(
            "tabMembros",
            vec!["Id".to_string(), "Nome".to_string(), "".to_string()],
            vec![vec!["1a".into(), "Ana".into(), "x".into()]],
        );
        assert_eq!(row_json(&t, 0), json!({"Id": "1a", "Nome": "Ana"}));
        assert_eq!(cell_json(&Cell::Number(2.0)), json!(2.0));
    }
}
