// Importing an exported spreadsheet: every worksheet becomes one table.

use crate::admin::*;

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::{debug, info, warn};
use roster_sync::{Cell, Table};
use serde_json::json;

use crate::admin::dates::from_serial;

fn data_cell(v: &DataType) -> Cell {
    match v {
        DataType::String(s) => Cell::text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::text(b.to_string()),
        DataType::DateTime(serial) => match from_serial(*serial) {
            Some(d) => Cell::Date(d),
            None => Cell::Number(*serial),
        },
        DataType::Empty => Cell::Empty,
        x => {
            warn!("data_cell: dropping unsupported value {:?}", x);
            Cell::Empty
        }
    }
}

/// Converts one worksheet. The first row is the header.
pub fn range_to_table(name: &str, wrange: &Range<DataType>) -> Option<Table> {
    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()?
        .iter()
        .map(|c| data_cell(c).to_text().trim().to_string())
        .collect();
    let body: Vec<Vec<Cell>> = rows
        .map(|r| r.iter().map(data_cell).collect::<Vec<Cell>>())
        .filter(|r| r.iter().any(|c| !c.is_blank()))
        .collect();
    debug!("range_to_table: {}: {} columns, {} rows", name, header.len(), body.len());
    Some(Table::with_rows(name, header, body))
}

/// Imports every worksheet of the file. Existing tables are kept unless
/// `overwrite` is set.
pub fn import_workbook(ctx: &mut Context, path: &str, overwrite: bool) -> AdminResult<JSValue> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningXlsxSnafu { path })?;
    let mut imported: Vec<String> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();
    let worksheets = workbook.worksheets();
    if worksheets.is_empty() {
        whatever!("{} contains no worksheet", path);
    }
    for (name, wrange) in worksheets {
        if ctx.store.exists(&name) && !overwrite {
            warn!("import_workbook: table {:?} exists, skipping", name);
            skipped.push(name);
            continue;
        }
        match range_to_table(&name, &wrange) {
            Some(t) => {
                ctx.store.save(&t)?;
                imported.push(name);
            }
            None => {
                warn!("import_workbook: worksheet {:?} is empty", name);
                skipped.push(name);
            }
        }
    }
    info!("import_workbook: imported {:?}, skipped {:?}", imported, skipped);
    Ok(json!({"imported": imported, "skipped": skipped}))
}
