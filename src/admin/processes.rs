// Processes of the committee and the date of their latest recorded event.

use crate::admin::*;

use chrono::NaiveDateTime;
use log::debug;
use roster_sync::{Record, Table};
use serde_json::json;

use std::collections::HashMap;

use crate::admin::dates::{cell_datetime, display_date};

pub const PROCESS_ID_PREFIX: &str = "PRC-";

/// Column name and the text shown when the cell is blank.
const DISPLAY_DEFAULTS: &[(&str, &str)] = &[
    ("processo", "S/N"),
    ("requerente", "Não informado"),
    ("requerido", "N/C"),
    ("procurador", "Pendente"),
    ("relator", "Não designado"),
    ("ementa", ""),
];

/// Latest event date of each process found in the history table.
fn latest_events(history: &Table, ctx: &Context) -> AdminResult<HashMap<String, NaiveDateTime>> {
    let tz = ctx.config.utc_offset()?;
    let id_col = history.require("idprocesso")?;
    let date_col = history.require("datahora")?;
    let mut latest: HashMap<String, NaiveDateTime> = HashMap::new();
    for r in 0..history.len() {
        let id = history.get(r, id_col).key_text();
        let date = match cell_datetime(history.get(r, date_col), &tz) {
            Some(d) if !id.is_empty() => d,
            _ => continue,
        };
        let e = latest.entry(id).or_insert(date);
        if date > *e {
            *e = date;
        }
    }
    Ok(latest)
}

pub fn list(ctx: &Context) -> AdminResult<JSValue> {
    let t = ctx.store.load(&ctx.tables().processes)?;
    let id_col = t.require("id")?;
    let latest = match ctx.store.load_optional(&ctx.tables().history)? {
        Some(h) => latest_events(&h, ctx)?,
        None => {
            debug!("list: no history table");
            HashMap::new()
        }
    };
    let cols: Vec<(&str, &str, Option<usize>)> = DISPLAY_DEFAULTS
        .iter()
        .map(|(name, default)| (*name, *default, t.columns().position(name).map(|p| p - 1)))
        .collect();

    let dados: Vec<JSValue> = (0..t.len())
        .map(|r| {
            let id = t.get(r, id_col).key_text();
            let mut obj = serde_json::Map::new();
            obj.insert("id".to_string(), json!(id));
            for (name, default, col) in cols.iter() {
                let v = col
                    .map(|c| t.get(r, c).key_text())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| default.to_string());
                obj.insert(name.to_string(), json!(v));
            }
            let ultima = latest
                .get(&id)
                .map(display_date)
                .unwrap_or_else(|| "Sem histórico".to_string());
            obj.insert("ultimaData".to_string(), json!(ultima));
            JSValue::Object(obj)
        })
        .collect();
    Ok(json!(dados))
}

pub fn save(ctx: &mut Context, patch: &Record) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().processes)?;
    let millis = ctx.clock.millis();
    let res = t.upsert(patch, "id", || format!("{}{}", PROCESS_ID_PREFIX, millis))?;
    ctx.store.save(&t)?;
    Ok(json!({"id": res.id, "created": res.created}))
}

pub fn delete(ctx: &mut Context, id: &str) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().processes)?;
    t.delete_by_id("id", id)?;
    ctx.store.save(&t)?;
    Ok(json!({"id": id.trim()}))
}
