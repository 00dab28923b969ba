// Sessions, the voting tickets put on their agenda and the votes cast on each ticket.

use crate::admin::*;

use chrono::NaiveDateTime;
use log::{debug, info};
use roster_sync::text::normalize_key;
use roster_sync::{Cell, Record, Table, TableError};
use serde::Deserialize;
use serde_json::json;

use std::collections::{BTreeSet, HashMap};

use crate::admin::dates::{cell_datetime, display_date, iso_date, session_date};

pub const ORGAO: &[&str] = &["órgão", "orgao"];
pub const LOCAL: &[&str] = &["local/sala", "local", "sala"];
pub const PRESIDENTE: &[&str] = &["presidente"];
pub const SECRETARIO: &[&str] = &["secretário", "secretario"];
pub const MEMBROS: &[&str] = &["membros"];
pub const PROCURADORES: &[&str] = &["procuradores"];
pub const EXPEDIENTE: &[&str] = &["expediente"];
pub const RELATOR: &[&str] = &["relator"];
pub const URL_VOTO: &[&str] = &["url voto", "urlvoto", "url_voto"];
pub const LOCAL_OCORRENCIA: &[&str] = &["local da ocorrência", "local"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionInput {
    pub id: Option<String>,
    /// `YYYY-MM-DD`
    pub datasessao: Option<String>,
    pub orgao: Option<String>,
    pub local: Option<String>,
    pub presidente: Option<String>,
    pub secretario: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TicketInput {
    pub id: String,
    pub relator: Option<String>,
    pub expediente: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VoteInput {
    pub id: Option<String>,
    pub idfichavotacao: Option<String>,
    pub idprocesso: Option<String>,
    pub tipovoto: Option<String>,
    pub relator: Option<String>,
    pub voto: Option<String>,
    pub resultado: Option<String>,
    pub urlvoto: Option<String>,
}

fn text_at(t: &Table, row: usize, col: Option<usize>) -> String {
    col.map(|c| t.get(row, c).to_text()).unwrap_or_default()
}

/// Stores `value` in the patch under the first column matching `candidates`.
/// Nothing is stored when the table has no such column.
fn put(patch: &mut Record, t: &Table, candidates: &[&str], value: &Option<String>) {
    if let (Some(v), Some(c)) = (value, t.columns().find_any(candidates)) {
        patch.insert(normalize_key(&t.header()[c]), Cell::text(v.clone()));
    }
}

fn require_any(t: &Table, candidates: &[&str]) -> Result<usize, TableError> {
    t.columns()
        .find_any(candidates)
        .ok_or_else(|| TableError::MissingColumn {
            table: t.name().to_string(),
            column: candidates.first().copied().unwrap_or_default().to_string(),
        })
}

fn row_of(t: &Table, id: &str) -> AdminResult<usize> {
    match t.find_by_id("id", id)? {
        Some(r) => Ok(r),
        None => NotFoundSnafu {
            table: t.name(),
            id: id.trim(),
        }
        .fail(),
    }
}

fn ticket_counts(ctx: &Context) -> AdminResult<HashMap<String, usize>> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    if let Some(f) = ctx.store.load_optional(&ctx.tables().tickets)? {
        let col = f.require("idsessao")?;
        for r in 0..f.len() {
            let id = f.get(r, col).key_text();
            if !id.is_empty() {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
    }
    Ok(counts)
}

fn member_names(ctx: &Context) -> AdminResult<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    if let Some(m) = ctx.store.load_optional(&ctx.tables().members)? {
        let col = m.require("nome")?;
        for r in 0..m.len() {
            let n = m.get(r, col).key_text();
            if !n.is_empty() {
                names.insert(n);
            }
        }
    }
    Ok(names)
}

/// Sessions, most recent first, with their ticket count and the member names
/// used for autocompletion.
pub fn list(ctx: &Context) -> AdminResult<JSValue> {
    let tz = ctx.config.utc_offset()?;
    let t = ctx.store.load(&ctx.tables().sessions)?;
    let id_col = t.require("id")?;
    let date_col = t.require("datasessao")?;
    let optional: Vec<(&str, Option<usize>)> = vec![
        ("orgao", t.columns().find_any(ORGAO)),
        ("local", t.columns().find_any(LOCAL)),
        ("presidente", t.columns().find_any(PRESIDENTE)),
        ("secretario", t.columns().find_any(SECRETARIO)),
        ("membros", t.columns().find_any(MEMBROS)),
        ("procuradores", t.columns().find_any(PROCURADORES)),
        ("expediente", t.columns().find_any(EXPEDIENTE)),
    ];
    let counts = ticket_counts(ctx)?;

    let mut sessions: Vec<(Option<NaiveDateTime>, JSValue)> = (0..t.len())
        .map(|r| {
            let id = t.get(r, id_col).to_text();
            let date = cell_datetime(t.get(r, date_col), &tz);
            let mut obj = serde_json::Map::new();
            obj.insert("id".to_string(), json!(id));
            obj.insert(
                "datasessao".to_string(),
                json!(date
                    .as_ref()
                    .map(display_date)
                    .unwrap_or_else(|| "Data não informada".to_string())),
            );
            obj.insert(
                "dataiso".to_string(),
                json!(date.as_ref().map(iso_date).unwrap_or_default()),
            );
            for (name, col) in optional.iter() {
                obj.insert(name.to_string(), json!(text_at(&t, r, *col)));
            }
            let total = counts.get(id.trim()).copied().unwrap_or(0);
            obj.insert("totalFichas".to_string(), json!(total));
            (date, JSValue::Object(obj))
        })
        .collect();
    sessions.sort_by(|a, b| b.0.cmp(&a.0));

    let sessoes: Vec<JSValue> = sessions.into_iter().map(|(_, js)| js).collect();
    Ok(json!({"sessoes": sessoes, "membros": member_names(ctx)?}))
}

pub fn save(ctx: &mut Context, input: &SessionInput) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().sessions)?;
    t.require("id")?;
    let date_col = t.require("datasessao")?;

    let mut patch = Record::new();
    if let Some(id) = input.id.as_ref().filter(|s| !s.trim().is_empty()) {
        patch.insert("id".to_string(), Cell::text(id.trim()));
    }
    if let Some(d) = &input.datasessao {
        let cell = if d.trim().is_empty() {
            Cell::Empty
        } else {
            match session_date(d) {
                Some(dt) => Cell::Date(dt),
                None => {
                    return InvalidInputSnafu {
                        message: format!("datasessao must be YYYY-MM-DD, got {:?}", d),
                    }
                    .fail()
                }
            }
        };
        patch.insert(normalize_key(&t.header()[date_col]), cell);
    }
    put(&mut patch, &t, ORGAO, &input.orgao);
    put(&mut patch, &t, LOCAL, &input.local);
    put(&mut patch, &t, PRESIDENTE, &input.presidente);
    put(&mut patch, &t, SECRETARIO, &input.secretario);

    let fresh = ctx.clock.fresh_id();
    let res = t.upsert(&patch, "id", || fresh.to_string())?;
    ctx.store.save(&t)?;
    Ok(json!({"id": res.id, "created": res.created}))
}

/// Deletes a session. Its tickets and votes are kept.
pub fn delete(ctx: &mut Context, id: &str) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().sessions)?;
    t.delete_by_id("id", id)?;
    ctx.store.save(&t)?;
    info!("delete: session {:?} removed", id);
    Ok(json!({"id": id.trim()}))
}

fn process_cache(ctx: &Context) -> AdminResult<HashMap<String, JSValue>> {
    let mut cache = HashMap::new();
    let p = match ctx.store.load_optional(&ctx.tables().processes)? {
        Some(p) => p,
        None => return Ok(cache),
    };
    let id_col = p.require("id")?;
    let numero = p.columns().find_any(&["processo"]);
    let requerente = p.columns().find_any(&["requerente"]);
    let requerido = p.columns().find_any(&["requerido"]);
    let status = p.columns().find_any(&["status"]);
    let local = p.columns().find_any(LOCAL_OCORRENCIA);
    for r in 0..p.len() {
        let pid = p.get(r, id_col).key_text();
        if pid.is_empty() {
            continue;
        }
        let num = text_at(&p, r, numero);
        cache.insert(
            pid,
            json!({
                "numero": if num.is_empty() { "S/N".to_string() } else { num },
                "requerente": text_at(&p, r, requerente),
                "requerido": text_at(&p, r, requerido),
                "status": text_at(&p, r, status),
                "local": text_at(&p, r, local),
            }),
        );
    }
    Ok(cache)
}

/// The tickets of one session, each with the data of its process.
pub fn list_tickets(ctx: &Context, session_id: &str) -> AdminResult<JSValue> {
    let f = ctx.store.load(&ctx.tables().tickets)?;
    let id_col = f.require("id")?;
    let session_col = f.require("idsessao")?;
    let process_col = f.require("idprocesso")?;
    let relator = f.columns().find_any(RELATOR);
    let membros = f.columns().find_any(MEMBROS);
    let procuradores = f.columns().find_any(PROCURADORES);
    let expediente = f.columns().find_any(EXPEDIENTE);
    let processes = process_cache(ctx)?;
    let unknown = json!({"numero": "S/N", "requerente": "", "requerido": "", "status": "", "local": ""});

    let fichas: Vec<JSValue> = (0..f.len())
        .filter(|r| f.get(*r, session_col).key_text() == session_id.trim())
        .map(|r| {
            let pid = f.get(r, process_col).to_text();
            json!({
                "id": f.get(r, id_col).to_text(),
                "idprocesso": pid,
                "relator": text_at(&f, r, relator),
                "membros": text_at(&f, r, membros),
                "procuradores": text_at(&f, r, procuradores),
                "expediente": text_at(&f, r, expediente),
                "proc": processes.get(pid.trim()).unwrap_or(&unknown),
            })
        })
        .collect();
    debug!("list_tickets: {} tickets for {:?}", fichas.len(), session_id);
    Ok(json!(fichas))
}

/// Updates the rapporteur and the notes of an existing ticket.
pub fn save_ticket(ctx: &mut Context, input: &TicketInput) -> AdminResult<JSValue> {
    let mut f = ctx.store.load(&ctx.tables().tickets)?;
    let row = row_of(&f, &input.id)?;
    for (candidates, value) in [(RELATOR, &input.relator), (EXPEDIENTE, &input.expediente)] {
        if let (Some(v), Some(c)) = (value, f.columns().find_any(candidates)) {
            f.set(row, c, Cell::text(v.clone()));
        }
    }
    ctx.store.save(&f)?;
    Ok(json!({"id": input.id.trim()}))
}

pub fn list_votes(ctx: &Context, ticket_id: &str) -> AdminResult<JSValue> {
    let v = ctx.store.load(&ctx.tables().votes)?;
    let names = ["id", "idfichavotacao", "idprocesso", "tipovoto", "relator", "voto", "resultado"];
    let cols: Vec<usize> = names
        .iter()
        .map(|n| v.require(n))
        .collect::<Result<Vec<usize>, TableError>>()?;
    let url = v.columns().find_any(URL_VOTO);
    let ticket_col = cols[1];

    let votos: Vec<JSValue> = (0..v.len())
        .filter(|r| v.get(*r, ticket_col).key_text() == ticket_id.trim())
        .map(|r| {
            let mut obj = serde_json::Map::new();
            for (name, col) in names.iter().zip(cols.iter()) {
                obj.insert(name.to_string(), json!(v.get(r, *col).to_text()));
            }
            obj.insert("urlvoto".to_string(), json!(text_at(&v, r, url)));
            JSValue::Object(obj)
        })
        .collect();
    Ok(json!(votos))
}

pub fn save_vote(ctx: &mut Context, input: &VoteInput) -> AdminResult<JSValue> {
    let mut v = ctx.store.load(&ctx.tables().votes)?;
    v.require("id")?;
    let mut patch = Record::new();
    if let Some(id) = input.id.as_ref().filter(|s| !s.trim().is_empty()) {
        patch.insert("id".to_string(), Cell::text(id.trim()));
    }
    let fields = [
        ("idfichavotacao", &input.idfichavotacao),
        ("idprocesso", &input.idprocesso),
        ("tipovoto", &input.tipovoto),
        ("relator", &input.relator),
        ("voto", &input.voto),
        ("resultado", &input.resultado),
    ];
    for (name, value) in fields {
        v.require(name)?;
        if let Some(s) = value {
            patch.insert(name.to_string(), Cell::text(s.clone()));
        }
    }
    put(&mut patch, &v, URL_VOTO, &input.urlvoto);

    let fresh = ctx.clock.fresh_id();
    let res = v.upsert(&patch, "id", || fresh.to_string())?;
    ctx.store.save(&v)?;
    Ok(json!({"id": res.id, "created": res.created}))
}

pub fn delete_vote(ctx: &mut Context, id: &str) -> AdminResult<JSValue> {
    let mut v = ctx.store.load(&ctx.tables().votes)?;
    v.delete_by_id("id", id)?;
    ctx.store.save(&v)?;
    Ok(json!({"id": id.trim()}))
}

/// Records the address of the report of a vote. The upload itself happens elsewhere.
pub fn attach_report(ctx: &mut Context, vote_id: &str, url: &str) -> AdminResult<JSValue> {
    let mut v = ctx.store.load(&ctx.tables().votes)?;
    let url_col = require_any(&v, URL_VOTO)?;
    let row = row_of(&v, vote_id)?;
    v.set(row, url_col, Cell::text(url.trim()));
    ctx.store.save(&v)?;
    Ok(json!({"id": vote_id.trim(), "url": url.trim()}))
}
