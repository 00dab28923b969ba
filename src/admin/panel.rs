// Session tools: the agenda of a session and the fields edited during it.

use crate::admin::*;

use log::debug;
use roster_sync::{Cell, Table, TableError};
use serde_json::json;

use std::cmp::Ordering;

use crate::admin::dates::{cell_datetime, display_date};
use crate::admin::sessions::{ORGAO, RELATOR};

const SESSION_ID: &[&str] = &["id", "id sessão"];
const SESSION_DATE: &[&str] = &["data", "data da sessão", "datasessao"];
const ATTORNEY_NAME: &[&str] = &["nome", "procurador"];
/// Separator of the name lists stored in a single cell.
pub const LIST_SEPARATOR: &str = ";";

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionField {
    Members,
    Attorneys,
    Notes,
}

impl SessionField {
    pub fn column(&self) -> &'static str {
        match self {
            SessionField::Members => "membros",
            SessionField::Attorneys => "procuradores",
            SessionField::Notes => "expediente",
        }
    }
}

/// Splits a `;`-separated cell into its non-blank items.
pub fn parse_list(cell: &Cell) -> Vec<String> {
    cell.to_text()
        .split(LIST_SEPARATOR)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn column_any(t: &Table, candidates: &[&str]) -> Result<usize, TableError> {
    t.columns()
        .find_any(candidates)
        .ok_or_else(|| TableError::MissingColumn {
            table: t.name().to_string(),
            column: candidates[0].to_string(),
        })
}

fn text_at(t: &Table, row: usize, col: Option<usize>) -> String {
    col.map(|c| t.get(row, c).to_text()).unwrap_or_default()
}

fn session_row(t: &Table, id_col: usize, session_id: &str) -> AdminResult<usize> {
    match t.find_row(id_col, session_id) {
        Some(r) => Ok(r),
        None => NotFoundSnafu {
            table: t.name(),
            id: session_id.trim(),
        }
        .fail(),
    }
}

/// `{id, data, orgao}` of every session, most recent first.
pub fn list_sessions(ctx: &Context) -> AdminResult<JSValue> {
    let tz = ctx.config.utc_offset()?;
    let t = ctx.store.load(&ctx.tables().sessions)?;
    let id_col = column_any(&t, SESSION_ID)?;
    let date_col = t.columns().find_any(SESSION_DATE);
    let orgao_col = t.columns().find_any(ORGAO);

    let mut rows: Vec<_> = (0..t.len())
        .filter(|r| !t.get(*r, id_col).is_blank())
        .map(|r| {
            let date = date_col.and_then(|c| cell_datetime(t.get(r, c), &tz));
            (r, date)
        })
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let sessions: Vec<JSValue> = rows
        .into_iter()
        .map(|(r, date)| {
            json!({
                "id": t.get(r, id_col).to_text(),
                "data": date.as_ref().map(display_date).unwrap_or_default(),
                "orgao": text_at(&t, r, orgao_col),
            })
        })
        .collect();
    Ok(json!(sessions))
}

fn order_key(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) => *n,
        c => c.key_text().parse::<f64>().unwrap_or(0.0),
    }
}

/// Everything shown for one session: header, ordered tickets, the member and
/// attorney lists and the notes.
pub fn load_agenda(ctx: &Context, session_id: &str) -> AdminResult<JSValue> {
    let tz = ctx.config.utc_offset()?;
    let s = ctx.store.load(&ctx.tables().sessions)?;
    let sid_col = column_any(&s, SESSION_ID)?;
    let row = session_row(&s, sid_col, session_id)?;
    let date = s
        .columns()
        .find_any(SESSION_DATE)
        .and_then(|c| cell_datetime(s.get(row, c), &tz));
    let sessao = json!({
        "id": s.get(row, sid_col).to_text(),
        "data": date.as_ref().map(display_date).unwrap_or_default(),
        "orgao": text_at(&s, row, s.columns().find_any(ORGAO)),
    });

    let p = ctx.store.load(&ctx.tables().processes)?;
    let pid_col = p.require("id")?;
    let p_number = p.columns().find_any(&["processo"]);
    let p_applicant = p.columns().find_any(&["requerente"]);
    let p_attorney = p.columns().find_any(&["procurador"]);

    let f = ctx.store.load(&ctx.tables().tickets)?;
    let f_id = f.require("id")?;
    let f_session = f.require("idsessao")?;
    let f_process = f.require("idprocesso")?;
    let f_order = f.columns().find_any(&["ordem"]);
    let f_rapporteur = f.columns().find_any(RELATOR);

    let mut tickets: Vec<(f64, JSValue)> = (0..f.len())
        .filter(|r| f.get(*r, f_session).key_text() == session_id.trim())
        .map(|r| {
            let pid = f.get(r, f_process).key_text();
            let (processo, requerente, procurador) = match p.find_row(pid_col, &pid) {
                Some(pr) => (
                    text_at(&p, pr, p_number),
                    text_at(&p, pr, p_applicant),
                    text_at(&p, pr, p_attorney),
                ),
                None => ("N/D".to_string(), "N/D".to_string(), "N/D".to_string()),
            };
            let order = f_order.map(|c| f.get(r, c).clone()).unwrap_or_default();
            let js = json!({
                "id": f.get(r, f_id).to_text(),
                "ordem": order.to_text(),
                "processo": processo,
                "requerente": requerente,
                "procurador": procurador,
                "relator": text_at(&f, r, f_rapporteur),
            });
            (order_key(&order), js)
        })
        .collect();
    tickets.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    debug!("load_agenda: {} tickets for {:?}", tickets.len(), session_id);

    let list_of = |field: SessionField| -> Vec<String> {
        s.columns()
            .position(field.column())
            .map(|pos| parse_list(s.get(row, pos - 1)))
            .unwrap_or_default()
    };
    let expediente = text_at(&s, row, s.columns().position("expediente").map(|p| p - 1));

    Ok(json!({
        "sessao": sessao,
        "fichas": tickets.into_iter().map(|(_, js)| js).collect::<Vec<JSValue>>(),
        "membros": list_of(SessionField::Members),
        "procuradores": list_of(SessionField::Attorneys),
        "expediente": expediente,
    }))
}

fn save_field(ctx: &mut Context, session_id: &str, field: SessionField, value: Cell) -> AdminResult<JSValue> {
    let mut s = ctx.store.load(&ctx.tables().sessions)?;
    let col = s.require(field.column())?;
    let id_col = column_any(&s, SESSION_ID)?;
    let row = session_row(&s, id_col, session_id)?;
    s.set(row, col, value);
    ctx.store.save(&s)?;
    Ok(json!({"id": session_id.trim(), "field": field.column()}))
}

/// Stores a list of names in one session cell, `;`-separated.
pub fn save_list(
    ctx: &mut Context,
    session_id: &str,
    field: SessionField,
    names: &[String],
) -> AdminResult<JSValue> {
    let items: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    let joined = items.join(LIST_SEPARATOR);
    save_field(ctx, session_id, field, Cell::text(joined))
}

pub fn save_notes(ctx: &mut Context, session_id: &str, text: &str) -> AdminResult<JSValue> {
    save_field(ctx, session_id, SessionField::Notes, Cell::text(text))
}

/// Registered attorney names, for autocompletion.
pub fn list_attorneys(ctx: &Context) -> AdminResult<JSValue> {
    let t = ctx.store.load(&ctx.tables().attorneys)?;
    let col = column_any(&t, ATTORNEY_NAME)?;
    let names: Vec<String> = (0..t.len())
        .map(|r| t.get(r, col).key_text())
        .filter(|n| !n.is_empty())
        .collect();
    Ok(json!(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::testing::*;

    fn sessions() -> Table {
        table(
            "tabSessoes",
            &["Id", "DataSessao", "Órgão", "Membros", "Procuradores", "Expediente"],
            vec![
                vec!["S1", "2025-02-01T12:00:00", "Pleno", "Ana Paiva; João Costa;", "", "Abertura"],
                vec!["S2", "2025-05-01T12:00:00", "Câmara"],
                vec!["", "2025-06-01T12:00:00", "Fantasma"],
                vec!["S3"],
            ],
        )
    }

    fn tickets() -> Table {
        table(
            "tabFichas",
            &["Id", "IdSessao", "IdProcesso", "Ordem", "Relator"],
            vec![
                vec!["F1", "S1", "PRC-1", "10", "Maria Silva"],
                vec!["F2", "S1", "PRC-404", "2"],
                vec!["F3", "S2", "PRC-1", "1"],
            ],
        )
    }

    fn processes() -> Table {
        table(
            "tabProcessos",
            &["Id", "Processo", "Requerente", "Requerido", "Procurador"],
            vec![vec!["PRC-1", "5001", "Ana Paiva", "Delegacia", "Dr. Lima"]],
        )
    }

    #[test]
    fn sessions_most_recent_first() {
        let ctx = context(vec![sessions()]);
        let js = list_sessions(&ctx).unwrap();
        assert_eq!(
            js,
            json!([
                {"id": "S2", "data": "01/05/2025", "orgao": "Câmara"},
                {"id": "S1", "data": "01/02/2025", "orgao": "Pleno"},
                {"id": "S3", "data": "", "orgao": ""},
            ])
        );
    }

    #[test]
    fn agenda_orders_tickets() {
        let ctx = context(vec![sessions(), tickets(), processes()]);
        let js = load_agenda(&ctx, "S1").unwrap();
        assert_eq!(js["sessao"]["orgao"], "Pleno");
        assert_eq!(js["sessao"]["data"], "01/02/2025");
        assert_eq!(js["fichas"][0]["id"], "F2");
        assert_eq!(js["fichas"][0]["processo"], "N/D");
        assert_eq!(js["fichas"][1]["processo"], "5001");
        assert_eq!(js["fichas"][1]["procurador"], "Dr. Lima");
        assert_eq!(js["fichas"][1]["relator"], "Maria Silva");
        assert_eq!(js["membros"], json!(["Ana Paiva", "João Costa"]));
        assert_eq!(js["procuradores"], json!([]));
        assert_eq!(js["expediente"], "Abertura");

        assert!(matches!(
            load_agenda(&ctx, "S9"),
            Err(AdminError::NotFound { .. })
        ));
    }

    #[test]
    fn agenda_needs_processes() {
        let ctx = context(vec![sessions(), tickets()]);
        assert!(matches!(
            load_agenda(&ctx, "S1"),
            Err(AdminError::MissingTable { .. })
        ));
    }

    #[test]
    fn session_fields() {
        let mut ctx = context(vec![sessions()]);
        let names = vec!["Rui Matos".to_string(), " ".to_string(), "Lia Fontes ".to_string()];
        save_list(&mut ctx, "S2", SessionField::Attorneys, &names).unwrap();
        save_notes(&mut ctx, "S2", "Sem expediente").unwrap();
        let t = stored(&ctx, "tabSessoes");
        assert_eq!(t.get(1, 4).to_text(), "Rui Matos;Lia Fontes");
        assert_eq!(t.get(1, 5).to_text(), "Sem expediente");

        assert!(matches!(
            save_notes(&mut ctx, "S9", "x"),
            Err(AdminError::NotFound { .. })
        ));
    }

    #[test]
    fn session_field_column_must_exist() {
        let mut ctx = context(vec![table("tabSessoes", &["Id", "DataSessao"], vec![vec!["S1"]])]);
        assert!(matches!(
            save_list(&mut ctx, "S1", SessionField::Members, &[]),
            Err(AdminError::Table { .. })
        ));
    }

    #[test]
    fn attorneys() {
        let ctx = context(vec![table(
            "tabProcuradores",
            &["Procurador", "OAB"],
            vec![vec!["Dr. Lima", "1"], vec!["", "2"], vec![" Dra. Reis ", "3"]],
        )]);
        assert_eq!(list_attorneys(&ctx).unwrap(), json!(["Dr. Lima", "Dra. Reis"]));
    }
}
