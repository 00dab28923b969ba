// Members table commands, including the roster synchronization.

use crate::admin::*;

use log::{debug, info};
use roster_sync::reconcile::{COL_GENDER, COL_ID, COL_ROLE};
use roster_sync::{extract_roster, resync, Cell, IdSequence, Record, RoleFormatter, Table};
use serde::{Deserialize, Serialize};
use serde_json::json;
use text_diff::Difference;

use std::collections::HashMap;

use crate::admin::fetch::RosterSource;
use crate::admin::input::row_json;
use crate::admin::store::render_lines;

pub const OFFICIAL_COLUMNS: &[&str] = &["Id", "Nome", "Email", "Gênero", "Cargo"];
pub const ARCHIVE_ID_PREFIX: &str = "ARQ-";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GenderUpdate {
    pub id: String,
    #[serde(default)]
    pub genero: String,
}

/// All the members and the distinct roles, in order of first appearance.
pub fn list(ctx: &Context) -> AdminResult<JSValue> {
    let t = ctx.store.load(&ctx.tables().members)?;
    let role_col = t.require(COL_ROLE)?;
    let membros: Vec<JSValue> = (0..t.len()).map(|r| row_json(&t, r)).collect();
    let mut cargos: Vec<String> = Vec::new();
    for r in 0..t.len() {
        let role = t.get(r, role_col).key_text();
        if !role.is_empty() && !cargos.contains(&role) {
            cargos.push(role);
        }
    }
    Ok(json!({"membros": membros, "cargos": cargos}))
}

fn members_table(ctx: &mut Context) -> AdminResult<Table> {
    let name = ctx.tables().members.clone();
    match ctx.store.load_optional(&name)? {
        Some(t) => Ok(t),
        None => ctx.store.create(&name, OFFICIAL_COLUMNS),
    }
}

pub fn save(ctx: &mut Context, patch: &Record) -> AdminResult<JSValue> {
    let mut t = members_table(ctx)?;
    let fresh = ctx.clock.fresh_id();
    let res = t.upsert(patch, COL_ID, || fresh.to_string())?;
    ctx.store.save(&t)?;
    Ok(json!({"id": res.id, "created": res.created}))
}

pub fn delete(ctx: &mut Context, id: &str) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().members)?;
    t.delete_by_id(COL_ID, id)?;
    ctx.store.save(&t)?;
    Ok(json!({"id": id.trim()}))
}

/// Writes the gender of several members at once. Entries without a gender are ignored.
pub fn set_genders(ctx: &mut Context, updates: &[GenderUpdate]) -> AdminResult<JSValue> {
    let mut t = ctx.store.load(&ctx.tables().members)?;
    let values: HashMap<String, Cell> = updates
        .iter()
        .filter(|u| !u.genero.trim().is_empty())
        .map(|u| (u.id.trim().to_string(), Cell::text(u.genero.trim())))
        .collect();
    let touched = t.bulk_update(COL_ID, COL_GENDER, &values)?;
    ctx.store.save(&t)?;
    Ok(json!({"updated": touched}))
}

fn diff_lines(before: &str, after: &str) -> Vec<String> {
    let (_, changes) = text_diff::diff(before, after, "\n");
    changes
        .into_iter()
        .flat_map(|d| {
            let (sign, block) = match d {
                Difference::Same(_) => return Vec::new(),
                Difference::Add(s) => ("+", s),
                Difference::Rem(s) => ("-", s),
            };
            block
                .split('\n')
                .map(|l| format!("{} {}", sign, l))
                .collect::<Vec<String>>()
        })
        .collect()
}

/// Rebuilds the live roster from the roster page.
///
/// The page is fetched and parsed before any table is read or written. The
/// archive is saved before the live table.
pub fn sync(ctx: &mut Context, source: &dyn RosterSource, dry_run: bool) -> AdminResult<JSValue> {
    let anchor = ctx.config.roster_anchor_id.clone();
    let page = source.fetch_page()?;
    let raw = extract_roster(&page, &anchor)?;
    ensure!(!raw.is_empty(), EmptyRosterSnafu { anchor });

    let mut live = ctx.store.load(&ctx.tables().members)?;
    let mut archive = ctx.store.load(&ctx.tables().member_archive)?;
    let before = render_lines(&live);

    let seed = ctx.clock.fresh_id();
    let mut ids = IdSequence::new(seed);
    let mut archive_ids = IdSequence::new(seed);
    let report = resync(
        &raw,
        &mut live,
        &mut archive,
        &RoleFormatter::new(),
        &mut ids,
        || format!("{}{}", ARCHIVE_ID_PREFIX, archive_ids.next_id()),
        &ctx.config.list_conjunction,
    )?;
    debug!("sync: {:?}", report.archive);

    let summary = json!({
        "members": report.members,
        "archiveUpdated": report.archive.updated,
        "archiveAppended": report.archive.appended,
        "dryRun": dry_run,
    });
    if dry_run {
        let changes = diff_lines(&before, &render_lines(&live));
        info!("sync: dry run, {} changed lines", changes.len());
        return Ok(json!({"summary": summary, "changes": changes}));
    }

    ctx.store.save(&archive)?;
    ctx.store.save(&live)?;
    info!("sync: {} members written", report.members);
    Ok(json!({
        "summary": summary,
        "message": format!("Sucesso! {} membros processados e sincronizados.", report.members),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::fetch::StaticSource;
    use crate::admin::testing::*;

    const PAGE: &str = r#"<html><body>
<div class="tab-pane" id="aba1">
<p><strong>Secretário Executivo</strong>Maria Silva</p>
<p><strong>Membros</strong>Maria Silva<br>João Costa<br>Álvaro Dias</p>
</div></body></html>"#;

    fn roster_tables() -> Vec<Table> {
        vec![
            table(
                "tabMembros",
                OFFICIAL_COLUMNS,
                vec![
                    vec!["1a0001", "Ana Paiva", "ana@x.org", "Feminino", "Membra"],
                    vec!["1a0002", "Maria Silva", "maria@x.org", "Feminino", "Membra"],
                ],
            ),
            table(
                "tabMembrosArquivo",
                &["Id", "Nome", "Email", "Gênero"],
                vec![vec!["ARQ-0", "João Costa", "joao@x.org", "Masculino"]],
            ),
        ]
    }

    #[test]
    fn list_members_and_roles() {
        let ctx = context(vec![table(
            "tabMembros",
            OFFICIAL_COLUMNS,
            vec![
                vec!["1", "Ana", "", "", "Membra"],
                vec!["2", "Bia", "", "", " Membra "],
                vec!["3", "Caio", "", "", "Presidente"],
                vec!["4", "Davi", "", "", ""],
            ],
        )]);
        let js = list(&ctx).unwrap();
        assert_eq!(js["membros"].as_array().unwrap().len(), 4);
        assert_eq!(js["membros"][0]["Nome"], "Ana");
        assert_eq!(js["cargos"], json!(["Membra", "Presidente"]));
    }

    #[test]
    fn save_creates_table_and_assigns_id() {
        let mut ctx = context(Vec::new());
        let mut patch = Record::new();
        patch.insert("nome".to_string(), Cell::from("Ana Paiva"));
        let js = save(&mut ctx, &patch).unwrap();
        assert_eq!(js["created"], true);
        let id = js["id"].as_str().unwrap().to_string();
        assert!(id.starts_with('1'));

        let t = stored(&ctx, "tabMembros");
        assert_eq!(t.header(), &OFFICIAL_COLUMNS[..]);
        assert_eq!(t.get(0, 0).to_text(), id);

        let mut edit = Record::new();
        edit.insert("id".to_string(), Cell::text(id.clone()));
        edit.insert("email".to_string(), Cell::from("ana@x.org"));
        let js = save(&mut ctx, &edit).unwrap();
        assert_eq!(js["created"], false);
        let t = stored(&ctx, "tabMembros");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, 1).to_text(), "Ana Paiva");
        assert_eq!(t.get(0, 2).to_text(), "ana@x.org");
    }

    #[test]
    fn delete_unknown_member() {
        let mut ctx = context(roster_tables());
        assert!(matches!(
            delete(&mut ctx, "zz"),
            Err(AdminError::NotFound { .. })
        ));
        delete(&mut ctx, " 1a0001 ").unwrap();
        assert_eq!(stored(&ctx, "tabMembros").len(), 1);
    }

    #[test]
    fn gender_bulk_update() {
        let mut ctx = context(roster_tables());
        let updates = vec![
            GenderUpdate { id: "1a0001".to_string(), genero: "Masculino".to_string() },
            GenderUpdate { id: "1a0002".to_string(), genero: "".to_string() },
            GenderUpdate { id: "nope".to_string(), genero: "Feminino".to_string() },
        ];
        let js = set_genders(&mut ctx, &updates).unwrap();
        assert_eq!(js["updated"], 1);
        let t = stored(&ctx, "tabMembros");
        assert_eq!(t.get(0, 3).to_text(), "Masculino");
        assert_eq!(t.get(1, 3).to_text(), "Feminino");
    }

    #[test]
    fn sync_rebuilds_and_archives() {
        let mut ctx = context(roster_tables());
        let js = sync(&mut ctx, &StaticSource(PAGE.to_string()), false).unwrap();
        assert_eq!(js["summary"]["members"], 3);
        assert_eq!(js["summary"]["archiveAppended"], 2);

        let live = stored(&ctx, "tabMembros");
        let names: Vec<String> = (0..live.len()).map(|r| live.get(r, 1).to_text()).collect();
        assert_eq!(names, vec!["Álvaro Dias", "João Costa", "Maria Silva"]);
        assert_eq!(live.get(1, 2).to_text(), "joao@x.org");
        assert_eq!(live.get(1, 4).to_text(), "Membros");
        assert_eq!(live.get(2, 4).to_text(), "Secretária Executiva e Membros");

        let archive = stored(&ctx, "tabMembrosArquivo");
        assert_eq!(archive.len(), 3);
        let ana = archive.find_row(1, "Ana Paiva").unwrap();
        assert!(archive.get(ana, 0).to_text().starts_with(ARCHIVE_ID_PREFIX));
        assert_eq!(archive.get(ana, 2).to_text(), "ana@x.org");
    }

    #[test]
    fn sync_dry_run_writes_nothing() {
        let mut ctx = context(roster_tables());
        let js = sync(&mut ctx, &StaticSource(PAGE.to_string()), true).unwrap();
        assert_eq!(js["summary"]["dryRun"], true);
        let changes: Vec<String> = serde_json::from_value(js["changes"].clone()).unwrap();
        assert!(changes.iter().any(|l| l.starts_with("- ") && l.contains("Ana Paiva")));
        assert!(changes.iter().any(|l| l.starts_with("+ ") && l.contains("Álvaro Dias")));
        assert_eq!(stored(&ctx, "tabMembros").len(), 2);
        assert_eq!(stored(&ctx, "tabMembrosArquivo").len(), 1);
    }

    #[test]
    fn sync_failures_leave_tables_untouched() {
        let mut ctx = context(roster_tables());
        let no_anchor = sync(&mut ctx, &StaticSource("<p>Ana</p>".to_string()), false);
        assert!(matches!(no_anchor, Err(AdminError::Extract { .. })));

        let empty = StaticSource(r#"<div id="aba1"><p><strong>Membros</strong></p></div>"#.to_string());
        assert!(matches!(
            sync(&mut ctx, &empty, false),
            Err(AdminError::EmptyRoster { .. })
        ));
        assert_eq!(stored(&ctx, "tabMembros").len(), 2);
        assert_eq!(stored(&ctx, "tabMembrosArquivo").len(), 1);
    }

    #[test]
    fn sync_needs_the_archive() {
        let mut tables = roster_tables();
        tables.pop();
        let mut ctx = context(tables);
        assert!(matches!(
            sync(&mut ctx, &StaticSource(PAGE.to_string()), false),
            Err(AdminError::MissingTable { .. })
        ));
        assert_eq!(stored(&ctx, "tabMembros").len(), 2);
    }
}
