/*!
Roster synchronization for committee administration tables.

The tables are plain sheets whose columns are found through their header row
(see [`table`]). The live roster is rebuilt from a public web page: names and role
headings are read from the page ([`extract`]), role titles are adjusted to the
gender remembered for each member ([`flexion`]) and the member metadata is kept
in an archive table across rebuilds ([`reconcile`]).

```
use roster_sync::*;

let html = r#"<div id="aba1"><p><strong>Presidente</strong>Maria Silva<br>João Costa</p></div>"#;
let header = |cols: &[&str]| cols.iter().map(|s| s.to_string()).collect::<Vec<String>>();
let mut live = Table::new("tabMembros", header(&["Id", "Nome", "Email", "Gênero", "Cargo"]));
let mut archive = Table::new("tabMembrosArquivo", header(&["Id", "Nome", "Email", "Gênero"]));

let raw = extract_roster(html, "aba1")?;
let mut ids = IdSequence::new(SequentialId::fresh(1, 0));
let report = resync(
    &raw,
    &mut live,
    &mut archive,
    &RoleFormatter::new(),
    &mut ids,
    || "ARQ-1".to_string(),
    "e",
)?;
assert_eq!(report.members, 2);
assert_eq!(live.len(), 2);
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/
pub mod extract;
pub mod flexion;
pub mod ids;
pub mod reconcile;
pub mod table;
pub mod text;

use log::info;

pub use crate::extract::{extract_roster, ExtractError, RawRoster, RosterEntry};
pub use crate::flexion::{join_roles, Gender, RoleFormatter};
pub use crate::ids::{next_id, IdSequence, SequentialId};
pub use crate::reconcile::{
    archive_live_rows, rebuild_live, reconcile, ArchiveReport, MemberRecord,
};
pub use crate::table::{Cell, ColumnMap, Record, Table, TableError, Upserted};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SyncReport {
    pub archive: ArchiveReport,
    pub members: usize,
    pub records: Vec<MemberRecord>,
}

/// Full rebuild of the live roster, in memory.
///
/// Every live row is first copied into the archive, then the live table is
/// cleared and refilled from `raw`. Nothing is modified when one of the tables
/// lacks a required column: both schemas are checked before the first write.
pub fn resync<F>(
    raw: &RawRoster,
    live: &mut Table,
    archive: &mut Table,
    formatter: &RoleFormatter,
    ids: &mut IdSequence,
    archive_id: F,
    conjunction: &str,
) -> Result<SyncReport, TableError>
where
    F: FnMut() -> String,
{
    reconcile::MemberColumns::resolve(live)?;
    reconcile::ArchiveColumns::resolve(archive)?;

    let archive_report = archive_live_rows(live, archive, archive_id)?;
    let records = reconcile(raw, archive, formatter, ids, conjunction)?;
    rebuild_live(live, &records)?;
    info!(
        "resync: {} members written, archive {:?}",
        records.len(),
        archive_report
    );
    Ok(SyncReport {
        archive: archive_report,
        members: records.len(),
        records,
    })
}
