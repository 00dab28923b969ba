// Rebuilding the live roster from the page while keeping member metadata in the archive.

use log::{debug, info};

use std::collections::HashMap;

use crate::extract::RawRoster;
use crate::flexion::{Gender, RoleFormatter};
use crate::ids::IdSequence;
use crate::table::{Cell, Table, TableError};
use crate::text::name_sort_key;

pub const COL_ID: &str = "id";
pub const COL_NAME: &str = "nome";
pub const COL_EMAIL: &str = "email";
pub const COL_GENDER: &str = "gênero";
pub const COL_ROLE: &str = "cargo";

/// Column indexes of the live roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MemberColumns {
    pub id: usize,
    pub name: usize,
    pub email: usize,
    pub gender: usize,
    pub role: usize,
}

impl MemberColumns {
    pub fn resolve(t: &Table) -> Result<MemberColumns, TableError> {
        Ok(MemberColumns {
            id: t.require(COL_ID)?,
            name: t.require(COL_NAME)?,
            email: t.require(COL_EMAIL)?,
            gender: t.require(COL_GENDER)?,
            role: t.require(COL_ROLE)?,
        })
    }
}

/// Column indexes of the archive.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ArchiveColumns {
    pub id: usize,
    pub name: usize,
    pub email: usize,
    pub gender: usize,
}

impl ArchiveColumns {
    pub fn resolve(t: &Table) -> Result<ArchiveColumns, TableError> {
        Ok(ArchiveColumns {
            id: t.require(COL_ID)?,
            name: t.require(COL_NAME)?,
            email: t.require(COL_EMAIL)?,
            gender: t.require(COL_GENDER)?,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    /// All the roles of the member, flexed and joined into one phrase.
    pub roles: String,
    pub email: String,
    /// The gender as stored in the archive, written back unchanged.
    pub gender_text: String,
    /// The gender used to flex the roles.
    pub gender: Gender,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ArchiveReport {
    pub updated: usize,
    pub appended: usize,
}

/// Email and raw gender text remembered for a member.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct Remembered {
    email: String,
    gender: String,
}

/// Copies every live row into the archive.
///
/// A name already in the archive gets its email and gender overwritten; a new
/// name is appended with an id from `archive_id`. Rows without a name are skipped.
pub fn archive_live_rows<F>(
    live: &Table,
    archive: &mut Table,
    mut archive_id: F,
) -> Result<ArchiveReport, TableError>
where
    F: FnMut() -> String,
{
    let lc = MemberColumns::resolve(live)?;
    let ac = ArchiveColumns::resolve(archive)?;
    let mut report = ArchiveReport::default();

    for row in 0..live.len() {
        let name = live.get(row, lc.name).key_text();
        if name.is_empty() {
            continue;
        }
        let email = live.get(row, lc.email).clone();
        let gender = live.get(row, lc.gender).clone();

        match archive.find_row(ac.name, &name) {
            Some(ar) => {
                archive.set(ar, ac.email, email);
                archive.set(ar, ac.gender, gender);
                report.updated += 1;
            }
            None => {
                let mut new_row = archive.blank_row();
                new_row[ac.id] = Cell::text(archive_id());
                new_row[ac.name] = Cell::text(name.clone());
                new_row[ac.email] = email;
                new_row[ac.gender] = gender;
                archive.append_row(new_row);
                report.appended += 1;
            }
        }
        debug!("archive_live_rows: archived {:?}", name);
    }
    info!(
        "archive_live_rows: {} updated, {} appended",
        report.updated, report.appended
    );
    Ok(report)
}

fn remembered_by_name(archive: &Table) -> Result<HashMap<String, Remembered>, TableError> {
    let ac = ArchiveColumns::resolve(archive)?;
    let mut cache: HashMap<String, Remembered> = HashMap::new();
    for row in 0..archive.len() {
        let name = archive.get(row, ac.name).key_text();
        if name.is_empty() || cache.contains_key(&name) {
            continue;
        }
        cache.insert(
            name,
            Remembered {
                email: archive.get(row, ac.email).key_text(),
                gender: archive.get(row, ac.gender).key_text(),
            },
        );
    }
    Ok(cache)
}

/// Builds the member records of the new roster, in alphabetical order.
///
/// Email and gender come from the archive (exact name match). Each role is flexed
/// with that gender and the roles are joined with `conjunction`.
pub fn reconcile(
    raw: &RawRoster,
    archive: &Table,
    formatter: &RoleFormatter,
    ids: &mut IdSequence,
    conjunction: &str,
) -> Result<Vec<MemberRecord>, TableError> {
    let cache = remembered_by_name(archive)?;
    let mut entries: Vec<_> = raw.entries().iter().collect();
    entries.sort_by_cached_key(|e| name_sort_key(&e.name));

    let members: Vec<MemberRecord> = entries
        .into_iter()
        .map(|entry| {
            let memory = cache.get(&entry.name).cloned().unwrap_or_default();
            let gender = Gender::parse(&memory.gender);
            MemberRecord {
                id: ids.next_id().to_string(),
                name: entry.name.clone(),
                roles: formatter.format_roles(&entry.roles, gender, conjunction),
                email: memory.email,
                gender_text: memory.gender,
                gender,
            }
        })
        .collect();
    debug!("reconcile: {} members", members.len());
    Ok(members)
}

/// Replaces the content of the live roster with the given members.
pub fn rebuild_live(live: &mut Table, members: &[MemberRecord]) -> Result<(), TableError> {
    let lc = MemberColumns::resolve(live)?;
    live.clear_rows();
    for m in members {
        let mut row = live.blank_row();
        row[lc.id] = Cell::text(m.id.clone());
        row[lc.name] = Cell::text(m.name.clone());
        row[lc.role] = Cell::text(m.roles.clone());
        row[lc.email] = Cell::text(m.email.clone());
        row[lc.gender] = Cell::text(m.gender_text.clone());
        live.append_row(row);
    }
    Ok(())
}
