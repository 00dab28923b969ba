// Fixtures shared by the command tests.

use crate::admin::dates::Clock;
use crate::admin::store::memory::MemoryWorkbook;
use crate::admin::*;

use chrono::{TimeZone, Utc};
use roster_sync::{Cell, Table};

pub fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}

pub fn table(name: &str, cols: &[&str], rows: Vec<Vec<&str>>) -> Table {
    Table::with_rows(
        name,
        header(cols),
        rows.into_iter()
            .map(|r| r.into_iter().map(Cell::from).collect())
            .collect(),
    )
}

/// A context over in-memory tables, with the clock stopped on 2026-03-10 15:00 UTC.
pub fn context(tables: Vec<Table>) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    Context {
        store: Box::new(MemoryWorkbook::with(tables)),
        config: AdminConfig::default(),
        clock: Clock::Fixed(Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()),
    }
}

pub fn stored(ctx: &Context, name: &str) -> Table {
    ctx.store.load(name).unwrap()
}
