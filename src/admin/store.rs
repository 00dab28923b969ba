// Where the tables live. The workbook is a directory holding one CSV file per table.

use crate::admin::*;

use log::{debug, info};
use roster_sync::{Cell, Table};

use std::fs;
use std::path::PathBuf;

pub trait TableStore {
    fn exists(&self, name: &str) -> bool;

    /// Loads a table. Fails with `MissingTable` when it does not exist.
    fn load(&self, name: &str) -> AdminResult<Table>;

    /// Writes the whole table, creating it if needed.
    fn save(&mut self, table: &Table) -> AdminResult<()>;

    /// Creates an empty table with the given header.
    fn create(&mut self, name: &str, header: &[&str]) -> AdminResult<Table> {
        let t = Table::new(name, header.iter().map(|s| s.to_string()).collect());
        self.save(&t)?;
        info!("create: table {:?} with {} columns", name, header.len());
        Ok(t)
    }

    fn load_optional(&self, name: &str) -> AdminResult<Option<Table>> {
        if self.exists(name) {
            self.load(name).map(Some)
        } else {
            Ok(None)
        }
    }
}

pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    /// Opens (and creates if needed) the workbook directory.
    pub fn open(dir: &str) -> AdminResult<CsvWorkbook> {
        fs::create_dir_all(dir).context(OpeningWorkbookSnafu { path: dir })?;
        info!("open: workbook at {:?}", dir);
        Ok(CsvWorkbook {
            dir: PathBuf::from(dir),
        })
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl TableStore for CsvWorkbook {
    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    fn load(&self, name: &str) -> AdminResult<Table> {
        let p = self.path_of(name);
        let path = p.display().to_string();
        if !p.is_file() {
            return MissingTableSnafu { table: name }.fail();
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&p)
            .context(ReadingCsvSnafu { path: path.clone() })?;

        let mut header: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for record in rdr.records() {
            let record = record.context(ReadingCsvSnafu { path: path.clone() })?;
            match header {
                None => {
                    let h: Vec<String> = record
                        .iter()
                        .map(|s| s.trim_start_matches('\u{feff}').to_string())
                        .collect();
                    header = Some(h);
                }
                Some(_) => rows.push(record.iter().map(Cell::text).collect()),
            }
        }
        debug!("load: {} rows from {:?}", rows.len(), path);
        Ok(Table::with_rows(name, header.unwrap_or_default(), rows))
    }

    fn save(&mut self, table: &Table) -> AdminResult<()> {
        let p = self.path_of(table.name());
        let tmp = self.dir.join(format!("{}.csv.tmp", table.name()));
        let path = p.display().to_string();
        {
            let mut wtr = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&tmp)
                .context(WritingCsvSnafu { path: path.clone() })?;
            wtr.write_record(table.header())
                .context(WritingCsvSnafu { path: path.clone() })?;
            for row in table.rows() {
                let mut line: Vec<String> = row.iter().map(|c| c.to_text()).collect();
                line.resize(table.width(), String::new());
                wtr.write_record(&line)
                    .context(WritingCsvSnafu { path: path.clone() })?;
            }
            wtr.flush()
                .context(ReplacingFileSnafu { path: path.clone() })?;
        }
        fs::rename(&tmp, &p).context(ReplacingFileSnafu { path: path.clone() })?;
        info!("save: {} rows to {:?}", table.len(), path);
        Ok(())
    }
}

/// One line per row, used to show what a change would do.
pub fn render_lines(table: &Table) -> String {
    let mut out = table.header().join(" | ");
    for row in table.rows() {
        out.push('\n');
        let cells: Vec<String> = row.iter().map(|c| c.to_text()).collect();
        out.push_str(&cells.join(" | "));
    }
    out
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::BTreeMap;

    /// Tables kept in memory, for tests.
    #[derive(Default)]
    pub struct MemoryWorkbook {
        pub tables: BTreeMap<String, Table>,
    }

    impl MemoryWorkbook {
        pub fn with(tables: Vec<Table>) -> MemoryWorkbook {
            MemoryWorkbook {
                tables: tables
                    .into_iter()
                    .map(|t| (t.name().to_string(), t))
                    .collect(),
            }
        }
    }

    impl TableStore for MemoryWorkbook {
        fn exists(&self, name: &str) -> bool {
            self.tables.contains_key(name)
        }

        fn load(&self, name: &str) -> AdminResult<Table> {
            match self.tables.get(name) {
                Some(t) => Ok(t.clone()),
                None => MissingTableSnafu { table: name }.fail(),
            }
        }

        fn save(&mut self, table: &Table) -> AdminResult<()> {
            self.tables.insert(table.name().to_string(), table.clone());
            Ok(())
        }
    }
}
