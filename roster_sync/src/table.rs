// Tables: sheets treated as relational tables through their header row.

use chrono::NaiveDateTime;
use log::{debug, warn};

use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::Display;

use crate::text::{fold_accents, normalize_key};

pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single scalar value of a table.
#[derive(PartialEq, Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn text<S: Into<String>>(s: S) -> Cell {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The textual form of the cell, as it is written to storage.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    /// Trimmed text, used for every identity comparison.
    pub fn key_text(&self) -> String {
        self.to_text().trim().to_string()
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Cell {
        Cell::text(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Cell {
        Cell::text(s)
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TableError {
    /// The table does not have a column that the operation requires.
    MissingColumn { table: String, column: String },
    /// No row carries the requested id.
    NotFound { table: String, id: String },
}

impl Error for TableError {}

impl Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::MissingColumn { table, column } => {
                write!(f, "column '{}' not found in table '{}'", column, table)
            }
            TableError::NotFound { table, id } => {
                write!(f, "no row with id '{}' in table '{}'", id, table)
            }
        }
    }
}

/// A row keyed by normalized column name.
pub type Record = BTreeMap<String, Cell>;

/// Mapping from normalized header text to its 1-based column position.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ColumnMap {
    table: String,
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    /// Builds the map of a header row. Blank headers are skipped. When a header
    /// appears twice, the first column keeps the name.
    pub fn from_header(table: &str, header: &[String]) -> ColumnMap {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, h) in header.iter().enumerate() {
            let key = normalize_key(h);
            if key.is_empty() {
                continue;
            }
            if positions.contains_key(&key) {
                warn!("table {}: duplicate column {:?} at position {}", table, key, idx + 1);
                continue;
            }
            positions.insert(key, idx + 1);
        }
        ColumnMap {
            table: table.to_string(),
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The 1-based position of a column.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(&normalize_key(key)).cloned()
    }

    /// The 0-based index of a column that must exist.
    pub fn require(&self, key: &str) -> Result<usize, TableError> {
        self.position(key)
            .map(|p| p - 1)
            .ok_or_else(|| TableError::MissingColumn {
                table: self.table.clone(),
                column: normalize_key(key),
            })
    }

    /// The 0-based index of the first candidate present in the map.
    /// Candidates are compared exactly first, then without accents.
    pub fn find_any(&self, candidates: &[&str]) -> Option<usize> {
        for cand in candidates {
            if let Some(p) = self.position(cand) {
                return Some(p - 1);
            }
            let folded = fold_accents(cand.trim());
            let found = self
                .positions
                .iter()
                .filter(|(k, _)| fold_accents(k) == folded)
                .map(|(_, p)| *p)
                .min();
            if let Some(p) = found {
                return Some(p - 1);
            }
        }
        None
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.positions.keys()
    }
}

/// Outcome of an upsert.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Upserted {
    pub id: String,
    pub created: bool,
}

/// An in-memory snapshot of one sheet.
#[derive(PartialEq, Debug, Clone)]
pub struct Table {
    name: String,
    header: Vec<String>,
    columns: ColumnMap,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: &str, header: Vec<String>) -> Table {
        let columns = ColumnMap::from_header(name, &header);
        Table {
            name: name.to_string(),
            header,
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from a header and rows. Rows are padded or truncated to the
    /// width of the header.
    pub fn with_rows(name: &str, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new(name, header);
        for r in rows {
            t.append_row(r);
        }
        t
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn require(&self, key: &str) -> Result<usize, TableError> {
        self.columns.require(key)
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }

    pub fn set(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// A blank row of the right width.
    pub fn blank_row(&self) -> Vec<Cell> {
        vec![Cell::Empty; self.width()]
    }

    pub fn append_row(&mut self, mut row: Vec<Cell>) -> usize {
        row.resize(self.width(), Cell::Empty);
        self.rows.push(row);
        self.rows.len() - 1
    }

    /// The index of the first row whose `col` equals `id` (both trimmed).
    pub fn find_row(&self, col: usize, id: &str) -> Option<usize> {
        let id = id.trim();
        self.rows.iter().position(|r| {
            r.get(col)
                .map(|c| c.key_text() == id)
                .unwrap_or(false)
        })
    }

    /// Same as `find_row`, with the id column looked up by name.
    pub fn find_by_id(&self, id_column: &str, id: &str) -> Result<Option<usize>, TableError> {
        let col = self.require(id_column)?;
        Ok(self.find_row(col, id))
    }

    fn not_found(&self, id: &str) -> TableError {
        TableError::NotFound {
            table: self.name.clone(),
            id: id.trim().to_string(),
        }
    }

    /// Inserts or merges a partial record.
    ///
    /// The row is located by the value of `id_column` in the patch. When it exists,
    /// the columns present in the patch overwrite the stored values and the others
    /// are kept. Otherwise a new row is appended; if the patch carries no id, one is
    /// obtained from `new_id`.
    pub fn upsert<F>(
        &mut self,
        patch: &Record,
        id_column: &str,
        new_id: F,
    ) -> Result<Upserted, TableError>
    where
        F: FnOnce() -> String,
    {
        let id_col = self.require(id_column)?;
        let id_key = normalize_key(id_column);
        let sent_id = patch
            .get(&id_key)
            .map(|c| c.key_text())
            .filter(|s| !s.is_empty());

        let existing = sent_id.as_ref().and_then(|id| self.find_row(id_col, id));
        let (row_idx, id, created) = match (existing, sent_id) {
            (Some(r), Some(id)) => (r, id, false),
            (_, sent) => {
                let id = sent.unwrap_or_else(new_id);
                let r = self.append_row(Vec::new());
                self.set(r, id_col, Cell::text(id.clone()));
                (r, id, true)
            }
        };

        for (key, value) in patch.iter() {
            if *key == id_key {
                continue;
            }
            match self.columns.position(key) {
                Some(p) => self.set(row_idx, p - 1, value.clone()),
                None => warn!("table {}: ignoring unknown field {:?}", self.name, key),
            }
        }
        debug!(
            "table {}: upsert id {:?} (created: {}) at row {}",
            self.name, id, created, row_idx
        );
        Ok(Upserted { id, created })
    }

    /// Deletes the row with the given id.
    pub fn delete_by_id(&mut self, id_column: &str, id: &str) -> Result<Vec<Cell>, TableError> {
        let r = self
            .find_by_id(id_column, id)?
            .ok_or_else(|| self.not_found(id))?;
        Ok(self.rows.remove(r))
    }

    /// Overwrites one field of the row with the given id.
    pub fn update_field(
        &mut self,
        id_column: &str,
        id: &str,
        column: &str,
        value: Cell,
    ) -> Result<(), TableError> {
        let col = self.require(column)?;
        let r = self
            .find_by_id(id_column, id)?
            .ok_or_else(|| self.not_found(id))?;
        self.set(r, col, value);
        Ok(())
    }

    /// Writes `column` for every row whose id is a key of `values`.
    /// Returns the number of rows touched; unknown ids are ignored.
    pub fn bulk_update(
        &mut self,
        id_column: &str,
        column: &str,
        values: &HashMap<String, Cell>,
    ) -> Result<usize, TableError> {
        let id_col = self.require(id_column)?;
        let col = self.require(column)?;
        let mut touched = 0;
        for row in self.rows.iter_mut() {
            let id = row[id_col].key_text();
            if let Some(v) = values.get(&id) {
                row[col] = v.clone();
                touched += 1;
            }
        }
        Ok(touched)
    }

    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// One row as a record keyed by normalized column name.
    pub fn record(&self, row: usize) -> Record {
        self.columns
            .keys()
            .filter_map(|k| {
                self.columns
                    .position(k)
                    .map(|p| (k.clone(), self.get(row, p - 1).clone()))
            })
            .collect()
    }

    pub fn records(&self) -> Vec<Record> {
        (0..self.rows.len()).map(|r| self.record(r)).collect()
    }
}
