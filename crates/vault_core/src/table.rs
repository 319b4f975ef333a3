use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::fingerprint::{Fingerprint, Fingerprinter};

static EMPTY_CELL: Cell = Cell::Empty;

/// One field of a delimited file, typed the way a spreadsheet would read it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Bool(false);
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::Int(v);
        }
        if looks_numeric(trimmed)
            && let Ok(v) = trimmed.parse::<f64>()
        {
            return Self::Float(v);
        }
        Self::Text(raw.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(v) if v.fract() == 0.0 => Some(v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Text form used for grouping and equality against selector values.
    /// `None` for empty cells.
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn feed(&self, hasher: &mut Fingerprinter) {
        match self {
            Self::Empty => {
                hasher.tag(0);
            }
            Self::Bool(v) => {
                hasher.tag(1).u64(u64::from(*v));
            }
            Self::Int(v) => {
                hasher.tag(2).u64(*v as u64);
            }
            Self::Float(v) => {
                hasher.tag(3).u64(v.to_bits());
            }
            Self::Text(s) => {
                hasher.tag(4).str(s);
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

/// Ordered, named columns over rows of cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    cells: &'a [Cell],
}

impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> &'a Cell {
        match self.table.column_index(column) {
            Some(i) => &self.cells[i],
            None => &EMPTY_CELL,
        }
    }

    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let index = build_index(&columns);
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Parse a comma-delimited file with a header row. Short rows are padded
    /// with empty cells; rows wider than the header and duplicate header
    /// names are rejected.
    pub fn from_csv<R: Read>(reader: R, source: &str) -> Result<Self, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| csv_error(source, e))?.clone();
        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(CoreError::new(
                    CoreErrorCode::MalformedInput,
                    format!("{source}: duplicate column '{column}'"),
                ));
            }
        }

        let width = columns.len();
        let mut table = Self::new(columns);
        for (index, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| csv_error(source, e))?;
            if record.len() > width {
                return Err(CoreError::new(
                    CoreErrorCode::MalformedInput,
                    format!(
                        "{source}: row {} has {} fields, header has {width}",
                        index + 1,
                        record.len()
                    ),
                ));
            }
            let mut cells: Vec<Cell> = record.iter().map(Cell::parse).collect();
            cells.resize(width, Cell::Empty);
            table.rows.push(cells);
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn require_columns(&self, required: &[&str], source: &str) -> Result<(), CoreError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(CoreError::new(
            CoreErrorCode::MalformedInput,
            format!("{source}: missing required column(s): {}", missing.join(", ")),
        ))
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|cells| RowRef {
            table: self,
            cells,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(move |cells| RowRef {
            table: self,
            cells,
        })
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        self.rows.push(cells);
    }

    pub fn column(&self, column: &str) -> impl Iterator<Item = &Cell> {
        let idx = self.column_index(column);
        self.rows
            .iter()
            .map(move |r| idx.map(|i| &r[i]).unwrap_or(&EMPTY_CELL))
    }

    /// Sorted distinct non-empty values of one column.
    pub fn distinct(&self, column: &str) -> Vec<String> {
        self.column(column)
            .filter_map(Cell::key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Projection in the given order; columns the table lacks come back empty.
    pub fn select(&self, columns: &[&str]) -> Self {
        let picks: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let mut out = Self::new(columns.iter().copied());
        out.rows = self
            .rows
            .iter()
            .map(|r| {
                picks
                    .iter()
                    .map(|p| p.map(|i| r[i].clone()).unwrap_or(Cell::Empty))
                    .collect()
            })
            .collect();
        out
    }

    /// Move `first` (those present) to the front, keep the rest in file order.
    pub fn reorder_front(&self, first: &[&str]) -> Self {
        let mut order: Vec<&str> = first
            .iter()
            .copied()
            .filter(|c| self.has_column(c))
            .collect();
        for column in &self.columns {
            if !first.contains(&column.as_str()) {
                order.push(column.as_str());
            }
        }
        self.select(&order)
    }

    pub fn drop_columns(&self, names: &[&str]) -> Self {
        let keep: Vec<&str> = self
            .columns
            .iter()
            .map(String::as_str)
            .filter(|c| !names.contains(c))
            .collect();
        self.select(&keep)
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(i) = self.column_index(from) {
            self.columns[i] = to.to_string();
            self.index = build_index(&self.columns);
        }
    }

    pub fn filter_rows(&self, mut keep: impl FnMut(RowRef<'_>) -> bool) -> Self {
        let mut out = Self::new(self.columns.iter().cloned());
        out.rows = self
            .rows
            .iter()
            .filter(|cells| {
                keep(RowRef {
                    table: self,
                    cells,
                })
            })
            .cloned()
            .collect();
        out
    }

    pub fn map_column(&mut self, column: &str, mut f: impl FnMut(&Cell) -> Cell) {
        let Some(i) = self.column_index(column) else {
            return;
        };
        for row in &mut self.rows {
            row[i] = f(&row[i]);
        }
    }

    pub fn sort_rows_by(&mut self, mut cmp: impl FnMut(RowRef<'_>, RowRef<'_>) -> std::cmp::Ordering) {
        let mut rows = std::mem::take(&mut self.rows);
        rows.sort_by(|a, b| {
            cmp(
                RowRef {
                    table: self,
                    cells: a,
                },
                RowRef {
                    table: self,
                    cells: b,
                },
            )
        });
        self.rows = rows;
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Fingerprinter::new("table");
        hasher.u64(self.columns.len() as u64);
        for column in &self.columns {
            hasher.str(column);
        }
        hasher.u64(self.rows.len() as u64);
        for row in &self.rows {
            for cell in row {
                cell.feed(&mut hasher);
            }
        }
        hasher.finish()
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect()
}

fn csv_error(source: &str, e: csv::Error) -> CoreError {
    let code = if e.is_io_error() {
        CoreErrorCode::Io
    } else {
        CoreErrorCode::MalformedInput
    };
    CoreError::new(code, format!("{source}: {e}"))
}
