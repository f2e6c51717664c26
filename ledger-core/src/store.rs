//! Record store backed by a flat CSV table
//!
//! # Contract
//!
//! - `load_all` returns the whole collection or fails; it never yields a
//!   partially parsed table
//! - `save_all` replaces the whole collection atomically (temp file in the
//!   same directory, fsync, rename)
//! - Header row, column order, extra columns and every cell other than the
//!   targeted flag cells round-trip verbatim

use crate::{
    config::ColumnNames,
    error::{Error, Result, StoreOperation},
    types::{BeneficiaryRecord, Category, DistributionFlags, EffectiveUpdate, FlagVocabulary, TicketCode},
    Config,
};
use csv::StringRecord;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

const BOM: char = '\u{feff}';
const BOM_BYTES: &[u8] = b"\xEF\xBB\xBF";

/// Durable collection of beneficiary records
pub trait RecordStore: Send + Sync {
    /// Load the full collection
    fn load_all(&self) -> Result<RecordTable>;

    /// Replace the full collection
    fn save_all(&self, table: &RecordTable) -> Result<()>;
}

/// How rows are interpreted
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Required column headers
    pub columns: ColumnNames,
    /// Flag spelling
    pub flags: FlagVocabulary,
}

impl Schema {
    /// Schema from ledger configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            columns: config.columns.clone(),
            flags: config.flags.clone(),
        }
    }
}

/// Resolved indices of the required columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    ticket_code: usize,
    name: usize,
    age: usize,
    partner: usize,
    card: usize,
    flags: [usize; 4],
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, columns: &ColumnNames) -> std::result::Result<Self, String> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches(BOM).trim() == wanted)
                .ok_or_else(|| format!("missing column {:?}", wanted))
        };

        let mut flags = [0usize; 4];
        for (slot, category) in flags.iter_mut().zip(Category::ALL) {
            *slot = find(columns.flag(category))?;
        }

        Ok(Self {
            ticket_code: find(&columns.ticket_code)?,
            name: find(&columns.name)?,
            age: find(&columns.age)?,
            partner: find(&columns.partner)?,
            card: find(&columns.card)?,
            flags,
        })
    }

    fn flag(&self, category: Category) -> usize {
        match category {
            Category::Token => self.flags[0],
            Category::Nfi => self.flags[1],
            Category::Tools => self.flags[2],
            Category::Seed => self.flags[3],
        }
    }
}

/// In-memory snapshot of the whole store
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    layout: ColumnLayout,
    flags: FlagVocabulary,
    /// Source started with a UTF-8 BOM; written back on save
    had_bom: bool,
}

impl RecordTable {
    /// Parse a CSV document. `origin` is only used in error reports.
    pub fn read_from<R: Read>(reader: R, schema: &Schema, origin: &Path) -> Result<Self> {
        let mut source = io::BufReader::new(reader);
        let had_bom = source
            .fill_buf()
            .map_err(|e| Error::unavailable(origin, StoreOperation::Load, e))?
            .starts_with(BOM_BYTES);
        if had_bom {
            source.consume(BOM_BYTES.len());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(source);

        let headers = reader
            .headers()
            .map_err(|e| csv_error(e, origin, StoreOperation::Load))?
            .clone();

        if headers.is_empty() || headers.iter().all(|h| h.trim_start_matches(BOM).trim().is_empty()) {
            return Err(Error::corruption(origin, "missing header row"));
        }

        let layout = ColumnLayout::resolve(&headers, &schema.columns)
            .map_err(|detail| Error::corruption(origin, detail))?;

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.map_err(|e| csv_error(e, origin, StoreOperation::Load))?;
            let code = row.get(layout.ticket_code).unwrap_or_default().trim();
            if !code.is_empty() && !seen.insert(code.to_string()) {
                return Err(Error::corruption(
                    origin,
                    format!("duplicate ticket code {:?} on row {}", code, line + 1),
                ));
            }
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            layout,
            flags: schema.flags.clone(),
            had_bom,
        })
    }

    /// Serialize as CSV
    pub fn write_to<W: Write>(&self, mut writer: W) -> csv::Result<()> {
        if self.had_bom {
            writer.write_all(BOM_BYTES)?;
        }
        let mut writer = csv::WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Header row, verbatim
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Raw rows, verbatim
    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row index of a ticket code. Stored cells are compared trimmed, the
    /// same way request codes are trimmed on construction.
    pub fn position(&self, code: &TicketCode) -> Option<usize> {
        self.rows.iter().position(|row| {
            row.get(self.layout.ticket_code)
                .map(|cell| cell.trim() == code.as_str())
                .unwrap_or(false)
        })
    }

    /// Typed view of a row
    pub fn record(&self, index: usize) -> Option<BeneficiaryRecord> {
        let row = self.rows.get(index)?;
        let cell = |i: usize| row.get(i).unwrap_or_default().to_string();

        let mut flags = DistributionFlags::default();
        for category in Category::ALL {
            let raw = row.get(self.layout.flag(category)).unwrap_or_default();
            flags.set(category, self.flags.parse(raw));
        }

        Some(BeneficiaryRecord {
            ticket_code: TicketCode::new(cell(self.layout.ticket_code)),
            name: cell(self.layout.name),
            age: cell(self.layout.age),
            partner_info: cell(self.layout.partner),
            card_info: cell(self.layout.card),
            flags,
        })
    }

    /// Find a record by ticket code
    pub fn find(&self, code: &TicketCode) -> Option<BeneficiaryRecord> {
        self.position(code).and_then(|i| self.record(i))
    }

    /// All records, in stored order
    pub fn records(&self) -> impl Iterator<Item = BeneficiaryRecord> + '_ {
        (0..self.rows.len()).filter_map(move |i| self.record(i))
    }

    /// Rewrite the flag cells of one row. Every other cell is untouched.
    pub fn apply(&mut self, index: usize, update: &EffectiveUpdate) -> bool {
        let Some(row) = self.rows.get(index) else {
            return false;
        };

        let replaced: StringRecord = row
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                update
                    .changes()
                    .iter()
                    .find(|(category, _)| self.layout.flag(*category) == col)
                    .map(|(_, state)| self.flags.render(*state))
                    .unwrap_or(cell)
            })
            .collect();

        self.rows[index] = replaced;
        true
    }
}

fn csv_error(err: csv::Error, path: &Path, operation: StoreOperation) -> Error {
    let detail = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => Error::unavailable(path, operation, source),
        _ => Error::corruption(path, detail),
    }
}

/// CSV file on local disk
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
    schema: Schema,
}

impl CsvRecordStore {
    /// Store at `path`. The file is not touched until the first load.
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    /// Store described by ledger configuration
    pub fn open(config: &Config) -> Self {
        Self::new(config.store_path.clone(), Schema::from_config(config))
    }

    /// Store location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &RecordTable) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        table
            .write_to(tmp.as_file_mut())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        tmp.as_file().sync_all()?;

        if let Ok(meta) = std::fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }

        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl RecordStore for CsvRecordStore {
    fn load_all(&self) -> Result<RecordTable> {
        let file = File::open(&self.path)
            .map_err(|e| Error::unavailable(&self.path, StoreOperation::Load, e))?;
        let table = RecordTable::read_from(io::BufReader::new(file), &self.schema, &self.path)?;

        tracing::debug!(path = ?self.path, records = table.len(), "Record store loaded");
        Ok(table)
    }

    fn save_all(&self, table: &RecordTable) -> Result<()> {
        self.persist(table)
            .map_err(|e| Error::unavailable(&self.path, StoreOperation::Save, e))?;

        tracing::debug!(path = ?self.path, records = table.len(), "Record store replaced");
        Ok(())
    }
}

/// Store held in memory
#[derive(Debug)]
pub struct MemoryRecordStore {
    table: RwLock<RecordTable>,
}

impl MemoryRecordStore {
    /// Wrap an existing table
    pub fn new(table: RecordTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Parse CSV text into a store
    pub fn from_csv(text: &str, schema: &Schema) -> Result<Self> {
        let table = RecordTable::read_from(text.as_bytes(), schema, Path::new("<memory>"))?;
        Ok(Self::new(table))
    }

    /// Current contents as CSV text
    pub fn to_csv(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.table.read().write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_all(&self) -> Result<RecordTable> {
        Ok(self.table.read().clone())
    }

    fn save_all(&self, table: &RecordTable) -> Result<()> {
        *self.table.write() = table.clone();
        Ok(())
    }
}
