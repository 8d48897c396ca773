use crate::error::Result;
use crate::writers::table::TableRow;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Header-first CSV export of report rows.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_rows<T, W>(&self, rows: &[T], writer: W) -> Result<()>
    where
        T: Serialize + TableRow,
        W: Write,
    {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        // serde only emits the header alongside the first record
        if rows.is_empty() {
            csv_writer.write_record(T::headers())?;
        }
        for row in rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_to_file<T: Serialize + TableRow>(&self, rows: &[T], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_rows(rows, file)?;
        debug!(path = %path.display(), rows = rows.len(), "wrote csv file");
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
