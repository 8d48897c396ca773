pub mod csv_writer;
pub mod parquet_writer;
pub mod table;

pub use csv_writer::CsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetRows, ParquetWriter};
pub use table::{render_table, TableRow, DEFAULT_SHOW_ROWS};
