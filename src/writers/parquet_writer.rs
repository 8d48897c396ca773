use crate::error::{ProcessingError, Result};
use crate::models::{FlaggedObservation, MonthlyStats};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_CHUNK_SIZE, DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Row types that can be laid out as an Arrow record batch.
pub trait ParquetRows: Sized {
    fn schema() -> Arc<Schema>;
    fn columns(rows: &[Self]) -> Vec<ArrayRef>;
}

impl ParquetRows for MonthlyStats {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::UInt32, false),
            Field::new("observations", DataType::UInt64, false),
            Field::new("avg_temperature", DataType::Float64, false),
            Field::new("avg_humidity", DataType::Float64, false),
            Field::new("stddev_temperature", DataType::Float64, false),
            Field::new("stddev_humidity", DataType::Float64, false),
            Field::new("upper_temperature", DataType::Float64, false),
            Field::new("lower_temperature", DataType::Float64, false),
            Field::new("upper_humidity", DataType::Float64, false),
            Field::new("lower_humidity", DataType::Float64, false),
        ]))
    }

    fn columns(rows: &[Self]) -> Vec<ArrayRef> {
        let floats = |f: fn(&MonthlyStats) -> f64| -> ArrayRef {
            Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
        };

        vec![
            Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(UInt32Array::from(rows.iter().map(|r| r.month).collect::<Vec<_>>())),
            Arc::new(UInt64Array::from(
                rows.iter().map(|r| r.observations).collect::<Vec<_>>(),
            )),
            floats(|r| r.avg_temperature),
            floats(|r| r.avg_humidity),
            floats(|r| r.stddev_temperature),
            floats(|r| r.stddev_humidity),
            floats(|r| r.upper_temperature),
            floats(|r| r.lower_temperature),
            floats(|r| r.upper_humidity),
            floats(|r| r.lower_humidity),
        ]
    }
}

impl ParquetRows for FlaggedObservation {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::UInt32, false),
            Field::new("date", DataType::Date32, false),
            Field::new("temperature", DataType::Int32, false),
            Field::new("humidity", DataType::Int32, false),
            Field::new("kind", DataType::Utf8, false),
        ]))
    }

    fn columns(rows: &[Self]) -> Vec<ArrayRef> {
        vec![
            Arc::new(Int32Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(UInt32Array::from(rows.iter().map(|r| r.month).collect::<Vec<_>>())),
            Arc::new(Date32Array::from(
                rows.iter()
                    .map(|r| Date32Type::from_naive_date(r.date))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(
                rows.iter().map(|r| r.temperature).collect::<Vec<_>>(),
            )),
            Arc::new(Int32Array::from(rows.iter().map(|r| r.humidity).collect::<Vec<_>>())),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>(),
            )),
        ]
    }
}

pub struct ParquetWriter {
    compression: Compression,
    batch_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            batch_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    /// Rows per Arrow record batch handed to the writer
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Write rows to a Parquet file, one record batch per chunk
    pub fn write_rows<T: ParquetRows>(&self, rows: &[T], path: &Path) -> Result<()> {
        let schema = T::schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(DEFAULT_ROW_GROUP_SIZE)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in rows.chunks(self.batch_size) {
            let batch = RecordBatch::try_new(schema.clone(), T::columns(chunk))?;
            writer.write(&batch)?;
        }

        writer.close()?;
        debug!(path = %path.display(), rows = rows.len(), "wrote parquet file");
        Ok(())
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let metadata = builder.metadata();

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups: metadata.num_row_groups(),
            columns: builder
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect(),
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Rows: {}\nRow groups: {}\nColumns: {}",
            self.total_rows,
            self.row_groups,
            self.columns.join(", ")
        )
    }
}
