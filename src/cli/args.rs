use crate::analyzers::{AnomalyMode, StddevKind};
use crate::utils::constants::COMPRESSION_SNAPPY;
use crate::writers::DEFAULT_SHOW_ROWS;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "isd-stats")]
#[command(about = "Temperature/humidity statistics over NOAA ISD climate records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress bars")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path (logs go to stderr otherwise)")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Settings file [default: ./isd-stats.toml when present]"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Streaming mapper: raw ISD lines in, `year\ttemperature\thumidity` tuples out
    Map {
        #[arg(short, long, help = "Input ISD files (stdin when omitted)")]
        input: Vec<PathBuf>,
    },

    /// Streaming reducer: tuples in, `year\tcorrelation` lines out
    Reduce {
        #[arg(short, long, help = "Mapped tuple files (stdin when omitted)")]
        input: Vec<PathBuf>,

        #[arg(long, help = "Skip years with a constant series instead of failing")]
        skip_degenerate_years: bool,
    },

    /// Per-year temperature/humidity correlation over files or directories
    Correlate {
        #[arg(short, long, required = true, num_args = 1.., help = "Input ISD files or directories")]
        input: Vec<PathBuf>,

        #[arg(long, help = "Print the result as JSON")]
        json: bool,

        #[arg(long, help = "Skip years with a constant series instead of failing")]
        skip_degenerate_years: bool,

        #[arg(long, help = "Map partitions [default: processing.max_workers]")]
        max_workers: Option<usize>,
    },

    /// Monthly mean/stddev bands and anomalies
    Anomalies {
        #[arg(short, long, required = true, num_args = 1.., help = "Input ISD files or directories")]
        input: Vec<PathBuf>,

        #[arg(short, long, help = "corrected | strict-reproduce [default: anomaly.mode]")]
        mode: Option<AnomalyMode>,

        #[arg(long, help = "population | sample [default: anomaly.stddev]")]
        stddev: Option<StddevKind>,

        #[arg(
            short,
            long,
            help = "Export file path [default: output/isd-monthly-{YYMMDD}.{ext}]"
        )]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        #[arg(long, default_value_t = COMPRESSION_SNAPPY.to_string())]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_SHOW_ROWS, help = "Rows to print")]
        show: usize,

        #[arg(long, help = "Report every month, not only anomalous ones")]
        all_months: bool,

        #[arg(long, help = "Worker threads [default: processing.max_workers]")]
        max_workers: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    /// File format to export, `None` for table-only output
    pub fn export(&self) -> Option<ExportFormat> {
        match self {
            OutputFormat::Table => None,
            OutputFormat::Csv => Some(ExportFormat::Csv),
            OutputFormat::Parquet => Some(ExportFormat::Parquet),
            OutputFormat::Json => Some(ExportFormat::Json),
        }
    }
}

/// Formats a report can be written to disk in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "json",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "parquet" => Some(ExportFormat::Parquet),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}
