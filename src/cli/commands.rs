use crate::analyzers::{AnomalyMode, AnomalyReport};
use crate::cli::args::{Cli, Commands, ExportFormat};
use crate::error::{ProcessingError, Result};
use crate::processors::{BatchProcessor, LocalMapReduce, StreamMapper, StreamReducer};
use crate::readers::{ConcurrentReader, RejectionCounts};
use crate::settings::Settings;
use crate::utils::filename::generate_default_output_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{render_table, CsvWriter, ParquetWriter};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "loaded settings");

    match cli.command {
        Commands::Map { input } => {
            let mapper = StreamMapper::new();
            let stdout = io::stdout();

            if input.is_empty() {
                mapper.run(io::stdin().lock(), stdout.lock())?;
            } else {
                let mut counts = RejectionCounts::default();
                for path in &input {
                    let reader = BufReader::new(File::open(path)?);
                    counts.merge(&mapper.run(reader, stdout.lock())?);
                }
                info!(files = input.len(), "{}", counts.summary());
            }
        }

        Commands::Reduce {
            input,
            skip_degenerate_years,
        } => {
            let reducer = StreamReducer::new().with_skip_degenerate_years(
                skip_degenerate_years || settings.correlation.skip_degenerate_years,
            );
            reducer.run(open_inputs(&input)?, io::stdout().lock())?;
        }

        Commands::Correlate {
            input,
            json,
            skip_degenerate_years,
            max_workers,
        } => {
            let files = ConcurrentReader::discover_files(&input)?;
            let runner =
                LocalMapReduce::new(max_workers.unwrap_or(settings.processing.max_workers))
                    .with_skip_degenerate_years(
                        skip_degenerate_years || settings.correlation.skip_degenerate_years,
                    );

            let progress = ProgressReporter::new_spinner(
                &format!("Correlating {} files...", files.len()),
                cli.quiet,
            );
            let output = tokio::task::spawn_blocking(move || runner.run(&files)).await??;
            progress.finish_with_message(&format!(
                "Correlated {} years",
                output.correlations.len()
            ));

            info!("{}", output.map_counts.summary());

            if json {
                println!("{}", serde_json::to_string_pretty(&output.correlations)?);
            } else {
                for correlation in &output.correlations {
                    println!("{}", correlation.to_wire());
                }
            }
        }

        Commands::Anomalies {
            input,
            mode,
            stddev,
            output,
            format,
            compression,
            show,
            all_months,
            max_workers,
        } => {
            let mut settings = settings;
            if let Some(workers) = max_workers {
                settings.processing.max_workers = workers;
            }
            if let Some(mode) = mode {
                settings.anomaly.mode = mode;
            }
            if let Some(stddev) = stddev {
                settings.anomaly.stddev = stddev;
            }
            let processor = BatchProcessor::from_settings(&settings);

            let progress = ProgressReporter::new_file_bar("Reading ISD records...", cli.quiet);
            let batch = processor.process(&input, Some(&progress)).await?;
            let report = &batch.report;

            println!("{}", batch.counts.summary());
            println!("\n{}", report.summary());

            if all_months {
                println!("Monthly statistics:");
                print!("{}", render_table(&report.monthly_stats, show));
            } else {
                println!("Anomalous months:");
                print!("{}", render_table(&report.flagged_months, show));
                if report.mode == AnomalyMode::Corrected {
                    println!("\nFlagged observations:");
                    print!("{}", render_table(&report.flagged_observations, show));
                }
            }

            let export_format = match (&output, format.export()) {
                (_, Some(export)) => Some(export),
                (Some(path), None) => Some(format_from_path(path)?),
                (None, None) => None,
            };

            if let Some(export_format) = export_format {
                let path = match output {
                    Some(path) => path,
                    None => generate_default_output_filename(export_format.extension()),
                };
                export_report(
                    report,
                    all_months,
                    export_format,
                    &compression,
                    settings.processing.chunk_size,
                    &path,
                )?;
                println!("\nWrote {}", path.display());
            }
        }
    }

    Ok(())
}

/// Every input file concatenated, or stdin when there are none
fn open_inputs(inputs: &[PathBuf]) -> Result<Box<dyn BufRead>> {
    if inputs.is_empty() {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let mut reader: Box<dyn BufRead> = Box::new(io::empty());
    for path in inputs {
        reader = Box::new(reader.chain(BufReader::new(File::open(path)?)));
    }
    Ok(reader)
}

fn format_from_path(path: &Path) -> Result<ExportFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ExportFormat::from_extension)
        .ok_or_else(|| {
            ProcessingError::InvalidFormat(format!(
                "cannot infer export format from {}, pass --format",
                path.display()
            ))
        })
}

/// Write the report rows: every month with `all_months`, otherwise the
/// flagged observations (corrected) or flagged months (strict-reproduce).
/// JSON always carries the whole report.
fn export_report(
    report: &AnomalyReport,
    all_months: bool,
    format: ExportFormat,
    compression: &str,
    chunk_size: usize,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let export_observations = !all_months && report.mode == AnomalyMode::Corrected;
    let months = if all_months {
        &report.monthly_stats
    } else {
        &report.flagged_months
    };

    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(File::create(path)?, report)?;
        }
        ExportFormat::Csv => {
            let writer = CsvWriter::new();
            if export_observations {
                writer.write_to_file(&report.flagged_observations, path)?;
            } else {
                writer.write_to_file(months, path)?;
            }
        }
        ExportFormat::Parquet => {
            let writer = ParquetWriter::new()
                .with_compression(compression)?
                .with_batch_size(chunk_size);
            if export_observations {
                writer.write_rows(&report.flagged_observations, path)?;
            } else {
                writer.write_rows(months, path)?;
            }
            info!("{}", writer.get_file_info(path)?.summary());
        }
    }

    Ok(())
}
