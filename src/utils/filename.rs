use chrono::{Datelike, Local};
use std::path::PathBuf;

/// Default export path: output/isd-monthly-{YYMMDD}.{extension}
pub fn generate_default_output_filename(extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "isd-monthly-{:02}{:02}{:02}.{}",
        year, month, day, extension
    );
    PathBuf::from("output").join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_output_filename() {
        let filename = generate_default_output_filename("parquet");
        let filename_str = filename.to_string_lossy();

        assert!(filename_str.starts_with("output/"));
        assert!(filename_str.ends_with(".parquet"));

        let file_part = filename.file_name().unwrap().to_string_lossy();
        assert!(file_part.starts_with("isd-monthly-"));
        // isd-monthly- + YYMMDD + .parquet
        assert_eq!(file_part.len(), "isd-monthly-".len() + 6 + ".parquet".len());
    }

    #[test]
    fn test_extension_is_used() {
        let filename = generate_default_output_filename("csv");
        assert_eq!(filename.extension().unwrap(), "csv");
    }
}
