use crate::models::{FlaggedObservation, MonthlyStats};
use std::fmt::Write;

pub const DEFAULT_SHOW_ROWS: usize = 20;

/// Rows that render as one line of a text table.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn double(value: f64) -> String {
    format!("{:?}", value)
}

impl TableRow for MonthlyStats {
    fn headers() -> &'static [&'static str] {
        &[
            "year",
            "month",
            "observations",
            "avg_temperature",
            "avg_humidity",
            "stddev_temperature",
            "stddev_humidity",
            "upper_temperature",
            "lower_temperature",
            "upper_humidity",
            "lower_humidity",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format!("{:04}", self.year),
            format!("{:02}", self.month),
            self.observations.to_string(),
            double(self.avg_temperature),
            double(self.avg_humidity),
            double(self.stddev_temperature),
            double(self.stddev_humidity),
            double(self.upper_temperature),
            double(self.lower_temperature),
            double(self.upper_humidity),
            double(self.lower_humidity),
        ]
    }
}

impl TableRow for FlaggedObservation {
    fn headers() -> &'static [&'static str] {
        &["year", "month", "date", "temperature", "humidity", "kind"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            format!("{:04}", self.year),
            format!("{:02}", self.month),
            self.date.format("%Y%m%d").to_string(),
            self.temperature.to_string(),
            self.humidity.to_string(),
            self.kind.as_str().to_string(),
        ]
    }
}

fn format_line<S: AsRef<str>>(cells: impl IntoIterator<Item = S>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.into_iter().zip(widths) {
        let _ = write!(line, "{:>width$}|", cell.as_ref(), width = *width);
    }
    line
}

/// Boxed, right-aligned table in the layout of a dataframe `show()`.
pub fn render_table<T: TableRow>(rows: &[T], limit: usize) -> String {
    let headers = T::headers();
    let shown: Vec<Vec<String>> = rows.iter().take(limit).map(TableRow::cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for cells in &shown {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.len());
        }
    }

    let separator = widths.iter().fold(String::from("+"), |mut line, width| {
        line.push_str(&"-".repeat(*width));
        line.push('+');
        line
    });

    let mut out = String::new();
    out.push_str(&separator);
    out.push('\n');
    out.push_str(&format_line(headers.iter(), &widths));
    out.push('\n');
    out.push_str(&separator);
    out.push('\n');
    for cells in &shown {
        out.push_str(&format_line(cells, &widths));
        out.push('\n');
    }
    out.push_str(&separator);
    out.push('\n');

    if rows.len() > limit {
        let _ = writeln!(
            out,
            "only showing top {} row{}",
            limit,
            if limit == 1 { "" } else { "s" }
        );
    }
    out
}
