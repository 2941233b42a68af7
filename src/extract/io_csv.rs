// CSV rendering of a result table.

use snafu::prelude::*;

use results_extraction::ResultTable;

use crate::extract::{ExtractResult, WritingCsvSnafu};

/// Renders the table to a CSV string. Rendering to memory keeps the
/// reference comparison a plain string equality.
pub fn render_csv(table: &ResultTable) -> ExtractResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&table.headers).context(WritingCsvSnafu)?;
    for row in &table.rows {
        wtr.write_record(row).context(WritingCsvSnafu)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| e.into_error())
        .whatever_context("Failed to flush the CSV writer")?;
    String::from_utf8(bytes).whatever_context("The CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headers_and_rows() {
        let table = ResultTable {
            headers: vec!["county".to_string(), "votes".to_string()],
            rows: vec![
                vec!["Collin".to_string(), "12".to_string()],
                vec!["Collin".to_string(), "".to_string()],
            ],
        };
        let rendered = render_csv(&table).unwrap();
        assert_eq!(rendered, "county,votes\nCollin,12\nCollin,\n");
    }

    #[test]
    fn quotes_fields_with_commas() {
        let table = ResultTable {
            headers: vec!["candidate".to_string()],
            rows: vec![vec!["Leone, Jr.".to_string()]],
        };
        let rendered = render_csv(&table).unwrap();
        assert_eq!(rendered, "candidate\n\"Leone, Jr.\"\n");
    }
}
