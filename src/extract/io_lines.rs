// Reading line-oriented report files.

use log::debug;
use snafu::prelude::*;

use std::fs;

use crate::extract::{ExtractResult, OpeningInputSnafu};

/// Reads the whole report, one element per line, order preserved.
/// Blank lines are kept; the scanner skips them itself.
pub fn read_lines(path: &str) -> ExtractResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningInputSnafu { path })?;
    let lines: Vec<String> = contents.lines().map(|l| l.to_string()).collect();
    debug!("read {} lines from {:?}", lines.len(), path);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_lines_in_order() {
        let path = std::env::temp_dir().join("io_lines_reads_in_order.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "PCT 001").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "Sheriff").unwrap();
        drop(f);

        let lines = read_lines(path.to_str().unwrap()).unwrap();
        assert_eq!(lines, vec!["PCT 001", "", "Sheriff"]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_lines("/no/such/file/anywhere.txt").is_err());
    }
}
