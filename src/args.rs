use clap::Parser;

/// Extracts normalized precinct-level election results from vendor
/// canvass reports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The report to extract. Either a plain-text file with one
    /// report line per line, or a flattened contest-tree JSON file (see
    /// --input-type).
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default lines) The type of the input: 'lines' for text reports,
    /// 'tree' for flattened contest-tree JSON.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// The vendor profile: either the name of a builtin profile
    /// (electionware, electionware-pct, collin, fort-bend, greenbox,
    /// clarity) or the path of a JSON profile file.
    #[clap(short, long, value_parser)]
    pub profile: String,

    /// The county name stamped on every output record.
    #[clap(short, long, value_parser)]
    pub county: String,

    /// (file path, 'stdout' or empty) Where the CSV output is written.
    /// Defaults to stdout.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference CSV file. If provided, the program checks
    /// that its output matches the reference and reports a diff otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the
    /// standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
