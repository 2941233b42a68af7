// Reading flattened contest-tree files.
//
// Tree exports arrive as a JSON array of row objects, one per
// (precinct, contest, choice, vote type) combination.

use log::debug;
use snafu::prelude::*;

use std::fs;

use serde::{Deserialize, Serialize};

use results_extraction::TreeRow;

use crate::extract::{ExtractResult, OpeningInputSnafu, ParsingJsonSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TreeRowConfig {
    pub precinct: String,
    pub contest: String,
    pub choice: String,
    #[serde(rename = "voteType")]
    pub vote_type: String,
    pub votes: u64,
}

pub fn read_tree_rows(path: &str) -> ExtractResult<Vec<TreeRow>> {
    let contents = fs::read_to_string(path).context(OpeningInputSnafu { path })?;
    let rows: Vec<TreeRowConfig> =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read {} tree rows from {:?}", rows.len(), path);
    Ok(rows
        .into_iter()
        .map(|r| TreeRow {
            precinct: r.precinct,
            contest: r.contest,
            choice: r.choice,
            vote_type: r.vote_type,
            votes: r.votes,
        })
        .collect())
}
