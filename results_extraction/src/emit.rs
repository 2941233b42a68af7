// Table rendering of the aggregated records.

use crate::aggregate::RecordStore;
use crate::profile::VendorProfile;

/// Fixed leading columns, before the per-method columns.
const BASE_HEADERS: &[&str] = &[
    "county",
    "precinct",
    "office",
    "district",
    "party",
    "candidate",
    "votes",
];

/// A fully rendered output table. Rendering is byte-deterministic:
/// sorted records, sorted method columns, fixed formatting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A method name as it appears in the header row.
pub fn column_name(method: &str) -> String {
    method
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}

pub fn emit_table(store: RecordStore, profile: &VendorProfile) -> ResultTable {
    let mut methods = store.method_names();
    methods.sort_by_key(|m| column_name(m));

    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    headers.extend(methods.iter().map(|m| column_name(m)));

    let mut rows = Vec::new();
    for record in store.into_sorted() {
        let votes_only = record.is_votes_only();
        let mut row = vec![
            record.key.county.clone(),
            record.key.precinct.clone(),
            record.key.office.clone(),
            record.key.district.clone().unwrap_or_default(),
            record.key.party.clone().unwrap_or_default(),
            record.key.candidate.clone(),
            record.total_votes(&profile.totals_policy).to_string(),
        ];
        for method in &methods {
            let cell = match record.tallies.get(method) {
                Some(v) => v.to_string(),
                // A bare-total record has no breakdown at all; a normal
                // record simply got no votes through this method.
                None if votes_only => String::new(),
                None => "0".to_string(),
            };
            row.push(cell);
        }
        rows.push(row);
    }
    ResultTable { headers, rows }
}
