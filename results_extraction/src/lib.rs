//! Extraction of normalized, precinct-level election records from the
//! text of vendor-generated canvass reports.
//!
//! The input is a sequence of lines (or, for contest-tree exports, a
//! sequence of flat tuples). A single strictly sequential pass over the
//! document classifies each line against a vendor profile, tracks the
//! precinct and contest currently in scope, and accumulates vote counts
//! into records keyed by county, precinct, office, district, party and
//! candidate. The caller renders the result as a table.
//!
//! Nothing here performs IO. The binary crate owns files, JSON profiles
//! and CSV output.

pub mod aggregate;
pub mod cascade;
pub mod context;
pub mod emit;
pub mod events;
pub mod normalize;
pub mod profile;

use log::info;

use crate::aggregate::{RecordKey, RecordStore};
use crate::cascade::{ClassifyFailure, LineCascade, LineClass, OverUnderKind, StatKind};
use crate::context::{ContextTracker, ContextUpdate, ParseContext, StatFlag};
use crate::events::{ScanEvent, ScanObserver, ScanStats};
use crate::profile::VendorProfile;

pub use crate::aggregate::{ElectionRecord, VOTES_ONLY};
pub use crate::emit::{emit_table, ResultTable};
pub use crate::events::{CountingObserver, LogObserver};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScanError {
    /// The document contained no lines (or no rows) at all.
    EmptyInput,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::EmptyInput => write!(f, "the input document is empty"),
        }
    }
}

impl std::error::Error for ScanError {}

/// One flattened row of a contest-tree export. The binary's tree reader
/// produces these from the vendor's JSON.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TreeRow {
    pub precinct: String,
    pub contest: String,
    pub choice: String,
    pub vote_type: String,
    pub votes: u64,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub records: RecordStore,
    pub stats: ScanStats,
}

/// Offices under which document-level statistics are recorded.
const STAT_OFFICES: &[(StatKind, &str)] = &[
    (StatKind::RegisteredVoters, "Registered Voters"),
    (StatKind::BallotsCast, "Ballots Cast"),
    (StatKind::BlankBallots, "Ballots Cast Blank"),
];

fn stat_office(kind: StatKind) -> &'static str {
    STAT_OFFICES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, name)| *name)
        .unwrap_or("Statistics")
}

fn stat_flag(kind: StatKind) -> StatFlag {
    match kind {
        StatKind::RegisteredVoters => StatFlag::RegisteredVoters,
        StatKind::BallotsCast => StatFlag::BallotsCast,
        StatKind::BlankBallots => StatFlag::BlankBallots,
    }
}

/// Scans a line-oriented report in one sequential pass.
///
/// Context headers mutate the tracker; every other recognized line
/// becomes counts in the store. Unrecognized lines are reported to the
/// observer and skipped, never fatal. Only an entirely empty document
/// is an error.
pub fn run_line_scan(
    lines: &[String],
    county: &str,
    profile: &VendorProfile,
    observer: &mut dyn ScanObserver,
) -> Result<ScanOutcome, ScanError> {
    if lines.is_empty() {
        return Err(ScanError::EmptyInput);
    }
    let tracker = ContextTracker::new(profile);
    let cascade = LineCascade::new(profile);
    let mut ctx = ParseContext::new();
    let mut store = RecordStore::new();
    let mut stats = ScanStats::default();

    for (idx, raw) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines_seen += 1;

        match tracker.observe(&mut ctx, line) {
            Some(ContextUpdate::Precinct { precinct, turnout }) => {
                observer.event(ScanEvent::PrecinctFound {
                    line_no,
                    precinct: precinct.clone(),
                });
                if let Some((ballots, registered)) = turnout {
                    if ingest_stat_total(
                        &mut store,
                        &mut ctx,
                        county,
                        StatKind::RegisteredVoters,
                        registered,
                    ) {
                        stats.records += 1;
                    }
                    if ingest_stat_total(
                        &mut store,
                        &mut ctx,
                        county,
                        StatKind::BallotsCast,
                        ballots,
                    ) {
                        stats.records += 1;
                    }
                }
                continue;
            }
            Some(ContextUpdate::Office(office)) => {
                observer.event(ScanEvent::OfficeFound {
                    line_no,
                    office: office.office.clone(),
                });
                continue;
            }
            None => {}
        }

        // Everything before the first precinct header is preamble.
        if ctx.current_precinct.is_none() {
            continue;
        }

        match cascade.classify(line, &ctx) {
            Ok(LineClass::Noise) => {}
            Ok(LineClass::Statistic {
                kind,
                total,
                methods,
            }) => {
                let ingested = if methods.is_empty() {
                    ingest_stat_total(&mut store, &mut ctx, county, kind, total)
                } else if ctx.mark_stat(stat_flag(kind)) {
                    let key = stat_key(county, &ctx, kind);
                    for (method, count) in profile.method_columns.iter().zip(methods) {
                        store.ingest(key.clone(), method, count);
                    }
                    true
                } else {
                    false
                };
                if ingested {
                    stats.records += 1;
                }
            }
            Ok(LineClass::OverUnder {
                kind,
                total: _,
                methods,
            }) => {
                let office = match ctx.current_office.as_ref() {
                    Some(o) => o,
                    None => {
                        stats.missing_context += 1;
                        observer.event(ScanEvent::MissingContext {
                            line_no,
                            line: line.to_string(),
                        });
                        continue;
                    }
                };
                let candidate = match kind {
                    OverUnderKind::Overvotes => "Overvotes",
                    OverUnderKind::Undervotes => "Undervotes",
                };
                let key = RecordKey {
                    county: county.to_string(),
                    precinct: ctx.current_precinct.clone().unwrap_or_default(),
                    office: office.office.clone(),
                    district: office.district.clone(),
                    party: None,
                    candidate: candidate.to_string(),
                };
                for (method, count) in profile.method_columns.iter().zip(methods) {
                    store.ingest(key.clone(), method, count);
                }
                stats.records += 1;
            }
            Ok(LineClass::Candidate {
                party,
                candidate,
                total: _,
                methods,
            }) => {
                let office = match ctx.current_office.as_ref() {
                    Some(o) => o,
                    None => {
                        stats.missing_context += 1;
                        observer.event(ScanEvent::MissingContext {
                            line_no,
                            line: line.to_string(),
                        });
                        continue;
                    }
                };
                let (name, paren_party) = normalize::resolve_party(&candidate);
                let party = party.or(paren_party).or_else(|| office.party.clone());
                let key = RecordKey {
                    county: county.to_string(),
                    precinct: ctx.current_precinct.clone().unwrap_or_default(),
                    office: office.office.clone(),
                    district: office.district.clone(),
                    party,
                    candidate: name.clone(),
                };
                for (method, count) in profile.method_columns.iter().zip(methods) {
                    store.ingest(key.clone(), method, count);
                }
                stats.records += 1;
                observer.event(ScanEvent::RecordIngested {
                    line_no,
                    candidate: name,
                });
            }
            Ok(LineClass::Proposition {
                choice,
                total: _,
                methods,
            }) => {
                let office = match ctx.current_office.as_ref() {
                    Some(o) => o,
                    None => {
                        stats.missing_context += 1;
                        observer.event(ScanEvent::MissingContext {
                            line_no,
                            line: line.to_string(),
                        });
                        continue;
                    }
                };
                let key = RecordKey {
                    county: county.to_string(),
                    precinct: ctx.current_precinct.clone().unwrap_or_default(),
                    office: office.office.clone(),
                    district: office.district.clone(),
                    party: None,
                    candidate: choice.clone(),
                };
                for (method, count) in profile.method_columns.iter().zip(methods) {
                    store.ingest(key.clone(), method, count);
                }
                stats.records += 1;
                observer.event(ScanEvent::RecordIngested {
                    line_no,
                    candidate: choice,
                });
            }
            Err(ClassifyFailure::Unrecognized) => {
                stats.unclassified += 1;
                observer.event(ScanEvent::UnclassifiedLine {
                    line_no,
                    line: line.to_string(),
                });
            }
            Err(ClassifyFailure::MalformedNumericField) => {
                stats.malformed += 1;
                observer.event(ScanEvent::MalformedNumericField {
                    line_no,
                    line: line.to_string(),
                });
            }
        }
    }

    info!(
        "scan done: {} lines, {} records, {} unclassified",
        stats.lines_seen,
        store.len(),
        stats.unclassified
    );
    Ok(ScanOutcome {
        records: store,
        stats,
    })
}

fn stat_key(county: &str, ctx: &ParseContext, kind: StatKind) -> RecordKey {
    RecordKey {
        county: county.to_string(),
        precinct: ctx.current_precinct.clone().unwrap_or_default(),
        office: stat_office(kind).to_string(),
        district: None,
        party: None,
        candidate: String::new(),
    }
}

/// Returns whether the figure was actually stored; a repeated summary
/// block within the same precinct is suppressed.
fn ingest_stat_total(
    store: &mut RecordStore,
    ctx: &mut ParseContext,
    county: &str,
    kind: StatKind,
    total: u64,
) -> bool {
    if !ctx.mark_stat(stat_flag(kind)) {
        return false;
    }
    let key = stat_key(county, ctx, kind);
    store.ingest_votes_only(key, total);
    true
}

/// Scans a flattened contest tree. No line patterns apply; only the
/// normalizer, the profile's exclusions and the aggregator.
pub fn run_tree_scan(
    rows: &[TreeRow],
    county: &str,
    profile: &VendorProfile,
    observer: &mut dyn ScanObserver,
) -> Result<ScanOutcome, ScanError> {
    if rows.is_empty() {
        return Err(ScanError::EmptyInput);
    }
    let mut store = RecordStore::new();
    let mut stats = ScanStats::default();

    for (idx, row) in rows.iter().enumerate() {
        let line_no = idx + 1;
        stats.lines_seen += 1;
        // A row with no precinct or no choice cannot form a full key.
        if row.precinct.trim().is_empty() || row.choice.trim().is_empty() {
            stats.missing_context += 1;
            observer.event(ScanEvent::MissingContext {
                line_no,
                line: format!("{:?}", row),
            });
            continue;
        }
        if profile
            .excluded_vote_types
            .iter()
            .any(|v| v == row.vote_type.trim())
        {
            continue;
        }

        let (office, comma_district) = normalize::normalize_office(&row.contest);
        let district = normalize::district_from(&row.contest).or(comma_district);
        let contest_party = normalize::party_from_contest(&row.contest);

        let (name, paren_party) = normalize::resolve_party(row.choice.trim());
        let candidate = normalize::strip_party_prefix(&name);
        let party = contest_party.or(paren_party);

        let key = RecordKey {
            county: county.to_string(),
            precinct: row.precinct.trim().to_string(),
            office,
            district,
            party,
            candidate: candidate.clone(),
        };
        if row.vote_type.trim() == VOTES_ONLY || row.choice.trim() == "Registered Voters" {
            store.ingest_votes_only(key, row.votes);
        } else {
            store.ingest(key, row.vote_type.trim(), row.votes);
        }
        stats.records += 1;
        observer.event(ScanEvent::RecordIngested {
            line_no,
            candidate,
        });
    }

    info!(
        "tree scan done: {} rows, {} records",
        stats.lines_seen,
        store.len()
    );
    Ok(ScanOutcome {
        records: store,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CountingObserver;

    fn lines(doc: &str) -> Vec<String> {
        doc.lines().map(|l| l.to_string()).collect()
    }

    const COLLIN_DOC: &str = "\
General Election Canvass Report
PCT 001
Statistics TOTAL
Registered Voters - Total 1,917
Ballots Cast - Total 1,561 190 1,301 66 4 0
President/Vice President
Vote For 1
Rep Donald J. Trump/JD Vance 1,036 66.37% 119 886 30 1 0
Dem Kamala D. Harris/Tim Walz 501 32.10% 67 399 34 1 0
Lib Chase Oliver/Mike ter Maat 11 0.70% 2 9 0 0 0
Sheriff
Vote For 1
Rep Jim Skinner 1,124 73.01% 131 957 34 2 0
Dem Chris Coleman 415 26.99% 55 330 29 1 0
PCT 002
Registered Voters - Total 2,000
Sheriff
Vote For 1
Rep Jim Skinner 900 60.00% 100 770 28 2 0
";

    #[test]
    fn full_line_scan_over_collin_document() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let outcome =
            run_line_scan(&lines(COLLIN_DOC), "Collin", &profile, &mut obs).unwrap();

        // 3 president + 2 sheriff in PCT 001, 1 sheriff in PCT 002,
        // plus registered voters in both and ballots cast in the first.
        assert_eq!(outcome.records.len(), 6 + 2 + 1);

        let table = emit_table(outcome.records, &profile);
        let trump = table
            .rows
            .iter()
            .find(|r| r[5].contains("Trump"))
            .unwrap();
        assert_eq!(trump[0], "Collin");
        assert_eq!(trump[1], "PCT 001");
        assert_eq!(trump[2], "President");
        assert_eq!(trump[4], "Rep");
        assert_eq!(trump[6], "1036");

        let registered: Vec<_> = table
            .rows
            .iter()
            .filter(|r| r[2] == "Registered Voters")
            .collect();
        assert_eq!(registered.len(), 2);
        // Bare totals leave the method cells empty.
        assert!(registered.iter().all(|r| r[7..].iter().all(|c| c.is_empty())));
    }

    #[test]
    fn unrecognized_lines_are_counted_not_fatal() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let doc = "\
PCT 001
Sheriff
Rep Jim Skinner 1,124 73.01% 131 957 34 2 0
zzz this is line noise zzz
";
        let outcome = run_line_scan(&lines(doc), "Collin", &profile, &mut obs).unwrap();
        assert_eq!(outcome.stats.unclassified, 1);
        assert_eq!(obs.unclassified(), 1);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn vote_line_before_any_office_is_missing_context() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let doc = "\
PCT 001
Rep Jim Skinner 1,124 73.01% 131 957 34 2 0
";
        let outcome = run_line_scan(&lines(doc), "Collin", &profile, &mut obs).unwrap();
        assert_eq!(outcome.stats.missing_context, 1);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn empty_document_is_an_error() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let res = run_line_scan(&[], "Collin", &profile, &mut obs);
        assert_eq!(res.unwrap_err(), ScanError::EmptyInput);
    }

    #[test]
    fn repeated_summary_blocks_do_not_duplicate_statistics() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let doc = "\
PCT 001
Registered Voters - Total 1,917
Registered Voters - Total 1,917
";
        let outcome = run_line_scan(&lines(doc), "Collin", &profile, &mut obs).unwrap();
        assert_eq!(outcome.records.len(), 1);
        // The suppressed repeat is not counted as a stored record.
        assert_eq!(outcome.stats.records, 1);
    }

    #[test]
    fn short_party_line_is_unclassified_with_zero_records() {
        let profile = VendorProfile::collin();
        let mut obs = CountingObserver::new();
        let doc = "\
PCT 001
Sheriff
Rep John Smith 10 2 8
";
        let outcome = run_line_scan(&lines(doc), "Collin", &profile, &mut obs).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.unclassified, 1);
        assert_eq!(outcome.stats.malformed, 0);
        assert_eq!(obs.unclassified(), 1);
    }

    #[test]
    fn identical_documents_render_identically() {
        let profile = VendorProfile::collin();
        let render = || {
            let mut obs = CountingObserver::new();
            let outcome =
                run_line_scan(&lines(COLLIN_DOC), "Collin", &profile, &mut obs).unwrap();
            emit_table(outcome.records, &profile)
        };
        assert_eq!(render(), render());
    }

    fn tree_row(
        precinct: &str,
        contest: &str,
        choice: &str,
        vote_type: &str,
        votes: u64,
    ) -> TreeRow {
        TreeRow {
            precinct: precinct.to_string(),
            contest: contest.to_string(),
            choice: choice.to_string(),
            vote_type: vote_type.to_string(),
            votes,
        }
    }

    #[test]
    fn tree_scan_applies_normalizer_and_exclusions() {
        let profile = VendorProfile::clarity();
        let mut obs = CountingObserver::new();
        let rows = vec![
            tree_row(
                "Precinct 12",
                "State Representative, District 14 - REP",
                "REP Angela Tucker",
                "Election Day",
                321,
            ),
            tree_row(
                "Precinct 12",
                "State Representative, District 14 - REP",
                "REP Angela Tucker",
                "Overvotes",
                2,
            ),
            tree_row("", "Sheriff", "Nobody", "Election Day", 1),
        ];
        let outcome = run_tree_scan(&rows, "Denton", &profile, &mut obs).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.missing_context, 1);

        let records = outcome.records.into_sorted();
        assert_eq!(records[0].key.office, "State Representative");
        assert_eq!(records[0].key.district.as_deref(), Some("14"));
        assert_eq!(records[0].key.party.as_deref(), Some("REP"));
        assert_eq!(records[0].key.candidate, "Angela Tucker");
        assert_eq!(records[0].tallies["Election Day"], 321);
    }

    #[test]
    fn tree_scan_double_independent_marker() {
        let profile = VendorProfile::clarity();
        let mut obs = CountingObserver::new();
        let rows = vec![tree_row(
            "Precinct 3",
            "County Commissioner",
            "Jane Doe (I)(I)",
            "Election Day",
            44,
        )];
        let outcome = run_tree_scan(&rows, "Denton", &profile, &mut obs).unwrap();
        let records = outcome.records.into_sorted();
        assert_eq!(records[0].key.candidate, "Jane Doe");
        assert_eq!(records[0].key.party.as_deref(), Some("I"));
    }
}
