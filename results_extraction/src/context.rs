// Positional context carried across lines.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::normalize;
use crate::profile::{PrecinctPattern, VendorProfile};

/// Per-precinct singleton statistics. Tracked so that a vendor repeating
/// its summary block does not emit the same figure twice.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum StatFlag {
    RegisteredVoters,
    BallotsCast,
    BlankBallots,
}

/// The contest currently in scope, with its already-extracted district
/// and any party encoded in the header itself.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OfficeContext {
    pub raw: String,
    pub office: String,
    pub district: Option<String>,
    pub party: Option<String>,
}

/// Transient scan state, created once per document.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParseContext {
    pub current_precinct: Option<String>,
    pub current_office: Option<OfficeContext>,
    per_precinct_flags: HashSet<StatFlag>,
}

impl ParseContext {
    pub fn new() -> ParseContext {
        ParseContext::default()
    }

    /// Marks a singleton statistic as recorded for the current precinct.
    /// Returns false if it had already been recorded.
    pub fn mark_stat(&mut self, flag: StatFlag) -> bool {
        self.per_precinct_flags.insert(flag)
    }

    fn enter_precinct(&mut self, precinct: String) {
        self.current_precinct = Some(precinct);
        self.per_precinct_flags.clear();
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ContextUpdate {
    /// A new precinct header. The turnout pair is `(ballots_cast,
    /// registered_voters)` when the header carries the summary inline.
    Precinct {
        precinct: String,
        turnout: Option<(u64, u64)>,
    },
    Office(OfficeContext),
}

lazy_static! {
    static ref NUMERIC_CODE_RX: Regex = Regex::new(r"^(\d+)(?:\s*-\s*(\d+))?$").unwrap();
    static ref TURNOUT_RX: Regex = Regex::new(
        r"^(\d+?(?:\s*-\s*[\w\s]+?)?)\s+([\d,]+)\s+of\s+([\d,]+)\s+registered\s+voters"
    )
    .unwrap();
    static ref TRAILING_COUNTS_RX: Regex =
        Regex::new(r"^[A-Za-z].+?\s+\d+\s+\d+\s+\d+\s+\d+$").unwrap();
}

/// Recognizes precinct and office headers and mutates the context
/// accordingly. Pure function of the line plus accumulated state.
pub struct ContextTracker<'a> {
    profile: &'a VendorProfile,
}

impl<'a> ContextTracker<'a> {
    pub fn new(profile: &'a VendorProfile) -> ContextTracker<'a> {
        ContextTracker { profile }
    }

    /// Tests the line against the precinct patterns, then the office
    /// indicators. Returns the applied update, if any.
    pub fn observe(&self, ctx: &mut ParseContext, line: &str) -> Option<ContextUpdate> {
        if let Some((precinct, turnout)) = self.match_precinct(ctx, line) {
            ctx.enter_precinct(precinct.clone());
            return Some(ContextUpdate::Precinct { precinct, turnout });
        }
        if let Some(office) = self.match_office(line) {
            ctx.current_office = Some(office.clone());
            return Some(ContextUpdate::Office(office));
        }
        None
    }

    fn match_precinct(&self, ctx: &ParseContext, line: &str) -> Option<(String, Option<(u64, u64)>)> {
        for pattern in &self.profile.precinct_patterns {
            match pattern {
                PrecinctPattern::Prefixed {
                    prefix,
                    numeric_code,
                } => {
                    if let Some(rest) = line.strip_prefix(prefix.as_str()) {
                        let rest = rest.trim();
                        if rest.is_empty() {
                            continue;
                        }
                        if *numeric_code && !rest.chars().all(|c| c.is_ascii_digit()) {
                            continue;
                        }
                        return Some((line.trim().to_string(), None));
                    }
                }
                PrecinctPattern::NumericCode => {
                    if let Some(caps) = NUMERIC_CODE_RX.captures(line) {
                        let precinct = match caps.get(2) {
                            Some(sub) => format!("Precinct {}-{}", &caps[1], sub.as_str()),
                            None => format!("Precinct {}", &caps[1]),
                        };
                        return Some((precinct, None));
                    }
                }
                PrecinctPattern::TurnoutSummary => {
                    if let Some(caps) = TURNOUT_RX.captures(line) {
                        let ballots = crate::cascade::parse_count(&caps[2])?;
                        let registered = crate::cascade::parse_count(&caps[3])?;
                        return Some((
                            caps[1].trim().to_string(),
                            Some((ballots, registered)),
                        ));
                    }
                }
                PrecinctPattern::SuffixKeyword { suffixes } => {
                    // A contest header can also end in the suffix
                    // ("Board of Trustees Evadale ISD"); those stay
                    // offices.
                    if suffixes.iter().any(|s| line.ends_with(s.as_str()))
                        && !self.contains_office_indicator(line)
                    {
                        return Some((line.trim().to_string(), None));
                    }
                }
                PrecinctPattern::ShortLineHeuristic { max_words } => {
                    if ctx.current_precinct.is_none()
                        && self.plausible_precinct_name(line, *max_words)
                    {
                        return Some((line.trim().to_string(), None));
                    }
                }
            }
        }
        None
    }

    /// Short line, no vote-count trailer, no known office keyword, no
    /// party token, not a proposition choice.
    fn plausible_precinct_name(&self, line: &str, max_words: usize) -> bool {
        if line.split_whitespace().count() > max_words {
            return false;
        }
        let lower = line.to_lowercase();
        let noise = [
            "statistics",
            "total",
            "absentee",
            "early",
            "voting",
            "day",
            "vote for",
            "overvotes",
            "undervotes",
        ];
        if noise.iter().any(|t| lower.contains(t)) {
            return false;
        }
        if self
            .profile
            .party_tokens
            .iter()
            .any(|p| line.starts_with(&format!("{} ", p)))
        {
            return false;
        }
        if line.starts_with("For ") || line.starts_with("Against ") {
            return false;
        }
        if TRAILING_COUNTS_RX.is_match(line) {
            return false;
        }
        if self.contains_office_indicator(line) {
            return false;
        }
        true
    }

    fn contains_office_indicator(&self, line: &str) -> bool {
        self.profile
            .office_indicators
            .iter()
            .any(|ind| line.contains(ind.as_str()))
    }

    fn match_office(&self, line: &str) -> Option<OfficeContext> {
        let indicator_hit = self
            .profile
            .office_indicators
            .iter()
            .any(|ind| line.contains(ind.as_str()));
        if !indicator_hit {
            return None;
        }
        // A candidate or summary line can mention an office keyword;
        // those never become headers.
        if self
            .profile
            .skip_terms
            .iter()
            .any(|t| line.contains(t.as_str()))
        {
            return None;
        }
        if self
            .profile
            .party_tokens
            .iter()
            .any(|p| line.starts_with(&format!("{} ", p)))
        {
            return None;
        }

        let (office, comma_district) = normalize::normalize_office(line);
        // The inline extractors run first; the comma-suffix derivation
        // is the fallback.
        let district = normalize::district_from(line).or(comma_district);
        Some(OfficeContext {
            raw: line.trim().to_string(),
            office,
            district,
            party: normalize::party_from_contest(line),
        })
    }
}
