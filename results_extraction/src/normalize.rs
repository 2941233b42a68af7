// Office and party normalization.
//
// Both cascades here are explicit ordered tables evaluated first-match
// wins. Ordering is load-bearing: the independent marker `(I)` must be
// recognized before the generic parenthesized-party rule, and the more
// verbose office triggers must come before the shorter ones they
// contain.

use lazy_static::lazy_static;
use regex::Regex;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum OfficeAction {
    /// Replace the raw text with a canonical short name.
    Rename(&'static str),
    /// The raw text is already the best available name.
    Keep,
}

/// Substring triggers mapping verbose ballot language to the canonical
/// office vocabulary.
const OFFICE_RULES: &[(&[&str], OfficeAction)] = &[
    (
        &[
            "President/Vice President",
            "President and Vice President",
            "President/Vice-President",
            "President and Vice-President",
        ],
        OfficeAction::Rename("President"),
    ),
    (
        &["United States Senator", "U.S. Senator", "US Senator", "U. S. Senator"],
        OfficeAction::Rename("U.S. Senate"),
    ),
    (
        &[
            "United States Representative",
            "U.S. Representative",
            "US Representative",
        ],
        OfficeAction::Rename("U.S. House"),
    ),
    (&["State Representative"], OfficeAction::Rename("State Representative")),
    (&["State Senator"], OfficeAction::Rename("State Senate")),
    (
        &["Railroad Commissioner"],
        OfficeAction::Rename("Railroad Commissioner"),
    ),
    (&["Justice, Supreme Court"], OfficeAction::Keep),
    (
        &["Judge,", "Justice,", "Presiding Judge", "District Judge"],
        OfficeAction::Keep,
    ),
    (
        &["Member, State Board of Education", "Member, State BoE"],
        OfficeAction::Rename("State Board of Education"),
    ),
    (
        &["District Attorney", "Dist Attorney"],
        OfficeAction::Rename("District Attorney"),
    ),
    (&["Chief Justice"], OfficeAction::Keep),
    (&["County"], OfficeAction::Keep),
    (&["Sheriff"], OfficeAction::Rename("Sheriff")),
    (&["Constable"], OfficeAction::Keep),
    (&["Board of Trustees", "Board Of Trustees"], OfficeAction::Keep),
    (&["Proposition"], OfficeAction::Keep),
];

lazy_static! {
    // District qualifiers embedded in office headers, in the order they
    // are tried.
    static ref DISTRICT_EXTRACTORS: Vec<Regex> = vec![
        Regex::new(r"District\s+(\d+)").unwrap(),
        Regex::new(r"Precinct\s+No\.\s+(\d+)").unwrap(),
        Regex::new(r"Place\s+(\d+)").unwrap(),
        Regex::new(r"Pct\s+(\d+)").unwrap(),
        Regex::new(r"Pl\s+(\d+)").unwrap(),
        Regex::new(r"Dist\s+(\d+)").unwrap(),
    ];
}

/// Comma-delimited district suffixes (`, District 14`, `, Dist 3`,
/// `, Pl 2`) as rendered inside contest text. A ` - XXX` trailer after
/// the district (usually a party) is dropped.
const COMMA_QUALIFIERS: &[&str] = &[", District", ", Dist", ", Pl "];

/// Extracts a district/place/precinct qualifier from free text, if any.
pub fn district_from(text: &str) -> Option<String> {
    for rx in DISTRICT_EXTRACTORS.iter() {
        if let Some(caps) = rx.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}

/// Canonicalizes a raw office header.
///
/// Returns the canonical office name and the district encoded in the
/// text, if any. Offices matching no rule pass through unchanged.
pub fn normalize_office(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();

    let mut district: Option<String> = None;
    let mut base = raw.to_string();
    for q in COMMA_QUALIFIERS {
        if let Some(idx) = raw.find(q) {
            let mut suffix = raw[idx + q.len()..].trim();
            if let Some(didx) = suffix.find(" - ") {
                suffix = suffix[..didx].trim();
            }
            if !suffix.is_empty() {
                district = Some(suffix.to_string());
                base = raw[..idx].trim().to_string();
            }
            break;
        }
    }

    let mut office = base.clone();
    for (triggers, action) in OFFICE_RULES {
        if triggers.iter().any(|t| base.contains(t)) {
            match action {
                OfficeAction::Rename(canonical) => office = canonical.to_string(),
                OfficeAction::Keep => {}
            }
            break;
        }
    }

    // Senate seats are statewide; a stray qualifier is never a district.
    if office == "U.S. Senate" {
        district = None;
    }
    (office, district)
}

/// Splits a parenthesized party suffix off a candidate name.
///
/// The independent markers are disambiguated before the generic rule:
/// - `Jane Doe (I)(I)` -> (`Jane Doe`, `I`)
/// - `John Smith (I)` -> (`John Smith (I)`, `I`)
/// - `Jane Doe (I) Write-in` -> (`Jane Doe (I) Write-in`, `I`)
/// - `John Smith (REP)` -> (`John Smith`, `REP`)
pub fn resolve_party(candidate_text: &str) -> (String, Option<String>) {
    let candidate = candidate_text.trim();
    if !candidate.contains('(') {
        return (candidate.to_string(), None);
    }
    if candidate.contains("(I)(I)") {
        let name = candidate.split("(I)").next().unwrap_or("").trim();
        return (name.to_string(), Some("I".to_string()));
    }
    if let Some(idx) = candidate.find("(I)") {
        // The marker stays in the name, along with whatever follows it.
        let before = candidate[..idx].trim();
        let after = candidate[idx + 3..].trim_end();
        let name = if after.trim().is_empty() {
            format!("{} (I)", before)
        } else {
            format!("{} (I){}", before, after)
        };
        return (name, Some("I".to_string()));
    }
    match candidate.split_once('(') {
        Some((name, rest)) => {
            let party = rest.replace(')', "").trim().to_string();
            (name.trim().to_string(), Some(party))
        }
        None => (candidate.to_string(), None),
    }
}

/// Party rendered as a literal leading token on the candidate name.
/// The first matching prefix is stripped, at most once.
pub fn strip_party_prefix(candidate_text: &str) -> String {
    let candidate = candidate_text.trim();
    for prefix in ["REP ", "DEM ", "LIB ", "GRN ", "IND "] {
        if let Some(rest) = candidate.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    candidate.to_string()
}

/// Party encoded in the contest text itself, as in primary canvasses
/// (`State Representative, District 14 - REP`).
pub fn party_from_contest(contest_text: &str) -> Option<String> {
    if contest_text.contains("- REP") || contest_text.contains("Republican") {
        Some("REP".to_string())
    } else if contest_text.contains("- DEM") || contest_text.contains("Democrat") {
        Some("DEM".to_string())
    } else {
        None
    }
}
