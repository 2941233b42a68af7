// Reading and validating JSON vendor profiles.
//
// The JSON schema mirrors the library's `VendorProfile`, with camelCase
// field names. Builtin profiles are resolved by name first; anything
// else is treated as a file path.

use snafu::{prelude::*, whatever};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use results_extraction::profile::{
    CandidateLayout, PrecinctPattern, TotalsPolicy, VendorProfile,
};

use crate::extract::{ExtractResult, OpeningInputSnafu, ParsingJsonSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PrecinctPatternConfig {
    pub kind: String,
    pub prefix: Option<String>,
    #[serde(rename = "numericCode")]
    pub numeric_code: Option<bool>,
    pub suffixes: Option<Vec<String>>,
    #[serde(rename = "maxWords")]
    pub max_words: Option<usize>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TotalsPolicyConfig {
    pub kind: String,
    pub method: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    #[serde(rename = "officeIndicators")]
    pub office_indicators: Vec<String>,
    #[serde(rename = "skipTerms")]
    pub skip_terms: Option<Vec<String>>,
    #[serde(rename = "methodColumns")]
    pub method_columns: Vec<String>,
    #[serde(rename = "candidateLayout")]
    pub candidate_layout: String,
    #[serde(rename = "precinctPatterns")]
    pub precinct_patterns: Vec<PrecinctPatternConfig>,
    #[serde(rename = "partyTokens")]
    pub party_tokens: Vec<String>,
    #[serde(rename = "nonpartisanMarkers")]
    pub nonpartisan_markers: Option<Vec<String>>,
    #[serde(rename = "propositionMarkers")]
    pub proposition_markers: Option<Vec<String>>,
    #[serde(rename = "totalsPolicy")]
    pub totals_policy: Option<TotalsPolicyConfig>,
    #[serde(rename = "excludedVoteTypes")]
    pub excluded_vote_types: Option<Vec<String>>,
}

/// A builtin profile by name, or a JSON profile loaded from a path.
pub fn resolve_profile(spec: &str) -> ExtractResult<VendorProfile> {
    match spec {
        "electionware" => return Ok(VendorProfile::electionware()),
        "electionware-pct" => return Ok(VendorProfile::electionware_pct()),
        "collin" => return Ok(VendorProfile::collin()),
        "fort-bend" => return Ok(VendorProfile::fort_bend()),
        "greenbox" => return Ok(VendorProfile::greenbox()),
        "clarity" => return Ok(VendorProfile::clarity()),
        _ => {}
    }
    if !Path::new(spec).exists() {
        whatever!(
            "{:?} is neither a builtin profile name nor an existing file",
            spec
        );
    }
    let contents = fs::read_to_string(spec).context(OpeningInputSnafu { path: spec })?;
    let config: ProfileConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path: spec })?;
    validate_profile(&config)
}

/// Checks a parsed configuration and lowers it into the library types.
pub fn validate_profile(config: &ProfileConfig) -> ExtractResult<VendorProfile> {
    let candidate_layout = match config.candidate_layout.as_str() {
        "partyLeading" => CandidateLayout::PartyLeading {
            percentage_after_total: false,
        },
        "partyLeadingPercent" => CandidateLayout::PartyLeading {
            percentage_after_total: true,
        },
        "partyTrailing" => CandidateLayout::PartyTrailing,
        x => {
            whatever!("Unknown candidate layout {:?}", x);
        }
    };

    let mut precinct_patterns = Vec::new();
    for p in &config.precinct_patterns {
        let pattern = match p.kind.as_str() {
            "prefixed" => match &p.prefix {
                Some(prefix) => PrecinctPattern::Prefixed {
                    prefix: prefix.clone(),
                    numeric_code: p.numeric_code.unwrap_or(false),
                },
                None => {
                    whatever!("A 'prefixed' precinct pattern requires a prefix");
                }
            },
            "numericCode" => PrecinctPattern::NumericCode,
            "turnoutSummary" => PrecinctPattern::TurnoutSummary,
            "suffixKeyword" => match &p.suffixes {
                Some(suffixes) if !suffixes.is_empty() => PrecinctPattern::SuffixKeyword {
                    suffixes: suffixes.clone(),
                },
                _ => {
                    whatever!("A 'suffixKeyword' precinct pattern requires suffixes");
                }
            },
            "shortLine" => PrecinctPattern::ShortLineHeuristic {
                max_words: p.max_words.unwrap_or(4),
            },
            x => {
                whatever!("Unknown precinct pattern kind {:?}", x);
            }
        };
        precinct_patterns.push(pattern);
    }

    let totals_policy = match &config.totals_policy {
        None => TotalsPolicy::SumMethods,
        Some(tp) => match tp.kind.as_str() {
            "sumMethods" => TotalsPolicy::SumMethods,
            "singleMethod" => match &tp.method {
                Some(method) => {
                    if !config.method_columns.contains(method) {
                        whatever!(
                            "Totals method {:?} is not one of the configured method columns",
                            method
                        );
                    }
                    TotalsPolicy::SingleMethod(method.clone())
                }
                None => {
                    whatever!("A 'singleMethod' totals policy requires a method name");
                }
            },
            x => {
                whatever!("Unknown totals policy {:?}", x);
            }
        },
    };

    Ok(VendorProfile {
        name: config.name.clone(),
        office_indicators: config.office_indicators.clone(),
        skip_terms: config.skip_terms.clone().unwrap_or_default(),
        method_columns: config.method_columns.clone(),
        candidate_layout,
        precinct_patterns,
        party_tokens: config.party_tokens.clone(),
        nonpartisan_markers: config.nonpartisan_markers.clone().unwrap_or_default(),
        proposition_markers: config.proposition_markers.clone().unwrap_or_default(),
        totals_policy,
        excluded_vote_types: config.excluded_vote_types.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE_JSON: &str = r#"{
        "name": "custom-county",
        "officeIndicators": ["Sheriff", "Proposition"],
        "skipTerms": ["Vote For", "TOTAL"],
        "methodColumns": ["Election Day", "Early Voting"],
        "candidateLayout": "partyLeadingPercent",
        "precinctPatterns": [
            {"kind": "prefixed", "prefix": "PCT ", "numericCode": true},
            {"kind": "numericCode"}
        ],
        "partyTokens": ["Rep", "Dem"],
        "totalsPolicy": {"kind": "singleMethod", "method": "Election Day"}
    }"#;

    #[test]
    fn parses_and_validates_a_json_profile() {
        let config: ProfileConfig = serde_json::from_str(PROFILE_JSON).unwrap();
        let profile = validate_profile(&config).unwrap();
        assert_eq!(profile.name, "custom-county");
        assert_eq!(
            profile.candidate_layout,
            CandidateLayout::PartyLeading {
                percentage_after_total: true
            }
        );
        assert_eq!(profile.precinct_patterns.len(), 2);
        assert_eq!(
            profile.totals_policy,
            TotalsPolicy::SingleMethod("Election Day".to_string())
        );
        assert_eq!(profile.min_numeric_fields(), 3);
    }

    #[test]
    fn rejects_unknown_candidate_layout() {
        let mut config: ProfileConfig = serde_json::from_str(PROFILE_JSON).unwrap();
        config.candidate_layout = "sideways".to_string();
        assert!(validate_profile(&config).is_err());
    }

    #[test]
    fn rejects_totals_method_outside_columns() {
        let mut config: ProfileConfig = serde_json::from_str(PROFILE_JSON).unwrap();
        config.totals_policy = Some(TotalsPolicyConfig {
            kind: "singleMethod".to_string(),
            method: Some("Carrier Pigeon".to_string()),
        });
        assert!(validate_profile(&config).is_err());
    }

    #[test]
    fn builtin_names_resolve() {
        for name in [
            "electionware",
            "electionware-pct",
            "collin",
            "fort-bend",
            "greenbox",
            "clarity",
        ] {
            assert_eq!(resolve_profile(name).unwrap().name, name);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(resolve_profile("no-such-profile").is_err());
    }
}
