// The line-classification cascade.
//
// Each line is tested against a fixed priority order of patterns:
// statistics, over/under-votes, write-in totals, partisan candidates
// (strict regex first, then progressively more permissive fallbacks),
// non-partisan candidates, propositions. A fallback never yields a
// classification with fewer numeric fields than the profile requires;
// such lines stay unrecognized.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::context::ParseContext;
use crate::profile::{CandidateLayout, VendorProfile};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum StatKind {
    RegisteredVoters,
    BallotsCast,
    BlankBallots,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum OverUnderKind {
    Overvotes,
    Undervotes,
}

/// A successfully classified line. Counts are ordered as declared by the
/// profile's `method_columns`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LineClass {
    Statistic {
        kind: StatKind,
        total: u64,
        methods: Vec<u64>,
    },
    OverUnder {
        kind: OverUnderKind,
        total: u64,
        methods: Vec<u64>,
    },
    Candidate {
        party: Option<String>,
        candidate: String,
        total: u64,
        methods: Vec<u64>,
    },
    Proposition {
        choice: String,
        total: u64,
        methods: Vec<u64>,
    },
    /// Column-header or summary noise named by the profile's skip terms.
    Noise,
}

/// Why a line failed to classify, for the event stream.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ClassifyFailure {
    Unrecognized,
    /// A pattern anchored but its numeric payload was short or unparsable.
    MalformedNumericField,
}

lazy_static! {
    static ref REGISTERED_RX: Regex =
        Regex::new(r"Registered Voters - Total\s+([\d,]+)").unwrap();
    static ref BALLOTS_RX: Regex = Regex::new(r"Ballots Cast - Total\s+(.+)$").unwrap();
    static ref BLANK_RX: Regex = Regex::new(r"Ballots Cast - Blank\s+(.+)$").unwrap();
    static ref OVER_RX: Regex = Regex::new(r"^Overvotes:?\s+(.+)$").unwrap();
    static ref UNDER_RX: Regex = Regex::new(r"^Undervotes:?\s+(.+)$").unwrap();
    static ref WRITE_IN_RX: Regex = Regex::new(r"^Write-In Totals\s+(.+)$").unwrap();
    static ref COUNT_TOKEN_RX: Regex = Regex::new(r"^[\d,]+$").unwrap();
    static ref PERCENT_TOKEN_RX: Regex = Regex::new(r"^[\d.,]+%$").unwrap();
}

/// Parses a comma-grouped count such as `1,053`.
pub fn parse_count(token: &str) -> Option<u64> {
    token.replace(',', "").parse::<u64>().ok()
}

/// All count tokens in the text, percentage tokens skipped.
pub fn count_fields(text: &str) -> Vec<u64> {
    text.split_whitespace()
        .filter(|t| COUNT_TOKEN_RX.is_match(t))
        .filter_map(parse_count)
        .collect()
}

/// The classifier, with the profile-dependent patterns compiled once.
pub struct LineCascade {
    profile: VendorProfile,
    strict_candidate: Regex,
    relaxed_candidate: Regex,
    nonpartisan: Regex,
    proposition: Regex,
}

impl LineCascade {
    pub fn new(profile: &VendorProfile) -> LineCascade {
        let tokens = profile
            .party_tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<String>>()
            .join("|");
        let n = profile.method_columns.len();

        let strict_candidate = match &profile.candidate_layout {
            CandidateLayout::PartyLeading {
                percentage_after_total,
            } => {
                let pct = if *percentage_after_total {
                    r"\s+[\d.]+%"
                } else {
                    ""
                };
                let methods = if n > 0 {
                    format!(r"((?:\s+[\d,]+){{{}}})", n)
                } else {
                    String::new()
                };
                Regex::new(&format!(
                    r"^({})\s+(.+?)\s+([\d,]+){}{}$",
                    tokens, pct, methods
                ))
                .unwrap()
            }
            CandidateLayout::PartyTrailing => {
                let methods = format!(r"((?:[\d,]+\s+[\d.]+%\s+){{{}}})", n);
                Regex::new(&format!(
                    r"^(.+?)\s+({})\s+{}([\d,]+)\s+[\d.]+%",
                    tokens, methods
                ))
                .unwrap()
            }
        };

        // Fallback (a): keep the party anchor, loosen everything after.
        let relaxed_candidate = Regex::new(&format!(r"^({})\s+(.+)$", tokens)).unwrap();

        // Non-partisan races carry no party token; the name runs until
        // the first count.
        let nonpartisan = Regex::new(r"^([A-Za-z][^0-9%]+?)((?:\s+[\d,]+)+)$").unwrap();

        let proposition =
            Regex::new(r"^(For|Against|FOR|AGAINST|YES|NO|Yes|No)\s+(.+)$").unwrap();

        LineCascade {
            profile: profile.clone(),
            strict_candidate,
            relaxed_candidate,
            nonpartisan,
            proposition,
        }
    }

    /// Classifies one line against the cascade, in priority order.
    pub fn classify(
        &self,
        line: &str,
        ctx: &ParseContext,
    ) -> Result<LineClass, ClassifyFailure> {
        if let Some(res) = self.try_statistics(line) {
            return res;
        }
        if let Some(res) = self.try_over_under(line) {
            return res;
        }
        if let Some(res) = self.try_write_in_totals(line) {
            return res;
        }
        if self.is_noise(line) {
            return Ok(LineClass::Noise);
        }
        if let Some(res) = self.try_candidate(line) {
            return res;
        }
        if let Some(res) = self.try_proposition(line, ctx) {
            return res;
        }
        if let Some(res) = self.try_nonpartisan(line, ctx) {
            return res;
        }
        Err(ClassifyFailure::Unrecognized)
    }

    fn is_noise(&self, line: &str) -> bool {
        self.profile
            .skip_terms
            .iter()
            .any(|t| line.contains(t.as_str()))
    }

    /// Splits a run of counts into (total, methods) according to the
    /// layout: leading layouts report the total first, trailing layouts
    /// report it last.
    fn split_total(&self, numbers: &[u64]) -> Option<(u64, Vec<u64>)> {
        let n = self.profile.method_columns.len();
        if numbers.len() < self.profile.min_numeric_fields() {
            return None;
        }
        match self.profile.candidate_layout {
            CandidateLayout::PartyLeading { .. } => {
                Some((numbers[0], numbers[1..n + 1].to_vec()))
            }
            CandidateLayout::PartyTrailing => Some((numbers[n], numbers[..n].to_vec())),
        }
    }

    fn try_statistics(&self, line: &str) -> Option<Result<LineClass, ClassifyFailure>> {
        if let Some(caps) = REGISTERED_RX.captures(line) {
            return Some(match parse_count(&caps[1]) {
                Some(total) => Ok(LineClass::Statistic {
                    kind: StatKind::RegisteredVoters,
                    total,
                    methods: vec![],
                }),
                None => Err(ClassifyFailure::MalformedNumericField),
            });
        }
        for (rx, kind) in [
            (&*BALLOTS_RX, StatKind::BallotsCast),
            (&*BLANK_RX, StatKind::BlankBallots),
        ] {
            if let Some(caps) = rx.captures(line) {
                let numbers = count_fields(&caps[1]);
                return Some(match self.split_total(&numbers) {
                    Some((total, methods)) => Ok(LineClass::Statistic {
                        kind,
                        total,
                        methods,
                    }),
                    None => Err(ClassifyFailure::MalformedNumericField),
                });
            }
        }
        None
    }

    fn try_over_under(&self, line: &str) -> Option<Result<LineClass, ClassifyFailure>> {
        for (rx, kind) in [
            (&*OVER_RX, OverUnderKind::Overvotes),
            (&*UNDER_RX, OverUnderKind::Undervotes),
        ] {
            if let Some(caps) = rx.captures(line) {
                let numbers = count_fields(&caps[1]);
                return Some(match self.split_total(&numbers) {
                    Some((total, methods)) => Ok(LineClass::OverUnder {
                        kind,
                        total,
                        methods,
                    }),
                    None => Err(ClassifyFailure::MalformedNumericField),
                });
            }
        }
        None
    }

    fn try_write_in_totals(&self, line: &str) -> Option<Result<LineClass, ClassifyFailure>> {
        let caps = WRITE_IN_RX.captures(line)?;
        let numbers = count_fields(&caps[1]);
        Some(match self.split_total(&numbers) {
            Some((total, methods)) => Ok(LineClass::Candidate {
                party: None,
                candidate: "Write-In Totals".to_string(),
                total,
                methods,
            }),
            None => Err(ClassifyFailure::MalformedNumericField),
        })
    }

    fn try_candidate(&self, line: &str) -> Option<Result<LineClass, ClassifyFailure>> {
        if let Some(cand) = self.candidate_strict(line) {
            return Some(Ok(cand));
        }
        // Only lines anchored by a party token reach the fallbacks.
        if !self.has_party_anchor(line) {
            return None;
        }
        debug!("candidate fallbacks for line: {:?}", line);
        for extract in [
            LineCascade::candidate_relaxed,
            LineCascade::candidate_positional,
            LineCascade::candidate_token_seek,
        ] {
            if let Some(cand) = extract(self, line) {
                return Some(Ok(cand));
            }
        }
        // No fallback produced the minimum numeric payload: no pattern
        // matched this line, so it is unclassified, not malformed.
        Some(Err(ClassifyFailure::Unrecognized))
    }

    fn has_party_anchor(&self, line: &str) -> bool {
        match self.profile.candidate_layout {
            CandidateLayout::PartyLeading { .. } => self
                .profile
                .party_tokens
                .iter()
                .any(|p| line.starts_with(&format!("{} ", p))),
            CandidateLayout::PartyTrailing => self
                .profile
                .party_tokens
                .iter()
                .any(|p| line.contains(&format!(" {} ", p))),
        }
    }

    fn candidate_strict(&self, line: &str) -> Option<LineClass> {
        let caps = self.strict_candidate.captures(line)?;
        match self.profile.candidate_layout {
            CandidateLayout::PartyLeading { .. } => {
                let total = parse_count(&caps[3])?;
                let methods_text = caps.get(4).map(|m| m.as_str()).unwrap_or("");
                let methods: Vec<u64> = count_fields(methods_text);
                if methods.len() != self.profile.method_columns.len() {
                    return None;
                }
                Some(LineClass::Candidate {
                    party: Some(caps[1].to_string()),
                    candidate: normalize_candidate(&caps[2]),
                    total,
                    methods,
                })
            }
            CandidateLayout::PartyTrailing => {
                let methods: Vec<u64> = count_fields(&caps[3]);
                if methods.len() != self.profile.method_columns.len() {
                    return None;
                }
                let total = parse_count(&caps[4])?;
                Some(LineClass::Candidate {
                    party: Some(caps[2].to_string()),
                    candidate: normalize_candidate(&caps[1]),
                    total,
                    methods,
                })
            }
        }
    }

    /// Fallback (a): party anchor kept, percentage and whitespace
    /// assumptions dropped. The name is everything up to the first count.
    fn candidate_relaxed(&self, line: &str) -> Option<LineClass> {
        let caps = self.relaxed_candidate.captures(line)?;
        let party = caps[1].to_string();
        let rest = &caps[2];
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let first_num = parts
            .iter()
            .position(|t| COUNT_TOKEN_RX.is_match(t) || PERCENT_TOKEN_RX.is_match(t))?;
        if first_num == 0 {
            return None;
        }
        let candidate = parts[..first_num].join(" ");
        let numbers = count_fields(rest);
        let (total, methods) = self.split_total(&numbers)?;
        Some(LineClass::Candidate {
            party: Some(party),
            candidate: normalize_candidate(&candidate),
            total,
            methods,
        })
    }

    /// Fallback (b): locate the percentage token and read counts around
    /// it positionally. Only meaningful when the party leads the line.
    fn candidate_positional(&self, line: &str) -> Option<LineClass> {
        if self.profile.candidate_layout == CandidateLayout::PartyTrailing {
            return None;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let n = self.profile.method_columns.len();
        let pct_idx = parts.iter().position(|t| PERCENT_TOKEN_RX.is_match(t))?;
        if pct_idx < 2 || parts.len() < pct_idx + 1 + n {
            return None;
        }
        let total = parse_count(parts[pct_idx - 1])?;
        let methods: Vec<u64> = parts[pct_idx + 1..pct_idx + 1 + n]
            .iter()
            .map(|t| parse_count(t))
            .collect::<Option<Vec<u64>>>()?;
        let candidate = parts[1..pct_idx - 1].join(" ");
        if candidate.is_empty() {
            return None;
        }
        Some(LineClass::Candidate {
            party: Some(parts[0].to_string()),
            candidate: normalize_candidate(&candidate),
            total,
            methods,
        })
    }

    /// Fallback (c): find the first recognizable party token anywhere and
    /// treat everything between it and the first count as the name.
    fn candidate_token_seek(&self, line: &str) -> Option<LineClass> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let party_idx = parts
            .iter()
            .position(|t| self.profile.party_tokens.iter().any(|p| p == t))?;
        let after = &parts[party_idx + 1..];
        let first_num = after
            .iter()
            .position(|t| COUNT_TOKEN_RX.is_match(t) || PERCENT_TOKEN_RX.is_match(t))?;
        let candidate = match self.profile.candidate_layout {
            CandidateLayout::PartyLeading { .. } => after[..first_num].join(" "),
            CandidateLayout::PartyTrailing => parts[..party_idx].join(" "),
        };
        if candidate.is_empty() {
            return None;
        }
        let numbers = count_fields(&after.join(" "));
        let (total, methods) = self.split_total(&numbers)?;
        Some(LineClass::Candidate {
            party: Some(parts[party_idx].to_string()),
            candidate: normalize_candidate(&candidate),
            total,
            methods,
        })
    }

    /// Non-partisan candidate lines, gated on the active office being a
    /// board/school-district style contest.
    fn try_nonpartisan(
        &self,
        line: &str,
        ctx: &ParseContext,
    ) -> Option<Result<LineClass, ClassifyFailure>> {
        let office = ctx.current_office.as_ref()?;
        let gated = self
            .profile
            .nonpartisan_markers
            .iter()
            .any(|m| office.raw.contains(m.as_str()));
        if !gated {
            return None;
        }
        let caps = self.nonpartisan.captures(line)?;
        let numbers = count_fields(&caps[2]);
        Some(match self.split_total(&numbers) {
            Some((total, methods)) => Ok(LineClass::Candidate {
                party: None,
                candidate: normalize_candidate(&caps[1]),
                total,
                methods,
            }),
            None => Err(ClassifyFailure::MalformedNumericField),
        })
    }

    /// For/Against and YES/NO lines, gated on a proposition office.
    fn try_proposition(
        &self,
        line: &str,
        ctx: &ParseContext,
    ) -> Option<Result<LineClass, ClassifyFailure>> {
        let office = ctx.current_office.as_ref()?;
        let gated = self
            .profile
            .proposition_markers
            .iter()
            .any(|m| office.raw.contains(m.as_str()));
        if !gated {
            return None;
        }
        let caps = self.proposition.captures(line)?;
        let numbers = count_fields(&caps[2]);
        Some(match self.split_total(&numbers) {
            Some((total, methods)) => Ok(LineClass::Proposition {
                choice: caps[1].to_string(),
                total,
                methods,
            }),
            None => Err(ClassifyFailure::MalformedNumericField),
        })
    }
}

/// Collapses the vendor's write-in spellings into the canonical label.
fn normalize_candidate(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("Write-In") {
        "Write-In Totals".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextTracker, ParseContext};
    use crate::profile::VendorProfile;

    fn ctx_with_office(profile: &VendorProfile, precinct: &str, office: &str) -> ParseContext {
        let tracker = ContextTracker::new(profile);
        let mut ctx = ParseContext::new();
        tracker.observe(&mut ctx, precinct);
        tracker.observe(&mut ctx, office);
        assert!(ctx.current_office.is_some(), "office header not recognized");
        ctx
    }

    #[test]
    fn registered_voters_single_total() {
        let profile = VendorProfile::fort_bend();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("Registered Voters - Total 1,053", &ctx),
            Ok(LineClass::Statistic {
                kind: StatKind::RegisteredVoters,
                total: 1053,
                methods: vec![],
            })
        );
    }

    #[test]
    fn ballots_cast_with_breakdown() {
        let profile = VendorProfile::fort_bend();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("Ballots Cast - Total 2,584 332 104 2,148", &ctx),
            Ok(LineClass::Statistic {
                kind: StatKind::BallotsCast,
                total: 2584,
                methods: vec![332, 104, 2148],
            })
        );
    }

    #[test]
    fn strict_candidate_with_percentage() {
        let profile = VendorProfile::collin();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify(
                "Rep Donald J. Trump/JD Vance 1,036 54.07% 119 886 30 1 0",
                &ctx
            ),
            Ok(LineClass::Candidate {
                party: Some("Rep".to_string()),
                candidate: "Donald J. Trump/JD Vance".to_string(),
                total: 1036,
                methods: vec![119, 886, 30, 1, 0],
            })
        );
    }

    #[test]
    fn strict_candidate_without_percentage() {
        let profile = VendorProfile::electionware();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("REP Donald J. Trump/JD Vance 619 14 518 87", &ctx),
            Ok(LineClass::Candidate {
                party: Some("REP".to_string()),
                candidate: "Donald J. Trump/JD Vance".to_string(),
                total: 619,
                methods: vec![14, 518, 87],
            })
        );
    }

    #[test]
    fn trailing_party_layout() {
        let profile = VendorProfile::greenbox();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify(
                "Kamala D. Harris DEM 101 25.0% 202 25.0% 303 25.0% 606 25.0%",
                &ctx
            ),
            Ok(LineClass::Candidate {
                party: Some("DEM".to_string()),
                candidate: "Kamala D. Harris".to_string(),
                total: 606,
                methods: vec![101, 202, 303],
            })
        );
    }

    #[test]
    fn fallback_recovers_irregular_spacing() {
        let profile = VendorProfile::collin();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        // Missing percentage column defeats the strict pattern.
        let got = cascade.classify("Lib Ross Lynn Leone, Jr. 12 3 7 1 1 0", &ctx);
        assert_eq!(
            got,
            Ok(LineClass::Candidate {
                party: Some("Lib".to_string()),
                candidate: "Ross Lynn Leone, Jr.".to_string(),
                total: 12,
                methods: vec![3, 7, 1, 1, 0],
            })
        );
    }

    #[test]
    fn too_few_counts_is_unclassified_not_fatal() {
        let profile = VendorProfile::collin();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        // A known party token but only three trailing counts (minimum is
        // six for this profile): no pattern matches, the line stays
        // unclassified.
        assert_eq!(
            cascade.classify("Rep John Smith 10 2 8", &ctx),
            Err(ClassifyFailure::Unrecognized)
        );
    }

    #[test]
    fn minimum_numeric_fields_gates_the_fallbacks() {
        let profile = VendorProfile::electionware();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        // Three methods plus the total: exactly at the minimum.
        assert!(cascade.classify("REP John Smith 10 2 8 0", &ctx).is_ok());
        // One count short of the minimum.
        assert_eq!(
            cascade.classify("REP John Smith 10 2 8", &ctx),
            Err(ClassifyFailure::Unrecognized)
        );
    }

    #[test]
    fn unrecognized_line() {
        let profile = VendorProfile::collin();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("This line means nothing", &ctx),
            Err(ClassifyFailure::Unrecognized)
        );
    }

    #[test]
    fn overvotes_and_undervotes() {
        let profile = VendorProfile::electionware();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("Overvotes 0 0 0 0", &ctx),
            Ok(LineClass::OverUnder {
                kind: OverUnderKind::Overvotes,
                total: 0,
                methods: vec![0, 0, 0],
            })
        );
        assert_eq!(
            cascade.classify("Undervotes 10 2 8 0", &ctx),
            Ok(LineClass::OverUnder {
                kind: OverUnderKind::Undervotes,
                total: 10,
                methods: vec![2, 8, 0],
            })
        );
    }

    #[test]
    fn greenbox_undervotes_total_last() {
        let profile = VendorProfile::greenbox();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("Undervotes: 1 2 3 6", &ctx),
            Ok(LineClass::OverUnder {
                kind: OverUnderKind::Undervotes,
                total: 6,
                methods: vec![1, 2, 3],
            })
        );
    }

    #[test]
    fn proposition_gated_on_office() {
        let profile = VendorProfile::electionware_pct();
        let cascade = LineCascade::new(&profile);
        let ctx = ctx_with_office(&profile, "Pct # 1 Three Corners", "Proposition A");
        assert_eq!(
            cascade.classify("For 120 30 60 30", &ctx),
            Ok(LineClass::Proposition {
                choice: "For".to_string(),
                total: 120,
                methods: vec![30, 60, 30],
            })
        );
        // Same line outside a proposition office stays unclassified.
        let plain = ctx_with_office(&profile, "Pct # 1 Three Corners", "Sheriff");
        assert_eq!(
            cascade.classify("For 120 30 60 30", &plain),
            Err(ClassifyFailure::Unrecognized)
        );
    }

    #[test]
    fn nonpartisan_gated_on_office_category() {
        let profile = VendorProfile::electionware_pct();
        let cascade = LineCascade::new(&profile);
        let ctx = ctx_with_office(
            &profile,
            "Evadale ISD",
            "Board of Trustees Evadale ISD",
        );
        assert_eq!(
            cascade.classify("Sara Ortiz 57 3 40 14", &ctx),
            Ok(LineClass::Candidate {
                party: None,
                candidate: "Sara Ortiz".to_string(),
                total: 57,
                methods: vec![3, 40, 14],
            })
        );
    }

    #[test]
    fn write_in_totals_line() {
        let profile = VendorProfile::fort_bend();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("Write-In Totals 12 0.47% 3 0 9", &ctx),
            Ok(LineClass::Candidate {
                party: None,
                candidate: "Write-In Totals".to_string(),
                total: 12,
                methods: vec![3, 0, 9],
            })
        );
    }

    #[test]
    fn skip_terms_are_noise() {
        let profile = VendorProfile::collin();
        let cascade = LineCascade::new(&profile);
        let ctx = ParseContext::new();
        assert_eq!(
            cascade.classify("TOTAL Election Day Early Voting", &ctx),
            Ok(LineClass::Noise)
        );
    }
}
