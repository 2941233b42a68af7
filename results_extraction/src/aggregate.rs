// Record accumulation keyed by the full identity of a tally.

use std::collections::{BTreeMap, BTreeSet};

use crate::profile::TotalsPolicy;

/// Pseudo-method for figures reported as a bare total with no
/// per-method breakdown (registered voters, some turnout summaries).
/// Records carrying it emit empty method cells rather than zeros.
pub const VOTES_ONLY: &str = "votes_only";

/// Identity of one emitted row. Two tallies with the same key merge;
/// everything else stays distinct.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct RecordKey {
    pub county: String,
    pub precinct: String,
    pub office: String,
    pub district: Option<String>,
    pub party: Option<String>,
    pub candidate: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionRecord {
    pub key: RecordKey,
    /// Vote counts per method name. `VOTES_ONLY` is exclusive: a record
    /// either carries it alone or carries real methods.
    pub tallies: BTreeMap<String, u64>,
}

impl ElectionRecord {
    pub fn is_votes_only(&self) -> bool {
        self.tallies.contains_key(VOTES_ONLY)
    }

    /// The figure for the `votes` column, per the profile's policy.
    pub fn total_votes(&self, policy: &TotalsPolicy) -> u64 {
        if let Some(v) = self.tallies.get(VOTES_ONLY) {
            return *v;
        }
        match policy {
            TotalsPolicy::SumMethods => self.tallies.values().sum(),
            TotalsPolicy::SingleMethod(method) => {
                self.tallies.get(method).copied().unwrap_or(0)
            }
        }
    }
}

/// All records of one scan, plus the set of method names observed.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: BTreeMap<RecordKey, ElectionRecord>,
    methods: BTreeSet<String>,
}

impl RecordStore {
    pub fn new() -> RecordStore {
        RecordStore::default()
    }

    /// Stores one (key, method) count. A repeated pair overwrites the
    /// earlier figure; vendors re-print summary blocks and the last
    /// occurrence is authoritative.
    pub fn ingest(&mut self, key: RecordKey, method: &str, count: u64) {
        self.methods.insert(method.to_string());
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ElectionRecord {
                key,
                tallies: BTreeMap::new(),
            });
        record.tallies.remove(VOTES_ONLY);
        record.tallies.insert(method.to_string(), count);
    }

    /// Stores a breakdown-free figure under the `votes_only` pseudo
    /// method. A record that already has real methods keeps them.
    pub fn ingest_votes_only(&mut self, key: RecordKey, count: u64) {
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| ElectionRecord {
                key,
                tallies: BTreeMap::new(),
            });
        if record.tallies.keys().any(|m| m != VOTES_ONLY) {
            return;
        }
        record.tallies.insert(VOTES_ONLY.to_string(), count);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Method names observed across the store, `votes_only` excluded.
    pub fn method_names(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|m| m.as_str() != VOTES_ONLY)
            .cloned()
            .collect()
    }

    /// Records in the canonical emission order: office, then district
    /// (absent sorting first as the empty string), then candidate.
    pub fn into_sorted(self) -> Vec<ElectionRecord> {
        let mut out: Vec<ElectionRecord> = self.records.into_values().collect();
        out.sort_by(|a, b| {
            let da = a.key.district.clone().unwrap_or_default();
            let db = b.key.district.clone().unwrap_or_default();
            (&a.key.office, da, &a.key.candidate, &a.key.precinct).cmp(&(
                &b.key.office,
                db,
                &b.key.candidate,
                &b.key.precinct,
            ))
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(office: &str, district: Option<&str>, candidate: &str) -> RecordKey {
        RecordKey {
            county: "Collin".to_string(),
            precinct: "PCT 001".to_string(),
            office: office.to_string(),
            district: district.map(|d| d.to_string()),
            party: None,
            candidate: candidate.to_string(),
        }
    }

    #[test]
    fn last_write_wins_per_method() {
        let mut store = RecordStore::new();
        store.ingest(key("Sheriff", None, "Jim Skinner"), "Election Day", 10);
        store.ingest(key("Sheriff", None, "Jim Skinner"), "Election Day", 25);
        store.ingest(key("Sheriff", None, "Jim Skinner"), "Early Voting", 5);
        let records = store.into_sorted();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tallies["Election Day"], 25);
        assert_eq!(records[0].total_votes(&TotalsPolicy::SumMethods), 30);
    }

    #[test]
    fn votes_only_does_not_clobber_methods() {
        let mut store = RecordStore::new();
        let k = key("Turnout", None, "Ballots Cast");
        store.ingest(k.clone(), "Election Day", 10);
        store.ingest_votes_only(k.clone(), 99);
        let records = store.into_sorted();
        assert!(!records[0].is_votes_only());
        // And the converse: a real method replaces an earlier bare total.
        let mut store = RecordStore::new();
        store.ingest_votes_only(k.clone(), 99);
        store.ingest(k, "Election Day", 10);
        let records = store.into_sorted();
        assert!(!records[0].is_votes_only());
        assert_eq!(records[0].total_votes(&TotalsPolicy::SumMethods), 10);
    }

    #[test]
    fn single_method_totals_policy() {
        let mut store = RecordStore::new();
        let k = key("Sheriff", None, "Jim Skinner");
        store.ingest(k.clone(), "Election Day", 10);
        store.ingest(k, "Early Voting", 90);
        let records = store.into_sorted();
        assert_eq!(
            records[0].total_votes(&TotalsPolicy::SingleMethod("Election Day".to_string())),
            10
        );
    }

    #[test]
    fn sorted_by_office_district_candidate() {
        let mut store = RecordStore::new();
        store.ingest(key("Sheriff", None, "Zed Adams"), "Election Day", 1);
        store.ingest(key("Constable", Some("2"), "Ann Boyd"), "Election Day", 1);
        store.ingest(key("Constable", None, "Cal Dunn"), "Election Day", 1);
        store.ingest(key("Constable", Some("1"), "Bea Cole"), "Election Day", 1);
        let order: Vec<(String, Option<String>, String)> = store
            .into_sorted()
            .into_iter()
            .map(|r| (r.key.office, r.key.district, r.key.candidate))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Constable".to_string(), None, "Cal Dunn".to_string()),
                ("Constable".to_string(), Some("1".to_string()), "Bea Cole".to_string()),
                ("Constable".to_string(), Some("2".to_string()), "Ann Boyd".to_string()),
                ("Sheriff".to_string(), None, "Zed Adams".to_string()),
            ]
        );
    }
}
