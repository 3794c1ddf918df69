//! Lot identifiers, status categories and snapshots.
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Opaque lot token from the upstream site. Stable across runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(String);

impl LotId {
    pub fn new<S: Into<String>>(id: S) -> LotId {
        LotId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Orders all-digit ids by value, ahead of every other id. Non-numeric ids
    /// compare as plain strings.
    pub fn numeric_cmp(&self, other: &LotId) -> Ordering {
        match (self.digits(), other.digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }

    /// The id without leading zeros, if it is made of ASCII digits only.
    fn digits(&self) -> Option<&str> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(self.0.trim_start_matches('0'))
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LotId {
    fn from(id: &str) -> LotId {
        LotId::new(id)
    }
}

/// Occupancy classification of a lot at one point in time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCategory {
    Available,
    /// Nearly full.
    Few,
    /// Occupied or in flux. Reads of this state are unreliable.
    Active,
    Full,
    Closed,
    /// Fetch or parse failed.
    Unknown,
    /// Unrecognized indicator, kept verbatim.
    Raw(String),
}

/// Token written for [`StatusCategory::Unknown`]. Existing stores use `na`.
pub const UNKNOWN_TOKEN: &str = "na";

impl StatusCategory {
    /// Parses a persisted token. Never fails: unknown tokens become `Raw`.
    ///
    /// Image paths always stay `Raw`, even when they end in a known token.
    pub fn from_token(token: &str) -> StatusCategory {
        if token.starts_with('/') {
            return StatusCategory::Raw(String::from(token));
        }
        match token {
            "available" => StatusCategory::Available,
            "few" => StatusCategory::Few,
            "active" => StatusCategory::Active,
            "full" => StatusCategory::Full,
            "closed" => StatusCategory::Closed,
            "na" | "unknown" => StatusCategory::Unknown,
            raw => StatusCategory::Raw(String::from(raw)),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            StatusCategory::Available => "available",
            StatusCategory::Few => "few",
            StatusCategory::Active => "active",
            StatusCategory::Full => "full",
            StatusCategory::Closed => "closed",
            StatusCategory::Unknown => UNKNOWN_TOKEN,
            StatusCategory::Raw(raw) => raw,
        }
    }

    /// Human-facing label. `Unknown` reads as `unknown` rather than its stored token.
    pub fn label(&self) -> &str {
        match self {
            StatusCategory::Unknown => "unknown",
            other => other.token(),
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self {
            StatusCategory::Available => CategoryKind::Available,
            StatusCategory::Few => CategoryKind::Few,
            StatusCategory::Active => CategoryKind::Active,
            StatusCategory::Full => CategoryKind::Full,
            StatusCategory::Closed => CategoryKind::Closed,
            StatusCategory::Unknown => CategoryKind::Unknown,
            StatusCategory::Raw(_) => CategoryKind::Raw,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StatusCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

struct CategoryVisitor;

impl<'de> Visitor<'de> for CategoryVisitor {
    type Value = StatusCategory;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a status token")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<StatusCategory, E> {
        Ok(StatusCategory::from_token(v))
    }
}

impl<'de> Deserialize<'de> for StatusCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<StatusCategory, D::Error> {
        deserializer.deserialize_str(CategoryVisitor)
    }
}

/// Payload-free view of [`StatusCategory`], used where categories are configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Available,
    Few,
    Active,
    Full,
    Closed,
    #[serde(alias = "na")]
    Unknown,
    Raw,
}

/// Lot name by id. The latest known names only.
pub type NameDirectory = BTreeMap<LotId, String>;

/// Status of every lot visited by one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<LotId, StatusCategory>);

impl Snapshot {
    pub fn new() -> Snapshot {
        Snapshot::default()
    }

    /// Records a lot's category. Returns false if the lot was already recorded,
    /// in which case the first category is kept.
    pub fn record(&mut self, id: LotId, category: StatusCategory) -> bool {
        use std::collections::btree_map::Entry;
        match self.0.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(category);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: &LotId) -> Option<&StatusCategory> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LotId, &StatusCategory)> {
        self.0.iter()
    }

    /// Number of lots per category.
    pub fn tally(&self) -> BTreeMap<StatusCategory, usize> {
        let mut counts = BTreeMap::new();
        for category in self.0.values() {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_kinds(&self, kinds: &[CategoryKind]) -> usize {
        self.0
            .values()
            .filter(|category| kinds.contains(&category.kind()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip_known_categories() {
        for token in &["available", "few", "active", "full", "closed", "na"] {
            assert_eq!(*token, StatusCategory::from_token(token).token());
        }
    }

    #[test]
    fn test_unknown_reads_legacy_and_long_token() {
        assert_eq!(StatusCategory::Unknown, StatusCategory::from_token("na"));
        assert_eq!(StatusCategory::Unknown, StatusCategory::from_token("unknown"));
        assert_eq!("unknown", StatusCategory::Unknown.label());
    }

    #[test]
    fn test_unrecognized_token_is_kept_raw() {
        let category = StatusCategory::from_token("/pics/ParkingIcons/new.png");
        assert_eq!(
            StatusCategory::Raw(String::from("/pics/ParkingIcons/new.png")),
            category
        );
        assert_eq!("/pics/ParkingIcons/new.png", category.token());
    }

    #[test]
    fn test_raw_image_path_survives_reload() {
        for path in &["/available", "/pics/x/available", "/na"] {
            let raw = StatusCategory::Raw(String::from(*path));

            let json = serde_json::to_string(&raw).unwrap();
            let back: StatusCategory = serde_json::from_str(&json).unwrap();

            assert_eq!(raw, back);
        }
    }

    #[test]
    fn test_snapshot_serializes_as_flat_object() {
        let mut snapshot = Snapshot::new();
        snapshot.record(LotId::from("19"), StatusCategory::Full);
        snapshot.record(LotId::from("42"), StatusCategory::Unknown);

        let json = serde_json::to_string(&snapshot).unwrap();

        assert_eq!(r#"{"19":"full","42":"na"}"#, json);
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, back);
    }

    #[test]
    fn test_snapshot_keeps_first_category() {
        let mut snapshot = Snapshot::new();
        assert!(snapshot.record(LotId::from("7"), StatusCategory::Few));
        assert!(!snapshot.record(LotId::from("7"), StatusCategory::Full));
        assert_eq!(Some(&StatusCategory::Few), snapshot.get(&LotId::from("7")));
    }

    #[test]
    fn test_tally_and_kind_counts() {
        let mut snapshot = Snapshot::new();
        snapshot.record(LotId::from("1"), StatusCategory::Active);
        snapshot.record(LotId::from("2"), StatusCategory::Unknown);
        snapshot.record(LotId::from("3"), StatusCategory::Unknown);
        snapshot.record(LotId::from("4"), StatusCategory::Available);

        let tally = snapshot.tally();

        assert_eq!(Some(&2), tally.get(&StatusCategory::Unknown));
        assert_eq!(Some(&1), tally.get(&StatusCategory::Active));
        assert_eq!(
            3,
            snapshot.count_kinds(&[CategoryKind::Unknown, CategoryKind::Active])
        );
    }

    #[test]
    fn test_numeric_cmp_orders_by_value() {
        assert_eq!(Ordering::Less, LotId::from("19").numeric_cmp(&LotId::from("100")));
        assert_eq!(Ordering::Greater, LotId::from("b").numeric_cmp(&LotId::from("a")));
        assert_eq!(Ordering::Less, LotId::from("900").numeric_cmp(&LotId::from("a")));
        assert_eq!(Ordering::Greater, LotId::from("7").numeric_cmp(&LotId::from("007")));
        assert_eq!(Ordering::Less, LotId::from("007").numeric_cmp(&LotId::from("8")));
    }

    #[test]
    fn test_numeric_cmp_is_total_beyond_u64() {
        let huge = LotId::from("3000000000000000000000000");
        let five = LotId::from("5");
        let twenty = LotId::from("20");

        assert_eq!(Ordering::Less, five.numeric_cmp(&twenty));
        assert_eq!(Ordering::Less, twenty.numeric_cmp(&huge));
        assert_eq!(Ordering::Less, five.numeric_cmp(&huge));

        let mut sorted = vec![huge.clone(), LotId::from("b"), twenty.clone(), five.clone()];
        sorted.sort_by(LotId::numeric_cmp);
        assert_eq!(vec![five, twenty, huge, LotId::from("b")], sorted);
    }
}
