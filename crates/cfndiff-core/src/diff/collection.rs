use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::Serialize;

use super::types::{Change, ChangeKind};

/// Differences for one template section, keyed by logical name.
///
/// Iteration is ordered by name, so every consumer sees the same order for
/// the same pair of templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DifferenceCollection<D> {
    diffs: BTreeMap<String, D>,
}

impl<D> Default for DifferenceCollection<D> {
    fn default() -> Self {
        Self {
            diffs: BTreeMap::new(),
        }
    }
}

impl<D> DifferenceCollection<D> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, diff: D) {
        self.diffs.insert(name.into(), diff);
    }

    /// Returns the difference recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&D> {
        self.diffs.get(name)
    }

    /// Returns `true` if a difference is recorded for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.diffs.contains_key(name)
    }

    /// Number of recorded differences.
    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Iterates over `(name, difference)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, D> {
        self.diffs.iter()
    }

    /// Iterates over recorded names in order.
    pub fn logical_ids(&self) -> impl Iterator<Item = &str> {
        self.diffs.keys().map(String::as_str)
    }

    /// Returns a new collection holding only the entries that satisfy
    /// `predicate`.
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        D: Clone,
        P: FnMut(&str, &D) -> bool,
    {
        let diffs = self
            .diffs
            .iter()
            .filter(|(name, diff)| predicate(name.as_str(), diff))
            .map(|(name, diff)| (name.clone(), diff.clone()))
            .collect();
        Self { diffs }
    }
}

impl<D: Change> DifferenceCollection<D> {
    /// Entries present only in the new template.
    pub fn additions(&self) -> impl Iterator<Item = (&str, &D)> {
        self.of_kind(ChangeKind::Addition)
    }

    /// Entries present in both templates with different content.
    pub fn updates(&self) -> impl Iterator<Item = (&str, &D)> {
        self.of_kind(ChangeKind::Update)
    }

    /// Entries present only in the old template.
    pub fn removals(&self) -> impl Iterator<Item = (&str, &D)> {
        self.of_kind(ChangeKind::Removal)
    }

    /// Entries that represent an actual change.
    pub fn differences(&self) -> impl Iterator<Item = (&str, &D)> {
        self.diffs
            .iter()
            .filter(|(_, d)| d.is_different())
            .map(|(name, d)| (name.as_str(), d))
    }

    /// Number of entries that represent an actual change.
    pub fn difference_count(&self) -> usize {
        self.differences().count()
    }

    /// Returns `true` if any entry represents an actual change.
    pub fn has_differences(&self) -> bool {
        self.differences().next().is_some()
    }

    /// Visits every change: additions first, then updates, then removals,
    /// each group in name order.
    pub fn for_each_difference<F>(&self, mut f: F)
    where
        F: FnMut(ChangeKind, &str, &D),
    {
        for kind in [ChangeKind::Addition, ChangeKind::Update, ChangeKind::Removal] {
            for (name, diff) in self.of_kind(kind) {
                if diff.is_different() {
                    f(kind, name, diff);
                }
            }
        }
    }

    fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = (&str, &D)> {
        self.diffs
            .iter()
            .filter(move |(_, d)| d.kind() == kind)
            .map(|(name, d)| (name.as_str(), d))
    }
}

impl<'a, D> IntoIterator for &'a DifferenceCollection<D> {
    type Item = (&'a String, &'a D);
    type IntoIter = btree_map::Iter<'a, String, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.diffs.iter()
    }
}

impl<D> FromIterator<(String, D)> for DifferenceCollection<D> {
    fn from_iter<I: IntoIterator<Item = (String, D)>>(iter: I) -> Self {
        Self {
            diffs: iter.into_iter().collect(),
        }
    }
}
