use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde::Serialize;

use super::model::{NamedSeries, SeriesPoint};

// ---------------------------------------------------------------------------
// Two-level grouping: primary key → ordered series of secondary-key sums
// ---------------------------------------------------------------------------

/// One primary group with its points, ascending by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group<P, K> {
    pub key: P,
    pub points: Vec<SeriesPoint<K>>,
}

/// Output of [`group_and_sum`]. Groups appear in the order their primary key
/// was first seen in the input, which is the legend order of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grouped<P, K> {
    groups: Vec<Group<P, K>>,
}

impl<P: PartialEq, K> Grouped<P, K> {
    pub fn groups(&self) -> &[Group<P, K>] {
        &self.groups
    }

    pub fn get(&self, key: &P) -> Option<&Group<P, K>> {
        self.groups.iter().find(|g| g.key == *key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &P> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Label each group and turn it into a chart series.
    pub fn into_named_series(self, label: impl Fn(&P) -> String) -> Vec<NamedSeries<K>> {
        self.groups
            .into_iter()
            .map(|g| NamedSeries {
                label: label(&g.key),
                points: g.points,
            })
            .collect()
    }
}

impl<P, K> IntoIterator for Grouped<P, K> {
    type Item = Group<P, K>;
    type IntoIter = std::vec::IntoIter<Group<P, K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group `records` by `primary_key`, then by `secondary_key`, summing `value`.
///
/// * Primary groups keep first-seen order.
/// * Each group's points are strictly ascending by secondary key.
/// * Secondary keys absent from a group produce no point (no zero fill).
/// * Sums saturate at `u64::MAX`.
pub fn group_and_sum<'a, R, P, K, I, FP, FK, FV>(
    records: I,
    primary_key: FP,
    secondary_key: FK,
    value: FV,
) -> Grouped<P, K>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R>,
    P: Eq + Hash + Clone,
    K: Ord,
    FP: Fn(&R) -> P,
    FK: Fn(&R) -> K,
    FV: Fn(&R) -> u64,
{
    let mut order: Vec<(P, BTreeMap<K, u64>)> = Vec::new();
    let mut index: HashMap<P, usize> = HashMap::new();

    for rec in records {
        let primary = primary_key(rec);
        let slot = match index.get(&primary) {
            Some(&slot) => slot,
            None => {
                index.insert(primary.clone(), order.len());
                order.push((primary, BTreeMap::new()));
                order.len() - 1
            }
        };
        let sum = order[slot].1.entry(secondary_key(rec)).or_insert(0);
        *sum = sum.saturating_add(value(rec));
    }

    let groups = order
        .into_iter()
        .map(|(key, sums)| Group {
            key,
            points: sums
                .into_iter()
                .map(|(key, value)| SeriesPoint { key, value })
                .collect(),
        })
        .collect();

    Grouped { groups }
}

// ---------------------------------------------------------------------------
// Single-level rollup: key → sum
// ---------------------------------------------------------------------------

/// Output of [`rollup_by_key`]. Keys without a positive total are absent;
/// look them up with [`Rollup::get_or_zero`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rollup<K: Ord> {
    totals: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Rollup<K> {
    fn default() -> Self {
        Rollup {
            totals: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Rollup<K> {
    pub fn get<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.totals.get(key).copied()
    }

    /// Total for `key`, or 0 when no record had that key.
    pub fn get_or_zero<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.totals.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Sum over all keys, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.totals.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn min_value(&self) -> Option<u64> {
        self.totals.values().copied().min()
    }

    pub fn max_value(&self) -> Option<u64> {
        self.totals.values().copied().max()
    }
}

/// Sum `value` per `key` over `records`.
pub fn rollup_by_key<'a, R, K, I, FK, FV>(records: I, key: FK, value: FV) -> Rollup<K>
where
    R: 'a + ?Sized,
    I: IntoIterator<Item = &'a R>,
    K: Ord,
    FK: Fn(&R) -> K,
    FV: Fn(&R) -> u64,
{
    let mut totals: BTreeMap<K, u64> = BTreeMap::new();
    for rec in records {
        let sum = totals.entry(key(rec)).or_insert(0);
        *sum = sum.saturating_add(value(rec));
    }
    totals.retain(|_, total| *total > 0);
    Rollup { totals }
}
