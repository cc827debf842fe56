use std::collections::BTreeMap;

use super::aggregate::rollup_by_key;
use super::model::{BirthRecord, DecadeBin, Gender};
use crate::config::ShareBasis;

/// Bin records by decade with male/female shares over all gender codes.
pub fn bin_by_decade<'a, I>(records: I) -> Vec<DecadeBin>
where
    I: IntoIterator<Item = &'a BirthRecord>,
{
    bin_by_decade_with(records, ShareBasis::AllCodes)
}

/// Bin records by decade, ascending.
///
/// With [`ShareBasis::AllCodes`] unrecognised gender codes count toward
/// `total`, so the two shares can sum below 1. With
/// [`ShareBasis::KnownOnly`] the total is male + female only.
/// A bin whose total is zero gets `None` shares.
pub fn bin_by_decade_with<'a, I>(records: I, basis: ShareBasis) -> Vec<DecadeBin>
where
    I: IntoIterator<Item = &'a BirthRecord>,
{
    let mut decades: BTreeMap<i32, Vec<&BirthRecord>> = BTreeMap::new();
    for rec in records {
        decades.entry(rec.decade()).or_default().push(rec);
    }

    decades
        .into_iter()
        .map(|(decade, recs)| {
            let by_gender = rollup_by_key(recs, |r| r.gender.clone(), |r| r.count);
            let male = by_gender.get_or_zero(&Gender::Male);
            let female = by_gender.get_or_zero(&Gender::Female);
            let total = match basis {
                ShareBasis::AllCodes => by_gender.total(),
                ShareBasis::KnownOnly => male.saturating_add(female),
            };
            DecadeBin {
                decade,
                male,
                female,
                total,
                male_pct: share(male, total),
                female_pct: share(female, total),
            }
        })
        .collect()
}

fn share(part: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64)
}
