//! Chart-ready data for the three registry views.
//!
//! Each builder is a pure function of the store and the normalised input;
//! drawing is left to whoever consumes these structures.

use serde::Serialize;

use crate::color::{to_hex, Color, ColorMap, QuantizeScale};
use crate::config::ShareBasis;
use crate::data::aggregate::{group_and_sum, rollup_by_key, Rollup};
use crate::data::filter::{filter_by_exact_name, filter_by_names};
use crate::data::model::{DecadeBin, NamedSeries, RecordStore};
use crate::data::normalize::bin_by_decade_with;

// ---------------------------------------------------------------------------
// Line charts
// ---------------------------------------------------------------------------

/// Axis extents of a year/count line chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartDomain {
    /// First and last year with a point; `None` for an empty chart.
    pub years: Option<(i32, i32)>,
    /// Largest point value, or 1 when there is none (or it is zero).
    pub max_value: u64,
}

impl ChartDomain {
    pub fn of(series: &[NamedSeries<i32>]) -> Self {
        let keys = || series.iter().flat_map(|s| s.points.iter().map(|p| p.key));
        let years = keys().min().zip(keys().max());
        let max_value = series
            .iter()
            .filter_map(|s| s.max_value())
            .max()
            .filter(|v| *v > 0)
            .unwrap_or(1);
        ChartDomain { years, max_value }
    }
}

/// Lines of a trend chart with one colour per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub series: Vec<NamedSeries<i32>>,
    /// `#rrggbb` per series, same order as `series`.
    pub colors: Vec<String>,
    pub domain: ChartDomain,
}

impl TrendChart {
    fn new(series: Vec<NamedSeries<i32>>, colors: &ColorMap) -> Self {
        let domain = ChartDomain::of(&series);
        let colors = series
            .iter()
            .map(|s| to_hex(colors.color_for(&s.label)))
            .collect();
        TrendChart {
            series,
            colors,
            domain,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Births per year for each requested name. Lines follow the order names
/// first appear in the data; colours follow the order they were requested.
pub fn name_trends(store: &RecordStore, names: &[String]) -> TrendChart {
    let matches = filter_by_names(store, names);
    log::debug!("name_trends: {} records for {names:?}", matches.len());

    let series = group_and_sum(matches, |r| r.name.clone(), |r| r.year, |r| r.count)
        .into_named_series(|name| name.clone());
    TrendChart::new(series, &ColorMap::categorical(names))
}

/// Births per year of one name, one line per sex.
pub fn gender_trends(store: &RecordStore, name: &str) -> TrendChart {
    let matches = filter_by_exact_name(store, name);
    log::debug!("gender_trends: {} records for {name}", matches.len());

    let colors = ColorMap::gender(matches.iter().map(|r| &r.gender));
    let series = group_and_sum(matches, |r| r.gender.clone(), |r| r.year, |r| r.count)
        .into_named_series(|gender| gender.label().to_string());
    TrendChart::new(series, &colors)
}

// ---------------------------------------------------------------------------
// Department map
// ---------------------------------------------------------------------------

/// Births of one name per department, with the map's colour scale.
#[derive(Debug, Clone)]
pub struct RegionalMap {
    pub name: String,
    pub counts: Rollup<String>,
    pub scale: QuantizeScale,
}

impl RegionalMap {
    /// Births in a department; 0 when there are none.
    pub fn count_for(&self, code: &str) -> u64 {
        self.counts.get_or_zero(code)
    }

    pub fn fill_for(&self, code: &str) -> Color {
        self.scale.fill_for(self.counts.get(code))
    }

    /// Hover text for a department polygon.
    pub fn tooltip(&self, department_name: &str, code: &str) -> String {
        format!("{department_name} ({code}): {}", self.count_for(code))
    }

    pub fn title(&self) -> String {
        format!("Regional Popularity of \"{}\"", self.name)
    }
}

pub fn regional_popularity(store: &RecordStore, name: &str) -> RegionalMap {
    let matches = filter_by_exact_name(store, name);
    log::debug!("regional_popularity: {} records for {name}", matches.len());

    let counts = rollup_by_key(matches, |r| r.department.clone(), |r| r.count);
    let scale = QuantizeScale::blues_for(&counts);
    RegionalMap {
        name: name.to_string(),
        counts,
        scale,
    }
}

// ---------------------------------------------------------------------------
// Gender share by decade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareChart {
    pub name: String,
    pub bins: Vec<DecadeBin>,
}

impl ShareChart {
    /// Bins with a split to draw; zero-total decades are left blank.
    pub fn drawable(&self) -> impl Iterator<Item = &DecadeBin> {
        self.bins.iter().filter(|b| b.has_data())
    }
}

pub fn gender_share(store: &RecordStore, name: &str, basis: ShareBasis) -> ShareChart {
    let matches = filter_by_exact_name(store, name);
    log::debug!("gender_share: {} records for {name}", matches.len());

    ShareChart {
        name: name.to_string(),
        bins: bin_by_decade_with(matches, basis),
    }
}
