//! Aggregation engine for the French first-name birth registry.
//!
//! Rows are validated once into a [`RecordStore`]; every chart is then a pure
//! function of that store and the user's input:
//!
//! * name trends: births per year for a list of names
//! * regional popularity: births per department for one name
//! * gender trends: births per year and sex for one name
//! * gender share: male/female split per decade for one name
//!
//! [`AppState`] ties the one-off load to request handling.

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod views;

pub use config::{RegistryConfig, ShareBasis};
pub use data::aggregate::{group_and_sum, rollup_by_key, Group, Grouped, Rollup};
pub use data::filter::{filter_by_exact_name, filter_by_names, parse_name_list};
pub use data::loader::{load, load_file, load_in_background};
pub use data::model::{BirthRecord, DecadeBin, Gender, NamedSeries, RawRow, RecordStore, SeriesPoint};
pub use data::normalize::{bin_by_decade, bin_by_decade_with};
pub use error::{EngineError, LoadError, RowRejection};
pub use state::{AppState, LoadState, VizRequest, VizResponse};
