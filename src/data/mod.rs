/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  raw rows → validated RecordStore
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  name tokens → matching records
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group_and_sum / rollup_by_key
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  decade bins with gender shares
///   └───────────┘
/// ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
