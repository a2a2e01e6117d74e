/// Data layer: core types, loading, caching, filtering and derivation.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐      ┌───────────┐
///   │  loader   │ ───▶ │   cache    │  one Arc<IndicatorTable> per path
///   └──────────┘      └───────────┘
///                           │
///                           ▼
///   ┌──────────┐      ┌───────────┐      ┌────────────────────┐
///   │  filter   │ ───▶ │  derive    │ ───▶ │ coverage / aggregate │
///   └──────────┘      └───────────┘      └────────────────────┘
///   SelectionContext   DerivationSpec      availability, latest values
/// ```
///
/// Every step takes a table by reference and returns a new one; loaded
/// tables are never mutated.

pub mod aggregate;
pub mod cache;
pub mod coverage;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
