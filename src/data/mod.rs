/// Data layer: observation types, model schemas, CSV import and the
/// dataset store.
///
/// Architecture:
/// ```text
///  preset rows / .csv / manual entry
///        │
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  loader   │◄────│  schema   │  field keys, required flags, defaults
///   └──────────┘     └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  Vec<Observation>, selection, result, generation
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  paging   │  page index → row range
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod paging;
pub mod schema;
pub mod store;
