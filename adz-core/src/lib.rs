#![forbid(unsafe_code)]

pub mod error;

pub mod container {
    pub mod header;
    pub mod record;
}

pub mod pack {
    pub mod planner;
    pub mod writer;
}

pub mod read {
    pub mod extract;
    pub mod opened;
    pub mod walk;
}

pub mod domain;
pub mod list;
pub mod stats;

// Re-exports: stable API surface
pub use container::record::{EntryKind, EntryRecord};
pub use domain::TreeRow;
pub use error::{AdzError, Result};
pub use list::{Listing, list};
pub use pack::planner::{CreateOptions, Plan, plan};
pub use pack::writer::create;
pub use read::extract::{ExtractOptions, extract, verify};
pub use stats::Summary;
