//! Compare module: Content equality of two scanned trees
//!
//! Both record sets are merged by relative path; the first divergence
//! found ends the comparison.

mod merge;
mod mismatch;

pub use merge::{compare_scans, TreeComparator};
pub use mismatch::{Comparison, Divergence, EntryKind, Mismatch, MismatchField};
