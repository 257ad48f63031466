//! Row structs for the `links` and `category_order` tables.
//!
//! Rows are converted into core types at the repository boundary; a row that
//! violates a core invariant is reported instead of converted.

pub mod category_order;
pub mod link;
