//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod category_order_repo;
pub mod link_repo;

pub use category_order_repo::CategoryOrderRepo;
pub use link_repo::LinkRepo;
