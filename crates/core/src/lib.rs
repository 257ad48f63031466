//! Catalog engine for linkshelf.
//!
//! Everything in this crate is independent of SQL and HTTP. The record store
//! and the local cache are reached through the [`store::RecordStore`] and
//! [`cache::LocalCache`] seams; [`catalog::Catalog`] ties the components
//! together into a single writer session.

pub mod cache;
pub mod catalog;
pub mod category_order;
pub mod error;
pub mod export;
pub mod hashing;
pub mod link;
pub mod migration;
pub mod rename;
pub mod reorder;
pub mod store;
pub mod types;
pub mod view;
