//! Persistence layer: typed reads and writes against PostgreSQL.
//!
//! [`postgres::ClickStore`] owns the connection pool and exposes the ad
//! lookups, click inserts, and aggregation counts the rest of the service
//! is built on.

pub mod postgres;

pub use postgres::ClickStore;
