//! # ad-tracker
//!
//! High-throughput ad click ingestion and analytics service.
//!
//! Click requests are acknowledged as soon as the event is validated and
//! handed to a bounded in-process queue; a single batcher task drains the
//! queue and persists events to PostgreSQL in batched inserts with retry.
//! Each accepted event is additionally published to Kafka as a derived
//! stream; the relational store is the system of record.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │       │
//!     │       ├── ClickQueue (domain/) ──► ClickBatcher (service/)
//!     │       │                                  │
//!     │       ├── ClickPublisher (service/)      │
//!     │       │        │                         ▼
//!     │       │        ▼                   PostgreSQL
//!     │       │      Kafka              (ClickStore, persistence/)
//!     │       │
//!     │       └── ClickStore (persistence/)
//!     │
//!     └── Prometheus registry (metrics)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod persistence;
pub mod service;
