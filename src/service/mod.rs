//! Service layer: the click batcher task and the Kafka bus publisher.

pub mod batcher;
pub mod publisher;

pub use batcher::{spawn_click_batcher, BatcherConfig, ClickBatcher, ClickWriter};
pub use publisher::ClickPublisher;
