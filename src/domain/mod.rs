//! Domain layer: ad and click event records plus the bounded click queue.

pub mod click;
pub mod click_queue;

pub use click::{Ad, ClickEvent};
pub use click_queue::ClickQueue;
