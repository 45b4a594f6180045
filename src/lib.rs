//! Client side of a car-sales analytics dashboard.
//!
//! Raw sale records fetched from the task backend are filtered, aggregated,
//! sorted and paged locally; submitted tasks are tracked through a simulated
//! `pending → in progress → completed` lifecycle while the backend's own task
//! list is polled.

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod records;
pub mod table;
pub mod task;
pub mod view;
