pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod geo;
pub mod models;
pub mod narrative;
pub mod pipeline;
pub mod sources;
pub mod telemetry;
pub mod validation;
