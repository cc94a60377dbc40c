// src/output/mod.rs
//! Output handling with clear separation of planning and execution.
//!
//! Media files are materialized during conversion by [`MediaLocalizer`];
//! document and metadata files are planned as [`OutputPlan`]s and written
//! by [`deliver`].

mod media;
mod paths;
mod types;
mod writer;

pub use media::{MediaLocalizer, MediaResponse, MediaTransport};
pub use paths::{article_output_paths, sanitize_filename, ArticlePaths};
pub use types::{DeliveryTarget, OutputPlan, OutputReport};
pub use writer::deliver;
