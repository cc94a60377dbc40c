// src/output/writer.rs
//! Executes output operations by performing actual I/O.
//!
//! Planning stays pure; every document and metadata write happens here.

use super::types::*;
use crate::error::AppError;
use std::fs;
use std::path::Path;

/// Delivers the output plan, performing all I/O operations.
///
/// A failing write is recorded in the report and does not stop the
/// remaining operations.
pub fn deliver(plan: OutputPlan) -> Result<OutputReport, AppError> {
    let mut report = OutputReport::new();

    log::info!("Writing {} output file(s)", plan.operations.len());

    for operation in plan.operations {
        match execute_operation(&operation) {
            Ok(bytes_written) => {
                report = report.with_completed(CompletedOperation {
                    operation,
                    bytes_written,
                });
            }
            Err(e) => {
                log::error!("Could not write {}: {}", operation.path().display(), e);
                report = report.with_failed(FailedOperation {
                    operation,
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Output complete: {} written ({} bytes), {} failed",
        report.stats.operations_completed,
        report.stats.bytes_written,
        report.stats.operations_failed
    );

    Ok(report)
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
    }
}

fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    log::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(content.len())
}
