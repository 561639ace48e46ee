use crate::error::{Error, Result};
use crate::job::ResultRow;
use crate::metrics::MetricsSnapshot;
use indicatif::{ProgressBar, ProgressStyle};

fn style(template: &str) -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(template)
        .map_err(|e| Error::Internal(e.to_string()))?
        .progress_chars("#>-"))
}

pub fn running_style() -> Result<ProgressStyle> {
    style("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
}

pub fn running_message(snapshot: &MetricsSnapshot) -> String {
    format!(
        "OK: {} | Failed: {} | Retries: {} | RPS: {:.2}",
        snapshot.jobs_succeeded, snapshot.jobs_failed, snapshot.retries, snapshot.requests_per_second
    )
}

/// Closes the bar according to how the run ended. A fatal run is abandoned
/// where it stopped instead of being shown as completed.
pub fn finish(pb: &ProgressBar, outcome: &Result<Vec<ResultRow>>, snapshot: &MetricsSnapshot) -> Result<()> {
    match outcome {
        Ok(_) => {
            pb.set_style(style("✅ [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} {msg}")?);
            pb.finish_with_message(format!(
                "OK: {} | Failed: {} | Retries: {} - Completed",
                snapshot.jobs_succeeded, snapshot.jobs_failed, snapshot.retries
            ));
        }
        Err(e) => {
            pb.set_style(style("❌ [{elapsed_precise}] [{bar:40.red/blue}] {pos}/{len} {msg}")?);
            pb.abandon_with_message(format!("Aborted: {}", e));
        }
    }
    Ok(())
}
