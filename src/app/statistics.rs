//! End-of-run statistics.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{PipelineEvent, PipelineStats};
use crate::MapReport;

/// Logs every non-zero event count, losses first.
pub fn print_pipeline_statistics(stats: &PipelineStats) {
    let total_losses = stats.total_losses();
    if total_losses > 0 {
        info!("Dropped entries ({} total):", total_losses);
        for event in PipelineEvent::iter().filter(PipelineEvent::is_loss) {
            let count = stats.get(event);
            if count > 0 {
                info!("   {}: {}", event.as_str(), count);
            }
        }
    }

    let informational: Vec<PipelineEvent> = PipelineEvent::iter().filter(|e| !e.is_loss()).collect();
    if informational.iter().any(|e| stats.get(*e) > 0) {
        info!("Notes:");
        for event in informational {
            let count = stats.get(event);
            if count > 0 {
                info!("   {}: {}", event.as_str(), count);
            }
        }
    }
}

/// One-line summary of a finished run.
pub fn summary_line(report: &MapReport) -> String {
    format!(
        "Mapped {} of {} relay{} into {} marker{} over the {} in {:.1}s",
        report.located,
        report.relays,
        if report.relays == 1 { "" } else { "s" },
        report.clusters,
        if report.clusters == 1 { "" } else { "s" },
        report.background,
        report.elapsed_seconds
    )
}
