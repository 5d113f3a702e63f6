//! User-facing lines: one warning per skipped item, one summary at the end.

use obex_core::run::{ItemEvent, Summary};
use std::time::Duration;

pub fn print_item(event: ItemEvent<'_>) {
    match event {
        ItemEvent::Saved { .. } => {}
        ItemEvent::Failed { record, error } => {
            eprintln!("warning: skipped '{}': {}", record.title, error);
        }
        ItemEvent::ExtractWarning { record, message } => {
            eprintln!("warning: could not unpack '{}': {}", record.title, message);
        }
    }
}

pub fn summary_line(summary: &Summary, elapsed: Duration) -> String {
    format!(
        "All done! {} succeeded, {} failed in {:.1} seconds.",
        summary.succeeded,
        summary.failed,
        elapsed.as_secs_f64()
    )
}

pub fn print_summary(summary: &Summary, elapsed: Duration) {
    println!("{}", summary_line(summary, elapsed));
}
