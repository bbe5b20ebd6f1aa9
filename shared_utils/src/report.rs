//! Report Module
//!
//! End-of-run summary printing for conversion and organize passes.

use crate::batch::RunSummary;
use console::style;
use std::time::Duration;

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

pub fn print_summary_report(summary: &RunSummary, duration: Duration, operation_name: &str) {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║  📊 {:<48} ║", format!("{} Summary", operation_name));
    println!("╠══════════════════════════════════════════════════════╣");
    println!("║  📁 Found:           {:>10}                      ║", summary.found);
    println!("║  ✅ Succeeded:       {:>10}                      ║", summary.succeeded);
    println!("║  ⏭️  Skipped:         {:>10}                      ║", summary.skipped);
    println!("║  ❌ Errors:          {:>10}                      ║", summary.errored);
    if summary.cancelled > 0 {
        println!("║  🛑 Not started:     {:>10}                      ║", summary.cancelled);
    }
    println!(
        "║  📈 Success Rate:    {:>9.1}%                      ║",
        summary.success_rate()
    );
    println!("║  ⏱️  Total Time:      {:>10}                      ║", format_duration(duration));
    println!("╚══════════════════════════════════════════════════════╝");

    if !summary.errors.is_empty() {
        println!();
        println!("{}", style("❌ Failed conversions:").red().bold());
        for (path, error) in &summary.errors {
            println!("   {} → {}", path.display(), error);
        }
        println!("💡 Check the messages above for the decoder output of each failure.");
    }
}
