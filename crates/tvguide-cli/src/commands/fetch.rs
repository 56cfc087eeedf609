use anyhow::Result;
use chrono::NaiveDate;
use tvguide_core::time::broadcast_today;
use tvguide_etl::{Config, HarvestReport, SourceKind};

/// Harvest one day of listings and write the guide.
pub async fn run_fetch(
    config: &Config,
    kind: SourceKind,
    date: Option<NaiveDate>,
    channels: Vec<String>,
    json: bool,
) -> Result<()> {
    let date = date.unwrap_or_else(broadcast_today);
    log::info!("Starting {} harvest for {}", kind, date);

    eprintln!("\n📺 tvguide fetch\n");
    eprintln!("  Source: {kind}");
    eprintln!("  Date:   {}", date.format("%Y-%m-%d"));
    eprintln!("  Output: {}", config.output_path.display());
    eprintln!();

    let result = tvguide_etl::harvest::run(config, kind, date, channels).await?;

    print_report(&result.report);

    if json {
        println!("{}", result.guide.to_json_pretty()?);
    }

    check_report(&result.report)
}

/// Fail the run when the harvest produced no channel at all.
fn check_report(report: &HarvestReport) -> Result<()> {
    if report.channels_ok == 0 {
        anyhow::bail!("No channel listings could be fetched from {}", report.source);
    }
    Ok(())
}

fn print_report(report: &HarvestReport) {
    eprintln!(
        "✓ {} channels, {} programmes",
        report.channels_ok, report.programmes
    );

    if !report.is_complete() {
        eprintln!("\n  Skipped {} channels:", report.skipped.len());
        for skipped in &report.skipped {
            eprintln!("    ✗ {}: {}", skipped.channel, skipped.reason);
        }
    }
}
