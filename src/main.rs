//! auditflow-report command line interface

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auditflow_report::{AuditResult, BrandConfig, ReportConfig, ReportGenerator};

#[derive(Parser)]
#[command(name = "auditflow-report")]
#[command(about = "Render a website audit result into a branded PDF report")]
#[command(version)]
struct Cli {
    /// Audit result JSON file
    #[arg(long)]
    audit: PathBuf,

    /// Brand configuration JSON file (defaults to the AuditFlow brand)
    #[arg(long)]
    brand: Option<PathBuf>,

    /// Report configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory (receives the generated filename) or PDF file path
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Skip drawing the "+N more items not shown" marker under cut lists
    #[arg(long)]
    no_overflow_marker: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("auditflow_report=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.audit)
        .with_context(|| format!("reading audit result {}", cli.audit.display()))?;
    let audit = AuditResult::from_json(&raw).context("parsing audit result")?;

    let brand = match &cli.brand {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading brand config {}", path.display()))?;
            BrandConfig::from_json(&raw).context("parsing brand config")?
        }
        None => BrandConfig::default(),
    };

    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading report config {}", path.display()))?;
            ReportConfig::from_json(&raw).context("parsing report config")?
        }
        None => ReportConfig::default(),
    };
    if cli.no_overflow_marker {
        config = config.with_overflow_marker(false);
    }

    let generator = ReportGenerator::builder().config(config).build()?;
    let artifact = generator.generate(&audit, &brand).await?;
    let path = artifact
        .save(&cli.out)
        .with_context(|| format!("writing report to {}", cli.out.display()))?;

    info!(
        path = %path.display(),
        pages = artifact.page_count,
        bytes = artifact.bytes.len(),
        "report written"
    );
    for page in &artifact.metrics.pages {
        info!(
            page = page.page_number,
            name = %page.page_name,
            commands = page.command_count,
            content_bytes = page.content_bytes,
            "page"
        );
    }
    println!("{}", path.display());
    Ok(())
}
