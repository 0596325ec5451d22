use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use startup_collector::{
    collect_features, load_offline_profile, CompanyIdentity, FeatureCollector, RuntimeConfig,
};

/// Collect startup feature tables from public data providers.
#[derive(Debug, Parser)]
#[command(name = "startup-collector", version)]
struct Cli {
    /// Startup name.
    name: String,

    /// Startup website domain.
    #[arg(long)]
    domain: Option<String>,

    /// Industry label used for founder domain-experience matching.
    #[arg(long, default_value = "AI")]
    industry: String,

    /// Funding stage hint.
    #[arg(long, default_value = "seed")]
    stage: String,

    /// Primary operating region.
    #[arg(long, default_value = "US")]
    region: String,

    /// Path to a hand-curated JSON profile; its values outrank every
    /// provider.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Where to write the feature tables (defaults to OUTPUT_DIR or
    /// ./outputs).
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = RuntimeConfig::load_from_env();
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    // Bad manual data stops the run before any provider is contacted.
    let offline = cli
        .profile
        .as_deref()
        .map(load_offline_profile)
        .transpose()
        .context("offline profile rejected")?;

    let identity = CompanyIdentity {
        name: cli.name,
        domain: cli.domain,
        industry: Some(cli.industry),
        stage: Some(cli.stage),
        region: Some(cli.region),
    };

    let output_dir = config.output_dir.clone();
    let collector = FeatureCollector::from_config(config)?;
    info!(
        company = %identity.name,
        sources = collector.source_count(),
        output = %output_dir.display(),
        "collecting startup features"
    );

    let (_merged, artifacts) =
        collect_features(&collector, &identity, offline.as_ref(), &output_dir).await?;

    println!("{}", serde_json::to_string_pretty(&artifacts)?);
    Ok(())
}
