use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardgen::config::Config;
use cardgen::generator::CardGenerator;
use cardgen::quota::Tier;

/// Fill a tracked person's card quota from web search results
#[derive(Parser, Debug)]
#[command(name = "cardgen", version)]
struct Args {
    /// Row id of the tracked person to generate cards for
    #[arg(long)]
    subject_id: i64,

    /// Override the subject's stored tier (hard, soft, base)
    #[arg(long)]
    tier: Option<String>,

    /// Run the whole pipeline but skip the final insert
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cardgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let config = Config::from_env()?;

    let mut generator = CardGenerator::new(&config)?.with_dry_run(args.dry_run);
    if let Some(tier) = &args.tier {
        generator = generator.with_tier_override(Tier::parse(tier)?);
    }

    let report = generator.run_for_subject(args.subject_id).await?;
    info!(
        subject_id = report.subject_id,
        inserted = report.inserted,
        "Done"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
