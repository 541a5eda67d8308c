use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_core::config::ParleyConfig;
use parley_core::entropy::SeededEntropy;
use parley_core::persona::{OrganizationPersona, SellerPersona};
use parley_core::session::SimulationResult;
use parley_reasoning::personas::{generate_organizations, generate_sellers};
use parley_reasoning::providers::create_client;
use parley_reasoning::{
    assign, Assignment, CampaignOrchestrator, GenerationSettings, PersonaSet, SessionOrchestrator,
};

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// JSON file of personas to use instead of generating them
    #[arg(short, long)]
    personas: Option<PathBuf>,

    /// Directory for the negotiation report
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Seed for every random draw
    #[arg(long, env = "PARLEY_SEED")]
    seed: Option<u64>,

    /// Override the LLM provider ("openai" or "mock")
    #[arg(long)]
    provider: Option<String>,

    /// Number of sellers and organizations to generate
    #[arg(short, long)]
    num_personas: Option<usize>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Also write daily-rotated log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run independent seller/organization pairs concurrently
    #[arg(long)]
    parallel: bool,
}

/// Installs the subscriber. The returned guard must live until exit so the
/// file sink can flush.
fn init_tracing(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "parley.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(args.log_json.then(|| fmt::layer().json()))
        .with((!args.log_json).then(|| fmt::layer()))
        .with(file_layer)
        .init();
    guard
}

async fn obtain_personas(
    args: &Args,
    config: &ParleyConfig,
    settings: &GenerationSettings,
    client: &dyn parley_reasoning::LlmClient,
) -> Result<PersonaSet> {
    if let Some(path) = &args.personas {
        return PersonaSet::load(path);
    }
    let count = args.num_personas.unwrap_or(config.simulation.num_personas);
    info!("Generating {} sellers and {} organizations...", count, count);
    Ok(PersonaSet {
        sellers: generate_sellers(client, settings, count).await,
        organizations: generate_organizations(client, settings, count).await,
    })
}

/// Every (seller, organization) pair, each with its own copy of the organization.
fn pairs(
    personas: &PersonaSet,
    assignments: &[Assignment],
) -> Vec<(SellerPersona, OrganizationPersona)> {
    let mut out = Vec::new();
    for a in assignments {
        let Some(seller) = personas.sellers.iter().find(|s| s.id == a.seller_id) else {
            continue;
        };
        for org_id in &a.organization_ids {
            if let Some(org) = personas.organization(org_id) {
                out.push((seller.clone(), org.clone()));
            }
        }
    }
    out
}

fn pair_entropy(seed: Option<u64>, index: usize) -> SeededEntropy {
    match seed {
        Some(s) => SeededEntropy::from_seed(s.wrapping_add(index as u64 + 1)),
        None => SeededEntropy::from_os(),
    }
}

async fn run_campaigns(
    campaign: CampaignOrchestrator,
    pairs: Vec<(SellerPersona, OrganizationPersona)>,
    seed: Option<u64>,
    parallel: bool,
) -> Vec<SimulationResult> {
    let mut results = Vec::with_capacity(pairs.len());

    if parallel {
        let handles: Vec<_> = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (seller, org))| {
                let campaign = campaign.clone();
                tokio::spawn(async move {
                    let mut entropy = pair_entropy(seed, i);
                    let org_id = org.id.clone();
                    (
                        seller.id.clone(),
                        org_id,
                        campaign.run(&seller, org, &mut entropy).await,
                    )
                })
            })
            .collect();
        for handle in handles {
            match handle.await {
                Ok((_, _, Ok(result))) => results.push(result),
                Ok((seller, org, Err(e))) => error!("Campaign {} -> {} aborted: {}", seller, org, e),
                Err(e) => error!("Campaign task panicked: {}", e),
            }
        }
    } else {
        for (i, (seller, org)) in pairs.into_iter().enumerate() {
            let mut entropy = pair_entropy(seed, i);
            let org_id = org.id.clone();
            match campaign.run(&seller, org, &mut entropy).await {
                Ok(result) => results.push(result),
                Err(e) => error!("Campaign {} -> {} aborted: {}", seller.id, org_id, e),
            }
        }
    }
    results
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args);

    info!("Initializing Parley...");
    let mut config = ParleyConfig::load_or_default(&args.config);
    if let Some(provider) = &args.provider {
        config.llm.provider = provider.clone();
    }
    config.validate().context("Invalid configuration")?;

    let client = create_client(&config.llm)?;
    info!(
        "Using {} provider with model {}",
        config.llm.provider, config.llm.model
    );
    let settings = GenerationSettings {
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        retry: config.retry.clone(),
    };

    let personas = obtain_personas(&args, &config, &settings, client.as_ref()).await?;
    if personas.sellers.is_empty() || personas.organizations.is_empty() {
        bail!(
            "Need at least one seller and one organization (have {} and {})",
            personas.sellers.len(),
            personas.organizations.len()
        );
    }

    let mut entropy = match args.seed {
        Some(seed) => SeededEntropy::from_seed(seed),
        None => SeededEntropy::from_os(),
    };
    let assignments = assign(
        &personas.sellers,
        &personas.organizations,
        config.simulation.max_assigned_per_seller,
        &mut entropy,
    );
    for a in &assignments {
        info!("{} -> {:?}", a.seller_id, a.organization_ids);
    }

    let campaign = CampaignOrchestrator::new(SessionOrchestrator::new(Arc::clone(&client), &config));
    let jobs = pairs(&personas, &assignments);
    info!("Running {} campaigns...", jobs.len());
    let results = run_campaigns(campaign, jobs, args.seed, args.parallel).await;
    if results.is_empty() {
        warn!("No campaign completed");
    }

    let path = report::Report::new(&config, args.seed, &personas, &assignments, &results)
        .write(&args.output_dir)?;
    info!("Report written to {}", path.display());
    println!("{}", path.display());
    Ok(())
}
