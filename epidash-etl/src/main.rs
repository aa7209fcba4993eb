//! epidash-etl - recurring pipeline behind the epidash dashboard
//!
//! One invocation runs every source job (fetch → normalize → store),
//! then every view job (read back → aggregate → publish). Jobs are
//! independent; the run always attempts all of them and exits non-zero
//! if any failed.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use epidash_common::config::Settings;
use epidash_common::db::init_pool;
use epidash_common::db::models::Metric;
use epidash_etl::jobs::{run_job, RunSummary};
use epidash_etl::sources::jhu::JhuDataset;
use epidash_etl::views::ViewContext;
use epidash_etl::{normalize, sources, store, views, EtlResult};

#[derive(Parser, Debug)]
#[command(name = "epidash-etl", version, about = "Epidemiological data pipeline")]
struct Args {
    /// Store connection string (overrides EPIDASH_DB)
    #[arg(long)]
    database_url: Option<String>,

    /// Directory for published view snapshots (overrides EPIDASH_SNAPSHOT_DIR)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Local-authority population reference CSV (overrides EPIDASH_POPULATION_FILE)
    #[arg(long)]
    population_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting epidash-etl v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let settings = Settings::resolve(args.database_url, args.snapshot_dir, args.population_file)?;
    info!("Snapshot directory: {}", settings.snapshot_dir.display());

    let pool = init_pool(&settings.database_url).await?;
    let client = sources::http_client()?;

    let mut summary = RunSummary::default();

    // Phase 1: source jobs, each independent of its siblings
    for (dataset, metric) in [
        (JhuDataset::GlobalCases, Metric::Cases),
        (JhuDataset::GlobalDeaths, Metric::Deaths),
        (JhuDataset::UsCases, Metric::Cases),
        (JhuDataset::UsDeaths, Metric::Deaths),
    ] {
        summary.push(
            run_job(dataset.source_id(), || {
                jhu_series_job(&pool, &client, dataset, metric)
            })
            .await,
        );
    }

    summary.push(
        run_job(store::JHU_LOOKUP, || async {
            let raw = sources::jhu::fetch(&client, JhuDataset::Lookup).await?;
            let records = normalize::jhu::normalize_lookup(&raw)?;
            store::persist_lookup(&pool, &records).await
        })
        .await,
    );

    summary.push(
        run_job(store::UK_LOCAL_CASES, || async {
            let api = sources::uk::UkApiClient::new(client.clone());
            let rows = api.fetch_local_authority_cases().await?;
            let records = normalize::uk::normalize_local_authority(rows)?;
            store::persist_uk_local(&pool, &records).await
        })
        .await,
    );

    summary.push(
        run_job(store::OWID_VACCINATIONS, || async {
            let raw = sources::owid::fetch(&client).await?;
            let observations = normalize::owid::normalize_vaccinations(&raw)?;
            store::persist_vaccinations(&pool, &observations).await
        })
        .await,
    );

    // Phase 2: views, strictly after every source job (they read the store)
    let ctx = ViewContext {
        pool: pool.clone(),
        snapshot_dir: settings.snapshot_dir.clone(),
        population_file: settings.population_file.clone(),
    };

    summary.push(run_job(views::daily::GLOBAL_BY_DAY, || views::daily::build_global(&ctx)).await);
    summary.push(
        run_job(views::daily::CONTINENTS_BY_DAY, || {
            views::daily::build_continents(&ctx)
        })
        .await,
    );
    summary.push(
        run_job(views::trajectories::COUNTRY_TRAJECTORIES, || {
            views::trajectories::build(&ctx)
        })
        .await,
    );
    summary.push(run_job(views::geo::GEO_TIME_EVOLUTION, || views::geo::build(&ctx)).await);
    summary.push(run_job(views::local_uk::LOCAL_UK, || views::local_uk::build(&ctx)).await);
    summary.push(
        run_job(views::vaccinations::VACCINATIONS_BY_DAY, || {
            views::vaccinations::build_by_day(&ctx)
        })
        .await,
    );
    summary.push(
        run_job(views::vaccinations::VACCINATIONS_BY_CONTINENT, || {
            views::vaccinations::build_by_continent(&ctx)
        })
        .await,
    );

    summary.log();

    if !summary.all_ok() {
        anyhow::bail!("{} of {} jobs failed", summary.failed(), summary.outcomes.len());
    }

    Ok(())
}

/// Fetch, normalize and store one JHU wide time series
async fn jhu_series_job(
    pool: &sqlx::SqlitePool,
    client: &reqwest::Client,
    dataset: JhuDataset,
    metric: Metric,
) -> EtlResult<u64> {
    let raw = sources::jhu::fetch(client, dataset).await?;
    let spec = match dataset {
        JhuDataset::UsCases | JhuDataset::UsDeaths => normalize::jhu::us_schema(metric),
        _ => normalize::jhu::global_schema(metric),
    };
    let observations = normalize::melt(&raw, &spec)?;
    store::persist_observations(pool, dataset.source_id(), metric, &observations).await
}
