//! Command execution.

use crate::args::{BatchArgs, CheckArgs, Cli, Commands};
use crate::{input, output};
use anyhow::{bail, Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use verity_client::{BatchOptions, BatchSummary, ProbeClient};
use verity_core::{is_valid_email, AppConfig, ProbeKey, ProxyConfig};
use verity_http::HttpProbe;

/// Load configuration and run the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_with_env(cli.config.as_deref())
        .context("failed to load configuration")?;

    match &cli.command {
        Commands::Check(args) => check(&config, args).await,
        Commands::Batch(args) => batch(&config, args).await,
        Commands::Config => show_config(&config),
    }
}

fn build_client(config: &AppConfig) -> Result<ProbeClient> {
    let probe = HttpProbe::new(&config.probe).context("failed to create HTTP probe")?;
    info!(endpoint = probe.endpoint(), "Probe ready");
    Ok(ProbeClient::new(Arc::new(probe), config.client.clone()))
}

async fn check(config: &AppConfig, args: &CheckArgs) -> Result<()> {
    let email = input::clean_identifier(&args.email);
    if email.is_empty() {
        bail!("email is required");
    }
    if !is_valid_email(email) {
        bail!("invalid email format: {email}");
    }

    let proxy = args.proxy.as_deref().map(ProxyConfig::parse).transpose()?;
    let mut client = build_client(config)?;
    let key = ProbeKey::new(email);

    let result = client.validate(&key, proxy.as_ref()).await?;
    println!("Result\n------\n{}", output::single_line(&key, &result));
    Ok(())
}

async fn batch(config: &AppConfig, args: &BatchArgs) -> Result<()> {
    let keys = match (&args.list, &args.file) {
        (Some(list), _) => input::parse_inline_list(list),
        (None, Some(path)) => input::load_from_file(path)?,
        (None, None) => bail!("either --list or --file is required"),
    };
    input::check_batch_size(&keys, config.batch.max_batch_size)?;

    let proxies = args
        .proxies
        .iter()
        .map(|p| ProxyConfig::parse(p))
        .collect::<verity_core::Result<Vec<_>>>()?;

    let mut options = BatchOptions::from_config(&config.batch);
    if let Some(delay) = args.delay {
        options = options.with_delay(Duration::from_millis(delay));
    }
    if let Some(stop) = args.stop_policy() {
        options = options.with_stop_on_error(stop);
    }
    if !proxies.is_empty() {
        options = options.with_proxies(proxies);
    }

    let mut client = build_client(config)?;
    let results = client.validate_batch(&keys, &options).await;
    let summary = BatchSummary::from_results(&results);
    let stats = client.stats();

    if args.json {
        let report = json!({
            "summary": summary,
            "results": results,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Processed {} email(s) with {} ms delay{}.\n",
        results.len(),
        options.delay.as_millis(),
        if options.proxies.is_empty() { "" } else { " via proxy" }
    );
    print!("{}", output::batch_table(&results));
    println!();
    print!("{}", output::summary_block(&summary));
    println!();
    print!("{}", output::stats_block(&stats));
    Ok(())
}

fn show_config(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
