use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use neodao::rpc::bridge::{RpcBridge, Signer};
use neodao::rpc::contract::{ContractConfig, NeodaoContract};
use neodao::types::ApiEnvelope;
use neodao::{bulk, cache, config, output, service, sources};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "neodao",
    about = "Cached crypto prices and Neodao contract summaries from a NEO N3 node"
)]
struct Args {
    /// Path to config YAML file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output format: "table" (default) or "json" (response envelope)
    #[arg(short, long, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price one asset
    Price {
        #[arg(short, long)]
        symbol: String,

        /// Defaults to price_api.default_currency
        #[arg(long)]
        currency: Option<String>,

        /// Skip the cache and fetch from the price API
        #[arg(long)]
        force: bool,
    },
    /// Price several assets in one currency (defaults to the configured assets)
    Prices {
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,

        #[arg(long)]
        currency: Option<String>,
    },
    /// List every DAO registered in the contract
    Daos,
    /// Show one DAO
    Dao {
        #[arg(long)]
        id: i64,
    },
    /// List the proposals of one DAO
    Proposals {
        #[arg(long)]
        dao_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let json = args.output == "json";

    let cfg = config::Config::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    info!(
        "Loaded {} tracked asset(s); price source '{}'",
        cfg.assets.len(),
        cfg.price_api.source_id
    );

    let client = reqwest::Client::builder()
        .user_agent("neodao/0.1")
        .timeout(cfg.http.timeout())
        .build()
        .context("building HTTP client")?;

    match args.command {
        Command::Price {
            symbol,
            currency,
            force,
        } => {
            let prices = price_service(&cfg, client);
            let currency = currency.unwrap_or_else(|| prices.default_currency().to_string());
            let result = prices.get_price(&symbol, &currency, Utc::now(), force).await;
            if json {
                output::print_json(&ApiEnvelope::from_result(result))?;
            } else {
                output::print_price_table(&[&result?]);
            }
        }
        Command::Prices { symbols, currency } => {
            let prices = price_service(&cfg, client);
            let currency = currency.unwrap_or_else(|| prices.default_currency().to_string());
            let symbols = if symbols.is_empty() {
                cfg.assets.clone()
            } else {
                symbols
            };

            let bulk_prices = bulk::BulkPriceService::new(prices.clone());
            let result = bulk_prices
                .get_prices(&symbols, &currency, Utc::now())
                .await
                .and_then(bulk::build_lookup);
            info!("{} asset(s) now cached", prices.cache().len());
            if json {
                output::print_json(&ApiEnvelope::from_result(result))?;
            } else {
                let lookup = result?;
                let ordered: Vec<_> = symbols.iter().filter_map(|s| lookup.get(s)).collect();
                output::print_price_table(&ordered);
            }
        }
        Command::Daos => {
            let result = contract(client)?.list_daos().await;
            if json {
                output::print_json(&ApiEnvelope::from_contract_result(result))?;
            } else {
                output::print_dao_table(&result?);
            }
        }
        Command::Dao { id } => {
            let result = contract(client)?.get_dao(id).await;
            if json {
                output::print_json(&ApiEnvelope::from_contract_result(result))?;
            } else {
                output::print_dao_table(&[result?]);
            }
        }
        Command::Proposals { dao_id } => {
            let result = contract(client)?.list_proposals(dao_id).await;
            if json {
                output::print_json(&ApiEnvelope::from_contract_result(result))?;
            } else {
                output::print_proposal_table(&result?);
            }
        }
    }

    Ok(())
}

fn price_service(cfg: &config::Config, client: reqwest::Client) -> Arc<service::CachingPriceService> {
    let api_key = std::env::var("CRYPTOCOMPARE_API_KEY").ok();
    if api_key.is_none() {
        tracing::warn!("CRYPTOCOMPARE_API_KEY not set; using the anonymous rate limit");
    }

    let source = sources::cryptocompare::CryptoCompare::new(
        client,
        cfg.price_api.base_url.clone(),
        api_key,
        cfg.price_api.source_id.clone(),
        cfg.http.retry_backoff(),
    );
    let cache = Arc::new(cache::PriceCache::new());
    Arc::new(
        service::CachingPriceService::new(cache, Arc::new(source))
            .with_freshness_window(TimeDelta::milliseconds(cfg.price_api.freshness_window_ms))
            .with_default_currency(cfg.price_api.default_currency.clone()),
    )
}

fn contract(client: reqwest::Client) -> Result<NeodaoContract> {
    let contract_cfg = ContractConfig::from_env().context("loading contract config")?;
    info!(
        "Contract {} via {}",
        contract_cfg.script_hash, contract_cfg.rpc_url
    );
    let signers = contract_cfg
        .signer
        .map(|account| Signer {
            account,
            scopes: "CalledByEntry".to_string(),
        })
        .into_iter()
        .collect();
    let bridge = RpcBridge::new(client, contract_cfg.rpc_url, contract_cfg.script_hash)
        .with_signers(signers);
    Ok(NeodaoContract::new(Arc::new(bridge)))
}
