//! CLI commands and handlers

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::application::monitor::DrawdownMonitor;
use crate::domain::drawdown::frequency_map;
use crate::infrastructure::market::{FearGreedClient, YahooChartClient};
use crate::infrastructure::persistence::JsonStateStore;
use crate::shared::errors::AppError;
use crate::shared::types::WatchConfig;

#[derive(Parser)]
#[command(name = "indexwatch")]
#[command(version, about = "Index drawdown monitor with hysteresis alerts")]
pub struct Cli {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the periodic monitoring loop
    Run {
        /// Override check interval in seconds
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Run a single evaluation cycle and exit
    Tick,

    /// Print current drawdown metrics and historical frequency
    Report {
        /// Only report this symbol
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Show configured thresholds, armed alerts and cache statistics
    Status,
}

/// Builds the component graph once and dispatches subcommands onto it
pub struct CommandExecutor {
    monitor: Arc<DrawdownMonitor>,
}

impl CommandExecutor {
    pub fn new(config: WatchConfig) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let price_source = Arc::new(YahooChartClient::new(timeout)?);
        let sentiment_source = Arc::new(FearGreedClient::new(timeout)?);
        let store = Arc::new(JsonStateStore::new(config.state_path.clone()));
        let monitor = Arc::new(DrawdownMonitor::new(
            config,
            price_source,
            sentiment_source,
            store,
        ));
        Ok(Self { monitor })
    }

    pub async fn execute(&self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Run { .. } => self.run().await,
            Commands::Tick => self.tick().await,
            Commands::Report { symbol } => self.report(symbol).await,
            Commands::Status => self.status().await,
        }
    }

    async fn run(&self) -> Result<(), AppError> {
        self.monitor.hydrate_state().await;
        self.monitor.run_monitoring_loop().await;
        Ok(())
    }

    async fn tick(&self) -> Result<(), AppError> {
        self.monitor.hydrate_state().await;
        let report = self.monitor.run_tick().await;
        self.monitor.persist_state(&report.armed).await;

        if report.events.is_empty() {
            println!("No alerts this cycle");
        }
        for event in &report.events {
            let pct_of_history = if event.total_days > 0 {
                event.day_count as f64 / event.total_days as f64 * 100.0
            } else {
                0.0
            };
            println!(
                "🚨 {} drawdown {:.2}% crossed -{}% (historically {} of {} days, {:.1}%)",
                event.display_name,
                event.drawdown_pct,
                event.threshold_pct,
                event.day_count,
                event.total_days,
                pct_of_history
            );
        }
        Ok(())
    }

    async fn report(&self, only_symbol: Option<String>) -> Result<(), AppError> {
        println!("📈 Index Watch report");
        let config = self.monitor.config().clone();

        for index in config
            .indices
            .iter()
            .filter(|index| only_symbol.as_deref().map_or(true, |s| s == index.symbol))
        {
            match self.monitor.get_metrics(&index.symbol).await {
                Ok(Some((metrics, fetched_at))) => {
                    println!(
                        "\n📊 {} (as of {})",
                        index.display_name,
                        fetched_at.format("%Y-%m-%d %H:%M UTC")
                    );
                    println!("   Current price:        {:.2}", metrics.current_price);
                    println!("   All-time high:        {:.2}", metrics.ath);
                    println!("   Current drawdown:     {:.2}%", metrics.current_drawdown_pct);
                    println!(
                        "   Lowest since ATH:     {:.2} ({:.2}%)",
                        metrics.lowest_since_ath, metrics.drawdown_at_lowest_pct
                    );
                    println!("   Gain from lowest:     +{:.2}%", metrics.gain_from_lowest_pct);
                    println!(
                        "   Gain to ATH (now):    +{:.2}%",
                        metrics.gain_to_ath_from_current_pct
                    );
                    println!(
                        "   Gain to ATH (lowest): +{:.2}%",
                        metrics.gain_to_ath_from_lowest_pct
                    );

                    if let Some((series, degraded)) = self.monitor.get_series(&index.symbol).await
                    {
                        let freq = frequency_map(&series.closes, &config.thresholds_pct);
                        let total_days = series.closes.len();
                        println!("   Days at or below drawdown ({} trading days):", total_days);
                        let mut thresholds = config.thresholds_pct.clone();
                        thresholds.sort_unstable();
                        for threshold in thresholds {
                            let count = freq.get(&threshold).copied().unwrap_or(0);
                            let pct = if total_days > 0 {
                                count as f64 / total_days as f64 * 100.0
                            } else {
                                0.0
                            };
                            println!("     -{}%: {} days ({:.1}%)", threshold, count, pct);
                        }
                        if degraded {
                            println!("   ⚠️  Stale data (fresh fetch unavailable)");
                        }
                    }
                }
                Ok(None) => println!("\n⚠️  {}: market data unavailable", index.display_name),
                Err(e) => println!("\n❌ {}: {}", index.display_name, e),
            }
        }

        match self.monitor.get_sentiment().await {
            Some((reading, _)) => println!(
                "\n😨 Fear & Greed Index: {:.1} ({}, updated {})",
                reading.value, reading.description, reading.last_update
            ),
            None => println!("\n😐 Fear & Greed Index: unavailable"),
        }
        Ok(())
    }

    async fn status(&self) -> Result<(), AppError> {
        let config = self.monitor.config();
        let thresholds: Vec<String> = config
            .thresholds_pct
            .iter()
            .map(|t| format!("-{}%", t))
            .collect();
        let indices: Vec<String> = config
            .indices
            .iter()
            .map(|i| i.display_name.clone())
            .collect();

        println!("🔧 indexwatch status");
        println!("   Indices: {}", indices.join(", "));
        println!("   Alert thresholds: {}", thresholds.join(", "));
        println!("   Check interval: {}s", config.check_interval_secs);
        println!("   History window: {} years", config.history_years);
        println!("   Cache TTL: {}s", config.cache_ttl_secs);

        self.monitor.hydrate_state().await;
        let armed = self.monitor.armed_alerts().await;
        if armed.is_empty() {
            println!("   Armed alerts: none");
        } else {
            let mut keys: Vec<_> = armed.into_iter().collect();
            keys.sort_by_key(|key| (key.symbol.clone(), key.threshold_pct));
            for key in keys {
                println!("   Armed: {} at -{}%", key.symbol, key.threshold_pct);
            }
        }

        let (history, sentiment) = self.monitor.cache_stats().await;
        println!(
            "   History cache: {} entries, {} hits / {} misses / {} expirations",
            history.entries, history.hits, history.misses, history.expirations
        );
        println!(
            "   Sentiment cache: {} entries, {} hits / {} misses / {} expirations",
            sentiment.entries, sentiment.hits, sentiment.misses, sentiment.expirations
        );
        Ok(())
    }
}
