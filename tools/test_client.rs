//! Test Candle Client
//!
//! Generates synthetic OHLCV candles and posts them to the price signal
//! server's `/predict` endpoint.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Candle payload matching the server's recognised keys
#[derive(Debug, Clone, Serialize)]
struct Candle {
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    #[serde(rename = "VWAP")]
    vwap: f64,
    #[serde(rename = "Count")]
    count: u32,
    timestamp: String,
    #[serde(rename = "Asset_ID")]
    asset_id: String,
    #[serde(rename = "Asset_Name")]
    asset_name: String,
}

/// Random-walk candle generator
struct CandleGenerator {
    rng: rand::rngs::ThreadRng,
    asset_id: String,
    asset_name: String,
    last_close: f64,
}

impl CandleGenerator {
    fn new(asset_id: &str, asset_name: &str, start_price: f64) -> Self {
        Self {
            rng: rand::thread_rng(),
            asset_id: asset_id.to_string(),
            asset_name: asset_name.to_string(),
            last_close: start_price,
        }
    }

    fn next_candle(&mut self) -> Candle {
        let open = self.last_close;
        let drift: f64 = self.rng.gen_range(-0.02..0.02);
        let close = (open * (1.0 + drift)).max(0.01);
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..0.01));
        let vwap = self.rng.gen_range(low..=high);
        self.last_close = close;

        Candle {
            open,
            high,
            low,
            close,
            volume: self.rng.gen_range(10.0..5000.0),
            vwap,
            count: self.rng.gen_range(1..500),
            timestamp: Utc::now().to_rfc3339(),
            asset_id: self.asset_id.clone(),
            asset_name: self.asset_name.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Candle Client");

    let args: Vec<String> = std::env::args().collect();
    let server_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("http://localhost:5000/predict");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(500);
    let asset_id = args.get(4).map(|s| s.as_str()).unwrap_or("1");
    let asset_name = args.get(5).map(|s| s.as_str()).unwrap_or("Bitcoin");

    info!(
        server_url = %server_url,
        count = count,
        delay_ms = delay_ms,
        asset_id = %asset_id,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let mut generator = CandleGenerator::new(asset_id, asset_name, 30_000.0);

    let mut buys = 0u64;
    let mut holds = 0u64;
    let mut failures = 0u64;

    for i in 0..count {
        let candle = generator.next_candle();

        let response = match client.post(server_url).json(&candle).send().await {
            Ok(r) => r,
            Err(e) if i == 0 && e.is_connect() => {
                warn!(error = %e, "Server unreachable. Running in dry-run mode.");
                return run_dry_mode(generator, count, delay_ms).await;
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        let body: Value = response.json().await?;

        if status.is_success() {
            match body["signal"].as_str() {
                Some("Buy") => buys += 1,
                _ => holds += 1,
            }
            info!(
                seq = %body["log_row"]["Data No."],
                close = format!("{:.2}", candle.close),
                signal = %body["signal"],
                "Prediction received"
            );
        } else {
            failures += 1;
            warn!(status = %status, error = %body["error"], "Prediction failed");
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} candles ({} buy, {} sell/hold, {} failed)",
        count, buys, holds, failures
    );

    Ok(())
}

async fn run_dry_mode(
    mut generator: CandleGenerator,
    count: u64,
    delay_ms: u64,
) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no server connection)");

    for i in 0..count {
        let candle = generator.next_candle();
        let json = serde_json::to_string_pretty(&candle)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample candle {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
