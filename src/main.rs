use anyhow::{Context, Result};
use chrono::Local;
use iblimap::{
    calculator::LivestockCounts,
    calendar::current_season,
    fetch::{DataSource, DirSource, HttpSource},
    view, AppConfig, DivisionIndexStore,
};
use reqwest::Client;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,iblimap=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = AppConfig::load().context("loading configuration")?;

    // ─── 3) pick a data source and run ───────────────────────────────
    match &config.data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading data files from disk");
            let source = DirSource::new(dir, config.paths.clone());
            run(source, &config).await
        }
        None => {
            let base = config.backend_url()?;
            info!(backend = %base, "fetching data files over HTTP");
            let source = HttpSource::new(Client::new(), &base, config.paths.clone());
            run(source, &config).await
        }
    }
}

async fn run<S: DataSource>(source: S, config: &AppConfig) -> Result<()> {
    let store = DivisionIndexStore::new(source, config.classification, config.fetch_timeout());

    store.initialize().await.context("loading index data")?;
    if let Ok(period) = env::var("IBLI_PERIOD") {
        store
            .set_period(&period)
            .await
            .with_context(|| format!("switching to period {}", period))?;
    }

    let snapshot = store
        .snapshot()
        .context("store has no data after a successful load")?;
    info!(
        status = store.status().as_str(),
        period = %snapshot.period,
        periods = snapshot.catalog.len(),
        divisions = snapshot.values.len(),
        season = current_season(Local::now().date_naive()).as_str(),
        "ready"
    );

    // ─── 4) emit view models ─────────────────────────────────────────
    let model = view::render_model(&snapshot, store.classification());
    println!("{}", serde_json::to_string_pretty(&model)?);

    if let Ok(raw) = env::var("IBLI_DIVISION") {
        let division = raw
            .trim()
            .parse()
            .with_context(|| format!("IBLI_DIVISION={} is not a division id", raw))?;
        let rates = store.rates();
        let today = Local::now().date_naive();

        match view::popup_content(&snapshot, rates.as_deref(), division, today) {
            Some(popup) => println!("{}", serde_json::to_string_pretty(&popup)?),
            None => warn!(division, "division not found in geometry"),
        }

        if let Ok(herd) = env::var("IBLI_HERD") {
            let counts = parse_herd(&herd)?;
            let quote = view::premium_quote(
                &snapshot,
                rates.as_deref(),
                division,
                &counts,
                &config.valuations,
            );
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }

    info!("all done");
    Ok(())
}

/// `"cows,camels,goats"`; blank fields count as zero.
fn parse_herd(raw: &str) -> Result<LivestockCounts> {
    let mut fields = raw.split(',').map(|f| {
        let f = f.trim();
        if f.is_empty() {
            Ok(None)
        } else {
            f.parse::<u32>()
                .map(Some)
                .with_context(|| format!("herd count {:?} is not a whole number", f))
        }
    });
    let mut next = || fields.next().transpose().map(Option::flatten);
    Ok(LivestockCounts::from_inputs(next()?, next()?, next()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herd_parsing() {
        let c = parse_herd("2,,1").unwrap();
        assert_eq!((c.cows, c.camels, c.sheep_goats), (2, 0, 1));
        let c = parse_herd("4").unwrap();
        assert_eq!((c.cows, c.camels, c.sheep_goats), (4, 0, 0));
        assert!(parse_herd("two").is_err());
    }
}
