use anyhow::{bail, Context, Result};
use iblimap::{
    classify::{ColorBand, Shade},
    index::parse_index_csv,
    AppConfig,
};
use std::{collections::BTreeMap, env, fs};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = match env::args().nth(1) {
        Some(p) => p,
        None => bail!("usage: inspect_index <index.csv>"),
    };
    let config = AppConfig::load().context("loading configuration")?;

    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let table = parse_index_csv(&raw).with_context(|| format!("parsing {}", path))?;
    info!(path = %path, periods = table.periods().len(), "parsed");

    match table.latest() {
        Some(p) => println!("latest: {} ({})", p.value, p.label()),
        None => println!("no period columns found"),
    }

    for period in table.periods() {
        let values = table.values(&period.value).cloned().unwrap_or_default();
        let mut counts: BTreeMap<ColorBand, usize> = BTreeMap::new();
        let mut unclassified = 0usize;
        for v in values.values() {
            match config.classification.shade(*v) {
                Shade::Band(b) => *counts.entry(b).or_default() += 1,
                Shade::NoData => unclassified += 1,
            }
        }

        let bands: Vec<String> = ColorBand::ALL
            .iter()
            .map(|b| format!("{}={}", b.as_str(), counts.get(b).copied().unwrap_or(0)))
            .collect();
        println!(
            "{:<8} {:<20} divisions={:<5} {} unclassified={}",
            period.value,
            period.label(),
            values.len(),
            bands.join(" "),
            unclassified
        );
    }

    Ok(())
}
