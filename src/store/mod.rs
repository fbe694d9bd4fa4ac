// src/store/mod.rs

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tracing::{debug, info, instrument, warn};

use crate::classify::{Classification, Shade};
use crate::error::StoreError;
use crate::fetch::{DataSource, Resource};
use crate::geo::{style_features, DivisionCollection, StyledFeature};
use crate::index::{parse_index_csv, DivisionId, DivisionValues, Period};
use crate::rates::{RateLookup, RatesTable};

pub mod state;

use state::State;
pub use state::{PeriodRequest, StoreStatus};

/// Everything the map needs for one period, built in one go and then
/// only ever replaced, never patched.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub period: Period,
    /// Full period catalog, most recent first.
    pub catalog: Vec<Period>,
    pub values: DivisionValues,
    pub shades: BTreeMap<DivisionId, Shade>,
    pub geometry: Arc<DivisionCollection>,
}

impl IndexSnapshot {
    pub fn shade(&self, division: DivisionId) -> Shade {
        self.shades.get(&division).copied().unwrap_or(Shade::NoData)
    }

    pub fn value(&self, division: DivisionId) -> Option<f64> {
        self.values.get(&division).copied()
    }

    pub fn styled_features(&self) -> Vec<StyledFeature<'_>> {
        style_features(&self.geometry, |id| self.shade(id))
    }
}

/// What a `set_period`-style call ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Fetched, parsed and published.
    Applied,
    /// The requested period was already active; nothing fetched.
    Unchanged,
    /// An identical request is already in flight.
    Pending,
    /// A newer request was issued meanwhile; this result was dropped.
    Superseded,
}

#[derive(Default)]
struct Inner {
    state: State,
    /// Bumped per issued resolution; only the latest may publish.
    generation: u64,
    geometry: Option<Arc<DivisionCollection>>,
    rates: Option<Arc<RatesTable>>,
}

/// Single source of truth for the active period, each division's value
/// and shade, and the premium-rate table.
pub struct DivisionIndexStore<S> {
    source: S,
    classification: Classification,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl<S: DataSource> DivisionIndexStore<S> {
    pub fn new(source: S, classification: Classification, timeout: Duration) -> Self {
        Self {
            source,
            classification,
            timeout,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the most recent period and, concurrently, the rates table. A
    /// rates failure only disables premium display, so it is logged rather
    /// than returned.
    pub async fn initialize(&self) -> Result<Resolution, StoreError> {
        let (index, rates) = futures::join!(self.load_latest(), self.load_rates());
        if let Err(e) = rates {
            warn!(error = %e, "premium rates unavailable");
        }
        index
    }

    pub async fn load_latest(&self) -> Result<Resolution, StoreError> {
        self.resolve(PeriodRequest::Latest).await
    }

    /// Switch to `period`. A no-op when it is already active or already
    /// being loaded.
    pub async fn set_period(&self, period: &str) -> Result<Resolution, StoreError> {
        self.resolve(PeriodRequest::Exact(period.to_string())).await
    }

    #[instrument(level = "info", skip(self, request), fields(request = %request))]
    async fn resolve(&self, request: PeriodRequest) -> Result<Resolution, StoreError> {
        let generation = {
            let mut inner = self.lock();
            if let Some(shown) = inner.state.showing(&request) {
                if inner.state.status() != StoreStatus::Ready {
                    // Drop the in-flight or failed request and go back to what is shown.
                    inner.generation += 1;
                    inner.state = State::Ready(shown);
                }
                debug!("period already active");
                return Ok(Resolution::Unchanged);
            }
            if inner.state.loading(&request) {
                debug!("identical request in flight");
                return Ok(Resolution::Pending);
            }
            inner.generation += 1;
            let previous = inner.state.snapshot();
            inner.state = State::Loading {
                request: request.clone(),
                previous,
            };
            inner.generation
        };

        let outcome = self.build_snapshot(&request).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "discarding stale response");
            return Ok(Resolution::Superseded);
        }
        match outcome {
            Ok(snapshot) => {
                info!(
                    period = %snapshot.period,
                    divisions = snapshot.values.len(),
                    features = snapshot.geometry.len(),
                    "index resolved"
                );
                inner.geometry = Some(Arc::clone(&snapshot.geometry));
                inner.state = State::Ready(Arc::new(snapshot));
                Ok(Resolution::Applied)
            }
            Err(e) => {
                warn!(error = %e, "index resolution failed; keeping previous data");
                let previous = inner.state.snapshot();
                inner.state = State::Error {
                    message: e.to_string(),
                    previous,
                };
                Err(e)
            }
        }
    }

    /// Index first, then geometry: shading needs the resolved values.
    async fn build_snapshot(&self, request: &PeriodRequest) -> Result<IndexSnapshot, StoreError> {
        let raw = self.fetch(Resource::Index).await?;
        let table = parse_index_csv(&raw)?;
        let catalog = table.periods().to_vec();

        let wanted = match request {
            PeriodRequest::Latest => table
                .latest()
                .map(|p| p.value.clone())
                .ok_or(StoreError::NoPeriods)?,
            PeriodRequest::Exact(v) => v.clone(),
        };
        let (period, values) = table
            .into_period(&wanted)
            .ok_or_else(|| StoreError::UnknownPeriod(wanted.clone()))?;

        let cached = self.lock().geometry.clone();
        let geometry = match cached {
            Some(g) => g,
            None => {
                let raw = self.fetch(Resource::Geometry).await?;
                Arc::new(DivisionCollection::from_geojson(&raw)?)
            }
        };

        let shades = values
            .iter()
            .map(|(id, v)| (*id, self.classification.shade(*v)))
            .collect();

        Ok(IndexSnapshot {
            period,
            catalog,
            values,
            shades,
            geometry,
        })
    }

    /// Fetch and keep the rates table. Loaded once; later calls reuse it.
    #[instrument(level = "info", skip(self))]
    pub async fn load_rates(&self) -> Result<(), StoreError> {
        if self.lock().rates.is_some() {
            return Ok(());
        }
        let raw = self.fetch(Resource::Rates).await?;
        let table = RatesTable::from_json(&raw)?;
        info!(divisions = table.len(), "rates loaded");
        self.lock().rates = Some(Arc::new(table));
        Ok(())
    }

    async fn fetch(&self, resource: Resource) -> Result<String, StoreError> {
        match tokio::time::timeout(self.timeout, self.source.fetch(resource)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(source)) => Err(StoreError::Fetch {
                resource: resource.as_str(),
                source,
            }),
            Err(_) => Err(StoreError::Timeout {
                resource: resource.as_str(),
                after: self.timeout,
            }),
        }
    }

    pub fn status(&self) -> StoreStatus {
        self.lock().state.status()
    }

    /// Snapshot to render: current, or the last good one while loading or
    /// after a failure.
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.lock().state.snapshot()
    }

    pub fn last_error(&self) -> Option<String> {
        match &self.lock().state {
            State::Error { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    pub fn active_period(&self) -> Option<Period> {
        self.snapshot().map(|s| s.period.clone())
    }

    pub fn catalog(&self) -> Vec<Period> {
        self.snapshot().map(|s| s.catalog.clone()).unwrap_or_default()
    }

    pub fn rates(&self) -> Option<Arc<RatesTable>> {
        self.lock().rates.clone()
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn color_for(&self, division: DivisionId) -> Shade {
        self.snapshot()
            .map_or(Shade::NoData, |s| s.shade(division))
    }

    /// Premium rate for `division` in the active period.
    pub fn rate_for(&self, division: DivisionId) -> RateLookup {
        let (snapshot, rates) = {
            let inner = self.lock();
            (inner.state.snapshot(), inner.rates.clone())
        };
        match (snapshot, rates) {
            (Some(s), Some(r)) => r.lookup(division, &s.period),
            _ => RateLookup::Unknown,
        }
    }
}
