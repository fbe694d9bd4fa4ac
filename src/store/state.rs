use std::{fmt, sync::Arc};

use super::IndexSnapshot;

/// Which period a resolution was asked for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PeriodRequest {
    /// Whatever the index data's most recent period turns out to be.
    Latest,
    Exact(String),
}

impl fmt::Display for PeriodRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodRequest::Latest => f.write_str("latest"),
            PeriodRequest::Exact(v) => f.write_str(v),
        }
    }
}

/// Coarse lifecycle phase, for callers that only need to branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    Uninitialized,
    Loading,
    Ready,
    Error,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Uninitialized => "Uninitialized",
            StoreStatus::Loading => "Loading",
            StoreStatus::Ready => "Ready",
            StoreStatus::Error => "Error",
        }
    }
}

/// Loading and Error keep the last good snapshot so the map is never
/// blanked while refreshing or after a failed refresh.
#[derive(Debug, Clone, Default)]
pub(crate) enum State {
    #[default]
    Uninitialized,
    Loading {
        request: PeriodRequest,
        previous: Option<Arc<IndexSnapshot>>,
    },
    Ready(Arc<IndexSnapshot>),
    Error {
        message: String,
        previous: Option<Arc<IndexSnapshot>>,
    },
}

impl State {
    pub(crate) fn status(&self) -> StoreStatus {
        match self {
            State::Uninitialized => StoreStatus::Uninitialized,
            State::Loading { .. } => StoreStatus::Loading,
            State::Ready(_) => StoreStatus::Ready,
            State::Error { .. } => StoreStatus::Error,
        }
    }

    /// The snapshot to display: the ready one, or the one retained from
    /// before the current load/failure.
    pub(crate) fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        match self {
            State::Uninitialized => None,
            State::Ready(s) => Some(Arc::clone(s)),
            State::Loading { previous, .. } | State::Error { previous, .. } => previous.clone(),
        }
    }

    /// The displayed snapshot, if it already shows exactly what `request`
    /// would produce. Also holds while loading or after a failure.
    pub(crate) fn showing(&self, request: &PeriodRequest) -> Option<Arc<IndexSnapshot>> {
        self.snapshot().filter(|s| match request {
            PeriodRequest::Exact(v) => s.period.value == *v,
            PeriodRequest::Latest => s.catalog.first() == Some(&s.period),
        })
    }

    pub(crate) fn loading(&self, request: &PeriodRequest) -> bool {
        matches!(self, State::Loading { request: r, .. } if r == request)
    }
}
