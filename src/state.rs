use std::path::PathBuf;

use crate::config::RegistryConfig;
use crate::data::filter::{parse_name_list, parse_single_name};
use crate::data::loader::{load_in_background, PendingLoad};
use crate::data::model::RecordStore;
use crate::error::{EngineError, LoadError};
use crate::views::{
    gender_share, gender_trends, name_trends, regional_popularity, RegionalMap, ShareChart,
    TrendChart,
};

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// A user request, carrying the raw text typed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VizRequest {
    /// Comma-separated names, one line each.
    NameTrends(String),
    /// One name, births per department.
    RegionalPopularity(String),
    /// One name, one line per sex.
    GenderTrends(String),
    /// One name, male/female shares per decade.
    GenderShare(String),
}

#[derive(Debug, Clone)]
pub enum VizResponse {
    NameTrends(TrendChart),
    RegionalPopularity(RegionalMap),
    GenderTrends(TrendChart),
    GenderShare(ShareChart),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Where the one-off dataset load stands.
#[derive(Debug, Clone)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Ready(RecordStore),
    Failed(String),
}

/// Owns the dataset lifecycle and answers requests against it.
pub struct AppState {
    pub config: RegistryConfig,

    load: LoadState,

    /// Worker of an in-flight load.
    pending: Option<PendingLoad>,

    /// Status / error message for the user.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl AppState {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            load: LoadState::NotLoaded,
            pending: None,
            status_message: None,
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading)
    }

    /// Start loading `path` in the background. Requests fail with
    /// [`EngineError::NotLoaded`] until [`AppState::poll_load`] sees it finish.
    pub fn begin_load(&mut self, path: PathBuf) {
        log::info!("Loading {}", path.display());
        self.pending = Some(load_in_background(path, self.config.clone()));
        self.load = LoadState::Loading;
        self.status_message = None;
    }

    /// Check the background load. Returns `true` once it has finished,
    /// successfully or not.
    pub fn poll_load(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return !self.is_loading();
        };
        match pending.try_finish() {
            Some(result) => {
                self.pending = None;
                self.finish_load(result);
                true
            }
            None => false,
        }
    }

    /// Block until the background load has finished.
    pub fn wait_for_load(&mut self) {
        if let Some(pending) = self.pending.take() {
            let result = pending.wait();
            self.finish_load(result);
        }
    }

    /// Record the outcome of a load.
    pub fn finish_load(&mut self, result: Result<RecordStore, LoadError>) {
        match result {
            Ok(store) => self.set_store(store),
            Err(e) => {
                log::warn!("Failed to load dataset: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.load = LoadState::Failed(e.to_string());
            }
        }
    }

    /// Ingest a loaded store.
    pub fn set_store(&mut self, store: RecordStore) {
        log::info!("{} records ready", store.len());
        self.load = LoadState::Ready(store);
        self.status_message = None;
    }

    /// The store, once loaded.
    pub fn store(&self) -> Result<&RecordStore, EngineError> {
        match &self.load {
            LoadState::Ready(store) => Ok(store),
            _ => Err(EngineError::NotLoaded),
        }
    }

    /// Answer one request. Fails with `NotLoaded` before the store is ready
    /// and with `EmptyInput` when no name is left after normalisation; a
    /// name without records yields an empty chart.
    pub fn handle_viz_request(&self, request: &VizRequest) -> Result<VizResponse, EngineError> {
        let store = self.store()?;

        let response = match request {
            VizRequest::NameTrends(input) => {
                let names = parse_name_list(input);
                if names.is_empty() {
                    return Err(EngineError::EmptyInput);
                }
                VizResponse::NameTrends(name_trends(store, &names))
            }
            VizRequest::RegionalPopularity(input) => {
                let name = parse_single_name(input).ok_or(EngineError::EmptyInput)?;
                VizResponse::RegionalPopularity(regional_popularity(store, &name))
            }
            VizRequest::GenderTrends(input) => {
                let name = parse_single_name(input).ok_or(EngineError::EmptyInput)?;
                VizResponse::GenderTrends(gender_trends(store, &name))
            }
            VizRequest::GenderShare(input) => {
                let name = parse_single_name(input).ok_or(EngineError::EmptyInput)?;
                VizResponse::GenderShare(gender_share(store, &name, self.config.share_basis))
            }
        };
        Ok(response)
    }
}
