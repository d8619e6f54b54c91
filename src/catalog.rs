//! Reciter and radio catalog client and the background worker that keeps
//! network calls off the UI thread.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use ureq::Agent;

use crate::i18n::Lang;
use crate::models::{Radio, Read, Reciter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog returned HTTP status {0}")]
    Status(u16),
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog payload could not be decoded: {0}")]
    Decode(String),
    #[error("catalog worker is not running")]
    WorkerGone,
}

impl From<ureq::Error> for CatalogError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => CatalogError::Status(code),
            other => CatalogError::Transport(other.to_string()),
        }
    }
}

/// Where reciters, their reads and the radio stations come from.
pub trait CatalogSource: Send + Sync {
    fn reciters(&self, lang: Lang) -> Result<Vec<Reciter>, CatalogError>;
    fn reads(&self, reciter_id: u32, lang: Lang) -> Result<Vec<Read>, CatalogError>;
    fn radios(&self, lang: Lang) -> Result<Vec<Radio>, CatalogError>;
}

#[derive(Debug, Default, Deserialize)]
struct RecitersPayload {
    #[serde(default)]
    reciters: Vec<Reciter>,
}

/// Decode a `/reciters` response body.
pub fn parse_reciters(body: &str) -> Result<Vec<Reciter>, CatalogError> {
    let payload: RecitersPayload =
        serde_json::from_str(body).map_err(|err| CatalogError::Decode(err.to_string()))?;
    Ok(payload.reciters)
}

#[derive(Debug, Default, Deserialize)]
struct RadiosPayload {
    #[serde(default)]
    radios: Vec<Radio>,
}

/// Decode a `/radios` response body.
pub fn parse_radios(body: &str) -> Result<Vec<Radio>, CatalogError> {
    let payload: RadiosPayload =
        serde_json::from_str(body).map_err(|err| CatalogError::Decode(err.to_string()))?;
    Ok(payload.radios)
}

/// Decode a `/reciters?reciter=ID` response body: the reads of the first
/// reciter, or nothing.
pub fn parse_reads(body: &str) -> Result<Vec<Read>, CatalogError> {
    Ok(parse_reciters(body)?
        .into_iter()
        .next()
        .map(|reciter| reciter.reads)
        .unwrap_or_default())
}

/// HTTP client for the mp3quran.net v3 API.
pub struct Mp3QuranClient {
    agent: Agent,
    base_url: String,
}

impl Mp3QuranClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, CatalogError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut request = self.agent.get(url.as_str());
        for (key, value) in query {
            request = request.query(key, value);
        }
        let mut response = request.call()?;
        response
            .body_mut()
            .read_to_string()
            .map_err(|err| CatalogError::Transport(err.to_string()))
    }
}

impl CatalogSource for Mp3QuranClient {
    fn reciters(&self, lang: Lang) -> Result<Vec<Reciter>, CatalogError> {
        let body = self.get("reciters", &[("language", lang.tag().to_string())])?;
        let reciters = parse_reciters(&body)?;
        info!(count = reciters.len(), "fetched reciters");
        Ok(reciters)
    }

    fn reads(&self, reciter_id: u32, lang: Lang) -> Result<Vec<Read>, CatalogError> {
        let body = self.get(
            "reciters",
            &[
                ("language", lang.tag().to_string()),
                ("reciter", reciter_id.to_string()),
            ],
        )?;
        let reads = parse_reads(&body)?;
        info!(reciter_id, count = reads.len(), "fetched reads");
        Ok(reads)
    }

    fn radios(&self, lang: Lang) -> Result<Vec<Radio>, CatalogError> {
        let body = self.get("radios", &[("language", lang.tag().to_string())])?;
        let radios = parse_radios(&body)?;
        info!(count = radios.len(), "fetched radios");
        Ok(radios)
    }
}

/// A list plus the error that emptied it, if any. Catalog failures never
/// propagate past this point; the UI shows the error and an empty list.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub items: Vec<T>,
    pub error: Option<CatalogError>,
}

pub fn fetch_or_empty<T>(result: Result<Vec<T>, CatalogError>) -> Fetched<T> {
    match result {
        Ok(items) => Fetched { items, error: None },
        Err(err) => {
            warn!(error = %err, "catalog fetch failed");
            Fetched {
                items: Vec::new(),
                error: Some(err),
            }
        }
    }
}

/// Requests on different lanes are independent; a new request only
/// supersedes the pending one on its own lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogLane {
    Recitations,
    Radios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRequest {
    Reciters { lang: Lang },
    Reads { reciter_id: u32, lang: Lang },
    Radios { lang: Lang },
}

impl CatalogRequest {
    pub fn lane(&self) -> CatalogLane {
        match self {
            CatalogRequest::Reciters { .. } | CatalogRequest::Reads { .. } => {
                CatalogLane::Recitations
            }
            CatalogRequest::Radios { .. } => CatalogLane::Radios,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogPayload {
    Reciters(Fetched<Reciter>),
    Reads { reciter_id: u32, reads: Fetched<Read> },
    Radios(Fetched<Radio>),
}

impl CatalogPayload {
    pub fn lane(&self) -> CatalogLane {
        match self {
            CatalogPayload::Reciters(_) | CatalogPayload::Reads { .. } => CatalogLane::Recitations,
            CatalogPayload::Radios(_) => CatalogLane::Radios,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogResponse {
    pub ticket: u64,
    pub payload: CatalogPayload,
}

/// Runs catalog requests on a worker thread.
///
/// Only the most recent request of each [`CatalogLane`] is wanted: each
/// request gets a ticket, and [`CatalogWorker::poll`] hands back a response
/// only when its ticket is the one pending on its lane.
/// [`CatalogWorker::abandon`] forgets every pending ticket without
/// interrupting the call, so whatever arrives later is dropped.
pub struct CatalogWorker {
    requests: Sender<(u64, CatalogRequest)>,
    responses: Receiver<CatalogResponse>,
    next_ticket: u64,
    pending: HashMap<CatalogLane, u64>,
    undelivered: VecDeque<CatalogResponse>,
}

impl CatalogWorker {
    pub fn spawn(source: Arc<dyn CatalogSource>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<(u64, CatalogRequest)>();
        let (response_tx, response_rx) = unbounded::<CatalogResponse>();

        thread::Builder::new()
            .name("catalog-worker".into())
            .spawn(move || {
                for (ticket, request) in request_rx {
                    let payload = run_request(source.as_ref(), request);
                    if response_tx.send(CatalogResponse { ticket, payload }).is_err() {
                        break;
                    }
                }
                debug!("catalog worker stopped");
            })
            .context("failed to spawn catalog worker")?;

        Ok(Self {
            requests: request_tx,
            responses: response_rx,
            next_ticket: 1,
            pending: HashMap::new(),
            undelivered: VecDeque::new(),
        })
    }

    /// Queue `request`, replacing whatever was pending on its lane.
    pub fn request(&mut self, request: CatalogRequest) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let lane = request.lane();
        self.pending.insert(lane, ticket);
        self.undelivered.retain(|response| response.payload.lane() != lane);

        if self.requests.send((ticket, request)).is_err() {
            warn!(?request, "catalog worker is gone");
            self.undelivered.push_back(CatalogResponse {
                ticket,
                payload: failed_payload(request, CatalogError::WorkerGone),
            });
        }
        ticket
    }

    pub fn abandon(&mut self) {
        for (lane, ticket) in self.pending.drain() {
            debug!(?lane, ticket, "abandoned catalog request");
        }
        self.undelivered.clear();
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending_on(&self, lane: CatalogLane) -> bool {
        self.pending.contains_key(&lane)
    }

    /// Non-blocking. Returns a response to a pending request once it has
    /// arrived; stale responses are discarded along the way.
    pub fn poll(&mut self) -> Option<CatalogResponse> {
        if let Some(response) = self.undelivered.pop_front() {
            self.pending.remove(&response.payload.lane());
            return Some(response);
        }

        while let Ok(response) = self.responses.try_recv() {
            if self.accept(&response) {
                return Some(response);
            }
        }
        None
    }

    /// Blocking variant of [`Self::poll`], for tools and tests.
    pub fn wait(&mut self, timeout: Duration) -> Option<CatalogResponse> {
        if let Some(response) = self.poll() {
            return Some(response);
        }
        let deadline = std::time::Instant::now() + timeout;
        while self.is_pending() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok(response) => {
                    if self.accept(&response) {
                        return Some(response);
                    }
                }
                Err(_) => return None,
            }
        }
        None
    }

    /// Clear the lane of a response whose ticket is pending, or log it as
    /// stale.
    fn accept(&mut self, response: &CatalogResponse) -> bool {
        let lane = response.payload.lane();
        if self.pending.get(&lane) == Some(&response.ticket) {
            self.pending.remove(&lane);
            true
        } else {
            debug!(ticket = response.ticket, ?lane, "discarded stale catalog response");
            false
        }
    }
}

fn run_request(source: &dyn CatalogSource, request: CatalogRequest) -> CatalogPayload {
    match request {
        CatalogRequest::Reciters { lang } => {
            CatalogPayload::Reciters(fetch_or_empty(source.reciters(lang)))
        }
        CatalogRequest::Reads { reciter_id, lang } => CatalogPayload::Reads {
            reciter_id,
            reads: fetch_or_empty(source.reads(reciter_id, lang)),
        },
        CatalogRequest::Radios { lang } => {
            CatalogPayload::Radios(fetch_or_empty(source.radios(lang)))
        }
    }
}

fn failed_payload(request: CatalogRequest, error: CatalogError) -> CatalogPayload {
    match request {
        CatalogRequest::Reciters { .. } => CatalogPayload::Reciters(Fetched {
            items: Vec::new(),
            error: Some(error),
        }),
        CatalogRequest::Reads { reciter_id, .. } => CatalogPayload::Reads {
            reciter_id,
            reads: Fetched {
                items: Vec::new(),
                error: Some(error),
            },
        },
        CatalogRequest::Radios { .. } => CatalogPayload::Radios(Fetched {
            items: Vec::new(),
            error: Some(error),
        }),
    }
}
