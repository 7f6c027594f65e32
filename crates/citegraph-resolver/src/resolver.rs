use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use citegraph_core::{normalize_identifier, CitationMeta};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use futures_util::StreamExt;
use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::CitationCache;
use crate::query::{build_url, parse_base, QueryForm, DEFAULT_ORDER};
use crate::source::{FetchError, WorkSource};

pub const DEFAULT_CONCURRENCY: usize = 4;

type Lookup = Shared<BoxFuture<'static, Option<CitationMeta>>>;
type InFlight = Arc<Mutex<HashMap<String, Lookup>>>;

pub struct CitationResolver<S> {
    source: Arc<S>,
    cache: Arc<CitationCache>,
    in_flight: InFlight,
    base: Url,
    forms: Arc<[QueryForm]>,
}

impl<S: WorkSource + 'static> CitationResolver<S> {
    pub fn new(source: S, base_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            source: Arc::new(source),
            cache: Arc::default(),
            in_flight: InFlight::default(),
            base: parse_base(base_url)?,
            forms: DEFAULT_ORDER.into(),
        })
    }

    pub fn with_cache(mut self, cache: Arc<CitationCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_forms(mut self, forms: Vec<QueryForm>) -> Self {
        self.forms = forms.into();
        self
    }

    pub fn cache(&self) -> &Arc<CitationCache> {
        &self.cache
    }

    /// Looks up one DOI. Never fails: any lookup error is logged and
    /// reported as `None`, and is not cached. Concurrent lookups of the same
    /// normalized DOI share one external fetch.
    pub async fn resolve(&self, identifier: &str) -> Option<CitationMeta> {
        let doi = identifier.trim();
        if doi.is_empty() {
            return None;
        }
        let key = normalize_identifier(doi);
        let lookup = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // A finished lookup fills the cache before leaving the in-flight
            // map, so checking both under this lock never misses a result.
            if let Some(hit) = self.cache.get(&key) {
                debug!(doi, "citation cache hit");
                return Some(hit);
            }
            match in_flight.get(&key) {
                Some(pending) => {
                    debug!(doi, "joining in-flight lookup");
                    pending.clone()
                }
                None => {
                    let lookup = self.start_lookup(key.clone(), doi.to_string());
                    in_flight.insert(key, lookup.clone());
                    lookup
                }
            }
        };
        lookup.await
    }

    fn start_lookup(&self, key: String, doi: String) -> Lookup {
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let base = self.base.clone();
        let forms = Arc::clone(&self.forms);
        async move {
            let resolved = match fetch_first(source.as_ref(), &base, &forms, &doi).await {
                Ok(meta) => {
                    cache.insert(key.clone(), meta.clone());
                    Some(meta)
                }
                Err(err) => {
                    warn!(doi = %doi, %err, "citation lookup failed");
                    None
                }
            };
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            resolved
        }
        .boxed()
        .shared()
    }

    /// Resolves every identifier with at most `concurrency` lookups in flight.
    /// Output order matches input order. Returns `None` if cancelled before
    /// the whole batch settled.
    pub async fn resolve_batch(
        &self,
        identifiers: &[String],
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Option<Vec<Option<CitationMeta>>> {
        let batch = futures_util::stream::iter(identifiers.iter().cloned())
            .map(|id| async move { self.resolve(&id).await })
            .buffered(concurrency.max(1))
            .collect::<Vec<_>>();

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(size = identifiers.len(), "citation batch cancelled");
                None
            }
            resolved = batch => Some(resolved),
        }
    }
}

async fn fetch_first<S: WorkSource + ?Sized>(
    source: &S,
    base: &Url,
    forms: &[QueryForm],
    doi: &str,
) -> Result<CitationMeta, FetchError> {
    let mut last = FetchError::NoQueryForms;
    for form in forms {
        let url = build_url(base, *form, doi)?;
        let attempt = source.fetch(&url).await.and_then(|value| {
            serde_json::from_value::<CitationMeta>(value)
                .map_err(|e| FetchError::Malformed(e.to_string()))
        });
        match attempt {
            Ok(meta) => return Ok(meta),
            Err(err) => {
                debug!(%url, %err, "query form failed");
                last = err;
            }
        }
    }
    Err(last)
}
