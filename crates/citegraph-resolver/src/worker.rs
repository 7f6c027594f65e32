use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use citegraph_core::{BatchOutcome, BatchRequest, Generation};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::resolver::CitationResolver;
use crate::source::WorkSource;

/// Viewer-side end of the background resolver thread.
///
/// Only the most recently submitted generation is live: submitting a new
/// batch cancels the one in flight, and outcomes for any other generation
/// are dropped on both sides of the channel.
pub struct ResolverHandle {
    requests: mpsc::UnboundedSender<BatchRequest>,
    outcomes: Receiver<BatchOutcome>,
    current: Arc<AtomicU64>,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl ResolverHandle {
    pub fn submit(&self, request: BatchRequest) -> bool {
        self.current.store(request.generation.0, Ordering::SeqCst);
        debug!(
            generation = request.generation.0,
            size = request.identifiers.len(),
            "citation batch submitted"
        );
        self.requests.send(request).is_ok()
    }

    /// Marks `generation` as current without submitting work, which makes
    /// every outstanding batch stale.
    pub fn invalidate(&self, generation: Generation) {
        self.current.store(generation.0, Ordering::SeqCst);
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    pub fn try_outcomes(&self) -> Vec<BatchOutcome> {
        let current = self.current.load(Ordering::SeqCst);
        self.outcomes
            .try_iter()
            .filter(|o| o.generation.0 == current)
            .collect()
    }

    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("resolver thread panicked");
            }
        }
    }
}

impl Drop for ResolverHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn spawn_resolver<S>(resolver: CitationResolver<S>, concurrency: usize) -> io::Result<ResolverHandle>
where
    S: WorkSource + 'static,
{
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = crossbeam_channel::unbounded();
    let current = Arc::new(AtomicU64::new(0));
    let shutdown = CancellationToken::new();

    let thread = std::thread::Builder::new()
        .name("citegraph-resolver".into())
        .spawn({
            let current = Arc::clone(&current);
            let shutdown = shutdown.clone();
            move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        error!(%err, "resolver runtime failed to start");
                        return;
                    }
                };
                rt.block_on(run(
                    Arc::new(resolver),
                    concurrency,
                    req_rx,
                    out_tx,
                    current,
                    shutdown,
                ));
            }
        })?;

    Ok(ResolverHandle {
        requests: req_tx,
        outcomes: out_rx,
        current,
        shutdown,
        thread: Some(thread),
    })
}

async fn run<S>(
    resolver: Arc<CitationResolver<S>>,
    concurrency: usize,
    mut requests: mpsc::UnboundedReceiver<BatchRequest>,
    outcomes: Sender<BatchOutcome>,
    current: Arc<AtomicU64>,
    shutdown: CancellationToken,
) where
    S: WorkSource + 'static,
{
    info!(concurrency, "citation resolver started");
    let mut in_flight: Option<CancellationToken> = None;

    loop {
        let request = tokio::select! {
            _ = shutdown.cancelled() => break,
            req = requests.recv() => match req {
                Some(req) => req,
                None => break,
            },
        };

        if let Some(prev) = in_flight.take() {
            prev.cancel();
        }
        let token = shutdown.child_token();
        in_flight = Some(token.clone());

        let resolver = Arc::clone(&resolver);
        let outcomes = outcomes.clone();
        let current = Arc::clone(&current);
        tokio::spawn(async move {
            let generation = request.generation;
            let Some(resolved) = resolver
                .resolve_batch(&request.identifiers, concurrency, &token)
                .await
            else {
                return;
            };
            if current.load(Ordering::SeqCst) != generation.0 {
                debug!(generation = generation.0, "dropping stale citation batch");
                return;
            }
            let hits = resolved.iter().filter(|m| m.is_some()).count();
            debug!(generation = generation.0, hits, total = resolved.len(), "citation batch settled");
            if outcomes.send(BatchOutcome { generation, resolved }).is_err() {
                debug!("outcome receiver gone");
            }
        });
    }

    if let Some(prev) = in_flight {
        prev.cancel();
    }
    info!("citation resolver stopped");
}
