//! Graceful multi-resource shutdown.
//!
//! The coordinator owns a registry of [`DelayCloser`]s. A shutdown freezes
//! the registry, triggers every close concurrently, and waits for the
//! per-resource signals until they all arrive or the deadline passes. What
//! happened is returned as a [`ShutdownReport`]; the sequence itself never
//! fails because a resource failed or did not answer.

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use quiesce_contracts::{
    close_channel, CloseDelivery, CloseFailure, DelayCloser, Logger, ShutdownReason, Shutdowner,
};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorResult;
use crate::events::ShutdownEvent;
use crate::ids::ResourceId;
use crate::registry::{CoordinatorPhase, Registration, Registry};
use crate::report::ShutdownReport;
use crate::request::ShutdownRequest;

/// Coordinates the one-time graceful shutdown of registered resources.
///
/// Cloning yields another handle to the same coordinator.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    /// Configuration.
    config: CoordinatorConfig,

    /// Registry and lifecycle phase. Never held across an await.
    registry: Mutex<Registry>,

    /// Event broadcaster.
    event_tx: broadcast::Sender<ShutdownEvent>,

    /// First shutdown request received through [`Shutdowner`].
    request_tx: watch::Sender<Option<RequestedShutdown>>,

    /// Optional progress sink, best-effort.
    logger: Option<Arc<dyn Logger>>,
}

#[derive(Clone)]
struct RequestedShutdown {
    reason: Option<ShutdownReason>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with an empty registry.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a coordinator that also reports progress through `logger`.
    pub fn with_logger(config: CoordinatorConfig, logger: Arc<dyn Logger>) -> Self {
        Self::build(config, Some(logger))
    }

    fn build(config: CoordinatorConfig, logger: Option<Arc<dyn Logger>>) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (request_tx, _) = watch::channel(None);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                registry: Mutex::new(Registry::new()),
                event_tx,
                request_tx,
                logger,
            }),
        }
    }

    /// Subscribe to shutdown events.
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.inner.registry.lock().phase()
    }

    pub fn is_open(&self) -> bool {
        self.phase() == CoordinatorPhase::Open
    }

    /// Ids currently registered, in registration order.
    pub fn registered(&self) -> Vec<ResourceId> {
        self.inner.registry.lock().ids()
    }

    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Report of the finished shutdown sequence, once terminal.
    pub fn last_report(&self) -> Option<ShutdownReport> {
        self.inner.registry.lock().report().cloned()
    }

    /// Register a resource to be closed on shutdown.
    ///
    /// Fails with `AlreadyRegistered` for a duplicate id and with
    /// `CoordinatorClosed` once shutdown has begun.
    pub fn register<I>(&self, id: I, closer: Arc<dyn DelayCloser>) -> CoordinatorResult<()>
    where
        I: Into<ResourceId>,
    {
        let id = id.into();
        let result = self.inner.registry.lock().insert(id.clone(), closer);

        match &result {
            Ok(()) => {
                debug!(resource_id = %id, "Registered resource");
                let _ = self.inner.event_tx.send(ShutdownEvent::Registered(id));
            }
            Err(e) => warn!(resource_id = %id, error = %e, "Registration rejected"),
        }

        result
    }

    /// Remove a resource before shutdown, handing its closer back.
    ///
    /// Fails with `NotFound` for an unknown id and with `CoordinatorClosed`
    /// once shutdown has begun.
    pub fn unregister(&self, id: &ResourceId) -> CoordinatorResult<Arc<dyn DelayCloser>> {
        let closer = self.inner.registry.lock().remove(id)?;

        debug!(resource_id = %id, "Unregistered resource");
        let _ = self
            .inner
            .event_tx
            .send(ShutdownEvent::Unregistered(id.clone()));

        Ok(closer)
    }

    /// Run the shutdown sequence.
    ///
    /// Takes a snapshot of the registry, triggers every close and waits for
    /// all signals or `request.deadline`, whichever comes first. A signal
    /// written strictly after the deadline counts as timed out even if it is
    /// observed later. With no deadline this waits for every resource.
    ///
    /// Runs at most once: any further call fails with `AlreadyShuttingDown`,
    /// and the first report stays available through [`last_report`](Self::last_report).
    /// Dropping the returned future does not stop the sequence; it still
    /// runs to completion and leaves the coordinator terminal.
    #[instrument(skip_all, fields(voluntary = request.is_voluntary()))]
    pub async fn shutdown(&self, request: ShutdownRequest) -> CoordinatorResult<ShutdownReport> {
        let snapshot = {
            let mut registry = self.inner.registry.lock();
            match registry.begin_shutdown() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(phase = %registry.phase(), "Shutdown already requested");
                    return Err(e);
                }
            }
        };

        let ids: Vec<ResourceId> = snapshot
            .iter()
            .map(|registration| registration.id.clone())
            .collect();
        let reason = request.reason.clone();
        let started_at = Utc::now();

        let sequence = tokio::spawn(
            Arc::clone(&self.inner)
                .run_sequence(snapshot, request)
                .in_current_span(),
        );

        match sequence.await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(error = %e, "Shutdown sequence aborted");
                if let Some(report) = self.last_report() {
                    return Ok(report);
                }
                let mut report = ShutdownReport::new(reason, started_at);
                report.timed_out.extend(ids);
                Ok(self.inner.complete(report))
            }
        }
    }

    /// Wait until shutdown is requested through [`Shutdowner`], returning
    /// the requested cause.
    pub async fn wait_for_request(&self) -> Option<ShutdownReason> {
        let mut receiver = self.inner.request_tx.subscribe();
        let requested = match receiver.wait_for(Option::is_some).await {
            Ok(requested) => requested.clone(),
            Err(_) => None,
        };
        requested.and_then(|requested| requested.reason)
    }

    /// Wait for a shutdown request, then run the sequence bounded by the
    /// configured grace period.
    pub async fn run_until_requested(&self) -> CoordinatorResult<ShutdownReport> {
        let reason = self.wait_for_request().await;

        let mut request = match self.inner.config.default_grace_period() {
            Some(grace) => ShutdownRequest::with_timeout(grace),
            None => ShutdownRequest::voluntary(),
        };
        if let Some(reason) = reason {
            request = request.because(reason);
        }

        self.shutdown(request).await
    }
}

impl CoordinatorInner {
    /// Trigger and aggregate a frozen snapshot, then mark the coordinator
    /// terminal.
    async fn run_sequence(
        self: Arc<Self>,
        snapshot: Vec<Registration>,
        request: ShutdownRequest,
    ) -> ShutdownReport {
        let started = Instant::now();
        let mut report = ShutdownReport::new(request.reason.clone(), Utc::now());

        match &request.reason {
            Some(reason) => info!(resources = snapshot.len(), reason = %reason, "Shutting down"),
            None => info!(resources = snapshot.len(), "Shutting down"),
        }
        self.note(format_args!("shutting down {} resources", snapshot.len()));
        let _ = self.event_tx.send(ShutdownEvent::ShutdownStarted {
            resources: snapshot.len(),
            voluntary: request.is_voluntary(),
        });

        let mut outstanding: HashSet<ResourceId> =
            snapshot.iter().map(|registration| registration.id.clone()).collect();
        let mut pending = FuturesUnordered::new();

        for Registration {
            id,
            closer,
            registered_at,
            ..
        } in snapshot
        {
            trace!(
                resource_id = %id,
                registered_for_ms = registered_at.elapsed().as_millis() as u64,
                "Triggering close"
            );

            let (signal, receiver) = close_channel();
            // A panicking closer drops its signal and is reported as failed.
            if panic::catch_unwind(AssertUnwindSafe(|| closer.close(signal))).is_err() {
                warn!(resource_id = %id, "Close panicked");
            }
            pending.push(async move { (id, receiver.await) });
        }

        let expiry = deadline_elapsed(request.deadline);
        tokio::pin!(expiry);

        let mut expired = false;
        while !pending.is_empty() {
            tokio::select! {
                biased;

                Some((id, delivery)) = pending.next() => {
                    self.record(&mut report, &mut outstanding, request.deadline, id, delivery);
                }
                _ = &mut expiry => {
                    expired = true;
                    break;
                }
            }
        }

        if expired {
            // Results already written before the deadline still count.
            while let Some(Some((id, delivery))) =
                tokio::task::unconstrained(pending.next()).now_or_never()
            {
                self.record(&mut report, &mut outstanding, request.deadline, id, delivery);
            }
        }

        // Dropping the receivers turns any later write into a no-op.
        drop(pending);

        for id in outstanding {
            self.record_timeout(&mut report, id);
        }

        report.elapsed = started.elapsed();
        self.complete(report)
    }

    /// Store the final report and mark the coordinator terminal.
    fn complete(&self, report: ShutdownReport) -> ShutdownReport {
        let summary = report.summary();

        if report.is_clean() {
            info!(summary = %summary, "Shutdown complete");
        } else {
            warn!(summary = %summary, "Shutdown complete with unclosed resources");
        }
        self.note(format_args!("shutdown complete: {}", summary));

        self.registry.lock().finish(report.clone());
        let _ = self.event_tx.send(ShutdownEvent::ShutdownCompleted(summary));

        report
    }

    fn record(
        &self,
        report: &mut ShutdownReport,
        outstanding: &mut HashSet<ResourceId>,
        deadline: Option<Instant>,
        id: ResourceId,
        delivery: Option<CloseDelivery>,
    ) {
        // Each resource is counted once.
        if !outstanding.remove(&id) {
            return;
        }

        let delivery = match delivery {
            Some(delivery) => delivery,
            None => {
                let error = CloseFailure::signal_dropped();
                if self.config.log_progress {
                    warn!(resource_id = %id, "Close signal dropped without a result");
                    self.note(format_args!("resource {} failed to close: {}", id, error));
                }
                let _ = self.event_tx.send(ShutdownEvent::ResourceFailed {
                    resource_id: id.clone(),
                    error: error.to_string(),
                });
                report.failed.insert(id, Arc::new(error));
                return;
            }
        };

        if deadline.is_some_and(|deadline| delivery.delivered_at > deadline) {
            self.record_timeout(report, id);
            return;
        }

        match delivery.result {
            Ok(()) => {
                if self.config.log_progress {
                    debug!(resource_id = %id, "Resource closed");
                }
                let _ = self.event_tx.send(ShutdownEvent::ResourceClosed(id.clone()));
                report.completed.insert(id);
            }
            Err(error) => {
                if self.config.log_progress {
                    warn!(resource_id = %id, error = %error, "Resource failed to close");
                    self.note(format_args!("resource {} failed to close: {}", id, error));
                }
                let _ = self.event_tx.send(ShutdownEvent::ResourceFailed {
                    resource_id: id.clone(),
                    error: error.to_string(),
                });
                report.failed.insert(id, error);
            }
        }
    }

    fn record_timeout(&self, report: &mut ShutdownReport, id: ResourceId) {
        if self.config.log_progress {
            warn!(resource_id = %id, "Resource did not close before the deadline");
            self.note(format_args!("resource {} timed out", id));
        }
        let _ = self
            .event_tx
            .send(ShutdownEvent::ResourceTimedOut(id.clone()));
        report.timed_out.insert(id);
    }

    /// Forward to the injected logger; its failures are ignored.
    fn note(&self, args: fmt::Arguments<'_>) {
        if let Some(logger) = &self.logger {
            let _ = logger.log_fmt(args);
        }
    }
}

impl Shutdowner for ShutdownCoordinator {
    /// Record a shutdown request. Only the first request is kept; the
    /// sequence itself is run by [`ShutdownCoordinator::run_until_requested`].
    fn request_shutdown(&self, reason: Option<ShutdownReason>) {
        let reason_text = reason.as_ref().map(ToString::to_string);

        let accepted = self.inner.request_tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(RequestedShutdown { reason });
            true
        });

        if accepted {
            info!(reason = ?reason_text, "Shutdown requested");
            let _ = self.inner.event_tx.send(ShutdownEvent::ShutdownRequested {
                reason: reason_text,
            });
        } else {
            debug!(reason = ?reason_text, "Ignoring repeated shutdown request");
        }
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.lock();
        f.debug_struct("ShutdownCoordinator")
            .field("phase", &registry.phase())
            .field("registered", &registry.len())
            .finish()
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
