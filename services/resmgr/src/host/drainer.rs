//! Host drainer.
//!
//! Each drain cycle:
//! - Lists draining hosts from the host manager
//! - Enqueues the tasks still placed on each draining host for preemption
//! - Confirms hosts with no remaining tasks as drained
//!
//! Cycles run one at a time on a fixed period until the drainer is stopped.
//! Every remote call in a cycle (host manager and preemption queue) is
//! bounded by [`DrainerConfig::rpc_timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use prometheus::Registry;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::HostSet;
use crate::error::{DrainError, DrainResult};
use crate::hostmgr::{HostManager, HostMgrError};
use crate::lifecycle::Lifecycle;
use crate::metrics::DrainerMetrics;
use crate::preemption::{PreemptionError, PreemptionQueue, PreemptionReason};
use crate::task::TaskTracker;

/// Default period between drain cycles.
pub const DEFAULT_DRAINER_PERIOD: Duration = Duration::from_secs(10);

/// Default bound on each remote call made by a drain cycle.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum number of draining hosts handled per cycle.
pub const DEFAULT_DRAINING_HOSTS_LIMIT: u32 = 1000;

/// Drainer configuration.
#[derive(Debug, Clone)]
pub struct DrainerConfig {
    /// Interval between drain cycles.
    pub period: Duration,

    /// Bound on each host manager and preemption queue call. `None` leaves
    /// calls unbounded.
    pub rpc_timeout: Option<Duration>,

    /// Maximum number of draining hosts requested per cycle.
    pub draining_hosts_limit: u32,
}

impl Default for DrainerConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_DRAINER_PERIOD,
            rpc_timeout: Some(DEFAULT_RPC_TIMEOUT),
            draining_hosts_limit: DEFAULT_DRAINING_HOSTS_LIMIT,
        }
    }
}

/// What a successful drain cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Hosts reported draining by the host manager.
    pub hosts_discovered: usize,
    /// Hosts whose tasks were enqueued for preemption.
    pub hosts_preempted: usize,
    /// Tasks enqueued for preemption across all hosts.
    pub tasks_enqueued: usize,
    /// Hosts confirmed drained.
    pub hosts_drained: usize,
    /// Pending hosts dropped because the host manager no longer lists them.
    pub hosts_dropped: usize,
}

struct Inner {
    config: DrainerConfig,
    host_mgr: Arc<dyn HostManager>,
    tracker: Arc<dyn TaskTracker>,
    preemption_queue: Arc<dyn PreemptionQueue>,
    draining_hosts: HostSet,
    lifecycle: Lifecycle,
    metrics: DrainerMetrics,
}

/// Periodically drains hosts the host manager has put into maintenance.
///
/// Cloning a `Drainer` yields another handle to the same drainer.
#[derive(Clone)]
pub struct Drainer {
    inner: Arc<Inner>,
}

impl Drainer {
    /// Create a drainer running a cycle every `period`.
    ///
    /// Metrics are registered on `metrics`. Construction has no other side
    /// effects; nothing runs until [`start`](Self::start).
    pub fn new(
        metrics: &Registry,
        host_mgr: Arc<dyn HostManager>,
        period: Duration,
        tracker: Arc<dyn TaskTracker>,
        preemption_queue: Arc<dyn PreemptionQueue>,
    ) -> Self {
        let config = DrainerConfig {
            period,
            ..DrainerConfig::default()
        };
        Self::with_config(metrics, host_mgr, config, tracker, preemption_queue)
    }

    /// Create a drainer with a full configuration.
    pub fn with_config(
        metrics: &Registry,
        host_mgr: Arc<dyn HostManager>,
        mut config: DrainerConfig,
        tracker: Arc<dyn TaskTracker>,
        preemption_queue: Arc<dyn PreemptionQueue>,
    ) -> Self {
        // tokio intervals reject a zero period.
        config.period = config.period.max(Duration::from_millis(1));

        Self {
            inner: Arc::new(Inner {
                config,
                host_mgr,
                tracker,
                preemption_queue,
                draining_hosts: HostSet::new(),
                lifecycle: Lifecycle::new(),
                metrics: DrainerMetrics::new(metrics),
            }),
        }
    }

    /// Start the drain loop on the current tokio runtime.
    ///
    /// No-op if the drainer is already running or has been stopped.
    pub fn start(&self) -> DrainResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DrainError::NoRuntime)?;
        if !self.inner.lifecycle.start() {
            debug!(state = ?self.inner.lifecycle.state(), "Drainer not started");
            return Ok(());
        }

        runtime.spawn(Arc::clone(&self.inner).run());
        Ok(())
    }

    /// Signal the drain loop to exit after any in-flight cycle.
    ///
    /// No-op if the drainer is already stopped.
    pub fn stop(&self) -> DrainResult<()> {
        if self.inner.lifecycle.stop() {
            info!("Stopping host drainer");
        }
        Ok(())
    }

    /// Wait until the drain loop has exited.
    pub async fn wait(&self) {
        self.inner.lifecycle.wait().await;
    }

    /// Run one drain cycle now.
    pub async fn run_cycle(&self) -> DrainResult<CycleReport> {
        self.inner.run_cycle().await
    }

    /// Hosts with preemption issued and not yet confirmed drained.
    pub fn draining_hosts(&self) -> Vec<String> {
        self.inner.draining_hosts.to_vec()
    }

    pub fn is_draining(&self, host: &str) -> bool {
        self.inner.draining_hosts.contains(host)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.inner.lifecycle
    }

    pub fn config(&self) -> &DrainerConfig {
        &self.inner.config
    }
}

impl Inner {
    async fn run(self: Arc<Self>) {
        let stop = self.lifecycle.stop_token();
        info!(
            period_ms = self.config.period.as_millis() as u64,
            "Starting host drainer"
        );

        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the first cycle waits a full period.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    info!("Host drainer shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!(error = %e, "Drain cycle failed");
                    }
                }
            }
        }

        self.lifecycle.stop_complete();
    }

    async fn run_cycle(&self) -> DrainResult<CycleReport> {
        let started = Instant::now();
        let result = self.perform_drain_cycle().await;
        let elapsed = started.elapsed();

        match &result {
            Ok(_) => self.metrics.record_success(elapsed),
            Err(e) => self.metrics.record_failure(e, elapsed),
        }
        self.metrics.set_pending_hosts(self.draining_hosts.len());

        result
    }

    #[instrument(skip(self))]
    async fn perform_drain_cycle(&self) -> DrainResult<CycleReport> {
        let hosts = self
            .bounded(
                self.host_mgr
                    .get_draining_hosts(self.config.draining_hosts_limit),
                HostMgrError::Timeout,
            )
            .await
            .map_err(DrainError::Discovery)?;

        let mut report = CycleReport {
            hosts_discovered: hosts.len(),
            ..CycleReport::default()
        };
        if hosts.is_empty() {
            debug!("No draining hosts");
            return Ok(report);
        }

        // The listing is authoritative: forget pending hosts it no longer names.
        let dropped = self
            .draining_hosts
            .retain(|pending| hosts.iter().any(|h| h == pending));
        if !dropped.is_empty() {
            info!(hosts = ?dropped, "Hosts no longer draining");
        }
        report.hosts_dropped = dropped.len();

        for host in hosts {
            let tasks = self.tracker.tasks_by_host(&host);

            if tasks.is_empty() {
                self.bounded(self.host_mgr.mark_host_drained(&host), HostMgrError::Timeout)
                    .await
                    .map_err(|source| DrainError::DrainConfirmation {
                        host: host.clone(),
                        source,
                    })?;
                self.draining_hosts.remove(&host);
                self.metrics.host_drained();
                report.hosts_drained += 1;
                info!(host = %host, "Host drained");
                continue;
            }

            let task_count = tasks.len();
            self.bounded(
                self.preemption_queue
                    .enqueue_tasks(tasks, PreemptionReason::HostMaintenance),
                PreemptionError::Timeout,
            )
            .await
            .map_err(|source| DrainError::Preemption {
                host: host.clone(),
                source,
            })?;
            self.draining_hosts.add(host.as_str());
            self.metrics.host_preempted(task_count);
            report.hosts_preempted += 1;
            report.tasks_enqueued += task_count;
            debug!(host = %host, task_count, "Enqueued host tasks for preemption");
        }

        info!(
            hosts_discovered = report.hosts_discovered,
            hosts_preempted = report.hosts_preempted,
            hosts_drained = report.hosts_drained,
            tasks_enqueued = report.tasks_enqueued,
            "Drain cycle complete"
        );
        Ok(report)
    }

    /// Await `call` for at most `rpc_timeout`, mapping expiry with `elapsed`.
    async fn bounded<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        elapsed: impl FnOnce(Duration) -> E,
    ) -> Result<T, E> {
        match self.config.rpc_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| elapsed(limit))?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hostmgr::MockHostManager;
    use crate::preemption::TaskQueue;
    use crate::task::{Task, Tracker};
    use resmgr_id::{JobId, TaskId};

    const HOSTNAME: &str = "testHostname";
    const DRAINER_PERIOD: Duration = Duration::from_secs(1);

    struct Fixture {
        host_mgr: Arc<MockHostManager>,
        tracker: Arc<Tracker>,
        queue: Arc<TaskQueue>,
        drainer: Drainer,
    }

    fn task_on(host: &str) -> Task {
        Task::new(TaskId::new(JobId::new(), 0, 1), "testTask", host)
    }

    fn fixture(draining: &[&str]) -> Fixture {
        let host_mgr = Arc::new(MockHostManager::new(draining.iter().copied()));
        let tracker = Arc::new(Tracker::new());
        tracker.add_task(task_on(HOSTNAME));
        let queue = Arc::new(TaskQueue::new());
        let drainer = Drainer::new(
            &Registry::new(),
            host_mgr.clone(),
            DRAINER_PERIOD,
            tracker.clone(),
            queue.clone(),
        );
        Fixture {
            host_mgr,
            tracker,
            queue,
            drainer,
        }
    }

    #[test]
    fn test_new_has_no_side_effects() {
        let f = fixture(&[HOSTNAME]);
        assert_eq!(f.host_mgr.list_calls(), 0);
        assert!(f.drainer.draining_hosts().is_empty());
        assert!(!f.drainer.lifecycle().is_running());
        assert_eq!(f.drainer.config().period, DRAINER_PERIOD);
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let f = fixture(&[]);
        assert!(matches!(f.drainer.start(), Err(DrainError::NoRuntime)));
        assert!(!f.drainer.lifecycle().is_running());
    }

    #[tokio::test]
    async fn test_cycle_enqueues_tasks_of_draining_host() {
        let f = fixture(&[HOSTNAME]);

        let report = f.drainer.run_cycle().await.unwrap();

        assert_eq!(report.hosts_preempted, 1);
        assert_eq!(report.tasks_enqueued, 1);
        assert_eq!(f.queue.len(), 1);
        assert_eq!(f.drainer.draining_hosts(), vec![HOSTNAME]);
        assert!(f.host_mgr.marked_hosts().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_moves_to_newest_draining_host() {
        let f = fixture(&[]);
        f.tracker.clear();

        for i in 0..2 {
            let host = format!("hostname-{i}");
            f.tracker.add_task(task_on(&host));
            f.host_mgr.set_draining([host.clone()]);

            f.drainer.run_cycle().await.unwrap();

            assert_eq!(f.drainer.draining_hosts(), vec![host]);
        }
        assert_eq!(f.queue.len(), 2);
    }

    #[tokio::test]
    async fn test_cycle_marks_empty_host_drained() {
        let f = fixture(&["dummyhost"]);

        let report = f.drainer.run_cycle().await.unwrap();

        assert_eq!(report.hosts_drained, 1);
        assert_eq!(f.host_mgr.marked_hosts(), vec!["dummyhost"]);
        assert!(f.queue.is_empty());
        assert!(f.drainer.draining_hosts().is_empty());
    }

    #[tokio::test]
    async fn test_host_leaves_pending_set_once_empty() {
        let f = fixture(&[HOSTNAME]);
        f.drainer.run_cycle().await.unwrap();
        assert!(f.drainer.is_draining(HOSTNAME));

        f.tracker.clear();
        f.drainer.run_cycle().await.unwrap();

        assert!(!f.drainer.is_draining(HOSTNAME));
        assert_eq!(f.host_mgr.marked_hosts(), vec![HOSTNAME]);
    }

    #[tokio::test]
    async fn test_empty_host_confirmed_every_cycle() {
        let f = fixture(&["dummyhost"]);
        for _ in 0..3 {
            f.drainer.run_cycle().await.unwrap();
        }
        assert_eq!(f.host_mgr.marked_hosts().len(), 3);
    }

    #[tokio::test]
    async fn test_no_draining_hosts_is_noop() {
        let f = fixture(&[]);
        f.drainer.inner.draining_hosts.add("pending");

        let report = f.drainer.run_cycle().await.unwrap();

        assert_eq!(report, CycleReport::default());
        assert!(f.queue.is_empty());
        assert!(f.host_mgr.marked_hosts().is_empty());
        assert_eq!(f.drainer.draining_hosts(), vec!["pending"]);
    }

    #[tokio::test]
    async fn test_discovery_error_touches_nothing() {
        let f = fixture(&[HOSTNAME]);
        f.drainer.inner.draining_hosts.add("pending");
        f.host_mgr.fail_listing("fake GetDrainingHosts error");

        let err = f.drainer.run_cycle().await.unwrap_err();

        assert!(matches!(err, DrainError::Discovery(_)));
        assert!(f.queue.is_empty());
        assert_eq!(f.drainer.draining_hosts(), vec!["pending"]);
    }

    #[tokio::test]
    async fn test_enqueue_error_aborts_cycle() {
        let f = fixture(&[HOSTNAME, "dummyhost"]);
        f.queue.close();

        let err = f.drainer.run_cycle().await.unwrap_err();

        assert_eq!(err.host(), Some(HOSTNAME));
        assert!(matches!(
            err,
            DrainError::Preemption {
                source: PreemptionError::Closed,
                ..
            }
        ));
        // The host after the failure is not processed.
        assert!(f.host_mgr.marked_hosts().is_empty());
        assert!(f.drainer.draining_hosts().is_empty());
    }

    #[tokio::test]
    async fn test_mark_drained_error_aborts_cycle() {
        let f = fixture(&["dummyhost", HOSTNAME]);
        f.host_mgr.fail_marking("fake MarkHostsDrained error");

        let err = f.drainer.run_cycle().await.unwrap_err();

        assert!(matches!(err, DrainError::DrainConfirmation { .. }));
        assert_eq!(err.host(), Some("dummyhost"));
        assert!(f.queue.is_empty());
    }

    #[tokio::test]
    async fn test_host_progress_counted_when_cycle_fails() {
        use prometheus::{Encoder, TextEncoder};

        let registry = Registry::new();
        let host_mgr = Arc::new(MockHostManager::new(["empty", "busy"]));
        let tracker = Arc::new(Tracker::new());
        tracker.add_task(task_on("busy"));
        let queue = Arc::new(TaskQueue::new());
        queue.close();
        let drainer = Drainer::new(&registry, host_mgr.clone(), DRAINER_PERIOD, tracker, queue);

        let err = drainer.run_cycle().await.unwrap_err();

        assert_eq!(err.host(), Some("busy"));
        assert_eq!(host_mgr.marked_hosts(), vec!["empty"]);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("resmgr_drainer_hosts_drained_total 1"));
        assert!(text.contains("resmgr_drainer_hosts_preempted_total 0"));
        assert!(text.contains("resmgr_drainer_cycles_total{result=\"failure\"} 1"));
    }

    #[tokio::test]
    async fn test_stale_pending_hosts_dropped() {
        let f = fixture(&[HOSTNAME]);
        f.drainer.inner.draining_hosts.add("undrained");

        let report = f.drainer.run_cycle().await.unwrap();

        assert_eq!(report.hosts_dropped, 1);
        assert!(!f.drainer.is_draining("undrained"));
        assert!(f.drainer.is_draining(HOSTNAME));
    }
}
