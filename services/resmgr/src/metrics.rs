//! Prometheus metrics for the host drainer.
//!
//! - `resmgr_drainer_cycles_total{result}` - Counter
//! - `resmgr_drainer_cycle_failures_total{kind}` - Counter
//! - `resmgr_drainer_cycle_duration_seconds` - Histogram
//! - `resmgr_drainer_hosts_preempted_total` - Counter
//! - `resmgr_drainer_hosts_drained_total` - Counter
//! - `resmgr_drainer_tasks_enqueued_total` - Counter
//! - `resmgr_drainer_pending_hosts` - Gauge

use std::time::Duration;

use prometheus::{
    core::Collector, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use tracing::warn;

use crate::error::DrainError;

/// Drainer metric handles.
#[derive(Debug, Clone)]
pub struct DrainerMetrics {
    cycles: IntCounterVec,
    cycle_failures: IntCounterVec,
    cycle_duration: Histogram,
    hosts_preempted: IntCounter,
    hosts_drained: IntCounter,
    tasks_enqueued: IntCounter,
    pending_hosts: IntGauge,
}

impl DrainerMetrics {
    /// Build the drainer metrics and register them on `registry`.
    ///
    /// Registration failures (e.g. a second drainer on the same registry)
    /// are logged; the handles keep working unregistered.
    pub fn new(registry: &Registry) -> Self {
        let metrics = Self::unregistered();
        let collectors: [Box<dyn Collector>; 7] = [
            Box::new(metrics.cycles.clone()),
            Box::new(metrics.cycle_failures.clone()),
            Box::new(metrics.cycle_duration.clone()),
            Box::new(metrics.hosts_preempted.clone()),
            Box::new(metrics.hosts_drained.clone()),
            Box::new(metrics.tasks_enqueued.clone()),
            Box::new(metrics.pending_hosts.clone()),
        ];
        for collector in collectors {
            if let Err(e) = registry.register(collector) {
                warn!(error = %e, "Failed to register drainer metric");
            }
        }
        metrics
    }

    /// Build metric handles that are not exported anywhere.
    pub fn unregistered() -> Self {
        Self {
            cycles: IntCounterVec::new(
                Opts::new("resmgr_drainer_cycles_total", "Drain cycles by result"),
                &["result"],
            )
            .expect("valid metric definition"),
            cycle_failures: IntCounterVec::new(
                Opts::new(
                    "resmgr_drainer_cycle_failures_total",
                    "Failed drain cycles by failure kind",
                ),
                &["kind"],
            )
            .expect("valid metric definition"),
            cycle_duration: Histogram::with_opts(HistogramOpts::new(
                "resmgr_drainer_cycle_duration_seconds",
                "Drain cycle duration",
            ))
            .expect("valid metric definition"),
            hosts_preempted: IntCounter::new(
                "resmgr_drainer_hosts_preempted_total",
                "Hosts whose tasks were enqueued for preemption",
            )
            .expect("valid metric definition"),
            hosts_drained: IntCounter::new(
                "resmgr_drainer_hosts_drained_total",
                "Hosts confirmed drained to the host manager",
            )
            .expect("valid metric definition"),
            tasks_enqueued: IntCounter::new(
                "resmgr_drainer_tasks_enqueued_total",
                "Tasks enqueued for preemption by the drainer",
            )
            .expect("valid metric definition"),
            pending_hosts: IntGauge::new(
                "resmgr_drainer_pending_hosts",
                "Hosts with preemption issued but not yet drained",
            )
            .expect("valid metric definition"),
        }
    }

    pub(crate) fn record_success(&self, elapsed: Duration) {
        self.cycles.with_label_values(&["success"]).inc();
        self.cycle_duration.observe(elapsed.as_secs_f64());
    }

    /// Recorded per host as it is handled, whatever the cycle's result.
    pub(crate) fn host_preempted(&self, task_count: usize) {
        self.hosts_preempted.inc();
        self.tasks_enqueued.inc_by(task_count as u64);
    }

    pub(crate) fn host_drained(&self) {
        self.hosts_drained.inc();
    }

    pub(crate) fn record_failure(&self, error: &DrainError, elapsed: Duration) {
        self.cycles.with_label_values(&["failure"]).inc();
        self.cycle_failures.with_label_values(&[error.kind()]).inc();
        self.cycle_duration.observe(elapsed.as_secs_f64());
    }

    pub(crate) fn set_pending_hosts(&self, count: usize) {
        self.pending_hosts.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    fn exposition(registry: &Registry) -> String {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_success_recorded() {
        let registry = Registry::new();
        let metrics = DrainerMetrics::new(&registry);

        metrics.host_preempted(2);
        metrics.host_preempted(3);
        metrics.host_drained();
        metrics.record_success(Duration::from_millis(5));
        metrics.set_pending_hosts(2);

        let text = exposition(&registry);
        assert!(text.contains("resmgr_drainer_cycles_total{result=\"success\"} 1"));
        assert!(text.contains("resmgr_drainer_hosts_preempted_total 2"));
        assert!(text.contains("resmgr_drainer_tasks_enqueued_total 5"));
        assert!(text.contains("resmgr_drainer_hosts_drained_total 1"));
        assert!(text.contains("resmgr_drainer_pending_hosts 2"));
    }

    #[test]
    fn test_failure_recorded_by_kind() {
        let registry = Registry::new();
        let metrics = DrainerMetrics::new(&registry);
        let error = DrainError::Discovery(crate::hostmgr::HostMgrError::Unavailable(
            "down".to_string(),
        ));

        metrics.record_failure(&error, Duration::from_millis(1));

        let text = exposition(&registry);
        assert!(text.contains("resmgr_drainer_cycles_total{result=\"failure\"} 1"));
        assert!(text.contains("resmgr_drainer_cycle_failures_total{kind=\"discovery\"} 1"));
    }

    #[test]
    fn test_double_registration_is_tolerated() {
        let registry = Registry::new();
        let _first = DrainerMetrics::new(&registry);
        let second = DrainerMetrics::new(&registry);
        second.set_pending_hosts(1);
        assert_eq!(second.pending_hosts.get(), 1);
    }
}
