//! Drives every metric fetch of a dashboard load to completion and merges
//! the successful ones into a shared snapshot.
//!
//! Failed fetches are absorbed: the snapshot keeps whatever value the field
//! held before the cycle (or nothing, on the first load) and the caller never
//! sees the error. Partial availability is preferred over failing the view.

use crate::core::metrics::{
    AumOverview, BranchAum, ClientConcentration, ClientSegmentation, DormantClient, MetricId,
    MetricValue, MetricsProvider, MonthlyScorecard, NetFlowPeriod, RevenueAttribution,
    RevenueProjection, RmAum, SipHealth,
};
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt, join_all};
use std::future::Future;
use tracing::{debug, warn};

/// An identifier plus the pending fetch for it.
pub struct MetricSource<'a> {
    pub id: MetricId,
    fetch: BoxFuture<'a, Result<MetricValue>>,
}

impl<'a> MetricSource<'a> {
    pub fn new<F>(id: MetricId, fetch: F) -> Self
    where
        F: Future<Output = Result<MetricValue>> + Send + 'a,
    {
        Self {
            id,
            fetch: fetch.boxed(),
        }
    }

    pub fn from_provider(provider: &'a (dyn MetricsProvider + Send + Sync), id: MetricId) -> Self {
        Self::new(id, provider.fetch_metric(id))
    }
}

/// Builds one source per known metric, all backed by `provider`.
pub fn catalogue(provider: &(dyn MetricsProvider + Send + Sync)) -> Vec<MetricSource<'_>> {
    MetricId::ALL
        .into_iter()
        .map(|id| MetricSource::from_provider(provider, id))
        .collect()
}

/// Last successfully fetched value of every metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub aum: Option<AumOverview>,
    pub branches: Option<Vec<BranchAum>>,
    pub rms: Option<Vec<RmAum>>,
    pub net_flows: Option<Vec<NetFlowPeriod>>,
    pub sip_health: Option<SipHealth>,
    pub revenue: Option<RevenueProjection>,
    pub concentration: Option<ClientConcentration>,
    pub dormant_clients: Option<Vec<DormantClient>>,
    pub scorecard: Option<MonthlyScorecard>,
    pub revenue_attribution: Option<RevenueAttribution>,
    pub segmentation: Option<ClientSegmentation>,
}

impl Snapshot {
    /// Overwrites the field `value` belongs to.
    pub fn apply(&mut self, value: MetricValue) {
        match value {
            MetricValue::AumOverview(v) => self.aum = Some(v),
            MetricValue::AumByBranch(v) => self.branches = Some(v),
            MetricValue::AumByRm(v) => self.rms = Some(v),
            MetricValue::NetFlows(v) => self.net_flows = Some(v),
            MetricValue::SipHealth(v) => self.sip_health = Some(v),
            MetricValue::RevenueProjection(v) => self.revenue = Some(v),
            MetricValue::ClientConcentration(v) => self.concentration = Some(v),
            MetricValue::DormantClients(v) => self.dormant_clients = Some(v),
            MetricValue::MonthlyScorecard(v) => self.scorecard = Some(v),
            MetricValue::RevenueAttribution(v) => self.revenue_attribution = Some(v),
            MetricValue::ClientSegmentation(v) => self.segmentation = Some(v),
        }
    }

    pub fn is_available(&self, id: MetricId) -> bool {
        match id {
            MetricId::AumOverview => self.aum.is_some(),
            MetricId::AumByBranch => self.branches.is_some(),
            MetricId::AumByRm => self.rms.is_some(),
            MetricId::NetFlows => self.net_flows.is_some(),
            MetricId::SipHealth => self.sip_health.is_some(),
            MetricId::RevenueProjection => self.revenue.is_some(),
            MetricId::ClientConcentration => self.concentration.is_some(),
            MetricId::DormantClients => self.dormant_clients.is_some(),
            MetricId::MonthlyScorecard => self.scorecard.is_some(),
            MetricId::RevenueAttribution => self.revenue_attribution.is_some(),
            MetricId::ClientSegmentation => self.segmentation.is_some(),
        }
    }

    pub fn available(&self) -> Vec<MetricId> {
        MetricId::ALL
            .into_iter()
            .filter(|id| self.is_available(*id))
            .collect()
    }
}

/// Owns the snapshot of a dashboard view and is its only writer.
#[derive(Debug, Default)]
pub struct SourceAggregator {
    snapshot: Snapshot,
    loading: bool,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    /// True only while a cycle runs. Fetching borrows the aggregator
    /// mutably, so callers only ever read it between cycles, where it is false.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub async fn fetch_all(&mut self, sources: Vec<MetricSource<'_>>) -> &Snapshot {
        self.fetch_all_with_progress(sources, &|| ()).await
    }

    /// Runs every source concurrently and waits for all of them to settle.
    ///
    /// `update_callback` fires once per settled source, success or not.
    pub async fn fetch_all_with_progress(
        &mut self,
        sources: Vec<MetricSource<'_>>,
        update_callback: &dyn Fn(),
    ) -> &Snapshot {
        self.loading = true;
        debug!("Fetching {} metric sources", sources.len());

        let pending = sources.into_iter().map(|source| async move {
            let result = source.fetch.await;
            update_callback();
            (source.id, result)
        });
        let settled = join_all(pending).await;

        let mut failures = 0;
        for (id, result) in settled {
            match result {
                Ok(value) if value.id() == id => {
                    debug!("Metric {} fetched", id);
                    self.snapshot.apply(value);
                }
                Ok(value) => {
                    failures += 1;
                    warn!(
                        "Metric source {} returned a value for {}; keeping previous value",
                        id,
                        value.id()
                    );
                }
                Err(e) => {
                    failures += 1;
                    warn!("Metric {} unavailable, keeping previous value: {}", id, e);
                }
            }
        }
        debug!("Metric fetch settled with {} failures", failures);

        self.loading = false;
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sip(active: u32, amount: f64) -> MetricValue {
        MetricValue::SipHealth(SipHealth {
            total: active,
            active,
            total_monthly_amount: amount,
            ..SipHealth::default()
        })
    }

    fn aum(total: f64) -> MetricValue {
        MetricValue::AumOverview(AumOverview {
            total_aum: total,
            ..AumOverview::default()
        })
    }

    fn succeed(value: MetricValue) -> impl Future<Output = Result<MetricValue>> + Send {
        async move { Ok::<_, anyhow::Error>(value) }
    }

    fn fail(reason: &'static str) -> impl Future<Output = Result<MetricValue>> + Send {
        async move { Err::<MetricValue, _>(anyhow!(reason)) }
    }

    struct MockProvider {
        failing: Mutex<HashSet<MetricId>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn failing(ids: &[MetricId]) -> Self {
            Self {
                failing: Mutex::new(ids.iter().copied().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn set_failing(&self, ids: &[MetricId]) {
            *self.failing.lock().unwrap() = ids.iter().copied().collect();
        }
    }

    #[async_trait]
    impl MetricsProvider for MockProvider {
        async fn fetch_metric(&self, id: MetricId) -> Result<MetricValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(&id) {
                return Err(anyhow!("{} unavailable", id));
            }
            Ok(match id {
                MetricId::AumOverview => aum(5_000_000.0),
                MetricId::SipHealth => sip(40, 250_000.0),
                MetricId::NetFlows => MetricValue::NetFlows(vec![NetFlowPeriod {
                    period: "2026-09".to_string(),
                    purchases: 100.0,
                    redemptions: 40.0,
                    net: 60.0,
                }]),
                MetricId::AumByBranch => MetricValue::AumByBranch(vec![]),
                MetricId::AumByRm => MetricValue::AumByRm(vec![]),
                MetricId::RevenueProjection => {
                    MetricValue::RevenueProjection(RevenueProjection::default())
                }
                MetricId::ClientConcentration => {
                    MetricValue::ClientConcentration(ClientConcentration::default())
                }
                MetricId::DormantClients => MetricValue::DormantClients(vec![]),
                MetricId::MonthlyScorecard => {
                    MetricValue::MonthlyScorecard(MonthlyScorecard::default())
                }
                MetricId::RevenueAttribution => {
                    MetricValue::RevenueAttribution(RevenueAttribution::default())
                }
                MetricId::ClientSegmentation => {
                    MetricValue::ClientSegmentation(ClientSegmentation::default())
                }
            })
        }
    }

    #[tokio::test]
    async fn test_one_failure_leaves_other_fields_populated() {
        let sources = vec![
            MetricSource::new(MetricId::AumOverview, succeed(aum(1_000.0))),
            MetricSource::new(MetricId::SipHealth, fail("timeout")),
            MetricSource::new(MetricId::DormantClients, succeed(MetricValue::DormantClients(vec![]))),
        ];

        let mut aggregator = SourceAggregator::new();
        let snapshot = aggregator.fetch_all(sources).await;

        assert_eq!(snapshot.aum.as_ref().map(|a| a.total_aum), Some(1_000.0));
        assert_eq!(snapshot.dormant_clients, Some(vec![]));
        assert!(snapshot.sip_health.is_none());
        assert!(!aggregator.is_loading());
    }

    #[tokio::test]
    async fn test_progress_fires_per_source_and_loading_clears() {
        let sources = vec![
            MetricSource::new(MetricId::AumOverview, succeed(aum(1_000.0))),
            MetricSource::new(MetricId::SipHealth, fail("timeout")),
        ];
        let settled = std::cell::Cell::new(0);

        let mut aggregator = SourceAggregator::new();
        assert!(!aggregator.is_loading());
        aggregator
            .fetch_all_with_progress(sources, &|| settled.set(settled.get() + 1))
            .await;

        assert_eq!(settled.get(), 2);
        assert!(!aggregator.is_loading());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_value() {
        let mut aggregator = SourceAggregator::new();
        aggregator
            .fetch_all(vec![MetricSource::new(MetricId::SipHealth, succeed(sip(10, 5_000.0)))])
            .await;

        let snapshot = aggregator
            .fetch_all(vec![
                MetricSource::new(MetricId::SipHealth, fail("502")),
                MetricSource::new(MetricId::AumOverview, succeed(aum(2_000.0))),
            ])
            .await;

        assert_eq!(
            snapshot.sip_health.as_ref().map(|s| s.total_monthly_amount),
            Some(5_000.0)
        );
        assert_eq!(snapshot.aum.as_ref().map(|a| a.total_aum), Some(2_000.0));
    }

    #[tokio::test]
    async fn test_successful_refresh_overwrites_prior_value() {
        let mut aggregator = SourceAggregator::new();
        aggregator
            .fetch_all(vec![MetricSource::new(MetricId::AumOverview, succeed(aum(1.0)))])
            .await;
        aggregator
            .fetch_all(vec![MetricSource::new(MetricId::AumOverview, succeed(aum(2.0)))])
            .await;

        assert_eq!(
            aggregator.snapshot().aum.as_ref().map(|a| a.total_aum),
            Some(2.0)
        );
    }

    #[tokio::test]
    async fn test_all_failing_still_settles() {
        let provider = MockProvider::failing(&MetricId::ALL);
        let mut aggregator = SourceAggregator::new();
        let snapshot = aggregator.fetch_all(catalogue(&provider)).await;

        assert_eq!(*snapshot, Snapshot::default());
        assert!(!aggregator.is_loading());
        assert_eq!(provider.calls.load(Ordering::SeqCst), MetricId::ALL.len());
    }

    #[tokio::test]
    async fn test_catalogue_fetches_every_metric() {
        let provider = MockProvider::failing(&[MetricId::NetFlows]);
        let mut aggregator = SourceAggregator::new();
        let snapshot = aggregator.fetch_all(catalogue(&provider)).await;

        assert_eq!(snapshot.available().len(), MetricId::ALL.len() - 1);
        assert!(!snapshot.is_available(MetricId::NetFlows));

        provider.set_failing(&[MetricId::AumOverview]);
        let snapshot = aggregator.fetch_all(catalogue(&provider)).await;
        assert_eq!(snapshot.available().len(), MetricId::ALL.len());
        assert_eq!(
            snapshot.aum.as_ref().map(|a| a.total_aum),
            Some(5_000_000.0)
        );
    }

    #[tokio::test]
    async fn test_mismatched_value_is_treated_as_failure() {
        let mut aggregator = SourceAggregator::new();
        let snapshot = aggregator
            .fetch_all(vec![MetricSource::new(MetricId::AumOverview, succeed(sip(1, 1.0)))])
            .await;

        assert_eq!(*snapshot, Snapshot::default());
    }

    #[tokio::test]
    async fn test_sources_run_concurrently() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        // The first source can only finish once the second has started.
        let sources = vec![
            MetricSource::new(MetricId::AumOverview, async move {
                match rx.await {
                    Ok(()) => Ok(aum(3.0)),
                    Err(e) => Err(anyhow!(e)),
                }
            }),
            MetricSource::new(MetricId::SipHealth, async move {
                let _ = tx.send(());
                Ok::<_, anyhow::Error>(sip(1, 1.0))
            }),
        ];

        let settled = AtomicUsize::new(0);
        let mut aggregator = SourceAggregator::new();
        let snapshot = aggregator
            .fetch_all_with_progress(sources, &|| {
                settled.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        assert!(snapshot.aum.is_some());
        assert!(snapshot.sip_health.is_some());
        assert_eq!(settled.load(Ordering::SeqCst), 2);
    }
}
