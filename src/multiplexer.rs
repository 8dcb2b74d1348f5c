//! The snapshot multiplexer. Every source pushes `Update`s into one queue; the multiplexer is its
//! only consumer. Each update replaces one slot of `Snapshots` and triggers a full recompute over
//! all slots. Updates that are already queued when a recompute starts are folded into it.

use crate::dashboard::Dashboard;
use crate::ledger::Ledger;
use crate::snapshot::{Snapshots, SourceKey};
use crate::source::SnapshotSource;
use crate::Result;
use anyhow::anyhow;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One push: the full new value of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub key: SourceKey,
    pub value: Value,
}

/// The sending half handed to each source when it is attached.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Update>,
}

impl Publisher {
    /// Queues the new value of `key`. Fails once the multiplexer has been torn down.
    pub fn publish(&self, key: SourceKey, value: Value) -> Result<()> {
        self.tx
            .send(Update { key, value })
            .map_err(|_| anyhow!("The multiplexer for {key} has been torn down"))
    }
}

#[derive(Debug)]
struct Subscription {
    key: SourceKey,
    handle: JoinHandle<()>,
}

/// Owns the snapshot slots and the subscriptions feeding them.
///
/// Dropping the multiplexer (or calling `teardown`) aborts every subscription at once; no
/// recompute can happen afterwards because the queue is owned by the multiplexer.
#[derive(Debug)]
pub struct Multiplexer {
    snapshots: Snapshots,
    rx: mpsc::UnboundedReceiver<Update>,
    subscriptions: Vec<Subscription>,
}

impl Multiplexer {
    /// Attaches every source. A source that fails to attach is logged and left out; the remaining
    /// sources still feed the dashboard.
    pub async fn subscribe(sources: Vec<Box<dyn SnapshotSource>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscriptions = Vec::new();
        for source in sources {
            let key = source.key();
            let publisher = Publisher { tx: tx.clone() };
            match source.attach(publisher).await {
                Ok(handle) => subscriptions.push(Subscription { key, handle }),
                Err(e) => warn!("Unable to subscribe to {key}, continuing without it: {e:#}"),
            }
        }
        info!("Subscribed to {} source(s)", subscriptions.len());
        Self {
            snapshots: Snapshots::new(),
            rx,
            subscriptions,
        }
    }

    /// The keys of the sources that attached successfully.
    pub fn attached(&self) -> Vec<SourceKey> {
        self.subscriptions.iter().map(|s| s.key).collect()
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    /// Applies one update and recomputes.
    pub fn apply(&mut self, update: Update) -> Ledger {
        self.snapshots.apply(update.key, update.value);
        self.snapshots.ledger()
    }

    /// Waits for the next update, applies it along with any updates queued behind it, and returns
    /// the recomputed ledger. Returns `None` once every source has finished.
    pub async fn next(&mut self) -> Option<Ledger> {
        let first = self.rx.recv().await?;
        let mut applied = 1;
        self.snapshots.apply(first.key, first.value);
        while let Ok(update) = self.rx.try_recv() {
            self.snapshots.apply(update.key, update.value);
            applied += 1;
        }
        debug!(
            "Recomputing after {applied} update(s), {} of {} source(s) reported",
            self.snapshots.reported(),
            SourceKey::ALL.len()
        );
        Some(self.snapshots.ledger())
    }

    /// Feeds every recompute into `dashboard`, calling `on_refresh` after each, until all sources
    /// have finished.
    pub async fn run<F>(&mut self, dashboard: &mut Dashboard, mut on_refresh: F)
    where
        F: FnMut(&Dashboard),
    {
        while let Some(ledger) = self.next().await {
            dashboard.refresh(ledger);
            on_refresh(dashboard);
        }
    }

    /// Unsubscribes every source.
    pub fn teardown(self) {
        debug!("Tearing down {} subscription(s)", self.subscriptions.len());
        drop(self)
    }
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.handle.abort();
        }
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Scope;
    use crate::source::StaticSource;
    use serde_json::json;

    struct BrokenSource;

    #[async_trait::async_trait]
    impl SnapshotSource for BrokenSource {
        fn key(&self) -> SourceKey {
            SourceKey::Workers
        }

        async fn attach(self: Box<Self>, _publisher: Publisher) -> Result<JoinHandle<()>> {
            Err(anyhow!("permission denied"))
        }
    }

    #[tokio::test]
    async fn test_attach_failure_degrades() {
        let sources: Vec<Box<dyn SnapshotSource>> = vec![
            Box::new(BrokenSource),
            Box::new(StaticSource::new(
                SourceKey::Investments,
                vec![json!([{"amount": 100, "date": "2024-05-01"}])],
            )),
        ];
        let mut mux = Multiplexer::subscribe(sources).await;
        assert_eq!(mux.attached(), vec![SourceKey::Investments]);

        let mut dashboard = Dashboard::new();
        let mut refreshes = 0;
        mux.run(&mut dashboard, |_| refreshes += 1).await;
        assert!(refreshes >= 1);
        assert_eq!(dashboard.overall_totals().investment.value(), 100.0);
    }

    #[tokio::test]
    async fn test_every_update_recomputes_all_slots() {
        let mut mux = Multiplexer::subscribe(Vec::new()).await;
        let ledger = mux.apply(Update {
            key: SourceKey::Investments,
            value: json!([{"amount": 10}]),
        });
        assert_eq!(ledger.totals(Scope::Overall).investment.value(), 10.0);

        let ledger = mux.apply(Update {
            key: SourceKey::Staff,
            value: json!([{"amount": 5}]),
        });
        let totals = ledger.totals(Scope::Overall);
        assert_eq!(totals.investment.value(), 10.0);
        assert_eq!(totals.staff_payroll.value(), 5.0);
    }

    #[tokio::test]
    async fn test_queued_updates_coalesce() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut mux = Multiplexer {
            snapshots: Snapshots::new(),
            rx,
            subscriptions: Vec::new(),
        };
        let publisher = Publisher { tx };
        publisher
            .publish(SourceKey::Investments, json!([{"amount": 1}]))
            .unwrap();
        publisher
            .publish(SourceKey::Investments, json!([{"amount": 2}]))
            .unwrap();
        publisher
            .publish(SourceKey::Staff, json!([{"amount": 3}]))
            .unwrap();
        drop(publisher);

        let ledger = mux.next().await.unwrap();
        let totals = ledger.totals(Scope::Overall);
        assert_eq!(totals.investment.value(), 2.0);
        assert_eq!(totals.staff_payroll.value(), 3.0);
        assert!(mux.next().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_after_teardown_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mux = Multiplexer {
            snapshots: Snapshots::new(),
            rx,
            subscriptions: Vec::new(),
        };
        let publisher = Publisher { tx };
        mux.teardown();
        assert!(publisher.publish(SourceKey::Clients, json!([])).is_err());
    }

    #[tokio::test]
    async fn test_no_sources_ends_immediately() {
        let mut mux = Multiplexer::subscribe(Vec::new()).await;
        assert!(mux.next().await.is_none());
        assert_eq!(mux.snapshots().reported(), 0);
    }
}
