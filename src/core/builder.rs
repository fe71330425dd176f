use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{manager::TaskLifecycleManager, state::Shared};

/// Builder for constructing a [`TaskLifecycleManager`] with optional subscribers.
pub struct ManagerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (admission, eviction, resize, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager. Must be called inside a tokio runtime.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus for broadcasting
    /// - Subscriber workers and the bus listener feeding them
    /// - Shared state with the admission gate
    pub fn build(self) -> TaskLifecycleManager {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let runtime_token = CancellationToken::new();
        let listener_token = CancellationToken::new();

        let listener = {
            let mut rx = bus.subscribe();
            let token = listener_token.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        res = rx.recv() => match res {
                            Ok(ev) => subs.emit(&ev),
                            Err(RecvError::Lagged(_)) => continue,
                            Err(RecvError::Closed) => break,
                        },
                        _ = token.cancelled() => {
                            while let Ok(ev) = rx.try_recv() {
                                subs.emit(&ev);
                            }
                            break;
                        }
                    }
                }
                subs.shutdown().await;
            })
        };

        let shared = Arc::new(Shared::new(self.cfg, bus));
        TaskLifecycleManager::from_parts(shared, runtime_token, listener_token, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().await.push(event.kind);
        }
    }

    struct AlwaysPanics;

    #[async_trait]
    impl Subscribe for AlwaysPanics {
        async fn on_event(&self, _event: &Event) {
            panic!("always");
        }
        fn name(&self) -> &'static str {
            "always-panics"
        }
    }

    #[tokio::test]
    async fn test_panicking_subscriber_reports_once_per_event() {
        let rec = Arc::new(Recorder::default());
        let mgr = ManagerBuilder::new(Config::default())
            .with_subscribers(vec![
                Arc::new(AlwaysPanics) as Arc<dyn Subscribe>,
                rec.clone() as Arc<dyn Subscribe>,
            ])
            .build();
        let mut rx = mgr.subscribe();

        mgr.create_task().await;
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;

        let mut panics = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SubscriberPanicked {
                assert_eq!(ev.subscriber, Some("always-panics"));
                panics += 1;
            }
        }
        assert_eq!(panics, 1);

        let seen = rec.seen.lock().await.clone();
        assert_eq!(
            seen,
            vec![EventKind::TaskCreated, EventKind::SubscriberPanicked]
        );
        mgr.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_through_shutdown() {
        let rec = Arc::new(Recorder::default());
        let mgr = ManagerBuilder::new(Config::default())
            .with_subscribers(vec![rec.clone() as Arc<dyn Subscribe>])
            .build();

        let id = mgr.create_task().await;
        mgr.enqueue(id).await.unwrap();
        mgr.shutdown().await.unwrap();

        let seen = rec.seen.lock().await.clone();
        assert_eq!(seen.first(), Some(&EventKind::TaskCreated));
        assert!(seen.contains(&EventKind::ShutdownRequested));
        assert_eq!(seen.last(), Some(&EventKind::AllStoppedWithin));
    }
}
