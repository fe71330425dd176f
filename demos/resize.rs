//! # Example: resize
//!
//! Four tasks on a gate of three, then the gate shrinks and grows at runtime.
//!
//! Demonstrates how to:
//! - Wire the built-in [`LogWriter`] subscriber into `tracing_subscriber::fmt`.
//! - Queue tasks past capacity and watch one wait.
//! - Shrink capacity (running tasks evicted, permits retired).
//! - Grow capacity (the waiting task is admitted).
//! - Shut down gracefully.
//!
//! ## Flow
//! ```text
//! capacity 3:  T1 T2 T3 running, T4 pending
//! set_capacity(1)  ─► T1, T2 evicted (oldest first), T3 running, T4 pending
//! set_capacity(4)  ─► T4 admitted, two spare permits
//! stop(T3)         ─► T3 terminated, permit released
//! shutdown()       ─► everything terminated
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example resize --features logging
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use taskgate::{Config, LogWriter, Snapshot, Subscribe, TaskLifecycleManager};
use tracing_subscriber::EnvFilter;

fn print(label: &str, snap: &Snapshot) {
    println!("--- {label} (capacity {}, free {}) ---", snap.capacity, snap.available_permits);
    for v in snap.initialized.iter().chain(&snap.pending).chain(&snap.in_progress) {
        println!("{v}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let raw = std::env::var("TASKGATE_CAPACITY").unwrap_or_default();
    let cfg = Config {
        tick: Duration::from_millis(250),
        ..Config::default()
    }
    .with_capacity_str(&raw);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let mgr = TaskLifecycleManager::builder(cfg).with_subscribers(subs).build();

    let mut ids = Vec::new();
    for _ in 0..4 {
        let id = mgr.create_task().await;
        mgr.enqueue(id).await.context("enqueue")?;
        ids.push(id);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;
    print("queued", &mgr.snapshot().await);

    let resize = mgr.set_capacity(1).await.context("shrink")?;
    println!("evicted: {:?}", resize.evicted);
    tokio::time::sleep(Duration::from_millis(500)).await;
    print("shrunk", &mgr.snapshot().await);

    mgr.set_capacity_str("4").await.context("grow")?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    print("grown", &mgr.snapshot().await);

    if let Some(survivor) = mgr.snapshot().await.in_progress_ids().first().copied() {
        mgr.stop(survivor).await.context("stop")?;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    print("stopped", &mgr.snapshot().await);

    mgr.shutdown().await?;
    for id in ids {
        println!("{}", mgr.task(id).await?);
    }
    Ok(())
}
