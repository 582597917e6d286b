//! # Example: three-tier server boot
//!
//! Boots a storage engine, a network listener on top of it, and an optional
//! replication subsystem on top of both, then waits for Ctrl-C. Run with:
//!
//! ```text
//! cargo run --example server --features logging
//! ```

use std::any::Any;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use compvisor::{
    Component, ComponentError, ComponentSpec, Config, LogWriter, Orchestrator, Subscribe,
};

struct Storage {
    // Opened lazily by prepare; hooks take &self.
    path: Mutex<Option<String>>,
}

#[async_trait]
impl Component for Storage {
    fn name(&self) -> &str {
        "storage"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn validate_options(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        // A real engine would reject bad directories here.
        Ok(())
    }

    async fn prepare(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        let mut path = self.path.lock().expect("storage path poisoned");
        *path = Some("/tmp/compvisor-demo".to_string());
        println!("[storage] engine opened at {}", path.as_deref().unwrap());
        Ok(())
    }

    async fn unprepare(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        println!("[storage] engine closed");
        Ok(())
    }
}

struct Network;

#[async_trait]
impl Component for Network {
    fn name(&self) -> &str {
        "network"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn start(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        // Storage started first; the handle is safe to use.
        let storage = ctx.feature::<Storage>();
        println!("[network] listening, backed by '{}'", storage.name());
        Ok(())
    }

    async fn begin_shutdown(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        println!("[network] draining connections");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }

    async fn stop(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        println!("[network] listener closed");
        Ok(())
    }
}

struct Replication;

#[async_trait]
impl Component for Replication {
    fn name(&self) -> &str {
        "replication"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn validate_options(&self, ctx: &Orchestrator) -> Result<(), ComponentError> {
        // Pretend replication is off in this deployment. Disabling here lets
        // the scheduler drop it before any resources are allocated.
        ctx.disable_feature::<Replication>();
        println!("[replication] disabled by configuration");
        Ok(())
    }

    async fn start(&self, _ctx: &Orchestrator) -> Result<(), ComponentError> {
        println!("[replication] syncing (never reached in this demo)");
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let mut cfg = Config::default();
    cfg.grace = Duration::from_secs(2);

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];

    let orch = Orchestrator::builder(cfg)
        .add(ComponentSpec::new(Storage {
            path: Mutex::new(None),
        }))?
        .add(ComponentSpec::new(Network).starts_after::<Storage>())?
        .add(
            ComponentSpec::new(Replication)
                .starts_after::<Storage>()
                .starts_after::<Network>()
                .optional(),
        )?
        .with_subscribers(subscribers)
        .build();

    println!("{}", orch.dependency_report()?);
    println!("press Ctrl-C to shut down");

    orch.run().await?;
    println!("clean shutdown complete");
    Ok(())
}
