//! Scheduled polling through the provisioner facade
//!
//! Runs the real scheduler tasks under paused tokio time.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use panel_core::{ElementProvisioner, ElementStore};
use panel_test_utils::{MemoryStore, StaticOrgs};
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    config_dir: PathBuf,
    defs_dir: PathBuf,
}

fn setup(interval_seconds: u64) -> Fixture {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let config_dir = root.join("provisioning");
    let defs_dir = root.join("defs");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&defs_dir).unwrap();

    fs::write(
        config_dir.join("panels.yaml"),
        format!(
            r"
apiVersion: 1
providers:
  - name: panels
    updateIntervalSeconds: {interval_seconds}
    options:
      path: '{}'
",
            defs_dir.display()
        ),
    )
    .unwrap();

    Fixture {
        _temp: temp,
        config_dir,
        defs_dir,
    }
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn polling_picks_up_files_created_after_startup() {
    let fixture = setup(5);

    let store = Arc::new(MemoryStore::new());
    let mut provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.provision().await;
    assert_eq!(store.save_calls(), 0);

    provisioner.start();

    // A file appears between ticks; the next tick provisions it.
    fs::write(
        fixture.defs_dir.join("late.json"),
        r#"{"uid":"late","title":"Late"}"#,
    )
    .unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert!(store.save_calls() >= 1);
    assert_eq!(store.refs().len(), 1);

    provisioner.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_suppresses_future_ticks() {
    let fixture = setup(5);
    fs::write(fixture.defs_dir.join("x.json"), r#"{"title":"X"}"#).unwrap();

    let store = Arc::new(MemoryStore::new());
    let mut provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.start();
    provisioner.shutdown().await;

    // All tasks are gone; no tick ever fired.
    assert_eq!(store.write_calls(), 0);
}
