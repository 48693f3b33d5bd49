//! End-to-end provisioning flow
//!
//! Exercises the complete pipeline: YAML config loading -> engine
//! construction -> reconciliation against the store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use panel_core::{ElementProvisioner, ElementStore, ScanAction};
use panel_test_utils::{MemoryStore, StaticOrgs};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A config directory and a definitions directory under one tempdir.
struct Fixture {
    _temp: TempDir,
    config_dir: PathBuf,
    defs_dir: PathBuf,
}

fn setup(config_body: &str) -> Fixture {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let config_dir = root.join("provisioning");
    let defs_dir = root.join("defs");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&defs_dir).unwrap();

    fs::write(
        config_dir.join("panels.yaml"),
        config_body.replace("{defs}", defs_dir.to_str().unwrap()),
    )
    .unwrap();

    Fixture {
        _temp: temp,
        config_dir,
        defs_dir,
    }
}

fn write_def(dir: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

const FLAT_CONFIG: &str = r"
apiVersion: 1
providers:
  - name: panels
    folder: General
    updateIntervalSeconds: 5
    options:
      path: '{defs}'
";

#[tokio::test]
async fn files_flow_from_disk_into_the_store() {
    let fixture = setup(FLAT_CONFIG);
    write_def(&fixture.defs_dir, "x.json", r#"{"uid":"x","title":"X"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    assert_eq!(provisioner.engines().len(), 1);
    provisioner.provision().await;

    assert_eq!(store.save_calls(), 1);
    let elements = store.elements();
    let folder = elements.iter().find(|e| e.is_folder).unwrap();
    let element = elements.iter().find(|e| !e.is_folder).unwrap();
    assert_eq!(folder.title, "General");
    assert_eq!(element.folder_id, folder.id);
    assert_eq!(store.refs().len(), 1);
}

#[tokio::test]
async fn removing_the_file_removes_the_element() {
    let fixture = setup(FLAT_CONFIG);
    let def = write_def(&fixture.defs_dir, "x.json", r#"{"uid":"x","title":"X"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.provision().await;
    let provisioned_id = store.refs()[0].element_id;

    fs::remove_file(&def).unwrap();
    let report = provisioner.engines()[0].reconcile().await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].action, ScanAction::Deleted);
    assert_eq!(store.delete_calls(), 1);
    assert!(store.refs().is_empty());
    assert!(store.element(provisioned_id).is_none());
}

#[tokio::test]
async fn repeated_provisioning_is_idempotent() {
    let fixture = setup(FLAT_CONFIG);
    write_def(&fixture.defs_dir, "x.json", r#"{"uid":"x","title":"X"}"#);
    write_def(&fixture.defs_dir, "y.json", r#"{"uid":"y","title":"Y"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.provision().await;
    let writes = store.write_calls();

    provisioner.provision().await;
    assert_eq!(store.write_calls(), writes);
}

#[tokio::test]
async fn mirrored_sources_build_folders_from_the_tree() {
    let fixture = setup(
        r"
apiVersion: 1
providers:
  - name: panels
    options:
      path: '{defs}'
      foldersFromFilesStructure: true
",
    );
    write_def(&fixture.defs_dir, "root.json", r#"{"title":"Root"}"#);
    write_def(
        &fixture.defs_dir,
        "network/latency.json",
        r#"{"title":"Latency"}"#,
    );

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.provision().await;

    let elements = store.elements();
    let folder = elements.iter().find(|e| e.is_folder).unwrap();
    assert_eq!(folder.title, "network");
    assert_eq!(
        elements.iter().find(|e| e.title == "Root").unwrap().folder_id,
        0
    );
    assert_eq!(
        elements
            .iter()
            .find(|e| e.title == "Latency")
            .unwrap()
            .folder_id,
        folder.id
    );
}

#[tokio::test]
async fn disable_deletion_unprovisions_instead() {
    let fixture = setup(
        r"
apiVersion: 1
providers:
  - name: panels
    disableDeletion: true
    options:
      path: '{defs}'
",
    );
    let def = write_def(&fixture.defs_dir, "x.json", r#"{"title":"X"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    provisioner.provision().await;
    fs::remove_file(&def).unwrap();
    provisioner.engines()[0].reconcile().await.unwrap();

    assert_eq!(store.delete_calls(), 0);
    assert_eq!(store.unprovision_calls(), 1);
    assert_eq!(store.elements().len(), 1);
    assert!(store.refs().is_empty());
}

#[tokio::test]
async fn conflicting_folder_options_fail_startup() {
    let fixture = setup(
        r"
apiVersion: 1
providers:
  - name: panels
    folder: General
    folderUid: general
    options:
      path: '{defs}'
      foldersFromFilesStructure: true
",
    );

    let store: Arc<dyn ElementStore> = Arc::new(MemoryStore::new());
    let result = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        store,
        &StaticOrgs::default_orgs(),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn write_restriction_turns_scans_read_only() {
    let fixture = setup(FLAT_CONFIG);
    write_def(&fixture.defs_dir, "x.json", r#"{"title":"X"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &fixture.config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    let engine = &provisioner.engines()[0];
    engine.set_write_access_restricted(true);

    let report = engine.reconcile().await.unwrap();

    // The diff is computed and reported, but no element writes reach the
    // store. Folder resolution is a read-side concern and still runs.
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.action == ScanAction::SkippedWriteRestricted));
    assert_eq!(store.save_calls(), 0);
    assert_eq!(store.delete_calls(), 0);
    assert_eq!(store.unprovision_calls(), 0);
}

#[tokio::test]
async fn multiple_sources_provision_independently() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let config_dir = root.join("provisioning");
    let defs_a = root.join("a");
    let defs_b = root.join("b");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(&defs_a).unwrap();
    fs::create_dir_all(&defs_b).unwrap();

    fs::write(
        config_dir.join("panels.yaml"),
        format!(
            r"
apiVersion: 1
providers:
  - name: source-a
    options:
      path: '{}'
  - name: source-b
    options:
      path: '{}'
",
            defs_a.display(),
            defs_b.display()
        ),
    )
    .unwrap();

    write_def(&defs_a, "a.json", r#"{"title":"A"}"#);
    write_def(&defs_b, "b.json", r#"{"title":"B"}"#);

    let store = Arc::new(MemoryStore::new());
    let provisioner = ElementProvisioner::from_config_dir(
        &config_dir,
        Arc::clone(&store) as Arc<dyn ElementStore>,
        &StaticOrgs::default_orgs(),
    )
    .await
    .unwrap();

    assert_eq!(provisioner.engines().len(), 2);
    provisioner.provision().await;

    let refs = store.refs();
    assert_eq!(refs.len(), 2);
    assert!(refs.iter().any(|r| r.name == "source-a"));
    assert!(refs.iter().any(|r| r.name == "source-b"));
}
