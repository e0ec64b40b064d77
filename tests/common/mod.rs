//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use chrono::{DateTime, TimeZone, Utc};
use mlops_core::clock::FixedClock;
use mlops_core::dependencies::StaticDependencyIdentifier;
use mlops_core::deployment::{image_name, namespace_name, DockerContext, KubernetesContext};
use mlops_core::entities::{DeploymentTarget, PackageDependency, RunId};
use mlops_core::storage::MemoryStore;
use mlops_core::MlOpsContext;

/// Instant all fixed clocks start at.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Dependency snapshot used instead of the host's lockfile.
pub fn dependencies() -> Arc<StaticDependencyIdentifier> {
    Arc::new(StaticDependencyIdentifier::new(vec![
        PackageDependency::new("serde", "1.0.210"),
        PackageDependency::new("tokio", "1.40.0"),
    ]))
}

/// Which collaborator step should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    ImageBuild,
    Namespace,
    Deploy,
}

/// Registry double: names images like a real registry would.
#[derive(Debug)]
pub struct FakeDocker {
    fail: bool,
    pub builds: AtomicUsize,
}

impl FakeDocker {
    pub const fn new(fail: bool) -> Self {
        Self {
            fail,
            builds: AtomicUsize::new(0),
        }
    }
}

impl DockerContext for FakeDocker {
    async fn build_and_push_image(&self, experiment_name: &str, run_id: RunId) -> anyhow::Result<String> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("registry.test:5000 refused the push");
        }
        Ok(image_name("registry.test:5000", experiment_name, run_id))
    }
}

/// Cluster double recording every call.
#[derive(Debug, Default)]
pub struct FakeKubernetes {
    fail_namespace: bool,
    fail_deploy: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeKubernetes {
    pub fn failing_namespace() -> Self {
        Self {
            fail_namespace: true,
            ..Self::default()
        }
    }

    pub fn failing_deploy() -> Self {
        Self {
            fail_deploy: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl KubernetesContext for FakeKubernetes {
    async fn create_namespace(&self, experiment_name: &str, target: &DeploymentTarget) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(format!("namespace:{experiment_name}"));
        if self.fail_namespace {
            bail!("namespace quota exceeded");
        }
        Ok(namespace_name("mlops", experiment_name, &target.name))
    }

    async fn deploy_container(
        &self,
        _experiment_name: &str,
        image_name: &str,
        namespace: &str,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(format!("deploy:{image_name}"));
        if self.fail_deploy {
            bail!("image pull backoff");
        }
        Ok(format!("{namespace}/model"))
    }
}

/// Collaborators failing at `fail`.
pub fn collaborators(fail: FailAt) -> (FakeDocker, FakeKubernetes) {
    match fail {
        FailAt::Nothing => (FakeDocker::new(false), FakeKubernetes::default()),
        FailAt::ImageBuild => (FakeDocker::new(true), FakeKubernetes::default()),
        FailAt::Namespace => (FakeDocker::new(false), FakeKubernetes::failing_namespace()),
        FailAt::Deploy => (FakeDocker::new(false), FakeKubernetes::failing_deploy()),
    }
}

/// Context over a fresh memory store with a fixed clock at [`t0`].
pub fn context(
    clock: &Arc<FixedClock>,
    model_root: &std::path::Path,
) -> MlOpsContext<MemoryStore, FakeDocker, FakeKubernetes> {
    let mut config = mlops_core::config::MlOpsConfig::default();
    config.model_storage.root = model_root.to_path_buf();
    let (docker, kubernetes) = collaborators(FailAt::Nothing);

    MlOpsContext::builder()
        .config(config)
        .clock(clock.clone())
        .dependency_identifier(dependencies())
        .build(MemoryStore::new(), docker, kubernetes)
        .unwrap()
}
