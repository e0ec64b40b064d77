//! Track two runs of an experiment, pick the best one and deploy it.
//!
//! The registry and cluster are simulated by printing what would be done.
//!
//! Run with: cargo run --example track_and_deploy

use mlops_core::config::MlOpsConfig;
use mlops_core::deployment::{image_name, namespace_name, DockerContext, KubernetesContext};
use mlops_core::entities::{DeploymentTarget, RunId};
use mlops_core::model_schema;
use mlops_core::storage::MemoryStore;
use mlops_core::MlOpsContext;
use serde::Serialize;

#[derive(Serialize)]
struct IrisInput {
    sepal_length: f32,
    sepal_width: f32,
    petal_length: f32,
    petal_width: f32,
    species: String,
}
model_schema!(IrisInput {
    sepal_length: f32,
    sepal_width: f32,
    petal_length: f32,
    petal_width: f32,
    species: String,
});

struct IrisPrediction;
model_schema!(IrisPrediction { species: String, score: f32 });

struct DryRunDocker {
    registry: String,
}

impl DockerContext for DryRunDocker {
    async fn build_and_push_image(&self, experiment_name: &str, run_id: RunId) -> anyhow::Result<String> {
        let image = image_name(&self.registry, experiment_name, run_id);
        println!("docker build -t {image} && docker push {image}");
        Ok(image)
    }
}

struct DryRunKubernetes {
    prefix: String,
}

impl KubernetesContext for DryRunKubernetes {
    async fn create_namespace(&self, experiment_name: &str, target: &DeploymentTarget) -> anyhow::Result<String> {
        let namespace = namespace_name(&self.prefix, experiment_name, &target.name);
        println!("kubectl create namespace {namespace}");
        Ok(namespace)
    }

    async fn deploy_container(
        &self,
        experiment_name: &str,
        image_name: &str,
        namespace: &str,
    ) -> anyhow::Result<String> {
        println!("kubectl -n {namespace} create deployment {experiment_name} --image {image_name}");
        Ok(format!("{namespace}/{experiment_name}"))
    }
}

fn sample(species: &str, scale: f32) -> IrisInput {
    IrisInput {
        sepal_length: 5.1 * scale,
        sepal_width: 3.5 * scale,
        petal_length: 1.4 * scale,
        petal_width: 0.2 * scale,
        species: species.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mlops_core::logging::init("mlops_core=info");

    let config = MlOpsConfig::default().with_env_overrides();
    let docker = DryRunDocker {
        registry: config.docker.registry_name.clone(),
    };
    let kubernetes = DryRunKubernetes {
        prefix: config.kubernetes.namespace_prefix.clone(),
    };
    let mlops = MlOpsContext::builder()
        .config(config)
        .build(MemoryStore::new(), docker, kubernetes)?;

    let rows = vec![sample("setosa", 1.0), sample("versicolor", 1.3), sample("setosa", 0.9)];

    let first = mlops.lifecycle().create_run_for_experiment("iris", "").await?;
    let second = mlops.lifecycle().create_run(first.experiment_id(), "").await?;
    for (run, accuracy) in [(&first, 0.91), (&second, 0.96)] {
        mlops.lifecycle().register_model_schema::<IrisInput, IrisPrediction>(run.run_id()).await?;
        mlops.data().log_data(run.run_id(), &rows).await?;
        mlops.data().log_data_distribution(run.run_id(), &rows, "species").await?;
        mlops.training().log_hyper_parameter(run.run_id(), "max_depth", 4).await?;
        mlops.evaluation().log_metric(run.run_id(), "Accuracy", accuracy).await?;
        mlops.lifecycle().set_training_time(run.run_id()).await?;
    }

    let best = mlops.lifecycle().get_best_run(first.experiment_id(), "accuracy").await?;
    println!("best run: {}", best.run_id());

    let target = mlops.deployment().create_deployment_target("Test", false).await?;
    let deployment = mlops.deployment().deploy(best.run_id(), &target, "demo").await?;
    println!("deployed {} into {}", deployment.image_name, deployment.namespace);

    Ok(())
}
