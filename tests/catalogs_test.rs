//! Evaluation, training, data and model catalog tests

mod common;

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use mlops_core::clock::FixedClock;
use mlops_core::entities::{ConfusionMatrix, RunArtifactId, RunId};
use mlops_core::model_schema;
use mlops_core::Error;
use serde::Serialize;

#[derive(Serialize)]
struct Merchant {
    category: String,
}
model_schema!(Merchant { category: String });

#[derive(Serialize)]
struct Transaction {
    amount: f64,
    country: String,
    merchant: Merchant,
}
model_schema!(Transaction {
    amount: f64,
    country: String,
    merchant: Merchant,
});

fn transaction(amount: f64, country: &str, category: &str) -> Transaction {
    Transaction {
        amount,
        country: country.to_string(),
        merchant: Merchant {
            category: category.to_string(),
        },
    }
}

fn transactions() -> Vec<Transaction> {
    vec![
        transaction(12.5, "NL", "grocery"),
        transaction(80.0, "DE", "travel"),
        transaction(3.2, "NL", "grocery"),
        transaction(45.0, "NL", "fuel"),
    ]
}

#[derive(Serialize)]
struct TrainerOptions {
    learning_rate: f64,
    epochs: u32,
    optimizer: String,
}

// =============================================================================
// Evaluation
// =============================================================================

#[tokio::test]
async fn test_log_metrics_in_order() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());

    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();
    mlops.evaluation().log_metric(run.run_id(), "AUC", 0.81).await.unwrap();
    clock.advance(ChronoDuration::seconds(1));
    let second = mlops.evaluation().log_metric(run.run_id(), "AUC", 0.84).await.unwrap();

    assert_eq!(second.logged_at(), common::t0() + ChronoDuration::seconds(1));
    let values: Vec<f64> = mlops
        .evaluation()
        .get_metrics(run.run_id())
        .await
        .unwrap()
        .iter()
        .map(mlops_core::entities::Metric::value)
        .collect();
    assert_eq!(values, [0.81, 0.84]);
}

#[tokio::test]
async fn test_log_metric_unknown_run() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());

    let result = mlops.evaluation().log_metric(RunId::new(), "AUC", 0.5).await;
    assert!(matches!(result, Err(Error::NotFound { entity: "run", .. })));
    assert!(mlops.evaluation().get_metrics(RunId::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_confusion_matrix_replaced() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();

    assert!(mlops.evaluation().get_confusion_matrix(run.run_id()).await.unwrap().is_none());

    let labels = vec!["legit".to_string(), "fraud".to_string()];
    let first = ConfusionMatrix::new(labels.clone(), vec![vec![90, 2], vec![3, 5]]).unwrap();
    let second = ConfusionMatrix::new(labels, vec![vec![92, 0], vec![1, 7]]).unwrap();
    mlops.evaluation().log_confusion_matrix(run.run_id(), first).await.unwrap();
    mlops.evaluation().log_confusion_matrix(run.run_id(), second.clone()).await.unwrap();

    let stored = mlops.evaluation().get_confusion_matrix(run.run_id()).await.unwrap().unwrap();
    assert_eq!(stored, second);
    assert_eq!(stored.total(), 100);
    assert_eq!(stored.accuracy(), Some(0.99));
}

// =============================================================================
// Training
// =============================================================================

#[tokio::test]
async fn test_log_hyper_parameters() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();

    let options = TrainerOptions {
        learning_rate: 0.01,
        epochs: 20,
        optimizer: "adam".to_string(),
    };
    let logged = mlops.training().log_hyper_parameters(run.run_id(), &options).await.unwrap();
    assert_eq!(logged.len(), 3);
    mlops.training().log_hyper_parameter(run.run_id(), "seed", 42).await.unwrap();

    let parameters = mlops.training().get_hyper_parameters(run.run_id()).await.unwrap();
    let value = |name: &str| {
        parameters
            .iter()
            .find(|p| p.parameter_name == name)
            .map(|p| p.value.clone())
    };
    assert_eq!(parameters.len(), 4);
    assert_eq!(value("learning_rate").as_deref(), Some("0.01"));
    assert_eq!(value("epochs").as_deref(), Some("20"));
    assert_eq!(value("optimizer").as_deref(), Some("adam"));
    assert_eq!(value("seed").as_deref(), Some("42"));
    assert_eq!(parameters.last().unwrap().parameter_name, "seed");
}

#[tokio::test]
async fn test_log_hyper_parameters_rejects_non_object() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();

    let result = mlops.training().log_hyper_parameters(run.run_id(), &[1, 2, 3]).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let unknown = mlops.training().log_hyper_parameter(RunId::new(), "seed", 1).await;
    assert!(matches!(unknown, Err(Error::NotFound { .. })));
}

// =============================================================================
// Data
// =============================================================================

#[tokio::test]
async fn test_log_data_columns_and_hash() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();

    let data = mlops.data().log_data(run.run_id(), &transactions()).await.unwrap();

    assert_eq!(data.rows, 4);
    assert!(data.data_hash.starts_with("blake3:"));
    let columns: Vec<(&str, &str)> = data
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.column_type.as_str()))
        .collect();
    assert_eq!(
        columns,
        [
            ("amount", "f64"),
            ("country", "String"),
            ("merchant", "Merchant"),
            ("merchant.category", "String"),
        ]
    );

    let again = mlops.data().log_data(run.run_id(), &transactions()).await.unwrap();
    assert_eq!(again.data_hash, data.data_hash);

    let mut changed = transactions();
    changed[0].amount = 13.0;
    let other = mlops.data().log_data(run.run_id(), &changed).await.unwrap();
    assert_ne!(other.data_hash, data.data_hash);

    let stored = mlops.data().get_data(run.run_id()).await.unwrap().unwrap();
    assert_eq!(stored, other);
}

#[tokio::test]
async fn test_log_data_distribution_merges_counts() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();
    let rows = transactions();
    mlops.data().log_data(run.run_id(), &rows).await.unwrap();

    let histogram = mlops
        .data()
        .log_data_distribution(run.run_id(), &rows, "country")
        .await
        .unwrap();
    assert_eq!(histogram, vec![("NL".to_string(), 3), ("DE".to_string(), 1)]);

    let nested = mlops
        .data()
        .log_data_distribution(run.run_id(), &rows, "merchant.category")
        .await
        .unwrap();
    assert_eq!(nested[0], ("grocery".to_string(), 2));

    mlops
        .data()
        .log_data_distribution(run.run_id(), &rows[..1], "country")
        .await
        .unwrap();
    let data = mlops.data().get_data(run.run_id()).await.unwrap().unwrap();
    let country = data.column("country").unwrap();
    let nl = country.distributions.iter().find(|d| d.value == "NL").unwrap();
    assert_eq!(nl.count, 4);
    assert_eq!(country.distributions.len(), 2);
}

#[tokio::test]
async fn test_log_data_distribution_requires_data_and_column() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, dir.path());
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();
    let rows = transactions();

    let no_data = mlops.data().log_data_distribution(run.run_id(), &rows, "country").await;
    assert!(matches!(no_data, Err(Error::NotFound { entity: "data", .. })));

    mlops.data().log_data(run.run_id(), &rows).await.unwrap();
    let no_column = mlops.data().log_data_distribution(run.run_id(), &rows, "iban").await;
    assert!(matches!(
        no_column,
        Err(Error::NotFound {
            entity: "data column",
            ..
        })
    ));
}

// =============================================================================
// Model artifacts and registry
// =============================================================================

#[tokio::test]
async fn test_upload_register_download() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, &dir.path().join("repo"));
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();

    let model_file = dir.path().join("model.onnx");
    tokio::fs::write(&model_file, b"onnx-bytes").await.unwrap();

    let artifact = mlops.model().upload(run.run_id(), &model_file).await.unwrap();
    assert_eq!(artifact.name, "model.onnx");
    assert_eq!(artifact.run_id, run.run_id());
    assert_eq!(
        mlops.model().get_run_artifacts(run.run_id()).await.unwrap(),
        vec![artifact.clone()]
    );

    let first = mlops
        .model()
        .register_model(run.experiment_id(), artifact.run_artifact_id, "alice", "baseline")
        .await
        .unwrap();
    clock.advance(ChronoDuration::days(1));
    let second = mlops
        .model()
        .register_model(run.experiment_id(), artifact.run_artifact_id, "bob", "retrained")
        .await
        .unwrap();
    assert_eq!((first.version, second.version), (1, 2));
    assert_eq!(second.registered_at, common::t0() + ChronoDuration::days(1));

    let latest = mlops
        .model()
        .get_latest_registered_model(run.experiment_id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.registered_by, "bob");
    assert_eq!(mlops.model().get_registered_models(run.experiment_id()).await.unwrap().len(), 2);

    let restored = dir.path().join("restored").join("model.onnx");
    mlops.model().download(&artifact, &restored).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"onnx-bytes");
}

#[tokio::test]
async fn test_upload_same_file_name_twice() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, &dir.path().join("repo"));
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();
    let model_file = dir.path().join("model.onnx");

    tokio::fs::write(&model_file, b"epoch-1").await.unwrap();
    let first = mlops.model().upload(run.run_id(), &model_file).await.unwrap();
    tokio::fs::write(&model_file, b"epoch-2").await.unwrap();
    let second = mlops.model().upload(run.run_id(), &model_file).await.unwrap();

    assert_ne!(first.uri, second.uri);
    assert!(first.uri.contains(&first.run_artifact_id.to_string()));
    assert_eq!(mlops.model().get_run_artifacts(run.run_id()).await.unwrap().len(), 2);

    let restored = dir.path().join("restored.onnx");
    mlops.model().download(&first, &restored).await.unwrap();
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"epoch-1");
}

#[tokio::test]
async fn test_register_model_wrong_experiment() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, &dir.path().join("repo"));
    let run = mlops.lifecycle().create_run_for_experiment("fraud", "").await.unwrap();
    let other = mlops.lifecycle().create_experiment("churn").await.unwrap();

    let model_file = dir.path().join("model.bin");
    tokio::fs::write(&model_file, b"weights").await.unwrap();
    let artifact = mlops.model().upload(run.run_id(), &model_file).await.unwrap();

    let wrong = mlops
        .model()
        .register_model(other, artifact.run_artifact_id, "alice", "")
        .await;
    assert!(matches!(wrong, Err(Error::InvalidInput(_))));

    let missing = mlops
        .model()
        .register_model(run.experiment_id(), RunArtifactId::new(), "alice", "")
        .await;
    assert!(matches!(
        missing,
        Err(Error::NotFound {
            entity: "run artifact",
            ..
        })
    ));
    assert!(mlops
        .model()
        .get_latest_registered_model(other)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_upload_unknown_run() {
    let clock = Arc::new(FixedClock::new(common::t0()));
    let dir = tempfile::tempdir().unwrap();
    let mlops = common::context(&clock, &dir.path().join("repo"));

    let model_file = dir.path().join("model.bin");
    tokio::fs::write(&model_file, b"weights").await.unwrap();

    let result = mlops.model().upload(RunId::new(), &model_file).await;
    assert!(matches!(result, Err(Error::NotFound { entity: "run", .. })));
    assert!(!dir.path().join("repo").exists());
}
