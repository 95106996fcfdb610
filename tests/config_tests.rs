//! `ragkit.toml` loading tests.

use std::io::Write;

use ragkit::rag::RankingPath;
use ragkit::types::{AppError, ErrorKind};
use ragkit::utils::toml_config::{ConfigError, RagConfig};
use ragkit_vector::DistanceMetric;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = RagConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.collection.metric, DistanceMetric::Cosine);
    assert_eq!(config.retrieval.ranking, RankingPath::Exhaustive);
    assert_eq!(config.index.m, 16);
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
[collection]
name = "handbook"
dimensions = 128
metric = "dot_product"

[embedding]
provider = "hash"

[retrieval]
top_k = 7
ranking = "index"
"#,
    );
    let config = RagConfig::load(file.path()).unwrap();
    assert_eq!(config.collection.dimensions, 128);
    assert_eq!(config.collection.metric, DistanceMetric::DotProduct);
    assert_eq!(config.retrieval.top_k, 7);

    let schema = config.schema();
    assert_eq!(schema.metric, DistanceMetric::DotProduct);
}

#[test]
fn test_invalid_file_is_configuration_error() {
    let file = write_config("[retrieval]\ntop_k = 0\n");
    let err = RagConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    let file = write_config("this is = = not toml");
    let err = RagConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));

    let app: AppError = err.into();
    assert_eq!(app.kind(), ErrorKind::Configuration);
    assert_eq!(app.kind().exit_code(), 5);
}

#[test]
fn test_sample_config_parses() {
    let sample = include_str!("../ragkit.toml");
    let config = RagConfig::from_toml_str(sample).unwrap();
    assert_eq!(config.collection.name, "documents");
}
