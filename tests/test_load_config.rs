use std::env;
use std::fs::write;
use std::path::PathBuf;

use github_release::config::{Overrides, PublishConfig, API_URL_ENV, REPOSITORY_ENV};
use github_release::contract::MakeLatest;
use github_release::error::ReleaseError;
use github_release::load_config::load_config;
use serial_test::serial;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A full config file resolves into a release request without any flags.
#[tokio::test]
#[serial]
async fn test_load_config_full_file_resolves() {
    env::remove_var(REPOSITORY_ENV);
    env::remove_var(API_URL_ENV);
    let file = config_file(
        r#"
owner: octo
repo: app
api_url: https://ghe.example.test/api/v3
timeout_secs: 60
release:
  tag_name: v1.4.0
  target_commitish: main
  name: "Version 1.4.0"
  body: "Bug fixes"
  draft: true
  make_latest: false
assets:
  dir: dist
  pattern: "*.tar.gz"
mime_types:
  .sbom: application/spdx+json
"#,
    );

    let file_config = load_config(file.path()).expect("Config should load");
    let config = PublishConfig::resolve(&Overrides::default(), file_config).expect("resolves");

    assert_eq!(config.target.owner, "octo");
    assert_eq!(config.target.repo, "app");
    assert_eq!(config.api_url, "https://ghe.example.test/api/v3");
    assert_eq!(config.timeout.as_secs(), 60);
    assert_eq!(config.release.tag_name, "v1.4.0");
    assert_eq!(config.release.target_commitish, "main");
    assert_eq!(config.release.name, "Version 1.4.0");
    assert_eq!(config.release.body, "Bug fixes");
    assert!(config.release.draft);
    assert!(!config.release.prerelease);
    assert_eq!(config.release.make_latest, Some(MakeLatest::False));

    let assets = config.assets.expect("assets enabled");
    assert_eq!(assets.dir, PathBuf::from("dist"));
    assert_eq!(assets.pattern, "*.tar.gz");

    assert_eq!(
        config.mime_types.resolve(std::path::Path::new("app.sbom")),
        "application/spdx+json"
    );
    assert_eq!(
        config.mime_types.resolve(std::path::Path::new("app.tar.gz")),
        "application/gzip"
    );
}

/// Owner and repo fall back to `GITHUB_REPOSITORY` when neither flag nor file sets them.
#[tokio::test]
#[serial]
async fn test_load_config_infers_repository_from_env() {
    env::set_var(REPOSITORY_ENV, "octo/from-env");
    let file = config_file("release:\n  tag_name: v0.1.0\n");

    let file_config = load_config(file.path()).expect("Config should load");
    let config = PublishConfig::resolve(&Overrides::default(), file_config).expect("resolves");
    env::remove_var(REPOSITORY_ENV);

    assert_eq!(config.target.owner, "octo");
    assert_eq!(config.target.repo, "from-env");
    assert_eq!(config.assets.expect("assets enabled").dir, PathBuf::from("build"));
}

/// Flags win over the file, and the file wins over the environment.
#[tokio::test]
#[serial]
async fn test_load_config_flags_take_precedence() {
    env::set_var(REPOSITORY_ENV, "env-owner/env-repo");
    env::set_var(API_URL_ENV, "https://env.example.test");
    let file = config_file("owner: file-owner\nrelease:\n  tag_name: v1.0.0\n  prerelease: true\n");

    let overrides = Overrides {
        tag: Some("v2.0.0".into()),
        make_latest: Some(MakeLatest::Legacy),
        ..Default::default()
    };
    let file_config = load_config(file.path()).expect("Config should load");
    let config = PublishConfig::resolve(&overrides, file_config).expect("resolves");
    env::remove_var(REPOSITORY_ENV);
    env::remove_var(API_URL_ENV);

    assert_eq!(config.target.owner, "file-owner");
    assert_eq!(config.target.repo, "env-repo");
    assert_eq!(config.api_url, "https://env.example.test");
    assert_eq!(config.release.tag_name, "v2.0.0");
    assert!(config.release.prerelease);
    assert_eq!(config.release.make_latest, Some(MakeLatest::Legacy));
}

/// Missing owner with no fallback is reported as such.
#[tokio::test]
#[serial]
async fn test_load_config_missing_owner() {
    env::remove_var(REPOSITORY_ENV);
    let file = config_file("repo: app\nrelease:\n  tag_name: v1.0.0\n");

    let file_config = load_config(file.path()).expect("Config should load");
    let err = PublishConfig::resolve(&Overrides::default(), file_config).unwrap_err();
    assert!(matches!(err, ReleaseError::MissingOwner), "got {err:?}");
}

/// A config file without a tag name cannot produce a release.
#[tokio::test]
#[serial]
async fn test_load_config_missing_tag_name() {
    env::remove_var(REPOSITORY_ENV);
    let file = config_file("owner: octo\nrepo: app\nrelease:\n  name: untagged\n");

    let file_config = load_config(file.path()).expect("Config should load");
    let err = PublishConfig::resolve(&Overrides::default(), file_config).unwrap_err();
    assert!(matches!(err, ReleaseError::MissingTagName), "got {err:?}");
}

/// Release notes may come from a file referenced by the config.
#[tokio::test]
#[serial]
async fn test_load_config_reads_body_file() {
    env::remove_var(REPOSITORY_ENV);
    let notes = config_file("## Changes\n\n- faster uploads\n");
    let yaml = format!(
        "owner: octo\nrepo: app\nrelease:\n  tag_name: v1.0.0\n  body_file: {}\n",
        notes.path().display()
    );
    let file = config_file(&yaml);

    let file_config = load_config(file.path()).expect("Config should load");
    let config = PublishConfig::resolve(&Overrides::default(), file_config).expect("resolves");
    assert!(config.release.body.contains("faster uploads"));
}

/// If the config file is not valid YAML, load_config errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let file = config_file("not-yaml: [:::");

    let err = load_config(file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

/// Unknown keys are rejected rather than silently ignored.
#[tokio::test]
#[serial]
async fn test_load_config_rejects_unknown_keys() {
    let file = config_file("owner: octo\nrelase:\n  tag_name: v1.0.0\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("YAML"), "got: {err}");
}

/// `make_latest` accepts only the values the forge understands.
#[tokio::test]
#[serial]
async fn test_load_config_rejects_unknown_make_latest() {
    let file = config_file("release:\n  tag_name: v1.0.0\n  make_latest: sometimes\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("make_latest"), "got: {err}");
}

/// A path that does not exist is a read error, not a parse error.
#[tokio::test]
#[serial]
async fn test_load_config_missing_file() {
    let err = load_config("/definitely/not/here/release.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "got: {err}");
}
