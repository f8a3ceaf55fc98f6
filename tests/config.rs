use assert_matches::assert_matches;

use nano_index::config::{Config, ConfigLoader, DEFAULT_BASE_DIR, default_data_samples};
use nano_index::domain::{LayoutMode, McVersionPolicy};
use nano_index::error::IndexError;

#[test]
fn parse_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("nano-index.json");
    std::fs::write(
        &path,
        r#"{
            "redirector": "root://cmsxrootd.fnal.gov/",
            "years": ["2023", "2023BPix"],
            "layout": "new",
            "mc_versions": "last",
            "jobs": 4
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.redirector, "root://cmsxrootd.fnal.gov/");
    assert_eq!(resolved.base_dir, DEFAULT_BASE_DIR);
    assert_eq!(resolved.years, vec!["2023".to_string(), "2023BPix".to_string()]);
    assert_eq!(resolved.data_samples, default_data_samples());
    assert_eq!(resolved.layout, Some(LayoutMode::New));
    assert_eq!(resolved.mc_versions, McVersionPolicy::Last);
    assert_eq!(resolved.jobs, 4);
}

#[test]
fn explicit_missing_config_fails() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(IndexError::ConfigRead(_))
    );
}

#[test]
fn invalid_layout_is_rejected() {
    let config = Config {
        layout: Some("sideways".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(IndexError::InvalidLayout(_))
    );
}

#[test]
fn zero_jobs_means_sequential() {
    let config = Config {
        jobs: Some(0),
        ..Config::default()
    };
    assert_eq!(ConfigLoader::resolve_config(config).unwrap().jobs, 1);
}
