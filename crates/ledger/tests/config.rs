use std::fs;

use evrd_ledger::{load_ledger_config, ConfigError, LedgerConfig};
use evrd_log::{Format, Level};

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = load_ledger_config(&dir.path().join("evrd.conf")).expect("config");
    assert_eq!(config, LedgerConfig::default());
    assert_eq!(config.asset_cache_entries, 50_000);
    assert_eq!(config.verifier_cache_entries, 10_000);
}

#[test]
fn parses_keys_comments_and_repeats() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("evrd.conf");
    fs::write(
        &path,
        "# ledger settings\n\
         AssetCache=1000\n\
         assetcache = 2000 ; later value wins\n\
         verifiercache=64 # inline comment\n\
         ; disabled=1\n\
         loglevel=Debug\n\
         logformat=json\n\
         logtimestamps=no\n\
         unknownkey=whatever\n",
    )
    .expect("write conf");

    let config = load_ledger_config(&path).expect("config");
    assert_eq!(config.asset_cache_entries, 2000);
    assert_eq!(config.verifier_cache_entries, 64);
    assert_eq!(config.log.level, Level::Debug);
    assert_eq!(config.log.format, Format::Json);
    assert!(!config.log.timestamps);
}

#[test]
fn bare_key_enables_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("evrd.conf");
    fs::write(&path, "logtimestamps\n").expect("write conf");
    assert!(load_ledger_config(&path).expect("config").log.timestamps);
}

#[test]
fn malformed_value_names_file_and_key() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("evrd.conf");
    fs::write(&path, "assetcache=lots\n").expect("write conf");

    let err = load_ledger_config(&path).expect_err("invalid");
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "assetcache"));
    let message = err.to_string();
    assert!(message.contains("assetcache"));
    assert!(message.contains("evrd.conf"));

    fs::write(&path, "loglevel=chatty\n").expect("write conf");
    assert!(load_ledger_config(&path).is_err());
}
