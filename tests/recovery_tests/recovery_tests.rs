//! Tests for Recovery
//!
//! These tests verify:
//! - Fatal error on an unparsable main file
//! - Leftover temp files are ignored
//! - Torn WAL tails are discarded and trimmed
//! - Missing, corrupt, and stale checkpoints
//! - Replay idempotence across restarts

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use ledgerkv::storage::CheckpointLoad;
use ledgerkv::{Config, Store, StorePaths};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const PUT_A1: &[u8] = b"{\"action\":\"put\",\"key\":\"A\",\"value\":1}\n";
const PUT_B2: &[u8] = b"{\"action\":\"put\",\"key\":\"B\",\"value\":2}\n";
const TORN: &[u8] = b"{\"action\": \"put\", \"key\": \"CORRUPT\"";

fn setup() -> (TempDir, StorePaths) {
    let temp_dir = TempDir::new().unwrap();
    let paths = StorePaths::in_dir(temp_dir.path());
    (temp_dir, paths)
}

fn open(paths: &StorePaths) -> Store {
    Store::open(paths.clone(), Config::default()).unwrap()
}

fn append(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn wal_size(paths: &StorePaths) -> u64 {
    fs::metadata(&paths.wal_file).unwrap().len()
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_corrupt_main_file_is_fatal() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1, \"B\"").unwrap();
    append(&paths.wal_file, PUT_B2);

    let err = Store::open(paths.clone(), Config::default()).err().unwrap();

    assert!(err.is_corruption());
    // Nothing was overwritten
    assert_eq!(fs::read(&paths.data_file).unwrap(), b"{\"A\": 1, \"B\"");
}

#[test]
fn test_non_object_main_file_is_fatal() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"[1, 2, 3]").unwrap();

    let err = Store::open(paths, Config::default()).err().unwrap();
    assert!(err.is_corruption());
}

#[test]
fn test_garbage_temp_file_does_not_affect_recovery() {
    let (temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1}").unwrap();
    fs::write(temp.path().join("db.json.tmp"), b"{\"A\": 999, \"garb").unwrap();
    fs::write(temp.path().join("checkpoint.json.tmp"), b"nonsense").unwrap();

    let store = open(&paths);

    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.recovery_report().stale_temp_files_removed, 2);
    assert!(!temp.path().join("db.json.tmp").exists());
}

#[test]
fn test_snapshot_without_wal() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1, \"B\": [true]}").unwrap();

    let store = open(&paths);
    let report = store.recovery_report();

    assert!(!report.wal_present);
    assert!(!report.snapshot_created);
    assert_eq!(report.snapshot_keys, 2);
    assert_eq!(store.get("B"), Some(json!([true])));
    assert!(paths.wal_file.exists());
}

#[test]
fn test_snapshot_plus_wal_tail() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1}").unwrap();
    append(&paths.wal_file, PUT_B2);
    append(&paths.wal_file, b"{\"action\":\"delete\",\"key\":\"A\"}\n");

    let store = open(&paths);

    assert_eq!(store.get("A"), None);
    assert_eq!(store.get("B"), Some(json!(2)));
    assert_eq!(store.recovery_report().records_replayed, 2);
}

// =============================================================================
// WAL Truncation Tests
// =============================================================================

#[test]
fn test_truncated_record_is_ignored() {
    let (_temp, paths) = setup();
    append(&paths.wal_file, PUT_A1);
    append(&paths.wal_file, b"{\"action\":\"put\",\"key\":\"B\",\"val");

    let store = open(&paths);

    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.get("B"), None);
}

#[test]
fn test_torn_tail_is_trimmed_so_later_appends_survive() {
    let (_temp, paths) = setup();
    append(&paths.wal_file, PUT_A1);
    append(&paths.wal_file, TORN);

    {
        let store = open(&paths);
        let report = store.recovery_report();
        assert_eq!(report.discarded_bytes, TORN.len() as u64);
        assert_eq!(report.wal_valid_len, PUT_A1.len() as u64);
        assert_eq!(wal_size(&paths), PUT_A1.len() as u64);

        store.put("C", 3).unwrap();
    }

    let store = open(&paths);
    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.get("C"), Some(json!(3)));
    assert_eq!(store.get("CORRUPT"), None);
    assert_eq!(store.recovery_report().discarded_bytes, 0);
}

#[test]
fn test_malformed_middle_record_discards_the_rest() {
    let (_temp, paths) = setup();
    append(&paths.wal_file, PUT_A1);
    append(&paths.wal_file, b"{\"action\":\"explode\"}\n");
    append(&paths.wal_file, PUT_B2);

    let store = open(&paths);

    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.get("B"), None);
    assert_eq!(wal_size(&paths), PUT_A1.len() as u64);
}

#[test]
fn test_corrupt_suffix_after_checkpoint_is_ignored() {
    let (_temp, paths) = setup();

    let offset = {
        let store = open(&paths);
        for (i, key) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            store.put(*key, i + 1).unwrap();
        }
        store.stats().checkpoint_offset
    };
    append(&paths.wal_file, TORN);

    let store = open(&paths);
    let report = store.recovery_report();

    assert_eq!(report.checkpoint, CheckpointLoad::Loaded(offset));
    assert_eq!(report.start_offset, offset);
    assert_eq!(report.records_replayed, 0);
    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.get("E"), Some(json!(5)));
    assert_eq!(store.get("CORRUPT"), None);
}

// =============================================================================
// Checkpoint Reconciliation Tests
// =============================================================================

#[test]
fn test_missing_checkpoint_replays_whole_wal() {
    let (_temp, paths) = setup();
    append(&paths.wal_file, PUT_A1);
    append(&paths.wal_file, PUT_B2);

    let store = open(&paths);
    let report = store.recovery_report();

    assert_eq!(report.checkpoint, CheckpointLoad::Missing);
    assert_eq!(report.start_offset, 0);
    assert_eq!(report.records_replayed, 2);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_corrupt_checkpoint_defaults_to_zero() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{}").unwrap();
    fs::write(&paths.checkpoint_file, b"{\"wal_offset\": ").unwrap();
    append(&paths.wal_file, PUT_A1);

    let store = open(&paths);

    assert!(matches!(store.recovery_report().checkpoint, CheckpointLoad::Corrupt(_)));
    assert_eq!(store.recovery_report().start_offset, 0);
    assert_eq!(store.get("A"), Some(json!(1)));
}

#[test]
fn test_wrong_shape_checkpoint_defaults_to_zero() {
    let (_temp, paths) = setup();
    fs::write(&paths.checkpoint_file, b"{\"offset\": 10}").unwrap();
    append(&paths.wal_file, PUT_A1);

    let store = open(&paths);

    assert_eq!(store.recovery_report().start_offset, 0);
    assert_eq!(store.get("A"), Some(json!(1)));
}

#[test]
fn test_stale_checkpoint_offset_is_clamped_and_rewritten() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1}").unwrap();
    fs::write(&paths.checkpoint_file, b"{\"wal_offset\": 9999}").unwrap();
    append(&paths.wal_file, PUT_B2);

    let store = open(&paths);
    let report = store.recovery_report();

    assert!(report.offset_clamped);
    assert_eq!(report.start_offset, 0);
    assert_eq!(report.records_replayed, 1);
    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(store.get("B"), Some(json!(2)));

    let offset = read_json(&paths.checkpoint_file)["wal_offset"].as_u64().unwrap();
    assert_eq!(offset, wal_size(&paths));
    assert_eq!(read_json(&paths.data_file), json!({"A": 1, "B": 2}));
}

#[test]
fn test_checkpoint_without_wal_is_reconciled() {
    let (_temp, paths) = setup();
    fs::write(&paths.data_file, b"{\"A\": 1}").unwrap();
    fs::write(&paths.checkpoint_file, b"{\"wal_offset\": 512}").unwrap();

    let store = open(&paths);

    assert!(store.recovery_report().offset_clamped);
    assert_eq!(store.get("A"), Some(json!(1)));
    assert_eq!(read_json(&paths.checkpoint_file), json!({"wal_offset": 0}));
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_replay_is_idempotent_across_restarts() {
    let (_temp, paths) = setup();
    {
        let store = open(&paths);
        store.put("A", 1).unwrap();
        store.put("B", 2).unwrap();
        store.delete("A").unwrap();
        store.put("C", 3).unwrap();
    }

    let wal_before = fs::read(&paths.wal_file).unwrap();
    for _ in 0..5 {
        let store = open(&paths);
        assert_eq!(store.get("A"), None);
        assert_eq!(store.get("B"), Some(json!(2)));
        assert_eq!(store.get("C"), Some(json!(3)));
        assert_eq!(store.len(), 2);
    }
    assert_eq!(fs::read(&paths.wal_file).unwrap(), wal_before);
}

#[test]
fn test_snapshot_created_only_on_first_open() {
    let (_temp, paths) = setup();

    assert!(open(&paths).recovery_report().snapshot_created);
    assert!(!open(&paths).recovery_report().snapshot_created);
}
