use greenmiles_core::logs;
use greenmiles_core::trip_db::TripDb;
use tempdir::TempDir;

#[test]
fn init_writes_a_rotating_log_file() {
    let temp_dir = TempDir::new("logs").unwrap();
    let dir = temp_dir.path().to_str().unwrap();
    logs::init(dir).unwrap();

    // opening a store emits a few records through the global logger
    let db_dir = TempDir::new("logs-db").unwrap();
    let _db = TripDb::open(db_dir.path().to_str().unwrap(), "aiko").unwrap();

    assert!(temp_dir.path().join("logs").exists());

    // the global logger can only be installed once per process
    assert!(logs::init(dir).is_err());
}
