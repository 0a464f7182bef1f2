use std::path::Path;

use super::JsonStore;
use crate::models::history::HistoryRecord;

const STORE_FILE: &str = "history.json";
const RECORDS_KEY: &str = "records";

/// Add a record (newest first), keep at most `max_items`, persist immediately.
pub fn add_record(
    data_dir: &Path,
    record: HistoryRecord,
    max_items: usize,
) -> crate::error::Result<()> {
    let mut store = JsonStore::open(data_dir, STORE_FILE)?;
    let mut records = load_records(&store);
    records.insert(0, record);
    records.truncate(max_items);
    store.set(RECORDS_KEY, serde_json::to_value(&records)?);
    store.save()
}

/// All records, newest first.
pub fn get_all(data_dir: &Path) -> crate::error::Result<Vec<HistoryRecord>> {
    let store = JsonStore::open(data_dir, STORE_FILE)?;
    Ok(load_records(&store))
}

/// Delete a record by ID. Returns whether anything was removed.
pub fn delete_record(data_dir: &Path, id: &str) -> crate::error::Result<bool> {
    let mut store = JsonStore::open(data_dir, STORE_FILE)?;
    let mut records = load_records(&store);
    let before = records.len();
    records.retain(|r| r.id != id);
    let removed = records.len() != before;
    store.set(RECORDS_KEY, serde_json::to_value(&records)?);
    store.save()?;
    Ok(removed)
}

pub fn clear(data_dir: &Path) -> crate::error::Result<()> {
    let mut store = JsonStore::open(data_dir, STORE_FILE)?;
    store.set(RECORDS_KEY, serde_json::Value::Array(Vec::new()));
    store.save()
}

/// Records from the store, or an empty list if the key is missing or unreadable.
fn load_records(store: &JsonStore) -> Vec<HistoryRecord> {
    store
        .get(RECORDS_KEY)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
