use std::path::Path;

use crate::error::AppError;
use crate::models::history::HistoryRecord;
use crate::storage::history;

pub fn get_history(data_dir: &Path) -> crate::error::Result<Vec<HistoryRecord>> {
    history::get_all(data_dir)
}

pub fn delete_history(data_dir: &Path, id: &str) -> crate::error::Result<()> {
    if history::delete_record(data_dir, id)? {
        Ok(())
    } else {
        Err(AppError::Validation(format!("No history record with id: {}", id)))
    }
}

pub fn clear_history(data_dir: &Path) -> crate::error::Result<()> {
    history::clear(data_dir)
}
