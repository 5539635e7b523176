//! JSON helpers with validation and atomic file writes.

use crate::error::{IoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializes data to JSON with error handling.
pub fn to_json<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    Ok(serde_json::to_string(data)?)
}

/// Serializes data to pretty-printed JSON.
pub fn to_json_pretty<T>(data: &T) -> Result<String>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(data)?)
}

/// Deserializes data from JSON string.
///
/// # Returns
/// Deserialized data on success, `IoError::Validation` for blank input and
/// `IoError::Json` for malformed input.
pub fn from_json<T>(json: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if json.trim().is_empty() {
        return Err(IoError::validation("Empty JSON string"));
    }

    Ok(serde_json::from_str(json)?)
}

/// Writes pretty JSON next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub fn write_json_file<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = to_json_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .and_then(|()| std::fs::rename(&tmp, path))
        .map_err(|e| IoError::FileSystem(e).with_context(format!("writing JSON to {:?}", path)))
}

/// Reads and deserializes a JSON file.
pub fn read_json_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let json = std::fs::read_to_string(&path).map_err(|e| {
        IoError::FileSystem(e).with_context(format!("reading JSON from {:?}", path.as_ref()))
    })?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Cooldown {
        creature: u64,
        last_bred_at: i64,
    }

    #[test]
    fn test_from_json_rejects_blank() {
        let result: Result<Cooldown> = from_json("   ");
        assert!(matches!(result, Err(IoError::Validation(_))));
    }

    #[test]
    fn test_from_json_reports_malformed() {
        let result: Result<Cooldown> = from_json("{\"creature\": \"x\"}");
        assert!(matches!(result, Err(IoError::Json(_))));
    }

    #[test]
    fn test_file_write_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("arena_io_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cooldown.json");
        let data = Cooldown {
            creature: 3,
            last_bred_at: 1_700_000_000,
        };

        write_json_file(&data, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        let back: Cooldown = read_json_file(&path).unwrap();
        assert_eq!(back, data);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_missing_file_has_context() {
        let err = read_json_file::<Cooldown, _>("/nonexistent/arena.json").unwrap_err();
        assert!(err.to_string().contains("reading JSON from"));
    }
}
