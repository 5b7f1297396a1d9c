use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;

/// Read a JSON sidecar into a generic key/value map.
pub fn read_json(path: &Path) -> Result<Map<String, Value>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value: Value =
        serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("{} does not hold a JSON object at the top level", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bold.json");
        fs::write(&path, r#"{"RepetitionTime": 1.5, "TaskName": "rest"}"#).unwrap();
        let meta = read_json(&path).unwrap();
        assert_eq!(meta["TaskName"], "rest");
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn rejects_non_object_top_level() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(read_json(&path).is_err());
    }

    #[test]
    fn rejects_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_json(&dir.path().join("absent.json")).is_err());
    }
}
