use anyhow::{Context, Result};
use citegraph_core::PaperRecord;
use std::path::Path;

pub fn load_papers(path: &Path) -> Result<Vec<PaperRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read papers from {}", path.display()))?;
    let records = PaperRecord::parse_collection(&raw)
        .with_context(|| format!("failed to parse papers in {}", path.display()))?;
    tracing::info!(count = records.len(), path = %path.display(), "papers loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_json_array() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("papers.json");
        std::fs::write(&path, r#"[{"id":1,"authors":[{"name":"A"}]},{"id":2}]"#).expect("write");
        assert_eq!(load_papers(&path).expect("load").len(), 2);
    }

    #[test]
    fn reports_path_on_failure() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "[{").expect("write");
        let err = load_papers(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
