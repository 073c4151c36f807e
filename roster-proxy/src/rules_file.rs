use std::io;
use std::path::PathBuf;

use roster_parser::MappingRules;
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to write mapping rules to {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("failed to encode mapping rules: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Mapping rules persisted as one JSON document.
pub struct RulesFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RulesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Saved rules merged over the defaults. Unreadable files fall back to the defaults.
    pub async fn load(&self) -> MappingRules {
        let _guard = self.lock.lock().await;

        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return MappingRules::default(),
            Err(err) => {
                log::error!("Failed to read {}: {err}", self.path.display());
                return MappingRules::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::error!("Ignoring malformed mapping rules in {}: {err}", self.path.display());
            MappingRules::default()
        })
    }

    pub async fn save(&self, rules: &MappingRules) -> Result<(), RulesError> {
        let contents = serde_json::to_string_pretty(rules)?;

        let _guard = self.lock.lock().await;
        fs::write(&self.path, contents)
            .await
            .map_err(|source| RulesError::Write {
                path: self.path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = RulesFile::new(dir.path().join("rules.json"));

        assert_eq!(file.load().await, MappingRules::default());
    }

    #[tokio::test]
    async fn saved_rules_are_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let file = RulesFile::new(dir.path().join("rules.json"));

        let rules = MappingRules {
            off: "OFF,REST".into(),
            work: String::new(),
        };
        file.save(&rules).await.unwrap();

        assert_eq!(file.load().await, rules);
    }

    #[tokio::test]
    async fn malformed_or_partial_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let file = RulesFile::new(&path);

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(file.load().await, MappingRules::default());

        std::fs::write(&path, r#"{"휴무": "REST"}"#).unwrap();
        let rules = file.load().await;
        assert_eq!(rules.off, "REST");
        assert_eq!(rules.work, MappingRules::default().work);
    }

    #[tokio::test]
    async fn write_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = RulesFile::new(dir.path().join("missing-dir").join("rules.json"));

        assert!(matches!(
            file.save(&MappingRules::default()).await,
            Err(RulesError::Write { .. })
        ));
    }
}
