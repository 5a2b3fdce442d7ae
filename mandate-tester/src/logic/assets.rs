use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mandate_game::{
    ContentFormatError, ContentLoader, ContentStore, EndingsTable, GameEngine, ScenarioSet,
};

/// Error raised while reading content from disk.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryLoaderError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid content in {}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: ContentFormatError,
    },
}

/// Loads `<name>.json` scenario sets and `endings.json` from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read(&self, file: &str) -> Result<(PathBuf, String), DirectoryLoaderError> {
        let path = self.root.join(file);
        fs::read_to_string(&path)
            .map(|raw| (path.clone(), raw))
            .map_err(|source| DirectoryLoaderError::Io { path, source })
    }
}

impl ContentLoader for DirectoryLoader {
    type Error = DirectoryLoaderError;

    fn load_scenario_set(&self, name: &str) -> Result<ScenarioSet, Self::Error> {
        let (path, raw) = self.read(&format!("{name}.json"))?;
        ScenarioSet::from_json(&raw).map_err(|source| DirectoryLoaderError::Format { path, source })
    }

    fn load_endings(&self) -> Result<EndingsTable, Self::Error> {
        let (path, raw) = self.read("endings.json")?;
        EndingsTable::from_json(&raw).map_err(|source| DirectoryLoaderError::Format { path, source })
    }
}

/// Content shared by every simulated run.
#[derive(Debug, Clone)]
pub struct TesterAssets {
    content: Arc<ContentStore>,
    source: String,
}

impl TesterAssets {
    /// Content compiled into the game crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON does not validate.
    pub fn load_default() -> anyhow::Result<Self> {
        Ok(Self {
            content: Arc::new(ContentStore::bundled()?),
            source: "bundled".to_string(),
        })
    }

    /// Content read from `dir` (`scenarios.json` and `endings.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or malformed.
    pub fn load_from_dir(dir: &Path) -> anyhow::Result<Self> {
        let engine = GameEngine::new(DirectoryLoader::new(dir));
        let content = engine.load_content("scenarios")?;
        log::info!(
            "loaded {} scenarios from {}",
            content.scenarios.len(),
            dir.display()
        );
        Ok(Self {
            content,
            source: dir.display().to_string(),
        })
    }

    /// Wrap content that is already loaded.
    #[must_use]
    pub fn from_content(content: Arc<ContentStore>, source: impl Into<String>) -> Self {
        Self {
            content,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentStore> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.content.scenarios.len()
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mandate-assets-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_content_from_directory() {
        let dir = temp_dir("ok");
        fs::write(
            dir.join("scenarios.json"),
            r#"{"Setups":[{"ID":7,"Setup":"lizard","Decisions":[{"Choice":"a"},{"Choice":"b"}]}]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("endings.json"),
            r#"{"Approval":["a"],"Efficiency":["e"],"Envrionment":["v"],"Finance":["f"]}"#,
        )
        .unwrap();
        let assets = TesterAssets::load_from_dir(&dir).unwrap();
        assert_eq!(assets.scenario_count(), 1);
        assert_eq!(assets.source(), dir.display().to_string());
    }

    #[test]
    fn reports_missing_files_with_path() {
        let dir = temp_dir("missing");
        let err = DirectoryLoader::new(&dir)
            .load_endings()
            .expect_err("no endings file");
        assert!(matches!(err, DirectoryLoaderError::Io { .. }));
        assert!(err.to_string().contains("endings.json"));
    }

    #[test]
    fn bundled_assets_load() {
        let assets = TesterAssets::load_default().unwrap();
        assert!(assets.scenario_count() >= 12);
        assert_eq!(assets.source(), "bundled");
    }
}
