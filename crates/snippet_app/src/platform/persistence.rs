use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use snippet_core::FetchResult;
use tempfile::NamedTempFile;

const STATE_FILENAME: &str = ".snippet_results.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedState {
    results: BTreeMap<String, FetchResult>,
}

/// Last result of every monitor, kept between runs.
pub(crate) struct ResultStore {
    dir: PathBuf,
    results: BTreeMap<String, FetchResult>,
}

impl ResultStore {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(STATE_FILENAME);
        let results = match fs::read_to_string(&path) {
            Ok(content) => match ron::from_str::<PersistedState>(&content) {
                Ok(state) => {
                    engine_info!("Loaded {} stored results from {:?}", state.results.len(), path);
                    state.results
                }
                Err(err) => {
                    engine_warn!("Failed to parse stored results from {:?}: {}", path, err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                engine_warn!("Failed to read stored results from {:?}: {}", path, err);
                BTreeMap::new()
            }
        };
        Self {
            dir: dir.to_path_buf(),
            results,
        }
    }

    pub fn previous(&self, key: &str) -> Option<&FetchResult> {
        self.results.get(key)
    }

    pub fn record(&mut self, key: &str, result: FetchResult) {
        self.results.insert(key.to_string(), result);
    }

    pub fn save(&self) {
        if let Err(err) = self.write() {
            engine_error!("Failed to write stored results to {:?}: {}", self.dir, err);
        }
    }

    fn write(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let state = PersistedState {
            results: self.results.clone(),
        };
        let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
            .map_err(io::Error::other)?;

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.dir.join(STATE_FILENAME))
            .map_err(|err| err.error)?;
        Ok(())
    }
}
