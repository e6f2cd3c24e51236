// src/session.rs

use crate::core::{
    catalog::EnvironmentCatalog,
    paths,
    settings::{LoadedSettings, SettingsError, SettingsStore},
};
use crate::models::EffectiveConfig;
use crate::system::executor::{ProcessRunner, SystemRunner};
use std::path::{Path, PathBuf};

/// Everything one invocation works against: the project, its settings and the
/// runner used to reach the wrapped tool.
///
/// Settings are read on first use, so commands that only write them (such as
/// `config set`) still work when a settings file is broken.
#[derive(Debug)]
pub struct Session {
    project_root: PathBuf,
    store: SettingsStore,
    settings: Option<LoadedSettings>,
    runner: Box<dyn ProcessRunner>,
}

impl Session {
    /// Opens the project containing `start`, using the well-known global settings file.
    pub fn open(start: &Path) -> Result<Self, SettingsError> {
        let project_root = paths::find_project_root(start);
        let store = SettingsStore::discover(&project_root)?;
        Ok(Self::with_store(project_root, store))
    }

    pub fn with_store(project_root: PathBuf, store: SettingsStore) -> Self {
        Self {
            project_root,
            store,
            settings: None,
            runner: Box::new(SystemRunner),
        }
    }

    /// Replaces the process runner.
    pub fn with_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// The merged settings, loaded on first call.
    pub fn settings(&mut self) -> Result<&LoadedSettings, SettingsError> {
        let loaded = match self.settings.take() {
            Some(loaded) => loaded,
            None => self.store.load()?,
        };
        Ok(self.settings.insert(loaded))
    }

    pub fn config(&mut self) -> Result<EffectiveConfig, SettingsError> {
        Ok(self.settings()?.config.clone())
    }

    /// The catalog for `config`'s variables directory, anchored at the project root.
    pub fn catalog(&self, config: &EffectiveConfig) -> EnvironmentCatalog {
        EnvironmentCatalog::new(self.project_root.join(&config.variables_directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_are_loaded_lazily() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let store = SettingsStore::new(temp.path().join("global.toml"), root.clone());
        let mut session = Session::with_store(root.clone(), store);

        // Broken after construction: nothing has been read yet.
        fs::write(root.join(".toffee.toml"), "verbose = ").unwrap();
        assert!(session.settings().is_err());

        fs::write(root.join(".toffee.toml"), "variables_directory = \"envs\"\n").unwrap();
        let config = session.config().unwrap();
        assert_eq!(
            session.catalog(&config).directory(),
            root.join("envs").as_path()
        );
    }

    #[test]
    fn test_absolute_variables_directory_is_kept() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("project");
        let store = SettingsStore::new(temp.path().join("global.toml"), root.clone());
        let session = Session::with_store(root, store);

        let config = EffectiveConfig {
            variables_directory: temp.path().join("shared-vars"),
            ..Default::default()
        };
        assert_eq!(
            session.catalog(&config).directory(),
            temp.path().join("shared-vars").as_path()
        );
    }
}
