//! # Environment Catalog
//!
//! Discovers environments by scanning the variables directory for
//! `<name>.tfvars` / `<name>.tfbackend` pairs. The scan is repeated on every
//! call; nothing is cached.
use crate::models::{
    CatalogEntry, CatalogFile, EnvironmentDefinition, FileKind, FileProblem, FileState,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

lazy_static! {
    static ref ENVIRONMENT_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("environment name pattern is valid");
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Environment '{name}' not found in '{directory}'.")]
    EnvironmentNotFound {
        name: String,
        directory: PathBuf,
        /// Every name the catalog does know, for suggestions.
        known: Vec<String>,
    },
    #[error("Environment '{name}' is incomplete: the {kind} file '{path}' is {problem}.")]
    IncompleteEnvironment {
        name: String,
        kind: FileKind,
        path: PathBuf,
        problem: FileProblem,
    },
    #[error("Environment '{name}' already exists.")]
    AlreadyExists { name: String },
    #[error(
        "Invalid environment name '{name}'. Use letters, digits, '.', '_' or '-', starting with a letter or digit."
    )]
    InvalidName { name: String },
    #[error("Could not read variables directory '{path}': {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Paths and metadata of an environment, for the information commands.
#[derive(Debug, Clone)]
pub struct EnvironmentDescription {
    pub entry: CatalogEntry,
}

impl EnvironmentDescription {
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn files(&self) -> impl Iterator<Item = (FileKind, &CatalogFile)> {
        FileKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.entry.file(kind)))
    }
}

/// The set of environments living in one variables directory.
#[derive(Debug, Clone)]
pub struct EnvironmentCatalog {
    directory: PathBuf,
}

impl EnvironmentCatalog {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Lists every environment name found, complete or not, sorted by name.
    ///
    /// Files whose stem is not a valid environment name are skipped, so every
    /// listed name can be resolved. A missing directory is an empty catalog.
    pub fn list(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        if !self.directory.is_dir() {
            log::debug!(
                "Variables directory {} does not exist",
                self.directory.display()
            );
            return Ok(Vec::new());
        }

        let mut stems = BTreeSet::new();
        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(CatalogError::Scan {
                        path: self.directory.clone(),
                        source: e.into(),
                    });
                }
                Err(e) => {
                    log::warn!("Skipping unreadable entry in variables directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let is_environment_file = path.extension().is_some_and(|ext| {
                FileKind::ALL
                    .iter()
                    .any(|kind| ext == kind.extension())
            });
            if !is_environment_file {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if ENVIRONMENT_NAME.is_match(stem) => {
                    stems.insert(stem.to_string());
                }
                _ => log::warn!(
                    "Ignoring '{}': not a valid environment name",
                    path.display()
                ),
            }
        }

        let entries: Vec<CatalogEntry> = stems.into_iter().map(|name| self.inspect(&name)).collect();
        log::debug!(
            "Catalog scan of {} found {} environment(s)",
            self.directory.display(),
            entries.len()
        );
        Ok(entries)
    }

    /// The names of all listed environments.
    pub fn names(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.list()?.into_iter().map(|entry| entry.name).collect())
    }

    /// Resolves a name into a usable definition.
    ///
    /// Fails with `EnvironmentNotFound` when neither file exists and with
    /// `IncompleteEnvironment` when one of them is missing or empty.
    pub fn resolve(&self, name: &str) -> Result<EnvironmentDefinition, CatalogError> {
        let entry = self.lookup(name)?;
        match entry.first_problem() {
            None => Ok(entry.to_definition()),
            Some((kind, problem)) => Err(CatalogError::IncompleteEnvironment {
                name: entry.name.clone(),
                kind,
                path: entry.file(kind).path.clone(),
                problem,
            }),
        }
    }

    /// Describes an environment, complete or not.
    pub fn describe(&self, name: &str) -> Result<EnvironmentDescription, CatalogError> {
        Ok(EnvironmentDescription {
            entry: self.lookup(name)?,
        })
    }

    /// Creates template files for whatever side of `name` is missing or empty.
    /// Returns the paths that were written.
    pub fn create(&self, name: &str) -> Result<Vec<PathBuf>, CatalogError> {
        validate_name(name)?;
        let entry = self.inspect(name);
        if entry.is_complete() {
            return Err(CatalogError::AlreadyExists {
                name: name.to_string(),
            });
        }

        self.ensure_directory()?;
        let mut written = Vec::new();
        for kind in FileKind::ALL {
            let file = entry.file(kind);
            if file.state.is_usable() {
                continue;
            }
            write_file(&file.path, &template(kind, name))?;
            written.push(file.path.clone());
        }
        Ok(written)
    }

    /// Copies a complete environment under a new name.
    ///
    /// Whole-word occurrences of the source name become the target name in the
    /// variables file; in the backend file only `/<source>/` path segments are
    /// rewritten so that bucket names survive.
    pub fn copy(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
    ) -> Result<EnvironmentDefinition, CatalogError> {
        validate_name(target)?;
        let from = self.resolve(source)?;
        let existing = self.inspect(target);
        let occupied = existing.variables.state.exists() || existing.backend.state.exists();
        if occupied && !overwrite {
            return Err(CatalogError::AlreadyExists {
                name: target.to_string(),
            });
        }

        let variables = replace_word(&read_file(&from.variables_file)?, source, target);
        let backend = read_file(&from.backend_file)?
            .replace(&format!("/{}/", source), &format!("/{}/", target));

        write_file(&existing.variables.path, &variables)?;
        write_file(&existing.backend.path, &backend)?;
        self.resolve(target)
    }

    // --- Internal helpers ---

    fn lookup(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        let entry = self.inspect(name);
        let plain_name = ENVIRONMENT_NAME.is_match(name);
        if plain_name && (entry.variables.state.exists() || entry.backend.state.exists()) {
            return Ok(entry);
        }
        Err(CatalogError::EnvironmentNotFound {
            name: name.to_string(),
            directory: self.directory.clone(),
            known: self.names()?,
        })
    }

    fn inspect(&self, name: &str) -> CatalogEntry {
        let file = |kind: FileKind| {
            let path = self.path_for(name, kind);
            let state = file_state(&path);
            CatalogFile { path, state }
        };
        CatalogEntry {
            name: name.to_string(),
            variables: file(FileKind::Variables),
            backend: file(FileKind::Backend),
        }
    }

    fn path_for(&self, name: &str, kind: FileKind) -> PathBuf {
        self.directory
            .join(format!("{}.{}", name, kind.extension()))
    }

    fn ensure_directory(&self) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.directory).map_err(|e| CatalogError::Write {
            path: self.directory.clone(),
            source: e,
        })
    }
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    if ENVIRONMENT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(CatalogError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Replaces `word` wherever it is not part of a longer identifier.
fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    let is_word_char = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let leading = if word.starts_with(is_word_char) { r"\b" } else { "" };
    let trailing = if word.ends_with(is_word_char) { r"\b" } else { "" };
    match Regex::new(&format!("{}{}{}", leading, regex::escape(word), trailing)) {
        Ok(pattern) => pattern
            .replace_all(text, regex::NoExpand(replacement))
            .into_owned(),
        Err(e) => {
            log::warn!("Falling back to plain replacement of '{}': {}", word, e);
            text.replace(word, replacement)
        }
    }
}

fn file_state(path: &Path) -> FileState {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => FileState::Present {
            size: meta.len(),
            modified: meta.modified().ok(),
        },
        Ok(meta) if meta.is_file() => FileState::Empty,
        _ => FileState::Missing,
    }
}

fn read_file(path: &Path) -> Result<String, CatalogError> {
    fs::read_to_string(path).map_err(|e| CatalogError::Scan {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), CatalogError> {
    fs::write(path, contents).map_err(|e| CatalogError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn template(kind: FileKind, name: &str) -> String {
    match kind {
        FileKind::Variables => format!(
            "# Input variables for the '{name}' environment\n\nenvironment = \"{name}\"\n"
        ),
        FileKind::Backend => format!(
            "# Backend configuration for the '{name}' environment\n\n# bucket = \"my-terraform-state\"\nkey = \"{name}/terraform.tfstate\"\n"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog_with(files: &[(&str, &str)]) -> (TempDir, EnvironmentCatalog) {
        let temp = TempDir::new().unwrap();
        let vars = temp.path().join("vars");
        fs::create_dir_all(&vars).unwrap();
        for (file, content) in files {
            fs::write(vars.join(file), content).unwrap();
        }
        let catalog = EnvironmentCatalog::new(vars);
        (temp, catalog)
    }

    fn standard() -> (TempDir, EnvironmentCatalog) {
        catalog_with(&[
            ("dev.tfvars", "environment = \"dev\""),
            ("dev.tfbackend", "key = \"state/dev/terraform.tfstate\""),
            ("prod.tfvars", "environment = \"prod\""),
            ("prod.tfbackend", "key = \"state/prod/terraform.tfstate\""),
            ("README.md", "not an environment"),
        ])
    }

    #[test]
    fn test_list_pairs_and_ignores_other_files() {
        let (_temp, catalog) = standard();
        let entries = catalog.list().unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["dev", "prod"]);
        assert!(entries.iter().all(CatalogEntry::is_complete));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = EnvironmentCatalog::new(temp.path().join("nope"));
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_known_environment_points_at_existing_files() {
        let (_temp, catalog) = standard();
        for name in catalog.names().unwrap() {
            let def = catalog.resolve(&name).unwrap();
            assert!(def.variables_file.is_file());
            assert!(def.backend_file.is_file());
            assert_eq!(def.variables_file.file_name().unwrap(), format!("{name}.tfvars").as_str());
        }
    }

    #[test]
    fn test_resolve_unknown_name_carries_known_names() {
        let (_temp, catalog) = standard();
        match catalog.resolve("pro").unwrap_err() {
            CatalogError::EnvironmentNotFound { name, known, .. } => {
                assert_eq!(name, "pro");
                assert_eq!(known, ["dev", "prod"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_missing_backend_is_incomplete() {
        let (_temp, catalog) = catalog_with(&[("dev.tfvars", "environment = \"dev\"")]);

        let entries = catalog.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].is_complete());

        match catalog.resolve("dev").unwrap_err() {
            CatalogError::IncompleteEnvironment {
                name,
                kind,
                problem,
                path,
            } => {
                assert_eq!(name, "dev");
                assert_eq!(kind, FileKind::Backend);
                assert_eq!(kind.to_string(), "backend");
                assert_eq!(problem, FileProblem::Missing);
                assert!(path.ends_with("dev.tfbackend"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_backend_only_is_listed_and_incomplete() {
        let (_temp, catalog) = catalog_with(&[("qa.tfbackend", "key = \"qa\"")]);
        assert_eq!(catalog.names().unwrap(), ["qa"]);
        assert!(matches!(
            catalog.resolve("qa"),
            Err(CatalogError::IncompleteEnvironment {
                kind: FileKind::Variables,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_file_is_not_usable() {
        let (_temp, catalog) =
            catalog_with(&[("dev.tfvars", "environment = \"dev\""), ("dev.tfbackend", "")]);
        assert!(matches!(
            catalog.resolve("dev"),
            Err(CatalogError::IncompleteEnvironment {
                problem: FileProblem::Empty,
                ..
            })
        ));
    }

    #[test]
    fn test_every_listed_name_resolves() {
        let (_temp, catalog) = catalog_with(&[
            ("dev.tfvars", "a = 1"),
            ("dev.tfbackend", "key = \"dev\""),
            ("_qa.tfvars", "a = 1"),
            ("_qa.tfbackend", "key = \"qa\""),
            ("my env.tfvars", "a = 1"),
            ("my env.tfbackend", "key = \"my\""),
            (".hidden.tfvars", "a = 1"),
        ]);

        let names = catalog.names().unwrap();
        assert_eq!(names, ["dev"]);
        for name in &names {
            assert!(catalog.resolve(name).is_ok(), "listed '{name}' must resolve");
        }
    }

    #[test]
    fn test_path_like_names_are_not_found() {
        let (_temp, catalog) = standard();
        assert!(matches!(
            catalog.resolve("../vars/dev"),
            Err(CatalogError::EnvironmentNotFound { .. })
        ));
    }

    #[test]
    fn test_describe_reports_metadata() {
        let (_temp, catalog) = catalog_with(&[("dev.tfvars", "environment = \"dev\"")]);
        let description = catalog.describe("dev").unwrap();
        let files: Vec<_> = description.files().collect();

        assert_eq!(description.name(), "dev");
        assert!(matches!(
            files[0],
            (FileKind::Variables, CatalogFile { state: FileState::Present { size: 19, modified: Some(_) }, .. })
        ));
        assert_eq!(files[1].1.state, FileState::Missing);
    }

    #[test]
    fn test_create_fills_in_missing_side_only() {
        let (_temp, catalog) = catalog_with(&[("stage.tfvars", "region = \"eu-west-1\"")]);

        let written = catalog.create("stage").unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("stage.tfbackend"));

        let def = catalog.resolve("stage").unwrap();
        assert_eq!(fs::read_to_string(def.variables_file).unwrap(), "region = \"eu-west-1\"");
        assert!(matches!(catalog.create("stage"), Err(CatalogError::AlreadyExists { .. })));
    }

    #[test]
    fn test_create_rejects_bad_names() {
        let (_temp, catalog) = standard();
        assert!(matches!(
            catalog.create("../escape"),
            Err(CatalogError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_copy_rewrites_names() {
        let (_temp, catalog) = standard();
        let def = catalog.copy("dev", "qa", false).unwrap();

        assert_eq!(
            fs::read_to_string(&def.variables_file).unwrap(),
            "environment = \"qa\""
        );
        assert_eq!(
            fs::read_to_string(&def.backend_file).unwrap(),
            "key = \"state/qa/terraform.tfstate\""
        );
        assert!(matches!(
            catalog.copy("dev", "prod", false),
            Err(CatalogError::AlreadyExists { .. })
        ));
        assert!(catalog.copy("dev", "prod", true).is_ok());
    }

    #[test]
    fn test_copy_leaves_longer_identifiers_alone() {
        let (_temp, catalog) = catalog_with(&[
            (
                "dev.tfvars",
                "environment = \"dev\"\ndevice_count = 2\nname = \"app-dev\"\n",
            ),
            ("dev.tfbackend", "bucket = \"devops-state\"\nkey = \"dev/terraform.tfstate\""),
        ]);
        let def = catalog.copy("dev", "prod", false).unwrap();

        assert_eq!(
            fs::read_to_string(&def.variables_file).unwrap(),
            "environment = \"prod\"\ndevice_count = 2\nname = \"app-prod\"\n"
        );
        assert_eq!(
            fs::read_to_string(&def.backend_file).unwrap(),
            "bucket = \"devops-state\"\nkey = \"dev/terraform.tfstate\""
        );
    }

    #[test]
    fn test_replace_word_handles_regex_characters() {
        assert_eq!(replace_word("a.b a_b.c a.bc", "a.b", "x"), "x a_b.c a.bc");
        assert_eq!(replace_word("dev-1 dev-10", "dev-1", "qa"), "qa dev-10");
    }
}
