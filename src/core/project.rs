//! Project discovery and initialization
//!
//! A sawtrack project is any directory containing a `.sawtrack/` folder.
//! Records live next to it, one directory per collection.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::EntityPrefix;

/// Marker directory name
pub const PROJECT_DIR: &str = ".sawtrack";

const CONFIG_TEMPLATE: &str = "\
# sawtrack project configuration
#
# default_branch: Main          # branch used by `blade register` when --branch is omitted
# report_dir: reports           # where `report export` writes files
# log: info                     # tracing filter (overridden by SAWTRACK_LOG)
";

#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("not a sawtrack project (or any of the parent directories): {0}")]
    #[diagnostic(
        code(sawtrack::project::not_found),
        help("Run 'sawtrack init' to create a project here")
    )]
    NotFound(PathBuf),

    #[error("sawtrack project already exists at {0}")]
    #[diagnostic(code(sawtrack::project::exists), help("Use --force to reinitialize"))]
    AlreadyExists(PathBuf),

    #[error("project I/O error at {path}: {source}")]
    #[diagnostic(code(sawtrack::project::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A discovered project root
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk up from the current directory looking for `.sawtrack/`
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir().map_err(|source| ProjectError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` looking for `.sawtrack/`
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
            current = dir.parent();
        }
        Err(ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create the project layout under `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        Self::init_with(root, false)
    }

    /// Create the project layout, optionally reinitializing an existing one.
    ///
    /// Reinitializing keeps existing records and only restores missing
    /// directories and the config template.
    pub fn init_with(root: &Path, force: bool) -> Result<Self, ProjectError> {
        let marker = root.join(PROJECT_DIR);
        if marker.exists() && !force {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }

        let project = Self {
            root: root.to_path_buf(),
        };

        create_dir(&marker)?;
        for prefix in EntityPrefix::all() {
            create_dir(&project.collection_dir(*prefix))?;
        }

        let config = project.config_path();
        if !config.exists() {
            fs::write(&config, CONFIG_TEMPLATE).map_err(|source| ProjectError::Io {
                path: config.clone(),
                source,
            })?;
        }

        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.sawtrack/` directory
    pub fn sawtrack_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.sawtrack_dir().join("config.yaml")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.sawtrack_dir().join("credentials.yaml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.sawtrack_dir().join("session.yaml")
    }

    /// Directory holding one collection's documents
    pub fn collection_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.collection())
    }
}

fn create_dir(path: &Path) -> Result<(), ProjectError> {
    fs::create_dir_all(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_layout() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.sawtrack_dir().is_dir());
        assert!(project.config_path().is_file());
        assert!(tmp.path().join("blades").is_dir());
        assert!(tmp.path().join("sharpening-history").is_dir());
        assert!(tmp.path().join("branches").is_dir());
        assert!(tmp.path().join("blade-types").is_dir());
        assert!(tmp.path().join("users").is_dir());
    }

    #[test]
    fn test_init_twice_requires_force() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyExists(_))
        ));
        assert!(Project::init_with(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        let nested = tmp.path().join("blades");

        let found = Project::discover_from(&nested).unwrap();
        assert_eq!(found.root(), tmp.path());
    }

    #[test]
    fn test_discover_outside_project_fails() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }
}
