//! Log file path resolution.
//!
//! A logger's file path is built from a base location and an optional
//! `{project, component}` or `{component}` name:
//!
//! ```text
//! <base>/<project>/<component>-Log.md
//! <base>/<component>-Log.md
//! ```
//!
//! When no usable base is available the path falls back to
//! `<default dir>/CerddoPod-Log.md`, where the default dir is the user's
//! desktop (or home) directory.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;

/// File name used when no location is configured or it cannot be created.
pub const DEFAULT_FILE_NAME: &str = "CerddoPod-Log.md";

/// Directory appended to the OS log directory by `use_default_loc`.
pub const DEFAULT_PROJECT_DIR: &str = "CerddoPod";

/// Suffix appended to a component name to form its file name.
pub const LOG_FILE_SUFFIX: &str = "-Log.md";

static SYSTEM_DEFAULT_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::desktop_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
});

static SYSTEM_LOG_DIR: Lazy<PathBuf> = Lazy::new(os_log_dir);

#[cfg(target_os = "linux")]
fn os_log_dir() -> PathBuf {
    PathBuf::from("/var/log")
}

#[cfg(target_os = "macos")]
fn os_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Library").join("Logs"))
        .unwrap_or_else(|| PathBuf::from("/var/log"))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn os_log_dir() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(std::env::temp_dir)
}

/// The name a logger is registered under, which also decides its file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogName {
    /// A standalone component: `<base>/<component>-Log.md`.
    Component(String),
    /// A component of a project: `<base>/<project>/<component>-Log.md`.
    Qualified { project: String, component: String },
}

impl LogName {
    pub fn component(component: impl Into<String>) -> Self {
        LogName::Component(component.into())
    }

    pub fn qualified(project: impl Into<String>, component: impl Into<String>) -> Self {
        LogName::Qualified {
            project: project.into(),
            component: component.into(),
        }
    }

    /// Registry key: `project/component` or `component`.
    pub fn registry_key(&self) -> String {
        match self {
            LogName::Component(component) => component.clone(),
            LogName::Qualified { project, component } => format!("{project}/{component}"),
        }
    }

    /// Path of the log file relative to the base location.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            LogName::Component(component) => PathBuf::from(format!("{component}{LOG_FILE_SUFFIX}")),
            LogName::Qualified { project, component } => {
                Path::new(project).join(format!("{component}{LOG_FILE_SUFFIX}"))
            }
        }
    }
}

/// Computes concrete log file paths.
///
/// Holds the two OS lookups it depends on so that resolution is a pure
/// function of its inputs (plus the parent directory creation attempt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    default_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathResolver {
    /// Create a resolver with explicit fallback directories.
    ///
    /// `default_dir` receives `CerddoPod-Log.md` when nothing else works,
    /// `log_dir` is the base used by `use_default_loc`.
    pub fn new(default_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Resolver backed by the platform's desktop and log directories.
    pub fn system() -> Self {
        Self::new(SYSTEM_DEFAULT_DIR.clone(), SYSTEM_LOG_DIR.clone())
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The fixed fallback file: `<default dir>/CerddoPod-Log.md`.
    pub fn default_file(&self) -> PathBuf {
        self.default_dir.join(DEFAULT_FILE_NAME)
    }

    /// Resolve a candidate location.
    ///
    /// An unset or empty candidate resolves to [`default_file`](Self::default_file).
    /// If the candidate's parent directory is missing it is created; when that
    /// fails the failure is reported on the diagnostic channel and the default
    /// file is returned instead.
    pub fn resolve_location(&self, candidate: Option<&Path>) -> PathBuf {
        let Some(candidate) = candidate.filter(|p| !p.as_os_str().is_empty()) else {
            return self.default_file();
        };

        if let Some(parent) = candidate.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
            && let Err(err) = std::fs::create_dir_all(parent)
        {
            tracing::debug!(
                location = %candidate.display(),
                error = %err,
                "failed to create log directory, falling back to default location"
            );
            return self.default_file();
        }

        candidate.to_path_buf()
    }

    /// Base location used by `use_default_loc`: `<log dir>/CerddoPod`, resolved.
    pub fn default_location(&self) -> PathBuf {
        self.resolve_location(Some(self.log_dir.join(DEFAULT_PROJECT_DIR).as_path()))
    }

    /// Append a log name to a base location.
    ///
    /// Without a base the default location is resolved first.
    pub fn compose(&self, base: Option<&Path>, name: &LogName) -> PathBuf {
        let base = match base.filter(|p| !p.as_os_str().is_empty()) {
            Some(base) => base.to_path_buf(),
            None => self.default_location(),
        };
        self.resolve_location(Some(base.join(name.relative_path()).as_path()))
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::system()
    }
}
