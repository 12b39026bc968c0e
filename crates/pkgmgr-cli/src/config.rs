//! Configuration files and their merge with the command line.
//!
//! Files are `key=value` lines. A line starting with `#` is a comment, and
//! the first `=` not preceded by a backslash separates key from value.
//! Malformed lines and unknown keys produce warnings, not errors.
//!
//! Precedence, highest first: command-line flag, user config, global config,
//! built-in default. The global config may point at the user config with
//! `userConfigPath` when `-u` is not given.

use std::path::{Path, PathBuf};

use pkgmgr_core::Layout;
use pkgmgr_core::paths::{
    DEFAULT_INDEX_DIR, DEFAULT_LIBRARY_DIR, DEFAULT_SYSTEM_ROOT, default_script_root,
};
use thiserror::Error;

/// Default global configuration file.
pub const DEFAULT_GLOBAL_CONFIG: &str = "/etc/pkg-mgr.conf";

/// User configuration file, relative to the platform config dir.
pub const USER_CONFIG_FILE: &str = "pkg-mgr.conf";

/// Verbosity used when neither a flag nor a config file sets one.
pub const DEFAULT_VERBOSITY: u8 = 2;

const COMMENT_CHAR: char = '#';
const DELIM_CHAR: char = '=';
const ESCAPE_CHAR: char = '\\';

/// Errors that make the configuration unusable.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file named explicitly does not exist.
    #[error("configuration file {} does not exist", path.display())]
    NotFound {
        /// Missing file.
        path: PathBuf,
    },

    /// A config file exists but cannot be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        /// Unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A recognized key has a value of the wrong type.
    #[error("{}:{line}: invalid value '{value}' for {key}", path.display())]
    InvalidValue {
        /// File holding the bad line.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Key.
        key: String,
        /// Offending value.
        value: String,
    },
}

/// Settings that can come from any source. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub verbosity: Option<u8>,
    pub system_root: Option<PathBuf>,
    pub package_library: Option<PathBuf>,
    pub installed_pkg_path: Option<PathBuf>,
    pub user_config_path: Option<PathBuf>,
    pub script_workspace_root: Option<PathBuf>,
}

impl Settings {
    /// Fill every unset field from `lower`.
    pub fn or(self, lower: Self) -> Self {
        Self {
            verbosity: self.verbosity.or(lower.verbosity),
            system_root: self.system_root.or(lower.system_root),
            package_library: self.package_library.or(lower.package_library),
            installed_pkg_path: self.installed_pkg_path.or(lower.installed_pkg_path),
            user_config_path: self.user_config_path.or(lower.user_config_path),
            script_workspace_root: self.script_workspace_root.or(lower.script_workspace_root),
        }
    }

    /// Verbosity after defaults.
    pub fn verbosity(&self) -> u8 {
        self.verbosity.unwrap_or(DEFAULT_VERBOSITY)
    }

    /// Directories after defaults.
    pub fn layout(&self) -> Layout {
        Layout::new(
            self.system_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSTEM_ROOT)),
            self.package_library
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR)),
            self.installed_pkg_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
        )
        .with_script_root(
            self.script_workspace_root
                .clone()
                .unwrap_or_else(default_script_root),
        )
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Values it sets.
    pub settings: Settings,
    /// Problems worth telling the user about; reported once logging is up.
    pub warnings: Vec<String>,
}

impl ConfigFile {
    /// Load a config file.
    ///
    /// A missing file is an error when `explicit`, and an empty config
    /// otherwise.
    ///
    /// # Errors
    ///
    /// See [`ConfigError`].
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    })
                } else {
                    Ok(Self::default())
                }
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse config text; `path` is only used in messages.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a verbosity that is not a number.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut seen: Vec<String> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with(COMMENT_CHAR) {
                continue;
            }

            let Some((key, value)) = split_line(line) else {
                config.warnings.push(format!(
                    "{}:{line_no}: ignoring line without a key and '{DELIM_CHAR}'",
                    path.display()
                ));
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if value.is_empty() {
                config.warnings.push(format!(
                    "{}:{line_no}: option {key} has no value, ignoring",
                    path.display()
                ));
                continue;
            }
            if seen.iter().any(|k| k == key) {
                config.warnings.push(format!(
                    "{}:{line_no}: {key} already set earlier in this file, ignoring",
                    path.display()
                ));
                continue;
            }
            seen.push(key.to_string());

            let settings = &mut config.settings;
            match key {
                "verbosity" => {
                    let level = value.parse().map_err(|_| ConfigError::InvalidValue {
                        path: path.to_path_buf(),
                        line: line_no,
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
                    settings.verbosity = Some(level);
                }
                "systemRoot" => settings.system_root = Some(PathBuf::from(value)),
                "packageLibraryPath" => settings.package_library = Some(PathBuf::from(value)),
                "installedPkgPath" => settings.installed_pkg_path = Some(PathBuf::from(value)),
                "userConfigPath" => settings.user_config_path = Some(PathBuf::from(value)),
                "scriptWorkspaceRoot" => {
                    settings.script_workspace_root = Some(PathBuf::from(value));
                }
                // Only meaningful on the command line.
                "globalConfigPath" => {}
                other => config.warnings.push(format!(
                    "{}:{line_no}: unknown option {other}, ignoring",
                    path.display()
                )),
            }
        }

        Ok(config)
    }
}

/// Split at the first unescaped delimiter. `\=` in the key becomes `=`.
fn split_line(line: &str) -> Option<(String, &str)> {
    let mut key = String::new();
    let mut chars = line.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            ESCAPE_CHAR => match chars.next() {
                Some((_, escaped)) => key.push(escaped),
                None => key.push(ESCAPE_CHAR),
            },
            DELIM_CHAR => {
                return (!key.trim().is_empty()).then(|| (key, &line[idx + 1..]));
            }
            c => key.push(c),
        }
    }
    None
}

/// Resolve the final settings from the command line and config files.
///
/// `flags` holds what was given on the command line. Config file paths are
/// taken from `global_config`/`user_config` when given, else the defaults.
///
/// # Errors
///
/// See [`ConfigError`].
pub fn resolve(
    flags: Settings,
    global_config: Option<&Path>,
    user_config: Option<&Path>,
) -> Result<(Settings, Vec<String>), ConfigError> {
    let global = ConfigFile::load(
        global_config.unwrap_or(Path::new(DEFAULT_GLOBAL_CONFIG)),
        global_config.is_some(),
    )?;

    let (user_path, user_explicit) = match user_config {
        Some(path) => (Some(path.to_path_buf()), true),
        None => match &global.settings.user_config_path {
            Some(path) => (Some(path.clone()), true),
            None => (default_user_config(), false),
        },
    };
    let user = match &user_path {
        Some(path) => ConfigFile::load(path, user_explicit)?,
        None => ConfigFile::default(),
    };

    let mut warnings = global.warnings;
    warnings.extend(user.warnings);

    let settings = flags.or(user.settings).or(global.settings);
    Ok((settings, warnings))
}

/// `~/.config/pkg-mgr.conf` (or the platform equivalent).
pub fn default_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_CONFIG_FILE))
}
