//! Category and exclusion configuration.
//!
//! Configuration is stored in TOML and compiled into the strongly-typed rule
//! structures the engine consumes: a [`RuleSet`](crate::category::RuleSet)
//! for categorization and an [`ExclusionSpec`] for entries the organizer must
//! never touch. Validation (duplicate extensions, bad glob or regex patterns)
//! happens at compile time, before any file is moved.
//!
//! # Configuration file format
//!
//! ```toml
//! output_root = "Organized_Files"
//!
//! [categories]
//! Documents = ["pdf", "docx", "txt"]
//! Images = ["jpg", "png"]
//!
//! [exclusions]
//! names = [".DS_Store", "desktop.ini"]
//! patterns = ["*.tmp"]
//! regex = []
//! skip_hidden = true
//! ```

use crate::category::{RuleError, RuleSet};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// The category mapping violates a rule-set invariant.
    InvalidRules(RuleError),
    /// Invalid glob pattern in the exclusion list.
    InvalidGlobPattern(String),
    /// Invalid regex pattern in the exclusion list.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            Self::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidRules(err) => write!(f, "Invalid category mapping: {}", err),
            Self::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            Self::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            Self::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<RuleError> for ConfigError {
    fn from(err: RuleError) -> Self {
        Self::InvalidRules(err)
    }
}

/// On-disk organizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Name of the directory organized files are placed under.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Category name to extension list. An empty mapping sends everything to
    /// the `Other` category.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    /// Entries the organizer must never touch.
    #[serde(default)]
    pub exclusions: ExclusionRules,
}

fn default_output_root() -> String {
    "Organized_Files".to_string()
}

/// Raw exclusion rules as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRules {
    /// Exact file names to exclude.
    #[serde(default)]
    pub names: Vec<String>,

    /// Glob patterns to exclude (e.g. `*.tmp`).
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns to exclude (for advanced users).
    #[serde(default)]
    pub regex: Vec<String>,

    /// Whether hidden files (leading dot) are skipped. Defaults to true.
    #[serde(default = "default_skip_hidden")]
    pub skip_hidden: bool,
}

fn default_skip_hidden() -> bool {
    true
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            patterns: Vec::new(),
            regex: Vec::new(),
            skip_hidden: true,
        }
    }
}

impl Default for OrganizerConfig {
    /// The built-in category table, used when no configuration file exists.
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        let table: &[(&str, &[&str])] = &[
            ("Documents", &["pdf", "docx", "txt", "doc", "rtf", "odt"]),
            ("Images", &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"]),
            ("Videos", &["mp4", "mov", "avi", "mkv", "wmv", "flv"]),
            ("Audio", &["mp3", "wav", "ogg", "flac", "aac"]),
            ("Archives", &["zip", "rar", "7z", "tar", "gz"]),
            ("Code", &["py", "js", "html", "css", "java", "cpp", "c", "go", "php"]),
        ];
        for (category, extensions) in table {
            categories.insert(
                category.to_string(),
                extensions.iter().map(|e| e.to_string()).collect(),
            );
        }
        Self {
            output_root: default_output_root(),
            categories,
            exclusions: ExclusionRules {
                names: vec![".DS_Store".to_string(), "desktop.ini".to_string()],
                ..ExclusionRules::default()
            },
        }
    }
}

impl OrganizerConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided (missing file is an error)
    /// 2. `.deskbroomrc.toml` in the current directory
    /// 3. `~/.config/deskbroom/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".deskbroomrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("deskbroom")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile into the validated structures the engine consumes.
    ///
    /// # Errors
    ///
    /// Returns an error if the category mapping or any exclusion pattern is
    /// invalid.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let rules = RuleSet::build(&self.categories)?;
        let exclusions = ExclusionSpec::compile(self.exclusions)?;
        Ok(CompiledConfig {
            rules,
            exclusions,
            output_root: self.output_root,
        })
    }
}

/// The validated configuration triple the engine is constructed from.
pub struct CompiledConfig {
    pub rules: RuleSet,
    pub exclusions: ExclusionSpec,
    pub output_root: String,
}

/// Pre-compiled exclusion matchers.
///
/// Exclusions are evaluated against the bare file name, before
/// categorization; an excluded entry never appears in a plan.
#[derive(Debug, Clone)]
pub struct ExclusionSpec {
    skip_hidden: bool,
    names: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl ExclusionSpec {
    /// Compile raw rules, validating every pattern.
    pub fn compile(rules: ExclusionRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            names: rules.names.into_iter().collect(),
            patterns,
            regexes,
        })
    }

    /// An exclusion spec that excludes nothing, hidden files included.
    pub fn none() -> Self {
        Self {
            skip_hidden: false,
            names: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }

    /// Returns true if an entry with this file name must not be touched.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        if self.skip_hidden && file_name.starts_with('.') {
            return true;
        }
        if self.names.contains(file_name) {
            return true;
        }
        if self.patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }
        self.regexes.iter().any(|r| r.is_match(file_name))
    }
}

impl Default for ExclusionSpec {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            names: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }
}
