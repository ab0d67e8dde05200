/// Extension-based file categorization.
///
/// A `RuleSet` maps file extensions to category labels. Lookups are
/// case-insensitive and total: any file name resolves to a category, with
/// unmatched (or missing) extensions falling back to [`OTHER_CATEGORY`].
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Reserved category for files no rule matches.
pub const OTHER_CATEGORY: &str = "Other";

/// Errors raised while building a [`RuleSet`] from a category mapping.
#[derive(Debug, Clone)]
pub enum RuleError {
    /// The same extension is claimed by two categories.
    DuplicateExtension {
        extension: String,
        first_category: String,
        second_category: String,
    },
    /// A category lists an empty extension (e.g. "" or ".").
    EmptyExtension { category: String },
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateExtension {
                extension,
                first_category,
                second_category,
            } => write!(
                f,
                "Extension '.{}' is mapped to both '{}' and '{}'",
                extension, first_category, second_category
            ),
            Self::EmptyExtension { category } => {
                write!(f, "Category '{}' lists an empty extension", category)
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// Maps file extensions to category labels.
///
/// Extensions are stored lower-cased and without the leading dot, so
/// `"PDF"`, `".pdf"` and `"pdf"` in the source mapping are equivalent.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    by_extension: HashMap<String, String>,
}

impl RuleSet {
    /// Builds a rule set from a category-to-extensions mapping.
    ///
    /// # Errors
    ///
    /// Fails if an extension appears under more than one category, or if an
    /// extension is empty after stripping the leading dot.
    pub fn build(categories: &BTreeMap<String, Vec<String>>) -> Result<Self, RuleError> {
        let mut by_extension = HashMap::new();
        for (category, extensions) in categories {
            for raw in extensions {
                let ext = raw.trim().trim_start_matches('.').to_lowercase();
                if ext.is_empty() {
                    return Err(RuleError::EmptyExtension {
                        category: category.clone(),
                    });
                }
                if let Some(existing) = by_extension.insert(ext.clone(), category.clone())
                    && existing != *category
                {
                    return Err(RuleError::DuplicateExtension {
                        extension: ext,
                        first_category: existing,
                        second_category: category.clone(),
                    });
                }
            }
        }
        Ok(Self { by_extension })
    }

    /// Returns an empty rule set; every file resolves to [`OTHER_CATEGORY`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves a file name to its category label.
    ///
    /// Files without an extension (including dotfiles like `.gitignore`)
    /// resolve to [`OTHER_CATEGORY`].
    pub fn resolve(&self, file_name: &str) -> &str {
        let Some(ext) = Path::new(file_name).extension() else {
            return OTHER_CATEGORY;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        self.by_extension
            .get(&ext)
            .map(String::as_str)
            .unwrap_or(OTHER_CATEGORY)
    }
}
