//! Project configuration loaded from `.tagboard/config.toml`.

use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tagboard_core::Syntax;
use tagboard_core::syntax::{COLON, DEFAULT_INCLUDE_LISTS, DOUBLE_COLON, is_list_name};

use crate::filter_util::parse_filter;

/// Directory holding project configuration, relative to the board root.
pub const CONFIG_DIR: &str = ".tagboard";
/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Top-level project configuration loaded from `.tagboard/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "ListConfig::builtin")]
    lists: Vec<ListConfig>,
    /// Card creation and ordering options.
    #[serde(default)]
    pub cards: CardsConfig,
    /// Source-comment options.
    #[serde(default)]
    pub code: CodeConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            lists: ListConfig::builtin(),
            cards: CardsConfig::default(),
            code: CodeConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a board root directory.
    ///
    /// A missing file yields the builtin configuration.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or validated.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("failed to load {}", config_path.display()))
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    /// Returns an error when the text is not valid TOML or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured lists (mainly used in tests).
    #[must_use]
    pub fn with_lists(mut self, lists: Vec<ListConfig>) -> Self {
        self.lists = lists;
        self
    }

    /// Replace the card options (mainly used in tests).
    #[must_use]
    pub fn with_cards(mut self, cards: CardsConfig) -> Self {
        self.cards = cards;
        self
    }

    /// Configured lists in board order.
    #[must_use]
    pub fn lists(&self) -> &[ListConfig] {
        &self.lists
    }

    /// Tag syntax derived from the card and code options.
    #[must_use]
    pub fn syntax(&self) -> Syntax {
        Syntax::new(
            &self.cards.meta_sep,
            &self.cards.tag_prefix,
            &self.cards.token_prefix,
        )
        .with_include_lists(self.code.include_lists.iter().cloned())
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns an error describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        self.ensure_valid_lists()?;
        self.ensure_known_overrides()?;
        self.cards.ensure_valid_tuning()
    }

    fn ensure_valid_lists(&self) -> Result<()> {
        let syntax = self.syntax();
        let mut seen = HashSet::new();
        for list in &self.lists {
            if list.name.trim().is_empty() {
                bail!("list name must not be empty");
            }
            if !is_list_name(&list.name) {
                bail!("list name '{}' is not a valid list token", list.name);
            }
            if !seen.insert(list.name.as_str()) {
                bail!("duplicate list detected: {}", list.name);
            }
            if let Some(filter) = &list.filter {
                parse_filter(filter, &syntax)
                    .with_context(|| format!("invalid filter for list '{}'", list.name))?;
            }
        }
        Ok(())
    }

    fn ensure_known_overrides(&self) -> Result<()> {
        let overrides = [
            ("default_list", self.cards.default_list.as_deref()),
            ("done_list", self.cards.done_list.as_deref()),
            ("doing_list", self.cards.doing_list.as_deref()),
        ];
        for (field, value) in overrides {
            let Some(name) = value else {
                continue;
            };
            if !self.lists.iter().any(|list| list.name == name) {
                bail!("cards.{field} '{name}' is not a configured list");
            }
        }
        Ok(())
    }
}

/// A configured board list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ListConfig {
    /// List name, also the `#NAME` token for concrete lists.
    pub name: String,
    /// Filter query; present for virtual lists.
    #[serde(default)]
    pub filter: Option<String>,
    /// Hidden from board aggregates.
    #[serde(default)]
    pub ignore: bool,
}

impl ListConfig {
    /// Concrete list named `name`.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
            ignore: false,
        }
    }

    /// Virtual list defined by a filter query.
    pub fn virtual_list(name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: Some(filter.into()),
            ignore: false,
        }
    }

    /// Mark the list as ignored.
    #[must_use]
    pub const fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    fn builtin() -> Vec<Self> {
        vec![Self::concrete("TODO"), Self::concrete("DOING"), Self::concrete("DONE")]
    }
}

/// Card options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CardsConfig {
    /// Persist order keys as `order:` meta; otherwise order follows line
    /// position and `order:` text in files is ignored.
    pub order_meta: bool,
    /// List for new cards; defaults to the first list.
    pub default_list: Option<String>,
    /// Completion list; defaults to the last concrete list.
    pub done_list: Option<String>,
    /// In-progress list; defaults to a name match, then the second concrete list.
    pub doing_list: Option<String>,
    /// File receiving new cards when no path is given.
    pub default_file: String,
    /// Insert new cards before the first task of the file.
    pub add_new_cards_to_top: bool,
    /// Prefix new markdown cards with `- [ ] `.
    pub add_check_box_tasks: bool,
    /// Stamp `completed:` on cards entering the done list.
    pub add_completed_meta: bool,
    /// Spacing between freshly assigned order keys.
    pub order_gap: i64,
    /// Siblings added per side on each renumbering round.
    pub renumber_step: usize,
    /// Meta separator, `:` or `::`.
    pub meta_sep: String,
    /// Prefix of tag words.
    pub tag_prefix: String,
    /// Prefix of list tokens.
    pub token_prefix: String,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            order_meta: true,
            default_list: None,
            done_list: None,
            doing_list: None,
            default_file: "TODO.md".into(),
            add_new_cards_to_top: false,
            add_check_box_tasks: false,
            add_completed_meta: false,
            order_gap: 10,
            renumber_step: 1,
            meta_sep: COLON.into(),
            tag_prefix: "+".into(),
            token_prefix: "#".into(),
        }
    }
}

impl CardsConfig {
    fn ensure_valid_tuning(&self) -> Result<()> {
        if self.order_gap <= 0 {
            bail!("cards.order_gap must be positive (got {})", self.order_gap);
        }
        if self.renumber_step == 0 {
            bail!("cards.renumber_step must be at least 1");
        }
        if self.token_prefix.is_empty() {
            bail!("cards.token_prefix must not be empty");
        }
        if self.default_file.trim().is_empty() {
            bail!("cards.default_file must not be empty");
        }
        if self.meta_sep != COLON && self.meta_sep != DOUBLE_COLON {
            tracing::warn!(meta_sep = %self.meta_sep, "unsupported meta separator, using ':'");
        }
        Ok(())
    }
}

/// Source-comment options.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodeConfig {
    /// Lists recognised as bare `NAME:` tokens in comments.
    pub include_lists: Vec<String>,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            include_lists: DEFAULT_INCLUDE_LISTS.iter().map(|&name| name.to_owned()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) -> Result<()> {
        let cfg_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&cfg_dir)?;
        let mut file = fs::File::create(cfg_dir.join(CONFIG_FILE))?;
        writeln!(file, "{contents}")?;
        Ok(())
    }

    #[test]
    fn missing_config_returns_builtin_lists() -> Result<()> {
        let dir = tempdir()?;
        let cfg = ProjectConfig::from_workdir(dir.path())?;
        let names: Vec<_> = cfg.lists().iter().map(|list| list.name.as_str()).collect();
        assert_eq!(names, vec!["TODO", "DOING", "DONE"]);
        assert!(cfg.cards.order_meta);
        assert_eq!(cfg.cards.order_gap, 10);
        assert_eq!(cfg.cards.default_file, "TODO.md");
        assert!(cfg.syntax().includes_list("FIXME"));
        Ok(())
    }

    #[test]
    fn load_config_with_lists_and_cards() -> Result<()> {
        let dir = tempdir()?;
        write_config(
            dir.path(),
            "[[lists]]\nname = \"BACKLOG\"\nignore = true\n\n[[lists]]\nname = \"NOW\"\n\n[[lists]]\nname = \"SHIPPED\"\n\n[[lists]]\nname = \"URGENT\"\nfilter = \"list:NOW +urgent\"\n\n[cards]\norder_meta = false\ndone_list = \"SHIPPED\"\nmeta_sep = \"::\"\n\n[code]\ninclude_lists = [\"NOW\"]",
        )?;

        let cfg = ProjectConfig::from_workdir(dir.path())?;
        assert_eq!(cfg.lists().len(), 4);
        assert!(cfg.lists()[0].ignore);
        assert_eq!(cfg.lists()[3].filter.as_deref(), Some("list:NOW +urgent"));
        assert!(!cfg.cards.order_meta);
        assert_eq!(cfg.cards.done_list.as_deref(), Some("SHIPPED"));
        let syntax = cfg.syntax();
        assert_eq!(syntax.meta_sep(), DOUBLE_COLON);
        assert!(syntax.includes_list("NOW"));
        assert!(!syntax.includes_list("TODO"));
        Ok(())
    }

    #[test]
    fn duplicate_lists_are_rejected() {
        let Err(err) = ProjectConfig::from_toml("[[lists]]\nname = \"TODO\"\n[[lists]]\nname = \"TODO\"") else {
            panic!("duplicate list should error");
        };
        assert!(format!("{err:#}").contains("duplicate list"));
    }

    #[test]
    fn empty_list_names_are_rejected() {
        let Err(err) = ProjectConfig::from_toml("[[lists]]\nname = \" \"") else {
            panic!("empty list name should error");
        };
        assert!(format!("{err:#}").contains("must not be empty"));
    }

    #[test]
    fn overrides_must_name_configured_lists() {
        let Err(err) = ProjectConfig::from_toml("[cards]\ndoing_list = \"WIP\"") else {
            panic!("unknown override should error");
        };
        assert!(format!("{err:#}").contains("cards.doing_list 'WIP'"));
    }

    #[test]
    fn invalid_filters_are_rejected() {
        let Err(err) = ProjectConfig::from_toml("[[lists]]\nname = \"X\"\nfilter = \"list:\"") else {
            panic!("invalid filter should error");
        };
        assert!(format!("{err:#}").contains("invalid filter for list 'X'"));
    }

    #[test]
    fn order_gap_must_be_positive() {
        let Err(err) = ProjectConfig::from_toml("[cards]\norder_gap = 0") else {
            panic!("zero gap should error");
        };
        assert!(format!("{err:#}").contains("order_gap"));
    }

    #[test]
    fn unsupported_meta_separator_falls_back() -> Result<()> {
        let cfg = ProjectConfig::from_toml("[cards]\nmeta_sep = \"=\"")?;
        assert_eq!(cfg.syntax().meta_sep(), COLON);
        Ok(())
    }
}
