//! Rule-based categorization of activity samples.
//!
//! A sample is classified by scanning two ordered rule tables: application
//! name patterns first, then window title keywords. The first matching rule
//! wins; matching is case-insensitive substring containment. Anything that
//! matches no rule falls back to `"Other - {app_name}"`.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single pattern-to-category mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Substring to look for (matched case-insensitively).
    pub pattern: String,
    /// Category assigned when the pattern matches.
    pub category: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
        }
    }
}

/// Ordered rule tables used for classification.
///
/// Rule order is significant: the first matching rule wins, not the best or
/// longest match. The table is loaded once at startup and read-only after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryRuleTable {
    /// Rules matched against the application name.
    #[serde(default)]
    pub app_rules: Vec<Rule>,
    /// Rules matched against the window title (or URL, for browsers).
    #[serde(default)]
    pub title_rules: Vec<Rule>,
}

impl CategoryRuleTable {
    /// An empty table: every sample falls back to `"Other - {app}"`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a rule table from a JSON file.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }

    /// Load a rule table, falling back to empty tables when the file is
    /// missing or unparseable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Could not load rules from {:?}: {e}; using empty tables", path);
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.app_rules.is_empty() && self.title_rules.is_empty()
    }
}

/// Determine the category for an application and window title.
///
/// Pure function of its inputs: app rules are scanned before title rules,
/// and the result is always `"{category} - {app_name}"`.
pub fn categorize(app_name: &str, window_title: &str, rules: &CategoryRuleTable) -> String {
    let app_folded = app_name.to_lowercase();
    for rule in &rules.app_rules {
        if app_folded.contains(&rule.pattern.to_lowercase()) {
            return format!("{} - {app_name}", rule.category);
        }
    }

    let title_folded = window_title.to_lowercase();
    for rule in &rules.title_rules {
        if title_folded.contains(&rule.pattern.to_lowercase()) {
            return format!("{} - {app_name}", rule.category);
        }
    }

    format!("Other - {app_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rules() -> CategoryRuleTable {
        CategoryRuleTable {
            app_rules: vec![
                Rule::new("code", "Programming"),
                Rule::new("slack", "Communication"),
            ],
            title_rules: vec![
                Rule::new("github", "Programming"),
                Rule::new("youtube", "Entertainment"),
            ],
        }
    }

    #[test]
    fn test_app_rule_match() {
        let category = categorize("Visual Studio Code", "main.rs", &sample_rules());
        assert_eq!(category, "Programming - Visual Studio Code");
    }

    #[test]
    fn test_title_rule_match() {
        let category = categorize("Safari", "https://github.com/pulls", &sample_rules());
        assert_eq!(category, "Programming - Safari");
    }

    #[test]
    fn test_fallback_category() {
        let category = categorize("Zoom", "Meeting", &CategoryRuleTable::empty());
        assert_eq!(category, "Other - Zoom");
    }

    #[test]
    fn test_case_insensitive() {
        let category = categorize("SLACK", "general", &sample_rules());
        assert_eq!(category, "Communication - SLACK");
    }

    #[test]
    fn test_first_match_wins() {
        // Two overlapping rules: order determines the result.
        let rules = CategoryRuleTable {
            app_rules: vec![],
            title_rules: vec![
                Rule::new("news", "Reading"),
                Rule::new("hacker news", "Procrastination"),
            ],
        };
        let category = categorize("Firefox", "Hacker News", &rules);
        assert_eq!(category, "Reading - Firefox");

        let reversed = CategoryRuleTable {
            app_rules: vec![],
            title_rules: vec![
                Rule::new("hacker news", "Procrastination"),
                Rule::new("news", "Reading"),
            ],
        };
        let category = categorize("Firefox", "Hacker News", &reversed);
        assert_eq!(category, "Procrastination - Firefox");
    }

    #[test]
    fn test_app_rules_scanned_before_title_rules() {
        let category = categorize("Slack", "github thread", &sample_rules());
        assert_eq!(category, "Communication - Slack");
    }

    #[test]
    fn test_deterministic() {
        let rules = sample_rules();
        let a = categorize("Code", "lib.rs", &rules);
        let b = categorize("Code", "lib.rs", &rules);
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_missing_file_gives_empty_tables() {
        let path = std::env::temp_dir().join("activity-tracker-no-such-rules.json");
        let table = CategoryRuleTable::load_or_default(&path);
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_bad_json_gives_empty_tables() {
        let path = std::env::temp_dir().join(format!(
            "activity-tracker-bad-rules-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "not json").unwrap();
        let table = CategoryRuleTable::load_or_default(&path);
        assert!(table.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
