//! Static routing tables: departments, priority tiers and their keywords.
//!
//! The catalog is data, not code. A default copy is compiled in from `catalog.toml`;
//! deployments can point `catalog_path` at their own file with the same shape.

use std::{cmp::Reverse, collections::HashSet, path::Path};

use serde::Deserialize;
use tracing::{info, instrument};

use super::types::{Priority, Res};

/// The compiled-in catalog.
pub const DEFAULT_CATALOG: &str = include_str!("catalog.toml");

fn default_fallback_category() -> String {
    "General Inquiry".to_string()
}

/// Keyword rule for a single department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentRule {
    pub name: String,
    pub description: String,
    /// Category reported when this department wins the local vote.
    pub category: String,
    /// Lowercased, trimmed and non-empty.
    pub keywords: Vec<String>,
}

/// Keyword rule for a single priority tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRule {
    pub level: Priority,
    /// Lowercased, trimmed and non-empty.
    pub keywords: Vec<String>,
}

/// The full decision table used for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    default_department: String,
    fallback_category: String,
    departments: Vec<DepartmentRule>,
    /// Sorted most urgent first.
    priorities: Vec<PriorityRule>,
}

// On-disk shape.

#[derive(Debug, Deserialize)]
struct RawCatalog {
    default_department: String,
    #[serde(default = "default_fallback_category")]
    fallback_category: String,
    departments: Vec<RawDepartment>,
    #[serde(default)]
    priorities: Vec<RawPriority>,
}

#[derive(Debug, Deserialize)]
struct RawDepartment {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPriority {
    level: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Res<Self> {
        Self::from_toml(DEFAULT_CATALOG)
    }

    /// Load the catalog from `path`, or the built-in one when no path is given.
    #[instrument(skip_all)]
    pub fn load(path: Option<&Path>) -> Res<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };

        let raw: RawCatalog = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()?;

        let catalog = Self::from_raw(raw)?;
        info!("Loaded catalog from `{}` with {} departments.", path.display(), catalog.departments.len());

        Ok(catalog)
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml(text: &str) -> Res<Self> {
        let raw: RawCatalog = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalog) -> Res<Self> {
        if raw.departments.is_empty() {
            return Err(anyhow::anyhow!("Catalog must declare at least one department."));
        }

        let mut seen = HashSet::new();
        let mut departments = Vec::with_capacity(raw.departments.len());

        for department in raw.departments {
            let name = department.name.trim().to_string();

            if name.is_empty() {
                return Err(anyhow::anyhow!("Catalog contains a department with an empty name."));
            }

            if !seen.insert(name.to_lowercase()) {
                return Err(anyhow::anyhow!("Catalog declares department `{name}` more than once."));
            }

            let category = department.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).unwrap_or_else(|| name.clone());

            departments.push(DepartmentRule {
                name,
                description: department.description.trim().to_string(),
                category,
                keywords: normalize_keywords(department.keywords),
            });
        }

        let mut levels = HashSet::new();
        let mut priorities = Vec::with_capacity(raw.priorities.len());

        for priority in raw.priorities {
            let level: Priority = priority.level.parse()?;

            if !levels.insert(level) {
                return Err(anyhow::anyhow!("Catalog declares priority `{level}` more than once."));
            }

            priorities.push(PriorityRule {
                level,
                keywords: normalize_keywords(priority.keywords),
            });
        }

        priorities.sort_by_key(|rule| Reverse(rule.level));

        let mut catalog = Self {
            default_department: String::new(),
            fallback_category: raw.fallback_category.trim().to_string(),
            departments,
            priorities,
        };

        catalog.set_default_department(&raw.default_department)?;

        Ok(catalog)
    }

    /// Replace the department used when no keyword matches.
    ///
    /// The name must already be in the catalog; it is stored in its canonical spelling.
    pub fn set_default_department(&mut self, name: &str) -> Res<()> {
        let canonical = self
            .department(name)
            .map(|rule| rule.name.clone())
            .ok_or_else(|| anyhow::anyhow!("Default department `{}` is not in the catalog.", name.trim()))?;

        self.default_department = canonical;

        Ok(())
    }

    pub fn default_department(&self) -> &str {
        &self.default_department
    }

    pub fn fallback_category(&self) -> &str {
        &self.fallback_category
    }

    /// Department rules in declaration order.
    pub fn departments(&self) -> &[DepartmentRule] {
        &self.departments
    }

    /// Priority rules, most urgent first.
    pub fn priorities(&self) -> &[PriorityRule] {
        &self.priorities
    }

    /// Look up a department by name, ignoring case and surrounding whitespace.
    pub fn department(&self, name: &str) -> Option<&DepartmentRule> {
        let name = name.trim();
        self.departments.iter().find(|rule| rule.name.eq_ignore_ascii_case(name))
    }

    pub fn department_names(&self) -> Vec<String> {
        self.departments.iter().map(|rule| rule.name.clone()).collect()
    }

    /// One `- name: description` line per department, for model prompts.
    pub fn prompt_listing(&self) -> String {
        self.departments
            .iter()
            .map(|rule| format!("- {}: {}", rule.name, rule.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();

    keywords
        .into_iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty() && seen.insert(keyword.clone()))
        .collect()
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();

        assert_eq!(catalog.default_department(), "Student Affairs");
        assert_eq!(catalog.fallback_category(), "General Inquiry");
        assert!(catalog.department("Residential Village (RV)").is_some());
        assert!(catalog.department(catalog.default_department()).is_some());
    }

    #[test]
    fn priorities_are_sorted_most_urgent_first() {
        let text = r#"
            default_department = "A"

            [[departments]]
            name = "A"
            keywords = ["a"]

            [[priorities]]
            level = "low"
            keywords = ["later"]

            [[priorities]]
            level = "urgent"
            keywords = ["now"]

            [[priorities]]
            level = "high"
            keywords = ["soon"]
        "#;

        let catalog = Catalog::from_toml(text).unwrap();
        let levels = catalog.priorities().iter().map(|rule| rule.level).collect::<Vec<_>>();

        assert_eq!(levels, vec![Priority::Urgent, Priority::High, Priority::Low]);
    }

    #[test]
    fn keywords_are_normalized() {
        let text = r#"
            default_department = "a"

            [[departments]]
            name = "A"
            keywords = ["  WiFi ", "wifi", "", "V4"]
        "#;

        let catalog = Catalog::from_toml(text).unwrap();
        let rule = &catalog.departments()[0];

        assert_eq!(rule.keywords, vec!["wifi".to_string(), "v4".to_string()]);
        assert_eq!(rule.category, "A");
        assert_eq!(catalog.default_department(), "A");
    }

    #[test]
    fn unknown_default_department_is_rejected() {
        let text = r#"
            default_department = "Nowhere"

            [[departments]]
            name = "A"
            keywords = ["a"]
        "#;

        assert!(Catalog::from_toml(text).is_err());
    }

    #[test]
    fn duplicate_departments_are_rejected() {
        let text = r#"
            default_department = "A"

            [[departments]]
            name = "A"

            [[departments]]
            name = "a"
        "#;

        assert!(Catalog::from_toml(text).is_err());
    }

    #[test]
    fn invalid_priority_level_is_rejected() {
        let text = r#"
            default_department = "A"

            [[departments]]
            name = "A"

            [[priorities]]
            level = "critical"
            keywords = ["x"]
        "#;

        assert!(Catalog::from_toml(text).is_err());
    }

    #[test]
    fn default_department_can_be_overridden() {
        let mut catalog = Catalog::builtin().unwrap();

        catalog.set_default_department("it services").unwrap();
        assert_eq!(catalog.default_department(), "IT Services");

        assert!(catalog.set_default_department("Parking Office").is_err());
    }

    #[test]
    fn prompt_listing_has_one_line_per_department() {
        let catalog = Catalog::builtin().unwrap();
        let listing = catalog.prompt_listing();

        assert_eq!(listing.lines().count(), catalog.departments().len());
        assert!(listing.starts_with("- IT Services: "));
    }
}
