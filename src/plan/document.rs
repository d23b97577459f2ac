//! Plan documents and the practice catalog.
//!
//! Both are fetched as JSON. Text fields come in two shapes: a plain string
//! shared by every locale, or a `{zh, en}` object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// A text field that may be localized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    PerLocale {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zh: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        en: Option<String>,
    },
}

impl LocalizedText {
    /// Resolve for a locale: requested locale first, then English, then
    /// Chinese, then empty.
    pub fn for_locale(&self, locale: Locale) -> &str {
        match self {
            LocalizedText::Plain(text) => text,
            LocalizedText::PerLocale { zh, en } => {
                let preferred = match locale {
                    Locale::Zh => zh,
                    Locale::En => en,
                };
                preferred
                    .as_deref()
                    .or(en.as_deref())
                    .or(zh.as_deref())
                    .unwrap_or("")
            }
        }
    }
}

/// One day of a practice plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day: u32,
    /// Id of the phase this day belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affirmation: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_hint: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<String, LocalizedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A phase grouping consecutive plan days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<LocalizedText>,
}

/// The fetched day-by-day plan for one script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub days: Vec<DayEntry>,
    pub phases: Vec<PhaseEntry>,
}

impl PlanDocument {
    pub fn total_days(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn phase(&self, id: &str) -> Option<&PhaseEntry> {
        self.phases.iter().find(|p| p.id == id)
    }
}

/// Availability of a catalog template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    /// A script document is available for this template.
    Ready,
    ComingSoon,
    Custom,
    Unknown,
}

/// One selectable practice template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub habit_id: String,
    /// Script identifier, present when the template is ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Template {
    pub fn availability(&self) -> TemplateStatus {
        if self.script.is_some() {
            return TemplateStatus::Ready;
        }
        match self.status.as_deref() {
            Some("coming-soon") => TemplateStatus::ComingSoon,
            Some("custom") => TemplateStatus::Custom,
            _ => TemplateStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathway: Option<String>,
    pub templates: Vec<Template>,
}

/// The fetched practice catalog: every selectable template, by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanCatalog {
    pub categories: Vec<Category>,
}

impl PlanCatalog {
    pub fn template(&self, habit_id: &str) -> Option<&Template> {
        self.categories
            .iter()
            .flat_map(|c| c.templates.iter())
            .find(|t| t.habit_id == habit_id)
    }
}
