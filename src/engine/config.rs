use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuxColumnSide {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub header_marker: String,
    pub group_keyword: String,
    pub weekday_names: Vec<String>,
    pub footer_markers: Vec<String>,
    pub aux_column_side: AuxColumnSide,
    pub sub_lesson_separator: String,
    pub extended_period_bucket: bool,
    pub period_column: usize,
    pub administrative_markers: Vec<String>,
    pub banner_marker: String,
    pub range_from_word: String,
    pub range_to_word: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormatConfig {
    pub fn standard() -> Self {
        Self {
            header_marker: "ДНИ НЕДЕЛИ".to_string(),
            group_keyword: "Группа".to_string(),
            weekday_names: [
                "понедельник",
                "вторник",
                "среда",
                "четверг",
                "пятница",
                "суббота",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            footer_markers: vec![
                "Условные обозначения".to_string(),
                "Технические работы".to_string(),
            ],
            aux_column_side: AuxColumnSide::Before,
            sub_lesson_separator: "/".to_string(),
            extended_period_bucket: false,
            period_column: 1,
            administrative_markers: vec!["классный час".to_string(), "куратор".to_string()],
            banner_marker: "расписание".to_string(),
            range_from_word: "с".to_string(),
            range_to_word: "по".to_string(),
        }
    }

    pub fn room_column() -> Self {
        Self {
            aux_column_side: AuxColumnSide::After,
            extended_period_bucket: true,
            ..Self::standard()
        }
    }

    pub fn with_overrides_from(self, path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        self.merge_json(&raw)
            .with_context(|| format!("failed to apply format config {}", path.display()))
    }

    pub fn merge_json(self, raw: &[u8]) -> Result<Self> {
        let mut base = serde_json::to_value(&self).context("failed to serialize format config")?;
        let overrides: serde_json::Value =
            serde_json::from_slice(raw).context("failed to parse format config overrides")?;

        if let (Some(base_map), serde_json::Value::Object(override_map)) =
            (base.as_object_mut(), overrides)
        {
            for (key, value) in override_map {
                base_map.insert(key, value);
            }
        }

        serde_json::from_value(base).context("format config overrides have invalid field types")
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.header_marker.trim().is_empty() {
            return Err(IngestError::InvalidConfig(
                "header_marker must not be empty".to_string(),
            ));
        }
        if self.group_keyword.trim().is_empty() {
            return Err(IngestError::InvalidConfig(
                "group_keyword must not be empty".to_string(),
            ));
        }
        if self.sub_lesson_separator.is_empty() {
            return Err(IngestError::InvalidConfig(
                "sub_lesson_separator must not be empty".to_string(),
            ));
        }
        if self.weekday_names.is_empty() || self.weekday_names.len() > 6 {
            return Err(IngestError::InvalidConfig(format!(
                "weekday_names must list 1 to 6 days, got {}",
                self.weekday_names.len()
            )));
        }
        if self.weekday_names.iter().any(|name| name.trim().is_empty()) {
            return Err(IngestError::InvalidConfig(
                "weekday_names must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}
