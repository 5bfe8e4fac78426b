use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Понедельник",
            Weekday::Tuesday => "Вторник",
            Weekday::Wednesday => "Среда",
            Weekday::Thursday => "Четверг",
            Weekday::Friday => "Пятница",
            Weekday::Saturday => "Суббота",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodBucket {
    #[serde(rename = "1-2")]
    First,
    #[serde(rename = "3-4")]
    Second,
    #[serde(rename = "5-6")]
    Third,
    #[serde(rename = "7-8")]
    Fourth,
    #[serde(rename = "9-10")]
    Fifth,
}

impl PeriodBucket {
    pub const LAST_STANDARD: PeriodBucket = PeriodBucket::Fourth;

    pub fn from_period_number(number: u32, extended: bool) -> Option<Self> {
        match number {
            1 | 2 => Some(Self::First),
            3 | 4 => Some(Self::Second),
            5 | 6 => Some(Self::Third),
            7 | 8 => Some(Self::Fourth),
            9 | 10 if extended => Some(Self::Fifth),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::First => "1-2",
            Self::Second => "3-4",
            Self::Third => "5-6",
            Self::Fourth => "7-8",
            Self::Fifth => "9-10",
        }
    }
}

impl fmt::Display for PeriodBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub day: Weekday,
    pub period: PeriodBucket,
    pub group: String,
    pub subject: String,
    pub instructors: BTreeSet<String>,
    pub room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleIndex {
    pub lessons: Vec<Lesson>,
    pub groups: BTreeSet<String>,
    pub instructors: BTreeSet<String>,
    pub validity_range: Option<ValidityRange>,
}

impl ScheduleIndex {
    pub fn lessons_for_group(&self, group: &str) -> Vec<&Lesson> {
        let mut lessons = self
            .lessons
            .iter()
            .filter(|lesson| lesson.group == group)
            .collect::<Vec<&Lesson>>();
        sort_by_slot(&mut lessons);
        lessons
    }

    pub fn lessons_for_instructor(&self, instructor: &str) -> Vec<&Lesson> {
        let mut lessons = self
            .lessons
            .iter()
            .filter(|lesson| lesson.instructors.contains(instructor))
            .collect::<Vec<&Lesson>>();
        sort_by_slot(&mut lessons);
        lessons
    }

    pub fn group_by_day<'a>(lessons: &[&'a Lesson]) -> BTreeMap<Weekday, Vec<&'a Lesson>> {
        let mut by_day = BTreeMap::<Weekday, Vec<&'a Lesson>>::new();
        for &lesson in lessons {
            by_day.entry(lesson.day).or_default().push(lesson);
        }
        for day_lessons in by_day.values_mut() {
            sort_by_slot(day_lessons);
        }
        by_day
    }
}

// Stable, so sub-lessons sharing a slot keep their source order.
fn sort_by_slot(lessons: &mut [&Lesson]) {
    lessons.sort_by(|a, b| a.day.cmp(&b.day).then(a.period.cmp(&b.period)));
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub input_path: String,
    pub index_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCounts {
    pub row_count: usize,
    pub header_row: usize,
    pub rows_scanned: usize,
    pub rows_skipped: usize,
    pub cells_parsed: usize,
    pub lessons_total: usize,
    pub groups_total: usize,
    pub instructors_total: usize,
    pub diagnostics_total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub format_variant: String,
    pub source_sha256: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub validity_range: Option<ValidityRange>,
    pub warnings: Vec<String>,
}
