use std::collections::{BTreeSet, HashMap};

use crate::model::{Lesson, PeriodBucket, ScheduleIndex, ValidityRange, Weekday};

use super::cell::{ParsedPart, UNSPECIFIED_SUBJECT};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    day: Weekday,
    group: String,
    period: PeriodBucket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub day: Weekday,
    pub period: PeriodBucket,
    pub group: &'a str,
    pub time: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct LessonAggregator {
    lessons: Vec<Lesson>,
    first_by_slot: HashMap<SlotKey, usize>,
    groups: BTreeSet<String>,
    instructors: BTreeSet<String>,
    duplicates_merged: usize,
}

impl LessonAggregator {
    pub fn new<'a>(header_groups: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            groups: header_groups.into_iter().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, slot: Slot<'_>, parts: &[ParsedPart]) {
        let key = SlotKey {
            day: slot.day,
            group: slot.group.to_string(),
            period: slot.period,
        };

        match parts {
            [] => {}
            [part] => match self.first_by_slot.get(&key).copied() {
                Some(index) => {
                    self.merge_duplicate(index, part, slot.time);
                    self.duplicates_merged += 1;
                }
                None => self.push(key, slot.time, part),
            },
            _ => {
                for part in parts {
                    self.push(key.clone(), slot.time, part);
                }
            }
        }
    }

    pub fn duplicates_merged(&self) -> usize {
        self.duplicates_merged
    }

    pub fn finish(self, validity_range: Option<ValidityRange>) -> ScheduleIndex {
        ScheduleIndex {
            lessons: self.lessons,
            groups: self.groups,
            instructors: self.instructors,
            validity_range,
        }
    }

    fn push(&mut self, key: SlotKey, time: Option<&str>, part: &ParsedPart) {
        self.instructors.extend(part.instructors.iter().cloned());
        self.groups.insert(key.group.clone());

        let lesson = Lesson {
            day: key.day,
            period: key.period,
            group: key.group.clone(),
            subject: part.subject.clone(),
            instructors: part.instructors.iter().cloned().collect(),
            room: part.room.clone(),
            time: non_empty(time),
        };

        self.first_by_slot.entry(key).or_insert(self.lessons.len());
        self.lessons.push(lesson);
    }

    fn merge_duplicate(&mut self, index: usize, part: &ParsedPart, time: Option<&str>) {
        self.instructors.extend(part.instructors.iter().cloned());

        let lesson = &mut self.lessons[index];
        lesson.instructors.extend(part.instructors.iter().cloned());
        if !is_real_subject(&lesson.subject) && part.has_subject() {
            lesson.subject = part.subject.clone();
        }
        if lesson.room.is_empty() && !part.room.is_empty() {
            lesson.room = part.room.clone();
        }
        if lesson.time.is_none() {
            lesson.time = non_empty(time);
        }
    }
}

fn is_real_subject(subject: &str) -> bool {
    subject != UNSPECIFIED_SUBJECT
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
