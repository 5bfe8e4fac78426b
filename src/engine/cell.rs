use std::ops::Range;

use tracing::trace;

use super::config::FormatConfig;
use super::error::IngestError;
use super::rules::{ExtractionRule, RuleKind, RuleMatch, instructor_rules, room_rules};

pub const UNSPECIFIED_SUBJECT: &str = "Не указано";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPart {
    pub subject: String,
    pub instructors: Vec<String>,
    pub room: String,
}

impl ParsedPart {
    pub fn instructor(&self) -> Option<&str> {
        self.instructors.first().map(String::as_str)
    }

    pub fn has_subject(&self) -> bool {
        self.subject != UNSPECIFIED_SUBJECT
    }
}

pub struct CellTextParser {
    separator: String,
    administrative_markers: Vec<String>,
    cascade: Vec<ExtractionRule>,
}

impl CellTextParser {
    pub fn new(config: &FormatConfig) -> Result<Self, IngestError> {
        let mut cascade = room_rules()?;
        cascade.extend(instructor_rules()?);

        Ok(Self {
            separator: config.sub_lesson_separator.clone(),
            administrative_markers: config
                .administrative_markers
                .iter()
                .map(|marker| marker.trim().to_lowercase())
                .filter(|marker| !marker.is_empty())
                .collect(),
            cascade,
        })
    }

    pub fn is_placeholder(text: &str) -> bool {
        text.chars().all(|character| {
            character.is_whitespace() || matches!(character, '"' | '\'' | '-' | '–' | '—' | '.' | '_')
        })
    }

    pub fn is_administrative(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.administrative_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }

    pub fn parse(&self, text: &str, aux_room: Option<&str>) -> Vec<ParsedPart> {
        let text = condense_whitespace(text);
        if Self::is_placeholder(&text) || self.is_administrative(&text) {
            return Vec::new();
        }

        let mut parts = text
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|part| !part.is_empty() && !Self::is_placeholder(part))
            .map(|part| self.parse_part(part))
            .collect::<Vec<ParsedPart>>();

        if let Some(aux_room) = aux_room.map(condense_whitespace) {
            self.fill_rooms_from_aux(&mut parts, &aux_room);
        }

        if parts.len() > 1
            && let Some(subject) = parts
                .iter()
                .find(|part| part.has_subject())
                .map(|part| part.subject.clone())
        {
            for part in parts.iter_mut().filter(|part| !part.has_subject()) {
                part.subject = subject.clone();
            }
        }

        for part in &parts {
            trace!(
                subject = %part.subject,
                instructor = part.instructor().unwrap_or_default(),
                instructors = part.instructors.len(),
                room = %part.room,
                "parsed cell part"
            );
        }

        parts
    }

    fn parse_part(&self, part: &str) -> ParsedPart {
        let mut working = part.to_string();

        let room = match self.first_room(&working) {
            Some(found) => {
                working = remove_spans(&working, std::slice::from_ref(&found.span));
                found.value
            }
            None => String::new(),
        };

        let instructor_matches = self.instructor_matches(&working);
        let spans = instructor_matches
            .iter()
            .map(|found| found.span.clone())
            .collect::<Vec<Range<usize>>>();
        let instructors = instructor_matches
            .into_iter()
            .map(|found| found.value)
            .collect::<Vec<String>>();
        working = remove_spans(&working, &spans);

        let subject = clean_subject(&working);

        ParsedPart {
            subject: if subject.is_empty() {
                UNSPECIFIED_SUBJECT.to_string()
            } else {
                subject
            },
            instructors,
            room,
        }
    }

    fn first_room(&self, text: &str) -> Option<RuleMatch> {
        self.cascade
            .iter()
            .filter(|rule| rule.kind() == RuleKind::Room)
            .find_map(|rule| {
                let found = rule.find(text)?;
                trace!(rule = rule.name(), room = %found.value, "room rule matched");
                Some(found)
            })
    }

    fn instructor_matches(&self, text: &str) -> Vec<RuleMatch> {
        let mut accepted = Vec::<RuleMatch>::new();

        for rule in self
            .cascade
            .iter()
            .filter(|rule| rule.kind() == RuleKind::Instructor)
        {
            for found in rule.find_all(text) {
                let overlaps = accepted
                    .iter()
                    .any(|existing| ranges_overlap(&existing.span, &found.span));
                if !overlaps {
                    trace!(rule = rule.name(), instructor = %found.value, "instructor rule matched");
                    accepted.push(found);
                }
            }
        }

        accepted.sort_by_key(|found| found.span.start);
        accepted
    }

    fn fill_rooms_from_aux(&self, parts: &mut [ParsedPart], aux_room: &str) {
        if Self::is_placeholder(aux_room) {
            return;
        }

        let pieces = aux_room
            .split(self.separator.as_str())
            .map(str::trim)
            .collect::<Vec<&str>>();
        let per_part = pieces.len() == parts.len() && parts.len() > 1;

        for (index, part) in parts.iter_mut().enumerate() {
            if !part.room.is_empty() {
                continue;
            }
            let room = if per_part { pieces[index] } else { aux_room.trim() };
            if !Self::is_placeholder(room) {
                part.room = room.to_string();
            }
        }
    }
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn ranges_overlap(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn remove_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|span| span.start);

    let mut kept = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for span in sorted {
        if span.start < cursor {
            continue;
        }
        kept.push_str(&text[cursor..span.start]);
        kept.push(' ');
        cursor = span.end;
    }
    kept.push_str(&text[cursor..]);
    kept
}

fn clean_subject(text: &str) -> String {
    let joined = text
        .split_whitespace()
        .filter(|token| !token.chars().all(|character| matches!(character, ',' | ';')))
        .collect::<Vec<&str>>()
        .join(" ");
    let trimmed = joined.trim();
    trimmed
        .strip_suffix(',')
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
