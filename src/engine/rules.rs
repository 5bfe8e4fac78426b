use std::ops::Range;

use regex::{Captures, Regex};

use super::error::IngestError;

const ROOM_PREFIXES: &[&str] = &[
    "мастерская",
    "спортзал",
    "маст",
    "каб",
    "ауд",
    "лаб",
    "room",
    "cab",
    "aud",
    "lab",
    "ws",
];

const SURNAME: &str = r"\p{Lu}\p{Ll}+(?:-\p{Lu}\p{Ll}+)?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Room,
    Instructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub span: Range<usize>,
    pub value: String,
}

pub struct ExtractionRule {
    name: &'static str,
    kind: RuleKind,
    pattern: Regex,
    normalize: fn(&Captures<'_>) -> String,
}

impl ExtractionRule {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn find(&self, text: &str) -> Option<RuleMatch> {
        self.pattern
            .captures(text)
            .and_then(|captures| self.to_match(&captures))
    }

    pub fn find_all(&self, text: &str) -> Vec<RuleMatch> {
        self.pattern
            .captures_iter(text)
            .filter_map(|captures| self.to_match(&captures))
            .collect()
    }

    fn to_match(&self, captures: &Captures<'_>) -> Option<RuleMatch> {
        let value = captures.name("value")?;
        Some(RuleMatch {
            span: value.range(),
            value: (self.normalize)(captures),
        })
    }
}

pub fn room_rules() -> Result<Vec<ExtractionRule>, IngestError> {
    let prefixes = ROOM_PREFIXES
        .iter()
        .map(|prefix| regex::escape(prefix))
        .collect::<Vec<String>>()
        .join("|");

    Ok(vec![
        ExtractionRule {
            name: "prefixed-room",
            kind: RuleKind::Room,
            pattern: Regex::new(&format!(
                r"(?i)(?:^|[\s,])(?P<value>(?:{prefixes})\.?\s*№?\s*\d{{1,3}}\p{{L}}?)[\s.,]*$"
            ))?,
            normalize: verbatim_value,
        },
        ExtractionRule {
            name: "bare-room",
            kind: RuleKind::Room,
            pattern: Regex::new(r"(?:^|[\s,])(?P<value>\d{3,}\p{L}?)[\s.,]*$")?,
            normalize: verbatim_value,
        },
    ])
}

pub fn instructor_rules() -> Result<Vec<ExtractionRule>, IngestError> {
    Ok(vec![
        ExtractionRule {
            name: "two-initials",
            kind: RuleKind::Instructor,
            pattern: Regex::new(&format!(
                r"\b(?P<value>(?P<surname>{SURNAME})\s+(?P<first>\p{{Lu}})(?:\.\s*|\s+)(?P<second>\p{{Lu}})(?:\.|\b))"
            ))?,
            normalize: initials_value,
        },
        ExtractionRule {
            name: "one-initial",
            kind: RuleKind::Instructor,
            pattern: Regex::new(&format!(
                r"\b(?P<value>(?P<surname>{SURNAME})\s+(?P<first>\p{{Lu}})(?:\.|\b))"
            ))?,
            normalize: initials_value,
        },
    ])
}

fn verbatim_value(captures: &Captures<'_>) -> String {
    captures
        .name("value")
        .map(|value| value.as_str().trim().to_string())
        .unwrap_or_default()
}

fn initials_value(captures: &Captures<'_>) -> String {
    let mut rendered = captures
        .name("surname")
        .map(|surname| surname.as_str().to_string())
        .unwrap_or_default();
    rendered.push(' ');
    for name in ["first", "second"] {
        if let Some(initial) = captures.name(name) {
            rendered.push_str(initial.as_str());
            rendered.push('.');
        }
    }
    rendered
}
