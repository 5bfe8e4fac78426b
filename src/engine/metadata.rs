use chrono::NaiveDate;
use regex::Regex;

use super::config::FormatConfig;
use super::error::{Diagnostic, IngestError};
use crate::grid::Grid;
use crate::model::ValidityRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerScan {
    Found(ValidityRange),
    Malformed(Diagnostic),
    NoBanner,
}

pub(crate) struct MetadataScanner {
    banner_marker: String,
    date_range: Regex,
}

impl MetadataScanner {
    pub(crate) fn new(config: &FormatConfig) -> Result<Self, IngestError> {
        let from_word = regex::escape(config.range_from_word.trim());
        let to_word = regex::escape(config.range_to_word.trim());
        let date_range = Regex::new(&format!(
            r"(?i)(?:^|[^\p{{L}}]){from_word}\s+(?P<from>\d{{1,2}}\.\d{{1,2}}\.\d{{4}})(?:\s*г\.?)?\s+{to_word}\s+(?P<to>\d{{1,2}}\.\d{{1,2}}\.\d{{4}})"
        ))?;

        Ok(Self {
            banner_marker: config.banner_marker.trim().to_lowercase(),
            date_range,
        })
    }

    pub(crate) fn scan(&self, grid: &Grid) -> BannerScan {
        for (row_index, row) in grid.rows().iter().enumerate() {
            let text = row
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .collect::<Vec<&str>>()
                .join(" ");
            if !text.to_lowercase().contains(&self.banner_marker) {
                continue;
            }

            return match self.parse_range(&text) {
                Some(range) => BannerScan::Found(range),
                None => BannerScan::Malformed(Diagnostic::MalformedDateRange {
                    row: row_index,
                    text,
                }),
            };
        }

        BannerScan::NoBanner
    }

    fn parse_range(&self, text: &str) -> Option<ValidityRange> {
        let captures = self.date_range.captures(text)?;
        let from = parse_date(captures.name("from")?.as_str())?;
        let to = parse_date(captures.name("to")?.as_str())?;
        (from <= to).then_some(ValidityRange { from, to })
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%d.%m.%Y").ok()
}
