use crate::grid::cell;
use crate::model::{PeriodBucket, Weekday};

use super::config::FormatConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStep {
    Active { day: Weekday, period: PeriodBucket },
    Skipped(SkipReason),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoDay,
    NoPeriod,
    UnrecognizedPeriod(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub current_day: Option<Weekday>,
    pub last_bucket: Option<PeriodBucket>,
    pub saw_explicit_period_since_day: bool,
    pub synthetic_used_since_day: bool,
    pub finished: bool,
}

pub struct DayPeriodTracker {
    weekday_names: Vec<String>,
    footer_markers: Vec<String>,
    period_column: usize,
    extended: bool,
    state: TrackerState,
}

impl DayPeriodTracker {
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            weekday_names: lowered(&config.weekday_names),
            footer_markers: lowered(&config.footer_markers),
            period_column: config.period_column,
            extended: config.extended_period_bucket,
            state: TrackerState::default(),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn advance(&mut self, row: &[String], has_group_content: bool) -> RowStep {
        if self.state.finished {
            return RowStep::Finished;
        }

        let first = cell(row, 0).trim().to_lowercase();
        if self
            .footer_markers
            .iter()
            .any(|marker| first.contains(marker.as_str()))
        {
            self.state.finished = true;
            return RowStep::Finished;
        }

        if let Some(day) = self.match_weekday(&first) {
            self.state.current_day = Some(day);
            self.state.last_bucket = None;
            self.state.saw_explicit_period_since_day = false;
            self.state.synthetic_used_since_day = false;
        }

        let period = match self.read_period(cell(row, self.period_column)) {
            PeriodCell::Number(bucket) => {
                self.state.last_bucket = Some(bucket);
                self.state.saw_explicit_period_since_day = true;
                bucket
            }
            PeriodCell::Invalid(value) => {
                return RowStep::Skipped(SkipReason::UnrecognizedPeriod(value));
            }
            PeriodCell::Empty => {
                if !self.synthetic_applies(has_group_content) {
                    return RowStep::Skipped(SkipReason::NoPeriod);
                }
                self.state.synthetic_used_since_day = true;
                self.state.last_bucket = Some(PeriodBucket::Fifth);
                PeriodBucket::Fifth
            }
        };

        match self.state.current_day {
            Some(day) => RowStep::Active { day, period },
            None => RowStep::Skipped(SkipReason::NoDay),
        }
    }

    fn match_weekday(&self, first_cell: &str) -> Option<Weekday> {
        self.weekday_names
            .iter()
            .position(|name| first_cell.contains(name.as_str()))
            .and_then(Weekday::from_index)
    }

    fn read_period(&self, raw: &str) -> PeriodCell {
        let value = raw.trim();
        if value.is_empty() {
            return PeriodCell::Empty;
        }

        value
            .trim_end_matches('.')
            .parse::<u32>()
            .ok()
            .and_then(|number| PeriodBucket::from_period_number(number, self.extended))
            .map(PeriodCell::Number)
            .unwrap_or_else(|| PeriodCell::Invalid(value.to_string()))
    }

    fn synthetic_applies(&self, has_group_content: bool) -> bool {
        self.extended
            && has_group_content
            && self.state.saw_explicit_period_since_day
            && !self.state.synthetic_used_since_day
            && self.state.last_bucket == Some(PeriodBucket::LAST_STANDARD)
    }
}

enum PeriodCell {
    Empty,
    Number(PeriodBucket),
    Invalid(String),
}

fn lowered(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|value| value.to_string()).collect()
    }

    fn active(day: Weekday, period: PeriodBucket) -> RowStep {
        RowStep::Active { day, period }
    }

    #[test]
    fn day_row_resets_period_to_first_bucket() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());

        assert_eq!(
            tracker.advance(&row(&["Понедельник", "7", "Физика"]), true),
            active(Weekday::Monday, PeriodBucket::Fourth)
        );
        assert_eq!(
            tracker.advance(&row(&["ВТОРНИК", "", ""]), false),
            RowStep::Skipped(SkipReason::NoPeriod)
        );
        assert_eq!(tracker.state().last_bucket, None);
        assert_eq!(
            tracker.advance(&row(&["", "2", "Химия"]), true),
            active(Weekday::Tuesday, PeriodBucket::First)
        );
    }

    #[test]
    fn period_numbers_map_to_pairs() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());
        tracker.advance(&row(&["Среда"]), false);

        let buckets = ["1", "2", "3", "4", "5", "6", "7", "8."]
            .into_iter()
            .map(|number| tracker.advance(&row(&["", number, "x"]), true))
            .collect::<Vec<RowStep>>();

        assert_eq!(buckets[0], active(Weekday::Wednesday, PeriodBucket::First));
        assert_eq!(buckets[1], active(Weekday::Wednesday, PeriodBucket::First));
        assert_eq!(buckets[3], active(Weekday::Wednesday, PeriodBucket::Second));
        assert_eq!(buckets[4], active(Weekday::Wednesday, PeriodBucket::Third));
        assert_eq!(buckets[7], active(Weekday::Wednesday, PeriodBucket::Fourth));
    }

    #[test]
    fn out_of_range_period_skips_row_but_keeps_day() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());
        tracker.advance(&row(&["Четверг", "3", "x"]), true);

        assert_eq!(
            tracker.advance(&row(&["", "9", "x"]), true),
            RowStep::Skipped(SkipReason::UnrecognizedPeriod("9".to_string()))
        );
        assert_eq!(
            tracker.advance(&row(&["", "I", "x"]), true),
            RowStep::Skipped(SkipReason::UnrecognizedPeriod("I".to_string()))
        );
        assert_eq!(tracker.state().current_day, Some(Weekday::Thursday));
        assert_eq!(tracker.state().last_bucket, Some(PeriodBucket::Second));
    }

    #[test]
    fn missing_period_skips_row_without_repeating_previous() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());
        tracker.advance(&row(&["Пятница", "3", "x"]), true);

        assert_eq!(
            tracker.advance(&row(&["", "", "Физика"]), true),
            RowStep::Skipped(SkipReason::NoPeriod)
        );
        assert_eq!(tracker.state().last_bucket, Some(PeriodBucket::Second));
    }

    #[test]
    fn synthetic_trailing_bucket_fires_once_per_day() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::room_column());
        tracker.advance(&row(&["Понедельник", "8", "x"]), true);

        assert_eq!(
            tracker.advance(&row(&["", "", "Физика"]), true),
            active(Weekday::Monday, PeriodBucket::Fifth)
        );
        assert_eq!(
            tracker.advance(&row(&["", "", "Химия"]), true),
            RowStep::Skipped(SkipReason::NoPeriod)
        );

        tracker.advance(&row(&["Вторник", "7", "x"]), true);
        assert_eq!(
            tracker.advance(&row(&["", "", "Физика"]), true),
            active(Weekday::Tuesday, PeriodBucket::Fifth)
        );
    }

    #[test]
    fn synthetic_bucket_needs_content_and_extended_layout() {
        let mut extended = DayPeriodTracker::new(&FormatConfig::room_column());
        extended.advance(&row(&["Понедельник", "8", "x"]), true);
        assert_eq!(
            extended.advance(&row(&["", "", ""]), false),
            RowStep::Skipped(SkipReason::NoPeriod)
        );

        let mut standard = DayPeriodTracker::new(&FormatConfig::standard());
        standard.advance(&row(&["Понедельник", "8", "x"]), true);
        assert_eq!(
            standard.advance(&row(&["", "", "Физика"]), true),
            RowStep::Skipped(SkipReason::NoPeriod)
        );
    }

    #[test]
    fn explicit_ninth_period_needs_extended_layout() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::room_column());
        tracker.advance(&row(&["Суббота"]), false);

        assert_eq!(
            tracker.advance(&row(&["", "10", "x"]), true),
            active(Weekday::Saturday, PeriodBucket::Fifth)
        );
    }

    #[test]
    fn rows_before_first_day_are_skipped() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());
        assert_eq!(
            tracker.advance(&row(&["", "1", "Физика"]), true),
            RowStep::Skipped(SkipReason::NoDay)
        );
    }

    #[test]
    fn footer_row_finishes_scan_permanently() {
        let mut tracker = DayPeriodTracker::new(&FormatConfig::standard());
        tracker.advance(&row(&["Понедельник", "1", "x"]), true);

        assert_eq!(
            tracker.advance(&row(&["Условные обозначения: лаб. - лаборатория"]), false),
            RowStep::Finished
        );
        assert_eq!(
            tracker.advance(&row(&["Вторник", "1", "x"]), true),
            RowStep::Finished
        );
        assert!(tracker.state().finished);
    }
}
