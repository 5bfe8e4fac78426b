use tracing::{debug, info, warn};

use crate::grid::{Grid, cell};
use crate::model::ScheduleIndex;

use super::aggregate::{LessonAggregator, Slot};
use super::cell::{CellTextParser, condense_whitespace};
use super::config::{AuxColumnSide, FormatConfig};
use super::error::{Diagnostic, IngestError};
use super::header::{HeaderLocator, HeaderMap};
use super::metadata::{BannerScan, MetadataScanner};
use super::tracker::{DayPeriodTracker, RowStep, SkipReason};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_scanned: usize,
    pub rows_skipped: usize,
    pub cells_parsed: usize,
    pub duplicates_merged: usize,
    pub stopped_at_footer: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Ingestion {
    pub index: ScheduleIndex,
    pub header_row: usize,
    pub header: HeaderMap,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: IngestStats,
}

pub struct TimetableParser {
    config: FormatConfig,
    header: HeaderLocator,
    cells: CellTextParser,
    metadata: MetadataScanner,
}

impl TimetableParser {
    pub fn new(config: FormatConfig) -> Result<Self, IngestError> {
        config.validate()?;

        Ok(Self {
            header: HeaderLocator::new(&config)?,
            cells: CellTextParser::new(&config)?,
            metadata: MetadataScanner::new(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    pub fn ingest(&self, grid: &Grid) -> Result<Ingestion, IngestError> {
        let (header_row, header) = self.header.locate(grid)?;
        info!(
            header_row,
            groups = header.len(),
            "located timetable header"
        );

        let mut diagnostics = Vec::<Diagnostic>::new();
        let mut stats = IngestStats::default();
        let mut tracker = DayPeriodTracker::new(&self.config);
        let mut aggregator =
            LessonAggregator::new(header.values().map(|column| column.group.as_str()));

        for (row_index, row) in grid.rows().iter().enumerate().skip(header_row + 1) {
            let has_group_content = header
                .keys()
                .any(|&column| !CellTextParser::is_placeholder(cell(row, column)));

            let (day, period) = match tracker.advance(row, has_group_content) {
                RowStep::Finished => {
                    debug!(row = row_index, "footer reached, stopping scan");
                    stats.stopped_at_footer = Some(row_index);
                    break;
                }
                RowStep::Skipped(SkipReason::UnrecognizedPeriod(value)) => {
                    stats.rows_skipped += 1;
                    let diagnostic = Diagnostic::UnrecognizedPeriodNumber {
                        row: row_index,
                        value,
                    };
                    warn!(row = diagnostic.row(), "{diagnostic}");
                    diagnostics.push(diagnostic);
                    continue;
                }
                RowStep::Skipped(reason) => {
                    stats.rows_skipped += 1;
                    debug!(
                        row = row_index,
                        reason = ?reason,
                        day = ?tracker.state().current_day,
                        "row skipped"
                    );
                    continue;
                }
                RowStep::Active { day, period } => (day, period),
            };
            stats.rows_scanned += 1;

            for (&column, group_column) in &header {
                let text = cell(row, column);
                let aux = group_column.aux_column.map(|aux| cell(row, aux));
                let (aux_room, time) = match self.config.aux_column_side {
                    AuxColumnSide::After => (aux, None),
                    AuxColumnSide::Before => (None, aux.map(condense_whitespace)),
                };

                let parts = self.cells.parse(text, aux_room);
                if parts.is_empty() {
                    continue;
                }
                stats.cells_parsed += 1;

                aggregator.add(
                    Slot {
                        day,
                        period,
                        group: &group_column.group,
                        time: time.as_deref(),
                    },
                    &parts,
                );
            }
        }

        let validity_range = match self.metadata.scan(grid) {
            BannerScan::Found(range) => {
                info!(from = %range.from, to = %range.to, "timetable validity range");
                Some(range)
            }
            BannerScan::Malformed(diagnostic) => {
                warn!(row = diagnostic.row(), "{diagnostic}");
                diagnostics.push(diagnostic);
                None
            }
            BannerScan::NoBanner => {
                debug!("no banner row with a validity range");
                None
            }
        };

        stats.duplicates_merged = aggregator.duplicates_merged();
        let index = aggregator.finish(validity_range);

        info!(
            lessons = index.lessons.len(),
            groups = index.groups.len(),
            instructors = index.instructors.len(),
            diagnostics = diagnostics.len(),
            "timetable ingest pass complete"
        );

        Ok(Ingestion {
            index,
            header_row,
            header,
            diagnostics,
            stats,
        })
    }
}
