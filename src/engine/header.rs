use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use tracing::debug;

use super::config::{AuxColumnSide, FormatConfig};
use super::error::IngestError;
use crate::grid::Grid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupColumn {
    pub group: String,
    pub aux_column: Option<usize>,
}

pub type HeaderMap = BTreeMap<usize, GroupColumn>;

pub(crate) struct HeaderLocator {
    marker: String,
    group_prefix: String,
    group_pattern: Regex,
    aux_side: AuxColumnSide,
    period_column: usize,
}

impl HeaderLocator {
    pub(crate) fn new(config: &FormatConfig) -> Result<Self, IngestError> {
        let keyword = regex::escape(config.group_keyword.trim());
        let group_pattern = Regex::new(&format!(
            r#"(?i)^{keyword}\s*№?\s*(?P<id>[^\s";,()\[\]{{}}]+(?:\s+[^\s";,()\[\]{{}}]+)*)"#
        ))?;

        Ok(Self {
            marker: config.header_marker.trim().to_string(),
            group_prefix: config.group_keyword.trim().to_lowercase(),
            group_pattern,
            aux_side: config.aux_column_side,
            period_column: config.period_column,
        })
    }

    pub(crate) fn locate(&self, grid: &Grid) -> Result<(usize, HeaderMap), IngestError> {
        let (row_index, row) = grid
            .rows()
            .iter()
            .enumerate()
            .find(|(_, row)| {
                row.first()
                    .map(|first| first.contains(&self.marker))
                    .unwrap_or(false)
            })
            .ok_or_else(|| IngestError::HeaderNotFound {
                marker: self.marker.clone(),
            })?;

        let group_columns = row
            .iter()
            .enumerate()
            .filter_map(|(column, raw)| Some((column, self.group_identifier(raw)?)))
            .collect::<Vec<(usize, String)>>();
        let occupied = group_columns
            .iter()
            .map(|(column, _)| *column)
            .collect::<HashSet<usize>>();

        let mut header = HeaderMap::new();
        let mut seen = HashSet::<String>::new();

        for (column, group) in group_columns {
            if !seen.insert(group.clone()) {
                debug!(column, group = %group, "ignoring repeated group column");
                continue;
            }

            let aux_column = match self.aux_side {
                AuxColumnSide::Before => column.checked_sub(1),
                AuxColumnSide::After => Some(column + 1),
            }
            .filter(|&aux| aux != 0 && aux != self.period_column && !occupied.contains(&aux));

            header.insert(column, GroupColumn { group, aux_column });
        }

        Ok((row_index, header))
    }

    fn group_identifier(&self, raw: &str) -> Option<String> {
        let cleaned = strip_enclosing_punctuation(raw);
        if !cleaned.to_lowercase().starts_with(&self.group_prefix) {
            return None;
        }

        self.group_pattern
            .captures(cleaned)
            .and_then(|captures| captures.name("id"))
            .map(|id| id.as_str().trim().to_string())
            .filter(|id| !id.is_empty())
    }
}

fn strip_enclosing_punctuation(raw: &str) -> &str {
    raw.trim()
        .trim_matches(['"', '\'', '«', '»', '(', ')', '[', ']', '{', '}'])
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(config: &FormatConfig) -> HeaderLocator {
        HeaderLocator::new(config).expect("header patterns compile")
    }

    fn groups(header: &HeaderMap) -> Vec<&str> {
        header.values().map(|column| column.group.as_str()).collect()
    }

    #[test]
    fn extracts_group_with_number_sign_and_inner_whitespace() {
        let grid: Grid = vec![
            vec!["Расписание"],
            vec!["ДНИ НЕДЕЛИ", "", "\"Группа № 21 ПК\"", "", "группа 305"],
        ]
        .into_iter()
        .collect();

        let (row, header) = locator(&FormatConfig::standard())
            .locate(&grid)
            .expect("header should be found");

        assert_eq!(row, 1);
        assert_eq!(groups(&header), vec!["21 ПК", "305"]);
    }

    #[test]
    fn before_side_skips_layout_columns() {
        let grid: Grid = vec![vec!["ДНИ НЕДЕЛИ", "Группа 1", "Время", "Группа 2"]]
            .into_iter()
            .collect();

        let (_, header) = locator(&FormatConfig::standard())
            .locate(&grid)
            .expect("header should be found");

        assert_eq!(header[&1].aux_column, None);
        assert_eq!(header[&3].aux_column, Some(2));
    }

    #[test]
    fn after_side_records_following_room_column() {
        let grid: Grid = vec![vec!["ДНИ НЕДЕЛИ", "", "Группа 101", "Ауд.", "Группа 102", "Ауд."]]
            .into_iter()
            .collect();

        let (_, header) = locator(&FormatConfig::room_column())
            .locate(&grid)
            .expect("header should be found");

        assert_eq!(header[&2].aux_column, Some(3));
        assert_eq!(header[&4].aux_column, Some(5));
    }

    #[test]
    fn neighbouring_group_column_is_never_aux() {
        let grid: Grid = vec![vec!["ДНИ НЕДЕЛИ", "", "Время", "Группа 101", "Группа 102"]]
            .into_iter()
            .collect();

        let (_, before) = locator(&FormatConfig::standard())
            .locate(&grid)
            .expect("header should be found");
        assert_eq!(before[&3].aux_column, Some(2));
        assert_eq!(before[&4].aux_column, None);

        let (_, after) = locator(&FormatConfig::room_column())
            .locate(&grid)
            .expect("header should be found");
        assert_eq!(after[&3].aux_column, None);
        assert_eq!(after[&4].aux_column, Some(5));
    }

    #[test]
    fn first_occurrence_of_group_wins() {
        let grid: Grid = vec![vec!["ДНИ НЕДЕЛИ", "", "Группа 7", "", "Группа 7"]]
            .into_iter()
            .collect();

        let (_, header) = locator(&FormatConfig::standard())
            .locate(&grid)
            .expect("header should be found");

        assert_eq!(header.len(), 1);
        assert!(header.contains_key(&2));
    }

    #[test]
    fn missing_marker_is_header_not_found() {
        let grid: Grid = vec![vec!["Понедельник", "1", "Физика"]].into_iter().collect();

        let result = locator(&FormatConfig::standard()).locate(&grid);
        assert!(matches!(result, Err(IngestError::HeaderNotFound { .. })));
    }

    #[test]
    fn group_set_ignores_row_order_below_header() {
        let mut rows = vec![
            vec!["ДНИ НЕДЕЛИ", "", "Группа 11", "", "Группа 12"],
            vec!["Понедельник", "1", "Физика", "", "Химия"],
            vec!["Вторник", "3", "Алгебра", "", "История"],
        ];
        let config = FormatConfig::standard();
        let (_, forward) = locator(&config)
            .locate(&rows.clone().into_iter().collect())
            .expect("header should be found");

        rows[1..].reverse();
        let (_, reversed) = locator(&config)
            .locate(&rows.into_iter().collect())
            .expect("header should be found");

        assert_eq!(groups(&forward), groups(&reversed));
    }
}
