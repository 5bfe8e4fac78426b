use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{Context, Result};

use crate::util::sha256_hex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> &[String] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

pub fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

impl<S: Into<String>> FromIterator<Vec<S>> for Grid {
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub grid: Grid,
    pub sha256: String,
}

pub fn load_grid(path: &Path, delimiter: u8) -> Result<LoadedGrid> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let sha256 = sha256_hex(&raw);
    let grid = load_grid_from_reader(Cursor::new(raw), delimiter)
        .with_context(|| format!("failed to decode timetable grid: {}", path.display()))?;

    Ok(LoadedGrid { grid, sha256 })
}

pub fn load_grid_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Grid> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    // Exported timetables are not always valid UTF-8; undecodable bytes
    // become replacement characters rather than failing the whole file.
    let mut rows = Vec::<Vec<String>>::new();
    for (index, record) in csv_reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("failed to read grid row {}", index + 1))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    String::from_utf8_lossy(field)
                        .trim_start_matches('\u{feff}')
                        .trim_end_matches('\r')
                        .to_string()
                })
                .collect(),
        );
    }

    Ok(Grid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_grid_from_reader_keeps_jagged_rows() {
        let raw = "ДНИ НЕДЕЛИ;;Группа 101;;Группа 102\r\nПонедельник;1;Физика\r\n;2\r\n";
        let grid = load_grid_from_reader(Cursor::new(raw), b';').expect("grid should decode");

        assert_eq!(grid.len(), 3);
        assert_eq!(grid.row(0).len(), 5);
        assert_eq!(grid.row(1), ["Понедельник", "1", "Физика"]);
        assert_eq!(grid.row(2), ["", "2"]);
    }

    #[test]
    fn load_grid_from_reader_unquotes_cells_with_delimiters() {
        let raw = "\"Математика; лекция\";2\n";
        let grid = load_grid_from_reader(Cursor::new(raw), b';').expect("grid should decode");

        assert_eq!(cell(grid.row(0), 0), "Математика; лекция");
        assert_eq!(cell(grid.row(0), 1), "2");
        assert_eq!(cell(grid.row(0), 7), "");
    }

    #[test]
    fn load_grid_from_reader_tolerates_bom_and_invalid_bytes() {
        let raw = b"\xef\xbb\xbf\xd0\x94\xd0\x9d\xd0\x98;\xff\n".to_vec();
        let grid = load_grid_from_reader(Cursor::new(raw), b';').expect("grid should decode");

        assert_eq!(cell(grid.row(0), 0), "ДНИ");
        assert_eq!(cell(grid.row(0), 1), "\u{fffd}");
    }

    #[test]
    fn row_past_end_is_empty() {
        let grid: Grid = vec![vec!["a"]].into_iter().collect();
        assert!(grid.row(3).is_empty());
        assert_eq!(grid.len(), 1);
    }
}
