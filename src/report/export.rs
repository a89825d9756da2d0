//! Spreadsheet export of a survey.
//!
//! The workbook is built in two steps: [`build_tables`] lays out every
//! sheet as plain cells, and [`write_workbook`] renders those cells to
//! XLSX bytes. Keeping the layout separate lets it be checked without
//! unpacking a zip archive.

use super::presenter::SummaryPresenter;
use crate::analysis::dimension_stats;
use crate::error::ExportError;
use crate::models::{Assessment, Dimension, SurveyId};
use rust_xlsxwriter::{Format, Workbook};

/// MIME type of the rendered workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const RESPONSES_SHEET: &str = "Responses";
pub const STATISTICS_SHEET: &str = "Statistics";

/// Download filename for a survey's export.
pub fn export_filename(survey_id: &SurveyId) -> String {
    format!("assessment_{}.xlsx", survey_id)
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: &'static str,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Lay out the export sheets for `rows`.
///
/// `rows` may be in any order; the responses sheet lists them oldest
/// first. With no rows both sheets carry only their header.
pub fn build_tables(rows: &[Assessment], presenter: &SummaryPresenter) -> Vec<SheetTable> {
    vec![responses_table(rows), statistics_table(rows, presenter)]
}

fn responses_table(rows: &[Assessment]) -> SheetTable {
    let mut header = vec!["Submitted at".to_string(), "Name".to_string(), "Team".to_string()];
    header.extend(Dimension::ALL.iter().map(|d| d.label().to_string()));
    header.push("Overall score".to_string());
    header.push("Notes".to_string());

    let mut ordered: Vec<&Assessment> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let rows = ordered
        .into_iter()
        .map(|row| {
            let mut cells = vec![
                Cell::Text(row.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string()),
                Cell::Text(row.respondent_name.clone()),
                Cell::Text(row.respondent_team.clone()),
            ];
            cells.extend(row.scores.iter().map(|(_, v)| Cell::Number(f64::from(v))));
            cells.push(Cell::Number(row.overall_score));
            cells.push(match &row.notes {
                Some(notes) => Cell::Text(notes.clone()),
                None => Cell::Empty,
            });
            cells
        })
        .collect();

    SheetTable {
        name: RESPONSES_SHEET,
        header,
        rows,
    }
}

fn statistics_table(rows: &[Assessment], presenter: &SummaryPresenter) -> SheetTable {
    let header = ["Dimension", "Mean", "Min", "Max", "Std dev"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = dimension_stats(rows)
        .into_iter()
        .map(|stats| {
            vec![
                Cell::from(stats.dimension.label()),
                Cell::Number(presenter.round(stats.mean)),
                Cell::Number(f64::from(stats.min)),
                Cell::Number(f64::from(stats.max)),
                Cell::Number(presenter.round(stats.std_dev)),
            ]
        })
        .collect();

    SheetTable {
        name: STATISTICS_SHEET,
        header,
        rows,
    }
}

/// Render sheet tables into an XLSX document.
pub fn write_workbook(tables: &[SheetTable]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.name)?;

        for (col, title) in table.header.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title.as_str(), &bold)?;
        }

        for (index, cells) in table.rows.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text.as_str())?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Build and render the export of one survey.
pub fn export_survey(
    rows: &[Assessment],
    presenter: &SummaryPresenter,
) -> Result<Vec<u8>, ExportError> {
    write_workbook(&build_tables(rows, presenter))
}
