use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::metrics::EXPORTS_GENERATED_TOTAL;
use crate::models::survey::MAX_CELL_CHARS;
use crate::models::{Answer, PointerSample, Question, Survey};
use crate::utils::time::millis_to_seconds;

pub const RESPONSES_SHEET: &str = "Responses";
pub const TIME_TAKEN_SHEET: &str = "Time Taken";
pub const MOUSE_MOVEMENT_SHEET: &str = "Mouse Movement";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write workbook: {0}")]
    Workbook(#[from] XlsxError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: &'static str,
    pub rows: Vec<Vec<CellValue>>,
}

/// The three sheets of a session export, in workbook order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTables {
    pub sheets: Vec<SheetTable>,
}

impl ExportTables {
    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }
}

/// Positional letter code of an option: 0 -> `a`, 25 -> `z`, 26 -> `aa`.
pub fn letter_code(index: usize) -> String {
    let mut code = Vec::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        code.push(b'a' + (n % 26) as u8);
        n /= 26;
    }

    code.reverse();
    String::from_utf8(code).unwrap_or_default()
}

/// Responses-sheet cell for one answer.
///
/// Choice values that match no option are written raw with a warning instead
/// of a letter code. Multi-select codes follow option order.
pub fn encode_answer(question: &Question, answer: &Answer) -> String {
    match answer {
        Answer::FreeText(text) => text.clone(),
        Answer::SingleChoice(value) if value.is_empty() => String::new(),
        Answer::SingleChoice(value) => match question.option_index(value) {
            Some(index) => letter_code(index),
            None => {
                warn_unmatched(question, value);
                value.clone()
            }
        },
        Answer::MultiSelect(selected) => {
            let mut indices = Vec::new();
            let mut unmatched = Vec::new();
            for value in selected {
                match question.option_index(value) {
                    Some(index) => indices.push(index),
                    None => {
                        warn_unmatched(question, value);
                        unmatched.push(value.clone());
                    }
                }
            }
            indices.sort_unstable();
            indices.dedup();

            indices
                .into_iter()
                .map(letter_code)
                .chain(unmatched)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

fn warn_unmatched(question: &Question, value: &str) {
    tracing::warn!(
        question_id = %question.id,
        value,
        "answer does not match any option, exporting raw value"
    );
}

pub fn build_tables(
    survey: &Survey,
    answers: &[Answer],
    timings: &[Option<u64>],
    trace: &[PointerSample],
) -> ExportTables {
    let headers = survey
        .questions
        .iter()
        .map(|q| CellValue::Text(q.question_text.clone()))
        .collect();
    let encoded = survey
        .questions
        .iter()
        .zip(answers)
        .map(|(question, answer)| CellValue::Text(encode_answer(question, answer)))
        .collect();

    let time_headers = (1..=survey.questions.len())
        .map(|n| CellValue::Text(format!("Q{n} (seconds)")))
        .collect();
    let time_values = (0..survey.questions.len())
        .map(|index| match timings.get(index).copied().flatten() {
            Some(millis) => CellValue::Number(millis_to_seconds(millis)),
            None => CellValue::Blank,
        })
        .collect();

    let mut mouse_rows = Vec::with_capacity(trace.len() + 1);
    mouse_rows.push(vec![
        CellValue::Text("Elapsed Time (seconds)".into()),
        CellValue::Text("X-Y Coordinate".into()),
    ]);
    mouse_rows.extend(trace.iter().map(|sample| {
        vec![
            CellValue::Number(sample.elapsed_seconds),
            CellValue::Text(sample.coordinate_label()),
        ]
    }));

    ExportTables {
        sheets: vec![
            SheetTable {
                name: RESPONSES_SHEET,
                rows: vec![headers, encoded],
            },
            SheetTable {
                name: TIME_TAKEN_SHEET,
                rows: vec![time_headers, time_values],
            },
            SheetTable {
                name: MOUSE_MOVEMENT_SHEET,
                rows: mouse_rows,
            },
        ],
    }
}

/// Clips text to what a single xlsx cell can hold.
fn fit_cell<'a>(sheet: &str, text: &'a str) -> &'a str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            tracing::warn!(
                sheet,
                chars = text.chars().count(),
                limit = MAX_CELL_CHARS,
                "cell text truncated to fit the workbook"
            );
            &text[..cut]
        }
        None => text,
    }
}

/// Lays the tables out as worksheets. The first row of every sheet is the
/// header row.
pub fn build_workbook(tables: &ExportTables) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let seconds_format = Format::new().set_num_format("0.00");

    for table in &tables.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.name)?;

        for (row_index, row) in table.rows.iter().enumerate() {
            let row_number = row_index as u32;
            for (col_index, cell) in row.iter().enumerate() {
                let col = col_index as u16;
                match cell {
                    CellValue::Text(text) if text.is_empty() => {}
                    CellValue::Text(text) if row_index == 0 => {
                        let text = fit_cell(table.name, text);
                        worksheet.write_string_with_format(row_number, col, text, &header_format)?;
                    }
                    CellValue::Text(text) => {
                        worksheet.write_string(row_number, col, fit_cell(table.name, text))?;
                    }
                    CellValue::Number(value) => {
                        worksheet.write_number_with_format(row_number, col, *value, &seconds_format)?;
                    }
                    CellValue::Blank => {}
                }
            }
        }

        worksheet.set_column_width(0, 24.0)?;
    }

    Ok(workbook)
}

/// Renders the tables into an in-memory `.xlsx` file.
pub fn write_workbook(tables: &ExportTables) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(tables)?;

    let mut cursor = std::io::Cursor::new(Vec::new());
    workbook.save_to_writer(&mut cursor)?;

    EXPORTS_GENERATED_TOTAL.with_label_values(&["xlsx"]).inc();
    Ok(cursor.into_inner())
}
