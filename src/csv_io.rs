// src/csv_io.rs

//! Импорт и экспорт CSV.
//!
//! Схема: `id,first_name,last_name,department,position,location,status,company`.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Employee, EmployeeStatus, NewEmployee, OptionalField};

pub const CSV_COLUMNS: [&str; 8] = [
    "id",
    "first_name",
    "last_name",
    "department",
    "position",
    "location",
    "status",
    "company",
];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV file must be UTF-8 encoded")]
    Encoding,
    #[error("malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
    #[error("CSV header is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Строка, не прошедшая проверку при импорте
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// Номер строки данных, начиная с 1 (заголовок не считается)
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ParsedImport {
    pub records: Vec<NewEmployee>,
    pub skipped: Vec<SkippedRow>,
}

/// Разобрать загруженный файл.
///
/// Порядок колонок не важен, лишние колонки и `id` игнорируются.
pub fn parse_import(bytes: &[u8]) -> Result<ParsedImport, CsvError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CsvError::Encoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    for required in ["first_name", "last_name"] {
        if !header.contains_key(required) {
            return Err(CsvError::MissingColumn(required));
        }
    }

    let mut parsed = ParsedImport::default();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let cell = |name: &str| {
            header
                .get(name)
                .and_then(|&i| row.get(i))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let status = match cell("status") {
            None => EmployeeStatus::Active,
            Some(raw) => match raw.parse::<EmployeeStatus>() {
                Ok(status) => status,
                Err(reason) => {
                    parsed.skipped.push(SkippedRow { row: index + 1, reason });
                    continue;
                }
            },
        };

        let mut record = NewEmployee::new(
            cell("first_name").unwrap_or_default(),
            cell("last_name").unwrap_or_default(),
        )
        .with_status(status);
        for field in OptionalField::ALL {
            if let Some(value) = cell(field.as_str()) {
                record = record.with(field, value);
            }
        }

        match record.validate() {
            Ok(record) => parsed.records.push(record),
            Err(reason) => parsed.skipped.push(SkippedRow { row: index + 1, reason }),
        }
    }

    Ok(parsed)
}

/// Плоская выгрузка: все колонки всегда, пустые значения пишутся пустыми строками
pub fn render_export(employees: &[Employee]) -> Result<Vec<u8>, CsvError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;

    for employee in employees {
        let id = employee.id.to_string();
        let attr = |field| employee.attribute(field).unwrap_or("");
        writer.write_record([
            id.as_str(),
            employee.first_name.as_str(),
            employee.last_name.as_str(),
            attr(OptionalField::Department),
            attr(OptionalField::Position),
            attr(OptionalField::Location),
            employee.status.as_str(),
            attr(OptionalField::Company),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::Malformed(csv::Error::from(e.into_error())))
}
