// ==========================================
// 学员管理后台 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls) / OpenDocument (.ods)
// 输入: 上传文件的字节内容（不落盘）
// ==========================================

use crate::domain::import::FileUpload;
use crate::domain::types::{CellValue, SourceRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_service_trait::FileParser;
use calamine::{Data, Ods, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

/// 表头清洗（去首尾空白与 UTF-8 BOM）
fn clean_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn is_blank_row(row: &SourceRow) -> bool {
    row.values().all(CellValue::is_blank)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_rows(&self, upload: &FileUpload) -> ImportResult<Vec<SourceRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(upload.bytes.as_slice());

        // 读取表头
        let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeaderRow);
        }

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = SourceRow::new();

            // 每行都带上全部表头；短行缺失的尾部列补空串，多出的列丢弃
            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = record.get(col_idx).unwrap_or("").trim();
                row.insert(header.clone(), CellValue::Text(value.to_string()));
            }

            // 跳过完全空白的行
            if is_blank_row(&row) {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel / ODS Parser 实现
// ==========================================
pub struct SpreadsheetParser;

impl SpreadsheetParser {
    fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Null,
            Data::String(s) => CellValue::Text(s.trim().to_string()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            other => CellValue::Text(other.to_string().trim().to_string()),
        }
    }

    /// 读取第一个工作表
    fn read_first_sheet<RS, R>(workbook: &mut R) -> ImportResult<Vec<SourceRow>>
    where
        RS: Read + Seek,
        R: Reader<RS>,
        R::Error: Display,
    {
        let sheet_names = workbook.sheet_names();
        let Some(sheet_name) = sheet_names.first().cloned() else {
            return Err(ImportError::ExcelParseError(
                "workbook has no worksheets".to_string(),
            ));
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::MissingHeaderRow)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| clean_header(&cell.to_string()))
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeaderRow);
        }

        // 读取数据行
        let mut records = Vec::new();
        for data_row in rows {
            let mut row = SourceRow::new();

            for (col_idx, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = data_row.get(col_idx).map(Self::cell_value).unwrap_or_default();
                row.insert(header.clone(), value);
            }

            // 跳过完全空白的行
            if is_blank_row(&row) {
                continue;
            }

            records.push(row);
        }

        Ok(records)
    }
}

impl FileParser for SpreadsheetParser {
    fn parse_to_rows(&self, upload: &FileUpload) -> ImportResult<Vec<SourceRow>> {
        let cursor = Cursor::new(upload.bytes.clone());
        match upload.extension().as_str() {
            "xlsx" => {
                let mut workbook = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                Self::read_first_sheet::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            "xls" => {
                let mut workbook =
                    Xls::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                Self::read_first_sheet::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            "ods" => {
                let mut workbook =
                    Ods::new(cursor).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                Self::read_first_sheet::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn is_supported(extension: &str) -> bool {
        matches!(extension, "csv" | "xlsx" | "xls" | "ods")
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_rows(&self, upload: &FileUpload) -> ImportResult<Vec<SourceRow>> {
        match upload.extension().as_str() {
            "csv" => CsvParser.parse_to_rows(upload),
            "xlsx" | "xls" | "ods" => SpreadsheetParser.parse_to_rows(upload),
            ext => Err(ImportError::UnsupportedFormat(ext.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_upload(content: &str) -> FileUpload {
        FileUpload::new("roster.csv", content.as_bytes().to_vec())
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let upload = csv_upload("First Name,Last Name,Email\nAda,Lovelace,ada@example.com\nAlan,Turing,\n");

        let rows = CsvParser.parse_to_rows(&upload).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("First Name"), Some(&CellValue::Text("Ada".to_string())));
        assert_eq!(rows[1].get("Email"), Some(&CellValue::Text(String::new())));
        let headers: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(headers, vec!["First Name", "Last Name", "Email"]);
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let upload = csv_upload("First Name,Email\nAda,ada@example.com\n,\nAlan,alan@example.com\n");

        let rows = CsvParser.parse_to_rows(&upload).unwrap();

        // 应跳过空行
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_csv_parser_strips_bom_and_ragged_rows() {
        let upload = csv_upload("\u{feff}First Name,Email\nAda\nAlan,alan@example.com,extra\n");

        let rows = CsvParser.parse_to_rows(&upload).unwrap();

        assert_eq!(rows.len(), 2);
        let headers: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(headers, vec!["First Name", "Email"]);
        assert_eq!(rows[0].get("Email"), Some(&CellValue::Text(String::new())));
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[1].get("Email"), Some(&CellValue::Text("alan@example.com".to_string())));
    }

    #[test]
    fn test_csv_parser_empty_header_row() {
        let upload = csv_upload(",,\na,b,c\n");
        assert!(matches!(
            CsvParser.parse_to_rows(&upload),
            Err(ImportError::MissingHeaderRow)
        ));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let upload = FileUpload::new("roster.pdf", b"%PDF".to_vec());
        let result = UniversalFileParser.parse_to_rows(&upload);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"));
    }

    #[test]
    fn test_spreadsheet_parser_corrupt_file() {
        let upload = FileUpload::new("roster.xlsx", b"not a zip archive".to_vec());
        let result = UniversalFileParser.parse_to_rows(&upload);
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }
}
