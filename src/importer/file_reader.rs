// ==========================================
// SiteTrak - Takeoff File Reader
// ==========================================
// Responsibility: stage 0, read a delimited file into headers + raw rows
// Supports: CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::takeoff_importer_trait::FileReader;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// RawTable / RawRow - Positional File Contents
// ==========================================
// Cells keep their column position so header mapping can address them by
// index. Row numbers are 1-based over retained (non-blank) data rows.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// CSV Reader implementation
// ==========================================
pub struct CsvReader;

impl FileReader for CsvReader {
    fn read_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let path = file_path;

        // Check the file exists
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // Check the extension
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // Open the CSV file
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // tolerate ragged row lengths
            .from_reader(file);

        // Read the header row
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // Read all data rows
        let mut rows = Vec::new();
        let mut row_number = 0usize;
        for result in reader.records() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // Skip fully blank rows
            if cells.iter().all(|v| v.is_empty()) {
                continue;
            }

            row_number += 1;
            rows.push(RawRow { row_number, cells });
        }

        Ok(RawTable { headers, rows })
    }
}
