//! Data table (`.stb`) decoder
//!
//! Layout:
//! ```text
//! [4-byte id "STB0" | "STB1"][u32 data_offset][u32 row_count][u32 column_count]
//! [u32 row_height][u16 root column width][column_count × u16 width]
//! [column_count × string_u16 column name][string_u16 title]
//! [(row_count - 1) × string_u16 row name]
//! ```
//! followed at `data_offset` by `(row_count - 1) × (column_count - 1)`
//! `string_u16` cells, row-major. Both counts include the header row and
//! the row-name column.

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Identifiers accepted at the start of a data table
pub const IDENTIFIERS: [&str; 2] = ["STB0", "STB1"];

/// One data row: its name plus one cell per data column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    pub name: String,
    pub cells: Vec<String>,
}

/// Decoded data table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    pub identifier: String,
    pub row_height: u32,
    pub root_column_width: u16,
    pub column_widths: Vec<u16>,
    /// Header of every column; the first names the row-name column
    pub column_names: Vec<String>,
    pub title: String,
    pub rows: Vec<DataRow>,
}

impl DataTable {
    /// Data rows, excluding the header row
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Columns, including the row-name column
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Cell `column` of data row `row`; column 0 is the first data column
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.cells.get(column).map(String::as_str)
    }

    pub fn row_by_name(&self, name: &str) -> Option<&DataRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Data column index of the column headed `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names
            .iter()
            .skip(1)
            .position(|column| column == name)
    }
}

impl HumanReadable for DataTable {
    fn to_readable_string(&self) -> String {
        format!(
            "Data table {}\n  title: {:?}\n  rows: {}\n  columns: {}\n  row height: {}\n",
            self.identifier,
            self.title,
            self.row_count(),
            self.column_count(),
            self.row_height
        )
    }
}

/// Data table decoder
pub struct StbParser;

impl StbParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StbParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for StbParser {
    type Output = DataTable;

    fn name(&self) -> &str {
        "STB Data Table Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["stb"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<DataTable> {
        let mut cursor = ByteCursor::new(data);

        let identifier = cursor.read_fixed_string(4)?;
        if !IDENTIFIERS.contains(&identifier.as_str()) {
            return Err(ParseError::UnrecognizedFormat {
                format: "STB",
                found: identifier,
            });
        }

        let data_offset = u64::from(cursor.read_u32()?);
        let row_count = cursor.read_u32()? as usize;
        let column_count = cursor.read_u32()? as usize;
        if row_count == 0 || column_count == 0 {
            return Err(ParseError::invalid(format!(
                "data table needs a header row and column, found {row_count} rows and {column_count} columns"
            )));
        }
        let row_height = cursor.read_u32()?;

        let root_column_width = cursor.read_u16()?;
        let column_widths = cursor.read_array(column_count, ByteCursor::read_u16)?;
        let column_names = cursor
            .read_array(column_count, ByteCursor::read_string_u16)
            .map_err(|e| e.with_context("column names"))?;
        let title = cursor.read_string_u16()?;
        let row_names = cursor
            .read_array(row_count - 1, ByteCursor::read_string_u16)
            .map_err(|e| e.with_context("row names"))?;

        cursor.seek(data_offset)?;
        let mut rows = Vec::with_capacity(row_names.len());
        for (index, name) in row_names.into_iter().enumerate() {
            let cells = cursor
                .read_array(column_count - 1, ByteCursor::read_string_u16)
                .map_err(|e| e.with_context(format!("row {index}")))?;
            rows.push(DataRow { name, cells });
        }

        Ok(DataTable {
            identifier,
            row_height,
            root_column_width,
            column_widths,
            column_names,
            title,
            rows,
        })
    }
}
