// roseread-parsers/src/stl.rs
//! String table (`.stl`) decoder
//!
//! Layout:
//! ```text
//! [string_u8 kind][u32 row_count][row_count × (string_u8 key, u32 id)]
//! [u32 language_count][language_count × u32 language offset]
//! ```
//! Each language offset points to `row_count` absolute cell offsets. Each
//! cell offset points to the row's varbyte strings; how many depends on
//! the table kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Schema variant selected by the leading type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringTableKind {
    /// One text column
    Normal,
    /// Text and description
    Item,
    /// Text, description, start and end messages
    Quest,
}

impl StringTableKind {
    pub fn identifier(self) -> &'static str {
        match self {
            StringTableKind::Normal => "NRST01",
            StringTableKind::Item => "ITST01",
            StringTableKind::Quest => "QEST01",
        }
    }

    pub fn from_identifier(identifier: &str) -> ParseResult<Self> {
        match identifier {
            "NRST01" => Ok(StringTableKind::Normal),
            "ITST01" => Ok(StringTableKind::Item),
            "QEST01" => Ok(StringTableKind::Quest),
            other => Err(ParseError::UnrecognizedFormat {
                format: "STL",
                found: other.to_string(),
            }),
        }
    }

    /// Varbyte strings stored per cell
    pub fn column_count(self) -> usize {
        match self {
            StringTableKind::Normal => 1,
            StringTableKind::Item => 2,
            StringTableKind::Quest => 4,
        }
    }
}

impl fmt::Display for StringTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Language of a block, by its position in the language list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Korean,
    English,
    Japanese,
    ChineseTraditional,
    ChineseSimplified,
    Unknown(u32),
}

impl From<u32> for Language {
    fn from(index: u32) -> Self {
        match index {
            0 => Language::Korean,
            1 => Language::English,
            2 => Language::Japanese,
            3 => Language::ChineseTraditional,
            4 => Language::ChineseSimplified,
            other => Language::Unknown(other),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Korean => f.write_str("Korean"),
            Language::English => f.write_str("English"),
            Language::Japanese => f.write_str("Japanese"),
            Language::ChineseTraditional => f.write_str("Chinese (Traditional)"),
            Language::ChineseSimplified => f.write_str("Chinese (Simplified)"),
            Language::Unknown(index) => write!(f, "Unknown ({index})"),
        }
    }
}

/// Row key; one per row, shared by every language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringKey {
    pub name: String,
    pub id: u32,
}

/// One cell of a language block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StringRow {
    Normal {
        text: String,
    },
    Item {
        text: String,
        description: String,
    },
    Quest {
        text: String,
        description: String,
        start_message: String,
        end_message: String,
    },
}

impl StringRow {
    fn read(cursor: &mut ByteCursor<'_>, kind: StringTableKind) -> ParseResult<Self> {
        let text = cursor.read_string_varbyte()?;
        Ok(match kind {
            StringTableKind::Normal => StringRow::Normal { text },
            StringTableKind::Item => StringRow::Item {
                text,
                description: cursor.read_string_varbyte()?,
            },
            StringTableKind::Quest => StringRow::Quest {
                text,
                description: cursor.read_string_varbyte()?,
                start_message: cursor.read_string_varbyte()?,
                end_message: cursor.read_string_varbyte()?,
            },
        })
    }

    pub fn text(&self) -> &str {
        match self {
            StringRow::Normal { text } | StringRow::Item { text, .. } | StringRow::Quest { text, .. } => text,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            StringRow::Normal { .. } => None,
            StringRow::Item { description, .. } | StringRow::Quest { description, .. } => Some(description),
        }
    }
}

impl fmt::Display for StringRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringRow::Normal { text } => f.write_str(text),
            StringRow::Item { text, description } => write!(f, "{text}, {description}"),
            StringRow::Quest {
                text,
                description,
                start_message,
                end_message,
            } => write!(f, "{text}, {description}, {start_message}, {end_message}"),
        }
    }
}

/// All rows of one language, in key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTable {
    pub language: Language,
    pub rows: Vec<StringRow>,
}

/// Decoded string table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTable {
    pub kind: StringTableKind,
    pub keys: Vec<StringKey>,
    pub languages: Vec<LanguageTable>,
}

impl StringTable {
    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    /// Row index of the key named `name`
    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.keys.iter().position(|key| key.name == name)
    }

    /// Row index of the key with numeric `id`
    pub fn row_index_by_id(&self, id: u32) -> Option<usize> {
        self.keys.iter().position(|key| key.id == id)
    }

    pub fn language(&self, language: Language) -> Option<&LanguageTable> {
        self.languages.iter().find(|table| table.language == language)
    }

    /// The row for key `name` in `language`
    pub fn lookup(&self, name: &str, language: Language) -> Option<&StringRow> {
        let row = self.row_index(name)?;
        self.language(language)?.rows.get(row)
    }

    /// The row for numeric key `id` in `language`
    pub fn lookup_id(&self, id: u32, language: Language) -> Option<&StringRow> {
        let row = self.row_index_by_id(id)?;
        self.language(language)?.rows.get(row)
    }
}

impl HumanReadable for StringTable {
    fn to_readable_string(&self) -> String {
        let mut output = format!(
            "String table {}\n  rows: {}\n  languages: {}\n",
            self.kind,
            self.row_count(),
            self.language_count()
        );
        for table in &self.languages {
            output.push_str(&format!("    {}: {} rows\n", table.language, table.rows.len()));
        }
        output
    }
}

/// String table decoder
pub struct StlParser;

impl StlParser {
    pub fn new() -> Self {
        Self
    }

    /// Read one language block starting at `offset`
    ///
    /// Every cell is read inside its own scope, so the cell offset list is
    /// walked in order no matter where each cell points.
    fn read_language(
        cursor: &mut ByteCursor<'_>,
        kind: StringTableKind,
        offset: u64,
        row_count: usize,
    ) -> ParseResult<Vec<StringRow>> {
        cursor.seek(offset)?;
        cursor.read_array(row_count, |cursor| {
            let cell_offset = u64::from(cursor.read_u32()?);
            cursor
                .scoped(|cursor| {
                    cursor.seek(cell_offset)?;
                    StringRow::read(cursor, kind)
                })
                .map_err(|e| e.with_context(format!("cell at offset {cell_offset}")))
        })
    }
}

impl Default for StlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for StlParser {
    type Output = StringTable;

    fn name(&self) -> &str {
        "STL String Table Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["stl"]
    }

    fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<StringTable> {
        let mut cursor = ByteCursor::new(data);

        let identifier = cursor.read_string_u8()?;
        let kind = StringTableKind::from_identifier(&identifier)?;

        let row_count = cursor.read_u32()? as usize;
        let keys = cursor
            .read_array(row_count, |cursor| {
                Ok(StringKey {
                    name: cursor.read_string_u8()?,
                    id: cursor.read_u32()?,
                })
            })
            .map_err(|e| e.with_context("keys"))?;

        let language_count = cursor.read_u32()?;
        let mut languages = Vec::with_capacity((language_count as usize).min(cursor.remaining()));
        for index in 0..language_count {
            let language = Language::from(index);
            let offset = u64::from(cursor.read_u32()?);
            let rows = cursor
                .scoped(|cursor| Self::read_language(cursor, kind, offset, row_count))
                .map_err(|e| e.with_context(format!("{language} block at offset {offset}")))?;
            languages.push(LanguageTable { language, rows });
        }

        Ok(StringTable {
            kind,
            keys,
            languages,
        })
    }
}
