// roseread-parsers/src/idx.rs
//! Virtual file system index (`.idx`) decoder
//!
//! Client assets ship packed in `.vfs` archives. The index lists every
//! archive and, for each, the metadata of the files it holds. No asset data
//! lives in the index itself.
//!
//! Layout:
//! ```text
//! [i32 base_version][i32 current_version][i32 vfs_count]
//! vfs_count × [string_u16 archive][i32 table_offset]
//!
//! at table_offset:
//! [i32 file_count][i32 delete_count][i32 start_offset]
//! file_count × [string_u16 path][i32 offset][i32 size][i32 block_size]
//!              [u8 deleted][u8 compressed][u8 encrypted][i32 version][i32 checksum]
//! ```
//!
//! Archive headers are read in order; each file table is read at its offset
//! and the cursor returns to the next header afterwards.

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{HumanReadable, ParseError, ParseOptions, ParseResult, Parser};

/// Metadata of one packed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfsFile {
    /// Path with `/` separators
    pub path: String,
    pub offset: i32,
    pub size: i32,
    pub block_size: i32,
    pub is_deleted: bool,
    pub is_compressed: bool,
    pub is_encrypted: bool,
    pub version: i32,
    pub checksum: i32,
}

impl VfsFile {
    fn read(cursor: &mut ByteCursor<'_>) -> ParseResult<Self> {
        Ok(Self {
            path: normalize_path(&cursor.read_string_u16()?),
            offset: cursor.read_i32()?,
            size: cursor.read_i32()?,
            block_size: cursor.read_i32()?,
            is_deleted: cursor.read_bool()?,
            is_compressed: cursor.read_bool()?,
            is_encrypted: cursor.read_bool()?,
            version: cursor.read_i32()?,
            checksum: cursor.read_i32()?,
        })
    }
}

/// One archive and its file table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfsArchive {
    pub name: String,
    pub delete_count: i32,
    pub start_offset: i32,
    pub files: Vec<VfsFile>,
}

impl VfsArchive {
    fn read_table(cursor: &mut ByteCursor<'_>, name: String) -> ParseResult<Self> {
        let file_count = cursor.read_count_i32("file")?;
        let delete_count = cursor.read_i32()?;
        let start_offset = cursor.read_i32()?;
        let files = cursor.read_array(file_count, VfsFile::read)?;
        Ok(Self {
            name,
            delete_count,
            start_offset,
            files,
        })
    }

    /// Files not flagged as deleted
    pub fn live_files(&self) -> impl Iterator<Item = &VfsFile> {
        self.files.iter().filter(|file| !file.is_deleted)
    }
}

/// Decoded archive index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfsIndex {
    pub base_version: i32,
    pub current_version: i32,
    pub archives: Vec<VfsArchive>,
}

impl VfsIndex {
    pub fn file_count(&self) -> usize {
        self.archives.iter().map(|archive| archive.files.len()).sum()
    }

    /// Find a live file by path, ignoring case and separator style
    pub fn find(&self, path: &str) -> Option<(&VfsArchive, &VfsFile)> {
        let wanted = normalize_path(path);
        self.archives.iter().find_map(|archive| {
            archive
                .live_files()
                .find(|file| file.path.eq_ignore_ascii_case(&wanted))
                .map(|file| (archive, file))
        })
    }

    /// Check each archive's delete count against its deleted entries
    pub fn validate(&self) -> ParseResult<()> {
        for archive in &self.archives {
            let deleted = archive.files.iter().filter(|file| file.is_deleted).count();
            if usize::try_from(archive.delete_count).ok() != Some(deleted) {
                return Err(ParseError::invalid(format!(
                    "archive {} declares {} deleted files but flags {deleted}",
                    archive.name, archive.delete_count
                )));
            }
        }
        Ok(())
    }
}

impl HumanReadable for VfsIndex {
    fn to_readable_string(&self) -> String {
        let mut out = format!(
            "VFS index\n  versions: {} -> {}\n  archives: {}\n  files: {}\n",
            self.base_version,
            self.current_version,
            self.archives.len(),
            self.file_count()
        );
        for archive in &self.archives {
            out.push_str(&format!("    {} ({} files)\n", archive.name, archive.files.len()));
        }
        out
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Archive index decoder
pub struct IdxParser;

impl IdxParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for IdxParser {
    type Output = VfsIndex;

    fn name(&self) -> &str {
        "IDX VFS Index Parser"
    }

    fn extensions(&self) -> &[&str] {
        &["idx"]
    }

    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<VfsIndex> {
        let mut cursor = ByteCursor::new(data);

        let base_version = cursor.read_i32()?;
        let current_version = cursor.read_i32()?;
        let archive_count = cursor.read_count_i32("archive")?;

        let archives = cursor.read_array(archive_count, |c| {
            let name = normalize_path(&c.read_string_u16()?);
            let offset = c.read_i32()?;
            let table = u64::try_from(offset)
                .map_err(|_| ParseError::invalid(format!("negative file table offset {offset}")))?;
            c.scoped(|c| {
                c.seek(table)?;
                VfsArchive::read_table(c, name.clone())
            })
            .map_err(|e| e.with_context(format!("file table of {name} at offset {offset}")))
        })?;

        let index = VfsIndex {
            base_version,
            current_version,
            archives,
        };
        if options.strict_validation {
            index.validate()?;
        }

        Ok(index)
    }
}
