//! Replayable sources of delimited text rows

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Split `line` on `delimiter`, dropping empty fields and a trailing `\r`.
pub fn tokenize(line: &str, delimiter: char) -> Vec<&str> {
    line.strip_suffix('\r')
        .unwrap_or(line)
        .split(delimiter)
        .filter(|field| !field.is_empty())
        .collect()
}

/// A stream of tokenized rows that can be read from the start any number
/// of times.
///
/// Each call to [`RowSource::visit_rows`] replays the entire input, which is
/// what the two-pass tag discovery relies on. Rows are numbered from 1 by
/// their physical line in the input; rows with no fields are not visited.
pub trait RowSource {
    fn visit_rows(&self, visitor: &mut dyn FnMut(usize, &[&str]) -> Result<()>) -> Result<()>;
}

/// A delimited text file, re-opened on every visit.
#[derive(Debug, Clone)]
pub struct DelimitedFile {
    path: PathBuf,
    delimiter: char,
    skip_header: bool,
}

impl DelimitedFile {
    /// Open `path` for reading. Fails immediately if it cannot be opened.
    pub fn open(path: impl AsRef<Path>, delimiter: char) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        File::open(&path)?;
        Ok(Self {
            path,
            delimiter,
            skip_header: false,
        })
    }

    /// Ignore the first line of the file.
    pub fn skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for DelimitedFile {
    fn visit_rows(&self, visitor: &mut dyn FnMut(usize, &[&str]) -> Result<()>) -> Result<()> {
        let reader = BufReader::new(File::open(&self.path)?);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if self.skip_header && i == 0 {
                continue;
            }
            let fields = tokenize(&line, self.delimiter);
            if fields.is_empty() {
                continue;
            }
            visitor(i + 1, &fields)?;
        }
        Ok(())
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lines: Vec<String>,
    delimiter: char,
}

impl MemorySource {
    pub fn new<I, S>(lines: I, delimiter: char) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            delimiter,
        }
    }
}

impl RowSource for MemorySource {
    fn visit_rows(&self, visitor: &mut dyn FnMut(usize, &[&str]) -> Result<()>) -> Result<()> {
        for (i, line) in self.lines.iter().enumerate() {
            let fields = tokenize(line, self.delimiter);
            if fields.is_empty() {
                continue;
            }
            visitor(i + 1, &fields)?;
        }
        Ok(())
    }
}
