use serde::{Deserialize, Serialize};

/// Width of the zero-padded file number in batch file names.
pub const FILE_NUMBER_WIDTH: usize = 5;

/// One collected article. Serialized as a single JSONL line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cleaned content for {url} is empty")]
pub struct EmptyContent {
    pub url: String,
}

impl Entry {
    /// Rejects content that is empty or whitespace-only.
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Result<Self, EmptyContent> {
        let url = url.into();
        let content = content.into();
        if content.trim().is_empty() {
            return Err(EmptyContent { url });
        }
        Ok(Self { url, content })
    }

    /// Size of the entry as it appears in the batch file, newline excluded.
    pub fn encoded_len(&self) -> u64 {
        serde_json::to_string(self)
            .map(|line| line.len() as u64)
            .unwrap_or(0)
    }
}

/// Entries collected during a single cycle, in collection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<Entry>,
    byte_len: u64,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.byte_len += entry.encoded_len();
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the encoded lengths of all entries.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Renders the batch as newline-delimited JSON, one entry per line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::with_capacity(self.byte_len as usize + self.entries.len());
        for entry in &self.entries {
            out.push_str(&serde_json::to_string(entry)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// Parses a batch file back into entries. Blank lines are ignored.
pub fn parse_jsonl(text: &str) -> Result<Vec<Entry>, serde_json::Error> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}

/// `scrape_00042.jsonl` for file number 42.
pub fn batch_filename(file_number: u64) -> String {
    format!("scrape_{file_number:0width$}.jsonl", width = FILE_NUMBER_WIDTH)
}
