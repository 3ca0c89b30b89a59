//! Per-call upload values.

use serde::{Deserialize, Serialize};

/// A file handed to the pipeline for one upload.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub content: Vec<u8>,
    pub mime_type: String,
    pub original_name: String,
    pub size: u64,
}

impl IncomingFile {
    /// Build a file whose `size` is the content length.
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        let size = content.len() as u64;
        Self {
            content,
            mime_type: mime_type.into(),
            original_name: original_name.into(),
            size,
        }
    }

    /// Extension of the original name: the text after the last `.`, if any.
    pub fn extension(&self) -> Option<&str> {
        self.original_name
            .rfind('.')
            .map(|idx| &self.original_name[idx + 1..])
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Swap in transformed bytes, keeping `size` in step.
    pub fn replace_content(&mut self, content: Vec<u8>) {
        self.size = content.len() as u64;
        self.content = content;
    }
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
