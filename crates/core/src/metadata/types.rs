//! Types for resolver responses.

use serde::{Deserialize, Serialize};

/// Titles known for one identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTitles {
    /// Primary (usually original-language or English) title.
    pub primary: String,
    /// Alternate titles (translations, working titles, AKAs).
    #[serde(default)]
    pub alternates: Vec<String>,
}

impl ResolvedTitles {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            alternates: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternates = alternates.into_iter().map(Into::into).collect();
        self
    }

    /// All distinct non-blank titles, primary first.
    ///
    /// Duplicates are detected case-insensitively; the first spelling wins.
    pub fn all(&self) -> Vec<&str> {
        let mut seen: Vec<String> = Vec::new();
        let mut titles = Vec::new();
        for title in std::iter::once(&self.primary).chain(self.alternates.iter()) {
            let title = title.trim();
            if title.is_empty() {
                continue;
            }
            let key = title.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                titles.push(title);
            }
        }
        titles
    }
}
