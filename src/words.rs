//! Word catalogue: `{"words": [{"w": "apple", "s": "An apple a day..."}]}`.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// The word to spell.
    pub w: String,
    /// A sentence using it.
    pub s: String,
}

#[derive(Debug, Deserialize)]
struct WordsFile {
    #[serde(default)]
    words: Vec<Word>,
}

/// Load the catalogue, falling back to the built-in list when the file is
/// missing or unreadable.
pub fn load_words(path: &Path) -> Vec<Word> {
    match read_words(path) {
        Ok(words) => {
            tracing::info!(count = words.len(), path = %path.display(), "word list loaded");
            words
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "using built-in word list");
            default_words()
        }
    }
}

fn read_words(path: &Path) -> anyhow::Result<Vec<Word>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str::<WordsFile>(&raw)?.words)
}

pub fn default_words() -> Vec<Word> {
    [
        ("hamburger", "I'd like to eat a hamburger."),
        ("apple", "An apple a day keeps the doctor away."),
        ("school", "We walk to school every morning."),
        ("friend", "My friend and I play at the park."),
        ("yellow", "The sun is bright and yellow."),
    ]
    .into_iter()
    .map(|(w, s)| Word { w: w.into(), s: s.into() })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let words = load_words(&dir.path().join("words.json"));
        assert_eq!(words, default_words());
        assert_eq!(words[0].w, "hamburger");
    }

    #[test]
    fn test_loads_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("words.json");
        std::fs::write(&path, r#"{"words":[{"w":"zebra","s":"The zebra has stripes."}]}"#).unwrap();
        let words = load_words(&path);
        assert_eq!(words, vec![Word { w: "zebra".into(), s: "The zebra has stripes.".into() }]);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("words.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_words(&path).len(), 5);
    }
}
