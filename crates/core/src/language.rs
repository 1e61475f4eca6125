//! Contract languages recognised by file extension

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

/// Source language of a contract file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Solidity,
    Vyper,
}

impl Language {
    /// Maps a bare extension (without the dot) to a language
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "sol" => Some(Language::Solidity),
            "vy" => Some(Language::Vyper),
            _ => None,
        }
    }

    /// Derives the language from a file path
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| SourceError::UnsupportedExtension(path.to_path_buf()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Solidity => "solidity",
            Language::Vyper => "vyper",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Solidity => "sol",
            Language::Vyper => "vy",
        }
    }

    /// Vyper is compiled from the file on disk, so its buffer stays read-only
    pub fn is_editable(&self) -> bool {
        matches!(self, Language::Solidity)
    }

    /// Ape framework plugin that compiles this language
    pub fn ape_plugin(&self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("contracts/Greeter.sol")).unwrap(),
            Language::Solidity
        );
        assert_eq!(
            Language::from_path(Path::new("token.vy")).unwrap(),
            Language::Vyper
        );
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Language::from_path(Path::new("README.md")).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedExtension(p) if p == PathBuf::from("README.md")));
        assert!(Language::from_path(Path::new("Makefile")).is_err());
    }

    #[test]
    fn test_editability() {
        assert!(Language::Solidity.is_editable());
        assert!(!Language::Vyper.is_editable());
        assert_eq!(Language::Vyper.ape_plugin(), "vyper");
    }
}
