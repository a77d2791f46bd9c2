//! Signature set parsing
//!
//! Signer output is line oriented: `HEIGHT:SIG` per line for a single signer,
//! or `HEIGHT:SIG1:SIG2:...` for a file that already holds every signer's
//! signature. Signatures are hex. Any malformed line aborts the whole parse.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{HeaderSigError, Result};

/// Shape expected of each line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Exactly one signature per line
    SingleSigner,
    /// One or more signatures per line
    Combined,
}

/// Ordered mapping from height to the signatures recorded for it
///
/// Iteration order is the order in which heights first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    entries: IndexMap<u64, Vec<Vec<u8>>>,
}

impl SignatureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the signatures for `height`
    ///
    /// A replaced height keeps its original position. Returns `true` if the
    /// height was already present.
    pub fn insert(&mut self, height: u64, signatures: Vec<Vec<u8>>) -> bool {
        self.entries.insert(height, signatures).is_some()
    }

    /// Signatures for `height`
    pub fn get(&self, height: u64) -> Option<&[Vec<u8>]> {
        self.entries.get(&height).map(Vec::as_slice)
    }

    /// Whether `height` is present
    pub fn contains(&self, height: u64) -> bool {
        self.entries.contains_key(&height)
    }

    /// Heights in first-appearance order
    pub fn heights(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    /// Entries in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Vec<u8>])> + '_ {
        self.entries.iter().map(|(h, sigs)| (*h, sigs.as_slice()))
    }

    /// Number of heights
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no heights are present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parser for signer output
#[derive(Debug, Clone, Copy)]
pub struct SignatureSetParser {
    mode: ParseMode,
    strict: bool,
}

impl SignatureSetParser {
    /// Create a parser; with `strict` a repeated height is an error instead of last-wins
    pub fn new(mode: ParseMode, strict: bool) -> Self {
        Self { mode, strict }
    }

    /// Parse signer output held in memory
    pub fn parse(&self, text: &str) -> Result<SignatureSet> {
        self.parse_inner(text, None)
    }

    /// Read and parse a signer file
    pub fn parse_file(&self, path: &Path) -> Result<SignatureSet> {
        let text = fs::read_to_string(path).map_err(|e| {
            HeaderSigError::malformed(format!("cannot read {}: {e}", path.display()))
        })?;
        self.parse_inner(&text, Some(path))
    }

    fn parse_inner(&self, text: &str, source: Option<&Path>) -> Result<SignatureSet> {
        let mut set = SignatureSet::new();
        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (height, signatures) = self
                .parse_line(line)
                .map_err(|msg| HeaderSigError::malformed_line(source, line_no, msg))?;

            if set.insert(height, signatures) {
                if self.strict {
                    return Err(HeaderSigError::malformed_line(
                        source,
                        line_no,
                        format!("height {height} appears more than once"),
                    ));
                }
                warn!(height, line = line_no, "Duplicate height in signature set, keeping last");
            }
        }
        Ok(set)
    }

    fn parse_line(&self, line: &str) -> std::result::Result<(u64, Vec<Vec<u8>>), String> {
        let parts: Vec<&str> = line.split(':').collect();
        let shape_ok = match self.mode {
            ParseMode::SingleSigner => parts.len() == 2,
            ParseMode::Combined => parts.len() >= 2,
        };
        if !shape_ok {
            return Err(format!(
                "expected {} but found {} segment(s)",
                match self.mode {
                    ParseMode::SingleSigner => "HEIGHT:SIG",
                    ParseMode::Combined => "HEIGHT:SIG[:SIG...]",
                },
                parts.len()
            ));
        }

        let height = parts[0]
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid height '{}': {e}", parts[0]))?;
        let signatures = parts[1..]
            .iter()
            .map(|part| decode_signature(part))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((height, signatures))
    }
}

fn decode_signature(text: &str) -> std::result::Result<Vec<u8>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty signature".to_string());
    }
    hex::decode(text).map_err(|e| format!("invalid signature hex: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn single() -> SignatureSetParser {
        SignatureSetParser::new(ParseMode::SingleSigner, false)
    }

    #[test]
    fn test_parse_preserves_file_order() {
        let set = single().parse("30:aa\n10:bb\n20:cc\n").unwrap();
        assert_eq!(set.heights().collect::<Vec<_>>(), vec![30, 10, 20]);
        assert_eq!(set.get(10).unwrap(), &[vec![0xbb]]);
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_tolerated() {
        let set = single().parse("\n  100:aabb  \r\n\n").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(100).unwrap(), &[vec![0xaa, 0xbb]]);
    }

    #[test]
    fn test_single_signer_rejects_extra_segments() {
        let err = single().parse("100:aa:bb").unwrap_err();
        assert_matches!(err, HeaderSigError::MalformedInput { .. });
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_rejects_missing_signature_and_bad_height() {
        assert_matches!(single().parse("100"), Err(HeaderSigError::MalformedInput { .. }));
        assert_matches!(single().parse("100:"), Err(HeaderSigError::MalformedInput { .. }));
        assert_matches!(single().parse("ten:aa"), Err(HeaderSigError::MalformedInput { .. }));
        assert_matches!(single().parse("10:zz"), Err(HeaderSigError::MalformedInput { .. }));
    }

    #[test]
    fn test_bad_height_message_is_not_nested() {
        let err = single().parse("ten:aa").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed input: line 1: invalid height 'ten': invalid digit found in string"
        );
    }

    #[test]
    fn test_combined_mode_accepts_many_signatures() {
        let parser = SignatureSetParser::new(ParseMode::Combined, false);
        let set = parser.parse("5:01:02:03").unwrap();
        assert_eq!(set.get(5).unwrap(), &[vec![1], vec![2], vec![3]]);
        assert!(parser.parse("5").is_err());
    }

    #[test]
    fn test_duplicate_height_last_wins_in_place() {
        let set = single().parse("1:aa\n2:bb\n1:cc").unwrap();
        assert_eq!(set.heights().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(set.get(1).unwrap(), &[vec![0xcc]]);
    }

    #[test]
    fn test_duplicate_height_rejected_when_strict() {
        let parser = SignatureSetParser::new(ParseMode::SingleSigner, true);
        let err = parser.parse("1:aa\n1:cc").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signer.txt");
        std::fs::write(&path, "1:aa\nbroken\n").unwrap();
        let err = single().parse_file(&path).unwrap_err();
        assert!(err.to_string().contains("signer.txt:2"));

        let missing = single().parse_file(&dir.path().join("absent.txt"));
        assert_matches!(missing, Err(HeaderSigError::MalformedInput { .. }));
    }
}
