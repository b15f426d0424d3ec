// src/structure.rs
//
// Decoding of dot-bracket strings into a pair table. The pipeline never needs
// this to run; it only feeds the base-pair count in the run summary and the
// length check against the input sequence.
//

use std::fmt;

/// Why a dot-bracket string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotBracketError {
    /// A ')' at this 1-based position has no opening partner.
    UnmatchedClose(usize),
    /// This many '(' were never closed.
    UnmatchedOpen(usize),
    /// Unsupported character at this 1-based position.
    UnexpectedChar(char, usize),
}

impl fmt::Display for DotBracketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DotBracketError::UnmatchedClose(pos) => {
                write!(f, "unbalanced: ')' at position {} has no partner", pos)
            }
            DotBracketError::UnmatchedOpen(n) => write!(f, "unbalanced: {} '(' left unmatched", n),
            DotBracketError::UnexpectedChar(c, pos) => {
                write!(f, "unexpected character {:?} at position {}", c, pos)
            }
        }
    }
}

impl std::error::Error for DotBracketError {}

/// For each 1-based position, the 1-based partner or 0 if unpaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTable {
    partners: Vec<usize>,
}

impl PairTable {
    /// Parse a plain `(`/`)`/`.` structure.
    pub fn from_dot_bracket(db: &str) -> Result<Self, DotBracketError> {
        let mut stack = Vec::new();
        let mut partners = vec![0; db.chars().count()];

        for (i, ch) in db.chars().enumerate() {
            let pos = i + 1;
            match ch {
                '(' => stack.push(pos),
                ')' => {
                    let opening = stack.pop().ok_or(DotBracketError::UnmatchedClose(pos))?;
                    partners[opening - 1] = pos;
                    partners[i] = opening;
                }
                '.' => {}
                other => return Err(DotBracketError::UnexpectedChar(other, pos)),
            }
        }
        if !stack.is_empty() {
            return Err(DotBracketError::UnmatchedOpen(stack.len()));
        }
        Ok(Self { partners })
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    pub fn pair_count(&self) -> usize {
        self.partners.iter().filter(|&&p| p != 0).count() / 2
    }
}
