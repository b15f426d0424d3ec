// src/parse.rs
//
// Parsers for the plain-text output of RNAfold and RNAsubopt.
//
// Example RNAfold output (stdin without a FASTA header):
//   GGGAAACCC
//   (((...))) ( -1.20)
//
// Example RNAsubopt -e 5.0 output:
//   GGGAAACCC  -1.20   5.00
//   (((...)))  -1.20
//   .........   0.00
//

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, PredictResult};

/// MFE structure and its energy. An empty structure means the fold tool
/// printed nothing we recognised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub structure: String,
    /// kcal/mol
    pub mfe: f64,
}

/// One alternative structure from the suboptimal enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suboptimal {
    pub structure: String,
    /// kcal/mol
    pub energy: f64,
}

const DOT_BRACKET_CHARS: &[char] = &['(', ')', '.', '[', ']', '{', '}', '<', '>'];

fn is_dot_bracket(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| DOT_BRACKET_CHARS.contains(&c))
}

/// Split `"<dot-bracket> (<energy>)"` into its two halves.
fn split_structure_line(line: &str) -> Option<(&str, &str)> {
    let space_idx = line.find(' ')?;
    let (structure, rest) = (&line[..space_idx], line[space_idx + 1..].trim());
    if is_dot_bracket(structure) && rest.starts_with('(') {
        Some((structure, rest))
    } else {
        None
    }
}

/// Pull the MFE structure and energy out of fold-tool stdout.
///
/// Lines echoing `sequence` are skipped; the first structure line wins. When no
/// structure line is present the default (empty structure, 0.0) is returned so
/// a failed tool degrades into an empty result.
pub fn parse_fold_output(text: &str, sequence: &str) -> PredictResult<FoldResult> {
    for line in text.lines() {
        if !sequence.is_empty() && line.starts_with(sequence) {
            continue;
        }
        if let Some((structure, energy)) = split_structure_line(line.trim_end()) {
            let energy = energy.trim_matches(|c| c == '(' || c == ')').trim();
            let mfe = energy.parse::<f64>().map_err(|e| PredictError::Parse {
                what: "minimum free energy",
                detail: format!("{:?}: {}", energy, e),
            })?;
            return Ok(FoldResult {
                structure: structure.to_string(),
                mfe,
            });
        }
    }
    Ok(FoldResult::default())
}

/// Collect `structure energy` pairs in output order.
///
/// Headers (`>`), blank lines, and anything that is not exactly two tokens with
/// a numeric second token are skipped.
pub fn parse_subopt_output(text: &str) -> Vec<Suboptimal> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('>'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let structure = parts.next()?;
            let energy = parts.next()?;
            if parts.next().is_some() {
                return None;
            }
            let energy = energy.parse::<f64>().ok()?;
            Some(Suboptimal {
                structure: structure.to_string(),
                energy,
            })
        })
        .collect()
}
