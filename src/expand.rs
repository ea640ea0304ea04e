//! Filename wildcard expansion.
//!
//! Every [`Token::Pattern`] is matched against the filesystem relative to the
//! working directory and replaced in place by the matching paths. A pattern
//! that matches nothing is kept as a single literal word.

use std::path::Path;

use glob::MatchOptions;
use tracing::{debug, trace};

use crate::errors::{Result, ShellError};
use crate::lexer::Token;

const WILDCARDS: [char; 3] = ['*', '?', '['];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Whether `word` contains a glob metacharacter.
pub fn has_wildcard(word: &str) -> bool {
    word.contains(WILDCARDS)
}

/// Expand all pattern tokens against `cwd`.
///
/// Operators and plain words keep their positions. The word following a
/// redirection operator is a file name and is never expanded.
pub fn expand_wildcards(tokens: Vec<Token>, cwd: &Path) -> Result<Vec<Token>> {
    let mut expanded = Vec::with_capacity(tokens.len());
    let mut after_redirect = false;

    for token in tokens {
        let is_redirect = token.is_redirect();
        match token {
            Token::Pattern(pattern) if !after_redirect => {
                let matches = expand_pattern(&pattern, cwd)?;
                expanded.extend(matches.into_iter().map(Token::Word));
            }
            Token::Pattern(pattern) => expanded.push(Token::Word(pattern)),
            other => expanded.push(other),
        }
        after_redirect = is_redirect;
    }

    Ok(expanded)
}

/// Expand a single pattern.
///
/// Relative patterns are matched below `cwd` and reported relative to it.
/// Results come back in the matcher's sorted enumeration order.
pub fn expand_pattern(pattern: &str, cwd: &Path) -> Result<Vec<String>> {
    let relative = Path::new(pattern).is_relative();
    let full_pattern = if relative {
        let base = glob::Pattern::escape(&cwd.to_string_lossy());
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    } else {
        pattern.to_string()
    };

    let paths = match glob::glob_with(&full_pattern, MATCH_OPTIONS) {
        Ok(paths) => paths,
        Err(e) => {
            debug!(pattern, error = %e, "malformed pattern kept literally");
            return Ok(vec![pattern.to_string()]);
        }
    };

    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|source| ShellError::Expand {
            pattern: pattern.to_string(),
            source,
        })?;
        let shown = if relative {
            path.strip_prefix(cwd).unwrap_or(&path).to_path_buf()
        } else {
            path
        };
        matches.push(shown.to_string_lossy().into_owned());
    }

    if matches.is_empty() {
        trace!(pattern, "no match, passing pattern through");
        matches.push(pattern.to_string());
    } else {
        trace!(pattern, count = matches.len(), "pattern expanded");
    }
    Ok(matches)
}
