//! Bracket scanning over raw line text.
//!
//! The scanner is deliberately tolerant: it never fails on invalid JSON. String literals (with
//! backslash escapes) are skipped, so brackets inside them are ignored, and an unterminated string
//! simply runs to the end of its line.

/// A lexical token relevant to bracket matching and key tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{` or `[` at a char column.
    Open {
        /// The bracket character.
        bracket: char,
        /// Char column of the bracket.
        column: usize,
    },
    /// `}` or `]` at a char column.
    Close {
        /// The bracket character.
        bracket: char,
        /// Char column of the bracket.
        column: usize,
    },
    /// A string literal. `value` is the raw (still escaped) content between the quotes.
    Str {
        /// Raw string content.
        value: String,
        /// Char column of the opening quote.
        column: usize,
    },
    /// `:`
    Colon,
    /// `,`
    Comma,
}

/// Closing bracket for an opening one.
pub fn closing_for(open: char) -> Option<char> {
    match open {
        '{' => Some('}'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Tokenize one line. Everything that is not a bracket, string, colon or comma is skipped.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().enumerate();

    while let Some((column, ch)) = chars.next() {
        match ch {
            '"' => {
                let mut value = String::new();
                let mut escaped = false;
                for (_, c) in chars.by_ref() {
                    if escaped {
                        value.push(c);
                        escaped = false;
                    } else if c == '\\' {
                        value.push(c);
                        escaped = true;
                    } else if c == '"' {
                        break;
                    } else {
                        value.push(c);
                    }
                }
                tokens.push(Token::Str { value, column });
            }
            '{' | '[' => tokens.push(Token::Open {
                bracket: ch,
                column,
            }),
            '}' | ']' => tokens.push(Token::Close {
                bracket: ch,
                column,
            }),
            ':' => tokens.push(Token::Colon),
            ',' => tokens.push(Token::Comma),
            _ => {}
        }
    }

    tokens
}

/// Count unescaped open/close brackets of the kind given by `open` on a line.
///
/// Returns `(opens, closes)`. Brackets inside string literals are ignored.
pub fn count_brackets(line: &str, open: char) -> (usize, usize) {
    let Some(close) = closing_for(open) else {
        return (0, 0);
    };

    tokenize_line(line)
        .iter()
        .fold((0, 0), |(opens, closes), token| match token {
            Token::Open { bracket, .. } if *bracket == open => (opens + 1, closes),
            Token::Close { bracket, .. } if *bracket == close => (opens, closes + 1),
            _ => (opens, closes),
        })
}

/// Whether every bracket of both kinds is matched, in the right order, across all lines.
pub fn is_balanced(lines: &[String]) -> bool {
    for open in ['{', '['] {
        let (opens, closes) = lines.iter().fold((0, 0), |(o, c), line| {
            let (lo, lc) = count_brackets(line, open);
            (o + lo, c + lc)
        });
        if opens != closes {
            return false;
        }
    }

    let mut stack: Vec<char> = Vec::new();
    for line in lines {
        for token in tokenize_line(line) {
            match token {
                Token::Open { bracket, .. } => stack.push(bracket),
                Token::Close { bracket, .. } => {
                    let Some(open) = stack.pop() else {
                        return false;
                    };
                    if closing_for(open) != Some(bracket) {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    stack.is_empty()
}

/// Find the line holding the bracket that closes the first `open` bracket on `start_line`.
///
/// Runs a balance counter from that bracket across the following lines. Returns `None` when the
/// buffer ends before the bracket is balanced, or when `start_line` has no such bracket.
pub fn find_closing_line(lines: &[String], start_line: usize, open: char) -> Option<usize> {
    let close = closing_for(open)?;
    let mut depth = 0usize;
    let mut started = false;

    for (line_idx, line) in lines.iter().enumerate().skip(start_line) {
        for token in tokenize_line(line) {
            match token {
                Token::Open { bracket, .. } if bracket == open => {
                    depth += 1;
                    started = true;
                }
                Token::Close { bracket, .. } if bracket == close && started => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(line_idx);
                    }
                }
                _ => {}
            }
        }

        if !started {
            return None;
        }
    }

    None
}
