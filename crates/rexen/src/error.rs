use thiserror::Error;

/// What went wrong while compiling a pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("pattern too short")]
    TooShort,
    #[error("missing closing separator")]
    UnterminatedPattern,
    #[error("invalid flags '{letters}'")]
    InvalidFlags { letters: String },
    #[error("unterminated group, missing ')'")]
    UnterminatedGroup,
    #[error("unbalanced ')'")]
    UnbalancedParen,
    #[error("unterminated character class, missing ']'")]
    UnterminatedClass,
    #[error("invalid range '{lo}-{hi}' in character class")]
    InvalidRange { lo: char, hi: char },
    #[error("capture group name must be followed by '('")]
    MissingCaptureParen,
    #[error("unterminated capture group, missing ')'")]
    UnterminatedCapture,
    #[error("unterminated name, missing '>'")]
    UnterminatedName,
    #[error("name may not be empty")]
    EmptyName,
    #[error("name may not consist solely of digits")]
    NumericName,
    #[error("invalid character '{0}' in name")]
    InvalidNameChar(char),
    #[error("capture name 'complete' is reserved")]
    ReservedName,
    #[error("'@' must be followed by '<name>' or ':<name>'")]
    MalformedCapture,
    #[error("operator '|' cannot be the first element")]
    LeadingAlternation,
    #[error("operator '|' must be followed by an alternative")]
    MissingAlternative,
    #[error("quantifier has nothing to repeat")]
    MissingQuantifierTarget,
    #[error("term is already quantified")]
    DoubleQuantifier,
    #[error("anchors cannot be quantified")]
    UnquantifiableTerm,
    #[error("malformed quantifier, expected digits or ','")]
    MalformedQuantifier,
    #[error("unterminated quantifier, missing '}}'")]
    UnterminatedQuantifier,
    #[error("invalid quantifier range {{{min},{max}}}")]
    InvalidQuantifierRange { min: usize, max: usize },
    #[error("operator '!' must be followed by a term")]
    MissingNegationOperand,
    #[error("character classes cannot be negated with '!', negate the class instead")]
    NegatedClass,
    #[error("pattern ends with '\\'")]
    TrailingEscape,
    #[error("pattern nested too deeply")]
    NestingTooDeep,
}

/// A pattern failed to compile.
///
/// `position` is the codepoint offset of the offending character within the
/// full pattern text, separators included.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at position {position}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub position: usize,
}

impl CompileError {
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        CompileError { kind, position }
    }

    /// Renders the error under the pattern text with a caret pointing at the
    /// offending codepoint.
    pub fn render(&self, source: &str) -> String {
        let line: String = source
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        let column = self.position.min(line.chars().count());
        format!("{}\n{}\n{}^", self, line, " ".repeat(column))
    }
}

/// A replacement template is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated capture reference at position {position}")]
    UnterminatedName { position: usize },
    #[error("'@' must be followed by '<name>' or '@' at position {position}")]
    InvalidEscape { position: usize },
}
