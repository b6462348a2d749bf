// Replacement templates
// `@<name>` inserts a capture, `@@` a literal '@', everything else is copied

use smol_str::SmolStr;

use crate::captures::Match;
use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Capture(SmolStr),
}

/// A parsed replacement template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(template: &str) -> Result<Template, TemplateError> {
        let chars: Vec<char> = template.chars().collect();
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c != '@' {
                text.push(c);
                i += 1;
                continue;
            }

            match chars.get(i + 1) {
                Some('@') => {
                    text.push('@');
                    i += 2;
                }
                Some('<') => {
                    let start = i + 2;
                    let len = chars[start..]
                        .iter()
                        .position(|&c| c == '>')
                        .ok_or(TemplateError::UnterminatedName { position: i })?;
                    if !text.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut text)));
                    }
                    let name: SmolStr = chars[start..start + len].iter().copied().collect();
                    pieces.push(Piece::Capture(name));
                    i = start + len + 1;
                }
                _ => return Err(TemplateError::InvalidEscape { position: i }),
            }
        }

        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        Ok(Template { pieces })
    }

    /// Appends the expansion of the template for `m` to `out`. Captures that
    /// did not participate expand to nothing.
    pub fn expand(&self, m: &Match<'_>, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Capture(name) => {
                    if let Some(text) = m.get(name) {
                        out.push_str(text);
                    }
                }
            }
        }
    }
}
