//! The constrained arithmetic grammar formulas are reduced to.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := ('+' | '-')* primary
//! primary := number | '(' expr ')'
//! number  := digits ('.' digits)? | '.' digits
//! ```
//!
//! Whitespace is insignificant. Anything else (identifiers, function calls,
//! stray punctuation) is rejected before evaluation.

use std::fmt;

use thiserror::Error;

/// Nesting beyond this is rejected instead of recursing further.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
  #[error("empty expression")]
  Empty,

  #[error("unexpected character '{ch}' at offset {offset}")]
  UnexpectedChar { ch: char, offset: usize },

  #[error("malformed number at offset {0}")]
  MalformedNumber(usize),

  #[error("unexpected {found} at offset {offset}")]
  UnexpectedToken { found: String, offset: usize },

  #[error("unexpected end of expression")]
  UnexpectedEnd,

  #[error("expression nested too deeply")]
  TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
  Num(f64),
  Plus,
  Minus,
  Star,
  Slash,
  LParen,
  RParen,
}

impl fmt::Display for Tok {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Tok::Num(n) => write!(f, "number {}", n),
      Tok::Plus => f.write_str("'+'"),
      Tok::Minus => f.write_str("'-'"),
      Tok::Star => f.write_str("'*'"),
      Tok::Slash => f.write_str("'/'"),
      Tok::LParen => f.write_str("'('"),
      Tok::RParen => f.write_str("')'"),
    }
  }
}

fn scan_digits(bytes: &[u8], mut pos: usize) -> usize {
  while pos < bytes.len() && bytes[pos].is_ascii_digit() {
    pos += 1;
  }
  pos
}

fn tokenize(text: &str) -> Result<Vec<(Tok, usize)>, GrammarError> {
  let bytes = text.as_bytes();
  let mut tokens = Vec::new();
  let mut pos = 0;

  while pos < bytes.len() {
    let start = pos;
    let tok = match bytes[pos] {
      b if b.is_ascii_whitespace() => {
        pos += 1;
        continue;
      }
      b'0'..=b'9' | b'.' => {
        let int_end = scan_digits(bytes, pos);
        pos = int_end;
        if pos < bytes.len() && bytes[pos] == b'.' {
          let frac_end = scan_digits(bytes, pos + 1);
          // Both `1.` and a lone `.` lack the mandatory digits after the point.
          if frac_end == pos + 1 {
            return Err(GrammarError::MalformedNumber(start));
          }
          pos = frac_end;
        }
        let n = text[start..pos]
          .parse::<f64>()
          .map_err(|_| GrammarError::MalformedNumber(start))?;
        tokens.push((Tok::Num(n), start));
        continue;
      }
      b'+' => Tok::Plus,
      b'-' => Tok::Minus,
      b'*' => Tok::Star,
      b'/' => Tok::Slash,
      b'(' => Tok::LParen,
      b')' => Tok::RParen,
      _ => {
        let ch = text[pos..].chars().next().unwrap_or('\u{fffd}');
        return Err(GrammarError::UnexpectedChar { ch, offset: pos });
      }
    };
    tokens.push((tok, start));
    pos += 1;
  }

  Ok(tokens)
}

struct Parser {
  tokens: Vec<(Tok, usize)>,
  pos: usize,
  depth: usize,
}

impl Parser {
  fn peek(&self) -> Option<Tok> {
    self.tokens.get(self.pos).map(|(t, _)| *t)
  }

  fn unexpected(&self) -> GrammarError {
    match self.tokens.get(self.pos) {
      Some((tok, offset)) => GrammarError::UnexpectedToken {
        found: tok.to_string(),
        offset: *offset,
      },
      None => GrammarError::UnexpectedEnd,
    }
  }

  // Values are folded as they are parsed, so operator chains cost no recursion.
  fn expr(&mut self) -> Result<f64, GrammarError> {
    let mut acc = self.term()?;
    loop {
      match self.peek() {
        Some(Tok::Plus) => {
          self.pos += 1;
          acc += self.term()?;
        }
        Some(Tok::Minus) => {
          self.pos += 1;
          acc -= self.term()?;
        }
        _ => return Ok(acc),
      }
    }
  }

  fn term(&mut self) -> Result<f64, GrammarError> {
    let mut acc = self.factor()?;
    loop {
      match self.peek() {
        Some(Tok::Star) => {
          self.pos += 1;
          acc *= self.factor()?;
        }
        Some(Tok::Slash) => {
          self.pos += 1;
          acc /= self.factor()?;
        }
        _ => return Ok(acc),
      }
    }
  }

  fn factor(&mut self) -> Result<f64, GrammarError> {
    let mut negate = false;
    loop {
      match self.peek() {
        Some(Tok::Plus) => self.pos += 1,
        Some(Tok::Minus) => {
          negate = !negate;
          self.pos += 1;
        }
        _ => break,
      }
    }
    let primary = self.primary()?;
    Ok(if negate { -primary } else { primary })
  }

  fn primary(&mut self) -> Result<f64, GrammarError> {
    match self.peek() {
      Some(Tok::Num(n)) => {
        self.pos += 1;
        Ok(n)
      }
      Some(Tok::LParen) => {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
          return Err(GrammarError::TooDeep);
        }
        self.pos += 1;
        let inner = self.expr()?;
        if self.peek() != Some(Tok::RParen) {
          return Err(self.unexpected());
        }
        self.pos += 1;
        self.depth -= 1;
        Ok(inner)
      }
      _ => Err(self.unexpected()),
    }
  }
}

/// Parse `text` against the arithmetic grammar, consuming all of it, and
/// compute its value. Division by zero yields a non-finite result, not an error.
pub fn evaluate(text: &str) -> Result<f64, GrammarError> {
  let tokens = tokenize(text)?;
  if tokens.is_empty() {
    return Err(GrammarError::Empty);
  }

  let mut parser = Parser { tokens, pos: 0, depth: 0 };
  let value = parser.expr()?;
  if parser.pos < parser.tokens.len() {
    return Err(parser.unexpected());
  }
  Ok(value)
}
