//! Restricted-asset verifier strings.
//!
//! A verifier is a boolean expression over qualifier names:
//!
//! ```text
//! or      := and ( '|' and )*
//! and     := unary ( '&' unary )*
//! unary   := '!' unary | primary
//! primary := '(' or ')' | 'true' | NAME
//! ```
//!
//! Names are written without the `#` prefix and looked up as `#NAME`.

use std::fmt;

use evrd_consensus::constants::{MAX_VERIFIER_STRING_LENGTH, QUALIFIER_PREFIX};

use crate::error::AssetError;
use crate::view::AssetStateView;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerifierError {
    Empty,
    TooLong(usize),
    UnexpectedChar { ch: char, position: usize },
    UnexpectedEnd,
    UnbalancedParens,
}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifierError::Empty => write!(f, "verifier string is empty"),
            VerifierError::TooLong(len) => write!(
                f,
                "verifier string is {len} bytes, limit is {MAX_VERIFIER_STRING_LENGTH}"
            ),
            VerifierError::UnexpectedChar { ch, position } => {
                write!(f, "unexpected '{ch}' at position {position}")
            }
            VerifierError::UnexpectedEnd => write!(f, "unexpected end of verifier string"),
            VerifierError::UnbalancedParens => write!(f, "unbalanced parentheses"),
        }
    }
}

impl std::error::Error for VerifierError {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerifierExpr {
    True,
    Qualifier(String),
    Not(Box<VerifierExpr>),
    And(Box<VerifierExpr>, Box<VerifierExpr>),
    Or(Box<VerifierExpr>, Box<VerifierExpr>),
}

impl VerifierExpr {
    /// Evaluates with short-circuiting; `has_qualifier` receives bare names.
    pub fn evaluate<F>(&self, has_qualifier: &mut F) -> Result<bool, AssetError>
    where
        F: FnMut(&str) -> Result<bool, AssetError>,
    {
        match self {
            VerifierExpr::True => Ok(true),
            VerifierExpr::Qualifier(name) => has_qualifier(name.as_str()),
            VerifierExpr::Not(inner) => Ok(!inner.evaluate(has_qualifier)?),
            VerifierExpr::And(left, right) => {
                Ok(left.evaluate(has_qualifier)? && right.evaluate(has_qualifier)?)
            }
            VerifierExpr::Or(left, right) => {
                Ok(left.evaluate(has_qualifier)? || right.evaluate(has_qualifier)?)
            }
        }
    }

    /// Bare qualifier names referenced, in order of first appearance.
    pub fn qualifier_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            VerifierExpr::True => {}
            VerifierExpr::Qualifier(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
            VerifierExpr::Not(inner) => inner.collect_names(names),
            VerifierExpr::And(left, right) | VerifierExpr::Or(left, right) => {
                left.collect_names(names);
                right.collect_names(names);
            }
        }
    }
}

/// Drops whitespace and every `#`.
pub fn sanitize_verifier(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != QUALIFIER_PREFIX)
        .collect()
}

pub fn parse_verifier(raw: &str) -> Result<VerifierExpr, VerifierError> {
    let sanitized = sanitize_verifier(raw);
    if sanitized.is_empty() {
        return Err(VerifierError::Empty);
    }
    if sanitized.len() > MAX_VERIFIER_STRING_LENGTH {
        return Err(VerifierError::TooLong(sanitized.len()));
    }

    let mut parser = Parser {
        input: sanitized.as_bytes(),
        pos: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(b')') => Err(VerifierError::UnbalancedParens),
        Some(_) => Err(parser.unexpected()),
    }
}

/// Verifies that every qualifier the verifier names has been issued.
pub fn check_verifier_string<V>(view: &V, verifier: &str) -> Result<VerifierExpr, AssetError>
where
    V: AssetStateView + ?Sized,
{
    let expr = parse_verifier(verifier)?;
    for name in expr.qualifier_names() {
        let qualifier = qualifier_name(name);
        if !view.asset_exists(&qualifier)? {
            return Err(AssetError::Rejected(format!(
                "verifier references unknown qualifier {qualifier}"
            )));
        }
    }
    Ok(expr)
}

/// Evaluates `verifier` against the qualifiers tagged on `address`.
pub fn address_satisfies_verifier<V>(
    view: &V,
    verifier: &str,
    address: &str,
) -> Result<bool, AssetError>
where
    V: AssetStateView + ?Sized,
{
    let expr = parse_verifier(verifier)?;
    expr.evaluate(&mut |name: &str| view.has_qualifier(address, &qualifier_name(name)))
}

fn qualifier_name(bare: &str) -> String {
    let mut name = String::with_capacity(bare.len() + 1);
    name.push(QUALIFIER_PREFIX);
    name.push_str(bare);
    name
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'/')
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn unexpected(&self) -> VerifierError {
        match self.peek() {
            Some(byte) => VerifierError::UnexpectedChar {
                ch: char::from(byte),
                position: self.pos,
            },
            None => VerifierError::UnexpectedEnd,
        }
    }

    fn parse_or(&mut self) -> Result<VerifierExpr, VerifierError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(b'|') {
            self.pos += 1;
            let right = self.parse_and()?;
            left = VerifierExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<VerifierExpr, VerifierError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(b'&') {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = VerifierExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<VerifierExpr, VerifierError> {
        if self.peek() == Some(b'!') {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(VerifierExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<VerifierExpr, VerifierError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    None => Err(VerifierError::UnbalancedParens),
                    Some(_) => Err(self.unexpected()),
                }
            }
            Some(byte) if is_name_byte(byte) => {
                let start = self.pos;
                while self.peek().is_some_and(is_name_byte) {
                    self.pos += 1;
                }
                // The input came from a &str and names are ASCII.
                let word = String::from_utf8_lossy(&self.input[start..self.pos]);
                if word == "true" {
                    Ok(VerifierExpr::True)
                } else {
                    Ok(VerifierExpr::Qualifier(word.into_owned()))
                }
            }
            _ => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::testing::FixedView;

    fn tagged(address: &str, qualifiers: &[&str]) -> FixedView {
        let mut view = FixedView::default();
        for qualifier in qualifiers {
            view.assets.insert(qualifier.to_string());
            view.qualifiers
                .insert((address.to_string(), qualifier.to_string()));
        }
        view
    }

    #[test]
    fn sanitize_strips_whitespace_and_tags() {
        assert_eq!(sanitize_verifier(" #KYC & !#BANNED "), "KYC&!BANNED");
    }

    #[test]
    fn precedence_and_binds_tighter() {
        let expr = parse_verifier("A|B&C").expect("parse");
        assert_eq!(
            expr,
            VerifierExpr::Or(
                Box::new(VerifierExpr::Qualifier("A".into())),
                Box::new(VerifierExpr::And(
                    Box::new(VerifierExpr::Qualifier("B".into())),
                    Box::new(VerifierExpr::Qualifier("C".into())),
                )),
            )
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_verifier("  "), Err(VerifierError::Empty));
        assert_eq!(parse_verifier("(A&B"), Err(VerifierError::UnbalancedParens));
        assert_eq!(parse_verifier("A&B)"), Err(VerifierError::UnbalancedParens));
        assert_eq!(parse_verifier("A&"), Err(VerifierError::UnexpectedEnd));
        assert_eq!(
            parse_verifier("A+B"),
            Err(VerifierError::UnexpectedChar { ch: '+', position: 1 })
        );
        assert_eq!(
            parse_verifier(&"A".repeat(81)),
            Err(VerifierError::TooLong(81))
        );
    }

    #[test]
    fn evaluates_against_address_tags() {
        let view = tagged("addr", &["#KYC", "#KYC/US"]);
        assert_eq!(address_satisfies_verifier(&view, "true", "addr"), Ok(true));
        assert_eq!(address_satisfies_verifier(&view, "#KYC", "addr"), Ok(true));
        assert_eq!(address_satisfies_verifier(&view, "KYC/US & !BANNED", "addr"), Ok(true));
        assert_eq!(address_satisfies_verifier(&view, "KYC & BANNED", "addr"), Ok(false));
        assert_eq!(address_satisfies_verifier(&view, "(BANNED | KYC) & !(KYC/EU)", "addr"), Ok(true));
        assert_eq!(address_satisfies_verifier(&view, "KYC", "other"), Ok(false));
    }

    #[test]
    fn unknown_qualifier_rejected() {
        let view = tagged("addr", &["#KYC"]);
        assert!(check_verifier_string(&view, "KYC").is_ok());
        assert!(matches!(
            check_verifier_string(&view, "KYC & MISSING"),
            Err(AssetError::Rejected(_))
        ));
        assert_eq!(
            check_verifier_string(&view, "true").map(|expr| expr.qualifier_names().len()),
            Ok(0)
        );
    }
}
