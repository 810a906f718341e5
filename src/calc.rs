//! Arithmetic for the `calc` command.

const ALLOWED_CHARS: &str = "0123456789+-*/().% ";
const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum EvalError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected '{found}' at {pos}")]
    Unexpected { found: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("parentheses nested too deeply")]
    TooDeep,
}

/// Evaluates an expression that already passed [`is_whitelisted`].
pub(crate) trait Evaluator {
    fn evaluate(&self, expr: &str) -> Result<f64, EvalError>;
}

/// True when every character is a digit, operator, parenthesis, decimal
/// point, percent or space.
pub(crate) fn is_whitelisted(expr: &str) -> bool {
    expr.chars().all(|ch| ALLOWED_CHARS.contains(ch))
}

/// In-process evaluator for `+ - * / %`, unary sign and parentheses.
#[derive(Debug, Default)]
pub(crate) struct ArithmeticEvaluator;

impl Evaluator for ArithmeticEvaluator {
    fn evaluate(&self, expr: &str) -> Result<f64, EvalError> {
        let mut parser = Parser::new(expr);
        parser.skip_spaces();
        if parser.peek().is_none() {
            return Err(EvalError::Empty);
        }
        let value = parser.expr()?;
        parser.skip_spaces();
        if let Some((pos, found)) = parser.peek_with_pos() {
            return Err(EvalError::Unexpected { found, pos });
        }
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NotFinite)
        }
    }
}

struct Parser {
    chars: Vec<(usize, char)>,
    idx: usize,
    depth: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.char_indices().collect(),
            idx: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|(_, ch)| *ch)
    }

    fn peek_with_pos(&self) -> Option<(usize, char)> {
        self.chars.get(self.idx).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(' ') {
            self.idx += 1;
        }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.term()?;
        loop {
            self.skip_spaces();
            match self.peek() {
                Some('+') => {
                    self.idx += 1;
                    acc += self.term()?;
                }
                Some('-') => {
                    self.idx += 1;
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut acc = self.factor()?;
        loop {
            self.skip_spaces();
            match self.peek() {
                Some('*') => {
                    self.idx += 1;
                    acc *= self.factor()?;
                }
                Some('/') => {
                    self.idx += 1;
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    acc /= rhs;
                }
                Some('%') => {
                    self.idx += 1;
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    acc %= rhs;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        let mut negate = false;
        loop {
            self.skip_spaces();
            match self.peek() {
                Some('-') => negate = !negate,
                Some('+') => {}
                _ => break,
            }
            self.idx += 1;
        }
        let value = self.primary()?;
        Ok(if negate { -value } else { value })
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.peek_with_pos() {
            Some((_, '(')) => {
                if self.depth >= MAX_NESTING {
                    return Err(EvalError::TooDeep);
                }
                self.idx += 1;
                self.depth += 1;
                let value = self.expr()?;
                self.depth -= 1;
                self.skip_spaces();
                match self.peek_with_pos() {
                    Some((_, ')')) => {
                        self.idx += 1;
                        Ok(value)
                    }
                    Some((pos, found)) => Err(EvalError::Unexpected { found, pos }),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some((_, ch)) if ch.is_ascii_digit() || ch == '.' => self.number(),
            Some((pos, found)) => Err(EvalError::Unexpected { found, pos }),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.idx;
        let mut text = String::new();
        let mut seen_dot = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                text.push(ch);
            } else {
                break;
            }
            self.idx += 1;
        }
        if text == "." {
            let (pos, found) = self.chars[start];
            return Err(EvalError::Unexpected { found, pos });
        }
        text.parse::<f64>().map_err(|_| {
            let (pos, found) = self.chars[start];
            EvalError::Unexpected { found, pos }
        })
    }
}

/// Formats like C's `%g`: six significant digits, trailing zeros removed,
/// exponent form for very small or large magnitudes.
pub(crate) fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sci = format!("{value:.5e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exp) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }
    let decimals = (5 - exp).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<f64, EvalError> {
        ArithmeticEvaluator.evaluate(expr)
    }

    #[test]
    fn whitelist_rejects_letters() {
        assert!(!is_whitelisted("2+a"));
        assert!(!is_whitelisted("__import__('os')"));
        assert!(is_whitelisted("(1.5 + 2) * 3 % 2"));
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(eval("2+3*4"), Ok(14.0));
        assert_eq!(eval("(2+3)*4"), Ok(20.0));
        assert_eq!(eval(" 10 / 4 "), Ok(2.5));
        assert_eq!(eval("-3 + +5"), Ok(2.0));
        assert_eq!(eval("7 % 4"), Ok(3.0));
        assert_eq!(eval(".5*2"), Ok(1.0));
    }

    #[test]
    fn malformed_expressions_are_errors() {
        assert_eq!(eval(""), Err(EvalError::Empty));
        assert_eq!(eval("2+"), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("(1+2"), Err(EvalError::UnexpectedEnd));
        assert_eq!(eval("1/0"), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("2 3"), Err(EvalError::Unexpected { found: '3', .. })));
        assert!(matches!(eval("1..2"), Err(EvalError::Unexpected { .. })));
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let levels = 100_000;
        let nested = format!("{}1{}", "(".repeat(levels), ")".repeat(levels));
        assert_eq!(eval(&nested), Err(EvalError::TooDeep));

        let signs = format!("{}1", "-".repeat(200_001));
        assert_eq!(eval(&signs), Ok(-1.0));

        let shallow = format!("{}7{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(eval(&shallow), Ok(7.0));
    }

    #[test]
    fn general_format_matches_printf_g() {
        assert_eq!(format_general(14.0), "14");
        assert_eq!(format_general(2.5), "2.5");
        assert_eq!(format_general(1.0 / 3.0), "0.333333");
        assert_eq!(format_general(1234567.0), "1.23457e+06");
        assert_eq!(format_general(0.0001), "0.0001");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(-42.0), "-42");
    }
}
