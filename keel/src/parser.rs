//! Expression parser
//!
//! Precedence levels over string slices: each level looks for its
//! operators outside quotes and brackets and splits the input there.
//! From loosest to tightest: comparison, additive, multiplicative, unary,
//! primary.

use crate::ast::{BinOp, Expr, UnaryOp};
use keel_core::KeelError;

/// Parse a complete expression
pub fn parse_expr(input: &str) -> Result<Expr, KeelError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(KeelError::parse_error("Empty expression"));
    }

    parse_comparison(input)
}

/// Characters of `input` paired with whether each one sits outside every
/// quote, parenthesis and bracket
fn scan(input: &str) -> Result<Vec<(usize, char, bool)>, KeelError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = Vec::with_capacity(input.len());

    for (pos, c) in input.char_indices() {
        let outside = depth == 0 && quote.is_none();
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| KeelError::parse_error(format!("Unbalanced '{}' in '{}'", c, input)))?;
            }
            _ => {}
        }
        chars.push((pos, c, outside));
    }

    if quote.is_some() {
        return Err(KeelError::parse_error(format!("Unterminated string in '{}'", input)));
    }
    if depth != 0 {
        return Err(KeelError::parse_error(format!("Unclosed bracket in '{}'", input)));
    }
    Ok(chars)
}

fn missing_operand(op: BinOp) -> KeelError {
    KeelError::parse_error(format!("'{}' needs an operand on each side", op.symbol()))
}

/// Comparisons do not chain: `a < b < c` is rejected
fn parse_comparison(input: &str) -> Result<Expr, KeelError> {
    let chars = scan(input)?;

    for (i, &(pos, c, outside)) in chars.iter().enumerate() {
        if !outside {
            continue;
        }
        let next = chars.get(i + 1).map(|&(_, n, _)| n);
        let (op, len) = match (c, next) {
            ('<', Some('=')) => (BinOp::Le, 2),
            ('>', Some('=')) => (BinOp::Ge, 2),
            ('!', Some('=')) => (BinOp::Ne, 2),
            ('<', _) => (BinOp::Lt, 1),
            ('>', _) => (BinOp::Gt, 1),
            ('=', _) => (BinOp::Eq, 1),
            _ => continue,
        };

        let left = input[..pos].trim();
        let right = input[pos + len..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(missing_operand(op));
        }
        return Ok(Expr::BinaryOp(
            Box::new(parse_additive(left)?),
            op,
            Box::new(parse_additive(right)?),
        ));
    }

    parse_additive(input)
}

fn parse_additive(input: &str) -> Result<Expr, KeelError> {
    let chars = scan(input)?;

    // rightmost split keeps the operators left associative
    for &(pos, c, outside) in chars.iter().skip(1).rev() {
        if !outside || !matches!(c, '+' | '-') {
            continue;
        }
        let left = input[..pos].trim_end();
        // a sign, not an operator: `2 * -3`, `1e-5`
        if left.ends_with(['+', '-', '*', '/']) || is_exponent(left) {
            continue;
        }

        let op = if c == '+' { BinOp::Add } else { BinOp::Sub };
        let right = input[pos + 1..].trim();
        if right.is_empty() {
            return Err(missing_operand(op));
        }
        return Ok(Expr::BinaryOp(
            Box::new(parse_additive(left)?),
            op,
            Box::new(parse_multiplicative(right)?),
        ));
    }

    parse_multiplicative(input)
}

/// Whether `left` ends in the `1e` of a number like `1e-5`
fn is_exponent(left: &str) -> bool {
    let start = left
        .char_indices()
        .rev()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let token = &left[start..];
    token.starts_with(|c: char| c.is_ascii_digit()) && token.ends_with(['e', 'E'])
}

fn parse_multiplicative(input: &str) -> Result<Expr, KeelError> {
    let chars = scan(input)?;

    for &(pos, c, outside) in chars.iter().rev() {
        if !outside || !matches!(c, '*' | '/') {
            continue;
        }
        let op = if c == '*' { BinOp::Mul } else { BinOp::Div };
        let left = input[..pos].trim();
        let right = input[pos + 1..].trim();
        if left.is_empty() || right.is_empty() {
            return Err(missing_operand(op));
        }
        return Ok(Expr::BinaryOp(
            Box::new(parse_multiplicative(left)?),
            op,
            Box::new(parse_unary(right)?),
        ));
    }

    parse_unary(input)
}

fn parse_unary(input: &str) -> Result<Expr, KeelError> {
    match input.strip_prefix('-') {
        Some(rest) => Ok(Expr::UnaryOp(UnaryOp::Neg, Box::new(parse_unary(rest.trim_start())?))),
        None => parse_primary(input),
    }
}

fn parse_primary(input: &str) -> Result<Expr, KeelError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(KeelError::parse_error("Missing operand"));
    }

    if let Some(text) = quoted(input) {
        return Ok(Expr::Text(text.to_string()));
    }

    // List literal: [a, b, c]
    if let Some(inner) = enclosed(input, '[', ']')? {
        return Ok(Expr::List(parse_items(inner)?));
    }

    // Parentheses
    if let Some(inner) = enclosed(input, '(', ')')? {
        return parse_expr(inner);
    }

    match input {
        "true" => return Ok(Expr::Bool(true)),
        "false" => return Ok(Expr::Bool(false)),
        "null" => return Ok(Expr::Null),
        _ => {}
    }

    // Number
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return if input.parse::<f64>().is_ok() {
            Ok(Expr::Number(input.to_string()))
        } else {
            Err(KeelError::parse_error(format!("Invalid number '{}'", input)))
        };
    }

    if let Some(open) = input.find('(') {
        return parse_call(input, open);
    }

    // Variable, possibly dotted for record fields
    Ok(Expr::Variable(parse_path(input)?))
}

/// `name(args)`, optionally followed by `.field` reads
fn parse_call(input: &str, open: usize) -> Result<Expr, KeelError> {
    let name = input[..open].trim();
    if !is_identifier(name) {
        return Err(KeelError::parse_error(format!("Invalid function name '{}'", name)));
    }

    // the call's closing parenthesis is the last character before the
    // scan comes back to depth zero
    let chars = scan(input)?;
    let close = chars
        .iter()
        .skip_while(|&&(pos, _, _)| pos <= open)
        .take_while(|&&(_, _, outside)| !outside)
        .last()
        .map(|&(pos, _, _)| pos)
        .ok_or_else(|| KeelError::parse_error(format!("Unclosed call to '{}'", name)))?;

    let call = Expr::FunctionCall(name.to_string(), parse_items(&input[open + 1..close])?);

    let tail = input[close + 1..].trim();
    if tail.is_empty() {
        return Ok(call);
    }
    match tail.strip_prefix('.') {
        Some(fields) => Ok(Expr::FieldAccess(Box::new(call), parse_path(fields)?)),
        None => Err(KeelError::parse_error(format!("Unexpected '{}' after call to '{}'", tail, name))),
    }
}

fn parse_path(input: &str) -> Result<Vec<String>, KeelError> {
    input
        .split('.')
        .map(|part| {
            let part = part.trim();
            if is_identifier(part) {
                Ok(part.to_string())
            } else {
                Err(KeelError::parse_error(format!("Unexpected input '{}'", input)))
            }
        })
        .collect()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Body of a single string literal; `None` if `input` is anything else
fn quoted(input: &str) -> Option<&str> {
    let quote = input.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let body = input.strip_prefix(quote)?.strip_suffix(quote)?;
    (!body.contains(quote)).then_some(body)
}

/// Contents of `input` when it is one bracketed group, `open ... close`
fn enclosed(input: &str, open: char, close: char) -> Result<Option<&str>, KeelError> {
    if !input.starts_with(open) || !input.ends_with(close) {
        return Ok(None);
    }
    let chars = scan(input)?;
    // every character after the opener is inside the group
    if chars.iter().skip(1).all(|&(_, _, outside)| !outside) {
        Ok(Some(&input[open.len_utf8()..input.len() - close.len_utf8()]))
    } else {
        Ok(None)
    }
}

/// Comma separated expressions, for arguments and list elements
fn parse_items(input: &str) -> Result<Vec<Expr>, KeelError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut start = 0;
    for (pos, c, outside) in scan(input)? {
        if outside && c == ',' {
            items.push(parse_expr(&input[start..pos])?);
            start = pos + 1;
        }
    }
    items.push(parse_expr(&input[start..])?);
    Ok(items)
}
