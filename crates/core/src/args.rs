//! Argument text parsing
//!
//! Users type call arguments as one comma separated string. Parsing happens
//! in two steps: [`parse_arguments`] splits the text and coerces integer
//! parameters to numbers, then [`tokenize`] turns every value into an ABI
//! token of the exact parameter type.

use crate::{artifacts::AbiParam, error::ArgumentError};
use ethers::{
    abi::{ParamType, Token},
    types::{Address, I256, U256},
};
use std::fmt;

/// A single user supplied argument after integer coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Uint(U256),
    Int(I256),
    /// Any non-integer parameter, trimmed but otherwise untouched
    Text(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Uint(v) => write!(f, "{v}"),
            ArgValue::Int(v) => write!(f, "{v}"),
            ArgValue::Text(s) => f.write_str(s),
        }
    }
}

/// Splits on top-level commas, keeping brackets, parentheses and quotes intact
pub fn split_arguments(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[' | '(') => {
                depth += 1;
                current.push(c);
            }
            (None, ']' | ')') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, ',') if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}

/// Splits `raw` and coerces integer parameters to numbers
pub fn parse_arguments(raw: &str, params: &[AbiParam]) -> Result<Vec<ArgValue>, ArgumentError> {
    let parts = split_arguments(raw);
    if parts.len() != params.len() {
        return Err(ArgumentError::Arity {
            expected: params.len(),
            actual: parts.len(),
        });
    }

    parts
        .into_iter()
        .zip(params)
        .map(|(part, param)| {
            if !param.is_integer() {
                Ok(ArgValue::Text(part))
            } else if param.is_signed_integer() {
                parse_int(&part)
                    .map(ArgValue::Int)
                    .ok_or_else(|| invalid_integer(&param.kind, &part))
            } else {
                parse_uint(&part)
                    .map(ArgValue::Uint)
                    .ok_or_else(|| invalid_integer(&param.kind, &part))
            }
        })
        .collect()
}

/// Converts coerced values into ABI tokens of the given types
pub fn tokenize(values: &[ArgValue], kinds: &[ParamType]) -> Result<Vec<Token>, ArgumentError> {
    if values.len() != kinds.len() {
        return Err(ArgumentError::Arity {
            expected: kinds.len(),
            actual: values.len(),
        });
    }

    values
        .iter()
        .zip(kinds)
        .map(|(value, kind)| match (value, kind) {
            (ArgValue::Uint(v), ParamType::Uint(bits)) => {
                check_uint_range(*v, *bits, kind, &value.to_string())?;
                Ok(Token::Uint(*v))
            }
            (ArgValue::Int(v), ParamType::Int(bits)) => {
                check_int_range(*v, *bits, kind, &value.to_string())?;
                Ok(Token::Int(v.into_raw()))
            }
            _ => parse_token(&value.to_string(), kind),
        })
        .collect()
}

/// Parses one textual value as a token of type `kind`
pub fn parse_token(raw: &str, kind: &ParamType) -> Result<Token, ArgumentError> {
    let raw = raw.trim();
    let invalid = |reason: &str| ArgumentError::InvalidValue {
        ty: kind.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    match kind {
        ParamType::Address => unquote(raw)
            .parse::<Address>()
            .map(Token::Address)
            .map_err(|_| invalid("expected a 20 byte hex address")),
        ParamType::Bool => match unquote(raw) {
            "true" | "1" => Ok(Token::Bool(true)),
            "false" | "0" => Ok(Token::Bool(false)),
            _ => Err(invalid("expected true or false")),
        },
        ParamType::Uint(bits) => {
            let value = parse_uint(raw).ok_or_else(|| invalid_integer(&kind.to_string(), raw))?;
            check_uint_range(value, *bits, kind, raw)?;
            Ok(Token::Uint(value))
        }
        ParamType::Int(bits) => {
            let value = parse_int(raw).ok_or_else(|| invalid_integer(&kind.to_string(), raw))?;
            check_int_range(value, *bits, kind, raw)?;
            Ok(Token::Int(value.into_raw()))
        }
        ParamType::String => Ok(Token::String(unquote(raw).to_string())),
        ParamType::Bytes => decode_hex(raw)
            .map(Token::Bytes)
            .ok_or_else(|| invalid("expected 0x prefixed hex")),
        ParamType::FixedBytes(size) => {
            let mut bytes = decode_hex(raw).ok_or_else(|| invalid("expected 0x prefixed hex"))?;
            if bytes.len() > *size {
                return Err(invalid(&format!("expected at most {size} bytes")));
            }
            bytes.resize(*size, 0);
            Ok(Token::FixedBytes(bytes))
        }
        ParamType::Array(inner) => {
            let items = bracketed(raw, '[', ']').ok_or_else(|| invalid("expected [a, b, ...]"))?;
            let tokens = split_arguments(items)
                .iter()
                .map(|item| parse_token(item, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Token::Array(tokens))
        }
        ParamType::FixedArray(inner, size) => {
            let items = bracketed(raw, '[', ']').ok_or_else(|| invalid("expected [a, b, ...]"))?;
            let parts = split_arguments(items);
            if parts.len() != *size {
                return Err(invalid(&format!("expected {size} elements, got {}", parts.len())));
            }
            let tokens = parts
                .iter()
                .map(|item| parse_token(item, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Token::FixedArray(tokens))
        }
        ParamType::Tuple(kinds) => {
            let items = bracketed(raw, '(', ')')
                .or_else(|| bracketed(raw, '[', ']'))
                .ok_or_else(|| invalid("expected (a, b, ...)"))?;
            let parts = split_arguments(items);
            if parts.len() != kinds.len() {
                return Err(invalid(&format!(
                    "expected {} fields, got {}",
                    kinds.len(),
                    parts.len()
                )));
            }
            let tokens = parts
                .iter()
                .zip(kinds)
                .map(|(item, kind)| parse_token(item, kind))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Token::Tuple(tokens))
        }
    }
}

/// Parses a payable amount in wei, with an optional `wei`, `gwei` or `ether` unit
///
/// An empty field means zero.
pub fn parse_value(raw: &str) -> Result<U256, ArgumentError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(U256::zero());
    }
    let invalid = || ArgumentError::InvalidAmount(raw.to_string());

    let lower = raw.to_ascii_lowercase();
    let (number, decimals) = [("gwei", 9usize), ("ether", 18), ("wei", 0)]
        .iter()
        .find_map(|(unit, decimals)| {
            lower
                .strip_suffix(unit)
                .map(|n| (n.trim().to_string(), *decimals))
        })
        .unwrap_or((lower.clone(), 0));

    if number.starts_with("0x") {
        return parse_uint(&number).filter(|_| decimals == 0).ok_or_else(invalid);
    }

    let (whole, fraction) = number.split_once('.').unwrap_or((&number, ""));
    if (whole.is_empty() && fraction.is_empty())
        || fraction.len() > decimals
        || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| invalid())?
    };
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(fraction).map_err(|_| invalid())?
            * U256::exp10(decimals - fraction.len())
    };

    whole
        .checked_mul(U256::exp10(decimals))
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

/// Renders decoded return values for display
pub fn format_tokens(tokens: &[Token]) -> String {
    match tokens {
        [] => "()".to_string(),
        [single] => format_token(single, false),
        many => format!(
            "({})",
            many.iter()
                .map(|t| format_token(t, true))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn format_token(token: &Token, nested: bool) -> String {
    let join = |items: &[Token]| {
        items
            .iter()
            .map(|t| format_token(t, true))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match token {
        Token::Address(a) => ethers::utils::to_checksum(a, None),
        Token::Uint(v) => v.to_string(),
        Token::Int(v) => I256::from_raw(*v).to_string(),
        Token::Bool(b) => b.to_string(),
        Token::String(s) if nested => format!("\"{s}\""),
        Token::String(s) => s.clone(),
        Token::Bytes(b) | Token::FixedBytes(b) => format!("0x{}", hex::encode(b)),
        Token::Array(items) | Token::FixedArray(items) => format!("[{}]", join(items)),
        Token::Tuple(items) => format!("({})", join(items)),
    }
}

fn parse_uint(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) => {
            U256::from_dec_str(raw).ok()
        }
        None => None,
    }
}

fn parse_int(raw: &str) -> Option<I256> {
    let raw = raw.trim();
    let (negative, magnitude) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude = parse_uint(magnitude)?;
    // 2^255 only fits as int256's minimum
    if negative && magnitude == U256::one() << 255 {
        return Some(I256::MIN);
    }
    let magnitude = I256::try_from(magnitude).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn check_uint_range(
    value: U256,
    bits: usize,
    kind: &ParamType,
    raw: &str,
) -> Result<(), ArgumentError> {
    if value.bits() > bits {
        return Err(ArgumentError::InvalidValue {
            ty: kind.to_string(),
            value: raw.to_string(),
            reason: "out of range".to_string(),
        });
    }
    Ok(())
}

fn check_int_range(
    value: I256,
    bits: usize,
    kind: &ParamType,
    raw: &str,
) -> Result<(), ArgumentError> {
    if bits >= 256 {
        return Ok(());
    }
    let limit = U256::one() << (bits - 1);
    let magnitude = value.unsigned_abs();
    let fits = if value.is_negative() {
        magnitude <= limit
    } else {
        magnitude < limit
    };
    if !fits {
        return Err(ArgumentError::InvalidValue {
            ty: kind.to_string(),
            value: raw.to_string(),
            reason: "out of range".to_string(),
        });
    }
    Ok(())
}

fn invalid_integer(ty: &str, value: &str) -> ArgumentError {
    ArgumentError::InvalidInteger {
        ty: ty.to_string(),
        value: value.to_string(),
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for q in ['"', '\''] {
        if let Some(inner) = raw.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    raw
}

fn decode_hex(raw: &str) -> Option<Vec<u8>> {
    let raw = unquote(raw);
    let hex_str = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    hex::decode(hex_str).ok()
}

fn bracketed(raw: &str, open: char, close: char) -> Option<&str> {
    raw.trim().strip_prefix(open)?.strip_suffix(close)
}
