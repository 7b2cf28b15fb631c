/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
/***************************************************************************************************
 * Single-pass recursive-descent JSON decoder over a character buffer, in the same index-threaded
 * style as the CBOR decoder: every helper returns the index it stopped at.
 **************************************************************************************************/
use std::io::Read;

#[cfg(feature = "trace")]
use func_trace::trace;

use crate::error::Result;
use crate::item::{DataItem, DataItemValue};
use crate::status::DecodeStatus;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

fn invalid() -> DataItem {
    DataItem::new(DataItemValue::Undefined, false, DecodeStatus::Invalid)
}

struct Cursor<'a> {
    chars: Vec<char>,
    _marker: std::marker::PhantomData<&'a ()>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            chars: text.chars().collect(),
            _marker: std::marker::PhantomData,
        }
    }

    fn peek(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    /// Advance past whitespace and `//`/`/* */` comments.
    fn skip_trivia(&self, mut idx: usize) -> usize {
        loop {
            match self.peek(idx) {
                Some(c) if c.is_whitespace() => idx += 1,
                Some('/') if self.peek(idx + 1) == Some('/') => {
                    idx += 2;
                    while let Some(c) = self.peek(idx) {
                        if c == '\n' {
                            break;
                        }
                        idx += 1;
                    }
                }
                Some('/') if self.peek(idx + 1) == Some('*') => {
                    idx += 2;
                    while self.peek(idx).is_some()
                        && !(self.peek(idx) == Some('*') && self.peek(idx + 1) == Some('/'))
                    {
                        idx += 1;
                    }
                    if self.peek(idx).is_none() {
                        return idx;
                    }
                    idx += 2;
                }
                _ => return idx,
            }
        }
    }
}

#[cfg_attr(feature = "trace", trace)]
fn parse_value(cursor: &Cursor, idx: usize) -> (usize, DataItem) {
    let idx = cursor.skip_trivia(idx);
    match cursor.peek(idx) {
        Some('{') => parse_object(cursor, idx),
        Some('[') => parse_array(cursor, idx),
        Some('"') => match parse_string(cursor, idx) {
            Some((next, s)) => (
                next,
                DataItem::new(DataItemValue::TextString(s), false, DecodeStatus::Translatable),
            ),
            None => (idx, invalid()),
        },
        Some('t') => parse_literal(cursor, idx, "true", DataItemValue::Boolean(true)),
        Some('f') => parse_literal(cursor, idx, "false", DataItemValue::Boolean(false)),
        Some('n') => parse_literal(cursor, idx, "null", DataItemValue::Null),
        Some(c) if c == '-' || c.is_ascii_digit() => parse_number(cursor, idx),
        _ => (idx, invalid()),
    }
}

fn parse_literal(cursor: &Cursor, idx: usize, text: &str, value: DataItemValue) -> (usize, DataItem) {
    for (offset, expect) in text.chars().enumerate() {
        if cursor.peek(idx + offset) != Some(expect) {
            return (idx, invalid());
        }
    }
    (
        idx + text.chars().count(),
        DataItem::new(value, false, DecodeStatus::Translatable),
    )
}

fn parse_number(cursor: &Cursor, mut idx: usize) -> (usize, DataItem) {
    let start = idx;
    if cursor.peek(idx) == Some('-') {
        idx += 1;
    }
    let digits_start = idx;
    while matches!(cursor.peek(idx), Some(c) if c.is_ascii_digit()) {
        idx += 1;
    }
    if idx == digits_start {
        return (start, invalid());
    }

    let mut has_frac = false;
    let mut has_exp = false;

    let mut frac_len: i32 = 0;
    if cursor.peek(idx) == Some('.') {
        has_frac = true;
        idx += 1;
        let frac_start = idx;
        while matches!(cursor.peek(idx), Some(c) if c.is_ascii_digit()) {
            idx += 1;
        }
        if idx == frac_start {
            return (start, invalid());
        }
        frac_len = (idx - frac_start) as i32;
    }

    let mut exponent: i32 = 0;
    if matches!(cursor.peek(idx), Some('e') | Some('E')) {
        has_exp = true;
        idx += 1;
        let mut exp_sign = 1i32;
        if matches!(cursor.peek(idx), Some('+') | Some('-')) {
            if cursor.peek(idx) == Some('-') {
                exp_sign = -1;
            }
            idx += 1;
        }
        let exp_start = idx;
        while matches!(cursor.peek(idx), Some(c) if c.is_ascii_digit()) {
            idx += 1;
        }
        if idx == exp_start {
            return (start, invalid());
        }
        let exp_text: String = cursor.chars[exp_start..idx].iter().collect();
        exponent = exp_sign * exp_text.parse::<i32>().unwrap_or(0);
    }

    let text: String = cursor.chars[start..idx].iter().collect();

    if !has_frac && !has_exp {
        match text.parse::<i64>() {
            Ok(v) => (
                idx,
                DataItem::new(DataItemValue::Integer(v), false, DecodeStatus::Translatable),
            ),
            Err(_) => (idx, invalid()),
        }
    } else {
        let mantissa_only: String = {
            let cut = text.find(['e', 'E']).unwrap_or(text.len());
            text[..cut].chars().filter(|c| *c != '.').collect()
        };
        let mantissa: f64 = match mantissa_only.parse() {
            Ok(v) => v,
            Err(_) => return (idx, invalid()),
        };
        let value = mantissa * 10f64.powi(exponent - frac_len);
        (
            idx,
            DataItem::new(DataItemValue::FloatDouble(value), false, DecodeStatus::Translatable),
        )
    }
}

fn parse_string(cursor: &Cursor, idx: usize) -> Option<(usize, String)> {
    let mut idx = idx;
    if cursor.peek(idx) != Some('"') {
        return None;
    }
    idx += 1;
    let mut result = String::new();
    loop {
        match cursor.peek(idx) {
            None => return None,
            Some('"') => return Some((idx + 1, result)),
            Some('\\') => {
                idx += 1;
                match cursor.peek(idx)? {
                    '"' => {
                        result.push('"');
                        idx += 1;
                    }
                    '\\' => {
                        result.push('\\');
                        idx += 1;
                    }
                    '/' => {
                        result.push('/');
                        idx += 1;
                    }
                    'b' => {
                        result.push('\u{8}');
                        idx += 1;
                    }
                    'f' => {
                        result.push('\u{c}');
                        idx += 1;
                    }
                    'n' => {
                        result.push('\n');
                        idx += 1;
                    }
                    'r' => {
                        result.push('\r');
                        idx += 1;
                    }
                    't' => {
                        result.push('\t');
                        idx += 1;
                    }
                    'u' => {
                        idx += 1;
                        let mut code: u32 = 0;
                        for _ in 0..4 {
                            let c = cursor.peek(idx)?;
                            code = code * 16 + c.to_digit(16)?;
                            idx += 1;
                        }
                        match char::from_u32(code) {
                            Some(c) => result.push(c),
                            None => return None,
                        }
                    }
                    _ => return None,
                }
            }
            Some(c) => {
                result.push(c);
                idx += 1;
            }
        }
    }
}

fn parse_array(cursor: &Cursor, idx: usize) -> (usize, DataItem) {
    let mut idx = idx + 1;
    let mut items = Vec::new();
    let mut status = DecodeStatus::Translatable;
    idx = cursor.skip_trivia(idx);
    if cursor.peek(idx) == Some(']') {
        return (
            idx + 1,
            DataItem::new(DataItemValue::Array(items), false, status),
        );
    }
    loop {
        let (next, item) = parse_value(cursor, idx);
        idx = next;
        status = status.join(item.status());
        if item.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, item.status()));
        }
        items.push(item);
        idx = cursor.skip_trivia(idx);
        match cursor.peek(idx) {
            Some(',') => {
                idx += 1;
                idx = cursor.skip_trivia(idx);
            }
            Some(']') => {
                idx += 1;
                break;
            }
            _ => return (idx, invalid()),
        }
    }
    (idx, DataItem::new(DataItemValue::Array(items), false, status))
}

fn parse_object(cursor: &Cursor, idx: usize) -> (usize, DataItem) {
    let mut idx = idx + 1;
    let mut entries: Vec<(String, DataItem)> = Vec::new();
    let mut status = DecodeStatus::Translatable;
    idx = cursor.skip_trivia(idx);
    if cursor.peek(idx) == Some('}') {
        return (
            idx + 1,
            DataItem::new(DataItemValue::NamedMap(entries), false, status),
        );
    }
    loop {
        idx = cursor.skip_trivia(idx);
        let (key_next, key) = match parse_string(cursor, idx) {
            Some(v) => v,
            None => return (idx, invalid()),
        };
        idx = cursor.skip_trivia(key_next);
        if cursor.peek(idx) != Some(':') {
            return (idx, invalid());
        }
        idx += 1;
        let (val_next, value) = parse_value(cursor, idx);
        idx = val_next;
        status = status.join(value.status());
        if value.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, value.status()));
        }
        if entries.iter().any(|(k, _)| *k == key) {
            status = status.join(DecodeStatus::WellFormed);
        } else {
            entries.push((key, value));
        }
        idx = cursor.skip_trivia(idx);
        match cursor.peek(idx) {
            Some(',') => {
                idx += 1;
            }
            Some('}') => {
                idx += 1;
                break;
            }
            _ => return (idx, invalid()),
        }
    }
    (idx, DataItem::new(DataItemValue::NamedMap(entries), false, status))
}

/// Read the entire character stream from `reader` and decode exactly one top-level `DataItem`.
#[cfg_attr(feature = "trace", trace)]
pub fn decode_json<R: Read>(reader: &mut R) -> Result<DataItem> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let cursor = Cursor::new(&text);
    let (_, item) = parse_value(&cursor, 0);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> DataItem {
        let cursor = Cursor::new(text);
        let (_, item) = parse_value(&cursor, 0);
        item
    }

    #[test]
    fn integer_vs_float_boundary() {
        assert_eq!(decode("42").as_integer(), Some(42));
        assert!(decode("42.0").as_float().is_some());
        assert!(decode("1e0").as_float().is_some());
        assert_eq!(decode("-7").as_integer(), Some(-7));
    }

    #[test]
    fn comments_are_tolerated() {
        let item = decode("// leading\n{ /* inner */ \"a\" : 1 }");
        assert_eq!(item.named_get("a").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn duplicate_keys_downgrade_status() {
        let item = decode(r#"{"a":1,"a":2}"#);
        assert_eq!(item.status(), DecodeStatus::WellFormed);
        assert_eq!(item.named_get("a").unwrap().as_integer(), Some(1));
    }

    #[test]
    fn unicode_escape() {
        let item = decode(r#""A""#);
        assert_eq!(item.as_text(), Some("A"));
    }
}
