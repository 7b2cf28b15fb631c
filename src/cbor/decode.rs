/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
/***************************************************************************************************
 * Recursive, index-based CBOR decoder. One item per top-level call to `decode_cbor`; internally
 * `parse_item` recurses for container payloads, returning (next_index, DataItem) pairs so the
 * caller always knows how far the cursor advanced, matching the source's cursor-threading style.
 **************************************************************************************************/
use std::io::Read;

#[cfg(feature = "trace")]
use func_trace::trace;

use crate::constants::*;
use crate::error::Result;
use crate::item::{DataItem, DataItemValue};
use crate::status::DecodeStatus;
use crate::tags::Tags;
use crate::utils::{within, MAX_LENGTH};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

fn invalid_at(idx: usize) -> (usize, DataItem) {
    (
        idx,
        DataItem::new(DataItemValue::Undefined, false, DecodeStatus::Invalid),
    )
}

fn unsupported_at(idx: usize) -> (usize, DataItem) {
    (
        idx,
        DataItem::new(DataItemValue::Undefined, false, DecodeStatus::Unsupported),
    )
}

fn leaf(idx: usize, value: DataItemValue, status: DecodeStatus) -> (usize, DataItem) {
    (idx, DataItem::new(value, false, status))
}

/// The decoded initial byte of an item: major type, additional-info, and (for ai in 24..=27) the
/// big-endian primary value that followed. `ai == 31` carries `primary = None` and marks either
/// an indefinite-length container/string or, for major type 7, the break stop.
struct Head {
    mt: u8,
    ai: u8,
    primary: Option<u64>,
}

enum HeadResult {
    Ok(Head, usize),
    Eof,
    Reserved,
}

#[cfg_attr(feature = "trace", trace)]
fn parse_head(buf: &[u8], idx: usize) -> HeadResult {
    if idx >= buf.len() {
        return HeadResult::Eof;
    }
    let byte = buf[idx];
    let mt = byte & 0b111_00000;
    let ai = byte & AI_MASK;
    let mut next = idx + 1;
    let primary = match ai {
        0..=23 => Some(ai as u64),
        PAYLOAD_ONE_BYTE => {
            if !within(buf, next, 1) {
                return HeadResult::Eof;
            }
            let v = buf[next] as u64;
            next += 1;
            Some(v)
        }
        PAYLOAD_TWO_BYTES => {
            if !within(buf, next, 2) {
                return HeadResult::Eof;
            }
            let v = u16::from_be_bytes([buf[next], buf[next + 1]]) as u64;
            next += 2;
            Some(v)
        }
        PAYLOAD_FOUR_BYTES => {
            if !within(buf, next, 4) {
                return HeadResult::Eof;
            }
            let v = u32::from_be_bytes([buf[next], buf[next + 1], buf[next + 2], buf[next + 3]])
                as u64;
            next += 4;
            Some(v)
        }
        PAYLOAD_EIGHT_BYTES => {
            if !within(buf, next, 8) {
                return HeadResult::Eof;
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&buf[next..next + 8]);
            next += 8;
            Some(u64::from_be_bytes(bytes))
        }
        PAYLOAD_INDEFINITE_BYTES => None,
        _ => return HeadResult::Reserved,
    };
    HeadResult::Ok(Head { mt, ai, primary }, next)
}

/// Parse the leading tag stack (zero or more major-type-6 items), returning the accumulated tags
/// and the index of the first non-tag byte.
#[cfg_attr(feature = "trace", trace)]
fn parse_tags(buf: &[u8], mut idx: usize) -> Result<(Tags, usize, Option<DecodeStatus>)> {
    let mut tags = Tags::new();
    loop {
        if idx >= buf.len() {
            return Ok((tags, idx, Some(DecodeStatus::Invalid)));
        }
        if buf[idx] & 0b111_00000 != MT_TAG {
            break;
        }
        match parse_head(buf, idx) {
            HeadResult::Ok(head, next) => {
                let value = match head.primary {
                    Some(v) if v < MAX_LENGTH => v,
                    _ => return Ok((tags, next, Some(DecodeStatus::Unsupported))),
                };
                tags.push(value as u32);
                idx = next;
            }
            HeadResult::Eof => return Ok((tags, idx, Some(DecodeStatus::Invalid))),
            HeadResult::Reserved => return Ok((tags, idx, Some(DecodeStatus::Invalid))),
        }
    }
    Ok((tags, idx, None))
}

/// Parse one fully-tagged item starting at `idx`. Never returns an `Err`: malformed input is
/// carried as a failure `DecodeStatus` on the returned item.
#[cfg_attr(feature = "trace", trace)]
pub(crate) fn parse_item(buf: &[u8], idx: usize) -> (usize, DataItem) {
    let (tags, idx, early_fail) = match parse_tags(buf, idx) {
        Ok(v) => v,
        Err(_) => return invalid_at(idx),
    };
    if let Some(status) = early_fail {
        let (next, item) = (
            idx,
            DataItem::new(DataItemValue::Undefined, false, status),
        );
        return (next, item);
    }

    let (next, item) = parse_untagged(buf, idx);
    if tags.is_empty() {
        (next, item)
    } else {
        (next, item.with_tags(tags))
    }
}

fn parse_untagged(buf: &[u8], idx: usize) -> (usize, DataItem) {
    let (head, next) = match parse_head(buf, idx) {
        HeadResult::Ok(h, n) => (h, n),
        HeadResult::Eof => return invalid_at(idx),
        HeadResult::Reserved => return invalid_at(idx),
    };

    match head.mt {
        MT_UINT => parse_integer(head, next, false),
        MT_NINT => parse_integer(head, next, true),
        MT_BSTR => parse_string(buf, head, next, false),
        MT_TSTR => parse_string(buf, head, next, true),
        MT_ARRAY => parse_array(buf, head, next),
        MT_MAP => parse_map(buf, head, next),
        MT_SIMPLE => parse_extension(buf, head, next),
        _ => invalid_at(idx),
    }
}

fn parse_integer(head: Head, next: usize, negative: bool) -> (usize, DataItem) {
    let primary = match head.primary {
        Some(v) => v,
        None => return unsupported_at(next),
    };
    if primary > i64::MAX as u64 {
        return unsupported_at(next);
    }
    let value = if negative {
        -1 - primary as i64
    } else {
        primary as i64
    };
    leaf(next, DataItemValue::Integer(value), DecodeStatus::Translatable)
}

fn parse_string(buf: &[u8], head: Head, next: usize, is_text: bool) -> (usize, DataItem) {
    match head.primary {
        Some(len) => parse_definite_string(buf, next, len, is_text),
        None => parse_indefinite_string(buf, next, is_text),
    }
}

fn parse_definite_string(buf: &[u8], idx: usize, len: u64, is_text: bool) -> (usize, DataItem) {
    if len >= MAX_LENGTH {
        return unsupported_at(idx);
    }
    let len = len as usize;
    if !within(buf, idx, len) {
        return invalid_at(idx);
    }
    let bytes = buf[idx..idx + len].to_vec();
    let next = idx + len;
    if is_text {
        match String::from_utf8(bytes) {
            Ok(s) => leaf(next, DataItemValue::TextString(s), DecodeStatus::Translatable),
            Err(_) => invalid_at(next),
        }
    } else {
        leaf(next, DataItemValue::ByteString(bytes), DecodeStatus::Translatable)
    }
}

fn parse_indefinite_string(buf: &[u8], mut idx: usize, is_text: bool) -> (usize, DataItem) {
    let wanted_mt = if is_text { MT_TSTR } else { MT_BSTR };
    let mut byte_segments: Vec<Vec<u8>> = Vec::new();
    let mut text_segments: Vec<String> = Vec::new();
    let mut status = DecodeStatus::Translatable;
    loop {
        if idx >= buf.len() {
            return invalid_at(idx);
        }
        if buf[idx] == BREAK {
            idx += 1;
            break;
        }
        if buf[idx] & 0b111_00000 != wanted_mt {
            return invalid_at(idx);
        }
        let (chunk_next, chunk) = parse_untagged(buf, idx);
        if chunk.is_failure() || chunk.is_indefinite() {
            return invalid_at(chunk_next);
        }
        status = status.join(chunk.status());
        if is_text {
            match chunk.as_text() {
                Some(s) => text_segments.push(s.to_string()),
                None => return invalid_at(chunk_next),
            }
        } else {
            match chunk.as_bytes() {
                Some(b) => byte_segments.push(b.to_vec()),
                None => return invalid_at(chunk_next),
            }
        }
        idx = chunk_next;
    }
    if is_text {
        leaf(idx, DataItemValue::TextStringList(text_segments), status)
    } else {
        leaf(idx, DataItemValue::ByteStringList(byte_segments), status)
    }
}

fn parse_array(buf: &[u8], head: Head, next: usize) -> (usize, DataItem) {
    match head.primary {
        Some(len) => parse_definite_array(buf, next, len),
        None => parse_indefinite_array(buf, next),
    }
}

fn parse_definite_array(buf: &[u8], mut idx: usize, len: u64) -> (usize, DataItem) {
    if len >= MAX_LENGTH {
        return unsupported_at(idx);
    }
    let mut items = Vec::with_capacity(len as usize);
    let mut status = DecodeStatus::Translatable;
    for _ in 0..len {
        let (next, item) = parse_item(buf, idx);
        status = status.join(item.status());
        idx = next;
        if item.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, item.status()));
        }
        items.push(item);
    }
    leaf(idx, DataItemValue::Array(items), status)
}

fn parse_indefinite_array(buf: &[u8], mut idx: usize) -> (usize, DataItem) {
    let mut items = Vec::new();
    let mut status = DecodeStatus::Translatable;
    loop {
        if idx >= buf.len() {
            return invalid_at(idx);
        }
        if buf[idx] == BREAK {
            idx += 1;
            break;
        }
        let (next, item) = parse_item(buf, idx);
        status = status.join(item.status());
        idx = next;
        if item.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, item.status()));
        }
        items.push(item);
    }
    let mut result = DataItem::new(DataItemValue::Array(items), false, status);
    result = result.with_indefinite(true);
    (idx, result)
}

#[derive(PartialEq)]
enum MapShape {
    Named,
    Indexed,
}

fn parse_map(buf: &[u8], head: Head, next: usize) -> (usize, DataItem) {
    match head.primary {
        Some(len) => parse_definite_map(buf, next, Some(len)),
        None => parse_definite_map(buf, next, None),
    }
}

fn parse_definite_map(buf: &[u8], mut idx: usize, len: Option<u64>) -> (usize, DataItem) {
    if let Some(l) = len {
        if l >= MAX_LENGTH {
            return unsupported_at(idx);
        }
    }
    let mut named: Vec<(String, DataItem)> = Vec::new();
    let mut indexed: Vec<(i64, DataItem)> = Vec::new();
    let mut shape: Option<MapShape> = None;
    let mut status = DecodeStatus::Translatable;
    let mut count: u64 = 0;

    loop {
        match len {
            Some(l) => {
                if count >= l {
                    break;
                }
            }
            None => {
                if idx >= buf.len() {
                    return invalid_at(idx);
                }
                if buf[idx] == BREAK {
                    idx += 1;
                    break;
                }
            }
        }
        let (key_next, key) = parse_item(buf, idx);
        idx = key_next;
        if key.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, key.status()));
        }
        status = status.join(key.status());

        let (val_next, value) = parse_item(buf, idx);
        idx = val_next;
        if value.is_failure() {
            return (idx, DataItem::new(DataItemValue::Undefined, false, value.status()));
        }
        status = status.join(value.status());

        if let Some(text_key) = key.as_text() {
            match &shape {
                None => shape = Some(MapShape::Named),
                Some(MapShape::Indexed) => return unsupported_at(idx),
                Some(MapShape::Named) => {}
            }
            if named.iter().any(|(k, _)| k == text_key) {
                status = status.join(DecodeStatus::WellFormed);
            } else {
                named.push((text_key.to_string(), value));
            }
        } else if let Some(int_key) = key.as_integer() {
            match &shape {
                None => shape = Some(MapShape::Indexed),
                Some(MapShape::Named) => return unsupported_at(idx),
                Some(MapShape::Indexed) => {}
            }
            if indexed.iter().any(|(k, _)| *k == int_key) {
                status = status.join(DecodeStatus::WellFormed);
            } else {
                indexed.push((int_key, value));
            }
        } else {
            return unsupported_at(idx);
        }
        count += 1;
    }

    let value = match shape {
        None => DataItemValue::EmptyMap,
        Some(MapShape::Named) => DataItemValue::NamedMap(named),
        Some(MapShape::Indexed) => DataItemValue::IndexedMap(indexed),
    };
    let mut result = DataItem::new(value, false, status);
    if len.is_none() {
        result = result.with_indefinite(true);
    }
    (idx, result)
}

fn parse_extension(buf: &[u8], head: Head, next: usize) -> (usize, DataItem) {
    match head.ai {
        simple::FALSE => leaf(next, DataItemValue::Boolean(false), DecodeStatus::Translatable),
        simple::TRUE => leaf(next, DataItemValue::Boolean(true), DecodeStatus::Translatable),
        simple::NULL => leaf(next, DataItemValue::Null, DecodeStatus::Translatable),
        simple::UNDEFINED => leaf(next, DataItemValue::Undefined, DecodeStatus::Translatable),
        simple::FLOAT_HALF => {
            let bits = head.primary.unwrap() as u16;
            let value = half::f16::from_bits(bits).to_f32();
            leaf(next, DataItemValue::FloatHalf(value), DecodeStatus::Translatable)
        }
        simple::FLOAT_STANDARD => {
            let bits = head.primary.unwrap() as u32;
            leaf(
                next,
                DataItemValue::FloatStandard(f32::from_bits(bits)),
                DecodeStatus::Translatable,
            )
        }
        simple::FLOAT_DOUBLE => {
            let bits = head.primary.unwrap();
            leaf(
                next,
                DataItemValue::FloatDouble(f64::from_bits(bits)),
                DecodeStatus::Translatable,
            )
        }
        PAYLOAD_INDEFINITE_BYTES => invalid_at(next),
        PAYLOAD_ONE_BYTE => {
            let byte = head.primary.unwrap() as u8;
            if (0..=31).contains(&byte) {
                invalid_at(next)
            } else {
                leaf(next, DataItemValue::Simple(byte), DecodeStatus::WellFormed)
            }
        }
        ai if ai < PAYLOAD_AI_BITS + 1 => {
            leaf(next, DataItemValue::Simple(ai), DecodeStatus::WellFormed)
        }
        _ => {
            let _ = buf;
            invalid_at(next)
        }
    }
}

/// Read all bytes available from `reader` and decode exactly one top-level `DataItem` from the
/// front of the stream. Trailing bytes, if any, are ignored - matching the source's "one
/// fully-materialised item per call" contract rather than a streaming/event model.
#[cfg_attr(feature = "trace", trace)]
pub fn decode_cbor<R: Read>(reader: &mut R) -> Result<DataItem> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    let (_, item) = parse_item(&buf, 0);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(bytes: &[u8]) -> DataItem {
        let (_, item) = parse_item(bytes, 0);
        item
    }

    #[test]
    fn small_unsigned_integer() {
        let item = decode_bytes(&[0x17]);
        assert_eq!(item.as_integer(), Some(23));
        assert_eq!(item.status(), DecodeStatus::Translatable);
    }

    #[test]
    fn one_byte_unsigned_integer() {
        let item = decode_bytes(&[0x18, 0x18]);
        assert_eq!(item.as_integer(), Some(24));
    }

    #[test]
    fn negative_one() {
        let item = decode_bytes(&[0x20]);
        assert_eq!(item.as_integer(), Some(-1));
    }

    #[test]
    fn indefinite_text_string() {
        let mut bytes = vec![0x7f];
        bytes.extend_from_slice(&[0x65]);
        bytes.extend_from_slice(b"Hello");
        bytes.extend_from_slice(&[0x65]);
        bytes.extend_from_slice(b"World");
        bytes.push(0xff);
        let item = decode_bytes(&bytes);
        assert_eq!(item.status(), DecodeStatus::Translatable);
        match item.value() {
            DataItemValue::TextStringList(segs) => {
                assert_eq!(segs, &["Hello".to_string(), "World".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn map_key_discrimination_indexed() {
        let item = decode_bytes(&[0xA2, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            item.as_indexed_map().unwrap(),
            &[(1, decode_bytes(&[0x02])), (3, decode_bytes(&[0x04]))]
        );
    }

    #[test]
    fn map_key_discrimination_named() {
        let item = decode_bytes(&[0xA2, 0x61, b'a', 0x01, 0x61, b'b', 0x02]);
        let entries = item.as_named_map().unwrap();
        assert_eq!(entries[0].0, "a");
        assert_eq!(entries[0].1.as_integer(), Some(1));
        assert_eq!(entries[1].0, "b");
        assert_eq!(entries[1].1.as_integer(), Some(2));
    }

    #[test]
    fn map_key_discrimination_mismatch_is_unsupported() {
        let item = decode_bytes(&[0xA2, 0x01, 0x02, 0x61, b'a', 0x03]);
        assert_eq!(item.status(), DecodeStatus::Unsupported);
    }

    #[test]
    fn negative_beyond_i64_range_is_unsupported() {
        // 1 (negative) head with 8-byte primary = u64::MAX -> out of i64 range.
        let mut bytes = vec![0x3b];
        bytes.extend_from_slice(&u64::MAX.to_be_bytes());
        let item = decode_bytes(&bytes);
        assert_eq!(item.status(), DecodeStatus::Unsupported);
    }
}
