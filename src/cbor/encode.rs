/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
/***************************************************************************************************
 * CBOR encoder. Every `DataItem` tree is fully materialised before encoding, so (unlike a
 * fixed-buffer encoder writing into unknown-length gaps) array/map lengths are always known
 * upfront and no fix-up pass over the output is needed.
 **************************************************************************************************/
use std::io::Write;

#[cfg(feature = "trace")]
use func_trace::trace;

use crate::constants::*;
use crate::error::Result;
use crate::item::{DataItem, DataItemValue};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Write the shortest CBOR head (`mt` combined with the smallest additional-info form of 1/2/3/
/// 5/9 total bytes) that carries `value`.
fn write_head(out: &mut Vec<u8>, mt: u8, value: u64) {
    if value <= PAYLOAD_AI_BITS as u64 {
        out.push(mt | value as u8);
    } else if value <= u8::MAX as u64 {
        out.push(mt | PAYLOAD_ONE_BYTE);
        out.push(value as u8);
    } else if value <= u16::MAX as u64 {
        out.push(mt | PAYLOAD_TWO_BYTES);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        out.push(mt | PAYLOAD_FOUR_BYTES);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(mt | PAYLOAD_EIGHT_BYTES);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

fn write_tags(out: &mut Vec<u8>, item: &DataItem) {
    for tag in item.tags().iter() {
        write_head(out, MT_TAG, *tag as u64);
    }
}

#[cfg_attr(feature = "trace", trace)]
fn encode_item(out: &mut Vec<u8>, item: &DataItem) {
    write_tags(out, item);
    match item.value() {
        DataItemValue::Integer(v) => {
            if *v < 0 {
                // Negative values always use the full 8-byte form, regardless of magnitude: the
                // library-fixed convention this crate keeps (see the negative-integer open
                // question recorded for this codec).
                out.push(MT_NINT | PAYLOAD_EIGHT_BYTES);
                let primary = (-1 - *v) as u64;
                out.extend_from_slice(&primary.to_be_bytes());
            } else {
                write_head(out, MT_UINT, *v as u64);
            }
        }
        DataItemValue::FloatHalf(v) => {
            out.push(MT_FLOAT | simple::FLOAT_HALF);
            let bits = half::f16::from_f32(*v).to_bits();
            out.extend_from_slice(&bits.to_be_bytes());
        }
        DataItemValue::FloatStandard(v) => {
            out.push(MT_FLOAT | simple::FLOAT_STANDARD);
            out.extend_from_slice(&v.to_bits().to_be_bytes());
        }
        DataItemValue::FloatDouble(v) => {
            out.push(MT_FLOAT | simple::FLOAT_DOUBLE);
            out.extend_from_slice(&v.to_bits().to_be_bytes());
        }
        DataItemValue::Boolean(true) => out.push(MT_SIMPLE | simple::TRUE),
        DataItemValue::Boolean(false) => out.push(MT_SIMPLE | simple::FALSE),
        DataItemValue::Null => out.push(MT_SIMPLE | simple::NULL),
        DataItemValue::Undefined => out.push(MT_SIMPLE | simple::UNDEFINED),
        DataItemValue::Simple(v) => {
            if *v < 20 {
                out.push(MT_SIMPLE | v);
            } else {
                out.push(MT_SIMPLE | PAYLOAD_ONE_BYTE);
                out.push(*v);
            }
        }
        DataItemValue::TextString(s) => {
            write_head(out, MT_TSTR, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        DataItemValue::ByteString(b) => {
            write_head(out, MT_BSTR, b.len() as u64);
            out.extend_from_slice(b);
        }
        DataItemValue::TextStringList(segments) => {
            out.push(MT_TSTR | PAYLOAD_INDEFINITE_BYTES);
            for s in segments {
                write_head(out, MT_TSTR, s.len() as u64);
                out.extend_from_slice(s.as_bytes());
            }
            out.push(BREAK);
        }
        DataItemValue::ByteStringList(segments) => {
            out.push(MT_BSTR | PAYLOAD_INDEFINITE_BYTES);
            for b in segments {
                write_head(out, MT_BSTR, b.len() as u64);
                out.extend_from_slice(b);
            }
            out.push(BREAK);
        }
        DataItemValue::Array(items) => {
            if item.is_indefinite() {
                out.push(MT_ARRAY | PAYLOAD_INDEFINITE_BYTES);
                for child in items {
                    encode_item(out, child);
                }
                out.push(BREAK);
            } else {
                write_head(out, MT_ARRAY, items.len() as u64);
                for child in items {
                    encode_item(out, child);
                }
            }
        }
        DataItemValue::NamedMap(entries) => {
            if item.is_indefinite() {
                out.push(MT_MAP | PAYLOAD_INDEFINITE_BYTES);
                for (k, v) in entries {
                    write_head(out, MT_TSTR, k.len() as u64);
                    out.extend_from_slice(k.as_bytes());
                    encode_item(out, v);
                }
                out.push(BREAK);
            } else {
                write_head(out, MT_MAP, entries.len() as u64);
                for (k, v) in entries {
                    write_head(out, MT_TSTR, k.len() as u64);
                    out.extend_from_slice(k.as_bytes());
                    encode_item(out, v);
                }
            }
        }
        DataItemValue::IndexedMap(entries) => {
            if item.is_indefinite() {
                out.push(MT_MAP | PAYLOAD_INDEFINITE_BYTES);
                for (k, v) in entries {
                    encode_integer_key(out, *k);
                    encode_item(out, v);
                }
                out.push(BREAK);
            } else {
                write_head(out, MT_MAP, entries.len() as u64);
                for (k, v) in entries {
                    encode_integer_key(out, *k);
                    encode_item(out, v);
                }
            }
        }
        DataItemValue::EmptyMap => {
            out.push(MT_MAP);
        }
    }
}

fn encode_integer_key(out: &mut Vec<u8>, key: i64) {
    if key < 0 {
        out.push(MT_NINT | PAYLOAD_EIGHT_BYTES);
        out.extend_from_slice(&((-1 - key) as u64).to_be_bytes());
    } else {
        write_head(out, MT_UINT, key as u64);
    }
}

/// Encode `item` as CBOR and write it to `writer`.
#[cfg_attr(feature = "trace", trace)]
pub fn encode_cbor<W: Write>(writer: &mut W, item: &DataItem) -> Result<()> {
    let mut buf = Vec::new();
    encode_item(&mut buf, item);
    writer.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DataItemFactory;

    fn encode(item: &DataItem) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_item(&mut buf, item);
        buf
    }

    #[test]
    fn integer_encoding_scenarios() {
        let f = DataItemFactory::new();
        assert_eq!(encode(&f.integer(23)), vec![0x17]);
        assert_eq!(encode(&f.integer(24)), vec![0x18, 0x18]);
        assert_eq!(encode(&f.integer(-1)), {
            let mut v = vec![0x3b];
            v.extend_from_slice(&0u64.to_be_bytes());
            v
        });
    }

    #[test]
    fn shortest_head_is_chosen() {
        let f = DataItemFactory::new();
        assert_eq!(encode(&f.integer(255)).len(), 2);
        assert_eq!(encode(&f.integer(256)).len(), 3);
        assert_eq!(encode(&f.integer(65536)).len(), 5);
        assert_eq!(encode(&f.integer(u32::MAX as i64 + 1)).len(), 9);
    }

    #[test]
    fn simple_boundary() {
        let f = DataItemFactory::new();
        assert_eq!(encode(&f.simple(19).unwrap()), vec![0xf3]);
        assert_eq!(encode(&f.simple(32).unwrap()), vec![0xf8, 0x20]);
    }
}
