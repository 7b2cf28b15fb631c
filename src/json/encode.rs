/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
/***************************************************************************************************
 * JSON encoder with optional pretty-printing.
 **************************************************************************************************/
use std::io::Write;

#[cfg(feature = "trace")]
use func_trace::trace;

use crate::base64url;
use crate::error::Result;
use crate::item::{DataItem, DataItemValue};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

fn escape_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn float_literal(value: f64) -> String {
    if value.is_finite() {
        if value == value.trunc() && value.abs() < 1e15 {
            format!("{:.1}", value)
        } else {
            format!("{}", value)
        }
    } else {
        "null".to_string()
    }
}

fn write_indent(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push('\t');
    }
}

#[cfg_attr(feature = "trace", trace)]
fn encode_value(out: &mut String, item: &DataItem, pretty: bool, depth: usize) {
    match item.value() {
        DataItemValue::Integer(v) => out.push_str(&v.to_string()),
        DataItemValue::FloatHalf(v) | DataItemValue::FloatStandard(v) => {
            out.push_str(&float_literal(*v as f64))
        }
        DataItemValue::FloatDouble(v) => out.push_str(&float_literal(*v)),
        DataItemValue::Boolean(true) => out.push_str("true"),
        DataItemValue::Boolean(false) => out.push_str("false"),
        // Neither Null, Undefined nor Simple are JSON-expressible as anything but `null`: JSON
        // has no undefined/simple-value literal, so both collapse to `null` on the wire.
        DataItemValue::Null | DataItemValue::Undefined | DataItemValue::Simple(_) => {
            out.push_str("null")
        }
        DataItemValue::TextString(s) => escape_string(out, s),
        DataItemValue::TextStringList(segments) => escape_string(out, &segments.concat()),
        DataItemValue::ByteString(b) => escape_string(out, &base64url::encode(b)),
        DataItemValue::ByteStringList(segments) => {
            let concatenated: Vec<u8> = segments.iter().flat_map(|s| s.iter().copied()).collect();
            escape_string(out, &base64url::encode(&concatenated));
        }
        DataItemValue::Array(items) => encode_array(out, items, pretty, depth),
        DataItemValue::NamedMap(entries) => encode_object(
            out,
            entries.iter().map(|(k, v)| (k.clone(), v)),
            pretty,
            depth,
        ),
        DataItemValue::IndexedMap(entries) => encode_object(
            out,
            entries.iter().map(|(k, v)| (k.to_string(), v)),
            pretty,
            depth,
        ),
        DataItemValue::EmptyMap => out.push_str("{}"),
    }
}

fn encode_array(out: &mut String, items: &[DataItem], pretty: bool, depth: usize) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push('[');
    for (i, child) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if pretty {
            write_indent(out, depth + 1);
        }
        encode_value(out, child, pretty, depth + 1);
    }
    if pretty {
        write_indent(out, depth);
    }
    out.push(']');
}

fn encode_object<'a>(
    out: &mut String,
    entries: impl Iterator<Item = (String, &'a DataItem)>,
    pretty: bool,
    depth: usize,
) {
    let entries: Vec<(String, &DataItem)> = entries.collect();
    if entries.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push('{');
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if pretty {
            write_indent(out, depth + 1);
        }
        escape_string(out, key);
        if pretty {
            out.push_str(" : ");
        } else {
            out.push(':');
        }
        encode_value(out, value, pretty, depth + 1);
    }
    if pretty {
        write_indent(out, depth);
    }
    out.push('}');
}

/// Encode `item` as JSON and write it to `writer`. `pretty` selects tab-indented, `" : "`
/// separated output; otherwise output is fully compact.
#[cfg_attr(feature = "trace", trace)]
pub fn encode_json<W: Write>(writer: &mut W, item: &DataItem, pretty: bool) -> Result<()> {
    let mut out = String::new();
    encode_value(&mut out, item, pretty, 0);
    writer.write_all(out.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DataItemFactory;

    fn encode(item: &DataItem, pretty: bool) -> String {
        let mut out = String::new();
        encode_value(&mut out, item, pretty, 0);
        out
    }

    #[test]
    fn non_finite_float_is_null() {
        let f = DataItemFactory::new();
        assert_eq!(encode(&f.float_double(f64::INFINITY), false), "null");
        assert_eq!(encode(&f.float_double(f64::NAN), false), "null");
    }

    #[test]
    fn byte_string_is_base64url() {
        let f = DataItemFactory::new();
        let item = f.byte_string(vec![0xffu8, 0xfeu8]);
        assert_eq!(encode(&item, false), "\"__4\"");
    }

    #[test]
    fn compact_object_has_no_whitespace() {
        let f = DataItemFactory::new();
        let item = f
            .named_map(vec![("a".to_string(), f.integer(1))])
            .unwrap();
        assert_eq!(encode(&item, false), r#"{"a":1}"#);
    }
}
