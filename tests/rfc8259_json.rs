/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! JSON codec conformance: RFC 8259 syntax plus this crate's extensions (Base64-URL byte strings,
//! non-finite floats as `null`, comment tolerance).
use ditem::factory::DataItemFactory;
use ditem::status::DecodeStatus;
use ditem::{decode_json, encode_json};

fn decode(text: &str) -> ditem::DataItem {
    let mut reader = text.as_bytes();
    decode_json(&mut reader).unwrap()
}

fn encode(item: &ditem::DataItem, pretty: bool) -> String {
    let mut buf = Vec::new();
    encode_json(&mut buf, item, pretty).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn object_and_array_round_trip() {
    let f = DataItemFactory::new();
    let item = f
        .named_map(vec![
            ("name".to_string(), f.text_string("widget")),
            ("count".to_string(), f.integer(3)),
            ("tags".to_string(), f.array(vec![f.text_string("a"), f.text_string("b")])),
        ])
        .unwrap();
    let text = encode(&item, false);
    let decoded = decode(&text);
    assert_eq!(decoded.named_get("name").unwrap().as_text(), Some("widget"));
    assert_eq!(decoded.named_get("count").unwrap().as_integer(), Some(3));
    assert_eq!(decoded.named_get("tags").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn byte_string_carried_as_base64url() {
    let f = DataItemFactory::new();
    let item = f.byte_string(vec![0x00, 0x01, 0x02, 0xff]);
    let text = encode(&item, false);
    let decoded = decode(&text);
    assert_eq!(decoded.as_text().map(str::len), Some(text.len() - 2));
}

#[test]
fn pretty_printing_uses_tabs_and_colon_spacing() {
    let f = DataItemFactory::new();
    let item = f.named_map(vec![("a".to_string(), f.integer(1))]).unwrap();
    let text = encode(&item, true);
    assert!(text.contains('\t'));
    assert!(text.contains(" : "));
}

#[test]
fn negative_zero_is_not_an_integer_carrier() {
    // "-0" parses as a float: it is not a finite representation collapse, just a JSON
    // number with no fraction/exponent, so the integer fast-path handles it via i64 parse.
    let item = decode("-0");
    assert_eq!(item.as_integer(), Some(0));
}

#[test]
fn non_finite_float_encodes_as_null_and_decodes_as_null() {
    let f = DataItemFactory::new();
    let item = f.float_double(f64::NAN);
    let text = encode(&item, false);
    assert_eq!(text, "null");
    assert!(decode(&text).is_null());
}

#[test]
fn trailing_bytes_after_the_first_value_are_ignored() {
    // Matches the CBOR codec's "one fully-materialised item per call" contract: only the
    // leading value is decoded, and anything after it is left unexamined.
    let item = decode("1 2");
    assert_eq!(item.as_integer(), Some(1));
}

#[test]
fn malformed_value_decodes_as_invalid() {
    let item = decode("{\"a\":}");
    assert_eq!(item.status(), DecodeStatus::Invalid);
}
