/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! Encodes a value to CBOR, decodes it back, then re-encodes the same value as JSON - showing
//! that both codecs speak the same `DataItem` currency.
use ditem::factory::DataItemFactory;
use ditem::{decode_cbor, encode_cbor, encode_json};

fn main() {
    let f = DataItemFactory::new();
    let item = f
        .named_map(vec![
            ("device".to_string(), f.text_string("sensor-07")),
            ("readings".to_string(), f.array(vec![f.float_double(21.5), f.float_double(21.6), f.float_double(21.4)])),
            ("firmware".to_string(), f.byte_string(vec![0xde, 0xad, 0xbe, 0xef])),
            ("online".to_string(), f.boolean(true)),
        ])
        .unwrap();

    let mut cbor_bytes = Vec::new();
    encode_cbor(&mut cbor_bytes, &item).expect("encode_cbor should not fail on a well-formed item");
    println!("CBOR: {} bytes", cbor_bytes.len());

    let decoded = decode_cbor(&mut &cbor_bytes[..]).expect("decode_cbor is infallible at the I/O layer");
    println!("decoded status: {:?}", decoded.status());

    let mut json_bytes = Vec::new();
    encode_json(&mut json_bytes, &decoded, true).expect("encode_json should not fail on a well-formed item");
    println!("{}", String::from_utf8(json_bytes).unwrap());
}
