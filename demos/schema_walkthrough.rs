/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! Builds a small non-tokenizable `object` schema by hand, then walks it through `createDefault`,
//! `validate`, `tokenize` and `expand`.
use ditem::factory::DataItemFactory;
use ditem::schema::{SchemaBuilder, VecSink};

fn main() {
    let f = DataItemFactory::new();

    let status_values = f.array(vec![
        f.named_map(vec![("name".to_string(), f.text_string("ok")), ("token".to_string(), f.integer(1))])
            .unwrap(),
        f.named_map(vec![("name".to_string(), f.text_string("degraded")), ("token".to_string(), f.integer(2))])
            .unwrap(),
    ]);
    let status_schema = f
        .named_map(vec![
            ("type".to_string(), f.text_string("enumerated")),
            ("default".to_string(), f.text_string("ok")),
            ("values".to_string(), status_values),
        ])
        .unwrap();

    let property = |name: &str, required: bool, schema: ditem::DataItem| {
        f.named_map(vec![
            ("name".to_string(), f.text_string(name)),
            ("required".to_string(), f.boolean(required)),
            ("schema".to_string(), schema),
        ])
        .unwrap()
    };
    let uptime_schema = f
        .named_map(vec![
            ("type".to_string(), f.text_string("integer")),
            ("minValue".to_string(), f.integer(0)),
        ])
        .unwrap();

    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("object")),
            (
                "properties".to_string(),
                f.array(vec![
                    property("status", true, status_schema),
                    property("uptimeSeconds", false, uptime_schema),
                ]),
            ),
        ])
        .unwrap();
    let document = f
        .named_map(vec![("title".to_string(), f.text_string("HeartbeatReport")), ("root".to_string(), root)])
        .unwrap();

    let schema = SchemaBuilder::build(&document).expect("document should build");
    println!("built schema {:?}", schema.title());

    let default = schema.create_default(true);
    println!("default (expanded): {:?}", default);
    assert!(schema.validate(&default, false));

    let report = f
        .named_map(vec![
            ("status".to_string(), f.text_string("degraded")),
            ("uptimeSeconds".to_string(), f.integer(3600)),
        ])
        .unwrap();

    let sink = VecSink::new();
    let ok = schema.validate_with(&report, false, &sink);
    println!("validate(expanded) -> {} ({} warnings)", ok, sink.warnings().len());

    let tokenized = schema.tokenize(&report);
    println!("tokenized: {:?}", tokenized);

    let back = schema.expand(&tokenized);
    println!("round-tripped: {:?}", back);
    assert_eq!(back, report);
}
