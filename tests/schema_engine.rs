/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! End-to-end schema engine scenarios: build a schema document, then exercise createDefault,
//! validate, expand and tokenize against it.
use ditem::factory::DataItemFactory;
use ditem::schema::SchemaBuilder;

fn build(document: ditem::DataItem) -> ditem::schema::SchemaDefinition {
    SchemaBuilder::build(&document).expect("schema document should build")
}

#[test]
fn integer_leaf_enforces_its_range() {
    let f = DataItemFactory::new();
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("integer")),
            ("minValue".to_string(), f.integer(0)),
            ("maxValue".to_string(), f.integer(100)),
            ("default".to_string(), f.integer(10)),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    assert!(schema.validate(&f.integer(50), true));
    assert!(!schema.validate(&f.integer(101), true));
    assert!(!schema.validate(&f.integer(-1), true));
    assert_eq!(schema.create_default(false).as_integer(), Some(10));
}

#[test]
fn enumerated_round_trips_between_text_and_token() {
    let f = DataItemFactory::new();
    let values = f.array(vec![
        f.named_map(vec![("name".to_string(), f.text_string("red")), ("token".to_string(), f.integer(1))])
            .unwrap(),
        f.named_map(vec![("name".to_string(), f.text_string("blue")), ("token".to_string(), f.integer(2))])
            .unwrap(),
    ]);
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("enumerated")),
            ("default".to_string(), f.text_string("red")),
            ("values".to_string(), values),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let expanded = f.text_string("blue");
    let tokenized = schema.tokenize(&expanded);
    assert_eq!(tokenized.as_integer(), Some(2));
    let back = schema.expand(&tokenized);
    assert_eq!(back.as_text(), Some("blue"));
}

#[test]
fn standard_object_requires_required_properties() {
    let f = DataItemFactory::new();
    let property = |name: &str, required: bool| {
        f.named_map(vec![
            ("name".to_string(), f.text_string(name)),
            ("required".to_string(), f.boolean(required)),
            (
                "schema".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap(),
            ),
        ])
        .unwrap()
    };
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("object")),
            ("properties".to_string(), f.array(vec![property("enabled", true), property("verbose", false)])),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let complete = f.named_map(vec![("enabled".to_string(), f.boolean(true))]).unwrap();
    assert!(schema.validate(&complete, false));

    let missing = f.named_map(vec![("verbose".to_string(), f.boolean(true))]).unwrap();
    assert!(!schema.validate(&missing, false));
}

#[test]
fn structure_tokenizes_to_a_positional_array_and_back() {
    let f = DataItemFactory::new();
    let record = |name: &str, index: i64, required: bool| {
        f.named_map(vec![
            ("name".to_string(), f.text_string(name)),
            ("index".to_string(), f.integer(index)),
            ("required".to_string(), f.boolean(required)),
            (
                "schema".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("integer"))]).unwrap(),
            ),
        ])
        .unwrap()
    };
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("structure")),
            ("records".to_string(), f.array(vec![record("alpha", 0, true), record("beta", 1, false)])),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let expanded = f.named_map(vec![("alpha".to_string(), f.integer(1))]).unwrap();
    let tokenized = schema.tokenize(&expanded);
    let items = tokenized.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_integer(), Some(1));
    assert!(items[1].is_undefined());

    let back = schema.expand(&tokenized);
    assert_eq!(back.named_get("alpha").unwrap().as_integer(), Some(1));
    assert!(back.named_get("beta").is_none());
}

#[test]
fn structure_honors_a_non_ascending_index_assignment() {
    let f = DataItemFactory::new();
    let record = |name: &str, index: i64| {
        f.named_map(vec![
            ("name".to_string(), f.text_string(name)),
            ("index".to_string(), f.integer(index)),
            ("required".to_string(), f.boolean(true)),
            (
                "schema".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("integer"))]).unwrap(),
            ),
        ])
        .unwrap()
    };
    // Declared out of ascending order: "beta" claims slot 0, "alpha" claims slot 1.
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("structure")),
            ("records".to_string(), f.array(vec![record("beta", 0), record("alpha", 1)])),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let expanded = f
        .named_map(vec![("alpha".to_string(), f.integer(1)), ("beta".to_string(), f.integer(2))])
        .unwrap();
    let tokenized = schema.tokenize(&expanded);
    let items = tokenized.as_array().unwrap();
    assert_eq!(items[0].as_integer(), Some(2));
    assert_eq!(items[1].as_integer(), Some(1));
}

#[test]
fn structure_expand_fails_when_a_required_slot_is_missing() {
    let f = DataItemFactory::new();
    let record = |name: &str, index: i64, required: bool| {
        f.named_map(vec![
            ("name".to_string(), f.text_string(name)),
            ("index".to_string(), f.integer(index)),
            ("required".to_string(), f.boolean(required)),
            (
                "schema".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("integer"))]).unwrap(),
            ),
        ])
        .unwrap()
    };
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("structure")),
            ("records".to_string(), f.array(vec![record("alpha", 0, true), record("beta", 1, false)])),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let empty = f.array(vec![]);
    let expanded = schema.expand(&empty);
    assert!(expanded.is_failure());
}

#[test]
fn selection_tokenizes_the_active_format_only() {
    let f = DataItemFactory::new();
    let format = |identifier: &str, token: i64| {
        f.named_map(vec![
            ("identifier".to_string(), f.text_string(identifier)),
            ("token".to_string(), f.integer(token)),
            (
                "schema".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap(),
            ),
        ])
        .unwrap()
    };
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("selection")),
            ("formats".to_string(), f.array(vec![format("on", 1), format("off", 2)])),
            ("default".to_string(), f.text_string("on")),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    let expanded = f.named_map(vec![("off".to_string(), f.boolean(false))]).unwrap();
    let tokenized = schema.tokenize(&expanded);
    let items = tokenized.as_array().unwrap();
    assert_eq!(items[0].as_integer(), Some(2));
    assert_eq!(items[1].as_boolean(), Some(false));
}

#[test]
fn array_schema_enforces_length_and_element_type() {
    let f = DataItemFactory::new();
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("array")),
            ("minLength".to_string(), f.integer(1)),
            ("maxLength".to_string(), f.integer(3)),
            (
                "entries".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap(),
            ),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    assert!(schema.validate(&f.array(vec![f.boolean(true)]), true));
    assert!(!schema.validate(&f.array(vec![]), true));
    assert!(!schema.validate(&f.array(vec![f.integer(1)]), true));
}

#[test]
fn array_length_shorthand_fixes_min_and_max() {
    let f = DataItemFactory::new();
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("array")),
            ("length".to_string(), f.integer(2)),
            (
                "entries".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap(),
            ),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    let schema = build(document);

    assert!(schema.validate(&f.array(vec![f.boolean(true), f.boolean(false)]), true));
    assert!(!schema.validate(&f.array(vec![f.boolean(true)]), true));
    assert!(!schema.validate(&f.array(vec![f.boolean(true), f.boolean(false), f.boolean(true)]), true));
}

#[test]
fn array_length_shorthand_rejects_combination_with_min_max() {
    let f = DataItemFactory::new();
    let root = f
        .named_map(vec![
            ("type".to_string(), f.text_string("array")),
            ("length".to_string(), f.integer(2)),
            ("minLength".to_string(), f.integer(1)),
            (
                "entries".to_string(),
                f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap(),
            ),
        ])
        .unwrap();
    let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
    assert!(SchemaBuilder::build(&document).is_err());
}

#[test]
fn definitions_reference_is_named_by_the_type_field() {
    let f = DataItemFactory::new();
    let flag = f.named_map(vec![("type".to_string(), f.text_string("boolean"))]).unwrap();
    let definitions = f.named_map(vec![("Flag".to_string(), flag)]).unwrap();
    let reference = f.named_map(vec![("type".to_string(), f.text_string("Flag"))]).unwrap();
    let document = f
        .named_map(vec![("definitions".to_string(), definitions), ("root".to_string(), reference)])
        .unwrap();
    let schema = build(document);
    assert!(schema.validate(&f.boolean(true), true));
}
