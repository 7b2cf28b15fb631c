/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The twelve schema node shapes and the four operations (`createDefault`, `validate`, `expand`,
//! `tokenize`) each implements.
#[cfg(feature = "trace")]
use func_trace::trace;

use crate::base64url;
use crate::factory::DataItemFactory;
use crate::item::{DataItem, DataItemValue};
use crate::schema::sink::WarningSink;
use crate::status::DecodeStatus;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// JavaScript-safe integer domain clamp applied to `INTEGER`/`NUMBER` bounds.
pub const JS_SAFE_INT: i64 = 1 << 53;

/// The carried precision of a `NUMBER` node's tokenised encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Precision {
    Half,
    Standard,
    Double,
}

/// A property of a `STANDARD_OBJECT` or `TOKENIZABLE_OBJECT`. `token` is only meaningful (and
/// only built) for `TOKENIZABLE_OBJECT`.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub schema: SchemaNode,
    pub required: bool,
    pub token: Option<i64>,
}

/// A record of a `STRUCTURE`: a named, positionally-indexed, optionally-required slot.
#[derive(Debug, Clone)]
pub struct Record {
    pub name: String,
    pub schema: SchemaNode,
    pub required: bool,
    pub index: usize,
}

/// A discriminator format of a `SELECTION`.
#[derive(Debug, Clone)]
pub struct Format {
    pub identifier: String,
    pub schema: SchemaNode,
    pub token: i64,
}

/// The variant-specific payload of a schema node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Boolean {
        default: bool,
    },
    Integer {
        default: i64,
        min_value: i64,
        max_value: i64,
    },
    Number {
        precision: Precision,
        default: f64,
        min_value: f64,
        max_value: f64,
    },
    TextString {
        default: String,
        min_length: usize,
        max_length: usize,
    },
    ByteString {
        default: Vec<u8>,
        min_length: usize,
        max_length: usize,
    },
    Enumerated {
        default: String,
        is_final: bool,
        values: Vec<(String, i64)>,
    },
    Array {
        values_schema: Box<SchemaNode>,
        min_length: usize,
        max_length: usize,
    },
    Map {
        values_schema: Box<SchemaNode>,
    },
    StandardObject {
        properties: Vec<Property>,
        is_final: bool,
    },
    TokenizableObject {
        properties: Vec<Property>,
        is_final: bool,
    },
    Structure {
        records: Vec<Record>,
        is_final: bool,
    },
    Selection {
        formats: Vec<Format>,
        default: String,
        is_final: bool,
    },
}

/// A schema tree node: the common attribute block plus a variant-specific [`NodeKind`]. Immutable
/// after construction except for the common attributes, which the parent builder assigns
/// post-construction (`name`, `token_value`, `optional`).
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tag_values: Vec<u32>,
    pub token_value: Option<i64>,
    pub optional: bool,
    pub kind: NodeKind,
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

fn failed(sink: &dyn WarningSink, path: &str, message: &str) -> DataItem {
    sink.warn(path, message);
    DataItemFactory::new().invalid(DecodeStatus::FailedSchema)
}

/// A strict decimal-integer parser for `TOKENIZABLE_OBJECT` keys carried as JSON text: rejects a
/// leading `+` and the canonical negative zero `"-0"`.
pub fn parse_token_key(text: &str) -> Option<i64> {
    if text.is_empty() || text.starts_with('+') || text == "-0" {
        return None;
    }
    text.parse::<i64>().ok()
}

impl SchemaNode {
    /// Synthesise a value satisfying this schema. `include_all = false` omits optional children.
    #[cfg_attr(feature = "trace", trace)]
    pub fn create_default(&self, include_all: bool) -> DataItem {
        let f = DataItemFactory::new();
        match &self.kind {
            NodeKind::Boolean { default } => f.boolean(*default),
            NodeKind::Integer { default, .. } => f.integer(*default),
            NodeKind::Number {
                precision, default, ..
            } => match precision {
                Precision::Half => f.float_half(*default as f32),
                Precision::Standard => f.float_standard(*default as f32),
                Precision::Double => f.float_double(*default),
            },
            NodeKind::TextString { default, .. } => f.text_string(default.clone()),
            NodeKind::ByteString { default, .. } => f.byte_string(default.clone()),
            NodeKind::Enumerated { default, .. } => f.text_string(default.clone()),
            NodeKind::Array {
                values_schema,
                min_length,
                ..
            } => {
                let items = (0..*min_length)
                    .map(|_| values_schema.create_default(include_all))
                    .collect();
                f.array(items)
            }
            NodeKind::Map { .. } => f.named_map(vec![]).expect("empty map is always valid"),
            NodeKind::StandardObject {
                properties,
                ..
            }
            | NodeKind::TokenizableObject {
                properties,
                ..
            } => {
                let entries = properties
                    .iter()
                    .filter(|p| p.required || include_all)
                    .map(|p| (p.name.clone(), p.schema.create_default(include_all)))
                    .collect();
                f.named_map(entries).expect("unique property names")
            }
            NodeKind::Structure { records, .. } => {
                let entries = records
                    .iter()
                    .filter(|r| r.required || include_all)
                    .map(|r| (r.name.clone(), r.schema.create_default(include_all)))
                    .collect();
                f.named_map(entries).expect("unique record names")
            }
            NodeKind::Selection {
                formats, default, ..
            } => {
                let format = formats
                    .iter()
                    .find(|fmt| &fmt.identifier == default)
                    .expect("builder validated default selects a known format");
                let entries = vec![(
                    default.clone(),
                    format.schema.create_default(include_all),
                )];
                f.named_map(entries).expect("single entry is unique")
            }
        }
    }

    /// Structural check. `recursive` descends into children.
    #[cfg_attr(feature = "trace", trace)]
    pub fn validate(
        &self,
        item: &DataItem,
        is_tokenized: bool,
        recursive: bool,
        path: &str,
        sink: &dyn WarningSink,
    ) -> bool {
        match &self.kind {
            NodeKind::Boolean { .. } => {
                if item.as_bool_strict().is_none() {
                    sink.warn(path, "expected a boolean");
                    return false;
                }
                true
            }
            NodeKind::Integer {
                min_value,
                max_value,
                ..
            } => match item.as_integer() {
                Some(v) if v >= *min_value && v <= *max_value => true,
                Some(_) => {
                    sink.warn(path, "integer out of range");
                    false
                }
                None => {
                    sink.warn(path, "expected an integer");
                    false
                }
            },
            NodeKind::Number {
                min_value,
                max_value,
                ..
            } => {
                let value = item.as_float().or_else(|| item.as_integer().map(|v| v as f64));
                match value {
                    Some(v) if v >= *min_value && v <= *max_value => true,
                    Some(_) => {
                        sink.warn(path, "number out of range");
                        false
                    }
                    None => {
                        sink.warn(path, "expected a number");
                        false
                    }
                }
            }
            NodeKind::TextString {
                min_length,
                max_length,
                ..
            } => match item.concat_text() {
                Some(s) if (*min_length..=*max_length).contains(&s.len()) => true,
                Some(_) => {
                    sink.warn(path, "text string length out of range");
                    false
                }
                None => {
                    sink.warn(path, "expected a text string");
                    false
                }
            },
            NodeKind::ByteString {
                min_length,
                max_length,
                ..
            } => match resolve_bytes(item) {
                Some(b) if (*min_length..=*max_length).contains(&b.len()) => true,
                Some(_) => {
                    sink.warn(path, "byte string length out of range");
                    false
                }
                None => {
                    sink.warn(path, "expected a byte string");
                    false
                }
            },
            NodeKind::Enumerated {
                is_final, values, ..
            } => {
                if is_tokenized {
                    match item.as_integer() {
                        Some(0) => true,
                        Some(token) => {
                            if values.iter().any(|(_, t)| *t == token) {
                                true
                            } else if *is_final {
                                sink.warn(path, "unknown enumerated token");
                                false
                            } else {
                                true
                            }
                        }
                        None => {
                            sink.warn(path, "expected an integer token");
                            false
                        }
                    }
                } else {
                    match item.concat_text() {
                        Some(ref s) if s == "unknown" => true,
                        Some(s) => {
                            if values.iter().any(|(name, _)| *name == s) {
                                true
                            } else if *is_final {
                                sink.warn(path, "unknown enumerated identifier");
                                false
                            } else {
                                true
                            }
                        }
                        None => {
                            sink.warn(path, "expected a text identifier");
                            false
                        }
                    }
                }
            }
            NodeKind::Array {
                values_schema,
                min_length,
                max_length,
            } => {
                let items = match item.as_array() {
                    Some(items) => items,
                    None => {
                        sink.warn(path, "expected an array");
                        return false;
                    }
                };
                if !(*min_length..=*max_length).contains(&items.len()) {
                    sink.warn(path, "array length out of range");
                    return false;
                }
                if recursive {
                    for (i, child) in items.iter().enumerate() {
                        if !values_schema.validate(
                            child,
                            is_tokenized,
                            true,
                            &index_path(path, i),
                            sink,
                        ) {
                            return false;
                        }
                    }
                }
                true
            }
            NodeKind::Map { values_schema } => {
                let entries = match item.as_named_map() {
                    Some(entries) => entries,
                    None => {
                        if matches!(item.value(), DataItemValue::EmptyMap) {
                            return true;
                        }
                        sink.warn(path, "expected a map");
                        return false;
                    }
                };
                if recursive {
                    for (key, value) in entries {
                        if !values_schema.validate(
                            value,
                            is_tokenized,
                            true,
                            &child_path(path, key),
                            sink,
                        ) {
                            return false;
                        }
                    }
                }
                true
            }
            NodeKind::StandardObject {
                properties,
                is_final,
            } => validate_named_object(properties, *is_final, item, is_tokenized, recursive, path, sink),
            NodeKind::TokenizableObject {
                properties,
                is_final,
            } => {
                if is_tokenized {
                    validate_tokenized_object(properties, *is_final, item, recursive, path, sink)
                } else {
                    validate_named_object(properties, *is_final, item, is_tokenized, recursive, path, sink)
                }
            }
            NodeKind::Structure { records, is_final } => {
                if is_tokenized {
                    validate_structure_tokenized(records, *is_final, item, recursive, path, sink)
                } else {
                    validate_structure_expanded(records, *is_final, item, recursive, path, sink)
                }
            }
            NodeKind::Selection {
                formats, is_final, ..
            } => {
                if is_tokenized {
                    validate_selection_tokenized(formats, *is_final, item, recursive, path, sink)
                } else {
                    validate_selection_expanded(formats, *is_final, item, recursive, path, sink)
                }
            }
        }
    }

    /// Tokenised -> expanded form conversion. Delegates to `validate` (non-recursive) first.
    #[cfg_attr(feature = "trace", trace)]
    pub fn expand(&self, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
        if !self.validate(item, true, false, path, sink) {
            return failed(sink, path, "expand: source item failed tokenised validation");
        }
        let f = DataItemFactory::new();
        match &self.kind {
            NodeKind::Boolean { .. }
            | NodeKind::Integer { .. } => item.clone(),
            NodeKind::Number { .. } => f.float_double(item.as_float().unwrap()),
            NodeKind::TextString { .. } => f.text_string(item.concat_text().unwrap()),
            NodeKind::ByteString { .. } => f.byte_string(resolve_bytes(item).unwrap()),
            NodeKind::Enumerated { is_final, values, .. } => {
                let token = item.as_integer().unwrap();
                if token == 0 {
                    f.text_string("unknown")
                } else {
                    match values.iter().find(|(_, t)| *t == token) {
                        Some((name, _)) => f.text_string(name.clone()),
                        None if !*is_final => f.text_string("unknown"),
                        None => failed(sink, path, "expand: unknown enumerated token"),
                    }
                }
            }
            NodeKind::Array { values_schema, .. } => {
                let items = item.as_array().unwrap();
                let expanded: Vec<DataItem> = items
                    .iter()
                    .enumerate()
                    .map(|(i, child)| values_schema.expand(child, &index_path(path, i), sink))
                    .collect();
                if expanded.iter().any(DataItem::is_failure) {
                    return failed(sink, path, "expand: array element failed");
                }
                f.array(expanded)
            }
            NodeKind::Map { values_schema } => {
                let entries = item.as_named_map().unwrap_or(&[]);
                let mut result = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let expanded = values_schema.expand(value, &child_path(path, key), sink);
                    if expanded.is_failure() {
                        return failed(sink, path, "expand: map value failed");
                    }
                    result.push((key.clone(), expanded));
                }
                f.named_map(result).expect("keys already unique")
            }
            NodeKind::StandardObject { properties, .. } => {
                expand_named_object(properties, item, path, sink)
            }
            NodeKind::TokenizableObject { properties, .. } => {
                expand_tokenizable_object(properties, item, path, sink)
            }
            NodeKind::Structure { records, is_final } => {
                expand_structure(records, *is_final, item, path, sink)
            }
            NodeKind::Selection { formats, is_final, .. } => {
                expand_selection(formats, *is_final, item, path, sink)
            }
        }
    }

    /// Expanded -> tokenised form conversion; dual to `expand`.
    #[cfg_attr(feature = "trace", trace)]
    pub fn tokenize(&self, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
        if !self.validate(item, false, false, path, sink) {
            return failed(sink, path, "tokenize: source item failed expanded validation");
        }
        let f = DataItemFactory::new();
        match &self.kind {
            NodeKind::Boolean { .. }
            | NodeKind::Integer { .. } => item.clone(),
            NodeKind::Number { precision, .. } => {
                let value = item.as_float().unwrap();
                match precision {
                    Precision::Half => {
                        let narrowed = value as f32;
                        if narrowed.is_infinite() && value.is_finite() {
                            return failed(sink, path, "tokenize: number overflows half precision");
                        }
                        f.float_half(narrowed)
                    }
                    Precision::Standard => {
                        let narrowed = value as f32;
                        if narrowed.is_infinite() && value.is_finite() {
                            return failed(sink, path, "tokenize: number overflows single precision");
                        }
                        f.float_standard(narrowed)
                    }
                    Precision::Double => f.float_double(value),
                }
            }
            NodeKind::TextString { .. } => f.text_string(item.concat_text().unwrap()),
            NodeKind::ByteString { .. } => f.byte_string(resolve_bytes(item).unwrap()),
            NodeKind::Enumerated { is_final, values, .. } => {
                let text = item.concat_text().unwrap();
                if text == "unknown" {
                    f.integer(0)
                } else {
                    match values.iter().find(|(name, _)| *name == text) {
                        Some((_, token)) => f.integer(*token),
                        None if !*is_final => f.integer(0),
                        None => failed(sink, path, "tokenize: unknown enumerated identifier"),
                    }
                }
            }
            NodeKind::Array { values_schema, .. } => {
                let items = item.as_array().unwrap();
                let tokenized: Vec<DataItem> = items
                    .iter()
                    .enumerate()
                    .map(|(i, child)| values_schema.tokenize(child, &index_path(path, i), sink))
                    .collect();
                if tokenized.iter().any(DataItem::is_failure) {
                    return failed(sink, path, "tokenize: array element failed");
                }
                f.array(tokenized)
            }
            NodeKind::Map { values_schema } => {
                let entries = item.as_named_map().unwrap_or(&[]);
                let mut result = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let tokenized = values_schema.tokenize(value, &child_path(path, key), sink);
                    if tokenized.is_failure() {
                        return failed(sink, path, "tokenize: map value failed");
                    }
                    result.push((key.clone(), tokenized));
                }
                f.named_map(result).expect("keys already unique")
            }
            NodeKind::StandardObject { properties, .. } => {
                tokenize_standard_object(properties, item, path, sink)
            }
            NodeKind::TokenizableObject { properties, .. } => {
                tokenize_tokenizable_object(properties, item, path, sink)
            }
            NodeKind::Structure { records, is_final } => {
                tokenize_structure(records, *is_final, item, path, sink)
            }
            NodeKind::Selection { formats, is_final, .. } => {
                tokenize_selection(formats, *is_final, item, path, sink)
            }
        }
    }
}

fn resolve_bytes(item: &DataItem) -> Option<Vec<u8>> {
    if let Some(b) = item.concat_bytes() {
        return Some(b);
    }
    item.concat_text().and_then(|t| base64url::decode(&t).ok())
}

fn validate_named_object(
    properties: &[Property],
    is_final: bool,
    item: &DataItem,
    is_tokenized: bool,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    let entries = match item.as_named_map() {
        Some(e) => e,
        None => {
            if matches!(item.value(), DataItemValue::EmptyMap) {
                &[]
            } else {
                sink.warn(path, "expected a named map");
                return false;
            }
        }
    };
    for property in properties {
        let found = entries.iter().find(|(k, _)| *k == property.name);
        if found.is_none() && property.required {
            sink.warn(&child_path(path, &property.name), "required property missing");
            return false;
        }
        if let (Some((_, value)), true) = (found, recursive) {
            if !property
                .schema
                .validate(value, is_tokenized, true, &child_path(path, &property.name), sink)
            {
                return false;
            }
        }
    }
    if is_final {
        for (key, _) in entries {
            if !properties.iter().any(|p| &p.name == key) {
                sink.warn(&child_path(path, key), "unknown property in final object");
                return false;
            }
        }
    }
    true
}

fn validate_tokenized_object(
    properties: &[Property],
    is_final: bool,
    item: &DataItem,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    // Accept an IndexedMap, or a NamedMap whose keys are strict decimal token strings.
    let pairs: Vec<(i64, &DataItem)> = if let Some(entries) = item.as_indexed_map() {
        entries.iter().map(|(k, v)| (*k, v)).collect()
    } else if let Some(entries) = item.as_named_map() {
        let mut pairs = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match parse_token_key(key) {
                Some(k) => pairs.push((k, value)),
                None => {
                    sink.warn(path, "tokenised object key is not a strict decimal token");
                    return false;
                }
            }
        }
        pairs
    } else if matches!(item.value(), DataItemValue::EmptyMap) {
        Vec::new()
    } else {
        sink.warn(path, "expected an indexed map");
        return false;
    };

    for property in properties {
        let token = property.token.expect("tokenizable property always has a token");
        let found = pairs.iter().find(|(k, _)| *k == token);
        if found.is_none() && property.required {
            sink.warn(&child_path(path, &property.name), "required property missing");
            return false;
        }
        if let (Some((_, value)), true) = (found, recursive) {
            if !property
                .schema
                .validate(value, true, true, &child_path(path, &property.name), sink)
            {
                return false;
            }
        }
    }
    if is_final {
        for (token, _) in &pairs {
            if !properties.iter().any(|p| p.token == Some(*token)) {
                sink.warn(path, "unknown token in final tokenizable object");
                return false;
            }
        }
    }
    true
}

fn expand_named_object(properties: &[Property], item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let entries = item.as_named_map().map(|e| e.to_vec()).unwrap_or_default();
    let mut result = Vec::new();
    for property in properties {
        if let Some((_, value)) = entries.iter().find(|(k, _)| *k == property.name) {
            let expanded = property.schema.expand(value, &child_path(path, &property.name), sink);
            if expanded.is_failure() {
                return failed(sink, path, "expand: property failed");
            }
            result.push((property.name.clone(), expanded));
        }
    }
    f.named_map(result).expect("property names are unique")
}

fn tokenize_standard_object(properties: &[Property], item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let entries = item.as_named_map().map(|e| e.to_vec()).unwrap_or_default();
    let mut result = Vec::new();
    for property in properties {
        if let Some((_, value)) = entries.iter().find(|(k, _)| *k == property.name) {
            let tokenized = property.schema.tokenize(value, &child_path(path, &property.name), sink);
            if tokenized.is_failure() {
                return failed(sink, path, "tokenize: property failed");
            }
            result.push((property.name.clone(), tokenized));
        }
    }
    f.named_map(result).expect("property names are unique")
}

fn expand_tokenizable_object(properties: &[Property], item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let pairs: Vec<(i64, DataItem)> = if let Some(entries) = item.as_indexed_map() {
        entries.to_vec()
    } else if let Some(entries) = item.as_named_map() {
        entries
            .iter()
            .filter_map(|(k, v)| parse_token_key(k).map(|tok| (tok, v.clone())))
            .collect()
    } else {
        Vec::new()
    };
    let mut result = Vec::new();
    for property in properties {
        let token = property.token.unwrap();
        if let Some((_, value)) = pairs.iter().find(|(k, _)| *k == token) {
            let expanded = property.schema.expand(value, &child_path(path, &property.name), sink);
            if expanded.is_failure() {
                return failed(sink, path, "expand: property failed");
            }
            result.push((property.name.clone(), expanded));
        }
    }
    f.named_map(result).expect("property names are unique")
}

fn tokenize_tokenizable_object(properties: &[Property], item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let entries = item.as_named_map().map(|e| e.to_vec()).unwrap_or_default();
    let mut result = Vec::new();
    for property in properties {
        if let Some((_, value)) = entries.iter().find(|(k, _)| *k == property.name) {
            let tokenized = property.schema.tokenize(value, &child_path(path, &property.name), sink);
            if tokenized.is_failure() {
                return failed(sink, path, "tokenize: property failed");
            }
            result.push((property.token.unwrap(), tokenized));
        }
    }
    f.indexed_map(result).expect("tokens are unique")
}

fn validate_structure_tokenized(
    records: &[Record],
    is_final: bool,
    item: &DataItem,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    let items = match item.as_array() {
        Some(items) => items,
        None => {
            sink.warn(path, "expected an array");
            return false;
        }
    };
    let n = records.len();
    if is_final {
        if items.len() != n {
            sink.warn(path, "array length does not match structure record count");
            return false;
        }
    } else if items.len() < n {
        // Short arrays are padded with Undefined before per-slot checks.
    }
    for record in records {
        let slot = items.get(record.index);
        let absent = match slot {
            None => true,
            Some(v) => v.is_null() || v.is_undefined(),
        };
        if absent && record.required {
            sink.warn(&index_path(path, record.index), "required slot missing");
            return false;
        }
        if !absent && recursive {
            if !record
                .schema
                .validate(slot.unwrap(), true, true, &index_path(path, record.index), sink)
            {
                return false;
            }
        }
    }
    true
}

fn validate_structure_expanded(
    records: &[Record],
    is_final: bool,
    item: &DataItem,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    let entries = match item.as_named_map() {
        Some(e) => e,
        None => {
            if matches!(item.value(), DataItemValue::EmptyMap) {
                &[]
            } else {
                sink.warn(path, "expected a named map");
                return false;
            }
        }
    };
    for record in records {
        let found = entries.iter().find(|(k, _)| *k == record.name);
        if found.is_none() && record.required {
            sink.warn(&child_path(path, &record.name), "required record missing");
            return false;
        }
        if let (Some((_, value)), true) = (found, recursive) {
            if !record
                .schema
                .validate(value, false, true, &child_path(path, &record.name), sink)
            {
                return false;
            }
        }
    }
    if is_final {
        for (key, _) in entries {
            if !records.iter().any(|r| &r.name == key) {
                sink.warn(&child_path(path, key), "unknown record in final structure");
                return false;
            }
        }
    }
    true
}

fn expand_structure(records: &[Record], is_final: bool, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let items = item.as_array().unwrap_or(&[]);
    let n = records.len();
    if is_final && items.len() != n {
        return failed(sink, path, "expand: array length does not match structure");
    }
    let mut result = Vec::new();
    for record in records {
        let slot = items.get(record.index);
        let absent = match slot {
            None => true,
            Some(v) => v.is_null() || v.is_undefined(),
        };
        if absent {
            if record.required {
                return failed(sink, &index_path(path, record.index), "expand: required slot missing");
            }
            continue;
        }
        let expanded = record
            .schema
            .expand(slot.unwrap(), &index_path(path, record.index), sink);
        if expanded.is_failure() {
            return failed(sink, path, "expand: record failed");
        }
        result.push((record.name.clone(), expanded));
    }
    f.named_map(result).expect("record names are unique")
}

fn tokenize_structure(records: &[Record], is_final: bool, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let entries = item.as_named_map().map(|e| e.to_vec()).unwrap_or_default();
    if is_final {
        for (key, _) in &entries {
            if !records.iter().any(|r| &r.name == key) {
                return failed(sink, path, "tokenize: unknown record in final structure");
            }
        }
    }
    let n = records.len();
    let mut slots: Vec<DataItem> = (0..n).map(|_| f.undefined()).collect();
    for record in records {
        if let Some((_, value)) = entries.iter().find(|(k, _)| *k == record.name) {
            let tokenized = record
                .schema
                .tokenize(value, &child_path(path, &record.name), sink);
            if tokenized.is_failure() {
                return failed(sink, path, "tokenize: record failed");
            }
            slots[record.index] = tokenized;
        } else if record.required {
            return failed(sink, &child_path(path, &record.name), "tokenize: required record missing");
        }
    }
    f.array(slots)
}

fn validate_selection_expanded(
    formats: &[Format],
    is_final: bool,
    item: &DataItem,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    let entries = match item.as_named_map() {
        Some(e) if e.len() == 1 => e,
        _ => {
            sink.warn(path, "expected a single-entry named map");
            return false;
        }
    };
    let (identifier, value) = &entries[0];
    if identifier == "unknown" {
        return true;
    }
    match formats.iter().find(|f| &f.identifier == identifier) {
        Some(format) => {
            if recursive {
                format
                    .schema
                    .validate(value, false, true, &child_path(path, identifier), sink)
            } else {
                true
            }
        }
        None if !is_final => true,
        None => {
            sink.warn(path, "unknown selection identifier");
            false
        }
    }
}

fn validate_selection_tokenized(
    formats: &[Format],
    is_final: bool,
    item: &DataItem,
    recursive: bool,
    path: &str,
    sink: &dyn WarningSink,
) -> bool {
    let items = match item.as_array() {
        Some(items) if items.len() == 2 => items,
        _ => {
            sink.warn(path, "expected a 2-element array");
            return false;
        }
    };
    let token = match items[0].as_integer() {
        Some(t) => t,
        None => {
            sink.warn(path, "expected an integer token");
            return false;
        }
    };
    if token == 0 {
        return true;
    }
    match formats.iter().find(|f| f.token == token) {
        Some(format) => {
            if recursive {
                format
                    .schema
                    .validate(&items[1], true, true, &index_path(path, 1), sink)
            } else {
                true
            }
        }
        None if !is_final => true,
        None => {
            sink.warn(path, "unknown selection token");
            false
        }
    }
}

fn expand_selection(formats: &[Format], is_final: bool, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let items = item.as_array().unwrap_or(&[]);
    let token = items[0].as_integer().unwrap_or(0);
    if token == 0 {
        return f
            .named_map(vec![("unknown".to_string(), f.undefined())])
            .unwrap();
    }
    match formats.iter().find(|fmt| fmt.token == token) {
        Some(format) => {
            let expanded = format.schema.expand(&items[1], &child_path(path, &format.identifier), sink);
            if expanded.is_failure() {
                return failed(sink, path, "expand: selection value failed");
            }
            f.named_map(vec![(format.identifier.clone(), expanded)]).unwrap()
        }
        None if !is_final => f
            .named_map(vec![("unknown".to_string(), f.undefined())])
            .unwrap(),
        None => failed(sink, path, "expand: unknown selection token"),
    }
}

fn tokenize_selection(formats: &[Format], is_final: bool, item: &DataItem, path: &str, sink: &dyn WarningSink) -> DataItem {
    let f = DataItemFactory::new();
    let entries = item.as_named_map().cloned_vec_or_empty();
    let (identifier, value) = match entries.first() {
        Some(pair) => pair,
        None => return failed(sink, path, "tokenize: empty selection"),
    };
    if identifier == "unknown" {
        return f.array(vec![f.integer(0), f.undefined()]);
    }
    match formats.iter().find(|fmt| &fmt.identifier == identifier) {
        Some(format) => {
            let tokenized = format.schema.tokenize(value, &child_path(path, identifier), sink);
            if tokenized.is_failure() {
                return failed(sink, path, "tokenize: selection value failed");
            }
            f.array(vec![f.integer(format.token), tokenized])
        }
        None if !is_final => f.array(vec![f.integer(0), f.undefined()]),
        None => failed(sink, path, "tokenize: unknown selection identifier"),
    }
}

trait ClonedVecOrEmpty {
    fn cloned_vec_or_empty(self) -> Vec<(String, DataItem)>;
}

impl ClonedVecOrEmpty for Option<&[(String, DataItem)]> {
    fn cloned_vec_or_empty(self) -> Vec<(String, DataItem)> {
        self.map(|s| s.to_vec()).unwrap_or_default()
    }
}
