/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! Parses a schema document - itself a `NAMED_MAP` `DataItem` - into a [`SchemaNode`] tree.
#[cfg(feature = "trace")]
use func_trace::trace;

use std::collections::HashSet;

use crate::error::{BuildResult, SchemaBuildError};
use crate::item::DataItem;
use crate::schema::definition::SchemaDefinition;
use crate::schema::node::{Format, NodeKind, Precision, Property, Record, SchemaNode, JS_SAFE_INT};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

const TYPE_NAMES: &[&str] = &[
    "boolean",
    "integer",
    "number",
    "string",
    "encoded",
    "enumerated",
    "array",
    "map",
    "object",
    "structure",
    "selection",
];

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

fn err(path: &str, reason: impl Into<String>) -> SchemaBuildError {
    SchemaBuildError::new(path, reason)
}

fn require_map<'a>(doc: &'a DataItem, path: &str) -> BuildResult<&'a [(String, DataItem)]> {
    doc.as_named_map()
        .ok_or_else(|| err(path, "expected a named map"))
}

fn get_text<'a>(doc: &'a [(String, DataItem)], key: &str) -> Option<&'a str> {
    doc.iter().find(|(k, _)| k == key).and_then(|(_, v)| v.as_text())
}

fn require_text<'a>(doc: &'a [(String, DataItem)], key: &str, path: &str) -> BuildResult<&'a str> {
    get_text(doc, key).ok_or_else(|| err(&child_path(path, key), "expected a text string"))
}

fn get_integer(doc: &[(String, DataItem)], key: &str) -> Option<i64> {
    doc.iter().find(|(k, _)| k == key).and_then(|(_, v)| v.as_integer())
}

fn get_float(doc: &[(String, DataItem)], key: &str) -> Option<f64> {
    doc.iter().find(|(k, _)| k == key).and_then(|(_, v)| v.as_float())
}

fn get_bool(doc: &[(String, DataItem)], key: &str, default: bool) -> bool {
    doc.iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.as_bool_strict())
        .unwrap_or(default)
}

fn get_entry<'a>(doc: &'a [(String, DataItem)], key: &str) -> Option<&'a DataItem> {
    doc.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn get_length(doc: &[(String, DataItem)], key: &str, default: usize) -> BuildResult<usize> {
    match get_integer(doc, key) {
        Some(v) if v >= 0 => Ok(v as usize),
        Some(_) => Err(err(key, "length must be non-negative")),
        None => Ok(default),
    }
}

/// Parses a schema document. A node's `"type"` field either names one of the eleven built-in
/// variants, or names a `definitions` entry - the latter are re-parsed at every reference site
/// (prototype duplication), so each reference gets its own independent `SchemaNode`: local common
/// attributes at a reference site override the ones baked into the definition.
pub struct SchemaBuilder<'a> {
    definitions: &'a [(String, DataItem)],
    in_progress: HashSet<String>,
}

impl<'a> SchemaBuilder<'a> {
    fn new(definitions: &'a [(String, DataItem)]) -> Self {
        SchemaBuilder {
            definitions,
            in_progress: HashSet::new(),
        }
    }

    /// Build a [`SchemaDefinition`] from a top-level document with `title`, `definitions`
    /// (optional) and `root` keys.
    #[cfg_attr(feature = "trace", trace)]
    pub fn build(document: &DataItem) -> BuildResult<SchemaDefinition> {
        let top = require_map(document, "")?;
        let title = get_text(top, "title").unwrap_or("").to_string();
        let empty: Vec<(String, DataItem)> = Vec::new();
        let definitions = get_entry(top, "definitions")
            .map(|d| require_map(d, "definitions"))
            .transpose()?
            .unwrap_or(&empty);
        let root_doc = get_entry(top, "root").ok_or_else(|| err("root", "missing root node"))?;

        let mut builder = SchemaBuilder::new(definitions);
        let root = builder.parse_node(root_doc, "root")?;
        Ok(SchemaDefinition::new(title, root))
    }

    fn resolve_definition(&self, name: &str, path: &str) -> BuildResult<&'a DataItem> {
        self.definitions
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| err(path, format!("unknown definition `{}`", name)))
    }

    fn parse_node(&mut self, doc: &DataItem, path: &str) -> BuildResult<SchemaNode> {
        let fields = require_map(doc, path)?;
        let type_name = require_text(fields, "type", path)?;

        if !TYPE_NAMES.contains(&type_name) {
            // Not a built-in variant: the `type` field names a `definitions` prototype.
            if self.in_progress.contains(type_name) {
                return Err(err(path, format!("circular reference to `{}`", type_name)));
            }
            let target = self.resolve_definition(type_name, path)?;
            self.in_progress.insert(type_name.to_string());
            let mut node = self.parse_node(target, &child_path(path, type_name))?;
            self.in_progress.remove(type_name);

            if let Some(name) = get_text(fields, "name") {
                node.name = Some(name.to_string());
            }
            if let Some(description) = get_text(fields, "description") {
                node.description = Some(description.to_string());
            }
            if let Some(token) = get_integer(fields, "tokenValue") {
                node.token_value = Some(token);
            }
            node.optional = get_bool(fields, "optional", node.optional);
            if let Some(tags) = get_entry(fields, "tagValues").and_then(|v| v.as_array()) {
                node.tag_values = tags.iter().filter_map(DataItem::as_integer).map(|v| v as u32).collect();
            }
            return Ok(node);
        }

        let name = get_text(fields, "name").map(str::to_string);
        let description = get_text(fields, "description").map(str::to_string);
        let token_value = get_integer(fields, "tokenValue");
        let optional = get_bool(fields, "optional", false);
        let tag_values = get_entry(fields, "tagValues")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(DataItem::as_integer).map(|v| v as u32).collect())
            .unwrap_or_default();

        let kind = match type_name {
            "boolean" => self.parse_boolean(fields),
            "integer" => self.parse_integer(fields, path)?,
            "number" => self.parse_number(fields, path)?,
            "string" => self.parse_text_string(fields, path)?,
            "encoded" => self.parse_byte_string(fields, path)?,
            "enumerated" => self.parse_enumerated(fields, path)?,
            "array" => self.parse_array(fields, path)?,
            "map" => self.parse_map(fields, path)?,
            "object" => self.parse_object(fields, path)?,
            "structure" => self.parse_structure(fields, path)?,
            "selection" => self.parse_selection(fields, path)?,
            _ => unreachable!("type_name already validated against TYPE_NAMES"),
        };

        Ok(SchemaNode {
            name,
            description,
            tag_values,
            token_value,
            optional,
            kind,
        })
    }

    fn parse_boolean(&self, fields: &[(String, DataItem)]) -> NodeKind {
        NodeKind::Boolean {
            default: get_entry(fields, "default").and_then(DataItem::as_bool_strict).unwrap_or(false),
        }
    }

    fn parse_integer(&self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let min_value = get_integer(fields, "minValue").unwrap_or(-JS_SAFE_INT).max(-JS_SAFE_INT);
        let max_value = get_integer(fields, "maxValue").unwrap_or(JS_SAFE_INT).min(JS_SAFE_INT);
        if min_value > max_value {
            return Err(err(path, "minValue exceeds maxValue"));
        }
        let default = get_integer(fields, "default").unwrap_or(0);
        Ok(NodeKind::Integer {
            default,
            min_value,
            max_value,
        })
    }

    fn parse_number(&self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let precision = match get_text(fields, "precision") {
            Some("half") => Precision::Half,
            Some("standard") => Precision::Standard,
            Some("double") | None => Precision::Double,
            Some(other) => return Err(err(&child_path(path, "precision"), format!("unknown precision `{}`", other))),
        };
        let min_value = get_float(fields, "minValue").unwrap_or(-(JS_SAFE_INT as f64));
        let max_value = get_float(fields, "maxValue").unwrap_or(JS_SAFE_INT as f64);
        if min_value > max_value {
            return Err(err(path, "minValue exceeds maxValue"));
        }
        let default = get_float(fields, "default").unwrap_or(0.0);
        Ok(NodeKind::Number {
            precision,
            default,
            min_value,
            max_value,
        })
    }

    fn parse_text_string(&self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let min_length = get_length(fields, "minLength", 0)?;
        let max_length = get_length(fields, "maxLength", usize::MAX)?;
        if min_length > max_length {
            return Err(err(path, "minLength exceeds maxLength"));
        }
        let default = get_text(fields, "default").unwrap_or("").to_string();
        Ok(NodeKind::TextString {
            default,
            min_length,
            max_length,
        })
    }

    fn parse_byte_string(&self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let min_length = get_length(fields, "minLength", 0)?;
        let max_length = get_length(fields, "maxLength", usize::MAX)?;
        if min_length > max_length {
            return Err(err(path, "minLength exceeds maxLength"));
        }
        let default = match get_text(fields, "default") {
            Some(text) => crate::base64url::decode(text)
                .map_err(|_| err(&child_path(path, "default"), "invalid base64url text"))?,
            None => Vec::new(),
        };
        Ok(NodeKind::ByteString {
            default,
            min_length,
            max_length,
        })
    }

    fn parse_enumerated(&self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let is_final = get_bool(fields, "final", false);
        let values_path = child_path(path, "values");
        let raw = get_entry(fields, "values")
            .and_then(|v| v.as_array())
            .ok_or_else(|| err(&values_path, "expected an array"))?;
        let mut values = Vec::with_capacity(raw.len());
        let mut seen = HashSet::new();
        for (i, entry) in raw.iter().enumerate() {
            let entry_path = index_path(&values_path, i);
            let entry_fields = require_map(entry, &entry_path)?;
            let name = require_text(entry_fields, "name", &entry_path)?.to_string();
            let token = get_integer(entry_fields, "token")
                .ok_or_else(|| err(&child_path(&entry_path, "token"), "expected an integer"))?;
            if !seen.insert(name.clone()) {
                return Err(err(&entry_path, format!("duplicate enumerated value `{}`", name)));
            }
            values.push((name, token));
        }
        let default = require_text(fields, "default", path)?.to_string();
        Ok(NodeKind::Enumerated {
            default,
            is_final,
            values,
        })
    }

    fn parse_array(&mut self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let length = get_integer(fields, "length");
        let has_min_or_max = get_entry(fields, "minLength").is_some() || get_entry(fields, "maxLength").is_some();
        let (min_length, max_length) = match length {
            Some(_) if has_min_or_max => {
                return Err(err(path, "length cannot be combined with minLength/maxLength"));
            }
            Some(length) => {
                if length < 0 {
                    return Err(err(&child_path(path, "length"), "length must be non-negative"));
                }
                (length as usize, length as usize)
            }
            None => {
                let min_length = get_length(fields, "minLength", 0)?;
                let max_length = get_length(fields, "maxLength", usize::MAX)?;
                (min_length, max_length)
            }
        };
        if min_length > max_length {
            return Err(err(path, "minLength exceeds maxLength"));
        }
        let entries_path = child_path(path, "entries");
        let entries_doc = get_entry(fields, "entries").ok_or_else(|| err(&entries_path, "missing entries"))?;
        let values_schema = Box::new(self.parse_node(entries_doc, &entries_path)?);
        Ok(NodeKind::Array {
            values_schema,
            min_length,
            max_length,
        })
    }

    fn parse_map(&mut self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let entries_path = child_path(path, "entries");
        let entries_doc = get_entry(fields, "entries").ok_or_else(|| err(&entries_path, "missing entries"))?;
        let values_schema = Box::new(self.parse_node(entries_doc, &entries_path)?);
        Ok(NodeKind::Map { values_schema })
    }

    fn parse_object(&mut self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let is_final = get_bool(fields, "final", false);
        let tokenize = get_bool(fields, "tokenize", false);
        let properties_path = child_path(path, "properties");
        let raw = get_entry(fields, "properties")
            .and_then(|v| v.as_array())
            .ok_or_else(|| err(&properties_path, "expected an array"))?;
        let mut properties = Vec::with_capacity(raw.len());
        let mut seen_names = HashSet::new();
        let mut seen_tokens = HashSet::new();
        for (i, entry) in raw.iter().enumerate() {
            let entry_path = index_path(&properties_path, i);
            let entry_fields = require_map(entry, &entry_path)?;
            let name = require_text(entry_fields, "name", &entry_path)?.to_string();
            if !seen_names.insert(name.clone()) {
                return Err(err(&entry_path, format!("duplicate property name `{}`", name)));
            }
            let token = if tokenize {
                let token = get_integer(entry_fields, "token")
                    .ok_or_else(|| err(&child_path(&entry_path, "token"), "expected an integer"))?;
                if !seen_tokens.insert(token) {
                    return Err(err(&entry_path, format!("duplicate property token `{}`", token)));
                }
                Some(token)
            } else {
                None
            };
            let schema_doc = get_entry(entry_fields, "schema")
                .ok_or_else(|| err(&child_path(&entry_path, "schema"), "missing schema"))?;
            let schema = self.parse_node(schema_doc, &child_path(&entry_path, "schema"))?;
            let required = get_bool(entry_fields, "required", false);
            properties.push(Property {
                name,
                schema,
                required,
                token,
            });
        }
        if tokenize {
            Ok(NodeKind::TokenizableObject { properties, is_final })
        } else {
            Ok(NodeKind::StandardObject { properties, is_final })
        }
    }

    fn parse_structure(&mut self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let is_final = get_bool(fields, "final", false);
        let records_path = child_path(path, "records");
        let raw = get_entry(fields, "records")
            .and_then(|v| v.as_array())
            .ok_or_else(|| err(&records_path, "expected an array"))?;
        let n = raw.len();
        let mut records = Vec::with_capacity(n);
        let mut seen_names = HashSet::new();
        let mut seen_indices = HashSet::new();
        for (i, entry) in raw.iter().enumerate() {
            let entry_path = index_path(&records_path, i);
            let entry_fields = require_map(entry, &entry_path)?;
            let name = require_text(entry_fields, "name", &entry_path)?.to_string();
            if !seen_names.insert(name.clone()) {
                return Err(err(&entry_path, format!("duplicate record name `{}`", name)));
            }
            let index_path_str = child_path(&entry_path, "index");
            let index = get_integer(entry_fields, "index")
                .ok_or_else(|| err(&index_path_str, "expected an integer"))?;
            if index < 0 || index as usize >= n {
                return Err(err(&index_path_str, "index must lie in [0, N)"));
            }
            let index = index as usize;
            if !seen_indices.insert(index) {
                return Err(err(&index_path_str, format!("duplicate record index `{}`", index)));
            }
            let schema_doc = get_entry(entry_fields, "schema")
                .ok_or_else(|| err(&child_path(&entry_path, "schema"), "missing schema"))?;
            let schema = self.parse_node(schema_doc, &child_path(&entry_path, "schema"))?;
            let required = get_bool(entry_fields, "required", false);
            records.push(Record {
                name,
                schema,
                required,
                index,
            });
        }
        Ok(NodeKind::Structure { records, is_final })
    }

    fn parse_selection(&mut self, fields: &[(String, DataItem)], path: &str) -> BuildResult<NodeKind> {
        let is_final = get_bool(fields, "final", false);
        let formats_path = child_path(path, "formats");
        let raw = get_entry(fields, "formats")
            .and_then(|v| v.as_array())
            .ok_or_else(|| err(&formats_path, "expected an array"))?;
        let mut formats = Vec::with_capacity(raw.len());
        let mut seen_ids = HashSet::new();
        let mut seen_tokens = HashSet::new();
        for (i, entry) in raw.iter().enumerate() {
            let entry_path = index_path(&formats_path, i);
            let entry_fields = require_map(entry, &entry_path)?;
            let identifier = require_text(entry_fields, "identifier", &entry_path)?.to_string();
            if !seen_ids.insert(identifier.clone()) {
                return Err(err(&entry_path, format!("duplicate format identifier `{}`", identifier)));
            }
            let token = get_integer(entry_fields, "token")
                .ok_or_else(|| err(&child_path(&entry_path, "token"), "expected an integer"))?;
            if !seen_tokens.insert(token) {
                return Err(err(&entry_path, format!("duplicate format token `{}`", token)));
            }
            let schema_doc = get_entry(entry_fields, "schema")
                .ok_or_else(|| err(&child_path(&entry_path, "schema"), "missing schema"))?;
            let schema = self.parse_node(schema_doc, &child_path(&entry_path, "schema"))?;
            formats.push(Format {
                identifier,
                schema,
                token,
            });
        }
        let default = require_text(fields, "default", path)?.to_string();
        if !formats.iter().any(|f| f.identifier == default) {
            return Err(err(&child_path(path, "default"), format!("default `{}` names no format", default)));
        }
        Ok(NodeKind::Selection {
            formats,
            default,
            is_final,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DataItemFactory;

    fn leaf(f: &DataItemFactory, type_name: &str) -> DataItem {
        f.named_map(vec![("type".to_string(), f.text_string(type_name))])
            .unwrap()
    }

    #[test]
    fn builds_a_minimal_boolean_root() {
        let f = DataItemFactory::new();
        let document = f
            .named_map(vec![("root".to_string(), leaf(&f, "boolean"))])
            .unwrap();
        let definition = SchemaBuilder::build(&document).unwrap();
        assert!(matches!(definition.root().kind, NodeKind::Boolean { .. }));
    }

    #[test]
    fn missing_root_is_a_build_error() {
        let f = DataItemFactory::new();
        let document = f.named_map(vec![]).unwrap();
        let error = SchemaBuilder::build(&document).unwrap_err();
        assert_eq!(error.path, "root");
    }

    #[test]
    fn unknown_type_name_is_a_build_error() {
        let f = DataItemFactory::new();
        let document = f
            .named_map(vec![("root".to_string(), leaf(&f, "not_a_type"))])
            .unwrap();
        assert!(SchemaBuilder::build(&document).is_err());
    }

    #[test]
    fn tokenizable_object_rejects_duplicate_tokens() {
        let f = DataItemFactory::new();
        let property = |name: &str, token: i64| {
            f.named_map(vec![
                ("name".to_string(), f.text_string(name)),
                ("token".to_string(), f.integer(token)),
                ("schema".to_string(), leaf(&f, "boolean")),
            ])
            .unwrap()
        };
        let root = f
            .named_map(vec![
                ("type".to_string(), f.text_string("object")),
                ("tokenize".to_string(), f.boolean(true)),
                (
                    "properties".to_string(),
                    f.array(vec![property("a", 1), property("b", 1)]),
                ),
            ])
            .unwrap();
        let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
        assert!(SchemaBuilder::build(&document).is_err());
    }

    #[test]
    fn structure_rejects_an_index_outside_the_permutation_range() {
        let f = DataItemFactory::new();
        let record = |name: &str, index: i64| {
            f.named_map(vec![
                ("name".to_string(), f.text_string(name)),
                ("index".to_string(), f.integer(index)),
                ("schema".to_string(), leaf(&f, "boolean")),
            ])
            .unwrap()
        };
        let root = f
            .named_map(vec![
                ("type".to_string(), f.text_string("structure")),
                ("records".to_string(), f.array(vec![record("a", 0), record("b", 2)])),
            ])
            .unwrap();
        let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
        assert!(SchemaBuilder::build(&document).is_err());
    }

    #[test]
    fn reference_to_definition_overrides_local_attributes() {
        let f = DataItemFactory::new();
        let definitions = f
            .named_map(vec![("Flag".to_string(), leaf(&f, "boolean"))])
            .unwrap();
        let reference = f
            .named_map(vec![
                ("type".to_string(), f.text_string("Flag")),
                ("optional".to_string(), f.boolean(true)),
            ])
            .unwrap();
        let document = f
            .named_map(vec![
                ("definitions".to_string(), definitions),
                ("root".to_string(), reference),
            ])
            .unwrap();
        let definition = SchemaBuilder::build(&document).unwrap();
        assert!(definition.root().optional);
    }
}
