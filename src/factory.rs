/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! [`DataItemFactory`]: constructors that enforce the variant invariants the type system can't.
#[cfg(feature = "trace")]
use func_trace::trace;

use crate::base64url;
use crate::error::{Result, StreamError};
use crate::item::{DataItem, DataItemValue};
use crate::status::DecodeStatus;
use crate::tags::Tags;

/// Builds `DataItem`s with `mutable = true` and `status = Original`, rejecting constructions that
/// violate a variant's hard invariant (the Simple-value reserved range, non-UTF8-decodable
/// Base64 text).
///
/// Stateless - a unit struct so it composes with the rest of the public API the way the source's
/// `dataItemFactory()` service-root method implies, without needing to thread any state through.
#[derive(Debug, Default, Copy, Clone)]
pub struct DataItemFactory;

impl DataItemFactory {
    /// A fresh factory.
    pub fn new() -> Self {
        DataItemFactory
    }

    fn build(&self, value: DataItemValue) -> DataItem {
        DataItem::new(value, true, DecodeStatus::Original)
    }

    /// `INTEGER(value)`.
    #[cfg_attr(feature = "trace", trace)]
    pub fn integer(&self, value: i64) -> DataItem {
        self.build(DataItemValue::Integer(value))
    }

    /// `FLOAT_HALF(value)`. The full-precision `f32` is retained; encoders narrow it to binary16
    /// on the wire.
    pub fn float_half(&self, value: f32) -> DataItem {
        self.build(DataItemValue::FloatHalf(value))
    }

    /// `FLOAT_STANDARD(value)`.
    pub fn float_standard(&self, value: f32) -> DataItem {
        self.build(DataItemValue::FloatStandard(value))
    }

    /// `FLOAT_DOUBLE(value)`.
    pub fn float_double(&self, value: f64) -> DataItem {
        self.build(DataItemValue::FloatDouble(value))
    }

    /// `BOOLEAN(value)`.
    pub fn boolean(&self, value: bool) -> DataItem {
        self.build(DataItemValue::Boolean(value))
    }

    /// `NULL`.
    pub fn null(&self) -> DataItem {
        self.build(DataItemValue::Null)
    }

    /// `UNDEFINED`.
    pub fn undefined(&self) -> DataItem {
        self.build(DataItemValue::Undefined)
    }

    /// `SIMPLE(value)`. Rejects the reserved `20..=31` range, which overlaps the fixed
    /// boolean/null/undefined/break encodings.
    #[cfg_attr(feature = "trace", trace)]
    pub fn simple(&self, value: u8) -> Result<DataItem> {
        if (20..=31).contains(&value) {
            return Err(StreamError::IllegalConstruction(
                "simple value 20..=31 is reserved",
            ));
        }
        Ok(self.build(DataItemValue::Simple(value)))
    }

    /// `TEXT_STRING(value)`.
    pub fn text_string(&self, value: impl Into<String>) -> DataItem {
        self.build(DataItemValue::TextString(value.into()))
    }

    /// `TEXT_STRING_LIST(segments)`.
    pub fn text_string_list(&self, segments: Vec<String>) -> DataItem {
        self.build(DataItemValue::TextStringList(segments))
    }

    /// `BYTE_STRING(value)`.
    pub fn byte_string(&self, value: impl Into<Vec<u8>>) -> DataItem {
        self.build(DataItemValue::ByteString(value.into()))
    }

    /// `BYTE_STRING_LIST(segments)`.
    pub fn byte_string_list(&self, segments: Vec<Vec<u8>>) -> DataItem {
        self.build(DataItemValue::ByteStringList(segments))
    }

    /// `BYTE_STRING` decoded from Base64-URL-without-padding text.
    #[cfg_attr(feature = "trace", trace)]
    pub fn byte_string_from_base64(&self, text: &str) -> Result<DataItem> {
        let bytes = base64url::decode(text)
            .map_err(|_| StreamError::IllegalConstruction("invalid base64url text"))?;
        Ok(self.build(DataItemValue::ByteString(bytes)))
    }

    /// `ARRAY(items)`.
    pub fn array(&self, items: Vec<DataItem>) -> DataItem {
        self.build(DataItemValue::Array(items))
    }

    /// `NAMED_MAP(entries)`. Rejects duplicate keys - constructed maps must have unique keys;
    /// only the decoder tolerates duplicates (downgrading to `WELL_FORMED`).
    #[cfg_attr(feature = "trace", trace)]
    pub fn named_map(&self, entries: Vec<(String, DataItem)>) -> Result<DataItem> {
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                if entries[i].0 == entries[j].0 {
                    return Err(StreamError::IllegalConstruction(
                        "named map keys must be unique",
                    ));
                }
            }
        }
        Ok(self.build(DataItemValue::NamedMap(entries)))
    }

    /// `INDEXED_MAP(entries)`. Rejects duplicate keys, as with [`Self::named_map`].
    #[cfg_attr(feature = "trace", trace)]
    pub fn indexed_map(&self, entries: Vec<(i64, DataItem)>) -> Result<DataItem> {
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                if entries[i].0 == entries[j].0 {
                    return Err(StreamError::IllegalConstruction(
                        "indexed map keys must be unique",
                    ));
                }
            }
        }
        Ok(self.build(DataItemValue::IndexedMap(entries)))
    }

    /// Build an already-invalid item carrying `status`, for callers that need to synthesise a
    /// failure result (the schema engine's `FAILED_SCHEMA` returns use this).
    pub fn invalid(&self, status: DecodeStatus) -> DataItem {
        let mut item = self.build(DataItemValue::Undefined);
        // An Original-status item can always transition to a failure status.
        item.set_status(status)
            .expect("Original always accepts a failure transition");
        item
    }

    /// Attach `tags` to `item`, replacing any it already carries.
    pub fn with_tags(&self, item: DataItem, tags: Tags) -> DataItem {
        item.with_tags(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_rejects_reserved_range() {
        let f = DataItemFactory::new();
        assert!(f.simple(20).is_err());
        assert!(f.simple(31).is_err());
        assert!(f.simple(19).is_ok());
        assert!(f.simple(32).is_ok());
    }

    #[test]
    fn named_map_rejects_duplicate_keys() {
        let f = DataItemFactory::new();
        let entries = vec![
            ("a".to_string(), f.integer(1)),
            ("a".to_string(), f.integer(2)),
        ];
        assert!(f.named_map(entries).is_err());
    }

    #[test]
    fn built_items_are_mutable_and_original() {
        let f = DataItemFactory::new();
        let item = f.integer(5);
        assert!(item.is_mutable());
        assert_eq!(item.status(), DecodeStatus::Original);
    }
}
