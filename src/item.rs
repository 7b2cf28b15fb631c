/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! [`DataItem`]: the tagged-variant value tree shared by both codecs and the schema engine.
#[cfg(feature = "trace")]
use func_trace::trace;

use crate::status::DecodeStatus;
use crate::tags::Tags;

/// A single value in the data-item tree: a header (tags, mutability, indefinite-length,
/// decode-status) plus one of the fifteen variant payloads in [`DataItemValue`].
///
/// Container items built through the factory are mutable; items produced by a decoder are
/// immutable (`mutable == false`) and expose a read-only view of their children, matching the
/// source's builder/frozen split.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    tags: Tags,
    mutable: bool,
    indefinite: bool,
    status: DecodeStatus,
    value: DataItemValue,
}

/// The fifteen user data types a `DataItem` can hold, plus the decoder-only empty-map marker.
#[derive(Debug, Clone, PartialEq)]
pub enum DataItemValue {
    /// 64-bit signed integer (CBOR unsigned and negative collapse into this one variant).
    Integer(i64),
    /// IEEE-754 binary16, stored at full `f32` precision; encoders round-trip the original bits.
    FloatHalf(f32),
    /// IEEE-754 binary32.
    FloatStandard(f32),
    /// IEEE-754 binary64.
    FloatDouble(f64),
    /// `true`/`false`.
    Boolean(bool),
    /// The CBOR/JSON null value. Reads as `false` when queried as a boolean.
    Null,
    /// The CBOR undefined value. Reads as `false` when queried as a boolean.
    Undefined,
    /// A CBOR simple value outside the boolean/null/undefined range: `{0..19} ∪ {32..255}`.
    Simple(u8),
    /// Fixed-length UTF-8 text.
    TextString(String),
    /// An ordered sequence of UTF-8 segments decoded from an indefinite-length text string.
    TextStringList(Vec<String>),
    /// A fixed-length byte array.
    ByteString(Vec<u8>),
    /// An ordered sequence of byte segments decoded from an indefinite-length byte string.
    ByteStringList(Vec<Vec<u8>>),
    /// An ordered sequence of child items.
    Array(Vec<DataItem>),
    /// A mapping from text-string key to child item. Keys are unique.
    NamedMap(Vec<(String, DataItem)>),
    /// A mapping from signed 64-bit integer key to child item. Keys are unique.
    IndexedMap(Vec<(i64, DataItem)>),
    /// Decoder-only representation of a CBOR map that decoded with zero entries. Constructed maps
    /// always use `NamedMap` or `IndexedMap`, even when empty.
    EmptyMap,
}

impl DataItem {
    /// Construct a new item with the given payload, `Tags::None`, `indefinite = false`, and the
    /// given decode-status. This is the primitive constructor used by both the factory
    /// (`status = Original`) and the codecs (`status` reflects what was decoded).
    #[cfg_attr(feature = "trace", trace)]
    pub fn new(value: DataItemValue, mutable: bool, status: DecodeStatus) -> Self {
        let indefinite = matches!(
            value,
            DataItemValue::TextStringList(_) | DataItemValue::ByteStringList(_)
        );
        DataItem {
            tags: Tags::None,
            mutable,
            indefinite,
            status,
            value,
        }
    }

    /// Builder-style: attach `tags` to this item, replacing any existing tags.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Builder-style: mark this item (an array or map) as indefinite-length.
    pub fn with_indefinite(mut self, indefinite: bool) -> Self {
        self.indefinite = indefinite;
        self
    }

    /// The item's tag stack, rightmost innermost.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// `true` for factory-built items; `false` for decoder-produced items.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// `true` if this container was (or will be) encoded using CBOR indefinite-length form.
    /// Always `true` for `TextStringList`/`ByteStringList`.
    pub fn is_indefinite(&self) -> bool {
        self.indefinite
    }

    /// The item's decode-status.
    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    /// Shorthand for `self.status().is_failure()`.
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// The payload.
    pub fn value(&self) -> &DataItemValue {
        &self.value
    }

    /// A mutable view of the payload. Callers should not mutate items where `is_mutable()` is
    /// `false`; this is not enforced at runtime (matching the source's convention of an
    /// explicit freeze rather than interior-mutability policing).
    pub fn value_mut(&mut self) -> &mut DataItemValue {
        &mut self.value
    }

    /// Move the payload out, discarding the header.
    pub fn into_value(self) -> DataItemValue {
        self.value
    }

    /// Attempt to transition this item's status to `next`. Fails if the current status is a
    /// failure and `next` is not (invariant (a): a failure status cannot be un-set).
    #[cfg_attr(feature = "trace", trace)]
    pub fn set_status(&mut self, next: DecodeStatus) -> crate::error::Result<()> {
        self.status = self.status.transition(next)?;
        Ok(())
    }

    /// Construct a copy of this item with its status joined against `other`, used by container
    /// decoders to aggregate child statuses. Does not check monotonicity - callers join first,
    /// then the resulting compound item is assigned its status with `set_status` from its
    /// `Original` base.
    pub fn joined_status(statuses: impl IntoIterator<Item = DecodeStatus>) -> DecodeStatus {
        DecodeStatus::join_all(statuses)
    }

    /// The item as a signed 64-bit integer, if it is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            DataItemValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// The item as a double-precision float, widening `FloatHalf`/`FloatStandard` if needed.
    pub fn as_float(&self) -> Option<f64> {
        match self.value {
            DataItemValue::FloatHalf(v) | DataItemValue::FloatStandard(v) => Some(v as f64),
            DataItemValue::FloatDouble(v) => Some(v),
            _ => None,
        }
    }

    /// The item as a boolean. `Null` and `Undefined` read as `false`, matching the source's
    /// "absent value" convention - this is not the same as `as_bool_strict`, which only accepts
    /// `Boolean`.
    pub fn as_boolean(&self) -> Option<bool> {
        match self.value {
            DataItemValue::Boolean(v) => Some(v),
            DataItemValue::Null | DataItemValue::Undefined => Some(false),
            _ => None,
        }
    }

    /// The item as a boolean, accepting only the `Boolean` variant.
    pub fn as_bool_strict(&self) -> Option<bool> {
        match self.value {
            DataItemValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    /// `true` if this item is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self.value, DataItemValue::Null)
    }

    /// `true` if this item is `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self.value, DataItemValue::Undefined)
    }

    /// The item as a CBOR simple value.
    pub fn as_simple(&self) -> Option<u8> {
        match self.value {
            DataItemValue::Simple(v) => Some(v),
            _ => None,
        }
    }

    /// The item as a borrowed string slice, if it is a `TextString`. Does not concatenate
    /// `TextStringList` - use [`DataItem::concat_text`] for that.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            DataItemValue::TextString(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The item as a concatenated string: `TextString` as-is, `TextStringList` joined in order.
    pub fn concat_text(&self) -> Option<String> {
        match &self.value {
            DataItemValue::TextString(s) => Some(s.clone()),
            DataItemValue::TextStringList(segments) => Some(segments.concat()),
            _ => None,
        }
    }

    /// The item as a borrowed byte slice, if it is a `ByteString`. Does not concatenate
    /// `ByteStringList` - use [`DataItem::concat_bytes`] for that.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            DataItemValue::ByteString(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// The item as concatenated bytes: `ByteString` as-is, `ByteStringList` joined in order.
    pub fn concat_bytes(&self) -> Option<Vec<u8>> {
        match &self.value {
            DataItemValue::ByteString(b) => Some(b.clone()),
            DataItemValue::ByteStringList(segments) => {
                Some(segments.iter().flat_map(|s| s.iter().copied()).collect())
            }
            _ => None,
        }
    }

    /// The item's children, if it is an `Array`.
    pub fn as_array(&self) -> Option<&[DataItem]> {
        match &self.value {
            DataItemValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The item's entries, if it is a `NamedMap`.
    pub fn as_named_map(&self) -> Option<&[(String, DataItem)]> {
        match &self.value {
            DataItemValue::NamedMap(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    /// The item's entries, if it is an `IndexedMap`.
    pub fn as_indexed_map(&self) -> Option<&[(i64, DataItem)]> {
        match &self.value {
            DataItemValue::IndexedMap(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    /// `true` if this item is any of the three map variants (`NamedMap`, `IndexedMap`,
    /// `EmptyMap`).
    pub fn is_map(&self) -> bool {
        matches!(
            self.value,
            DataItemValue::NamedMap(_) | DataItemValue::IndexedMap(_) | DataItemValue::EmptyMap
        )
    }

    /// Look up `key` in a `NamedMap`, or fall back to `None` (including for `EmptyMap`).
    pub fn named_get(&self, key: &str) -> Option<&DataItem> {
        match &self.value {
            DataItemValue::NamedMap(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Look up `key` in an `IndexedMap`, or fall back to `None` (including for `EmptyMap`).
    pub fn indexed_get(&self, key: i64) -> Option<&DataItem> {
        match &self.value {
            DataItemValue::IndexedMap(entries) => {
                entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_lists_are_always_indefinite() {
        let item = DataItem::new(
            DataItemValue::TextStringList(vec!["a".into()]),
            false,
            DecodeStatus::Translatable,
        );
        assert!(item.is_indefinite());
    }

    #[test]
    fn null_and_undefined_read_as_false() {
        let null = DataItem::new(DataItemValue::Null, true, DecodeStatus::Original);
        let undef = DataItem::new(DataItemValue::Undefined, true, DecodeStatus::Original);
        assert_eq!(null.as_boolean(), Some(false));
        assert_eq!(undef.as_boolean(), Some(false));
    }

    #[test]
    fn failure_status_cannot_be_cleared() {
        let mut item = DataItem::new(DataItemValue::Null, false, DecodeStatus::Invalid);
        assert!(item.set_status(DecodeStatus::WellFormed).is_err());
        assert!(item.set_status(DecodeStatus::Unsupported).is_ok());
    }
}
