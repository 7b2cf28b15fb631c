/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! [`SchemaDefinition`]: the built, immutable schema that documents are validated, defaulted,
//! expanded and tokenised against.
#[cfg(feature = "trace")]
use func_trace::trace;

use crate::item::DataItem;
use crate::schema::node::SchemaNode;
use crate::schema::sink::{NullSink, WarningSink};

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// A built schema, ready to drive `createDefault`/`validate`/`expand`/`tokenize` against
/// documents. Obtained from [`crate::schema::SchemaBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    title: String,
    root: SchemaNode,
}

impl SchemaDefinition {
    pub(crate) fn new(title: String, root: SchemaNode) -> Self {
        SchemaDefinition { title, root }
    }

    /// The document's `title`, or the empty string if none was given.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The root schema node.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Synthesise a document satisfying this schema. `include_all = false` omits every optional
    /// field; `true` fills them in with their own defaults too.
    pub fn create_default(&self, include_all: bool) -> DataItem {
        self.root.create_default(include_all)
    }

    /// Structural check of `item` against this schema, recursing into every child. `is_tokenized`
    /// selects which of a node's two wire forms (tokenised or expanded) is expected.
    pub fn validate(&self, item: &DataItem, is_tokenized: bool) -> bool {
        self.validate_with(item, is_tokenized, &NullSink)
    }

    /// As [`Self::validate`], but diagnostics are written to `sink` instead of discarded.
    #[cfg_attr(feature = "trace", trace)]
    pub fn validate_with(&self, item: &DataItem, is_tokenized: bool, sink: &dyn WarningSink) -> bool {
        self.root.validate(item, is_tokenized, true, "", sink)
    }

    /// Convert a tokenised-form document to its expanded form, failing (`FAILED_SCHEMA`) if
    /// `item` does not match the tokenised schema.
    pub fn expand(&self, item: &DataItem) -> DataItem {
        self.expand_with(item, &NullSink)
    }

    /// As [`Self::expand`], but diagnostics are written to `sink`.
    pub fn expand_with(&self, item: &DataItem, sink: &dyn WarningSink) -> DataItem {
        self.root.expand(item, "", sink)
    }

    /// Convert an expanded-form document to its tokenised form, failing (`FAILED_SCHEMA`) if
    /// `item` does not match the expanded schema.
    pub fn tokenize(&self, item: &DataItem) -> DataItem {
        self.tokenize_with(item, &NullSink)
    }

    /// As [`Self::tokenize`], but diagnostics are written to `sink`.
    pub fn tokenize_with(&self, item: &DataItem, sink: &dyn WarningSink) -> DataItem {
        self.root.tokenize(item, "", sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DataItemFactory;
    use crate::schema::builder::SchemaBuilder;
    use crate::schema::sink::VecSink;

    fn boolean_definition() -> SchemaDefinition {
        let f = DataItemFactory::new();
        let root = f
            .named_map(vec![("type".to_string(), f.text_string("boolean"))])
            .unwrap();
        let document = f.named_map(vec![("root".to_string(), root)]).unwrap();
        SchemaBuilder::build(&document).unwrap()
    }

    #[test]
    fn create_default_round_trips_through_validate() {
        let definition = boolean_definition();
        let default = definition.create_default(false);
        assert!(definition.validate(&default, true));
        assert!(definition.validate(&default, false));
    }

    #[test]
    fn failing_validation_is_reported_to_the_sink() {
        let definition = boolean_definition();
        let f = DataItemFactory::new();
        let sink = VecSink::new();
        assert!(!definition.validate_with(&f.integer(1), true, &sink));
        assert_eq!(sink.warnings().len(), 1);
    }
}
