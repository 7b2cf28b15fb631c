/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
#![warn(missing_docs)]

//! # ditem
//!
//! `ditem` is a data-item value model with CBOR ([RFC 8949](https://www.rfc-editor.org/rfc/rfc8949))
//! and JSON ([RFC 8259](https://www.rfc-editor.org/rfc/rfc8259)) codecs, plus a schema engine that
//! validates, defaults, expands and tokenises documents built from that value model.
//!
//! A [`item::DataItem`] is the crate's single currency: both codecs decode into it and encode from
//! it, and the schema engine operates entirely in terms of it, so a document can move between wire
//! formats without ever round-tripping through an intermediate Rust type.
//!
//! ## Building values
//!
//! [`factory::DataItemFactory`] is the only supported way to construct a [`item::DataItem`] by
//! hand; it enforces invariants the type system can't (unique map keys, the reserved `SIMPLE`
//! value range).
//!
//! ```
//! use ditem::factory::DataItemFactory;
//!
//! let f = DataItemFactory::new();
//! let item = f.named_map(vec![("count".to_string(), f.integer(3))]).unwrap();
//! ```
//!
//! ## Codecs
//!
//! [`cbor::decode_cbor`]/[`cbor::encode_cbor`] and [`json::decode_json`]/[`json::encode_json`]
//! convert between a [`item::DataItem`] and its wire form. Every decoded item carries a
//! [`status::DecodeStatus`] describing how much of it could be trusted.
//!
//! ## Schemas
//!
//! A [`schema::SchemaDefinition`] is built once from a schema document (itself a `DataItem`) via
//! [`schema::SchemaBuilder::build`], then reused to validate, default, expand and tokenise any
//! number of documents against it.
pub mod base64url;
pub mod cbor;
pub mod constants;
pub mod error;
pub mod factory;
pub mod item;
pub mod json;
pub mod schema;
pub mod status;
pub mod tags;
mod utils;

pub use cbor::{decode_cbor, encode_cbor};
pub use factory::DataItemFactory;
pub use item::{DataItem, DataItemValue};
pub use json::{decode_json, encode_json};
pub use schema::{SchemaBuilder, SchemaDefinition};
pub use status::DecodeStatus;
pub use tags::Tags;
