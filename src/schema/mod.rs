/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The schema engine: twelve node shapes, each able to synthesise a default value, validate a
//! document structurally, and convert between tokenised and expanded wire forms.
pub mod builder;
pub mod definition;
pub mod node;
pub mod sink;

pub use builder::SchemaBuilder;
pub use definition::SchemaDefinition;
pub use node::{Format, NodeKind, Precision, Property, Record, SchemaNode};
pub use sink::{NullSink, VecSink, WarningSink};
