/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The JSON codec (RFC 8259) with Base64-URL byte strings, non-finite-float-as-null, and
//! comment-tolerant decoding.
mod decode;
mod encode;

pub use decode::decode_json;
pub use encode::encode_json;
