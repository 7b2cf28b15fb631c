/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The binary CBOR codec (RFC 8949).
mod decode;
mod encode;

pub use decode::decode_cbor;
pub use encode::encode_cbor;
