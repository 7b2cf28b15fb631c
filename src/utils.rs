/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
/***************************************************************************************************
 * Shared low-level helpers used by both the CBOR and JSON codecs.
 **************************************************************************************************/
#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Return `true` if it is possible to obtain a slice of length `len` starting from `start` from
/// `buf`, without overflow.
#[cfg_attr(feature = "trace", trace)]
#[inline]
pub fn within(buf: &[u8], start: usize, len: usize) -> bool {
    start.checked_add(len).map_or(false, |end| end <= buf.len())
}

/// The implementation-defined upper bound on any single payload length or container size:
/// `[0, 2^31)`.
pub const MAX_LENGTH: u64 = 1 << 31;
