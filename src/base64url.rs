/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! Base64-URL-without-padding carriage for byte strings in JSON and in the schema engine's
//! `encoded` node.
//!
//! Length ≡ 0 mod 4 accepts optional padding; ≡ 2 or 3 mod 4 is valid unpadded; ≡ 1 mod 4 is
//! always invalid (no valid bit grouping can produce it).
#[cfg(feature = "trace")]
use func_trace::trace;

use base64::{
    alphabet,
    engine,
    engine::general_purpose::GeneralPurposeConfig,
    engine::DecodePaddingMode,
    Engine as _,
};

fn engine_no_pad() -> engine::GeneralPurpose {
    engine::GeneralPurpose::new(
        &alphabet::URL_SAFE,
        GeneralPurposeConfig::new()
            .with_encode_padding(false)
            .with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

fn engine_with_pad() -> engine::GeneralPurpose {
    engine::GeneralPurpose::new(
        &alphabet::URL_SAFE,
        GeneralPurposeConfig::new().with_encode_padding(true),
    )
}

/// Decode Base64-URL text. Padding is optional when present but the unpadded length modulus
/// must be 0, 2 or 3; a length ≡ 1 mod 4 is rejected before even calling into the decoder.
#[cfg_attr(feature = "trace", trace)]
pub fn decode(text: &str) -> Result<Vec<u8>, ()> {
    let unpadded_len = text.trim_end_matches('=').len();
    if unpadded_len % 4 == 1 {
        return Err(());
    }
    let has_padding = unpadded_len != text.len();
    let result = if has_padding {
        engine_with_pad().decode(text)
    } else {
        engine_no_pad().decode(text)
    };
    result.map_err(|_| ())
}

/// Encode `bytes` as Base64-URL text without padding.
#[cfg_attr(feature = "trace", trace)]
pub fn encode(bytes: &[u8]) -> String {
    engine_no_pad().encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let bytes = b"hello world, this is a test!!";
        let text = encode(bytes);
        assert_eq!(decode(&text).unwrap(), bytes);
    }

    #[test]
    fn length_mod_4_of_1_is_invalid() {
        // 5 chars -> unpadded len 5 -> 5 % 4 == 1
        assert!(decode("AAAAA").is_err());
    }

    #[test]
    fn padding_is_optional_at_mod_0() {
        let encoded_padded = engine_with_pad().encode(b"ab");
        assert!(encoded_padded.ends_with('='));
        assert_eq!(decode(&encoded_padded).unwrap(), b"ab");
    }
}
