//! Legacy Korean text decoding
//!
//! Every text field in the supported formats is EUC-KR (a superset of
//! ASCII). Decoding is strict: a malformed sequence is reported instead of
//! being replaced with U+FFFD, so names survive a decode unchanged.

use std::borrow::Cow;

use encoding_rs::EUC_KR;

/// Decode EUC-KR bytes, returning `None` on any malformed sequence
pub fn decode_euc_kr(bytes: &[u8]) -> Option<String> {
    if bytes.is_ascii() {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }

    EUC_KR
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}
