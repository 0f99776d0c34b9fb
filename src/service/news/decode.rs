use encoding_rs::Encoding;
use tracing::warn;

/// Decode a response body with the configured legacy charset.
///
/// Single-byte codecs map every byte, so this never fails. A BOM at the start
/// of the body wins over the declared charset.
pub fn decode_html(bytes: &[u8], charset: &'static Encoding) -> String {
    let (text, used, had_errors) = charset.decode(bytes);
    if had_errors {
        warn!(
            charset = used.name(),
            "news page contained malformed sequences; text may be garbled"
        );
    }
    text.into_owned()
}
