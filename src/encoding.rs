use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

/// Standard Base64 with `+` mapped to `-` and `/` mapped to `_`. Padding is kept.
pub fn urlsafe_encode(data: &[u8]) -> String {
    URL_SAFE.encode(data)
}
