//! BASE64 encoding of authentication credentials.
//!
//! Only encoding is needed: the client never decodes server challenges,
//! it answers LOGIN prompts by position.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes bytes as padded BASE64 (`A-Za-z0-9+/`, `=` padding).
///
/// The input may contain NUL bytes, as in the PLAIN initial response.
///
/// # Example
///
/// ```
/// use relaymail_smtp::codec::encode;
///
/// assert_eq!(encode(b"\0user\0pass"), "AHVzZXIAcGFzcw==");
/// ```
#[must_use]
pub fn encode(input: &[u8]) -> String {
    STANDARD.encode(input)
}

/// Builds the PLAIN initial response (RFC 4616) without an authorization identity.
///
/// Format: `\0<username>\0<password>`, base64 encoded.
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    let mut buf = Vec::with_capacity(username.len() + password.len() + 2);
    buf.push(0);
    buf.extend_from_slice(username.as_bytes());
    buf.push(0);
    buf.extend_from_slice(password.as_bytes());
    encode(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rfc4648_vectors() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foob"), "Zm9vYg==");
        assert_eq!(encode(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn embedded_nuls() {
        assert_eq!(encode(&[0, 0, 0]), "AAAA");
        assert_eq!(encode(b"\0a\0"), "AGEA");
    }

    #[test]
    fn high_bytes_use_plus_and_slash() {
        assert_eq!(encode(&[0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn login_credentials() {
        assert_eq!(encode(b"username"), "dXNlcm5hbWU=");
        assert_eq!(encode(b"password"), "cGFzc3dvcmQ=");
    }

    #[test]
    fn plain_response_layout() {
        assert_eq!(plain_response("user", "pass"), "AHVzZXIAcGFzcw==");
        assert_eq!(plain_response("", ""), "AAA=");
    }

    proptest! {
        #[test]
        fn output_shape(input in proptest::collection::vec(any::<u8>(), 0..256)) {
            let encoded = encode(&input);
            prop_assert_eq!(encoded.len() % 4, 0);
            prop_assert_eq!(encoded.len(), input.len().div_ceil(3) * 4);

            let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count();
            let expected = match input.len() % 3 {
                0 => 0,
                1 => 2,
                _ => 1,
            };
            prop_assert_eq!(padding, expected);
            prop_assert!(
                encoded
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
            );
        }
    }
}
