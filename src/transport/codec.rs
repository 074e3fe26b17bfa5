//! Line codec with charset conversion.
//!
//! Lines end in `\n`, optionally preceded by `\r`. Bytes are decoded with the
//! connection's charset; undecodable bytes become U+FFFD rather than failing
//! the read.

use std::borrow::Cow;

use bytes::BytesMut;
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::TransportError;

/// Longest inbound line accepted, terminator included.
pub const MAX_LINE_LEN: usize = 8191;

/// Charset-aware line codec.
pub struct LineCodec {
    encoding: &'static Encoding,
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
    /// Dropping an overlong line until its terminator shows up.
    discarding: bool,
}

impl LineCodec {
    /// Codec for the charset `label` (e.g. `iso-8859-1`, `utf-8`).
    pub fn new(label: &str) -> Result<Self, TransportError> {
        Self::with_max_len(label, MAX_LINE_LEN)
    }

    /// Codec with a custom maximum line length.
    pub fn with_max_len(label: &str, max_len: usize) -> Result<Self, TransportError> {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| TransportError::EncodingUnsupported(label.to_string()))?;
        Ok(LineCodec {
            encoding,
            next_index: 0,
            max_len,
            discarding: false,
        })
    }

    /// Canonical name of the charset in use.
    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }

    /// Cut at the first line break so one write can never smuggle a second
    /// command onto the wire.
    fn sanitize(line: &str) -> &str {
        match line.find(['\r', '\n']) {
            Some(pos) => &line[..pos],
            None => line,
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, TransportError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len {
                    warn!(len = src.len(), "discarding overlong line");
                    src.clear();
                    self.discarding = true;
                }
                self.next_index = src.len();
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if line.len() > self.max_len {
                warn!(len = line.len(), "discarding overlong line");
                continue;
            }

            let (text, _, had_errors) = self.encoding.decode(&line);
            if had_errors {
                tracing::debug!(charset = self.encoding.name(), "replaced undecodable bytes");
            }
            let text = text.trim_end_matches(['\r', '\n']);
            return Ok(Some(text.to_string()));
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = TransportError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), TransportError> {
        let line = Self::sanitize(&line);
        let (bytes, _, _) = self.encoding.encode(line);
        match bytes {
            Cow::Borrowed(b) => dst.extend_from_slice(b),
            Cow::Owned(v) => dst.extend_from_slice(&v),
        }
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_crlf_and_lf() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :a\r\nPING :b\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :a"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :b"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"x\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :x"));
    }

    #[test]
    fn test_overlong_line_skipped() {
        let mut codec = LineCodec::with_max_len("utf-8", 10).unwrap();
        let mut buf = BytesMut::from("this is way too long\nPING :ok\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :ok"));
    }

    #[test]
    fn test_latin1_decoding() {
        let mut codec = LineCodec::new("iso-8859-1").unwrap();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :caf\xe9\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().as_deref(),
            Some("PRIVMSG #a :caf\u{e9}")
        );
    }

    #[test]
    fn test_unknown_charset() {
        assert!(matches!(
            LineCodec::new("klingon"),
            Err(TransportError::EncodingUnsupported(_))
        ));
    }

    #[test]
    fn test_encode_appends_crlf_and_strips_breaks() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();
        codec
            .encode("PRIVMSG #a :hi\r\nQUIT".to_string(), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PRIVMSG #a :hi\r\n");
    }
}
