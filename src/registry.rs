//! Codec registry and incremental text decoders

use encoding_rs::{CoderResult, Encoding};

use crate::error::{StreamError, StreamResult};

/// Options applied when creating a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Drop a leading byte order mark
    pub strip_bom: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self { strip_bom: true }
    }
}

/// Stateful bytes-to-text decoder.
///
/// Multi-byte sequences split across `write` calls are reassembled;
/// `end` flushes whatever is still pending. No call may follow `end`.
pub trait TextDecoder: Send {
    fn write(&mut self, bytes: &[u8]) -> String;

    fn end(&mut self) -> String;

    /// Canonical name of the encoding being decoded
    fn encoding(&self) -> &str;
}

/// Hands out decoders by encoding name
pub trait CodecRegistry: Send + Sync {
    /// Fails with [`StreamError::UnknownEncoding`] for names it does not know.
    fn decoder(&self, name: &str, options: DecoderOptions) -> StreamResult<Box<dyn TextDecoder>>;
}

/// Registry over the WHATWG encodings implemented by `encoding_rs`
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingRsRegistry;

impl EncodingRsRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a name to an encoding.
    ///
    /// WHATWG labels are tried first, then a few spellings common outside
    /// browsers (`utf16le`, `ucs2`, `binary`, `shiftjis`, `cp1251`...).
    pub fn lookup(name: &str) -> Option<&'static Encoding> {
        Encoding::for_label(name.trim().as_bytes()).or_else(|| lookup_alias(name))
    }
}

impl CodecRegistry for EncodingRsRegistry {
    fn decoder(&self, name: &str, options: DecoderOptions) -> StreamResult<Box<dyn TextDecoder>> {
        let encoding = Self::lookup(name).ok_or_else(|| StreamError::unknown_encoding(name))?;
        Ok(Box::new(EncodingRsDecoder::new(encoding, options)))
    }
}

fn lookup_alias(name: &str) -> Option<&'static Encoding> {
    let normalized: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let encoding = match normalized.as_str() {
        "utf8" => encoding_rs::UTF_8,
        "utf16" | "utf16le" | "ucs2" | "ucs2le" => encoding_rs::UTF_16LE,
        "utf16be" | "ucs2be" => encoding_rs::UTF_16BE,
        "ascii" | "usascii" | "binary" | "latin1" | "iso88591" => encoding_rs::WINDOWS_1252,
        "shiftjis" | "sjis" | "mskanji" => encoding_rs::SHIFT_JIS,
        "eucjp" => encoding_rs::EUC_JP,
        "euckr" => encoding_rs::EUC_KR,
        "big5" | "big5hkscs" => encoding_rs::BIG5,
        "gbk" | "gb2312" | "cp936" => encoding_rs::GBK,
        "gb18030" => encoding_rs::GB18030,
        "koi8r" => encoding_rs::KOI8_R,
        "koi8u" => encoding_rs::KOI8_U,
        other => {
            // cp1251, win1251, windows1251
            let digits = other
                .strip_prefix("windows")
                .or_else(|| other.strip_prefix("win"))
                .or_else(|| other.strip_prefix("cp"))?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            return Encoding::for_label(format!("windows-{}", digits).as_bytes());
        }
    };
    Some(encoding)
}

/// [`TextDecoder`] over an `encoding_rs` decoder. Malformed input becomes U+FFFD.
pub struct EncodingRsDecoder {
    encoding: &'static Encoding,
    decoder: encoding_rs::Decoder,
}

impl EncodingRsDecoder {
    pub fn new(encoding: &'static Encoding, options: DecoderOptions) -> Self {
        let decoder = if options.strip_bom {
            encoding.new_decoder_with_bom_removal()
        } else {
            encoding.new_decoder_without_bom_handling()
        };
        Self { encoding, decoder }
    }

    fn run(&mut self, mut src: &[u8], last: bool) -> String {
        let capacity = self.decoder.max_utf8_buffer_length(src.len()).unwrap_or(src.len());
        let mut out = String::with_capacity(capacity);

        loop {
            let (result, read, _) = self.decoder.decode_to_string(src, &mut out, last);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => {
                    let more = self
                        .decoder
                        .max_utf8_buffer_length(src.len())
                        .unwrap_or(src.len())
                        .max(4);
                    out.reserve(more);
                }
            }
        }
    }
}

impl TextDecoder for EncodingRsDecoder {
    fn write(&mut self, bytes: &[u8]) -> String {
        self.run(bytes, false)
    }

    fn end(&mut self) -> String {
        self.run(&[], true)
    }

    fn encoding(&self) -> &str {
        self.encoding.name()
    }
}

impl std::fmt::Debug for EncodingRsDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodingRsDecoder")
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder(name: &str) -> Box<dyn TextDecoder> {
        EncodingRsRegistry.decoder(name, DecoderOptions::default()).unwrap()
    }

    #[test]
    fn test_lookup_whatwg_labels() {
        assert_eq!(EncodingRsRegistry::lookup("utf8"), Some(encoding_rs::UTF_8));
        assert_eq!(EncodingRsRegistry::lookup("UTF-8"), Some(encoding_rs::UTF_8));
        assert_eq!(EncodingRsRegistry::lookup("ascii"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(EncodingRsRegistry::lookup("Shift_JIS"), Some(encoding_rs::SHIFT_JIS));
    }

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(EncodingRsRegistry::lookup("utf16le"), Some(encoding_rs::UTF_16LE));
        assert_eq!(EncodingRsRegistry::lookup("UCS-2"), Some(encoding_rs::UTF_16LE));
        assert_eq!(EncodingRsRegistry::lookup("binary"), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(EncodingRsRegistry::lookup("win1251"), Some(encoding_rs::WINDOWS_1251));
        assert_eq!(EncodingRsRegistry::lookup("CP1250"), Some(encoding_rs::WINDOWS_1250));
    }

    #[test]
    fn test_unknown_encoding() {
        let err = EncodingRsRegistry
            .decoder("cp99999", DecoderOptions::default())
            .err().unwrap();
        assert!(matches!(err, StreamError::UnknownEncoding { ref name } if name == "cp99999"));
        assert!(EncodingRsRegistry::lookup("").is_none());
        assert!(EncodingRsRegistry::lookup("cp").is_none());
    }

    #[test]
    fn test_split_multibyte_sequence() {
        let mut dec = decoder("utf8");
        // "€" is E2 82 AC
        assert_eq!(dec.write(b"1\xE2"), "1");
        assert_eq!(dec.write(b"\x82"), "");
        assert_eq!(dec.write(b"\xAC2"), "\u{20AC}2");
        assert_eq!(dec.end(), "");
    }

    #[test]
    fn test_end_flushes_truncated_sequence() {
        let mut dec = decoder("utf8");
        assert_eq!(dec.write(b"ok\xE2\x82"), "ok");
        assert_eq!(dec.end(), "\u{FFFD}");
    }

    #[test]
    fn test_strip_bom_option() {
        let mut stripped = decoder("utf8");
        assert_eq!(stripped.write(b"\xEF\xBB\xBFhi"), "hi");

        let mut kept = EncodingRsRegistry
            .decoder("utf8", DecoderOptions { strip_bom: false })
            .unwrap();
        assert_eq!(kept.write(b"\xEF\xBB\xBFhi"), "\u{FEFF}hi");
    }

    #[test]
    fn test_utf16le_split_code_unit() {
        let mut dec = decoder("utf-16le");
        assert_eq!(dec.write(b"h\x00i"), "h");
        assert_eq!(dec.write(b"\x00"), "i");
        assert_eq!(dec.encoding(), "UTF-16LE");
    }

    #[test]
    fn test_large_write_grows_output() {
        let mut dec = decoder("windows-1252");
        let input = vec![0xE9u8; 10_000];
        let text = dec.write(&input);
        assert_eq!(text.chars().count(), 10_000);
        assert!(text.chars().all(|c| c == 'é'));
    }
}
