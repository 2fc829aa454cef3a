use crate::SerdeErr;

/// Text encoding used for length-prefixed strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Variable-width UTF-8, byte-identical to ASCII for ASCII text
    #[default]
    Utf8,
    /// Single-byte ASCII. Characters outside of 0..=127 are written and read back as `?`
    Ascii,
}

impl TextEncoding {
    pub(crate) fn encode<'a>(&self, value: &'a str) -> std::borrow::Cow<'a, [u8]> {
        match self {
            TextEncoding::Utf8 => std::borrow::Cow::Borrowed(value.as_bytes()),
            TextEncoding::Ascii => {
                if value.is_ascii() {
                    return std::borrow::Cow::Borrowed(value.as_bytes());
                }
                std::borrow::Cow::Owned(
                    value
                        .chars()
                        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                        .collect(),
                )
            }
        }
    }

    pub(crate) fn decode(&self, bytes: &[u8]) -> Result<String, SerdeErr> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|_| SerdeErr::InvalidText),
            TextEncoding::Ascii => Ok(bytes
                .iter()
                .map(|b| if b.is_ascii() { *b as char } else { '?' })
                .collect()),
        }
    }
}
