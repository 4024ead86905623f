//! Embedded font deobfuscation.

use crate::fonts::FontError;

/// Position in the GUID string of the two hex digits of each key byte.
const GUID_DIGIT_OFFSETS: [usize; 16] = [6, 4, 2, 0, 11, 9, 16, 14, 19, 21, 24, 26, 28, 30, 32, 34];

/// Key byte XORed into data byte `i` and `i + 16`.
const KEY_MAPPING: [usize; 16] = [15, 14, 13, 12, 11, 10, 9, 8, 6, 7, 4, 5, 0, 1, 2, 3];

/// Number of leading bytes covered by obfuscation.
pub const OBFUSCATED_LEN: usize = 32;

/// A GUID in the byte order used as the obfuscation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid([u8; 16]);

impl Guid {
    /// Parse `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`, optionally wrapped
    /// in braces.
    pub fn parse(s: &str) -> Result<Self, FontError> {
        let trimmed = s.trim().trim_start_matches('{').trim_end_matches('}');
        let digits = trimmed.as_bytes();
        if digits.len() <= 35 {
            return Err(FontError::InvalidGuid(s.to_string()));
        }

        let mut bytes = [0u8; 16];
        for (byte, &at) in bytes.iter_mut().zip(GUID_DIGIT_OFFSETS.iter()) {
            let hi = hex_value(digits[at]);
            let lo = hex_value(digits[at + 1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => *byte = (hi << 4) | lo,
                _ => return Err(FontError::InvalidGuid(s.to_string())),
            }
        }
        Ok(Self(bytes))
    }

    /// Key bytes, in string order of the digit table.
    #[inline]
    pub fn bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

#[inline]
fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

/// XOR the first 32 bytes of `data` with the key derived from `guid`.
///
/// Applying it twice restores the input.
pub fn deobfuscate(data: &mut [u8], guid: &Guid) -> Result<(), FontError> {
    if data.len() < OBFUSCATED_LEN {
        return Err(FontError::TooSmall(data.len()));
    }
    let key = guid.bytes();
    for (i, &k) in KEY_MAPPING.iter().enumerate() {
        data[i] ^= key[k];
        data[i + 16] ^= key[k];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NAME: &str = "B5D3F3AD-4C1A-4A6C-9E2F-0123456789AB";

    #[test]
    fn test_parse_guid_byte_order() {
        let guid = Guid::parse(NAME).unwrap();
        assert_eq!(
            guid.bytes(),
            &[
                0xAD, 0xF3, 0xD3, 0xB5, 0x1A, 0x4C, 0x6C, 0x4A, 0x9E, 0x2F, 0x01, 0x23, 0x45, 0x67,
                0x89, 0xAB
            ]
        );
    }

    #[test]
    fn test_parse_guid_with_braces() {
        let braced = format!("{{{}}}", NAME);
        assert_eq!(Guid::parse(&braced).unwrap(), Guid::parse(NAME).unwrap());
    }

    #[test]
    fn test_parse_guid_rejects_bad_names() {
        assert!(matches!(Guid::parse("Arial"), Err(FontError::InvalidGuid(_))));
        assert!(Guid::parse("B5D3F3AD-4C1A-4A6C-9E2F-0123456789AZ").is_err());
    }

    #[test]
    fn test_short_data_is_rejected() {
        let guid = Guid::parse(NAME).unwrap();
        let mut data = vec![0u8; 31];
        assert!(matches!(deobfuscate(&mut data, &guid), Err(FontError::TooSmall(31))));
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_only_leading_bytes_change() {
        let guid = Guid::parse(NAME).unwrap();
        let mut data = vec![0u8; 40];
        deobfuscate(&mut data, &guid).unwrap();
        // Key byte 15 lands on data bytes 0 and 16.
        assert_eq!(data[0], 0xAB);
        assert_eq!(data[16], 0xAB);
        assert!(data[32..].iter().all(|&b| b == 0));
    }

    proptest! {
        #[test]
        fn prop_self_inverse(data in proptest::collection::vec(any::<u8>(), 32..128), key in any::<[u8; 16]>()) {
            let guid = Guid(key);
            let mut scrambled = data.clone();
            deobfuscate(&mut scrambled, &guid).unwrap();
            deobfuscate(&mut scrambled, &guid).unwrap();
            prop_assert_eq!(scrambled, data);
        }
    }
}
