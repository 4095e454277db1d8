//! Transport-safe 64-symbol alphabet

/// Symbol table, indexed by a 6-bit group
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode the low 12 bits of a sample as two symbols, low group first.
#[inline]
pub fn encode_sample(sample: u16) -> [u8; 2] {
    [
        ALPHABET[(sample & 0x3F) as usize],
        ALPHABET[((sample >> 6) & 0x3F) as usize],
    ]
}

/// Map a symbol back to its 6-bit group, `None` if it is not in the alphabet.
pub fn decode_symbol(symbol: u8) -> Option<u8> {
    match symbol {
        b'A'..=b'Z' => Some(symbol - b'A'),
        b'a'..=b'z' => Some(symbol - b'a' + 26),
        b'0'..=b'9' => Some(symbol - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        assert_eq!(&encode_sample(0), b"AA");
        assert_eq!(&encode_sample(0x0FFF), b"//");
        // 0x041 = group0 1, group1 1
        assert_eq!(&encode_sample(0x041), b"BB");
        // 2048 = 0b1000_0000_0000 -> low 0, high 32
        assert_eq!(&encode_sample(2048), b"Ag");
    }

    #[test]
    fn test_high_bits_discarded() {
        assert_eq!(encode_sample(0xF123), encode_sample(0x0123));
    }

    #[test]
    fn test_decode_symbol_covers_table() {
        for (index, &symbol) in ALPHABET.iter().enumerate() {
            assert_eq!(decode_symbol(symbol), Some(index as u8));
        }
        assert_eq!(decode_symbol(b'='), None);
        assert_eq!(decode_symbol(b'\n'), None);
    }

    proptest! {
        #[test]
        fn prop_symbols_match_table(v in 0u16..4096) {
            let [low, high] = encode_sample(v);
            prop_assert_eq!(low, ALPHABET[(v & 0x3F) as usize]);
            prop_assert_eq!(high, ALPHABET[((v >> 6) & 0x3F) as usize]);
        }

        #[test]
        fn prop_symbols_are_printable(v in any::<u16>()) {
            for symbol in encode_sample(v) {
                prop_assert!(symbol.is_ascii_graphic());
            }
        }
    }
}
