//! Character-set translation: Baudot/ITA2 TTY codes, UCS Row 00 code
//! points, and the UCS<->UTF-8 octet transform.

use crate::fifo::Fifo;
use crate::types::{TtyCode, UcsCode, IDLE_SYMB};

/// The 64-entry TTY code table: indices `0..32` are the Letters-shift
/// alphabet, `32..64` the Figures-shift alphabet (bit 5 of the index
/// selects which). `\0` marks a code point with no assigned character.
const TTY_CHAR_TABLE: [u8; 64] = [
    0x08, b'E', 0x0A, b'A', b' ', b'S', b'I', b'U', 0x0D, b'D', b'R', b'J', b'N', b'F', b'C', b'K',
    b'T', b'Z', b'L', b'W', b'H', b'Y', b'P', b'Q', b'O', b'B', b'G', 0x00, b'M', b'X', b'V', 0x00,
    0x08, b'3', 0x0A, b'-', b' ', 0x00, b'8', b'7', 0x0D, b'$', b'4', b'\'', b',', b'!', b':', b'(',
    b'5', b'"', b')', b'2', b'=', b'6', b'0', b'1', b'9', b'?', b'+', 0x00, b'.', b'/', b';', 0x00,
];

/// Looks up the TTY code whose table entry is `c`, searching both shift
/// tables. Returns `None` for `'\0'` (not a valid input character) or if
/// `c` has no assigned code.
pub fn char_to_tty_code(c: char) -> Option<TtyCode> {
    if c == '\0' || !c.is_ascii() {
        return None;
    }
    let byte = c as u8;
    TTY_CHAR_TABLE
        .iter()
        .position(|&entry| entry == byte)
        .map(|idx| TtyCode::new((idx & 0x1F) as u8, idx >= 32))
}

/// Converts a TTY code back to its table character, or `'\0'` for a
/// reserved/unassigned code point.
pub fn tty_code_to_char(code: TtyCode) -> char {
    let idx = code.raw() as usize;
    TTY_CHAR_TABLE[idx] as char
}

/// Whether `code` falls in the set of UCS Row 00 positions this gateway's
/// ISO/IEC 10646 Row 00 subset actually assigns a character to: the
/// printable ASCII range, the Latin-1 Supplement printable range, and a
/// handful of C0 control codes (BEL, BS, LF, CR) the Baudot demonstration
/// alphabet needs. Row 00 maps code point N directly onto character
/// U+00NN, so supporting a code point is just deciding whether to let
/// that identity mapping through.
fn ucs_code_supported(code: u16) -> bool {
    matches!(code, 7 | 8 | 10 | 13) || (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code)
}

/// Converts a character to its UCS code, or [`IDLE_SYMB`] if `c` is `'\0'`
/// or outside the supported Row 00 subset.
pub fn char_to_ucs_code(c: char) -> UcsCode {
    if c == '\0' {
        return IDLE_SYMB;
    }
    let code = c as u32;
    if code <= 0xFF && ucs_code_supported(code as u16) {
        code as UcsCode
    } else {
        IDLE_SYMB
    }
}

/// Converts a UCS code back to its character, or `'\0'` if `code` is
/// outside `0..=0xFF` or unsupported.
pub fn ucs_code_to_char(code: UcsCode) -> char {
    if code <= 0xFF && ucs_code_supported(code) {
        char::from_u32(code as u32).unwrap_or('\0')
    } else {
        '\0'
    }
}

/// Encodes a UCS Row 00 code point as 1 octet (`< 0xA0`) or 2 octets
/// (`0xA0` prefix + code, for `0xA0..=0xFF`), pushed onto `out`.
///
/// # Panics
/// Panics if `ucs_code > 0xFF` — this gateway's Unicode non-goal means no
/// caller should ever construct one.
pub fn transform_ucs_to_utf(ucs_code: UcsCode, out: &mut Fifo<u8>) {
    assert!(ucs_code <= 0xFF, "transform_ucs_to_utf: UCS codes > 0xFF are not supported");
    if ucs_code < 0xA0 {
        out.push_one(ucs_code as u8);
    } else {
        out.push_one(0xA0);
        out.push_one(ucs_code as u8);
    }
}

/// Consumes one UCS code's worth of UTF-8 octets from `octets`, or
/// returns `None` without consuming if not enough octets have arrived
/// yet. An unexpected lead octet (`> 0xA0`) is dropped and also yields
/// `None`, matching the permissive resynchronization the reference
/// decoder performs.
pub fn transform_utf_to_ucs(octets: &mut Fifo<u8>) -> Option<UcsCode> {
    let available = octets.len().min(5);
    if available == 0 {
        return None;
    }
    let peeked = octets.peek(available);
    match peeked[0] {
        lead if lead < 0xA0 => {
            octets.pop(1);
            Some(lead as UcsCode)
        }
        0xA0 => {
            if available > 1 {
                let code = peeked[1] as UcsCode;
                octets.pop(2);
                Some(code)
            } else {
                None
            }
        }
        _ => {
            octets.pop(1);
            None
        }
    }
}
