//! OEM code page 850 decoding
//!
//! DISM, SFC and CHKDSK write localized text in the console code page; the
//! script pins it to 850 so the bytes can be decoded without guessing.

const CP850_HIGH: [char; 128] = [
    // 0x80
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ',
    // 0xA0
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐',
    // 0xC0
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤',
    // 0xD0
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀',
    // 0xE0
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´',
    // 0xF0
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{A0}',
];

/// Decode a CP850 byte string. Every byte maps to exactly one char.
pub fn decode_cp850(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP850_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// Decode one raw output line and strip the trailing line break
pub fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && (raw[end - 1] == b'\n' || raw[end - 1] == b'\r') {
        end -= 1;
    }
    decode_cp850(&raw[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode_cp850(b"sfc /scannow"), "sfc /scannow");
    }

    #[test]
    fn umlauts_decode() {
        // "Prüfung für Größe" as written by a German console
        let raw = b"Pr\x81fung f\x81r Gr\x94\xE1e \x84\x8E\x99\x9A";
        assert_eq!(decode_cp850(raw), "Prüfung für Größe äÄÖÜ");
    }

    #[test]
    fn progress_bar_glyphs_decode() {
        assert_eq!(decode_cp850(&[0xDB, 0xB0, 0xB1]), "█░▒");
    }

    #[test]
    fn line_breaks_are_stripped() {
        assert_eq!(decode_line(b"L1\r\n"), "L1");
        assert_eq!(decode_line(b"L2\n"), "L2");
        assert_eq!(decode_line(b"\r\n"), "");
        assert_eq!(decode_line(b"no newline"), "no newline");
    }
}
