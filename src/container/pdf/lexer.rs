//! Low-level tokenization of PDF byte streams.
//!
//! Recognizes the primitive token types (numbers, strings, names) that the
//! object parser composes into dictionaries and arrays. Whitespace (space,
//! \t, \r, \n, \0, \f) and `%` comments are skipped between tokens.

use nom::IResult;

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\0' | b'\x0C')
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// A byte that may appear unescaped inside a name.
pub fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

/// Skip whitespace and `%` comments (to end of line).
pub fn skip_ws(mut input: &[u8]) -> &[u8] {
    loop {
        let before = input.len();
        while let Some(&b) = input.first() {
            if is_whitespace(b) {
                input = &input[1..];
            } else {
                break;
            }
        }
        if input.first() == Some(&b'%') {
            while let Some(&b) = input.first() {
                input = &input[1..];
                if b == b'\n' {
                    break;
                }
            }
        }
        if input.len() == before {
            return input;
        }
    }
}

/// Parse an integer or real number. Returns `(rest, (text, is_real))`.
pub fn lex_number(input: &[u8]) -> IResult<&[u8], (i64, Option<f64>)> {
    let mut pos = 0usize;
    if matches!(input.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }
    let digits_start = pos;
    while pos < input.len() && input[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut is_real = false;
    if pos < input.len() && input[pos] == b'.' {
        is_real = true;
        pos += 1;
        while pos < input.len() && input[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos == digits_start && !is_real {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    let text = std::str::from_utf8(&input[..pos]).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    if is_real {
        let value: f64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
        })?;
        Ok((&input[pos..], (0, Some(value))))
    } else {
        let value: i64 = text.parse().map_err(|_| {
            nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
        })?;
        Ok((&input[pos..], (value, None)))
    }
}

/// Parse a name token: `/` followed by regular characters, `#xx` decoded.
pub fn lex_name(input: &[u8]) -> IResult<&[u8], String> {
    if input.first() != Some(&b'/') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let mut rest = &input[1..];
    let mut name = String::new();
    while let Some(&b) = rest.first() {
        if b == b'#' && rest.len() >= 3 {
            let hex = std::str::from_utf8(&rest[1..3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                name.push(byte as char);
                rest = &rest[3..];
                continue;
            }
        }
        if is_regular(b) {
            name.push(b as char);
            rest = &rest[1..];
        } else {
            break;
        }
    }
    Ok((rest, name))
}

/// Parse a literal string `(...)` with balanced parens; escape sequences
/// are decoded into the returned bytes.
pub fn lex_literal_string(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    if input.first() != Some(&b'(') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let mut rest = &input[1..];
    let mut depth = 1usize;
    let mut out = Vec::new();
    while let Some(&b) = rest.first() {
        rest = &rest[1..];
        match b {
            b'\\' => {
                let Some(&esc) = rest.first() else { break };
                rest = &rest[1..];
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' => out.push(b'('),
                    b')' => out.push(b')'),
                    b'\\' => out.push(b'\\'),
                    b'\n' => {}, // line continuation
                    b'\r' => {
                        if rest.first() == Some(&b'\n') {
                            rest = &rest[1..];
                        }
                    },
                    b'0'..=b'7' => {
                        let mut value = (esc - b'0') as u32;
                        for _ in 0..2 {
                            match rest.first() {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + (d - b'0') as u32;
                                    rest = &rest[1..];
                                },
                                _ => break,
                            }
                        }
                        out.push(value as u8);
                    },
                    other => out.push(other),
                }
            },
            b'(' => {
                depth += 1;
                out.push(b'(');
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((rest, out));
                }
                out.push(b')');
            },
            other => out.push(other),
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

/// Parse a hex string `<...>`; whitespace inside is ignored, an odd final
/// digit is padded with zero.
pub fn lex_hex_string(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    if input.first() != Some(&b'<') || input.get(1) == Some(&b'<') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }
    let mut rest = &input[1..];
    let mut digits = Vec::new();
    while let Some(&b) = rest.first() {
        rest = &rest[1..];
        match b {
            b'>' => {
                if digits.len() % 2 == 1 {
                    digits.push(b'0');
                }
                let out = digits
                    .chunks_exact(2)
                    .filter_map(|pair| {
                        let hex = std::str::from_utf8(pair).ok()?;
                        u8::from_str_radix(hex, 16).ok()
                    })
                    .collect();
                return Ok((rest, out));
            },
            b if b.is_ascii_hexdigit() => digits.push(b),
            b if is_whitespace(b) => {},
            _ => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::HexDigit,
                )))
            },
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

/// Match a bare keyword (`true`, `obj`, `stream`, ...) at the head of input,
/// requiring a non-regular byte (or EOF) after it.
pub fn lex_keyword<'a>(input: &'a [u8], keyword: &str) -> Option<&'a [u8]> {
    let kw = keyword.as_bytes();
    if input.len() < kw.len() || &input[..kw.len()] != kw {
        return None;
    }
    match input.get(kw.len()) {
        Some(&b) if is_regular(b) => None,
        _ => Some(&input[kw.len()..]),
    }
}
