// Binary `numeric` wire format: a header of ndigits (i16), weight (i16),
// sign (u16), and display scale (u16), then `ndigits` base-10000 digits,
// most significant first. Digit `i` is worth 10000^(weight - i).

use std::error::Error;
use std::fmt::Write;

use bytes::{BufMut, BytesMut};
use tokio_postgres::types::{FromSql, Type};

type BoxError = Box<dyn Error + Sync + Send>;

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// A `numeric` column value in its exact text form.
pub(crate) struct NumericText(pub(crate) String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn read_i16(raw: &[u8], pos: usize) -> Result<i16, BoxError> {
    match raw.get(pos..pos + 2) {
        Some(&[hi, lo]) => Ok(i16::from_be_bytes([hi, lo])),
        _ => Err("truncated numeric value".into()),
    }
}

fn read_u16(raw: &[u8], pos: usize) -> Result<u16, BoxError> {
    match raw.get(pos..pos + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err("truncated numeric value".into()),
    }
}

pub(crate) fn decode(raw: &[u8]) -> Result<String, BoxError> {
    let ndigits = usize::try_from(read_i16(raw, 0)?)?;
    let weight = i32::from(read_i16(raw, 2)?);
    let sign = read_u16(raw, 4)?;
    let dscale = usize::from(read_u16(raw, 6)?);

    match sign {
        NUMERIC_NAN => return Ok("NaN".into()),
        NUMERIC_PINF => return Ok("Infinity".into()),
        NUMERIC_NINF => return Ok("-Infinity".into()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign 0x{other:04x}").into()),
    }

    let mut digits = Vec::with_capacity(ndigits);
    for i in 0..ndigits {
        digits.push(read_i16(raw, 8 + 2 * i)?);
    }
    let digit_at = |pos: i32| {
        usize::try_from(pos)
            .ok()
            .and_then(|p| digits.get(p).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        write!(out, "{}", digit_at(0))?;
        for pos in 1..=weight {
            write!(out, "{:04}", digit_at(pos))?;
        }
    }
    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut pos = weight + 1;
        while fraction.len() < dscale {
            write!(fraction, "{:04}", digit_at(pos))?;
            pos += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

fn put_header(out: &mut BytesMut, ndigits: i16, weight: i16, sign: u16, dscale: u16) {
    out.put_i16(ndigits);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(dscale);
}

/// Encode plain decimal text (`-12.50`, `NaN`, `Infinity`) as a binary `numeric`.
pub(crate) fn encode(text: &str, out: &mut BytesMut) -> Result<(), BoxError> {
    let text = text.trim();
    for (name, sign) in [
        ("NaN", NUMERIC_NAN),
        ("Infinity", NUMERIC_PINF),
        ("-Infinity", NUMERIC_NINF),
    ] {
        if text.eq_ignore_ascii_case(name) {
            put_header(out, 0, 0, sign, 0);
            return Ok(());
        }
    }

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(format!("`{text}` is not a decimal number").into());
    }

    let dscale = u16::try_from(frac_part.len())?;
    let int_part = int_part.trim_start_matches('0');

    // Left-pad the integer part and right-pad the fraction to whole groups.
    let mut padded = "0".repeat((4 - int_part.len() % 4) % 4);
    padded.push_str(int_part);
    let int_groups = padded.len() / 4;
    padded.push_str(frac_part);
    padded.push_str(&"0".repeat((4 - frac_part.len() % 4) % 4));

    let mut groups: Vec<i16> = padded
        .as_bytes()
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0_i16, |acc, &b| acc * 10 + i16::from(b - b'0')))
        .collect();

    let mut weight = i32::try_from(int_groups)? - 1;
    let leading = groups.iter().take_while(|&&g| g == 0).count();
    groups.drain(..leading);
    weight -= i32::try_from(leading)?;
    while groups.last() == Some(&0) {
        groups.pop();
    }
    if groups.is_empty() {
        weight = 0;
    }

    let sign = if negative && !groups.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };
    put_header(
        out,
        i16::try_from(groups.len())?,
        i16::try_from(weight)?,
        sign,
        dscale,
    );
    for group in groups {
        out.put_i16(group);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reencode(text: &str) -> String {
        let mut buf = BytesMut::new();
        encode(text, &mut buf).unwrap();
        decode(&buf).unwrap()
    }

    #[test]
    fn known_wire_layout() {
        let mut buf = BytesMut::new();
        encode("12.50", &mut buf).unwrap();
        // ndigits 2, weight 0, positive, scale 2, digits 12 and 5000
        assert_eq!(
            &buf[..],
            &[0, 2, 0, 0, 0, 0, 0, 2, 0, 12, 0x13, 0x88]
        );
    }

    #[test]
    fn text_form_survives_the_wire() {
        for text in ["12.50", "-0.00001", "10000", "0", "0.00", "123456789.987654321", "NaN"] {
            assert_eq!(reencode(text), text);
        }
        assert_eq!(reencode("+007.5"), "7.5");
        assert_eq!(reencode("-0"), "0");
    }

    #[test]
    fn rejects_non_numbers() {
        for text in ["", ".", "-", "1.2.3", "12a", "1e5"] {
            assert!(encode(text, &mut BytesMut::new()).is_err(), "{text}");
        }
    }

    #[test]
    fn truncated_input_is_an_error() {
        assert!(decode(&[0, 1, 0, 0]).is_err());
        assert!(decode(&[0, 1, 0, 0, 0, 0, 0, 0]).is_err());
    }
}
