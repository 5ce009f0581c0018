//! IFJcode20 operand notation

use crate::types::Constant;

/// Float in C99 `%a` notation, e.g. `0x1.8p+0`
pub fn hex_float(value: f64) -> String {
    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let exponent = ((bits >> 52) & 0x7ff) as i64;
    let mantissa = bits & ((1u64 << 52) - 1);

    let (lead, exp) = match exponent {
        0 if mantissa == 0 => return format!("{sign}0x0p+0"),
        // subnormal
        0 => (0, -1022),
        e => (1, e - 1023),
    };

    let digits = format!("{mantissa:013x}");
    let digits = digits.trim_end_matches('0');
    if digits.is_empty() {
        format!("{sign}0x{lead}p{exp:+}")
    } else {
        format!("{sign}0x{lead}.{digits}p{exp:+}")
    }
}

/// Escape a string for a `string@` operand
///
/// Control characters, space, `#`, `\` and DEL become `\ddd`.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let code = c as u32;
        if code <= 32 || code == 127 || c == '#' || c == '\\' {
            out.push_str(&format!("\\{code:03}"));
        } else {
            out.push(c);
        }
    }
    out
}

/// A literal as a typed operand
pub fn constant(value: &Constant) -> String {
    match value {
        Constant::Int(v) => format!("int@{v}"),
        Constant::Float(v) => format!("float@{}", hex_float(*v)),
        Constant::Str(s) => format!("string@{}", escape_string(s)),
    }
}

/// A local frame slot
pub fn local(slot: &str) -> String {
    format!("LF@{slot}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_float() {
        assert_eq!(hex_float(1.5), "0x1.8p+0");
        assert_eq!(hex_float(1.0), "0x1p+0");
        assert_eq!(hex_float(0.0), "0x0p+0");
        assert_eq!(hex_float(-0.0), "-0x0p+0");
        assert_eq!(hex_float(0.1), "0x1.999999999999ap-4");
        assert_eq!(hex_float(-256.0), "-0x1p+8");
        assert_eq!(hex_float(f64::MIN_POSITIVE / 2.0), "0x0.8p-1022");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a b"), "a\\032b");
        assert_eq!(escape_string("#\\\n"), "\\035\\092\\010");
        assert_eq!(escape_string("žluťoučký"), "žluťoučký");
        assert_eq!(escape_string(""), "");
    }

    #[test]
    fn test_constant_operands() {
        assert_eq!(constant(&Constant::Int(-3)), "int@-3");
        assert_eq!(constant(&Constant::Float(2.0)), "float@0x1p+1");
        assert_eq!(constant(&Constant::Str("hi there".into())), "string@hi\\032there");
        assert_eq!(local("x%2"), "LF@x%2");
    }
}
