use crate::error::{EdfError, Result};
use crate::types::HeaderField;

/// 检查字符串是否为有效的整数
pub fn is_integer_number(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }

    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// 检查字符串是否为无符号整数（仅数字，两侧可有空格）
pub fn is_unsigned_number(s: &str) -> bool {
    let s = s.trim_matches(' ');
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// 检查字符串是否为有效的数字（包括浮点数）
pub fn is_number(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }

    // f64::parse 也接受 "inf" / "NaN"，这里只允许纯十进制写法
    s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'))
        && s.parse::<f64>().is_ok()
}

/// Decodes a field byte-for-char (ISO-8859-1), dropping trailing space padding
pub fn decode_field(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    bytes[..end].iter().map(|&b| b as char).collect()
}

/// Writes `text` left-justified into `buf` and pads the rest with spaces.
///
/// Never truncates: content longer than the field is an error.
pub fn encode_field(buf: &mut [u8], field: HeaderField, text: &str) -> Result<()> {
    let width = field.width();
    debug_assert_eq!(buf.len(), width);

    let len = text.chars().count();
    if len > width {
        return Err(EdfError::FieldOverflow { field: field.name(), len, width });
    }

    buf.fill(b' ');
    for (slot, c) in buf.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(u32::from(c)).map_err(|_| {
            let reason = format!("character {c:?} has no single-byte encoding");
            EdfError::invalid_field(field.name(), text, reason)
        })?;
    }
    Ok(())
}

/// 非本地化的整数解析（避免受系统locale影响）
pub fn atoi_nonlocalized(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// 非本地化的浮点数解析
pub fn atof_nonlocalized(s: &str) -> Option<f64> {
    s.trim().parse().ok()
}
