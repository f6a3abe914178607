//! Typed value to display string conversion.
//!
//! [`marshal`] is total: every value, including tags this crate cannot
//! render, yields a string. Table cells and read results rely on this so a
//! single odd value never invalidates an otherwise valid reply.

use core::fmt::Write;

use crate::data::TypedValue;

/// Upper bound, in bytes, of any marshaled string.
pub const MAX_DISPLAY_LEN: usize = 1023;

/// Number of bytes rendered by the `Hex:` form; `"Hex:"` plus two digits per
/// byte stays below [`MAX_DISPLAY_LEN`].
pub const MAX_HEX_BYTES: usize = (MAX_DISPLAY_LEN - 1 - HEX_PREFIX.len()) / 2;

pub const NULL_PLACEHOLDER: &str = "[NULL]";
pub const EMPTY_STRING_PLACEHOLDER: &str = "[empty string]";
pub const EMPTY_BYTES_PLACEHOLDER: &str = "[empty bytes]";
pub const NULL_DATETIME_PLACEHOLDER: &str = "[NULL datetime]";

const HEX_PREFIX: &str = "Hex:";

/// Converts a value to its display string. `None` yields `"[NULL]"`.
///
/// # Examples
///
/// ```
/// use dlms_meter::{TypedValue, marshal};
///
/// assert_eq!(marshal(Some(&TypedValue::Boolean(true))), "true");
/// assert_eq!(marshal(Some(&TypedValue::Enum(3))), "Enum:3");
/// assert_eq!(marshal(Some(&TypedValue::OctetString(vec![0x0A, 0xFF]))), "Hex:0AFF");
/// assert_eq!(marshal(Some(&TypedValue::Structure(vec![]))), "[Type 2 not handled]");
/// assert_eq!(marshal(None), "[NULL]");
/// ```
pub fn marshal(value: Option<&TypedValue>) -> String {
    match value {
        Some(value) => marshal_value(value),
        None => NULL_PLACEHOLDER.to_owned(),
    }
}

pub fn marshal_value(value: &TypedValue) -> String {
    match value {
        TypedValue::Boolean(b) => b.to_string(),
        TypedValue::Integer(n) => n.to_string(),
        TypedValue::Long(n) => n.to_string(),
        TypedValue::DoubleLong(n) => n.to_string(),
        TypedValue::Long64(n) => n.to_string(),
        TypedValue::Unsigned(n) => n.to_string(),
        TypedValue::LongUnsigned(n) => n.to_string(),
        TypedValue::DoubleLongUnsigned(n) => n.to_string(),
        TypedValue::Long64Unsigned(n) => n.to_string(),
        TypedValue::Enum(n) => format!("Enum:{}", n),
        TypedValue::Float32(n) => n.to_string(),
        TypedValue::Float64(n) => n.to_string(),
        TypedValue::VisibleString(bytes) | TypedValue::Utf8String(bytes) => text(bytes),
        TypedValue::OctetString(bytes) | TypedValue::BitString { bytes, .. } => hex_text(bytes),
        TypedValue::Bcd(n) => hex_text(&[*n]),
        TypedValue::DateTime(date_time) => {
            date_time.as_ref().map_or_else(|| NULL_DATETIME_PLACEHOLDER.to_owned(), ToString::to_string)
        }
        TypedValue::Date(date) => {
            date.as_ref().map_or_else(|| NULL_DATETIME_PLACEHOLDER.to_owned(), ToString::to_string)
        }
        TypedValue::Time(time) => {
            time.as_ref().map_or_else(|| NULL_DATETIME_PLACEHOLDER.to_owned(), ToString::to_string)
        }
        other => format!("[Type {} not handled]", other.tag()),
    }
}

fn text(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return EMPTY_STRING_PLACEHOLDER.to_owned();
    }

    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if text.len() > MAX_DISPLAY_LEN {
        let mut end = MAX_DISPLAY_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

fn hex_text(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return EMPTY_BYTES_PLACEHOLDER.to_owned();
    }

    let shown = &bytes[..bytes.len().min(MAX_HEX_BYTES)];
    let mut out = String::with_capacity(HEX_PREFIX.len() + shown.len() * 2);
    out.push_str(HEX_PREFIX);
    for byte in shown {
        // Writing into a String cannot fail.
        let _ = write!(out, "{:02X}", byte);
    }
    out
}
