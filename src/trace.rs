//! Wire trace of raw protocol bytes.
//!
//! When a session has wire tracing enabled, every outgoing and incoming
//! message is rendered with [`hex_dump`] and logged at `info` level under the
//! [`WIRE_TARGET`] log target.

use core::fmt::{self, Write};

/// Log target of wire trace records.
pub const WIRE_TARGET: &str = "dlms_meter::wire";

const BYTES_PER_ROW: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Receive,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Send => f.write_str("SEND"),
            Direction::Receive => f.write_str("RECEIVE"),
        }
    }
}

/// Formats `data` as an offset-tagged hex dump with a printable-ASCII gutter.
///
/// ```
/// use dlms_meter::trace::{Direction, hex_dump};
///
/// let dump = hex_dump(Direction::Send, b"\x00\x01AB");
/// assert!(dump.contains("Length: 4 bytes"));
/// assert!(dump.contains("0000: 00 01 41 42"));
/// assert!(dump.contains("|..AB|"));
/// ```
pub fn hex_dump(direction: Direction, data: &[u8]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dump(&mut out, direction, data);
    out
}

fn write_dump(out: &mut String, direction: Direction, data: &[u8]) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== {} PACKET ===", direction)?;
    writeln!(out, "Length: {} bytes", data.len())?;
    writeln!(out, "Raw data:")?;

    for (row, chunk) in data.chunks(BYTES_PER_ROW).enumerate() {
        write!(out, "{:04X}: ", row * BYTES_PER_ROW)?;
        for byte in chunk {
            write!(out, "{:02X} ", byte)?;
        }
        for _ in chunk.len()..BYTES_PER_ROW {
            out.push_str("   ");
        }

        out.push_str(" |");
        out.extend(chunk.iter().map(|&b| if (32..=126).contains(&b) { b as char } else { '.' }));
        out.push_str("|\n");
    }

    write!(out, "=== END PACKET ===")
}

/// Logs a wire trace record for `data`.
pub(crate) fn log_packet(direction: Direction, data: &[u8]) {
    if log::log_enabled!(target: WIRE_TARGET, log::Level::Info) {
        log::info!(target: WIRE_TARGET, "{}", hex_dump(direction, data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_layout() {
        let data: Vec<u8> = (0x30..0x44).collect(); // 20 bytes, '0'..'C'
        let dump = hex_dump(Direction::Receive, &data);
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "=== RECEIVE PACKET ===");
        assert_eq!(lines[2], "Length: 20 bytes");
        assert_eq!(lines[3], "Raw data:");
        assert_eq!(
            lines[4],
            "0000: 30 31 32 33 34 35 36 37 38 39 3A 3B 3C 3D 3E 3F  |0123456789:;<=>?|"
        );
        assert_eq!(lines[5], format!("0010: 40 41 42 43{}|@ABC|", " ".repeat(38)));
        assert_eq!(lines[6], "=== END PACKET ===");
    }

    #[test]
    fn test_hex_dump_non_printable() {
        let dump = hex_dump(Direction::Send, &[0x00, 0x7F, 0x20, 0x7E, 0xFF]);
        assert!(dump.contains("0000: 00 7F 20 7E FF "));
        assert!(dump.contains("|.. ~.|"));
    }

    #[test]
    fn test_hex_dump_empty() {
        let dump = hex_dump(Direction::Send, &[]);
        assert!(dump.contains("Length: 0 bytes"));
        assert!(dump.ends_with("Raw data:\n=== END PACKET ==="));
    }
}
