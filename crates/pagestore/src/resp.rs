//! RESP (REdis Serialization Protocol) encoding and decoding
//!
//! RESP2 only. Used by the embedded test server to read commands and write replies.

use bytes::{Buf, BytesMut};
use std::io::Cursor;

use crate::error::{Error, Result};

/// Maximum bulk string size (512MB), same ceiling Redis applies
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array size (1M elements)
const MAX_ARRAY_SIZE: usize = 1024 * 1024;

/// RESP data types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string: +OK\r\n
    SimpleString(String),
    /// Error: -Error message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n
    BulkString(Option<Vec<u8>>),
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Build a command frame: an array of bulk strings
    pub fn command(parts: &[&[u8]]) -> Self {
        RespValue::Array(Some(
            parts
                .iter()
                .map(|p| RespValue::BulkString(Some(p.to_vec())))
                .collect(),
        ))
    }

    /// Serialize to RESP format
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                out.push(b'+');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            RespValue::Error(e) => {
                out.push(b'-');
                out.extend_from_slice(e.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(i) => out.extend_from_slice(format!(":{}\r\n", i).as_bytes()),
            RespValue::BulkString(None) => out.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => {
                out.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
                out.extend_from_slice(data);
                out.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => out.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(arr)) => {
                out.extend_from_slice(format!("*{}\r\n", arr.len()).as_bytes());
                for val in arr {
                    val.write_to(out);
                }
            }
        }
    }

    /// Parse one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` and leaves `buf` untouched when the frame is incomplete.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&buf[..]);
        match parse_value(&mut cursor)? {
            Some(value) => {
                let pos = cursor.position() as usize;
                buf.advance(pos);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

fn protocol(msg: impl Into<String>) -> Error {
    Error::Protocol(msg.into())
}

fn parse_value(cursor: &mut Cursor<&[u8]>) -> Result<Option<RespValue>> {
    if !cursor.has_remaining() {
        return Ok(None);
    }

    let type_byte = cursor.get_u8();

    match type_byte {
        b'+' => Ok(read_text(cursor)?.map(RespValue::SimpleString)),
        b'-' => Ok(read_text(cursor)?.map(RespValue::Error)),
        b':' => Ok(read_number(cursor)?.map(RespValue::Integer)),
        b'$' => parse_bulk_string(cursor),
        b'*' => parse_array(cursor),
        _ => Err(protocol(format!("unknown RESP type byte: {:?}", type_byte as char))),
    }
}

fn read_text(cursor: &mut Cursor<&[u8]>) -> Result<Option<String>> {
    match read_line(cursor) {
        Some(line) => String::from_utf8(line)
            .map(Some)
            .map_err(|e| protocol(e.to_string())),
        None => Ok(None),
    }
}

fn read_number(cursor: &mut Cursor<&[u8]>) -> Result<Option<i64>> {
    match read_text(cursor)? {
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|e| protocol(format!("invalid length or integer {:?}: {}", s, e))),
        None => Ok(None),
    }
}

fn parse_bulk_string(cursor: &mut Cursor<&[u8]>) -> Result<Option<RespValue>> {
    let len = match read_number(cursor)? {
        Some(len) => len,
        None => return Ok(None),
    };

    if len == -1 {
        return Ok(Some(RespValue::BulkString(None)));
    }
    if len < 0 {
        return Err(protocol(format!("negative bulk string length: {}", len)));
    }

    let len = len as usize;
    if len > MAX_BULK_STRING_SIZE {
        return Err(protocol(format!(
            "bulk string too large: {} bytes (max: {} bytes)",
            len, MAX_BULK_STRING_SIZE
        )));
    }

    // Payload plus trailing \r\n
    if cursor.remaining() < len + 2 {
        return Ok(None);
    }

    let mut data = vec![0u8; len];
    cursor.copy_to_slice(&mut data);

    let cr = cursor.get_u8();
    let lf = cursor.get_u8();
    if cr != b'\r' || lf != b'\n' {
        return Err(protocol("expected \\r\\n after bulk string"));
    }

    Ok(Some(RespValue::BulkString(Some(data))))
}

fn parse_array(cursor: &mut Cursor<&[u8]>) -> Result<Option<RespValue>> {
    let len = match read_number(cursor)? {
        Some(len) => len,
        None => return Ok(None),
    };

    if len == -1 {
        return Ok(Some(RespValue::Array(None)));
    }
    if len < 0 {
        return Err(protocol(format!("negative array length: {}", len)));
    }

    let len = len as usize;
    if len > MAX_ARRAY_SIZE {
        return Err(protocol(format!(
            "array too large: {} elements (max: {} elements)",
            len, MAX_ARRAY_SIZE
        )));
    }

    let mut arr = Vec::with_capacity(len);
    for _ in 0..len {
        match parse_value(cursor)? {
            Some(val) => arr.push(val),
            None => return Ok(None),
        }
    }

    Ok(Some(RespValue::Array(Some(arr))))
}

fn read_line(cursor: &mut Cursor<&[u8]>) -> Option<Vec<u8>> {
    let start = cursor.position() as usize;
    let slice = &cursor.get_ref()[start..];

    let i = slice.windows(2).position(|w| w == b"\r\n")?;
    let end = start + i;
    cursor.set_position((end + 2) as u64);
    Some(cursor.get_ref()[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(data: &[u8]) -> RespValue {
        let mut buf = BytesMut::from(data);
        let val = RespValue::parse(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        val
    }

    #[test]
    fn test_status_reply() {
        assert_eq!(parse_all(b"+OK\r\n"), RespValue::SimpleString("OK".to_string()));
    }

    #[test]
    fn test_error_reply() {
        assert_eq!(
            parse_all(b"-ERR value is not an integer or out of range\r\n"),
            RespValue::Error("ERR value is not an integer or out of range".to_string())
        );
    }

    #[test]
    fn test_incr_reply() {
        assert_eq!(parse_all(b":42\r\n"), RespValue::Integer(42));
        assert_eq!(parse_all(b":-3\r\n"), RespValue::Integer(-3));
    }

    #[test]
    fn test_get_replies() {
        assert_eq!(
            parse_all(b"$13\r\n<html></html>\r\n"),
            RespValue::BulkString(Some(b"<html></html>".to_vec()))
        );
        assert_eq!(parse_all(b"$-1\r\n"), RespValue::BulkString(None));
        assert_eq!(parse_all(b"$0\r\n\r\n"), RespValue::BulkString(Some(Vec::new())));
    }

    #[test]
    fn test_bulk_string_keeps_binary_and_crlf() {
        let val = parse_all(b"$4\r\na\r\nb\r\n");
        assert_eq!(val, RespValue::BulkString(Some(b"a\r\nb".to_vec())));
    }

    #[test]
    fn test_set_command_encoding() {
        let cmd = RespValue::command(&[b"SET", b"cached:http://a", b"body", b"EX", b"10"]);
        assert_eq!(
            cmd.serialize(),
            b"*5\r\n$3\r\nSET\r\n$15\r\ncached:http://a\r\n$4\r\nbody\r\n$2\r\nEX\r\n$2\r\n10\r\n"
        );
    }

    #[test]
    fn test_command_parses_back() {
        let cmd = RespValue::command(&[b"INCR", b"count:http://example.com"]);
        let mut buf = BytesMut::from(&cmd.serialize()[..]);
        assert_eq!(RespValue::parse(&mut buf).unwrap(), Some(cmd));
    }

    #[test]
    fn test_incomplete_frame_leaves_buffer() {
        let data = b"$6\r\nfoo";
        let mut buf = BytesMut::from(&data[..]);
        assert!(RespValue::parse(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], &data[..]);

        buf.extend_from_slice(b"bar\r\n");
        assert_eq!(
            RespValue::parse(&mut buf).unwrap(),
            Some(RespValue::BulkString(Some(b"foobar".to_vec())))
        );
    }

    #[test]
    fn test_pipelined_frames() {
        let mut buf = BytesMut::from(&b":1\r\n+OK\r\n"[..]);
        assert_eq!(RespValue::parse(&mut buf).unwrap(), Some(RespValue::Integer(1)));
        assert_eq!(
            RespValue::parse(&mut buf).unwrap(),
            Some(RespValue::SimpleString("OK".to_string()))
        );
        assert!(RespValue::parse(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_unknown_type_byte() {
        let mut buf = BytesMut::from(&b"?what\r\n"[..]);
        assert!(matches!(RespValue::parse(&mut buf), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_oversized_bulk_rejected() {
        let mut buf = BytesMut::from(&b"$999999999999\r\n"[..]);
        assert!(matches!(RespValue::parse(&mut buf), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_bad_integer() {
        let mut buf = BytesMut::from(&b":12a\r\n"[..]);
        assert!(matches!(RespValue::parse(&mut buf), Err(Error::Protocol(_))));
    }
}
