//! Minimal RESP (Redis serialization protocol) codec
//!
//! Covers exactly what a subscriber connection needs: encoding command
//! arrays and decoding the reply/push frames a `SUBSCRIBE` session produces.

use std::io;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// One decoded RESP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    Simple(String),
    Error(String),
    Integer(i64),
    /// `None` is the RESP null bulk string
    Bulk(Option<Vec<u8>>),
    /// `None` is the RESP null array
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Bulk payload as UTF-8, lossy
    pub fn as_text(&self) -> Option<String> {
        match self {
            RespValue::Bulk(Some(data)) => Some(String::from_utf8_lossy(data).into_owned()),
            RespValue::Simple(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// RESP codec for use with tokio Framed
#[derive(Debug, Default)]
pub struct RespCodec;

impl Decoder for RespCodec {
    type Item = RespValue;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_value(src)? {
            Some((value, consumed)) => {
                let _ = src.split_to(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

/// Encodes a command as a RESP array of bulk strings
impl Encoder<Vec<String>> for RespCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Vec<String>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.put_slice(format!("*{}\r\n", item.len()).as_bytes());
        for arg in item {
            dst.put_slice(format!("${}\r\n", arg.len()).as_bytes());
            dst.put_slice(arg.as_bytes());
            dst.put_slice(b"\r\n");
        }
        Ok(())
    }
}

/// Parse one frame starting at the buffer head.
///
/// Returns `Ok(None)` when the buffer does not yet hold a complete frame.
fn parse_value(src: &[u8]) -> Result<Option<(RespValue, usize)>, io::Error> {
    let Some((line, header_len)) = read_line(src) else {
        return Ok(None);
    };
    if line.is_empty() {
        return Err(protocol_err("empty frame header"));
    }

    let (kind, rest) = (line[0], &line[1..]);
    match kind {
        b'+' => Ok(Some((RespValue::Simple(lossy(rest)), header_len))),
        b'-' => Ok(Some((RespValue::Error(lossy(rest)), header_len))),
        b':' => {
            let n = parse_int(rest)?;
            Ok(Some((RespValue::Integer(n), header_len)))
        }
        b'$' => {
            let len = parse_int(rest)?;
            if len < 0 {
                return Ok(Some((RespValue::Bulk(None), header_len)));
            }
            let len = len as usize;
            let total = header_len + len + 2;
            if src.len() < total {
                return Ok(None);
            }
            if &src[header_len + len..total] != b"\r\n" {
                return Err(protocol_err("bulk string missing terminator"));
            }
            let data = src[header_len..header_len + len].to_vec();
            Ok(Some((RespValue::Bulk(Some(data)), total)))
        }
        b'*' => {
            let count = parse_int(rest)?;
            if count < 0 {
                return Ok(Some((RespValue::Array(None), header_len)));
            }
            let mut items = Vec::with_capacity(count as usize);
            let mut offset = header_len;
            for _ in 0..count {
                match parse_value(&src[offset..])? {
                    Some((value, consumed)) => {
                        items.push(value);
                        offset += consumed;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(Some(items)), offset)))
        }
        other => Err(protocol_err(&format!("unknown frame type 0x{other:02x}"))),
    }
}

/// Read up to the first CRLF; returns the line body and bytes consumed
/// including the terminator.
fn read_line(src: &[u8]) -> Option<(&[u8], usize)> {
    let pos = src.windows(2).position(|w| w == b"\r\n")?;
    Some((&src[..pos], pos + 2))
}

fn parse_int(data: &[u8]) -> Result<i64, io::Error> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| protocol_err("invalid integer"))
}

fn lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

fn protocol_err(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<RespValue> {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(value) = codec.decode(&mut buf).unwrap() {
            out.push(value);
        }
        out
    }

    #[test]
    fn test_decode_simple_and_integer() {
        let values = decode_all(b"+OK\r\n:42\r\n");
        assert_eq!(
            values,
            vec![RespValue::Simple("OK".into()), RespValue::Integer(42)]
        );
    }

    #[test]
    fn test_decode_message_push() {
        let frame =
            b"*3\r\n$7\r\nmessage\r\n$18\r\n__sentinel__:hello\r\n$5\r\nhello\r\n";
        let values = decode_all(frame);
        assert_eq!(values.len(), 1);
        let RespValue::Array(Some(items)) = &values[0] else {
            panic!("expected array");
        };
        assert_eq!(items[0].as_text().as_deref(), Some("message"));
        assert_eq!(items[1].as_text().as_deref(), Some("__sentinel__:hello"));
        assert_eq!(items[2].as_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_decode_partial_frame_waits() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"*3\r\n$7\r\nmess"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        // Buffer must stay intact until the frame completes
        buf.extend_from_slice(b"age\r\n$2\r\nch\r\n$2\r\nok\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_decode_null_bulk() {
        let values = decode_all(b"$-1\r\n");
        assert_eq!(values, vec![RespValue::Bulk(None)]);
    }

    #[test]
    fn test_decode_error_frame() {
        let values = decode_all(b"-ERR unknown command\r\n");
        assert_eq!(values, vec![RespValue::Error("ERR unknown command".into())]);
    }

    #[test]
    fn test_encode_subscribe_command() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(
                vec!["SUBSCRIBE".to_string(), "__sentinel__:hello".to_string()],
                &mut buf,
            )
            .unwrap();
        assert_eq!(
            &buf[..],
            b"*2\r\n$9\r\nSUBSCRIBE\r\n$18\r\n__sentinel__:hello\r\n"
        );
    }

    #[test]
    fn test_reject_garbage() {
        let mut codec = RespCodec;
        let mut buf = BytesMut::from(&b"?what\r\n"[..]);
        assert!(codec.decode(&mut buf).is_err());
    }
}
