//! Bencode parsing: top-level field splitting with verbatim value ranges
//!
//! The walker records the byte range of every top-level value so the info
//! dictionary and unknown fields can be carried through untouched; envelope
//! scalars are decoded from their slices via bencode-rs.

use std::collections::BTreeMap;
use std::ops::Range;

use super::{Metainfo, MetainfoError};

impl Metainfo {
    /// Parses a torrent artifact from raw bencode bytes.
    ///
    /// # Errors
    ///
    /// - `MetainfoError::InvalidArtifact` - Malformed bencode, wrong field
    ///   types, or a missing info dictionary
    pub fn parse(data: &[u8]) -> Result<Self, MetainfoError> {
        let mut metainfo = Metainfo {
            announce: None,
            comment: None,
            created_by: None,
            creation_date: None,
            encoding: None,
            private: false,
            info: Vec::new(),
            extra: BTreeMap::new(),
        };

        let mut saw_info = false;
        for (key, range) in split_top_level(data)? {
            let raw = &data[range];
            match key.as_slice() {
                b"announce" => metainfo.announce = Some(decode_string(raw, "announce")?),
                b"comment" => metainfo.comment = Some(decode_string(raw, "comment")?),
                b"created by" => metainfo.created_by = Some(decode_string(raw, "created by")?),
                b"creation date" => {
                    metainfo.creation_date = Some(decode_integer(raw, "creation date")?);
                }
                b"encoding" => metainfo.encoding = Some(decode_string(raw, "encoding")?),
                b"private" => metainfo.private = decode_integer(raw, "private")? != 0,
                b"info" => {
                    if raw.first() != Some(&b'd') {
                        return Err(invalid("info field must be a dictionary"));
                    }
                    metainfo.info = raw.to_vec();
                    saw_info = true;
                }
                _ => {
                    metainfo.extra.insert(key, raw.to_vec());
                }
            }
        }

        if !saw_info {
            return Err(invalid("missing 'info' field"));
        }
        Ok(metainfo)
    }
}

fn invalid(reason: impl Into<String>) -> MetainfoError {
    MetainfoError::InvalidArtifact {
        reason: reason.into(),
    }
}

/// Splits the top-level dictionary into (key, value byte range) pairs.
pub(super) fn split_top_level(data: &[u8]) -> Result<Vec<(Vec<u8>, Range<usize>)>, MetainfoError> {
    if data.first() != Some(&b'd') {
        return Err(invalid("expected dictionary at top level"));
    }

    let mut fields = Vec::new();
    let mut pos = 1;
    loop {
        match data.get(pos) {
            None => return Err(invalid("unterminated top-level dictionary")),
            Some(&b'e') => break,
            Some(_) => {}
        }

        let (key_range, key_end) = skip_string(data, pos)?;
        let value_len = bencode_value_len(&data[key_end..])?;
        fields.push((data[key_range].to_vec(), key_end..key_end + value_len));
        pos = key_end + value_len;
    }
    Ok(fields)
}

/// Length in bytes of a single bencode value of any type.
pub(super) fn bencode_value_len(data: &[u8]) -> Result<usize, MetainfoError> {
    match data.first() {
        Some(&b'd') | Some(&b'l') => container_len(data),
        Some(&b'i') => {
            let end = data
                .iter()
                .position(|&byte| byte == b'e')
                .ok_or_else(|| invalid("unterminated integer"))?;
            Ok(end + 1)
        }
        Some(byte) if byte.is_ascii_digit() => {
            let (_, end) = skip_string(data, 0)?;
            Ok(end)
        }
        Some(_) => Err(invalid("invalid bencode character")),
        None => Err(invalid("empty bencode value")),
    }
}

/// Walks a list or dictionary to its matching terminator.
fn container_len(data: &[u8]) -> Result<usize, MetainfoError> {
    let mut pos = 1;
    let mut depth = 1;

    while pos < data.len() && depth > 0 {
        match data[pos] {
            b'd' | b'l' => {
                depth += 1;
                pos += 1;
            }
            b'e' => {
                depth -= 1;
                pos += 1;
            }
            b'i' => {
                pos += 1;
                while pos < data.len() && data[pos] != b'e' {
                    pos += 1;
                }
                if pos >= data.len() {
                    return Err(invalid("unterminated integer"));
                }
                pos += 1;
            }
            b'0'..=b'9' => {
                let (_, end) = skip_string(data, pos)?;
                pos = end;
            }
            _ => return Err(invalid("invalid bencode character")),
        }
    }

    if depth != 0 {
        return Err(invalid("incomplete bencode container"));
    }
    Ok(pos)
}

/// Reads a bencode string header at `start`; returns the content range and
/// the position one past the string.
fn skip_string(data: &[u8], start: usize) -> Result<(Range<usize>, usize), MetainfoError> {
    let mut pos = start;
    while pos < data.len() && data[pos] != b':' {
        if !data[pos].is_ascii_digit() {
            return Err(invalid("invalid string length"));
        }
        pos += 1;
    }
    if pos >= data.len() || pos == start {
        return Err(invalid("invalid string format"));
    }

    let length: usize = std::str::from_utf8(&data[start..pos])
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| invalid("invalid string length"))?;

    let content_start = pos + 1;
    let end = content_start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| invalid("string length exceeds data"))?;

    Ok((content_start..end, end))
}

fn decode_string(raw: &[u8], key: &str) -> Result<String, MetainfoError> {
    let values = bencode_rs::Value::parse(raw)
        .map_err(|e| invalid(format!("failed to decode field '{key}': {e:?}")))?;
    match values.first() {
        Some(bencode_rs::Value::Bytes(bytes)) => String::from_utf8(bytes.to_vec())
            .map_err(|_| invalid(format!("invalid UTF-8 in field '{key}'"))),
        _ => Err(invalid(format!("field '{key}' must be a string"))),
    }
}

fn decode_integer(raw: &[u8], key: &str) -> Result<i64, MetainfoError> {
    let values = bencode_rs::Value::parse(raw)
        .map_err(|e| invalid(format!("failed to decode field '{key}': {e:?}")))?;
    match values.first() {
        Some(bencode_rs::Value::Integer(value)) => Ok(*value),
        _ => Err(invalid(format!("field '{key}' must be an integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_data::sample_torrent;
    use super::*;

    #[test]
    fn test_bencode_value_len_integer() {
        assert_eq!(bencode_value_len(b"i42e").unwrap(), 4);
        assert_eq!(bencode_value_len(b"i-7e1:x").unwrap(), 4);
    }

    #[test]
    fn test_bencode_value_len_string() {
        assert_eq!(bencode_value_len(b"4:spam").unwrap(), 6);
        assert_eq!(bencode_value_len(b"0:rest").unwrap(), 2);
    }

    #[test]
    fn test_bencode_value_len_containers() {
        assert_eq!(bencode_value_len(b"l4:testi42ee").unwrap(), 12);
        assert_eq!(bencode_value_len(b"d3:keyd4:namei42eee").unwrap(), 19);
        assert_eq!(bencode_value_len(b"d4:listl4:testi42eee").unwrap(), 20);
    }

    #[test]
    fn test_bencode_value_len_invalid() {
        assert!(bencode_value_len(b"").is_err());
        assert!(bencode_value_len(b"x").is_err());
        assert!(bencode_value_len(b"i42").is_err());
        assert!(bencode_value_len(b"d3:key").is_err());
        assert!(bencode_value_len(b"999:x").is_err());
    }

    #[test]
    fn test_split_top_level_ranges_are_verbatim() {
        let data = b"d3:fooi1e3:bar4:spame";
        let fields = split_top_level(data).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, b"foo");
        assert_eq!(&data[fields[0].1.clone()], b"i1e");
        assert_eq!(fields[1].0, b"bar");
        assert_eq!(&data[fields[1].1.clone()], b"4:spam");
    }

    #[test]
    fn test_split_top_level_rejects_non_dictionary() {
        assert!(split_top_level(b"l4:teste").is_err());
        assert!(split_top_level(b"i42e").is_err());
        assert!(split_top_level(b"d3:foo").is_err());
    }

    #[test]
    fn test_parse_requires_info_dictionary() {
        let result = Metainfo::parse(b"d8:announce8:test.come");
        assert!(matches!(
            result,
            Err(MetainfoError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_field_types() {
        // announce as integer
        let mut data = b"d8:announcei1e4:info".to_vec();
        data.extend_from_slice(&super::super::test_data::sample_info());
        data.push(b'e');
        let result = Metainfo::parse(&data);
        assert!(matches!(
            result,
            Err(MetainfoError::InvalidArtifact { reason }) if reason.contains("announce")
        ));
    }

    #[test]
    fn test_parse_tolerates_unsorted_keys() {
        // sample_torrent intentionally carries keys out of bencode order
        assert!(Metainfo::parse(&sample_torrent()).is_ok());
    }
}
