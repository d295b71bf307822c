use crate::{ObjectError, ObjectType};

const NULL: u8 = 0;
const SPACE: u8 = b' ';

/// Split a loose object's decompressed bytes into `(type, content_size,
/// header_length)`. The on-disk header is `"<type> <size>\0"`; `header_length`
/// is the offset of the first content byte, i.e. it includes the terminator.
pub fn parse_header(data: &[u8]) -> Result<(ObjectType, usize, usize), ObjectError> {
    let null_pos = find_byte(data, NULL)
        .ok_or_else(|| ObjectError::InvalidHeader("missing null terminator".into()))?;
    let header = &data[..null_pos];

    let space_pos = find_byte(header, SPACE)
        .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;

    let obj_type = ObjectType::from_bytes(&header[..space_pos])?;
    let content_size = parse_size(&header[space_pos + 1..])?;

    Ok((obj_type, content_size, null_pos + 1))
}

pub fn write_header(obj_type: ObjectType, content_size: usize) -> Vec<u8> {
    format!("{} {}\0", obj_type, content_size).into_bytes()
}

fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn parse_size(size_bytes: &[u8]) -> Result<usize, ObjectError> {
    let size_str = std::str::from_utf8(size_bytes)
        .map_err(|_| ObjectError::InvalidHeader("non-ASCII size".into()))?;
    size_str
        .parse()
        .map_err(|_| ObjectError::InvalidHeader(format!("invalid size: {size_str}")))
}
