use std::fs;
use std::io::Read;

use flate2::read::ZlibDecoder;
use git_object::header;
use git_object::ObjectType;

use crate::read::fill_header_buf;
use crate::{LooseError, LooseObjectStore};

/// A loose object opened for incremental reading: the header has already
/// been parsed, and each [`Read::read`] call inflates the next chunk of
/// content on demand rather than materializing the whole object up front.
pub struct LooseObjectStream {
    obj_type: ObjectType,
    size: usize,
    decoder: ZlibDecoder<fs::File>,
    bytes_read: usize,
}

impl LooseObjectStream {
    pub fn object_type(&self) -> ObjectType {
        self.obj_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bytes_remaining(&self) -> usize {
        self.size.saturating_sub(self.bytes_read)
    }
}

impl Read for LooseObjectStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.bytes_remaining();
        if remaining == 0 {
            return Ok(0);
        }
        let max_read = remaining.min(buf.len());
        let n = self.decoder.read(&mut buf[..max_read])?;
        self.bytes_read += n;
        Ok(n)
    }
}

/// Reopen the file at `path` and advance a fresh decoder past the first
/// `header_len` inflated bytes, so the returned decoder yields only content.
fn decoder_at_content_start(
    path: &std::path::Path,
    oid: &git_hash::ObjectId,
    header_len: usize,
) -> Result<ZlibDecoder<fs::File>, LooseError> {
    let file = fs::File::open(path)?;
    let mut decoder = ZlibDecoder::new(file);
    let mut skip_buf = vec![0u8; header_len];
    decoder
        .read_exact(&mut skip_buf)
        .map_err(|e| LooseError::Decompress { oid: oid.to_hex(), source: e })?;
    Ok(decoder)
}

impl LooseObjectStore {
    /// Open a streaming reader over an object's content, skipping past the
    /// header. Returns `Ok(None)` if the object does not exist.
    pub fn stream(
        &self,
        oid: &git_hash::ObjectId,
    ) -> Result<Option<LooseObjectStream>, LooseError> {
        let path = self.object_path(oid);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LooseError::Io(e)),
        };

        let mut decoder = ZlibDecoder::new(file);
        let mut hdr_buf = [0u8; 64];
        let filled = fill_header_buf(&mut decoder, oid, &mut hdr_buf)?;
        let (obj_type, content_size, header_len) = header::parse_header(&hdr_buf[..filled])?;

        // The header-sniffing decoder above can't be rewound mid-stream, so
        // content reads start from a second decoder over a fresh file handle.
        let content_decoder = decoder_at_content_start(&path, oid, header_len)?;

        Ok(Some(LooseObjectStream {
            obj_type,
            size: content_size,
            decoder: content_decoder,
            bytes_read: 0,
        }))
    }
}
