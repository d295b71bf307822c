use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;
use git_utils::date::Signature;

use crate::{ObjectError, ObjectType};

const PGP_SIGNATURE_MARKER: &[u8] = b"-----BEGIN PGP SIGNATURE-----";
const SSH_SIGNATURE_MARKER: &[u8] = b"-----BEGIN SSH SIGNATURE-----";

/// An annotated tag: a name and message pointing at some other object,
/// distinct from a lightweight tag (which is just a ref with no object of
/// its own).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub target: ObjectId,
    pub target_type: ObjectType,
    pub tag_name: BString,
    /// Absent for tags created before git required a tagger line.
    pub tagger: Option<Signature>,
    pub message: BString,
    pub gpgsig: Option<BString>,
}

impl Tag {
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut target = None;
        let mut target_type = None;
        let mut tag_name = None;
        let mut tagger = None;

        let mut pos = 0;
        while pos < content.len() && content[pos] != b'\n' {
            let line_end = find_newline_from(content, pos);
            let line = &content[pos..line_end];

            if let Some(space_pos) = line.iter().position(|&b| b == b' ') {
                let key = &line[..space_pos];
                let value = &line[space_pos + 1..];
                match key {
                    b"object" => target = Some(parse_oid(value)?),
                    b"type" => target_type = Some(ObjectType::from_bytes(value)?),
                    b"tag" => tag_name = Some(BString::from(value)),
                    b"tagger" => {
                        tagger = Some(
                            Signature::parse(BStr::new(value))
                                .map_err(|e| ObjectError::InvalidSignature(e.to_string()))?,
                        )
                    }
                    _ => {}
                }
            }

            pos = line_end + 1;
        }
        if pos < content.len() {
            pos += 1; // skip the blank separator line
        }

        let (message, gpgsig) = split_trailing_signature(&content[pos..]);

        Ok(Self {
            target: target.ok_or(ObjectError::MissingTagField { field: "object" })?,
            target_type: target_type.ok_or(ObjectError::MissingTagField { field: "type" })?,
            tag_name: tag_name.ok_or(ObjectError::MissingTagField { field: "tag" })?,
            tagger,
            message,
            gpgsig,
        })
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"object ");
        out.extend_from_slice(self.target.to_hex().as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"type ");
        out.extend_from_slice(self.target_type.as_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"tag ");
        out.extend_from_slice(&self.tag_name);
        out.push(b'\n');

        if let Some(ref tagger) = self.tagger {
            out.extend_from_slice(b"tagger ");
            out.extend_from_slice(&tagger.to_bytes());
            out.push(b'\n');
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);

        if let Some(ref sig) = self.gpgsig {
            out.extend_from_slice(sig);
        }

        out
    }
}

fn find_newline_from(data: &[u8], from: usize) -> usize {
    data[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| p + from)
        .unwrap_or(data.len())
}

fn parse_oid(value: &[u8]) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader("non-UTF8 target OID".into()))?;
    Ok(ObjectId::from_hex(hex)?)
}

/// A tag's PGP/SSH signature, when present, is appended to the end of the
/// message rather than stored as its own header — split it back off.
fn split_trailing_signature(remaining: &[u8]) -> (BString, Option<BString>) {
    for marker in [PGP_SIGNATURE_MARKER, SSH_SIGNATURE_MARKER] {
        if let Some(sig_start) = remaining.find(marker) {
            return (
                BString::from(&remaining[..sig_start]),
                Some(BString::from(&remaining[sig_start..])),
            );
        }
    }
    (BString::from(remaining), None)
}
