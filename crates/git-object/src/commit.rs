use bstr::{BStr, BString, ByteSlice};
use git_hash::ObjectId;
use git_utils::date::Signature;

use crate::ObjectError;

/// A commit object: a tree snapshot, its ancestry, and who/when/why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectId,
    /// Empty for a root commit, length 2+ for a merge.
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub encoding: Option<BString>,
    pub gpgsig: Option<BString>,
    /// Headers this crate doesn't interpret (e.g. `mergetag`), kept so a
    /// re-serialized commit still hashes the same as the one that was read.
    pub extra_headers: Vec<(BString, BString)>,
    /// Everything after the blank line that ends the header block.
    pub message: BString,
}

/// Walks the `key value` header lines of a commit or tag, folding RFC-822
/// style continuation lines (those starting with a single space) back into
/// the value they belong to. Stops at the first blank line or EOF and
/// reports where the message/trailing content begins via [`Lines::pos`].
struct Lines<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    /// Returns `(key, value)` for the next header line, or `None` once the
    /// blank separator line or end of input is reached.
    fn next_header(&mut self) -> Option<(&'a [u8], Vec<u8>)> {
        if self.pos >= self.data.len() || self.data[self.pos] == b'\n' {
            if self.pos < self.data.len() {
                self.pos += 1;
            }
            return None;
        }

        let line_end = self.line_end_from(self.pos);
        let line = &self.data[self.pos..line_end];
        let space_pos = line.iter().position(|&b| b == b' ')?;
        let key = &line[..space_pos];

        let mut value = Vec::from(&line[space_pos + 1..]);
        let mut next = line_end + 1;
        while next < self.data.len() && self.data[next] == b' ' {
            let cont_end = self.line_end_from(next);
            value.push(b'\n');
            value.extend_from_slice(&self.data[next + 1..cont_end]);
            next = cont_end + 1;
        }

        self.pos = next;
        Some((key, value))
    }

    fn line_end_from(&self, from: usize) -> usize {
        self.data[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| p + from)
            .unwrap_or(self.data.len())
    }
}

fn write_continued(out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    out.extend_from_slice(key);
    out.push(b' ');
    for (i, line) in value.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\n ");
        }
        out.extend_from_slice(line);
    }
    out.push(b'\n');
}

impl Commit {
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut encoding = None;
        let mut gpgsig = None;
        let mut extra_headers = Vec::new();

        let mut lines = Lines::new(content);
        while let Some((key, value)) = lines.next_header() {
            match key {
                b"tree" => tree = Some(parse_oid(&value, "tree")?),
                b"parent" => parents.push(parse_oid(&value, "parent")?),
                b"author" => author = Some(parse_signature(&value)?),
                b"committer" => committer = Some(parse_signature(&value)?),
                b"encoding" => encoding = Some(BString::from(value)),
                b"gpgsig" | b"gpgsig-sha256" => gpgsig = Some(BString::from(value)),
                other => extra_headers.push((BString::from(other), BString::from(value))),
            }
        }

        let tree = tree.ok_or(ObjectError::MissingCommitField { field: "tree" })?;
        let author = author.ok_or(ObjectError::MissingCommitField { field: "author" })?;
        let committer =
            committer.ok_or(ObjectError::MissingCommitField { field: "committer" })?;
        let message = BString::from(&content[lines.pos()..]);

        Ok(Self {
            tree,
            parents,
            author,
            committer,
            encoding,
            gpgsig,
            extra_headers,
            message,
        })
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"tree ");
        out.extend_from_slice(self.tree.to_hex().as_bytes());
        out.push(b'\n');

        for parent in &self.parents {
            out.extend_from_slice(b"parent ");
            out.extend_from_slice(parent.to_hex().as_bytes());
            out.push(b'\n');
        }

        out.extend_from_slice(b"author ");
        out.extend_from_slice(&self.author.to_bytes());
        out.push(b'\n');

        out.extend_from_slice(b"committer ");
        out.extend_from_slice(&self.committer.to_bytes());
        out.push(b'\n');

        if let Some(ref enc) = self.encoding {
            out.extend_from_slice(b"encoding ");
            out.extend_from_slice(enc);
            out.push(b'\n');
        }

        if let Some(ref sig) = self.gpgsig {
            write_continued(&mut out, b"gpgsig", sig);
        }

        for (key, val) in &self.extra_headers {
            write_continued(&mut out, key, val);
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);
        out
    }

    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// The message's first line, which convention treats as its subject.
    pub fn summary(&self) -> &BStr {
        let msg: &[u8] = self.message.as_ref();
        match msg.find_byte(b'\n') {
            Some(pos) => BStr::new(&msg[..pos]),
            None => BStr::new(msg),
        }
    }

    /// Everything after the first blank line within the message, if any.
    pub fn body(&self) -> Option<&BStr> {
        let msg: &[u8] = self.message.as_ref();
        msg.find(b"\n\n").map(|pos| BStr::new(&msg[pos + 2..]))
    }
}

fn parse_oid(value: &[u8], field: &'static str) -> Result<ObjectId, ObjectError> {
    let hex = std::str::from_utf8(value)
        .map_err(|_| ObjectError::InvalidHeader(format!("non-UTF8 {field} OID")))?;
    Ok(ObjectId::from_hex(hex)?)
}

fn parse_signature(data: &[u8]) -> Result<Signature, ObjectError> {
    Signature::parse(BStr::new(data)).map_err(|e| ObjectError::InvalidSignature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        out.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        out.extend_from_slice(b"author John Doe <john@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"committer Jane Doe <jane@example.com> 1234567890 +0000\n");
        out.extend_from_slice(b"\n");
        out.extend_from_slice(b"Initial commit\n");
        out
    }

    #[test]
    fn parse_commit() {
        let commit = Commit::parse(&sample_commit_bytes()).unwrap();
        assert_eq!(
            commit.tree.to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(commit.parents.len(), 1);
        assert_eq!(commit.author.name.as_bytes(), b"John Doe");
        assert_eq!(commit.committer.email.as_bytes(), b"jane@example.com");
        assert_eq!(commit.message.as_bytes(), b"Initial commit\n");
    }

    #[test]
    fn parse_root_commit() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nroot\n");

        let commit = Commit::parse(&data).unwrap();
        assert!(commit.is_root());
        assert!(!commit.is_merge());
    }

    #[test]
    fn parse_merge_commit() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"parent 0000000000000000000000000000000000000001\n");
        data.extend_from_slice(b"parent 0000000000000000000000000000000000000002\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nMerge\n");

        let commit = Commit::parse(&data).unwrap();
        assert!(commit.is_merge());
        assert_eq!(commit.parents.len(), 2);
    }

    #[test]
    fn serialize_roundtrip() {
        let original_bytes = sample_commit_bytes();
        let commit = Commit::parse(&original_bytes).unwrap();
        let serialized = commit.serialize_content();
        assert_eq!(serialized, original_bytes);
    }

    #[test]
    fn summary_and_body() {
        let commit = Commit::parse(&sample_commit_bytes()).unwrap();
        assert_eq!(commit.summary().as_bytes(), b"Initial commit");
        assert_eq!(commit.body(), None);
    }

    #[test]
    fn summary_and_body_multi_paragraph() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"\nSummary line\n\nBody paragraph.\n");

        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.summary().as_bytes(), b"Summary line");
        assert_eq!(commit.body().unwrap().as_bytes(), b"Body paragraph.\n");
    }

    #[test]
    fn commit_with_encoding() {
        let mut data = Vec::new();
        data.extend_from_slice(b"tree da39a3ee5e6b4b0d3255bfef95601890afd80709\n");
        data.extend_from_slice(b"author A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"committer A <a@b.com> 1000000000 +0000\n");
        data.extend_from_slice(b"encoding ISO-8859-1\n");
        data.extend_from_slice(b"\nmessage\n");

        let commit = Commit::parse(&data).unwrap();
        assert_eq!(commit.encoding.as_ref().unwrap().as_bytes(), b"ISO-8859-1");

        let serialized = commit.serialize_content();
        assert_eq!(serialized, data);
    }

    #[test]
    fn missing_tree_errors() {
        let data = b"author A <a@b.com> 1000000000 +0000\ncommitter A <a@b.com> 1000000000 +0000\n\nmsg\n";
        assert!(Commit::parse(data).is_err());
    }
}
