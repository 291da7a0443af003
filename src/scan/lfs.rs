//! Detection of Git LFS pointer files inside hunks.

/// First line of every LFS pointer file.
pub const LFS_POINTER_IDENTIFIER: &str = "version https://git-lfs.github.com/spec/v1";
/// Prefix of the pointer line naming the stored object.
pub const LFS_OID_PREFIX: &str = "oid sha256:";

/// Answers whether an oid names an object the LFS store actually holds.
pub trait LfsLookup {
    fn is_tracked_oid(&self, oid: &str) -> bool;
}

/// Lookup for repositories without an LFS store.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLfs;

impl LfsLookup for NoLfs {
    fn is_tracked_oid(&self, _oid: &str) -> bool {
        false
    }
}

impl<F> LfsLookup for F
where
    F: Fn(&str) -> bool,
{
    fn is_tracked_oid(&self, oid: &str) -> bool {
        self(oid)
    }
}

/// Tracks the pointer-file pattern across the lines of one file.
#[derive(Debug, Default)]
pub(crate) struct LfsProbe {
    saw_identifier: bool,
}

impl LfsProbe {
    /// Feed one line's text (without marker); returns the oid once a pointer
    /// identifier has been followed by a well-formed oid line.
    pub fn observe<'a>(&mut self, text: &'a str) -> Option<&'a str> {
        if text == LFS_POINTER_IDENTIFIER {
            self.saw_identifier = true;
            return None;
        }
        if !self.saw_identifier {
            return None;
        }
        let oid = text.strip_prefix(LFS_OID_PREFIX)?;
        (oid.len() == 64 && oid.bytes().all(|b| b.is_ascii_hexdigit())).then_some(oid)
    }
}
