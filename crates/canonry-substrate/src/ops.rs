/// A single change inside an atomic commit batch.
///
/// A lifecycle operation assembles every write it needs (new blobs plus any
/// relocation), and the whole batch lands in one commit or not at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeOp {
    /// Write `bytes` at `path`, creating or replacing the blob.
    Put { path: String, bytes: Vec<u8> },

    /// Relocate the directory `from` (every blob under it) to `to`.
    ///
    /// A move, never a copy: after the commit, nothing remains at `from`.
    Move { from: String, to: String },
}

impl TreeOp {
    /// Write op for a path.
    pub fn put(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Directory-move op.
    pub fn mv(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            to: to.into(),
        }
    }
}
