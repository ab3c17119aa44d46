use crate::error::SubstrateResult;
use crate::ops::TreeOp;

/// Read access to committed snapshots.
///
/// All reads resolve against a named ref and therefore see a consistent
/// snapshot: a reader at a stable ref is unaffected by writes happening on
/// the working state after that ref was resolved. Implementations never
/// cache — every call goes to the substrate.
pub trait TreeReader: Send + Sync {
    /// List every blob path under `prefix` at `ref_name`, in the
    /// substrate's own enumeration order.
    ///
    /// An empty prefix lists the whole tree. A prefix with no blobs yields
    /// an empty list; an unresolvable ref is an error.
    fn list_tree(&self, ref_name: &str, prefix: &str) -> SubstrateResult<Vec<String>>;

    /// Blob bytes at `ref_name:path`, or `Ok(None)` if no blob exists
    /// there.
    fn show_blob(&self, ref_name: &str, path: &str) -> SubstrateResult<Option<Vec<u8>>>;
}

// `&T` is Send + Sync whenever `T: Sync`, which the trait already requires.
impl<T: TreeReader + ?Sized> TreeReader for &T {
    fn list_tree(&self, ref_name: &str, prefix: &str) -> SubstrateResult<Vec<String>> {
        (**self).list_tree(ref_name, prefix)
    }

    fn show_blob(&self, ref_name: &str, path: &str) -> SubstrateResult<Option<Vec<u8>>> {
        (**self).show_blob(ref_name, path)
    }
}

/// Write access to the working tree, used only by the lifecycle store.
///
/// `commit` is the only durability point: all ops of one call land in one
/// commit, or the durable state is untouched. Implementations must refuse
/// (not overwrite) a commit that conflicts with an intervening change.
pub trait WorkTree: Send + Sync {
    /// Bytes currently at `path` in the working tree, or `Ok(None)`.
    fn read(&self, path: &str) -> SubstrateResult<Option<Vec<u8>>>;

    /// Whether a blob currently exists at `path` in the working tree.
    fn exists(&self, path: &str) -> SubstrateResult<bool> {
        Ok(self.read(path)?.is_some())
    }

    /// Apply `ops` and durably commit them as one unit under `message`.
    fn commit(&self, ops: &[TreeOp], message: &str) -> SubstrateResult<()>;
}
