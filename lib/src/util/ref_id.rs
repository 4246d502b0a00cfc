use stable_deref_trait::StableDeref;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// Reference whose equality, ordering, and hash come from the address it points to
///
/// Graphs of virtual objects can contain cycles and two distinct nodes can be structurally
/// indistinguishable, so traversals key their "visited" sets on `RefId` rather than on the node
/// contents.
pub struct RefId<'a, T: ?Sized>(pub &'a T);

impl<'a, T: ?Sized> RefId<'a, T> {
    /// Raw address used for identity
    pub fn as_ptr(&self) -> *const T {
        self.0 as *const T
    }
}

impl<'a, T: ?Sized> Clone for RefId<'a, T> {
    fn clone(&self) -> Self {
        RefId(self.0)
    }
}

impl<'a, T: ?Sized> Copy for RefId<'a, T> {}

impl<'a, T: ?Sized> Hash for RefId<'a, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state)
    }
}

impl<'a, 'b, T: ?Sized> PartialEq<RefId<'b, T>> for RefId<'a, T> {
    fn eq(&self, other: &RefId<'b, T>) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'a, T: ?Sized> Eq for RefId<'a, T> {}

impl<'a, T> PartialOrd for RefId<'a, T> {
    fn partial_cmp(&self, other: &RefId<'a, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, T> Ord for RefId<'a, T> {
    fn cmp(&self, other: &RefId<'a, T>) -> Ordering {
        self.as_ptr().cmp(&other.as_ptr())
    }
}

impl<'a, T: ?Sized> Deref for RefId<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.0
    }
}

impl<'a, T: ?Sized> fmt::Debug for RefId<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefId({:p})", self.as_ptr())
    }
}

unsafe impl<'a, T: ?Sized> StableDeref for RefId<'a, T> {}
