//! Type-safe indexing for pieces and clusters.  Each type of object gets its own index type,
//! which is an opaque new-type over integers.  Additionally, each type of object gets its own
//! replacement for [`Vec`], which can only be indexed by its corresponding index type.

use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// A new-type over [`Vec`] which will only accept indices of an opaque index type
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypedVec<Idx, T> {
    inner: Vec<T>,
    _phantom_data: PhantomData<Idx>,
}

impl<Idx, T> TypedVec<Idx, T> {
    /// Creates a new, empty type-safe collection
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            _phantom_data: PhantomData,
        }
    }

    /// Creates a new, empty type-safe collection which can take `cap` items without reallocating.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Vec::with_capacity(cap),
            _phantom_data: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Gets the index of the next element to be [`push`](Self::push)ed to this collection.
    pub fn next_idx(&self) -> Idx
    where
        Idx: IdxType,
    {
        Idx::from_idx(self.inner.len())
    }

    /// Adds a new element to this collection, returning its opaque index
    pub fn push(&mut self, t: T) -> Idx
    where
        Idx: IdxType,
    {
        let idx = self.next_idx();
        self.inner.push(t);
        idx
    }

    pub fn get(&self, idx: Idx) -> Option<&T>
    where
        Idx: IdxType,
    {
        self.inner.get(idx.to_idx())
    }

    pub fn get_mut(&mut self, idx: Idx) -> Option<&mut T>
    where
        Idx: IdxType,
    {
        self.inner.get_mut(idx.to_idx())
    }

    /* ITER FUNCTIONS */

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.inner.iter()
    }

    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx, &T)>
    where
        Idx: IdxType,
    {
        self.inner
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::from_idx(i), v))
    }
}

impl<Idx, T> Default for TypedVec<Idx, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx, T: Debug> Debug for TypedVec<Idx, T> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.inner.iter()).finish()
    }
}

impl<Idx, T> From<Vec<T>> for TypedVec<Idx, T> {
    fn from(inner: Vec<T>) -> Self {
        Self {
            inner,
            _phantom_data: PhantomData,
        }
    }
}

impl<Idx, T> std::iter::FromIterator<T> for TypedVec<Idx, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<IdxT: IdxType, T> Index<IdxT> for TypedVec<IdxT, T> {
    type Output = T;

    fn index(&self, index: IdxT) -> &Self::Output {
        self.get(index).unwrap()
    }
}

impl<IdxT: IdxType, T> IndexMut<IdxT> for TypedVec<IdxT, T> {
    fn index_mut(&mut self, index: IdxT) -> &mut Self::Output {
        self.get_mut(index).unwrap()
    }
}

///////////////////////////
// MACRO/TRAIT MACHINERY //
///////////////////////////

macro_rules! idx_impl {
    ($idx_name: ident, $vec_name: ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $idx_name {
            idx: usize,
        }

        impl IdxType for $idx_name {
            fn from_idx(idx: usize) -> Self {
                Self { idx }
            }

            fn to_idx(self) -> usize {
                self.idx
            }
        }

        pub type $vec_name<T> = TypedVec<$idx_name, T>;

        impl Debug for $idx_name {
            fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($idx_name), self.idx)
            }
        }
    };
}

idx_impl!(PieceIdx, PieceVec); // Collection of puzzle pieces
idx_impl!(ClusterIdx, ClusterVec); // Collection of rigid clusters (including discarded ones)

/// A common trait implemented by all custom index types
pub trait IdxType {
    fn from_idx(idx: usize) -> Self;

    fn to_idx(self) -> usize;
}
