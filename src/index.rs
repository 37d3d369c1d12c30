use std::marker::PhantomData;

use rustc_hash::FxHashMap;

/// Dense index of an actor within one solve.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct ActorId(pub usize);

/// Dense index of an item within one solve.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct ItemId(pub usize);

pub(crate) trait DenseId: Copy {
    fn new(index: usize) -> Self;
    fn index(self) -> usize;
}

impl DenseId for ActorId {
    #[inline]
    fn new(index: usize) -> ActorId {
        ActorId(index)
    }

    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

impl DenseId for ItemId {
    #[inline]
    fn new(index: usize) -> ItemId {
        ItemId(index)
    }

    #[inline]
    fn index(self) -> usize {
        self.0
    }
}

/// Interns string identifiers in order of first appearance.
pub(crate) struct Ids<'a, I> {
    inner: FxHashMap<&'a str, I>,
    names: Vec<&'a str>,
}

impl<I> Default for Ids<'_, I> {
    fn default() -> Self {
        Ids {
            inner: FxHashMap::default(),
            names: Vec::new(),
        }
    }
}

impl<'a, I: DenseId> Ids<'a, I> {
    pub fn get_or_insert(&mut self, name: &'a str) -> I {
        let next_id = I::new(self.names.len());
        let names = &mut self.names;
        *self.inner.entry(name).or_insert_with(|| {
            names.push(name);
            next_id
        })
    }

    pub fn name(&self, id: I) -> &'a str {
        self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &'a str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, &name)| (I::new(index), name))
    }
}

/// Dense table with one slot per interned id.
pub(crate) struct ById<I, T> {
    inner: Vec<T>,
    _id: PhantomData<I>,
}

impl<I: DenseId, T: Clone> ById<I, T> {
    pub fn filled(len: usize, value: T) -> ById<I, T> {
        ById {
            inner: vec![value; len],
            _id: PhantomData,
        }
    }

    pub fn fill(&mut self, value: T) {
        self.inner.fill(value);
    }
}

impl<I: DenseId, T> ById<I, T> {
    #[inline]
    pub fn get(&self, id: I) -> &T {
        &self.inner[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.inner[id.index()]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> + '_ {
        self.inner
            .iter_mut()
            .enumerate()
            .map(|(index, value)| (I::new(index), value))
    }
}

impl<I, T> FromIterator<T> for ById<I, T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> ById<I, T> {
        ById {
            inner: iter.into_iter().collect(),
            _id: PhantomData,
        }
    }
}
