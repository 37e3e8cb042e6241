use std::collections::BTreeSet;

/// Opaque identifier of a geometry category in the loaded model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic set of category ids.
///
/// Ordering contract:
/// - Iteration yields ids in ascending lexical order, independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet {
    ids: BTreeSet<CategoryId>,
}

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &CategoryId) -> bool {
        self.ids.contains(id)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: CategoryId) -> bool {
        self.ids.insert(id)
    }

    pub fn union_in_place(&mut self, other: &Self) {
        self.ids.extend(other.ids.iter().cloned());
    }

    /// Set difference in place: `self \ other`.
    pub fn diff_in_place(&mut self, other: &Self) {
        self.ids.retain(|id| !other.contains(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryId> {
        self.ids.iter()
    }
}

impl FromIterator<CategoryId> for CategorySet {
    fn from_iter<T: IntoIterator<Item = CategoryId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a CategoryId;
    type IntoIter = std::collections::btree_set::Iter<'a, CategoryId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
