use crate::treap::node::{self, NodeRef};
use crate::treap::priority::PriorityPool;
use crate::treap::tree;
use crate::treap::Result;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use tracing::debug;

/// An ordered map implemented by a treap.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a key, a value, and a priority. The key of any node is greater than all keys in its
/// left subtree and less than all keys occuring in its right subtree. The priority of a node is
/// greater than the priority of all nodes in its subtrees. By randomly generating priorities, the
/// expected height of the tree is proportional to the logarithm of the number of keys.
///
/// Every node also links back to its parent, so the map can split, join, and meld in place.
/// Values are stored behind shared cells and are cloned out on lookup and iteration.
///
/// # Examples
/// ```
/// use treap_map::treap::TreapMap;
///
/// let mut t = TreapMap::new();
/// t.insert(0, 1).unwrap();
/// t.insert(3, 4).unwrap();
///
/// assert_eq!(t.lookup(&0), Some(1));
/// assert_eq!(t.lookup(&1), None);
/// assert_eq!(t.size(), 2);
///
/// assert_eq!(t.min(), Some(0));
///
/// let (left, right) = t.split(2);
/// assert_eq!(left.keys().collect::<Vec<u32>>(), vec![0]);
/// assert_eq!(right.keys().collect::<Vec<u32>>(), vec![3]);
/// ```
pub struct TreapMap<T: Ord, U> {
    root: tree::Tree<T, U>,
    pool: PriorityPool,
}

impl<T: Ord, U> TreapMap<T, U> {
    /// Constructs a new, empty `TreapMap<T, U>` with its own priority pool.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let t: TreapMap<u32, u32> = TreapMap::new();
    /// ```
    pub fn new() -> Self {
        Self::with_pool(PriorityPool::new())
    }

    /// Constructs a new, empty `TreapMap<T, U>` that draws priorities from `pool`. Maps that will
    /// be joined or melded together should share a pool.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::{PriorityPool, TreapMap};
    ///
    /// let pool = PriorityPool::with_seed(0);
    /// let mut n = TreapMap::with_pool(pool.clone());
    /// let mut m = TreapMap::with_pool(pool.clone());
    /// n.insert(1, 1).unwrap();
    /// m.insert(2, 2).unwrap();
    /// assert_eq!(pool.live(), 2);
    /// ```
    pub fn with_pool(pool: PriorityPool) -> Self {
        TreapMap { root: None, pool }
    }

    /// Makes sure that the nodes of `other` may be moved into the treap. An empty treap takes over
    /// the pool of `other`.
    fn claim_pool(&mut self, other: &Self) {
        if other.is_empty() || self.pool.ptr_eq(&other.pool) {
            return;
        }
        assert!(
            self.is_empty(),
            "Expected both treaps to draw from the same priority pool."
        );
        self.pool = other.pool.clone();
    }

    fn adopt(root: tree::Tree<T, U>, pool: PriorityPool) -> Self {
        if let Some(ref root_node) = root {
            root_node.borrow_mut().parent = Default::default();
        }
        TreapMap { root, pool }
    }

    /// Returns a handle to the priority pool of the treap.
    pub fn pool(&self) -> &PriorityPool {
        &self.pool
    }

    /// Inserts a key-value pair into the treap. If the key already exists in the treap, its value
    /// is replaced and the old value is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceExhausted` if the priority pool cannot issue another priority.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// assert_eq!(t.insert(1, 1), Ok(None));
    /// assert_eq!(t.lookup(&1), Some(1));
    /// assert_eq!(t.insert(1, 2), Ok(Some(1)));
    /// assert_eq!(t.lookup(&1), Some(2));
    /// ```
    pub fn insert(&mut self, key: T, value: U) -> Result<Option<U>> {
        let TreapMap { ref mut root, ref pool } = *self;
        tree::insert(root, key, value, pool)
    }

    /// Removes a key-value pair from the treap. If the key exists in the treap, it will return
    /// the associated value. Otherwise it will return `None`.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// assert_eq!(t.remove(&1), Some(1));
    /// assert_eq!(t.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &T) -> Option<U> {
        let victim = tree::remove(&mut self.root, key)?;
        let priority = victim.borrow().priority;
        self.pool.release(priority);
        let value = victim.borrow_mut().value.take();
        value
    }

    /// Checks if a key exists in the treap.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// assert_eq!(t.contains(&0), false);
    /// assert_eq!(t.contains(&1), true);
    /// ```
    pub fn contains(&self, key: &T) -> bool {
        tree::find(&self.root, key).is_some()
    }

    /// Returns the number of key-value pairs in the treap.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// assert_eq!(t.size(), 1);
    /// ```
    pub fn size(&self) -> usize {
        tree::len(&self.root)
    }

    /// Returns `true` if the treap has no key-value pairs.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Splits the treap into a treap with the keys less than `threshold` and a treap with the keys
    /// greater than or equal to `threshold`. Both treaps share the priority pool of the original.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// for key in 0..6 {
    ///     t.insert(key, key).unwrap();
    /// }
    ///
    /// let (left, right) = t.split(3);
    /// assert_eq!(left.keys().collect::<Vec<u32>>(), vec![0, 1, 2]);
    /// assert_eq!(right.keys().collect::<Vec<u32>>(), vec![3, 4, 5]);
    /// ```
    pub fn split(mut self, threshold: T) -> (Self, Self) {
        let (left, right) = tree::split(&mut self.root, threshold);
        let left = Self::adopt(left, self.pool.clone());
        let right = Self::adopt(right, self.pool.clone());
        debug!(left = left.size(), right = right.size(), "split treap");
        (left, right)
    }

    /// Concatenates `other` into the treap. Every key of one treap must be less than every key of
    /// the other; which one holds the lesser keys is decided by comparing the two roots.
    ///
    /// # Panics
    ///
    /// Panics if both treaps are non-empty and do not share a priority pool.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut n = TreapMap::new();
    /// n.insert(4, 4).unwrap();
    /// n.insert(5, 5).unwrap();
    ///
    /// let mut m = TreapMap::with_pool(n.pool().clone());
    /// m.insert(1, 1).unwrap();
    ///
    /// n.join(m);
    /// assert_eq!(n.keys().collect::<Vec<u32>>(), vec![1, 4, 5]);
    /// ```
    pub fn join(&mut self, mut other: Self)
    where
        T: Clone,
    {
        self.claim_pool(&other);
        let root = self.root.take();
        let other_root = other.root.take();
        let is_reversed = match (&root, &other_root) {
            (Some(root_node), Some(other_node)) => other_node.borrow().key < root_node.borrow().key,
            _ => false,
        };
        let (lesser, greater) = if is_reversed {
            (other_root, root)
        } else {
            (root, other_root)
        };
        self.root = match (lesser, greater) {
            (Some(lesser_node), Some(greater_node)) => {
                let key = lesser_node.borrow().key.clone();
                tree::join(lesser_node, greater_node, key)
            },
            (root, None) | (None, root) => root,
        };
        debug!(size = self.size(), "joined treaps");
    }

    /// Merges `other` into the treap. The key ranges of the two treaps may overlap. If a key is
    /// found in both treaps, the merged treap holds the value from `other`.
    ///
    /// The smaller treap is cut into subtrees that are transplanted into the larger one. Each
    /// subtree costs one descent of the larger treap, so the expected cost is logarithmic in the
    /// size of the larger treap per transplanted subtree, and there are few subtrees when the key
    /// ranges interleave coarsely.
    ///
    /// # Panics
    ///
    /// Panics if both treaps are non-empty and do not share a priority pool.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut n = TreapMap::new();
    /// n.insert(1, 1).unwrap();
    /// n.insert(2, 2).unwrap();
    ///
    /// let mut m = TreapMap::with_pool(n.pool().clone());
    /// m.insert(2, 3).unwrap();
    /// m.insert(3, 3).unwrap();
    ///
    /// n.meld(m);
    /// assert_eq!(
    ///     n.iter().collect::<Vec<(u32, u32)>>(),
    ///     vec![(1, 1), (2, 3), (3, 3)],
    /// );
    /// ```
    pub fn meld(&mut self, mut other: Self) {
        self.claim_pool(&other);
        let is_swapped = other.size() > self.size();
        if is_swapped {
            mem::swap(self, &mut other);
        }
        let units = other.root.take();
        let TreapMap { ref mut root, .. } = *self;
        tree::meld(root, units, !is_swapped, &other.pool);
        debug!(size = self.size(), swapped = is_swapped, "melded treaps");
    }

    /// Removes every key of `other` from the treap.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut n = TreapMap::new();
    /// n.insert(1, 1).unwrap();
    /// n.insert(2, 2).unwrap();
    ///
    /// let mut m = TreapMap::new();
    /// m.insert(2, 3).unwrap();
    /// m.insert(3, 3).unwrap();
    ///
    /// n.difference(&m);
    /// assert_eq!(n.keys().collect::<Vec<u32>>(), vec![1]);
    /// ```
    pub fn difference(&mut self, other: &Self)
    where
        T: Clone,
    {
        // TODO: split `other` against `self` recursively to remove in O(m log(n / m)).
        let mut removed = 0;
        for key in other.keys() {
            if self.remove(&key).is_some() {
                removed += 1;
            }
        }
        debug!(removed, size = self.size(), "took treap difference");
    }

    /// Returns a copy of the value associated with a particular key. Returns `None` if the key
    /// does not exist.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// assert_eq!(t.get(&0), None);
    /// assert_eq!(t.get(&1), Some(1));
    /// ```
    pub fn get(&self, key: &T) -> Option<U>
    where
        U: Clone,
    {
        let node = tree::find(&self.root, key)?;
        let value = node.borrow().value.clone();
        value
    }

    /// Same as `get`.
    pub fn lookup(&self, key: &T) -> Option<U>
    where
        U: Clone,
    {
        self.get(key)
    }

    /// Returns the minimum key of the treap. Returns `None` if the treap is empty.
    pub fn min(&self) -> Option<T>
    where
        T: Clone,
    {
        let node = tree::min(&self.root)?;
        let key = node.borrow().key.clone();
        Some(key)
    }

    /// Returns the maximum key of the treap. Returns `None` if the treap is empty.
    pub fn max(&self) -> Option<T>
    where
        T: Clone,
    {
        let node = tree::max(&self.root)?;
        let key = node.borrow().key.clone();
        Some(key)
    }

    /// Returns the key and the priority of the root. Returns `None` if the treap is empty.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// assert_eq!(t.root_key_and_priority().map(|(key, _)| key), Some(1));
    /// ```
    pub fn root_key_and_priority(&self) -> Option<(T, u64)>
    where
        T: Clone,
    {
        self.root.as_ref().map(|root| {
            let root_node = root.borrow();
            (root_node.key.clone(), root_node.priority)
        })
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        tree::height(&self.root)
    }

    /// Returns the height of the treap relative to the height of a perfectly balanced tree with the
    /// same number of keys. Returns `0.0` for an empty treap.
    pub fn balance_factor(&self) -> f64 {
        let size = self.size();
        if size == 0 {
            return 0.0;
        }
        self.height() as f64 / ((size + 1) as f64).log2()
    }

    /// Checks that the treap satisfies the binary search tree property, the heap property, and
    /// that every parent link and subtree length is consistent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Structural` describing the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        tree::check_invariants(&self.root)
    }

    fn traverse(&self) -> InOrder<T, U> {
        InOrder {
            current: self.root.clone(),
            stack: Vec::new(),
            marker: PhantomData,
        }
    }

    /// Returns an iterator over the treap. The iterator will yield key-value pairs using in-order
    /// traversal.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(1, 1).unwrap();
    /// t.insert(3, 3).unwrap();
    ///
    /// let mut iterator = t.iter();
    /// assert_eq!(iterator.next(), Some((1, 1)));
    /// assert_eq!(iterator.next(), Some((3, 3)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> TreapMapIter<T, U> {
        TreapMapIter {
            inner: self.traverse(),
        }
    }

    /// Returns an iterator over the keys of the treap in ascending order.
    ///
    /// # Examples
    /// ```
    /// use treap_map::treap::TreapMap;
    ///
    /// let mut t = TreapMap::new();
    /// t.insert(3, "c").unwrap();
    /// t.insert(1, "a").unwrap();
    ///
    /// assert_eq!(t.keys().collect::<Vec<u32>>(), vec![1, 3]);
    /// ```
    pub fn keys(&self) -> Keys<T, U> {
        Keys {
            inner: self.traverse(),
        }
    }
}

struct InOrder<'a, T: 'a + Ord, U: 'a> {
    current: tree::Tree<T, U>,
    stack: Vec<NodeRef<T, U>>,
    marker: PhantomData<&'a TreapMap<T, U>>,
}

impl<'a, T: 'a + Ord, U: 'a> Iterator for InOrder<'a, T, U> {
    type Item = NodeRef<T, U>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.current.take() {
            self.current = node.borrow().left.clone();
            self.stack.push(node);
        }
        let node = self.stack.pop()?;
        self.current = node.borrow().right.clone();
        Some(node)
    }
}

/// An iterator for `TreapMap<T, U>`
///
/// This iterator traverses the elements of a treap in-order and yields copies of the key-value
/// pairs.
pub struct TreapMapIter<'a, T: 'a + Ord, U: 'a> {
    inner: InOrder<'a, T, U>,
}

impl<'a, T: 'a + Ord + Clone, U: 'a + Clone> Iterator for TreapMapIter<'a, T, U> {
    type Item = (T, U);

    fn next(&mut self) -> Option<Self::Item> {
        for node in &mut self.inner {
            let curr = node.borrow();
            if let Some(ref value) = curr.value {
                return Some((curr.key.clone(), value.clone()));
            }
        }
        None
    }
}

/// An iterator over the keys of a `TreapMap<T, U>` in ascending order.
pub struct Keys<'a, T: 'a + Ord, U: 'a> {
    inner: InOrder<'a, T, U>,
}

impl<'a, T: 'a + Ord + Clone, U: 'a> Iterator for Keys<'a, T, U> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.inner.next()?;
        let key = node.borrow().key.clone();
        Some(key)
    }
}

impl<'a, T: 'a + Ord + Clone, U: 'a + Clone> IntoIterator for &'a TreapMap<T, U> {
    type Item = (T, U);
    type IntoIter = TreapMapIter<'a, T, U>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Ord, U> Default for TreapMap<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord, U> Drop for TreapMap<T, U> {
    fn drop(&mut self) {
        let mut stack: Vec<NodeRef<T, U>> = self.root.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            let mut curr = node.borrow_mut();
            stack.extend(curr.left.take());
            stack.extend(curr.right.take());
            self.pool.release(curr.priority);
        }
    }
}

impl<T: Ord + fmt::Debug + Clone, U: fmt::Debug + Clone> fmt::Debug for TreapMap<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Writes one line per node in pre-order, indented by depth, with the side of the node, its key,
/// and its priority.
impl<T: Ord + fmt::Debug, U> fmt::Display for TreapMap<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack: Vec<(NodeRef<T, U>, usize)> =
            self.root.iter().map(|root| (root.clone(), 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            let side = match node::is_right_child(&node) {
                Ok(true) => "right",
                Ok(false) => "left",
                Err(_) => "root",
            };
            let curr = node.borrow();
            writeln!(
                f,
                "{}{}: {:?} ({})",
                "    ".repeat(depth),
                side,
                curr.key,
                curr.priority,
            )?;
            if let Some(ref right) = curr.right {
                stack.push((right.clone(), depth + 1));
            }
            if let Some(ref left) = curr.left {
                stack.push((left.clone(), depth + 1));
            }
        }
        Ok(())
    }
}
