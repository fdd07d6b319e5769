use crate::treap::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::warn;

/// The priority reserved for internal sentinel nodes. A pool never issues it, so a sentinel always
/// outranks every live node.
pub const MAX_PRIORITY: u64 = u64::MAX;

#[derive(Debug)]
struct Pool {
    rng: StdRng,
    live: HashSet<u64>,
    capacity: u64,
}

/// A source of distinct, uniformly random node priorities.
///
/// Priorities are drawn from `0..capacity` and no priority is issued again until it has been
/// released. Cloning a `PriorityPool` yields another handle to the same pool, so trees that share
/// a pool never hold two nodes with equal priorities.
///
/// # Examples
///
/// ```
/// use treap_map::treap::PriorityPool;
///
/// let pool = PriorityPool::with_capacity(2, 0);
/// let x = pool.draw().unwrap();
/// let y = pool.draw().unwrap();
/// assert_ne!(x, y);
/// assert!(pool.draw().is_err());
///
/// pool.release(x);
/// assert_eq!(pool.draw(), Ok(x));
/// ```
#[derive(Clone, Debug)]
pub struct PriorityPool {
    inner: Rc<RefCell<Pool>>,
}

impl PriorityPool {
    fn from_rng(rng: StdRng, capacity: u64) -> Self {
        PriorityPool {
            inner: Rc::new(RefCell::new(Pool {
                rng,
                live: HashSet::new(),
                capacity,
            })),
        }
    }

    /// Constructs a new pool seeded from system entropy that can issue every priority below
    /// `MAX_PRIORITY`.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy(), MAX_PRIORITY)
    }

    /// Constructs a new pool with a fixed seed. Trees built from the same seed and the same
    /// sequence of operations have the same shape.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), MAX_PRIORITY)
    }

    /// Constructs a new pool with a fixed seed that holds at most `capacity` live priorities.
    pub fn with_capacity(capacity: u64, seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), capacity)
    }

    /// Draws a priority that is not currently live in this pool.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceExhausted` if every priority of the pool is live.
    pub fn draw(&self) -> Result<u64> {
        let mut guard = self.inner.borrow_mut();
        let capacity = guard.capacity;
        let Pool { rng, live, .. } = &mut *guard;
        if live.len() as u64 >= capacity {
            warn!(capacity, "priority pool exhausted");
            return Err(Error::ResourceExhausted { capacity });
        }
        loop {
            let priority = rng.gen_range(0..capacity);
            if live.insert(priority) {
                return Ok(priority);
            }
        }
    }

    /// Returns a priority to the pool so that it may be drawn again. Releasing a priority that is
    /// not live is a no-op.
    pub fn release(&self, priority: u64) {
        self.inner.borrow_mut().live.remove(&priority);
    }

    /// Returns the number of live priorities.
    pub fn live(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Returns the maximum number of live priorities.
    pub fn capacity(&self) -> u64 {
        self.inner.borrow().capacity
    }

    /// Returns `true` if both handles refer to the same pool.
    pub fn ptr_eq(&self, other: &PriorityPool) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for PriorityPool {
    fn default() -> Self {
        Self::new()
    }
}
