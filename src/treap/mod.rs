//! Probabilistic binary search tree where each node also maintains the heap invariant.
//!
//! Nodes keep a non-owning back-reference to their parent, which lets rotations, splits, joins,
//! and melds restructure the tree in place by walking up from any node.

mod map;
mod node;
mod priority;
mod tree;

#[cfg(test)]
mod proptests;

pub use self::map::{Keys, TreapMap, TreapMapIter};
pub use self::priority::{PriorityPool, MAX_PRIORITY};

use std::error;
use std::fmt;
use std::result;

/// Convenience `Error` enum for `treap`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The priority pool has issued every priority it can hold.
    ResourceExhausted {
        /// The number of distinct priorities the pool can hold at once.
        capacity: u64,
    },
    /// A structural invariant of the tree does not hold.
    Structural(String),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ResourceExhausted { capacity } => {
                write!(f, "all {} priorities of the pool are in use", capacity)
            },
            Error::Structural(message) => write!(f, "structural invariant violated: {}", message),
        }
    }
}

/// Convenience `Result` type for `treap`.
pub type Result<T> = result::Result<T, Error>;
