//! An ordered map backed by a treap whose nodes link back to their parents.
//!
//! Besides point operations, the map supports splitting at a key, joining two maps with disjoint
//! key ranges, melding two maps with overlapping key ranges, and taking set differences.

pub mod treap;
