//! # Exact Membership
//!
//! Checking a block list for one identity. Short lists are scanned. Longer
//! stored lists, which are kept sorted, are binary searched in place; an
//! unsorted list checked many times is hashed once up front.

use std::collections::HashSet;

/// A block list prepared for membership checks.
#[derive(Debug)]
pub enum MembershipIndex<'a> {
    /// Linear scan over a short list.
    Linear(&'a [String]),
    /// Binary search over a sorted list.
    Sorted(&'a [String]),
    /// Hash set over a long unsorted list.
    Hashed(HashSet<&'a str>),
}

impl<'a> MembershipIndex<'a> {
    /// Index a sorted list without copying it.
    ///
    /// `items` must be sorted, as stored exact block lists are.
    pub fn sorted(items: &'a [String], threshold: usize) -> Self {
        if items.len() > threshold {
            MembershipIndex::Sorted(items)
        } else {
            MembershipIndex::Linear(items)
        }
    }

    /// Index an arbitrary list, hashing it when there are more than
    /// `threshold` items.
    pub fn build(items: &'a [String], threshold: usize) -> Self {
        if items.len() > threshold {
            MembershipIndex::Hashed(items.iter().map(String::as_str).collect())
        } else {
            MembershipIndex::Linear(items)
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        match self {
            MembershipIndex::Linear(items) => items.iter().any(|i| i == item),
            MembershipIndex::Sorted(items) => items
                .binary_search_by(|i| i.as_str().cmp(item))
                .is_ok(),
            MembershipIndex::Hashed(set) => set.contains(item),
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, MembershipIndex::Linear(_))
    }
}
