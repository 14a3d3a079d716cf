//! Multi-winner extremum filtering.
//!
//! [`where_max`] keeps every element whose key equals the maximum key, not
//! just the first one. The maximum must be known before any element can be
//! accepted, so the source is always realized into a `Vec` first; lazy or
//! side-effecting iterators are drained exactly once.
//!
//! ```rust
//! use sift_query::extremum::WhereExtremum;
//!
//! let top = vec![3, 1, 3, 2].into_iter().where_max(|x| *x);
//! assert_eq!(top, vec![3, 3]);
//! ```

use std::cmp::Ordering;

use tracing::trace;

/// Keep every element whose key equals the maximum key, in input order.
///
/// Keys are compared with `PartialOrd` to find the maximum and with
/// `PartialEq` to collect ties. `Option` keys use `Option`'s ordering, so
/// `None` only wins when every key is `None`. A key that is not equal to
/// itself (a float NaN) never wins while any ordered key exists; when no
/// key is ordered, every element is returned.
pub fn where_max<I, K, F>(source: I, key: F) -> Vec<I::Item>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> K,
{
    select_extreme(source, key, Ordering::Greater)
}

/// Keep every element whose key equals the minimum key, in input order.
///
/// Mirrors [`where_max`].
pub fn where_min<I, K, F>(source: I, key: F) -> Vec<I::Item>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> K,
{
    select_extreme(source, key, Ordering::Less)
}

fn select_extreme<I, K, F>(source: I, mut key: F, wins: Ordering) -> Vec<I::Item>
where
    I: IntoIterator,
    K: PartialOrd,
    F: FnMut(&I::Item) -> K,
{
    let keyed: Vec<(K, I::Item)> = source.into_iter().map(|item| (key(&item), item)).collect();

    let mut best: Option<usize> = None;
    for (i, (k, _)) in keyed.iter().enumerate() {
        if k.partial_cmp(k).is_none() {
            continue;
        }
        match best {
            Some(b) if k.partial_cmp(&keyed[b].0) != Some(wins) => {}
            _ => best = Some(i),
        }
    }

    let Some(best) = best else {
        // Empty, or no key is ordered against itself; all elements tie.
        trace!(len = keyed.len(), "No ordered extremum key");
        return keyed.into_iter().map(|(_, item)| item).collect();
    };

    let keep: Vec<bool> = keyed.iter().map(|(k, _)| *k == keyed[best].0).collect();
    keyed
        .into_iter()
        .zip(keep)
        .filter_map(|((_, item), keep)| keep.then_some(item))
        .collect()
}

/// Extremum filters as iterator adapters.
pub trait WhereExtremum: Iterator + Sized {
    /// See [`where_max`].
    fn where_max<K, F>(self, key: F) -> Vec<Self::Item>
    where
        K: PartialOrd,
        F: FnMut(&Self::Item) -> K,
    {
        where_max(self, key)
    }

    /// See [`where_min`].
    fn where_min<K, F>(self, key: F) -> Vec<Self::Item>
    where
        K: PartialOrd,
        F: FnMut(&Self::Item) -> K,
    {
        where_min(self, key)
    }
}

impl<I: Iterator> WhereExtremum for I {}
