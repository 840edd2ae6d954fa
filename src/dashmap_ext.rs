//! `DashMap` helpers that never hold a shard guard across `.await`.
//!
//! `DashMap::get()` and `DashMap::iter()` hand out guards that keep a shard
//! locked. The registry awaits plugin hooks all the time, so it copies the
//! `Arc`s it needs out of the map first and lets the guard drop.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;

pub trait DashMapExt<K, V> {
    /// Clone the value for `key`.
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone;

    /// Clone every value whose entry passes `keep`, ordered by key.
    fn values_sorted_by_key<F>(&self, keep: F) -> Vec<V>
    where
        K: Clone + Ord,
        V: Clone,
        F: Fn(&V) -> bool;
}

impl<K, V> DashMapExt<K, V> for DashMap<K, V>
where
    K: Eq + Hash,
{
    fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.get(key).map(|r| r.value().clone())
    }

    fn values_sorted_by_key<F>(&self, keep: F) -> Vec<V>
    where
        K: Clone + Ord,
        V: Clone,
        F: Fn(&V) -> bool,
    {
        let mut entries: Vec<(K, V)> = self
            .iter()
            .filter(|e| keep(e.value()))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }
}
