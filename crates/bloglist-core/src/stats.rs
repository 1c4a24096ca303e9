//! Summary statistics over collections of posts.
//!
//! Every function here is pure: it reads the slice it is given and returns a
//! fresh value. Selections that can tie (`favorite_blog`, `most_blogs`,
//! `most_likes`) always resolve to the first candidate in input order, and
//! grouping keeps authors in first-occurrence order so that this holds for
//! the per-author selectors too.

use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::Post;

/// The two fields the statistics read from a post-shaped record.
pub trait BlogEntry {
    fn author(&self) -> &str;
    fn likes(&self) -> u64;
}

impl BlogEntry for Post {
    fn author(&self) -> &str {
        &self.author
    }

    fn likes(&self) -> u64 {
        self.likes
    }
}

impl<T: BlogEntry + ?Sized> BlogEntry for &T {
    fn author(&self) -> &str {
        (**self).author()
    }

    fn likes(&self) -> u64 {
        (**self).likes()
    }
}

/// Author with the largest number of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBlogs {
    pub author: String,
    pub blogs: u64,
}

/// Author with the largest number of likes across their posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorLikes {
    pub author: String,
    pub likes: u64,
}

/// Sum of likes over all posts. Zero for an empty slice, `u64::MAX` once the
/// sum no longer fits.
pub fn total_likes<T: BlogEntry>(posts: &[T]) -> u64 {
    posts
        .iter()
        .fold(0u64, |sum, post| sum.saturating_add(post.likes()))
}

/// The most liked post, or `None` when there are no posts.
pub fn favorite_blog<T: BlogEntry>(posts: &[T]) -> Option<&T> {
    first_max_by_key(posts.iter(), |post| post.likes())
}

/// The author who wrote the most posts, paired with that count.
pub fn most_blogs<T: BlogEntry>(posts: &[T]) -> Option<AuthorBlogs> {
    let counts = tally(posts, |post| post.author(), |_| 1);

    first_max_by_key(counts.into_iter(), |(_, blogs)| *blogs).map(|(author, blogs)| AuthorBlogs {
        author: author.to_owned(),
        blogs,
    })
}

/// The author whose posts collected the most likes, paired with that total.
pub fn most_likes<T: BlogEntry>(posts: &[T]) -> Option<AuthorLikes> {
    let totals = tally(posts, |post| post.author(), |post| post.likes());

    first_max_by_key(totals.into_iter(), |(_, likes)| *likes).map(|(author, likes)| AuthorLikes {
        author: author.to_owned(),
        likes,
    })
}

/// Group `items` by `key`, summing `value` within each group.
///
/// Keys come back in the order they were first seen. Sums saturate at `u64::MAX`.
pub fn tally<'a, T, K, KF, VF>(items: &'a [T], key: KF, value: VF) -> IndexMap<K, u64>
where
    K: Hash + Eq,
    KF: Fn(&'a T) -> K,
    VF: Fn(&'a T) -> u64,
{
    let mut totals = IndexMap::new();
    for item in items {
        let total = totals.entry(key(item)).or_insert(0u64);
        *total = total.saturating_add(value(item));
    }
    totals
}

/// Like `Iterator::max_by_key`, but keeps the first of several equal maxima.
fn first_max_by_key<I, F>(iter: I, key: F) -> Option<I::Item>
where
    I: Iterator,
    F: Fn(&I::Item) -> u64,
{
    let mut best: Option<(u64, I::Item)> = None;
    for item in iter {
        let k = key(&item);
        if best.as_ref().is_none_or(|(best_key, _)| k > *best_key) {
            best = Some((k, item));
        }
    }
    best.map(|(_, item)| item)
}
