use std::collections::VecDeque;

/// A generic trait for implementing replacement policies. Used to parameterise a Cache.
///
/// Policies only see tags, never line slots. Each set owns an ordered sequence of the tags
/// currently resident in it, and the victim on a full-set miss is always taken from that sequence.
/// The cache is responsible for mapping the victim tag back onto a line
pub trait ReplacementPolicy {
    /// Creates the policy state for a cache with `num_sets` sets of `ways` lines each
    fn new(num_sets: usize, ways: usize) -> Self where Self: Sized;

    /// Updates the policy when a resident tag is hit
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `set`: The set containing the tag
    /// * `tag`: The tag which was hit
    ///
    /// returns: ()
    fn update_on_hit(&mut self, _set: usize, _tag: u64) {}

    /// Records a tag which was placed into a previously invalid line
    fn insert(&mut self, set: usize, tag: u64);

    /// Removes and returns the victim of a full set
    ///
    /// Callers must follow this with [`ReplacementPolicy::insert`] for the incoming tag. Returns
    /// None only if the set is empty, which a full set never is
    fn evict(&mut self, set: usize) -> Option<u64>;

    /// The replacement order of a set. The orientation is policy specific and documented on each
    /// implementation
    fn order(&self, set: usize) -> &VecDeque<u64>;
}

fn remove_tag(queue: &mut VecDeque<u64>, tag: u64) -> bool {
    match queue.iter().position(|t| *t == tag) {
        Some(position) => {
            queue.remove(position);
            true
        }
        None => false,
    }
}

/// Least Recently Used replacement policy
///
/// Each set keeps its tags most-recently-used first. Hits move the tag to the front, new tags are
/// pushed to the front and the victim is taken from the back
#[derive(Debug, Clone)]
pub struct LeastRecentlyUsed {
    orders: Vec<VecDeque<u64>>,
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            orders: (0..num_sets).map(|_| VecDeque::with_capacity(ways)).collect(),
        }
    }

    fn update_on_hit(&mut self, set: usize, tag: u64) {
        let queue = &mut self.orders[set];
        let removed = remove_tag(queue, tag);
        debug_assert!(removed, "hit on tag {tag:#x} which is not in the order of set {set}");
        queue.push_front(tag);
    }

    fn insert(&mut self, set: usize, tag: u64) {
        let queue = &mut self.orders[set];
        debug_assert!(!queue.contains(&tag), "duplicate tag {tag:#x} in set {set}");
        queue.push_front(tag);
    }

    fn evict(&mut self, set: usize) -> Option<u64> {
        self.orders[set].pop_back()
    }

    fn order(&self, set: usize) -> &VecDeque<u64> {
        &self.orders[set]
    }
}

/// First In First Out replacement policy
///
/// Each set keeps its tags oldest-inserted first. Hits are ignored, new tags are appended and the
/// victim is the oldest tag
#[derive(Debug, Clone)]
pub struct FirstInFirstOut {
    orders: Vec<VecDeque<u64>>,
}

impl ReplacementPolicy for FirstInFirstOut {
    fn new(num_sets: usize, ways: usize) -> Self {
        Self {
            orders: (0..num_sets).map(|_| VecDeque::with_capacity(ways)).collect(),
        }
    }

    fn insert(&mut self, set: usize, tag: u64) {
        let queue = &mut self.orders[set];
        debug_assert!(!queue.contains(&tag), "duplicate tag {tag:#x} in set {set}");
        queue.push_back(tag);
    }

    fn evict(&mut self, set: usize) -> Option<u64> {
        self.orders[set].pop_front()
    }

    fn order(&self, set: usize) -> &VecDeque<u64> {
        &self.orders[set]
    }
}
