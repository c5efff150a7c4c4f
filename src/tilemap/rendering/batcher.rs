// src/tilemap/rendering/batcher.rs

/// Max instances per batch; matches the usual hardware instancing limit of 1023
/// transforms per instanced draw.
pub const BATCH_CAPACITY: usize = 1023;

/// Splits an instance list into contiguous, order-preserving chunks of at most
/// [`BATCH_CAPACITY`]. Chunk boundaries carry no meaning beyond that limit.
#[derive(Clone, Debug, Default)]
pub struct InstanceBatcher<T> {
    instances: Vec<T>,
    batches: Vec<Vec<T>>,
}

impl<T: Clone> InstanceBatcher<T> {
    pub fn new(instances: Vec<T>, update_batches: bool) -> Self {
        let mut batcher = Self { instances: Vec::new(), batches: Vec::new() };
        batcher.set_instances(instances, update_batches);
        batcher
    }

    /// Replaces the list. With `update_batches == false` the old batches stay
    /// until [`InstanceBatcher::rebuild_batches`] is called.
    pub fn set_instances(&mut self, instances: Vec<T>, update_batches: bool) {
        self.instances = instances;
        if update_batches {
            self.rebuild_batches();
        }
    }

    pub fn rebuild_batches(&mut self) {
        self.batches.clear();
        self.batches.extend(self.instances.chunks(BATCH_CAPACITY).map(<[T]>::to_vec));
    }

    /// Unbatched list, for materials drawn one instance at a time.
    pub fn instances(&self) -> &[T] {
        &self.instances
    }

    pub fn batches(&self) -> &[Vec<T>] {
        &self.batches
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_law() {
        for n in [0, 1, 5, BATCH_CAPACITY - 1, BATCH_CAPACITY, BATCH_CAPACITY + 1, 3 * BATCH_CAPACITY + 17] {
            let list: Vec<usize> = (0..n).collect();
            let batcher = InstanceBatcher::new(list.clone(), true);
            assert_eq!(batcher.batch_count(), n.div_ceil(BATCH_CAPACITY), "n={n}");
            assert!(batcher.batches().iter().all(|b| !b.is_empty() && b.len() <= BATCH_CAPACITY));
            let joined: Vec<usize> = batcher.batches().concat();
            assert_eq!(joined, list);
        }
    }

    #[test]
    fn only_last_batch_is_short() {
        let batcher = InstanceBatcher::new(vec![0u8; 2 * BATCH_CAPACITY + 3], true);
        let sizes: Vec<usize> = batcher.batches().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![BATCH_CAPACITY, BATCH_CAPACITY, 3]);
    }

    #[test]
    fn deferred_update_keeps_stale_batches() {
        let mut batcher = InstanceBatcher::new(vec![1, 2, 3], true);
        batcher.set_instances(vec![4, 5], false);
        assert_eq!(batcher.instances(), &[4, 5]);
        assert_eq!(batcher.batches(), &[vec![1, 2, 3]]);
        batcher.rebuild_batches();
        assert_eq!(batcher.batches(), &[vec![4, 5]]);
    }

    #[test]
    fn empty_list_has_no_batches() {
        let batcher: InstanceBatcher<f32> = InstanceBatcher::new(Vec::new(), true);
        assert_eq!(batcher.batch_count(), 0);
    }
}
