use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that is shared between
/// the simulation step and the streaming thread. It uses an `Arc<RwLock<T>>` internally.
/// Every read/modify/write sequence against the chunk registry holds one guard from this
/// type for its whole duration, which is what serializes streaming against meshing.
///
/// # Type Parameters
/// - `T`: The type of the contained resource, must be `Send + Sync`
///
/// # Examples
///
/// ```
/// use voxel_world::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// let handle = std::thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// });
///
/// handle.join().unwrap();
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Poisoning
/// A panic while a guard is held poisons the lock. The guard is recovered rather than
/// propagated: the world data structures keep their invariants per operation, so the
/// remaining state is still usable.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync + 'static> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    ///
    /// Blocks while a writer holds the lock.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a mutable guard that allows modifying the contained value.
    ///
    /// Blocks until every other guard has been released.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live handles sharing this resource.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let a = MtResource::new(vec![1, 2]);
        let b = a.clone();
        b.get_mut().push(3);
        assert_eq!(*a.get(), vec![1, 2, 3]);
        assert_eq!(a.handle_count(), 2);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let a = MtResource::new(5);
        let b = a.clone();
        let _ = std::thread::spawn(move || {
            let _guard = b.get_mut();
            panic!("poison the lock");
        })
        .join();
        *a.get_mut() += 1;
        assert_eq!(*a.get(), 6);
    }
}
