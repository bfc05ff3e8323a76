//! Object pool for high-churn entities
//!
//! Bullets and asteroid fragments are created and destroyed many times per
//! second. Recycling them keeps their heap buffers (asteroid outlines) alive
//! between tenants instead of reallocating on every spawn.

use std::fmt;

/// Contract for pooled types: bring a used instance back to its
/// freshly-constructed state. Runs on every recycled acquire, so an
/// acquired object never carries fields from its previous tenant.
pub trait Pooled {
    fn reset(&mut self);
}

/// Unbounded single-threaded free list with a construction factory
pub struct ObjectPool<T> {
    free: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    /// Number of instances built by the factory (never decreases)
    created: usize,
}

impl<T: Pooled> ObjectPool<T> {
    pub fn new(factory: impl FnMut() -> T + 'static) -> Self {
        Self {
            free: Vec::new(),
            factory: Box::new(factory),
            created: 0,
        }
    }

    /// Take a recycled instance (reset) or build a new one
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(mut obj) => {
                obj.reset();
                obj
            }
            None => {
                self.created += 1;
                (self.factory)()
            }
        }
    }

    /// Hand an instance back for reuse
    pub fn release(&mut self, obj: T) {
        self.free.push(obj);
    }

    /// Instances waiting on the free list
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Instances ever constructed by the factory
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<T: Default + Pooled + 'static> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("available", &self.free.len())
            .field("created", &self.created)
            .finish()
    }
}
