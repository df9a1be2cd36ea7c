//! Object pools.
//!
//! Named pools of reusable values so hot loops do not churn the allocator.
//! Values are addressed through `PoolHandle`s; releasing a handle pushes its
//! slot back onto the free list and the next `acquire` hands the same slot
//! out again. Pools are single-threaded and assume acquire/release pairs are
//! balanced within one pass.
//!
//! # Usage
//! ```ignore
//! let mut pools = PoolManager::default();
//! let pool = pools.create("vec2", || Vec2::ZERO, |v: &mut Vec2, (x, y): (f32, f32)| *v = Vec2::new(x, y))?;
//! let h = pool.acquire((1.0, 2.0));
//! pool.release(h)?;
//! ```

use std::{any::Any, collections::HashMap};

use tracing::debug;

use crate::error::{PhysicsError, Result};

/// Slot in a pool. Only valid for the pool (and generation) that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: usize,
    generation: u32,
}

type Constructor<T> = Box<dyn Fn() -> T + Send + Sync>;
type Reset<T, A> = Box<dyn Fn(&mut T, A) + Send + Sync>;

/// A pool of `T` values reset with arguments of type `A`.
pub struct Pool<T, A> {
    name: String,
    items: Vec<T>,
    in_use: Vec<bool>,
    free: Vec<usize>,
    generation: u32,
    constructor: Constructor<T>,
    reset: Reset<T, A>,
}

impl<T, A> Pool<T, A> {
    fn new(name: &str, constructor: Constructor<T>, reset: Reset<T, A>) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
            in_use: Vec::new(),
            free: Vec::new(),
            generation: 0,
            constructor,
            reset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pops a free slot (or constructs a new value) and resets it with `args`.
    pub fn acquire(&mut self, args: A) -> PoolHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.items.push((self.constructor)());
                self.in_use.push(false);
                self.items.len() - 1
            }
        };
        (self.reset)(&mut self.items[index], args);
        self.in_use[index] = true;
        PoolHandle {
            index,
            generation: self.generation,
        }
    }

    /// Returns a slot to the free list. The handle must not be used afterwards.
    pub fn release(&mut self, handle: PoolHandle) -> Result<()> {
        if !self.is_live(handle) {
            return Err(PhysicsError::InvalidOperation(format!(
                "handle {:?} is not checked out of pool '{}'",
                handle, self.name
            )));
        }
        self.in_use[handle.index] = false;
        self.free.push(handle.index);
        Ok(())
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if self.is_live(handle) {
            self.items.get(handle.index)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if self.is_live(handle) {
            self.items.get_mut(handle.index)
        } else {
            None
        }
    }

    fn is_live(&self, handle: PoolHandle) -> bool {
        handle.generation == self.generation
            && self.in_use.get(handle.index).copied().unwrap_or(false)
    }

    /// Total slots ever constructed.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Slots waiting on the free list.
    pub fn free(&self) -> usize {
        self.free.len()
    }

    /// Slots currently checked out.
    pub fn outstanding(&self) -> usize {
        self.items.len() - self.free.len()
    }

    /// Drops every slot. Handles issued before the clear become invalid.
    pub fn clear(&mut self) {
        self.items.clear();
        self.in_use.clear();
        self.free.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<T, A> std::fmt::Debug for Pool<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("free", &self.free())
            .finish()
    }
}

/// Type-erased pool operations the manager needs.
trait ErasedPool: Send + Sync {
    fn clear(&mut self);
    fn outstanding(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + Sync + 'static, A: 'static> ErasedPool for Pool<T, A> {
    fn clear(&mut self) {
        Pool::clear(self)
    }

    fn outstanding(&self) -> usize {
        Pool::outstanding(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Named pool registry.
#[derive(Default)]
pub struct PoolManager {
    pools: HashMap<String, Box<dyn ErasedPool>>,
}

impl PoolManager {
    /// Registers a pool. A second call with the same name returns the existing
    /// pool unchanged (the new constructor and reset are discarded).
    pub fn create<T, A, C, R>(&mut self, name: &str, constructor: C, reset: R) -> Result<&mut Pool<T, A>>
    where
        T: Send + Sync + 'static,
        A: 'static,
        C: Fn() -> T + Send + Sync + 'static,
        R: Fn(&mut T, A) + Send + Sync + 'static,
    {
        if !self.pools.contains_key(name) {
            debug!(pool = %name, "Creating object pool");
            let pool: Pool<T, A> = Pool::new(name, Box::new(constructor), Box::new(reset));
            self.pools.insert(name.to_string(), Box::new(pool));
        }
        self.pool(name)
    }

    /// Looks up a pool by name and item type.
    pub fn pool<T, A>(&mut self, name: &str) -> Result<&mut Pool<T, A>>
    where
        T: Send + Sync + 'static,
        A: 'static,
    {
        let erased = self
            .pools
            .get_mut(name)
            .ok_or_else(|| PhysicsError::UnknownPool(name.to_string()))?;
        erased
            .as_any_mut()
            .downcast_mut::<Pool<T, A>>()
            .ok_or_else(|| PhysicsError::PoolTypeMismatch(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    pub fn clear(&mut self, name: &str) -> Result<()> {
        let pool = self
            .pools
            .get_mut(name)
            .ok_or_else(|| PhysicsError::UnknownPool(name.to_string()))?;
        debug!(pool = %name, "Clearing object pool");
        pool.clear();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
    }

    /// Checked-out slots across every pool; non-zero between ticks means a leak.
    pub fn outstanding(&self) -> usize {
        self.pools.values().map(|p| p.outstanding()).sum()
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.pools.keys().collect();
        names.sort();
        f.debug_struct("PoolManager").field("pools", &names).finish()
    }
}
