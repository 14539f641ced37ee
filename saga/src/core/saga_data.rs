// saga/src/core/saga_data.rs
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state threaded through every step of a saga run.
///
/// Each handler receives its own clone; all clones point at the same value.
/// Guards are blocking `parking_lot` guards and MUST be dropped before any
/// `.await` in a handler.
#[derive(Debug)]
pub struct SagaData<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> SagaData<T> {
  pub fn new(data: T) -> Self {
    SagaData(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Read guard narrowed to one part of the state, e.g.
  /// `data.map_read(|d| &d.order)`.
  pub fn map_read<F, U: ?Sized>(&self, f: F) -> MappedRwLockReadGuard<'_, U>
  where
    F: FnOnce(&T) -> &U,
  {
    RwLockReadGuard::map(self.read(), f)
  }

  /// Runs `f` under the write lock and returns its result. Handy for
  /// "mutate and hand something back" without naming the guard.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    f(&mut self.write())
  }

  /// Number of live handles to this state.
  pub fn handle_count(&self) -> usize {
    Arc::strong_count(&self.0)
  }
}

impl<T: Send + Sync + Clone + 'static> SagaData<T> {
  /// Clones the current value out from under the lock.
  pub fn snapshot(&self) -> T {
    self.read().clone()
  }
}

impl<T: Send + Sync + 'static> Clone for SagaData<T> {
  fn clone(&self) -> Self {
    SagaData(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for SagaData<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
