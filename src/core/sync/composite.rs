/*!
 * Composite Two-Tier Locking
 *
 * A coarse service-wide lock guards rarely-written, expensive fields. A finer
 * process-group lock additionally guards the hot fields that rendering and
 * visibility code read on every frame.
 *
 * # Rules
 *
 * - Service-only fields ([`ServiceCell`]): read and write under the service lock.
 * - Composite fields ([`CompositeCell`]): read under *either* lock, write
 *   under *both*.
 *
 * # Design: Proof Tokens Over Comments
 *
 * Cell accessors take a reference to the guard that proves the caller holds
 * the right lock(s). The borrow checker ties the returned data guard to the
 * proof, so the data can't escape the critical section. In debug builds each
 * cell also asserts the proof comes from its own [`ServiceLocks`] and that
 * the mutex is really held.
 *
 * The cells keep their own `parking_lot` lock underneath so they stay
 * memory-safe without `unsafe`; under correct discipline that inner lock is
 * never contended, because any writer already excludes every reader through
 * one of the two outer mutexes.
 *
 * Lock order is always service, then proc.
 */

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
}

/// The two locks of one service instance
#[derive(Default)]
pub struct ServiceLocks {
    service: Mutex<()>,
    proc: Mutex<()>,
}

impl ServiceLocks {
    /// Create a new lock pair
    #[inline]
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the coarse service lock
    #[inline]
    pub fn lock_service(&self) -> ServiceGuard<'_> {
        ServiceGuard {
            locks: self,
            _guard: self.service.lock(),
        }
    }

    /// Acquire only the process-group lock (cheap reads)
    #[inline]
    pub fn lock_proc(&self) -> ProcGuard<'_> {
        ProcGuard {
            locks: self,
            _guard: self.proc.lock(),
        }
    }

    /// Try to acquire the process-group lock without blocking
    #[inline]
    pub fn try_lock_proc(&self) -> Option<ProcGuard<'_>> {
        self.proc.try_lock().map(|guard| ProcGuard {
            locks: self,
            _guard: guard,
        })
    }

    /// Acquire both locks in order
    #[inline]
    pub fn lock_both(&self) -> BothGuard<'_> {
        let service = self.service.lock();
        let proc = self.proc.lock();
        BothGuard {
            locks: self,
            _service: Some(service),
            _proc: proc,
        }
    }

    #[inline]
    pub fn is_service_locked(&self) -> bool {
        self.service.is_locked()
    }

    #[inline]
    pub fn is_proc_locked(&self) -> bool {
        self.proc.is_locked()
    }
}

impl fmt::Debug for ServiceLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLocks")
            .field("service_locked", &self.service.is_locked())
            .field("proc_locked", &self.proc.is_locked())
            .finish()
    }
}

/// Proof that the caller holds at least one of the two locks
pub trait HoldsAny: sealed::Sealed {
    /// The lock pair this proof was issued by
    fn locks(&self) -> &ServiceLocks;
}

/// Proof that the caller holds the service lock
pub trait HoldsService: HoldsAny {}

/// Holds the service lock
pub struct ServiceGuard<'a> {
    locks: &'a ServiceLocks,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> ServiceGuard<'a> {
    /// Additionally take the process-group lock for a composite write
    ///
    /// The returned guard borrows this one, so the service lock stays held
    /// for at least as long.
    #[inline]
    pub fn lock_proc(&self) -> BothGuard<'_> {
        BothGuard {
            locks: self.locks,
            _service: None,
            _proc: self.locks.proc.lock(),
        }
    }
}

/// Holds the process-group lock only
pub struct ProcGuard<'a> {
    locks: &'a ServiceLocks,
    _guard: MutexGuard<'a, ()>,
}

/// Holds both locks
pub struct BothGuard<'a> {
    locks: &'a ServiceLocks,
    // None when the service lock is owned by an outer ServiceGuard this borrows from
    _service: Option<MutexGuard<'a, ()>>,
    _proc: MutexGuard<'a, ()>,
}

impl sealed::Sealed for ServiceGuard<'_> {}
impl sealed::Sealed for ProcGuard<'_> {}
impl sealed::Sealed for BothGuard<'_> {}

impl HoldsAny for ServiceGuard<'_> {
    #[inline(always)]
    fn locks(&self) -> &ServiceLocks {
        self.locks
    }
}

impl HoldsAny for ProcGuard<'_> {
    #[inline(always)]
    fn locks(&self) -> &ServiceLocks {
        self.locks
    }
}

impl HoldsAny for BothGuard<'_> {
    #[inline(always)]
    fn locks(&self) -> &ServiceLocks {
        self.locks
    }
}

impl HoldsService for ServiceGuard<'_> {}
impl HoldsService for BothGuard<'_> {}

#[inline(always)]
fn assert_owner(owner: &Arc<ServiceLocks>, held: &ServiceLocks) {
    debug_assert!(
        std::ptr::eq(Arc::as_ptr(owner), held),
        "guard was issued by a different ServiceLocks"
    );
}

/// Field group readable under either lock and writable under both
pub struct CompositeCell<T> {
    owner: Arc<ServiceLocks>,
    value: RwLock<T>,
}

impl<T> CompositeCell<T> {
    pub fn new(owner: &Arc<ServiceLocks>, value: T) -> Self {
        Self {
            owner: Arc::clone(owner),
            value: RwLock::new(value),
        }
    }

    /// Read access for a holder of either lock
    #[inline]
    pub fn read_under_any<'s, G: HoldsAny>(&'s self, proof: &'s G) -> RwLockReadGuard<'s, T> {
        let held = proof.locks();
        assert_owner(&self.owner, held);
        debug_assert!(held.is_service_locked() || held.is_proc_locked());
        self.value.read()
    }

    /// Write access for a holder of both locks
    #[inline]
    pub fn write_under_both<'s>(&'s self, proof: &'s BothGuard<'_>) -> RwLockWriteGuard<'s, T> {
        let held = proof.locks();
        assert_owner(&self.owner, held);
        debug_assert!(held.is_service_locked() && held.is_proc_locked());
        self.value.write()
    }

    #[inline]
    pub fn with<G: HoldsAny, R>(&self, proof: &G, f: impl FnOnce(&T) -> R) -> R {
        f(&self.read_under_any(proof))
    }

    #[inline]
    pub fn update<R>(&self, proof: &BothGuard<'_>, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write_under_both(proof))
    }

    pub fn owner(&self) -> &Arc<ServiceLocks> {
        &self.owner
    }
}

/// Field group guarded by the service lock alone
pub struct ServiceCell<T> {
    owner: Arc<ServiceLocks>,
    value: Mutex<T>,
}

impl<T> ServiceCell<T> {
    pub fn new(owner: &Arc<ServiceLocks>, value: T) -> Self {
        Self {
            owner: Arc::clone(owner),
            value: Mutex::new(value),
        }
    }

    #[inline]
    pub fn lock<'s, G: HoldsService>(&'s self, proof: &'s G) -> MutexGuard<'s, T> {
        let held = proof.locks();
        assert_owner(&self.owner, held);
        debug_assert!(held.is_service_locked());
        self.value.lock()
    }

    #[inline]
    pub fn with<G: HoldsService, R>(&self, proof: &G, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock(proof))
    }

    #[inline]
    pub fn update<G: HoldsService, R>(&self, proof: &G, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock(proof))
    }
}
