use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot gate that turns a periodic tick into a non-blocking "may a
/// detection cycle run now?" decision.
///
/// At most one holder is admitted at a time. A failed `try_enter` means
/// the caller drops its tick entirely (no queuing, no backlog), so a
/// slow detector sheds load instead of accumulating it.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    busy: AtomicBool,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    /// Attempts the idle-to-busy transition. Never waits.
    pub fn try_enter(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Returns the gate to idle. Call exactly once per successful
    /// `try_enter`.
    pub fn exit(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// RAII variant of `try_enter`: the returned permit calls `exit` when
    /// dropped, so release happens on every path out of a cycle.
    pub fn try_acquire(gate: &Arc<AdmissionGate>) -> Option<AdmissionPermit> {
        if gate.try_enter() {
            Some(AdmissionPermit {
                gate: Arc::clone(gate),
            })
        } else {
            None
        }
    }
}

/// Held for the duration of one admitted cycle.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_enter_then_exit() {
        let gate = AdmissionGate::new();
        assert!(gate.try_enter());
        assert!(gate.is_busy());
        gate.exit();
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_second_enter_fails_while_busy() {
        let gate = AdmissionGate::new();
        assert!(gate.try_enter());
        assert!(!gate.try_enter());
        assert!(!gate.try_enter());
        gate.exit();
        assert!(gate.try_enter());
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let gate = Arc::new(AdmissionGate::new());
        {
            let permit = AdmissionGate::try_acquire(&gate);
            assert!(permit.is_some());
            assert!(gate.is_busy());
            assert!(AdmissionGate::try_acquire(&gate).is_none());
        }
        assert!(!gate.is_busy());
        assert!(AdmissionGate::try_acquire(&gate).is_some());
    }

    #[test]
    fn test_permit_releases_across_threads() {
        let gate = Arc::new(AdmissionGate::new());
        let permit = AdmissionGate::try_acquire(&gate).unwrap();

        let handle = thread::spawn(move || drop(permit));
        handle.join().unwrap();

        assert!(!gate.is_busy());
    }

    #[test]
    fn test_concurrent_storm_admits_one_at_a_time() {
        let gate = Arc::new(AdmissionGate::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let inside = inside.clone();
                let admitted = admitted.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        if gate.try_enter() {
                            let concurrent = inside.fetch_add(1, Ordering::SeqCst);
                            assert_eq!(concurrent, 0, "two holders admitted at once");
                            admitted.fetch_add(1, Ordering::SeqCst);
                            inside.fetch_sub(1, Ordering::SeqCst);
                            gate.exit();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(admitted.load(Ordering::SeqCst) >= 1);
        assert!(!gate.is_busy());
    }
}
