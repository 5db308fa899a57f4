//! Thread pinning for the measuring thread.
//!
//! On Linux the thread is bound to the core it is currently running on, so the
//! scheduler cannot migrate it halfway through a cycle. Elsewhere pinning is a
//! no-op and reports that nothing was pinned.

#[cfg(target_os = "linux")]
mod platform {
    /// Affinity mask of the calling thread.
    pub fn current_mask() -> Option<libc::cpu_set_t> {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) == 0 {
                Some(set)
            } else {
                None
            }
        }
    }

    pub fn current_core() -> Option<usize> {
        let cpu = unsafe { libc::sched_getcpu() };
        (cpu >= 0).then_some(cpu as usize)
    }

    pub fn pin(core: usize) -> bool {
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(core, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) == 0
        }
    }

    pub fn restore(mask: &libc::cpu_set_t) -> bool {
        unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), mask) == 0 }
    }

    pub type Mask = libc::cpu_set_t;
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub type Mask = ();

    pub fn current_mask() -> Option<Mask> {
        None
    }

    pub fn current_core() -> Option<usize> {
        None
    }

    pub fn pin(_core: usize) -> bool {
        false
    }

    pub fn restore(_mask: &Mask) -> bool {
        true
    }
}

/// Which part of a benchmark run keeps the thread pinned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinStrategy {
    /// Leave scheduling to the OS
    #[default]
    Off,
    /// Pin once before the first cycle, release after the last
    WholeRun,
    /// Pin at the start of each cycle, release at its end
    PerCycle,
}

/// Pins the current thread to its current core; restores the previous
/// affinity mask on drop.
pub struct CorePin {
    core: Option<usize>,
    saved: Option<platform::Mask>,
}

impl CorePin {
    /// Pin to whatever core the thread is on right now.
    pub fn current() -> Self {
        let saved = platform::current_mask();
        let core = match (saved.as_ref(), platform::current_core()) {
            (Some(_), Some(core)) if platform::pin(core) => Some(core),
            _ => None,
        };
        if core.is_none() {
            log::debug!("thread pinning unavailable, measuring unpinned");
        }
        Self { core, saved }
    }

    /// Core the thread is bound to, if pinning succeeded.
    pub fn core(&self) -> Option<usize> {
        self.core
    }

    pub fn is_pinned(&self) -> bool {
        self.core.is_some()
    }
}

impl Drop for CorePin {
    fn drop(&mut self) {
        if self.core.is_none() {
            return;
        }
        if let Some(mask) = self.saved.as_ref() {
            if !platform::restore(mask) {
                log::warn!("failed to restore thread affinity");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_off() {
        assert_eq!(PinStrategy::default(), PinStrategy::Off);
    }

    #[test]
    fn test_pin_guard() {
        let guard = CorePin::current();
        if guard.is_pinned() {
            assert!(guard.core().is_some());
        }
        drop(guard);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_affinity_restored_on_drop() {
        let before = platform::current_mask().map(|m| unsafe { libc::CPU_COUNT(&m) });
        {
            let guard = CorePin::current();
            if guard.is_pinned() {
                let pinned = platform::current_mask().map(|m| unsafe { libc::CPU_COUNT(&m) });
                assert_eq!(pinned, Some(1));
            }
        }
        let after = platform::current_mask().map(|m| unsafe { libc::CPU_COUNT(&m) });
        assert_eq!(before, after);
    }
}
