//! Process memory figures from `sysinfo`.

use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, System};
use tembo_core::{HostSample, HostSampler};

#[derive(Debug)]
struct State {
    system: System,
    peak_resident: u64,
}

/// Samples the current process. The peak is the largest resident size seen
/// by this value, not the kernel's high-water mark.
#[derive(Debug)]
pub struct SysinfoHost {
    pid: Option<Pid>,
    state: Mutex<State>,
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self {
            pid: sysinfo::get_current_pid().ok(),
            state: Mutex::new(State {
                system: System::new(),
                peak_resident: 0,
            }),
        }
    }
}

impl HostSampler for SysinfoHost {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn sample(&self) -> HostSample {
        let Some(pid) = self.pid else {
            return HostSample::default();
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.system.refresh_process(pid) {
            return HostSample::default();
        }
        let Some((resident, virtual_bytes)) = state
            .system
            .process(pid)
            .map(|p| (p.memory(), p.virtual_memory()))
        else {
            return HostSample::default();
        };
        state.peak_resident = state.peak_resident.max(resident);
        HostSample {
            resident_bytes: Some(resident),
            peak_resident_bytes: Some(state.peak_resident),
            virtual_bytes: Some(virtual_bytes),
        }
    }
}
