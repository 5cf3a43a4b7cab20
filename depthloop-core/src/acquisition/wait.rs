//! What the loop does between polls that found no new frame.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Poll again immediately.
    Spin,
    /// Give the rest of the time slice to other threads, then poll again.
    #[default]
    Yield,
    /// Sleep before polling again.
    Sleep(Duration),
}

impl WaitPolicy {
    pub fn idle(&self) {
        match self {
            WaitPolicy::Spin => std::hint::spin_loop(),
            WaitPolicy::Yield => std::thread::yield_now(),
            WaitPolicy::Sleep(duration) => std::thread::sleep(*duration),
        }
    }
}
