//! The result of a successful solve (spec §6.4 produced API surface): a
//! [`crate::lock::Lock`] plus the attempt count the search spent getting
//! there.

use crate::lock::{Lock, LockedProject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub lock: Lock,
    pub attempts: u32,
}

impl Solution {
    pub fn projects(&self) -> &[LockedProject] {
        &self.lock.projects
    }

    pub fn input_hash(&self) -> [u8; 32] {
        self.lock.input_hash
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
