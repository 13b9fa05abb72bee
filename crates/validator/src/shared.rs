//! # Shared Proof Chain
//!
//! [`ProofChain`] mutates through `&mut self`. Hosts that hand the store
//! to several threads wrap it here: every call runs to completion under
//! one `parking_lot::Mutex`, so operations never interleave.
//!
//! The lock is held only for the closure passed to [`SharedProofChain::with`].

use std::sync::Arc;

use parking_lot::Mutex;
use proofchain_chain::StakingInterface;

use crate::proof_chain::ProofChain;

pub struct SharedProofChain<S: StakingInterface> {
    inner: Arc<Mutex<ProofChain<S>>>,
}

impl<S: StakingInterface> SharedProofChain<S> {
    pub fn new(chain: ProofChain<S>) -> Self {
        SharedProofChain { inner: Arc::new(Mutex::new(chain)) }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut ProofChain<S>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

impl<S: StakingInterface> Clone for SharedProofChain<S> {
    fn clone(&self) -> Self {
        SharedProofChain { inner: Arc::clone(&self.inner) }
    }
}
