//! Thread ownership of a library that must not be called concurrently.
//!
//! A [`Claim`] pins a library to the thread that took it. Any number of
//! claims can be held on that thread; every other thread is refused until
//! the last of them is dropped.

use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};

use crate::error::{Error, Result};

/// The thread holding a library, and how many claims it holds.
pub(crate) type Owner = Mutex<Option<(ThreadId, usize)>>;

/// One claim on a library for the current thread.
#[derive(Debug)]
pub(crate) struct Claim {
    owner: &'static Owner,
    // The count is per thread, so the claim must be dropped where it was taken.
    _marker: PhantomData<*const ()>,
}

impl Claim {
    /// Claim the library guarded by `owner` for the calling thread.
    ///
    /// Fails with [`Error::InvalidState`] while another thread holds a claim.
    pub(crate) fn take(owner: &'static Owner) -> Result<Claim> {
        let me = thread::current().id();
        // Nothing panics while the lock is held, so a poisoned count is intact.
        let mut guard = owner.lock().unwrap_or_else(PoisonError::into_inner);
        let claimed = match *guard {
            Some((thread, count)) if thread == me => (thread, count + 1),
            Some(_) => {
                return Err(Error::invalid_state(
                    "the vendor library is in use on another thread",
                ));
            }
            None => (me, 1),
        };
        *guard = Some(claimed);
        Ok(Claim {
            owner,
            _marker: PhantomData,
        })
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut guard = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = match *guard {
            Some((thread, count)) if count > 1 => Some((thread, count - 1)),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed_elsewhere(owner: &'static Owner) -> Result<()> {
        thread::spawn(move || Claim::take(owner).map(drop))
            .join()
            .unwrap()
    }

    #[test]
    fn test_claims_nest_on_one_thread() {
        static OWNER: Owner = Mutex::new(None);

        let first = Claim::take(&OWNER).unwrap();
        let second = Claim::take(&OWNER).unwrap();
        assert_eq!(OWNER.lock().unwrap().map(|(_, n)| n), Some(2));

        drop(first);
        assert_eq!(OWNER.lock().unwrap().map(|(_, n)| n), Some(1));
        drop(second);
        assert!(OWNER.lock().unwrap().is_none());
    }

    #[test]
    fn test_other_thread_refused_while_held() {
        static OWNER: Owner = Mutex::new(None);

        let claim = Claim::take(&OWNER).unwrap();
        let err = claimed_elsewhere(&OWNER).unwrap_err();
        assert_eq!(err.kind(), "invalid-state");

        drop(claim);
        claimed_elsewhere(&OWNER).unwrap();
        assert!(OWNER.lock().unwrap().is_none());
    }

    #[test]
    fn test_released_library_moves_to_another_thread() {
        static OWNER: Owner = Mutex::new(None);

        claimed_elsewhere(&OWNER).unwrap();
        let claim = Claim::take(&OWNER).unwrap();
        assert!(claimed_elsewhere(&OWNER).is_err());
        drop(claim);
    }
}
