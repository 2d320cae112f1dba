//! Owned vendor handles.
//!
//! [`NativeHandle`] is the only place in the crate that calls
//! [`Sdk::close`]. A handle is created only from a successful vendor call and
//! is closed exactly once: either by [`NativeHandle::release`], which consumes
//! it, or by `Drop`.

use std::fmt;
use std::rc::Rc;

use log::{debug, warn};

use crate::error::Result;
use crate::sdk::{HandleKind, RawHandle, Sdk, Status};
use crate::status;

/// An owned vendor resource.
///
/// Not `Clone`: there is exactly one owner per successful acquisition. Holds
/// an `Rc` of the SDK, which also makes it `!Send` and `!Sync`.
pub(crate) struct NativeHandle<S: Sdk> {
    sdk: Rc<S>,
    kind: HandleKind,
    raw: RawHandle,
    closed: bool,
}

impl<S: Sdk> NativeHandle<S> {
    /// Acquire a handle through `open`.
    ///
    /// On a non-success status no handle exists and the mapped error is
    /// returned; there is nothing to close.
    pub(crate) fn acquire(
        sdk: &Rc<S>,
        kind: HandleKind,
        operation: &'static str,
        open: impl FnOnce(&S) -> std::result::Result<RawHandle, Status>,
    ) -> Result<Self> {
        let raw = open(sdk).map_err(|code| status::from_sdk(&**sdk, code).into_error(operation))?;
        debug!("Acquired {} handle {}", kind, raw);

        Ok(NativeHandle {
            sdk: Rc::clone(sdk),
            kind,
            raw,
            closed: false,
        })
    }

    /// The raw identifier, for passing back to the SDK.
    pub(crate) fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The SDK this handle belongs to.
    pub(crate) fn sdk(&self) -> &S {
        &self.sdk
    }

    /// The shared SDK, for acquiring child handles.
    pub(crate) fn sdk_rc(&self) -> &Rc<S> {
        &self.sdk
    }

    /// The kind of resource.
    pub(crate) fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Release the handle now and report how the vendor took it.
    ///
    /// Consumes the handle, so a second release cannot be written.
    pub(crate) fn release(mut self) -> Result<()> {
        match self.close_once() {
            Some(code) => status::check(self.sdk(), code, "closing a handle"),
            None => Ok(()),
        }
    }

    fn close_once(&mut self) -> Option<Status> {
        if self.closed {
            return None;
        }
        self.closed = true;
        let code = self.sdk.close(self.raw, self.kind);
        debug!("Released {} handle {} (status {})", self.kind, self.raw, code);
        Some(code)
    }
}

impl<S: Sdk> Drop for NativeHandle<S> {
    fn drop(&mut self) {
        if let Some(code) = self.close_once() {
            if let Err(err) = status::check(self.sdk(), code, "closing a handle") {
                // Nothing to return the error to; the handle is gone either way.
                warn!("Failed to release {} handle {}: {}", self.kind, self.raw, err);
            }
        }
    }
}

impl<S: Sdk> fmt::Debug for NativeHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sdk::memory::{Fault, Fixture, MemorySdk};
    use sdfifc_sys::FWIFC_ERR_RUNTIME;
    use std::ffi::CString;

    fn open_file(sdk: &Rc<MemorySdk>) -> Result<NativeHandle<MemorySdk>> {
        let path = CString::new("scan.sdf").unwrap();
        NativeHandle::acquire(sdk, HandleKind::File, "opening", |sdk| sdk.open(&path))
    }

    #[test]
    fn test_drop_releases_once() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let shared = Rc::new(sdk.clone());

        let handle = open_file(&shared).unwrap();
        assert_eq!(handle.kind(), HandleKind::File);
        assert_eq!(sdk.ledger().live(), 1);

        drop(handle);
        let ledger = sdk.ledger();
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.released(HandleKind::File), 1);
        assert_eq!(ledger.invalid_releases, 0);
    }

    #[test]
    fn test_release_does_not_release_again_on_drop() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        let shared = Rc::new(sdk.clone());

        open_file(&shared).unwrap().release().unwrap();

        let ledger = sdk.ledger();
        assert_eq!(ledger.released(HandleKind::File), 1);
        assert_eq!(ledger.invalid_releases, 0);
    }

    #[test]
    fn test_failed_acquire_creates_nothing() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        sdk.inject(Fault::Open(FWIFC_ERR_RUNTIME));
        let shared = Rc::new(sdk.clone());

        let err = open_file(&shared).unwrap_err();
        assert_eq!(err.code(), Some(FWIFC_ERR_RUNTIME));

        let ledger = sdk.ledger();
        assert_eq!(ledger.acquired(HandleKind::File), 0);
        assert_eq!(ledger.released(HandleKind::File), 0);
    }

    #[test]
    fn test_release_reports_close_failure() {
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        sdk.inject(Fault::Close(HandleKind::File, FWIFC_ERR_RUNTIME));
        let shared = Rc::new(sdk.clone());

        let err = open_file(&shared).unwrap().release().unwrap_err();
        assert!(matches!(err, Error::NativeFailure { code, .. } if code == FWIFC_ERR_RUNTIME));
        // The vendor was still asked exactly once.
        let ledger = sdk.ledger();
        assert_eq!(ledger.released(HandleKind::File), 1);
        assert_eq!(ledger.invalid_releases, 0);
    }
}
