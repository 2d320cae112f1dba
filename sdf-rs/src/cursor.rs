//! The forward-only cursor shared by scan-line and pulse sequences.
//!
//! A cursor owns its vendor handle and remembers how it ended. Once it has
//! reported the end of the stream or a failure, it never calls the vendor
//! again and keeps reporting the same outcome.

use log::trace;

use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::sdk::{RawHandle, Sdk};
use crate::status::Signal;

#[derive(Debug, Clone, PartialEq)]
enum State {
    Active,
    Exhausted,
    Failed(Error),
}

#[derive(Debug)]
pub(crate) struct Cursor<S: Sdk> {
    handle: NativeHandle<S>,
    state: State,
    steps: u64,
}

impl<S: Sdk> Cursor<S> {
    pub(crate) fn new(handle: NativeHandle<S>) -> Self {
        Cursor {
            handle,
            state: State::Active,
            steps: 0,
        }
    }

    pub(crate) fn handle(&self) -> &NativeHandle<S> {
        &self.handle
    }

    /// Whether the cursor has ended, one way or the other.
    pub(crate) fn is_terminal(&self) -> bool {
        self.state != State::Active
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    /// Advance once through `advance`, unless the cursor has already ended.
    pub(crate) fn step<T>(
        &mut self,
        advance: impl FnOnce(&S, RawHandle) -> std::result::Result<T, Signal>,
    ) -> Result<Option<T>> {
        match &self.state {
            State::Active => {}
            State::Exhausted => return Ok(None),
            State::Failed(err) => return Err(err.clone()),
        }

        match advance(self.handle.sdk(), self.handle.raw()) {
            Ok(item) => {
                self.steps += 1;
                trace!("{} step {}", self.handle.kind(), self.steps);
                Ok(Some(item))
            }
            Err(Signal::EndOfStream) => {
                trace!("{} exhausted after {} steps", self.handle.kind(), self.steps);
                self.state = State::Exhausted;
                Ok(None)
            }
            Err(Signal::Failed(err)) => {
                trace!("{} failed after {} steps: {}", self.handle.kind(), self.steps, err);
                self.state = State::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// [`step`](Self::step) for `Iterator::next`: a cursor that has already
    /// ended yields `None`, so the error itself is yielded exactly once.
    pub(crate) fn iter_step<T>(
        &mut self,
        advance: impl FnOnce(&S, RawHandle) -> std::result::Result<T, Signal>,
    ) -> Option<Result<T>> {
        if self.is_terminal() {
            return None;
        }
        self.step(advance).transpose()
    }
}
