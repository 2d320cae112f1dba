//! Translation of vendor status codes.
//!
//! Every status returned through the [`Sdk`] boundary passes through
//! [`from_sdk`] before it reaches the rest of the crate. This is the only
//! module that knows the vendor's numbering.

use sdfifc_sys::{FWIFC_END_OF_FILE, FWIFC_ERR_UNSUPPORTED_FORMAT, FWIFC_NO_ERROR};

use crate::error::Error;
use crate::sdk::{Sdk, Status};

/// What a non-success vendor status means to the core.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Signal {
    /// The cursor has no more records. Not an error.
    EndOfStream,
    /// A terminal failure.
    Failed(Error),
}

impl Signal {
    /// Collapse into an error for operations where running out of records
    /// means the file was cut short.
    pub(crate) fn into_error(self, operation: &'static str) -> Error {
        match self {
            Signal::Failed(err) => err,
            Signal::EndOfStream => {
                Error::corrupt(format!("unexpected end of file while {}", operation))
            }
        }
    }
}

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Signal::Failed(err)
    }
}

/// Map a status code, pulling the vendor's last-error message when the code
/// is a failure.
pub(crate) fn from_sdk<S: Sdk + ?Sized>(sdk: &S, code: Status) -> Signal {
    map(code, || sdk.last_error())
}

/// Map a status code to a [`Signal`].
///
/// `message` is only called for failures.
pub(crate) fn map(code: Status, message: impl FnOnce() -> String) -> Signal {
    match code {
        FWIFC_END_OF_FILE => Signal::EndOfStream,
        FWIFC_NO_ERROR => Signal::Failed(Error::native(
            code,
            "vendor reported success for a failed call",
        )),
        FWIFC_ERR_UNSUPPORTED_FORMAT => {
            let message = message();
            let reason = if message.is_empty() {
                "the vendor library does not recognise the file format".to_string()
            } else {
                message
            };
            Signal::Failed(Error::corrupt_with_code(code, reason))
        }
        _ => Signal::Failed(Error::native(code, message())),
    }
}

/// Check a status where success is the only acceptable outcome.
pub(crate) fn check<S: Sdk + ?Sized>(
    sdk: &S,
    code: Status,
    operation: &'static str,
) -> Result<(), Error> {
    if code == FWIFC_NO_ERROR {
        Ok(())
    } else {
        Err(from_sdk(sdk, code).into_error(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfifc_sys::{
        FWIFC_ERR_BAD_ARG, FWIFC_ERR_MISSING_INDEX, FWIFC_ERR_NOT_IMPLEMENTED, FWIFC_ERR_RUNTIME,
        FWIFC_ERR_UNKNOWN_EXCEPTION,
    };

    fn no_message() -> String {
        String::new()
    }

    #[test]
    fn test_end_of_file_is_not_an_error() {
        assert_eq!(map(FWIFC_END_OF_FILE, no_message), Signal::EndOfStream);
    }

    #[test]
    fn test_unsupported_format_is_corrupt() {
        match map(FWIFC_ERR_UNSUPPORTED_FORMAT, || "bad magic".to_string()) {
            Signal::Failed(Error::Corrupt { reason, code }) => {
                assert_eq!(reason, "bad magic");
                assert_eq!(code, Some(FWIFC_ERR_UNSUPPORTED_FORMAT));
            }
            other => panic!("Expected Corrupt, got {:?}", other),
        }
        assert!(matches!(
            map(FWIFC_ERR_UNSUPPORTED_FORMAT, no_message),
            Signal::Failed(Error::Corrupt { .. })
        ));
    }

    #[test]
    fn test_other_codes_keep_raw_code() {
        for code in [
            FWIFC_ERR_BAD_ARG,
            FWIFC_ERR_MISSING_INDEX,
            FWIFC_ERR_UNKNOWN_EXCEPTION,
            FWIFC_ERR_NOT_IMPLEMENTED,
            FWIFC_ERR_RUNTIME,
            42,
            -17,
        ] {
            match map(code, || "boom".to_string()) {
                Signal::Failed(err) => {
                    assert_eq!(err.code(), Some(code));
                    assert!(err.to_string().contains("boom"));
                }
                other => panic!("Expected failure for {}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_message_only_fetched_for_failures() {
        let signal = map(FWIFC_END_OF_FILE, || panic!("message requested for end of file"));
        assert_eq!(signal, Signal::EndOfStream);
    }

    #[test]
    fn test_end_of_stream_into_error_is_corrupt() {
        let err = Signal::EndOfStream.into_error("reading the header");
        assert!(matches!(err, Error::Corrupt { code: None, .. }));
        assert!(err.to_string().contains("reading the header"));
    }
}
