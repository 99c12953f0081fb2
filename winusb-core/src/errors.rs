/// Result type alias for winusb operations
pub type Result<T> = anyhow::Result<T>;

pub use winusb_error::WinUsbError;

/// True when `err` (or anything in its context chain) is a user abort or a cancellation.
pub fn is_user_abort(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<WinUsbError>(),
            Some(WinUsbError::Aborted) | Some(WinUsbError::Cancelled)
        )
    })
}
