//! Progress notifications.

use tokio::sync::mpsc::UnboundedSender;

/// Emitted after every completed part.
///
/// `loaded` and `total` count parts, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Parts completed so far.
    pub loaded: u64,
    /// Parts in the upload.
    pub total: u64,
    /// Whether `total` is known.
    pub length_computable: bool,
}

/// Receives [`UploadProgress`] notifications.
pub type ProgressSender = UnboundedSender<UploadProgress>;

/// Send a notification if anyone is listening. A dropped receiver is not an error.
pub(crate) fn report(sender: Option<&ProgressSender>, loaded: u64, total: u64) {
    if let Some(sender) = sender {
        let _ = sender.send(UploadProgress {
            loaded,
            total,
            length_computable: true,
        });
    }
}
