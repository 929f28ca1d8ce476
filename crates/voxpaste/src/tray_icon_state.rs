/// Tray icon states corresponding to the session workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Currently recording audio.
    Recording,
    /// Transcribing captured audio.
    Processing,
    /// Cleanup pass running.
    Generating,
    /// Result delivered; settle pending.
    Done,
}
