use crate::hotkey_capture::RawKeyEvent;

/// Which trigger produced a press/release edge. The session machine
/// treats both identically; the tag exists for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Press-and-hold gesture on the tray icon.
    Gesture,
    /// Global hotkey.
    Hotkey,
}

/// Commands sent from trigger sources and the main thread to the app loop.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// A trigger was pressed: begin a recording session.
    TriggerPressed {
        /// Originating trigger.
        source: TriggerSource,
    },
    /// A trigger was released: finalize and run the pipeline.
    TriggerReleased {
        /// Originating trigger.
        source: TriggerSource,
    },
    /// A raw key event from the hotkey capture window.
    CaptureKey(RawKeyEvent),
    /// The capture window was closed without committing.
    CaptureCancelled,
    /// Request application shutdown.
    Shutdown,
}
