use serde::Serialize;

/// Stream identifier carried in every control frame.
///
/// The firmware expects a constant literal here, not a sequence number.
pub const STREAM_ID: u32 = 1;

/// Six-axis snapshot of operator intent, serialized as-is onto the wire.
///
/// Field declaration order is the wire field order. `pitch` and `roll` are
/// reserved: the two sticks never produce them, but the firmware reads a
/// seven-field frame, so they are always carried as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlRecord {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl ControlRecord {
    /// All axes at neutral.
    pub fn neutral() -> Self {
        Self {
            id: STREAM_ID,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

/// Output of a virtual stick for one input update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StickEvent {
    /// Contact moved; components are in [-1, 1], inside the unit disk,
    /// +y pointing up.
    Move { x: f64, y: f64 },
    /// Contact released. Forces the stick's axes to zero exactly once.
    Stop,
}

/// Which stick an event came from. The axis groups are fixed and disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickSide {
    /// Drives `y` (strafe) and `z` (climb).
    Left,
    /// Drives `x` (forward) and `yaw` (turn).
    Right,
}

/// Lifecycle of the single wireless command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Discovering,
    Connecting,
    Connected,
}

/// Commands accepted by the link worker loop. Processed strictly in order;
/// no two link operations ever interleave.
#[derive(Debug, Clone)]
pub enum LinkCommand {
    Connect,
    Disconnect,
    Send(ControlRecord),
    /// Posted by the transport's status handler when the device drops the
    /// connection on its own.
    ConnectionLost,
}

/// Events flowing from the link worker back to the UI.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ConnectionStatus(LinkState),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
