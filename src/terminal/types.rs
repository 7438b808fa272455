//! Shared types for the terminal session core.
//!
//! Covers port configuration, display mode, frames, session state,
//! renderer event payloads, and structured errors.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Port Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Standard baud rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaudRate {
    #[serde(rename = "1200")]
    Baud1200,
    #[serde(rename = "2400")]
    Baud2400,
    #[serde(rename = "4800")]
    Baud4800,
    #[serde(rename = "9600")]
    Baud9600,
    #[serde(rename = "19200")]
    Baud19200,
    #[serde(rename = "38400")]
    Baud38400,
    #[serde(rename = "57600")]
    Baud57600,
    #[serde(rename = "115200")]
    Baud115200,
    #[serde(rename = "230400")]
    Baud230400,
    #[serde(rename = "921600")]
    Baud921600,
    /// Custom / non-standard baud rate.
    Custom(u32),
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::Baud9600
    }
}

impl BaudRate {
    /// Numeric value of the baud rate.
    pub fn value(&self) -> u32 {
        match self {
            Self::Baud1200 => 1200,
            Self::Baud2400 => 2400,
            Self::Baud4800 => 4800,
            Self::Baud9600 => 9600,
            Self::Baud19200 => 19200,
            Self::Baud38400 => 38400,
            Self::Baud57600 => 57600,
            Self::Baud115200 => 115200,
            Self::Baud230400 => 230400,
            Self::Baud921600 => 921600,
            Self::Custom(v) => *v,
        }
    }

    /// Map a numeric value back onto the enum.
    pub fn from_value(v: u32) -> Self {
        match v {
            1200 => Self::Baud1200,
            2400 => Self::Baud2400,
            4800 => Self::Baud4800,
            9600 => Self::Baud9600,
            19200 => Self::Baud19200,
            38400 => Self::Baud38400,
            57600 => Self::Baud57600,
            115200 => Self::Baud115200,
            230400 => Self::Baud230400,
            921600 => Self::Baud921600,
            other => Self::Custom(other),
        }
    }

    /// All standard baud rate values.
    pub fn standard_rates() -> Vec<u32> {
        vec![
            1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 921600,
        ]
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
}

impl Default for DataBits {
    fn default() -> Self {
        Self::Eight
    }
}

impl DataBits {
    pub fn value(&self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }

    pub fn from_value(v: u8) -> Option<Self> {
        match v {
            5 => Some(Self::Five),
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            _ => None,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Default for Parity {
    fn default() -> Self {
        Self::None
    }
}

impl Parity {
    /// Single-letter shorthand used in "9600-8N1" style notation.
    pub fn letter(&self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Odd => "O",
            Self::Even => "E",
            Self::Mark => "M",
            Self::Space => "S",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Odd => "odd",
            Self::Even => "even",
            Self::Mark => "mark",
            Self::Space => "space",
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1.5")]
    OnePointFive,
    #[serde(rename = "2")]
    Two,
}

impl Default for StopBits {
    fn default() -> Self {
        Self::One
    }
}

impl StopBits {
    pub fn label(&self) -> &'static str {
        match self {
            Self::One => "1",
            Self::OnePointFive => "1.5",
            Self::Two => "2",
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowControl {
    None,
    /// Software flow control (XON/XOFF).
    XonXoff,
    /// Hardware flow control (RTS/CTS).
    RtsCts,
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::None
    }
}

impl FlowControl {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::XonXoff => "XON/XOFF",
            Self::RtsCts => "RTS/CTS",
        }
    }
}

/// Complete serial port configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    /// Port name (e.g. `COM3`, `/dev/ttyUSB0`).
    pub port_name: String,

    /// Baud rate.
    #[serde(default)]
    pub baud_rate: BaudRate,

    /// Data bits per character.
    #[serde(default)]
    pub data_bits: DataBits,

    /// Parity mode.
    #[serde(default)]
    pub parity: Parity,

    /// Stop bits.
    #[serde(default)]
    pub stop_bits: StopBits,

    /// Flow control mode.
    #[serde(default)]
    pub flow_control: FlowControl,

    /// Optional label / description.
    #[serde(default)]
    pub label: Option<String>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: BaudRate::default(),
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            label: None,
        }
    }
}

impl PortConfig {
    /// Shorthand notation (e.g. "9600-8N1").
    pub fn shorthand(&self) -> String {
        format!(
            "{}-{}{}{}",
            self.baud_rate.value(),
            self.data_bits.value(),
            self.parity.letter(),
            self.stop_bits.label()
        )
    }

    /// Human-readable connect confirmation line.
    pub fn summary(&self) -> String {
        format!(
            "Connected to {} : {} baud, {} data bits, {} parity, {} stop bits, {} flow control",
            self.port_name,
            self.baud_rate.value(),
            self.data_bits.value(),
            self.parity.label(),
            self.stop_bits.label(),
            self.flow_control.label()
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Display mode & direction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Active textual projection for transcript rendering and input editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    /// Uppercase two-digit hex pairs separated by single spaces.
    Hex,
    /// Latin-1 text with carriage returns escaped as `\r`.
    Text,
}

impl Default for DisplayMode {
    fn default() -> Self {
        Self::Hex
    }
}

impl DisplayMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Text => "text",
        }
    }
}

/// Direction of an exchanged frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tx => "TX",
            Self::Rx => "RX",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Tx => ">>>",
            Self::Rx => "<<<",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Frames
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One directional exchange of bytes with its relative timing.
///
/// Immutable once created; owned exclusively by the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Whether the bytes were sent or received.
    pub direction: Direction,
    /// Raw payload bytes.
    pub payload: Bytes,
    /// Milliseconds elapsed since the previous exchanged frame.
    pub elapsed_ms: u64,
}

impl Frame {
    pub fn new(direction: Direction, payload: impl Into<Bytes>, elapsed_ms: u64) -> Self {
        Self {
            direction,
            payload: payload.into(),
            elapsed_ms,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// State of a terminal session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Connected,
    Disconnected,
    Error,
}

/// Snapshot of a live terminal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Unique session ID.
    pub id: String,
    /// Port name.
    pub port_name: String,
    /// Shorthand config string.
    pub config_shorthand: String,
    /// Current state.
    pub state: SessionState,
    /// Active display mode.
    pub display_mode: DisplayMode,
    /// Optional label.
    pub label: Option<String>,
    /// When the session was opened.
    pub connected_at: DateTime<Utc>,
    /// Frames received total.
    pub frames_rx: u64,
    /// Frames transmitted total.
    pub frames_tx: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Renderer event payloads
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A transcript frame rendered under the active display mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEvent {
    /// Frame direction.
    pub direction: Direction,
    /// Payload rendered under the display mode active at emit time.
    pub encoded: String,
    /// Milliseconds since the previous exchanged frame.
    pub elapsed_ms: u64,
    /// Payload length in bytes.
    pub size: usize,
    /// Base64-encoded raw payload bytes.
    pub raw: String,
}

/// Pending-input field contents after a reformat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInputEvent {
    /// Canonical display text.
    pub text: String,
    /// Cursor offset into `text` (character index).
    pub cursor: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kinds specific to terminal session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminalErrorKind {
    /// The port driver refused to open with the given configuration.
    PortOpenFailed,
    /// Display text could not be decoded under the active mode.
    InvalidEncoding,
    /// Operation requires a connected session.
    NotConnected,
    /// No session with the given ID.
    SessionNotFound,
    /// The session task is gone and its channel is closed.
    ChannelClosed,
}

/// Structured terminal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalError {
    pub kind: TerminalErrorKind,
    pub message: String,
    pub port_name: Option<String>,
    pub session_id: Option<String>,
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for TerminalError {}

impl TerminalError {
    pub fn new(kind: TerminalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            port_name: None,
            session_id: None,
        }
    }

    /// Shortcut for the codec rejection path.
    pub fn invalid_encoding(message: impl Into<String>) -> Self {
        Self::new(TerminalErrorKind::InvalidEncoding, message)
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port_name = Some(port.into());
        self
    }

    pub fn with_session(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}
