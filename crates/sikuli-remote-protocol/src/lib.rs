//! Common protocol definitions for sikuli-remote
//!
//! This crate defines the shared types used between the keyword server, its
//! remote callers and screen engine processes, together with the
//! length-prefixed JSON framing all of them speak.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default socket path for talking to an out-of-process screen engine
pub fn default_engine_socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    runtime_dir.join("sikuli-engine.sock")
}

/// A rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Center point, rounded towards the top-left corner
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.w / 2,
            y: self.y + self.h / 2,
        }
    }

    /// Whether `other` lies completely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }

    /// The `[x, y, w, h]` form handed back to remote callers
    pub fn to_array(&self) -> [i32; 4] {
        [self.x, self.y, self.w, self.h]
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A monitor known to the screen engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenInfo {
    pub id: u32,
    pub bounds: Rect,
}

/// Result of a successful locate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub region: Rect,
    /// Similarity score between 0.0 and 1.0
    pub score: f64,
    pub center: Point,
}

impl MatchInfo {
    pub fn new(region: Rect, score: f64) -> Self {
        Self {
            region,
            score,
            center: region.center(),
        }
    }
}

/// Something the engine can look for on screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// An image file, matched with at least `similarity`
    Image { path: String, similarity: f64 },
    /// Text found by OCR
    Text { text: String },
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Image { path, similarity } => write!(f, "{}={}", path, similarity),
            Target::Text { text } => write!(f, "text '{}'", text),
        }
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Parse a button token such as `LEFT` or `right`
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "LEFT" => Some(Self::Left),
            "MIDDLE" => Some(Self::Middle),
            "RIGHT" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Keyboard modifier held while clicking or typing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyModifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
    AltGr,
}

impl KeyModifier {
    /// Parse a modifier token, accepting the usual platform aliases
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "CTRL" | "CONTROL" => Some(Self::Ctrl),
            "ALT" => Some(Self::Alt),
            "SHIFT" => Some(Self::Shift),
            "META" | "CMD" | "WIN" => Some(Self::Meta),
            "ALTGR" => Some(Self::AltGr),
            _ => None,
        }
    }
}

/// Non-printable keys addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKey {
    Enter,
    Tab,
    Esc,
    Backspace,
    Delete,
    Insert,
    Space,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    CapsLock,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl SpecialKey {
    /// Parse a key token such as `ENTER`, `PAGE_DOWN` or `F5`
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized: String = token
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != ' ')
            .collect::<String>()
            .to_ascii_uppercase();
        let key = match normalized.as_str() {
            "ENTER" | "RETURN" => Self::Enter,
            "TAB" => Self::Tab,
            "ESC" | "ESCAPE" => Self::Esc,
            "BACKSPACE" => Self::Backspace,
            "DELETE" | "DEL" => Self::Delete,
            "INSERT" => Self::Insert,
            "SPACE" => Self::Space,
            "HOME" => Self::Home,
            "END" => Self::End,
            "PAGEUP" => Self::PageUp,
            "PAGEDOWN" => Self::PageDown,
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "CAPSLOCK" => Self::CapsLock,
            "NUMLOCK" => Self::NumLock,
            "SCROLLLOCK" => Self::ScrollLock,
            "PRINTSCREEN" => Self::PrintScreen,
            "PAUSE" => Self::Pause,
            "F1" => Self::F1,
            "F2" => Self::F2,
            "F3" => Self::F3,
            "F4" => Self::F4,
            "F5" => Self::F5,
            "F6" => Self::F6,
            "F7" => Self::F7,
            "F8" => Self::F8,
            "F9" => Self::F9,
            "F10" => Self::F10,
            "F11" => Self::F11,
            "F12" => Self::F12,
            _ => return None,
        };
        Some(key)
    }
}

/// A key that can be held down or released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Special(SpecialKey),
    Char(char),
}

impl Key {
    /// A single character is taken literally, anything longer must name a special key
    pub fn from_token(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(Self::Char(c)),
            _ => SpecialKey::from_token(token).map(Self::Special),
        }
    }
}

/// Mouse wheel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelDirection {
    Up,
    Down,
}

/// Input and application actions performed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Click {
        at: Point,
        button: MouseButton,
        clicks: u8,
        modifiers: Vec<KeyModifier>,
    },
    Type {
        text: String,
        modifiers: Vec<KeyModifier>,
    },
    Paste {
        text: String,
    },
    PressKey {
        key: SpecialKey,
        modifiers: Vec<KeyModifier>,
    },
    KeyDown {
        key: Key,
    },
    KeyUp {
        key: Key,
    },
    Drag {
        from: Point,
        to: Point,
    },
    MouseMove {
        to: Point,
    },
    MouseDown {
        button: MouseButton,
    },
    MouseUp {
        button: MouseButton,
    },
    Wheel {
        at: Point,
        direction: WheelDirection,
        steps: u32,
    },
    OpenApplication {
        path: String,
    },
    CloseApplication {
        name: String,
    },
}

/// Engine-side settings forwarded from keyword calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "setting", content = "value", rename_all = "snake_case")]
pub enum EngineSetting {
    AddImagePath(String),
    RemoveImagePath(String),
    MinSimilarity(f64),
    OcrTextRead(bool),
    OcrLanguage(String),
    ShowActions(bool),
    MoveMouseDelay(f64),
    SlowMotionDelay(f64),
    WaitScanRate(f64),
}

/// Requests sent to an out-of-process screen engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineRequest {
    Ping,
    Screens,
    Locate { target: Target, region: Rect },
    LocateAll { target: Target, region: Rect },
    Capture { region: Rect },
    ReadText { region: Rect },
    Perform { action: Action },
    Highlight { region: Rect, seconds: Option<f64> },
    ClearHighlight { region: Rect },
    SelectRegion { message: String },
    Configure { setting: EngineSetting },
}

/// Responses from an out-of-process screen engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineResponse {
    Pong,
    Screens { screens: Vec<ScreenInfo> },
    Match { found: Option<MatchInfo> },
    Matches { matches: Vec<MatchInfo> },
    /// Base64-encoded image data
    Image { data: String, format: String },
    Text { text: String },
    /// Result code of an action; zero means the action failed
    Performed { code: i32 },
    Region { region: Option<Rect> },
    Configured { accepted: bool },
    Success,
    Error { message: String },
}

/// Requests sent by remote keyword callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteRequest {
    GetKeywordNames,
    GetKeywordDocumentation {
        name: String,
    },
    GetKeywordArguments {
        name: String,
    },
    RunKeyword {
        name: String,
        #[serde(default)]
        args: Vec<serde_json::Value>,
        #[serde(default)]
        kwargs: Option<serde_json::Map<String, serde_json::Value>>,
    },
    StopRemoteServer,
}

/// Responses returned to remote keyword callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteResponse {
    KeywordNames { names: Vec<String> },
    Documentation { documentation: String },
    Arguments { arguments: Vec<String> },
    KeywordResult(RemoteResult),
    Stopping,
    Error { message: String },
}

/// Outcome of a keyword run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

/// Result of `RunKeyword`, shaped after the remote library result dictionary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteResult {
    pub status: Status,
    #[serde(rename = "return")]
    pub return_value: serde_json::Value,
    /// Report lines emitted while the keyword ran
    pub output: String,
    pub error: String,
    pub traceback: String,
    /// Error class name, e.g. `TimeoutError`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// True when the call itself was malformed rather than the keyword failing
    #[serde(default)]
    pub client_error: bool,
}

impl RemoteResult {
    pub fn pass(return_value: serde_json::Value, output: String) -> Self {
        Self {
            status: Status::Pass,
            return_value,
            output,
            error: String::new(),
            traceback: String::new(),
            error_kind: None,
            client_error: false,
        }
    }

    pub fn fail(
        kind: impl Into<String>,
        error: impl Into<String>,
        traceback: String,
        output: String,
        client_error: bool,
    ) -> Self {
        Self {
            status: Status::Fail,
            return_value: serde_json::Value::String(String::new()),
            output,
            error: error.into(),
            traceback,
            error_kind: Some(kind.into()),
            client_error,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),
}

/// Maximum message size (32 MB, enough for a base64 full-screen capture)
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Read a length-prefixed message from a reader
pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write a length-prefixed message to a writer
pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(data.len()));
    }

    let len = (data.len() as u32).to_be_bytes();
    writer.write_all(&len).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and deserialize one frame
pub async fn read_frame<T, R>(reader: &mut R) -> Result<T, ProtocolError>
where
    T: DeserializeOwned,
    R: tokio::io::AsyncReadExt + Unpin,
{
    let data = read_message(reader).await?;
    Ok(serde_json::from_slice(&data)?)
}

/// Serialize and write one frame
pub async fn write_frame<T, W>(writer: &mut W, value: &T) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: tokio::io::AsyncWriteExt + Unpin,
{
    let data = serde_json::to_vec(value)?;
    write_message(writer, &data).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_remote_request() {
        let req = RemoteRequest::RunKeyword {
            name: "click".to_string(),
            args: vec![serde_json::json!("ok.png")],
            kwargs: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("RunKeyword"));
        assert!(json.contains("ok.png"));
    }

    #[test]
    fn test_run_keyword_defaults_missing_args() {
        let req: RemoteRequest =
            serde_json::from_str(r#"{"type":"RunKeyword","name":"reset_roi"}"#).unwrap();
        match req {
            RemoteRequest::RunKeyword { name, args, kwargs } => {
                assert_eq!(name, "reset_roi");
                assert!(args.is_empty());
                assert!(kwargs.is_none());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_remote_result_uses_return_key() {
        let result = RemoteResult::pass(serde_json::json!([1, 2, 3, 4]), String::new());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "PASS");
        assert_eq!(value["return"], serde_json::json!([1, 2, 3, 4]));
        assert!(value.get("error_kind").is_none());
    }

    #[test]
    fn test_rect_center_and_contains() {
        let outer = Rect::new(0, 0, 100, 50);
        assert_eq!(outer.center(), Point::new(50, 25));
        assert!(outer.contains(&Rect::new(10, 10, 20, 20)));
        assert!(!outer.contains(&Rect::new(90, 10, 20, 20)));
    }

    #[test]
    fn test_named_constant_tokens() {
        assert_eq!(MouseButton::from_token("right"), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_token("THUMB"), None);
        assert_eq!(KeyModifier::from_token("cmd"), Some(KeyModifier::Meta));
        assert_eq!(SpecialKey::from_token("page_down"), Some(SpecialKey::PageDown));
        assert_eq!(SpecialKey::from_token("F12"), Some(SpecialKey::F12));
        assert_eq!(Key::from_token("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_token("ENTER"), Some(Key::Special(SpecialKey::Enter)));
        assert_eq!(Key::from_token("NOPE"), None);
    }

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_frame(&mut client, &EngineRequest::Ping).await.unwrap();
        let req: EngineRequest = read_frame(&mut server).await.unwrap();
        assert!(matches!(req, EngineRequest::Ping));
    }

    #[tokio::test]
    async fn test_closed_stream_reports_connection_closed() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let err = read_frame::<EngineRequest, _>(&mut server).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }

    #[test]
    fn test_default_engine_socket_path() {
        let path = default_engine_socket_path();
        assert!(path.to_string_lossy().contains("sikuli-engine.sock"));
    }
}
