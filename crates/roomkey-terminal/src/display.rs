//! Virtual 16x2 character display.
//!
//! The terminal shows a base screen for the current mode and briefly
//! overlays outcome screens (grant, deny, write result, inspection). An
//! overlay expires after its hold time; [`VirtualDisplay::update`] then
//! restores the base screen. Nothing blocks while a screen is held.
//!
//! # Character Encoding
//!
//! The LCD only renders ASCII. Control characters are dropped and any
//! other non-ASCII character is shown as `?`.
//!
//! # Examples
//!
//! ```
//! use roomkey_core::RoomId;
//! use roomkey_terminal::{Screen, VirtualDisplay};
//!
//! let room = RoomId::new("101").unwrap();
//! let mut display = VirtualDisplay::new(Screen::Ready { room: room.clone() });
//! assert_eq!(display.line(0).unwrap().trim_end(), "Scan keycard...");
//! assert_eq!(display.line(1).unwrap().trim_end(), "Room: 101");
//!
//! display.show(Screen::Unlocked { room });
//! assert_eq!(display.line(0).unwrap().trim_end(), "Door Unlocked!");
//! ```

use std::fmt;
use std::time::Duration;

use roomkey_core::{Error, Result, RoomId};
use tokio::time::Instant;

use crate::access::DenyReason;

const DEFAULT_LINES: usize = 2;
const DEFAULT_COLUMNS: usize = 16;

/// Text alignment within a display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    /// Extra space goes on the right when the padding is odd.
    Center,
    Right,
}

/// Everything the terminal can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Verify mode.
    Ready { room: RoomId },
    /// Provision mode, waiting for the backend to name a room.
    WriterWaiting,
    /// Provision mode with a target.
    WriteArmed { room: RoomId },
    Unlocked { room: RoomId },
    Denied(DenyReason),
    WriteSucceeded,
    WriteFailed,
    CardRoom { room: RoomId },
    InspectFailed,
    RemoteRoomSet { room: RoomId },
    RoomUpdated { room: RoomId },
}

impl Screen {
    /// The two lines of text for this screen.
    #[must_use]
    pub fn text(&self) -> (String, String) {
        match self {
            Self::Ready { room } => ("Scan keycard...".into(), format!("Room: {room}")),
            Self::WriterWaiting => ("MODE: WRITER".into(), "WAITING FOR DB..".into()),
            Self::WriteArmed { room } => (format!("WRITE ROOM: {room}"), "Tap keycard...".into()),
            Self::Unlocked { room } => ("Door Unlocked!".into(), format!("Room {room}")),
            Self::Denied(DenyReason::RoomMismatch) => {
                ("ACCESS DENIED".into(), "Wrong Room Key".into())
            }
            Self::Denied(DenyReason::NotAuthorized) => {
                ("ACCESS DENIED".into(), "Not Authorized".into())
            }
            Self::WriteSucceeded => ("SUCCESS!".into(), "Card programmed".into()),
            Self::WriteFailed => ("FAILED!".into(), String::new()),
            Self::CardRoom { room } => ("Card Room:".into(), room.to_string()),
            Self::InspectFailed => ("Inspect Failed".into(), "Try again".into()),
            Self::RemoteRoomSet { room } => ("Remote Room Set".into(), format!("Room: {room}")),
            Self::RoomUpdated { room } => ("Updated Room!".into(), format!("New ID: {room}")),
        }
    }

    /// How long an outcome screen stays up. `None` for mode screens.
    #[must_use]
    pub fn hold(&self) -> Option<Duration> {
        let ms = match self {
            Self::Ready { .. } | Self::WriterWaiting | Self::WriteArmed { .. } => return None,
            Self::RemoteRoomSet { .. } => 1000,
            Self::CardRoom { .. } | Self::InspectFailed => 1500,
            Self::Unlocked { .. }
            | Self::Denied(_)
            | Self::WriteSucceeded
            | Self::WriteFailed
            | Self::RoomUpdated { .. } => 2000,
        };
        Some(Duration::from_millis(ms))
    }
}

/// Virtual character display.
///
/// Not thread-safe; owned by the control loop.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    lines: usize,
    columns: usize,
    buffer: Vec<String>,
    base: Screen,
    overlay: Option<(Screen, Instant)>,
}

impl VirtualDisplay {
    /// A 16x2 display showing `base`.
    #[must_use]
    pub fn new(base: Screen) -> Self {
        Self::builder(base).build()
    }

    #[must_use]
    pub fn builder(base: Screen) -> VirtualDisplayBuilder {
        VirtualDisplayBuilder {
            lines: DEFAULT_LINES,
            columns: DEFAULT_COLUMNS,
            base,
        }
    }

    /// Replace the mode screen. Shown now unless an overlay is up.
    pub fn set_base(&mut self, screen: Screen) {
        if self.base == screen {
            return;
        }
        self.base = screen;
        if self.overlay.is_none() {
            self.render(&self.base.clone());
        }
    }

    /// Show a screen. Outcome screens are held for their hold time, mode
    /// screens replace the base.
    pub fn show(&mut self, screen: Screen) {
        match screen.hold() {
            Some(hold) => {
                self.render(&screen);
                self.overlay = Some((screen, Instant::now() + hold));
            }
            None => {
                self.overlay = None;
                self.base = screen.clone();
                self.render(&screen);
            }
        }
    }

    /// Expire an overlay whose hold time has passed. Returns `true` if the
    /// content changed.
    pub fn update(&mut self, now: Instant) -> bool {
        match &self.overlay {
            Some((_, until)) if now >= *until => {
                self.overlay = None;
                self.render(&self.base.clone());
                true
            }
            _ => false,
        }
    }

    /// Screen currently visible.
    #[must_use]
    pub fn current(&self) -> &Screen {
        self.overlay.as_ref().map_or(&self.base, |(screen, _)| screen)
    }

    #[must_use]
    pub fn base(&self) -> &Screen {
        &self.base
    }

    /// Text of one line, padded to the column width.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLine` if `line` is out of range.
    pub fn line(&self, line: usize) -> Result<&str> {
        self.buffer
            .get(line)
            .map(String::as_str)
            .ok_or(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            })
    }

    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.buffer.iter().map(String::as_str).collect()
    }

    fn render(&mut self, screen: &Screen) {
        let (first, second) = screen.text();
        for (index, text) in [first, second].iter().enumerate().take(self.lines) {
            self.buffer[index] = align_text(&sanitize_text(text), self.columns, Alignment::Left);
        }
    }
}

impl fmt::Display for VirtualDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(self.columns);
        writeln!(f, "+{border}+")?;
        for line in &self.buffer {
            writeln!(f, "|{line}|")?;
        }
        write!(f, "+{border}+")
    }
}

/// Builder for non-standard display sizes.
#[derive(Debug)]
pub struct VirtualDisplayBuilder {
    lines: usize,
    columns: usize,
    base: Screen,
}

impl VirtualDisplayBuilder {
    /// At least two lines are kept so every screen fits.
    #[must_use]
    pub fn with_size(mut self, lines: usize, columns: usize) -> Self {
        self.lines = lines.max(DEFAULT_LINES);
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn build(self) -> VirtualDisplay {
        let mut display = VirtualDisplay {
            lines: self.lines,
            columns: self.columns,
            buffer: vec![" ".repeat(self.columns); self.lines],
            base: self.base,
            overlay: None,
        };
        display.render(&display.base.clone());
        display
    }
}

/// Truncate text to at most `max_chars` characters.
///
/// ```
/// use roomkey_terminal::truncate_text;
///
/// assert_eq!(truncate_text("WRITE ROOM: penthouse", 16), "WRITE ROOM: pent");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align text within `width` characters, padding with spaces and
/// truncating when too long.
///
/// ```
/// use roomkey_terminal::{Alignment, align_text};
///
/// assert_eq!(align_text("OPEN", 8, Alignment::Left), "OPEN    ");
/// assert_eq!(align_text("OPEN", 8, Alignment::Center), "  OPEN  ");
/// assert_eq!(align_text("OPEN", 8, Alignment::Right), "    OPEN");
/// ```
#[must_use]
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();
    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;
    match alignment {
        Alignment::Left => format!("{text}{}", " ".repeat(padding)),
        Alignment::Right => format!("{}{text}", " ".repeat(padding)),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{text}{}", " ".repeat(left_pad), " ".repeat(right_pad))
        }
    }
}

/// Drop control characters and replace non-ASCII with `?`.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
