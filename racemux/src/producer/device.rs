//! Raw joystick input.
//!
//! The producer reads a [`JoystickDevice`]: a snapshot of axis positions and
//! button states refreshed by [`JoystickDevice::poll`]. [`LinuxJoystick`]
//! implements it over the kernel joystick API (`/dev/input/js*`), which
//! delivers 8-byte events:
//!
//! ```text
//!  struct js_event {
//!      u32 time;     // ms, native endian
//!      i16 value;    // axis -32767..=32767, button 0/1
//!      u8  type;     // 0x01 button, 0x02 axis, |0x80 initial state
//!      u8  number;   // axis/button index
//!  };
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use bytes::Buf;

/// Size of one kernel joystick event.
pub const JS_EVENT_LEN: usize = 8;

const JS_EVENT_BUTTON: u8 = 0x01;
const JS_EVENT_AXIS: u8 = 0x02;
const JS_EVENT_INIT: u8 = 0x80;
const AXIS_FULL_SCALE: f32 = 32767.0;

/// A source of axis and button state.
pub trait JoystickDevice: Send {
    /// Consume every pending input event without blocking.
    ///
    /// An error means the device is gone.
    fn poll(&mut self) -> io::Result<()>;

    /// Axis position in `[-1, 1]`; unknown axes read `0.0`.
    fn axis(&self, index: u8) -> f32;

    /// Whether a button is held; unknown buttons read `false`.
    fn button(&self, index: u8) -> bool;
}

/// One decoded kernel event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsEvent {
    Button { number: u8, pressed: bool },
    Axis { number: u8, value: f32 },
    Other,
}

impl JsEvent {
    /// Decode one 8-byte event.
    pub fn decode(raw: [u8; JS_EVENT_LEN]) -> Self {
        let mut buf = &raw[..];
        let _time = buf.get_u32_ne();
        let value = buf.get_i16_ne();
        let kind = buf.get_u8() & !JS_EVENT_INIT;
        let number = buf.get_u8();

        match kind {
            JS_EVENT_BUTTON => JsEvent::Button {
                number,
                pressed: value != 0,
            },
            JS_EVENT_AXIS => JsEvent::Axis {
                number,
                value: (f32::from(value) / AXIS_FULL_SCALE).clamp(-1.0, 1.0),
            },
            _ => JsEvent::Other,
        }
    }
}

/// Axis and button state accumulated from events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoystickState {
    axes: Vec<f32>,
    buttons: Vec<bool>,
}

impl JoystickState {
    /// Fold one event into the state.
    pub fn apply(&mut self, event: JsEvent) {
        match event {
            JsEvent::Button { number, pressed } => {
                let i = usize::from(number);
                if self.buttons.len() <= i {
                    self.buttons.resize(i + 1, false);
                }
                self.buttons[i] = pressed;
            }
            JsEvent::Axis { number, value } => {
                let i = usize::from(number);
                if self.axes.len() <= i {
                    self.axes.resize(i + 1, 0.0);
                }
                self.axes[i] = value;
            }
            JsEvent::Other => {}
        }
    }

    pub fn axis(&self, index: u8) -> f32 {
        self.axes.get(usize::from(index)).copied().unwrap_or(0.0)
    }

    pub fn button(&self, index: u8) -> bool {
        self.buttons.get(usize::from(index)).copied().unwrap_or(false)
    }
}

/// Non-blocking reader for a Linux joystick device node.
#[derive(Debug)]
pub struct LinuxJoystick {
    path: PathBuf,
    file: File,
    state: JoystickState,
}

impl LinuxJoystick {
    /// Open `path` (e.g. `/dev/input/js0`) in non-blocking mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            state: JoystickState::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JoystickDevice for LinuxJoystick {
    fn poll(&mut self) -> io::Result<()> {
        let mut raw = [0u8; JS_EVENT_LEN];
        loop {
            match self.file.read_exact(&mut raw) {
                Ok(()) => self.state.apply(JsEvent::decode(raw)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn axis(&self, index: u8) -> f32 {
        self.state.axis(index)
    }

    fn button(&self, index: u8) -> bool {
        self.state.button(index)
    }
}
