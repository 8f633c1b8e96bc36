//! GPIO character device access
//!
//! Talks to `/dev/gpiochipN` through the Linux GPIO uAPI v2 ioctls:
//!
//! - `GPIO_GET_CHIPINFO_IOCTL` to read the chip name, label and line count
//! - `GPIO_V2_GET_LINE_IOCTL` to request a single input line with edge detection
//!
//! The kernel hands back a line file descriptor that becomes readable when
//! edge events are queued. Each read returns whole `gpio_v2_line_event`
//! records (48 bytes).

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd};
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::constants::gpio;
use crate::data::{ChannelConfig, EdgeMode};
use crate::error::{FanRpmError, Result};
use crate::hw::line::{EdgeLine, EdgeLineProvider, WaitOutcome};

// uAPI v2 constants (include/uapi/linux/gpio.h)
const GPIO_MAX_NAME_SIZE: usize = 32;
const GPIO_V2_LINES_MAX: usize = 64;
const GPIO_V2_LINE_NUM_ATTRS_MAX: usize = 10;

const GPIO_V2_LINE_FLAG_INPUT: u64 = 1 << 2;
const GPIO_V2_LINE_FLAG_EDGE_RISING: u64 = 1 << 3;
const GPIO_V2_LINE_FLAG_EDGE_FALLING: u64 = 1 << 4;

// _IOR(0xB4, 0x01, struct gpiochip_info)
const GPIO_GET_CHIPINFO_IOCTL: u32 = 0x8044_B401;
// _IOWR(0xB4, 0x07, struct gpio_v2_line_request)
const GPIO_V2_GET_LINE_IOCTL: u32 = 0xC250_B407;

/// Size of one `struct gpio_v2_line_event`
const LINE_EVENT_SIZE: usize = 48;

#[repr(C)]
struct RawChipInfo {
    name: [u8; GPIO_MAX_NAME_SIZE],
    label: [u8; GPIO_MAX_NAME_SIZE],
    lines: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct RawLineAttribute {
    id: u32,
    padding: u32,
    value: u64,
}

#[repr(C)]
#[derive(Clone, Copy)]
struct RawLineConfigAttribute {
    attr: RawLineAttribute,
    mask: u64,
}

#[repr(C)]
struct RawLineConfig {
    flags: u64,
    num_attrs: u32,
    padding: [u32; 5],
    attrs: [RawLineConfigAttribute; GPIO_V2_LINE_NUM_ATTRS_MAX],
}

#[repr(C)]
struct RawLineRequest {
    offsets: [u32; GPIO_V2_LINES_MAX],
    consumer: [u8; GPIO_MAX_NAME_SIZE],
    config: RawLineConfig,
    num_lines: u32,
    event_buffer_size: u32,
    padding: [u32; 5],
    fd: i32,
}

const _: () = assert!(std::mem::size_of::<RawChipInfo>() == 68);
const _: () = assert!(std::mem::size_of::<RawLineRequest>() == 592);

/// Chip identity as reported by the kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipInfo {
    pub name: String,
    pub label: String,
    pub lines: u32,
}

/// An open GPIO chip. Shared read-only by all channel workers; each worker
/// requests its own line from it.
#[derive(Debug)]
pub struct GpioChip {
    name: String,
    file: File,
}

impl GpioChip {
    /// Open `/dev/<name>`
    pub fn open(name: &str) -> Result<Self> {
        if name.is_empty() || name.contains('/') {
            return Err(FanRpmError::invalid_config(
                "chip",
                format!("'{}' is not a chip device name", name),
            ));
        }

        let path = PathBuf::from(gpio::DEV_DIR).join(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| FanRpmError::ChipOpen {
                chip: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            file,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query name, label and line count
    pub fn info(&self) -> Result<ChipInfo> {
        // SAFETY: RawChipInfo is plain old data; all-zero is a valid value.
        let mut raw: RawChipInfo = unsafe { std::mem::zeroed() };
        // SAFETY: the fd is owned by self.file and raw matches the layout the ioctl writes.
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                GPIO_GET_CHIPINFO_IOCTL as _,
                &mut raw as *mut RawChipInfo,
            )
        };
        if ret < 0 {
            return Err(FanRpmError::ChipInfo {
                chip: self.name.clone(),
                reason: io::Error::last_os_error().to_string(),
            });
        }

        Ok(ChipInfo {
            name: c_chars_to_string(&raw.name),
            label: c_chars_to_string(&raw.label),
            lines: raw.lines,
        })
    }

    /// Request `line` as an input with edge detection for `edge`
    pub fn request_edge_events(&self, line: u32, consumer: &str, edge: EdgeMode) -> Result<CdevLine> {
        // SAFETY: RawLineRequest is plain old data; all-zero is a valid value.
        let mut req: RawLineRequest = unsafe { std::mem::zeroed() };
        req.offsets[0] = line;
        req.num_lines = 1;
        req.config.flags = GPIO_V2_LINE_FLAG_INPUT | edge_flags(edge);

        let label = consumer.as_bytes();
        let n = label.len().min(GPIO_MAX_NAME_SIZE - 1);
        req.consumer[..n].copy_from_slice(&label[..n]);

        // SAFETY: the fd is owned by self.file and req matches the kernel layout (size asserted above).
        let ret = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                GPIO_V2_GET_LINE_IOCTL as _,
                &mut req as *mut RawLineRequest,
            )
        };
        if ret < 0 {
            return Err(FanRpmError::line_request(
                line,
                io::Error::last_os_error().to_string(),
            ));
        }
        if req.fd < 0 {
            return Err(FanRpmError::line_request(line, "kernel returned no line descriptor"));
        }

        debug!(chip = %self.name, line, edge = %edge, "Requested edge events");

        // SAFETY: the kernel just handed us ownership of this descriptor.
        let file = unsafe { File::from_raw_fd(req.fd) };
        Ok(CdevLine {
            line,
            file,
            buf: [0; LINE_EVENT_SIZE],
        })
    }
}

fn edge_flags(edge: EdgeMode) -> u64 {
    match edge {
        EdgeMode::Rising => GPIO_V2_LINE_FLAG_EDGE_RISING,
        EdgeMode::Falling => GPIO_V2_LINE_FLAG_EDGE_FALLING,
        EdgeMode::Both => GPIO_V2_LINE_FLAG_EDGE_RISING | GPIO_V2_LINE_FLAG_EDGE_FALLING,
    }
}

fn c_chars_to_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Convert a wait timeout to poll(2) milliseconds without rounding a
/// non-zero timeout down to a busy poll
fn poll_timeout_ms(timeout: Duration) -> i32 {
    let ms = timeout.as_millis();
    if ms == 0 && !timeout.is_zero() {
        return 1;
    }
    ms.min(i32::MAX as u128) as i32
}

/// Consumer label shown by `gpioinfo`, unique per process
pub fn consumer_label() -> String {
    format!("{}-{}", gpio::CONSUMER_PREFIX, std::process::id())
}

/// Find the first of gpiochip0..gpiochip9 that has more lines than `line`
pub fn auto_detect_chip(line: u32) -> Result<String> {
    for i in 0..gpio::AUTODETECT_CHIPS {
        let name = format!("{}{}", gpio::CHIP_PREFIX, i);
        let chip = match GpioChip::open(&name) {
            Ok(chip) => chip,
            Err(_) => continue,
        };
        match chip.info() {
            Ok(info) if line < info.lines => {
                debug!(chip = %name, label = %info.label, lines = info.lines, "Auto-detected chip for GPIO {}", line);
                return Ok(name);
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping {}: {}", name, e),
        }
    }
    Err(FanRpmError::ChipNotFound(line))
}

/// A requested line backed by the kernel line descriptor.
///
/// Holds a single-event buffer that is reused for every read.
#[derive(Debug)]
pub struct CdevLine {
    line: u32,
    file: File,
    buf: [u8; LINE_EVENT_SIZE],
}

impl EdgeLine for CdevLine {
    fn line(&self) -> u32 {
        self.line
    }

    fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: pfd is a valid pollfd for the duration of the call.
        let ret = unsafe { libc::poll(&mut pfd, 1, poll_timeout_ms(timeout)) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(WaitOutcome::Timeout);
            }
            return Err(FanRpmError::event_read(self.line, err.to_string()));
        }
        if ret == 0 {
            return Ok(WaitOutcome::Timeout);
        }
        if pfd.revents & libc::POLLIN != 0 {
            return Ok(WaitOutcome::Event);
        }
        Err(FanRpmError::event_read(
            self.line,
            format!("line descriptor reported poll events {:#x}", pfd.revents),
        ))
    }

    fn consume(&mut self) -> Result<u64> {
        match self.file.read(&mut self.buf) {
            Ok(n) => Ok((n / LINE_EVENT_SIZE) as u64),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(FanRpmError::event_read(self.line, e.to_string())),
        }
    }
}

/// Line provider over one shared chip handle
#[derive(Debug)]
pub struct CdevProvider {
    chip: GpioChip,
    consumer: String,
}

impl CdevProvider {
    pub fn new(chip_name: &str) -> Result<Self> {
        Ok(Self {
            chip: GpioChip::open(chip_name)?,
            consumer: consumer_label(),
        })
    }

    pub fn chip(&self) -> &GpioChip {
        &self.chip
    }
}

impl EdgeLineProvider for CdevProvider {
    fn open(&self, channel: &ChannelConfig) -> Result<Box<dyn EdgeLine>> {
        let line = self
            .chip
            .request_edge_events(channel.line, &self.consumer, channel.edge)?;
        Ok(Box::new(line))
    }
}
