//! Serial device channel
//!
//! Opens the device node, puts it into raw 8N1 mode with non-blocking reads
//! (VMIN=0, VTIME=0), and exposes it through the [`Device`] trait the event
//! loop drives.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use rustix::fd::{AsFd, BorrowedFd, OwnedFd};
use rustix::fs::{Mode, OFlags};
use rustix::termios::{
    self, ControlModes, InputModes, LocalModes, OptionalActions, OutputModes, SpecialCodeIndex,
    Termios,
};

use torpedo_utils::{Result, TorpedoError};

/// Byte channel to the game device
pub trait Device {
    /// Read whatever is currently available; `Ok(0)` means nothing yet.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write every byte of `data`.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Block until all written bytes have left the device.
    fn drain(&mut self) -> io::Result<()>;
}

/// An open serial port in raw mode
#[derive(Debug)]
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    /// Open `path` and configure it for raw transport at `baud`.
    pub fn open(path: &Path, baud: u32) -> Result<Self> {
        if !is_supported_baud(baud) {
            return Err(TorpedoError::UnsupportedBaud(baud));
        }

        let fd = rustix::fs::open(path, OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC, Mode::empty())
            .map_err(|e| TorpedoError::DeviceOpen {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        let file = File::from(fd);

        // `file` is dropped (and closed) if configuration fails
        configure_raw(&file, baud).map_err(|source| TorpedoError::DeviceConfig {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), baud, "Serial device configured");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Path the port was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A second descriptor for the readiness wait; it must be dropped
    /// before [`close`](Self::close) for the device to really close.
    pub fn try_clone_fd(&self) -> io::Result<OwnedFd> {
        self.file.as_fd().try_clone_to_owned()
    }

    /// Close the port.
    pub fn close(self) {
        drop(self.file);
        tracing::debug!(path = %self.path.display(), "Serial device closed");
    }
}

impl AsFd for SerialPort {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Device for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.file.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)
    }

    fn drain(&mut self) -> io::Result<()> {
        termios::tcdrain(&self.file)?;
        Ok(())
    }
}

fn configure_raw(fd: impl AsFd, baud: u32) -> io::Result<()> {
    let mut tty = termios::tcgetattr(&fd)?;
    tty.set_speed(baud)?;
    apply_raw_8n1(&mut tty);
    termios::tcsetattr(&fd, OptionalActions::Now, &tty)?;
    Ok(())
}

/// 8 data bits, no parity, 1 stop bit, no echo, no canonical mode, no
/// signal characters, no flow control, no translation, reads never block.
fn apply_raw_8n1(tty: &mut Termios) {
    tty.control_modes
        .remove(ControlModes::PARENB | ControlModes::CSTOPB | ControlModes::CSIZE);
    tty.control_modes
        .insert(ControlModes::CS8 | ControlModes::CREAD | ControlModes::CLOCAL);

    tty.local_modes.remove(
        LocalModes::ICANON | LocalModes::ECHO | LocalModes::ECHOE | LocalModes::ECHONL | LocalModes::ISIG,
    );

    tty.input_modes.remove(
        InputModes::IXON
            | InputModes::IXOFF
            | InputModes::IXANY
            | InputModes::IGNBRK
            | InputModes::BRKINT
            | InputModes::PARMRK
            | InputModes::ISTRIP
            | InputModes::INLCR
            | InputModes::IGNCR
            | InputModes::ICRNL,
    );

    tty.output_modes.remove(OutputModes::OPOST | OutputModes::ONLCR);

    tty.special_codes[SpecialCodeIndex::VTIME] = 0;
    tty.special_codes[SpecialCodeIndex::VMIN] = 0;
}

/// Rates with a `B*` constant on every supported platform
const STANDARD_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
    115200, 230400,
];

#[cfg(target_os = "linux")]
const EXTENDED_BAUD_RATES: &[u32] = &[
    460800, 500000, 576000, 921600, 1000000, 1152000, 1500000, 2000000, 2500000, 3000000, 3500000,
    4000000,
];

#[cfg(not(target_os = "linux"))]
const EXTENDED_BAUD_RATES: &[u32] = &[];

/// Whether `baud` names a standard line speed on this platform.
pub fn is_supported_baud(baud: u32) -> bool {
    STANDARD_BAUD_RATES.contains(&baud) || EXTENDED_BAUD_RATES.contains(&baud)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::open_pty;

    /// Settings of a freshly allocated pty, in cooked mode
    fn cooked_termios() -> Termios {
        let (master, _path) = open_pty();
        termios::tcgetattr(&master).unwrap()
    }

    #[test]
    fn test_known_baud_rates_are_supported() {
        assert!(is_supported_baud(115200));
        assert!(is_supported_baud(9600));
        assert!(is_supported_baud(57600));
    }

    #[test]
    fn test_nonstandard_baud_rates_are_rejected() {
        assert!(!is_supported_baud(0));
        assert!(!is_supported_baud(12345));
        assert!(!is_supported_baud(115201));
    }

    #[test]
    fn test_raw_mode_clears_line_discipline() {
        let mut tty = cooked_termios();
        tty.local_modes
            .insert(LocalModes::ICANON | LocalModes::ECHO | LocalModes::ECHOE | LocalModes::ISIG);
        tty.input_modes
            .insert(InputModes::IXON | InputModes::IXOFF | InputModes::ICRNL | InputModes::ISTRIP);
        tty.output_modes.insert(OutputModes::OPOST | OutputModes::ONLCR);

        apply_raw_8n1(&mut tty);

        assert!(!tty
            .local_modes
            .intersects(LocalModes::ICANON | LocalModes::ECHO | LocalModes::ISIG));
        assert!(!tty
            .input_modes
            .intersects(InputModes::IXON | InputModes::IXOFF | InputModes::ICRNL));
        assert!(!tty.output_modes.intersects(OutputModes::OPOST | OutputModes::ONLCR));
    }

    #[test]
    fn test_raw_mode_sets_8n1() {
        let mut tty = cooked_termios();
        tty.control_modes.remove(ControlModes::CSIZE);
        tty.control_modes
            .insert(ControlModes::PARENB | ControlModes::CSTOPB | ControlModes::CS7);

        apply_raw_8n1(&mut tty);

        assert_eq!(tty.control_modes & ControlModes::CSIZE, ControlModes::CS8);
        assert!(!tty
            .control_modes
            .intersects(ControlModes::PARENB | ControlModes::CSTOPB));
        assert!(tty.control_modes.contains(ControlModes::CREAD | ControlModes::CLOCAL));
    }

    #[test]
    fn test_raw_mode_reads_never_block() {
        let mut tty = cooked_termios();
        tty.special_codes[SpecialCodeIndex::VMIN] = 1;
        tty.special_codes[SpecialCodeIndex::VTIME] = 5;

        apply_raw_8n1(&mut tty);

        assert_eq!(tty.special_codes[SpecialCodeIndex::VMIN], 0);
        assert_eq!(tty.special_codes[SpecialCodeIndex::VTIME], 0);
    }

    #[test]
    fn test_open_missing_device() {
        let err = SerialPort::open(Path::new("/dev/torpedo-does-not-exist"), 115200).unwrap_err();
        assert!(matches!(err, TorpedoError::DeviceOpen { .. }));
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn test_open_non_tty_fails_configuration() {
        // /dev/null opens fine but is not a terminal, so tcgetattr fails
        let err = SerialPort::open(Path::new("/dev/null"), 115200).unwrap_err();
        assert!(matches!(err, TorpedoError::DeviceConfig { .. }));
    }

    #[test]
    fn test_open_rejects_unsupported_baud_before_opening() {
        let err = SerialPort::open(Path::new("/dev/torpedo-does-not-exist"), 12345).unwrap_err();
        assert!(matches!(err, TorpedoError::UnsupportedBaud(12345)));
    }

    #[test]
    fn test_open_applies_raw_mode_and_speed() {
        let (_master, path) = open_pty();
        let port = SerialPort::open(&path, 9600).unwrap();

        let tty = termios::tcgetattr(&port).unwrap();
        assert!(!tty.local_modes.contains(LocalModes::ICANON));
        assert_eq!(tty.special_codes[SpecialCodeIndex::VMIN], 0);
        assert_eq!(tty.output_speed(), 9600);

        port.close();
    }

    #[test]
    fn test_open_pseudo_terminal_round_trip() {
        let (mut master, path) = open_pty();

        let mut port = SerialPort::open(&path, 115200).unwrap();
        assert_eq!(port.path(), path.as_path());

        // Nothing written yet: the read returns immediately with zero bytes
        let mut buf = [0u8; 16];
        assert_eq!(Device::read(&mut port, &mut buf).unwrap(), 0);

        Device::write_all(&mut port, b"restart\n").unwrap();
        port.drain().unwrap();

        let mut received = [0u8; 16];
        let n = master.read(&mut received).unwrap();
        // OPOST is off, so the newline is not expanded to CRLF
        assert_eq!(&received[..n], b"restart\n");

        port.close();
    }
}
