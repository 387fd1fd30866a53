//! Readiness wait over the device and the operator's terminal
//!
//! A thin wrapper around `poll(2)` with a bounded timeout, so the event loop
//! notices an asynchronously raised shutdown request within one interval
//! even when both sources are idle.

use std::io;
use std::time::Duration;

use rustix::event::{poll, PollFd, PollFlags, Timespec};
use rustix::fd::AsFd;
use rustix::io::Errno;

/// Which sources have data waiting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub device: bool,
    /// The device reported hang-up or error; a zero-byte read now means it is gone
    pub device_hangup: bool,
    pub operator: bool,
}

#[cfg(test)]
impl Readiness {
    /// Neither source is ready (the wait timed out)
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn device() -> Self {
        Self {
            device: true,
            ..Self::default()
        }
    }

    pub fn device_hangup() -> Self {
        Self {
            device: true,
            device_hangup: true,
            operator: false,
        }
    }

    pub fn operator() -> Self {
        Self {
            operator: true,
            ..Self::default()
        }
    }

    pub fn both() -> Self {
        Self {
            device: true,
            device_hangup: false,
            operator: true,
        }
    }
}

/// Result of a single readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The wait completed (possibly by timeout)
    Ready(Readiness),
    /// A signal interrupted the wait before anything became ready
    Interrupted,
}

/// Waits until one of the two sources is readable or `timeout` elapses
pub trait Poller {
    fn wait(&mut self, timeout: Duration) -> io::Result<WaitOutcome>;
}

/// `poll(2)` over the device descriptor and the operator's stdin
#[derive(Debug)]
pub struct FdPoller<D, O> {
    device: D,
    operator: O,
}

impl<D: AsFd, O: AsFd> FdPoller<D, O> {
    pub fn new(device: D, operator: O) -> Self {
        Self { device, operator }
    }
}

impl<D: AsFd, O: AsFd> Poller for FdPoller<D, O> {
    fn wait(&mut self, timeout: Duration) -> io::Result<WaitOutcome> {
        let timeout = Timespec::try_from(timeout)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut fds = [
            PollFd::new(&self.device, PollFlags::IN),
            PollFd::new(&self.operator, PollFlags::IN),
        ];

        match poll(&mut fds, Some(&timeout)) {
            Ok(_) => {}
            Err(e) if e == Errno::INTR => return Ok(WaitOutcome::Interrupted),
            Err(e) => return Err(e.into()),
        }

        let device = fds[0].revents();
        if device.contains(PollFlags::NVAL) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "serial device descriptor is not open",
            ));
        }
        // A hung-up tty stays readable and reads as zero bytes forever
        let device_hangup = device.intersects(PollFlags::HUP | PollFlags::ERR);

        Ok(WaitOutcome::Ready(Readiness {
            device: device.contains(PollFlags::IN) || device_hangup,
            device_hangup,
            // hang-up on stdin is delivered to the reader as end-of-stream
            operator: fds[1]
                .revents()
                .intersects(PollFlags::IN | PollFlags::HUP | PollFlags::ERR | PollFlags::NVAL),
        }))
    }
}
