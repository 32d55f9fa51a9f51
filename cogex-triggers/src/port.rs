//! Output ports: the single "set output byte" operation towards the EEG
//! trigger interface.

use std::io;
use std::sync::{Arc, Mutex};

pub const DEFAULT_PARPORT: &str = "/dev/parport0";

pub trait OutputPort {
    fn set_data(&mut self, value: u8) -> io::Result<()>;
}

impl<P: OutputPort + ?Sized> OutputPort for Box<P> {
    fn set_data(&mut self, value: u8) -> io::Result<()> {
        (**self).set_data(value)
    }
}

/// In-memory port keeping every written byte. Clones share the write log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPort {
    writes: Arc<Mutex<Vec<u8>>>,
}

impl RecordingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<u8> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl OutputPort for RecordingPort {
    fn set_data(&mut self, value: u8) -> io::Result<()> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(value);
        Ok(())
    }
}

/// Parallel port driven through the Linux ppdev interface.
#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct ParallelPort {
    file: std::fs::File,
}

#[cfg(target_os = "linux")]
mod ppdev {
    // _IO('p', 0x8b), _IO('p', 0x8c), _IOW('p', 0x86, unsigned char)
    pub const PPCLAIM: u64 = 0x708b;
    pub const PPRELEASE: u64 = 0x708c;
    pub const PPWDATA: u64 = 0x4001_7086;
}

#[cfg(target_os = "linux")]
impl ParallelPort {
    pub fn open(path: &str) -> io::Result<Self> {
        use std::os::fd::AsRawFd;

        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), ppdev::PPCLAIM as _) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { file })
    }
}

#[cfg(target_os = "linux")]
impl OutputPort for ParallelPort {
    fn set_data(&mut self, value: u8) -> io::Result<()> {
        use std::os::fd::AsRawFd;

        let data: libc::c_uchar = value;
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                ppdev::PPWDATA as _,
                &data as *const libc::c_uchar,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
impl Drop for ParallelPort {
    fn drop(&mut self) {
        use std::os::fd::AsRawFd;

        unsafe {
            libc::ioctl(self.file.as_raw_fd(), ppdev::PPRELEASE as _);
        }
    }
}

#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct ParallelPort {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl ParallelPort {
    pub fn open(path: &str) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("parallel port {path} is only supported on linux"),
        ))
    }
}

#[cfg(not(target_os = "linux"))]
impl OutputPort for ParallelPort {
    fn set_data(&mut self, _value: u8) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }
}
