//! Raw device I/O abstraction, so the Executor is testable without real
//! hardware: platform implementations and test fakes implement the same
//! trait. Writes are chunked by the caller so progress can be reported
//! as bytes actually land (see the Executor's overwrite passes).

use crate::error::WipeError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub trait BlockDevice: Send {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, WipeError>;
    fn write_chunk(&mut self, offset: u64, buf: &[u8]) -> Result<(), WipeError>;
    fn flush(&mut self) -> Result<(), WipeError>;
    fn size(&self) -> u64;
}

pub struct RealBlockDevice {
    file: File,
    size: u64,
}

impl RealBlockDevice {
    pub fn open(device_path: impl AsRef<Path>, size: u64) -> Result<Self, WipeError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device_path)?;
        Ok(Self { file, size })
    }
}

impl BlockDevice for RealBlockDevice {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, WipeError> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_chunk(&mut self, offset: u64, buf: &[u8]) -> Result<(), WipeError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WipeError> {
        self.file.flush()?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// In-memory fake used by unit and scenario tests.
pub struct FakeBlockDevice {
    pub data: Vec<u8>,
}

impl FakeBlockDevice {
    /// Filled with non-zero, non-constant bytes so a test can observe a
    /// pass actually overwriting it.
    pub fn new(size: u64) -> Self {
        Self {
            data: (0..size).map(|i| (i % 251) as u8).collect(),
        }
    }
}

impl BlockDevice for FakeBlockDevice {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, WipeError> {
        let start = offset as usize;
        let end = (start + len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn write_chunk(&mut self, offset: u64, buf: &[u8]) -> Result<(), WipeError> {
        let start = offset as usize;
        let end = (start + buf.len()).min(self.data.len());
        self.data[start..end].copy_from_slice(&buf[..end - start]);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), WipeError> {
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
