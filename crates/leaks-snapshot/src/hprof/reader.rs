//! Byte-cursor over a snapshot buffer.
//!
//! Hprof is big-endian throughout. Every read is bounds-checked; running
//! past the end of the buffer means the snapshot is corrupt, which is fatal
//! for parsing.

use crate::error::SnapshotError;

pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current absolute byte offset (for error messages and data spans).
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], SnapshotError> {
        if self.remaining() < n {
            return Err(SnapshotError::truncated(self.pos));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), SnapshotError> {
        self.take(n).map(|_| ())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, SnapshotError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, SnapshotError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, SnapshotError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads one identifier at the snapshot's declared width.
    pub(crate) fn read_id(&mut self, id_size: u32) -> Result<u64, SnapshotError> {
        match id_size {
            4 => Ok(u64::from(self.read_u32()?)),
            8 => self.read_u64(),
            other => Err(SnapshotError::unsupported_id_size(other)),
        }
    }

    /// Reads a NUL-terminated string from the start of the buffer.
    pub(crate) fn read_nul_terminated(
        &mut self,
        max: usize,
    ) -> Result<&'a str, SnapshotError> {
        let window = &self.buf[self.pos..self.buf.len().min(self.pos + max)];
        let nul = window
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| SnapshotError::bad_header("missing header terminator"))?;
        let s = std::str::from_utf8(&window[..nul])
            .map_err(|_| SnapshotError::bad_header("non-UTF-8 header"))?;
        self.pos += nul + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_big_endian() {
        let mut c = Cursor::new(&[0x12, 0x34, 0x56, 0x78, 0x9a]);
        assert_eq!(c.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(c.read_u8().unwrap(), 0x9a);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn id_width_follows_the_header() {
        let bytes = [0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0, 7];
        let mut c = Cursor::new(&bytes);
        assert_eq!(c.read_id(4).unwrap(), 5);
        assert_eq!(c.read_id(8).unwrap(), 7);
    }

    #[test]
    fn overrun_is_a_truncation_error() {
        let mut c = Cursor::new(&[1, 2]);
        let err = c.read_u32().unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn nul_terminated_header_string() {
        let mut c = Cursor::new(b"JAVA PROFILE 1.0.2\0rest");
        assert_eq!(c.read_nul_terminated(64).unwrap(), "JAVA PROFILE 1.0.2");
        assert_eq!(c.pos(), 19);
    }
}
