// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Position-tracking reader with nested bounded regions.

use crate::error::{Error, Result};
use std::io::{self, Read};

const CHUNK: usize = 8 * 1024;

/// Reader used by the decoder.
///
/// Tracks the absolute stream offset and a stack of region ends. Reads never
/// cross the innermost region end; popping a region skips whatever the
/// decoder left unread (padding). A one-byte lookahead answers "is the
/// stream exhausted" for unbounded collections.
pub struct BinaryReader<'a> {
    inner: &'a mut dyn Read,
    position: u64,
    limits: Vec<u64>,
    peeked: Option<u8>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self {
            inner,
            position: 0,
            limits: Vec::new(),
            peeked: None,
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left in the innermost region, `None` when unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.limits
            .last()
            .map(|end| end.saturating_sub(self.position))
    }

    /// Open a region of `len` bytes starting at the current position.
    pub fn push_limit(&mut self, len: u64) -> Result<()> {
        let offset = self.position;
        let end = offset.checked_add(len).ok_or(Error::UnexpectedEof {
            offset,
            needed: len,
        })?;
        if let Some(outer) = self.limits.last() {
            if end > *outer {
                return Err(Error::UnexpectedEof {
                    offset,
                    needed: end - outer,
                });
            }
        }
        self.limits.push(end);
        Ok(())
    }

    /// Close the innermost region, skipping unread bytes.
    pub fn pop_limit(&mut self) -> Result<()> {
        if let Some(end) = self.limits.last().copied() {
            let pad = end.saturating_sub(self.position);
            if pad > 0 {
                log::trace!("[reader] skipping {} padding bytes at {}", pad, self.position);
                self.skip(pad)?;
            }
            self.limits.pop();
        }
        Ok(())
    }

    /// Check whether the innermost region, or the stream, is exhausted.
    pub fn at_end(&mut self) -> Result<bool> {
        if let Some(rem) = self.remaining() {
            return Ok(rem == 0);
        }
        if self.peeked.is_some() {
            return Ok(false);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(true),
                Ok(_) => {
                    self.peeked = Some(byte[0]);
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Fill `buf` completely or fail with [`Error::UnexpectedEof`].
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.position;
        let wanted = buf.len() as u64;
        if let Some(rem) = self.remaining() {
            if wanted > rem {
                return Err(Error::UnexpectedEof {
                    offset,
                    needed: wanted - rem,
                });
            }
        }

        let mut filled = 0;
        if !buf.is_empty() {
            if let Some(byte) = self.peeked.take() {
                buf[0] = byte;
                filled = 1;
            }
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::UnexpectedEof {
                        offset: offset + filled as u64,
                        needed: (buf.len() - filled) as u64,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        self.position += wanted;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes.
    ///
    /// Grows the buffer as data arrives so a corrupt length cannot force a
    /// large allocation up front.
    pub fn read_vec(&mut self, len: u64) -> Result<Vec<u8>> {
        if let Some(rem) = self.remaining() {
            if len > rem {
                return Err(Error::UnexpectedEof {
                    offset: self.position,
                    needed: len - rem,
                });
            }
        }
        let mut out = Vec::new();
        let mut left = len;
        let mut chunk = [0u8; CHUNK];
        while left > 0 {
            let n = left.min(CHUNK as u64) as usize;
            self.read_exact(&mut chunk[..n])?;
            out.extend_from_slice(&chunk[..n]);
            left -= n as u64;
        }
        Ok(out)
    }

    /// Read up to (and consume) a `0` byte; the terminator is not returned.
    pub fn read_until_nul(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.read_u8()? {
                0 => return Ok(out),
                byte => out.push(byte),
            }
        }
    }

    /// Read the rest of the innermost region, or of the stream if unbounded.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        if let Some(rem) = self.remaining() {
            return self.read_vec(rem);
        }
        let mut out = Vec::new();
        if let Some(byte) = self.peeked.take() {
            out.push(byte);
            self.position += 1;
        }
        let n = self.inner.read_to_end(&mut out)?;
        self.position += n as u64;
        Ok(out)
    }

    fn skip(&mut self, len: u64) -> Result<()> {
        let mut left = len;
        let mut chunk = [0u8; CHUNK];
        while left > 0 {
            let n = left.min(CHUNK as u64) as usize;
            self.read_exact(&mut chunk[..n])?;
            left -= n as u64;
        }
        Ok(())
    }
}

impl Read for BinaryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = match self.remaining() {
            Some(rem) => rem.min(buf.len() as u64) as usize,
            None => buf.len(),
        };
        if max == 0 {
            return Ok(0);
        }
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            self.position += 1;
            return Ok(1);
        }
        let n = self.inner.read(&mut buf[..max])?;
        self.position += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_tracks_position() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut reader = BinaryReader::new(&mut src);
        assert_eq!(reader.read_array::<2>().unwrap(), [1, 2]);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert!(!reader.at_end().unwrap());
        assert_eq!(reader.read_to_end().unwrap(), vec![4, 5]);
        assert!(reader.at_end().unwrap());
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_limit_blocks_overread() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4]);
        let mut reader = BinaryReader::new(&mut src);
        reader.push_limit(2).unwrap();
        assert_eq!(reader.remaining(), Some(2));
        let err = reader.read_array::<3>().unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                offset: 0,
                needed: 1
            }
        ));
    }

    #[test]
    fn test_pop_limit_skips_padding() {
        let mut src = Cursor::new(vec![b'a', b'b', 0, 0, 9]);
        let mut reader = BinaryReader::new(&mut src);
        reader.push_limit(4).unwrap();
        assert_eq!(reader.read_array::<2>().unwrap(), *b"ab");
        reader.pop_limit().unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_u8().unwrap(), 9);
    }

    #[test]
    fn test_nested_limit_must_fit() {
        let mut src = Cursor::new(vec![0u8; 8]);
        let mut reader = BinaryReader::new(&mut src);
        reader.push_limit(4).unwrap();
        assert!(reader.push_limit(5).is_err());
        reader.push_limit(3).unwrap();
        assert_eq!(reader.remaining(), Some(3));
    }

    #[test]
    fn test_read_until_nul_and_eof() {
        let mut src = Cursor::new(b"hi\0x".to_vec());
        let mut reader = BinaryReader::new(&mut src);
        assert_eq!(reader.read_until_nul().unwrap(), b"hi".to_vec());
        assert_eq!(reader.position(), 3);
        assert!(matches!(
            reader.read_until_nul().unwrap_err(),
            Error::UnexpectedEof { offset: 4, .. }
        ));
    }

    #[test]
    fn test_peeked_byte_is_not_lost() {
        let mut src = Cursor::new(vec![7u8, 8]);
        let mut reader = BinaryReader::new(&mut src);
        assert!(!reader.at_end().unwrap());
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [7, 8]);
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_read_vec_rejects_length_past_region() {
        let mut src = Cursor::new(vec![0u8; 4]);
        let mut reader = BinaryReader::new(&mut src);
        reader.push_limit(4).unwrap();
        assert!(reader.read_vec(u64::MAX).is_err());
    }
}
