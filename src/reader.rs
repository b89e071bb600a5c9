//! Endian-aware byte cursor over an in-memory buffer

use crate::error::{AssetError, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Byte order for primitive reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Big endian (network byte order)
    Big,
    /// Little endian
    #[default]
    Little,
}

/// Seekable binary cursor used by every decoder in this crate.
///
/// Reads either complete or fail; a fixed-size read that cannot be satisfied
/// is `TruncatedInput`, and a null-terminated string that exhausts the buffer
/// first is `UnterminatedString`. Positioning is explicit: callers seek or
/// align, nothing else moves the cursor behind their back.
pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
    byte_order: ByteOrder,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader over a byte slice
    pub fn new(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            cursor: Cursor::new(data),
            byte_order,
        }
    }

    /// Current position from the start of the buffer
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Move to an absolute position
    pub fn set_position(&mut self, pos: u64) {
        self.cursor.set_position(pos);
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left between the cursor and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position() as usize)
    }

    /// The byte order this reader was configured with
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Advance to the next 4-byte boundary relative to the stream start
    pub fn align(&mut self) -> Result<()> {
        let pos = self.position();
        let aligned = (pos + 3) & !3;
        if aligned > pos {
            self.set_position(aligned);
        }
        Ok(())
    }

    fn require(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(AssetError::truncated(count, self.remaining()));
        }
        Ok(())
    }

    /// Read exactly `count` bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.require(count)?;
        let mut buffer = vec![0u8; count];
        self.cursor.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read a single unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.cursor.read_u8()?)
    }

    /// Read a single signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a boolean stored as one byte (0 = false)
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an unsigned 16-bit integer
    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_u16::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_u16::<LittleEndian>()?),
        }
    }

    /// Read a signed 16-bit integer
    pub fn read_i16(&mut self) -> Result<i16> {
        self.require(2)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_i16::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_i16::<LittleEndian>()?),
        }
    }

    /// Read an unsigned 32-bit integer
    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_u32::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_u32::<LittleEndian>()?),
        }
    }

    /// Read a signed 32-bit integer
    pub fn read_i32(&mut self) -> Result<i32> {
        self.require(4)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_i32::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_i32::<LittleEndian>()?),
        }
    }

    /// Read an unsigned 64-bit integer
    pub fn read_u64(&mut self) -> Result<u64> {
        self.require(8)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_u64::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_u64::<LittleEndian>()?),
        }
    }

    /// Read a signed 64-bit integer
    pub fn read_i64(&mut self) -> Result<i64> {
        self.require(8)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_i64::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_i64::<LittleEndian>()?),
        }
    }

    /// Read a 32-bit float
    pub fn read_f32(&mut self) -> Result<f32> {
        self.require(4)?;
        match self.byte_order {
            ByteOrder::Big => Ok(self.cursor.read_f32::<BigEndian>()?),
            ByteOrder::Little => Ok(self.cursor.read_f32::<LittleEndian>()?),
        }
    }

    /// Read bytes until a zero terminator (the terminator is consumed)
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.position();
        let mut bytes = Vec::new();
        loop {
            match self.read_u8() {
                Ok(0) => break,
                Ok(b) => bytes.push(b),
                Err(AssetError::TruncatedInput { .. }) => {
                    return Err(AssetError::UnterminatedString { offset: start });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a length-prefixed string followed by 4-byte alignment
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let length = self.read_i32()?;
        if length < 0 {
            return Err(AssetError::invalid_data(format!(
                "negative string length {}",
                length
            )));
        }
        let bytes = self.read_bytes(length as usize)?;
        self.align()?;
        Ok(String::from_utf8(bytes)?)
    }
}
