// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fixed-offset access to little-endian ABI structures.
//!
//! Every layout in this crate is a table of [`Field`]s. Accessors are bounds
//! checked and return a [`SizeError`] instead of panicking on short input.

use crate::error::{AbiError, FormatError, SizeError};
use std::ops::Range;
use zerocopy::byteorder::{LittleEndian, U32, U64};
use zerocopy::{AsBytes, FromBytes};

/// A named `[offset, offset + size)` byte range inside an ABI structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

impl Field {
    pub const fn new(name: &'static str, offset: usize, size: usize) -> Self {
        Self { name, offset, size }
    }

    pub const fn end(self) -> usize {
        self.offset + self.size
    }

    pub const fn range(self) -> Range<usize> {
        self.offset..self.end()
    }

    pub fn slice(self, data: &[u8]) -> Result<&[u8], SizeError> {
        let actual = data.len();
        data.get(self.range()).ok_or(SizeError::TooSmall {
            what: self.name,
            actual,
            required: self.end(),
        })
    }

    pub fn slice_mut(self, data: &mut [u8]) -> Result<&mut [u8], SizeError> {
        let actual = data.len();
        data.get_mut(self.range()).ok_or(SizeError::TooSmall {
            what: self.name,
            actual,
            required: self.end(),
        })
    }

    fn width_mismatch(self, expected: usize) -> SizeError {
        SizeError::Mismatch {
            what: self.name,
            actual: self.size,
            expected,
        }
    }

    pub fn read_u8(self, data: &[u8]) -> Result<u8, SizeError> {
        match self.slice(data)? {
            [byte] => Ok(*byte),
            _ => Err(self.width_mismatch(1)),
        }
    }

    pub fn read_u32(self, data: &[u8]) -> Result<u32, SizeError> {
        U32::<LittleEndian>::read_from(self.slice(data)?)
            .map(|v| v.get())
            .ok_or_else(|| self.width_mismatch(4))
    }

    pub fn read_u64(self, data: &[u8]) -> Result<u64, SizeError> {
        U64::<LittleEndian>::read_from(self.slice(data)?)
            .map(|v| v.get())
            .ok_or_else(|| self.width_mismatch(8))
    }

    pub fn read_array<const N: usize>(self, data: &[u8]) -> Result<[u8; N], SizeError> {
        <[u8; N]>::try_from(self.slice(data)?).map_err(|_| self.width_mismatch(N))
    }

    /// Copy the field out of `data`; the result never aliases the input.
    pub fn read_bytes(self, data: &[u8]) -> Result<Vec<u8>, SizeError> {
        Ok(self.slice(data)?.to_vec())
    }

    pub fn write_u8(self, data: &mut [u8], value: u8) -> Result<(), SizeError> {
        match self.slice_mut(data)? {
            [byte] => {
                *byte = value;
                Ok(())
            }
            _ => Err(self.width_mismatch(1)),
        }
    }

    pub fn write_u32(self, data: &mut [u8], value: u32) -> Result<(), SizeError> {
        U32::<LittleEndian>::new(value)
            .write_to(self.slice_mut(data)?)
            .ok_or_else(|| self.width_mismatch(4))
    }

    pub fn write_u64(self, data: &mut [u8], value: u64) -> Result<(), SizeError> {
        U64::<LittleEndian>::new(value)
            .write_to(self.slice_mut(data)?)
            .ok_or_else(|| self.width_mismatch(8))
    }

    pub fn write_bytes(self, data: &mut [u8], value: &[u8]) -> Result<(), SizeError> {
        self.check_len(value)?;
        self.slice_mut(data)?.copy_from_slice(value);
        Ok(())
    }

    /// Checks that `value` has exactly the width of this field.
    pub fn check_len(self, value: &[u8]) -> Result<(), SizeError> {
        if value.len() != self.size {
            return Err(SizeError::Mismatch {
                what: self.name,
                actual: value.len(),
                expected: self.size,
            });
        }
        Ok(())
    }

    /// Fails if any byte of this reserved range is non-zero. The error carries
    /// the whole range and its contents, not just the first offending byte.
    pub fn check_mbz(self, data: &[u8]) -> Result<(), AbiError> {
        let bytes = self.slice(data)?;
        if find_non_zero(bytes).is_some() {
            tracing::trace!(lo = self.offset, hi = self.end(), "reserved range not zero");
            return Err(FormatError::Mbz {
                lo: self.offset,
                hi: self.end(),
                contents: hex::encode(bytes),
            }
            .into());
        }
        Ok(())
    }
}

/// Index of the first non-zero byte, if any.
pub fn find_non_zero(data: &[u8]) -> Option<usize> {
    data.iter().position(|&b| b != 0)
}

/// True if `fields` tile `[0, total)` in order, without gaps or overlaps.
pub const fn is_contiguous(fields: &[Field], total: usize) -> bool {
    let mut next = 0;
    let mut i = 0;
    while i < fields.len() {
        if fields[i].offset != next {
            return false;
        }
        next = fields[i].end();
        i += 1;
    }
    next == total
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Field = Field::new("a", 0, 4);
    const B: Field = Field::new("b", 4, 8);
    const C: Field = Field::new("c", 12, 2);

    #[test]
    fn test_contiguous_table() {
        assert!(is_contiguous(&[A, B, C], 14));
        assert!(!is_contiguous(&[A, C], 14));
        assert!(!is_contiguous(&[A, B, C], 16));
    }

    #[test]
    fn test_read_write_little_endian() {
        let mut data = [0u8; 14];
        A.write_u32(&mut data, 0x0403_0201).unwrap();
        B.write_u64(&mut data, 0x0c0b_0a09_0807_0605).unwrap();
        assert_eq!(data[..12], [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(A.read_u32(&data).unwrap(), 0x0403_0201);
        assert_eq!(B.read_u64(&data).unwrap(), 0x0c0b_0a09_0807_0605);
    }

    #[test]
    fn test_width_mismatch() {
        let data = [0u8; 14];
        let err = C.read_u32(&data).unwrap_err();
        assert_eq!(
            err,
            SizeError::Mismatch {
                what: "c",
                actual: 2,
                expected: 4
            }
        );
        let err = C.write_bytes(&mut [0u8; 14], &[1, 2, 3]).unwrap_err();
        assert_eq!(err.to_string(), "c length is 3, expect 2");
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 10];
        let err = B.read_u64(&data).unwrap_err();
        assert_eq!(err.to_string(), "b too small, 10B, need at least 12B");
    }

    #[test]
    fn test_mbz() {
        let mut data = [0u8; 14];
        B.check_mbz(&data).unwrap();
        data[6] = 0xcc;
        let err = B.check_mbz(&data).unwrap_err();
        let AbiError::Format(err) = err else {
            panic!("expected format error");
        };
        assert_eq!(
            err.to_string(),
            "mbz range [0x4:0xc] not all zero: 0000cc0000000000"
        );
        // Neighbouring fields are unaffected.
        A.check_mbz(&data).unwrap();
        C.check_mbz(&data).unwrap();
    }

    #[test]
    fn test_find_non_zero() {
        assert_eq!(find_non_zero(&[0, 0, 0]), None);
        assert_eq!(find_non_zero(&[0, 7, 1]), Some(1));
        assert_eq!(find_non_zero(&[]), None);
    }
}
