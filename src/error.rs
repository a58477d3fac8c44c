// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::policy::PolicyError;
use thiserror::Error;

/// A buffer or byte field is shorter than, or differs from, its ABI size.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("{what} too small, {actual}B, need at least {required}B")]
    TooSmall {
        what: &'static str,
        actual: usize,
        required: usize,
    },
    #[error("{what} length is {actual}, expect {expected}")]
    Mismatch {
        what: &'static str,
        actual: usize,
        expected: usize,
    },
}

/// A field violates a structural constraint of the ABI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("mbz range [{lo:#x}:{hi:#x}] not all zero: {contents}")]
    Mbz {
        lo: usize,
        hi: usize,
        contents: String,
    },
    #[error("mbz bits at offset {offset:#x} not zero: {bits:#010x}")]
    MbzBits { offset: usize, bits: u32 },
    #[error("malformed guest policy: {0}")]
    Policy(#[from] PolicyError),
    #[error("unknown signature algorithm: {0}")]
    UnknownSignatureAlgo(u32),
    #[error("report version is: {got}. Expected {want}")]
    ReportVersion { got: u32, want: u32 },
    #[error("{field} size {size} is not 2048 or 4096")]
    KeySize { field: &'static str, size: u32 },
    #[error("cert table entry {index} has invalid offset into header (size {header_size}): {offset}")]
    CertTableOffset {
        index: usize,
        offset: u32,
        header_size: usize,
    },
}

/// A caller-supplied value cannot be represented in the ABI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("{field} field must fit in a byte, got {value}")]
    ByteOverflow { field: &'static str, value: u32 },
    #[error("{component} component is {actual} bytes, must fit in {max} bytes")]
    BigIntTooLarge {
        component: &'static str,
        actual: usize,
        max: usize,
    },
}

#[derive(Error, Debug)]
pub enum AbiError {
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[cfg(feature = "verifier")]
    #[error("openssl error")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}

impl From<PolicyError> for AbiError {
    fn from(err: PolicyError) -> Self {
        AbiError::Format(err.into())
    }
}
