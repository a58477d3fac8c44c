// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Certificate structures returned next to an extended attestation report.
//!
//! An extended guest request fills auxiliary data pages with a certificate
//! table: a list of 24-byte (GUID, offset, length) entries terminated by an
//! all-zero entry, followed by the certificates themselves. AMD signing keys
//! (ASK/ARK) may also be distributed in the AMD certificate format described
//! in Appendix B.1 of the SEV API specification, parsed by [`parse_ask_cert`].

use crate::error::{AbiError, FormatError, SizeError};
use crate::layout::{find_non_zero, Field};
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::mem::size_of;
use uuid::Uuid;
use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes, Unaligned};

/// ABI size of a certificate table entry.
pub const CERT_TABLE_ENTRY_SIZE: usize = 24;
/// Byte length of a GUID's binary representation.
pub const GUID_SIZE: usize = 16;

// GUIDs defined by the AMD Guest-Hypervisor Communication Block specification
// for MSG_REPORT_REQ.

/// Versioned Chip Endorsement Key
pub const VCEK_GUID: &str = "63da758d-e664-4564-adc5-f4b93be8accd";
/// AMD Signing Key
pub const ASK_GUID: &str = "4ab7b379-bbac-4fe4-a02f-05aef327c782";
/// AMD Root Key
pub const ARK_GUID: &str = "c0b406a4-a803-4952-9743-3fb6014cd0ae";

pub const VCEK_UUID: Uuid = Uuid::from_u128(0x63da758d_e664_4564_adc5_f4b93be8accd);
pub const ASK_UUID: Uuid = Uuid::from_u128(0x4ab7b379_bbac_4fe4_a02f_05aef327c782);
pub const ARK_UUID: Uuid = Uuid::from_u128(0xc0b406a4_a803_4952_9743_3fb6014cd0ae);

/// Key role of a certificate table entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertType {
    Vcek,
    Ask,
    Ark,
    Other(Uuid),
}

impl From<Uuid> for CertType {
    fn from(guid: Uuid) -> Self {
        match guid {
            VCEK_UUID => CertType::Vcek,
            ASK_UUID => CertType::Ask,
            ARK_UUID => CertType::Ark,
            other => CertType::Other(other),
        }
    }
}

impl From<CertType> for Uuid {
    fn from(cert_type: CertType) -> Self {
        match cert_type {
            CertType::Vcek => VCEK_UUID,
            CertType::Ask => ASK_UUID,
            CertType::Ark => ARK_UUID,
            CertType::Other(guid) => guid,
        }
    }
}

#[repr(C)]
#[derive(FromZeroes, FromBytes, AsBytes, Unaligned, Copy, Clone)]
struct RawCertTableEntry {
    guid: [u8; GUID_SIZE],
    offset: U32<LittleEndian>,
    length: U32<LittleEndian>,
}

const_assert_eq!(size_of::<RawCertTableEntry>(), CERT_TABLE_ENTRY_SIZE);

/// Locates one certificate inside the data pages of an extended report request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertTableHeaderEntry {
    /// Identifies which key the certificate belongs to, see [`CertType`].
    pub guid: Uuid,
    /// Offset of the certificate into the data pages.
    pub offset: u32,
    /// Length of the certificate within the data pages.
    pub length: u32,
}

fn entry_too_small(actual: usize) -> SizeError {
    SizeError::TooSmall {
        what: "cert table entry",
        actual,
        required: CERT_TABLE_ENTRY_SIZE,
    }
}

impl CertTableHeaderEntry {
    pub fn new(cert_type: CertType, offset: u32, length: u32) -> Self {
        Self {
            guid: cert_type.into(),
            offset,
            length,
        }
    }

    /// Decode an entry from the first [`CERT_TABLE_ENTRY_SIZE`] bytes of `data`.
    pub fn unmarshal(data: &[u8]) -> Result<Self, SizeError> {
        let raw = RawCertTableEntry::read_from_prefix(data).ok_or(entry_too_small(data.len()))?;
        Ok(Self {
            guid: Uuid::from_bytes(raw.guid),
            offset: raw.offset.get(),
            length: raw.length.get(),
        })
    }

    /// Encode this entry into the first [`CERT_TABLE_ENTRY_SIZE`] bytes of `data`.
    pub fn write(&self, data: &mut [u8]) -> Result<(), SizeError> {
        let raw = RawCertTableEntry {
            guid: *self.guid.as_bytes(),
            offset: U32::new(self.offset),
            length: U32::new(self.length),
        };
        let actual = data.len();
        raw.write_to_prefix(data).ok_or(entry_too_small(actual))
    }

    /// The all-zero entry that ends a certificate table.
    pub fn is_terminator(&self) -> bool {
        self.offset == 0 && self.length == 0 && find_non_zero(self.guid.as_bytes()).is_none()
    }

    pub fn cert_type(&self) -> CertType {
        self.guid.into()
    }

    /// The certificate bytes this entry points at inside `blob`.
    pub fn certificate<'a>(&self, blob: &'a [u8]) -> Result<&'a [u8], SizeError> {
        let start = self.offset as usize;
        let end = start.saturating_add(self.length as usize);
        blob.get(start..end).ok_or(SizeError::TooSmall {
            what: "certificate data",
            actual: blob.len(),
            required: end,
        })
    }
}

/// Interpret the data pages from an extended guest request for certificate
/// information.
///
/// The terminating entry is consumed but not returned. Every returned entry
/// points past the table itself; if any does not, no entries are returned.
pub fn parse_cert_table_header(certs: &[u8]) -> Result<Vec<CertTableHeaderEntry>, AbiError> {
    let mut entries = Vec::new();
    let mut header_size = 0;
    let mut rest = certs;
    loop {
        let entry = CertTableHeaderEntry::unmarshal(rest).map_err(|err| {
            tracing::debug!(index = header_size, "cert table ends without terminator");
            err
        })?;
        rest = rest.get(CERT_TABLE_ENTRY_SIZE..).unwrap_or_default();
        header_size += CERT_TABLE_ENTRY_SIZE;

        if entry.is_terminator() {
            break;
        }
        entries.push(entry);
    }

    for (index, entry) in entries.iter().enumerate() {
        if (entry.offset as usize) < header_size {
            return Err(FormatError::CertTableOffset {
                index,
                offset: entry.offset,
                header_size,
            }
            .into());
        }
    }
    tracing::debug!(entries = entries.len(), header_size, "parsed cert table header");
    Ok(entries)
}

/// Write `entries` followed by the terminating entry into `out`, returning the
/// number of header bytes written.
pub fn write_cert_table_header(
    entries: &[CertTableHeaderEntry],
    out: &mut [u8],
) -> Result<usize, AbiError> {
    let header_size = (entries.len() + 1) * CERT_TABLE_ENTRY_SIZE;
    if out.len() < header_size {
        return Err(SizeError::TooSmall {
            what: "cert table",
            actual: out.len(),
            required: header_size,
        }
        .into());
    }
    for (index, entry) in entries.iter().enumerate() {
        if (entry.offset as usize) < header_size {
            return Err(FormatError::CertTableOffset {
                index,
                offset: entry.offset,
                header_size,
            }
            .into());
        }
    }

    let terminator = CertTableHeaderEntry::default();
    for (chunk, entry) in out
        .chunks_mut(CERT_TABLE_ENTRY_SIZE)
        .zip(entries.iter().chain([&terminator]))
    {
        entry.write(chunk)?;
    }
    Ok(header_size)
}

/// Key usage of an AMD root signing key.
pub const KEY_USAGE_ARK: u32 = 0x00;
/// Key usage of an SEV signing key.
pub const KEY_USAGE_ASK: u32 = 0x13;

const ASK_CERT_HEADER_SIZE: usize = 0x40;
const ASK_VERSION: Field = Field::new("version", 0x00, 4);
const ASK_KEY_ID: Field = Field::new("key_id", 0x04, GUID_SIZE);
const ASK_CERTIFYING_ID: Field = Field::new("certifying_id", 0x14, GUID_SIZE);
const ASK_KEY_USAGE: Field = Field::new("key_usage", 0x24, 4);
const ASK_RESERVED: Field = Field::new("reserved", 0x28, 16);
const ASK_PUB_EXP_SIZE: Field = Field::new("pub_exp_size", 0x38, 4);
const ASK_MODULUS_SIZE: Field = Field::new("modulus_size", 0x3C, 4);

const_assert_eq!(ASK_MODULUS_SIZE.end(), ASK_CERT_HEADER_SIZE);

/// AMD signing key certificate in the SEV certificate format.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AskCert {
    pub version: u32,
    pub key_id: Uuid,
    /// Equals `key_id` if self-signed.
    pub certifying_id: Uuid,
    /// [`KEY_USAGE_ARK`] or [`KEY_USAGE_ASK`].
    pub key_usage: u32,
    /// Size of the public exponent in bits, 2048 or 4096.
    pub pub_exp_size: u32,
    /// Size of the modulus in bits, 2048 or 4096.
    pub modulus_size: u32,
    #[serde(with = "hex::serde")]
    pub pub_exp: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub modulus: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl AskCert {
    pub fn is_self_signed(&self) -> bool {
        self.key_id == self.certifying_id
    }
}

fn check_key_size(field: &'static str, size: u32) -> Result<(), FormatError> {
    if size != 2048 && size != 4096 {
        return Err(FormatError::KeySize { field, size });
    }
    Ok(())
}

/// Parse an AMD signing key certificate from the start of `data`.
///
/// Returns the certificate and the offset of the first byte after it, so a
/// sequence of concatenated certificates can be walked.
pub fn parse_ask_cert(data: &[u8]) -> Result<(AskCert, usize), AbiError> {
    if data.len() < ASK_CERT_HEADER_SIZE {
        return Err(SizeError::TooSmall {
            what: "AMD signing key",
            actual: data.len(),
            required: ASK_CERT_HEADER_SIZE,
        }
        .into());
    }
    let version = ASK_VERSION.read_u32(data)?;
    let key_id = Uuid::from_bytes(ASK_KEY_ID.read_array(data)?);
    let certifying_id = Uuid::from_bytes(ASK_CERTIFYING_ID.read_array(data)?);
    let key_usage = ASK_KEY_USAGE.read_u32(data)?;
    ASK_RESERVED.check_mbz(data)?;

    let pub_exp_size = ASK_PUB_EXP_SIZE.read_u32(data)?;
    check_key_size("public exponent", pub_exp_size)?;
    let modulus_size = ASK_MODULUS_SIZE.read_u32(data)?;
    check_key_size("modulus", modulus_size)?;

    // The signature is as long as the modulus.
    let pub_exp = Field::new("pub_exp", ASK_CERT_HEADER_SIZE, pub_exp_size as usize / 8);
    let modulus = Field::new("modulus", pub_exp.end(), modulus_size as usize / 8);
    let signature = Field::new("signature", modulus.end(), modulus.size);
    if data.len() < signature.end() {
        return Err(SizeError::TooSmall {
            what: "AMD signing key",
            actual: data.len(),
            required: signature.end(),
        }
        .into());
    }
    tracing::trace!(pub_exp_size, modulus_size, "parsed AMD signing key header");

    let cert = AskCert {
        version,
        key_id,
        certifying_id,
        key_usage,
        pub_exp_size,
        modulus_size,
        pub_exp: pub_exp.read_bytes(data)?,
        modulus: modulus.read_bytes(data)?,
        signature: signature.read_bytes(data)?,
    };
    Ok((cert, signature.end()))
}

/// Parse a buffer holding back-to-back AMD signing key certificates, e.g. an
/// ASK followed by its ARK.
pub fn parse_ask_certs(data: &[u8]) -> Result<Vec<AskCert>, AbiError> {
    let mut certs = Vec::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (cert, consumed) = parse_ask_cert(rest)?;
        certs.push(cert);
        rest = rest.get(consumed..).unwrap_or_default();
    }
    Ok(certs)
}
