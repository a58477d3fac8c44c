// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Layout is based on "SEV Secure Nested Paging Firmware ABI Specification",
// Table 21: ATTESTATION_REPORT Structure.

use crate::error::{AbiError, FormatError, SizeError, ValueError};
use crate::layout::{is_contiguous, Field};
use crate::policy::{parse_snp_policy, PolicyError, SnpPolicy};
use crate::signature::signature_algo;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use std::convert::TryFrom;

/// SNP API value for the AES-256-GCM encryption algorithm.
pub const AEAD_AES_256_GCM: u32 = 1;
/// SNP API value for the ECDSA P-384 with SHA-384 signing algorithm.
pub const SIGN_ECDSA_P384_SHA384: u32 = 1;
/// SNP API value for the P-384 curve identifier.
pub const ECC_P384: u32 = 2;
/// ABI size of an attestation report.
pub const REPORT_SIZE: usize = 0x4A0;
/// Report version produced by firmware implementing the SNP ABI this crate targets.
pub const EXPECTED_REPORT_VERSION: u32 = 2;

const ECDSA_RS_SIZE: usize = 72;
/// Length of the R and S components of an ECDSA-P384-SHA384 signature.
pub const ECDSA_P384_SHA384_SIGNATURE_SIZE: usize = ECDSA_RS_SIZE * 2;

const VERSION: Field = Field::new("version", 0x00, 4);
const GUEST_SVN: Field = Field::new("guest_svn", 0x04, 4);
pub(crate) const POLICY: Field = Field::new("policy", 0x08, 8);
const FAMILY_ID: Field = Field::new("family_id", 0x10, 16);
const IMAGE_ID: Field = Field::new("image_id", 0x20, 16);
const VMPL: Field = Field::new("vmpl", 0x30, 4);
pub(crate) const SIGNATURE_ALGO: Field = Field::new("signature_algo", 0x34, 4);
const CURRENT_TCB: Field = Field::new("current_tcb", 0x38, 8);
const PLATFORM_INFO: Field = Field::new("platform_info", 0x40, 8);
// Only bit 0 is AUTHOR_KEY_EN, the rest of the word is reserved.
const AUTHOR_KEY_EN: Field = Field::new("author_key_en", 0x48, 4);
const RESERVED_0: Field = Field::new("reserved", 0x4C, 4);
const REPORT_DATA: Field = Field::new("report_data", 0x50, 64);
const MEASUREMENT: Field = Field::new("measurement", 0x90, 48);
const HOST_DATA: Field = Field::new("host_data", 0xC0, 32);
const ID_KEY_DIGEST: Field = Field::new("id_key_digest", 0xE0, 48);
const AUTHOR_KEY_DIGEST: Field = Field::new("author_key_digest", 0x110, 48);
const REPORT_ID: Field = Field::new("report_id", 0x140, 32);
const REPORT_ID_MA: Field = Field::new("report_id_ma", 0x160, 32);
const REPORTED_TCB: Field = Field::new("reported_tcb", 0x180, 8);
const RESERVED_1: Field = Field::new("reserved", 0x188, 24);
const CHIP_ID: Field = Field::new("chip_id", 0x1A0, 64);
const COMMITTED_TCB: Field = Field::new("committed_tcb", 0x1E0, 8);
const CURRENT_BUILD: Field = Field::new("current_build", 0x1E8, 1);
const CURRENT_MINOR: Field = Field::new("current_minor", 0x1E9, 1);
const CURRENT_MAJOR: Field = Field::new("current_major", 0x1EA, 1);
const RESERVED_2: Field = Field::new("reserved", 0x1EB, 1);
const COMMITTED_BUILD: Field = Field::new("committed_build", 0x1EC, 1);
const COMMITTED_MINOR: Field = Field::new("committed_minor", 0x1ED, 1);
const COMMITTED_MAJOR: Field = Field::new("committed_major", 0x1EE, 1);
const RESERVED_3: Field = Field::new("reserved", 0x1EF, 1);
const LAUNCH_TCB: Field = Field::new("launch_tcb", 0x1F0, 8);
const RESERVED_4: Field = Field::new("reserved", 0x1F8, 168);
pub(crate) const SIGNATURE: Field = Field::new("signature", 0x2A0, 512);

const REPORT_LAYOUT: [Field; 33] = [
    VERSION,
    GUEST_SVN,
    POLICY,
    FAMILY_ID,
    IMAGE_ID,
    VMPL,
    SIGNATURE_ALGO,
    CURRENT_TCB,
    PLATFORM_INFO,
    AUTHOR_KEY_EN,
    RESERVED_0,
    REPORT_DATA,
    MEASUREMENT,
    HOST_DATA,
    ID_KEY_DIGEST,
    AUTHOR_KEY_DIGEST,
    REPORT_ID,
    REPORT_ID_MA,
    REPORTED_TCB,
    RESERVED_1,
    CHIP_ID,
    COMMITTED_TCB,
    CURRENT_BUILD,
    CURRENT_MINOR,
    CURRENT_MAJOR,
    RESERVED_2,
    COMMITTED_BUILD,
    COMMITTED_MINOR,
    COMMITTED_MAJOR,
    RESERVED_3,
    LAUNCH_TCB,
    RESERVED_4,
    SIGNATURE,
];
const_assert!(is_contiguous(&REPORT_LAYOUT, REPORT_SIZE));

// ECDSA-P384-SHA384 view of the signature field, in report offsets.
pub(crate) const ECDSA_R: Field = Field::new("signature_r", SIGNATURE.offset, ECDSA_RS_SIZE);
pub(crate) const ECDSA_S: Field = Field::new("signature_s", ECDSA_R.end(), ECDSA_RS_SIZE);
const ECDSA_RESERVED: Field = Field::new(
    "reserved",
    ECDSA_S.end(),
    SIGNATURE.size - ECDSA_P384_SHA384_SIGNATURE_SIZE,
);
const_assert!(ECDSA_R.offset + ECDSA_P384_SHA384_SIGNATURE_SIZE == ECDSA_RESERVED.offset);
const_assert!(ECDSA_RESERVED.end() == REPORT_SIZE);

/// Structured view of an SEV-SNP attestation report.
///
/// Byte fields are owned copies of the ABI bytes and are hex encoded when
/// serialized with serde.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub guest_svn: u32,
    /// Raw guest policy bitmask, see [`Report::guest_policy`].
    pub policy: u64,
    #[serde(with = "hex::serde")]
    pub family_id: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub image_id: Vec<u8>,
    pub vmpl: u32,
    pub signature_algo: u32,
    pub current_tcb: u64,
    pub platform_info: u64,
    pub author_key_en: bool,
    #[serde(with = "hex::serde")]
    pub report_data: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub measurement: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub host_data: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub id_key_digest: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub author_key_digest: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub report_id: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub report_id_ma: Vec<u8>,
    pub reported_tcb: u64,
    #[serde(with = "hex::serde")]
    pub chip_id: Vec<u8>,
    pub committed_tcb: u64,
    pub current_build: u32,
    pub current_minor: u32,
    pub current_major: u32,
    pub committed_build: u32,
    pub committed_minor: u32,
    pub committed_major: u32,
    pub launch_tcb: u64,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

/// All integers zero, all byte fields zero-filled to their ABI width.
impl Default for Report {
    fn default() -> Self {
        let zeroed = |field: Field| vec![0u8; field.size];
        Self {
            version: 0,
            guest_svn: 0,
            policy: 0,
            family_id: zeroed(FAMILY_ID),
            image_id: zeroed(IMAGE_ID),
            vmpl: 0,
            signature_algo: 0,
            current_tcb: 0,
            platform_info: 0,
            author_key_en: false,
            report_data: zeroed(REPORT_DATA),
            measurement: zeroed(MEASUREMENT),
            host_data: zeroed(HOST_DATA),
            id_key_digest: zeroed(ID_KEY_DIGEST),
            author_key_digest: zeroed(AUTHOR_KEY_DIGEST),
            report_id: zeroed(REPORT_ID),
            report_id_ma: zeroed(REPORT_ID_MA),
            reported_tcb: 0,
            chip_id: zeroed(CHIP_ID),
            committed_tcb: 0,
            current_build: 0,
            current_minor: 0,
            current_major: 0,
            committed_build: 0,
            committed_minor: 0,
            committed_major: 0,
            launch_tcb: 0,
            signature: zeroed(SIGNATURE),
        }
    }
}

fn check_report_len(data: &[u8]) -> Result<(), SizeError> {
    if data.len() < REPORT_SIZE {
        return Err(SizeError::TooSmall {
            what: "attestation report",
            actual: data.len(),
            required: REPORT_SIZE,
        });
    }
    Ok(())
}

/// Parse a little-endian SEV-SNP attestation report.
///
/// Every reserved range is checked to be zero. Bytes past [`REPORT_SIZE`]
/// are ignored.
pub fn parse_report(data: &[u8]) -> Result<Report, AbiError> {
    check_report_len(data)?;

    let policy = POLICY.read_u64(data)?;
    parse_snp_policy(policy)?;

    let reserved_author = AUTHOR_KEY_EN.read_u32(data)?;
    if reserved_author & !1 != 0 {
        return Err(FormatError::MbzBits {
            offset: AUTHOR_KEY_EN.offset,
            bits: reserved_author & !1,
        }
        .into());
    }
    for reserved in [RESERVED_0, RESERVED_1, RESERVED_2, RESERVED_3, RESERVED_4] {
        reserved.check_mbz(data)?;
    }
    let signature_algo = signature_algo(data)?;
    if signature_algo == SIGN_ECDSA_P384_SHA384 {
        ECDSA_RESERVED.check_mbz(data)?;
    }

    Ok(Report {
        version: VERSION.read_u32(data)?,
        guest_svn: GUEST_SVN.read_u32(data)?,
        policy,
        family_id: FAMILY_ID.read_bytes(data)?,
        image_id: IMAGE_ID.read_bytes(data)?,
        vmpl: VMPL.read_u32(data)?,
        signature_algo,
        current_tcb: CURRENT_TCB.read_u64(data)?,
        platform_info: PLATFORM_INFO.read_u64(data)?,
        author_key_en: reserved_author & 1 == 1,
        report_data: REPORT_DATA.read_bytes(data)?,
        measurement: MEASUREMENT.read_bytes(data)?,
        host_data: HOST_DATA.read_bytes(data)?,
        id_key_digest: ID_KEY_DIGEST.read_bytes(data)?,
        author_key_digest: AUTHOR_KEY_DIGEST.read_bytes(data)?,
        report_id: REPORT_ID.read_bytes(data)?,
        report_id_ma: REPORT_ID_MA.read_bytes(data)?,
        reported_tcb: REPORTED_TCB.read_u64(data)?,
        chip_id: CHIP_ID.read_bytes(data)?,
        committed_tcb: COMMITTED_TCB.read_u64(data)?,
        current_build: CURRENT_BUILD.read_u8(data)?.into(),
        current_minor: CURRENT_MINOR.read_u8(data)?.into(),
        current_major: CURRENT_MAJOR.read_u8(data)?.into(),
        committed_build: COMMITTED_BUILD.read_u8(data)?.into(),
        committed_minor: COMMITTED_MINOR.read_u8(data)?.into(),
        committed_major: COMMITTED_MAJOR.read_u8(data)?.into(),
        launch_tcb: LAUNCH_TCB.read_u64(data)?,
        signature: SIGNATURE.read_bytes(data)?,
    })
}

/// Check the version and guest policy of a raw report without decoding the
/// rest of it.
pub fn validate_report_format(data: &[u8]) -> Result<(), AbiError> {
    check_report_len(data)?;

    let version = VERSION.read_u32(data)?;
    if version != EXPECTED_REPORT_VERSION {
        return Err(FormatError::ReportVersion {
            got: version,
            want: EXPECTED_REPORT_VERSION,
        }
        .into());
    }
    parse_snp_policy(POLICY.read_u64(data)?)?;
    Ok(())
}

fn to_byte(field: Field, value: u32) -> Result<u8, ValueError> {
    u8::try_from(value).map_err(|_| ValueError::ByteOverflow {
        field: field.name,
        value,
    })
}

impl Report {
    /// Decode the embedded guest policy.
    pub fn guest_policy(&self) -> Result<SnpPolicy, PolicyError> {
        parse_snp_policy(self.policy)
    }

    fn byte_fields(&self) -> [(Field, &[u8]); 11] {
        [
            (FAMILY_ID, self.family_id.as_slice()),
            (IMAGE_ID, self.image_id.as_slice()),
            (REPORT_DATA, self.report_data.as_slice()),
            (MEASUREMENT, self.measurement.as_slice()),
            (HOST_DATA, self.host_data.as_slice()),
            (ID_KEY_DIGEST, self.id_key_digest.as_slice()),
            (AUTHOR_KEY_DIGEST, self.author_key_digest.as_slice()),
            (REPORT_ID, self.report_id.as_slice()),
            (REPORT_ID_MA, self.report_id_ma.as_slice()),
            (CHIP_ID, self.chip_id.as_slice()),
            (SIGNATURE, self.signature.as_slice()),
        ]
    }

    fn version_bytes(&self) -> Result<[(Field, u8); 6], ValueError> {
        Ok([
            (CURRENT_BUILD, to_byte(CURRENT_BUILD, self.current_build)?),
            (CURRENT_MINOR, to_byte(CURRENT_MINOR, self.current_minor)?),
            (CURRENT_MAJOR, to_byte(CURRENT_MAJOR, self.current_major)?),
            (COMMITTED_BUILD, to_byte(COMMITTED_BUILD, self.committed_build)?),
            (COMMITTED_MINOR, to_byte(COMMITTED_MINOR, self.committed_minor)?),
            (COMMITTED_MAJOR, to_byte(COMMITTED_MAJOR, self.committed_major)?),
        ])
    }

    /// Serialize into the first [`REPORT_SIZE`] bytes of `out`.
    ///
    /// All field checks happen before `out` is touched. The reserved ranges
    /// are zeroed, so any previous contents of `out` are overwritten.
    pub fn write_abi(&self, out: &mut [u8]) -> Result<(), AbiError> {
        let byte_fields = self.byte_fields();
        for (field, value) in byte_fields {
            field.check_len(value)?;
        }
        let version_bytes = self.version_bytes()?;

        check_report_len(out)?;
        let out = &mut out[..REPORT_SIZE];
        out.fill(0);

        VERSION.write_u32(out, self.version)?;
        GUEST_SVN.write_u32(out, self.guest_svn)?;
        POLICY.write_u64(out, self.policy)?;
        VMPL.write_u32(out, self.vmpl)?;
        SIGNATURE_ALGO.write_u32(out, self.signature_algo)?;
        CURRENT_TCB.write_u64(out, self.current_tcb)?;
        PLATFORM_INFO.write_u64(out, self.platform_info)?;
        AUTHOR_KEY_EN.write_u32(out, u32::from(self.author_key_en))?;
        REPORTED_TCB.write_u64(out, self.reported_tcb)?;
        COMMITTED_TCB.write_u64(out, self.committed_tcb)?;
        LAUNCH_TCB.write_u64(out, self.launch_tcb)?;
        for (field, value) in byte_fields {
            field.write_bytes(out, value)?;
        }
        for (field, value) in version_bytes {
            field.write_u8(out, value)?;
        }
        Ok(())
    }

    /// Translate the report back into its little-endian ABI format.
    pub fn to_abi_bytes(&self) -> Result<Vec<u8>, AbiError> {
        let mut data = vec![0u8; REPORT_SIZE];
        self.write_abi(&mut data)?;
        Ok(data)
    }
}

impl TryFrom<&[u8]> for Report {
    type Error = AbiError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_report(bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn empty_report() -> Report {
        let mut report = Report {
            version: 2,
            policy: 0xa0000,
            signature_algo: SIGN_ECDSA_P384_SHA384,
            ..Default::default()
        };
        report.report_data[63] = 1;
        report
    }

    fn sample_report() -> Report {
        let fill = |len: usize, seed: u8| -> Vec<u8> {
            (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
        };
        let mut signature = vec![0u8; 512];
        signature[..144].copy_from_slice(&fill(144, 0x90));
        Report {
            version: 2,
            guest_svn: 7,
            policy: 0x1f_0302,
            family_id: fill(16, 0x10),
            image_id: fill(16, 0x20),
            vmpl: 3,
            signature_algo: SIGN_ECDSA_P384_SHA384,
            current_tcb: 0x0311_0000_0000_0203,
            platform_info: 3,
            author_key_en: true,
            report_data: fill(64, 0x50),
            measurement: fill(48, 0x60),
            host_data: fill(32, 0x70),
            id_key_digest: fill(48, 0x80),
            author_key_digest: fill(48, 0xa0),
            report_id: fill(32, 0xb0),
            report_id_ma: fill(32, 0xc0),
            reported_tcb: 0x0a00_0000_0000_0001,
            chip_id: fill(64, 0xd0),
            committed_tcb: 0x0b00_0000_0000_0002,
            current_build: 4,
            current_minor: 52,
            current_major: 1,
            committed_build: 3,
            committed_minor: 51,
            committed_major: 255,
            launch_tcb: 0x0c00_0000_0000_0003,
            signature,
        }
    }

    #[test]
    fn test_report_round_trip() {
        let report = sample_report();
        let bytes = report.to_abi_bytes().unwrap();
        assert_eq!(bytes.len(), REPORT_SIZE);
        assert_eq!(parse_report(&bytes).unwrap(), report);

        let report = empty_report();
        let bytes = report.to_abi_bytes().unwrap();
        assert_eq!(Report::try_from(&bytes[..]).unwrap(), report);
    }

    #[test]
    fn test_report_offsets() {
        let bytes = sample_report().to_abi_bytes().unwrap();
        assert_eq!(bytes[0x00..0x04], [2, 0, 0, 0]);
        assert_eq!(bytes[0x08..0x10], [0x02, 0x03, 0x1f, 0, 0, 0, 0, 0]);
        assert_eq!(bytes[0x10], 0x10);
        assert_eq!(bytes[0x30], 3);
        assert_eq!(bytes[0x34], 1);
        assert_eq!(bytes[0x48..0x4C], [1, 0, 0, 0]);
        assert_eq!(bytes[0x50], 0x50);
        assert_eq!(bytes[0x1A0], 0xd0);
        assert_eq!(bytes[0x1E8..0x1F0], [4, 52, 1, 0, 3, 51, 255, 0]);
        assert_eq!(bytes[0x2A0], 0x90);
        assert!(bytes[0x330..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_report_mbz() {
        let tests: [(&str, usize, u8, &str); 9] = [
            (
                "AuthorKeyEn reserved",
                0x49,
                0xcc,
                "mbz bits at offset 0x48 not zero: 0x0000cc00",
            ),
            (
                "pre-report data",
                0x4f,
                0xcc,
                "mbz range [0x4c:0x50] not all zero: 000000cc",
            ),
            (
                "pre-chip id",
                0x18A,
                0xcc,
                "mbz range [0x188:0x1a0] not all zero: 0000cc",
            ),
            (
                "current reserved",
                0x1EB,
                0xcc,
                "mbz range [0x1eb:0x1ec] not all zero: cc",
            ),
            (
                "committed reserved",
                0x1EF,
                0xcc,
                "mbz range [0x1ef:0x1f0] not all zero: cc",
            ),
            (
                "pre-signature reserved",
                0x1f9,
                0xcc,
                "mbz range [0x1f8:0x2a0] not all zero: 00cc",
            ),
            (
                "post-ecdsa signature reserved",
                0x2A0 + ECDSA_P384_SHA384_SIGNATURE_SIZE + 2,
                0xcc,
                "mbz range [0x330:0x4a0] not all zero: 0000cc",
            ),
            (
                "Guest policy bit 17",
                POLICY.offset + 2,
                0x1d,
                "malformed guest policy: policy[17] is reserved, must be 1, got 0",
            ),
            (
                "Guest policy bit 21",
                POLICY.offset + 2,
                0x22,
                "malformed guest policy: policy[63:21] are reserved mbz, got 0x220000",
            ),
        ];

        let raw = empty_report().to_abi_bytes().unwrap();
        for (name, index, value, want) in tests {
            let mut raw = raw.clone();
            raw[index] = value;
            let err = parse_report(&raw).unwrap_err();
            assert!(
                matches!(err, AbiError::Format(_)),
                "{name}: expected format error, got {err:?}"
            );
            assert!(
                err.to_string().starts_with(want),
                "{name}: got {err}, want {want}"
            );
        }
    }

    #[test]
    fn test_mbz_error_names_range() {
        let mut raw = empty_report().to_abi_bytes().unwrap();
        raw[0x2A0 + ECDSA_P384_SHA384_SIGNATURE_SIZE] = 1;
        let err = parse_report(&raw).unwrap_err();
        let AbiError::Format(FormatError::Mbz { lo, hi, contents }) = err else {
            panic!("expected mbz error, got {err:?}");
        };
        assert_eq!((lo, hi), (0x330, 0x4A0));
        assert_eq!(contents.len(), 2 * (0x4A0 - 0x330));
    }

    #[test]
    fn test_unknown_algo_keeps_signature_tail() {
        let mut report = empty_report();
        report.signature_algo = 0;
        report.signature[511] = 0xff;
        let bytes = report.to_abi_bytes().unwrap();
        assert_eq!(parse_report(&bytes).unwrap(), report);
    }

    #[test]
    fn test_parse_too_small() {
        let bytes = empty_report().to_abi_bytes().unwrap();
        let err = parse_report(&bytes[..REPORT_SIZE - 1]).unwrap_err();
        assert!(matches!(
            err,
            AbiError::Size(SizeError::TooSmall {
                actual: 0x49F,
                required: REPORT_SIZE,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_ignores_trailing_bytes() {
        let mut bytes = empty_report().to_abi_bytes().unwrap();
        bytes.extend_from_slice(&[0xcc; 16]);
        assert_eq!(parse_report(&bytes).unwrap(), empty_report());
    }

    #[test]
    fn test_serialize_field_lengths() {
        let mut report = empty_report();
        report.image_id.push(0);
        let err = report.to_abi_bytes().unwrap_err();
        assert_eq!(err.to_string(), "image_id length is 17, expect 16");

        let mut report = empty_report();
        report.signature.clear();
        let err = report.to_abi_bytes().unwrap_err();
        assert!(matches!(
            err,
            AbiError::Size(SizeError::Mismatch {
                what: "signature",
                actual: 0,
                expected: 512
            })
        ));
    }

    #[test]
    fn test_serialize_version_bytes() {
        let mut report = empty_report();
        report.committed_major = 256;
        let err = report.to_abi_bytes().unwrap_err();
        assert!(matches!(
            err,
            AbiError::Value(ValueError::ByteOverflow {
                field: "committed_major",
                value: 256
            })
        ));
        assert_eq!(
            err.to_string(),
            "committed_major field must fit in a byte, got 256"
        );
    }

    #[test]
    fn test_write_abi_is_all_or_nothing() {
        let mut out = vec![0xaa; REPORT_SIZE];
        let mut report = sample_report();
        report.current_build = 1000;
        assert!(report.write_abi(&mut out).is_err());
        assert!(out.iter().all(|&b| b == 0xaa));

        let mut report = sample_report();
        report.chip_id.truncate(10);
        assert!(report.write_abi(&mut out).is_err());
        assert!(out.iter().all(|&b| b == 0xaa));
    }

    #[test]
    fn test_write_abi_in_place() {
        let mut out = vec![0xaa; REPORT_SIZE + 4];
        let report = sample_report();
        report.write_abi(&mut out).unwrap();
        assert_eq!(out[REPORT_SIZE..], [0xaa; 4]);
        assert_eq!(out[..REPORT_SIZE], report.to_abi_bytes().unwrap()[..]);

        let err = report.write_abi(&mut [0u8; 16]).unwrap_err();
        assert!(matches!(err, AbiError::Size(SizeError::TooSmall { .. })));
    }

    #[test]
    fn test_guest_policy() {
        let policy = sample_report().guest_policy().unwrap();
        assert_eq!((policy.abi_major, policy.abi_minor), (3, 2));
        assert!(policy.smt && policy.debug);
    }

    #[test]
    fn test_validate_report_format() {
        let mut bytes = empty_report().to_abi_bytes().unwrap();
        validate_report_format(&bytes).unwrap();

        VERSION.write_u32(&mut bytes, 3).unwrap();
        let err = validate_report_format(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "report version is: 3. Expected 2");

        let err = validate_report_format(&bytes[..0x100]).unwrap_err();
        assert!(matches!(err, AbiError::Size(_)));
    }

    #[test]
    fn test_report_json() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"family_id\":\"101112131415161718191a1b1c1d1e1f\""));
        let decoded: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, report);
    }
}
