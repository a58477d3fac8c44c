// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Access to the signature of a raw attestation report.
//!
//! The firmware stores the ECDSA-P384-SHA384 signature as two 72-byte
//! little-endian integers. X.509 tooling expects a DER `ECDSA-Sig-Value`, so
//! with the `verifier` feature this module converts between the two.

use crate::error::SizeError;
use crate::report::{SIGNATURE, SIGNATURE_ALGO};
#[cfg(feature = "verifier")]
use crate::{
    error::{AbiError, FormatError, ValueError},
    report::{ECDSA_R, ECDSA_S, REPORT_SIZE, SIGN_ECDSA_P384_SHA384},
};
#[cfg(feature = "verifier")]
use openssl::{
    bn::{BigNum, BigNumRef},
    ecdsa::EcdsaSig,
    error::ErrorStack,
};

/// Read the signature algorithm of a raw report. No validation is done on
/// the value.
pub fn signature_algo(report: &[u8]) -> Result<u32, SizeError> {
    SIGNATURE_ALGO.read_u32(report)
}

/// The bytes of the report covered by the AMD-SP signature: everything
/// preceding the signature field.
pub fn signed_component(report: &[u8]) -> Result<&[u8], SizeError> {
    report.get(..SIGNATURE.offset).ok_or(SizeError::TooSmall {
        what: "attestation report",
        actual: report.len(),
        required: SIGNATURE.offset,
    })
}

#[cfg(feature = "verifier")]
fn check_exact_size(report: &[u8]) -> Result<(), SizeError> {
    if report.len() != REPORT_SIZE {
        return Err(SizeError::Mismatch {
            what: "attestation report",
            actual: report.len(),
            expected: REPORT_SIZE,
        });
    }
    Ok(())
}

/// Interpret an AMD little-endian integer.
#[cfg(feature = "verifier")]
pub fn amd_big_int(bytes: &[u8]) -> Result<BigNum, ErrorStack> {
    let mut be = bytes.to_vec();
    be.reverse();
    BigNum::from_slice(&be)
}

#[cfg(feature = "verifier")]
fn big_int_to_amd_rs(component: &'static str, value: &BigNumRef) -> Result<Vec<u8>, AbiError> {
    let width = ECDSA_R.size;
    let actual = usize::try_from(value.num_bytes()).unwrap_or(0);
    if actual > width {
        return Err(ValueError::BigIntTooLarge {
            component,
            actual,
            max: width,
        }
        .into());
    }
    let mut le = value.to_vec_padded(width as i32)?;
    le.reverse();
    Ok(le)
}

/// The report's R and S components as an openssl signature.
#[cfg(feature = "verifier")]
pub fn report_to_ecdsa_sig(report: &[u8]) -> Result<EcdsaSig, AbiError> {
    check_exact_size(report)?;
    let algo = signature_algo(report)?;
    if algo != SIGN_ECDSA_P384_SHA384 {
        return Err(FormatError::UnknownSignatureAlgo(algo).into());
    }
    let r = amd_big_int(ECDSA_R.slice(report)?)?;
    let s = amd_big_int(ECDSA_S.slice(report)?)?;
    Ok(EcdsaSig::from_private_components(r, s)?)
}

/// The report's signature as a DER encoded `SEQUENCE { r INTEGER, s INTEGER }`,
/// for use in x509 verification.
#[cfg(feature = "verifier")]
pub fn report_to_signature_der(report: &[u8]) -> Result<Vec<u8>, AbiError> {
    let sig = report_to_ecdsa_sig(report)?;
    Ok(sig.to_der()?)
}

/// Overwrite the R and S components of a raw report's signature. Useful for
/// producing test fixtures.
#[cfg(feature = "verifier")]
pub fn set_signature(r: &BigNumRef, s: &BigNumRef, report: &mut [u8]) -> Result<(), AbiError> {
    check_exact_size(report)?;
    let r = big_int_to_amd_rs("r", r)?;
    let s = big_int_to_amd_rs("s", s)?;
    ECDSA_R.write_bytes(report, &r)?;
    ECDSA_S.write_bytes(report, &s)?;
    Ok(())
}
