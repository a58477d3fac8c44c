// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//!  This library translates between the little-endian ABI structures of AMD SEV-SNP guest attestation and their structured Rust representation. It covers the guest policy bitmask, the 0x4A0 byte attestation report, the report's ECDSA-P384 signature and the certificate structures that accompany an extended report.
//!
//!  Parsing is strict: every reserved range must be zero, and errors name the offending offsets.
//!
//!  # Report Signature
//!
//!  The following code parses a raw report, decodes its guest policy and converts its signature to DER, so it can be checked against a VCEK with regular X.509 tooling.
//!
//!  #
//!  ```no_run
//!  use snp_abi::report::parse_report;
//!  use snp_abi::signature::{report_to_signature_der, signed_component};
//!  use std::error::Error;
//!
//!  fn main() -> Result<(), Box<dyn Error>> {
//!    let bytes = std::fs::read("report.bin")?;
//!    let report = parse_report(&bytes)?;
//!    let policy = report.guest_policy()?;
//!    println!("debug allowed: {}", policy.debug);
//!
//!    let message = signed_component(&bytes)?;
//!    let der = report_to_signature_der(&bytes)?;
//!    println!("{} signed bytes, signature {}", message.len(), hex::encode(der));
//!
//!    Ok(())
//!  }
//!  ```

pub mod certs;
pub mod error;
pub mod layout;
pub mod policy;
pub mod report;
pub mod signature;

pub use error::AbiError;
pub use policy::SnpPolicy;
pub use report::Report;
