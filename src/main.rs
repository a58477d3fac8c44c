// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use clap::Parser;
use snp_abi::report::{parse_report, validate_report_format, Report};
use snp_abi::{certs, signature};
use std::error::Error;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand)]
enum Action {
    /// Parse and validate a raw attestation report
    Report {
        /// Raw unmodified report bytes
        #[arg(short, long)]
        file: PathBuf,

        /// Print the report to stdout
        #[arg(short, long)]
        print: bool,
    },
    /// Print the DER encoded signature of a raw attestation report
    Signature {
        /// Raw unmodified report bytes
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Encode a JSON report into its binary ABI format
    Encode {
        /// Report in the JSON format printed by `report --print`
        #[arg(short, long)]
        json: PathBuf,

        /// Output file for the raw report
        #[arg(short, long)]
        out: PathBuf,
    },
    /// List the entries of a certificate table
    CertTable {
        /// Data pages returned by an extended report request
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Parse AMD signing keys in the SEV certificate format
    AskCerts {
        /// One or more concatenated certificates
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    match args.action {
        Action::Report { file, print } => {
            let bytes = read_file(&file)?;
            validate_report_format(&bytes)?;
            let report = parse_report(&bytes)?;
            let policy = report.guest_policy()?;
            tracing::info!(version = report.version, vmpl = report.vmpl, "parsed report");

            if print {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("report ok, policy: {:?}", policy);
            }
        }
        Action::Signature { file } => {
            let bytes = read_file(&file)?;
            let der = signature::report_to_signature_der(&bytes)?;
            println!("{}", hex::encode(der));
        }
        Action::Encode { json, out } => {
            let report: Report = serde_json::from_slice(&read_file(&json)?)?;
            let bytes = report.to_abi_bytes()?;
            std::fs::write(&out, bytes)?;
            tracing::info!(path = %out.display(), "wrote report");
        }
        Action::CertTable { file } => {
            let bytes = read_file(&file)?;
            for entry in certs::parse_cert_table_header(&bytes)? {
                let cert = entry.certificate(&bytes)?;
                println!(
                    "{:?} {} offset={:#x} length={:#x} available={}",
                    entry.cert_type(),
                    entry.guid,
                    entry.offset,
                    entry.length,
                    cert.len()
                );
            }
        }
        Action::AskCerts { file } => {
            let bytes = read_file(&file)?;
            for cert in certs::parse_ask_certs(&bytes)? {
                println!(
                    "key_id={} certifying_id={} usage={:#x} modulus={}b self_signed={}",
                    cert.key_id,
                    cert.certifying_id,
                    cert.key_usage,
                    cert.modulus_size,
                    cert.is_self_signed()
                );
            }
        }
    }

    Ok(())
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>, std::io::Error> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
