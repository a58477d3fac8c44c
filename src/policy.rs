// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

const POLICY_SMT_BIT: u32 = 16;
const POLICY_RESERVED_1_BIT: u32 = 17;
const POLICY_MIGRATE_MA_BIT: u32 = 18;
const POLICY_DEBUG_BIT: u32 = 19;
const POLICY_SINGLE_SOCKET_BIT: u32 = 20;
const POLICY_VALID_MASK: u64 = (1 << 21) - 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy[{0}] is reserved, must be 1, got 0")]
    ReservedOne(u32),
    #[error("policy[63:21] are reserved mbz, got {0:#x}")]
    ReservedMbz(u64),
}

/// The guest policy that governs the VM's behavior from launch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnpPolicy {
    /// Minor component of the minimum SNP ABI version the guest needs.
    pub abi_minor: u8,
    /// Major component of the minimum SNP ABI version the guest needs.
    pub abi_major: u8,
    /// Symmetric multithreading is allowed.
    pub smt: bool,
    /// The guest may be associated with a migration agent.
    pub migrate_ma: bool,
    /// The host may decrypt the guest for debugging.
    pub debug: bool,
    /// The guest may only be active on a single socket.
    pub single_socket: bool,
}

fn bit(policy: u64, bit: u32) -> bool {
    policy & (1u64 << bit) != 0
}

/// Interpret the SNP API guest policy bitmask.
pub fn parse_snp_policy(guest_policy: u64) -> Result<SnpPolicy, PolicyError> {
    if !bit(guest_policy, POLICY_RESERVED_1_BIT) {
        return Err(PolicyError::ReservedOne(POLICY_RESERVED_1_BIT));
    }
    if guest_policy & !POLICY_VALID_MASK != 0 {
        return Err(PolicyError::ReservedMbz(guest_policy));
    }
    Ok(SnpPolicy {
        abi_minor: (guest_policy & 0xff) as u8,
        abi_major: ((guest_policy >> 8) & 0xff) as u8,
        smt: bit(guest_policy, POLICY_SMT_BIT),
        migrate_ma: bit(guest_policy, POLICY_MIGRATE_MA_BIT),
        debug: bit(guest_policy, POLICY_DEBUG_BIT),
        single_socket: bit(guest_policy, POLICY_SINGLE_SOCKET_BIT),
    })
}

/// Encode a policy into its ABI bitmask. The reserved-one bit is always set.
pub fn snp_policy_to_bitmask(policy: SnpPolicy) -> u64 {
    let mut result = u64::from(policy.abi_minor)
        | u64::from(policy.abi_major) << 8
        | 1u64 << POLICY_RESERVED_1_BIT;
    let flags = [
        (policy.smt, POLICY_SMT_BIT),
        (policy.migrate_ma, POLICY_MIGRATE_MA_BIT),
        (policy.debug, POLICY_DEBUG_BIT),
        (policy.single_socket, POLICY_SINGLE_SOCKET_BIT),
    ];
    for (set, bit) in flags {
        if set {
            result |= 1u64 << bit;
        }
    }
    result
}

impl TryFrom<u64> for SnpPolicy {
    type Error = PolicyError;

    fn try_from(guest_policy: u64) -> Result<Self, Self::Error> {
        parse_snp_policy(guest_policy)
    }
}

impl From<SnpPolicy> for u64 {
    fn from(policy: SnpPolicy) -> Self {
        snp_policy_to_bitmask(policy)
    }
}
