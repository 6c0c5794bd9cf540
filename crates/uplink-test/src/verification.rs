//! Verification helpers for selection results
//!
//! Provides assertion helpers over a [`DeviceNetworkStatus`] that report
//! mismatches as errors instead of panicking, so scenarios can chain them
//! with `?`.

use thiserror::Error;
use uplink_types::IpAddress;
use uplinkmgr::port::{
    list_mgmt_ports, reverse_lookup_port, select_address, AddressFilter, CostFilter,
    DeviceNetworkStatus,
};
use uplinkmgr::UplinkError;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Uplink error: {0}")]
    Uplink(#[from] UplinkError),

    #[error("Expected management ports {expected:?}, got {actual:?}")]
    PortsMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Pick {pick} selected {actual}, expected {expected}")]
    AddressMismatch {
        pick: usize,
        expected: IpAddress,
        actual: IpAddress,
    },

    #[error("Expected no eligible address, got {actual}")]
    UnexpectedAddress { actual: IpAddress },

    #[error("Expected {addr} to be owned by {expected:?}, got {actual:?}")]
    OwnerMismatch {
        addr: IpAddress,
        expected: Option<String>,
        actual: Option<String>,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Selection verifier bound to one status snapshot
pub struct StatusVerifier<'a> {
    status: &'a DeviceNetworkStatus,
}

impl<'a> StatusVerifier<'a> {
    pub fn new(status: &'a DeviceNetworkStatus) -> Self {
        Self { status }
    }

    /// Verify the rotated management port list
    pub fn assert_mgmt_ports(
        &self,
        rotation: usize,
        cost: CostFilter,
        expected: &[&str],
    ) -> VerifyResult<()> {
        let actual = list_mgmt_ports(self.status, rotation, cost);
        if actual != expected {
            return Err(VerificationError::PortsMismatch {
                expected: expected.iter().map(|s| s.to_string()).collect(),
                actual,
            });
        }
        Ok(())
    }

    /// Verify that each pick in `0..expected.len()` selects the matching
    /// address
    pub fn assert_selects(
        &self,
        port: &str,
        filter: AddressFilter,
        expected: &[IpAddress],
    ) -> VerifyResult<()> {
        for (pick, want) in expected.iter().enumerate() {
            let got = select_address(self.status, pick, port, filter)?;
            if got != *want {
                return Err(VerificationError::AddressMismatch {
                    pick,
                    expected: *want,
                    actual: got,
                });
            }
        }
        Ok(())
    }

    /// Verify that selection fails with no eligible address
    pub fn assert_no_address(&self, port: &str, filter: AddressFilter) -> VerifyResult<()> {
        match select_address(self.status, 0, port, filter) {
            Ok(actual) => Err(VerificationError::UnexpectedAddress { actual }),
            Err(UplinkError::NoAddressAvailable { .. }) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    /// Verify which management port owns `addr`
    pub fn assert_owner(&self, addr: IpAddress, expected: Option<&str>) -> VerifyResult<()> {
        let actual = reverse_lookup_port(self.status, &addr);
        if actual != expected {
            return Err(VerificationError::OwnerMismatch {
                addr,
                expected: expected.map(str::to_string),
                actual: actual.map(str::to_string),
            });
        }
        Ok(())
    }
}
