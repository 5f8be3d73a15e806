//! # Ledger Profiles
//!
//! A profile binds an account address to a display name and a role. The
//! ledger owns profiles; this crate only reads them to label certificates
//! and decide who the viewer is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// Role assigned to an account at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Not registered.
    #[serde(rename = "NA")]
    Na,
    /// Registered student.
    User,
    /// Registered certificate issuer.
    Issuer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Na => write!(f, "NA"),
            Self::User => write!(f, "User"),
            Self::Issuer => write!(f, "Issuer"),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Account address.
    pub address: Address,
    /// Display name chosen at registration.
    pub name: String,
    /// Assigned role.
    pub role: Role,
}

impl Profile {
    /// Whether the profile belongs to a registered account.
    ///
    /// The ledger answers lookups of unknown accounts with a zero address
    /// and the `NA` role; such profiles count as absent.
    pub fn is_registered(&self) -> bool {
        self.role != Role::Na && !self.address.is_zero()
    }
}
