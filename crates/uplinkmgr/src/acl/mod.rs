//! Access control lists for application network interfaces.
//!
//! An ACL is an ordered list of [`Ace`] entries evaluated first match wins,
//! with an implicit reject at the end. Whether a match type is legal
//! depends on where the ACL is attached: `eidset` only makes sense on an
//! overlay, whose DNS name list defines the set.

mod types;

pub use types::{
    Ace, AceAction, AceActionFields, AceMatch, AceMatchType, LimitUnit, RateLimit,
};

use crate::error::{UplinkError, UplinkResult};

/// Where an ACL is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclScope {
    Overlay,
    Underlay,
}

/// Checks attachment-level rules for a whole ACL.
pub fn validate_acl(aces: &[Ace], scope: AclScope) -> UplinkResult<()> {
    if scope == AclScope::Underlay {
        if let Some(index) = aces.iter().position(|ace| ace.has_match(AceMatchType::EidSet)) {
            return Err(UplinkError::validation(
                format!("ACE {}", index),
                "eidset match is only valid on an overlay",
            ));
        }
    }
    Ok(())
}

/// Local ports exposed through port-mapping actions, in ACL order.
pub fn mapped_ports(aces: &[Ace]) -> Vec<(u16, u16)> {
    aces.iter()
        .flat_map(|ace| {
            let lport = ace.matches().iter().find_map(AceMatch::port_if_local);
            ace.actions()
                .iter()
                .filter_map(move |action| Some((lport?, action.port_map?)))
        })
        .collect()
}
