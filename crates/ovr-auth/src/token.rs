//! Shared-access tokens.
//!
//! Tokens are opaque random strings with no embedded claims. Validity is
//! decided entirely by the invitation record they belong to.

use std::fmt;

use ovr_core::{InvitationStatus, SharedAccessInvitation, UserPrincipal};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

/// Generates a token of `bytes` random bytes, hex encoded.
#[must_use]
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::Rng::fill(&mut rand::thread_rng(), buf.as_mut_slice());
    hex::encode(buf)
}

/// Compares two tokens in constant time.
#[must_use]
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Why an invitation did not grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// The presented token is not the invitation's token.
    Mismatch,
    /// The invitation is pending or revoked.
    NotAccepted,
    /// The invitation expired.
    Expired,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch => write!(f, "token mismatch"),
            Self::NotAccepted => write!(f, "invitation not accepted"),
            Self::Expired => write!(f, "invitation expired"),
        }
    }
}

/// Checks that `provided` opens `invitation` at `now`.
///
/// Conditions are checked in order: token, status, expiry.
pub fn check_invitation(
    invitation: &SharedAccessInvitation,
    provided: &str,
    now: OffsetDateTime,
) -> Result<(), TokenRejection> {
    if !tokens_match(&invitation.token, provided) {
        return Err(TokenRejection::Mismatch);
    }
    check_standing(invitation, now)
}

/// Checks that the invitation is accepted and unexpired.
pub fn check_standing(
    invitation: &SharedAccessInvitation,
    now: OffsetDateTime,
) -> Result<(), TokenRejection> {
    if invitation.status != InvitationStatus::Accepted {
        return Err(TokenRejection::NotAccepted);
    }
    if invitation.is_expired_at(now) {
        return Err(TokenRejection::Expired);
    }
    Ok(())
}

/// Returns `true` if the invitation is bound to the user, by id or by
/// case-insensitive email, and currently grants access.
#[must_use]
pub fn is_bound_to(
    invitation: &SharedAccessInvitation,
    user: &UserPrincipal,
    now: OffsetDateTime,
) -> bool {
    let bound =
        invitation.user_id == Some(user.id) || user.email_matches(&invitation.email);
    bound && check_standing(invitation, now).is_ok()
}
