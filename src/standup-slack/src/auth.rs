//! Authorization for session-mutating commands.
//!
//! Two kinds of callers may open, close or remind:
//! - an internal trigger (cron job, deploy hook) that sends an empty actor id
//! - a member listed in the configured admin set
//!
//! Everyone else is turned away without touching the session.

use std::collections::HashSet;

use tracing::info;

/// Who is allowed to drive an admin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Empty actor id: a trusted internal caller.
    Internal,
    /// Actor is in the admin set.
    Admin,
    /// Actor is neither.
    Denied,
}

/// Immutable set of admin member IDs, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: HashSet<String>,
}

impl AdminSet {
    /// Build an admin set; blank entries are ignored.
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(Into::into)
                .filter(|a: &String| !a.trim().is_empty())
                .collect(),
        }
    }

    /// Plain membership check. The empty id is never an admin.
    pub fn is_admin(&self, member_id: &str) -> bool {
        !member_id.is_empty() && self.admins.contains(member_id)
    }

    /// Check an HTTP-triggered admin command.
    ///
    /// Only the exactly empty id is internal. A blank id such as `"  "` is
    /// an unknown actor like any other.
    pub fn authorize_command(&self, actor_id: &str) -> Authorization {
        if actor_id.is_empty() {
            Authorization::Internal
        } else if self.is_admin(actor_id) {
            Authorization::Admin
        } else {
            info!(actor = actor_id, "Rejected admin command from non-admin");
            Authorization::Denied
        }
    }
}
