//! Preflight: the invoking user must be allowed to drive libvirt.

use std::ffi::CString;
use std::io;

use nix::unistd::{Group, User, getgrouplist, getuid};
use tracing::debug;

use crate::error::{FailureCode, LaunchError};

/// Source of the invoking user's group names.
pub trait GroupMembership {
    fn group_names(&self) -> io::Result<Vec<String>>;
}

/// Reads the passwd/group databases, like `groups $(whoami)`.
///
/// This sees memberships added since login, not just the groups attached to
/// the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemGroups;

impl GroupMembership for SystemGroups {
    fn group_names(&self) -> io::Result<Vec<String>> {
        let user = User::from_uid(getuid())?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "current user has no passwd entry")
        })?;
        let name = CString::new(user.name.as_str())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut names = Vec::new();
        for gid in getgrouplist(&name, user.gid)? {
            if let Some(group) = Group::from_gid(gid)? {
                names.push(group.name);
            }
        }
        debug!(user = %user.name, groups = ?names, "resolved group membership");
        Ok(names)
    }
}

/// Required groups missing from `have`, in `required` order.
pub fn missing_groups(required: &[String], have: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|g| !have.contains(g))
        .cloned()
        .collect()
}

/// Fail with [`FailureCode::NotInGroup`] unless every required group is held.
pub fn ensure_groups<G: GroupMembership>(
    membership: &G,
    required: &[String],
) -> Result<(), LaunchError> {
    if required.is_empty() {
        return Ok(());
    }
    let missing = missing_groups(required, &membership.group_names()?);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FailureCode::NotInGroup(missing).into())
    }
}
