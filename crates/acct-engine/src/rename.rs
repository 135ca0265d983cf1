//! Identity rename as an ordered saga.
//!
//! A rename touches the account entry, its RDN and every group-like entry
//! that references it. The directory offers no transaction spanning those
//! writes, so each step is applied on its own and progress is tracked. A
//! failure after the first write yields a [`RenameInterrupted`] record that
//! [`AccountManager::resume_rename`](crate::AccountManager::resume_rename)
//! accepts to finish the job.
//!
//! ## Steps
//!
//! 1. [`RenameStep::AllocateIdentity`]: pick a new uidNumber (read only)
//! 2. [`RenameStep::UpdateAttributes`]: one modify replacing committer
//!    email, home directory, uidNumber and gidNumber
//! 3. [`RenameStep::RenameRdn`]: `uid=<new>`, old RDN value deleted
//! 4. [`RenameStep::RedirectMembers`]: `member`/`owner` values holding the
//!    old DN, anywhere below the suffix
//! 5. [`RenameStep::RedirectPosixMembers`]: `memberUid` values holding the
//!    old uid on posix groups

use std::fmt;

use acct_gateway::{
    DirectoryGateway, Filter, GatewayError, GatewayResult, Modification, SearchScope,
};
use acct_model::account::attr;
use acct_model::group::attr as group_attr;
use acct_model::Account;

use crate::error::{AccountError, AccountResult};

/// One step of the rename saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenameStep {
    /// New uidNumber chosen.
    AllocateIdentity,
    /// Account attributes rewritten.
    UpdateAttributes,
    /// Account RDN changed.
    RenameRdn,
    /// Full-DN references rewritten.
    RedirectMembers,
    /// Bare-uid references rewritten.
    RedirectPosixMembers,
}

impl fmt::Display for RenameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AllocateIdentity => "allocate identity",
            Self::UpdateAttributes => "update attributes",
            Self::RenameRdn => "rename rdn",
            Self::RedirectMembers => "redirect member/owner references",
            Self::RedirectPosixMembers => "redirect memberUid references",
        })
    }
}

/// A reference whose old value was deleted but whose new value was never
/// added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// Entry that lost the reference.
    pub dn: String,
    /// Membership attribute.
    pub attribute: String,
    /// Value that still has to be added.
    pub value: String,
}

/// A reference moved from the old identity to the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectedReference {
    /// Entry holding the reference.
    pub dn: String,
    /// Membership attribute.
    pub attribute: String,
}

/// Progress record of a rename that stopped after mutating the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameInterrupted {
    /// Uid before the rename.
    pub old_uid: String,
    /// Requested uid.
    pub new_uid: String,
    /// DN before the rename.
    pub old_dn: String,
    /// DN after the rename.
    pub new_dn: String,
    /// uidNumber chosen in step 1.
    pub uid_number: u32,
    /// gidNumber written in step 2.
    pub gid_number: u32,
    /// Steps that finished.
    pub completed: Vec<RenameStep>,
    /// Step that failed.
    pub failed_step: RenameStep,
    /// Why it failed.
    pub cause: GatewayError,
    /// References left with neither the old nor the new value.
    pub dangling: Vec<DanglingReference>,
    /// References already rewritten before the failure.
    pub redirected: Vec<RedirectedReference>,
}

impl RenameInterrupted {
    /// Checks whether a step finished before the failure.
    #[must_use]
    pub fn has_completed(&self, step: RenameStep) -> bool {
        self.completed.contains(&step)
    }
}

impl fmt::Display for RenameInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rename of {} to {} interrupted at '{}' ({} step(s) completed, {} dangling reference(s)): {}",
            self.old_uid,
            self.new_uid,
            self.failed_step,
            self.completed.len(),
            self.dangling.len(),
            self.cause
        )
    }
}

/// Outcome of a completed rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameReport {
    /// Uid before the rename.
    pub old_uid: String,
    /// Uid after the rename.
    pub new_uid: String,
    /// DN before the rename.
    pub old_dn: String,
    /// DN after the rename.
    pub new_dn: String,
    /// New uidNumber.
    pub uid_number: u32,
    /// New gidNumber.
    pub gid_number: u32,
    /// Every reference rewritten.
    pub redirected: Vec<RedirectedReference>,
}

/// Progress record of a standalone reference sweep that stopped after
/// mutating the directory.
///
/// Pass it to
/// [`AccountManager::resume_redirect`](crate::AccountManager::resume_redirect)
/// to add back the dangling values and finish the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectInterrupted {
    /// Uid whose references were being moved.
    pub from_uid: String,
    /// Uid being referenced instead.
    pub to_uid: String,
    /// Why it failed.
    pub cause: GatewayError,
    /// References left with neither the old nor the new value.
    pub dangling: Vec<DanglingReference>,
    /// References already rewritten before the failure.
    pub redirected: Vec<RedirectedReference>,
}

impl fmt::Display for RedirectInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "redirect of {} to {} interrupted ({} reference(s) moved, {} dangling): {}",
            self.from_uid,
            self.to_uid,
            self.redirected.len(),
            self.dangling.len(),
            self.cause
        )
    }
}

/// Outcome of a standalone reference sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectReport {
    /// Uid whose references were moved.
    pub from_uid: String,
    /// Uid now referenced.
    pub to_uid: String,
    /// Every reference rewritten.
    pub redirected: Vec<RedirectedReference>,
}

// ============================================================================
// Reference sweeps
// ============================================================================

/// Search-and-rewrite of one membership attribute.
pub(crate) struct ReferenceSweep<'a> {
    pub attribute: &'static str,
    pub filter: Filter,
    pub from: &'a str,
    pub to: &'a str,
}

impl<'a> ReferenceSweep<'a> {
    /// `member` and `owner` sweeps for a full-DN move.
    pub(crate) fn full(from_dn: &'a str, to_dn: &'a str) -> [Self; 2] {
        [group_attr::MEMBER, group_attr::OWNER].map(|attribute| Self {
            attribute,
            filter: Filter::equals(attribute, from_dn),
            from: from_dn,
            to: to_dn,
        })
    }

    /// `memberUid` sweep on posix groups for a bare-uid move.
    pub(crate) fn posix(from_uid: &'a str, to_uid: &'a str) -> Self {
        Self {
            attribute: group_attr::MEMBER_UID,
            filter: Filter::and([
                Filter::equals(attr::OBJECT_CLASS, group_attr::POSIX_GROUP),
                Filter::equals(group_attr::MEMBER_UID, from_uid),
            ]),
            from: from_uid,
            to: to_uid,
        }
    }

    /// Rewrites every matching reference below `suffix`.
    ///
    /// Each entry gets a delete of the old value and, unless the new value
    /// is already there, a separate add of the new one. On failure the
    /// error comes back with the reference left dangling, if any.
    pub(crate) fn run<G: DirectoryGateway>(
        &self,
        gateway: &mut G,
        suffix: &str,
        redirected: &mut Vec<RedirectedReference>,
    ) -> Result<(), (GatewayError, Option<DanglingReference>)> {
        let entries = gateway
            .search(suffix, SearchScope::Subtree, &self.filter, &[self.attribute])
            .map_err(|e| (e, None))?;

        for entry in entries {
            let Some(stored) = entry.find_value(self.attribute, self.from) else {
                continue;
            };
            let already_present = entry.find_value(self.attribute, self.to).is_some();

            tracing::debug!(dn = %entry.dn, attribute = self.attribute, "redirecting reference");
            gateway
                .modify(&entry.dn, &[Modification::delete(self.attribute, stored)])
                .map_err(|e| (e, None))?;

            if !already_present {
                if let Err(e) =
                    gateway.modify(&entry.dn, &[Modification::add(self.attribute, self.to)])
                {
                    let dangling = DanglingReference {
                        dn: entry.dn.clone(),
                        attribute: self.attribute.to_string(),
                        value: self.to.to_string(),
                    };
                    return Err((e, Some(dangling)));
                }
            }
            redirected.push(RedirectedReference {
                dn: entry.dn,
                attribute: self.attribute.to_string(),
            });
        }
        Ok(())
    }
}

/// Adds back each dangling value. A value already present counts as
/// restored. On failure returns the index of the first reference not
/// restored.
pub(crate) fn restore_references<G: DirectoryGateway>(
    gateway: &mut G,
    dangling: &[DanglingReference],
    redirected: &mut Vec<RedirectedReference>,
) -> Result<(), (usize, GatewayError)> {
    for (i, reference) in dangling.iter().enumerate() {
        tracing::debug!(dn = %reference.dn, attribute = %reference.attribute, "restoring dangling reference");
        match gateway.modify(
            &reference.dn,
            &[Modification::add(&reference.attribute, &reference.value)],
        ) {
            Ok(()) | Err(GatewayError::ValueExists { .. }) => {
                redirected.push(RedirectedReference {
                    dn: reference.dn.clone(),
                    attribute: reference.attribute.clone(),
                });
            }
            Err(cause) => return Err((i, cause)),
        }
    }
    Ok(())
}

// ============================================================================
// Saga
// ============================================================================

/// Everything a rename writes, fixed before the first mutation.
#[derive(Debug, Clone)]
pub(crate) struct RenamePlan {
    pub old_uid: String,
    pub new_uid: String,
    pub old_dn: String,
    pub new_dn: String,
    pub new_rdn: String,
    pub uid_number: u32,
    pub gid_number: u32,
    pub email_attribute: String,
    pub new_email: String,
    pub new_home: String,
}

impl RenamePlan {
    /// The step-2 modify for `account` as currently stored.
    pub(crate) fn attribute_changes(&self, account: &Account) -> Vec<Modification> {
        let mut changes = Vec::with_capacity(8);
        if let Some(old) = &account.committer_email {
            changes.push(Modification::delete(&self.email_attribute, old));
        }
        changes.push(Modification::add(&self.email_attribute, &self.new_email));
        if let Some(old) = &account.home_directory {
            changes.push(Modification::delete(attr::HOME_DIRECTORY, old));
        }
        changes.push(Modification::add(attr::HOME_DIRECTORY, &self.new_home));
        if account.gid_number != self.gid_number {
            changes.extend(Modification::replace_value(
                attr::GID_NUMBER,
                account.gid_number.to_string(),
                self.gid_number.to_string(),
            ));
        }
        changes.extend(Modification::replace_value(
            attr::UID_NUMBER,
            account.uid_number.to_string(),
            self.uid_number.to_string(),
        ));
        changes
    }
}

/// Runs rename steps against a gateway, recording progress.
pub(crate) struct RenameSaga<'g, G: DirectoryGateway> {
    gateway: &'g mut G,
    suffix: &'g str,
    plan: RenamePlan,
    completed: Vec<RenameStep>,
    redirected: Vec<RedirectedReference>,
    mutated: bool,
}

impl<'g, G: DirectoryGateway> RenameSaga<'g, G> {
    /// Starts a fresh saga; the identity has just been allocated.
    pub(crate) fn start(gateway: &'g mut G, suffix: &'g str, plan: RenamePlan) -> Self {
        Self {
            gateway,
            suffix,
            plan,
            completed: vec![RenameStep::AllocateIdentity],
            redirected: Vec::new(),
            mutated: false,
        }
    }

    /// Picks up an interrupted saga.
    pub(crate) fn resume(
        gateway: &'g mut G,
        suffix: &'g str,
        plan: RenamePlan,
        progress: &RenameInterrupted,
    ) -> Self {
        Self {
            gateway,
            suffix,
            plan,
            completed: progress.completed.clone(),
            redirected: progress.redirected.clone(),
            mutated: true,
        }
    }

    pub(crate) const fn plan(&self) -> &RenamePlan {
        &self.plan
    }

    /// Step 2.
    pub(crate) fn update_attributes(&mut self, changes: &[Modification]) -> AccountResult<()> {
        tracing::debug!(dn = %self.plan.old_dn, uid_number = self.plan.uid_number, "rename: updating attributes");
        let outcome = self.gateway.modify(&self.plan.old_dn, changes);
        self.record(RenameStep::UpdateAttributes, outcome)
    }

    /// Step 3.
    pub(crate) fn rename_rdn(&mut self) -> AccountResult<()> {
        tracing::debug!(dn = %self.plan.old_dn, new_rdn = %self.plan.new_rdn, "rename: changing rdn");
        let outcome = self.gateway.rename_rdn(&self.plan.old_dn, &self.plan.new_rdn);
        self.record(RenameStep::RenameRdn, outcome)
    }

    /// Step 4.
    pub(crate) fn redirect_members(&mut self) -> AccountResult<()> {
        for sweep in ReferenceSweep::full(&self.plan.old_dn, &self.plan.new_dn) {
            if let Err((cause, dangling)) =
                sweep.run(&mut *self.gateway, self.suffix, &mut self.redirected)
            {
                return Err(self.fail(
                    RenameStep::RedirectMembers,
                    cause,
                    dangling.into_iter().collect(),
                ));
            }
        }
        self.complete(RenameStep::RedirectMembers);
        Ok(())
    }

    /// Step 5.
    pub(crate) fn redirect_posix_members(&mut self) -> AccountResult<()> {
        let sweep = ReferenceSweep::posix(&self.plan.old_uid, &self.plan.new_uid);
        if let Err((cause, dangling)) =
            sweep.run(&mut *self.gateway, self.suffix, &mut self.redirected)
        {
            return Err(self.fail(
                RenameStep::RedirectPosixMembers,
                cause,
                dangling.into_iter().collect(),
            ));
        }
        self.complete(RenameStep::RedirectPosixMembers);
        Ok(())
    }

    /// Adds back values whose add was lost in an earlier attempt.
    pub(crate) fn restore_dangling(&mut self, dangling: &[DanglingReference]) -> AccountResult<()> {
        restore_references(&mut *self.gateway, dangling, &mut self.redirected).map_err(
            |(i, cause)| {
                let step = if dangling[i].attribute.eq_ignore_ascii_case(group_attr::MEMBER_UID) {
                    RenameStep::RedirectPosixMembers
                } else {
                    RenameStep::RedirectMembers
                };
                self.fail(step, cause, dangling[i..].to_vec())
            },
        )
    }

    pub(crate) fn finish(self) -> RenameReport {
        RenameReport {
            old_uid: self.plan.old_uid,
            new_uid: self.plan.new_uid,
            old_dn: self.plan.old_dn,
            new_dn: self.plan.new_dn,
            uid_number: self.plan.uid_number,
            gid_number: self.plan.gid_number,
            redirected: self.redirected,
        }
    }

    fn record(&mut self, step: RenameStep, outcome: GatewayResult<()>) -> AccountResult<()> {
        match outcome {
            Ok(()) => {
                self.complete(step);
                Ok(())
            }
            Err(cause) => Err(self.fail(step, cause, Vec::new())),
        }
    }

    fn complete(&mut self, step: RenameStep) {
        self.mutated = true;
        if !self.completed.contains(&step) {
            self.completed.push(step);
        }
    }

    /// Before the first write a failure is an ordinary gateway error;
    /// afterwards it carries the progress record.
    fn fail(
        &self,
        step: RenameStep,
        cause: GatewayError,
        dangling: Vec<DanglingReference>,
    ) -> AccountError {
        if !self.mutated && self.redirected.is_empty() && dangling.is_empty() {
            return cause.into();
        }
        RenameInterrupted {
            old_uid: self.plan.old_uid.clone(),
            new_uid: self.plan.new_uid.clone(),
            old_dn: self.plan.old_dn.clone(),
            new_dn: self.plan.new_dn.clone(),
            uid_number: self.plan.uid_number,
            gid_number: self.plan.gid_number,
            completed: self.completed.clone(),
            failed_step: step,
            cause,
            dangling,
            redirected: self.redirected.clone(),
        }
        .into()
    }
}
