//! Handle on a loaded account.

use acct_gateway::{DirectoryGateway, ModifyOp};
use acct_model::{Account, MembershipCategory};

use crate::error::AccountResult;
use crate::manager::AccountManager;
use crate::rename::RenameReport;

/// A loaded account, borrowed together with the session that loaded it.
///
/// Membership calls are one modify each and are not transactional with one
/// another.
#[derive(Debug)]
pub struct Committer<'m, G: DirectoryGateway> {
    manager: &'m mut AccountManager<G>,
    account: Account,
}

impl<'m, G: DirectoryGateway> Committer<'m, G> {
    pub(crate) fn new(manager: &'m mut AccountManager<G>, account: Account) -> Self {
        Self { manager, account }
    }

    /// The account as last read or written.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Account uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.account.uid
    }

    /// Account DN.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.account.dn
    }

    /// Releases the session and keeps the account record.
    #[must_use]
    pub fn into_account(self) -> Account {
        self.account
    }

    /// Adds this account to `cn=<name>` under the category's base.
    pub fn add_membership(&mut self, category: MembershipCategory, name: &str) -> AccountResult<()> {
        self.manager
            .change_membership(&self.account, category, name, ModifyOp::Add)
    }

    /// Removes this account from `cn=<name>` under the category's base.
    pub fn remove_membership(&mut self, category: MembershipCategory, name: &str) -> AccountResult<()> {
        self.manager
            .change_membership(&self.account, category, name, ModifyOp::Delete)
    }

    /// Adds the account as a committer on a project.
    pub fn add_project(&mut self, project: &str) -> AccountResult<()> {
        self.add_membership(MembershipCategory::Project, project)
    }

    /// Adds the account to a project's PMC.
    pub fn add_pmc(&mut self, project: &str) -> AccountResult<()> {
        self.add_membership(MembershipCategory::Pmc, project)
    }

    /// Adds the account to a posix group.
    pub fn add_basic_group(&mut self, group: &str) -> AccountResult<()> {
        self.add_membership(MembershipCategory::BasicGroup, group)
    }

    /// Grants a role.
    pub fn add_role(&mut self, role: &str) -> AccountResult<()> {
        self.add_membership(MembershipCategory::Role, role)
    }

    /// Removes the account as a committer on a project.
    pub fn remove_project(&mut self, project: &str) -> AccountResult<()> {
        self.remove_membership(MembershipCategory::Project, project)
    }

    /// Removes the account from a project's PMC.
    pub fn remove_pmc(&mut self, project: &str) -> AccountResult<()> {
        self.remove_membership(MembershipCategory::Pmc, project)
    }

    /// Removes the account from a posix group.
    pub fn remove_basic_group(&mut self, group: &str) -> AccountResult<()> {
        self.remove_membership(MembershipCategory::BasicGroup, group)
    }

    /// Revokes a role.
    pub fn remove_role(&mut self, role: &str) -> AccountResult<()> {
        self.remove_membership(MembershipCategory::Role, role)
    }

    /// Renames the account to `new_uid`, moving every reference to it.
    ///
    /// See [`crate::rename`] for the steps. On success the handle reflects
    /// the new identity. A failure after the first write is
    /// [`AccountError::PartialMutation`](crate::AccountError::PartialMutation);
    /// pass its record to
    /// [`AccountManager::resume_rename`](crate::AccountManager::resume_rename).
    pub fn rename(&mut self, new_uid: &str) -> AccountResult<RenameReport> {
        let report = self.manager.rename_account(&self.account, new_uid)?;

        let template = &self.manager.config().account;
        self.account.committer_email = Some(template.committer_email(new_uid));
        self.account.home_directory = Some(template.home_directory(new_uid));
        self.account.uid = report.new_uid.clone();
        self.account.dn = report.new_dn.clone();
        self.account.uid_number = report.uid_number;
        self.account.gid_number = report.gid_number;
        Ok(report)
    }
}
