//! Session-scoped account manager.
//!
//! An [`AccountManager`] is obtained by binding to the directory as a
//! person entry. It owns the gateway for the rest of the session and drives
//! every lookup and mutation through it. Mutations are audited against the
//! session uid.

use std::fmt;
use std::sync::Arc;

use acct_core::{AuditEventBuilder, AuditSink, Config, DirectoryLayout, EventType, TracingAuditSink};
use acct_gateway::{
    DirectoryGateway, Filter, GatewayError, Modification, ModifyOp, SearchScope,
};
use acct_ldif::{to_ldif_string, Base64Policy};
use acct_model::account::{attr, single};
use acct_model::{
    Account, DirectoryEntry, MembershipCategory, PosixGroupEntry, ProjectEntry, RoleEntry,
    ServiceGroupEntry,
};

use crate::allocator::AllocationSnapshot;
use crate::committer::Committer;
use crate::error::{AccountError, AccountResult, ValidationField};
use crate::password::{generate_password, hash_user_password};
use crate::rename::{
    restore_references, DanglingReference, RedirectInterrupted, RedirectReport,
    RedirectedReference, RenameInterrupted, RenamePlan, RenameReport, RenameSaga, ReferenceSweep,
};
use crate::validator::{is_valid_login, split_full_name, validate_email, validate_uid};

/// Identity of the bound session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Login uid.
    pub uid: String,
    /// DN the session bound as.
    pub dn: String,
    /// Full name from the profile entry.
    pub full_name: String,
    /// Contact email from the profile entry.
    pub email: Option<String>,
    /// Whether the session is in the account-administrators group.
    pub is_admin: bool,
}

/// Request to create an account.
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Account identifier.
    pub uid: String,
    /// Contact email.
    pub email: String,
    /// Full name, split into given name and surname.
    pub full_name: String,
    /// Initial password; generated when absent or empty.
    pub password: Option<String>,
    /// Whether the full name needs at least two parts.
    pub require_two_names: bool,
}

impl NewAccount {
    /// Creates a request with a generated password.
    #[must_use]
    pub fn new(uid: impl Into<String>, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            full_name: full_name.into(),
            password: None,
            require_two_names: true,
        }
    }

    /// Sets an explicit initial password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Accepts single-part names.
    #[must_use]
    pub const fn allow_single_name(mut self) -> Self {
        self.require_two_names = false;
        self
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("require_two_names", &self.require_two_names)
            .finish()
    }
}

/// Account manager bound to one directory session.
pub struct AccountManager<G: DirectoryGateway> {
    gateway: G,
    config: Config,
    session: Session,
    audit: Arc<dyn AuditSink>,
}

impl<G: DirectoryGateway> fmt::Debug for AccountManager<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountManager")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<G: DirectoryGateway> AccountManager<G> {
    /// Binds as `uid` and opens a session.
    ///
    /// Audit events go to the tracing subscriber.
    pub fn authenticate(gateway: G, config: Config, uid: &str, secret: &str) -> AccountResult<Self> {
        Self::authenticate_with_audit(gateway, config, uid, secret, Arc::new(TracingAuditSink))
    }

    /// Binds as `uid` and opens a session recording to `audit`.
    ///
    /// # Errors
    ///
    /// - [`AccountError::Connection`] when the login is malformed, the bind
    ///   is refused or the directory times out
    /// - [`AccountError::Consistency`] when the profile entry lacks exactly
    ///   one `cn`, or the admin group is missing or has no members
    pub fn authenticate_with_audit(
        mut gateway: G,
        config: Config,
        uid: &str,
        secret: &str,
        audit: Arc<dyn AuditSink>,
    ) -> AccountResult<Self> {
        let dn = config.layout.account_dn(uid);

        if !is_valid_login(uid) {
            tracing::warn!(uid, "login rejected: invalid characters");
            audit.record(
                AuditEventBuilder::new(EventType::SessionRejected)
                    .failure("invalid characters in login")
                    .subject(uid)
                    .build(),
            );
            return Err(AccountError::Connection(GatewayError::InvalidCredentials(
                "login must be alphanumerical or dashes only".into(),
            )));
        }

        if let Err(err) = gateway.bind(&dn, secret) {
            tracing::warn!(uid, error = %err, "bind refused");
            audit.record(
                AuditEventBuilder::new(EventType::SessionRejected)
                    .failure(err.to_string())
                    .subject(&dn)
                    .build(),
            );
            return Err(err.into());
        }

        let profile = read_entry(&mut gateway, &dn, &[])?
            .ok_or_else(|| AccountError::consistency(format!("profile entry {dn} not found")))?;
        let full_name = single(&profile, attr::CN)?.to_string();
        let email = profile.get_attr(attr::MAIL).map(String::from);

        let admin_group = read_entry(&mut gateway, &config.layout.admin_group, &[])?
            .map(|entry| ServiceGroupEntry::from_entry(&entry))
            .ok_or_else(|| {
                AccountError::consistency(format!(
                    "admin group {} not found",
                    config.layout.admin_group
                ))
            })?;
        if admin_group.members.is_empty() {
            return Err(AccountError::consistency(format!(
                "admin group {} has no members",
                admin_group.dn
            )));
        }
        let is_admin = admin_group.contains(&dn);

        tracing::info!(uid, is_admin, "session opened");
        audit.record(
            AuditEventBuilder::new(EventType::SessionOpened)
                .actor(uid)
                .subject(&dn)
                .detail("admin", is_admin)
                .build(),
        );

        Ok(Self {
            gateway,
            config,
            session: Session {
                uid: uid.to_string(),
                dn,
                full_name,
                email,
                is_admin,
            },
            audit,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The bound session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Session uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.session.uid
    }

    /// Session DN.
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.session.dn
    }

    /// Session full name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.session.full_name
    }

    /// Session email, if the profile has one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.session.email.as_deref()
    }

    /// Whether the session may create accounts.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.session.is_admin
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying gateway, for inspection.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Ends the session and hands back the gateway.
    #[must_use]
    pub fn into_gateway(self) -> G {
        self.gateway
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Loads the account with `uid`.
    ///
    /// Returns `None` when no person entry matches. More than one match is a
    /// consistency fault.
    pub fn load_account(&mut self, uid: &str) -> AccountResult<Option<Committer<'_, G>>> {
        match self.find_account(uid)? {
            Some(account) => Ok(Some(Committer::new(self, account))),
            None => Ok(None),
        }
    }

    /// Loads a project entry by name.
    pub fn load_project(&mut self, name: &str) -> AccountResult<Option<ProjectEntry>> {
        let dn = DirectoryLayout::group_dn(name, &self.config.layout.projects_base);
        read_entry(&mut self.gateway, &dn, &[])?
            .map(|entry| ProjectEntry::from_entry(&entry).map_err(AccountError::from))
            .transpose()
    }

    /// Loads a role entry by name.
    pub fn load_role(&mut self, name: &str) -> AccountResult<Option<RoleEntry>> {
        let dn = DirectoryLayout::group_dn(name, &self.config.layout.roles_base);
        read_entry(&mut self.gateway, &dn, &[])?
            .map(|entry| RoleEntry::from_entry(&entry).map_err(AccountError::from))
            .transpose()
    }

    /// Loads a posix group by name.
    pub fn load_posix_group(&mut self, name: &str) -> AccountResult<Option<PosixGroupEntry>> {
        let dn = DirectoryLayout::group_dn(name, &self.config.layout.groups_base);
        read_entry(&mut self.gateway, &dn, &[])?
            .map(|entry| PosixGroupEntry::from_entry(&entry).map_err(AccountError::from))
            .transpose()
    }

    pub(crate) fn find_account(&mut self, uid: &str) -> AccountResult<Option<Account>> {
        let layout = &self.config.layout;
        let mut entries = self.gateway.search(
            &layout.people_base,
            SearchScope::Subtree,
            &Filter::equals(attr::UID, uid),
            &[],
        )?;
        match entries.len() {
            0 => Ok(None),
            1 => {
                let entry = entries.remove(0);
                let account =
                    Account::from_entry(&entry, &self.config.account.committer_email_attribute)?;
                Ok(Some(account))
            }
            n => Err(AccountError::consistency(format!(
                "{n} person entries match uid {uid}"
            ))),
        }
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Reads the uidNumbers and gidNumbers currently assigned to accounts.
    pub fn allocation_snapshot(&mut self) -> AccountResult<AllocationSnapshot> {
        let entries = self.gateway.search(
            &self.config.layout.people_base,
            SearchScope::Subtree,
            &Filter::present(attr::UID),
            &[attr::UID_NUMBER, attr::GID_NUMBER],
        )?;
        Ok(AllocationSnapshot::from_entries(&entries)?)
    }

    /// Lowest free uid in the user band, against a fresh snapshot.
    pub fn next_user_uid(&mut self) -> AccountResult<u32> {
        let policy = &self.config.identity;
        let (minimum, maximum) = (policy.minimum_user_uid, policy.maximum_user_uid);
        Ok(self.allocation_snapshot()?.allocate(minimum, maximum)?)
    }

    /// Lowest free uid in the service band, against a fresh snapshot.
    pub fn next_service_uid(&mut self) -> AccountResult<u32> {
        let policy = &self.config.identity;
        let (minimum, maximum) = (policy.minimum_service_uid, policy.maximum_service_uid());
        Ok(self.allocation_snapshot()?.allocate(minimum, Some(maximum))?)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Creates a person entry and returns it freshly loaded.
    ///
    /// Every rule is checked before the directory is touched: admin rights,
    /// uid syntax, full name, email, then uid and common-name collisions.
    /// The account is written in a single add.
    pub fn create_account(&mut self, request: NewAccount) -> AccountResult<Committer<'_, G>> {
        if !self.session.is_admin {
            tracing::warn!(actor = %self.session.uid, uid = %request.uid, "account creation refused");
            return Err(AccountError::permission(
                "you do not have sufficient access to create accounts",
            ));
        }

        validate_uid(&request.uid)?;
        let names = split_full_name(&request.full_name, request.require_two_names)?;
        validate_email(&request.email)?;
        self.check_collisions(&request.uid)?;

        let uid_number = self.next_user_uid()?;
        let gid_number = self.config.identity.create_gid.resolve(uid_number);

        let template = &self.config.account;
        let password = match request.password.filter(|p| !p.is_empty()) {
            Some(password) => password,
            None => generate_password(template.generated_password_length),
        };
        let user_password = hash_user_password(&password, template.password_scheme)?;

        let uid = request.uid.as_str();
        let attributes: Vec<(String, Vec<String>)> = vec![
            (attr::OBJECT_CLASS.into(), template.object_classes.clone()),
            (attr::UID.into(), vec![uid.to_string()]),
            (attr::LOGIN_SHELL.into(), vec![template.login_shell.clone()]),
            (attr::SASCORE.into(), vec![template.sascore.clone()]),
            (attr::GIVEN_NAME.into(), vec![names.given_name]),
            (attr::SURNAME.into(), vec![names.surname]),
            (attr::MAIL.into(), vec![request.email.clone()]),
            (attr::GID_NUMBER.into(), vec![gid_number.to_string()]),
            (attr::UID_NUMBER.into(), vec![uid_number.to_string()]),
            (
                template.committer_email_attribute.clone(),
                vec![template.committer_email(uid)],
            ),
            (attr::CN.into(), vec![request.full_name.clone()]),
            (attr::HOME_DIRECTORY.into(), vec![template.home_directory(uid)]),
            (attr::USER_PASSWORD.into(), vec![user_password]),
            (attr::HOST.into(), vec![template.host.clone()]),
        ];

        let dn = self.config.layout.account_dn(uid);
        tracing::debug!(%dn, uid_number, gid_number, "adding person entry");
        if let Err(err) = self.gateway.add(&dn, attributes) {
            self.record(
                AuditEventBuilder::new(EventType::AccountCreated)
                    .failure(err.to_string())
                    .subject(&dn),
            );
            return Err(err.into());
        }

        tracing::info!(uid, uid_number, gid_number, "account created");
        self.record(
            AuditEventBuilder::new(EventType::AccountCreated)
                .subject(&dn)
                .detail("uid_number", uid_number)
                .detail("gid_number", gid_number),
        );

        let account = self.find_account(uid)?.ok_or_else(|| {
            AccountError::consistency(format!("account {uid} not found after creation"))
        })?;
        Ok(Committer::new(self, account))
    }

    /// Rejects a uid that is taken by an account or by any common name
    /// below the suffix.
    fn check_collisions(&mut self, uid: &str) -> AccountResult<()> {
        if self.find_account(uid)?.is_some() {
            return Err(AccountError::validation(
                ValidationField::Uid,
                format!("an account with uid {uid} already exists"),
            ));
        }
        let clashes = self.gateway.search(
            &self.config.layout.suffix,
            SearchScope::Subtree,
            &Filter::equals(attr::CN, uid),
            &[attr::CN],
        )?;
        if let Some(clash) = clashes.first() {
            return Err(AccountError::validation(
                ValidationField::Uid,
                format!("uid {uid} clashes with {}", clash.dn),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Directory base holding entries of a membership category.
    #[must_use]
    pub fn category_base(&self, category: MembershipCategory) -> &str {
        let layout = &self.config.layout;
        match category {
            MembershipCategory::Project | MembershipCategory::Pmc => &layout.projects_base,
            MembershipCategory::BasicGroup => &layout.groups_base,
            MembershipCategory::Role => &layout.roles_base,
        }
    }

    pub(crate) fn change_membership(
        &mut self,
        account: &Account,
        category: MembershipCategory,
        name: &str,
        op: ModifyOp,
    ) -> AccountResult<()> {
        let group_dn = DirectoryLayout::group_dn(name, self.category_base(category));
        let change = Modification {
            op,
            attribute: category.attribute().to_string(),
            value: category
                .reference_form()
                .value(&account.dn, &account.uid)
                .to_string(),
        };
        let event_type = match op {
            ModifyOp::Add => EventType::MembershipAdded,
            ModifyOp::Delete => EventType::MembershipRemoved,
        };

        tracing::debug!(%group_dn, uid = %account.uid, %category, ?op, "changing membership");
        let outcome = self.gateway.modify(&group_dn, &[change]);

        let mut event = AuditEventBuilder::new(event_type)
            .subject(&account.dn)
            .detail("group", &group_dn)
            .detail("category", category);
        if let Err(err) = &outcome {
            event = event.failure(err.to_string());
        }
        self.record(event);

        outcome.map_err(AccountError::from)
    }

    // ========================================================================
    // Rename
    // ========================================================================

    pub(crate) fn rename_account(
        &mut self,
        account: &Account,
        new_uid: &str,
    ) -> AccountResult<RenameReport> {
        validate_uid(new_uid)?;
        self.check_collisions(new_uid)?;

        let uid_number = self.next_user_uid()?;
        let gid_number = self.config.identity.rename_gid.resolve(uid_number);
        let plan = self.rename_plan(&account.uid, new_uid, uid_number, gid_number);
        let changes = plan.attribute_changes(account);

        tracing::info!(old_uid = %account.uid, new_uid, uid_number, gid_number, "renaming account");
        let mut saga = RenameSaga::start(&mut self.gateway, &self.config.layout.suffix, plan);
        let outcome = run_rename(&mut saga, &changes).map(|()| saga.finish());

        match outcome {
            Ok(report) => {
                tracing::info!(old_uid = %report.old_uid, new_uid = %report.new_uid, redirected = report.redirected.len(), "account renamed");
                self.record(
                    AuditEventBuilder::new(EventType::AccountRenamed)
                        .subject(&report.new_dn)
                        .detail("old_uid", &report.old_uid)
                        .detail("uid_number", report.uid_number)
                        .detail("gid_number", report.gid_number),
                );
                Ok(report)
            }
            Err(err) => {
                if let Some(progress) = err.interrupted() {
                    self.record_interrupted(progress);
                }
                Err(err)
            }
        }
    }

    /// Completes a rename from the progress record of a partial-mutation
    /// fault.
    ///
    /// The attribute update is re-applied if the old entry still carries
    /// other numeric ids, the RDN change is made if the old DN still
    /// exists, dangling references are restored and both reference sweeps
    /// run again.
    pub fn resume_rename(&mut self, progress: &RenameInterrupted) -> AccountResult<RenameReport> {
        validate_uid(&progress.new_uid)?;
        let plan = self.rename_plan(
            &progress.old_uid,
            &progress.new_uid,
            progress.uid_number,
            progress.gid_number,
        );

        let old_account = match read_entry(&mut self.gateway, &plan.old_dn, &[])? {
            Some(entry) => Some(Account::from_entry(
                &entry,
                &self.config.account.committer_email_attribute,
            )?),
            None => None,
        };
        if old_account.is_none() && read_entry(&mut self.gateway, &plan.new_dn, &[])?.is_none() {
            return Err(AccountError::consistency(format!(
                "neither {} nor {} exists",
                plan.old_dn, plan.new_dn
            )));
        }

        tracing::info!(old_uid = %progress.old_uid, new_uid = %progress.new_uid, failed_step = %progress.failed_step, "resuming rename");
        let mut saga =
            RenameSaga::resume(&mut self.gateway, &self.config.layout.suffix, plan, progress);
        let outcome = resume_steps(&mut saga, old_account.as_ref(), progress).map(|()| saga.finish());

        match outcome {
            Ok(report) => {
                self.record(
                    AuditEventBuilder::new(EventType::RenameResumed)
                        .subject(&report.new_dn)
                        .detail("old_uid", &report.old_uid)
                        .detail("redirected", report.redirected.len()),
                );
                Ok(report)
            }
            Err(err) => {
                if let Some(progress) = err.interrupted() {
                    self.record_interrupted(progress);
                }
                Err(err)
            }
        }
    }

    /// Moves every `member`/`owner` reference from `from_uid`'s DN to
    /// `to_uid`'s DN, and every posix-group `memberUid` from `from_uid` to
    /// `to_uid`.
    ///
    /// Entries that already reference `to_uid` only lose the old value, so
    /// running this twice leaves the same state.
    ///
    /// # Errors
    ///
    /// A failure once a reference has been touched is
    /// [`AccountError::PartialRedirect`]; pass its record to
    /// [`resume_redirect`](Self::resume_redirect). Earlier failures are the
    /// plain connection or directory fault.
    pub fn redirect_uid(&mut self, from_uid: &str, to_uid: &str) -> AccountResult<RedirectReport> {
        validate_uid(from_uid)?;
        validate_uid(to_uid)?;

        let redirected = self.sweep_references(from_uid, to_uid, Vec::new())?;

        tracing::info!(from_uid, to_uid, redirected = redirected.len(), "references redirected");
        self.record(
            AuditEventBuilder::new(EventType::ReferencesRedirected)
                .subject(to_uid)
                .detail("from_uid", from_uid)
                .detail("redirected", redirected.len()),
        );
        Ok(RedirectReport {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
            redirected,
        })
    }

    /// Completes a reference sweep from the progress record of a
    /// partial-redirect fault.
    ///
    /// Dangling values are added back first, then every sweep runs again.
    /// The report lists the references moved by both attempts.
    pub fn resume_redirect(&mut self, progress: &RedirectInterrupted) -> AccountResult<RedirectReport> {
        validate_uid(&progress.from_uid)?;
        validate_uid(&progress.to_uid)?;
        let (from_uid, to_uid) = (progress.from_uid.as_str(), progress.to_uid.as_str());

        tracing::info!(from_uid, to_uid, dangling = progress.dangling.len(), "resuming redirect");
        let mut redirected = progress.redirected.clone();
        if let Err((i, cause)) =
            restore_references(&mut self.gateway, &progress.dangling, &mut redirected)
        {
            return Err(self.redirect_interrupted(
                from_uid,
                to_uid,
                cause,
                progress.dangling[i..].to_vec(),
                redirected,
            ));
        }
        let redirected = self.sweep_references(from_uid, to_uid, redirected)?;

        self.record(
            AuditEventBuilder::new(EventType::RedirectResumed)
                .subject(to_uid)
                .detail("from_uid", from_uid)
                .detail("redirected", redirected.len()),
        );
        Ok(RedirectReport {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
            redirected,
        })
    }

    /// Runs the `member`, `owner` and `memberUid` sweeps, appending to
    /// `redirected`.
    fn sweep_references(
        &mut self,
        from_uid: &str,
        to_uid: &str,
        mut redirected: Vec<RedirectedReference>,
    ) -> AccountResult<Vec<RedirectedReference>> {
        if from_uid == to_uid {
            return Ok(redirected);
        }
        let from_dn = self.config.layout.account_dn(from_uid);
        let to_dn = self.config.layout.account_dn(to_uid);
        let suffix = &self.config.layout.suffix;

        let sweeps = ReferenceSweep::full(&from_dn, &to_dn)
            .into_iter()
            .chain([ReferenceSweep::posix(from_uid, to_uid)]);
        for sweep in sweeps {
            if let Err((cause, dangling)) = sweep.run(&mut self.gateway, suffix, &mut redirected) {
                return Err(self.redirect_interrupted(
                    from_uid,
                    to_uid,
                    cause,
                    dangling.into_iter().collect(),
                    redirected,
                ));
            }
        }
        Ok(redirected)
    }

    /// Nothing touched yet is a plain fault; otherwise the progress record.
    fn redirect_interrupted(
        &self,
        from_uid: &str,
        to_uid: &str,
        cause: GatewayError,
        dangling: Vec<DanglingReference>,
        redirected: Vec<RedirectedReference>,
    ) -> AccountError {
        if redirected.is_empty() && dangling.is_empty() {
            return cause.into();
        }
        for reference in &dangling {
            tracing::warn!(dn = %reference.dn, attribute = %reference.attribute, value = %reference.value, "reference left dangling");
        }
        tracing::warn!(
            from_uid,
            to_uid,
            redirected = redirected.len(),
            dangling = dangling.len(),
            error = %cause,
            "redirect interrupted after mutating the directory"
        );
        self.record(
            AuditEventBuilder::new(EventType::RedirectInterrupted)
                .failure(cause.to_string())
                .subject(to_uid)
                .detail("from_uid", from_uid)
                .detail("dangling", dangling.len()),
        );
        RedirectInterrupted {
            from_uid: from_uid.to_string(),
            to_uid: to_uid.to_string(),
            cause,
            dangling,
            redirected,
        }
        .into()
    }

    fn rename_plan(&self, old_uid: &str, new_uid: &str, uid_number: u32, gid_number: u32) -> RenamePlan {
        let layout = &self.config.layout;
        let template = &self.config.account;
        RenamePlan {
            old_uid: old_uid.to_string(),
            new_uid: new_uid.to_string(),
            old_dn: layout.account_dn(old_uid),
            new_dn: layout.account_dn(new_uid),
            new_rdn: layout.account_rdn(new_uid),
            uid_number,
            gid_number,
            email_attribute: template.committer_email_attribute.clone(),
            new_email: template.committer_email(new_uid),
            new_home: template.home_directory(new_uid),
        }
    }

    fn record_interrupted(&self, progress: &RenameInterrupted) {
        tracing::warn!(
            old_uid = %progress.old_uid,
            new_uid = %progress.new_uid,
            failed_step = %progress.failed_step,
            dangling = progress.dangling.len(),
            error = %progress.cause,
            "rename interrupted after mutating the directory"
        );
        self.record(
            AuditEventBuilder::new(EventType::RenameInterrupted)
                .failure(progress.cause.to_string())
                .subject(&progress.old_dn)
                .detail("new_uid", &progress.new_uid)
                .detail("failed_step", progress.failed_step)
                .detail("uid_number", progress.uid_number),
        );
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Renders the entries below `base` matching `filter` as LDIF.
    pub fn export_ldif(&mut self, base: &str, filter: &Filter) -> AccountResult<String> {
        self.export_ldif_with_policy(base, filter, &Base64Policy::new())
    }

    /// Like [`export_ldif`](Self::export_ldif) with explicit always-base64
    /// attributes.
    pub fn export_ldif_with_policy(
        &mut self,
        base: &str,
        filter: &Filter,
        policy: &Base64Policy,
    ) -> AccountResult<String> {
        let entries = self.gateway.search(base, SearchScope::Subtree, filter, &[])?;
        tracing::debug!(base, %filter, count = entries.len(), "exporting ldif");
        to_ldif_string(&entries, policy)
            .map_err(|e| AccountError::internal(format!("ldif rendering failed: {e}")))
    }

    fn record(&self, event: AuditEventBuilder) {
        self.audit.record(event.actor(&self.session.uid).build());
    }
}

fn run_rename<G: DirectoryGateway>(
    saga: &mut RenameSaga<'_, G>,
    changes: &[Modification],
) -> AccountResult<()> {
    saga.update_attributes(changes)?;
    saga.rename_rdn()?;
    saga.redirect_members()?;
    saga.redirect_posix_members()
}

fn resume_steps<G: DirectoryGateway>(
    saga: &mut RenameSaga<'_, G>,
    old_account: Option<&Account>,
    progress: &RenameInterrupted,
) -> AccountResult<()> {
    if let Some(account) = old_account {
        if account.uid_number != progress.uid_number || account.gid_number != progress.gid_number {
            let changes = saga.plan().attribute_changes(account);
            saga.update_attributes(&changes)?;
        }
        saga.rename_rdn()?;
    }
    saga.restore_dangling(&progress.dangling)?;
    saga.redirect_members()?;
    saga.redirect_posix_members()
}

/// Reads one entry by DN.
///
/// A missing entry is `None`; a base search returning several entries is a
/// consistency fault.
fn read_entry<G: DirectoryGateway>(
    gateway: &mut G,
    dn: &str,
    attributes: &[&str],
) -> AccountResult<Option<DirectoryEntry>> {
    let mut entries = match gateway.search(
        dn,
        SearchScope::Base,
        &Filter::present(attr::OBJECT_CLASS),
        attributes,
    ) {
        Ok(entries) => entries,
        Err(GatewayError::NoSuchObject(_)) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    match entries.len() {
        0 => Ok(None),
        1 => Ok(entries.pop()),
        n => Err(AccountError::consistency(format!(
            "base search on {dn} returned {n} entries"
        ))),
    }
}
