//! [`DirectoryGateway`] over an LDAPS connection.

use std::collections::HashSet;

use acct_gateway::{
    AttributeList, DirectoryGateway, Filter, GatewayError, GatewayResult, Modification,
    ModifyOp, SearchScope,
};
use acct_model::DirectoryEntry;
use ldap3::SearchEntry;

use crate::config::LdapConfig;
use crate::connection::LdapConnection;
use crate::convert;
use crate::error::{rc, LdapError, LdapResult};

/// Directory gateway backed by a live LDAPS server.
#[derive(Debug)]
pub struct LdapGateway {
    connection: LdapConnection,
}

impl LdapGateway {
    /// Connects to the configured server. The connection is unbound until
    /// [`DirectoryGateway::bind`] is called.
    pub fn connect(config: LdapConfig) -> LdapResult<Self> {
        Ok(Self {
            connection: LdapConnection::open(config)?,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        self.connection.config()
    }

    /// Unbinds and closes the connection.
    pub fn close(self) {
        self.connection.close();
    }
}

fn ldap_check(
    outcome: Result<ldap3::LdapResult, ldap3::LdapError>,
    target: &str,
) -> LdapResult<()> {
    outcome
        .and_then(ldap3::LdapResult::success)
        .map(|_| ())
        .map_err(|e| LdapError::from_ldap3(e, target))
}

fn check(
    outcome: Result<ldap3::LdapResult, ldap3::LdapError>,
    target: &str,
) -> GatewayResult<()> {
    Ok(ldap_check(outcome, target)?)
}

/// Attaches the offending change to value-level refusals.
fn value_error(err: LdapError, dn: &str, changes: &[Modification]) -> GatewayError {
    let first = |op: ModifyOp| changes.iter().find(|c| c.op == op);
    let code = match &err {
        LdapError::Result { code, .. } => *code,
        _ => return err.into(),
    };
    match (code, first(ModifyOp::Add), first(ModifyOp::Delete)) {
        (rc::ATTRIBUTE_OR_VALUE_EXISTS, Some(change), _) => GatewayError::ValueExists {
            dn: dn.to_string(),
            attribute: change.attribute.clone(),
            value: change.value.clone(),
        },
        (rc::NO_SUCH_ATTRIBUTE, _, Some(change)) => GatewayError::NoSuchValue {
            dn: dn.to_string(),
            attribute: change.attribute.clone(),
            value: change.value.clone(),
        },
        _ => err.into(),
    }
}

impl DirectoryGateway for LdapGateway {
    fn bind(&mut self, dn: &str, secret: &str) -> GatewayResult<()> {
        // An empty password would be an unauthenticated bind that servers accept.
        if secret.is_empty() {
            return Err(GatewayError::InvalidCredentials(dn.to_string()));
        }
        tracing::debug!(dn = %dn, "simple bind");
        check(self.connection.ldap().simple_bind(dn, secret), dn)
    }

    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> GatewayResult<Vec<DirectoryEntry>> {
        let filter_text = filter.to_string();
        tracing::debug!(base = %base, filter = %filter_text, "search");

        let (entries, _result) = self
            .connection
            .ldap()
            .search(
                base,
                convert::scope(scope),
                &filter_text,
                convert::attribute_list(attributes),
            )
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| GatewayError::from(LdapError::from_ldap3(e, base)))?;

        Ok(entries
            .into_iter()
            .map(|e| convert::entry_from_search(SearchEntry::construct(e)))
            .collect())
    }

    fn add(&mut self, dn: &str, attributes: AttributeList) -> GatewayResult<()> {
        tracing::debug!(dn = %dn, "add");
        let attrs: Vec<(String, HashSet<String>)> = attributes
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();
        check(self.connection.ldap().add(dn, attrs), dn)
    }

    fn modify(&mut self, dn: &str, changes: &[Modification]) -> GatewayResult<()> {
        tracing::debug!(dn = %dn, changes = changes.len(), "modify");
        ldap_check(
            self.connection
                .ldap()
                .modify(dn, convert::modifications(changes)),
            dn,
        )
        .map_err(|e| value_error(e, dn, changes))
    }

    fn rename_rdn(&mut self, dn: &str, new_rdn: &str) -> GatewayResult<()> {
        tracing::debug!(dn = %dn, new_rdn = %new_rdn, "modify rdn");
        check(self.connection.ldap().modifydn(dn, new_rdn, true, None), dn)
    }
}
