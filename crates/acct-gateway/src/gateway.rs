//! The directory gateway trait.
//!
//! The account engine never talks to a directory server directly. It drives
//! a [`DirectoryGateway`], which owns connection, bind and timeout concerns.
//! Every call is one round trip; the trait offers no transaction primitive.

use acct_model::DirectoryEntry;

use crate::error::GatewayResult;
use crate::filter::{Filter, SearchScope};

// ============================================================================
// Modifications
// ============================================================================

/// Kind of a single-value modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOp {
    /// Add a value to an attribute.
    Add,
    /// Delete a value from an attribute.
    Delete,
}

/// One `(op, attribute, value)` change inside a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Add or delete.
    pub op: ModifyOp,
    /// Attribute name.
    pub attribute: String,
    /// Value added or deleted.
    pub value: String,
}

impl Modification {
    /// Creates an add-value change.
    #[must_use]
    pub fn add(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: ModifyOp::Add,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a delete-value change.
    #[must_use]
    pub fn delete(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: ModifyOp::Delete,
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates the delete-then-add pair that swaps one value for another.
    #[must_use]
    pub fn replace_value(attribute: &str, old: impl Into<String>, new: impl Into<String>) -> [Self; 2] {
        [Self::delete(attribute, old), Self::add(attribute, new)]
    }
}

/// Attribute list for an add request, in submission order.
pub type AttributeList = Vec<(String, Vec<String>)>;

// ============================================================================
// Gateway
// ============================================================================

/// Search, add, modify and rename primitives against one directory.
///
/// ## Implementation Notes
///
/// - Calls are synchronous and blocking; one connection per gateway value.
/// - Implementations do not retry. A timeout surfaces immediately as
///   [`GatewayError::Timeout`](crate::GatewayError::Timeout).
/// - A modify request is applied atomically by the directory; nothing spans
///   two calls.
pub trait DirectoryGateway {
    /// Binds the connection as `dn`.
    fn bind(&mut self, dn: &str, secret: &str) -> GatewayResult<()>;

    /// Searches below `base`. An empty attribute list requests all
    /// user attributes.
    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> GatewayResult<Vec<DirectoryEntry>>;

    /// Creates an entry.
    fn add(&mut self, dn: &str, attributes: AttributeList) -> GatewayResult<()>;

    /// Applies an ordered list of value changes to one entry.
    fn modify(&mut self, dn: &str, changes: &[Modification]) -> GatewayResult<()>;

    /// Replaces the RDN of `dn` with `new_rdn`, deleting the old RDN value.
    fn rename_rdn(&mut self, dn: &str, new_rdn: &str) -> GatewayResult<()>;
}

impl<G: DirectoryGateway + ?Sized> DirectoryGateway for Box<G> {
    fn bind(&mut self, dn: &str, secret: &str) -> GatewayResult<()> {
        (**self).bind(dn, secret)
    }

    fn search(
        &mut self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> GatewayResult<Vec<DirectoryEntry>> {
        (**self).search(base, scope, filter, attributes)
    }

    fn add(&mut self, dn: &str, attributes: AttributeList) -> GatewayResult<()> {
        (**self).add(dn, attributes)
    }

    fn modify(&mut self, dn: &str, changes: &[Modification]) -> GatewayResult<()> {
        (**self).modify(dn, changes)
    }

    fn rename_rdn(&mut self, dn: &str, new_rdn: &str) -> GatewayResult<()> {
        (**self).rename_rdn(dn, new_rdn)
    }
}
