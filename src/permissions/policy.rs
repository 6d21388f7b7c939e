// Permission model - capability descriptors attached to accounts
//
// Every account carries one immutable PermissionSet fixed at provisioning
// time. The settlement layer consults it before admitting any account
// update, so a sub-ledger whose permissions deviate from the controller's
// template is never treated as authoritative supply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of authorization attached to an account update
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationKind {
    /// No authorization attached
    None,
    /// Owner signature over the update digest
    Signature,
    /// Verified execution of a named verification program
    Proof,
}

/// A single permission atom: what authorization a controlled aspect demands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    /// No authorization required - any touch is admitted
    None,
    /// Only the account owner's signature is admitted
    Signature,
    /// Only a verified proof of the account's bound program is admitted
    Proof,
    /// Nothing is ever admitted; the aspect is frozen
    Impossible,
}

impl Permission {
    /// Whether an authorization of the given kind satisfies this permission
    pub fn admits(&self, kind: AuthorizationKind) -> bool {
        match self {
            Permission::None => true,
            Permission::Signature => kind == AuthorizationKind::Signature,
            Permission::Proof => kind == AuthorizationKind::Proof,
            Permission::Impossible => false,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::None => "none",
            Permission::Signature => "signature",
            Permission::Proof => "proof",
            Permission::Impossible => "impossible",
        };
        write!(f, "{}", s)
    }
}

/// Permission set governing the five controlled aspects of an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Editing application state (the sub-ledger counter, the commitment)
    pub edit_state: Permission,
    /// Debiting balance out of the account
    pub send: Permission,
    /// Replacing the bound verification program
    pub set_program: Permission,
    /// Replacing this permission set itself
    pub set_permissions: Permission,
    /// Touching the account at all (reads included)
    pub access: Permission,
}

impl PermissionSet {
    /// Template for plain balance-holding accounts
    pub fn user() -> Self {
        Self {
            edit_state: Permission::Signature,
            send: Permission::Signature,
            set_program: Permission::Signature,
            set_permissions: Permission::Signature,
            access: Permission::None,
        }
    }

    /// Restrictive template the controller installs on every sub-ledger:
    /// state edits only via proof of the bound program, program and
    /// permission changes forbidden outright.
    pub fn sub_ledger() -> Self {
        Self {
            edit_state: Permission::Proof,
            send: Permission::Proof,
            set_program: Permission::Impossible,
            set_permissions: Permission::Impossible,
            access: Permission::None,
        }
    }

    /// Template for the controller account itself. The access policy is the
    /// one deploy-time configurable axis; everything else is fixed.
    pub fn controller(access: Permission) -> Self {
        Self {
            edit_state: Permission::Proof,
            send: Permission::Proof,
            set_program: Permission::Impossible,
            set_permissions: Permission::Impossible,
            access,
        }
    }

    /// Start a builder seeded with the plain-account template
    pub fn builder() -> PermissionSetBuilder {
        PermissionSetBuilder::new()
    }
}

/// Builder producing an immutable PermissionSet
///
/// Adversarial tests use this to assemble deliberately weakened sets; the
/// provisioning handshake is what must reject them.
#[derive(Clone, Debug)]
pub struct PermissionSetBuilder {
    set: PermissionSet,
}

impl PermissionSetBuilder {
    /// Create a builder seeded with the plain-account template
    pub fn new() -> Self {
        Self {
            set: PermissionSet::user(),
        }
    }

    /// Set the edit-state permission
    pub fn with_edit_state(mut self, permission: Permission) -> Self {
        self.set.edit_state = permission;
        self
    }

    /// Set the send permission
    pub fn with_send(mut self, permission: Permission) -> Self {
        self.set.send = permission;
        self
    }

    /// Set the set-program permission
    pub fn with_set_program(mut self, permission: Permission) -> Self {
        self.set.set_program = permission;
        self
    }

    /// Set the set-permissions permission
    pub fn with_set_permissions(mut self, permission: Permission) -> Self {
        self.set.set_permissions = permission;
        self
    }

    /// Set the access permission
    pub fn with_access(mut self, permission: Permission) -> Self {
        self.set.access = permission;
        self
    }

    /// Finalize the set
    pub fn build(self) -> PermissionSet {
        self.set
    }
}

impl Default for PermissionSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
