//! Authorization of category commands.
//!
//! Roles are stored by the platform; commands only see the acting principal
//! with its resolved [`Role`] and ask an [`AccessPolicy`] for a decision.

use std::fmt;

/// Fixed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

/// The principal invoking a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Platform user or client id.
    pub id: String,

    /// Role resolved for this request.
    pub role: Role,
}

impl Actor {
    /// Creates an actor with the given role.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Creates an actor holding the administrative role.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Returns true if the actor holds the administrative role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Commands subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Create,
    Update,
    Delete,
}

impl CommandKind {
    /// Stable lowercase name, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Decides whether an actor may run a command.
pub trait AccessPolicy: Send + Sync {
    fn check(&self, actor: &Actor, command: CommandKind) -> Access;
}

/// Allows every command to administrators and nothing to anyone else.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminOnly;

impl AccessPolicy for AdminOnly {
    fn check(&self, actor: &Actor, _command: CommandKind) -> Access {
        if actor.is_admin() {
            Access::Allow
        } else {
            Access::Deny
        }
    }
}
