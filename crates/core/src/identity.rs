use intake_types::AssistantOverrides;

/// Substituted for `{{username}}` when nobody is signed in.
pub const ANONYMOUS_NAME: &str = "there";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
}

impl UserIdentity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// The authentication collaborator, seen from here as a single query.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// An identity fixed at startup (CLI flag or environment).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<UserIdentity>);

impl StaticIdentity {
    pub fn new(user: Option<UserIdentity>) -> Self {
        Self(user)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.0.clone()
    }
}

/// Per-call overrides that personalize the greeting.
pub fn greeting_overrides(identity: &dyn IdentityProvider) -> AssistantOverrides {
    let name = identity
        .current_user()
        .map(|user| user.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
    AssistantOverrides::new().with_variable("username", &name)
}
