// src/state/session.rs
use tracing::info;

use crate::config::settings::UserProfile;

/// Who is using the app. Only `uid` matters for ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: String,
    pub email: String,
}

impl From<&UserProfile> for Identity {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
        }
    }
}

pub trait IdentityProvider {
    fn current_user(&self) -> Option<&Identity>;
    fn sign_in(&mut self) -> Option<Identity>;
    fn sign_out(&mut self);
}

/// Signs in the single profile configured in settings.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    profile: Identity,
    signed_in: bool,
}

impl LocalIdentityProvider {
    pub fn new(profile: Identity) -> Self {
        Self {
            profile,
            signed_in: false,
        }
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current_user(&self) -> Option<&Identity> {
        self.signed_in.then_some(&self.profile)
    }

    fn sign_in(&mut self) -> Option<Identity> {
        self.signed_in = true;
        info!(uid = %self.profile.uid, "signed in");
        Some(self.profile.clone())
    }

    fn sign_out(&mut self) {
        if self.signed_in {
            info!(uid = %self.profile.uid, "signed out");
        }
        self.signed_in = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let profile = UserProfile {
            uid: "alice".to_string(),
            display_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        let mut provider = LocalIdentityProvider::new(Identity::from(&profile));
        assert!(provider.current_user().is_none());

        let who = provider.sign_in().unwrap();
        assert_eq!(who.uid, "alice");
        assert_eq!(provider.current_user().map(|i| i.uid.as_str()), Some("alice"));

        provider.sign_out();
        assert!(provider.current_user().is_none());
    }
}
