//! Authentication state and the user service client.

mod client;

pub use client::SessionClient;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subify_core::Email;
use tracing::warn;

/// A user record as returned by the user service.
///
/// Known fields are typed; anything else the service sends is kept in
/// `extra` so no profile field is lost.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `None` when the service omits the address or sends one that does not
    /// parse.
    #[serde(
        default,
        deserialize_with = "lenient_email",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Avatar letter shown in the navbar.
    #[must_use]
    pub fn avatar_initial(&self) -> Option<char> {
        self.email.as_ref().and_then(Email::initial)
    }
}

fn lenient_email<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Email>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match Email::parse(&raw) {
        Ok(email) => Ok(Some(email)),
        Err(error) => {
            warn!(%error, "Ignoring invalid email on user record");
            Ok(None)
        }
    }
}

/// Who is using the storefront.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    /// Startup state, and the state after signing out.
    #[default]
    Anonymous,
    /// Set only by a successful bootstrap.
    Authenticated(User),
}

impl Session {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

/// Serializes as `{ "isAuthenticated": bool, ...userFields }`.
impl Serialize for Session {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Flat<'a> {
            is_authenticated: bool,
            #[serde(flatten)]
            user: Option<&'a User>,
        }

        Flat {
            is_authenticated: self.is_authenticated(),
            user: self.user(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keeps_unknown_fields() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "665f1c",
            "email": "asha@subify.in",
            "role": "customer",
            "imageUrl": "https://img.subify.in/a.png",
            "createdAt": "2025-06-01T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(user.id.as_deref(), Some("665f1c"));
        assert_eq!(user.avatar_initial(), Some('A'));
        assert_eq!(user.extra["createdAt"], "2025-06-01T10:00:00Z");
    }

    #[test]
    fn test_blank_or_malformed_email_still_decodes() {
        for email in ["", "   ", "not-an-email"] {
            let user: User = serde_json::from_value(serde_json::json!({
                "_id": "1",
                "email": email,
                "name": "Asha",
            }))
            .unwrap();
            assert_eq!(user.email, None, "{email:?}");
            assert_eq!(user.name.as_deref(), Some("Asha"));
            assert_eq!(user.avatar_initial(), None);
        }

        let user: User =
            serde_json::from_value(serde_json::json!({ "_id": "1", "email": null })).unwrap();
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_anonymous_serializes_flag_only() {
        let json = serde_json::to_value(Session::Anonymous).unwrap();
        assert_eq!(json, serde_json::json!({ "isAuthenticated": false }));
    }

    #[test]
    fn test_authenticated_spreads_user_fields() {
        let user = User {
            email: Some(Email::parse("asha@subify.in").unwrap()),
            role: Some("customer".to_string()),
            ..User::default()
        };
        let json = serde_json::to_value(Session::Authenticated(user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "isAuthenticated": true,
                "email": "asha@subify.in",
                "role": "customer",
            })
        );
    }
}
