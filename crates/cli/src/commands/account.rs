//! Session and profile commands.

use std::path::Path;

use serde::Serialize;
use subify_storefront::error::{AppError, Result};
use subify_storefront::session::User;
use subify_storefront::{AppState, AppView};
use tracing::instrument;

use crate::output::Output;

/// What the navbar shows.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Navbar {
    authenticated: bool,
    email: Option<String>,
    avatar_initial: Option<char>,
    /// Cart line count, shown only to a signed-in user with a non-empty cart.
    cart_badge: Option<usize>,
}

impl Navbar {
    fn from_view(view: &AppView) -> Self {
        let user = view.session.user();
        let cart_badge = (view.session.is_authenticated() && !view.cart.is_empty())
            .then_some(view.cart.len());
        Self {
            authenticated: view.session.is_authenticated(),
            email: user.and_then(|u| u.email.as_ref()).map(ToString::to_string),
            avatar_initial: user.and_then(User::avatar_initial),
            cart_badge,
        }
    }
}

impl std::fmt::Display for Navbar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.authenticated {
            return f.write_str("Not signed in");
        }
        write!(
            f,
            "[{}] {}",
            self.avatar_initial.unwrap_or('?'),
            self.email.as_deref().unwrap_or("(no email)")
        )?;
        if let Some(badge) = self.cart_badge {
            write!(f, "\nCart: {badge}")?;
        }
        Ok(())
    }
}

/// Show the signed-in user and the cart badge.
///
/// # Errors
///
/// Never fails; bootstrap errors are reported as notifications.
#[instrument(skip_all)]
pub async fn whoami(state: &AppState, out: &Output) -> Result<()> {
    let navbar = Navbar::from_view(&state.context().current_view().await);
    out.emit(&navbar, || navbar.to_string());
    Ok(())
}

/// Show the signed-in user's profile details.
///
/// # Errors
///
/// Returns an error if the details cannot be fetched.
#[instrument(skip_all)]
pub async fn profile(state: &AppState, out: &Output) -> Result<()> {
    let user = fetch_details(state).await?;
    out.emit(&user, || profile_text(&user));
    Ok(())
}

/// Upload a new display picture, then show the refreshed profile.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the upload fails.
#[instrument(skip(state, out), fields(path = %path.display()))]
pub async fn upload_picture(state: &AppState, out: &Output, path: &Path) -> Result<()> {
    let sessions = state.context().sessions();
    if let Err(e) = sessions.upload_display_picture(path).await {
        state
            .notifications()
            .error(format!("Image upload failed: {e}"), None);
        return Err(e.into());
    }
    state.notifications().success("Image Uploaded!");

    let user = fetch_details(state).await?;
    out.emit(&user, || profile_text(&user));
    Ok(())
}

/// Sign out. The local cart is kept.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if nobody is signed in; a failed server
/// logout is reported as a notification.
#[instrument(skip_all)]
pub async fn logout(state: &AppState, out: &Output) -> Result<()> {
    let context = state.context();
    if !context.current_view().await.session.is_authenticated() {
        return Err(AppError::BadRequest("not signed in".to_string()));
    }

    let signed_out = context.sign_out().await;
    let session = context.current_view().await.session;
    out.emit(&session, || {
        if signed_out {
            "Signed out".to_string()
        } else {
            "Still signed in".to_string()
        }
    });
    Ok(())
}

async fn fetch_details(state: &AppState) -> Result<User> {
    match state.context().sessions().user_details().await {
        Ok(user) => Ok(user),
        Err(e) => {
            state.notifications().error(e.user_message(), None);
            Err(e.into())
        }
    }
}

fn profile_text(user: &User) -> String {
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();
    [
        format!("Name:    {}", field(user.name.as_deref())),
        format!(
            "Email:   {}",
            field(user.email.as_ref().map(subify_core::Email::as_str))
        ),
        format!("Gender:  {}", field(user.gender.as_deref())),
        format!("Role:    {}", field(user.role.as_deref())),
        format!("Picture: {}", field(user.image_url.as_deref())),
    ]
    .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use subify_core::ProductId;
    use subify_storefront::cart::CartItem;
    use subify_storefront::session::Session;

    use super::*;

    fn user() -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "email": "asha@example.com",
            "name": "Asha",
            "role": "customer"
        }))
        .unwrap()
    }

    fn view(session: Session, lines: usize) -> AppView {
        let cart = (1..=lines)
            .map(|id| {
                CartItem::new(
                    ProductId::new(i64::try_from(id).unwrap()),
                    "Thing",
                    Decimal::ONE,
                    "https://cdn.dummyjson.com/t.png",
                )
                .unwrap()
            })
            .collect();
        AppView {
            app_loading: false,
            session,
            cart,
        }
    }

    #[test]
    fn test_anonymous_navbar_has_no_badge() {
        let navbar = Navbar::from_view(&view(Session::Anonymous, 3));
        assert!(!navbar.authenticated);
        assert_eq!(navbar.cart_badge, None);
        assert_eq!(navbar.to_string(), "Not signed in");
    }

    #[test]
    fn test_authenticated_navbar() {
        let navbar = Navbar::from_view(&view(Session::Authenticated(user()), 2));
        assert_eq!(navbar.avatar_initial, Some('A'));
        assert_eq!(navbar.cart_badge, Some(2));
        assert_eq!(navbar.to_string(), "[A] asha@example.com\nCart: 2");
    }

    #[test]
    fn test_badge_hidden_for_empty_cart() {
        let navbar = Navbar::from_view(&view(Session::Authenticated(user()), 0));
        assert_eq!(navbar.cart_badge, None);
    }

    #[test]
    fn test_profile_text() {
        let text = profile_text(&user());
        assert!(text.contains("Name:    Asha"));
        assert!(text.contains("Email:   asha@example.com"));
        assert!(text.contains("Gender:  -"));
    }
}
