use crate::guard::{visible_nav, NavItem};
use crate::session::{AuthContext, Role};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub email: Option<String>,
    /// First two characters of the email, uppercased, for the avatar.
    pub initials: String,
    pub role: Option<Role>,
    pub nav: Vec<&'static NavItem>,
}

pub fn initials(email: &str) -> String {
    email.chars().take(2).collect::<String>().to_uppercase()
}

pub fn view(auth: &AuthContext) -> Dashboard {
    let email = auth.user().map(|u| u.email.clone());
    Dashboard {
        initials: email.as_deref().map(initials).unwrap_or_default(),
        role: auth.role(),
        nav: visible_nav(auth.role()),
        email,
    }
}
