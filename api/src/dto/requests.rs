use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Validate, Deserialize)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 100, message = "Password must be 8-100 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// `?next=` carried through the login flow.
#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

impl NextParam {
    /// Only same-site paths are honoured. Browsers read `/\host` like `//host`.
    pub fn target(&self) -> String {
        match self.next.as_deref() {
            Some(next)
                if next.starts_with('/')
                    && !next.starts_with("//")
                    && !next.starts_with("/\\") =>
            {
                next.to_string()
            }
            _ => "/".to_string(),
        }
    }
}
