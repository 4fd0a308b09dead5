use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Credentials for bridge metadata requests.
///
/// The bridge never sees the plain password: the basic-auth secret is the
/// lowercase hex SHA-256 of it.
#[derive(Clone, Default)]
pub struct BridgeAuth {
    pub user:     Option<String>,
    pub password: Option<String>,
    pub token:    Option<String>,
}

impl std::fmt::Debug for BridgeAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeAuth")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl BridgeAuth {
    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            token: None,
        }
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `Basic base64(user:sha256hex(password))`, when both parts are set.
    pub fn authorization(&self) -> Option<String> {
        let (user, password) = self.user.as_ref().zip(self.password.as_ref())?;
        let secret = shardline_verify::hash_password(password);
        Some(format!("Basic {}", STANDARD.encode(format!("{user}:{secret}"))))
    }

    /// Headers to attach to a bridge request.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(value) = self.authorization() {
            headers.push(("Authorization".to_string(), value));
        }
        if let Some(token) = &self.token {
            headers.push(("X-Token".to_string(), token.clone()));
        }
        headers
    }
}
