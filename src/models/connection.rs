//! Connection-related data models.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Where and as whom to connect. No schema is selected on the connection;
/// every statement names its schema explicitly.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Contains sensitive data - never log
    pub password: String,
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `host:port`, for log lines and error messages.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get a display-safe version of the connection target (password masked).
    pub fn masked(&self) -> String {
        match (self.user.is_empty(), self.password.is_empty()) {
            (true, _) => self.target(),
            (false, true) => format!("{}@{}", self.user, self.target()),
            (false, false) => format!("{}:****@{}", self.user, self.target()),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, "", "")
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 3306);
        assert!(settings.user.is_empty());
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_masked_hides_password() {
        let settings = ConnectionSettings::new("db.internal", 3307, "root", "secret");
        let masked = settings.masked();
        assert!(!masked.contains("secret"));
        assert_eq!(masked, "root:****@db.internal:3307");
    }

    #[test]
    fn test_masked_without_credentials() {
        assert_eq!(ConnectionSettings::default().masked(), "localhost:3306");
        let settings = ConnectionSettings::new("h", 1, "app", "");
        assert_eq!(settings.masked(), "app@h:1");
    }

    #[test]
    fn test_debug_never_prints_password() {
        let settings = ConnectionSettings::new("h", 1, "app", "hunter2");
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
