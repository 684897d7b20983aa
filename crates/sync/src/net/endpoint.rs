use std::fmt;

pub const DEVELOPMENT_PORT: u16 = 8000;
pub const PRODUCTION_PORT: u16 = 80;
pub const SOCKET_PATH: &str = "/ws";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    pub fn default_port(&self) -> u16 {
        match self {
            Profile::Development => DEVELOPMENT_PORT,
            Profile::Production => PRODUCTION_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("host is empty")]
    EmptyHost,
    #[error("invalid host {0:?}")]
    InvalidHost(String),
    #[error("port must be non-zero")]
    ZeroPort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::for_profile("localhost", Profile::Development)
    }
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: SOCKET_PATH.to_string(),
        }
    }

    pub fn for_profile(host: impl Into<String>, profile: Profile) -> Self {
        Self::new(host, profile.default_port())
    }

    pub fn validate(&self) -> Result<(), EndpointError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        if host.len() != self.host.len()
            || host.contains(|c: char| c.is_whitespace() || c == '/' || c == '?' || c == '#')
        {
            return Err(EndpointError::InvalidHost(self.host.clone()));
        }
        if self.port == 0 {
            return Err(EndpointError::ZeroPort);
        }
        Ok(())
    }

    pub fn url(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("ws://{}:{}{}", host, self.port, path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_ports() {
        assert_eq!(Endpoint::default().url(), "ws://localhost:8000/ws");
        assert_eq!(
            Endpoint::for_profile("quiz.local", Profile::Production).url(),
            "ws://quiz.local:80/ws"
        );
    }

    #[test]
    fn test_ipv6_host_bracketed() {
        assert_eq!(Endpoint::new("::1", 9000).url(), "ws://[::1]:9000/ws");
    }

    #[test]
    fn test_validation() {
        assert_eq!(Endpoint::new("", 80).validate(), Err(EndpointError::EmptyHost));
        assert_eq!(
            Endpoint::new("a/b", 80).validate(),
            Err(EndpointError::InvalidHost("a/b".to_string()))
        );
        assert_eq!(Endpoint::new("localhost", 0).validate(), Err(EndpointError::ZeroPort));
        assert!(Endpoint::new("127.0.0.1", 8000).validate().is_ok());
    }
}
