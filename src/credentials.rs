// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generated credentials for the compose deployment

use rand::distributions::Alphanumeric;
use rand::Rng;

pub const PASSWORD_LENGTH: usize = 32;
pub const SECRET_KEY_LENGTH: usize = 50;

/// Alphanumeric only, so values embed into YAML and Python literals without escaping
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Credentials written into the compose descriptor and settings file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub database_password: String,
    pub admin_user: String,
    pub admin_password: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn generate(admin_user: &str) -> Self {
        Self {
            database_password: generate_token(PASSWORD_LENGTH),
            admin_user: admin_user.to_string(),
            admin_password: generate_token(PASSWORD_LENGTH),
            secret_key: generate_token(SECRET_KEY_LENGTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_charset() {
        let token = generate_token(64);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_credentials_are_distinct() {
        let creds = Credentials::generate("admin");
        assert_eq!(creds.admin_user, "admin");
        assert_eq!(creds.secret_key.len(), SECRET_KEY_LENGTH);
        assert_ne!(creds.database_password, creds.admin_password);
        assert_ne!(creds, Credentials::generate("admin"));
    }
}
