use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::path::PathBuf;

/// Assembles a Postgres connection string from `POSTGRES_*` environment
/// variables, percent-encoding the password and supporting
/// `POSTGRES_PASSWORD_FILE` as an alternative to `POSTGRES_PASSWORD`.
pub fn postgres_url_from_environment() -> String {
    #[derive(Debug, PartialEq, Deserialize)]
    struct PostgresConfig {
        user: String,
        password: Option<String>,
        password_file: Option<PathBuf>,
        #[serde(default = "default_host")]
        host: String,
        db: String,
    }

    fn default_host() -> String {
        "db".to_string()
    }

    let provider = figment::providers::Env::prefixed("POSTGRES_");
    let postgres_config: PostgresConfig = figment::Figment::from(provider)
        .extract()
        .expect("Postgres configuration environment variable(s) missing or invalid");

    let password = if let Some(password) = postgres_config.password {
        password
    } else if let Some(password_file) = postgres_config.password_file {
        std::fs::read_to_string(password_file).expect("Failed to read postgres password file")
    } else {
        panic!("One of POSTGRES_PASSWORD or POSTGRES_PASSWORD_FILE must be provided");
    };

    // Postgres truncates a password at its first newline. Trim a single
    // trailing newline (the common "echo'd into a file" case) but refuse
    // anything with an embedded newline rather than silently truncating.
    let password = password.strip_suffix('\n').unwrap_or(&password);
    if password.contains('\n') {
        panic!(
            "Postgres password contains a non-terminal newline. This would be insecurely \
            truncated; please provide a password without embedded newlines."
        );
    }

    let password = utf8_percent_encode(password, NON_ALPHANUMERIC);

    format!(
        "postgres://{}:{}@{}/{}",
        postgres_config.user, password, postgres_config.host, postgres_config.db
    )
}
