// Runtime configuration.
//
// Everything the service needs is read once at startup into `AppConfig`
// and handed to the services by value. Nothing reads the environment at
// request time.
//
// **Environment Variables:**
// - `BIND_ADDR` - Address to listen on (default `0.0.0.0:8080`)
// - `DOCS_BACKEND` - `google` (default) or `memory`
// - `TEMPLATE_DOC_ID` - Template copied by the create handler
// - `HEADER_FOOTER_TEMPLATE_ID` - Header/footer source (falls back to `TEMPLATE_DOC_ID`)
// - `PDF_FOLDER_ID` - Fixed folder for PDF exports (default: the source's parent)
// - `GOOGLE_SERVICE_ACCOUNT_KEY` / `GOOGLE_SERVICE_ACCOUNT_JSON` - read by the Google backend

use std::net::SocketAddr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid BIND_ADDR '{0}'")]
    InvalidBindAddr(String),

    #[error("Unknown DOCS_BACKEND '{0}' (expected 'google' or 'memory')")]
    UnknownBackend(String),
}

/// Which implementation sits behind the store ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Google,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Google => "google",
            Backend::Memory => "memory",
        }
    }
}

/// Settings the publishing services need. Passed in at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishConfig {
    pub template_doc_id: Option<String>,
    pub header_footer_template_id: Option<String>,
    pub pdf_folder_id: Option<String>,
}

impl PublishConfig {
    pub fn with_template(template_doc_id: impl Into<String>) -> Self {
        Self {
            template_doc_id: Some(template_doc_id.into()),
            ..Self::default()
        }
    }

    /// The header/footer source, falling back to the document template.
    pub fn header_footer_source(&self) -> Option<&str> {
        self.header_footer_template_id
            .as_deref()
            .or(self.template_doc_id.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub backend: Backend,
    pub publishing: PublishConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;

        let backend = match get("DOCS_BACKEND").map(|b| b.to_lowercase()).as_deref() {
            None | Some("google") => Backend::Google,
            Some("memory") => Backend::Memory,
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            bind_addr,
            backend,
            publishing: PublishConfig {
                template_doc_id: get("TEMPLATE_DOC_ID"),
                header_footer_template_id: get("HEADER_FOOTER_TEMPLATE_ID"),
                pdf_folder_id: get("PDF_FOLDER_ID"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.backend, Backend::Google);
        assert_eq!(config.publishing, PublishConfig::default());
    }

    #[test]
    fn reads_publishing_settings_and_ignores_blanks() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DOCS_BACKEND", "Memory"),
            ("TEMPLATE_DOC_ID", " tmpl-1 "),
            ("HEADER_FOOTER_TEMPLATE_ID", "   "),
            ("PDF_FOLDER_ID", "folder-9"),
            ("BIND_ADDR", "127.0.0.1:3000"),
        ]))
        .unwrap();

        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.publishing.template_doc_id.as_deref(), Some("tmpl-1"));
        assert_eq!(config.publishing.header_footer_template_id, None);
        assert_eq!(config.publishing.pdf_folder_id.as_deref(), Some("folder-9"));
    }

    #[test]
    fn header_footer_source_falls_back_to_template() {
        let mut publishing = PublishConfig::with_template("tmpl");
        assert_eq!(publishing.header_footer_source(), Some("tmpl"));

        publishing.header_footer_template_id = Some("hf".to_string());
        assert_eq!(publishing.header_footer_source(), Some("hf"));

        assert_eq!(PublishConfig::default().header_footer_source(), None);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("DOCS_BACKEND", "sharepoint")])).unwrap_err(),
            ConfigError::UnknownBackend("sharepoint".to_string())
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("BIND_ADDR", "nope")])).unwrap_err(),
            ConfigError::InvalidBindAddr("nope".to_string())
        );
    }
}
