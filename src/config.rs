//! Server, host and document configuration.
//!
//! Every setting is a string looked up through [`Config::get`], which falls
//! back to a built-in default and then to the empty string. The tables are
//! built once from a TOML file before the server starts and are only read
//! afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::http::parser::ReadLimits;
use crate::http::status::Status;

pub const SERVER_SOFTWARE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

static DEFAULTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("address", "0.0.0.0"),
        ("port", "80"),
        ("timeout", "0"),
        ("maxheadersize", "8192"),
        ("maxbodysize", "1048576"),
        ("index", "index.html,index.htm"),
        ("root", "/var/www/html/"),
        ("symlinks", "no"),
        ("defaultmime", "text/html"),
        ("defaultprotocol", "HTTP/1.1"),
        ("servername", SERVER_SOFTWARE),
        ("interpreter", "php-cgi"),
        ("interpreterext", "php"),
    ])
});

static EMPTY: Lazy<Config> = Lazy::new(Config::default);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Explicit value, else the built-in default, else `""`.
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .map(String::as_str)
            .or_else(|| DEFAULTS.get(key).copied())
            .unwrap_or("")
    }

    pub fn is_yes(&self, key: &str) -> bool {
        self.get(key) == "yes"
    }
}

/// A virtual host: its own settings plus per-path document settings.
#[derive(Debug, Clone)]
pub struct Host {
    hostname: String,
    config: Config,
    documents: HashMap<String, Config>,
}

impl Host {
    pub fn new(hostname: &str, config: Config, documents: HashMap<String, Config>) -> Self {
        Self {
            hostname: hostname.to_string(),
            config,
            documents,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get(&self, key: &str) -> &str {
        self.config.get(key)
    }

    pub fn root(&self) -> &str {
        self.get("root")
    }

    pub fn is_default(&self) -> bool {
        self.config.is_yes("default")
    }

    pub fn follows_symlinks(&self) -> bool {
        self.config.is_yes("symlinks")
    }

    pub fn lists_directories(&self) -> bool {
        self.config.is_yes("directorylisting")
    }

    pub fn index_pages(&self) -> impl Iterator<Item = &str> {
        self.get("index")
            .split(',')
            .map(str::trim)
            .filter(|page| !page.is_empty())
    }

    /// Settings for a document path; unknown paths get an empty config.
    pub fn document_config(&self, path: &str) -> &Config {
        self.documents.get(path).unwrap_or(&EMPTY)
    }

    /// Custom error document for `status`, document level first.
    pub fn error_document(&self, path: &str, status: Status) -> &str {
        let code = status.code().to_string();
        match self.document_config(path).get(&code) {
            "" => self.get(&code),
            doc => doc,
        }
    }
}

/// The server-wide settings and every virtual host.
#[derive(Debug)]
pub struct Sites {
    settings: Config,
    hosts: HashMap<String, Arc<Host>>,
    default_host: Arc<Host>,
}

impl Sites {
    pub fn new(settings: Config, hosts: Vec<Host>) -> Result<Self, ConfigError> {
        let mut default_host: Option<Arc<Host>> = None;
        let mut table = HashMap::new();

        for host in hosts {
            validate_host(&host)?;
            let host = Arc::new(host);
            if host.is_default() {
                if let Some(previous) = &default_host {
                    return Err(ConfigError::SeveralDefaultHosts(
                        previous.hostname().to_string(),
                        host.hostname().to_string(),
                    ));
                }
                default_host = Some(Arc::clone(&host));
            }
            table.insert(host.hostname().to_string(), host);
        }

        if table.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        let default_host = default_host.ok_or(ConfigError::NoDefaultHost)?;

        Ok(Self {
            settings,
            hosts: table,
            default_host,
        })
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn from_toml(content: &str, path: &str) -> Result<Self, ConfigError> {
        let file = toml::from_str::<ServerFile>(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        let sites = file.into_sites()?;
        debug!("Loaded {} host(s) from {}", sites.hosts.len(), path);
        Ok(sites)
    }

    pub fn settings(&self) -> &Config {
        &self.settings
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Arc<Host>> {
        self.hosts.values()
    }

    pub fn default_host(&self) -> Arc<Host> {
        Arc::clone(&self.default_host)
    }

    /// Selects the host named by a `Host` header, ignoring any port suffix.
    pub fn host_for(&self, host_header: &str) -> Arc<Host> {
        let without_port = host_header
            .rsplit_once(':')
            .map(|(name, _)| name)
            .unwrap_or(host_header);

        self.hosts
            .get(host_header)
            .or_else(|| self.hosts.get(without_port))
            .map(Arc::clone)
            .unwrap_or_else(|| self.default_host())
    }

    /// Idle read timeout; `timeout` is in milliseconds and 0 means unbounded.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.settings.get("timeout").trim().parse::<u64>() {
            Ok(0) | Err(_) => None,
            Ok(ms) => Some(Duration::from_millis(ms)),
        }
    }

    /// Size limits and idle timeout for reading requests. Unparsable sizes
    /// fall back to the built-in limits.
    pub fn read_limits(&self) -> ReadLimits {
        let defaults = ReadLimits::default();
        let size = |key: &str| self.settings.get(key).trim().parse::<usize>().ok();
        ReadLimits {
            idle: self.idle_timeout(),
            max_header_size: size("maxheadersize").unwrap_or(defaults.max_header_size),
            max_body_size: size("maxbodysize").unwrap_or(defaults.max_body_size),
        }
    }

    /// Every host's root must be a readable directory.
    pub fn check_roots(&self) -> Result<(), ConfigError> {
        for host in self.hosts() {
            let root = Path::new(host.root());
            let readable = root.is_dir() && fs::read_dir(root).is_ok();
            if !readable {
                return Err(ConfigError::UnreadableRoot {
                    hostname: host.hostname().to_string(),
                    root: host.root().to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_host(host: &Host) -> Result<(), ConfigError> {
    if host.root().is_empty() {
        return Err(ConfigError::EmptyRoot(host.hostname().to_string()));
    }

    let check = |config: &Config, context: String| -> Result<(), ConfigError> {
        match config.get("status") {
            "" => Ok(()),
            code => Status::parse(code)
                .map(|_| ())
                .map_err(|source| ConfigError::Status { context, source }),
        }
    };

    check(host.config(), host.hostname().to_string())?;
    for (path, config) in &host.documents {
        check(config, format!("{}{}", host.hostname(), path))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ServerFile {
    port: Option<u16>,
    address: Option<String>,
    timeout: Option<u64>,
    maxheadersize: Option<usize>,
    maxbodysize: Option<usize>,
    defaultmime: Option<String>,
    defaultprotocol: Option<String>,
    servername: Option<String>,
    interpreter: Option<String>,
    interpreterext: Option<String>,

    #[serde(default, rename = "host")]
    hosts: Vec<HostFile>,
}

#[derive(Debug, Deserialize)]
struct HostFile {
    hostname: String,
    #[serde(default)]
    default: bool,
    root: Option<String>,
    symlinks: Option<bool>,
    directorylisting: Option<bool>,
    index: Option<Vec<String>>,
    status: Option<u16>,

    #[serde(default)]
    errors: IndexMap<String, String>,
    #[serde(default)]
    headers: IndexMap<String, String>,
    #[serde(default, rename = "document")]
    documents: Vec<DocumentFile>,
}

#[derive(Debug, Deserialize)]
struct DocumentFile {
    path: String,
    status: Option<u16>,
    auth: Option<AuthFile>,

    #[serde(default)]
    errors: IndexMap<String, String>,
    #[serde(default)]
    headers: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AuthFile {
    #[serde(rename = "type", default = "basic_auth")]
    kind: String,
    #[serde(default)]
    realm: String,
    #[serde(default)]
    file: String,
}

fn basic_auth() -> String {
    "Basic".to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Header tables are stored as one `Name:Value` pair per CRLF-terminated line.
fn header_blob(headers: &IndexMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\r\n"))
        .collect()
}

fn insert_error_documents(
    config: &mut Config,
    errors: &IndexMap<String, String>,
    context: &str,
) -> Result<(), ConfigError> {
    for (code, document) in errors {
        let status = Status::parse(code).map_err(|source| ConfigError::Status {
            context: format!("error document of {context}"),
            source,
        })?;
        config.insert(&status.code().to_string(), document);
    }
    Ok(())
}

impl ServerFile {
    fn into_sites(self) -> Result<Sites, ConfigError> {
        let mut settings = Config::new();
        let server_values = [
            ("port", self.port.map(|p| p.to_string())),
            ("address", self.address),
            ("timeout", self.timeout.map(|t| t.to_string())),
            ("maxheadersize", self.maxheadersize.map(|n| n.to_string())),
            ("maxbodysize", self.maxbodysize.map(|n| n.to_string())),
            ("defaultmime", self.defaultmime),
            ("defaultprotocol", self.defaultprotocol),
            ("servername", self.servername),
            ("interpreter", self.interpreter),
            ("interpreterext", self.interpreterext),
        ];
        for (key, value) in server_values {
            if let Some(value) = value {
                settings.insert(key, &value);
            }
        }

        let hosts = self
            .hosts
            .into_iter()
            .map(HostFile::into_host)
            .collect::<Result<Vec<_>, _>>()?;

        Sites::new(settings, hosts)
    }
}

impl HostFile {
    fn into_host(self) -> Result<Host, ConfigError> {
        let mut config = Config::new().with("hostname", &self.hostname);
        config.insert("default", yes_no(self.default));
        if let Some(root) = &self.root {
            config.insert("root", root);
        }
        if let Some(symlinks) = self.symlinks {
            config.insert("symlinks", yes_no(symlinks));
        }
        if let Some(listing) = self.directorylisting {
            config.insert("directorylisting", yes_no(listing));
        }
        if let Some(index) = &self.index {
            config.insert("index", &index.join(","));
        }
        if let Some(status) = self.status {
            config.insert("status", &status.to_string());
        }
        config.insert("headers", &header_blob(&self.headers));
        insert_error_documents(&mut config, &self.errors, &self.hostname)?;

        let mut documents = HashMap::new();
        for document in self.documents {
            let context = format!("{}{}", self.hostname, document.path);
            let mut doc_config = Config::new().with("headers", &header_blob(&document.headers));
            if let Some(status) = document.status {
                doc_config.insert("status", &status.to_string());
            }
            if let Some(auth) = &document.auth {
                doc_config.insert("authType", &auth.kind);
                doc_config.insert("authRealm", &auth.realm);
                doc_config.insert("authFile", &auth.file);
            }
            insert_error_documents(&mut doc_config, &document.errors, &context)?;
            documents.insert(document.path, doc_config);
        }

        Ok(Host::new(&self.hostname, config, documents))
    }
}
