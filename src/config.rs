//! Responder configuration

/// Responder configuration, assembled from CLI flags and `OCSP_*`
/// environment variables in `main`
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// OpenSSL `index.txt` path (file backend)
    pub index_file: String,
    /// CA certificate PEM path
    pub ca_cert_file: String,
    /// Responder certificate PEM path
    pub resp_cert_file: String,
    /// Responder key PEM path (PKCS#8)
    pub resp_key_file: String,
    /// Access/error log path (ignored when `log_to_stdout` is set)
    pub log_file: String,
    pub bind_address: String,
    pub port: u16,
    /// Serve HTTPS using the responder certificate and key
    pub ssl: bool,
    /// Require `Content-Type: application/ocsp-request` on OCSP requests
    pub strict: bool,
    pub log_to_stdout: bool,
    /// MySQL backend settings (None = file backend)
    pub database: Option<DbConfig>,
}

/// MySQL DSN parts for the SQL index backend
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    pub user: String,
    pub password: String,
    /// `tcp` or `unix`
    pub protocol: String,
    /// `host[:port]` for tcp, socket path for unix
    pub address: String,
    pub name: String,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            index_file: "index.txt".to_string(),
            ca_cert_file: "ca.crt".to_string(),
            resp_cert_file: "responder.crt".to_string(),
            resp_key_file: "responder.key".to_string(),
            log_file: "/var/log/gocsp-responder.log".to_string(),
            bind_address: "0.0.0.0".to_string(),
            port: 8888,
            ssl: false,
            strict: false,
            log_to_stdout: false,
            database: None,
        }
    }
}

impl ResponderConfig {
    /// Log the effective configuration (`--verbose`)
    pub fn log(&self) {
        match &self.database {
            Some(db) => {
                tracing::info!("Index database: {}", db.name);
                tracing::info!("DB protocol: {}", db.protocol);
                tracing::info!("DB user: {}", db.user);
                tracing::info!("DB address: {}", db.address);
            }
            None => tracing::info!("Index file: {}", self.index_file),
        }
        tracing::info!("CA cert file: {}", self.ca_cert_file);
        tracing::info!("Responder cert file: {}", self.resp_cert_file);
        tracing::info!("Responder key file: {}", self.resp_key_file);
        tracing::info!("Log file: {}", self.log_file);
        tracing::info!("Bind address: {}", self.bind_address);
        tracing::info!("Listen port: {}", self.port);
        tracing::info!("Use SSL: {}", self.ssl);
        tracing::info!("Strict: {}", self.strict);
        tracing::info!("Log to stdout: {}", self.log_to_stdout);
    }
}
