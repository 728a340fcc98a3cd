use std::fmt;
use std::str::FromStr;

use http::Method;
use tokio::time::Duration;

use crate::auth::{AccessToken, Credentials, TokenManager, TokenResponse};
use crate::config::settings::{ApiVersion, ClientConfig};
use crate::config::validator::validate_client_config;
use crate::error::{Error, Result};
use crate::query::chunk::ChunkPlan;
use crate::query::classify::{classify_status, decode_records, Outcome};
use crate::query::pagination::{PaginationScheme, RecordStream};
use crate::query::{QueryOptions, Record};
use crate::session::Session;
use crate::transport::{HttpResponse, Transport};
use crate::utils::constants::{DDL_PARAM, DOCS_PARAM, IN_FILTER_MAX_LEN, RECORD_COUNT_HEADER};
use crate::utils::diagnostics::{SharedDiagnostics, TracingDiagnostics};

/// DDL flavours the API can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// PostgreSQL
    Pg,
    /// Microsoft SQL Server
    Mssql,
}

impl SchemaDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaDialect::Pg => "pg",
            SchemaDialect::Mssql => "mssql",
        }
    }
}

impl FromStr for SchemaDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pg" => Ok(SchemaDialect::Pg),
            "mssql" => Ok(SchemaDialect::Mssql),
            other => Err(Error::query(format!(
                "Invalid DDL database '{}', expected one of: pg, mssql",
                other
            ))),
        }
    }
}

impl fmt::Display for SchemaDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for one API key / client-credentials identity.
///
/// ```no_run
/// use direct_access::{ClientConfig, DirectAccess, QueryOptions};
///
/// # async fn run() -> direct_access::Result<()> {
/// let config = ClientConfig::from_env();
/// let mut client = DirectAccess::new(config).await?;
///
/// let options = QueryOptions::new().page_size(10000).with("deleteddate", "null");
/// let mut rigs = client.query("rigs", options)?;
/// while let Some(rig) = rigs.next().await? {
///     println!("{:?}", rig.get("RigID"));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirectAccess {
    session: Session,
    version: ApiVersion,
    in_filter_max_len: usize,
}

impl DirectAccess {
    /// Build a client that logs through `tracing` at the configured level.
    ///
    /// For the token-based API this acquires a token right away unless
    /// `access_token` is set.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let diagnostics = TracingDiagnostics::shared(config.log_level);
        Self::with_diagnostics(config, diagnostics).await
    }

    pub async fn with_diagnostics(config: ClientConfig, diagnostics: SharedDiagnostics) -> Result<Self> {
        validate_client_config(&config).map_err(|errors| Error::Config(errors.join("; ")))?;

        let version = config.api_version;
        let credentials = Credentials::from_config(&config, version.uses_tokens())?;
        let transport = Transport::new(&config, diagnostics.clone())?;
        let api_url = config.api_url();

        let tokens = if version.uses_tokens() {
            let manager = TokenManager::new(
                credentials,
                &api_url,
                config.retries,
                Duration::from_secs(config.throttle_backoff_secs),
                diagnostics.clone(),
            );
            Some(match config.access_token.as_deref().filter(|t| !t.is_empty()) {
                Some(token) => manager.with_token(token),
                None => manager,
            })
        } else {
            None
        };

        let mut session = Session::new(transport, tokens, api_url, config.retries.saturating_add(1));
        if session.tokens().is_some_and(|t| t.access_token().is_none()) {
            session.refresh_token().await?;
        }

        Ok(Self {
            session,
            version,
            in_filter_max_len: IN_FILTER_MAX_LEN,
        })
    }

    pub fn api_version(&self) -> ApiVersion {
        self.version
    }

    /// Current bearer token, shareable with other client instances.
    pub fn access_token(&self) -> Option<&str> {
        self.session.tokens().and_then(TokenManager::access_token)
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.session.tokens().and_then(TokenManager::token)
    }

    /// Successful token grants performed by this instance.
    pub fn token_acquisitions(&self) -> u32 {
        self.session.tokens().map(TokenManager::acquisitions).unwrap_or(0)
    }

    /// Force a new client-credentials grant.
    pub async fn acquire_token(&mut self) -> Result<TokenResponse> {
        self.session.refresh_token().await
    }

    /// Override the serialized length at which `in(...)` filters are split.
    pub fn set_in_filter_max_len(&mut self, max_len: usize) {
        self.in_filter_max_len = max_len.max(1);
    }

    /// Lazily query a dataset. Nothing is sent until the first pull.
    pub fn query(&mut self, dataset: &str, options: QueryOptions) -> Result<RecordStream<'_>> {
        validate_dataset(dataset)?;
        let scheme = match self.version {
            ApiVersion::V1 => PaginationScheme::PageNumber,
            ApiVersion::V2 => PaginationScheme::Link,
        };
        RecordStream::new(&mut self.session, dataset, options, scheme, self.in_filter_max_len)
    }

    /// Number of records matching `options`, read from the count header of a
    /// HEAD request. Oversized in-list filters are counted chunk by chunk.
    pub async fn count(&mut self, dataset: &str, options: &QueryOptions) -> Result<u64> {
        validate_dataset(dataset)?;
        let url = self.session.dataset_url(dataset);
        let mut chunks = ChunkPlan::from_options(options, self.in_filter_max_len);

        let mut total = 0u64;
        loop {
            let params = chunks.apply(options).to_params();
            total += self
                .session
                .execute(Method::HEAD, &url, &params, dataset, classify_count)
                .await?;
            if !chunks.advance() {
                return Ok(total);
            }
        }
    }

    /// DDL for the dataset in the requested dialect (`pg` or `mssql`).
    pub async fn schema(&mut self, dataset: &str, dialect: &str) -> Result<String> {
        let dialect = SchemaDialect::from_str(dialect)?;
        self.schema_for(dataset, dialect).await
    }

    pub async fn ddl(&mut self, dataset: &str, database: &str) -> Result<String> {
        self.schema(dataset, database).await
    }

    pub async fn schema_for(&mut self, dataset: &str, dialect: SchemaDialect) -> Result<String> {
        validate_dataset(dataset)?;
        let url = self.session.dataset_url(dataset);
        let params = vec![(DDL_PARAM.to_string(), dialect.as_str().to_string())];
        self.session
            .execute(Method::GET, &url, &params, dataset, |response, dataset| {
                match classify_status(response, dataset) {
                    Outcome::Success(()) => Outcome::Success(response.body.clone()),
                    Outcome::Reauthenticate => Outcome::Reauthenticate,
                    Outcome::Fatal(e) => Outcome::Fatal(e),
                }
            })
            .await
    }

    /// Field documentation. `None` when the dataset has none (501).
    pub async fn docs(&mut self, dataset: &str) -> Result<Option<Vec<Record>>> {
        validate_dataset(dataset)?;
        let url = self.session.dataset_url(dataset);
        let params = vec![(DOCS_PARAM.to_string(), "true".to_string())];
        self.session
            .execute(Method::GET, &url, &params, dataset, classify_docs)
            .await
    }
}

fn validate_dataset(dataset: &str) -> Result<()> {
    if dataset.trim().is_empty() || dataset.contains(['/', '?', '#', ' ']) {
        return Err(Error::Dataset(dataset.to_string()));
    }
    Ok(())
}

fn classify_count(response: &HttpResponse, dataset: &str) -> Outcome<u64> {
    match classify_status(response, dataset) {
        Outcome::Success(()) => {}
        Outcome::Reauthenticate => return Outcome::Reauthenticate,
        Outcome::Fatal(e) => return Outcome::Fatal(e),
    }
    match response.header_str(RECORD_COUNT_HEADER).map(|v| v.trim().parse::<u64>()) {
        Some(Ok(count)) => Outcome::Success(count),
        Some(Err(e)) => Outcome::Fatal(Error::query(format!("invalid {} header: {}", RECORD_COUNT_HEADER, e))),
        None => Outcome::Fatal(Error::query(format!("response is missing the {} header", RECORD_COUNT_HEADER))),
    }
}

fn classify_docs(response: &HttpResponse, dataset: &str) -> Outcome<Option<Vec<Record>>> {
    if response.status.as_u16() == 501 {
        return Outcome::Success(None);
    }
    match classify_status(response, dataset) {
        Outcome::Success(()) => match decode_records(&response.body) {
            Ok(docs) => Outcome::Success(Some(docs)),
            Err(e) => Outcome::Fatal(e),
        },
        Outcome::Reauthenticate => Outcome::Reauthenticate,
        Outcome::Fatal(e) => Outcome::Fatal(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_tags() {
        assert_eq!("pg".parse::<SchemaDialect>().unwrap(), SchemaDialect::Pg);
        assert_eq!("mssql".parse::<SchemaDialect>().unwrap(), SchemaDialect::Mssql);
        assert!("invalid".parse::<SchemaDialect>().unwrap_err().is_query_error());
        assert_eq!(SchemaDialect::Mssql.to_string(), "mssql");
    }

    #[test]
    fn dataset_names_are_path_segments() {
        assert!(validate_dataset("well-origins").is_ok());
        assert!(validate_dataset("").unwrap_err().is_dataset_error());
        assert!(validate_dataset("rigs/../tokens").unwrap_err().is_dataset_error());
        assert!(validate_dataset("rigs?x=1").is_err());
    }
}
