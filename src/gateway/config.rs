//! Gateway configuration and credentials.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::TaxIdentity;

pub const PRODUCTION_URL: &str = "https://api.onlineszamla.nav.gov.hu/";
pub const TESTING_URL: &str = "https://api-test.onlineszamla.nav.gov.hu/";

/// Characters of generated request and software ids.
pub(crate) const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a software id.
pub const SOFTWARE_ID_LEN: usize = 18;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Testing,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Testing => TESTING_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub environment: Environment,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transport errors and 5xx answers.
    pub max_retries: u32,
    /// Overrides the environment's base URL (proxies, mock servers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl GatewayConfig {
    /// Base URL with a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) if url.ends_with('/') => url.clone(),
            Some(url) => format!("{url}/"),
            None => self.environment.base_url().to_string(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Testing,
            timeout_secs: 30,
            max_retries: 3,
            base_url: None,
        }
    }
}

/// Technical user registered at NAV.
#[derive(Clone)]
pub struct User {
    pub login: String,
    pub password: String,
    pub sign_key: String,
    pub exchange_key: String,
    /// 8-digit taxpayer id of the issuer.
    pub tax_number: String,
}

impl User {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        sign_key: impl Into<String>,
        exchange_key: impl Into<String>,
        tax_number: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            sign_key: sign_key.into(),
            exchange_key: exchange_key.into(),
            tax_number: tax_number.into(),
        }
    }
}

// Keys stay out of logs.
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("login", &self.login)
            .field("tax_number", &self.tax_number)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoftwareOperation {
    #[default]
    OnlineService,
    LocalSoftware,
}

impl SoftwareOperation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::OnlineService => "ONLINE_SERVICE",
            Self::LocalSoftware => "LOCAL_SOFTWARE",
        }
    }
}

/// Invoicing software identification sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Software {
    pub id: String,
    pub name: String,
    pub operation: SoftwareOperation,
    pub main_version: String,
    pub dev_name: String,
    pub dev_contact: String,
    pub dev_country_code: String,
    pub dev_tax_number: String,
}

impl Software {
    /// The software id is the developer's tax identity filled up to 18
    /// characters with random `[A-Z0-9]`.
    pub fn new(
        dev_tax_id: &TaxIdentity,
        name: impl Into<String>,
        operation: SoftwareOperation,
        main_version: impl Into<String>,
        dev_name: impl Into<String>,
        dev_contact: impl Into<String>,
    ) -> Self {
        Self {
            id: software_id(dev_tax_id),
            name: name.into(),
            operation,
            main_version: main_version.into(),
            dev_name: dev_name.into(),
            dev_contact: dev_contact.into(),
            dev_country_code: dev_tax_id.country.clone(),
            dev_tax_number: dev_tax_id.code.clone(),
        }
    }
}

fn software_id(tax_id: &TaxIdentity) -> String {
    let mut id: String = tax_id.to_string().chars().take(SOFTWARE_ID_LEN).collect();
    let fill = SOFTWARE_ID_LEN.saturating_sub(id.chars().count());
    id.push_str(&random_id(fill));
    id
}

/// Random string over `[A-Z0-9]`.
pub(crate) fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}
