use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{find_network, ApiEnvelope, NetworkConf, SiteSummary};
use super::ControllerApi;
use crate::error::{MigrateError, Result};
use crate::translate::ReservationPayload;

/// Applied to every request unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "x-api-key";
const SELF_PATH: &str = "/proxy/network/api/self";
const SITES_PATH: &str = "/proxy/network/api/self/sites";

/// Authenticated session against a UniFi Network controller.
///
/// Holds the HTTP client (with the API key as a default header) and the
/// site name once it has been resolved.
pub struct UnifiSession {
    http: HttpClient,
    base_url: String,
    site: Option<String>,
}

/// Builder for [`UnifiSession`].
pub struct UnifiSessionBuilder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    accept_invalid_certs: bool,
    site: Option<String>,
}

impl UnifiSession {
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> UnifiSessionBuilder {
        UnifiSessionBuilder {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            site: None,
        }
    }

    /// Site used for site-scoped paths, once known.
    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn site_url(&self, suffix: &str) -> Result<String> {
        let site = self.site.as_deref().ok_or_else(|| MigrateError::NotFound {
            resource: "site (not resolved yet)".to_string(),
        })?;
        Ok(self.url(&format!("/proxy/network/api/s/{site}/{suffix}")))
    }

    fn get(&self, url: &str) -> Result<Response> {
        debug!(%url, "GET request");
        self.http.get(url).send().map_err(|source| MigrateError::Http {
            url: url.to_string(),
            source,
        })
    }

    fn get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self.get(url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_for(status.as_u16(), body_of(response)));
        }
        let envelope: ApiEnvelope<T> = response.json().map_err(|source| MigrateError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(envelope.data)
    }
}

impl ControllerApi for UnifiSession {
    fn login(&mut self) -> Result<()> {
        let url = self.url(SELF_PATH);
        let response = self.get(&url)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::Auth {
                status: status.as_u16(),
                body: body_of(response),
            });
        }
        info!("controller API login successful");
        Ok(())
    }

    fn resolve_site_name(&mut self) -> Result<String> {
        if let Some(site) = &self.site {
            info!(site = %site, "using configured site");
            return Ok(site.clone());
        }

        let sites: Vec<SiteSummary> = self.get_list(&self.url(SITES_PATH))?;
        let site = sites
            .into_iter()
            .next()
            .map(|site| site.name)
            .ok_or_else(|| MigrateError::NotFound {
                resource: "site".to_string(),
            })?;
        info!(site = %site, "using site");
        self.site = Some(site.clone());
        Ok(site)
    }

    fn resolve_network_id(&self, lan_name: &str) -> Result<String> {
        let networks: Vec<NetworkConf> = self.get_list(&self.site_url("rest/networkconf")?)?;
        let network = find_network(&networks, lan_name).ok_or_else(|| MigrateError::NotFound {
            resource: format!("network '{lan_name}'"),
        })?;
        debug!(network_id = %network.id, lan_name, "found LAN network");
        Ok(network.id.clone())
    }

    fn create_reservation(&self, payload: &ReservationPayload) -> Result<()> {
        let url = self.site_url("rest/user")?;
        debug!(%url, mac = %payload.mac, "POST request");
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .map_err(|source| MigrateError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(MigrateError::Api {
                status: status.as_u16(),
                body: body_of(response),
            })
        }
    }
}

impl UnifiSessionBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip TLS certificate verification (self-signed controllers).
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Use a fixed site instead of looking it up.
    pub fn site(mut self, site: Option<String>) -> Self {
        self.site = site.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn build(self) -> Result<UnifiSession> {
        let mut key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| MigrateError::Config("API key is not a valid header value".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .default_headers(headers)
            .user_agent(format!("pf2unifi/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|source| MigrateError::Http {
                url: self.base_url.clone(),
                source,
            })?;

        Ok(UnifiSession {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            site: self.site,
        })
    }
}

fn body_of(response: Response) -> String {
    response.text().unwrap_or_default()
}

fn error_for(status: u16, body: String) -> MigrateError {
    match status {
        401 | 403 => MigrateError::Auth { status, body },
        _ => MigrateError::Api { status, body },
    }
}
