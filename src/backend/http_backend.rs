use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::kinds::ContentModelSet;
use crate::repository::xml::leaf_texts;
use crate::repository::{Pid, HAS_MODEL};

use super::repo_backend::{
    BackendError, ControlGroup, Datastream, DatastreamProfile, DatastreamWrite, Dissemination,
    NewObject, ObjectProfile, RepoBackend, Result,
};

/// Characters escaped in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a Fedora repository.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Base URL of the repository, e.g. `http://localhost:8080/fedora`.
    pub root_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    /// Create a new config for anonymous access to the given repository.
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the credentials every request is made with.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An implementation of `RepoBackend` against the Fedora Commons 3 REST API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpBackend {
    /// Create a new HTTP backend from connection settings.
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Other(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.root_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
        })
    }

    /// Create a new HTTP backend with a custom reqwest client and no credentials.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    fn object_url(&self, pid: &Pid) -> String {
        format!("{}/objects/{}", self.base_url, encode(pid.as_str()))
    }

    fn datastream_url(&self, pid: &Pid, dsid: &str) -> String {
        format!("{}/datastreams/{}", self.object_url(pid), encode(dsid))
    }

    fn method_url(&self, pid: &Pid, sdef: &str, method: &str) -> String {
        format!(
            "{}/methods/{}/{}",
            self.object_url(pid),
            encode(sdef),
            encode(method)
        )
    }

    fn risearch_url(&self) -> String {
        format!("{}/risearch", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed {
                status: None,
                message: e.to_string(),
            })
    }

    /// Send a request and fail on any non-success status.
    async fn send_ok(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn risearch(&self, query: &str) -> Result<Vec<Pid>> {
        debug!(query, "risearch");
        let response = self
            .send_ok(self.client.get(self.risearch_url()).query(&[
                ("type", "tuples"),
                ("lang", "sparql"),
                ("format", "CSV"),
                ("query", query),
            ]))
            .await?;
        let body = read_text(response).await?;
        Ok(parse_risearch_csv(&body))
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

async fn read_text(response: Response) -> Result<String> {
    response.text().await.map_err(|e| BackendError::RequestFailed {
        status: None,
        message: format!("failed to read response: {}", e),
    })
}

/// Map an unsuccessful response to the matching error.
async fn status_error(response: Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::PermissionDenied(status.to_string())
        }
        status => BackendError::RequestFailed {
            status: Some(status.as_u16()),
            message: if body.trim().is_empty() {
                status.to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

fn xml_error(what: &str, e: impl std::fmt::Display) -> BackendError {
    BackendError::Other(format!("failed to parse {}: {}", what, e))
}

fn parse_object_profile(pid: &Pid, xml: &str) -> Result<ObjectProfile> {
    let mut profile = ObjectProfile {
        pid: pid.clone(),
        label: String::new(),
        owner: None,
        state: "A".to_string(),
        content_models: ContentModelSet::new(),
        created: None,
    };
    for (name, text) in leaf_texts(xml).map_err(|e| xml_error("object profile", e))? {
        match name.as_str() {
            "objLabel" => profile.label = text,
            "objOwnerId" => profile.owner = Some(text),
            "objState" => profile.state = text,
            "model" => {
                profile.content_models.insert(text);
            }
            "objCreateDate" => {
                profile.created = DateTime::parse_from_rfc3339(&text)
                    .ok()
                    .map(|d| d.with_timezone(&Utc));
            }
            _ => {}
        }
    }
    Ok(profile)
}

fn parse_datastream_profile(dsid: &str, xml: &str) -> Result<DatastreamProfile> {
    let mut profile = DatastreamProfile {
        dsid: dsid.to_string(),
        label: String::new(),
        mimetype: String::new(),
        control_group: ControlGroup::Managed,
        versionable: true,
        checksum: None,
        size: 0,
    };
    for (name, text) in leaf_texts(xml).map_err(|e| xml_error("datastream profile", e))? {
        match name.as_str() {
            "dsLabel" => profile.label = text,
            "dsMIME" => profile.mimetype = text,
            "dsControlGroup" => {
                profile.control_group = ControlGroup::from_code(&text).unwrap_or(ControlGroup::Managed)
            }
            "dsVersionable" => profile.versionable = text == "true",
            "dsChecksum" if text != "none" => profile.checksum = Some(text),
            "dsSize" => profile.size = text.parse().unwrap_or(0),
            _ => {}
        }
    }
    Ok(profile)
}

/// Pids from a single-column CSV result, skipping the header row.
fn parse_risearch_csv(body: &str) -> Vec<Pid> {
    body.lines()
        .skip(1)
        .map(|line| line.trim().trim_matches('"'))
        .filter(|line| !line.is_empty())
        .filter_map(|uri| match Pid::from_uri(uri) {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(uri, error = %e, "ignoring unparsable risearch result");
                None
            }
        })
        .collect()
}

fn sparql_subjects(predicate: &str, object: &str) -> String {
    format!("SELECT ?pid WHERE {{ ?pid <{}> <{}> }}", predicate, object)
}

#[async_trait]
impl RepoBackend for HttpBackend {
    async fn object_exists(&self, pid: &Pid) -> Result<bool> {
        let response = self
            .send(
                self.client
                    .get(self.object_url(pid))
                    .query(&[("format", "xml")]),
            )
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(response).await),
        }
    }

    async fn get_object_profile(&self, pid: &Pid) -> Result<ObjectProfile> {
        let response = self
            .send_ok(
                self.client
                    .get(self.object_url(pid))
                    .query(&[("format", "xml")]),
            )
            .await?;
        let body = read_text(response).await?;
        parse_object_profile(pid, &body)
    }

    async fn ingest_object(&self, object: &NewObject) -> Result<Pid> {
        let url = match &object.pid {
            Some(pid) => self.object_url(pid),
            None => format!("{}/objects/new", self.base_url),
        };
        let mut params = vec![
            ("label", object.label.as_str()),
            ("logMessage", object.log_message.as_str()),
        ];
        if let (None, Some(namespace)) = (&object.pid, &object.namespace) {
            params.push(("namespace", namespace.as_str()));
        }

        let response = self
            .send_ok(self.client.post(url).query(&params))
            .await?;
        let body = read_text(response).await?;
        Pid::parse(body.trim())
            .map_err(|e| BackendError::Other(format!("repository returned {}", e)))
    }

    async fn modify_object(&self, pid: &Pid, label: &str, log_message: &str) -> Result<()> {
        self.send_ok(
            self.client
                .put(self.object_url(pid))
                .query(&[("label", label), ("logMessage", log_message)]),
        )
        .await?;
        Ok(())
    }

    async fn purge_object(&self, pid: &Pid, log_message: &str) -> Result<()> {
        self.send_ok(
            self.client
                .delete(self.object_url(pid))
                .query(&[("logMessage", log_message)]),
        )
        .await?;
        Ok(())
    }

    async fn put_datastream(&self, pid: &Pid, datastream: &DatastreamWrite) -> Result<()> {
        let versionable = if datastream.versionable { "true" } else { "false" };
        let mut params = vec![
            ("dsLabel", datastream.label.as_str()),
            ("mimeType", datastream.mimetype.as_str()),
            ("versionable", versionable),
            ("logMessage", datastream.log_message.as_str()),
        ];
        if let Some(checksum) = &datastream.checksum {
            params.push(("checksumType", "SHA-256"));
            params.push(("checksum", checksum.as_str()));
        }
        let url = self.datastream_url(pid, &datastream.dsid);
        let with_content = |request: RequestBuilder| match &datastream.content {
            Some(content) => request
                .header(reqwest::header::CONTENT_TYPE, &datastream.mimetype)
                .body(content.clone()),
            None => request,
        };

        // Modify in place first; the repository answers 404 for a new datastream.
        let response = self
            .send(with_content(self.client.put(&url).query(&params)))
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND || datastream.content.is_none() {
            return Err(status_error(response).await);
        }

        debug!(pid = %pid, dsid = %datastream.dsid, "adding new datastream");
        params.push(("controlGroup", datastream.control_group.code()));
        self.send_ok(with_content(self.client.post(&url).query(&params)))
            .await?;
        Ok(())
    }

    async fn get_datastream_profile(&self, pid: &Pid, dsid: &str) -> Result<DatastreamProfile> {
        let response = self
            .send_ok(
                self.client
                    .get(self.datastream_url(pid, dsid))
                    .query(&[("format", "xml")]),
            )
            .await?;
        let body = read_text(response).await?;
        parse_datastream_profile(dsid, &body)
    }

    async fn get_datastream(&self, pid: &Pid, dsid: &str) -> Result<Datastream> {
        let profile = self.get_datastream_profile(pid, dsid).await?;
        let response = self
            .send_ok(
                self.client
                    .get(format!("{}/content", self.datastream_url(pid, dsid))),
            )
            .await?;
        let content = response
            .bytes()
            .await
            .map_err(|e| BackendError::RequestFailed {
                status: None,
                message: format!("failed to read datastream content: {}", e),
            })?;
        Ok(Datastream { profile, content })
    }

    async fn find_by_content_model(&self, cmodel: &str) -> Result<Vec<Pid>> {
        self.risearch(&sparql_subjects(HAS_MODEL, cmodel)).await
    }

    async fn find_subjects(&self, predicate: &str, object: &str) -> Result<Vec<Pid>> {
        self.risearch(&sparql_subjects(predicate, object)).await
    }

    async fn get_dissemination(
        &self,
        pid: &Pid,
        sdef: &str,
        method: &str,
        params: &[(String, String)],
    ) -> Result<Dissemination> {
        let response = self
            .send_ok(
                self.client
                    .get(self.method_url(pid, sdef, method))
                    .query(params),
            )
            .await?;
        let mimetype = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = response
            .bytes()
            .await
            .map_err(|e| BackendError::RequestFailed {
                status: None,
                message: format!("failed to read dissemination: {}", e),
            })?;
        Ok(Dissemination { mimetype, content })
    }
}
