//! Security Scheme Objects, OAuth flows and security requirements.

use crate::error::{OpenApiError, Result};
use crate::model::extensions::{Extensions, impl_extensible};
use crate::model::node::{NodeRef, impl_owned_node};
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use url::Url;

/// Rejects anything `Url::parse` does not accept as an absolute URL.
fn check_url(field: &str, value: &str) -> Result<()> {
    Url::parse(value).map(|_| ()).map_err(|e| {
        OpenApiError::invariant(format!("{} '{}' is not a valid URL: {}", field, value, e))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

impl ApiKeyLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyLocation::Query => "query",
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Cookie => "cookie",
        }
    }
}

impl FromStr for ApiKeyLocation {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "query" => Ok(ApiKeyLocation::Query),
            "header" => Ok(ApiKeyLocation::Header),
            "cookie" => Ok(ApiKeyLocation::Cookie),
            other => Err(OpenApiError::invariant(format!(
                "'{}' is not an API key location",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthFlowKind {
    Implicit,
    Password,
    ClientCredentials,
    AuthorizationCode,
}

impl OAuthFlowKind {
    pub const ALL: [OAuthFlowKind; 4] = [
        OAuthFlowKind::Implicit,
        OAuthFlowKind::Password,
        OAuthFlowKind::ClientCredentials,
        OAuthFlowKind::AuthorizationCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthFlowKind::Implicit => "implicit",
            OAuthFlowKind::Password => "password",
            OAuthFlowKind::ClientCredentials => "clientCredentials",
            OAuthFlowKind::AuthorizationCode => "authorizationCode",
        }
    }

    pub fn uses_authorization_url(&self) -> bool {
        matches!(
            self,
            OAuthFlowKind::Implicit | OAuthFlowKind::AuthorizationCode
        )
    }

    pub fn uses_token_url(&self) -> bool {
        !matches!(self, OAuthFlowKind::Implicit)
    }
}

impl Display for OAuthFlowKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OAuthFlowKind {
    type Err = OpenApiError;

    fn from_str(s: &str) -> Result<Self> {
        OAuthFlowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| OpenApiError::invariant(format!("'{}' is not an OAuth flow", s)))
    }
}

/// One OAuth 2 flow. Which URLs it carries depends on its kind; every URL is checked
/// whenever it is set.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthFlow {
    kind: OAuthFlowKind,
    authorization_url: Option<String>,
    token_url: Option<String>,
    refresh_url: Option<String>,
    scopes: IndexMap<String, String>,
    pub extensions: Extensions,
}

impl OAuthFlow {
    fn blank(kind: OAuthFlowKind) -> Self {
        Self {
            kind,
            authorization_url: None,
            token_url: None,
            refresh_url: None,
            scopes: IndexMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn implicit(authorization_url: impl Into<String>) -> Result<Self> {
        let mut flow = Self::blank(OAuthFlowKind::Implicit);
        flow.set_authorization_url(authorization_url)?;
        Ok(flow)
    }

    pub fn password(token_url: impl Into<String>) -> Result<Self> {
        let mut flow = Self::blank(OAuthFlowKind::Password);
        flow.set_token_url(token_url)?;
        Ok(flow)
    }

    pub fn client_credentials(token_url: impl Into<String>) -> Result<Self> {
        let mut flow = Self::blank(OAuthFlowKind::ClientCredentials);
        flow.set_token_url(token_url)?;
        Ok(flow)
    }

    pub fn authorization_code(
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Result<Self> {
        let mut flow = Self::blank(OAuthFlowKind::AuthorizationCode);
        flow.set_authorization_url(authorization_url)?;
        flow.set_token_url(token_url)?;
        Ok(flow)
    }

    pub fn kind(&self) -> OAuthFlowKind {
        self.kind
    }

    pub fn authorization_url(&self) -> Option<&str> {
        self.authorization_url.as_deref()
    }

    pub fn token_url(&self) -> Option<&str> {
        self.token_url.as_deref()
    }

    pub fn refresh_url(&self) -> Option<&str> {
        self.refresh_url.as_deref()
    }

    pub fn set_authorization_url(&mut self, url: impl Into<String>) -> Result<()> {
        if !self.kind.uses_authorization_url() {
            return Err(OpenApiError::invariant(format!(
                "{} flow has no authorizationUrl",
                self.kind
            )));
        }
        let url = url.into();
        check_url("authorizationUrl", &url)?;
        self.authorization_url = Some(url);
        Ok(())
    }

    pub fn set_token_url(&mut self, url: impl Into<String>) -> Result<()> {
        if !self.kind.uses_token_url() {
            return Err(OpenApiError::invariant(format!(
                "{} flow has no tokenUrl",
                self.kind
            )));
        }
        let url = url.into();
        check_url("tokenUrl", &url)?;
        self.token_url = Some(url);
        Ok(())
    }

    pub fn set_refresh_url(&mut self, url: Option<String>) -> Result<()> {
        if let Some(url) = &url {
            check_url("refreshUrl", url)?;
        }
        self.refresh_url = url;
        Ok(())
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scopes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn add_scope(&mut self, name: impl Into<String>, description: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.scopes.contains_key(&name) {
            return Err(OpenApiError::duplicate_key("scopes", &name));
        }
        self.scopes.insert(name, description.into());
        Ok(())
    }

    pub fn remove_scope(&mut self, name: &str) -> Option<String> {
        self.scopes.shift_remove(name)
    }
}

/// Up to one flow of each kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthFlows {
    flows: IndexMap<OAuthFlowKind, OAuthFlow>,
    pub extensions: Extensions,
}

impl OAuthFlows {
    pub fn flow(&self, kind: OAuthFlowKind) -> Option<&OAuthFlow> {
        self.flows.get(&kind)
    }

    pub fn flow_mut(&mut self, kind: OAuthFlowKind) -> Option<&mut OAuthFlow> {
        self.flows.get_mut(&kind)
    }

    /// Installs `flow` in the slot for its kind, returning the flow it replaced.
    pub fn set_flow(&mut self, flow: OAuthFlow) -> Option<OAuthFlow> {
        self.flows.insert(flow.kind, flow)
    }

    pub fn remove_flow(&mut self, kind: OAuthFlowKind) -> Option<OAuthFlow> {
        self.flows.shift_remove(&kind)
    }

    pub fn flows(&self) -> impl Iterator<Item = &OAuthFlow> {
        self.flows.values()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// The per-`type` part of a Security Scheme Object.
#[derive(Debug, Clone, PartialEq)]
pub enum SecuritySchemeKind {
    ApiKey {
        name: String,
        location: ApiKeyLocation,
    },
    Http {
        scheme: String,
        bearer_format: Option<String>,
    },
    OAuth2 {
        flows: OAuthFlows,
    },
    OpenIdConnect {
        url: String,
    },
}

impl SecuritySchemeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SecuritySchemeKind::ApiKey { .. } => "apiKey",
            SecuritySchemeKind::Http { .. } => "http",
            SecuritySchemeKind::OAuth2 { .. } => "oauth2",
            SecuritySchemeKind::OpenIdConnect { .. } => "openIdConnect",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            SecuritySchemeKind::OpenIdConnect { url } => check_url("openIdConnectUrl", url),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScheme {
    pub(crate) parent: NodeRef,
    pub extensions: Extensions,
    pub description: Option<String>,
    kind: SecuritySchemeKind,
}

impl_owned_node!(SecurityScheme);
impl_extensible!(OAuthFlow, OAuthFlows);

impl SecurityScheme {
    pub(crate) fn new(parent: NodeRef, kind: SecuritySchemeKind) -> Result<Self> {
        kind.validate()?;
        Ok(Self {
            parent,
            extensions: Extensions::new(),
            description: None,
            kind,
        })
    }

    pub fn kind(&self) -> &SecuritySchemeKind {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: SecuritySchemeKind) -> Result<()> {
        kind.validate()?;
        self.kind = kind;
        Ok(())
    }

    /// Mutable flows of an `oauth2` scheme.
    pub fn oauth_flows_mut(&mut self) -> Option<&mut OAuthFlows> {
        match &mut self.kind {
            SecuritySchemeKind::OAuth2 { flows } => Some(flows),
            _ => None,
        }
    }
}

/// A Security Requirement Object: scheme names mapped to required scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityRequirement(IndexMap<String, Vec<String>>);

impl SecurityRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that adds one scheme.
    pub fn with(mut self, scheme: impl Into<String>, scopes: &[&str]) -> Self {
        self.0
            .insert(scheme.into(), scopes.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn add_scheme(&mut self, scheme: impl Into<String>, scopes: Vec<String>) -> Result<()> {
        let scheme = scheme.into();
        if self.0.contains_key(&scheme) {
            return Err(OpenApiError::duplicate_key("security requirement", &scheme));
        }
        self.0.insert(scheme, scopes);
        Ok(())
    }

    pub fn remove_scheme(&mut self, scheme: &str) -> Option<Vec<String>> {
        self.0.shift_remove(scheme)
    }

    pub fn scopes(&self, scheme: &str) -> Option<&[String]> {
        self.0.get(scheme).map(Vec::as_slice)
    }

    pub fn schemes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Removes the requirement at `index` from a document or operation list.
pub(crate) fn remove_requirement(
    list: &mut Vec<SecurityRequirement>,
    index: usize,
) -> Result<SecurityRequirement> {
    if index >= list.len() {
        return Err(OpenApiError::invariant(format!(
            "security requirement index {} out of range ({} requirements)",
            index,
            list.len()
        )));
    }
    Ok(list.remove(index))
}
