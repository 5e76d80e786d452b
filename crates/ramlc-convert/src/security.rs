//! # Security Scheme Mapping
//!
//! RAML `securitySchemes` map onto OpenAPI security schemes by their `type`
//! string, compared case-insensitively:
//!
//! | RAML type               | OpenAPI                                  |
//! |-------------------------|------------------------------------------|
//! | `OAuth 2.0`             | `oauth2` with flows from `settings`      |
//! | `Basic Authentication`  | `http` / `basic`                         |
//! | `Digest Authentication` | `http` / `digest`                        |
//! | `Pass Through`          | `apiKey` on its first header or query parameter |
//! | anything else           | `apiKey` header (see [`defaults`])       |
//!
//! Headers a scheme documents under `describedBy.headers` are collected into
//! `components.headers`.
//!
//! [`defaults`]: crate::defaults

use std::collections::BTreeMap;

use ramlc_raml::tree::named_map;
use serde_json::{Map, Value};

use crate::datatype::{is_required, TypeConverter};
use crate::defaults;
use crate::model::{
    Header, OAuthFlow, OAuthFlows, ParameterLocation, SecurityRequirement, SecurityScheme,
    SecuritySchemeKind,
};

/// OAuth grant used when a scheme lists none.
const DEFAULT_GRANT: &str = "authorization_code";

/// Mapped schemes and the headers they document.
#[derive(Debug, Default)]
pub struct SecurityComponents {
    pub schemes: BTreeMap<String, SecurityScheme>,
    pub headers: BTreeMap<String, Header>,
}

/// Map every declared scheme.
pub fn map_security_schemes(declared: &Map<String, Value>, types: &TypeConverter) -> SecurityComponents {
    let mut components = SecurityComponents::default();
    for (name, scheme) in declared {
        let described_by = scheme.get("describedBy");
        let headers = described_by
            .and_then(|d| d.get("headers"))
            .map(named_map)
            .unwrap_or_default();
        for (header, declaration) in &headers {
            components.headers.insert(
                header.clone(),
                Header {
                    description: string_field(declaration, "description"),
                    required: is_required(declaration),
                    schema: types.convert(declaration),
                },
            );
        }
        components.schemes.insert(name.clone(), map_scheme(scheme, &headers));
    }
    components
}

fn map_scheme(scheme: &Value, headers: &Map<String, Value>) -> SecurityScheme {
    let description = string_field(scheme, "description");
    let kind = scheme
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let first_header = headers.keys().next().cloned();

    match kind.as_str() {
        "oauth 2.0" => SecurityScheme {
            kind: SecuritySchemeKind::OAuth2,
            description,
            scheme: None,
            name: None,
            location: None,
            flows: Some(oauth_flows(scheme.get("settings").unwrap_or(&Value::Null))),
        },
        "basic authentication" | "digest authentication" => SecurityScheme {
            kind: SecuritySchemeKind::Http,
            description,
            scheme: Some(kind.split(' ').next().unwrap_or_default().to_string()),
            name: None,
            location: None,
            flows: None,
        },
        "pass through" => {
            let query = scheme
                .get("describedBy")
                .and_then(|d| d.get("queryParameters"))
                .map(named_map)
                .and_then(|params| params.keys().next().cloned());
            let (name, location) = match (first_header.clone(), query) {
                (Some(header), _) => (header, ParameterLocation::Header),
                (None, Some(query)) => (query, ParameterLocation::Query),
                (None, None) => (defaults::AUTH_HEADER.to_string(), ParameterLocation::Header),
            };
            SecurityScheme {
                kind: SecuritySchemeKind::ApiKey,
                description,
                scheme: None,
                name: Some(name),
                location: Some(location),
                flows: None,
            }
        }
        _ => defaults::fallback_security_scheme(first_header.as_deref(), description),
    }
}

fn oauth_flows(settings: &Value) -> OAuthFlows {
    let scopes: BTreeMap<String, String> = match settings.get("scopes") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|scope| (scope.to_string(), String::new()))
            .collect(),
        Some(Value::String(scope)) => BTreeMap::from([(scope.clone(), String::new())]),
        _ => BTreeMap::new(),
    };
    let authorization_url = string_field(settings, "authorizationUri");
    let token_url = string_field(settings, "accessTokenUri");

    let mut grants: Vec<String> = match settings.get("authorizationGrants") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        Some(Value::String(grant)) => vec![grant.clone()],
        _ => Vec::new(),
    };
    if grants.is_empty() {
        grants.push(DEFAULT_GRANT.to_string());
    }

    let mut flows = OAuthFlows::default();
    for grant in grants {
        let flow = |authorization: bool, token: bool| OAuthFlow {
            authorization_url: authorization.then(|| authorization_url.clone()).flatten(),
            token_url: token.then(|| token_url.clone()).flatten(),
            scopes: scopes.clone(),
        };
        match grant.as_str() {
            "authorization_code" => flows.authorization_code = Some(flow(true, true)),
            "implicit" => flows.implicit = Some(flow(true, false)),
            "password" => flows.password = Some(flow(false, true)),
            "client_credentials" => flows.client_credentials = Some(flow(false, true)),
            _ => {}
        }
    }
    flows
}

/// Security requirements of a `securedBy` value.
///
/// A `null` entry becomes an empty requirement (anonymous access). A
/// single-key map entry carries its `scopes`.
pub fn requirements(secured_by: &Value) -> Vec<SecurityRequirement> {
    let entries = match secured_by {
        Value::Array(items) => items.clone(),
        Value::Null => return Vec::new(),
        other => vec![other.clone()],
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Null => Some(SecurityRequirement::new()),
            Value::String(name) => Some(SecurityRequirement::from([(name.clone(), Vec::new())])),
            Value::Object(map) => map.iter().next().map(|(name, settings)| {
                let scopes = settings
                    .get("scopes")
                    .and_then(Value::as_array)
                    .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
                SecurityRequirement::from([(name.clone(), scopes)])
            }),
            _ => None,
        })
        .collect()
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}
