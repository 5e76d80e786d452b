//! Default policies for fields a RAML document may leave out.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ramlc_core::EngineConfig;
use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{
    Info, ParameterLocation, Response, SecurityScheme, SecuritySchemeKind, Server, ServerVariable,
};

pub const DEFAULT_TITLE: &str = "API";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Header carrying credentials when a scheme names none.
pub const AUTH_HEADER: &str = "Authorization";

/// Status code of the response synthesized for a method that declares none.
pub const DEFAULT_STATUS: &str = "200";

/// Host of the fallback server template.
const FALLBACK_HOST: &str = "localhost";

static URI_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("URI placeholder regex"));

/// Document info from `title`, `version` and `description`.
pub fn info(root: &Map<String, Value>) -> Info {
    Info {
        title: scalar_text(root.get("title")).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        version: scalar_text(root.get("version")).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        description: scalar_text(root.get("description")).unwrap_or_default(),
    }
}

/// Servers from `baseUri`, else from the first protocol, else one
/// templated `https://{host}` server.
pub fn servers(root: &Map<String, Value>) -> Vec<Server> {
    if let Some(base) = root.get("baseUri").and_then(Value::as_str) {
        let url = match scalar_text(root.get("version")) {
            Some(version) => base.replace("{version}", &version),
            None => base.to_string(),
        };
        let parameters = root.get("baseUriParameters");
        let variables = URI_PLACEHOLDER
            .captures_iter(&url)
            .map(|caps| {
                let name = caps[1].to_string();
                let declaration = parameters.and_then(|p| p.get(&name));
                let variable = server_variable(&name, declaration);
                (name, variable)
            })
            .collect();
        return vec![Server {
            url,
            description: None,
            variables,
        }];
    }

    let protocol = match root.get("protocols") {
        Some(Value::Array(items)) => items.first().and_then(Value::as_str),
        Some(Value::String(protocol)) => Some(protocol.as_str()),
        _ => None,
    };
    if let Some(protocol) = protocol {
        return vec![Server {
            url: format!("{}://{FALLBACK_HOST}", protocol.to_ascii_lowercase()),
            description: None,
            variables: BTreeMap::new(),
        }];
    }

    vec![Server {
        url: "https://{host}".to_string(),
        description: None,
        variables: BTreeMap::from([(
            "host".to_string(),
            ServerVariable {
                default: FALLBACK_HOST.to_string(),
                description: None,
                allowed: Vec::new(),
            },
        )]),
    }]
}

fn server_variable(name: &str, declaration: Option<&Value>) -> ServerVariable {
    let allowed: Vec<String> = declaration
        .and_then(|d| d.get("enum"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| scalar_text(Some(v))).collect())
        .unwrap_or_default();
    let default = declaration
        .and_then(|d| scalar_text(d.get("default")))
        .or_else(|| allowed.first().cloned())
        .unwrap_or_else(|| name.to_string());
    ServerVariable {
        default,
        description: declaration.and_then(|d| scalar_text(d.get("description"))),
        allowed,
    }
}

/// The responses of a method that declares none.
pub fn default_responses() -> BTreeMap<String, Response> {
    BTreeMap::from([(DEFAULT_STATUS.to_string(), Response::described("Success"))])
}

/// Description for a response that has none.
pub fn response_description(code: &str) -> String {
    let text = match code {
        "200" => "Success",
        "201" => "Created",
        "202" => "Accepted",
        "204" => "No Content",
        "301" | "302" | "303" | "307" | "308" => "Redirect",
        "304" => "Not Modified",
        "400" => "Bad Request",
        "401" => "Unauthorized",
        "403" => "Forbidden",
        "404" => "Not Found",
        "409" => "Conflict",
        "422" => "Unprocessable Entity",
        "429" => "Too Many Requests",
        "500" => "Internal Server Error",
        "503" => "Service Unavailable",
        _ if code.starts_with('2') => "Success",
        _ => "Response",
    };
    text.to_string()
}

/// Summary of an operation without a `displayName`.
pub fn summary(method: &str, path: &str) -> String {
    format!("{} {path}", method.to_ascii_uppercase())
}

/// `apiKey` header scheme for unrecognized RAML scheme types.
pub fn fallback_security_scheme(header: Option<&str>, description: Option<String>) -> SecurityScheme {
    SecurityScheme {
        kind: SecuritySchemeKind::ApiKey,
        description,
        scheme: None,
        name: Some(header.unwrap_or(AUTH_HEADER).to_string()),
        location: Some(ParameterLocation::Header),
        flows: None,
    }
}

/// Body media type for bodies that do not name one.
pub fn media_type(root: &Map<String, Value>, config: &EngineConfig) -> String {
    match root.get("mediaType") {
        Some(Value::String(media)) => media.clone(),
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_str)
            .map_or_else(|| config.default_media_type.clone(), str::to_string),
        _ => config.default_media_type.clone(),
    }
}

/// Text of a scalar node. Numbers and booleans are stringified.
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
