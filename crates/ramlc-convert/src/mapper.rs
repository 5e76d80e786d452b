//! # Structural Mapper
//!
//! Maps a resolved RAML tree (includes spliced, libraries substituted,
//! types expanded, traits applied) onto an [`OpenApiDocument`].
//!
//! Resources are walked depth-first. A nested resource's path is its
//! parent's built path followed by its own key, and `uriParameters` declared
//! on any ancestor stay visible to every descendant. Each `{name}` segment of
//! a built path becomes a required path parameter, typed `string` unless a
//! visible `uriParameters` entry declares it.
//!
//! Operation ids are `method` followed by the title-cased literal segments
//! and `By<Name>` for each parameter segment, so `GET /users/{id}` becomes
//! `getUsersById`. An id already owned by another method and path gets a
//! `_2`, `_3` suffix.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use ramlc_core::{CompileError, Diagnostics, EngineConfig, Stage};
use ramlc_raml::tree::{is_resource_key, named_map, METHODS};
use regex::Regex;
use serde_json::{Map, Value};

use crate::datatype::{is_required, TypeConverter};
use crate::defaults::{self, scalar_text};
use crate::model::{
    Components, Header, MediaType, OpenApiDocument, Operation, Parameter, ParameterLocation,
    PathItem, RequestBody, Response, Tag,
};
use crate::security::{map_security_schemes, requirements};

static PATH_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path parameter regex"));

/// Map a resolved RAML tree onto an OpenAPI document.
///
/// # Errors
///
/// `CompileError::Mapping` if the root is not a mapping.
pub fn map_document(
    tree: &Value,
    config: &EngineConfig,
    diagnostics: &dyn Diagnostics,
) -> Result<OpenApiDocument, CompileError> {
    let root = tree
        .as_object()
        .ok_or_else(|| CompileError::Mapping("RAML document root must be a mapping".to_string()))?;

    let mut declared = Map::new();
    for section in ["schemas", "types"] {
        if let Some(types) = root.get(section) {
            declared.extend(named_map(types));
        }
    }
    let types = TypeConverter::from_declarations(declared.clone());
    let schemas: BTreeMap<String, Value> = declared
        .iter()
        .map(|(name, declaration)| (name.clone(), types.convert(declaration)))
        .collect();

    let security = root
        .get("securitySchemes")
        .map(|schemes| map_security_schemes(&named_map(schemes), &types))
        .unwrap_or_default();

    let mut mapper = Mapper {
        types,
        media_type: defaults::media_type(root, config),
        diagnostics,
        paths: BTreeMap::new(),
        tags: Vec::new(),
        operation_ids: HashMap::new(),
    };
    let top = Scope::default();
    for (key, resource) in root {
        if is_resource_key(key) {
            mapper.walk_resource(key, resource, "", &top);
        }
    }
    diagnostics.note(
        Stage::Mapping,
        format!(
            "mapped {} paths, {} schemas, {} security schemes",
            mapper.paths.len(),
            schemas.len(),
            security.schemes.len()
        ),
    );

    Ok(OpenApiDocument {
        openapi: config.openapi_version.clone(),
        info: defaults::info(root),
        servers: defaults::servers(root),
        tags: mapper.tags,
        paths: mapper.paths,
        components: Components {
            schemas,
            security_schemes: security.schemes,
            headers: security.headers,
        },
        security: root.get("securedBy").map(requirements).unwrap_or_default(),
    })
}

/// What a resource passes down to its descendants.
#[derive(Debug, Clone, Default)]
struct Scope {
    uri_parameters: Map<String, Value>,
    secured_by: Option<Value>,
    tag: Option<String>,
}

struct Mapper<'a> {
    types: TypeConverter,
    media_type: String,
    diagnostics: &'a dyn Diagnostics,
    paths: BTreeMap<String, PathItem>,
    tags: Vec<Tag>,
    /// Assigned operation id → `method path` that owns it.
    operation_ids: HashMap<String, String>,
}

impl Mapper<'_> {
    fn walk_resource(&mut self, key: &str, resource: &Value, parent: &str, scope: &Scope) {
        let path = format!("{parent}{key}");
        let empty = Map::new();
        let body = resource.as_object().unwrap_or(&empty);

        let mut scope = scope.clone();
        if let Some(declared) = body.get("uriParameters") {
            scope.uri_parameters.extend(named_map(declared));
        }
        if let Some(secured_by) = body.get("securedBy") {
            scope.secured_by = Some(secured_by.clone());
        }
        if parent.is_empty() {
            scope.tag = self.register_tag(key, body);
        }

        let mut item = PathItem::default();
        for method in METHODS {
            let Some(declaration) = body.get(method) else {
                continue;
            };
            if !(declaration.is_object() || declaration.is_null()) {
                self.diagnostics.warning(
                    Stage::Mapping,
                    format!("{} {path}: method body is not a mapping, mapped as empty", method.to_ascii_uppercase()),
                );
            }
            let operation = self.map_operation(method, &path, declaration, &scope);
            item.set(method, operation);
        }
        if !item.is_empty() {
            self.paths.entry(path.clone()).or_default().absorb(item);
        }

        for (child_key, child) in body {
            if is_resource_key(child_key) {
                self.walk_resource(child_key, child, &path, &scope);
            }
        }
    }

    /// Tag of a top-level resource: its `displayName`, else its first segment.
    fn register_tag(&mut self, key: &str, body: &Map<String, Value>) -> Option<String> {
        let name = match body.get("displayName").and_then(Value::as_str) {
            Some(display) => display.to_string(),
            None => key
                .trim_start_matches('/')
                .split('/')
                .next()
                .unwrap_or_default()
                .trim_matches(['{', '}'])
                .to_string(),
        };
        if name.is_empty() {
            return None;
        }
        if !self.tags.iter().any(|tag| tag.name == name) {
            self.tags.push(Tag {
                name: name.clone(),
                description: body.get("description").and_then(Value::as_str).map(str::to_string),
            });
        }
        Some(name)
    }

    fn map_operation(&mut self, method: &str, path: &str, declaration: &Value, scope: &Scope) -> Operation {
        let empty = Map::new();
        let method_body = declaration.as_object().unwrap_or(&empty);

        let mut parameters = self.path_parameters(path, scope);
        if let Some(query) = method_body.get("queryParameters") {
            for (name, decl) in named_map(query) {
                parameters.push(self.parameter(&name, ParameterLocation::Query, &decl, false));
            }
        }
        if let Some(uri) = method_body.get("uriParameters") {
            for (name, decl) in named_map(uri) {
                let taken = parameters
                    .iter()
                    .any(|p| p.location == ParameterLocation::Path && p.name == name);
                if !taken {
                    parameters.push(self.parameter(&name, ParameterLocation::Path, &decl, true));
                }
            }
        }
        if let Some(headers) = method_body.get("headers") {
            for (name, decl) in named_map(headers) {
                parameters.push(self.parameter(&name, ParameterLocation::Header, &decl, false));
            }
        }

        let request_body = method_body.get("body").and_then(|body| {
            let content = self.content(body);
            (!content.is_empty()).then(|| RequestBody {
                description: None,
                required: true,
                content,
            })
        });

        let mut responses: BTreeMap<String, Response> = method_body
            .get("responses")
            .map(named_map)
            .unwrap_or_default()
            .iter()
            .map(|(code, response)| (code.clone(), self.response(code, response)))
            .collect();
        if responses.is_empty() {
            responses = defaults::default_responses();
        }

        let security = method_body
            .get("securedBy")
            .or(scope.secured_by.as_ref())
            .map(requirements);

        Operation {
            operation_id: self.operation_id(method, path),
            summary: Some(
                scalar_text(method_body.get("displayName")).unwrap_or_else(|| defaults::summary(method, path)),
            ),
            description: scalar_text(method_body.get("description")),
            tags: scope.tag.iter().cloned().collect(),
            parameters,
            request_body,
            responses,
            security,
        }
    }

    /// One required parameter per `{name}` in the built path.
    fn path_parameters(&self, path: &str, scope: &Scope) -> Vec<Parameter> {
        let mut parameters: Vec<Parameter> = Vec::new();
        for caps in PATH_PARAM.captures_iter(path) {
            let name = &caps[1];
            if parameters.iter().any(|p| p.name == name) {
                continue;
            }
            let parameter = match scope.uri_parameters.get(name) {
                Some(decl) => self.parameter(name, ParameterLocation::Path, decl, true),
                None => Parameter {
                    name: name.to_string(),
                    location: ParameterLocation::Path,
                    required: true,
                    description: None,
                    schema: serde_json::json!({"type": "string"}),
                    example: None,
                },
            };
            parameters.push(parameter);
        }
        parameters
    }

    fn parameter(&self, raw_name: &str, location: ParameterLocation, decl: &Value, always_required: bool) -> Parameter {
        let (name, optional) = match raw_name.strip_suffix('?') {
            Some(name) => (name, true),
            None => (raw_name, false),
        };
        Parameter {
            name: name.to_string(),
            location,
            required: always_required || (!optional && is_required(decl)),
            description: scalar_text(decl.get("description")),
            schema: self.types.convert(decl),
            example: decl.get("example").cloned(),
        }
    }

    /// Media-type map of a `body` declaration. A body whose keys are not
    /// media types is one declaration under the default media type.
    fn content(&self, body: &Value) -> BTreeMap<String, MediaType> {
        match body {
            Value::Object(map) if map.keys().any(|key| key.contains('/')) => map
                .iter()
                .filter(|(key, _)| key.contains('/'))
                .map(|(media, decl)| (media.clone(), self.media(decl)))
                .collect(),
            Value::Null => BTreeMap::new(),
            decl => BTreeMap::from([(self.media_type.clone(), self.media(decl))]),
        }
    }

    fn media(&self, decl: &Value) -> MediaType {
        if decl.is_null() {
            return MediaType {
                schema: Value::Object(Map::new()),
                example: None,
            };
        }
        let mut schema = self.types.convert(decl);
        let example = schema.as_object_mut().and_then(|map| map.remove("example"));
        MediaType { schema, example }
    }

    fn response(&self, code: &str, response: &Value) -> Response {
        let headers = response
            .get("headers")
            .map(named_map)
            .unwrap_or_default()
            .iter()
            .map(|(name, decl)| {
                let header = Header {
                    description: scalar_text(decl.get("description")),
                    required: is_required(decl),
                    schema: self.types.convert(decl),
                };
                (name.trim_end_matches('?').to_string(), header)
            })
            .collect();
        Response {
            description: scalar_text(response.get("description"))
                .unwrap_or_else(|| defaults::response_description(code)),
            headers,
            content: response.get("body").map(|body| self.content(body)).unwrap_or_default(),
        }
    }

    fn operation_id(&mut self, method: &str, path: &str) -> String {
        let mut id = method.to_string();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    id.push_str("By");
                    id.push_str(&title_case(name));
                }
                None => id.push_str(&title_case(segment)),
            }
        }
        let owner = format!("{method} {path}");
        let mut candidate = id.clone();
        let mut suffix = 1;
        loop {
            match self.operation_ids.get(&candidate) {
                Some(existing) if *existing == owner => return candidate,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{id}_{suffix}");
                }
                None => break,
            }
        }
        if suffix > 1 {
            self.diagnostics
                .note(Stage::Mapping, format!("operationId '{id}' taken, {owner} uses '{candidate}'"));
        }
        self.operation_ids.insert(candidate.clone(), owner);
        candidate
    }
}

/// `order-items` → `OrderItems`. Non-alphanumeric characters separate words
/// and are dropped.
fn title_case(segment: &str) -> String {
    segment
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
