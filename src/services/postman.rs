//! OpenAPI → Postman Collection v2.1.0 conversion.
//!
//! Requests are grouped into one folder per OpenAPI tag. Request and
//! response bodies are synthesized from the (fully dereferenced) schemas.

use crate::error::{ConvertError, ConvertResult};
use crate::services::convert::{read_yaml_as_json, write_pretty_json};
use regex::Regex;
use serde_json::{json, Map, Value as Json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEV_DOCS_BASE_URL: &str = "https://developers.asana.com";

pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Optional markdown replacing the OpenAPI description
pub const DESCRIPTION_FILE: &str = "postman_description.md";

const REQUEST_METHODS: [&str; 7] = ["get", "post", "put", "patch", "delete", "options", "head"];

const MARKDOWN: &str = "text/markdown";

fn markdown(content: impl Into<Json>) -> Json {
    json!({ "content": content.into(), "type": MARKDOWN })
}

/// Path and query parameters of a request, already in Postman form
#[derive(Debug, Clone, Default)]
struct Params {
    path: Vec<Json>,
    query: Vec<Json>,
}

impl Params {
    fn extend(&mut self, other: Params) {
        self.path.extend(other.path);
        self.query.extend(other.query);
    }
}

/// Converts one OpenAPI document
pub struct PostmanConverter<'a> {
    oas: &'a Json,
}

impl<'a> PostmanConverter<'a> {
    pub fn new(oas: &'a Json) -> Self {
        Self { oas }
    }

    /// Build the collection. `description` replaces the OpenAPI description when non-empty.
    pub fn convert(&self, description: Option<&str>) -> ConvertResult<Json> {
        let mut collection = Map::new();
        collection.insert("info".into(), self.info(description));
        collection.insert("variable".into(), self.variables()?);
        collection.insert("auth".into(), auth());
        collection.insert("item".into(), Json::Array(self.folders()));

        let mut collection = Json::Object(collection);
        self.add_items(&mut collection)?;
        absolutize_doc_links(&mut collection);

        Ok(collection)
    }

    fn info(&self, description: Option<&str>) -> Json {
        let info = &self.oas["info"];
        let content = match description {
            Some(d) if !d.is_empty() => Json::String(d.to_string()),
            _ => info["description"].clone(),
        };

        json!({
            "name": info["title"].clone(),
            "schema": COLLECTION_SCHEMA,
            "description": markdown(content),
        })
    }

    fn variables(&self) -> ConvertResult<Json> {
        let base_url = self.oas["servers"]
            .get(0)
            .and_then(|s| s.get("url"))
            .cloned()
            .ok_or_else(|| ConvertError::InvalidSpec("no servers declared".to_string()))?;

        Ok(json!([
            { "key": "baseUrl", "value": base_url },
            { "key": "bearerToken", "value": "" },
            { "key": "oauthAppId", "value": "" },
            { "key": "oauthSecret", "value": "" },
            { "key": "oauthScopes", "value": "default" }
        ]))
    }

    fn folders(&self) -> Vec<Json> {
        self.oas["tags"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .map(|tag| {
                        json!({
                            "name": tag["name"].clone(),
                            "description": markdown(tag["description"].clone()),
                            "item": [],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn add_items(&self, collection: &mut Json) -> ConvertResult<()> {
        let Some(paths) = self.oas["paths"].as_object() else {
            return Ok(());
        };

        for (path, path_item) in paths {
            let path_params = self.extract_parameters(&path_item["parameters"])?;

            let Some(operations) = path_item.as_object() else {
                continue;
            };
            for (method, operation) in operations {
                if !REQUEST_METHODS.contains(&method.as_str()) {
                    continue;
                }

                let mut params = path_params.clone();
                params.extend(self.extract_parameters(&operation["parameters"])?);

                let item = self.request_item(path, method, operation, &params)?;

                let tags = match operation["tags"].as_array() {
                    Some(tags) => tags.iter().filter_map(Json::as_str).collect::<Vec<_>>(),
                    None => vec!["Others"],
                };
                for tag in tags {
                    add_item_to_folder(collection, &item, tag);
                }
            }
        }

        Ok(())
    }

    fn request_item(
        &self,
        path: &str,
        method: &str,
        operation: &Json,
        params: &Params,
    ) -> ConvertResult<Json> {
        let method = method.to_uppercase();
        let name = operation["summary"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", method, path));
        let description = operation["description"].as_str().unwrap_or_default();

        Ok(json!({
            "name": name,
            "description": markdown(description),
            "request": {
                "method": method,
                "url": {
                    "host": ["{{baseUrl}}"],
                    "path": request_path(path),
                    "variable": params.path,
                    "query": params.query,
                },
                "body": self.request_body(&operation["requestBody"])?,
            },
            "response": self.responses(&operation["responses"], &method, path, params)?,
        }))
    }

    // ===== Parameters =====

    fn extract_parameters(&self, params: &Json) -> ConvertResult<Params> {
        let mut out = Params::default();
        let Some(params) = params.as_array() else {
            return Ok(out);
        };

        for param in params {
            let param = self.resolve_shallow(param)?;
            let built = build_param(param);
            if param["in"].as_str() == Some("query") {
                out.query.push(built);
            } else {
                out.path.push(built);
            }
        }

        Ok(out)
    }

    // ===== Request bodies =====

    fn request_body(&self, request_body: &Json) -> ConvertResult<Json> {
        if !is_truthy(request_body) {
            return Ok(Json::Null);
        }
        let request_body = self.resolve_shallow(request_body)?;

        let Some((content_type, media)) = first_entry(&request_body["content"]) else {
            return Ok(Json::Null);
        };
        let schema = self.resolve_all(&media["schema"])?;

        let body = match content_type.as_str() {
            "multipart/form-data" => json!({
                "mode": "formdata",
                "formdata": form_fields(&schema),
            }),
            "application/x-www-form-urlencoded" => json!({
                "mode": "urlencoded",
                "urlencoded": form_fields(&schema),
            }),
            _ => json!({
                "mode": "raw",
                "raw": to_pretty(&example_from_schema(&schema, true))?,
                "options": { "raw": { "language": "json" } },
            }),
        };

        Ok(body)
    }

    // ===== Responses =====

    fn responses(
        &self,
        responses: &Json,
        method: &str,
        path: &str,
        params: &Params,
    ) -> ConvertResult<Json> {
        let mut out = Vec::new();
        let Some(responses) = responses.as_object() else {
            return Ok(Json::Array(out));
        };

        for (status_code, response) in responses {
            let Ok(code) = status_code.parse::<u16>() else {
                tracing::debug!("Skipping non-numeric response {} of {} {}", status_code, method, path);
                continue;
            };
            let response = self.resolve_shallow(response)?;

            let (content_type, body) = match first_entry(&response["content"]) {
                Some((content_type, media)) => {
                    let schema = self.resolve_all(&media["schema"])?;
                    (Some(content_type), example_from_schema(&schema, false))
                }
                None => (None, Json::Null),
            };

            let header = match &content_type {
                Some(ct) => json!([{ "key": "Content-Type", "value": ct }]),
                None => json!([]),
            };
            let status = reqwest::StatusCode::from_u16(code)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown");
            let body = if is_truthy(&body) {
                to_pretty(&body)?
            } else {
                String::new()
            };
            let preview = if content_type.as_deref() == Some("application/json") {
                "json"
            } else {
                "text"
            };

            out.push(json!({
                "name": format!(
                    "[{}] {}",
                    status_code,
                    response["description"].as_str().unwrap_or_default()
                ),
                "originalRequest": original_request(method, path, params),
                "code": code,
                "status": status,
                "header": header,
                "body": body,
                "_postman_previewlanguage": preview,
            }));
        }

        Ok(Json::Array(out))
    }

    // ===== References =====

    /// Follow a `#/a/b/c` pointer into the document
    fn resolve_ref(&self, reference: &str) -> ConvertResult<&'a Json> {
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| ConvertError::Reference(reference.to_string()))?;
        self.oas
            .pointer(pointer)
            .ok_or_else(|| ConvertError::Reference(reference.to_string()))
    }

    /// Resolve a top-level `$ref`, leaving nested ones in place
    fn resolve_shallow<'b>(&self, value: &'b Json) -> ConvertResult<&'b Json>
    where
        'a: 'b,
    {
        match value {
            Json::Object(map) => match map.get("$ref").and_then(Json::as_str) {
                Some(reference) => self.resolve_ref(reference),
                None => Ok(value),
            },
            Json::String(reference) => self.resolve_ref(reference),
            _ => Ok(value),
        }
    }

    /// Recursively replace every `$ref`. Cyclic references become `{}`.
    fn resolve_all(&self, value: &Json) -> ConvertResult<Json> {
        self.resolve_all_inner(value, &mut Vec::new())
    }

    fn resolve_all_inner(&self, value: &Json, stack: &mut Vec<String>) -> ConvertResult<Json> {
        match value {
            Json::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Json::as_str) {
                    if stack.iter().any(|r| r == reference) {
                        return Ok(Json::Object(Map::new()));
                    }
                    let target = self.resolve_ref(reference)?;
                    stack.push(reference.to_string());
                    let resolved = self.resolve_all_inner(target, stack);
                    stack.pop();
                    return resolved;
                }

                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), self.resolve_all_inner(value, stack)?);
                }
                Ok(Json::Object(out))
            }
            Json::Array(items) => items
                .iter()
                .map(|item| self.resolve_all_inner(item, stack))
                .collect::<ConvertResult<Vec<_>>>()
                .map(Json::Array),
            other => Ok(other.clone()),
        }
    }
}

/// Read `spec_path`, convert, and write the collection to `output_path`
pub fn convert_file(
    spec_path: &Path,
    description_path: &Path,
    output_path: &Path,
) -> ConvertResult<PathBuf> {
    let oas = read_yaml_as_json(spec_path)?;

    // Falls back to the OpenAPI description when absent
    let description = if description_path.is_file() {
        Some(fs::read_to_string(description_path)?)
    } else {
        None
    };

    let collection = PostmanConverter::new(&oas).convert(description.as_deref())?;
    write_pretty_json(output_path, &collection)?;

    tracing::info!("Wrote Postman collection to {}", output_path.display());
    Ok(output_path.to_path_buf())
}

fn auth() -> Json {
    json!({
        "type": "oauth2",
        "oauth2": [
            { "key": "authRequestParams", "value": [] },
            { "key": "refreshTokenUrl", "value": "https://app.asana.com/-/oauth_token" },
            { "key": "state", "value": "{{$randomUUID}}" },
            { "key": "scope", "value": "{{oauthScopes}}" },
            { "key": "accessTokenUrl", "value": "https://app.asana.com/-/oauth_token" },
            { "key": "clientId", "value": "{{oauthAppId}}" },
            { "key": "clientSecret", "value": "{{oauthSecret}}" },
            { "key": "authUrl", "value": "https://app.asana.com/-/oauth_authorize" },
            { "key": "useBrowser", "value": true },
            { "key": "tokenName", "value": "access_token" },
            { "key": "addTokenTo", "value": "header" }
        ]
    })
}

fn add_item_to_folder(collection: &mut Json, item: &Json, tag: &str) {
    let Some(folders) = collection["item"].as_array_mut() else {
        return;
    };
    if let Some(folder) = folders.iter_mut().find(|f| f["name"].as_str() == Some(tag)) {
        if let Some(items) = folder["item"].as_array_mut() {
            items.push(item.clone());
        }
    }
}

/// `/tasks/{task_gid}` → `["tasks", ":task_gid"]`
fn request_path(path: &str) -> Vec<String> {
    path.replace('{', ":")
        .replace('}', "")
        .split('/')
        .skip(1)
        .map(str::to_string)
        .collect()
}

fn original_request(method: &str, path: &str, params: &Params) -> Json {
    json!({
        "method": method,
        "url": {
            "host": ["{{baseUrl}}"],
            "path": request_path(path),
            "variable": params.path,
            "query": params.query,
        },
        "header": [
            { "key": "Accept", "value": "application/json" },
            {
                "key": "Authorization",
                "value": "Bearer <token>",
                "description": {
                    "content": "Added as a part of security scheme: bearer",
                    "type": "text/plain"
                }
            }
        ],
        "body": {}
    })
}

fn build_param(param: &Json) -> Json {
    let example = &param["example"];
    let value = match example {
        Json::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        other if is_truthy(other) => display_value(other),
        _ => String::new(),
    };

    json!({
        "key": param["name"].clone(),
        "value": value,
        "type": param["schema"]["type"].clone(),
        "disabled": !param["required"].as_bool().unwrap_or(false),
        "description": markdown(param["description"].as_str().unwrap_or_default()),
    })
}

fn form_fields(schema: &Json) -> Json {
    if schema["type"].as_str() != Some("object") {
        return json!([]);
    }
    let Some(properties) = schema["properties"].as_object() else {
        return json!([]);
    };
    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|r| r.iter().filter_map(Json::as_str).collect())
        .unwrap_or_default();

    let fields = properties
        .iter()
        .map(|(name, field)| {
            let description = field["description"].as_str().unwrap_or_default();
            if field["format"].as_str() == Some("binary") {
                json!({
                    "key": name,
                    "type": "file",
                    "src": [],
                    "description": description,
                })
            } else {
                json!({
                    "key": name,
                    "value": field_example_value(field),
                    "type": "text",
                    "disabled": !required.contains(&name.as_str()),
                    "description": description,
                })
            }
        })
        .collect();

    Json::Array(fields)
}

fn field_example_value(field: &Json) -> String {
    if let Some(example) = field.get("example") {
        return display_value(example);
    }
    if let Some(first) = field["enum"].get(0) {
        return display_value(first);
    }
    match field["type"].as_str() {
        Some("string") => "<string>",
        Some("number") | Some("integer") => "0",
        Some("boolean") => "false",
        _ => "",
    }
    .to_string()
}

/// Synthesize an example value from a dereferenced schema
fn example_from_schema(schema: &Json, ignore_readonly: bool) -> Json {
    if !is_truthy(schema) {
        return Json::Null;
    }

    if let Some(all_of) = schema["allOf"].as_array() {
        let mut merged = Map::new();
        for sub in all_of {
            if let Json::Object(part) = example_from_schema(sub, ignore_readonly) {
                merged.extend(part);
            }
        }
        return Json::Object(merged);
    }

    match schema["type"].as_str() {
        Some("object") => {
            let mut out = Map::new();
            if let Some(properties) = schema["properties"].as_object() {
                for (name, property) in properties {
                    if ignore_readonly && property["readOnly"].as_bool().unwrap_or(false) {
                        continue;
                    }
                    out.insert(name.clone(), example_from_schema(property, ignore_readonly));
                }
            }
            Json::Object(out)
        }
        Some("array") => {
            let items = schema.get("items").cloned().unwrap_or_else(|| json!({}));
            Json::Array(vec![example_from_schema(&items, ignore_readonly)])
        }
        _ => primitive_example(schema),
    }
}

fn primitive_example(schema: &Json) -> Json {
    if let Some(example) = schema.get("example") {
        return example.clone();
    }
    if let Some(first) = schema["enum"].get(0) {
        return first.clone();
    }
    match schema["type"].as_str() {
        Some("string") => json!("<string>"),
        Some("number") | Some("integer") => json!(0),
        Some("boolean") => json!(false),
        _ => json!("<value>"),
    }
}

// ===== Post-processing =====

fn link_whitespace() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\]\s+\(").expect("valid link whitespace pattern"))
}

fn relative_link() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[([^\]]+)\]\((/[^\)]+)\)").expect("valid relative link pattern")
    })
}

/// Rewrite relative markdown links against the developer docs site
pub fn absolutize_links(content: &str) -> String {
    let compact = link_whitespace().replace_all(content, "](");
    relative_link()
        .replace_all(&compact, format!("[${{1}}]({}${{2}})", DEV_DOCS_BASE_URL).as_str())
        .into_owned()
}

/// Apply [`absolutize_links`] to every markdown description in the collection
fn absolutize_doc_links(value: &mut Json) {
    match value {
        Json::Object(map) => {
            if map.get("type").and_then(Json::as_str) == Some(MARKDOWN) {
                if let Some(Json::String(content)) = map.get_mut("content") {
                    if !content.is_empty() {
                        *content = absolutize_links(content);
                    }
                }
            }
            for child in map.values_mut() {
                absolutize_doc_links(child);
            }
        }
        Json::Array(items) => items.iter_mut().for_each(absolutize_doc_links),
        _ => {}
    }
}

// ===== Helpers =====

fn first_entry(content: &Json) -> Option<(String, &Json)> {
    content
        .as_object()
        .and_then(|m| m.iter().next())
        .map(|(k, v)| (k.clone(), v))
}

/// Python-style truthiness: null, false, 0, "" and empty containers are false
fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Json::String(s) => !s.is_empty(),
        Json::Array(a) => !a.is_empty(),
        Json::Object(o) => !o.is_empty(),
    }
}

/// Render a scalar the way it reads in a form field
fn display_value(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Bool(true) => "True".to_string(),
        Json::Bool(false) => "False".to_string(),
        Json::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn to_pretty(value: &Json) -> ConvertResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
