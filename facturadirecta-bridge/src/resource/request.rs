//! Request descriptors and the per-operation builders that produce them.
//!
//! A [`RequestDescriptor`] is the transport-neutral description of one API call: verb,
//! path below `/api`, optional rooted body and query mapping. Builders are pure; they
//! never touch the network and never see credentials.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::{BridgeError, Result},
    resource::{BodySchema, EndpointResolver, Operation, QueryOptions, Resource, compose_query},
};

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call, ready to be executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path below `/api`, including the `.xml` suffix.
    pub path: String,
    /// Rooted body mapping (`{root: {children..}}`), if the call sends one.
    pub body: Option<Map<String, Value>>,
    /// Query parameters.
    pub query: BTreeMap<String, String>,
}

impl RequestDescriptor {
    fn new(method: HttpMethod, path: String) -> Self {
        Self { method, path, body: None, query: BTreeMap::new() }
    }

    fn with_body(mut self, root: &str, children: Map<String, Value>) -> Self {
        let mut body = Map::new();
        body.insert(root.to_owned(), Value::Object(children));
        self.body = Some(body);
        self
    }

    /// Root element of the body, if any.
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.body.as_ref()?.keys().next().map(String::as_str)
    }
}

/// Item values a builder reads.
#[derive(Debug, Clone, Copy)]
pub struct RequestParams<'a> {
    /// Entity id for operations that address one entity.
    pub id: Option<&'a str>,
    /// Flat field values.
    pub data: &'a Map<String, Value>,
    /// Listing controls, read by `getAll` only.
    pub query: &'a QueryOptions,
}

impl RequestParams<'_> {
    /// The id must be non-empty and fit in one path segment.
    fn require_id(&self, resource: Resource, operation: Operation) -> Result<&str> {
        let id = self.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            BridgeError::InvalidInput(format!(
                "the \"{operation}\" operation on {resource} requires an id"
            ))
        })?;
        if id.contains(['/', '\\']) || matches!(id, "." | "..") {
            return Err(BridgeError::InvalidInput(format!(
                "id '{id}' of {resource} is not a single path segment"
            )));
        }
        Ok(id)
    }
}

/// `POST /{collection}.xml` with the entity document.
///
/// # Errors
///
/// Never fails; returns `Result` to share the builder signature.
#[allow(clippy::unnecessary_wraps)]
pub fn create(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let schema = BodySchema::for_resource(resource);
    let children = schema.fields_from(params.data, Operation::Create);
    let path = EndpointResolver::new(resource).collection_endpoint();
    Ok(RequestDescriptor::new(HttpMethod::Post, path).with_body(schema.root, children))
}

/// `GET /{collection}/{id}.xml`.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the id is missing.
pub fn get(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let id = params.require_id(resource, Operation::Get)?;
    Ok(RequestDescriptor::new(HttpMethod::Get, EndpointResolver::new(resource).member_endpoint(id)))
}

/// `GET /{collection}.xml` with the composed listing query.
///
/// # Errors
///
/// Never fails; returns `Result` to share the builder signature.
#[allow(clippy::unnecessary_wraps)]
pub fn get_all(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let path = EndpointResolver::new(resource).collection_endpoint();
    let mut descriptor = RequestDescriptor::new(HttpMethod::Get, path);
    descriptor.query = compose_query(params.query);
    Ok(descriptor)
}

/// `PUT /{collection}/{id}.xml` with the entity document, `id` first.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the id is missing.
pub fn update(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let id = params.require_id(resource, Operation::Update)?;
    let schema = BodySchema::for_resource(resource);

    let mut children = Map::new();
    children.insert("id".to_owned(), Value::String(id.to_owned()));
    children.extend(schema.fields_from(params.data, Operation::Update));

    let path = EndpointResolver::new(resource).member_endpoint(id);
    Ok(RequestDescriptor::new(HttpMethod::Put, path).with_body(schema.root, children))
}

/// `DELETE /{collection}/{id}.xml`.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the id is missing.
pub fn delete(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let id = params.require_id(resource, Operation::Delete)?;
    let path = EndpointResolver::new(resource).member_endpoint(id);
    Ok(RequestDescriptor::new(HttpMethod::Delete, path))
}

/// `POST /invoices/{id}/send.xml`, no body.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the id is missing.
pub fn send(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let id = params.require_id(resource, Operation::Send)?;
    let path = EndpointResolver::new(resource).action_endpoint(id, "send");
    Ok(RequestDescriptor::new(HttpMethod::Post, path))
}

/// `PUT /products/{id}/stock.xml` with a `stockMovement` document.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidInput`] if the id is missing.
pub fn update_stock(resource: Resource, params: &RequestParams<'_>) -> Result<RequestDescriptor> {
    let id = params.require_id(resource, Operation::UpdateStock)?;
    let schema = BodySchema::STOCK_MOVEMENT;
    let children = schema.fields_from(params.data, Operation::UpdateStock);
    let path = EndpointResolver::new(resource).action_endpoint(id, "stock");
    Ok(RequestDescriptor::new(HttpMethod::Put, path).with_body(schema.root, children))
}
