//! Resource-operation dispatch.
//!
//! Routing is a lookup table keyed by `(Resource, Operation)` whose values are the
//! request builders of [`crate::resource::request`]. The table is built once and
//! checked on construction: every resource carries the five base operations, `send`
//! exists only for invoices and `updateStock` only for products. A pair that is not in
//! the table is [`BridgeError::UnknownOperation`], never a silent no-op.
//!
//! # Examples
//!
//! ```
//! use facturadirecta_bridge::{
//!     dispatch::dispatch,
//!     resource::{HttpMethod, QueryOptions, RequestParams},
//! };
//! use serde_json::json;
//!
//! let Some(data) = json!({"name": "Acme", "taxCode": "B123"}).as_object().cloned() else {
//!     unreachable!()
//! };
//! let query = QueryOptions::default();
//! let params = RequestParams { id: None, data: &data, query: &query };
//!
//! let descriptor = dispatch("provider", "create", &params)?;
//! assert_eq!(descriptor.method, HttpMethod::Post);
//! assert_eq!(descriptor.path, "/providers.xml");
//!
//! assert!(dispatch("client", "send", &params).is_err());
//! # Ok::<(), facturadirecta_bridge::BridgeError>(())
//! ```

use std::{collections::HashMap, sync::LazyLock};

use crate::{
    error::{BridgeError, Result},
    resource::{Operation, RequestDescriptor, RequestParams, Resource, request},
    xml::ResponseFields,
};

/// Builds the request of one `(resource, operation)` pair.
pub type Builder = fn(Resource, &RequestParams<'_>) -> Result<RequestDescriptor>;

/// Parsed result of one dispatched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutput {
    /// A single result mapping.
    Single(ResponseFields),
    /// One mapping per listed entity, produced by `getAll`.
    Many(Vec<ResponseFields>),
}

impl DispatchOutput {
    /// Flattens the output into its mappings, in order.
    #[must_use]
    pub fn into_records(self) -> Vec<ResponseFields> {
        match self {
            Self::Single(fields) => vec![fields],
            Self::Many(records) => records,
        }
    }
}

/// Lookup table from `(Resource, Operation)` to its request builder.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    builders: HashMap<(Resource, Operation), Builder>,
}

static TABLE: LazyLock<DispatchTable> = LazyLock::new(DispatchTable::new);

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// Builds the full FacturaDirecta table.
    #[must_use]
    pub fn new() -> Self {
        let mut builders: HashMap<(Resource, Operation), Builder> = HashMap::new();

        for resource in Resource::ALL {
            builders.insert((resource, Operation::Create), request::create);
            builders.insert((resource, Operation::Get), request::get);
            builders.insert((resource, Operation::GetAll), request::get_all);
            builders.insert((resource, Operation::Update), request::update);
            builders.insert((resource, Operation::Delete), request::delete);
        }
        builders.insert((Resource::Invoice, Operation::Send), request::send);
        builders.insert((Resource::Product, Operation::UpdateStock), request::update_stock);

        let table = Self { builders };
        debug_assert!(table.validate().is_ok(), "dispatch table is incomplete");
        table
    }

    /// Shared, lazily built table.
    #[must_use]
    pub fn global() -> &'static Self {
        &TABLE
    }

    /// Checks the shape of the table.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] naming the first missing or misplaced entry.
    pub fn validate(&self) -> Result<()> {
        for resource in Resource::ALL {
            let missing = Operation::BASE.into_iter().find(|op| !self.supports(resource, *op));
            if let Some(missing) = missing {
                return Err(BridgeError::Config(format!(
                    "dispatch table lacks \"{missing}\" for {resource}"
                )));
            }
        }

        for &(resource, operation) in self.builders.keys() {
            let misplaced = match operation {
                Operation::Send => resource != Resource::Invoice,
                Operation::UpdateStock => resource != Resource::Product,
                _ => false,
            };
            if misplaced {
                return Err(BridgeError::Config(format!(
                    "\"{operation}\" is only valid for {}",
                    if operation == Operation::Send { Resource::Invoice } else { Resource::Product }
                )));
            }
        }

        Ok(())
    }

    /// Returns true if the pair has a builder.
    #[must_use]
    pub fn supports(&self, resource: Resource, operation: Operation) -> bool {
        self.builders.contains_key(&(resource, operation))
    }

    /// Operations registered for `resource`, in declaration order.
    #[must_use]
    pub fn operations(&self, resource: Resource) -> Vec<Operation> {
        Operation::ALL.into_iter().filter(|op| self.supports(resource, *op)).collect()
    }

    /// Builds the request for a typed pair.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownOperation`] if the pair has no builder, or the
    /// builder's own error.
    pub fn build(
        &self,
        resource: Resource,
        operation: Operation,
        params: &RequestParams<'_>,
    ) -> Result<RequestDescriptor> {
        let builder = self.builders.get(&(resource, operation)).ok_or_else(|| {
            BridgeError::UnknownOperation {
                resource: resource.to_string(),
                operation: operation.to_string(),
            }
        })?;
        builder(resource, params)
    }

    /// Resolves names to a typed pair.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownResource`] or [`BridgeError::UnknownOperation`].
    pub fn resolve(&self, resource: &str, operation: &str) -> Result<(Resource, Operation)> {
        let parsed_resource: Resource = resource.parse()?;
        let parsed_operation = Operation::parse_for(resource, operation)?;
        if !self.supports(parsed_resource, parsed_operation) {
            return Err(BridgeError::UnknownOperation {
                resource: resource.to_owned(),
                operation: operation.to_owned(),
            });
        }
        Ok((parsed_resource, parsed_operation))
    }
}

/// Routes a named `(resource, operation)` pair to its request descriptor.
///
/// # Errors
///
/// Returns [`BridgeError::UnknownResource`], [`BridgeError::UnknownOperation`], or
/// [`BridgeError::InvalidInput`] when an entity operation has no id.
pub fn dispatch(
    resource: &str,
    operation: &str,
    params: &RequestParams<'_>,
) -> Result<RequestDescriptor> {
    let table = DispatchTable::global();
    let (resource, operation) = table.resolve(resource, operation)?;
    table.build(resource, operation, params)
}
