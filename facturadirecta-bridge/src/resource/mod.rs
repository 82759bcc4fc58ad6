//! Billing resources and the operations the bridge can run on them.
//!
//! A [`Resource`] is one of the seven FacturaDirecta entity types. An [`Operation`] is
//! a CRUD action, or one of the two resource-specific actions (`send` for invoices,
//! `updateStock` for products). Which pairs are valid is decided by the dispatch
//! table in [`crate::dispatch`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

pub mod endpoint;
pub mod field_map;
pub mod query;
pub mod request;

pub use endpoint::EndpointResolver;
pub use field_map::{BodySchema, FieldRule};
pub use query::{QueryOptions, compose_query};
pub use request::{HttpMethod, RequestDescriptor, RequestParams};

/// FacturaDirecta billing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    /// Customers (`/clients.xml`).
    Client,
    /// Issued invoices (`/invoices.xml`).
    Invoice,
    /// Catalog products with optional stock tracking (`/products.xml`).
    Product,
    /// Suppliers (`/providers.xml`).
    Provider,
    /// Supplier expenses (`/expenses.xml`).
    Expense,
    /// Invoice templates issued on a schedule (`/recurring-invoices.xml`).
    RecurringInvoice,
    /// Accepted payment methods (`/payment-methods.xml`).
    PaymentMethod,
}

impl Resource {
    /// Every resource, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Client,
        Self::Invoice,
        Self::Product,
        Self::Provider,
        Self::Expense,
        Self::RecurringInvoice,
        Self::PaymentMethod,
    ];

    /// Parameter-bag name of the resource (e.g. `recurringInvoice`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Invoice => "invoice",
            Self::Product => "product",
            Self::Provider => "provider",
            Self::Expense => "expense",
            Self::RecurringInvoice => "recurringInvoice",
            Self::PaymentMethod => "paymentMethod",
        }
    }

    /// URL collection segment (e.g. `recurring-invoices`).
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Client => "clients",
            Self::Invoice => "invoices",
            Self::Product => "products",
            Self::Provider => "providers",
            Self::Expense => "expenses",
            Self::RecurringInvoice => "recurring-invoices",
            Self::PaymentMethod => "payment-methods",
        }
    }

    /// Root element of the XML documents exchanged for this resource.
    ///
    /// Matches the parameter-bag name for every resource.
    #[must_use]
    pub const fn element(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownResource(s.to_owned()))
    }
}

/// Action requested on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Create a new entity.
    Create,
    /// Fetch one entity by id.
    Get,
    /// List entities of the collection.
    GetAll,
    /// Replace the fields of an existing entity.
    Update,
    /// Remove an entity by id.
    Delete,
    /// Email an invoice to its client (invoices only).
    Send,
    /// Register a stock movement (products only).
    UpdateStock,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Get,
        Self::GetAll,
        Self::Update,
        Self::Delete,
        Self::Send,
        Self::UpdateStock,
    ];

    /// The operations every resource supports.
    pub const BASE: [Self; 5] = [Self::Create, Self::Get, Self::GetAll, Self::Update, Self::Delete];

    /// Parameter-bag name of the operation (e.g. `getAll`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Send => "send",
            Self::UpdateStock => "updateStock",
        }
    }

    /// Returns true when the operation addresses a single existing entity and therefore
    /// needs an id.
    #[must_use]
    pub const fn targets_entity(self) -> bool {
        !matches!(self, Self::Create | Self::GetAll)
    }

    /// Parses an operation name in the context of `resource`.
    ///
    /// Only the spelling is checked here; whether the pair is supported is up to the
    /// dispatch table.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownOperation`] if `name` is not an operation.
    pub fn parse_for(resource: &str, name: &str) -> Result<Self, BridgeError> {
        Self::ALL.into_iter().find(|op| op.as_str() == name).ok_or_else(|| {
            BridgeError::UnknownOperation {
                resource: resource.to_owned(),
                operation: name.to_owned(),
            }
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_round_trips_through_name() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_resource_unknown_name() {
        let err = "Client".parse::<Resource>().unwrap_err();
        assert!(matches!(err, BridgeError::UnknownResource(name) if name == "Client"));
    }

    #[test]
    fn test_resource_collections_are_distinct() {
        let mut collections: Vec<_> = Resource::ALL.iter().map(|r| r.collection()).collect();
        collections.sort_unstable();
        collections.dedup();
        assert_eq!(collections.len(), Resource::ALL.len());
    }

    #[test]
    fn test_resource_serde_names() {
        let json = serde_json::to_string(&Resource::RecurringInvoice).unwrap();
        assert_eq!(json, "\"recurringInvoice\"");
        let parsed: Resource = serde_json::from_str("\"paymentMethod\"").unwrap();
        assert_eq!(parsed, Resource::PaymentMethod);
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse_for("product", "updateStock").unwrap(), Operation::UpdateStock);
        assert_eq!(Operation::parse_for("client", "getAll").unwrap(), Operation::GetAll);

        let err = Operation::parse_for("client", "archive").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnknownOperation { ref resource, ref operation }
                if resource == "client" && operation == "archive"
        ));
    }

    #[test]
    fn test_operation_targets_entity() {
        assert!(!Operation::Create.targets_entity());
        assert!(!Operation::GetAll.targets_entity());
        assert!(Operation::Get.targets_entity());
        assert!(Operation::Update.targets_entity());
        assert!(Operation::Delete.targets_entity());
        assert!(Operation::Send.targets_entity());
        assert!(Operation::UpdateStock.targets_entity());
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(Resource::PaymentMethod.to_string(), "paymentMethod");
        assert_eq!(Operation::GetAll.to_string(), "getAll");
    }
}
