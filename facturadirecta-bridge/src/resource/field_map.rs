//! Body schemas: how flat parameter names map onto FacturaDirecta XML elements.
//!
//! Each resource declares the parameters it sends and the element each one becomes.
//! Most parameters keep their name, a few are renamed (`name` is sent as `n` for
//! clients and providers) and foreign keys are wrapped in a nested element
//! (`clientId` becomes `<client><id>..</id></client>`).

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::resource::{Operation, Resource};

/// How a parameter is placed in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Sent as a leaf element.
    Leaf,
    /// Sent as `<element><id>value</id></element>`.
    Reference,
}

/// Mapping of one parameter onto one body element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Name of the parameter in the item data.
    pub param: &'static str,
    /// Wire element name.
    pub element: &'static str,
    /// Placement of the value.
    pub kind: FieldKind,
    /// Only sent when creating the entity.
    pub create_only: bool,
}

impl FieldRule {
    /// Leaf field whose element has the same name as the parameter.
    #[must_use]
    pub const fn plain(name: &'static str) -> Self {
        Self { param: name, element: name, kind: FieldKind::Leaf, create_only: false }
    }

    /// Leaf field sent under a different element name.
    #[must_use]
    pub const fn renamed(param: &'static str, element: &'static str) -> Self {
        Self { param, element, kind: FieldKind::Leaf, create_only: false }
    }

    /// Foreign key wrapped as `<element><id>..</id></element>`.
    #[must_use]
    pub const fn reference(param: &'static str, element: &'static str) -> Self {
        Self { param, element, kind: FieldKind::Reference, create_only: false }
    }

    /// Marks the field as sent on `create` only.
    #[must_use]
    pub const fn on_create(mut self) -> Self {
        self.create_only = true;
        self
    }

    fn applies_to(&self, operation: Operation) -> bool {
        !self.create_only || operation == Operation::Create
    }
}

/// Root element plus field rules of one outbound document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySchema {
    /// Root element name.
    pub root: &'static str,
    /// Field rules, in the order elements are written.
    pub fields: &'static [FieldRule],
}

const CLIENT_FIELDS: &[FieldRule] = &[
    FieldRule::renamed("name", "n"),
    FieldRule::plain("taxCode"),
    FieldRule::plain("email"),
    FieldRule::plain("phone"),
    FieldRule::plain("address"),
    FieldRule::plain("city"),
    FieldRule::plain("postalCode"),
    FieldRule::plain("province"),
    FieldRule::plain("country"),
];

const INVOICE_FIELDS: &[FieldRule] = &[
    FieldRule::reference("clientId", "client"),
    FieldRule::plain("date"),
    FieldRule::plain("dueDate"),
    FieldRule::plain("description"),
    FieldRule::plain("amount"),
    FieldRule::plain("taxRate"),
    FieldRule::plain("sendEmail").on_create(),
];

const PRODUCT_FIELDS: &[FieldRule] = &[
    FieldRule::plain("productCode"),
    FieldRule::plain("description"),
    FieldRule::plain("price"),
    FieldRule::plain("discountRate"),
    FieldRule::plain("purchasePrice"),
    FieldRule::reference("providerId", "provider"),
    FieldRule::plain("stockEnabled"),
    FieldRule::plain("stock"),
];

const PROVIDER_FIELDS: &[FieldRule] = &[
    FieldRule::renamed("name", "n"),
    FieldRule::plain("taxCode"),
    FieldRule::plain("email"),
    FieldRule::plain("phone"),
    FieldRule::plain("address"),
];

const EXPENSE_FIELDS: &[FieldRule] = &[
    FieldRule::reference("providerId", "provider"),
    FieldRule::plain("date"),
    FieldRule::plain("description"),
    FieldRule::plain("amount"),
    FieldRule::plain("taxRate"),
];

const RECURRING_INVOICE_FIELDS: &[FieldRule] = &[
    FieldRule::reference("clientId", "client"),
    FieldRule::plain("description"),
    FieldRule::plain("amount"),
    FieldRule::plain("frequency"),
    FieldRule::plain("startDate"),
    FieldRule::plain("active"),
];

const PAYMENT_METHOD_FIELDS: &[FieldRule] = &[
    FieldRule::plain("name"),
    FieldRule::plain("description"),
    FieldRule::plain("active"),
];

const STOCK_MOVEMENT_FIELDS: &[FieldRule] = &[
    FieldRule::plain("stock"),
    FieldRule::renamed("stockMovementType", "type"),
    FieldRule::plain("reason"),
];

impl BodySchema {
    /// Stock movement document sent by `updateStock`.
    pub const STOCK_MOVEMENT: Self = Self { root: "stockMovement", fields: STOCK_MOVEMENT_FIELDS };

    /// Entity document schema of `resource`, used by `create` and `update`.
    #[must_use]
    pub const fn for_resource(resource: Resource) -> Self {
        let fields = match resource {
            Resource::Client => CLIENT_FIELDS,
            Resource::Invoice => INVOICE_FIELDS,
            Resource::Product => PRODUCT_FIELDS,
            Resource::Provider => PROVIDER_FIELDS,
            Resource::Expense => EXPENSE_FIELDS,
            Resource::RecurringInvoice => RECURRING_INVOICE_FIELDS,
            Resource::PaymentMethod => PAYMENT_METHOD_FIELDS,
        };
        Self { root: resource.element(), fields }
    }

    /// Wire element name for `param`, or `param` itself when the schema does not rename it.
    #[must_use]
    pub fn element_for<'a>(&self, param: &'a str) -> Cow<'a, str> {
        self.fields
            .iter()
            .find(|rule| rule.param == param)
            .map_or(Cow::Borrowed(param), |rule| Cow::Borrowed(rule.element))
    }

    /// Builds the children of the root element from the item data.
    ///
    /// Parameters that are missing, `null` or `""` are left out. A foreign key without
    /// a value produces no wrapper element at all. Parameters not named by the schema
    /// are ignored.
    #[must_use]
    pub fn fields_from(
        &self,
        data: &Map<String, Value>,
        operation: Operation,
    ) -> Map<String, Value> {
        let mut body = Map::new();
        for rule in self.fields.iter().filter(|rule| rule.applies_to(operation)) {
            let Some(value) = data.get(rule.param).filter(|value| is_present(value)) else {
                continue;
            };
            let value = match rule.kind {
                FieldKind::Leaf => value.clone(),
                FieldKind::Reference => {
                    let mut reference = Map::new();
                    reference.insert("id".to_owned(), value.clone());
                    Value::Object(reference)
                }
            };
            body.insert(rule.element.to_owned(), value);
        }
        body
    }
}

/// Returns false for values the API should never see: `null` and the empty string.
#[must_use]
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
