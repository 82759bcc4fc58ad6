//! Endpoint resolution for FacturaDirecta resources.
//!
//! All paths are relative to `/api` and carry the `.xml` suffix that selects the XML
//! representation. Ids are inserted verbatim.

use crate::resource::Resource;

/// Resolves API paths for a single resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointResolver {
    resource: Resource,
}

impl EndpointResolver {
    /// Creates a resolver for `resource`.
    #[must_use]
    pub const fn new(resource: Resource) -> Self {
        Self { resource }
    }

    /// Collection path used by `create` and `getAll`.
    #[must_use]
    pub fn collection_endpoint(&self) -> String {
        format!("/{}.xml", self.resource.collection())
    }

    /// Member path used by `get`, `update` and `delete`.
    #[must_use]
    pub fn member_endpoint(&self, id: &str) -> String {
        format!("/{}/{id}.xml", self.resource.collection())
    }

    /// Action path below a member, e.g. `/invoices/{id}/send.xml`.
    #[must_use]
    pub fn action_endpoint(&self, id: &str, action: &str) -> String {
        format!("/{}/{id}/{action}.xml", self.resource.collection())
    }
}

impl From<Resource> for EndpointResolver {
    fn from(resource: Resource) -> Self {
        Self::new(resource)
    }
}
