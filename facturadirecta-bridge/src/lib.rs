//! FacturaDirecta Bridge: a uniform CRUD surface over the FacturaDirecta billing API
//!
//! FacturaDirecta speaks XML over HTTPS with one endpoint family per entity type.
//! This crate turns a declarative per-item parameter bag (`resource`, `operation`,
//! an optional id and flat field values) into the matching HTTP request, and turns
//! the XML answer back into a flat `tag -> text` mapping.
//!
//! # Architecture
//!
//! ```text
//! ItemParameters ──► dispatch ──► RequestDescriptor ──► ApiClient ──► Transport
//!  (host JSON)     (Resource,      (method, path,      (URL, auth,    (reqwest,
//!                   Operation)      body, query)        XML body)      HTTPS)
//!                                                           │
//! BatchRecord ◄──── Bridge ◄──── ResponseFields ◄── xml::parse_response
//! ```
//!
//! - [`resource`]: entity and operation enums, endpoint paths, body schemas,
//!   query composition and the request builders.
//! - [`dispatch`](mod@dispatch): the `(Resource, Operation) -> builder` table.
//! - [`xml`]: serializer (escaping, CDATA, empty-field omission) and a decoder that
//!   never fails.
//! - [`client`]: the single HTTP execution boundary.
//! - [`batch`]: in-order item execution with optional failure isolation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use facturadirecta_bridge::{Bridge, BridgeConfig, Credentials, ItemParameters};
//!
//! # async fn example() -> facturadirecta_bridge::Result<()> {
//! let config = BridgeConfig { continue_on_fail: true, ..BridgeConfig::default() };
//! let bridge = Bridge::new(Credentials::from_env()?, &config)?;
//!
//! let items = [
//!     ItemParameters::new("client", "create")
//!         .with_field("name", "Acme")
//!         .with_field("email", "billing@acme.test"),
//!     ItemParameters::new("invoice", "send").with_id("981"),
//! ];
//!
//! for record in bridge.run_batch(&items).await? {
//!     println!("item {}: {:?}", record.paired_item.item, record.json);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Building requests without sending them
//!
//! ```
//! use facturadirecta_bridge::{
//!     dispatch,
//!     resource::{HttpMethod, QueryOptions, RequestParams},
//! };
//! use serde_json::{Map, json};
//!
//! let data: Map<_, _> = json!({"stock": 10, "stockMovementType": "decrease", "reason": "damage"})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//! let query = QueryOptions::default();
//! let params = RequestParams { id: Some("42"), data: &data, query: &query };
//!
//! let descriptor = dispatch("product", "updateStock", &params).unwrap();
//! assert_eq!(descriptor.method, HttpMethod::Put);
//! assert_eq!(descriptor.path, "/products/42/stock.xml");
//! assert_eq!(descriptor.root(), Some("stockMovement"));
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, BridgeError>`](Result). Decoding a
//! response is not fallible: undecodable bodies come back as data under
//! [`xml::RAW_RESPONSE`] and [`xml::PARSE_ERROR`].
//!
//! ```rust,no_run
//! use facturadirecta_bridge::{Bridge, BridgeError, ItemParameters};
//!
//! # async fn example(bridge: Bridge) {
//! match bridge.execute_item(&ItemParameters::new("client", "get").with_id("7")).await {
//!     Ok(output) => println!("{} record(s)", output.into_records().len()),
//!     Err(BridgeError::Api { status: Some(404), .. }) => eprintln!("no such client"),
//!     Err(e) if e.is_routing() => eprintln!("bad parameters: {e}"),
//!     Err(e) => eprintln!("request failed: {e}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and tracing-subscriber"
)]

pub mod batch;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod observability;
pub mod resource;
pub mod transport;
pub mod xml;

pub use batch::{BatchRecord, Bridge, ItemParameters};
pub use client::ApiClient;
pub use config::{BridgeConfig, Credentials};
pub use dispatch::{DispatchOutput, dispatch};
pub use error::{BridgeError, Result};
pub use resource::{Operation, Resource};
pub use xml::ResponseFields;
