//! Per-item parameters and batch execution with item-level failure isolation.
//!
//! The host hands over one parameter bag per input item. [`Bridge::run_batch`] runs
//! them strictly in order, one request in flight, and returns one [`BatchRecord`] per
//! output mapping, each paired with the index of the item that produced it.
//!
//! When an item fails the batch is aborted with [`BridgeError::Item`], unless
//! `continue_on_fail` is set, in which case the failure becomes an
//! `{"error": message}` record and the next item runs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{Instrument, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::{
    client::ApiClient,
    config::{BridgeConfig, Credentials},
    dispatch::{DispatchOutput, DispatchTable},
    error::{BridgeError, Result},
    resource::{Operation, QueryOptions, RequestParams, query::DEFAULT_LIMIT},
    transport::{HttpTransport, Transport},
    xml,
};

/// Key of the message in a caught failure record.
pub const ERROR_KEY: &str = "error";

/// Parameter bag of one input item.
///
/// Field values live in `data`; the per-resource collections a host form produces
/// (`clientData`, `invoiceData`, `stockData`, ...) are accepted as aliases.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::ItemParameters;
/// use serde_json::json;
///
/// let item = ItemParameters::from_json(&json!({
///     "resource": "product",
///     "operation": "updateStock",
///     "id": 42,
///     "stockData": {"stock": 10, "stockMovementType": "decrease", "reason": "damage"}
/// }))
/// .unwrap();
///
/// assert_eq!(item.id.as_deref(), Some("42"));
/// assert_eq!(item.data["stock"], 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemParameters {
    /// Resource name, e.g. `invoice`.
    pub resource: String,
    /// Operation name, e.g. `getAll`.
    pub operation: String,
    /// Entity id; numbers are accepted and kept in their decimal form.
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Flat field values.
    #[serde(
        default,
        alias = "clientData",
        alias = "invoiceData",
        alias = "productData",
        alias = "stockData",
        alias = "providerData",
        alias = "expenseData",
        alias = "recurringInvoiceData",
        alias = "paymentMethodData"
    )]
    pub data: Map<String, Value>,
    /// List every entity instead of one page (`getAll`).
    #[serde(default)]
    pub return_all: bool,
    /// Page size (`getAll`).
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Listing filters (`getAll`).
    #[serde(default)]
    pub filters: Filters,
}

/// Listing filters of a `getAll` item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Raw `key=value&key=value` filter string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_query: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    }))
}

impl ItemParameters {
    /// Creates a bag for `resource` / `operation` with default listing controls.
    pub fn new(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            id: None,
            data: Map::new(),
            return_all: false,
            limit: DEFAULT_LIMIT,
            filters: Filters::default(),
        }
    }

    /// Sets the entity id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets one field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Deserializes a bag from the host's JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidInput`] if the JSON does not describe an item.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::deserialize(value)
            .map_err(|e| BridgeError::InvalidInput(format!("invalid item parameters: {e}")))
    }

    /// Listing controls of the item.
    #[must_use]
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            return_all: self.return_all,
            limit: self.limit,
            custom_query: self.filters.custom_query.clone(),
        }
    }
}

/// Item index a record is paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    /// Zero-based index of the input item.
    pub item: usize,
}

/// One output entry handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    /// Result mapping, or `{"error": message}` for a caught failure.
    pub json: Map<String, Value>,
    /// Input item that produced the record.
    pub paired_item: PairedItem,
}

impl BatchRecord {
    /// Record carrying a result mapping.
    #[must_use]
    pub fn success(item: usize, json: Map<String, Value>) -> Self {
        Self { json, paired_item: PairedItem { item } }
    }

    /// Record carrying a caught failure.
    #[must_use]
    pub fn failure(item: usize, error: &BridgeError) -> Self {
        let mut json = Map::new();
        json.insert(ERROR_KEY.to_owned(), Value::String(error.to_string()));
        Self { json, paired_item: PairedItem { item } }
    }

    /// Failure message, if this is a caught failure record.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.json.get(ERROR_KEY).and_then(Value::as_str)
    }
}

/// Entry point for hosts: dispatches items against one FacturaDirecta account.
#[derive(Debug)]
pub struct Bridge<T = HttpTransport> {
    client: ApiClient<T>,
    table: &'static DispatchTable,
    continue_on_fail: bool,
}

impl Bridge<HttpTransport> {
    /// Creates a bridge backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] or [`BridgeError::InvalidCredentials`] when the
    /// client cannot be built.
    pub fn new(credentials: Credentials, config: &BridgeConfig) -> Result<Self> {
        let client = ApiClient::new(credentials, config)?;
        Ok(Self::with_client(client, config.continue_on_fail))
    }
}

impl<T: Transport> Bridge<T> {
    /// Creates a bridge over an existing client.
    #[must_use]
    pub fn with_client(client: ApiClient<T>, continue_on_fail: bool) -> Self {
        Self { client, table: DispatchTable::global(), continue_on_fail }
    }

    /// Returns the API client.
    #[must_use]
    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// Returns true when item failures become error records.
    #[must_use]
    pub fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }

    /// Routes and executes one item.
    ///
    /// `getAll` yields [`DispatchOutput::Many`] with one mapping per listed entity;
    /// every other operation yields [`DispatchOutput::Single`].
    ///
    /// # Errors
    ///
    /// Returns routing errors, [`BridgeError::InvalidInput`] for a missing id, and
    /// [`BridgeError::Api`] when the call fails.
    pub async fn execute_item(&self, item: &ItemParameters) -> Result<DispatchOutput> {
        let (resource, operation) = self.table.resolve(&item.resource, &item.operation)?;

        let query = item.query_options();
        let params = RequestParams { id: item.id.as_deref(), data: &item.data, query: &query };
        let descriptor = self.table.build(resource, operation, &params)?;

        let body = self.client.execute(&descriptor).await?;
        Ok(if operation == Operation::GetAll {
            DispatchOutput::Many(xml::parse_collection(&body, resource.element()))
        } else {
            DispatchOutput::Single(xml::parse_response(&body))
        })
    }

    /// Runs a batch of items in order.
    ///
    /// # Errors
    ///
    /// Without `continue_on_fail`, the first failing item aborts the batch with
    /// [`BridgeError::Item`]. With it, this never fails.
    #[instrument(
        skip_all,
        fields(
            batch_id = %Uuid::new_v4(),
            items = items.len(),
            continue_on_fail = self.continue_on_fail
        )
    )]
    pub async fn run_batch(&self, items: &[ItemParameters]) -> Result<Vec<BatchRecord>> {
        self.run(items.iter().cloned().map(Ok)).await
    }

    /// Runs a batch of raw host JSON items in order.
    ///
    /// An item that does not deserialize is an item failure like any other.
    ///
    /// # Errors
    ///
    /// Same as [`run_batch`](Self::run_batch).
    #[instrument(
        skip_all,
        fields(
            batch_id = %Uuid::new_v4(),
            items = items.len(),
            continue_on_fail = self.continue_on_fail
        )
    )]
    pub async fn run_json_batch(&self, items: &[Value]) -> Result<Vec<BatchRecord>> {
        self.run(items.iter().map(ItemParameters::from_json)).await
    }

    async fn run<I>(&self, items: I) -> Result<Vec<BatchRecord>>
    where
        I: Iterator<Item = Result<ItemParameters>>,
    {
        let mut records = Vec::new();

        for (index, parsed) in items.enumerate() {
            let outcome = match parsed {
                Ok(item) => {
                    let span = info_span!(
                        "item",
                        item = index,
                        resource = %item.resource,
                        operation = %item.operation
                    );
                    self.execute_item(&item).instrument(span).await
                }
                Err(err) => Err(err),
            };

            match outcome {
                Ok(output) => records.extend(
                    output
                        .into_records()
                        .into_iter()
                        .map(|fields| BatchRecord::success(index, fields.into_json())),
                ),
                Err(err) if self.continue_on_fail => {
                    warn!(item = index, error = %err, "item failed, continuing");
                    records.push(BatchRecord::failure(index, &err));
                }
                Err(err) => {
                    warn!(item = index, error = %err, "item failed, aborting batch");
                    return Err(err.for_item(index));
                }
            }
        }

        info!(records = records.len(), "batch completed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::transport::{RequestContext, TransportResponse};

    /// Replies with queued bodies in order; a `None` entry fails with 500.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        replies: Mutex<Vec<Option<&'static str>>>,
        paths: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Option<&'static str>>) -> Self {
            Self { replies: Mutex::new(replies), paths: Mutex::new(Vec::new()) }
        }

        fn reply(&self, ctx: &RequestContext<'_>) -> Result<TransportResponse> {
            self.paths.lock().unwrap().push(ctx.url.path().to_owned());
            let mut replies = self.replies.lock().unwrap();
            match (!replies.is_empty()).then(|| replies.remove(0)).flatten() {
                Some(body) => Ok(TransportResponse { status: 200, body: body.as_bytes().to_vec() }),
                None => Err(BridgeError::api_status(500, "Internal Server Error")),
            }
        }
    }

    impl Transport for ScriptedTransport {
        async fn get<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
            self.reply(&ctx)
        }

        async fn post<'a>(
            &'a self,
            ctx: RequestContext<'a>,
            _body: &'a [u8],
        ) -> Result<TransportResponse> {
            self.reply(&ctx)
        }

        async fn put<'a>(
            &'a self,
            ctx: RequestContext<'a>,
            _body: &'a [u8],
        ) -> Result<TransportResponse> {
            self.reply(&ctx)
        }

        async fn delete<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
            self.reply(&ctx)
        }

        fn protocol_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn bridge(
        replies: Vec<Option<&'static str>>,
        continue_on_fail: bool,
    ) -> Bridge<ScriptedTransport> {
        let client = ApiClient::with_transport(
            ScriptedTransport::new(replies),
            Credentials::new("acme", "token"),
            "facturadirecta.com",
        )
        .unwrap();
        Bridge::with_client(client, continue_on_fail)
    }

    fn paths(bridge: &Bridge<ScriptedTransport>) -> Vec<String> {
        bridge.client().transport().paths.lock().unwrap().clone()
    }

    #[test]
    fn test_item_parameters_defaults() {
        let input = json!({"resource": "client", "operation": "getAll"});
        let item = ItemParameters::from_json(&input).unwrap();
        assert_eq!(item.limit, 100);
        assert!(!item.return_all);
        assert!(item.id.is_none());
        assert!(item.data.is_empty());
        assert_eq!(item.query_options(), QueryOptions::default());
    }

    #[test]
    fn test_item_parameters_aliases_and_filters() {
        let item = ItemParameters::from_json(&json!({
            "resource": "client",
            "operation": "getAll",
            "returnAll": true,
            "filters": {"customQuery": "city=Madrid"},
            "clientData": {"name": "Acme"}
        }))
        .unwrap();

        assert!(item.return_all);
        assert_eq!(item.filters.custom_query.as_deref(), Some("city=Madrid"));
        assert_eq!(item.data["name"], "Acme");
    }

    #[test]
    fn test_item_parameters_invalid_json() {
        let err = ItemParameters::from_json(&json!({"operation": "get"})).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInput(_)));
    }

    #[test]
    fn test_batch_record_serialization() {
        let mut fields = Map::new();
        fields.insert("id".to_owned(), json!("1"));
        let record = BatchRecord::success(2, fields);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"json": {"id": "1"}, "pairedItem": {"item": 2}})
        );

        let failure = BatchRecord::failure(1, &BridgeError::InvalidInput("bad".to_owned()));
        assert_eq!(failure.error(), Some("Invalid input: bad"));
        assert_eq!(record.error(), None);
    }

    #[tokio::test]
    async fn test_execute_item_single() {
        let bridge = bridge(vec![Some("<client><id>7</id><n>Acme</n></client>")], false);
        let output = bridge
            .execute_item(&ItemParameters::new("client", "get").with_id("7"))
            .await
            .unwrap();

        let DispatchOutput::Single(fields) = output else { panic!("expected single output") };
        assert_eq!(fields.get("n"), Some("Acme"));
        assert_eq!(paths(&bridge), vec!["/api/clients/7.xml"]);
    }

    #[tokio::test]
    async fn test_execute_item_get_all_is_many() {
        let body = "<clients><client><id>1</id></client><client><id>2</id></client></clients>";
        let bridge = bridge(vec![Some(body)], false);
        let output = bridge.execute_item(&ItemParameters::new("client", "getAll")).await.unwrap();

        let DispatchOutput::Many(records) = output else { panic!("expected many output") };
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("id"), Some("2"));
    }

    #[tokio::test]
    async fn test_routing_errors_issue_no_request() {
        let bridge = bridge(vec![], false);

        let err = bridge.execute_item(&ItemParameters::new("customer", "get")).await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownResource(_)));

        let err = bridge.execute_item(&ItemParameters::new("client", "send")).await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownOperation { .. }));

        let err = bridge.execute_item(&ItemParameters::new("client", "get")).await.unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInput(_)));

        assert!(paths(&bridge).is_empty());
    }

    #[tokio::test]
    async fn test_batch_aborts_on_first_failure() {
        let replies =
            vec![Some("<client><id>1</id></client>"), None, Some("<client><id>3</id></client>")];
        let bridge = bridge(replies, false);
        let items = [
            ItemParameters::new("client", "get").with_id("1"),
            ItemParameters::new("client", "get").with_id("2"),
            ItemParameters::new("client", "get").with_id("3"),
        ];

        let err = bridge.run_batch(&items).await.unwrap_err();
        assert!(matches!(err, BridgeError::Item { item: 1, .. }));
        assert_eq!(paths(&bridge).len(), 2);
    }

    #[tokio::test]
    async fn test_batch_continue_on_fail() {
        let replies =
            vec![Some("<client><id>1</id></client>"), None, Some("<client><id>3</id></client>")];
        let bridge = bridge(replies, true);
        let items = [
            ItemParameters::new("client", "get").with_id("1"),
            ItemParameters::new("client", "get").with_id("2"),
            ItemParameters::new("client", "get").with_id("3"),
        ];

        let records = bridge.run_batch(&items).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].json["id"], "1");
        assert_eq!(records[1].paired_item.item, 1);
        assert!(records[1].error().unwrap().contains("500"));
        assert_eq!(records[2].json["id"], "3");
        assert_eq!(records[2].paired_item.item, 2);
    }

    #[tokio::test]
    async fn test_batch_flattens_many_outputs() {
        let listing =
            "<products><product><id>1</id></product><product><id>2</id></product></products>";
        let bridge = bridge(vec![Some(listing), Some("<product><id>9</id></product>")], false);
        let items = [
            ItemParameters::new("product", "getAll"),
            ItemParameters::new("product", "get").with_id("9"),
        ];

        let records = bridge.run_batch(&items).await.unwrap();
        let paired: Vec<_> = records.iter().map(|r| r.paired_item.item).collect();
        assert_eq!(paired, vec![0, 0, 1]);
    }

    #[tokio::test]
    async fn test_json_batch_isolates_bad_items() {
        let bridge = bridge(vec![Some("<invoice><id>4</id></invoice>")], true);
        let items = [
            json!({"operation": "get"}),
            json!({"resource": "invoice", "operation": "get", "id": 4}),
        ];

        let records = bridge.run_json_batch(&items).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].error().unwrap().starts_with("Invalid input"));
        assert_eq!(records[1].json["id"], "4");
        assert_eq!(paths(&bridge), vec!["/api/invoices/4.xml"]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let bridge = bridge(vec![], false);
        assert!(bridge.run_batch(&[]).await.unwrap().is_empty());
    }
}
