//! Shared test doubles for integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Mutex;

use facturadirecta_bridge::{
    ApiClient, BridgeError, Credentials,
    error::Result,
    transport::{RequestContext, Transport, TransportResponse},
};

/// Token used by [`client`]; tests assert it never reaches a body.
pub const TOKEN: &str = "tok-integration-secret";

/// One request as seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub username: String,
    pub body: String,
}

/// Replies with scripted outcomes in order and records every request.
///
/// `Ok(body)` answers 200 with `body`; `Err(status)` fails with that status.
/// Once the script is exhausted every request answers `<ok/>`.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<Vec<std::result::Result<String, u16>>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl MockTransport {
    pub fn scripted<I>(script: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<&'static str, u16>>,
    {
        let script = script.into_iter().map(|reply| reply.map(str::to_owned)).collect();
        Self { script: Mutex::new(script), seen: Mutex::default() }
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: &'static str,
        ctx: &RequestContext<'_>,
        body: &[u8],
    ) -> Result<TransportResponse> {
        self.seen.lock().unwrap().push(SeenRequest {
            method,
            url: ctx.url.to_string(),
            query: ctx.query.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            username: ctx.auth.username.to_owned(),
            body: String::from_utf8_lossy(body).into_owned(),
        });

        let mut script = self.script.lock().unwrap();
        let reply = if script.is_empty() { Ok("<ok/>".to_owned()) } else { script.remove(0) };
        match reply {
            Ok(body) => Ok(TransportResponse { status: 200, body: body.into_bytes() }),
            Err(status) => Err(BridgeError::api_status(status, "scripted failure")),
        }
    }
}

impl Transport for MockTransport {
    async fn get<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.answer("GET", &ctx, b"")
    }

    async fn post<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.answer("POST", &ctx, body)
    }

    async fn put<'a>(
        &'a self,
        ctx: RequestContext<'a>,
        body: &'a [u8],
    ) -> Result<TransportResponse> {
        self.answer("PUT", &ctx, body)
    }

    async fn delete<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.answer("DELETE", &ctx, b"")
    }

    fn protocol_name(&self) -> &'static str {
        "mock"
    }
}

/// Client for account `acme` over `transport`.
pub fn client(transport: MockTransport) -> ApiClient<MockTransport> {
    ApiClient::with_transport(transport, Credentials::new("acme", TOKEN), "facturadirecta.com")
        .unwrap()
}
