//! warp binding for the gateway.
//!
//! Every method and path goes to the gateway, which does its own routing.
//! This layer only reads the JSON body up to the configured limit, extracts
//! the `Authorization` header, answers CORS preflights and serializes the
//! response. Rejections warp raises itself go through the same translator,
//! so every error leaves as the uniform JSON body.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use kiosync_gateway::{
    translate, DocumentEngine, Gateway, GatewayConfig, GatewayError, GatewayRequest,
    GatewayResponse,
};
use serde_json::Value;
use std::convert::Infallible;
use std::pin::pin;
use std::sync::Arc;
use warp::cors::CorsForbidden;
use warp::filters::BoxedFilter;
use warp::http::header::AUTHORIZATION;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::path::FullPath;
use warp::reject::{MethodNotAllowed, Rejection};
use warp::reply::{Json, WithStatus};
use warp::{Filter, Reply};

/// Builds the HTTP filter serving `gateway`.
pub fn routes<E: DocumentEngine>(
    gateway: Arc<Gateway<E>>,
    config: &GatewayConfig,
) -> BoxedFilter<(Box<dyn Reply>,)> {
    let limit = config.max_body_bytes;
    let api = warp::method()
        .and(warp::path::full())
        .and(warp::header::headers_cloned())
        .and(warp::body::stream())
        .and(warp::any().map(move || Arc::clone(&gateway)))
        .and_then(move |method, path, headers, body, gateway| {
            dispatch::<E, _, _>(method, path, headers, body, limit, gateway)
        })
        .with(warp::trace::request());

    if config.allow_cors {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_headers(vec!["content-type", "authorization"])
            .allow_methods(vec!["POST", "OPTIONS"]);
        api.with(cors)
            .recover(recover)
            .map(|reply| Box::new(reply) as Box<dyn Reply>)
            .boxed()
    } else {
        api.recover(recover)
            .map(|reply| Box::new(reply) as Box<dyn Reply>)
            .boxed()
    }
}

async fn dispatch<E, S, B>(
    method: Method,
    path: FullPath,
    headers: HeaderMap,
    body: S,
    limit: usize,
    gateway: Arc<Gateway<E>>,
) -> Result<WithStatus<Json>, Rejection>
where
    E: DocumentEngine,
    S: Stream<Item = Result<B, warp::Error>> + Send,
    B: Buf + Send,
{
    let body = match read_body(body, limit).await.and_then(|raw| decode_body(&raw)) {
        Ok(body) => body,
        Err(err) => return Ok(render(&translate(&err))),
    };

    let response = gateway
        .handle(GatewayRequest {
            method: method.as_str().to_string(),
            path: path.as_str().to_string(),
            authorization: authorization(&headers),
            body,
        })
        .await;
    Ok(render(&response))
}

/// Header bytes that are not valid UTF-8 are replaced, so the bearer check
/// rejects them as malformed instead of the transport dropping the request.
fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

async fn read_body<S, B>(body: S, limit: usize) -> Result<Bytes, GatewayError>
where
    S: Stream<Item = Result<B, warp::Error>>,
    B: Buf,
{
    let mut body = pin!(body);
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|_| GatewayError::MalformedBody)?;
        if buf.len() + chunk.remaining() > limit {
            return Err(GatewayError::BodyTooLarge(limit));
        }
        buf.put(chunk);
    }
    Ok(buf.freeze())
}

/// An empty body decodes as `null`.
fn decode_body(body: &[u8]) -> Result<Value, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|_| GatewayError::MalformedBody)
}

async fn recover(rejection: Rejection) -> Result<WithStatus<Json>, Infallible> {
    let err = if rejection.is_not_found() {
        GatewayError::NotFound
    } else if rejection.find::<MethodNotAllowed>().is_some() {
        GatewayError::MethodNotAllowed
    } else if let Some(forbidden) = rejection.find::<CorsForbidden>() {
        GatewayError::Rejected(forbidden.to_string())
    } else {
        GatewayError::Rejected(format!("Invalid request: {rejection:?}"))
    };
    Ok(render(&translate(&err)))
}

fn render(response: &GatewayResponse) -> WithStatus<Json> {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    warp::reply::with_status(warp::reply::json(&response.body), status)
}
