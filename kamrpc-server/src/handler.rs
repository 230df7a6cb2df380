//! REST handlers
//!
//! One async function per route. Each validates its input, calls one client
//! adapter and shapes the reply. A failure is an [`ApiError`], which the
//! router turns into the final reply for the request.
//!
//! Path segments (`:table`, `:key`, `:group`) arrive percent-encoded and are
//! decoded here before they reach the client.

use crate::error::ApiError;
use kamrpc_client::{KamailioClient, TableQuery, UacRegistration};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

type HandlerResult = Result<Response, ApiError>;

/// `?id&username&domain`
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub id: Option<String>,
    pub username: Option<String>,
    pub domain: Option<String>,
}

/// `?table=`
#[derive(Debug, Default, Deserialize)]
pub struct TableNameQuery {
    pub table: Option<String>,
}

/// `?key=`
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// `?action=`
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

/// `?key_contains&value_contains`
#[derive(Debug, Default, Deserialize)]
pub struct MatchQuery {
    pub key_contains: Option<String>,
    pub value_contains: Option<String>,
}

/// `?rmode=`
#[derive(Debug, Default, Deserialize)]
pub struct RmodeQuery {
    pub rmode: Option<String>,
}

/// `?addr&flags&priority&attrs`
#[derive(Debug, Default, Deserialize)]
pub struct DestinationQuery {
    pub addr: Option<String>,
    pub flags: Option<String>,
    pub priority: Option<String>,
    pub attrs: Option<String>,
}

/// Body of `PUT /v1/htable/:table/:key`
#[derive(Debug, Deserialize)]
pub struct SetBody {
    pub value: Value,
    #[serde(default, rename = "type")]
    pub tag: Option<String>,
}

#[derive(Serialize)]
struct IdReply<'a> {
    id: &'a str,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Percent-decode one path segment
fn segment(raw: &str) -> Result<String, ApiError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ApiError::bad_request(format!("invalid path segment {:?}", raw)))
}

fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

// uacreg

pub async fn register(registration: UacRegistration, client: KamailioClient) -> HandlerResult {
    if registration.username.is_empty() || registration.domain.is_empty() {
        return Err(ApiError::bad_request("missing username or domain"));
    }

    let id = client.register(&registration).await?;
    Ok(reply::json(&IdReply { id: &id }).into_response())
}

pub async fn unregister(query: UserQuery, client: KamailioClient) -> HandlerResult {
    let (Some(username), Some(domain)) = (present(&query.username), present(&query.domain)) else {
        return Err(ApiError::bad_request("missing username or domain"));
    };

    let id = client
        .unregister(query.id.as_deref(), username, domain)
        .await?;
    Ok(reply::json(&IdReply { id: &id }).into_response())
}

/// Without `domain` everything is listed; `username` narrows a domain to one
/// user, and `id` overrides the derived identifier for that lookup.
pub async fn list_registrations(query: UserQuery, client: KamailioClient) -> HandlerResult {
    let registrations = match (present(&query.domain), present(&query.username)) {
        (None, _) => client.list_registrations().await?,
        (Some(domain), None) => client.list_registrations_by_domain(domain).await?,
        (Some(domain), Some(username)) => {
            client
                .list_registrations_by_user(present(&query.id), username, domain)
                .await?
        }
    };

    Ok(reply::json(&registrations).into_response())
}

// htable

pub async fn htable_dump(query: TableNameQuery, client: KamailioClient) -> HandlerResult {
    let table = present(&query.table).ok_or_else(|| ApiError::bad_request("missing table param"))?;

    let entries = client.htable_dump(table).await?;
    Ok(reply::json(&entries).into_response())
}

pub async fn htable_get(table: String, query: KeyQuery, client: KamailioClient) -> HandlerResult {
    let table = segment(&table)?;
    let key = present(&query.key).ok_or_else(|| ApiError::bad_request("missing key param"))?;

    let value = client.htable_get(&table, key).await?;
    Ok(reply::json(&value).into_response())
}

pub async fn htable_action(table: String, query: ActionQuery, client: KamailioClient) -> HandlerResult {
    let table = segment(&table)?;
    match present(&query.action) {
        Some("flush") => {
            client.htable_flush(&table).await?;
            Ok(no_content())
        }
        Some(other) => Err(ApiError::bad_request(format!("unknown action {:?}", other))),
        None => Err(ApiError::bad_request("must provide action")),
    }
}

pub async fn htable_set(
    table: String,
    key: String,
    body: SetBody,
    client: KamailioClient,
) -> HandlerResult {
    let (table, key) = (segment(&table)?, segment(&key)?);
    match body.tag.as_deref() {
        Some("int") => {
            let value = integer(&body.value)
                .ok_or_else(|| ApiError::bad_request("value is not an integer"))?;
            client.htable_seti(&table, &key, value).await?;
        }
        None | Some("str") | Some("") => {
            let value = match &body.value {
                Value::String(s) => s.clone(),
                Value::Null => return Err(ApiError::bad_request("missing value")),
                other => other.to_string(),
            };
            client.htable_sets(&table, &key, &value).await?;
        }
        Some(other) => {
            return Err(ApiError::bad_request(format!("unknown type {:?}", other)))
        }
    }
    Ok(no_content())
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn htable_delete(table: String, key: String, client: KamailioClient) -> HandlerResult {
    let (table, key) = (segment(&table)?, segment(&key)?);
    client.htable_delete(&table, &key).await?;
    Ok(no_content())
}

pub async fn htable_delete_matching(
    table: String,
    query: MatchQuery,
    client: KamailioClient,
) -> HandlerResult {
    let table = segment(&table)?;
    let query = match (present(&query.key_contains), present(&query.value_contains)) {
        (Some(key), Some(value)) => TableQuery::KeyOrValueContains {
            key: key.to_string(),
            value: value.to_string(),
        },
        (Some(needle), None) => TableQuery::KeyContains(needle.to_string()),
        (None, Some(needle)) => TableQuery::ValueContains(needle.to_string()),
        (None, None) => {
            return Err(ApiError::bad_request(
                "missing `key_contains` or `value_contains`",
            ))
        }
    };

    let report = client
        .htable_delete_by_query(&table, &query)
        .await?;
    if !report.is_complete() {
        tracing::warn!(
            table = %table,
            failed = report.failed.len(),
            "some matching records were not deleted"
        );
    }
    Ok(no_content())
}

// dispatcher

pub async fn dispatcher_list(query: RmodeQuery, client: KamailioClient) -> HandlerResult {
    let table = client
        .dispatcher_list(query.rmode.as_deref())
        .await?;
    Ok(reply::json(&table).into_response())
}

pub async fn dispatcher_add(
    group: String,
    query: DestinationQuery,
    client: KamailioClient,
) -> HandlerResult {
    let group = segment(&group)?;
    let addr = present(&query.addr).ok_or_else(|| ApiError::bad_request("missing addr param"))?;

    client
        .dispatcher_add(
            &group,
            addr,
            present(&query.flags).unwrap_or("0"),
            present(&query.priority).unwrap_or("0"),
            query.attrs.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(no_content())
}

pub async fn dispatcher_remove(
    group: String,
    query: DestinationQuery,
    client: KamailioClient,
) -> HandlerResult {
    let group = segment(&group)?;
    let addr = present(&query.addr).ok_or_else(|| ApiError::bad_request("missing addr param"))?;

    client.dispatcher_remove(&group, addr).await?;
    Ok(no_content())
}
