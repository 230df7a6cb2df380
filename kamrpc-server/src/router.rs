//! Route table of the REST facade
//!
//! Every route lives under `/v1`. Paths are matched before methods, so an
//! unknown path answers 404 and a known path with the wrong method 405.
//! Once a handler runs its reply is final, failure included.
//!
//! | route | adapter |
//! |---|---|
//! | `POST /v1/uacreg/register` | register |
//! | `POST /v1/uacreg/unregister` | unregister |
//! | `GET /v1/uacreg/list` | list registrations (all without `domain`) |
//! | `GET /v1/htable/dump` | dump |
//! | `GET /v1/htable/:table` | get |
//! | `POST /v1/htable/:table` | flush |
//! | `PUT /v1/htable/:table/:key` | set |
//! | `DELETE /v1/htable/:table/:key` | delete |
//! | `DELETE /v1/htable/:table` | delete by query (key or value match) |
//! | `GET /v1/dispatcher/list` | dispatcher list |
//! | `POST /v1/dispatcher/:group` | dispatcher add |
//! | `DELETE /v1/dispatcher/:group` | dispatcher remove |

use crate::error::{finish, handle_rejection};
use crate::handler;
use crate::ServerMetrics;
use kamrpc_client::KamailioClient;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

/// Largest accepted request body, in bytes
pub const DEFAULT_BODY_LIMIT: u64 = 16 * 1024;

/// Every route, with rejection handling and request logging
pub fn routes(
    client: KamailioClient,
    body_limit: u64,
    metrics: Option<Arc<ServerMetrics>>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone + Send + Sync + 'static
{
    uacreg(client.clone(), body_limit)
        .or(htable(client.clone(), body_limit))
        .or(dispatcher(client))
        .recover(handle_rejection)
        .with(request_log(metrics))
}

fn with_client(
    client: KamailioClient,
) -> impl Filter<Extract = (KamailioClient,), Error = Infallible> + Clone {
    warp::any().map(move || client.clone())
}

fn json_body<T: DeserializeOwned + Send>(
    limit: u64,
) -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone {
    warp::body::content_length_limit(limit).and(warp::body::json())
}

fn uacreg(
    client: KamailioClient,
    body_limit: u64,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let register = warp::path!("v1" / "uacreg" / "register")
        .and(warp::post())
        .and(json_body(body_limit))
        .and(with_client(client.clone()))
        .then(handler::register)
        .map(finish);

    let unregister = warp::path!("v1" / "uacreg" / "unregister")
        .and(warp::post())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::unregister)
        .map(finish);

    let list = warp::path!("v1" / "uacreg" / "list")
        .and(warp::get())
        .and(warp::query())
        .and(with_client(client))
        .then(handler::list_registrations)
        .map(finish);

    register.or(unregister).or(list)
}

fn htable(
    client: KamailioClient,
    body_limit: u64,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let dump = warp::path!("v1" / "htable" / "dump")
        .and(warp::get())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::htable_dump)
        .map(finish);

    let get = warp::path!("v1" / "htable" / String)
        .and(warp::get())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::htable_get)
        .map(finish);

    let action = warp::path!("v1" / "htable" / String)
        .and(warp::post())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::htable_action)
        .map(finish);

    let delete_matching = warp::path!("v1" / "htable" / String)
        .and(warp::delete())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::htable_delete_matching)
        .map(finish);

    let set = warp::path!("v1" / "htable" / String / String)
        .and(warp::put())
        .and(json_body(body_limit))
        .and(with_client(client.clone()))
        .then(handler::htable_set)
        .map(finish);

    let delete = warp::path!("v1" / "htable" / String / String)
        .and(warp::delete())
        .and(with_client(client))
        .then(handler::htable_delete)
        .map(finish);

    dump.or(get)
        .or(action)
        .or(delete_matching)
        .or(set)
        .or(delete)
}

fn dispatcher(
    client: KamailioClient,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let list = warp::path!("v1" / "dispatcher" / "list")
        .and(warp::get())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::dispatcher_list)
        .map(finish);

    let add = warp::path!("v1" / "dispatcher" / String)
        .and(warp::post())
        .and(warp::query())
        .and(with_client(client.clone()))
        .then(handler::dispatcher_add)
        .map(finish);

    let remove = warp::path!("v1" / "dispatcher" / String)
        .and(warp::delete())
        .and(warp::query())
        .and(with_client(client))
        .then(handler::dispatcher_remove)
        .map(finish);

    list.or(add).or(remove)
}

/// Log every answered request through `tracing` and record it in `metrics`
fn request_log(
    metrics: Option<Arc<ServerMetrics>>,
) -> warp::log::Log<impl Fn(warp::log::Info<'_>) + Clone + Send + Sync + 'static> {
    warp::log::custom(move |info: warp::log::Info<'_>| {
        let status = info.status().as_u16();
        let elapsed = info.elapsed();

        tracing::info!(
            method = %info.method(),
            path = info.path(),
            status,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "request"
        );

        if let Some(ref m) = metrics {
            m.record_request(info.method().as_str(), status, elapsed.as_secs_f64());
        }
    })
}
