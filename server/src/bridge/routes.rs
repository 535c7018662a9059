use crate::bridge::model::{tags_reply, ConfigReply, ErrorReply, IsActiveReply, StatusReply};
use anyhow::Context;
use beholdercore::plugin_dir::PLUGIN_NAME;
use beholdercore::stream::STREAM_CONTENT_TYPE;
use beholdercore::{ConfigError, FramePoller, PluginState, ShutdownSignal};
use futures_util::StreamExt;
use log::warn;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{HeaderValue, StatusCode};
use warp::hyper::Body;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const FORM_LIMIT: u64 = 16 * 1024;

#[derive(Debug)]
struct ConfigRejection(ConfigError);

impl warp::reject::Reject for ConfigRejection {}

/// Hosts the plugin endpoints under `/data/plugin/beholder/`.
pub struct HttpBridge {
    state: Arc<PluginState>,
    shutdown: ShutdownSignal,
}

impl HttpBridge {
    pub fn new(state: Arc<PluginState>, shutdown: ShutdownSignal) -> Self {
        Self { state, shutdown }
    }

    /// Binds `addr` and returns the bound address with the server future,
    /// which completes once shutdown is triggered.
    pub fn bind(&self, addr: SocketAddr) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
        let api = routes(self.state.clone(), self.shutdown.clone())
            .with(warp::log("beholder::http"));
        let mut signal = self.shutdown.clone();
        let (bound, server) = warp::serve(api)
            .try_bind_with_graceful_shutdown(addr, async move { signal.triggered().await })
            .with_context(|| format!("binding http bridge to {}", addr))?;
        Ok((bound, server))
    }
}

pub fn routes(
    state: Arc<PluginState>,
    shutdown: ShutdownSignal,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let shutdown_filter = warp::any().map(move || shutdown.clone());
    let plugin = warp::path("data")
        .and(warp::path("plugin"))
        .and(warp::path(PLUGIN_NAME));

    let is_active_route = warp::path("is-active")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<PluginState>| {
            warp::reply::json(&IsActiveReply {
                is_active: state.is_active(),
            })
        });

    let tags_route = warp::path("tags")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<PluginState>| warp::reply::json(&tags_reply(state.is_active())));

    let change_config_route = warp::path("change-config")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(state_filter.clone())
        .and_then(
            |form: Vec<(String, String)>, state: Arc<PluginState>| async move {
                match state.config().apply_config_update(form) {
                    Ok(config) => Ok::<_, Rejection>(warp::reply::json(&ConfigReply { config })),
                    Err(err) => {
                        warn!("rejected config update: {}", err);
                        Err(warp::reject::custom(ConfigRejection(err)))
                    }
                }
            },
        );

    let section_info_route = warp::path("section-info")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<PluginState>| warp::reply::json(&*state.sections().fetch_section_info()));

    let frame_route = warp::path("beholder-frame")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter)
        .and(shutdown_filter)
        .map(frame_stream);

    let ping_route = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&StatusReply::alive()));

    plugin
        .and(
            is_active_route
                .or(tags_route)
                .or(change_config_route)
                .or(section_info_route)
                .or(frame_route)
                .or(ping_route),
        )
        .recover(handle_rejection)
}

/// Opens a `multipart/x-mixed-replace` response fed by a fresh poll loop.
/// hyper pulls a part only when the connection can take it, and the loop
/// stops when hyper drops the body on client disconnect.
pub fn frame_stream(state: Arc<PluginState>, shutdown: ShutdownSignal) -> Response {
    let body = FramePoller::new(state, shutdown)
        .into_stream()
        .map(Ok::<_, Infallible>);

    let mut response = Response::new(Body::wrap_stream(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(STREAM_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(ConfigRejection(config_err)) = err.find::<ConfigRejection>() {
        let status = if config_err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let reply = warp::reply::json(&ErrorReply {
            error: config_err.to_string(),
        });
        return Ok(warp::reply::with_status(reply, status));
    }
    Err(err)
}
