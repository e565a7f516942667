// src/server/mod.rs

pub mod page;

use serde_json::json;
use std::{collections::BTreeSet, convert::Infallible, sync::Arc};
use tracing::{info, warn};
use warp::{
    http::{StatusCode, Uri},
    reply::Response,
    Filter, Rejection, Reply,
};

use crate::cache::{CacheRead, Clock, DatasetCache, SystemClock};
use crate::dataset::Dataset;
use crate::projection::{project, Projection, ViewMode};
use crate::render::{render, svg::EMPTY_SELECTION_PROMPT, SvgChart};
use crate::source::TabularSource;
use page::{ChartSlot, DashboardView};

/// Shared state behind every route.
pub struct AppState<S, C = SystemClock> {
    pub cache: DatasetCache<S, C>,
    pub build_id: String,
}

/// What the user asked to see, decoded from the query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewRequest {
    pub mice: BTreeSet<String>,
    pub mode: ViewMode,
    /// The selection form was submitted, so an empty `mice` means "none".
    pub submitted: bool,
}

impl ViewRequest {
    pub fn parse(query: &str) -> Self {
        let mut req = ViewRequest::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "mouse" => {
                    req.mice.insert(value.trim().to_string());
                }
                "mode" => match value.parse() {
                    Ok(mode) => req.mode = mode,
                    Err(e) => warn!(error = %e, "ignoring view mode"),
                },
                "submitted" => req.submitted = true,
                _ => {}
            }
        }
        req
    }

    /// First visit shows every mouse; after that, exactly what was ticked.
    pub fn selection(&self, dataset: &Dataset) -> BTreeSet<String> {
        if self.submitted || !self.mice.is_empty() {
            self.mice.clone()
        } else {
            dataset.entities().iter().cloned().collect()
        }
    }
}

fn with_status(reply: impl Reply, status: StatusCode) -> Response {
    warp::reply::with_status(reply, status).into_response()
}

fn with_state<S, C>(
    state: Arc<AppState<S, C>>,
) -> impl Filter<Extract = (Arc<AppState<S, C>>,), Error = Infallible> + Clone
where
    S: TabularSource + 'static,
    C: Clock + 'static,
{
    warp::any().map(move || state.clone())
}

/// Raw query string, or empty when there is none.
fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

pub fn routes<S, C>(
    state: Arc<AppState<S, C>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    S: TabularSource + 'static,
    C: Clock + 'static,
{
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&json!({
            "status": "healthy",
            "service": "forage-viewer"
        }))
    });

    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(raw_query())
        .then(index_page::<S, C>);

    let chart = warp::path("chart.svg")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(raw_query())
        .then(chart_svg::<S, C>);

    let api = warp::path!("api" / "projection")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(raw_query())
        .then(projection_json::<S, C>);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state))
        .then(refresh_data::<S, C>);

    health
        .or(index)
        .or(chart)
        .or(api)
        .or(refresh)
        .with(warp::trace::request())
}

async fn index_page<S: TabularSource, C: Clock>(
    state: Arc<AppState<S, C>>,
    query: String,
) -> Response {
    let req = ViewRequest::parse(&query);
    let read = match state.cache.get_or_fetch(false).await {
        Ok(read) => read,
        Err(err) => {
            return warp::reply::html(page::unavailable(&err.to_string(), &state.build_id))
                .into_response();
        }
    };

    let dataset = &read.entry.dataset;
    let selected = req.selection(dataset);
    let projection = project(dataset, &read.entry.palette, &selected, req.mode);
    let chart = match &projection {
        Projection::EmptySelection => ChartSlot::Prompt(EMPTY_SELECTION_PROMPT),
        _ => match render(&projection, &mut SvgChart::new(dataset.periods())) {
            Ok(svg) => ChartSlot::Svg(svg),
            Err(e) => {
                warn!(error = %e, "chart rendering failed");
                ChartSlot::Failed(e.to_string())
            }
        },
    };

    let html = page::dashboard(&DashboardView {
        mice: dataset.entities(),
        palette: &read.entry.palette,
        selected: &selected,
        mode: req.mode,
        chart,
        stale_warning: read.stale_error.as_ref().map(|e| e.to_string()),
        fetched_at: Some(read.entry.fetched_at),
        build_id: &state.build_id,
    });
    warp::reply::html(html).into_response()
}

async fn chart_svg<S: TabularSource, C: Clock>(
    state: Arc<AppState<S, C>>,
    query: String,
) -> Response {
    let req = ViewRequest::parse(&query);
    let read = match state.cache.get_or_fetch(false).await {
        Ok(read) => read,
        Err(err) => return with_status(err.to_string(), StatusCode::SERVICE_UNAVAILABLE),
    };

    let dataset = &read.entry.dataset;
    let projection = project(dataset, &read.entry.palette, &req.selection(dataset), req.mode);
    match render(&projection, &mut SvgChart::new(dataset.periods())) {
        Ok(svg) => warp::reply::with_header(svg, "content-type", "image/svg+xml").into_response(),
        Err(e) => {
            warn!(error = %e, "chart rendering failed");
            with_status(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn projection_body(read: &CacheRead, req: &ViewRequest) -> serde_json::Value {
    let dataset = &read.entry.dataset;
    json!({
        "fetched_at": read.entry.fetched_at,
        "stale_error": read.stale_error.as_ref().map(|e| e.to_string()),
        "mode": req.mode,
        "mice": dataset.entities(),
        "projection": project(dataset, &read.entry.palette, &req.selection(dataset), req.mode),
    })
}

async fn projection_json<S: TabularSource, C: Clock>(
    state: Arc<AppState<S, C>>,
    query: String,
) -> Response {
    let req = ViewRequest::parse(&query);
    match state.cache.get_or_fetch(false).await {
        Ok(read) => warp::reply::json(&projection_body(&read, &req)).into_response(),
        Err(err) => with_status(
            warp::reply::json(&json!({ "error": err.to_string() })),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    }
}

async fn refresh_data<S: TabularSource, C: Clock>(state: Arc<AppState<S, C>>) -> Response {
    info!("manual refresh requested");
    if let Err(err) = state.cache.refresh().await {
        // the page load after the redirect shows the warning
        warn!(error = %err, "manual refresh failed");
    }
    warp::redirect::see_other(Uri::from_static("/")).into_response()
}
