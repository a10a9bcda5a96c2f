use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;

use liblegend_dashboard::figure::Figure;
use liblegend_dashboard::monitor::PhyMonitor;
use liblegend_dashboard::selection::Selection;
use liblegend_dashboard::view::{build_phy_section, selection_from_pairs, Page};

use super::html::{info_page, phy_page};
use super::svg::render_svg;

/// Shared, read-only state of the served dashboard
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub monitor: Arc<PhyMonitor>,
    pub pages: Arc<Vec<Page>>,
    pub widget_width: u32,
}

type QueryPairs = Query<Vec<(String, String)>>;

impl DashboardState {
    fn has_page(&self, page: Page) -> bool {
        self.pages.contains(&page)
    }

    fn selection(&self, pairs: &[(String, String)]) -> Selection {
        selection_from_pairs(
            &self.monitor,
            pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    fn render(&self, pairs: &[(String, String)]) -> (Selection, Figure) {
        let selection = self.selection(pairs);
        let figure = self.monitor.render(&selection);
        (selection, figure)
    }
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plot.svg", get(plot_svg))
        .route("/api/figure", get(figure_json))
        .route("/info", get(information))
        .with_state(state)
}

/// Serve the dashboard until the process is stopped
pub async fn serve(state: DashboardState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Starting Monitoring Dashboard on port {port}");
    axum::serve(listener, router(state)).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Page disabled").into_response()
}

async fn index(State(state): State<DashboardState>, Query(pairs): QueryPairs) -> Response {
    if !state.has_page(Page::PhyMonitoring) {
        if state.has_page(Page::Information) {
            return Redirect::to("/info").into_response();
        }
        return not_found();
    }
    let (selection, figure) = state.render(&pairs);
    let svg = match render_svg(&figure) {
        Ok(svg) => svg,
        Err(e) => {
            log::error!("{e}");
            String::new()
        }
    };
    let section = build_phy_section(&state.monitor, &selection, figure, state.widget_width);
    Html(phy_page(&state.pages, &section, &svg)).into_response()
}

async fn plot_svg(State(state): State<DashboardState>, Query(pairs): QueryPairs) -> Response {
    if !state.has_page(Page::PhyMonitoring) {
        return not_found();
    }
    let (_, figure) = state.render(&pairs);
    match render_svg(&figure) {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => {
            log::error!("{e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn figure_json(State(state): State<DashboardState>, Query(pairs): QueryPairs) -> Response {
    if !state.has_page(Page::PhyMonitoring) {
        return not_found();
    }
    let (_, figure) = state.render(&pairs);
    match serde_json::to_string(&figure) {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => {
            log::error!("Could not serialize figure: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn information(State(state): State<DashboardState>) -> Response {
    if !state.has_page(Page::Information) {
        return not_found();
    }
    Html(info_page(&state.pages)).into_response()
}
