use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::channel::{ChannelManager, ChannelStatus, FeedSubscription};
use crate::scoreboard::layout::{BASE_HEIGHT, BASE_WIDTH};
use crate::scoreboard::{ScoreboardLayout, ScoreboardView};

/// Optional images passed through to the overlay page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlayAssets {
    pub venue_logo_url: Option<String>,
    pub event_logo_url: Option<String>,
    pub tournament_logo_url: Option<String>,
    pub arrow_image_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub manager: ChannelManager,
    pub subscription: FeedSubscription,
    pub assets: OverlayAssets,
}

/// Build the Axum router for the overlay.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/scoreboard", get(scoreboard_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serve the overlay page. It is static; everything feed-specific arrives
/// through `/api/scoreboard` and is written with DOM properties, not markup.
async fn index_handler() -> impl IntoResponse {
    Html(OVERLAY_HTML)
}

#[derive(Debug, Deserialize)]
struct SizeQuery {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ScoreboardResponse {
    feed_path: String,
    /// False while the placeholder is shown
    live: bool,
    received_at: Option<DateTime<Utc>>,
    view: ScoreboardView,
    layout: ScoreboardLayout,
    assets: OverlayAssets,
    channel: ChannelStatus,
}

/// GET /api/scoreboard?width=1920&height=1080
async fn scoreboard_handler(
    State(state): State<Arc<AppState>>,
    Query(size): Query<SizeQuery>,
) -> Json<ScoreboardResponse> {
    let snapshot = state.subscription.latest();
    let view = ScoreboardView::from_update(snapshot.as_ref().map(|s| &s.update));
    let layout = ScoreboardLayout::compute(
        size.width.unwrap_or(BASE_WIDTH),
        size.height.unwrap_or(BASE_HEIGHT),
        &view,
    );

    Json(ScoreboardResponse {
        feed_path: state.subscription.path().to_string(),
        live: snapshot.is_some(),
        received_at: snapshot.map(|s| s.received_at),
        view,
        layout,
        assets: state.assets.clone(),
        channel: state.manager.status(),
    })
}

/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<ChannelStatus> {
    Json(state.manager.status())
}

/// Embedded single-file overlay (HTML + CSS + JS). Polls the JSON endpoint
/// with its own viewport size and never shows connection errors.
const OVERLAY_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Scoreboard</title>
<style>
  * { box-sizing: border-box; margin: 0; padding: 0; }
  html, body { background: #000; overflow: hidden; font-family: 'Arial Black', 'Segoe UI', sans-serif; color: #fff; }
  #board { background: #000; display: flex; flex-direction: column; overflow: hidden; }
  .header { display: flex; align-items: flex-end; justify-content: space-between; }
  .name-row { display: flex; align-items: center; justify-content: center; width: 100%; }
  .name { width: 100%; text-align: center; white-space: nowrap; font-weight: 900; }
  .middle { display: flex; flex: 1; align-items: stretch; }
  .tournament { display: flex; align-items: center; justify-content: center; }
  .tournament img { max-width: 100%; max-height: 100%; object-fit: contain; }
  .table { display: flex; flex: 1; border-style: solid; border-color: #fff; }
  .sets { display: flex; flex-direction: column; flex: 1; border-right-style: solid; border-right-color: #fff; }
  .set-row { display: flex; flex: 1; align-items: center; justify-content: flex-end; }
  .set { text-align: center; font-weight: 900; }
  .points { display: flex; flex-direction: column; }
  .point-row { display: flex; flex: 1; align-items: center; justify-content: center; }
  .arrow { color: #facc15; display: flex; align-items: center; justify-content: center; }
</style>
</head>
<body>
<div id="board">
  <div class="header" id="header">
    <img id="venue-logo" alt="Venue Logo" hidden>
    <img id="event-logo" alt="Event Logo" hidden>
  </div>
  <div class="name-row" id="name-row-1"><div class="name" id="name-1"></div></div>
  <div class="middle" id="middle">
    <div class="tournament" id="tournament"><img id="tournament-logo" alt="Tournament Logo" hidden></div>
    <div class="table" id="table">
      <div class="sets" id="sets">
        <div class="set-row" id="set-row-1"></div>
        <div class="set-row" id="set-row-2"></div>
      </div>
      <div class="points" id="points">
        <div class="point-row"><div class="arrow" id="arrow-1"></div><div id="points-1"></div></div>
        <div class="point-row"><div class="arrow" id="arrow-2"></div><div id="points-2"></div></div>
      </div>
    </div>
  </div>
  <div class="name-row" id="name-row-2"><div class="name" id="name-2"></div></div>
</div>

<script>
const px = v => v + 'px';
const $ = id => document.getElementById(id);

function setImage(el, url, w, h) {
  if (!url) { el.hidden = true; return; }
  if (el.getAttribute('src') !== url) el.src = url;
  el.hidden = false;
  if (w) el.style.width = px(w);
  if (h) el.style.height = px(h);
}

function renderArrow(el, serving, layout, arrowUrl) {
  el.style.width = px(layout.serving_arrow_px);
  el.style.fontSize = px(40 * layout.scale);
  if (!serving) { el.replaceChildren(); return; }
  if (arrowUrl) {
    const img = document.createElement('img');
    img.src = arrowUrl;
    img.alt = 'Serving Arrow';
    img.style.width = px(layout.serving_arrow_px);
    img.style.height = px(layout.serving_arrow_px);
    img.style.objectFit = 'contain';
    el.replaceChildren(img);
  } else {
    el.textContent = '▶';
  }
}

function renderSets(row, scores, layout) {
  row.replaceChildren(...scores.map(s => {
    const cell = document.createElement('div');
    cell.className = 'set';
    cell.style.width = px(layout.set_cell_width_px);
    cell.style.fontSize = px(layout.set_font_px);
    cell.textContent = s;
    return cell;
  }));
}

function render(data) {
  const { view, layout, assets } = data;
  document.title = 'Scoreboard ' + data.feed_path;
  const board = $('board');
  board.style.width = px(layout.width);
  board.style.height = px(layout.height);

  const header = $('header');
  header.style.height = px(layout.header_height_px);
  header.style.padding = `0 ${px(12.5 * layout.scale)}`;
  setImage($('venue-logo'), assets.venue_logo_url, ...layout.venue_logo_px);
  setImage($('event-logo'), assets.event_logo_url, ...layout.event_logo_px);

  for (const i of [1, 2]) {
    const row = $('name-row-' + i);
    row.style.height = px(layout.name_row_height_px);
    row.style.padding = `0 ${px(10 * layout.scale)}`;
    const name = $('name-' + i);
    name.textContent = view['player' + i];
    name.style.fontSize = px(layout.name_font_px);
  }

  $('middle').style.padding = px(10 * layout.scale);
  $('middle').style.gap = px(5 * layout.scale);
  $('tournament').style.width = px(layout.tournament_logo_width_px);
  setImage($('tournament-logo'), assets.tournament_logo_url);

  const table = $('table');
  table.style.borderWidth = px(layout.border_px);
  $('sets').style.borderRightWidth = px(layout.border_px);
  renderSets($('set-row-1'), view.score1, layout);
  renderSets($('set-row-2'), view.score2, layout);

  for (const i of [1, 2]) {
    const pts = $('points-' + i);
    pts.textContent = view['currentGamePoints' + i];
    pts.style.fontSize = px(layout.points_font_px);
    pts.style.width = px(100 * layout.scale);
    pts.style.textAlign = 'center';
    renderArrow($('arrow-' + i), view.servingPlayer === 'player' + i, layout, assets.arrow_image_url);
  }
}

async function refresh() {
  try {
    const r = await fetch(`/api/scoreboard?width=${window.innerWidth}&height=${window.innerHeight}`);
    if (!r.ok) return;
    render(await r.json());
  } catch (_) {
    // Keep showing whatever is on screen.
  }
}

refresh();
setInterval(refresh, 500);
window.addEventListener('resize', refresh);
</script>
</body>
</html>"#;
