use actix_web::{get, http::header, web, HttpRequest};

use crate::{
    api::{error, success},
    modules::graph::{
        model::{parse_cursor, parse_entity_tag, GraphQuery, GraphView},
        service::GraphService,
        wait::WaitOutcome,
    },
    utils::ValidatedQuery,
};

const NO_CACHE: &str = "no-cache, must-revalidate";
const LONG_POLL_TIMEOUT_HEADER: &str = "X-Long-Poll-Timeout";

fn quoted(etag: &str) -> String {
    format!("\"{etag}\"")
}

fn not_modified(etag: &str) -> success::Success<GraphView> {
    success::Success::not_modified()
        .header("ETag", quoted(etag))
        .header("Cache-Control", NO_CACHE)
}

#[get("")]
pub async fn get_graph(
    graph_service: web::Data<GraphService>,
    query: ValidatedQuery<GraphQuery>,
    req: HttpRequest,
) -> Result<success::Success<GraphView>, error::Error> {
    let GraphQuery { user_id, last_update, wait } = query.0;

    let known_etag = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_entity_tag);

    if let Some(known) = known_etag.as_deref() {
        if wait.unwrap_or(false) {
            match graph_service.wait_for_change(user_id, known).await? {
                WaitOutcome::TimedOut(etag) => {
                    return Ok(not_modified(&etag).header(LONG_POLL_TIMEOUT_HEADER, "1"));
                }
                WaitOutcome::Changed(_) => {}
            }
        } else {
            let etag = graph_service.current_etag(user_id).await?;
            if etag == known {
                return Ok(not_modified(&etag));
            }
        }
    }

    let since = last_update.as_deref().and_then(parse_cursor);
    let view = graph_service.build_view(user_id, since).await?;

    let etag = quoted(&view.etag);
    Ok(success::Success::ok(Some(view))
        .header("ETag", etag)
        .header("Cache-Control", NO_CACHE))
}
