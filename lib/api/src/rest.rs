use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use foilsim_core::{Error, Feature, Query, RankedResult, SimilarityEngine, FEATURE_COUNT};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What the handlers see of the engine.
///
/// Loading happens once at startup. When it fails the server still answers
/// health checks, and every search reports the load failure.
#[derive(Clone)]
pub enum EngineState {
    Ready(Arc<SimilarityEngine>),
    Unavailable(String),
}

impl EngineState {
    pub fn from_load(result: foilsim_core::Result<SimilarityEngine>) -> Self {
        match result {
            Ok(engine) => EngineState::Ready(Arc::new(engine)),
            Err(e) => EngineState::Unavailable(e.to_string()),
        }
    }
}

/// One search hit on the wire: name, the six features in physical units,
/// similarity, distance and decoded geometry.
struct SimilarityHit<'a>(&'a RankedResult);

impl Serialize for SimilarityHit<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hit = self.0;
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT + 4))?;
        map.serialize_entry("airfoil_name", &hit.airfoil_name)?;
        for feature in Feature::ALL {
            map.serialize_entry(feature.name(), &hit.feature(feature))?;
        }
        map.serialize_entry("similarity", &hit.similarity)?;
        map.serialize_entry("distance", &hit.distance)?;
        map.serialize_entry("geometry", &hit.geometry)?;
        map.end()
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: EngineState, host: String, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(routes)
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }
}

/// Register the `/api` routes
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/similarity-search", web::post().to(similarity_search))
            .route("/health", web::get().to(health_check)),
    );
}

fn error_body(status: actix_web::http::StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": message.into()
    }))
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    error_body(actix_web::http::StatusCode::BAD_REQUEST, message)
}

fn server_error(message: impl Into<String>) -> HttpResponse {
    error_body(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Feature values of one request section; other keys are ignored
fn numeric_fields(section: &str, value: &Value) -> Result<HashMap<String, f64>, String> {
    let fields = value
        .as_object()
        .ok_or_else(|| format!("'{}' must be an object", section))?;
    let mut out = HashMap::with_capacity(FEATURE_COUNT);
    for feature in Feature::ALL {
        if let Some(v) = fields.get(feature.name()) {
            let number = v
                .as_f64()
                .ok_or_else(|| format!("Field '{}' in {} must be a number", feature, section))?;
            out.insert(feature.name().to_string(), number);
        }
    }
    Ok(out)
}

/// Parse the request body into a query and an optional result limit
fn parse_request(body: &[u8]) -> Result<(Query, Option<usize>), String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("No data provided".to_string());
    }
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON body: {}", e))?;
    let is_empty = match &payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err("No data provided".to_string());
    }

    let (targets, weights) = match (payload.get("targets"), payload.get("weights")) {
        (Some(t), Some(w)) => (t, w),
        _ => return Err("Missing targets or weights in request".to_string()),
    };

    let limit = match payload.get("limit") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| "Result limit must be a positive integer".to_string())?,
        ),
    };

    let query = Query::new(
        numeric_fields("targets", targets)?,
        numeric_fields("weights", weights)?,
    );
    Ok((query, limit))
}

async fn similarity_search(
    state: web::Data<EngineState>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    info!("Received similarity search request");

    let engine = match state.get_ref() {
        EngineState::Ready(engine) => engine,
        EngineState::Unavailable(reason) => {
            error!("Similarity search unavailable: {}", reason);
            return Ok(server_error(format!("Required data files could not be loaded: {}", reason)));
        }
    };

    let (query, limit) = match parse_request(&body) {
        Ok(parsed) => parsed,
        Err(message) => return Ok(bad_request(message)),
    };
    debug!(?query, ?limit, "parsed similarity search request");

    let results = match limit {
        Some(k) => engine.search(&query, k),
        None => engine.search_default(&query),
    };

    match results {
        Ok(results) => {
            let hits: Vec<SimilarityHit> = results.iter().map(SimilarityHit).collect();
            Ok(HttpResponse::Ok().json(hits))
        }
        Err(Error::Validation(e)) => Ok(bad_request(e.to_string())),
        Err(Error::Configuration(msg)) => {
            error!("Configuration error during search: {}", msg);
            Ok(server_error(msg))
        }
        Err(Error::Internal(detail)) => {
            error!("Unhandled error during similarity search: {}", detail);
            Ok(server_error("Internal server error"))
        }
    }
}

async fn health_check() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    })))
}
