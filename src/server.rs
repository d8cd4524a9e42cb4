//! HTTP transport.
//!
//! Decodes REST requests, checks the room id and username shapes, calls the
//! [`MatchService`] and maps every failure to a status code and a
//! `{"error": "..."}` body.

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{BoxError, Json, Router, body::Body};
use bulls_cows_core::{PlayerId, RoomId, RoomIdError};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, instrument, warn};

use crate::config::ServerConfig;
use crate::error::{ErrorKind, ServiceError};
use crate::service::{GameStarted, GuessOutcome, MatchService, MatchView, RoomTicket};
use crate::store::MatchRepository;

/// Prefix every route is mounted under.
pub const API_PREFIX: &str = "/api/v1";

/// Longest accepted username, in characters.
pub const MAX_USERNAME_CHARS: usize = 32;

/// How long browsers may cache a preflight answer.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(300);

/// Body of create and join requests.
#[derive(Debug, Clone, Deserialize)]
pub struct UsernameRequest {
    /// Display name of the new player.
    pub username: String,
}

/// Body of a secret submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CombinationRequest {
    /// Player submitting the code.
    pub player_id: PlayerId,
    /// Code the opponent must guess.
    pub combination: String,
}

/// Body of a guess.
#[derive(Debug, Clone, Deserialize)]
pub struct GuessRequest {
    /// Player guessing.
    pub player_id: PlayerId,
    /// Guessed code.
    pub guess: String,
}

/// Reply to commands with no other result.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Acknowledgement {
    /// Always true.
    pub success: bool,
}

const ACK: Acknowledgement = Acknowledgement { success: true };

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A failed request.
#[derive(Debug, Display)]
pub enum ApiError {
    /// The request could not be decoded or failed a shape check.
    #[display("{_0}")]
    BadRequest(String),
    /// The service rejected the command.
    #[display("{_0}")]
    Service(ServiceError),
    /// The request outlived the configured timeout.
    #[display("request timed out")]
    Timeout,
    /// A middleware layer failed.
    #[display("{_0}")]
    Layer(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<RoomIdError> for ApiError {
    fn from(err: RoomIdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Status code returned for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidCombination => StatusCode::BAD_REQUEST,
        ErrorKind::MatchNotFound => StatusCode::NOT_FOUND,
        ErrorKind::RoomFull
        | ErrorKind::RoomNotReady
        | ErrorKind::CombinationsMissing
        | ErrorKind::MatchNotStarted
        | ErrorKind::NotYourTurn => StatusCode::CONFLICT,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Service(err) => status_for(err.kind()),
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Layer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            match self {
                Self::Layer(_) => "internal server error".to_string(),
                _ => "internal storage error".to_string(),
            }
        } else {
            warn!(status = %status, error = %self, "Request rejected");
            self.to_string()
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn parse_room(raw: &str) -> Result<RoomId, ApiError> {
    Ok(RoomId::parse(raw)?)
}

fn checked_username(username: String) -> Result<String, ApiError> {
    let length = username.trim().chars().count();
    if length == 0 || length > MAX_USERNAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "username must be 1 to {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    Ok(username.trim().to_string())
}

type SharedService<R> = State<Arc<MatchService<R>>>;

/// Builds the REST router over `service`.
#[instrument(skip(service))]
pub fn router<R: MatchRepository + 'static>(service: Arc<MatchService<R>>) -> Router {
    info!(prefix = API_PREFIX, "Building match router");
    let api = Router::new()
        .route("/matches/create", post(create_match::<R>))
        .route("/matches/join/{room_id}", put(join_match::<R>))
        .route("/matches/setCombination/{room_id}", put(set_combination::<R>))
        .route("/matches/startGame/{room_id}", put(start_game::<R>))
        .route("/matches/makeGuess/{room_id}", put(make_guess::<R>))
        .route("/matches/restart/{room_id}", put(restart_game::<R>))
        .route("/matches/{room_id}", get(get_match::<R>))
        .with_state(service);

    Router::new().nest(API_PREFIX, api).layer(
        ServiceBuilder::new()
            .map_request(|req: Request<Body>| {
                info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
                req
            })
            .map_response(|res: Response| {
                info!(status = %res.status(), "Response sent");
                res
            }),
    )
}

/// Wraps `router` with the browser and timeout policy from `config`.
///
/// CORS answers preflight requests for the configured origin before they reach
/// a route. Requests running longer than the configured timeout get 408.
#[instrument(skip_all, fields(origin = ?config.allowed_origin()))]
pub fn with_http_policy(router: Router, config: &ServerConfig) -> Router {
    info!(timeout = ?config.request_timeout(), "Applying HTTP policy");
    router
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(layer_failure))
                .layer(TimeoutLayer::new(config.request_timeout())),
        )
        .layer(cors_layer(config.allowed_origin().as_deref()))
}

/// CORS policy for `origin`; `*` allows any origin and `None` allows none.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        Some("*") => AllowOrigin::any(),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin, error = %e, "Ignoring unusable CORS origin");
                AllowOrigin::list([])
            }
        },
        None => AllowOrigin::list([]),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(CORS_MAX_AGE)
}

async fn layer_failure(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Layer(err.to_string())
    }
}

async fn create_match<R: MatchRepository>(
    State(service): SharedService<R>,
    body: Result<Json<UsernameRequest>, JsonRejection>,
) -> Result<Json<RoomTicket>, ApiError> {
    let Json(body) = body?;
    let username = checked_username(body.username)?;
    Ok(Json(service.create_room(username).await?))
}

async fn join_match<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
    body: Result<Json<UsernameRequest>, JsonRejection>,
) -> Result<Json<RoomTicket>, ApiError> {
    let room_id = parse_room(&room_id)?;
    let Json(body) = body?;
    let username = checked_username(body.username)?;
    Ok(Json(service.join_room(&room_id, username).await?))
}

async fn set_combination<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
    body: Result<Json<CombinationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Acknowledgement>), ApiError> {
    let room_id = parse_room(&room_id)?;
    let Json(body) = body?;
    service
        .set_combination(&room_id, &body.player_id, &body.combination)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ACK)))
}

async fn start_game<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
) -> Result<(StatusCode, Json<GameStarted>), ApiError> {
    let room_id = parse_room(&room_id)?;
    let started = service.start_game(&room_id).await?;
    Ok((StatusCode::ACCEPTED, Json(started)))
}

async fn make_guess<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
    body: Result<Json<GuessRequest>, JsonRejection>,
) -> Result<Json<GuessOutcome>, ApiError> {
    let room_id = parse_room(&room_id)?;
    let Json(body) = body?;
    Ok(Json(
        service
            .make_guess(&room_id, &body.player_id, &body.guess)
            .await?,
    ))
}

async fn restart_game<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
) -> Result<Json<Acknowledgement>, ApiError> {
    let room_id = parse_room(&room_id)?;
    service.restart_game(&room_id).await?;
    Ok(Json(ACK))
}

async fn get_match<R: MatchRepository>(
    State(service): SharedService<R>,
    Path(room_id): Path<String>,
) -> Result<Json<MatchView>, ApiError> {
    let room_id = parse_room(&room_id)?;
    Ok(Json(service.get_match(&room_id).await?))
}
