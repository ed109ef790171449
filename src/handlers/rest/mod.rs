use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{Envelope, NoteRequest, NoteResponse},
    models::{ValidationError, parse_note_id},
    service::{NoteService, NoteServiceError},
};

#[derive(OpenApi)]
#[openapi(
    paths(get_all_notes, create_note, get_one_note, update_note, delete_note),
    components(schemas(NoteResponse, NoteRequest)),
    tags(
        (name = "notes", description = "Notes management API")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "All notes, newest first", body = Envelope<Vec<NoteResponse>>),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(State(service): State<Arc<NoteService>>) -> Response {
    match service.list_notes().await {
        Ok(notes) => (StatusCode::OK, Json(Envelope::data(notes))).into_response(),
        Err(e) => error_response(e, "Failed to fetch notes"),
    }
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = Envelope<NoteResponse>),
        (status = 400, description = "Missing, empty or oversized fields"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> Response {
    let result = match request_body(payload) {
        Ok(request) => service.create_note(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(note) => (StatusCode::CREATED, Json(Envelope::data(note))).into_response(),
        Err(e) => error_response(e, "Failed to create note"),
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID (UUID)")
    ),
    responses(
        (status = 200, description = "Note found", body = Envelope<NoteResponse>),
        (status = 400, description = "Invalid note ID format"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.get_note(&id).await {
        Ok(note) => (StatusCode::OK, Json(Envelope::data(note))).into_response(),
        Err(e) => error_response(e, "Failed to fetch note"),
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID (UUID)")
    ),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = Envelope<NoteResponse>),
        (status = 400, description = "Invalid note ID format or invalid fields"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> Response {
    let result = match request_body(payload) {
        Ok(request) => service.update_note(&id, request).await,
        // A bad id outranks a bad body.
        Err(e) => match parse_note_id(&id) {
            Ok(_) => Err(e),
            Err(id_err) => Err(id_err.into()),
        },
    };

    match result {
        Ok(note) => (StatusCode::OK, Json(Envelope::data(note))).into_response(),
        Err(e) => error_response(e, "Failed to update note"),
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(
        ("id" = String, Path, description = "Note ID (UUID)")
    ),
    responses(
        (status = 200, description = "Note deleted successfully"),
        (status = 400, description = "Invalid note ID format"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    Path(id): Path<String>,
) -> Response {
    match service.delete_note(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(Envelope::message("Note deleted successfully")),
        )
            .into_response(),
        Err(e) => error_response(e, "Failed to delete note"),
    }
}

fn request_body(
    payload: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<NoteRequest, NoteServiceError> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        tracing::debug!("rejected request body: {rejection}");
        ValidationError::InvalidBody.into()
    })
}

/// Maps a service error onto the envelope. Storage details are only logged;
/// the caller sees `failure` verbatim.
fn error_response(err: NoteServiceError, failure: &str) -> Response {
    match err {
        NoteServiceError::Validation(e) => {
            (StatusCode::BAD_REQUEST, Json(Envelope::error(e.to_string()))).into_response()
        }
        NoteServiceError::NotFound => {
            (StatusCode::NOT_FOUND, Json(Envelope::error("Note not found"))).into_response()
        }
        NoteServiceError::Storage(e) => {
            tracing::error!("{failure}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(Envelope::error(failure))).into_response()
        }
    }
}
