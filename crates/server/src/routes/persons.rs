//! Person record route handlers.
//!
//! Listing and detail pages are public. Creating, editing, and deleting
//! require a logged-in operator; every mutation answers with a redirect and
//! a flash message describing the outcome.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{FromRequestParts, Multipart, Path, Query, State},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use registry_core::{PageNumber, Pagination, PersonId, PhotoExtension};

use crate::error::{AppError, Result};
use crate::middleware::{Flash, FlashMessage, OptionalAuth, RequireAuth, push_flash};
use crate::models::{CurrentUser, Person};
use crate::services::persons::{PersonError, PersonInput, PersonService, PhotoUpload};
use crate::state::AppState;

/// Listing path, also the landing page after a missing record.
const LIST_PATH: &str = "/persons";

/// Multipart field names used by the person form.
mod fields {
    pub const NAME: &str = "name";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const PHOTO: &str = "photo";
}

fn detail_path(id: PersonId) -> String {
    format!("/persons/{id}")
}

fn edit_path(id: PersonId) -> String {
    format!("/persons/{id}/edit")
}

/// Comma-separated allow-list shown next to the file input.
fn accepted_extensions() -> String {
    PhotoExtension::ALL
        .iter()
        .map(|ext| ext.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Query Types
// =============================================================================

/// Listing query. `page` stays raw so bad values fall back to page 1
/// instead of being rejected.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

/// Person id taken from the URL.
///
/// A segment that is not a valid id is handled like a missing record: the
/// client is sent back to the listing with a notice instead of receiving a
/// bare 400.
pub struct PersonPath(pub PersonId);

impl<S> FromRequestParts<S> for PersonPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Path::<PersonId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                let raw = Path::<String>::from_request_parts(parts, state)
                    .await
                    .map(|Path(raw)| raw)
                    .unwrap_or_default();
                tracing::debug!(id = %raw, error = %rejection, "unrecognised person id");

                if let Some(session) = parts.extensions.get::<Session>() {
                    push_flash(session, FlashMessage::error(not_found_message(&raw))).await;
                }
                Err(Redirect::to(LIST_PATH).into_response())
            }
        }
    }
}

fn not_found_message(id: &dyn std::fmt::Display) -> String {
    format!("Person {id} does not exist.")
}

// =============================================================================
// Templates
// =============================================================================

/// Person listing template.
#[derive(Template, WebTemplate)]
#[template(path = "persons/list.html")]
pub struct PersonListTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Vec<FlashMessage>,
    pub persons: Vec<Person>,
    pub pagination: Pagination,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
}

/// Person detail template.
#[derive(Template, WebTemplate)]
#[template(path = "persons/detail.html")]
pub struct PersonDetailTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Vec<FlashMessage>,
    pub person: Person,
}

/// Shared create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "persons/form.html")]
pub struct PersonFormTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Vec<FlashMessage>,
    pub title: String,
    pub action: String,
    /// Record being edited; `None` on the creation form.
    pub person: Option<Person>,
    pub accepted: String,
}

// =============================================================================
// Read Routes
// =============================================================================

/// Display one page of persons.
#[instrument(skip(state, user, flash))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Flash(flash): Flash,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    let page = PageNumber::from_query(query.page.as_deref());
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    let listing = match service.list(page).await {
        Ok(listing) => listing,
        Err(PersonError::Persistence(e)) => return Err(e.into()),
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let pagination = listing.pagination;
    Ok(PersonListTemplate {
        user,
        flash,
        persons: listing.persons,
        pagination,
        previous_page: pagination
            .has_previous()
            .then(|| pagination.page.get() - 1),
        next_page: pagination.has_next().then(|| pagination.page.get() + 1),
    }
    .into_response())
}

/// Display a single person.
#[instrument(skip(state, session, user, flash))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Flash(flash): Flash,
    PersonPath(id): PersonPath,
) -> Response {
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    match service.detail(id).await {
        Ok(person) => PersonDetailTemplate { user, flash, person }.into_response(),
        Err(e) => outcome_redirect(&session, e, LIST_PATH).await,
    }
}

// =============================================================================
// Create Routes
// =============================================================================

/// Display the creation form.
pub async fn new_page(RequireAuth(user): RequireAuth, Flash(flash): Flash) -> impl IntoResponse {
    PersonFormTemplate {
        user: Some(user),
        flash,
        title: "New person".to_owned(),
        action: "/persons/new".to_owned(),
        person: None,
        accepted: accepted_extensions(),
    }
}

/// Handle creation form submission.
#[instrument(skip_all, fields(user = %user.username))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let input = read_person_form(multipart).await?;
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    let response = match service.create(input).await {
        Ok(person) => {
            push_flash(&session, FlashMessage::success(format!("Added {}.", person.name))).await;
            Redirect::to(&detail_path(person.id)).into_response()
        }
        Err(e) => outcome_redirect(&session, e, "/persons/new").await,
    };

    Ok(response)
}

// =============================================================================
// Edit Routes
// =============================================================================

/// Display the edit form for an existing person.
#[instrument(skip(state, session, user, flash))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Flash(flash): Flash,
    PersonPath(id): PersonPath,
) -> Response {
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    match service.detail(id).await {
        Ok(person) => PersonFormTemplate {
            user: Some(user),
            flash,
            title: format!("Edit {}", person.name),
            action: edit_path(id),
            person: Some(person),
            accepted: accepted_extensions(),
        }
        .into_response(),
        Err(e) => outcome_redirect(&session, e, LIST_PATH).await,
    }
}

/// Handle edit form submission.
#[instrument(skip(state, user, session, multipart), fields(user = %user.username))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    PersonPath(id): PersonPath,
    multipart: Multipart,
) -> Result<Response> {
    let input = read_person_form(multipart).await?;
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    let response = match service.edit(id, input).await {
        Ok(person) => {
            push_flash(&session, FlashMessage::success(format!("Saved {}.", person.name))).await;
            Redirect::to(&detail_path(id)).into_response()
        }
        Err(e) => outcome_redirect(&session, e, &edit_path(id)).await,
    };

    Ok(response)
}

// =============================================================================
// Delete Route
// =============================================================================

/// Handle delete button submission.
#[instrument(skip(state, user, session), fields(user = %user.username))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    PersonPath(id): PersonPath,
) -> Response {
    let store = state.person_store();
    let service = PersonService::new(&store, state.photos());

    match service.delete(id).await {
        Ok(person) => {
            push_flash(&session, FlashMessage::success(format!("Deleted {}.", person.name)))
                .await;
            Redirect::to(LIST_PATH).into_response()
        }
        Err(e) => outcome_redirect(&session, e, &detail_path(id)).await,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Turn a failed person operation into a redirect with a flash message.
///
/// `back` is where the operator retries from (usually the form).
async fn outcome_redirect(session: &Session, error: PersonError, back: &str) -> Response {
    let (message, target) = match error {
        PersonError::Validation(e) => (capitalize(&e.to_string()), back.to_owned()),
        PersonError::UnsupportedMedia {
            reason,
            created: Some(id),
        } => (
            format!(
                "The person was saved without a photo ({reason}). Upload a {} file here.",
                accepted_extensions()
            ),
            edit_path(id),
        ),
        PersonError::UnsupportedMedia {
            reason,
            created: None,
        } => (
            format!(
                "Photo not accepted ({reason}). Allowed types: {}.",
                accepted_extensions()
            ),
            back.to_owned(),
        ),
        PersonError::NotFound(id) => (not_found_message(&id), LIST_PATH.to_owned()),
        PersonError::Persistence(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "person operation failed");
            (
                "Something went wrong and nothing was changed. Please try again.".to_owned(),
                back.to_owned(),
            )
        }
    };

    push_flash(session, FlashMessage::error(message)).await;
    Redirect::to(&target).into_response()
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}

/// Collect the person form from a multipart body.
///
/// A file input left empty arrives as a part with an empty filename and is
/// treated as "no photo".
async fn read_person_form(mut multipart: Multipart) -> Result<PersonInput> {
    let mut input = PersonInput::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            fields::NAME => input.name = field.text().await?,
            fields::BIRTH_DATE => input.birth_date = field.text().await?,
            fields::PHOTO => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                if !file_name.is_empty() {
                    input.photo = Some(PhotoUpload { file_name, data });
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(input)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::FromRequest,
        http::{Request, StatusCode, header},
    };
    use registry_core::{PersonDetailsError, PhotoError};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::db::RepositoryError;
    use crate::models::session_keys;

    const BOUNDARY: &str = "registry-form";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(file_name: &str, data: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{data}\r\n"
        )
    }

    async fn multipart(parts: &[String]) -> Multipart {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        let request = Request::post("/persons/new")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn queued(session: &Session) -> Vec<FlashMessage> {
        session
            .get(session_keys::FLASH)
            .await
            .unwrap()
            .unwrap_or_default()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_read_form_empty_file_input_means_no_photo() {
        let form = multipart(&[
            text_part("name", "Ada"),
            text_part("birth_date", "1815-12-10"),
            file_part("", ""),
        ])
        .await;

        let input = read_person_form(form).await.unwrap();
        assert_eq!(input.name, "Ada");
        assert_eq!(input.birth_date, "1815-12-10");
        assert!(input.photo.is_none());
    }

    #[tokio::test]
    async fn test_read_form_with_photo() {
        let form = multipart(&[
            text_part("name", "Ada"),
            text_part("birth_date", "1815-12-10"),
            file_part("ada.PNG", "pixels"),
            text_part("unexpected", "ignored"),
        ])
        .await;

        let input = read_person_form(form).await.unwrap();
        let photo = input.photo.unwrap();
        assert_eq!(photo.file_name, "ada.PNG");
        assert_eq!(&photo.data[..], b"pixels");
    }

    #[tokio::test]
    async fn test_validation_returns_to_form() {
        let session = session();
        let error = PersonError::Validation(PersonDetailsError::MissingName);

        let response = outcome_redirect(&session, error, "/persons/new").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/persons/new");
        assert_eq!(
            queued(&session).await,
            vec![FlashMessage::error("Name is required.")]
        );
    }

    #[tokio::test]
    async fn test_refused_photo_on_create_goes_to_edit_form() {
        let session = session();
        let error = PersonError::UnsupportedMedia {
            reason: PhotoError::UnsupportedExtension("bmp".to_owned()),
            created: Some(PersonId::new(8)),
        };

        let response = outcome_redirect(&session, error, "/persons/new").await;

        assert_eq!(location(&response), "/persons/8/edit");
        let flash = queued(&session).await;
        assert_eq!(flash.len(), 1);
        assert_eq!(flash[0].level, crate::middleware::FlashLevel::Error);
        assert!(flash[0].text.contains("saved without a photo"));
    }

    #[tokio::test]
    async fn test_refused_photo_on_edit_returns_to_form() {
        let session = session();
        let error = PersonError::UnsupportedMedia {
            reason: PhotoError::MissingExtension,
            created: None,
        };

        let response = outcome_redirect(&session, error, "/persons/3/edit").await;

        assert_eq!(location(&response), "/persons/3/edit");
        assert!(queued(&session).await[0].text.contains("png, jpg, jpeg, gif"));
    }

    #[tokio::test]
    async fn test_not_found_goes_to_listing() {
        let session = session();
        let error = PersonError::NotFound(PersonId::new(42));

        let response = outcome_redirect(&session, error, "/persons/42/edit").await;

        assert_eq!(location(&response), LIST_PATH);
        assert_eq!(
            queued(&session).await,
            vec![FlashMessage::error("Person 42 does not exist.")]
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_shows_generic_message() {
        let session = session();
        let error: PersonError =
            RepositoryError::DataCorruption("disk on fire".to_owned()).into();

        let response = outcome_redirect(&session, error, "/persons/5/edit").await;

        assert_eq!(location(&response), "/persons/5/edit");
        let flash = queued(&session).await;
        assert!(flash[0].text.starts_with("Something went wrong"));
        assert!(!flash[0].text.contains("disk on fire"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("name is required"), "Name is required.");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_paths() {
        let id = PersonId::new(4);
        assert_eq!(detail_path(id), "/persons/4");
        assert_eq!(edit_path(id), "/persons/4/edit");
    }

    #[test]
    fn test_accepted_extensions() {
        assert_eq!(accepted_extensions(), "png, jpg, jpeg, gif");
    }
}
