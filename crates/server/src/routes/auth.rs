//! Authentication route handlers.
//!
//! Handles operator login and logout. Accounts are created with
//! `registry user create`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{
    Flash, FlashMessage, OptionalAuth, clear_current_user, push_flash, set_current_user,
};
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Where operators land after logging in or out.
const HOME_PATH: &str = "/persons";

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub flash: Vec<FlashMessage>,
}

/// Display the login page.
pub async fn login_page(OptionalAuth(user): OptionalAuth, Flash(flash): Flash) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }
    LoginTemplate { user, flash }.into_response()
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth().login(&form.username, &form.password).await {
        Ok(user) => {
            let current_user = CurrentUser::from(&user);
            if let Err(e) = set_current_user(&session, &current_user).await {
                tracing::error!(error = %e, "failed to store session");
                push_flash(&session, FlashMessage::error("Could not start a session.")).await;
                return Redirect::to("/auth/login").into_response();
            }

            set_sentry_user(&user.id, &user.username);
            tracing::info!(user_id = %user.id, "operator logged in");
            push_flash(
                &session,
                FlashMessage::success(format!("Welcome, {}.", user.username)),
            )
            .await;
            Redirect::to(HOME_PATH).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("login failed: invalid credentials");
            push_flash(&session, FlashMessage::error("Invalid username or password.")).await;
            Redirect::to("/auth/login").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            push_flash(
                &session,
                FlashMessage::error("Login is unavailable right now. Please try again."),
            )
            .await;
            Redirect::to("/auth/login").into_response()
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "failed to clear session");
    }
    clear_sentry_user();

    push_flash(&session, FlashMessage::success("Logged out.")).await;
    Redirect::to(HOME_PATH).into_response()
}
