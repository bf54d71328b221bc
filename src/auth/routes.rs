//! Signup, login, and logout handlers.
//!
//! Validation and credential failures re-render the originating form at
//! 200 with an inline message; only infrastructure failures escape as
//! [`PageError`]. A failed login renders the exact same page whether the
//! email was unknown or the password wrong.

use chrono::Utc;
use rocket::State;
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket_db_pools::sqlx::PgPool;
use rocket_dyn_templates::{Template, context};
use time::Duration as TimeDuration;

use crate::auth::sessions::SessionIssued;
use crate::auth::{AuthError, AuthState, validate};
use crate::error::PageError;
use crate::models::Role;
use crate::users;

#[derive(Debug, FromForm)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Outcome of a form submission: a redirect into the members area, or the
/// form again with an inline message.
#[derive(Responder)]
pub enum FormOutcome {
    Success(Redirect),
    Retry(Template),
}

#[post("/signupSubmit", data = "<form>")]
pub async fn signup_submit(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    cookies: &CookieJar<'_>,
    form: Form<SignupForm>,
) -> Result<FormOutcome, PageError> {
    let username = form.username.trim();
    let email = form.email.trim().to_lowercase();
    let password = form.password.as_str();

    if let Err(err) = validate::signup(username, &email, password) {
        return Ok(FormOutcome::Retry(Template::render(
            "signup",
            context! { error: err.to_string(), username, email },
        )));
    }

    let password_hash = state.passwords.hash_password(password)?;

    match users::insert_user(pool, username, &email, &password_hash, Role::User).await {
        Ok(user_id) => log::info!("created user '{}' (id {})", username, user_id),
        Err(AuthError::DuplicateUser) => {
            return Ok(FormOutcome::Retry(Template::render(
                "signup",
                context! {
                    error: AuthError::DuplicateUser.to_string(),
                    username,
                    email,
                },
            )));
        }
        Err(err) => return Err(err.into()),
    }

    // Replace any session the browser was still carrying.
    if let Some(cookie) = cookies.get(&state.config.session_cookie_name) {
        state.sessions.destroy(cookie.value()).await?;
    }

    let session = state
        .sessions
        .create(username, &email, Role::User, Utc::now(), state.config.session_ttl())
        .await?;
    set_session_cookie(cookies, state, &session);

    Ok(FormOutcome::Success(Redirect::to(uri!("/members"))))
}

#[post("/loginSubmit", data = "<form>")]
pub async fn login_submit(
    state: &State<AuthState>,
    pool: &State<PgPool>,
    cookies: &CookieJar<'_>,
    form: Form<LoginForm>,
) -> Result<FormOutcome, PageError> {
    let email = form.email.trim().to_lowercase();
    let password = form.password.as_str();

    if let Err(err) = validate::login_email(&email) {
        return Ok(FormOutcome::Retry(Template::render(
            "login",
            context! { error: err.to_string(), email },
        )));
    }

    // Exactly one user may match; zero and many both take the generic
    // failure path so the response never reveals which.
    let matches = users::find_all_by_email(pool, &email).await?;
    let user = match matches.as_slice() {
        [user] => user,
        _ => return Ok(invalid_credentials(&email)),
    };

    if !state.passwords.verify_password(password, &user.password_hash)? {
        return Ok(invalid_credentials(&email));
    }

    // Replace any session the browser was still carrying.
    if let Some(cookie) = cookies.get(&state.config.session_cookie_name) {
        state.sessions.destroy(cookie.value()).await?;
    }

    let session = state
        .sessions
        .create(
            &user.username,
            &user.email,
            user.role,
            Utc::now(),
            state.config.session_ttl(),
        )
        .await?;
    set_session_cookie(cookies, state, &session);

    log::info!("user '{}' logged in", user.username);

    Ok(FormOutcome::Success(Redirect::to(uri!("/members"))))
}

#[get("/logout")]
pub async fn logout(
    state: &State<AuthState>,
    cookies: &CookieJar<'_>,
) -> Result<Redirect, PageError> {
    if let Some(cookie) = cookies.get(&state.config.session_cookie_name) {
        state.sessions.destroy(cookie.value()).await?;
    }

    cookies.remove(
        Cookie::build((state.config.session_cookie_name.clone(), String::new()))
            .path("/")
            .build(),
    );

    Ok(Redirect::to(uri!("/")))
}

fn invalid_credentials(email: &str) -> FormOutcome {
    FormOutcome::Retry(Template::render(
        "login",
        context! { error: AuthError::InvalidCredentials.to_string(), email },
    ))
}

fn set_session_cookie(cookies: &CookieJar<'_>, state: &State<AuthState>, session: &SessionIssued) {
    let cookie = Cookie::build((
        state.config.session_cookie_name.clone(),
        session.token.clone(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(state.config.cookie_secure)
    .max_age(TimeDuration::seconds(state.config.session_ttl_secs))
    .build();

    cookies.add(cookie);
}
