use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::Request;
use rocket_db_pools::sqlx;
use rocket_dyn_templates::{Template, context};

use crate::auth::AuthError;

/// Terminal request failure surfaced as an HTML error page.
///
/// Database and hashing failures are not locally recovered; they land here,
/// get logged, and render the generic 500 template. Validation and
/// credential failures never reach this type; the handlers re-render their
/// form instead.
#[derive(Debug)]
pub enum PageError {
    Database(sqlx::Error),
    Internal(String),
}

impl<'r> Responder<'r, 'static> for PageError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match &self {
            PageError::Database(err) => log::error!("database error: {}", err),
            PageError::Internal(msg) => log::error!("internal error: {}", msg),
        }

        let template = Template::render("errors/500", context! {});
        let mut response = template.respond_to(request)?;
        response.set_status(Status::InternalServerError);
        Ok(response)
    }
}

impl From<sqlx::Error> for PageError {
    fn from(err: sqlx::Error) -> Self {
        PageError::Database(err)
    }
}

impl From<AuthError> for PageError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Sqlx(err) => PageError::Database(err),
            other => PageError::Internal(other.to_string()),
        }
    }
}
