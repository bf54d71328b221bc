//! Status catchers rendering the error templates.

use rocket::Request;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};

#[catch(404)]
pub fn not_found(request: &Request) -> Template {
    log::debug!("no route matched {}", request.uri());
    Template::render("errors/404", context! {})
}

#[catch(403)]
pub fn forbidden() -> Template {
    Template::render("errors/403", context! {})
}

/// Guard failures on admin-only routes land here when nobody is logged in.
#[catch(401)]
pub fn unauthorized() -> Redirect {
    Redirect::to(uri!("/login"))
}

#[catch(500)]
pub fn internal_error() -> Template {
    Template::render("errors/500", context! {})
}
