//! Admin panel: user listing plus role promotion and demotion.

use rocket::State;
use rocket::response::Redirect;
use rocket_db_pools::sqlx::PgPool;
use rocket_dyn_templates::{Template, context};

use crate::auth::{RequireAdmin, SessionUser};
use crate::error::PageError;
use crate::models::Role;
use crate::users;

/// The three ways `/admin` can resolve: the panel itself, a 403 page for
/// authenticated non-admins, or a login redirect for anonymous visitors.
#[derive(Responder)]
pub enum AdminView {
    Page(Template),
    #[response(status = 403)]
    Forbidden(Template),
    Redirect(Redirect),
}

#[get("/admin")]
pub async fn admin_panel(
    user: Option<SessionUser>,
    pool: &State<PgPool>,
) -> Result<AdminView, PageError> {
    // Authentication is checked before anything touches the database.
    let user = match user {
        Some(user) => user,
        None => return Ok(AdminView::Redirect(Redirect::to(uri!("/login")))),
    };

    if !user.is_admin() {
        return Ok(AdminView::Forbidden(Template::render(
            "errors/403",
            context! {},
        )));
    }

    let users = users::list_users(pool).await?;

    Ok(AdminView::Page(Template::render(
        "admin",
        context! { username: user.username, users },
    )))
}

#[get("/promote/<username>")]
pub async fn promote(
    admin: RequireAdmin,
    pool: &State<PgPool>,
    username: &str,
) -> Result<Redirect, PageError> {
    set_role_and_log(&admin, pool, username, Role::Admin).await?;
    Ok(Redirect::to(uri!("/admin")))
}

#[get("/demote/<username>")]
pub async fn demote(
    admin: RequireAdmin,
    pool: &State<PgPool>,
    username: &str,
) -> Result<Redirect, PageError> {
    set_role_and_log(&admin, pool, username, Role::User).await?;
    Ok(Redirect::to(uri!("/admin")))
}

async fn set_role_and_log(
    admin: &RequireAdmin,
    pool: &State<PgPool>,
    username: &str,
    role: Role,
) -> Result<(), PageError> {
    let updated = users::set_role(pool, username, role).await?;

    // A miss is tolerated, not an error; the admin lands back on the panel
    // and sees the unchanged listing.
    if updated == 0 {
        log::warn!(
            "'{}' set role {} for unknown user '{}'",
            admin.0.username,
            role.as_str(),
            username
        );
    } else {
        log::info!(
            "'{}' set role {} for user '{}'",
            admin.0.username,
            role.as_str(),
            username
        );
    }

    Ok(())
}
