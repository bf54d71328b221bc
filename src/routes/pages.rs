use rand::Rng;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use serde::Serialize;

use crate::auth::SessionUser;

/// Fixed pool of themed members-area greetings; one is chosen uniformly
/// per visit.
#[derive(Debug, Clone, Copy, Serialize)]
struct Greeting {
    caption: &'static str,
    tagline: &'static str,
}

const GREETINGS: [Greeting; 3] = [
    Greeting {
        caption: "Avocatdo",
        tagline: "Half avocado, half cat, entirely pleased to see you.",
    },
    Greeting {
        caption: "catZoom",
        tagline: "Zoomies scheduled for right now.",
    },
    Greeting {
        caption: "smartcat",
        tagline: "A scholar has noticed your arrival.",
    },
];

#[get("/")]
pub fn home(user: Option<SessionUser>) -> Template {
    match user {
        Some(user) => Template::render(
            "welcome",
            context! { username: user.username, role: user.role.as_str() },
        ),
        None => Template::render("index", context! {}),
    }
}

#[get("/signup")]
pub fn signup_page() -> Template {
    Template::render("signup", context! {})
}

#[get("/login")]
pub fn login_page() -> Template {
    Template::render("login", context! {})
}

/// Members-only page; anonymous visitors bounce back to the landing page.
#[get("/members")]
pub fn members(user: Option<SessionUser>) -> Result<Template, Redirect> {
    let user = match user {
        Some(user) => user,
        None => return Err(Redirect::to(uri!("/"))),
    };

    let greeting = GREETINGS[rand::thread_rng().gen_range(0..GREETINGS.len())];

    Ok(Template::render(
        "members",
        context! { username: user.username, greeting },
    ))
}
