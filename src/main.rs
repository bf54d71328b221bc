#[rocket::launch]
fn launch() -> _ {
    clubhouse::rocket()
}
