use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

/// Fairing to log one line per HTTP request with timing.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(|| Instant::now());
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let start_time = request.local_cache(|| Instant::now());
        let duration = start_time.elapsed();

        let uri = request.uri().to_string();
        let line = format!(
            "{} {} -> {} ({:.2}ms)",
            request.method(),
            uri,
            response.status().code,
            duration.as_secs_f64() * 1000.0
        );

        // Static assets are noise at info.
        if uri.ends_with(".css") || uri.ends_with(".js") || uri.ends_with(".ico") {
            log::debug!("{}", line);
        } else {
            log::info!("{}", line);
        }
    }
}
