use std::path::PathBuf;

use rocket::serde::json::Json;

use crate::data::ErrorBody;

pub mod challenges;
pub mod events;
pub mod user_challenges;

#[get("/")]
pub fn index() -> &'static str {
    "EcoTrack Server is Running"
}

// Preflight requests only need the fairing-set CORS headers.
#[options("/<_route..>")]
pub fn preflight(_route: PathBuf) {}

#[catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody::new("bad request"))
}

#[catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody::new("resource not found"))
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    Json(ErrorBody::new("malformed request body"))
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody::new("internal server error"))
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::local::blocking::Client;

    fn client_without_database() -> Client {
        let rocket = rocket::build()
            .attach(crate::cors::Cors)
            .register(
                "/",
                catchers![
                    super::bad_request,
                    super::not_found,
                    super::unprocessable,
                    super::internal_error
                ],
            )
            .mount(
                "/",
                routes![
                    super::index,
                    super::preflight,
                    super::challenges::list_challenges,
                    super::challenges::get_challenge,
                    super::challenges::create_challenge,
                    super::user_challenges::list_user_challenges,
                    super::user_challenges::join_challenge,
                    super::events::list_events,
                    super::events::get_event,
                    super::events::create_event,
                    super::events::update_event,
                    super::events::delete_event,
                ],
            );
        Client::tracked(rocket).unwrap()
    }

    #[test]
    fn liveness_route_answers_in_plain_text() {
        let client = client_without_database();
        let response = client.get("/").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.into_string().unwrap(),
            "EcoTrack Server is Running"
        );
    }

    #[test]
    fn readiness_guard_rejects_requests_without_gateway() {
        let client = client_without_database();
        let response = client.get("/Challenges").dispatch();
        assert_eq!(response.status(), Status::InternalServerError);
        assert!(response.into_string().unwrap().contains("error"));
    }

    #[test]
    fn preflight_is_accepted_anywhere() {
        let client = client_without_database();
        let response = client.options("/event").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
    }

    #[test]
    fn unknown_route_gets_json_not_found() {
        let client = client_without_database();
        let response = client.get("/nope").dispatch();
        assert_eq!(response.status(), Status::NotFound);
        assert!(response.into_string().unwrap().contains("resource not found"));
    }
}
