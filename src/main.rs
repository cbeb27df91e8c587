#[macro_use]
extern crate rocket;

use rocket::{Build, Rocket};

mod cors;
mod data;
mod database;
mod endpoints;

#[launch]
async fn rocket() -> Rocket<Build> {
    let config = database::EcoConfig::from_env().expect("Invalid configuration");

    let database_client = database::connect_mongodb(&config)
        .await
        .expect("Failed to initialize MongoDB");

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .manage(database::EcoState::new(database_client, config.database_name))
        .attach(cors::Cors)
        .register(
            "/",
            catchers![
                endpoints::bad_request,
                endpoints::not_found,
                endpoints::unprocessable,
                endpoints::internal_error
            ],
        )
        .mount(
            "/",
            routes![
                endpoints::index,
                endpoints::preflight,
                endpoints::challenges::list_challenges,
                endpoints::challenges::get_challenge,
                endpoints::challenges::create_challenge,
                endpoints::user_challenges::list_user_challenges,
                endpoints::user_challenges::join_challenge,
                endpoints::events::list_events,
                endpoints::events::get_event,
                endpoints::events::create_event,
                endpoints::events::update_event,
                endpoints::events::delete_event,
            ],
        )
}
