use mongodb::bson::doc;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;

use crate::data::{parse_object_id, ApiError, Challenge, Gateway, InsertAck};

#[get("/Challenges")]
pub async fn list_challenges(db: Gateway<'_>) -> Result<Json<Vec<Challenge>>, ApiError> {
    let cursor = db
        .challenges()
        .find(doc! {})
        .sort(doc! { "duration": 1 })
        .await?;
    let challenges = cursor.try_collect().await?;
    Ok(Json(challenges))
}

/// Absent documents answer with a 200 and a `null` body; only a malformed
/// identifier is a client error.
#[get("/Challenges/<id>")]
pub async fn get_challenge(db: Gateway<'_>, id: &str) -> Result<Json<Option<Challenge>>, ApiError> {
    let oid = parse_object_id(id)?;
    let challenge = db.challenges().find_one(doc! { "_id": oid }).await?;
    Ok(Json(challenge))
}

#[post("/Challenges", data = "<challenge>")]
pub async fn create_challenge(
    db: Gateway<'_>,
    challenge: Json<Challenge>,
) -> Result<Json<InsertAck>, ApiError> {
    let result = db.challenges().insert_one(challenge.into_inner()).await?;
    Ok(Json(result.into()))
}
