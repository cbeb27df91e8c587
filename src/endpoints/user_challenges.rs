use mongodb::bson::doc;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;

use crate::data::{ApiError, Gateway, JoinRequest, JoinResponse, UserChallenge};

#[get("/UserChallenges")]
pub async fn list_user_challenges(
    db: Gateway<'_>,
) -> Result<Json<Vec<UserChallenge>>, ApiError> {
    let cursor = db.user_challenges().find(doc! {}).await?;
    let records = cursor.try_collect().await?;
    Ok(Json(records))
}

/// No duplicate-join check and no existence check on either reference: the
/// same user may join the same challenge any number of times.
#[post("/JoinChallenge", data = "<join>")]
pub async fn join_challenge(
    db: Gateway<'_>,
    join: Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let record = join.into_inner().into_record()?;
    let result = db.user_challenges().insert_one(record).await?;
    Ok(Json(JoinResponse {
        success: true,
        message: "Joined successfully!".to_string(),
        result: result.into(),
    }))
}
