use mongodb::bson::doc;
use rocket::futures::TryStreamExt;
use rocket::serde::json::Json;

use crate::data::{
    parse_object_id, ApiError, DeleteAck, Event, EventPatch, Gateway, InsertAck, UpdateAck,
};

#[get("/event")]
pub async fn list_events(db: Gateway<'_>) -> Result<Json<Vec<Event>>, ApiError> {
    let cursor = db.events().find(doc! {}).sort(doc! { "date": 1 }).await?;
    let events = cursor.try_collect().await?;
    Ok(Json(events))
}

#[get("/event/<id>")]
pub async fn get_event(db: Gateway<'_>, id: &str) -> Result<Json<Option<Event>>, ApiError> {
    let oid = parse_object_id(id)?;
    let event = db.events().find_one(doc! { "_id": oid }).await?;
    Ok(Json(event))
}

#[post("/event", data = "<event>")]
pub async fn create_event(
    db: Gateway<'_>,
    event: Json<Event>,
) -> Result<Json<InsertAck>, ApiError> {
    let result = db.events().insert_one(event.into_inner()).await?;
    Ok(Json(result.into()))
}

/// Field-level merge: only the supplied fields change. A zero matched count
/// is reported in the acknowledgment, not turned into an error.
#[put("/event/<id>", data = "<patch>")]
pub async fn update_event(
    db: Gateway<'_>,
    id: &str,
    patch: Json<EventPatch>,
) -> Result<Json<UpdateAck>, ApiError> {
    let oid = parse_object_id(id)?;
    let update = patch.into_inner().into_set_document()?;
    let result = db.events().update_one(doc! { "_id": oid }, update).await?;
    Ok(Json(result.into()))
}

#[delete("/event/<id>")]
pub async fn delete_event(db: Gateway<'_>, id: &str) -> Result<Json<DeleteAck>, ApiError> {
    let oid = parse_object_id(id)?;
    let result = db.events().delete_one(doc! { "_id": oid }).await?;
    Ok(Json(result.into()))
}
