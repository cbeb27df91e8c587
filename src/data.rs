use std::ops::Deref;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::results::{DeleteResult, InsertOneResult, UpdateResult};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::{status, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;

use crate::database::EcoState;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Challenge {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Length in days; listings sort ascending on this field.
    pub duration: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserChallenge {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "challengeId")]
    pub challenge_id: String,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct JoinRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "challengeId")]
    pub challenge_id: Option<String>,
}

impl JoinRequest {
    /// Stamps the join record with the current server time. Both references
    /// must be present and non-empty; neither is checked for existence.
    pub fn into_record(self) -> Result<UserChallenge, ApiError> {
        let user_id = self
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingField("userId"))?;
        let challenge_id = self
            .challenge_id
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::MissingField("challengeId"))?;

        Ok(UserChallenge {
            id: None,
            user_id,
            challenge_id,
            joined_at: DateTime::now(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    /// ISO date string; listings sort ascending on this field.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventPatch {
    /// Builds a `$set` update carrying only the supplied fields. MongoDB
    /// rejects an empty `$set`, so an empty patch is a validation error.
    pub fn into_set_document(self) -> Result<Document, ApiError> {
        let fields = mongodb::bson::to_document(&self)?;
        if fields.is_empty() {
            return Err(ApiError::EmptyUpdate);
        }
        Ok(doc! { "$set": fields })
    }
}

#[derive(Serialize, Debug)]
pub struct InsertAck {
    #[serde(rename = "insertedId")]
    pub inserted_id: Option<String>,
}

impl From<InsertOneResult> for InsertAck {
    fn from(result: InsertOneResult) -> InsertAck {
        InsertAck {
            inserted_id: result.inserted_id.as_object_id().map(|oid| oid.to_hex()),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct UpdateAck {
    #[serde(rename = "matchedCount")]
    pub matched_count: u64,
    #[serde(rename = "modifiedCount")]
    pub modified_count: u64,
}

impl From<UpdateResult> for UpdateAck {
    fn from(result: UpdateResult) -> UpdateAck {
        UpdateAck {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DeleteAck {
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteAck {
    fn from(result: DeleteResult) -> DeleteAck {
        DeleteAck {
            deleted_count: result.deleted_count,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct JoinResponse {
    pub success: bool,
    pub message: String,
    pub result: InsertAck,
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> ErrorBody {
        ErrorBody {
            error: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    InvalidId,
    MissingField(&'static str),
    EmptyUpdate,
    NotReady,
    Database(mongodb::error::Error),
    Encoding(mongodb::bson::ser::Error),
}

impl From<mongodb::error::Error> for ApiError {
    fn from(error: mongodb::error::Error) -> ApiError {
        ApiError::Database(error)
    }
}

impl From<mongodb::bson::ser::Error> for ApiError {
    fn from(error: mongodb::bson::ser::Error) -> ApiError {
        ApiError::Encoding(error)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        let (status, message) = match &self {
            ApiError::InvalidId => (Status::BadRequest, "malformed identifier".to_string()),
            ApiError::MissingField(field) => {
                (Status::BadRequest, format!("{field} is required"))
            }
            ApiError::EmptyUpdate => {
                (Status::BadRequest, "no fields to update".to_string())
            }
            ApiError::NotReady => (
                Status::InternalServerError,
                "database not initialized".to_string(),
            ),
            ApiError::Database(error) => {
                eprintln!("database operation failed: {error}");
                (Status::InternalServerError, "database error".to_string())
            }
            ApiError::Encoding(error) => {
                eprintln!("document encoding failed: {error}");
                (Status::InternalServerError, "database error".to_string())
            }
        };
        status::Custom(status, Json(ErrorBody::new(message))).respond_to(request)
    }
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::InvalidId)
}

/// Readiness guard over the managed gateway state. Requests arriving before
/// the state exists get a clean 500 instead of a crashed handler.
pub struct Gateway<'r>(pub &'r EcoState);

impl Deref for Gateway<'_> {
    type Target = EcoState;

    fn deref(&self) -> &EcoState {
        self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Gateway<'r> {
    type Error = ApiError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.rocket().state::<EcoState>() {
            Some(state) => Outcome::Success(Gateway(state)),
            None => Outcome::Error((Status::InternalServerError, ApiError::NotReady)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::local::blocking::Client;

    #[test]
    fn object_id_parsing() {
        assert!(parse_object_id("65f1a2b3c4d5e6f708192a3b").is_ok());
        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(ApiError::InvalidId)
        ));
        assert!(matches!(parse_object_id(""), Err(ApiError::InvalidId)));
    }

    #[test]
    fn join_request_requires_both_references() {
        let missing_user = JoinRequest {
            user_id: None,
            challenge_id: Some("abc".to_string()),
        };
        assert!(matches!(
            missing_user.into_record(),
            Err(ApiError::MissingField("userId"))
        ));

        let empty_challenge = JoinRequest {
            user_id: Some("u1".to_string()),
            challenge_id: Some(String::new()),
        };
        assert!(matches!(
            empty_challenge.into_record(),
            Err(ApiError::MissingField("challengeId"))
        ));

        let complete = JoinRequest {
            user_id: Some("u1".to_string()),
            challenge_id: Some("c1".to_string()),
        };
        let record = complete.into_record().unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.challenge_id, "c1");
        assert!(record.id.is_none());
    }

    #[test]
    fn event_patch_keeps_only_supplied_fields() {
        let patch = EventPatch {
            title: Some("Cleanup Day 2".to_string()),
            ..EventPatch::default()
        };
        let update = patch.into_set_document().unwrap();
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get_str("title").unwrap(), "Cleanup Day 2");
    }

    #[test]
    fn empty_event_patch_is_rejected() {
        assert!(matches!(
            EventPatch::default().into_set_document(),
            Err(ApiError::EmptyUpdate)
        ));
    }

    #[get("/invalid-id")]
    fn invalid_id() -> Result<Json<()>, ApiError> {
        Err(ApiError::InvalidId)
    }

    #[get("/not-ready")]
    fn not_ready() -> Result<Json<()>, ApiError> {
        Err(ApiError::NotReady)
    }

    #[test]
    fn api_errors_map_to_distinct_statuses() {
        let rocket = rocket::build().mount("/", routes![invalid_id, not_ready]);
        let client = Client::tracked(rocket).unwrap();

        let response = client.get("/invalid-id").dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        assert!(response.into_string().unwrap().contains("malformed identifier"));

        let response = client.get("/not-ready").dispatch();
        assert_eq!(response.status(), Status::InternalServerError);
        assert!(response
            .into_string()
            .unwrap()
            .contains("database not initialized"));
    }
}
