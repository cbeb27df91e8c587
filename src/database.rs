use std::env;
use std::fmt;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, Database};

use crate::data::{Challenge, Event, UserChallenge};

const DEFAULT_DATABASE: &str = "track_eco";
const DEFAULT_PORT: u16 = 5000;
const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum ConfigError {
    MissingUri,
    BadPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingUri => write!(f, "MONGODB_URI is not set"),
            ConfigError::BadPort(raw) => write!(f, "PORT is not a valid port number: {raw}"),
        }
    }
}

pub struct EcoConfig {
    pub mongodb_uri: String,
    pub database_name: String,
    pub port: u16,
}

impl EcoConfig {
    pub fn from_env() -> Result<EcoConfig, ConfigError> {
        let mongodb_uri = env::var("MONGODB_URI").map_err(|_| ConfigError::MissingUri)?;

        let database_name =
            env::var("MONGODB_DB").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        let port = match env::var("PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(EcoConfig {
            mongodb_uri,
            database_name,
            port,
        })
    }
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::BadPort(raw.to_string()))
}

/// Handles to the named collections, constructed once at startup and handed
/// to Rocket as managed state.
pub struct EcoState {
    pub database_client: Client,
    database_name: String,
}

impl EcoState {
    pub fn new(database_client: Client, database_name: String) -> EcoState {
        EcoState {
            database_client,
            database_name,
        }
    }

    fn database(&self) -> Database {
        self.database_client.database(&self.database_name)
    }

    pub fn challenges(&self) -> Collection<Challenge> {
        self.database().collection("Challenges")
    }

    pub fn user_challenges(&self) -> Collection<UserChallenge> {
        self.database().collection("UserChallenges")
    }

    pub fn events(&self) -> Collection<Event> {
        self.database().collection("event")
    }
}

pub async fn connect_mongodb(config: &EcoConfig) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(&config.mongodb_uri).await?;
    let server_api = ServerApi::builder()
        .version(ServerApiVersion::V1)
        .build();
    client_options.server_api = Some(server_api);
    let client = Client::with_options(client_options)?;

    // The driver connects lazily; ping until the deployment answers so a
    // dead connection string is fatal at startup instead of on first request.
    let mut attempt = 1;
    loop {
        match client
            .database(&config.database_name)
            .run_command(doc! { "ping": 1 })
            .await
        {
            Ok(_) => {
                println!("Connected to MongoDB");
                return Ok(client);
            }
            Err(error) if attempt >= CONNECT_ATTEMPTS => return Err(error),
            Err(error) => {
                eprintln!("MongoDB connection attempt {attempt} failed: {error}");
                attempt += 1;
                rocket::tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
}
