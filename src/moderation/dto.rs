use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    #[serde(default = "default_purge_days")]
    pub days: i64,
}

fn default_purge_days() -> i64 {
    30
}
