use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct GroupCreated {
    pub id: Uuid,
    pub name: String,
    pub invitation_code: String,
}

#[derive(Serialize)]
pub struct GroupJoined {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct GroupRow {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub invitation_code: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct GroupList {
    pub groups: Vec<GroupRow>,
}
