use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user and its place in the follow graph.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
    pub birth_date: Option<NaiveDate>,
    pub followers: BTreeSet<Uuid>,
    pub following: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `AccountStore::create`. The password is still plain text here.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub bio: String,
    pub avatar: String,
    pub birth_date: Option<NaiveDate>,
}

/// Profile changes. `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.display_name.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
            && self.birth_date.is_none()
    }
}

/// What `AccountStore::set_edge` does to a follower -> followed edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeChange {
    Follow,
    Unfollow,
}
