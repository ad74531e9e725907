use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(PostId);
id_newtype!(CommentId);
id_newtype!(CommunityId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    New,
    TopDay,
    TopWeek,
    TopMonth,
    TopYear,
    TopAll,
}

impl SortType {
    /// Parses the lowercase names used in routes and CLI flags.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(Self::New),
            "top_day" => Some(Self::TopDay),
            "top_week" => Some(Self::TopWeek),
            "top_month" => Some(Self::TopMonth),
            "top_year" => Some(Self::TopYear),
            "top_all" => Some(Self::TopAll),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: PostId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub creator_id: UserId,
    pub community_id: CommunityId,
    pub community_name: String,
    pub score: i64,
    pub number_of_comments: i64,
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub post_id: PostId,
    pub creator_id: UserId,
    pub content: String,
    pub score: i64,
    pub published: DateTime<Utc>,
}

/// A community seen through one user's membership: powers both the
/// "moderates" and "subscribed" sidebar lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityUserView {
    pub community_id: CommunityId,
    pub community_name: String,
    pub user_id: UserId,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityView {
    pub id: CommunityId,
    pub name: String,
    pub title: String,
    pub number_of_subscribers: i64,
    pub number_of_posts: i64,
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub published: DateTime<Utc>,
    pub number_of_posts: i64,
    pub post_score: i64,
    pub number_of_comments: i64,
    pub comment_score: i64,
}
