use serde::{Deserialize, Serialize};

use crate::domain::{
    CommentView, CommunityId, CommunityUserView, CommunityView, PostView, SortType, UserId,
    UserSummary,
};

/// The operation tag carried by every outbound request and echoed by the
/// server in the matching reply. Stable for the process lifetime; view
/// controllers demultiplex the shared inbound stream by comparing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserOperation {
    GetUserDetails,
    CreatePost,
    ListCommunities,
}

impl UserOperation {
    /// Maps a wire tag back onto the catalogue. `None` means the tag is
    /// outside the catalogue, which receivers treat as ignorable, not fatal.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "get_user_details" => Some(Self::GetUserDetails),
            "create_post" => Some(Self::CreatePost),
            "list_communities" => Some(Self::ListCommunities),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetUserDetails => "get_user_details",
            Self::CreatePost => "create_post",
            Self::ListCommunities => "list_communities",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetUserDetailsForm {
    pub user_id: UserId,
    pub sort: SortType,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePostForm {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub community_id: CommunityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCommunitiesForm {
    pub sort: SortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum ClientRequest {
    GetUserDetails(GetUserDetailsForm),
    CreatePost(CreatePostForm),
    ListCommunities(ListCommunitiesForm),
}

impl ClientRequest {
    pub fn op(&self) -> UserOperation {
        match self {
            Self::GetUserDetails(_) => UserOperation::GetUserDetails,
            Self::CreatePost(_) => UserOperation::CreatePost,
            Self::ListCommunities(_) => UserOperation::ListCommunities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetailsResponse {
    pub user: UserSummary,
    pub follows: Vec<CommunityUserView>,
    pub moderates: Vec<CommunityUserView>,
    pub comments: Vec<CommentView>,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub post: PostView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCommunitiesResponse {
    pub communities: Vec<CommunityView>,
}

/// Successful replies, tagged with the operation they answer. Failure is
/// carried out-of-band in the envelope's `error` field and never reaches
/// this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum ServerReply {
    GetUserDetails(UserDetailsResponse),
    CreatePost(PostResponse),
    ListCommunities(ListCommunitiesResponse),
}

impl ServerReply {
    pub fn op(&self) -> UserOperation {
        match self {
            Self::GetUserDetails(_) => UserOperation::GetUserDetails,
            Self::CreatePost(_) => UserOperation::CreatePost,
            Self::ListCommunities(_) => UserOperation::ListCommunities,
        }
    }
}
