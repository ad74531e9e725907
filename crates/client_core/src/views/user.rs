//! User-profile view controller.
//!
//! Holds the profile's query state (tab, sort, page) and folds matching
//! `get_user_details` replies into a wholesale-replaced result state.
//! Requests carry the query snapshot at send time; replies for the same tag
//! overwrite each other in arrival order. There is no per-request nonce, so
//! a stale in-flight reply still lands (accepted last-arrival-wins race).

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use shared::domain::{CommentView, CommunityUserView, PostView, SortType, UserId, UserSummary};
use shared::protocol::{ClientRequest, GetUserDetailsForm, ServerReply, UserDetailsResponse};
use tokio::sync::mpsc;
use tracing::debug;

use super::{Phase, RequestSink, ViewEffect};
use crate::bus::{BusEvent, SubscriptionBus, SubscriptionHandle};
use crate::registry::{self, Inbound};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTab {
    Overview,
    Comments,
    Posts,
    Saved,
}

impl ProfileTab {
    /// Route headings as they appear in `/user/:id/:heading`.
    pub fn parse(heading: &str) -> Option<Self> {
        match heading {
            "overview" => Some(Self::Overview),
            "comments" => Some(Self::Comments),
            "posts" => Some(Self::Posts),
            "saved" => Some(Self::Saved),
            _ => None,
        }
    }
}

/// Read-only construction input from the routing collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteParams {
    pub user_id: UserId,
    pub heading: Option<String>,
}

/// Per-view query state. Mutated only by input handlers and pagination;
/// identical query state always produces an identical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileQuery {
    pub user_id: UserId,
    pub tab: ProfileTab,
    pub sort: SortType,
    pub page: i64,
}

impl ProfileQuery {
    fn from_route(route: &RouteParams) -> Self {
        let tab = route
            .heading
            .as_deref()
            .and_then(ProfileTab::parse)
            .unwrap_or(ProfileTab::Overview);
        Self {
            user_id: route.user_id,
            tab,
            sort: SortType::New,
            page: 1,
        }
    }

    fn to_request(self, limit: i64) -> ClientRequest {
        ClientRequest::GetUserDetails(GetUserDetailsForm {
            user_id: self.user_id,
            sort: self.sort,
            page: self.page,
            limit,
        })
    }
}

/// Per-view result state. Replaced wholesale on every accepted reply; the
/// fields were fetched together and are never patched individually.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileData {
    pub user: Option<UserSummary>,
    pub follows: Vec<CommunityUserView>,
    pub moderates: Vec<CommunityUserView>,
    pub comments: Vec<CommentView>,
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileInput {
    SelectTab(ProfileTab),
    SelectSort(SortType),
    NextPage,
    PrevPage,
}

/// One entry of the merged overview feed, tagged with its kind. The tag is
/// opaque to ordering; both comparators read only the shared field.
#[derive(Debug, Clone, PartialEq)]
pub enum OverviewItem {
    Post(PostView),
    Comment(CommentView),
}

impl OverviewItem {
    pub fn published(&self) -> DateTime<Utc> {
        match self {
            Self::Post(post) => post.published,
            Self::Comment(comment) => comment.published,
        }
    }

    pub fn score(&self) -> i64 {
        match self {
            Self::Post(post) => post.score,
            Self::Comment(comment) => comment.score,
        }
    }
}

pub struct UserProfileController {
    query: ProfileQuery,
    data: ProfileData,
    phase: Phase,
    fetch_limit: i64,
    sink: Arc<dyn RequestSink>,
    bus: Arc<SubscriptionBus>,
    subscription: Option<SubscriptionHandle>,
}

impl UserProfileController {
    /// Subscribes to the bus, derives the initial query from the route and
    /// issues the first request, exactly once. The returned receiver is the
    /// controller's private slice of the shared inbound stream; the embedder
    /// drains it and feeds each event to [`apply`](Self::apply).
    pub async fn open(
        route: RouteParams,
        bus: Arc<SubscriptionBus>,
        sink: Arc<dyn RequestSink>,
        fetch_limit: i64,
    ) -> Result<(Self, mpsc::UnboundedReceiver<BusEvent>)> {
        let query = ProfileQuery::from_route(&route);
        let (subscription, events) = bus.subscribe().await;
        let mut controller = Self {
            query,
            data: ProfileData::default(),
            phase: Phase::Idle,
            fetch_limit,
            sink,
            bus,
            subscription: Some(subscription),
        };
        controller.refetch().await?;
        Ok((controller, events))
    }

    pub fn query(&self) -> &ProfileQuery {
        &self.query
    }

    pub fn data(&self) -> &ProfileData {
        &self.data
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Translates one discrete user input into a query mutation plus a
    /// follow-up request. Every transition except page navigation resets the
    /// page to 1; Prev never goes below page 1 (no request at the floor).
    pub async fn handle_input(&mut self, input: ProfileInput) -> Result<()> {
        match input {
            ProfileInput::SelectTab(tab) => {
                self.query.tab = tab;
                self.query.page = 1;
            }
            ProfileInput::SelectSort(sort) => {
                self.query.sort = sort;
                self.query.page = 1;
            }
            ProfileInput::NextPage => {
                self.query.page += 1;
            }
            ProfileInput::PrevPage => {
                if self.query.page <= 1 {
                    return Ok(());
                }
                self.query.page -= 1;
            }
        }
        self.refetch().await
    }

    /// Folds one bus event. Matching replies replace the result state in a
    /// single assignment; application errors surface without touching state;
    /// replies for other tags, unknown tags and channel closure are ignored.
    pub fn apply(&mut self, event: &BusEvent) -> Option<ViewEffect> {
        let inbound = match event {
            BusEvent::Message(inbound) => inbound,
            // The channel is gone for good; keep whatever rendered last.
            BusEvent::Closed => return None,
        };

        match inbound {
            Inbound::Reply(ServerReply::GetUserDetails(res)) => {
                self.data = fold_user_details(res);
                self.phase = Phase::Ready;
                Some(ViewEffect::Rerender)
            }
            Inbound::Reply(_) => None,
            Inbound::AppError { error, .. } => Some(ViewEffect::Alert(error.message.clone())),
            Inbound::Unknown { op } => {
                debug!(op = %op, "ignoring reply outside the operation catalogue");
                None
            }
        }
    }

    /// The overview aggregation: comments and posts tagged by kind,
    /// concatenated, then ordered by the single comparator the sort mode
    /// picks: published descending for `New`, score descending otherwise.
    pub fn overview_feed(&self) -> Vec<OverviewItem> {
        let mut combined: Vec<OverviewItem> = self
            .data
            .comments
            .iter()
            .cloned()
            .map(OverviewItem::Comment)
            .chain(self.data.posts.iter().cloned().map(OverviewItem::Post))
            .collect();

        match self.query.sort {
            SortType::New => combined.sort_by(|a, b| b.published().cmp(&a.published())),
            _ => combined.sort_by(|a, b| b.score().cmp(&a.score())),
        }
        combined
    }

    /// Teardown: deregister from the bus. Safe to call twice; after this no
    /// event can reach the controller, which is the staleness guarantee.
    pub async fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(&subscription).await;
        }
    }

    async fn refetch(&mut self) -> Result<()> {
        let request = self.query.to_request(self.fetch_limit);
        let payload = registry::encode_request(&request)?;
        self.sink.send(payload).await?;
        self.phase = Phase::Awaiting;
        debug!(
            user_id = self.query.user_id.0,
            page = self.query.page,
            "profile request sent"
        );
        Ok(())
    }
}

/// Pure fold: an accepted reply becomes a complete new result state,
/// installed in one assignment so no reader ever sees a torn mix.
fn fold_user_details(res: &UserDetailsResponse) -> ProfileData {
    ProfileData {
        user: Some(res.user.clone()),
        follows: res.follows.clone(),
        moderates: res.moderates.clone(),
        comments: res.comments.clone(),
        posts: res.posts.clone(),
    }
}

#[cfg(test)]
#[path = "tests/user_tests.rs"]
mod tests;
