use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::Trophy;

/// Top-level envelope for a listing endpoint, generic over the child
/// payload. Listings are the service's paginated-collection shape: saved
/// posts, hot posts in a subreddit, a user's comment history and so on all
/// come back as `{"data": {"children": [{"data": T}, ...]}}`.
#[derive(Deserialize, Debug)]
pub struct Listing<T> {
    /// The kind of object this is, e.g. "Listing".
    #[serde(default)]
    pub kind: String,
    pub data: ListingData<T>,
}

/// The contents of a listing: pagination cursors plus the ordered children.
#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListingData<T> {
    /// A modhash (essentially a CSRF token) generated for this request.
    /// Only cookie-authenticated responses carry one.
    #[serde(default)]
    pub modhash: Option<String>,
    #[serde(default)]
    pub dist: Option<i64>,
    /// Cursor of the item after this page, for pagination.
    #[serde(default)]
    pub after: Option<String>,
    /// Cursor of the item before this page.
    #[serde(default)]
    pub before: Option<String>,
    /// The children of this listing, in ranking order. Absent on empty
    /// responses, which decodes as an empty page rather than an error.
    #[serde(default)]
    pub children: Vec<Thing<T>>,
}

/// A `kind`/`data` pair. Every object the API hands out is wrapped in one.
#[derive(Deserialize, Debug)]
pub struct Thing<T> {
    /// Two-letter kind tag: t1 = comment, t3 = submission, t5 = subreddit.
    #[serde(default)]
    pub kind: String,
    pub data: T,
}

impl<T> Listing<T> {
    /// Unwraps the listing into its child payloads, preserving order —
    /// order carries the page and ranking semantics of the endpoint.
    pub fn into_children(self) -> Vec<T> {
        self.data.children.into_iter().map(|child| child.data).collect()
    }
}

/// Decodes a listing envelope out of a raw JSON value and unwraps its
/// children. A malformed child fails the whole listing; partial pages are
/// never returned.
pub fn parse_listing<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, serde_json::Error> {
    let listing: Listing<T> = serde_json::from_value(value)?;
    Ok(listing.into_children())
}

/// Envelope of the trophies endpoints, which nest their things under
/// `data.trophies` instead of `data.children`.
#[derive(Deserialize, Debug)]
pub struct TrophyList {
    pub data: TrophyListData,
}

#[derive(Deserialize, Debug)]
pub struct TrophyListData {
    #[serde(default)]
    pub trophies: Vec<Thing<Trophy>>,
}

impl TrophyList {
    pub fn into_trophies(self) -> Vec<Trophy> {
        self.data.trophies.into_iter().map(|t| t.data).collect()
    }
}
