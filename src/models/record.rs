//! Typed read-only views over raw export records.
//!
//! Views borrow the underlying mapping and compute every accessor on demand.
//! They never copy or mutate the record.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::RawRecord;
use crate::utils::epoch_to_utc;

/// Origin prepended to permalinks.
pub const SITE_ORIGIN: &str = "https://reddit.com";

/// Field holding the inferred first-export time.
pub const FIRST_EXPORTED_KEY: &str = "first_exported_utc";

/// Common accessors shared by every view.
pub trait RecordView<'a> {
    /// The wrapped raw record.
    fn raw(&self) -> &'a RawRecord;

    /// Record identifier.
    fn id(&self) -> Result<&'a str> {
        str_field(self.raw(), "id")
    }

    /// Creation time on the remote site, always in UTC.
    fn created(&self) -> Result<DateTime<Utc>> {
        timestamp_field(self.raw(), "created_utc")
    }

    /// Inferred time the record first showed up in an export, if known.
    fn first_exported(&self) -> Result<Option<DateTime<Utc>>> {
        match non_null(self.raw(), FIRST_EXPORTED_KEY) {
            Some(_) => timestamp_field(self.raw(), FIRST_EXPORTED_KEY).map(Some),
            None => Ok(None),
        }
    }
}

/// A saved post or comment.
#[derive(Debug, Clone, Copy)]
pub struct Save<'a> {
    raw: &'a RawRecord,
}

impl<'a> Save<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    pub fn url(&self) -> Result<String> {
        permalink_url(self.raw)
    }

    pub fn text(&self) -> Result<&'a str> {
        record_text(self.raw)
    }

    /// Saved comments carry their post's title in `link_title`.
    pub fn title(&self) -> Result<&'a str> {
        match non_null(self.raw, "link_title") {
            Some(_) => str_field(self.raw, "link_title"),
            None => str_field(self.raw, "title"),
        }
    }

    pub fn subreddit(&self) -> Result<&'a str> {
        subreddit_name(self.raw)
    }
}

/// A comment written by the user.
#[derive(Debug, Clone, Copy)]
pub struct Comment<'a> {
    raw: &'a RawRecord,
}

impl<'a> Comment<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    pub fn url(&self) -> Result<String> {
        permalink_url(self.raw)
    }

    pub fn text(&self) -> Result<&'a str> {
        record_text(self.raw)
    }

    pub fn subreddit(&self) -> Result<&'a str> {
        subreddit_name(self.raw)
    }
}

/// A post submitted by the user.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    raw: &'a RawRecord,
}

impl<'a> Submission<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    pub fn url(&self) -> Result<String> {
        permalink_url(self.raw)
    }

    pub fn text(&self) -> Result<&'a str> {
        record_text(self.raw)
    }

    pub fn title(&self) -> Result<&'a str> {
        str_field(self.raw, "title")
    }

    pub fn subreddit(&self) -> Result<&'a str> {
        subreddit_name(self.raw)
    }
}

/// An upvoted (or downvoted) post.
#[derive(Debug, Clone, Copy)]
pub struct Upvote<'a> {
    raw: &'a RawRecord,
}

impl<'a> Upvote<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    pub fn url(&self) -> Result<String> {
        permalink_url(self.raw)
    }

    pub fn text(&self) -> Result<&'a str> {
        record_text(self.raw)
    }

    pub fn title(&self) -> Result<&'a str> {
        str_field(self.raw, "title")
    }

    pub fn subreddit(&self) -> Result<&'a str> {
        subreddit_name(self.raw)
    }
}

/// A subscribed subreddit.
#[derive(Debug, Clone, Copy)]
pub struct Subreddit<'a> {
    raw: &'a RawRecord,
}

impl<'a> Subreddit<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    /// Subreddits keep their relative link in `url`, e.g. `/r/rust/`.
    pub fn url(&self) -> Result<String> {
        Ok(site_url(str_field(self.raw, "url")?))
    }

    pub fn display_name(&self) -> Result<&'a str> {
        str_field(self.raw, "display_name")
    }

    pub fn title(&self) -> Result<&'a str> {
        str_field(self.raw, "title")
    }
}

/// A custom feed grouping several subreddits.
#[derive(Debug, Clone, Copy)]
pub struct Multireddit<'a> {
    raw: &'a RawRecord,
}

impl<'a> Multireddit<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    /// Multireddits are identified by their path, they have no stable id.
    pub fn path(&self) -> Result<&'a str> {
        str_field(self.raw, "path")
    }

    pub fn url(&self) -> Result<String> {
        Ok(site_url(self.path()?))
    }

    pub fn display_name(&self) -> Result<&'a str> {
        str_field(self.raw, "display_name")
    }

    /// Names of the member subreddits.
    pub fn subreddits(&self) -> Result<Vec<&'a str>> {
        let members = field(self.raw, "subreddits")?
            .as_array()
            .ok_or_else(|| AppError::malformed("subreddits", "expected an array"))?;

        members
            .iter()
            .map(|member| match member {
                Value::String(name) => Ok(name.as_str()),
                Value::Object(obj) => str_field(obj, "display_name"),
                other => Err(AppError::malformed(
                    "subreddits",
                    format!("unexpected member {other}"),
                )),
            })
            .collect()
    }
}

impl<'a> RecordView<'a> for Multireddit<'a> {
    fn raw(&self) -> &'a RawRecord {
        self.raw
    }

    fn id(&self) -> Result<&'a str> {
        self.path()
    }
}

/// The user's own account.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    raw: &'a RawRecord,
}

impl<'a> Profile<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    pub fn name(&self) -> Result<&'a str> {
        str_field(self.raw, "name")
    }

    pub fn link_karma(&self) -> Result<i64> {
        i64_field(self.raw, "link_karma")
    }

    pub fn comment_karma(&self) -> Result<i64> {
        i64_field(self.raw, "comment_karma")
    }
}

/// A message from the inbox.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    raw: &'a RawRecord,
}

impl<'a> Message<'a> {
    pub fn new(raw: &'a RawRecord) -> Self {
        Self { raw }
    }

    /// Sender, `None` for deleted accounts and system messages.
    pub fn author(&self) -> Result<Option<&'a str>> {
        match non_null(self.raw, "author") {
            None => Ok(None),
            Some(Value::String(name)) => Ok(Some(name.as_str())),
            Some(Value::Object(obj)) => str_field(obj, "name").map(Some),
            Some(other) => Err(AppError::malformed(
                "author",
                format!("unexpected value {other}"),
            )),
        }
    }

    pub fn subject(&self) -> Result<&'a str> {
        str_field(self.raw, "subject")
    }

    pub fn text(&self) -> Result<&'a str> {
        record_text(self.raw)
    }
}

macro_rules! impl_record_view {
    ($($view:ident),+ $(,)?) => {
        $(
            impl<'a> RecordView<'a> for $view<'a> {
                fn raw(&self) -> &'a RawRecord {
                    self.raw
                }
            }
        )+
    };
}

impl_record_view!(Save, Comment, Submission, Upvote, Subreddit, Profile, Message);

/// Text of a record: `body` for comments, `selftext` for posts.
///
/// The two fields are mutually exclusive; a record carrying both is rejected.
pub fn record_text(raw: &RawRecord) -> Result<&str> {
    match (non_null(raw, "body"), non_null(raw, "selftext")) {
        (Some(_), Some(_)) => Err(AppError::AmbiguousTextFields {
            id: raw
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<unknown>")
                .to_string(),
        }),
        (Some(_), None) => str_field(raw, "body"),
        (None, Some(_)) => str_field(raw, "selftext"),
        (None, None) => Err(AppError::missing("body")),
    }
}

fn permalink_url(raw: &RawRecord) -> Result<String> {
    Ok(site_url(str_field(raw, "permalink")?))
}

fn site_url(suffix: &str) -> String {
    format!("{SITE_ORIGIN}{suffix}")
}

fn subreddit_name(raw: &RawRecord) -> Result<&str> {
    match field(raw, "subreddit")? {
        Value::String(name) => Ok(name.as_str()),
        Value::Object(obj) => str_field(obj, "display_name"),
        other => Err(AppError::malformed(
            "subreddit",
            format!("unexpected value {other}"),
        )),
    }
}

fn non_null<'a>(raw: &'a RawRecord, name: &str) -> Option<&'a Value> {
    raw.get(name).filter(|v| !v.is_null())
}

fn field<'a>(raw: &'a RawRecord, name: &str) -> Result<&'a Value> {
    raw.get(name).ok_or_else(|| AppError::missing(name))
}

fn str_field<'a>(raw: &'a RawRecord, name: &str) -> Result<&'a str> {
    field(raw, name)?
        .as_str()
        .ok_or_else(|| AppError::malformed(name, "expected a string"))
}

fn i64_field(raw: &RawRecord, name: &str) -> Result<i64> {
    let value = field(raw, name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .ok_or_else(|| AppError::malformed(name, "expected a number"))
}

fn timestamp_field(raw: &RawRecord, name: &str) -> Result<DateTime<Utc>> {
    let secs = field(raw, name)?
        .as_f64()
        .ok_or_else(|| AppError::malformed(name, "expected epoch seconds"))?;
    epoch_to_utc(secs).ok_or_else(|| AppError::malformed(name, format!("{secs} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_save_accessors() {
        let raw = record(json!({
            "id": "abc",
            "created_utc": 1_500_000_000.0,
            "permalink": "/r/rust/comments/abc/x/",
            "link_title": "Parent post",
            "title": "ignored",
            "body": "nice",
            "selftext": null,
            "subreddit": {"display_name": "rust"},
        }));
        let save = Save::new(&raw);

        assert_eq!(save.id().unwrap(), "abc");
        assert_eq!(save.url().unwrap(), "https://reddit.com/r/rust/comments/abc/x/");
        assert_eq!(save.text().unwrap(), "nice");
        assert_eq!(save.title().unwrap(), "Parent post");
        assert_eq!(save.subreddit().unwrap(), "rust");
        assert_eq!(save.created().unwrap().timestamp(), 1_500_000_000);
    }

    #[test]
    fn test_save_title_fallback() {
        let null_link = record(json!({"title": "t", "link_title": null}));
        assert_eq!(Save::new(&null_link).title().unwrap(), "t");

        let no_link = record(json!({"title": "t"}));
        assert_eq!(Save::new(&no_link).title().unwrap(), "t");
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let raw = record(json!({
            "id": "w",
            "title": 7,
            "created_utc": "x",
            "subreddit": 3,
        }));
        let save = Save::new(&raw);

        assert!(matches!(
            save.created(),
            Err(AppError::MalformedRecord { field, .. }) if field == "created_utc"
        ));
        assert!(matches!(
            save.subreddit(),
            Err(AppError::MalformedRecord { field, .. }) if field == "subreddit"
        ));
        assert!(matches!(
            save.title(),
            Err(AppError::MalformedRecord { field, .. }) if field == "title"
        ));
    }

    #[test]
    fn test_created_is_utc() {
        let raw = record(json!({"created_utc": 0}));
        let created = Comment::new(&raw).created().unwrap();
        assert_eq!(created.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_text_mutual_exclusivity() {
        let raw = record(json!({"id": "x", "body": "a", "selftext": "b"}));
        assert!(matches!(
            Submission::new(&raw).text(),
            Err(AppError::AmbiguousTextFields { id }) if id == "x"
        ));
        // Deterministic: fails the same way every time.
        assert!(Submission::new(&raw).text().is_err());
    }

    #[test]
    fn test_text_selftext_only() {
        let raw = record(json!({"selftext": "post body"}));
        assert_eq!(Upvote::new(&raw).text().unwrap(), "post body");

        let empty = record(json!({}));
        assert!(matches!(
            Upvote::new(&empty).text(),
            Err(AppError::MissingField { .. })
        ));
    }

    #[test]
    fn test_missing_title() {
        let raw = record(json!({"id": "s1"}));
        assert!(matches!(
            Submission::new(&raw).title(),
            Err(AppError::MissingField { field }) if field == "title"
        ));
    }

    #[test]
    fn test_subreddit_url() {
        let raw = record(json!({"display_name": "rust", "url": "/r/rust/"}));
        let sub = Subreddit::new(&raw);
        assert_eq!(sub.url().unwrap(), "https://reddit.com/r/rust/");
        assert_eq!(sub.display_name().unwrap(), "rust");
    }

    #[test]
    fn test_multireddit_members() {
        let raw = record(json!({
            "path": "/user/me/m/langs",
            "display_name": "langs",
            "subreddits": [{"display_name": "rust"}, "haskell"],
        }));
        let multi = Multireddit::new(&raw);
        assert_eq!(multi.id().unwrap(), "/user/me/m/langs");
        assert_eq!(multi.subreddits().unwrap(), ["rust", "haskell"]);
    }

    #[test]
    fn test_profile_karma() {
        let raw = record(json!({"name": "me", "link_karma": 10, "comment_karma": 25.0}));
        let profile = Profile::new(&raw);
        assert_eq!(profile.name().unwrap(), "me");
        assert_eq!(profile.link_karma().unwrap(), 10);
        assert_eq!(profile.comment_karma().unwrap(), 25);
    }

    #[test]
    fn test_first_exported() {
        let raw = record(json!({"id": "1", "first_exported_utc": 1_700_000_000.25}));
        let first = Comment::new(&raw).first_exported().unwrap().unwrap();
        assert_eq!(first.timestamp(), 1_700_000_000);

        let bare = record(json!({"id": "1"}));
        assert!(Comment::new(&bare).first_exported().unwrap().is_none());
    }

    #[test]
    fn test_message_author() {
        let raw = record(json!({"author": null, "subject": "hi", "body": "text"}));
        let msg = Message::new(&raw);
        assert_eq!(msg.author().unwrap(), None);
        assert_eq!(msg.subject().unwrap(), "hi");
    }
}
