use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::invariants::{validate_flag_name, validate_status};
use crate::domain::{DomainError, DomainResult};

/// Name of a boolean status attribute ("read", "starred", ...)
///
/// The set of flags is open-ended; the constructor only checks that the
/// name is a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusFlag(String);

impl StatusFlag {
    pub const READ: &'static str = "read";
    pub const STARRED: &'static str = "starred";
    pub const USER_DELETED: &'static str = "userDeleted";

    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        validate_flag_name(&name)?;
        Ok(Self(name))
    }

    pub fn read() -> Self {
        Self(Self::READ.to_string())
    }

    pub fn starred() -> Self {
        Self(Self::STARRED.to_string())
    }

    pub fn user_deleted() -> Self {
        Self(Self::USER_DELETED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StatusFlag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw persisted form of a status.
///
/// Every column is optional: a NULL or non-text column shows up as `None`
/// and makes the row undecodable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRow {
    pub article_id: Option<String>,
    /// RFC 3339 timestamp
    pub date_arrived: Option<String>,
    /// JSON object of flag name -> bool
    pub flags: Option<String>,
}

/// Mutable status attached to an article.
///
/// Records are shared (`Arc<ArticleStatus>`) between the status cache and
/// every resolved article, so flags use interior mutability: a flag change
/// is visible to all holders immediately.
///
/// Identity is the article id. Two records with the same id are equal no
/// matter what their flags say.
#[derive(Debug)]
pub struct ArticleStatus {
    /// Immutable key
    article_id: String,

    /// When the article was first seen (immutable)
    date_arrived: DateTime<Utc>,

    /// Flag name -> value. Absent means false.
    flags: RwLock<BTreeMap<String, bool>>,
}

impl ArticleStatus {
    /// Create a fresh status with every flag unset
    pub fn new(article_id: impl Into<String>, date_arrived: DateTime<Utc>) -> Self {
        Self::with_flags(article_id, date_arrived, BTreeMap::new())
    }

    pub fn with_flags(
        article_id: impl Into<String>,
        date_arrived: DateTime<Utc>,
        flags: BTreeMap<String, bool>,
    ) -> Self {
        Self {
            article_id: article_id.into(),
            date_arrived,
            flags: RwLock::new(flags),
        }
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn date_arrived(&self) -> DateTime<Utc> {
        self.date_arrived
    }

    pub fn flag(&self, flag: &StatusFlag) -> bool {
        self.read_flags().get(flag.as_str()).copied().unwrap_or(false)
    }

    pub fn set_flag(&self, flag: &StatusFlag, value: bool) {
        self.write_flags().insert(flag.as_str().to_string(), value);
    }

    pub fn is_read(&self) -> bool {
        self.flag(&StatusFlag::read())
    }

    pub fn is_starred(&self) -> bool {
        self.flag(&StatusFlag::starred())
    }

    /// Copy of the current flag map
    pub fn flags(&self) -> BTreeMap<String, bool> {
        self.read_flags().clone()
    }

    /// Decode a persisted row.
    ///
    /// Returns `None` for a missing column, an empty id, an unparsable
    /// timestamp, or flags that are not a JSON object of booleans.
    pub fn from_row(row: &StatusRow) -> Option<Self> {
        let article_id = row.article_id.as_deref()?;
        let date_arrived = DateTime::parse_from_rfc3339(row.date_arrived.as_deref()?)
            .ok()?
            .with_timezone(&Utc);
        let flags: BTreeMap<String, bool> = serde_json::from_str(row.flags.as_deref()?).ok()?;

        let status = Self::with_flags(article_id, date_arrived, flags);
        validate_status(&status).ok()?;
        Some(status)
    }

    /// Encode for persistence
    pub fn to_row(&self) -> StatusRow {
        let flags = serde_json::to_string(&*self.read_flags())
            .unwrap_or_else(|_| String::from("{}"));

        StatusRow {
            article_id: Some(self.article_id.clone()),
            date_arrived: Some(self.date_arrived.to_rfc3339()),
            flags: Some(flags),
        }
    }

    fn read_flags(&self) -> RwLockReadGuard<'_, BTreeMap<String, bool>> {
        self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_flags(&self) -> RwLockWriteGuard<'_, BTreeMap<String, bool>> {
        self.flags.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for ArticleStatus {
    fn eq(&self, other: &Self) -> bool {
        self.article_id == other.article_id
    }
}

impl Eq for ArticleStatus {}

impl Hash for ArticleStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.article_id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(article_id: Option<&str>, date_arrived: Option<&str>, flags: Option<&str>) -> StatusRow {
        StatusRow {
            article_id: article_id.map(str::to_string),
            date_arrived: date_arrived.map(str::to_string),
            flags: flags.map(str::to_string),
        }
    }

    #[test]
    fn test_new_status_has_all_flags_false() {
        let status = ArticleStatus::new("a1", Utc::now());
        assert!(!status.is_read());
        assert!(!status.is_starred());
        assert!(!status.flag(&StatusFlag::user_deleted()));
        assert!(status.flags().is_empty());
    }

    #[test]
    fn test_set_flag_is_visible_through_shared_handle() {
        let status = std::sync::Arc::new(ArticleStatus::new("a1", Utc::now()));
        let other = std::sync::Arc::clone(&status);

        status.set_flag(&StatusFlag::read(), true);

        assert!(other.is_read());
    }

    #[test]
    fn test_equality_ignores_flags() {
        let now = Utc::now();
        let a = ArticleStatus::new("a1", now);
        let b = ArticleStatus::new("a1", now);
        b.set_flag(&StatusFlag::starred(), true);

        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b), "same id must deduplicate");
    }

    #[test]
    fn test_decode_valid_row() {
        let decoded = ArticleStatus::from_row(&row(
            Some("a1"),
            Some("2024-05-08T10:00:00+00:00"),
            Some(r#"{"read":true,"starred":false}"#),
        ))
        .unwrap();

        assert_eq!(decoded.article_id(), "a1");
        assert!(decoded.is_read());
        assert!(!decoded.is_starred());
        assert_eq!(decoded.date_arrived().to_rfc3339(), "2024-05-08T10:00:00+00:00");
    }

    #[test]
    fn test_decode_rejects_malformed_rows() {
        let date = Some("2024-05-08T10:00:00+00:00");

        assert!(ArticleStatus::from_row(&row(None, date, Some("{}"))).is_none());
        assert!(ArticleStatus::from_row(&row(Some(""), date, Some("{}"))).is_none());
        assert!(ArticleStatus::from_row(&row(Some("a1"), None, Some("{}"))).is_none());
        assert!(ArticleStatus::from_row(&row(Some("a1"), Some("yesterday"), Some("{}"))).is_none());
        assert!(ArticleStatus::from_row(&row(Some("a1"), date, None)).is_none());
        assert!(ArticleStatus::from_row(&row(Some("a1"), date, Some("not json"))).is_none());
        assert!(ArticleStatus::from_row(&row(Some("a1"), date, Some(r#"{"read":1}"#))).is_none());
    }

    #[test]
    fn test_encoded_row_decodes_back() {
        let status = ArticleStatus::new("a1", Utc::now());
        status.set_flag(&StatusFlag::starred(), true);

        let decoded = ArticleStatus::from_row(&status.to_row()).unwrap();

        assert_eq!(decoded, status);
        assert!(decoded.is_starred());
        assert_eq!(decoded.date_arrived(), status.date_arrived());
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(StatusFlag::read().as_str(), "read");
        assert_eq!(StatusFlag::user_deleted().to_string(), "userDeleted");
        assert!("starred".parse::<StatusFlag>().is_ok());
        assert!(StatusFlag::new("read'; DROP TABLE statuses; --").is_err());
    }
}
