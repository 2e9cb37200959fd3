use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::string_or_number;

macro_rules! string_setters {
    ($($(#[$doc:meta])* $field:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.$field = Some(value.into());
                self
            }
        )*
    };
}

macro_rules! list_setters {
    ($($(#[$doc:meta])* $field:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $field<I, S>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.$field = Some(values.into_iter().map(Into::into).collect());
                self
            }
        )*
    };
}

pub(crate) use {list_setters, string_setters};

/// Filters for `POST data_files/api_search`.
///
/// Every field is optional. `None` is omitted from the request body while
/// `Some("")`/`Some(vec![])` is sent as given, so the server sees exactly what
/// was set. Enumerated values (`stati`, `access_rights_types`, ...) are passed
/// through untouched; HIEv decides what is legal.
///
/// ```
/// use hiev::SearchCriteria;
///
/// let criteria = SearchCriteria::new()
///     .experiments(["39"])
///     .from_date("2016-08-01")
///     .stati(["RAW", "CLEANSED"]);
/// assert_eq!(criteria.from_date.as_deref(), Some("2016-08-01"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stati: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_stati: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_rights_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_formats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpublished: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_websites: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_to_date: Option<String>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    string_setters! {
        /// "Date -> From Date", e.g. `2013-01-01`.
        from_date,
        /// "Date -> To Date".
        to_date,
        /// Filename; HIEv matches it as a substring.
        filename,
        description,
        file_id,
        id,
        /// Only meaningful together with `stati(["PACKAGE"])`.
        published_date,
        /// "Added By"; ask an administrator for uploader ids.
        uploader_id,
        /// "Date Added -> From Date".
        upload_from_date,
        /// "Date Added -> To Date".
        upload_to_date,
    }

    list_setters! {
        /// File types, e.g. `RAW`, `CLEANSED`, `PACKAGE`.
        stati,
        /// e.g. `COMPLETE`, `WORKING`.
        automation_stati,
        /// `Open`, `Conditional`, `Restricted`.
        access_rights_types,
        /// e.g. `TOA5`, `Unknown`, `audio/mpeg`.
        file_formats,
        /// `["true"]` selects published packages.
        published,
        /// `["true"]` selects unpublished packages.
        unpublished,
        /// Tag ids.
        tags,
        labels,
        grant_numbers,
        related_websites,
        /// Facility ids.
        facilities,
        /// Experiment ids within the selected facilities.
        experiments,
        /// Column names, e.g. `SoilTempProbe_Avg(1)`.
        variables,
    }
}

/// Body of a search request: the criteria plus the token, which always travels.
#[derive(Debug, Serialize)]
pub(crate) struct SearchPayload<'a> {
    pub(crate) auth_token: &'a str,
    #[serde(flatten)]
    pub(crate) criteria: &'a SearchCriteria,
}

/// One file as returned by the search endpoint.
///
/// Only `file_id`, `url` and `updated_at` are interpreted; everything else the
/// server sends is kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileRecord {
    /// Looks up a server-defined attribute, e.g. `filename` or `experiment`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }
}

/// Result of [`Client::search_with`](crate::Client::search_with).
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    Records(Vec<FileRecord>),
    Ids(Vec<String>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Records(r) => r.len(),
            SearchResults::Ids(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers in response order, whichever shape was requested.
    pub fn into_ids(self) -> Vec<String> {
        match self {
            SearchResults::Records(records) => records_to_ids(records),
            SearchResults::Ids(ids) => ids,
        }
    }
}

pub(crate) fn records_to_ids(records: Vec<FileRecord>) -> Vec<String> {
    records.into_iter().map(|r| r.file_id).collect()
}

/// Picks the record with the greatest `updated_at`.
///
/// Timestamps are compared as strings (HIEv emits ISO 8601). On ties the
/// earliest record in `records` wins; a missing `updated_at` sorts lowest.
pub fn select_latest(records: &[FileRecord]) -> Option<&FileRecord> {
    records.iter().reduce(|best, candidate| {
        if candidate.updated_at > best.updated_at {
            candidate
        } else {
            best
        }
    })
}
