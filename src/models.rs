//! Core data models used throughout Instruction Finder.
//!
//! These types represent the catalog entries returned by the document
//! repository, the categories users pick from, and the identities the
//! access guard compares against.

use serde::Deserialize;
use std::fmt;

/// Identity of a chat user, as assigned by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a repository folder.
///
/// The repository only ever sees it as a string, but config files may
/// write folder ids as bare integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FolderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => FolderId(n.to_string()),
            Raw::Str(s) => FolderId(s),
        })
    }
}

/// A single catalog entry from the repository listing.
///
/// Field names follow the listing payload verbatim (`NAME`, `DOWNLOAD_URL`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "DOWNLOAD_URL")]
    pub download_url: String,
}

impl Item {
    pub fn new(name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            download_url: download_url.into(),
        }
    }
}

/// One raw entry of a listing page.
///
/// Listings mix documents with other entries (subfolders carry no
/// `DOWNLOAD_URL`), so every field is optional here and only complete
/// entries become [`Item`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingEntry {
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,
    #[serde(rename = "DOWNLOAD_URL", default)]
    pub download_url: Option<String>,
    #[serde(rename = "TYPE", default)]
    pub kind: Option<String>,
}

impl ListingEntry {
    pub fn into_item(self) -> Option<Item> {
        match (self.name, self.download_url) {
            (Some(name), Some(download_url)) => Some(Item { name, download_url }),
            (name, _) => {
                tracing::debug!(
                    name = name.as_deref().unwrap_or("<unnamed>"),
                    kind = self.kind.as_deref().unwrap_or("<none>"),
                    "skipping listing entry without name or download url"
                );
                None
            }
        }
    }
}

/// One page of the repository listing.
///
/// An absent `result` field is treated the same as an empty one: both mark
/// the end of the listing. A page whose entries are all skipped is not the
/// end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub result: Option<Vec<ListingEntry>>,
}

impl ListingPage {
    pub fn is_end(&self) -> bool {
        self.result.as_ref().map_or(true, |entries| entries.is_empty())
    }

    pub fn into_items(self) -> Vec<Item> {
        self.result
            .unwrap_or_default()
            .into_iter()
            .filter_map(ListingEntry::into_item)
            .collect()
    }
}

impl From<Vec<Item>> for ListingPage {
    fn from(items: Vec<Item>) -> Self {
        let entries = items
            .into_iter()
            .map(|item| ListingEntry {
                name: Some(item.name),
                download_url: Some(item.download_url),
                kind: None,
            })
            .collect();
        Self {
            result: Some(entries),
        }
    }
}

/// A user-facing grouping (a train series) mapped to repository folders.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub label: String,
    pub folder_ids: Vec<FolderId>,
}
