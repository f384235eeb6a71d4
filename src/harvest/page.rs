use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Duplicate-free collection of extracted contact values.
///
/// Iterates in sorted order so anything rendered from it is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactSet(BTreeSet<String>);

impl ContactSet {
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, value: &str) -> bool {
        self.0.contains(value)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ContactSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub website_url: String,
    pub page_title: String,
    pub industry_sector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInformation {
    pub emails: ContactSet,
    pub phone_numbers: ContactSet,
    pub addresses: Vec<String>,
}

/// Structured contact data harvested from one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedPage {
    pub metadata: PageMetadata,
    pub contact_information: ContactInformation,
    pub social_media: Vec<String>,
}
