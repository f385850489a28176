use serde::{Deserialize, Serialize};

/// A job listing suggested to a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "applyUrl", default)]
    pub apply_url: String,
}

/// Gives every listing a non-empty, unique id; the model does not always supply one.
pub fn ensure_unique_ids(listings: &mut [JobListing], seed: i64) {
    let mut seen = std::collections::HashSet::new();
    for (index, listing) in listings.iter_mut().enumerate() {
        if listing.id.trim().is_empty() || !seen.insert(listing.id.clone()) {
            listing.id = format!("job-{seed}-{index}");
            seen.insert(listing.id.clone());
        }
    }
}
