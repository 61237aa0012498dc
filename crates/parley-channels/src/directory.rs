use crate::http::{client, ensure_success};
use async_trait::async_trait;
use parley_core::{ClientConfig, Contact, Credential, Identity, ParleyError, ParleyResult};
use serde::Deserialize;
use std::collections::HashSet;

/// Source of selectable user identities.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn list(&self) -> ParleyResult<Vec<Identity>>;
}

#[derive(Debug, Deserialize)]
struct DirectoryEntry {
    username: String,
}

/// The directory answers either `{"users": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DirectoryListing {
    Wrapped { users: Vec<DirectoryEntry> },
    Bare(Vec<DirectoryEntry>),
}

impl DirectoryListing {
    fn into_identities(self) -> Vec<Identity> {
        let entries = match self {
            DirectoryListing::Wrapped { users } => users,
            DirectoryListing::Bare(users) => users,
        };
        entries.into_iter().map(|e| Identity::new(e.username)).collect()
    }
}

/// HTTP client for the user directory.
pub struct HttpContactDirectory {
    http: reqwest::Client,
    url: String,
    credential: Credential,
}

impl HttpContactDirectory {
    pub fn new(url: impl Into<String>, credential: Credential, http: reqwest::Client) -> Self {
        Self {
            http,
            url: url.into(),
            credential,
        }
    }

    pub fn from_config(config: &ClientConfig, credential: Credential) -> ParleyResult<Self> {
        Ok(Self::new(
            config.api_url(&config.endpoints.contacts),
            credential,
            client(config.request_timeout())?,
        ))
    }
}

#[async_trait]
impl ContactDirectory for HttpContactDirectory {
    async fn list(&self) -> ParleyResult<Vec<Identity>> {
        let response = self
            .http
            .get(&self.url)
            .bearer_auth(self.credential.bearer())
            .send()
            .await
            .map_err(|e| ParleyError::Directory(format!("directory request failed: {e}")))?;

        let listing: DirectoryListing = ensure_success(response, ParleyError::Directory)
            .await?
            .json()
            .await
            .map_err(|e| ParleyError::Directory(format!("unexpected directory listing: {e}")))?;
        Ok(listing.into_identities())
    }
}

/// Selectable contacts: the assistant first, then every directory entry
/// except the local user, in directory order without duplicates.
pub fn roster(
    entries: impl IntoIterator<Item = Identity>,
    me: &Identity,
    assistant: &Identity,
) -> Vec<Contact> {
    let mut seen: HashSet<Identity> = HashSet::from([me.clone(), assistant.clone()]);
    let mut contacts = vec![Contact::assistant(assistant.clone())];
    for identity in entries {
        if identity.as_str().trim().is_empty() || !seen.insert(identity.clone()) {
            continue;
        }
        contacts.push(Contact::human(identity));
    }
    contacts
}

/// Fetch the directory and build the roster.
pub async fn load_roster(
    directory: &dyn ContactDirectory,
    me: &Identity,
    assistant: &Identity,
) -> ParleyResult<Vec<Contact>> {
    let entries = directory.list().await?;
    let contacts = roster(entries, me, assistant);
    tracing::debug!(count = contacts.len(), "Roster loaded");
    Ok(contacts)
}
