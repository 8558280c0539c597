//! Filesystem-backed mail spool
//!
//! Layout under the spool root:
//!
//! ```text
//! <root>/
//!   bob/
//!     .mailbox.json        # {"next_id": 3}
//!     1_hi.msg
//!     2_lunch-on-friday.msg
//! ```
//!
//! The numeric prefix before the first `_` is the message id. Listing,
//! reading and deleting all recover the id from the file name, so the
//! three operations always agree on identity.
//!
//! Each mailbox has a reader/writer lock. Delivery (id allocation plus
//! file write) and removal take it exclusively; listing and reading
//! share it. Message files are written under a hidden temporary name
//! and renamed into place, so a reader never sees a partial message.

use crate::error::{Error, Result};
use crate::mail::Mail;
use crate::username::Username;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

const MESSAGE_EXT: &str = ".msg";
const ID_DELIMITER: char = '_';
const MAILBOX_META: &str = ".mailbox.json";
const MAX_SLUG_LEN: usize = 24;

/// A message file inside a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Id parsed from the file name prefix.
    pub id: u64,
    /// The human-readable remainder of the file name.
    pub name: String,
    pub path: PathBuf,
}

/// Persisted per-mailbox counter.
#[derive(Debug, Serialize, Deserialize)]
struct MailboxMeta {
    next_id: u64,
}

#[derive(Debug, Default)]
struct MailboxState {
    /// `None` until the first write access seeds it.
    next_id: Option<u64>,
}

/// The spool store. Construct once per server and share it via `Arc`.
#[derive(Debug)]
pub struct Spool {
    root: PathBuf,
    mailboxes: Mutex<HashMap<Username, Arc<RwLock<MailboxState>>>>,
}

impl Spool {
    /// Open (creating if needed) the spool rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool root cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!("Spool opened at {}", root.display());
        Ok(Self {
            root,
            mailboxes: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a mailbox directory exists for `user`.
    pub async fn mailbox_exists(&self, user: &Username) -> bool {
        fs::metadata(self.mailbox_dir(user))
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    /// Create the mailbox directory for `user` if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_mailbox(&self, user: &Username) -> Result<PathBuf> {
        let dir = self.mailbox_dir(user);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Reserve the next message id for `user`.
    ///
    /// Ids are strictly increasing per mailbox and are never handed out
    /// twice, even after the message holding the highest id is removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdsExhausted`] once the id space is used up, or an
    /// error if the counter file cannot be read or written.
    pub async fn next_id(&self, user: &Username) -> Result<u64> {
        let lock = self.lock_for(user);
        let mut state = lock.write().await;
        let dir = self.ensure_mailbox(user).await?;
        allocate_id(&dir, user, &mut state).await
    }

    /// Store `mail` in `user`'s mailbox under an already reserved `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if a message already holds `id`, or
    /// an error if the file cannot be written.
    pub async fn save(&self, user: &Username, id: u64, mail: &Mail) -> Result<StoredMessage> {
        let lock = self.lock_for(user);
        let _state = lock.write().await;
        let dir = self.ensure_mailbox(user).await?;
        write_message(&dir, user, id, mail).await
    }

    /// Allocate an id and store `mail` in its receiver's mailbox as one
    /// step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdsExhausted`] once the id space is used up, or an
    /// error if the counter or message file cannot be written.
    pub async fn deliver(&self, mail: &Mail) -> Result<StoredMessage> {
        let user = mail.receiver();
        let lock = self.lock_for(user);
        let mut state = lock.write().await;
        let dir = self.ensure_mailbox(user).await?;
        let id = allocate_id(&dir, user, &mut state).await?;
        write_message(&dir, user, id, mail).await
    }

    /// All messages in `user`'s mailbox, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMailbox`] if `user` has no mailbox, or an
    /// error if the directory cannot be read.
    pub async fn list(&self, user: &Username) -> Result<Vec<StoredMessage>> {
        let lock = self.existing_lock(user).await?;
        let _state = lock.read().await;
        let dir = self.mailbox_dir(user);
        scan(&dir).await
    }

    /// Locate message `id` in `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMailbox`] or [`Error::MessageNotFound`].
    pub async fn find_by_id(&self, user: &Username, id: u64) -> Result<StoredMessage> {
        let lock = self.existing_lock(user).await?;
        let _state = lock.read().await;
        let dir = self.mailbox_dir(user);
        find(&dir, user, id).await
    }

    /// Load and parse message `id` from `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMailbox`] or [`Error::MessageNotFound`], and
    /// [`Error::Malformed`] if the stored file cannot be parsed.
    pub async fn read(&self, user: &Username, id: u64) -> Result<Mail> {
        let lock = self.existing_lock(user).await?;
        let _state = lock.read().await;
        let dir = self.mailbox_dir(user);
        let stored = find(&dir, user, id).await?;
        let content = fs::read_to_string(&stored.path).await?;
        Mail::parse(&content)
    }

    /// Delete message `id` from `user`'s mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMailbox`] or [`Error::MessageNotFound`], or
    /// an error if the file cannot be removed.
    pub async fn remove(&self, user: &Username, id: u64) -> Result<()> {
        let lock = self.existing_lock(user).await?;
        let _state = lock.write().await;
        let dir = self.mailbox_dir(user);
        let stored = find(&dir, user, id).await?;
        fs::remove_file(&stored.path).await?;
        info!("Removed message {} from mailbox {}", id, user);
        Ok(())
    }

    // -- private helpers --

    fn mailbox_dir(&self, user: &Username) -> PathBuf {
        self.root.join(user.as_str())
    }

    /// Lock for a mailbox that already exists on disk. Unknown users
    /// never get a registry entry.
    async fn existing_lock(&self, user: &Username) -> Result<Arc<RwLock<MailboxState>>> {
        if self.mailbox_exists(user).await {
            Ok(self.lock_for(user))
        } else {
            Err(Error::UnknownMailbox(user.to_string()))
        }
    }

    fn lock_for(&self, user: &Username) -> Arc<RwLock<MailboxState>> {
        let mut mailboxes = self
            .mailboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(mailboxes.entry(user.clone()).or_default())
    }
}

/// Split `<id>_<name>.msg` into its id and name.
fn parse_file_name(file_name: &str) -> Option<(u64, &str)> {
    let stem = file_name.strip_suffix(MESSAGE_EXT)?;
    let (id, name) = stem.split_once(ID_DELIMITER)?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((id.parse().ok()?, name))
}

fn file_name(id: u64, subject: &str) -> String {
    format!("{id}{ID_DELIMITER}{}{MESSAGE_EXT}", slug(subject))
}

fn slug(subject: &str) -> String {
    let slug: String = subject
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .take(MAX_SLUG_LEN)
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "mail".to_string()
    } else {
        slug.to_string()
    }
}

async fn scan(dir: &Path) -> Result<Vec<StoredMessage>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut messages = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some((id, name)) = parse_file_name(file_name) {
            messages.push(StoredMessage {
                id,
                name: name.to_string(),
                path: entry.path(),
            });
        } else {
            debug!("Skipping {} in {}", file_name, dir.display());
        }
    }

    messages.sort_by_key(|m| m.id);
    Ok(messages)
}

async fn find(dir: &Path, user: &Username, id: u64) -> Result<StoredMessage> {
    scan(dir)
        .await?
        .into_iter()
        .find(|m| m.id == id)
        .ok_or_else(|| Error::MessageNotFound {
            user: user.to_string(),
            id,
        })
}

async fn allocate_id(dir: &Path, user: &Username, state: &mut MailboxState) -> Result<u64> {
    let id = match state.next_id {
        Some(next) => next,
        None => seed_next_id(dir, user).await?,
    };
    let next = successor(id, user)?;
    let meta = serde_json::to_string(&MailboxMeta { next_id: next })?;
    write_atomically(dir, MAILBOX_META, meta.as_bytes()).await?;
    state.next_id = Some(next);
    Ok(id)
}

/// One past the highest id ever seen: persisted counter or files on disk.
async fn seed_next_id(dir: &Path, user: &Username) -> Result<u64> {
    let persisted = match fs::read_to_string(dir.join(MAILBOX_META)).await {
        Ok(raw) => serde_json::from_str::<MailboxMeta>(&raw)?.next_id,
        Err(e) if e.kind() == ErrorKind::NotFound => 1,
        Err(e) => return Err(e.into()),
    };
    let scanned = match scan(dir).await?.last() {
        Some(highest) => successor(highest.id, user)?,
        None => 1,
    };
    Ok(persisted.max(scanned).max(1))
}

fn successor(id: u64, user: &Username) -> Result<u64> {
    id.checked_add(1)
        .ok_or_else(|| Error::IdsExhausted(user.to_string()))
}

async fn write_message(
    dir: &Path,
    user: &Username,
    id: u64,
    mail: &Mail,
) -> Result<StoredMessage> {
    if scan(dir).await?.iter().any(|m| m.id == id) {
        return Err(Error::DuplicateId {
            user: user.to_string(),
            id,
        });
    }

    let name = file_name(id, mail.subject());
    let content = mail.render(Utc::now());
    write_atomically(dir, &name, content.as_bytes()).await?;
    info!("Stored message {} for {} from {}", id, user, mail.sender());

    Ok(StoredMessage {
        id,
        name: slug(mail.subject()),
        path: dir.join(name),
    })
}

async fn write_atomically(dir: &Path, name: &str, contents: &[u8]) -> Result<()> {
    let tmp = dir.join(format!(".{name}.tmp"));
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, dir.join(name)).await?;
    Ok(())
}
