use crate::api::{DataStore, USERS};
use crate::error::{Error, Result};
use crate::models::User;
use crate::repository::{ContactDraft, Workspace};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";
const REMEMBER_FILE: &str = "remember.json";
const FLAGS_FILE: &str = "flags.json";

pub const GUEST_NAME: &str = "Guest";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub guest: bool,
}

impl SessionUser {
    pub fn guest() -> Self {
        SessionUser {
            id: "guest".to_string(),
            name: GUEST_NAME.to_string(),
            email: String::new(),
            color: String::new(),
            guest: true,
        }
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            color: user.color.clone(),
            guest: false,
        }
    }
}

/// One-time UI flags that live as long as the session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFlags {
    pub greeting: bool,
    pub login_animation_played: bool,
}

/// Files standing in for the browser's session and local storage.
///
/// `session.json` and `flags.json` only last until the session ends;
/// `remember.json` survives until logout.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(SessionStore { dir })
    }

    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("join"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Ignoring unreadable {}: {}", path.display(), err);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(self.dir.join(file), content)?;
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<()> {
        match fs::remove_file(self.dir.join(file)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// The active session's user, falling back to a remembered login.
    pub fn load_current_user(&self) -> Option<SessionUser> {
        self.read(SESSION_FILE).or_else(|| self.read(REMEMBER_FILE))
    }

    pub fn save_current_user(&self, user: &SessionUser, remember: bool) -> Result<()> {
        self.write(SESSION_FILE, user)?;
        if remember {
            self.write(REMEMBER_FILE, user)?;
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.remove(SESSION_FILE)?;
        self.remove(REMEMBER_FILE)?;
        self.remove(FLAGS_FILE)
    }

    /// Forgets everything scoped to the session, keeping a remembered login.
    pub fn end_session(&self) -> Result<()> {
        self.remove(SESSION_FILE)?;
        self.remove(FLAGS_FILE)
    }

    pub fn flags(&self) -> SessionFlags {
        self.read(FLAGS_FILE).unwrap_or_default()
    }

    pub fn save_flags(&self, flags: &SessionFlags) -> Result<()> {
        self.write(FLAGS_FILE, flags)
    }
}

/// Finds the user with this email and password. Emails match ignoring case.
pub fn login<'a>(users: &'a [User], email: &str, password: &str) -> Result<&'a User> {
    users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email.trim()) && u.password == password)
        .ok_or(Error::InvalidCredentials)
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registers a user and adds them to the contact list. The two writes are
/// independent; a failure of the second leaves the user registered.
pub async fn sign_up(store: &dyn DataStore, workspace: &mut Workspace, input: SignUp) -> Result<User> {
    let email = input.email.trim().to_string();
    if workspace
        .users
        .iter()
        .any(|u| u.email.eq_ignore_ascii_case(&email))
    {
        return Err(Error::EmailTaken);
    }

    let color = workspace.next_contact_color();
    let item = json!({
        "name": input.name.trim(),
        "email": email,
        "password": input.password,
        "color": color,
    });
    let created = store.add_data(USERS, item).await?;
    let user: User = match created {
        Some(value) => serde_json::from_value(value)?,
        None => return Err(Error::MissingId(USERS.to_string())),
    };
    workspace.users.push(user.clone());
    log::info!("Registered user {}", user.email);

    workspace
        .add_contact(
            store,
            ContactDraft {
                name: user.name.clone(),
                email: user.email.clone(),
                phone: String::new(),
            },
        )
        .await?;
    Ok(user)
}
