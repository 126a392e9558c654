//! Page and modal identifiers.
//!
//! Both serialize as their numeric codes, which is how route tables and the
//! UI refer to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The page shown behind any modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Page {
    None,
    Events,
    Music,
    News,
    About,
    Admin,
    Records,
    VerifyEvents,
    Search,
}

impl Page {
    pub const ALL: [Page; 9] = [
        Page::None,
        Page::Events,
        Page::Music,
        Page::News,
        Page::About,
        Page::Admin,
        Page::Records,
        Page::VerifyEvents,
        Page::Search,
    ];

    pub fn code(self) -> u16 {
        match self {
            Page::None => 0,
            Page::Events => 1,
            Page::Music => 2,
            Page::News => 3,
            Page::About => 4,
            Page::Admin => 5,
            Page::Records => 6,
            Page::VerifyEvents => 7,
            Page::Search => 8,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|page| page.code() == code)
    }

    /// URL of the page itself, for pages that have one.
    pub fn url(self) -> Option<&'static str> {
        match self {
            Page::None | Page::Events => Some("/"),
            Page::Music => Some("/Media"),
            Page::News => Some("/News"),
            Page::About => Some("/About"),
            _ => None,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::Events
    }
}

impl From<Page> for u16 {
    fn from(page: Page) -> Self {
        page.code()
    }
}

impl TryFrom<u16> for Page {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Page::from_code(code).ok_or_else(|| format!("unknown page code {}", code))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The modal overlaid on the current page, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Modal {
    None,
    Location,
    Event,
    Artist,
    Song,
    Medium,
    Login,
    Record,
    EditRecord,
    CreateRecord,
    PasswordReset,
    Register,
    LoginPassword,
    Submit,
    NotFound,
}

impl Modal {
    pub const ALL: [Modal; 15] = [
        Modal::None,
        Modal::Location,
        Modal::Event,
        Modal::Artist,
        Modal::Song,
        Modal::Medium,
        Modal::Login,
        Modal::Record,
        Modal::EditRecord,
        Modal::CreateRecord,
        Modal::PasswordReset,
        Modal::Register,
        Modal::LoginPassword,
        Modal::Submit,
        Modal::NotFound,
    ];

    pub fn code(self) -> u16 {
        match self {
            Modal::None => 0,
            Modal::Location => 1,
            Modal::Event => 2,
            Modal::Artist => 3,
            Modal::Song => 4,
            Modal::Medium => 5,
            Modal::Login => 6,
            Modal::Record => 7,
            Modal::EditRecord => 8,
            Modal::CreateRecord => 9,
            Modal::PasswordReset => 10,
            Modal::Register => 11,
            Modal::LoginPassword => 12,
            Modal::Submit => 13,
            Modal::NotFound => 404,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|modal| modal.code() == code)
    }
}

impl Default for Modal {
    fn default() -> Self {
        Modal::None
    }
}

impl From<Modal> for u16 {
    fn from(modal: Modal) -> Self {
        modal.code()
    }
}

impl TryFrom<u16> for Modal {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Modal::from_code(code).ok_or_else(|| format!("unknown modal code {}", code))
    }
}

impl fmt::Display for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
