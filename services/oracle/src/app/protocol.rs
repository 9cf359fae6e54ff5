//! services/oracle/src/app/protocol.rs
//!
//! Defines the message protocol between a front-end and the application runtime.

use crate::app::community::{Comment, RegistryView};
use literary_oracle_core::{
    AppView, LibraryLocation, OracleResult, Preferences, SessionIdentity,
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Front-end TO the Runtime
//=========================================================================================

/// The user actions a front-end can forward to the runtime.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiCommand {
    SignIn { email: String, password: String },

    SignUp {
        email: String,
        password: String,
        display_name: String,
    },

    /// Switches the login form between signing in and signing up.
    ToggleAuthMode,

    SubmitPreferences { preferences: Preferences },

    /// "Try again" on the error view.
    TryAgain,

    /// Consult the Oracle anew from the results view.
    Reset,

    SignOut,

    /// Look up libraries near the user for one recommended book.
    FindLibrary { book_title: String },

    OpenCommunity { book_title: String },

    PostComment { text: String },

    OpenRegistry,
}

//=========================================================================================
// Messages Sent FROM the Runtime TO the Front-end
//=========================================================================================

/// Everything a front-end needs to render.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewUpdate {
    /// The main view changed, or the identity shown in the header did.
    ViewChanged {
        view: AppView,
        identity: Option<SessionIdentity>,
    },

    LoginModeChanged { sign_up: bool },

    /// Shown inline on the login form; the view does not change.
    LoginError { message: String },

    Results { result: OracleResult },

    Error { message: String },

    LibrarySearchStatus { book_title: String, status: String },

    LibrariesFound {
        book_title: String,
        libraries: Vec<LibraryLocation>,
    },

    Community {
        book_title: String,
        comments: Vec<Comment>,
    },

    Registry { registry: RegistryView },

    /// A transient message that never changes the view.
    Notice { message: String },
}
