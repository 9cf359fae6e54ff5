//! services/oracle/src/app/community.rs
//!
//! The mock social panel of the results view: seeded reader comments, a comment box
//! whose posts are acknowledged but never stored, and the registry of members.

use literary_oracle_core::SessionIdentity;
use serde::Serialize;

pub const POST_ACKNOWLEDGEMENT: &str = "Your raven has been sent to the realm.";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub user: String,
    pub text: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub email: String,
    pub house: String,
    pub joined: String,
}

/// What the registry shows depends on the viewer's role claim.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryView {
    /// Every known member. Archivists only.
    Census { members: Vec<Member> },
    /// Everyone else sees their own record.
    PersonalRecord { identity: SessionIdentity },
}

const SEEDED_COMMENTS: [(&str, &str); 4] = [
    ("Samwell_Tarly", "The citations are impeccable. A true masterpiece of knowledge."),
    ("Arya_NoOne", "Useful techniques for one who wishes to remain unseen."),
    ("The_Imp", "I drank wine and I read this. 10/10, would recommend to a friend."),
    ("Lord_Snow", "I knew nothing before reading this. Now I know... slightly more."),
];

const SEEDED_MEMBERS: [(&str, &str, &str, &str); 5] = [
    ("Jon Snow", "jon@wall.com", "House Stark", "The Long Night"),
    ("Daenerys Targaryen", "dany@dragonstone.com", "House Targaryen", "Before the Storm"),
    ("Tyrion Lannister", "imp@casterlyrock.com", "House Lannister", "Age of Heroes"),
    ("Arya Stark", "noone@braavos.com", "House Stark", "War of Five Kings"),
    ("Sansa Stark", "queen@winterfell.com", "House Stark", "Battle of Bastards"),
];

/// Tracks which book's discussion is open.
#[derive(Debug, Default)]
pub struct CommunityPanel {
    open_book: Option<String>,
}

impl CommunityPanel {
    pub fn open(&mut self, book_title: &str) -> Vec<Comment> {
        self.open_book = Some(book_title.to_string());
        SEEDED_COMMENTS
            .iter()
            .map(|(user, text)| Comment {
                user: user.to_string(),
                text: text.to_string(),
            })
            .collect()
    }

    pub fn open_book(&self) -> Option<&str> {
        self.open_book.as_deref()
    }

    /// Returns the acknowledgement for a non-empty post with a discussion open.
    pub fn post(&self, text: &str) -> Option<&'static str> {
        if self.open_book.is_none() || text.trim().is_empty() {
            return None;
        }
        Some(POST_ACKNOWLEDGEMENT)
    }

    pub fn close(&mut self) {
        self.open_book = None;
    }
}

pub fn registry_for(viewer: &SessionIdentity) -> RegistryView {
    if viewer.is_archivist() {
        RegistryView::Census {
            members: SEEDED_MEMBERS
                .iter()
                .map(|(name, email, house, joined)| Member {
                    name: name.to_string(),
                    email: email.to_string(),
                    house: house.to_string(),
                    joined: joined.to_string(),
                })
                .collect(),
        }
    } else {
        RegistryView::PersonalRecord {
            identity: viewer.clone(),
        }
    }
}
