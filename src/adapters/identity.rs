//! Identity adapter.
//!
//! The engine only needs "who is signed in, if anyone".  Credential and
//! session handling live outside the crate; the login flow calls
//! [`StaticIdentity::sign_in`] / [`StaticIdentity::sign_out`].

use std::cell::RefCell;

use log::info;

use crate::app::ports::IdentityPort;

#[derive(Debug, Default)]
pub struct StaticIdentity {
    uid: RefCell<Option<String>>,
}

impl StaticIdentity {
    /// No user: the engine operates locally only.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(uid: &str) -> Self {
        Self {
            uid: RefCell::new(Some(uid.to_string())),
        }
    }

    pub fn sign_in(&self, uid: &str) {
        info!("Identity: signed in");
        *self.uid.borrow_mut() = Some(uid.to_string());
    }

    pub fn sign_out(&self) {
        info!("Identity: signed out");
        *self.uid.borrow_mut() = None;
    }
}

impl IdentityPort for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.uid.borrow().clone()
    }
}
