//! Authenticated session state.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, ChannelEndpoint};

/// The signed-in user, as held by the app shell after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
    pub token: String,
}

/// Shared, mutable slot for the current session. Views and channels hold
/// clones; logging out clears the slot for all of them at once.
pub type SessionHandle = Rc<RefCell<Option<AuthSession>>>;

/// URL builder for a realtime channel, re-evaluated on every (re)connect so
/// a refreshed token is picked up. Yields `None` while signed out, which
/// keeps the channel from connecting at all.
pub fn channel_url_builder(
    config: ApiConfig,
    session: SessionHandle,
    endpoint: ChannelEndpoint,
) -> impl Fn() -> Option<String> {
    move || {
        let session = session.borrow();
        let session = session.as_ref()?;
        Some(config.ws_url(&endpoint, Some(&session.token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_builder_yields_none_while_signed_out() {
        let session: SessionHandle = Rc::new(RefCell::new(None));
        let builder = channel_url_builder(
            ApiConfig::new("https://api.studyhall.io"),
            session.clone(),
            ChannelEndpoint::chat("7"),
        );
        assert_eq!(builder(), None);

        *session.borrow_mut() = Some(AuthSession {
            user_id: "u1".into(),
            username: "dana".into(),
            token: "tok".into(),
        });
        assert_eq!(
            builder().as_deref(),
            Some("wss://api.studyhall.io/ws/chat/7/?token=tok")
        );
    }
}
