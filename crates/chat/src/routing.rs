use printquote_core::config::DEFAULT_TRIGGER_PHRASE;

pub const INQUIRY_KEYWORD: &str = "お問い合わせ";
pub const STAFF_HANDOFF_KEYWORD: &str = "#有人チャット";
const CAMPAIGN_KEYWORD: &str = "キャンペーン";
const CATALOG_KEYWORD: &str = "catalog";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Inquiry,
    StaffHandoff,
    StartQuote,
    Answer,
    Catalog,
    Ignore,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::StaffHandoff => "staff_handoff",
            Self::StartQuote => "start_quote",
            Self::Answer => "answer",
            Self::Catalog => "catalog",
            Self::Ignore => "ignore",
        }
    }
}

/// Decides what an inbound text means. Keywords are matched on the trimmed
/// text; the trigger phrase wins over an in-progress session so a requester
/// can always restart.
#[derive(Clone, Debug)]
pub struct MessageRouter {
    trigger_phrase: String,
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_PHRASE)
    }
}

impl MessageRouter {
    pub fn new(trigger_phrase: impl Into<String>) -> Self {
        Self { trigger_phrase: trigger_phrase.into().trim().to_owned() }
    }

    pub fn trigger_phrase(&self) -> &str {
        &self.trigger_phrase
    }

    pub fn route(&self, text: &str, has_session: bool) -> Route {
        let text = text.trim();
        if text == INQUIRY_KEYWORD {
            return Route::Inquiry;
        }
        if text == STAFF_HANDOFF_KEYWORD {
            return Route::StaffHandoff;
        }
        if text == self.trigger_phrase {
            return Route::StartQuote;
        }
        if has_session {
            return Route::Answer;
        }
        if text.contains(CAMPAIGN_KEYWORD) || text.to_lowercase().contains(CATALOG_KEYWORD) {
            return Route::Catalog;
        }
        Route::Ignore
    }
}
