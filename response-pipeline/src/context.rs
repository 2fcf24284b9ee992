use once_cell::sync::Lazy;
use regex::Regex;

use common::storage::types::conversation::{ChatTurn, Sender};

use crate::catalog::CATALOG;
use crate::intent::is_general_service_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessSize {
    Small,
    Medium,
    Large,
}

impl BusinessSize {
    pub fn label(self) -> &'static str {
        match self {
            BusinessSize::Small => "small",
            BusinessSize::Medium => "medium",
            BusinessSize::Large => "large",
        }
    }
}

static SMALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(small|startup|solo|freelancer?|just (me|starting)|one[- ]person)\b")
        .expect("small business regex")
});

static MEDIUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(medium|mid[- ]size[d]?|growing|expanding|regional)\b")
        .expect("medium business regex")
});

static LARGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(large|enterprise|corporation|corporate|nationwide|multinational)\b")
        .expect("large business regex")
});

/// Industry buckets inferred from plain keywords. First hit wins.
const INDUSTRY_KEYWORDS: &[(&str, &str)] = &[
    ("restaurant", "restaurant"),
    ("cafe", "restaurant"),
    ("food", "restaurant"),
    ("shop", "retail"),
    ("store", "retail"),
    ("retail", "retail"),
    ("ecommerce", "retail"),
    ("e-commerce", "retail"),
    ("software", "technology"),
    ("tech", "technology"),
    ("saas", "technology"),
    ("law", "professional services"),
    ("legal", "professional services"),
    ("accounting", "professional services"),
    ("consulting", "professional services"),
];

/// Transient, per-session state inferred from what the visitor has said
/// so far. Rebuilt from the persisted transcript on every request, so no
/// state is ever shared across sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub business_size: Option<BusinessSize>,
    pub industry: Option<String>,
    pub mentioned_services: Vec<&'static str>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the context by replaying the visitor's side of a stored
    /// transcript, oldest turn first.
    pub fn replay(turns: &[ChatTurn]) -> Self {
        let mut context = Self::new();
        for turn in turns {
            if turn.sender == Sender::User {
                context.observe(&turn.message);
            }
        }
        context
    }

    /// Fold one message into the context: size buckets checked
    /// small → medium → large with the first match winning, industry from
    /// the keyword table, and service mentions accumulated in order.
    pub fn observe(&mut self, text: &str) {
        if SMALL_RE.is_match(text) {
            self.business_size = Some(BusinessSize::Small);
        } else if MEDIUM_RE.is_match(text) {
            self.business_size = Some(BusinessSize::Medium);
        } else if LARGE_RE.is_match(text) {
            self.business_size = Some(BusinessSize::Large);
        }

        let lowered = text.to_lowercase();
        if let Some((_, industry)) = INDUSTRY_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
        {
            self.industry = Some((*industry).to_string());
        }

        if is_general_service_query(text) {
            for entry in CATALOG {
                self.mention(entry.id);
            }
            return;
        }

        for entry in CATALOG {
            if entry
                .keywords
                .iter()
                .any(|keyword| lowered.contains(keyword))
            {
                self.mention(entry.id);
            }
        }
    }

    fn mention(&mut self, id: &'static str) {
        if !self.mentioned_services.contains(&id) {
            self.mentioned_services.push(id);
        }
    }

    /// One line the dispatcher can append to technical answers when it
    /// knows something about the business.
    pub fn suggestion_line(&self) -> Option<String> {
        match (self.business_size, self.industry.as_deref()) {
            (Some(size), Some(industry)) => Some(format!(
                "Since you run a {} {} business, we can point you at the plan that fits, just ask.",
                size.label(),
                industry
            )),
            (Some(size), None) => Some(format!(
                "For a {} business like yours, we can recommend the right plan, just ask.",
                size.label()
            )),
            (None, Some(industry)) => Some(format!(
                "We work with a lot of {industry} businesses, so feel free to ask for a recommendation."
            )),
            (None, None) => None,
        }
    }
}
