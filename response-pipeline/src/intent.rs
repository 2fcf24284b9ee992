use once_cell::sync::Lazy;
use regex::Regex;

/// Classification tag for one inbound message. Tags are not mutually
/// exclusive; a message carries every tag whose pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    ServiceInquiry,
    ComparisonRequest,
    TechnicalQuestion,
    General,
}

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(hello|hi|hey|yo|howdy)\b").expect("greeting regex")
});

static SERVICE_INQUIRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(services?|offers?|offerings?|tell me about|interested in|looking for|do you (have|provide|sell)|pricing|prices?|plans?)\b",
    )
    .expect("service inquiry regex")
});

static COMPARISON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(compare|comparison|versus|vs\.?|difference between|which (one )?is better)\b")
        .expect("comparison regex")
});

static TECHNICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(how (do|can|to)|error|issue|problems?|trouble|configure|set ?up|install|migrate|fix|not working|broken)\b",
    )
    .expect("technical regex")
});

static GENERAL_SERVICES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(what services|which services|all (of )?(your )?services|what (do|can) you (do|offer)|everything you (do|offer)|list of services|full range)\b",
    )
    .expect("general services regex")
});

/// Run every intent pattern independently and collect all matches, in the
/// order the patterns are defined. Falls back to `[General]`.
pub fn classify(text: &str) -> Vec<Intent> {
    let mut intents = Vec::new();

    if GREETING_RE.is_match(text) {
        intents.push(Intent::Greeting);
    }
    if SERVICE_INQUIRY_RE.is_match(text) {
        intents.push(Intent::ServiceInquiry);
    }
    if COMPARISON_RE.is_match(text) {
        intents.push(Intent::ComparisonRequest);
    }
    if TECHNICAL_RE.is_match(text) {
        intents.push(Intent::TechnicalQuestion);
    }

    if intents.is_empty() {
        intents.push(Intent::General);
    }

    intents
}

/// "Show me everything" phrasing, matched separately from the service
/// inquiry tag so the dispatcher can pick the full-catalog branch.
pub fn is_general_service_query(text: &str) -> bool {
    GENERAL_SERVICES_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_greeting_prefix_is_tagged() {
        for text in ["hello there", "Hi!", "hey, quick question", "yo", "Howdy partner"] {
            let intents = classify(text);
            assert!(
                intents.contains(&Intent::Greeting),
                "{text:?} should classify as a greeting"
            );
        }
    }

    #[test]
    fn test_greeting_must_lead_the_message() {
        let intents = classify("I wanted to say hello to your team");
        assert!(!intents.contains(&Intent::Greeting));
    }

    #[test]
    fn test_what_services_is_a_general_inquiry() {
        let text = "What services do you offer?";
        let intents = classify(text);
        assert!(intents.contains(&Intent::ServiceInquiry));
        assert!(is_general_service_query(text));
    }

    #[test]
    fn test_tags_are_not_mutually_exclusive() {
        let intents = classify("Hi, can you compare your hosting plans?");
        assert!(intents.contains(&Intent::Greeting));
        assert!(intents.contains(&Intent::ServiceInquiry));
        assert!(intents.contains(&Intent::ComparisonRequest));
    }

    #[test]
    fn test_technical_phrasing() {
        let intents = classify("How do I configure DNS, it is not working");
        assert!(intents.contains(&Intent::TechnicalQuestion));
    }

    #[test]
    fn test_unmatched_text_defaults_to_general() {
        assert_eq!(classify("purple monkeys"), vec![Intent::General]);
    }

    #[test]
    fn test_specific_question_is_not_general_services() {
        assert!(!is_general_service_query("Tell me about web hosting"));
    }
}
