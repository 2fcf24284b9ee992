use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::error;

use common::error::AppError;

use crate::catalog::{self, ServiceEntry, CATALOG};
use crate::context::SessionContext;
use crate::intent::{classify, is_general_service_query, Intent};
use crate::llm::{HistoryBuffer, LlmGateway, ModelParams, APOLOGY};
use crate::matcher::relevant_services;

pub const GREETINGS: [&str; 4] = [
    "Hello! Welcome. How can I help you today?",
    "Hi there! What can I do for you?",
    "Hey! Great to have you here. What do you need?",
    "Welcome! Ask me anything about our services.",
];

pub const CLARIFY_COMPARISON: &str =
    "I can compare two of our services for you. Which two would you like me to look at?";

const SUPPORT_SYSTEM_PROMPT: &str = "You are a friendly support assistant for a web services \
company. Answer clearly and concisely, and keep a helpful, professional tone.";

const TECH_SYSTEM_PROMPT: &str = "You are a patient technical support assistant for a web \
services company. Walk the customer through the fix step by step and avoid jargon where you can.";

const GENERIC_SYSTEM_PROMPT: &str =
    "Answer the customer's question professionally and briefly.";

/// Selects exactly one response path per message, in a fixed priority
/// order. Classification happens once up front so the chain below is the
/// whole dispatch story.
pub struct ResponseDispatcher {
    llm: LlmGateway,
}

impl ResponseDispatcher {
    pub fn new(llm: LlmGateway) -> Self {
        Self { llm }
    }

    pub async fn respond<R: Rng>(
        &self,
        text: &str,
        params: &ModelParams,
        context: &mut SessionContext,
        history: &mut HistoryBuffer,
        rng: &mut R,
    ) -> String {
        context.observe(text);

        let intents = classify(text);
        let matches = relevant_services(text);
        let general_query = is_general_service_query(text);

        // 1. Comparison beats everything else
        if intents.contains(&Intent::ComparisonRequest) {
            return self.compare(text, params, context, history, &matches).await;
        }

        // 2. Greeting stacked on an inquiry answers both
        let greeted = intents.contains(&Intent::Greeting);
        if greeted && intents.contains(&Intent::ServiceInquiry) {
            let greeting = pick_greeting(rng);
            let inquiry = self
                .service_inquiry_response(text, params, context, history, general_query, &matches)
                .await;
            return format!("{greeting}\n\n{inquiry}");
        }

        // 3. Bare greeting never needs the model
        if greeted {
            return pick_greeting(rng).to_string();
        }

        // 4. Service inquiry
        if intents.contains(&Intent::ServiceInquiry) {
            return self
                .service_inquiry_response(text, params, context, history, general_query, &matches)
                .await;
        }

        // 5. One clearly relevant service without inquiry phrasing
        if let [only] = matches[..] {
            if !general_query {
                return self.single_service(only, text, params, history).await;
            }
        }

        // 6. Nothing relevant now, but exactly one service discussed
        // earlier: pass the message through untouched, no history, no
        // framing.
        if matches.is_empty() && context.mentioned_services.len() == 1 {
            return match self.llm.ask_single_shot(params, text).await {
                Ok(answer) => answer,
                Err(e) => apologize("single-shot answer", &e),
            };
        }

        // 7. Technical question
        if intents.contains(&Intent::TechnicalQuestion) {
            return self.technical(text, params, context, history).await;
        }

        // 8. Free-form question with no service angle
        if matches.is_empty() {
            return match self
                .llm
                .ask_with_history(params, Some(GENERIC_SYSTEM_PROMPT), history, text)
                .await
            {
                Ok(answer) => answer,
                Err(e) => apologize("general answer", &e),
            };
        }

        // 9. Several matches but no usable intent
        default_recommendation()
    }

    async fn compare(
        &self,
        text: &str,
        params: &ModelParams,
        context: &SessionContext,
        history: &mut HistoryBuffer,
        matches: &[&'static ServiceEntry],
    ) -> String {
        let pair: Vec<&'static ServiceEntry> = if context.mentioned_services.len() >= 2 {
            context
                .mentioned_services
                .iter()
                .take(2)
                .filter_map(|id| catalog::find(id))
                .collect()
        } else {
            matches.iter().take(2).copied().collect()
        };

        let &[first, second] = pair.as_slice() else {
            return CLARIFY_COMPARISON.to_string();
        };

        let prompt = format!(
            "A customer wants a comparison of two of our services.\n\n\
             {}: {}\nKey features: {}\n\n\
             {}: {}\nKey features: {}\n\n\
             Customer question: {}\n\n\
             Compare the two services for this customer and help them choose.",
            first.name,
            first.description,
            first.features.join(", "),
            second.name,
            second.description,
            second.features.join(", "),
            text
        );

        match self
            .llm
            .ask_with_history(params, Some(SUPPORT_SYSTEM_PROMPT), history, &prompt)
            .await
        {
            Ok(answer) => format!(
                "{answer}\n\nMore details: [{}]({}) · [{}]({})",
                first.name, first.link, second.name, second.link
            ),
            Err(e) => apologize("comparison", &e),
        }
    }

    async fn service_inquiry_response(
        &self,
        text: &str,
        params: &ModelParams,
        context: &SessionContext,
        history: &mut HistoryBuffer,
        general_query: bool,
        matches: &[&'static ServiceEntry],
    ) -> String {
        if general_query {
            return catalog_overview(context);
        }

        match matches {
            [only] => self.single_service(only, text, params, history).await,
            [] => default_recommendation(),
            several => list_services(several),
        }
    }

    async fn single_service(
        &self,
        entry: &'static ServiceEntry,
        text: &str,
        params: &ModelParams,
        history: &mut HistoryBuffer,
    ) -> String {
        let prompt = format!(
            "A customer is asking about our {} service. Answer their question in 6 to 7 short, \
             concrete steps, keeping each step to one sentence. Mention the service page {} where \
             it helps.\n\nCustomer question: {}",
            entry.name, entry.link, text
        );

        match self
            .llm
            .ask_with_history(params, Some(SUPPORT_SYSTEM_PROMPT), history, &prompt)
            .await
        {
            Ok(answer) => format!(
                "**{}**\n\n{}\n\n[Learn more]({})",
                entry.name, answer, entry.link
            ),
            Err(e) => apologize("single-service answer", &e),
        }
    }

    async fn technical(
        &self,
        text: &str,
        params: &ModelParams,
        context: &SessionContext,
        history: &mut HistoryBuffer,
    ) -> String {
        let mut reply = match self
            .llm
            .ask_with_history(params, Some(TECH_SYSTEM_PROMPT), history, text)
            .await
        {
            Ok(answer) => answer,
            Err(e) => apologize("technical answer", &e),
        };

        if let Some(line) = context.suggestion_line() {
            reply.push_str("\n\n");
            reply.push_str(&line);
        }

        reply
    }
}

fn pick_greeting<R: Rng>(rng: &mut R) -> &'static str {
    GREETINGS
        .choose(rng)
        .copied()
        .unwrap_or("Hello! How can I help you today?")
}

fn apologize(stage: &str, e: &AppError) -> String {
    error!("Model call failed during {stage}: {e}");
    APOLOGY.to_string()
}

fn catalog_overview(context: &SessionContext) -> String {
    let mut out = String::from("Here's the full range of what we offer:\n");

    for entry in CATALOG {
        let flag = if recommended_for(entry, context) {
            " (recommended for you)"
        } else {
            ""
        };
        out.push_str(&format!("\n**{}**{}\n{}\n", entry.name, flag, entry.description));
        out.push_str(&format!("Features: {}\n", entry.features.join(", ")));
        out.push_str(&format!(
            "Best for: {} - [Learn more]({})\n",
            entry.best_for.join(", "),
            entry.link
        ));
    }

    out.push_str("\nTell me which one sounds closest and I can go deeper.");
    out
}

fn recommended_for(entry: &ServiceEntry, context: &SessionContext) -> bool {
    let mut needles: Vec<String> = Vec::new();
    if let Some(size) = context.business_size {
        needles.push(size.label().to_string());
    }
    if let Some(industry) = &context.industry {
        needles.push(industry.to_lowercase());
    }

    entry
        .best_for
        .iter()
        .any(|tag| needles.iter().any(|needle| tag.contains(needle.as_str())))
}

fn list_services(matches: &[&'static ServiceEntry]) -> String {
    let mut out = String::from("A few of our services could fit what you're describing:\n");

    for entry in matches {
        out.push_str(&format!(
            "\n- [{}]({}) - {}",
            entry.name, entry.link, entry.description
        ));
    }

    out.push_str("\n\nWhich one would you like to dig into?");
    out
}

fn default_recommendation() -> String {
    let mut out = String::from("Here are a few services our customers usually start with:\n");

    for entry in CATALOG.iter().take(3) {
        out.push_str(&format!(
            "\n- [{}]({}) - {}",
            entry.name, entry.link, entry.description
        ));
    }

    out.push_str("\n\nTell me a bit about what you need and I can point you the right way.");
    out
}
