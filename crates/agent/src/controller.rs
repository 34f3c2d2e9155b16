use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use homefinder_core::contact::{
    ContactDispatcher, ContactMethod, ContactOutcome, ContactRequest, UnconfiguredDispatcher,
};
use homefinder_core::domain::filter::FilterSet;
use homefinder_core::domain::listing::{Listing, ListingId};
use homefinder_core::search::{ScoredListing, SearchEngine};

use crate::parser::{NormalizedUtterance, QueryParser};

pub const WELCOME_MESSAGE: &str = "Welcome to Homefinder! I help people find affordable housing.\n\
You can ask me things like:\n\
  • 'Find 2-bedroom apartments under $800 in Atlanta'\n\
  • 'Show me Section 8 housing in Decatur'\n\
  • 'I need wheelchair-accessible housing with Spanish-speaking agents'\n\
  • 'Contact agent for listing 1'\n\n\
Type 'quit' or 'exit' to leave.";

pub const GOODBYE_MESSAGE: &str = "Goodbye! Good luck with your housing search.";

const EMPTY_INPUT_MESSAGE: &str = "I didn't catch that. Could you please repeat?";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatIntent {
    Empty,
    Help,
    Goodbye,
    ContactAgent,
    Search,
}

impl ChatIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Help => "help",
            Self::Goodbye => "goodbye",
            Self::ContactAgent => "contact_agent",
            Self::Search => "search",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatReply {
    pub intent: ChatIntent,
    pub reply_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,
    pub listings: Vec<ScoredListing>,
}

impl ChatReply {
    fn text_only(intent: ChatIntent, reply_text: impl Into<String>) -> Self {
        Self { intent, reply_text: reply_text.into(), filters: None, listings: Vec::new() }
    }

    pub fn is_goodbye(&self) -> bool {
        self.intent == ChatIntent::Goodbye
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchReply {
    pub count: usize,
    pub listings: Vec<ScoredListing>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContactReply {
    pub outcome: ContactOutcome,
    pub reply_text: String,
}

/// Turns one utterance or one filter set into a reply. Holds no per-user
/// state: every call is resolved from its own input.
#[derive(Clone)]
pub struct ConversationController {
    parser: QueryParser,
    engine: SearchEngine,
    dispatcher: Arc<dyn ContactDispatcher>,
}

impl ConversationController {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            parser: QueryParser::from_store(engine.store()),
            engine,
            dispatcher: Arc::new(UnconfiguredDispatcher),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn ContactDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn handle(&self, utterance: &str) -> ChatReply {
        let normalized = NormalizedUtterance::new(utterance);
        let intent = classify(&normalized);

        let reply = match intent {
            ChatIntent::Empty => ChatReply::text_only(intent, EMPTY_INPUT_MESSAGE),
            ChatIntent::Help => ChatReply::text_only(intent, WELCOME_MESSAGE),
            ChatIntent::Goodbye => ChatReply::text_only(intent, GOODBYE_MESSAGE),
            ChatIntent::ContactAgent => {
                ChatReply::text_only(intent, self.contact_details_reply(&normalized))
            }
            ChatIntent::Search => {
                let filters = self.parser.parse(utterance);
                let listings = self.engine.search(&filters);
                let reply_text = format_search_reply(&filters, &listings);
                ChatReply { intent, reply_text, filters: Some(filters), listings }
            }
        };

        info!(
            event_name = "chat.turn",
            intent = intent.as_str(),
            result_count = reply.listings.len(),
            "chat turn handled"
        );
        reply
    }

    pub fn handle_filters(&self, filters: &FilterSet) -> SearchReply {
        let listings = self.engine.search(filters);
        info!(
            event_name = "search.executed",
            constrained = !filters.is_empty(),
            result_count = listings.len(),
            "structured search executed"
        );
        SearchReply { count: listings.len(), listings }
    }

    pub async fn request_contact(&self, request: &ContactRequest) -> ContactReply {
        if let Err(error) = request.validate() {
            return failed_reply(ContactOutcome::failed(error.to_string()), None);
        }

        let Some(listing) = self.engine.store().get(request.listing_id) else {
            return failed_reply(
                ContactOutcome::failed(format!("listing {} does not exist", request.listing_id)),
                None,
            );
        };

        if let Some(missing) = missing_agent_channel(listing, request.method) {
            return failed_reply(ContactOutcome::failed(missing), Some(listing));
        }

        info!(
            event_name = "contact.requested",
            listing_id = request.listing_id.0,
            method = request.method.as_str(),
            language = %request.preferred_language,
            "dispatching agent contact"
        );
        let outcome = self.dispatcher.attempt_contact(listing, request).await;

        if outcome.success {
            info!(
                event_name = "contact.delivered",
                listing_id = request.listing_id.0,
                method = request.method.as_str(),
                reference = outcome.reference.as_deref().unwrap_or(""),
                "agent contact delivered"
            );
            let reply_text = format!(
                "Your {} request was sent to {}. They can reach you at {}.",
                request.method,
                agent_name(listing),
                request.requester_phone.trim()
            );
            ContactReply { outcome, reply_text }
        } else {
            warn!(
                event_name = "contact.failed",
                listing_id = request.listing_id.0,
                method = request.method.as_str(),
                error = outcome.error.as_deref().unwrap_or(""),
                "agent contact failed"
            );
            failed_reply(outcome, Some(listing))
        }
    }

    fn contact_details_reply(&self, utterance: &NormalizedUtterance) -> String {
        let Some(id) = mentioned_listing_id(&utterance.tokens) else {
            return "Which listing? Say, for example, 'contact agent for listing 1'.".to_string();
        };
        let Some(listing) = self.engine.store().get(id) else {
            return format!("I couldn't find listing {id}. Check the listing number and try again.");
        };

        format!(
            "You can reach {} at {} or {} about {}.\n\n\
             To have us reach out for you, send a contact request with your name and phone \
             number, or call {} directly.",
            agent_name(listing),
            or_unknown(&listing.agent_phone),
            or_unknown(&listing.agent_email),
            listing.full_address(),
            or_unknown(&listing.agent_phone),
        )
    }
}

fn classify(utterance: &NormalizedUtterance) -> ChatIntent {
    let text = utterance.text.as_str();
    if text.is_empty() || (utterance.tokens.is_empty() && !text.contains('?')) {
        return ChatIntent::Empty;
    }
    if matches!(text, "quit" | "exit" | "bye" | "goodbye") {
        return ChatIntent::Goodbye;
    }
    if text.starts_with("contact")
        || text.contains("call agent")
        || text.contains("email agent")
        || text.contains("contact agent")
    {
        return ChatIntent::ContactAgent;
    }
    if matches!(text, "help" | "?" | "what can you do" | "what can you do?") {
        return ChatIntent::Help;
    }
    ChatIntent::Search
}

fn mentioned_listing_id(tokens: &[String]) -> Option<ListingId> {
    tokens
        .iter()
        .map(|token| token.trim_start_matches('#'))
        .find(|token| !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit()))
        .and_then(|token| token.parse::<u32>().ok())
        .map(ListingId)
}

fn missing_agent_channel(listing: &Listing, method: ContactMethod) -> Option<String> {
    match method {
        ContactMethod::Email if listing.agent_email.is_empty() => {
            Some("No agent email for this listing.".to_string())
        }
        ContactMethod::Call | ContactMethod::Sms if listing.agent_phone.is_empty() => {
            Some("No agent phone number for this listing.".to_string())
        }
        _ => None,
    }
}

fn failed_reply(outcome: ContactOutcome, listing: Option<&Listing>) -> ContactReply {
    let reason = outcome.error.clone().unwrap_or_else(|| "unknown error".to_string());
    let reply_text = match listing {
        Some(listing) => format!(
            "I couldn't contact {} automatically ({reason}). You can reach them directly at {} \
             or {}.",
            agent_name(listing),
            or_unknown(&listing.agent_phone),
            or_unknown(&listing.agent_email),
        ),
        None => format!("I couldn't send that contact request: {reason}."),
    };
    ContactReply { outcome, reply_text }
}

fn agent_name(listing: &Listing) -> &str {
    if listing.agent_name.is_empty() {
        "the listing agent"
    } else {
        &listing.agent_name
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "(not listed)"
    } else {
        value
    }
}

pub fn format_search_reply(filters: &FilterSet, listings: &[ScoredListing]) -> String {
    if listings.is_empty() {
        return no_match_reply(filters);
    }

    let mut lines = vec![format!(
        "I found {} listing{} that match your needs:",
        listings.len(),
        if listings.len() == 1 { "" } else { "s" }
    )];
    for scored in listings {
        let listing = &scored.listing;
        lines.push(format!(
            "• [{}] {}, {}, {} | ${}/mo | {} bed | Section 8: {} | Agent: {} ({})",
            listing.id,
            listing.address,
            listing.city,
            listing.state,
            format_rent(listing.monthly_rent),
            listing.bedrooms,
            if listing.section8_accepted { "✓" } else { "✗" },
            agent_name(listing),
            or_unknown(&listing.agent_phone),
        ));
    }
    lines.join("\n")
}

fn no_match_reply(filters: &FilterSet) -> String {
    let mut hints = Vec::new();
    if let Some(max_rent) = filters.max_rent {
        hints.push(format!("raise your budget above ${}", format_rent(max_rent)));
    }
    if let Some(city) = &filters.city {
        hints.push(format!("include cities near {city}"));
    }
    if filters.min_bedrooms.is_some_and(|bedrooms| bedrooms > 1) {
        hints.push("consider fewer bedrooms".to_string());
    }
    if filters.language.is_some() {
        hints.push("drop the agent language requirement".to_string());
    }
    if hints.is_empty() {
        hints.push("remove some of the amenity requirements".to_string());
    }

    format!(
        "I'm sorry, I couldn't find any listings that match your criteria. \
         Try broadening your search: {}.",
        hints.join(", or ")
    )
}

/// `1250` → `1,250`.
fn format_rent(amount: u32) -> String {
    let digits = amount.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use homefinder_core::contact::{
        ContactDispatcher, ContactMethod, ContactOutcome, ContactRequest,
    };
    use homefinder_core::domain::filter::FilterSet;
    use homefinder_core::domain::listing::{Listing, ListingId};
    use homefinder_core::fixtures::demo_store;
    use homefinder_core::search::SearchEngine;

    use super::{format_rent, ChatIntent, ConversationController};

    #[derive(Default)]
    struct RecordingDispatcher {
        requests: Mutex<Vec<(ListingId, ContactMethod)>>,
    }

    #[async_trait]
    impl ContactDispatcher for RecordingDispatcher {
        async fn attempt_contact(
            &self,
            listing: &Listing,
            request: &ContactRequest,
        ) -> ContactOutcome {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((listing.id, request.method));
            }
            ContactOutcome::delivered(Some("SM123".to_string()))
        }
    }

    struct FailingDispatcher;

    #[async_trait]
    impl ContactDispatcher for FailingDispatcher {
        async fn attempt_contact(&self, _: &Listing, _: &ContactRequest) -> ContactOutcome {
            ContactOutcome::failed("carrier rejected the call")
        }
    }

    fn controller() -> ConversationController {
        let store = Arc::new(demo_store().expect("demo store"));
        ConversationController::new(SearchEngine::new(store))
    }

    fn ids(listings: &[homefinder_core::search::ScoredListing]) -> Vec<u32> {
        listings.iter().map(|scored| scored.listing.id.0).collect()
    }

    #[test]
    fn reference_scenario_returns_ranked_matches() {
        let reply = controller()
            .handle("2 bedroom apartment under $800 in Atlanta with Spanish-speaking agent");

        assert_eq!(reply.intent, ChatIntent::Search);
        assert_eq!(ids(&reply.listings), vec![1, 10, 15]);
        for scored in &reply.listings {
            assert!(scored.listing.bedrooms >= 2);
            assert!(scored.listing.monthly_rent <= 800);
            assert_eq!(scored.listing.city, "Atlanta");
            assert!(scored.listing.speaks("Spanish"));
        }
        assert!(reply.reply_text.starts_with("I found 3 listings"));
        assert!(reply.reply_text.contains("123 Main St"));
    }

    #[test]
    fn unrecognized_text_returns_default_top_n_across_store() {
        let controller = controller();
        let reply = controller.handle("hello there");

        assert_eq!(reply.filters, Some(FilterSet::new()));
        assert_eq!(reply.listings.len(), controller.engine().default_top_n());
        let scores = reply.listings.iter().map(|scored| scored.score).collect::<Vec<_>>();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn impossible_budget_suggests_broadening() {
        let reply = controller().handle("anything under $100 in Atlanta");

        assert!(reply.listings.is_empty());
        assert!(reply.reply_text.contains("couldn't find any listings"));
        assert!(reply.reply_text.contains("raise your budget above $100"));
        assert!(reply.reply_text.contains("include cities near Atlanta"));
    }

    #[test]
    fn stateless_intents_bypass_search() {
        let controller = controller();

        assert_eq!(controller.handle("   ").intent, ChatIntent::Empty);
        assert_eq!(controller.handle("HELP").intent, ChatIntent::Help);
        assert!(controller.handle("bye").is_goodbye());

        let contact = controller.handle("Contact agent for listing 3");
        assert_eq!(contact.intent, ChatIntent::ContactAgent);
        assert!(contact.reply_text.contains("selam.t@example.com"));
        assert!(contact.listings.is_empty());

        let unknown = controller.handle("contact agent for listing 99");
        assert!(unknown.reply_text.contains("couldn't find listing 99"));

        let missing = controller.handle("contact the agent");
        assert!(missing.reply_text.starts_with("Which listing?"));
    }

    #[test]
    fn structured_search_bypasses_parser() {
        let controller = controller();
        let reply =
            controller.handle_filters(&FilterSet::new().with_city("Decatur").with_top_n(10));

        assert_eq!(reply.count, 2);
        assert_eq!(reply.count, reply.listings.len());
        assert!(reply.listings.iter().all(|scored| scored.listing.city == "Decatur"));
    }

    #[tokio::test]
    async fn contact_request_reaches_dispatcher() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let controller = controller().with_dispatcher(dispatcher.clone());
        let request = ContactRequest::new(ListingId(4), "Ana", "404-555-0100")
            .with_method(ContactMethod::Sms);

        let reply = controller.request_contact(&request).await;

        assert!(reply.outcome.success);
        assert_eq!(reply.outcome.reference.as_deref(), Some("SM123"));
        assert!(reply.reply_text.contains("Linh"));
        let recorded = dispatcher.requests.lock().map(|r| r.clone()).unwrap_or_default();
        assert_eq!(recorded, vec![(ListingId(4), ContactMethod::Sms)]);
    }

    #[tokio::test]
    async fn dispatcher_failure_falls_back_to_agent_details() {
        let controller = controller().with_dispatcher(Arc::new(FailingDispatcher));
        let request = ContactRequest::new(ListingId(1), "Ana", "404-555-0100")
            .with_method(ContactMethod::Call);

        let reply = controller.request_contact(&request).await;

        assert!(!reply.outcome.success);
        assert!(reply.reply_text.contains("carrier rejected the call"));
        assert!(reply.reply_text.contains("+14045550101"));
        assert!(reply.reply_text.contains("maria.garcia@example.com"));
    }

    #[tokio::test]
    async fn invalid_or_unknown_requests_fail_without_dispatch() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let controller = controller().with_dispatcher(dispatcher.clone());

        let unknown =
            controller.request_contact(&ContactRequest::new(ListingId(404), "Ana", "1")).await;
        assert!(!unknown.outcome.success);
        assert!(unknown.outcome.error.as_deref().is_some_and(|e| e.contains("does not exist")));

        let nameless =
            controller.request_contact(&ContactRequest::new(ListingId(1), "", "1")).await;
        assert!(!nameless.outcome.success);

        let recorded = dispatcher.requests.lock().map(|r| r.len()).unwrap_or_default();
        assert_eq!(recorded, 0);
    }

    #[tokio::test]
    async fn default_dispatcher_reports_missing_configuration() {
        let reply = controller()
            .request_contact(&ContactRequest::new(ListingId(2), "Ana", "404-555-0100"))
            .await;

        assert!(!reply.outcome.success);
        assert!(reply.reply_text.contains("david.kim@example.com"));
    }

    #[test]
    fn chat_reply_serializes_flat_listing_fields() {
        let reply = controller().handle("section 8 in Decatur");
        let json = serde_json::to_value(&reply).expect("serialize reply");

        assert_eq!(json["intent"], "search");
        assert_eq!(json["filters"]["city"], "Decatur");
        assert_eq!(json["listings"][0]["id"], 3);
        assert!(json["listings"][0]["score"].as_f64().is_some());
        assert!(json["listings"][0]["reasons"].is_array());
    }

    #[test]
    fn rent_is_formatted_with_thousands_separator() {
        assert_eq!(format_rent(750), "750");
        assert_eq!(format_rent(1250), "1,250");
        assert_eq!(format_rent(1_000_000), "1,000,000");
    }
}
