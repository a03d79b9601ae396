//! Conversation view-state: the transcript, the one outstanding request, and
//! the derived display list.
//!
//! A turn is `begin_submit` (user message appended, state goes to
//! `AwaitingReply`) followed by exactly one `complete` for the returned
//! ticket. `complete` is the only way back to `Idle` apart from `reset`.

use crate::format::{self, Block};
use crate::state::{Message, PendingState, Role};
use crate::transport::{self, ChatReply, ChatRequest, Transport, TransportError};
use crate::view::ViewState;

/// First message of every conversation
pub const GREETING: &str = "Bienvenue dans votre assistant juridique tunisien. \
Je peux vous aider à comprendre les lois et réglementations tunisiennes. \
Posez-moi une question sur le droit tunisien.";

/// Transcript entry appended for any failed request
pub const APOLOGY: &str =
    "Une erreur s'est produite lors de la communication avec le serveur. Veuillez réessayer.";

/// Identifies one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A request that has been recorded in the transcript and must now be sent
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request: ChatRequest,
}

/// What `complete` did with a transport result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Replied,
    Failed(TransportError),
    /// The ticket was abandoned by a reset; nothing changed
    Discarded,
}

/// A transcript entry ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Position in the full transcript
    pub index: usize,
    pub role: Role,
    pub blocks: Vec<Block>,
    /// Cited documents, assistant replies only
    pub sources: Vec<String>,
}

pub struct Conversation {
    conversation_id: String,
    transcript: Vec<Message>,
    input: String,
    last_error: Option<TransportError>,
    in_flight: Option<Ticket>,
    next_ticket: u64,
    pub view: ViewState,
}

impl Conversation {
    pub fn new(conversation_id: &str, view: ViewState) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            transcript: vec![Message::assistant(GREETING)],
            input: String::new(),
            last_error: None,
            in_flight: None,
            next_ticket: 0,
            view,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn state(&self) -> PendingState {
        if self.in_flight.is_some() {
            PendingState::AwaitingReply
        } else {
            PendingState::Idle
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.state() == PendingState::AwaitingReply
    }

    /// Failure of the last request, until the next submission
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    /// Banner text for the last failure in the current display language
    pub fn banner(&self) -> Option<String> {
        self.last_error
            .as_ref()
            .map(|err| err.banner(self.view.locale()))
    }

    /// Record the typed message and hand back the request to send.
    ///
    /// Returns `None` without touching anything when the input is blank or a
    /// reply is still outstanding.
    pub fn begin_submit(&mut self) -> Option<PendingRequest> {
        if self.input.trim().is_empty() || self.is_awaiting_reply() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.transcript.push(Message::user(text.as_str()));
        self.last_error = None;

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        let request = ChatRequest::new(&text, &self.conversation_id, Some(self.view.language));
        tracing::info!(
            ticket = ticket.0,
            language = self.view.language.as_str(),
            chars = text.chars().count(),
            "dispatching message"
        );
        Some(PendingRequest { ticket, request })
    }

    /// Fold a transport result into the transcript and return to `Idle`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<ChatReply, TransportError>,
    ) -> Outcome {
        if self.in_flight != Some(ticket) {
            tracing::info!(ticket = ticket.0, "discarding reply for abandoned request");
            return Outcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(reply) => {
                tracing::info!(ticket = ticket.0, "reply received");
                self.transcript.push(Message::assistant(reply.response));
                Outcome::Replied
            }
            Err(err) => {
                tracing::warn!(ticket = ticket.0, error = %err, "request failed");
                self.transcript.push(Message::system(APOLOGY));
                self.last_error = Some(err.clone());
                Outcome::Failed(err)
            }
        }
    }

    /// Submit the input buffer and wait for the reply.
    pub async fn submit(&mut self, transport: &dyn Transport) -> Option<Outcome> {
        let pending = self.begin_submit()?;
        let result = transport::send_guarded(transport, &pending.request).await;
        Some(self.complete(pending.ticket, result))
    }

    /// Start over with only the greeting. Any request still in flight is
    /// abandoned and its reply will be discarded.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::info!(ticket = ticket.0, "abandoning in-flight request on reset");
        }
        self.transcript = vec![Message::assistant(GREETING)];
        self.view.filter.clear();
        self.last_error = None;
    }

    pub fn rendered(&self) -> Vec<RenderedMessage> {
        render(&self.transcript, &self.view)
    }
}

/// Filter the transcript by `view.filter` and format what remains.
pub fn render(transcript: &[Message], view: &ViewState) -> Vec<RenderedMessage> {
    let needle = view.filter.to_lowercase();

    transcript
        .iter()
        .enumerate()
        .filter(|(_, msg)| needle.is_empty() || msg.content.to_lowercase().contains(&needle))
        .map(|(index, msg)| match msg.role {
            Role::Assistant => RenderedMessage {
                index,
                role: msg.role,
                blocks: format::format_reply(&msg.content),
                sources: format::extract_sources(&msg.content),
            },
            Role::User | Role::System => RenderedMessage {
                index,
                role: msg.role,
                blocks: format::plain_blocks(&msg.content),
                sources: Vec::new(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SpanKind;
    use crate::i18n::Locale;
    use crate::view::Language;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned results in order and records what it was sent
    struct ScriptedTransport {
        results: Mutex<Vec<Result<ChatReply, TransportError>>>,
        sent: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        fn new(mut results: Vec<Result<ChatReply, TransportError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::NoResponse("script exhausted".into())))
        }
    }

    struct PanickingTransport;

    #[async_trait]
    impl Transport for PanickingTransport {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, TransportError> {
            panic!("transport blew up");
        }
    }

    fn reply(text: &str) -> Result<ChatReply, TransportError> {
        Ok(ChatReply { response: text.to_string() })
    }

    fn conversation() -> Conversation {
        Conversation::new("123", ViewState::default())
    }

    #[test]
    fn test_starts_idle_with_greeting() {
        let conv = conversation();
        assert_eq!(conv.state(), PendingState::Idle);
        assert_eq!(conv.transcript(), &[Message::assistant(GREETING)]);
        assert!(conv.banner().is_none());
    }

    #[test]
    fn test_blank_input_is_a_no_op() {
        let mut conv = conversation();
        for text in ["", "   ", "\n\t"] {
            conv.set_input(text);
            assert!(conv.begin_submit().is_none());
            assert_eq!(conv.transcript().len(), 1);
            assert_eq!(conv.state(), PendingState::Idle);
        }
    }

    #[test]
    fn test_begin_submit_appends_user_message_before_dispatch() {
        let mut conv = conversation();
        conv.view.language = Language::Tunisian;
        conv.set_input("Quels sont mes droits?");

        let pending = conv.begin_submit().unwrap();

        assert_eq!(conv.transcript().last(), Some(&Message::user("Quels sont mes droits?")));
        assert_eq!(conv.input(), "");
        assert_eq!(conv.state(), PendingState::AwaitingReply);
        assert_eq!(
            pending.request,
            ChatRequest::new("Quels sont mes droits?", "123", Some(Language::Tunisian))
        );
    }

    #[test]
    fn test_submit_while_awaiting_is_rejected() {
        let mut conv = conversation();
        conv.set_input("première question");
        let first = conv.begin_submit().unwrap();

        conv.set_input("deuxième question");
        assert!(conv.begin_submit().is_none());
        assert_eq!(conv.transcript().len(), 2);
        assert_eq!(conv.input(), "deuxième question");

        assert_eq!(conv.complete(first.ticket, reply("ok")), Outcome::Replied);
        assert!(conv.begin_submit().is_some());
    }

    #[tokio::test]
    async fn test_scenario_reply_is_appended_and_highlighted() {
        let transport = ScriptedTransport::new(vec![reply("Selon l'article 5-2, ...")]);
        let mut conv = conversation();
        conv.set_input("Quels sont mes droits?");

        let outcome = conv.submit(&transport).await;

        assert_eq!(outcome, Some(Outcome::Replied));
        assert_eq!(conv.state(), PendingState::Idle);
        assert_eq!(
            &conv.transcript()[1..],
            &[
                Message::user("Quels sont mes droits?"),
                Message::assistant("Selon l'article 5-2, ..."),
            ]
        );

        let rendered = conv.rendered();
        let last = rendered.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.blocks[0]
            .spans
            .iter()
            .any(|s| s.kind == SpanKind::LegalReference && s.text == "article 5-2"));
    }

    #[tokio::test]
    async fn test_scenario_no_response() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::NoResponse(
            "connection refused".into(),
        ))]);
        let mut conv = conversation();
        conv.set_input("Bonjour");

        let outcome = conv.submit(&transport).await.unwrap();

        assert!(matches!(outcome, Outcome::Failed(TransportError::NoResponse(_))));
        assert_eq!(conv.transcript().len(), 3);
        assert_eq!(conv.transcript()[2], Message::system(APOLOGY));
        assert_eq!(
            conv.banner().as_deref(),
            Some("Aucune réponse du serveur. Vérifiez que le serveur est en cours d'exécution.")
        );
        assert_eq!(conv.state(), PendingState::Idle);
    }

    #[tokio::test]
    async fn test_every_outcome_returns_to_idle() {
        let transport = ScriptedTransport::new(vec![
            reply("ok"),
            Err(TransportError::Server { status: 500, detail: Some("boom".into()) }),
            Err(TransportError::NoResponse("timeout".into())),
            Err(TransportError::Dispatch("bad url".into())),
        ]);
        let mut conv = conversation();

        let mut banners = Vec::new();
        for i in 0..4 {
            conv.set_input(&format!("question {}", i));
            conv.submit(&transport).await.unwrap();
            assert_eq!(conv.state(), PendingState::Idle);
            banners.push(conv.banner());
        }

        assert_eq!(banners[0], None);
        assert_eq!(banners[1].as_deref(), Some("Erreur 500: boom"));
        assert_eq!(banners[3].as_deref(), Some("Erreur: bad url"));
        assert_ne!(banners[1], banners[2]);

        // All failures share the same transcript entry
        let system: Vec<&Message> = conv
            .transcript()
            .iter()
            .filter(|m| m.role == Role::System)
            .collect();
        assert_eq!(system.len(), 3);
        assert!(system.iter().all(|m| m.content == APOLOGY));
    }

    #[tokio::test]
    async fn test_transcript_alternates_in_dispatch_order() {
        let transport = ScriptedTransport::new(vec![
            reply("r0"),
            Err(TransportError::NoResponse("down".into())),
            reply("r2"),
        ]);
        let mut conv = conversation();

        let mut previous_len = conv.transcript().len();
        for i in 0..3 {
            conv.set_input(&format!("q{}", i));
            conv.submit(&transport).await;
            assert_eq!(conv.transcript().len(), previous_len + 2);
            previous_len = conv.transcript().len();
        }

        let roles: Vec<Role> = conv.transcript()[1..].iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::System, Role::User, Role::Assistant]
        );
        let sent: Vec<String> = transport.sent.lock().unwrap().iter().map(|r| r.message.clone()).collect();
        assert_eq!(sent, vec!["q0", "q1", "q2"]);
    }

    #[tokio::test]
    async fn test_panicking_transport_still_returns_to_idle() {
        let mut conv = conversation();
        conv.set_input("Bonjour");

        let outcome = conv.submit(&PanickingTransport).await.unwrap();

        assert!(matches!(outcome, Outcome::Failed(TransportError::Dispatch(_))));
        assert_eq!(conv.state(), PendingState::Idle);
        assert_eq!(conv.transcript().last(), Some(&Message::system(APOLOGY)));
    }

    #[test]
    fn test_banner_cleared_by_next_submission() {
        let mut conv = conversation();
        conv.set_input("a");
        let pending = conv.begin_submit().unwrap();
        conv.complete(pending.ticket, Err(TransportError::NoResponse("x".into())));
        assert!(conv.banner().is_some());

        conv.set_input("b");
        conv.begin_submit().unwrap();
        assert!(conv.banner().is_none());
    }

    #[test]
    fn test_banner_follows_display_language() {
        let mut conv = conversation();
        conv.set_input("a");
        let pending = conv.begin_submit().unwrap();
        conv.complete(pending.ticket, Err(TransportError::NoResponse("x".into())));

        let french = conv.banner();
        conv.view.language = Language::Tunisian;
        assert_eq!(conv.view.locale(), Locale::Arabic);
        assert_ne!(conv.banner(), french);
    }

    #[test]
    fn test_reset_after_activity() {
        let mut conv = conversation();
        conv.set_input("a");
        let pending = conv.begin_submit().unwrap();
        conv.complete(pending.ticket, Err(TransportError::NoResponse("x".into())));
        conv.view.filter = "droit".to_string();

        conv.reset();

        assert_eq!(conv.transcript(), &[Message::assistant(GREETING)]);
        assert!(conv.view.filter.is_empty());
        assert!(conv.banner().is_none());
        assert_eq!(conv.state(), PendingState::Idle);
    }

    #[test]
    fn test_reply_after_reset_is_discarded() {
        let mut conv = conversation();
        conv.set_input("a");
        let stale = conv.begin_submit().unwrap();

        conv.reset();
        assert_eq!(conv.state(), PendingState::Idle);

        conv.set_input("b");
        let fresh = conv.begin_submit().unwrap();

        assert_eq!(conv.complete(stale.ticket, reply("late")), Outcome::Discarded);
        assert_eq!(conv.state(), PendingState::AwaitingReply);
        assert_eq!(conv.transcript().len(), 2);

        assert_eq!(conv.complete(fresh.ticket, reply("fresh")), Outcome::Replied);
        assert_eq!(conv.transcript().last(), Some(&Message::assistant("fresh")));
    }

    #[test]
    fn test_render_empty_filter_is_identity() {
        let transcript = vec![
            Message::assistant(GREETING),
            Message::user("Quels sont mes droits?"),
            Message::assistant("Selon l'article 5-2, ..."),
            Message::system(APOLOGY),
        ];

        let rendered = render(&transcript, &ViewState::default());

        assert_eq!(rendered.len(), transcript.len());
        for (item, msg) in rendered.iter().zip(&transcript) {
            assert_eq!(item.role, msg.role);
            let text: Vec<String> = item.blocks.iter().map(|b| b.text()).collect();
            assert_eq!(text.join("\n"), msg.content);
        }
        assert_eq!(rendered.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_render_filter_is_case_insensitive_subsequence() {
        let transcript = vec![
            Message::assistant(GREETING),
            Message::user("Mon CONTRAT de travail"),
            Message::assistant("Le contrat est régi par l'article 6."),
            Message::user("merci"),
        ];
        let view = ViewState { filter: "Contrat".to_string(), ..ViewState::default() };

        let rendered = render(&transcript, &view);

        assert_eq!(rendered.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn test_render_extracts_sources_for_assistant_only() {
        let transcript = vec![
            Message::user("Document 1 (Code pénal, score: 0.9)"),
            Message::assistant("Voir Document 1 (Code pénal, score: 0.9)"),
        ];

        let rendered = render(&transcript, &ViewState::default());

        assert!(rendered[0].sources.is_empty());
        assert_eq!(rendered[1].sources, vec!["Code pénal"]);
    }

    #[test]
    fn test_user_messages_are_not_highlighted() {
        let transcript = vec![Message::user("l'article 5")];
        let rendered = render(&transcript, &ViewState::default());
        assert!(rendered[0].blocks[0]
            .spans
            .iter()
            .all(|s| s.kind == SpanKind::Plain));
    }
}
