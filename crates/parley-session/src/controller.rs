use crate::conversation::{Conversation, TransportKind};
use crate::history::HistoryEntry;
use parley_channels::{
    AssistantTransport, AssistantTurn, AttachmentUploader, DuplexEvent, DuplexHandle,
    DuplexTransport, HttpAssistant, HttpAttachmentUploader, LinkState, TurnRole,
    WebSocketTransport,
};
use parley_core::{
    decode, encode, present, AppContext, ClientConfig, Contact, ConversationId, Identity, Message,
    ParleyError, ParleyResult, Presentation,
};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How many optimistic sends are remembered while waiting for their echo.
const ECHO_WINDOW: usize = 32;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The services a controller talks through.
pub struct Transports {
    pub duplex: Arc<dyn DuplexTransport>,
    pub assistant: Arc<dyn AssistantTransport>,
    pub attachments: Arc<dyn AttachmentUploader>,
}

impl Transports {
    /// WebSocket chat, HTTP assistant and HTTP uploads, as configured.
    pub fn from_config(config: &ClientConfig, ctx: &AppContext) -> ParleyResult<Self> {
        Ok(Self {
            duplex: Arc::new(WebSocketTransport::from_config(config)),
            assistant: Arc::new(HttpAssistant::from_config(config, ctx.credential().clone())?),
            attachments: Arc::new(HttpAttachmentUploader::from_config(
                config,
                ctx.credential().clone(),
            )?),
        })
    }
}

/// Controller tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Consume the chat service's echo of our own sends instead of appending
    /// them a second time.
    pub echo_suppression: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            echo_suppression: true,
        }
    }
}

impl From<&ClientConfig> for ControllerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            echo_suppression: config.echo_suppression,
        }
    }
}

/// Lifecycle of the active session as the controller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No target selected.
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What [`SessionController::send_outbound`] did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the duplex link and appended.
    Sent,
    /// Appended; the assistant's reply will arrive as an event.
    AwaitingReply,
    /// Blank input, or an exchange is already outstanding.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    TransportUnavailable,
    ExchangeFailure,
    UploadFailure,
    ChannelError,
    /// A service refused the credential.
    AuthRejected,
}

/// A non-fatal failure for the presentation layer to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub detail: String,
}

impl Notice {
    fn from_error(kind: NoticeKind, err: &ParleyError) -> Self {
        let kind = if err.is_auth() {
            NoticeKind::AuthRejected
        } else {
            kind
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }
}

/// Everything the presentation layer needs to react to, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new, empty conversation became active.
    TargetSelected {
        conversation: ConversationId,
        target: Contact,
    },
    StateChanged(SessionState),
    /// A message was appended to the active conversation.
    Appended(Message),
    Notice(Notice),
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// Identifies the selection an off-loop result belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    epoch: u64,
    conversation: ConversationId,
}

enum Outcome {
    Reply {
        tag: Tag,
        result: ParleyResult<String>,
    },
    Uploaded {
        tag: Tag,
        filename: String,
        media_type: String,
        result: ParleyResult<String>,
    },
    Restored {
        tag: Tag,
        result: ParleyResult<Vec<AssistantTurn>>,
    },
}

impl Outcome {
    fn tag(&self) -> &Tag {
        match self {
            Outcome::Reply { tag, .. }
            | Outcome::Uploaded { tag, .. }
            | Outcome::Restored { tag, .. } => tag,
        }
    }
}

enum Step {
    Link(Option<DuplexEvent>),
    Outcome(Outcome),
}

struct Session {
    state: SessionState,
    link: Option<DuplexHandle>,
    events: Option<mpsc::Receiver<DuplexEvent>>,
    awaiting_reply: bool,
    restoring: bool,
    unechoed: VecDeque<Message>,
    /// History the service is expected to replay after a reconnect, in order.
    replay_pending: VecDeque<Message>,
}

impl Session {
    fn request_reply() -> Self {
        Self {
            state: SessionState::Open,
            link: None,
            events: None,
            awaiting_reply: false,
            restoring: false,
            unechoed: VecDeque::new(),
            replay_pending: VecDeque::new(),
        }
    }

    fn linked(mut link: DuplexHandle) -> Self {
        let events = link.take_event_receiver();
        Self {
            state: SessionState::Connecting,
            link: Some(link),
            events,
            ..Self::request_reply()
        }
    }

    fn unlinked() -> Self {
        Self {
            state: SessionState::Closed,
            ..Self::request_reply()
        }
    }

    fn is_closed(&self) -> bool {
        match &self.link {
            Some(link) => self.state == SessionState::Closed || link.state() == LinkState::Closed,
            None => true,
        }
    }

    /// Encode and hand `message` to the link.
    fn transmit(&mut self, message: &Message, remember_echo: bool) -> ParleyResult<()> {
        let link = self
            .link
            .as_ref()
            .ok_or_else(|| ParleyError::TransportUnavailable("no duplex link".into()))?;
        link.send(encode(message)?)?;
        if remember_echo {
            self.unechoed.push_back(message.clone());
            if self.unechoed.len() > ECHO_WINDOW {
                self.unechoed.pop_front();
            }
        }
        Ok(())
    }

    /// Whether `message` is the echo of the oldest unechoed send.
    fn consume_echo(&mut self, message: &Message) -> bool {
        if self.unechoed.front() == Some(message) {
            self.unechoed.pop_front();
            true
        } else {
            false
        }
    }

    /// Whether `message` is a replay of history we already hold.
    ///
    /// Replayed lines arrive in history order; anything we hold that the
    /// service never stored (notices) is skipped over. The first line not
    /// found ends the replay.
    fn consume_replay(&mut self, message: &Message) -> bool {
        match self.replay_pending.iter().position(|m| m == message) {
            Some(pos) => {
                self.replay_pending.drain(..=pos);
                true
            }
            None => {
                self.replay_pending.clear();
                false
            }
        }
    }
}

struct Active {
    conversation: Conversation,
    session: Session,
}

fn runtime() -> ParleyResult<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current()
        .map_err(|e| ParleyError::TransportUnavailable(format!("no async runtime: {e}")))
}

async fn next_link_event(events: Option<&mut mpsc::Receiver<DuplexEvent>>) -> Option<DuplexEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns the single active conversation and its transport session.
///
/// Methods never wait on the network. Link events and the results of
/// exchanges, uploads and history fetches are applied when the owner drains
/// [`next_event`](Self::next_event); results that belong to an earlier
/// selection are dropped.
pub struct SessionController {
    ctx: AppContext,
    assistant: Contact,
    transports: Transports,
    options: ControllerOptions,
    active: Option<Active>,
    assistant_conversation: Option<ConversationId>,
    epoch: u64,
    queued: VecDeque<SessionEvent>,
    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
    shut_down: bool,
}

impl SessionController {
    /// Create a controller over the given transports.
    ///
    /// * `ctx` – The signed-in user.
    /// * `assistant` – Identity the assistant contact is known by.
    pub fn new(
        ctx: AppContext,
        assistant: impl Into<Identity>,
        transports: Transports,
        options: ControllerOptions,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            assistant: Contact::assistant(assistant),
            transports,
            options,
            active: None,
            assistant_conversation: None,
            epoch: 0,
            queued: VecDeque::new(),
            outcomes_tx,
            outcomes_rx,
            shut_down: false,
        }
    }

    /// Validate `config` and build a controller on the configured services.
    pub fn connect(config: &ClientConfig, ctx: AppContext) -> ParleyResult<Self> {
        config.validate()?;
        let transports = Transports::from_config(config, &ctx)?;
        info!(
            user = %ctx.identity(),
            api = %config.api_base_url,
            ws = %config.ws_base_url,
            "Session controller ready"
        );
        Ok(Self::new(
            ctx,
            config.assistant_identity.as_str(),
            transports,
            ControllerOptions::from(config),
        ))
    }

    pub fn identity(&self) -> &Identity {
        self.ctx.identity()
    }

    /// The assistant contact, for the top of the roster.
    pub fn assistant(&self) -> &Contact {
        &self.assistant
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.active.as_ref().map(|a| &a.conversation)
    }

    /// History of the active conversation; empty when nothing is selected.
    pub fn history(&self) -> &[HistoryEntry] {
        self.active
            .as_ref()
            .map(|a| a.conversation.history().entries())
            .unwrap_or_default()
    }

    pub fn session_state(&self) -> SessionState {
        self.active
            .as_ref()
            .map_or(SessionState::Idle, |a| a.session.state)
    }

    /// Whether an assistant exchange is outstanding for the active target.
    pub fn is_awaiting_reply(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.session.awaiting_reply)
    }

    /// The assistant conversation id, once the assistant has been selected.
    pub fn assistant_conversation_id(&self) -> Option<&ConversationId> {
        self.assistant_conversation.as_ref()
    }

    /// Alignment and rendering of `message` for the signed-in user.
    pub fn presentation(&self, message: &Message) -> Presentation {
        present(message, self.ctx.identity(), &self.assistant.identity)
    }

    /// Make `contact` the active target.
    ///
    /// The current session is closed and its history discarded first. A human
    /// gets a new duplex link; the assistant reuses this controller's
    /// conversation id and needs no link.
    pub fn select_target(&mut self, contact: Contact) {
        self.close_active("target changed");
        self.epoch += 1;

        let contact = if contact.is_assistant() || contact.identity == self.assistant.identity {
            self.assistant.clone()
        } else {
            contact
        };

        let id = if contact.is_assistant() {
            self.assistant_conversation
                .get_or_insert_with(ConversationId::generate)
                .clone()
        } else {
            ConversationId::duplex(self.ctx.identity(), &contact.identity)
        };
        info!(
            conversation = %id,
            target = %contact.identity,
            transport = %TransportKind::for_contact(&contact),
            "Target selected"
        );
        self.queued.push_back(SessionEvent::TargetSelected {
            conversation: id.clone(),
            target: contact.clone(),
        });

        let session = if contact.is_assistant() {
            Session::request_reply()
        } else {
            match self.transports.duplex.open(self.ctx.identity(), &contact.identity) {
                Ok(link) => Session::linked(link),
                Err(e) => {
                    warn!(peer = %contact.identity, error = %e, "Duplex link could not be opened");
                    self.notify(Notice::from_error(NoticeKind::TransportUnavailable, &e));
                    Session::unlinked()
                }
            }
        };
        self.queued.push_back(SessionEvent::StateChanged(session.state));
        self.active = Some(Active {
            conversation: Conversation::new(id, contact),
            session,
        });
    }

    /// Decode a duplex payload and append it.
    ///
    /// Only accepted while the active session is an open duplex link. Returns
    /// whether anything was appended; an echo of our own send is consumed
    /// without appending.
    pub fn receive_inbound(&mut self, payload: &str) -> bool {
        let Some(active) = self.active.as_mut() else {
            debug!("Inbound payload with no target, dropped");
            return false;
        };
        if active.conversation.transport() != TransportKind::Duplex
            || active.session.state != SessionState::Open
        {
            debug!(
                conversation = %active.conversation.id(),
                state = %active.session.state,
                "Inbound payload outside an open duplex session, dropped"
            );
            return false;
        }

        let message = decode(payload);
        if !active.session.replay_pending.is_empty() && active.session.consume_replay(&message) {
            debug!(conversation = %active.conversation.id(), "Replayed line already in history");
            return false;
        }
        if self.options.echo_suppression && active.session.consume_echo(&message) {
            debug!(conversation = %active.conversation.id(), "Own echo suppressed");
            return false;
        }
        active.conversation.append(message.clone());
        self.queued.push_back(SessionEvent::Appended(message));
        true
    }

    /// Send a text message to the active target.
    ///
    /// Blank input is ignored. Over a duplex link the message is appended once
    /// the link accepted it; a closed link yields
    /// [`ParleyError::TransportUnavailable`] and nothing is appended. With the
    /// assistant the message is appended at once and the reply follows as an
    /// event; input is ignored while a reply is outstanding.
    pub fn send_outbound(&mut self, body: &str) -> ParleyResult<SendOutcome> {
        if body.trim().is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let tag = self.current_tag()?;
        let me = self.ctx.identity().clone();
        let active = self
            .active
            .as_mut()
            .ok_or(ParleyError::NoActiveConversation)?;

        match active.conversation.transport() {
            TransportKind::Duplex => {
                let message = Message::text(me, body);
                if let Err(e) = active
                    .session
                    .transmit(&message, self.options.echo_suppression)
                {
                    warn!(conversation = %tag.conversation, error = %e, "Send dropped, link not open");
                    return Err(e);
                }
                active.conversation.append(message.clone());
                self.queued.push_back(SessionEvent::Appended(message));
                Ok(SendOutcome::Sent)
            }
            TransportKind::RequestReply => {
                if active.session.awaiting_reply {
                    debug!(conversation = %tag.conversation, "Exchange outstanding, input ignored");
                    return Ok(SendOutcome::Ignored);
                }
                let runtime = runtime()?;
                let message = Message::text(me, body);
                active.conversation.append(message.clone());
                self.queued.push_back(SessionEvent::Appended(message));
                active.session.awaiting_reply = true;

                let assistant = Arc::clone(&self.transports.assistant);
                let outcomes = self.outcomes_tx.clone();
                let body = body.to_string();
                debug!(conversation = %tag.conversation, "Starting assistant exchange");
                runtime.spawn(async move {
                    let result = assistant.exchange(&tag.conversation, &body).await;
                    let _ = outcomes.send(Outcome::Reply { tag, result });
                });
                Ok(SendOutcome::AwaitingReply)
            }
        }
    }

    /// Upload an attachment and, once stored, share it with the active target.
    ///
    /// Peers receive a file message over the link; with the assistant the file
    /// message is only recorded locally.
    pub fn send_attachment(
        &mut self,
        content: Vec<u8>,
        filename: &str,
        media_type: &str,
    ) -> ParleyResult<()> {
        let tag = self.current_tag()?;
        let runtime = runtime()?;
        let uploader = Arc::clone(&self.transports.attachments);
        let outcomes = self.outcomes_tx.clone();
        let (filename, media_type) = (filename.to_string(), media_type.to_string());
        info!(conversation = %tag.conversation, filename = %filename, bytes = content.len(), "Uploading attachment");
        runtime.spawn(async move {
            let result = uploader.upload(content, &filename, &media_type).await;
            let _ = outcomes.send(Outcome::Uploaded {
                tag,
                filename,
                media_type,
                result,
            });
        });
        Ok(())
    }

    /// Fetch the assistant's stored transcript into an empty assistant
    /// conversation. Returns whether a fetch was started.
    pub fn restore_assistant_history(&mut self) -> ParleyResult<bool> {
        let tag = self.current_tag()?;
        let Some(active) = self.active.as_mut() else {
            return Err(ParleyError::NoActiveConversation);
        };
        if active.conversation.transport() != TransportKind::RequestReply
            || !active.conversation.history().is_empty()
            || active.session.awaiting_reply
            || active.session.restoring
        {
            return Ok(false);
        }
        let runtime = runtime()?;
        active.session.restoring = true;

        let assistant = Arc::clone(&self.transports.assistant);
        let outcomes = self.outcomes_tx.clone();
        debug!(conversation = %tag.conversation, "Fetching assistant transcript");
        runtime.spawn(async move {
            let result = assistant.history(&tag.conversation).await;
            let _ = outcomes.send(Outcome::Restored { tag, result });
        });
        Ok(true)
    }

    /// Reopen a closed duplex link to the same peer, keeping the history.
    ///
    /// Returns `Ok(false)` when there is nothing to reconnect (assistant
    /// target, or the link is still alive).
    pub fn reconnect(&mut self) -> ParleyResult<bool> {
        let active = self
            .active
            .as_ref()
            .ok_or(ParleyError::NoActiveConversation)?;
        if active.conversation.transport() != TransportKind::Duplex || !active.session.is_closed()
        {
            return Ok(false);
        }
        let peer = active.conversation.target().identity.clone();
        let link = self.transports.duplex.open(self.ctx.identity(), &peer)?;

        if let Some(active) = self.active.as_mut() {
            info!(conversation = %active.conversation.id(), peer = %peer, "Reconnecting duplex link");
            active.session = Session::linked(link);
            active.session.replay_pending =
                active.conversation.history().messages().cloned().collect();
            self.queued
                .push_back(SessionEvent::StateChanged(active.session.state));
        }
        Ok(true)
    }

    /// Close the active session. Later calls to [`next_event`](Self::next_event)
    /// return the remaining queued events, then `None`.
    pub fn shutdown(&mut self) {
        self.close_active("shutdown");
        self.shut_down = true;
        info!(user = %self.ctx.identity(), "Session controller shut down");
    }

    /// Wait for the next event, applying link traffic and finished background
    /// work as it arrives.
    ///
    /// Returns `None` only after [`shutdown`](Self::shutdown).
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(event);
            }
            if self.shut_down {
                return None;
            }

            let step = {
                let link_events = self.active.as_mut().and_then(|a| a.session.events.as_mut());
                tokio::select! {
                    event = next_link_event(link_events) => Step::Link(event),
                    Some(outcome) = self.outcomes_rx.recv() => Step::Outcome(outcome),
                }
            };

            match step {
                Step::Link(Some(event)) => self.on_link_event(event),
                Step::Link(None) => {
                    if let Some(active) = self.active.as_mut() {
                        active.session.events = None;
                    }
                }
                Step::Outcome(outcome) => self.on_outcome(outcome),
            }
        }
    }

    fn current_tag(&self) -> ParleyResult<Tag> {
        let active = self
            .active
            .as_ref()
            .ok_or(ParleyError::NoActiveConversation)?;
        Ok(Tag {
            epoch: self.epoch,
            conversation: active.conversation.id().clone(),
        })
    }

    fn is_current(&self, tag: &Tag) -> bool {
        tag.epoch == self.epoch
            && self
                .active
                .as_ref()
                .is_some_and(|a| a.conversation.id() == &tag.conversation)
    }

    fn notify(&mut self, notice: Notice) {
        self.queued.push_back(SessionEvent::Notice(notice));
    }

    fn append(&mut self, message: Message) {
        if let Some(active) = self.active.as_mut() {
            active.conversation.append(message.clone());
            self.queued.push_back(SessionEvent::Appended(message));
        }
    }

    fn close_active(&mut self, reason: &str) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(link) = &active.session.link {
            link.close();
        }
        info!(
            conversation = %active.conversation.id(),
            reason,
            discarded = active.conversation.history().len(),
            "Session closed"
        );
        if active.session.state != SessionState::Closed {
            self.queued
                .push_back(SessionEvent::StateChanged(SessionState::Closing));
            self.queued
                .push_back(SessionEvent::StateChanged(SessionState::Closed));
        }
    }

    fn on_link_event(&mut self, event: DuplexEvent) {
        match event {
            DuplexEvent::Payload(payload) => {
                self.receive_inbound(&payload);
            }
            DuplexEvent::Opened => {
                if let Some(active) = self.active.as_mut() {
                    if active.session.state == SessionState::Connecting {
                        active.session.state = SessionState::Open;
                        info!(peer = %active.conversation.target().identity, "Session open");
                        self.queued
                            .push_back(SessionEvent::StateChanged(SessionState::Open));
                    }
                }
            }
            DuplexEvent::Errored(detail) => {
                warn!(detail = %detail, "Duplex link error");
                self.notify(Notice {
                    kind: NoticeKind::ChannelError,
                    detail,
                });
            }
            DuplexEvent::Closed => {
                if let Some(active) = self.active.as_mut() {
                    active.session.state = SessionState::Closed;
                    active.session.unechoed.clear();
                    active.session.replay_pending.clear();
                    info!(peer = %active.conversation.target().identity, "Session link closed");
                    self.queued
                        .push_back(SessionEvent::StateChanged(SessionState::Closed));
                }
            }
        }
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        if !self.is_current(outcome.tag()) {
            let tag = outcome.tag();
            debug!(
                conversation = %tag.conversation,
                epoch = tag.epoch,
                current_epoch = self.epoch,
                "Dropping result for an earlier selection"
            );
            return;
        }

        match outcome {
            Outcome::Reply { tag, result } => {
                if let Some(active) = self.active.as_mut() {
                    active.session.awaiting_reply = false;
                }
                match result {
                    Ok(reply) => self.append(Message::text(self.assistant.identity.clone(), reply)),
                    Err(e) => {
                        warn!(conversation = %tag.conversation, error = %e, "Assistant exchange failed");
                        self.notify(Notice::from_error(NoticeKind::ExchangeFailure, &e));
                    }
                }
            }
            Outcome::Uploaded {
                tag,
                filename,
                media_type,
                result,
            } => match result {
                Ok(locator) => self.share_file(filename, media_type, locator),
                Err(e) => {
                    warn!(conversation = %tag.conversation, filename = %filename, error = %e, "Attachment upload failed");
                    self.notify(Notice::from_error(NoticeKind::UploadFailure, &e));
                }
            },
            Outcome::Restored { tag, result } => {
                if let Some(active) = self.active.as_mut() {
                    active.session.restoring = false;
                }
                match result {
                    Ok(turns) => self.apply_transcript(turns),
                    Err(e) => {
                        warn!(conversation = %tag.conversation, error = %e, "Assistant transcript unavailable");
                        self.notify(Notice::from_error(NoticeKind::ExchangeFailure, &e));
                    }
                }
            }
        }
    }

    fn share_file(&mut self, filename: String, media_type: String, locator: String) {
        let message = Message::file(self.ctx.identity().clone(), filename, media_type, locator);
        let echo = self.options.echo_suppression;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.conversation.transport() == TransportKind::Duplex {
            if let Err(e) = active.session.transmit(&message, echo) {
                warn!(conversation = %active.conversation.id(), error = %e, "Uploaded file not shared");
                self.notify(Notice::from_error(NoticeKind::TransportUnavailable, &e));
                return;
            }
        } else {
            debug!(conversation = %active.conversation.id(), "File recorded locally for the assistant conversation");
        }
        self.append(message);
    }

    fn apply_transcript(&mut self, turns: Vec<AssistantTurn>) {
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if !active.conversation.history().is_empty() {
            debug!(conversation = %active.conversation.id(), "History already started, transcript ignored");
            return;
        }
        let me = self.ctx.identity().clone();
        let assistant = self.assistant.identity.clone();
        for turn in turns {
            let sender = match turn.role {
                TurnRole::User => me.clone(),
                TurnRole::Assistant => assistant.clone(),
                TurnRole::System | TurnRole::Other => continue,
            };
            self.append(Message::text(sender, turn.content));
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("identity", self.ctx.identity())
            .field("conversation", &self.conversation().map(Conversation::id))
            .field("state", &self.session_state())
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}
