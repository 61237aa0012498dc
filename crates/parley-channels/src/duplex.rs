use parley_core::{Identity, ParleyError, ParleyResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Lifecycle of a single duplex link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Connecting => "connecting",
            LinkState::Open => "open",
            LinkState::Closing => "closing",
            LinkState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What a duplex link reports to its owner, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplexEvent {
    Opened,
    Payload(String),
    Errored(String),
    Closed,
}

/// Instructions from the handle to whatever drives the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplexCommand {
    Send(String),
    Close,
}

/// Opens persistent links between the local identity and one peer.
///
/// `open` must not block: it starts the connection in the background and
/// returns a handle in [`LinkState::Connecting`].
pub trait DuplexTransport: Send + Sync {
    fn open(&self, me: &Identity, peer: &Identity) -> ParleyResult<DuplexHandle>;
}

/// The owner's side of a duplex link.
///
/// Sends are accepted only while the link is open. Dropping the handle closes
/// the link.
pub struct DuplexHandle {
    peer: Identity,
    state: Arc<watch::Sender<LinkState>>,
    commands: mpsc::UnboundedSender<DuplexCommand>,
    events: Option<mpsc::Receiver<DuplexEvent>>,
}

/// The connection driver's side of a duplex link.
pub struct DuplexEndpoint {
    state: Arc<watch::Sender<LinkState>>,
    commands: mpsc::UnboundedReceiver<DuplexCommand>,
    events: mpsc::Sender<DuplexEvent>,
}

impl DuplexHandle {
    /// Create a connected handle/endpoint pair in [`LinkState::Connecting`].
    ///
    /// * `peer` – The remote identity, used in diagnostics.
    /// * `event_buffer` – Capacity of the inbound event buffer.
    pub fn pair(peer: Identity, event_buffer: usize) -> (DuplexHandle, DuplexEndpoint) {
        let (state, _) = watch::channel(LinkState::Connecting);
        let state = Arc::new(state);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(1));
        let handle = DuplexHandle {
            peer,
            state: state.clone(),
            commands: command_tx,
            events: Some(event_rx),
        };
        let endpoint = DuplexEndpoint {
            state,
            commands: command_rx,
            events: event_tx,
        };
        (handle, endpoint)
    }

    pub fn peer(&self) -> &Identity {
        &self.peer
    }

    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Take the receiving half of the event channel.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<DuplexEvent>> {
        self.events.take()
    }

    /// Queue a payload for the peer. Fails unless the link is open; the
    /// payload is dropped, not buffered.
    pub fn send(&self, payload: String) -> ParleyResult<()> {
        let state = self.state();
        if state != LinkState::Open {
            return Err(ParleyError::TransportUnavailable(format!(
                "link to {} is {state}",
                self.peer
            )));
        }
        self.commands
            .send(DuplexCommand::Send(payload))
            .map_err(|_| {
                ParleyError::TransportUnavailable(format!("link to {} has shut down", self.peer))
            })
    }

    /// Begin closing. Idempotent; the state becomes `Closing` immediately and
    /// `Closed` once the driver has torn the connection down.
    pub fn close(&self) {
        let began = self.state.send_if_modified(|state| match state {
            LinkState::Connecting | LinkState::Open => {
                *state = LinkState::Closing;
                true
            }
            LinkState::Closing | LinkState::Closed => false,
        });
        if began {
            tracing::debug!(peer = %self.peer, "Closing duplex link");
            let _ = self.commands.send(DuplexCommand::Close);
        }
    }

    /// Wait until the link leaves `Connecting`; `Ok` only if it opened.
    pub async fn wait_open(&self) -> ParleyResult<()> {
        let mut rx = self.state.subscribe();
        let state = *rx
            .wait_for(|s| *s != LinkState::Connecting)
            .await
            .map_err(|_| {
                ParleyError::TransportUnavailable(format!("link to {} vanished", self.peer))
            })?;
        if state == LinkState::Open {
            Ok(())
        } else {
            Err(ParleyError::TransportUnavailable(format!(
                "link to {} is {state}",
                self.peer
            )))
        }
    }
}

impl Drop for DuplexHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for DuplexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplexHandle")
            .field("peer", &self.peer)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl DuplexEndpoint {
    pub fn state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// Next instruction from the handle; `None` once the handle is gone.
    pub async fn next_command(&mut self) -> Option<DuplexCommand> {
        self.commands.recv().await
    }

    /// Mark the link open and announce it. Returns `false` (and changes
    /// nothing) if the owner already started closing.
    pub async fn opened(&self) -> bool {
        let opened = self.state.send_if_modified(|state| {
            if *state == LinkState::Connecting {
                *state = LinkState::Open;
                true
            } else {
                false
            }
        });
        if opened {
            let _ = self.events.send(DuplexEvent::Opened).await;
        }
        opened
    }

    /// Forward an inbound payload. Returns `false` if nobody is listening.
    pub async fn deliver(&self, payload: String) -> bool {
        self.events.send(DuplexEvent::Payload(payload)).await.is_ok()
    }

    /// Report a connection error.
    pub async fn errored(&self, detail: impl Into<String>) {
        let _ = self.events.send(DuplexEvent::Errored(detail.into())).await;
    }

    /// Mark the link closed and announce it.
    pub async fn closed(&self) {
        self.state.send_replace(LinkState::Closed);
        let _ = self.events.send(DuplexEvent::Closed).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_requires_open_link() {
        let (handle, endpoint) = DuplexHandle::pair("alice".into(), 8);
        assert_eq!(handle.state(), LinkState::Connecting);
        assert!(matches!(
            handle.send("early".into()),
            Err(ParleyError::TransportUnavailable(_))
        ));

        assert!(endpoint.opened().await);
        handle.send("hi".into()).unwrap();
        assert_eq!(handle.state(), LinkState::Open);
    }

    #[tokio::test]
    async fn test_commands_reach_the_endpoint_in_order() {
        let (handle, mut endpoint) = DuplexHandle::pair("alice".into(), 8);
        endpoint.opened().await;
        handle.send("one".into()).unwrap();
        handle.send("two".into()).unwrap();
        handle.close();

        assert_eq!(
            endpoint.next_command().await,
            Some(DuplexCommand::Send("one".into()))
        );
        assert_eq!(
            endpoint.next_command().await,
            Some(DuplexCommand::Send("two".into()))
        );
        assert_eq!(endpoint.next_command().await, Some(DuplexCommand::Close));
    }

    #[tokio::test]
    async fn test_close_is_immediate_and_idempotent() {
        let (handle, mut endpoint) = DuplexHandle::pair("alice".into(), 8);
        endpoint.opened().await;
        handle.close();
        handle.close();
        assert_eq!(handle.state(), LinkState::Closing);
        assert!(handle.send("late".into()).is_err());

        assert_eq!(endpoint.next_command().await, Some(DuplexCommand::Close));
        endpoint.closed().await;
        assert_eq!(handle.state(), LinkState::Closed);
        drop(handle);
        assert_eq!(endpoint.next_command().await, None);
    }

    #[tokio::test]
    async fn test_endpoint_cannot_open_a_closing_link() {
        let (handle, endpoint) = DuplexHandle::pair("alice".into(), 8);
        handle.close();
        assert!(!endpoint.opened().await);
        assert_eq!(endpoint.state(), LinkState::Closing);
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (mut handle, endpoint) = DuplexHandle::pair("alice".into(), 8);
        let mut events = handle.take_event_receiver().unwrap();
        assert!(handle.take_event_receiver().is_none());

        endpoint.opened().await;
        assert!(endpoint.deliver("a".into()).await);
        endpoint.errored("flaky").await;
        endpoint.closed().await;

        assert_eq!(events.recv().await, Some(DuplexEvent::Opened));
        assert_eq!(events.recv().await, Some(DuplexEvent::Payload("a".into())));
        assert_eq!(events.recv().await, Some(DuplexEvent::Errored("flaky".into())));
        assert_eq!(events.recv().await, Some(DuplexEvent::Closed));
    }

    #[tokio::test]
    async fn test_wait_open_reports_outcome() {
        let (handle, endpoint) = DuplexHandle::pair("alice".into(), 8);
        let waiter = tokio::spawn(async move {
            let result = handle.wait_open().await;
            (handle, result)
        });
        endpoint.opened().await;
        let (_handle, result) = waiter.await.unwrap();
        assert!(result.is_ok());

        let (handle, endpoint) = DuplexHandle::pair("bob".into(), 8);
        endpoint.closed().await;
        assert!(handle.wait_open().await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_handle_sends_close() {
        let (handle, mut endpoint) = DuplexHandle::pair("alice".into(), 8);
        endpoint.opened().await;
        drop(handle);
        assert_eq!(endpoint.next_command().await, Some(DuplexCommand::Close));
        assert_eq!(endpoint.state(), LinkState::Closing);
    }
}
