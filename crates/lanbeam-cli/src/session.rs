/// The session controller: one role decision, one workflow, one guaranteed
/// cleanup. There is no retry loop and no re-advertisement; a session runs
/// exactly once and the process exits after it reaches a terminal state.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use lanbeam_discovery::{find, register, Advertisement};
use lanbeam_transfer::{receive_file, send_file};

use crate::config::Config;
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Advertising,
    AwaitingConnection,
    Discovering,
    Connecting,
    Transferring,
    Completed,
    Failed,
}

impl SessionState {
    /// Legal transitions of the session state machine. `Failed` is reachable
    /// from anywhere; `Completed` directly from `Discovering` covers the
    /// no-peer-found session that ends without a transfer.
    fn permits(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Advertising)
                | (Idle, Discovering)
                | (Advertising, AwaitingConnection)
                | (AwaitingConnection, Transferring)
                | (Discovering, Connecting)
                | (Discovering, Completed)
                | (Connecting, Transferring)
                | (Transferring, Completed)
                | (_, Failed)
        )
    }
}

/// Everything a session may be holding at an interruption point. Owned by
/// the controller rather than scattered in globals, so the interrupt path
/// can release it explicitly, in order, and more than once.
#[derive(Default)]
pub struct SessionResources {
    advertisement: Option<Advertisement>,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
}

impl SessionResources {
    /// Release in the order the cancellation contract requires: connection
    /// and listener sockets first, then the service registration. Idempotent.
    pub fn release(&mut self) {
        if self.stream.take().is_some() {
            debug!("connection closed");
        }
        if self.listener.take().is_some() {
            debug!("listener closed");
        }
        if let Some(mut ad) = self.advertisement.take() {
            ad.unregister();
        }
    }
}

/// What a completed session produced.
#[derive(Debug)]
pub enum SessionOutcome {
    Sent { bytes: u64, peer: SocketAddr },
    Received { path: PathBuf },
    /// Discovery timed out; the session ended without a transfer.
    NotFound,
}

pub struct Session {
    config: Config,
    state: SessionState,
    resources: SessionResources,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            resources: SessionResources::default(),
        }
    }

    /// Release whatever the session still holds. Used by the interrupt path
    /// and safe to call at any point, including after a normal finish.
    pub fn shutdown(&mut self) {
        self.resources.release();
    }

    /// Run the single workflow for `role`, then release all resources.
    /// Terminal state is `Completed` or `Failed` regardless of path.
    pub async fn run(
        &mut self,
        role: Role,
        source: Option<&Path>,
    ) -> anyhow::Result<SessionOutcome> {
        let result = match role {
            Role::Sender => {
                let source =
                    source.ok_or_else(|| anyhow!("sender role requires a file to send"))?;
                self.run_sender(source).await
            }
            Role::Receiver => self.run_receiver().await,
        };
        match &result {
            Ok(_) => self.set_state(SessionState::Completed),
            Err(_) => self.set_state(SessionState::Failed),
        }
        self.resources.release();
        result
    }

    async fn run_sender(&mut self, source: &Path) -> anyhow::Result<SessionOutcome> {
        self.set_state(SessionState::Advertising);
        let ad = register(
            &self.config.service_type,
            &self.config.instance,
            self.config.port,
        )
        .context("advertising the service")?;
        let bind_addr = SocketAddr::from((ad.address(), self.config.port));
        self.resources.advertisement = Some(ad);

        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("binding the transfer listener on {bind_addr}"))?;
        self.resources.listener = Some(listener);

        self.set_state(SessionState::AwaitingConnection);
        info!(%bind_addr, "waiting for a peer to connect");
        let listener = self
            .resources
            .listener
            .as_ref()
            .ok_or_else(|| anyhow!("listener released while awaiting a peer"))?;
        let (stream, peer) = listener
            .accept()
            .await
            .context("accepting a peer connection")?;
        info!(%peer, "peer connected");
        self.resources.stream = Some(stream);

        self.set_state(SessionState::Transferring);
        let stream = self
            .resources
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("connection released mid-session"))?;
        let bytes = send_file(stream, source)
            .await
            .context("sending the file")?;

        Ok(SessionOutcome::Sent { bytes, peer })
    }

    async fn run_receiver(&mut self) -> anyhow::Result<SessionOutcome> {
        self.set_state(SessionState::Discovering);
        let peer = find(&self.config.service_type, self.config.find_timeout)
            .await
            .context("discovering a sender")?;
        let Some(peer) = peer else {
            info!(
                timeout = ?self.config.find_timeout,
                "no sender found; ending the session without a transfer"
            );
            return Ok(SessionOutcome::NotFound);
        };

        self.set_state(SessionState::Connecting);
        let endpoint = SocketAddr::from((peer.address, peer.port));
        let stream = TcpStream::connect(endpoint)
            .await
            .with_context(|| format!("connecting to {endpoint}"))?;
        self.resources.stream = Some(stream);

        self.set_state(SessionState::Transferring);
        let stream = self
            .resources
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("connection released mid-session"))?;
        let path = receive_file(stream, &self.config.dest_dir)
            .await
            .context("receiving the file")?;

        Ok(SessionOutcome::Received { path })
    }

    fn set_state(&mut self, next: SessionState) {
        debug_assert!(
            self.state.permits(next),
            "illegal session transition {:?} -> {next:?}",
            self.state
        );
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;

    use super::*;
    use SessionState::*;

    #[test]
    fn state_machine_permits_both_role_paths() {
        // Sender: Idle -> Advertising -> AwaitingConnection -> Transferring -> Completed
        assert!(Idle.permits(Advertising));
        assert!(Advertising.permits(AwaitingConnection));
        assert!(AwaitingConnection.permits(Transferring));
        assert!(Transferring.permits(Completed));

        // Receiver: Idle -> Discovering -> Connecting -> Transferring -> Completed
        assert!(Idle.permits(Discovering));
        assert!(Discovering.permits(Connecting));
        assert!(Connecting.permits(Transferring));

        // Discovery timeout ends the session without a transfer.
        assert!(Discovering.permits(Completed));
    }

    #[test]
    fn failure_is_reachable_from_every_phase() {
        for state in [
            Idle,
            Advertising,
            AwaitingConnection,
            Discovering,
            Connecting,
            Transferring,
        ] {
            assert!(state.permits(Failed), "{state:?} cannot fail");
        }
    }

    #[test]
    fn state_machine_rejects_shortcuts() {
        assert!(!Idle.permits(Transferring));
        assert!(!Advertising.permits(Connecting));
        assert!(!Completed.permits(Advertising));
        assert!(!Transferring.permits(Discovering));
    }

    #[tokio::test]
    async fn interrupt_mid_transfer_releases_all_resources() {
        let dest = tempfile::tempdir().unwrap();
        let mut session = Session::new(Config {
            service_type: "_lanbeam-test._tcp.local.".into(),
            instance: "MyServer".into(),
            port: 0,
            dest_dir: dest.path().to_path_buf(),
            find_timeout: Duration::from_secs(1),
        });

        // Hold the sockets exactly the way a live session does while
        // `Transferring`: listener bound, peer connection accepted.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listen_addr = listener.local_addr().unwrap();
        let mut peer = TcpStream::connect(listen_addr).await.unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        session.resources.listener = Some(listener);
        session.resources.stream = Some(stream);

        // The peer never sends a byte, so the transfer stalls where an
        // operator interrupt would find it. Race it against a deadline the
        // way main races the session future against the shutdown signal;
        // losing the race drops the transfer future mid-await.
        let dest_dir = session.config.dest_dir.clone();
        let resources = &mut session.resources;
        tokio::select! {
            result = async {
                let stream = resources.stream.as_mut().unwrap();
                receive_file(stream, &dest_dir).await
            } => panic!("stalled transfer completed: {result:?}"),
            _ = tokio::time::sleep(Duration::from_millis(100)) => {}
        }

        session.shutdown();

        // The connection was closed: the silent peer observes EOF promptly
        // instead of hanging.
        let mut buf = [0u8; 1];
        assert_eq!(peer.read(&mut buf).await.unwrap(), 0);

        // The listener was closed: its port is immediately rebindable.
        TcpListener::bind(listen_addr)
            .await
            .expect("listener port still held after shutdown");
    }

    #[tokio::test]
    async fn resource_release_is_idempotent() {
        let mut resources = SessionResources::default();
        resources.listener = Some(TcpListener::bind("127.0.0.1:0").await.unwrap());

        resources.release();
        assert!(resources.listener.is_none());
        // A second release must be a no-op, as the interrupt path may run
        // after a session already cleaned up.
        resources.release();
    }
}
