//! services/oracle/src/app/runtime.rs
//!
//! The main control loop of the application. It owns the state machine and the
//! session observer subscription, applies UI commands, and delegates the network
//! calls to spawned tasks that report back through a completion channel.

use crate::app::{
    community::{registry_for, CommunityPanel},
    login::{AuthMode, Credentials, LoginForm},
    protocol::{UiCommand, ViewUpdate},
    state::{AppContext, LibrarySearch},
};
use crate::error::AppError;
use futures::StreamExt;
use literary_oracle_core::{
    AppView, LibraryLocation, OracleError, OracleResult, Preferences, SessionIdentity,
    StateMachine,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const SEARCH_STARTED: &str = "Sending ravens to the Citadel...";
pub const SEARCH_LOCATED: &str = "Consulting the maps...";
pub const NO_LOCATION: &str = "We need your location to find the nearest archives.";
pub const SEARCH_FAILED: &str = "The ravens were intercepted. Could not find nearby libraries.";

/// Results of work done off the loop.
#[derive(Debug)]
enum Completion {
    Recommendations(Result<OracleResult, OracleError>),
    Located {
        ticket: Uuid,
        book_title: String,
    },
    Libraries {
        ticket: Uuid,
        book_title: String,
        outcome: LibraryOutcome,
    },
}

#[derive(Debug)]
enum LibraryOutcome {
    Found(Vec<LibraryLocation>),
    NoLocation,
    Failed(OracleError),
}

pub struct OracleApp {
    ctx: AppContext,
    machine: StateMachine,
    login: LoginForm,
    library: LibrarySearch,
    community: CommunityPanel,
    updates: mpsc::UnboundedSender<ViewUpdate>,
    completions: mpsc::UnboundedSender<Completion>,
    completions_rx: Option<mpsc::UnboundedReceiver<Completion>>,
}

impl OracleApp {
    /// Creates the runtime. View updates are published on `updates`.
    pub fn new(ctx: AppContext, updates: mpsc::UnboundedSender<ViewUpdate>) -> Self {
        let (completions, completions_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            machine: StateMachine::new(),
            login: LoginForm::default(),
            library: LibrarySearch::default(),
            community: CommunityPanel::default(),
            updates,
            completions,
            completions_rx: Some(completions_rx),
        }
    }

    pub fn view(&self) -> AppView {
        self.machine.view()
    }

    pub fn result(&self) -> Option<&OracleResult> {
        self.machine.result()
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.machine.identity()
    }

    /// Runs until `shutdown` fires or the command channel closes. The identity
    /// subscription is acquired on entry and released on every exit path.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<UiCommand>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        let mut completions_rx = self
            .completions_rx
            .take()
            .ok_or_else(|| AppError::Internal("runtime is already running".to_string()))?;
        let mut auth_events = self.ctx.identity.on_auth_state_change();
        info!("Session observer subscribed.");
        self.publish_view();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested.");
                    break;
                }
                event = auth_events.next() => match event {
                    Some(identity) => self.on_auth_event(identity),
                    None => {
                        warn!("Identity provider closed the session stream.");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        info!("Front-end disconnected.");
                        break;
                    }
                },
                Some(done) = completions_rx.recv() => self.on_completion(done),
            }
        }

        drop(auth_events);
        info!("Session observer released.");
        self.completions_rx = Some(completions_rx);
        Ok(self)
    }

    //=====================================================================================
    // Session Observer
    //=====================================================================================

    fn on_auth_event(&mut self, identity: Option<SessionIdentity>) {
        if identity.is_none() {
            self.library.finish();
            self.community.close();
        }
        self.machine.on_auth_state_changed(identity);
        self.publish_view();
    }

    //=====================================================================================
    // UI Commands
    //=====================================================================================

    async fn handle_command(&mut self, command: UiCommand) {
        debug!("Handling command: {:?}", command_name(&command));
        match command {
            UiCommand::SignIn { email, password } => {
                self.submit_login(AuthMode::SignIn, &email, &password, "").await;
            }
            UiCommand::SignUp {
                email,
                password,
                display_name,
            } => {
                self.submit_login(AuthMode::SignUp, &email, &password, &display_name)
                    .await;
            }
            UiCommand::ToggleAuthMode => {
                let mode = self.login.toggle_mode();
                self.publish(ViewUpdate::LoginModeChanged {
                    sign_up: mode == AuthMode::SignUp,
                });
            }
            UiCommand::SubmitPreferences { preferences } => self.submit_preferences(preferences),
            UiCommand::TryAgain => {
                if self.machine.acknowledge_error().is_ok() {
                    self.publish_view();
                }
            }
            UiCommand::Reset => {
                if self.machine.reset().is_ok() {
                    self.library.finish();
                    self.community.close();
                    self.publish_view();
                }
            }
            UiCommand::SignOut => {
                // The view changes when the session observer reports the sign-out.
                if let Err(e) = self.ctx.identity.sign_out().await {
                    error!("Error signing out: {}", e);
                    self.notice(e.user_message());
                }
            }
            UiCommand::FindLibrary { book_title } => self.find_library(book_title),
            UiCommand::OpenCommunity { book_title } => {
                if self.machine.view() == AppView::Results {
                    let comments = self.community.open(&book_title);
                    self.publish(ViewUpdate::Community {
                        book_title,
                        comments,
                    });
                }
            }
            UiCommand::PostComment { text } => {
                if let Some(ack) = self.community.post(&text) {
                    self.notice(ack);
                }
            }
            UiCommand::OpenRegistry => {
                if self.machine.view() != AppView::Results {
                    return;
                }
                if let Some(viewer) = self.machine.identity() {
                    let registry = registry_for(viewer);
                    self.publish(ViewUpdate::Registry { registry });
                }
            }
        }
    }

    async fn submit_login(
        &mut self,
        mode: AuthMode,
        email: &str,
        password: &str,
        display_name: &str,
    ) {
        if self.machine.view() != AppView::Login {
            warn!("Ignoring login submission outside the login view.");
            return;
        }
        self.login.set_mode(mode);
        let provider = self.ctx.identity.clone();
        let credentials = Credentials {
            email,
            password,
            display_name,
        };
        if let Err(message) = self.login.submit(provider.as_ref(), credentials).await {
            self.publish(ViewUpdate::LoginError { message });
        }
    }

    fn submit_preferences(&mut self, preferences: Preferences) {
        if let Err(e) = self.machine.submit(&preferences) {
            warn!("Submission refused: {}", e);
            return;
        }
        self.publish_view();

        let service = self.ctx.recommendations.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = service.request_recommendations(&preferences).await;
            if completions.send(Completion::Recommendations(outcome)).is_err() {
                debug!("Runtime gone before recommendations arrived.");
            }
        });
    }

    fn find_library(&mut self, book_title: String) {
        let known_book = self
            .machine
            .result()
            .map(|r| r.recommendations.iter().any(|b| b.title == book_title))
            .unwrap_or(false);
        if self.machine.view() != AppView::Results || !known_book {
            warn!("Library search requested for an unknown book: {}", book_title);
            return;
        }
        let Some(ticket) = self.library.begin(&book_title) else {
            debug!("A library search is already running.");
            return;
        };
        self.publish(ViewUpdate::LibrarySearchStatus {
            book_title: book_title.clone(),
            status: SEARCH_STARTED.to_string(),
        });

        let geolocation = self.ctx.geolocation.clone();
        let libraries = self.ctx.libraries.clone();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let outcome = match geolocation.current_position().await {
                Err(e) => {
                    warn!("Geolocation denied or failed: {}", e);
                    LibraryOutcome::NoLocation
                }
                Ok(coordinates) => {
                    let _ = completions.send(Completion::Located {
                        ticket,
                        book_title: book_title.clone(),
                    });
                    match libraries.find_nearby_libraries(coordinates).await {
                        Ok(found) => LibraryOutcome::Found(found),
                        Err(e) => LibraryOutcome::Failed(e),
                    }
                }
            };
            let _ = completions.send(Completion::Libraries {
                ticket,
                book_title,
                outcome,
            });
        });
    }

    //=====================================================================================
    // Completions
    //=====================================================================================

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Recommendations(outcome) => {
                if let Err(e) = self.machine.on_recommendations(outcome) {
                    debug!("Discarding stale recommendation outcome: {}", e);
                    return;
                }
                self.publish_view();
            }
            Completion::Located { ticket, book_title } => {
                if self.library.is_current(ticket) {
                    self.publish(ViewUpdate::LibrarySearchStatus {
                        book_title,
                        status: SEARCH_LOCATED.to_string(),
                    });
                }
            }
            Completion::Libraries {
                ticket,
                book_title,
                outcome,
            } => {
                if !self.library.is_current(ticket) {
                    debug!("Discarding stale library search for {}", book_title);
                    return;
                }
                self.library.finish();
                match outcome {
                    LibraryOutcome::Found(libraries) => {
                        self.publish(ViewUpdate::LibrariesFound {
                            book_title,
                            libraries,
                        });
                    }
                    LibraryOutcome::NoLocation => self.notice(NO_LOCATION),
                    LibraryOutcome::Failed(e) => {
                        error!("Failed to find libraries: {}", e);
                        self.notice(SEARCH_FAILED);
                    }
                }
            }
        }
    }

    //=====================================================================================
    // Publishing
    //=====================================================================================

    fn publish_view(&self) {
        self.publish(ViewUpdate::ViewChanged {
            view: self.machine.view(),
            identity: self.machine.identity().cloned(),
        });
        match self.machine.view() {
            AppView::Results => {
                if let Some(result) = self.machine.result() {
                    self.publish(ViewUpdate::Results {
                        result: result.clone(),
                    });
                }
            }
            AppView::Error => {
                if let Some(message) = self.machine.error_message() {
                    self.publish(ViewUpdate::Error {
                        message: message.to_string(),
                    });
                }
            }
            AppView::Login => {
                if let Some(message) = self.login.error() {
                    self.publish(ViewUpdate::LoginError {
                        message: message.to_string(),
                    });
                }
            }
            AppView::Questionnaire | AppView::Loading => {}
        }
    }

    fn notice(&self, message: impl Into<String>) {
        self.publish(ViewUpdate::Notice {
            message: message.into(),
        });
    }

    fn publish(&self, update: ViewUpdate) {
        if self.updates.send(update).is_err() {
            debug!("No front-end listening for view updates.");
        }
    }
}

/// Command name without payload, so credentials never reach the logs.
fn command_name(command: &UiCommand) -> &'static str {
    match command {
        UiCommand::SignIn { .. } => "sign_in",
        UiCommand::SignUp { .. } => "sign_up",
        UiCommand::ToggleAuthMode => "toggle_auth_mode",
        UiCommand::SubmitPreferences { .. } => "submit_preferences",
        UiCommand::TryAgain => "try_again",
        UiCommand::Reset => "reset",
        UiCommand::SignOut => "sign_out",
        UiCommand::FindLibrary { .. } => "find_library",
        UiCommand::OpenCommunity { .. } => "open_community",
        UiCommand::PostComment { .. } => "post_comment",
        UiCommand::OpenRegistry => "open_registry",
    }
}
