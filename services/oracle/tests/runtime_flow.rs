//! End-to-end flows through the runtime with a scripted language model.

use async_trait::async_trait;
use literary_oracle_core::{
    ports::{GroundedRequest, StructuredRequest},
    AppView, BookRecommendation, Coordinates, Difficulty, FormatSuggestion, GroundingChunk,
    GroundingReference, LanguageModel, LibraryLocation, LibraryLookupClient, ModelError,
    ModelResult, OracleResult, Preferences, ReadingSpeed, RecommendationClient, Role,
};
use oracle_lib::{
    adapters::{ConfiguredGeolocation, InMemoryIdentityProvider},
    app::{
        community::RegistryView,
        protocol::{UiCommand, ViewUpdate},
        runtime::{NO_LOCATION, SEARCH_FAILED, SEARCH_LOCATED, SEARCH_STARTED},
        AppContext, OracleApp,
    },
    error::AppError,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

//=========================================================================================
// Scripted Model
//=========================================================================================

struct ScriptedModel {
    structured: Mutex<Vec<ModelResult<String>>>,
    grounded: ModelResult<Vec<GroundingChunk>>,
    /// When set, structured calls wait for a permit before answering.
    gate: Option<Arc<Notify>>,
    calls: AtomicU32,
}

impl ScriptedModel {
    fn new(structured: Vec<ModelResult<String>>) -> Self {
        Self {
            structured: Mutex::new(structured),
            grounded: Ok(Vec::new()),
            gate: None,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate_structured(&self, _request: &StructuredRequest) -> ModelResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut script = self.structured.lock().await;
        if script.is_empty() {
            return Err(ModelError::Provider("script exhausted".to_string()));
        }
        script.remove(0)
    }

    async fn generate_grounded(
        &self,
        _request: &GroundedRequest,
    ) -> ModelResult<Vec<GroundingChunk>> {
        self.grounded.clone()
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct Harness {
    commands: mpsc::Sender<UiCommand>,
    updates: mpsc::UnboundedReceiver<ViewUpdate>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<OracleApp, AppError>>,
}

impl Harness {
    fn start(
        model: Arc<dyn LanguageModel>,
        home: Option<Coordinates>,
        archivists: Vec<String>,
    ) -> Self {
        let ctx = AppContext {
            recommendations: Arc::new(RecommendationClient::new(model.clone())),
            libraries: Arc::new(LibraryLookupClient::new(model)),
            identity: Arc::new(InMemoryIdentityProvider::new(archivists)),
            geolocation: Arc::new(ConfiguredGeolocation::new(home)),
        };
        let (commands, command_rx) = mpsc::channel(16);
        let (update_tx, updates) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let app = OracleApp::new(ctx, update_tx);
        let handle = tokio::spawn(app.run(command_rx, shutdown.clone()));
        Self {
            commands,
            updates,
            shutdown,
            handle,
        }
    }

    async fn send(&self, command: UiCommand) {
        self.commands.send(command).await.unwrap();
    }

    /// Skips updates until one matches.
    async fn wait_for(&mut self, matches: impl Fn(&ViewUpdate) -> bool) -> ViewUpdate {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let update = self.updates.recv().await.expect("runtime stopped publishing");
                if matches(&update) {
                    return update;
                }
            }
        })
        .await
        .expect("timed out waiting for a view update")
    }

    async fn wait_for_view(&mut self, view: AppView) -> ViewUpdate {
        self.wait_for(|u| matches!(u, ViewUpdate::ViewChanged { view: v, .. } if *v == view))
            .await
    }

    async fn sign_up(&mut self, email: &str) {
        self.send(UiCommand::SignUp {
            email: email.to_string(),
            password: "winteriscoming".to_string(),
            display_name: "Jon Snow".to_string(),
        })
        .await;
        self.wait_for_view(AppView::Questionnaire).await;
    }

    async fn stop(self) -> OracleApp {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap()
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

fn got_preferences() -> Preferences {
    Preferences {
        favorite_book: "A Game of Thrones".to_string(),
        preferred_genres: vec!["Epic Fantasy".to_string(), "Political Intrigue".to_string()],
        reading_speed: ReadingSpeed::Moderate,
        current_mood: "Ambitious".to_string(),
        age_group: None,
    }
}

fn oracle_result() -> OracleResult {
    let titles = [
        "The Name of the Wind",
        "The Lies of Locke Lamora",
        "The First Law",
        "Wolf Hall",
        "Dune",
    ];
    OracleResult {
        recommendations: titles
            .iter()
            .map(|title| BookRecommendation {
                title: title.to_string(),
                author: "An Author".to_string(),
                summary: "A summary.".to_string(),
                match_reason: "Because you love intrigue.".to_string(),
                difficulty: Difficulty::Intermediate,
                format_suggestion: FormatSuggestion::Novel,
            })
            .collect(),
        motivational_message: "The night is dark, but your library is bright.".to_string(),
    }
}

fn oracle_json() -> String {
    serde_json::to_string(&oracle_result()).unwrap()
}

fn reference(title: &str, uri: &str) -> GroundingReference {
    GroundingReference {
        title: title.to_string(),
        uri: uri.to_string(),
    }
}

const WINTERFELL: Coordinates = Coordinates {
    latitude: 54.6,
    longitude: -5.9,
};

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn sign_up_submit_and_receive_results() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(vec![Ok(oracle_json())]));
    let mut app = Harness::start(model, None, Vec::new());

    app.wait_for_view(AppView::Login).await;
    app.sign_up("jon@wall.com").await;

    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for_view(AppView::Loading).await;
    let update = app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;
    assert_eq!(
        update,
        ViewUpdate::Results {
            result: oracle_result()
        }
    );

    let app = app.stop().await;
    assert_eq!(app.view(), AppView::Results);
    assert_eq!(app.result(), Some(&oracle_result()));
    assert_eq!(app.identity().map(|i| i.name.as_str()), Some("Jon Snow"));
}

#[tokio::test]
async fn failure_shows_error_and_try_again_returns_to_questionnaire() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(vec![Ok(
        r#"{"recommendations": [], "motivationalMessage": "hi"}"#.to_string(),
    )]));
    let mut app = Harness::start(model, None, Vec::new());
    app.sign_up("arya@braavos.com").await;

    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    let update = app.wait_for(|u| matches!(u, ViewUpdate::Error { .. })).await;
    assert_eq!(
        update,
        ViewUpdate::Error {
            message: "The Oracle is currently silent. Please try again later.".to_string()
        }
    );

    app.send(UiCommand::TryAgain).await;
    app.wait_for_view(AppView::Questionnaire).await;
    let app = app.stop().await;
    assert_eq!(app.result(), None);
}

#[tokio::test]
async fn missing_credential_surfaces_configuration_message() {
    let model: Arc<dyn LanguageModel> =
        Arc::new(ScriptedModel::new(vec![Err(ModelError::MissingCredential)]));
    let mut app = Harness::start(model, None, Vec::new());
    app.sign_up("sam@citadel.com").await;

    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    let update = app.wait_for(|u| matches!(u, ViewUpdate::Error { .. })).await;
    assert_eq!(
        update,
        ViewUpdate::Error {
            message: "API Key is missing. Please check your environment configuration."
                .to_string()
        }
    );
    app.stop().await;
}

#[tokio::test]
async fn sign_out_while_loading_discards_the_late_result() {
    let gate = Arc::new(Notify::new());
    let mut scripted = ScriptedModel::new(vec![Ok(oracle_json())]);
    scripted.gate = Some(gate.clone());
    let model: Arc<dyn LanguageModel> = Arc::new(scripted);
    let mut app = Harness::start(model, None, Vec::new());
    app.sign_up("jon@wall.com").await;

    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for_view(AppView::Loading).await;

    app.send(UiCommand::SignOut).await;
    let update = app.wait_for_view(AppView::Login).await;
    assert_eq!(
        update,
        ViewUpdate::ViewChanged {
            view: AppView::Login,
            identity: None
        }
    );

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let app = app.stop().await;
    assert_eq!(app.view(), AppView::Login);
    assert_eq!(app.result(), None);
}

#[tokio::test]
async fn reset_clears_result_and_allows_a_second_consultation() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(oracle_json()), Ok(oracle_json())]));
    let mut app = Harness::start(model.clone(), None, Vec::new());
    app.sign_up("jon@wall.com").await;

    for _ in 0..2 {
        app.send(UiCommand::SubmitPreferences {
            preferences: got_preferences(),
        })
        .await;
        app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;
        app.send(UiCommand::Reset).await;
        app.wait_for_view(AppView::Questionnaire).await;
    }

    let app = app.stop().await;
    assert_eq!(app.result(), None);
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn library_search_reports_progress_and_deduplicates() {
    let mut scripted = ScriptedModel::new(vec![Ok(oracle_json())]);
    scripted.grounded = Ok(vec![
        GroundingChunk::Map(reference("Central Library", "https://maps/a")),
        GroundingChunk::Other,
        GroundingChunk::Web(reference("Central Library (again)", "https://maps/a")),
        GroundingChunk::Map(reference("Old Archive", "https://maps/b")),
    ]);
    let model: Arc<dyn LanguageModel> = Arc::new(scripted);
    let mut app = Harness::start(model, Some(WINTERFELL), Vec::new());
    app.sign_up("jon@wall.com").await;
    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;

    app.send(UiCommand::FindLibrary {
        book_title: "Dune".to_string(),
    })
    .await;
    let started = app
        .wait_for(|u| matches!(u, ViewUpdate::LibrarySearchStatus { .. }))
        .await;
    assert_eq!(
        started,
        ViewUpdate::LibrarySearchStatus {
            book_title: "Dune".to_string(),
            status: SEARCH_STARTED.to_string()
        }
    );
    let located = app
        .wait_for(|u| matches!(u, ViewUpdate::LibrarySearchStatus { .. }))
        .await;
    assert_eq!(
        located,
        ViewUpdate::LibrarySearchStatus {
            book_title: "Dune".to_string(),
            status: SEARCH_LOCATED.to_string()
        }
    );

    let found = app
        .wait_for(|u| matches!(u, ViewUpdate::LibrariesFound { .. }))
        .await;
    assert_eq!(
        found,
        ViewUpdate::LibrariesFound {
            book_title: "Dune".to_string(),
            libraries: vec![
                LibraryLocation {
                    name: "Central Library".to_string(),
                    uri: "https://maps/a".to_string()
                },
                LibraryLocation {
                    name: "Old Archive".to_string(),
                    uri: "https://maps/b".to_string()
                },
            ],
        }
    );
    app.stop().await;
}

#[tokio::test]
async fn library_search_without_location_shows_notice() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(vec![Ok(oracle_json())]));
    let mut app = Harness::start(model, None, Vec::new());
    app.sign_up("jon@wall.com").await;
    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;

    app.send(UiCommand::FindLibrary {
        book_title: "Wolf Hall".to_string(),
    })
    .await;
    let notice = app.wait_for(|u| matches!(u, ViewUpdate::Notice { .. })).await;
    assert_eq!(
        notice,
        ViewUpdate::Notice {
            message: NO_LOCATION.to_string()
        }
    );
    app.stop().await;
}

#[tokio::test]
async fn library_search_without_credential_reports_intercepted_ravens() {
    let mut scripted = ScriptedModel::new(vec![Ok(oracle_json())]);
    scripted.grounded = Err(ModelError::MissingCredential);
    let model: Arc<dyn LanguageModel> = Arc::new(scripted);
    let mut app = Harness::start(model, Some(WINTERFELL), Vec::new());
    app.sign_up("jon@wall.com").await;
    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;

    app.send(UiCommand::FindLibrary {
        book_title: "The First Law".to_string(),
    })
    .await;
    let notice = app.wait_for(|u| matches!(u, ViewUpdate::Notice { .. })).await;
    assert_eq!(
        notice,
        ViewUpdate::Notice {
            message: SEARCH_FAILED.to_string()
        }
    );

    // The gate reopens and the results view is untouched.
    app.send(UiCommand::FindLibrary {
        book_title: "The First Law".to_string(),
    })
    .await;
    app.wait_for(|u| {
        matches!(u, ViewUpdate::LibrarySearchStatus { status, .. } if status == SEARCH_STARTED)
    })
    .await;
    let app = app.stop().await;
    assert_eq!(app.view(), AppView::Results);
}

#[tokio::test]
async fn registry_shows_census_only_to_archivists() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(vec![Ok(oracle_json())]));
    let mut app = Harness::start(model, None, vec!["maester@citadel.com".to_string()]);
    app.sign_up("Maester@Citadel.com").await;
    app.send(UiCommand::SubmitPreferences {
        preferences: got_preferences(),
    })
    .await;
    app.wait_for(|u| matches!(u, ViewUpdate::Results { .. })).await;

    app.send(UiCommand::OpenRegistry).await;
    match app.wait_for(|u| matches!(u, ViewUpdate::Registry { .. })).await {
        ViewUpdate::Registry {
            registry: RegistryView::Census { members },
        } => assert_eq!(members.len(), 5),
        other => panic!("expected the census, got {other:?}"),
    }

    let app = app.stop().await;
    assert_eq!(app.identity().map(|i| i.role), Some(Role::Archivist));
}

#[tokio::test]
async fn login_failures_stay_on_the_login_view() {
    let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new(Vec::new()));
    let mut app = Harness::start(model, None, Vec::new());

    app.send(UiCommand::SignIn {
        email: "nobody@nowhere.com".to_string(),
        password: "valar".to_string(),
    })
    .await;
    let error = app.wait_for(|u| matches!(u, ViewUpdate::LoginError { .. })).await;
    assert_eq!(
        error,
        ViewUpdate::LoginError {
            message: "Incorrect secret phrase or raven address.".to_string()
        }
    );

    let app = app.stop().await;
    assert_eq!(app.view(), AppView::Login);
}
