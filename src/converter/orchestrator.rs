use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::PlatformAdapter;
use crate::config::Config;
use crate::converter::progress::{
    Done, EventStreamReporter, ProgressEvent, ProgressReporter, SearchStatus, SilentReporter,
    TrackSearch,
};
use crate::converter::report::{ConversionResult, DestinationPlaylist};
use crate::converter::session::{
    ConversionPreview, ConversionSession, ConversionStage, Verification,
};
use crate::credentials::{CredentialCache, CredentialKey};
use crate::error::{AppError, Result};
use crate::link::{conversion_targets, parse_playlist_url};
use crate::matcher::{self, MatchOutcome};
use crate::models::{Platform, Playlist, Track};
use crate::spotify::SpotifyAdapter;
use crate::youtube::YoutubeAdapter;

pub struct PlaylistConverter {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    credentials: Arc<CredentialCache>,
    max_tracks: Option<usize>,
}

/// Everything a conversion needs, checked before the first network call.
struct Plan<'a> {
    session_id: &'a str,
    playlist: &'a Playlist,
    title: &'a str,
    source: &'a dyn PlatformAdapter,
    destination: &'a dyn PlatformAdapter,
}

impl PlaylistConverter {
    pub fn new(credentials: Arc<CredentialCache>) -> Self {
        Self {
            adapters: HashMap::new(),
            credentials,
            max_tracks: None,
        }
    }

    /// Register an adapter for every platform whose configuration is complete.
    pub fn from_config(config: &Config, credentials: Arc<CredentialCache>) -> Self {
        let mut converter =
            Self::new(Arc::clone(&credentials)).with_max_tracks(config.max_tracks);

        for platform in Platform::ALL {
            let missing = config.missing_for(platform);
            if !missing.is_empty() {
                warn!(
                    "{} disabled, missing configuration: {}",
                    platform.display_name(),
                    missing.join(", ")
                );
                continue;
            }

            let adapter: Arc<dyn PlatformAdapter> = match platform {
                Platform::Spotify => {
                    Arc::new(SpotifyAdapter::new(config, Arc::clone(&credentials)))
                }
                Platform::Youtube => {
                    Arc::new(YoutubeAdapter::new(config, Arc::clone(&credentials)))
                }
            };
            converter = converter.with_adapter(adapter);
        }

        converter
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    pub fn with_max_tracks(mut self, max_tracks: Option<usize>) -> Self {
        self.max_tracks = max_tracks;
        self
    }

    pub fn supported_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    fn adapter(&self, platform: Platform) -> Result<&dyn PlatformAdapter> {
        self.adapters
            .get(&platform)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| {
                AppError::Validation(format!("{} is not supported", platform.display_name()))
            })
    }

    /// Check that a link points at an existing playlist and open a session
    /// for converting it.
    pub async fn verify_playlist(&self, url: &str, session_id: &str) -> Result<Verification> {
        debug!("Session {}: {}", session_id, ConversionStage::Verifying);

        let link = parse_playlist_url(url)?;
        let adapter = self.adapter(link.platform)?;

        let playlist = adapter.find_playlist(&link.id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "{} playlist does not exist, it might have been deleted",
                link.platform.display_name()
            ))
        })?;

        let supported_destinations: Vec<Platform> = conversion_targets(link.platform)
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect();

        info!(
            "Verified {} playlist: {} ({} tracks)",
            link.platform.display_name(),
            playlist.title,
            playlist.track_count
        );
        debug!("Session {}: {}", session_id, ConversionStage::Verified);

        Ok(Verification {
            valid: true,
            session: ConversionSession::verified(
                session_id,
                playlist.clone(),
                adapter.playlist_url(&playlist.id),
            ),
            playlist,
            supported_destinations,
        })
    }

    pub fn preview(&self, session: &ConversionSession) -> Result<ConversionPreview> {
        let invalid = || AppError::Validation("invalid session".into());

        let playlist = session.playlist.as_ref().ok_or_else(invalid)?;
        let playlist_url = session.playlist_url.clone().ok_or_else(invalid)?;
        let destination = session.destination.ok_or_else(invalid)?;

        if !self
            .credentials
            .contains(&CredentialKey::user(destination, &session.session_id))
        {
            return Err(invalid());
        }

        Ok(ConversionPreview {
            playlist_url,
            playlist_name: playlist.title.clone(),
            track_count: playlist.track_count,
            source_platform: playlist.platform,
            destination_platform: destination,
        })
    }

    fn plan<'a>(
        &'a self,
        session: &'a ConversionSession,
        destination_title: &'a str,
    ) -> Result<Plan<'a>> {
        let title = destination_title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }

        let playlist = session.playlist.as_ref().ok_or_else(|| {
            AppError::Validation("invalid session: no verified playlist".into())
        })?;
        let destination = session.destination.ok_or_else(|| {
            AppError::Validation("invalid session: no destination platform chosen".into())
        })?;

        if destination == playlist.platform {
            return Err(AppError::Validation(format!(
                "playlist conversion from {} to {} not supported",
                playlist.platform.display_name(),
                destination.display_name()
            )));
        }

        let source = self.adapter(playlist.platform)?;
        let destination_adapter = self.adapter(destination)?;

        if !self
            .credentials
            .contains(&CredentialKey::user(destination, &session.session_id))
        {
            return Err(AppError::Validation(format!(
                "invalid session: no {} account connected",
                destination.display_name()
            )));
        }

        Ok(Plan {
            session_id: &session.session_id,
            playlist,
            title,
            source,
            destination: destination_adapter,
        })
    }

    /// Run one conversion, reporting progress to `reporter`.
    ///
    /// Validation problems are returned as errors. Failures after that abort
    /// the remaining steps and come back as an unsuccessful result with the
    /// counts gathered so far. Either way the reporter sees exactly one
    /// `done` event.
    pub async fn convert(
        &self,
        session: &ConversionSession,
        destination_title: &str,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ConversionResult> {
        let mut run = ConversionRun::new(reporter, session.stage());

        let plan = match self.plan(session, destination_title) {
            Ok(plan) => plan,
            Err(e) => {
                run.abort(&e);
                run.finish();
                return Err(e);
            }
        };

        info!(
            "Converting '{}' from {} to {} as '{}'",
            plan.playlist.title,
            plan.source.platform().display_name(),
            plan.destination.platform().display_name(),
            plan.title
        );

        if let Err(e) = self.execute(&plan, &mut run).await {
            run.abort(&e);
        }

        let result = run.finish();
        info!(
            "Conversion finished: {}/{} tracks matched ({:.1}% success rate)",
            result.tracks_found,
            result.total_tracks(),
            result.success_rate()
        );
        Ok(result)
    }

    pub async fn convert_buffered(
        &self,
        session: &ConversionSession,
        destination_title: &str,
    ) -> Result<ConversionResult> {
        self.convert(session, destination_title, &mut SilentReporter)
            .await
    }

    pub async fn convert_streaming<W: Write + Send>(
        &self,
        session: &ConversionSession,
        destination_title: &str,
        writer: W,
    ) -> Result<ConversionResult> {
        let mut reporter = EventStreamReporter::new(writer);
        self.convert(session, destination_title, &mut reporter)
            .await
    }

    async fn execute(&self, plan: &Plan<'_>, run: &mut ConversionRun<'_>) -> Result<()> {
        let source_name = plan.source.platform().display_name();
        let destination_platform = plan.destination.platform();
        let destination_name = destination_platform.display_name();

        let user_id = if plan.destination.requires_user_id() {
            Some(plan.destination.resolve_user_id(plan.session_id).await?)
        } else {
            None
        };

        run.info(format!("Fetching playlist tracks from {}", source_name));
        let mut tracks = plan
            .source
            .list_tracks(&plan.playlist.id, self.max_tracks)
            .await?;
        if let Some(max) = self.max_tracks {
            tracks.truncate(max);
        }
        run.info(format!("Fetched {} tracks from {}", tracks.len(), source_name));

        run.enter(ConversionStage::CreatingDestination);
        run.info(format!("Creating playlist on {}", destination_name));
        let playlist_id = plan
            .destination
            .create_playlist(plan.title, user_id.as_deref(), plan.session_id)
            .await?;
        run.destination = Some(DestinationPlaylist {
            url: plan.destination.playlist_url(&playlist_id),
            id: playlist_id.clone(),
            platform: destination_platform,
        });
        run.info(format!("Playlist created on {}", destination_name));

        run.enter(ConversionStage::MatchingAndAdding);
        run.info(format!("Preparing to add tracks to playlist on {}", destination_name));
        for track in tracks {
            run.searching(&track, destination_name);
            let outcome = matcher::find_match(plan.destination, &track).await;
            run.record(track, outcome);
        }

        run.info(format!(
            "Adding {} tracks to playlist on {}",
            run.matched.len(),
            destination_name
        ));
        plan.destination
            .add_tracks(&playlist_id, &run.matched, plan.session_id)
            .await?;
        run.tracks_added = true;

        Ok(())
    }
}

/// Progress of one `convert` call. `finish` consumes it, so the terminal
/// event goes out once.
struct ConversionRun<'r> {
    reporter: &'r mut dyn ProgressReporter,
    stage: ConversionStage,
    matched: Vec<Track>,
    unmatched: Vec<Track>,
    destination: Option<DestinationPlaylist>,
    tracks_added: bool,
    error: Option<String>,
}

impl<'r> ConversionRun<'r> {
    fn new(reporter: &'r mut dyn ProgressReporter, stage: ConversionStage) -> Self {
        Self {
            reporter,
            stage,
            matched: Vec::new(),
            unmatched: Vec::new(),
            destination: None,
            tracks_added: false,
            error: None,
        }
    }

    fn enter(&mut self, stage: ConversionStage) {
        debug!("Conversion stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn info(&mut self, message: String) {
        debug!("{}", message);
        self.reporter.emit(ProgressEvent::Info(message));
    }

    fn searching(&mut self, track: &Track, destination_name: &str) {
        let artist = track.primary_artist().unwrap_or_default();
        self.reporter.emit(ProgressEvent::TrackSearch(TrackSearch {
            message: format!(
                "Searching track on {}: {} by {}",
                destination_name, track.title, artist
            ),
            track: track.clone(),
            status: SearchStatus::Searching,
            success: None,
        }));
    }

    fn record(&mut self, track: Track, outcome: MatchOutcome) {
        let (message, status, success) = match outcome {
            MatchOutcome::Found(candidate) => {
                self.matched.push(candidate);
                ("Track found", SearchStatus::Done, true)
            }
            MatchOutcome::NotFound => ("track not found", SearchStatus::Error, false),
            MatchOutcome::Failed(_) => ("error searching for track", SearchStatus::Error, false),
        };

        self.reporter.emit(ProgressEvent::TrackSearch(TrackSearch {
            message: message.to_string(),
            track: track.clone(),
            status,
            success: Some(success),
        }));

        if !success {
            self.unmatched.push(track);
        }
    }

    fn abort(&mut self, error: &AppError) {
        if error.is_fatal_in_pipeline() {
            warn!("Conversion aborted during {}: {}", self.stage, error);
        } else {
            info!("Conversion rejected: {}", error);
        }
        self.reporter.emit(ProgressEvent::Error(error.to_string()));
        self.error = Some(error.to_string());
        self.enter(ConversionStage::Aborted);
    }

    fn finish(mut self) -> ConversionResult {
        if !self.stage.is_terminal() {
            self.enter(ConversionStage::Completed);
        }

        let result = ConversionResult {
            tracks_found: self.matched.len(),
            tracks_not_found: self.unmatched.len(),
            conversion_successful: self.error.is_none()
                && self.tracks_added
                && self.unmatched.is_empty(),
            destination: self.destination,
            unmatched: self.unmatched,
            error: self.error,
        };

        let message = match self.stage {
            ConversionStage::Aborted => "Conversion process aborted",
            _ => "Conversion process complete",
        };
        self.reporter.emit(ProgressEvent::Done(Done {
            message: message.to_string(),
            info: result.summary(),
        }));

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::mock::MockAdapter;
    use crate::converter::progress::recording::RecordingReporter;
    use crate::credentials::Credential;

    const SESSION: &str = "session-1";
    const SPOTIFY_URL: &str = "https://open.spotify.com/playlist/abc123";

    struct Fixture {
        converter: PlaylistConverter,
        source: Arc<MockAdapter>,
        destination: Arc<MockAdapter>,
    }

    fn source_tracks() -> Vec<Track> {
        vec![
            Track::mock("Bohemian Rhapsody", "Queen"),
            Track::mock("Heroes", "David Bowie"),
            Track::mock("Obscure B-Side", "Nobody"),
        ]
    }

    fn fixture(tracks: Vec<Track>, destination: MockAdapter) -> Fixture {
        let credentials = Arc::new(CredentialCache::new());
        credentials.put(
            CredentialKey::user(Platform::Youtube, SESSION),
            Credential::non_expiring("user-token"),
        );

        let source = Arc::new(
            MockAdapter::new(Platform::Spotify).with_playlist("abc123", "Road Trip", tracks),
        );
        let destination = Arc::new(destination);

        let converter = PlaylistConverter::new(credentials)
            .with_adapter(source.clone())
            .with_adapter(destination.clone());

        Fixture {
            converter,
            source,
            destination,
        }
    }

    fn youtube_finding_two() -> MockAdapter {
        MockAdapter::new(Platform::Youtube)
            .with_search_result("Bohemian Rhapsody", Track::mock("Bohemian Rhapsody", "Queen"))
            .with_search_result("Heroes", Track::mock("Heroes", "David Bowie"))
    }

    async fn session_for(fixture: &Fixture) -> ConversionSession {
        let mut session = fixture
            .converter
            .verify_playlist(SPOTIFY_URL, SESSION)
            .await
            .unwrap()
            .session;
        session.choose_destination(Platform::Youtube).unwrap();
        session
    }

    #[tokio::test]
    async fn test_verify_spotify_playlist() {
        let fixture = fixture(source_tracks(), youtube_finding_two());

        let verification = fixture
            .converter
            .verify_playlist(SPOTIFY_URL, SESSION)
            .await
            .unwrap();

        assert!(verification.valid);
        assert_eq!(verification.playlist.platform, Platform::Spotify);
        assert_eq!(verification.playlist.id, "abc123");
        assert_eq!(verification.playlist.track_count, 3);
        assert_eq!(verification.supported_destinations, vec![Platform::Youtube]);
        assert_eq!(
            verification.session.playlist_url.as_deref(),
            Some("https://mock.spotify/playlist/abc123")
        );
        assert_eq!(fixture.source.calls(), vec!["find_playlist:abc123"]);
    }

    #[tokio::test]
    async fn test_verify_youtube_playlist() {
        let credentials = Arc::new(CredentialCache::new());
        let youtube = Arc::new(
            MockAdapter::new(Platform::Youtube).with_playlist("xyz", "Mix", Vec::new()),
        );
        let converter = PlaylistConverter::new(credentials)
            .with_adapter(youtube.clone())
            .with_adapter(Arc::new(MockAdapter::new(Platform::Spotify)));

        let verification = converter
            .verify_playlist("https://music.youtube.com/playlist?list=xyz", SESSION)
            .await
            .unwrap();

        assert_eq!(verification.playlist.platform, Platform::Youtube);
        assert_eq!(verification.playlist.id, "xyz");
        assert_eq!(verification.supported_destinations, vec![Platform::Spotify]);
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_host_without_calls() {
        let fixture = fixture(source_tracks(), youtube_finding_two());

        let err = fixture
            .converter
            .verify_playlist("https://tidal.com/playlist/abc123", SESSION)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(fixture.source.calls().is_empty());
        assert!(fixture.destination.calls().is_empty());
    }

    #[tokio::test]
    async fn test_verify_missing_playlist() {
        let fixture = fixture(source_tracks(), youtube_finding_two());

        let err = fixture
            .converter
            .verify_playlist("https://open.spotify.com/playlist/gone", SESSION)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_two_of_three_found() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;
        let mut reporter = RecordingReporter::default();

        let result = fixture
            .converter
            .convert(&session, "Road Trip (YT)", &mut reporter)
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 2);
        assert_eq!(result.tracks_not_found, 1);
        assert!(!result.conversion_successful);
        assert_eq!(result.unmatched[0].title, "Obscure B-Side");
        assert_eq!(result.error, None);
        assert_eq!(
            result.destination.as_ref().map(|d| d.id.as_str()),
            Some("new-playlist")
        );

        assert_eq!(fixture.destination.added().len(), 2);
        assert_eq!(
            fixture.destination.calls(),
            vec![
                "create_playlist:Road Trip (YT):-",
                "search_track:Bohemian Rhapsody",
                "search_track:Heroes",
                "search_track:Obscure B-Side",
                "add_tracks:new-playlist:2",
            ]
        );

        let done = reporter.done_events();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].info, result.summary());
        assert_eq!(reporter.kinds().last(), Some(&"done"));
    }

    #[tokio::test]
    async fn test_track_events_pair_up_in_order() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;
        let mut reporter = RecordingReporter::default();

        fixture
            .converter
            .convert(&session, "Road Trip", &mut reporter)
            .await
            .unwrap();

        let searches: Vec<(String, SearchStatus)> = reporter
            .events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::TrackSearch(s) => Some((s.track.title.clone(), s.status)),
                _ => None,
            })
            .collect();

        assert_eq!(
            searches,
            vec![
                ("Bohemian Rhapsody".to_string(), SearchStatus::Searching),
                ("Bohemian Rhapsody".to_string(), SearchStatus::Done),
                ("Heroes".to_string(), SearchStatus::Searching),
                ("Heroes".to_string(), SearchStatus::Done),
                ("Obscure B-Side".to_string(), SearchStatus::Searching),
                ("Obscure B-Side".to_string(), SearchStatus::Error),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_playlist_is_successful() {
        let fixture = fixture(Vec::new(), youtube_finding_two());
        let session = session_for(&fixture).await;

        let result = fixture
            .converter
            .convert_buffered(&session, "Empty")
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 0);
        assert_eq!(result.tracks_not_found, 0);
        assert!(result.conversion_successful);
    }

    #[tokio::test]
    async fn test_all_found_is_successful() {
        let tracks = vec![
            Track::mock("Bohemian Rhapsody", "Queen"),
            Track::mock("Heroes", "David Bowie"),
        ];
        let fixture = fixture(tracks, youtube_finding_two());
        let session = session_for(&fixture).await;

        let result = fixture
            .converter
            .convert_buffered(&session, "Hits")
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 2);
        assert!(result.conversion_successful);
    }

    #[tokio::test]
    async fn test_create_failure_aborts_before_adding() {
        let fixture = fixture(source_tracks(), youtube_finding_two().failing_create());
        let session = session_for(&fixture).await;
        let mut reporter = RecordingReporter::default();

        let result = fixture
            .converter
            .convert(&session, "Road Trip", &mut reporter)
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 0);
        assert_eq!(result.tracks_not_found, 0);
        assert!(!result.conversion_successful);
        assert!(result.error.is_some());
        assert_eq!(result.destination, None);
        assert_eq!(fixture.destination.calls_to("add_tracks"), 0);
        assert_eq!(fixture.destination.calls_to("search_track"), 0);

        let done = reporter.done_events();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].message, "Conversion process aborted");
        assert!(!done[0].info.conversion_successful);
        assert_eq!(done[0].info.tracks_found, 0);
        assert!(reporter.kinds().contains(&"error"));
    }

    #[tokio::test]
    async fn test_add_failure_keeps_counts_but_fails() {
        let tracks = vec![Track::mock("Heroes", "David Bowie")];
        let fixture = fixture(tracks, youtube_finding_two().failing_add());
        let session = session_for(&fixture).await;

        let result = fixture
            .converter
            .convert_buffered(&session, "Heroes")
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 1);
        assert_eq!(result.tracks_not_found, 0);
        assert!(!result.conversion_successful);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_list_failure_aborts_before_create() {
        let credentials = Arc::new(CredentialCache::new());
        credentials.put(
            CredentialKey::user(Platform::Youtube, SESSION),
            Credential::non_expiring("user-token"),
        );
        let source = Arc::new(
            MockAdapter::new(Platform::Spotify)
                .with_playlist("abc123", "Road Trip", source_tracks())
                .failing_list(),
        );
        let destination = Arc::new(youtube_finding_two());
        let converter = PlaylistConverter::new(credentials)
            .with_adapter(source.clone())
            .with_adapter(destination.clone());

        let mut session = converter
            .verify_playlist(SPOTIFY_URL, SESSION)
            .await
            .unwrap()
            .session;
        session.choose_destination(Platform::Youtube).unwrap();

        let result = converter.convert_buffered(&session, "Road Trip").await.unwrap();

        assert!(!result.conversion_successful);
        assert_eq!(result.total_tracks(), 0);
        assert!(destination.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_errors_count_as_not_found() {
        let fixture = fixture(
            source_tracks(),
            youtube_finding_two().with_failing_search("Heroes"),
        );
        let session = session_for(&fixture).await;

        let result = fixture
            .converter
            .convert_buffered(&session, "Road Trip")
            .await
            .unwrap();

        assert_eq!(result.tracks_found, 1);
        assert_eq!(result.tracks_not_found, 2);
        assert_eq!(result.total_tracks(), 3);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_track_cap_limits_considered_tracks() {
        let mut fixture = fixture(source_tracks(), youtube_finding_two());
        fixture.converter = fixture.converter.with_max_tracks(Some(2));
        let session = session_for(&fixture).await;

        let result = fixture
            .converter
            .convert_buffered(&session, "Capped")
            .await
            .unwrap();

        assert_eq!(result.total_tracks(), 2);
        assert!(result.conversion_successful);
    }

    #[tokio::test]
    async fn test_user_scoped_destination() {
        let fixture = fixture(source_tracks(), youtube_finding_two().requiring_user_id());
        let session = session_for(&fixture).await;

        fixture
            .converter
            .convert_buffered(&session, "Mine")
            .await
            .unwrap();

        let calls = fixture.destination.calls();
        assert_eq!(calls[0], format!("resolve_user_id:{}", SESSION));
        assert_eq!(calls[1], format!("create_playlist:Mine:user-of-{}", SESSION));
    }

    #[tokio::test]
    async fn test_user_resolution_failure_aborts_first() {
        let fixture = fixture(
            source_tracks(),
            youtube_finding_two().requiring_user_id().failing_user(),
        );
        let session = session_for(&fixture).await;
        let mut reporter = RecordingReporter::default();

        let result = fixture
            .converter
            .convert(&session, "Mine", &mut reporter)
            .await
            .unwrap();

        assert!(!result.conversion_successful);
        assert_eq!(fixture.source.calls_to("list_tracks"), 0);
        assert_eq!(fixture.destination.calls_to("create_playlist"), 0);
        assert_eq!(reporter.kinds(), vec!["error", "done"]);
    }

    #[tokio::test]
    async fn test_validation_failures_make_no_calls() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;
        let mut reporter = RecordingReporter::default();

        let err = fixture
            .converter
            .convert(&session, "   ", &mut reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(reporter.done_events().len(), 1);

        let mut unverified = ConversionSession::new(SESSION);
        unverified.destination = Some(Platform::Youtube);
        let err = fixture
            .converter
            .convert_buffered(&unverified, "Title")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut no_destination = session.clone();
        no_destination.destination = None;
        assert!(fixture
            .converter
            .convert_buffered(&no_destination, "Title")
            .await
            .is_err());

        let mut same_platform = session.clone();
        same_platform.destination = Some(Platform::Spotify);
        assert!(fixture
            .converter
            .convert_buffered(&same_platform, "Title")
            .await
            .is_err());

        assert_eq!(fixture.source.calls(), vec!["find_playlist:abc123"]);
        assert!(fixture.destination.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_user_credential_is_validation_error() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let mut session = session_for(&fixture).await;
        session.session_id = "someone-else".into();

        let err = fixture
            .converter
            .convert_buffered(&session, "Road Trip")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(fixture.destination.calls().is_empty());
    }

    #[tokio::test]
    async fn test_buffered_and_streaming_agree() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;

        let buffered = fixture
            .converter
            .convert_buffered(&session, "Road Trip")
            .await
            .unwrap();

        let mut output = Vec::new();
        let streamed = fixture
            .converter
            .convert_streaming(&session, "Road Trip", &mut output)
            .await
            .unwrap();

        assert_eq!(buffered.summary(), streamed.summary());

        let text = String::from_utf8(output).unwrap();
        let events: Vec<&str> = text
            .lines()
            .filter_map(|line| line.strip_prefix("event: "))
            .collect();
        assert_eq!(events.first(), Some(&"info"));
        assert_eq!(events.iter().filter(|e| **e == "done").count(), 1);
        assert_eq!(events.last(), Some(&"done"));

        let done_payload = text
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .last()
            .unwrap();
        let done: serde_json::Value = serde_json::from_str(done_payload).unwrap();
        assert_eq!(done["info"]["tracks_found"], 2);
        assert_eq!(done["info"]["tracks_not_found"], 1);
        assert_eq!(done["info"]["conversion_successful"], false);
    }

    #[tokio::test]
    async fn test_reconverting_creates_a_new_playlist_each_time() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;

        for _ in 0..2 {
            fixture
                .converter
                .convert_buffered(&session, "Road Trip")
                .await
                .unwrap();
        }

        assert_eq!(fixture.destination.calls_to("create_playlist"), 2);
    }

    #[tokio::test]
    async fn test_preview() {
        let fixture = fixture(source_tracks(), youtube_finding_two());
        let session = session_for(&fixture).await;

        let preview = fixture.converter.preview(&session).unwrap();
        assert_eq!(preview.playlist_url, "https://mock.spotify/playlist/abc123");
        assert_eq!(preview.playlist_name, "Road Trip");
        assert_eq!(preview.track_count, 3);
        assert_eq!(preview.source_platform, Platform::Spotify);
        assert_eq!(preview.destination_platform, Platform::Youtube);

        let err = fixture
            .converter
            .preview(&ConversionSession::new(SESSION))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
