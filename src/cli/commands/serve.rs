//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for synchronizing transcripts into subtitles.

use crate::cli::Output;
use crate::config::{Settings, TranslationProvider};
use crate::error::TekstingError;
use crate::orchestrator::Synchronizer;
use crate::report::SyncReport;
use crate::retiming::Cue;
use crate::subtitle::{EmitOptions, SubtitleFormat};
use crate::transcription::WordTimeline;
use crate::translation::create_translator;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    settings: Settings,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState { settings });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Teksting API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Sync", "POST /sync");
    Output::kv("Formats", "GET  /formats");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sync", post(sync))
        .route("/formats", get(formats))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SyncRequest {
    /// Transcript in AssemblyAI or teksting JSON form.
    timeline: serde_json::Value,
    #[serde(default)]
    target_language: Option<String>,
    #[serde(default)]
    source_language: Option<String>,
    /// Formats to render; defaults to output.formats.
    #[serde(default)]
    formats: Option<Vec<String>>,
    #[serde(default)]
    provider: Option<String>,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    cues: Vec<Cue>,
    /// Rendered documents keyed by format extension.
    subtitles: BTreeMap<String, String>,
    report: SyncReport,
}

#[derive(Serialize)]
struct FormatInfo {
    name: &'static str,
    extension: &'static str,
    aliases: &'static [&'static str],
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn formats() -> impl IntoResponse {
    let formats: Vec<FormatInfo> = SubtitleFormat::ALL.into_iter().map(format_info).collect();
    Json(formats)
}

fn format_info(format: SubtitleFormat) -> FormatInfo {
    match format {
        SubtitleFormat::Srt => FormatInfo {
            name: "SubRip",
            extension: "srt",
            aliases: &["srt", "subrip"],
        },
        SubtitleFormat::Vtt => FormatInfo {
            name: "WebVTT",
            extension: "vtt",
            aliases: &["vtt", "webvtt"],
        },
        SubtitleFormat::Ass => FormatInfo {
            name: "Advanced SubStation Alpha",
            extension: "ass",
            aliases: &["ass", "ssa"],
        },
    }
}

async fn sync(State(state): State<Arc<AppState>>, Json(req): Json<SyncRequest>) -> impl IntoResponse {
    match synchronize(&state.settings, req).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            warn!("Sync request failed: {}", e);
            (status_for(&e), Json(ErrorResponse { error: e.to_string() })).into_response()
        }
    }
}

async fn synchronize(settings: &Settings, req: SyncRequest) -> Result<SyncResponse, TekstingError> {
    let mut settings = settings.clone();
    if let Some(provider) = &req.provider {
        settings.translation.provider = provider
            .parse::<TranslationProvider>()
            .map_err(TekstingError::InvalidInput)?;
    }

    let timeline = WordTimeline::from_value(req.timeline)?;
    let target = req
        .target_language
        .unwrap_or_else(|| settings.translation.target_language.clone());
    let source = req.source_language.or_else(|| settings.translation.source_language.clone());

    let translator = create_translator(&settings)?;
    let mut output = Synchronizer::new(&settings.sync, translator)
        .run(&timeline, source.as_deref(), &target)
        .await?;

    let formats = req.formats.unwrap_or_else(|| settings.output.formats.clone());
    let subtitles = output
        .render(&formats, &EmitOptions::from(&settings.output))
        .into_iter()
        .map(|(format, bytes)| (format.extension().to_string(), String::from_utf8_lossy(&bytes).into_owned()))
        .collect();

    Ok(SyncResponse {
        cues: output.cues,
        subtitles,
        report: output.report,
    })
}

fn status_for(error: &TekstingError) -> StatusCode {
    match error {
        TekstingError::Input(_)
        | TekstingError::InvalidInput(_)
        | TekstingError::Format(_)
        | TekstingError::Json(_) => StatusCode::BAD_REQUEST,
        TekstingError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(timeline: serde_json::Value) -> SyncRequest {
        SyncRequest {
            timeline,
            target_language: Some("EN".into()),
            source_language: None,
            formats: Some(vec!["srt".into(), "vtt".into(), "txt".into()]),
            provider: Some("none".into()),
        }
    }

    #[tokio::test]
    async fn test_sync_assemblyai_timeline() {
        let timeline = json!({
            "language_code": "en",
            "words": [
                { "text": "Hello", "start": 0, "end": 500, "confidence": 0.98, "speaker": "A" },
                { "text": "world.", "start": 500, "end": 1200, "confidence": 0.97, "speaker": "A" },
                { "text": "Hi!", "start": 1300, "end": 2000, "confidence": 0.95, "speaker": "B" }
            ]
        });

        let response = synchronize(&Settings::default(), request(timeline)).await.unwrap();

        assert_eq!(response.cues.len(), 2);
        assert_eq!(response.subtitles.keys().collect::<Vec<_>>(), vec!["srt", "vtt"]);
        assert!(response.subtitles["srt"].contains("Hello world."));
        assert!(response.subtitles["vtt"].contains("<v B>Hi!"));
        assert_eq!(response.report.source_language.as_deref(), Some("en"));
        // "Hi!" is shorter than the minimum display time; "txt" is unsupported.
        assert_eq!(response.report.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_runs_on_spawned_task() {
        let router = router(Arc::new(AppState {
            settings: Settings::default(),
        }));
        drop(router);

        let timeline = json!({
            "words": [
                { "text": "Hello", "start": 0, "end": 520, "confidence": 0.9 },
                { "text": "again.", "start": 510, "end": 1500, "confidence": 0.9 }
            ]
        });
        let handle = tokio::spawn(async move { synchronize(&Settings::default(), request(timeline)).await });
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.cues.len(), 1);
        assert!(response.subtitles["srt"].contains("Hello again."));
    }

    #[test]
    fn test_format_aliases_parse() {
        for format in SubtitleFormat::ALL {
            let info = format_info(format);
            assert_eq!(info.extension, format.extension());
            for alias in info.aliases {
                assert_eq!(alias.parse::<SubtitleFormat>().unwrap(), format);
            }
        }
    }

    #[tokio::test]
    async fn test_empty_timeline_is_bad_request() {
        let err = synchronize(&Settings::default(), request(json!({ "words": [] })))
            .await
            .unwrap_err();
        assert!(matches!(err, TekstingError::Input(_)));
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_bad_request() {
        let mut req = request(json!({ "words": [] }));
        req.provider = Some("babelfish".into());
        let err = synchronize(&Settings::default(), req).await.unwrap_err();
        assert_eq!(status_for(&err), StatusCode::BAD_REQUEST);
    }
}
