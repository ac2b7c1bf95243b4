//! Clip orchestration with format fallback.
//!
//! Candidates are tried strictly in table order. A candidate is skipped only
//! when its failure says the format is unusable; any other failure ends the
//! render. Each attempt gets its own scratch directory, removed when the
//! attempt ends whichever way it ends.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use clip_models::{CandidateFormat, FormatTable, MediaClass, OutputTarget, Request};

use crate::error::{ClipError, MediaError, MediaResult};
use crate::metrics::{record_render_attempt, record_render_duration, record_render_failure};
use crate::resolver::SourceResolver;
use crate::transcoder::Transcoder;

/// Prefix of per-attempt scratch directories.
const SCRATCH_PREFIX: &str = "clip-";

/// Produces clip bytes for a request, falling back across candidate formats.
pub struct ClipOrchestrator {
    resolver: Arc<dyn SourceResolver>,
    transcoder: Arc<dyn Transcoder>,
    formats: FormatTable,
    work_dir: PathBuf,
}

impl ClipOrchestrator {
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        transcoder: Arc<dyn Transcoder>,
        formats: FormatTable,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            transcoder,
            formats,
            work_dir: work_dir.into(),
        }
    }

    /// Render `request` as `class`.
    ///
    /// Returns [`ClipError::UnavailableFormat`] with the last cause when every
    /// candidate fails as unusable, and [`ClipError::Media`] as soon as a
    /// failure is not the format's fault.
    #[instrument(skip(self), fields(source_id = %request.source_id, media_class = %class))]
    pub async fn produce(&self, request: &Request, class: MediaClass) -> Result<Vec<u8>, ClipError> {
        let started = Instant::now();
        let target = OutputTarget::for_class(class);
        let mut attempted = Vec::new();
        let mut last = None;

        for candidate in self.formats.candidates(class) {
            attempted.push(candidate.name.clone());
            record_render_attempt(class, &candidate.name);

            match self.attempt(request, candidate, &target).await {
                Ok(bytes) => {
                    record_render_duration(class, started.elapsed().as_secs_f64());
                    info!(
                        format = %candidate.name,
                        size_kb = bytes.len() / 1024,
                        start = request.start,
                        end = request.end,
                        "Clip rendered"
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_format_unusable() => {
                    record_render_failure(class, &candidate.name, true);
                    warn!(format = %candidate.name, error = %e, "Format unusable, trying next candidate");
                    last = Some(e);
                }
                Err(e) => {
                    record_render_failure(class, &candidate.name, false);
                    warn!(format = %candidate.name, error = %e, "Render failed");
                    return Err(ClipError::Media(e));
                }
            }
        }

        let last = last.unwrap_or_else(|| MediaError::internal("no candidate formats configured"));
        Err(ClipError::UnavailableFormat {
            class,
            attempted,
            last,
        })
    }

    async fn attempt(
        &self,
        request: &Request,
        candidate: &CandidateFormat,
        target: &OutputTarget,
    ) -> MediaResult<Vec<u8>> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.work_dir)?;

        let locator = self.resolver.resolve(&request.source_id, candidate).await?;
        self.transcoder
            .extract_and_encode(&locator, request.start, request.end, target, scratch.path())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use mockall::Sequence;

    use super::*;
    use crate::resolver::{MockSourceResolver, SourceLocator};
    use crate::transcoder::MockTranscoder;

    fn table() -> FormatTable {
        let mut table = HashMap::new();
        table.insert(
            MediaClass::Preview,
            vec![CandidateFormat::new("p", "worst", Vec::<String>::new())],
        );
        table.insert(
            MediaClass::Video,
            ["a", "b", "c"]
                .into_iter()
                .map(|name| CandidateFormat::new(name, name, Vec::<String>::new()))
                .collect(),
        );
        table.insert(
            MediaClass::Audio,
            vec![CandidateFormat::new("m", "bestaudio", Vec::<String>::new())],
        );
        FormatTable::new(table).unwrap()
    }

    fn request() -> Request {
        Request::new("dQw4w9WgXcQ", 1.0, 3.0)
    }

    fn locator(format: &str) -> SourceLocator {
        SourceLocator {
            format: format.to_string(),
            urls: vec![format!("https://streams/{}", format)],
            http_headers: Vec::new(),
        }
    }

    fn orchestrator(
        resolver: MockSourceResolver,
        transcoder: MockTranscoder,
        work_dir: &Path,
    ) -> ClipOrchestrator {
        ClipOrchestrator::new(Arc::new(resolver), Arc::new(transcoder), table(), work_dir)
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut seq = Sequence::new();
        let mut resolver = MockSourceResolver::new();
        for name in ["a", "b", "c"] {
            resolver
                .expect_resolve()
                .withf(move |id, format| id == "dQw4w9WgXcQ" && format.name == name)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, format| Ok(locator(&format.name)));
        }

        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_extract_and_encode()
            .times(3)
            .returning(|locator, start, end, _, _| {
                assert_eq!((start, end), (1.0, 3.0));
                if locator.format == "c" {
                    Ok(b"clip".to_vec())
                } else {
                    Err(MediaError::format_unavailable(&locator.format, "broken stream"))
                }
            });

        let bytes = orchestrator(resolver, transcoder, dir.path())
            .produce(&request(), MediaClass::Video)
            .await
            .unwrap();
        assert_eq!(bytes, b"clip");
    }

    #[tokio::test]
    async fn test_stops_on_first_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_resolve()
            .withf(|_, format| format.name == "a")
            .times(1)
            .returning(|_, format| Ok(locator(&format.name)));
        resolver
            .expect_resolve()
            .withf(|_, format| format.name != "a")
            .never();

        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_extract_and_encode()
            .times(1)
            .returning(|_, _, _, _, _| Ok(vec![1, 2, 3]));

        let bytes = orchestrator(resolver, transcoder, dir.path())
            .produce(&request(), MediaClass::Video)
            .await
            .unwrap();
        assert_eq!(bytes, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_generic_failure_is_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_resolve()
            .withf(|_, format| format.name == "a")
            .times(1)
            .returning(|_, _| Err(MediaError::download_failed("Video unavailable")));
        resolver
            .expect_resolve()
            .withf(|_, format| format.name != "a")
            .never();

        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_and_encode().never();

        let err = orchestrator(resolver, transcoder, dir.path())
            .produce(&request(), MediaClass::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::Media(MediaError::DownloadFailed { .. })));
    }

    #[tokio::test]
    async fn test_all_candidates_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_resolve()
            .times(3)
            .returning(|_, format| Err(MediaError::format_unavailable(&format.name, "not offered")));
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_extract_and_encode().never();

        let err = orchestrator(resolver, transcoder, dir.path())
            .produce(&request(), MediaClass::Video)
            .await
            .unwrap_err();

        let ClipError::UnavailableFormat {
            class,
            attempted,
            last,
        } = err
        else {
            panic!("expected UnavailableFormat");
        };
        assert_eq!(class, MediaClass::Video);
        assert_eq!(attempted, ["a", "b", "c"]);
        assert!(matches!(last, MediaError::FormatUnavailable { ref format, .. } if format == "c"));
    }

    #[tokio::test]
    async fn test_uses_class_candidates_and_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_resolve()
            .withf(|_, format| format.name == "m")
            .times(1)
            .returning(|_, format| Ok(locator(&format.name)));

        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_extract_and_encode()
            .times(1)
            .returning(|_, _, _, target, _| {
                assert_eq!(target, &OutputTarget::for_class(MediaClass::Audio));
                Ok(b"mp3".to_vec())
            });

        let bytes = orchestrator(resolver, transcoder, dir.path())
            .produce(&request(), MediaClass::Audio)
            .await
            .unwrap();
        assert_eq!(bytes, b"mp3");
    }

    #[tokio::test]
    async fn test_scratch_dirs_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let seen: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));

        let mut resolver = MockSourceResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, format| Ok(locator(&format.name)));

        let mut transcoder = MockTranscoder::new();
        let recorded = Arc::clone(&seen);
        transcoder
            .expect_extract_and_encode()
            .returning(move |locator, _, _, _, work_dir| {
                assert!(work_dir.is_dir());
                std::fs::write(work_dir.join("out.mp4"), b"partial").unwrap();
                recorded.lock().unwrap().push(work_dir.to_path_buf());
                if locator.format == "a" {
                    Err(MediaError::EmptyOutput)
                } else {
                    Ok(b"ok".to_vec())
                }
            });

        let work_dir = dir.path().join("renders");
        orchestrator(resolver, transcoder, &work_dir)
            .produce(&request(), MediaClass::Video)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        for path in seen.iter() {
            assert!(path.starts_with(&work_dir));
            assert!(!path.exists(), "scratch dir {} survived", path.display());
        }
        assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);
    }
}
