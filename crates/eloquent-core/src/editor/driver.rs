//! Async driver for [`EditorState`].
//!
//! One task per editor owns the state and multiplexes four event sources:
//! surface commands, the debounce timer, in-flight checks and the language
//! list poll. After every event a fresh [`EditorSnapshot`] is published on a
//! watch channel. Dropping the task drops the timer, the loader and every
//! in-flight check with it.

use std::future::pending;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use n0_future::task::JoinHandle;
use smol_str::SmolStr;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Sleep;
use tracing::{debug, trace};

use super::state::{CheckTrigger, EditorSnapshot, EditorState, PendingCheck};
use crate::config::EditorConfig;
use crate::error::{CheckError, CorrectionError, EditorError};
use crate::interaction::PointerEvent;
use crate::retry::load_languages;
use crate::service::{CheckService, Language, LanguageService};
use crate::types::Span;

type CheckFuture = BoxFuture<'static, (PendingCheck, Result<Vec<Span>, CheckError>)>;
type LanguageFuture = BoxFuture<'static, Result<Vec<Language>, CheckError>>;
type CorrectionReply = oneshot::Sender<Result<(), CorrectionError>>;

/// Messages from a surface to its editor task.
#[derive(Debug)]
pub enum EditorCommand {
    /// The user changed the text.
    Edit(String),
    SetLanguage(SmolStr),
    /// Check right away, skipping the debounce.
    CheckNow,
    Pointer(PointerEvent),
    DismissPopover,
    DismissStatus,
    /// Apply a suggestion to the span the popover is open on.
    ApplySuggestion {
        replacement: SmolStr,
        reply: CorrectionReply,
    },
    ApplyCorrection {
        span_index: usize,
        replacement: SmolStr,
        reply: CorrectionReply,
    },
    Shutdown,
}

struct Driver<S> {
    state: EditorState,
    service: Arc<S>,
    commands: mpsc::UnboundedReceiver<EditorCommand>,
    snapshots: watch::Sender<EditorSnapshot>,
    debounce: Option<Pin<Box<Sleep>>>,
    checks: FuturesUnordered<CheckFuture>,
    languages: Option<LanguageFuture>,
}

/// Start an editor task on the current runtime.
///
/// The language list is polled right away with `config.language_retry`.
pub fn spawn_editor<S>(service: S, config: EditorConfig) -> EditorHandle
where
    S: CheckService + LanguageService + Send + Sync + 'static,
{
    let service = Arc::new(service);
    let policy = config.language_retry;
    let loader = {
        let service = service.clone();
        async move { load_languages(&*service, policy).await }.boxed()
    };

    let state = EditorState::new(config);
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let driver = Driver {
        state,
        service,
        commands: command_rx,
        snapshots: snapshot_tx,
        debounce: None,
        checks: FuturesUnordered::new(),
        languages: Some(loader),
    };
    let task = n0_future::task::spawn(driver.run());

    EditorHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task,
    }
}

impl<S> Driver<S>
where
    S: CheckService + Send + Sync + 'static,
{
    async fn run(mut self) {
        debug!("editor task started");
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle(command).is_break() {
                        break;
                    }
                }
                () = wait_debounce(&mut self.debounce) => {
                    self.debounce = None;
                    self.issue_check();
                }
                Some((pending, outcome)) = self.checks.next(), if !self.checks.is_empty() => {
                    let applied = self.state.finish_check(pending, outcome);
                    trace!(?applied, "check resolved");
                }
                outcome = wait_languages(&mut self.languages) => {
                    self.languages = None;
                    self.state.languages_loaded(outcome);
                }
            }
            self.publish();
        }
        debug!(dropped_checks = self.checks.len(), "editor task stopped");
    }

    fn handle(&mut self, command: EditorCommand) -> ControlFlow<()> {
        match command {
            EditorCommand::Edit(text) => {
                let trigger = self.state.edit(&text);
                self.schedule(trigger);
            }
            EditorCommand::SetLanguage(language) => {
                if let Some(trigger) = self.state.set_language(language) {
                    self.schedule(trigger);
                }
            }
            EditorCommand::CheckNow => self.schedule(CheckTrigger::Immediate),
            EditorCommand::Pointer(event) => {
                let outcome = self.state.pointer(&event);
                trace!(?outcome, "pointer");
            }
            EditorCommand::DismissPopover => self.state.dismiss_popover(),
            EditorCommand::DismissStatus => self.state.dismiss_status(),
            EditorCommand::ApplySuggestion { replacement, reply } => {
                let outcome = self.state.apply_suggestion(&replacement);
                self.finish_correction(outcome, reply);
            }
            EditorCommand::ApplyCorrection {
                span_index,
                replacement,
                reply,
            } => {
                let outcome = self.state.apply_correction(span_index, &replacement);
                self.finish_correction(outcome, reply);
            }
            EditorCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn finish_correction(
        &mut self,
        outcome: Result<CheckTrigger, CorrectionError>,
        reply: CorrectionReply,
    ) {
        let outcome = outcome.map(|trigger| self.schedule(trigger));
        if let Err(e) = &outcome {
            debug!(error = %e, "correction rejected");
        }
        // The caller may have stopped waiting.
        let _ = reply.send(outcome);
    }

    fn schedule(&mut self, trigger: CheckTrigger) {
        match trigger {
            CheckTrigger::Debounced => {
                let delay = self.state.config().debounce;
                self.debounce = Some(Box::pin(tokio::time::sleep(delay)));
            }
            CheckTrigger::Immediate => {
                self.debounce = None;
                self.issue_check();
            }
        }
    }

    fn issue_check(&mut self) {
        let Some(pending) = self.state.begin_check() else {
            return;
        };
        let service = self.service.clone();
        self.checks.push(
            async move {
                let outcome = service.check(&pending.text, &pending.language).await;
                (pending, outcome)
            }
            .boxed(),
        );
    }

    fn publish(&self) {
        let mut snapshot = self.state.snapshot();
        snapshot.debounce_pending = self.debounce.is_some();
        self.snapshots.send_replace(snapshot);
    }
}

async fn wait_debounce(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

async fn wait_languages(loader: &mut Option<LanguageFuture>) -> Result<Vec<Language>, CheckError> {
    match loader {
        Some(load) => load.await,
        None => pending().await,
    }
}

/// Handle to a running editor task.
///
/// Commands are fire-and-forget except corrections, which report whether
/// they were applied. State is observed through snapshots.
#[derive(Debug)]
pub struct EditorHandle {
    commands: mpsc::UnboundedSender<EditorCommand>,
    snapshots: watch::Receiver<EditorSnapshot>,
    task: JoinHandle<()>,
}

impl EditorHandle {
    fn send(&self, command: EditorCommand) -> Result<(), EditorError> {
        self.commands.send(command).map_err(|_| EditorError::Closed)
    }

    pub fn edit(&self, text: impl Into<String>) -> Result<(), EditorError> {
        self.send(EditorCommand::Edit(text.into()))
    }

    pub fn set_language(&self, language: impl Into<SmolStr>) -> Result<(), EditorError> {
        self.send(EditorCommand::SetLanguage(language.into()))
    }

    pub fn check_now(&self) -> Result<(), EditorError> {
        self.send(EditorCommand::CheckNow)
    }

    pub fn pointer(&self, event: PointerEvent) -> Result<(), EditorError> {
        self.send(EditorCommand::Pointer(event))
    }

    pub fn dismiss_popover(&self) -> Result<(), EditorError> {
        self.send(EditorCommand::DismissPopover)
    }

    pub fn dismiss_status(&self) -> Result<(), EditorError> {
        self.send(EditorCommand::DismissStatus)
    }

    pub async fn apply_suggestion(&self, replacement: impl Into<SmolStr>) -> Result<(), EditorError> {
        let (reply, rx) = oneshot::channel();
        self.send(EditorCommand::ApplySuggestion {
            replacement: replacement.into(),
            reply,
        })?;
        rx.await.map_err(|_| EditorError::Closed)??;
        Ok(())
    }

    pub async fn apply_correction(
        &self,
        span_index: usize,
        replacement: impl Into<SmolStr>,
    ) -> Result<(), EditorError> {
        let (reply, rx) = oneshot::channel();
        self.send(EditorCommand::ApplyCorrection {
            span_index,
            replacement: replacement.into(),
            reply,
        })?;
        rx.await.map_err(|_| EditorError::Closed)??;
        Ok(())
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> EditorSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the first snapshot matching `predicate`, starting with the
    /// current one.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&EditorSnapshot) -> bool,
    ) -> Result<EditorSnapshot, EditorError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| EditorError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Stop the task, discarding any pending timer or in-flight check.
    pub async fn shutdown(self) {
        let _ = self.commands.send(EditorCommand::Shutdown);
        if let Err(e) = self.task.await {
            debug!(error = %e, "editor task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::config::DEFAULT_DEBOUNCE;
    use crate::interaction::{Rect, Viewport};
    use crate::types::{CheckStatus, IssueCategory};

    const VIEWPORT: Viewport = Viewport {
        width: 1024.0,
        height: 768.0,
    };

    #[derive(Debug)]
    struct Call {
        text: String,
        language: String,
        at: Instant,
    }

    #[derive(Default)]
    struct FakeInner {
        calls: Vec<Call>,
        responses: HashMap<String, Result<Vec<Span>, CheckError>>,
        delays: HashMap<String, Duration>,
        languages_down: bool,
        language_calls: u32,
    }

    #[derive(Clone, Default)]
    struct FakeService {
        inner: Arc<Mutex<FakeInner>>,
    }

    impl FakeService {
        fn respond(&self, text: &str, outcome: Result<Vec<Span>, CheckError>) {
            self.inner
                .lock()
                .unwrap()
                .responses
                .insert(text.to_string(), outcome);
        }

        fn delay(&self, text: &str, delay: Duration) {
            self.inner
                .lock()
                .unwrap()
                .delays
                .insert(text.to_string(), delay);
        }

        /// Make every language list request fail, as if the server were
        /// still starting.
        fn languages_down(&self) {
            self.inner.lock().unwrap().languages_down = true;
        }

        fn language_calls(&self) -> u32 {
            self.inner.lock().unwrap().language_calls
        }

        fn calls(&self) -> Vec<(String, String, Instant)> {
            self.inner
                .lock()
                .unwrap()
                .calls
                .iter()
                .map(|c| (c.text.clone(), c.language.clone(), c.at))
                .collect()
        }
    }

    impl CheckService for FakeService {
        fn check(
            &self,
            text: &str,
            language: &str,
        ) -> impl Future<Output = Result<Vec<Span>, CheckError>> + Send {
            let (delay, outcome) = {
                let mut inner = self.inner.lock().unwrap();
                inner.calls.push(Call {
                    text: text.to_string(),
                    language: language.to_string(),
                    at: Instant::now(),
                });
                let delay = inner.delays.get(text).copied().unwrap_or_default();
                let outcome = inner.responses.get(text).cloned().unwrap_or(Ok(Vec::new()));
                (delay, outcome)
            };
            async move {
                tokio::time::sleep(delay).await;
                outcome
            }
        }
    }

    impl LanguageService for FakeService {
        fn languages(&self) -> impl Future<Output = Result<Vec<Language>, CheckError>> + Send {
            let down = {
                let mut inner = self.inner.lock().unwrap();
                inner.language_calls += 1;
                inner.languages_down
            };
            async move {
                if down {
                    return Err(CheckError::Network {
                        message: "connection refused".into(),
                    });
                }
                Ok(vec![
                    Language {
                        name: "German (Germany)".into(),
                        code: "de".into(),
                        long_code: Some("de-DE".into()),
                    },
                    Language {
                        name: "English (US)".into(),
                        code: "en".into(),
                        long_code: Some("en-US".into()),
                    },
                ])
            }
        }
    }

    fn spell(offset: usize, length: usize, replacements: &[&str]) -> Span {
        Span::new(offset, length, IssueCategory::Spelling, "Possible spelling mistake")
            .with_replacements(replacements.iter().copied())
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_debounce_coalesce() {
        let fake = FakeService::default();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        editor.edit("a").unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let last_edit = Instant::now();
        editor.edit("ab").unwrap();

        let snapshot = editor
            .wait_for(|s| s.text == "ab" && s.is_settled())
            .await
            .unwrap();
        assert_eq!(snapshot.status, CheckStatus::Idle);

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "ab");
        assert_eq!(calls[0].1, "en-US");
        assert!(calls[0].2 - last_edit >= DEFAULT_DEBOUNCE);
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_result_for_old_text_is_discarded() {
        let fake = FakeService::default();
        fake.respond("ab", Ok(vec![spell(0, 1, &[])]));
        fake.respond("abc", Ok(vec![spell(0, 3, &[])]));
        fake.delay("ab", Duration::from_secs(2));
        fake.delay("abc", Duration::from_millis(100));
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        editor.edit("ab").unwrap();
        editor.check_now().unwrap();
        editor.edit("abc").unwrap();
        editor.check_now().unwrap();

        let snapshot = editor
            .wait_for(|s| s.text == "abc" && s.is_settled())
            .await
            .unwrap();
        assert_eq!(fake.calls().len(), 2);
        assert_eq!(snapshot.spans.len(), 1);
        assert_eq!(snapshot.spans.get(0).map(|s| s.length), Some(3));
        assert_eq!(snapshot.status, CheckStatus::Idle);
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_text_is_never_sent() {
        let fake = FakeService::default();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        editor.edit("  \n ").unwrap();
        let snapshot = editor
            .wait_for(|s| s.text == "  \n " && s.is_settled())
            .await
            .unwrap();
        assert!(fake.calls().is_empty());
        assert!(snapshot.spans.is_empty());
        assert_eq!(snapshot.status, CheckStatus::Idle);
        assert!(snapshot.segments.iter().all(|s| !s.is_interactive()));
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_annotations() {
        let fake = FakeService::default();
        fake.respond("teh cat", Ok(vec![spell(0, 3, &["the"])]));
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        editor.edit("teh cat").unwrap();
        editor
            .wait_for(|s| s.text == "teh cat" && s.is_settled())
            .await
            .unwrap();

        fake.respond(
            "teh cat",
            Err(CheckError::Network {
                message: "connection refused".into(),
            }),
        );
        editor.check_now().unwrap();
        let snapshot = editor.wait_for(|s| s.status.is_error()).await.unwrap();
        assert_eq!(snapshot.spans.len(), 1);
        assert_eq!(
            snapshot.status_line.as_deref(),
            Some("Could not reach the grammar checker. Is the server running?")
        );

        editor.dismiss_status().unwrap();
        let snapshot = editor.wait_for(|s| !s.status.is_error()).await.unwrap();
        assert_eq!(snapshot.status, CheckStatus::Idle);
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestion_triggers_immediate_recheck() {
        let fake = FakeService::default();
        fake.respond("I like colour today", Ok(vec![spell(7, 6, &["color", "colour"])]));
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        editor.edit("I like colour today").unwrap();
        editor
            .wait_for(|s| s.is_settled() && s.spans.len() == 1)
            .await
            .unwrap();

        editor
            .pointer(PointerEvent::on_annotation(
                0,
                Rect::new(100.0, 20.0, 50.0, 18.0),
                VIEWPORT,
            ))
            .unwrap();
        let snapshot = editor.wait_for(|s| s.popover.is_some()).await.unwrap();
        let (_, view) = snapshot.popover.unwrap();
        assert_eq!(view.suggestions, vec![SmolStr::new("color"), SmolStr::new("colour")]);

        let applied_at = Instant::now();
        editor.apply_suggestion("color").await.unwrap();
        let snapshot = editor
            .wait_for(|s| s.text == "I like color today" && s.is_settled())
            .await
            .unwrap();
        assert!(snapshot.popover.is_none());
        assert!(snapshot.spans.is_empty());

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "I like color today");
        assert!(calls[1].2 - applied_at < DEFAULT_DEBOUNCE);
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestion_without_popover_is_rejected() {
        let editor = spawn_editor(FakeService::default(), EditorConfig::default());
        editor.edit("abc").unwrap();
        let err = editor.apply_suggestion("x").await.unwrap_err();
        assert!(matches!(
            err,
            EditorError::Correction(CorrectionError::NoPopover)
        ));
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_change_rechecks() {
        let fake = FakeService::default();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        let snapshot = editor.wait_for(|s| s.languages.enabled).await.unwrap();
        let names: Vec<_> = snapshot
            .languages
            .options
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["English (US)", "German (Germany)"]);

        editor.edit("Farbe").unwrap();
        editor
            .wait_for(|s| s.text == "Farbe" && s.is_settled())
            .await
            .unwrap();
        editor.set_language("de-DE").unwrap();
        editor
            .wait_for(|s| s.language == "de-DE" && s.is_settled())
            .await
            .unwrap();

        let languages: Vec<_> = fake.calls().into_iter().map(|c| c.1).collect();
        assert_eq!(languages, vec!["en-US", "de-DE"]);
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_poll_gives_up_after_max_attempts() {
        let fake = FakeService::default();
        fake.languages_down();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        // 60 attempts two seconds apart span just under two minutes.
        tokio::time::sleep(Duration::from_secs(100)).await;
        let snapshot = editor.snapshot();
        assert!(!snapshot.languages.enabled);
        assert!(fake.language_calls() > 1);
        assert!(fake.language_calls() < 60);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.language_calls(), 60);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fake.language_calls(), 60);

        // Checks keep working on the default language.
        let snapshot = editor.snapshot();
        assert!(!snapshot.languages.enabled);
        assert_eq!(snapshot.language, "en-US");
        editor.edit("teh cat").unwrap();
        editor
            .wait_for(|s| s.text == "teh cat" && s.is_settled())
            .await
            .unwrap();
        assert_eq!(fake.calls().len(), 1);
        assert_eq!(fake.calls()[0].1, "en-US");
        editor.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_poll_stops_on_shutdown() {
        let fake = FakeService::default();
        fake.languages_down();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!editor.snapshot().languages.enabled);
        assert_eq!(fake.language_calls(), 3);

        editor.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.language_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_poll_stops_when_handle_dropped() {
        let fake = FakeService::default();
        fake.languages_down();
        let editor = spawn_editor(fake.clone(), EditorConfig::default());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fake.language_calls(), 3);

        drop(editor);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.language_calls(), 3);
    }
}
