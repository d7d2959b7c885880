mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedLookup, sample_words};
use lexiquiz_rs::{
    AnswerOutcome, FallbackCatalog, NoSpeech, QuizConfig, QuizError, QuizSession, Relation,
    SentenceJournal, SentenceOutcome, SessionState, Severity, SuggestionEngine, SuggestionView,
    VerdictSource, WordList,
};
use parking_lot::Mutex;

fn ready_session(lookup: ScriptedLookup) -> QuizSession<ScriptedLookup> {
    let mut session = QuizSession::new(lookup);
    session.load(sample_words());
    session
}

#[test]
fn advance_cycles_through_words() {
    let mut session = ready_session(ScriptedLookup::unavailable());
    assert_eq!(session.state(), SessionState::Ready);
    let mut seen = vec![session.current_index()];
    for _ in 0..4 {
        session.advance();
        seen.push(session.current_index());
    }
    assert_eq!(seen, [0, 1, 2, 0, 1]);
    assert_eq!(session.current().unwrap().text, "fast");
}

#[test]
fn advance_on_empty_list_is_noop() {
    let mut session = QuizSession::new(ScriptedLookup::unavailable());
    assert_eq!(session.state(), SessionState::Empty);
    assert!(session.advance().is_none());
    assert!(session.advance().is_none());
    assert_eq!(session.current_index(), 0);
    assert!(session.current().is_none());
}

#[test]
fn load_resets_index() {
    let mut session = ready_session(ScriptedLookup::unavailable());
    session.advance();
    session.advance();
    assert_eq!(session.current_index(), 2);
    session.load(sample_words());
    assert_eq!(session.current_index(), 0);
    session.load(WordList::default());
    assert_eq!(session.state(), SessionState::Empty);
}

#[test]
fn bad_word_list_leaves_session_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(&path, br#"{"word":"big"}"#).unwrap();

    let mut session = ready_session(ScriptedLookup::unavailable());
    assert!(session.load_from_path(&path).is_err());
    assert_eq!(session.state(), SessionState::Empty);
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Danger);
}

#[test]
fn word_list_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.json");
    std::fs::write(
        &path,
        br#"[{"word":"big","pos":"adjective","definition":"large"},{"word":"cold","partOfSpeech":"adjective","definition":"chilly"}]"#,
    )
    .unwrap();
    let mut session = QuizSession::new(ScriptedLookup::unavailable());
    assert_eq!(session.load_from_path(&path).unwrap(), 2);
    assert_eq!(session.current().unwrap().text, "big");
}

#[test]
fn malformed_json_payload_clears_session() {
    let mut session = ready_session(ScriptedLookup::unavailable());
    assert!(session.load_from_json(b"not json").is_err());
    assert_eq!(session.state(), SessionState::Empty);
    assert!(session.current().is_none());

    assert_eq!(session.load_from_json(br#"[{"word":"warm"}]"#).unwrap(), 1);
    assert_eq!(session.current().unwrap().text, "warm");
}

#[tokio::test]
async fn fallback_scenario_accepts_large_for_big() {
    let session = ready_session(ScriptedLookup::unavailable());
    let outcome = session.submit_answer(Relation::Synonym, "Large ").await;
    let AnswerOutcome::Graded { verdict } = outcome else {
        panic!("expected a verdict, got {outcome:?}");
    };
    assert!(verdict.accepted);
    assert_eq!(verdict.source, VerdictSource::Fallback);
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Success);
    assert!(shown.message.contains("offline"));
}

#[tokio::test]
async fn remote_scenario_accepts_small_as_antonym() {
    let session = ready_session(ScriptedLookup::remote(&["small", "tiny"]));
    let outcome = session.submit_answer(Relation::Antonym, "SMALL").await;
    let AnswerOutcome::Graded { verdict } = outcome else {
        panic!("expected a verdict, got {outcome:?}");
    };
    assert!(verdict.accepted);
    assert_eq!(verdict.source, VerdictSource::Remote);
    assert_eq!(session.validator().lookup().queries()[0].word, "big");
}

#[tokio::test]
async fn wrong_answer_posts_danger() {
    let session = ready_session(ScriptedLookup::remote(&["small", "tiny"]));
    let outcome = session.submit_answer(Relation::Antonym, "huge").await;
    assert!(matches!(outcome, AnswerOutcome::Graded { verdict } if !verdict.accepted));
    assert_eq!(
        session.feedback().current().unwrap().severity,
        Severity::Danger
    );
}

#[tokio::test]
async fn blank_answer_is_warning_without_lookup() {
    let session = ready_session(ScriptedLookup::remote(&["large"]));
    let outcome = session.submit_answer(Relation::Synonym, "  ").await;
    assert_eq!(outcome, AnswerOutcome::EmptyInput);
    assert_eq!(session.validator().lookup().calls(), 0);
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Warning);
    assert_eq!(shown.message, "Please enter a synonym.");
}

#[tokio::test]
async fn answer_without_word_is_rejected() {
    let session = QuizSession::new(ScriptedLookup::remote(&["large"]));
    let outcome = session.submit_answer(Relation::Synonym, "large").await;
    assert_eq!(outcome, AnswerOutcome::NoWord);
    assert_eq!(session.validator().lookup().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn stale_verdict_on_same_form_is_discarded() {
    let lookup = ScriptedLookup::remote(&["large"]).with_delays(&[
        Duration::from_millis(100),
        Duration::from_millis(10),
    ]);
    let session = ready_session(lookup);
    let (first, second) = tokio::join!(session.submit_answer(Relation::Synonym, "huge"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.submit_answer(Relation::Synonym, "large").await
    });
    assert_eq!(first, AnswerOutcome::Superseded);
    assert!(matches!(second, AnswerOutcome::Graded { verdict } if verdict.accepted));
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Success);
}

#[tokio::test(start_paused = true)]
async fn forms_validate_independently() {
    let lookup = ScriptedLookup::remote(&["large", "small"]).with_delays(&[
        Duration::from_millis(100),
        Duration::from_millis(10),
    ]);
    let session = ready_session(lookup);
    let (synonym, antonym) = tokio::join!(
        session.submit_answer(Relation::Synonym, "large"),
        session.submit_answer(Relation::Antonym, "small"),
    );
    assert!(matches!(synonym, AnswerOutcome::Graded { .. }));
    assert!(matches!(antonym, AnswerOutcome::Graded { .. }));
}

#[test]
fn sentence_missing_word_is_rejected() {
    let session = ready_session(ScriptedLookup::unavailable());
    let outcome = session.submit_sentence("The dog is small").unwrap();
    assert_eq!(
        outcome,
        SentenceOutcome::MissingWord {
            word: "big".to_string()
        }
    );
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Danger);
    assert!(shown.message.contains("\"big\""));
    assert!(session.journal().entries().is_empty());
}

#[test]
fn sentence_with_word_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sentences.json");
    let session = ready_session(ScriptedLookup::unavailable())
        .with_journal(SentenceJournal::persistent(&path));
    let outcome = session.submit_sentence("The dog is big").unwrap();
    let SentenceOutcome::Saved { entry } = outcome else {
        panic!("expected the sentence to be saved");
    };
    assert_eq!(entry.word, "big");
    assert_eq!(entry.sentence, "The dog is big");
    assert_eq!(session.journal().entries(), vec![entry]);
    assert_eq!(
        session.feedback().current().unwrap().severity,
        Severity::Success
    );
}

#[test]
fn blank_sentence_is_warning() {
    let session = ready_session(ScriptedLookup::unavailable());
    assert_eq!(
        session.submit_sentence("   ").unwrap(),
        SentenceOutcome::EmptyInput
    );
    assert_eq!(
        session.feedback().current().unwrap().severity,
        Severity::Warning
    );
}

#[test]
fn missing_speech_support_is_warning() {
    let session = ready_session(ScriptedLookup::unavailable());
    assert!(!session.speak_current(&NoSpeech));
    let shown = session.feedback().current().unwrap();
    assert_eq!(shown.severity, Severity::Warning);
}

#[tokio::test(start_paused = true)]
async fn suggestions_follow_fallback_lists_and_reset_on_advance() {
    let mut session = ready_session(ScriptedLookup::unavailable()).with_fallback(
        FallbackCatalog::new(["small", "huge", "smoke"], ["tiny", "timid"]),
    );
    session.suggest(Relation::Synonym, "sm").unwrap();
    session.suggest(Relation::Antonym, "ti").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        session.suggestions(Relation::Synonym),
        SuggestionView::Matches(vec!["small".to_string(), "smoke".to_string()])
    );
    assert_eq!(
        session.select_suggestion(Relation::Synonym, "smoke"),
        "smoke"
    );
    assert_eq!(session.suggestions(Relation::Synonym), SuggestionView::Hidden);
    assert_eq!(session.suggestions(Relation::Antonym).words().len(), 2);

    session.suggest(Relation::Antonym, "q").unwrap();
    session.advance();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.suggestions(Relation::Antonym), SuggestionView::Hidden);
}

#[tokio::test(start_paused = true)]
async fn suggestion_listener_survives_fallback_swap() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = SuggestionEngine::new(["unused"]).on_update({
        let seen = Arc::clone(&seen);
        move |view: &SuggestionView| seen.lock().push(view.clone())
    });
    let mut session = ready_session(ScriptedLookup::unavailable())
        .with_suggestion_engine(Relation::Synonym, engine)
        .with_fallback(FallbackCatalog::new(["sturdy", "strong"], ["weak"]));

    session.suggest(Relation::Synonym, "st").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let expected = SuggestionView::Matches(vec!["sturdy".to_string(), "strong".to_string()]);
    assert_eq!(seen.lock().last(), Some(&expected));

    session.select_suggestion(Relation::Synonym, "strong");
    assert_eq!(seen.lock().last(), Some(&SuggestionView::Hidden));
}

#[test]
fn suggest_outside_runtime_reports_error() {
    let mut session = ready_session(ScriptedLookup::unavailable());
    let err = session.suggest(Relation::Synonym, "la").unwrap_err();
    assert!(matches!(err, QuizError::NoRuntime));
    assert_eq!(session.suggestions(Relation::Synonym), SuggestionView::Hidden);
    session.advance();
    assert_eq!(session.current_index(), 1);
}

#[test]
fn offline_config_builds_empty_session() {
    let config = QuizConfig {
        offline: true,
        ..QuizConfig::default()
    };
    let session = QuizSession::from_config(&config).unwrap();
    assert_eq!(session.state(), SessionState::Empty);
    assert!(session.journal().path().is_none());
}
