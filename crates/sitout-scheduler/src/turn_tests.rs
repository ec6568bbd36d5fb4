use super::*;
use crate::client::ClientSettings;
use crate::credential_pool::CredentialPool;
use crate::rate_limit::RateLimiter;
use crate::test_support::{FakeProvider, cast, key};
use sitout_core::ProviderError;

fn quick_settings(soft_cap: usize) -> TurnSettings {
    TurnSettings {
        retention: 10,
        soft_cap,
        dwell_min: Duration::ZERO,
        dwell_max: Duration::ZERO,
    }
}

fn client(provider: Arc<FakeProvider>, keys: usize) -> Arc<GenerationClient> {
    Arc::new(GenerationClient::new(
        provider,
        CredentialPool::new((0..keys).map(key).collect(), Duration::from_secs(300)),
        RateLimiter::new(Duration::ZERO, Duration::ZERO),
        ClientSettings::default(),
    ))
}

fn scheduler(provider: Arc<FakeProvider>, personas: usize, settings: TurnSettings) -> TurnScheduler {
    TurnScheduler::new(
        cast(personas),
        client(provider, 1),
        FallbackSelector::with_seed(11),
        settings,
    )
    .unwrap()
}

fn speakers(snapshot: &ConversationSnapshot) -> Vec<&str> {
    snapshot
        .history
        .iter()
        .map(|m| m.speaker_id.as_str())
        .collect()
}

#[derive(Default)]
struct RecordingSpeech {
    spoken: std::sync::Mutex<Vec<String>>,
}

impl SpeechSink for RecordingSpeech {
    fn speak(&self, message: &Message, persona: &Persona) {
        self.spoken
            .lock()
            .unwrap()
            .push(format!("{}|{}", persona.id, message.text));
    }
}

#[test]
fn test_new_rejects_empty_cast() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let result = TurnScheduler::new(
        Vec::new(),
        client(provider, 1),
        FallbackSelector::with_seed(1),
        quick_settings(10),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_four_personas_ok_scenario() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 4, quick_settings(10));

    let outcome = sched.start().await;
    assert_eq!(outcome.message().unwrap().text, "ok");
    let snap = sched.snapshot();
    assert_eq!(speakers(&snap), vec!["babu"]);
    assert_eq!(snap.active_speaker.as_str(), "aliyamma");
    assert!(snap.is_active);

    for _ in 0..3 {
        assert!(sched.request_next_turn().await.message().is_some());
    }
    let snap = sched.snapshot();
    assert_eq!(speakers(&snap), vec!["babu", "aliyamma", "fathima", "chakko"]);
    assert!(snap.history.iter().all(|m| m.text == "ok"));
    assert!(snap.history.iter().all(|m| m.source == MessageSource::Generated));
    assert_eq!(snap.active_speaker.as_str(), "babu");
}

#[tokio::test]
async fn test_active_index_after_n_turns() {
    for count in 1..=5 {
        let provider = Arc::new(FakeProvider::replying("ok"));
        let sched = scheduler(provider, count, quick_settings(10));
        sched.start().await;
        for n in 0..7 {
            let expected = &sched.personas()[(1 + n) % count].id;
            assert_eq!(&sched.snapshot().active_speaker, expected);
            sched.request_next_turn().await;
        }
    }
}

#[tokio::test]
async fn test_start_twice_appends_once() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider.clone(), 3, quick_settings(10));

    assert!(matches!(sched.start().await, TurnOutcome::Spoke(_)));
    assert_eq!(
        sched.start().await,
        TurnOutcome::Skipped(SkipReason::AlreadyStarted)
    );
    assert_eq!(sched.snapshot().history.len(), 1);
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_turn_before_start_is_noop() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider.clone(), 2, quick_settings(10));
    assert_eq!(
        sched.request_next_turn().await,
        TurnOutcome::Skipped(SkipReason::NotActive)
    );
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_liveness_with_failing_provider() {
    let provider = Arc::new(FakeProvider::failing(ProviderError::transport(
        "connection refused",
    )));
    let sched = scheduler(provider, 3, quick_settings(10));

    let opening = sched.start().await;
    assert_eq!(opening.message().unwrap().source, MessageSource::Fallback);

    for n in 1..=6 {
        let outcome = sched.request_next_turn().await;
        let message = outcome.message().unwrap();
        assert_eq!(message.source, MessageSource::Fallback);
        assert!(!message.text.is_empty());
        let snap = sched.snapshot();
        assert_eq!(snap.history.len(), (n + 1).min(10));
        assert_eq!(snap.active_speaker, sched.personas()[(n + 1) % 3].id);
        assert!(!snap.is_generating);
    }
}

#[tokio::test]
async fn test_fallback_uses_speaker_lines() {
    let provider = Arc::new(FakeProvider::failing(ProviderError::new(Some(500), "oops")));
    let sched = scheduler(provider, 2, quick_settings(10));
    sched.start().await;
    let outcome = sched.request_next_turn().await;
    assert_eq!(outcome.message().unwrap().text, "Aliyamma fallback line.");
}

#[tokio::test]
async fn test_soft_cap_pauses_and_resume_grants_turn() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 2, quick_settings(3));
    sched.start().await;
    sched.request_next_turn().await;
    assert!(!sched.snapshot().is_paused);
    sched.request_next_turn().await;

    let snap = sched.snapshot();
    assert_eq!(snap.history.len(), 3);
    assert!(snap.is_paused);
    assert_eq!(snap.phase, Phase::Paused);
    assert_eq!(
        sched.request_next_turn().await,
        TurnOutcome::Skipped(SkipReason::Paused)
    );

    assert!(sched.resume());
    assert_eq!(sched.snapshot().history.len(), 3);
    assert!(sched.request_next_turn().await.message().is_some());
    assert_eq!(sched.snapshot().history.len(), 4);
    assert!(sched.snapshot().is_paused);
}

#[tokio::test]
async fn test_soft_cap_above_retention_still_pauses() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let settings = TurnSettings {
        retention: 5,
        ..quick_settings(10)
    };
    let sched = scheduler(provider, 4, settings);
    sched.start().await;

    let mut spoke = 1;
    for _ in 0..50 {
        if sched.request_next_turn().await.message().is_some() {
            spoke += 1;
        }
    }

    let snap = sched.snapshot();
    assert!(snap.is_paused);
    assert_eq!(spoke, 5);
    assert_eq!(snap.history.len(), 5);
}

#[tokio::test]
async fn test_pause_and_resume() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 2, quick_settings(10));
    assert!(!sched.pause());
    sched.start().await;

    assert!(sched.pause());
    assert!(!sched.pause());
    assert_eq!(
        sched.request_next_turn().await,
        TurnOutcome::Skipped(SkipReason::Paused)
    );
    assert!(sched.resume());
    assert!(!sched.resume());
    assert!(sched.request_next_turn().await.message().is_some());
}

#[tokio::test]
async fn test_reset_clears_and_allows_restart() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 3, quick_settings(10));
    sched.start().await;
    sched.request_next_turn().await;

    sched.reset();
    let snap = sched.snapshot();
    assert!(snap.history.is_empty());
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.active_speaker.as_str(), "babu");
    assert!(!snap.is_active);

    assert!(sched.start().await.message().is_some());
    assert_eq!(sched.snapshot().history.len(), 1);
}

#[tokio::test]
async fn test_dwell_gates_turns() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let settings = TurnSettings {
        dwell_min: Duration::from_secs(10),
        dwell_max: Duration::from_secs(10),
        ..quick_settings(10)
    };
    let sched = scheduler(provider, 2, settings);
    sched.start().await;

    let outcome = sched.request_next_turn_at(Instant::now()).await;
    assert!(matches!(
        outcome,
        TurnOutcome::Skipped(SkipReason::Dwelling { remaining }) if remaining > Duration::from_secs(9)
    ));
    let later = Instant::now() + Duration::from_secs(11);
    assert!(sched.request_next_turn_at(later).await.message().is_some());
}

#[tokio::test]
async fn test_dwell_drawn_within_band() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let settings = TurnSettings {
        dwell_min: Duration::from_millis(8_000),
        dwell_max: Duration::from_millis(12_000),
        ..quick_settings(10)
    };
    let sched = scheduler(provider, 2, settings);
    for _ in 0..50 {
        let dwell = sched.draw_dwell();
        assert!(dwell >= Duration::from_secs(8) && dwell <= Duration::from_secs(12));
    }
}

#[tokio::test]
async fn test_request_while_generating_is_noop() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider.clone(), 2, quick_settings(10));
    sched.start().await;

    sched.lock_state().generating = true;
    assert_eq!(
        sched.request_next_turn().await,
        TurnOutcome::Skipped(SkipReason::Generating)
    );
    assert_eq!(provider.calls().len(), 1);
    assert!(sched.snapshot().is_generating);
}

#[tokio::test]
async fn test_result_after_reset_is_discarded() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 2, quick_settings(10));
    sched.start().await;

    // A turn that began before the reset finishes afterwards.
    let stale_epoch = sched.lock_state().epoch;
    sched.reset();
    let outcome = sched.finish_turn(1, stale_epoch, "late".into(), MessageSource::Generated);
    assert_eq!(outcome, TurnOutcome::Skipped(SkipReason::Stale));
    assert!(sched.snapshot().history.is_empty());
}

#[tokio::test]
async fn test_speech_sink_receives_each_message() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let speech = Arc::new(RecordingSpeech::default());
    let sched = scheduler(provider, 2, quick_settings(10)).with_speech(speech.clone());
    sched.start().await;
    sched.request_next_turn().await;
    assert_eq!(
        *speech.spoken.lock().unwrap(),
        vec!["babu|ok".to_string(), "aliyamma|ok".to_string()]
    );
}

#[tokio::test]
async fn test_message_ids_increase() {
    let provider = Arc::new(FakeProvider::replying("ok"));
    let sched = scheduler(provider, 2, quick_settings(10));
    sched.start().await;
    sched.request_next_turn().await;
    let ids: Vec<u64> = sched.snapshot().history.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2]);
}
