//! End-to-end tests of the request pipeline with in-memory collaborators


use phrasebook_core::{
    Error, PromptBuilder, ResponseEnvelope, ValidationErrorKind, WordLimits, WordRequest,
    WordService, FAILURE_MESSAGE, RESPONSE_HEADERS, SUCCESS_MESSAGE,
};
use std::sync::Arc;
use std::time::Duration;
use test_support::{entry, five_entries, reply_text, BrokenNotifier, ChannelNotifier, FakeModel};

fn service(model: Arc<FakeModel>) -> WordService {
    WordService::new(WordLimits::default(), PromptBuilder::default(), model)
}

fn envelope_of(body: &str) -> ResponseEnvelope {
    serde_json::from_str(body).expect("body is an envelope")
}

#[tokio::test]
async fn test_full_success() {
    let model = Arc::new(FakeModel::replying(&five_entries("Spanish")));
    let service = service(model.clone());

    let response = service.handle(&WordRequest::new("frase", "198.51.100.4")).await;

    assert_eq!(response.status_code, 200);
    let envelope = envelope_of(&response.body);
    assert_eq!(envelope.message, SUCCESS_MESSAGE);
    assert_eq!(envelope.language, "Spanish");
    assert_eq!(envelope.sentences.len(), 5);
    assert_eq!(envelope.sentences[0].english, "Sentence number 1");

    let requests = model.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["inferenceConfig"]["max_new_tokens"], 1000);
    let prompt = requests[0]["messages"][0]["content"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("'frase'"));
}

#[tokio::test]
async fn test_partial_failure_still_returns_200() {
    let mut blocks: Vec<String> = (1..=5).map(entry).collect();
    blocks[2] = "T: only\nE: two lines".to_string();
    let model = Arc::new(FakeModel::replying(&reply_text("Spanish", &blocks)));

    let response = service(model).handle(&WordRequest::new("frase", "198.51.100.4")).await;

    assert_eq!(response.status_code, 200);
    let envelope = envelope_of(&response.body);
    assert_eq!(envelope.message, FAILURE_MESSAGE);
    assert_eq!(envelope.sentences.len(), 4);
    // Per-entry detail stays out of the payload
    assert!(!response.body.contains("entry 3"));
}

#[tokio::test]
async fn test_percent_encoded_word_reaches_prompt_decoded() {
    let model = Arc::new(FakeModel::replying(&five_entries("Japanese")));
    let service = service(model.clone());

    let envelope = service
        .process(&WordRequest::new("%E3%81%82%E3%82%8A%E3%81%8C%E3%81%A8%E3%81%86", "::1"))
        .await
        .unwrap();
    assert_eq!(envelope.language, "Japanese");

    let requests = model.requests.lock().unwrap();
    let prompt = requests[0]["messages"][0]["content"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("'ありがとう'"));
}

#[tokio::test]
async fn test_validation_failure_skips_model() {
    let model = Arc::new(FakeModel::replying(&five_entries("English")));
    let service = service(model.clone());

    let response = service.handle(&WordRequest::new("SELECT * FROM x", "198.51.100.4")).await;
    assert_eq!(response.status_code, 400);
    let envelope = envelope_of(&response.body);
    assert!(envelope.message.contains("invalid patterns"));
    assert_eq!(envelope.language, "");
    assert!(envelope.sentences.is_empty());
    assert_eq!(model.request_count(), 0);

    let err = service.process(&WordRequest::new("   ", "")).await.unwrap_err();
    match err {
        Error::Validation(v) => assert_eq!(v.kind(), ValidationErrorKind::EmptyInput),
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_configured_length_limit() {
    let model = Arc::new(FakeModel::replying(&five_entries("English")));
    let service = WordService::new(
        WordLimits::new(1, 5).unwrap(),
        PromptBuilder::default(),
        model,
    );

    let response = service.handle(&WordRequest::new("abcdef", "")).await;
    assert_eq!(response.status_code, 400);
    assert!(envelope_of(&response.body).message.contains("must not exceed 5 characters"));
}

#[tokio::test]
async fn test_model_failure_is_internal_error() {
    let model = Arc::new(FakeModel::failing("ThrottlingException: account secret 1234"));
    let response = service(model).handle(&WordRequest::new("hola", "")).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body,
        r#"{"message":"Internal server error","language":"","sentences":[]}"#
    );
}

#[tokio::test]
async fn test_unexpected_reply_shape_is_internal_error() {
    let model = Arc::new(FakeModel::raw(br#"{"output":{"message":{"content":[]}}}"#.to_vec()));
    let service = service(model);

    let err = service.process(&WordRequest::new("hola", "")).await.unwrap_err();
    assert!(matches!(err, Error::ModelResponseShape { .. }));

    let response = service.handle(&WordRequest::new("hola", "")).await;
    assert_eq!(response.status_code, 500);
}

#[tokio::test]
async fn test_headers_present_for_every_status() {
    let ok = service(Arc::new(FakeModel::replying(&five_entries("Spanish"))))
        .handle(&WordRequest::new("hola", ""))
        .await;
    let bad = service(Arc::new(FakeModel::replying("")))
        .handle(&WordRequest::new("", ""))
        .await;
    let failed = service(Arc::new(FakeModel::failing("down")))
        .handle(&WordRequest::new("hola", ""))
        .await;

    for response in [ok, bad, failed] {
        for (name, value) in RESPONSE_HEADERS {
            assert_eq!(response.header(name), Some(*value), "header {}", name);
        }
    }
}

#[tokio::test]
async fn test_notification_is_sent_with_word_and_ip() {
    let (notifier, mut rx) = ChannelNotifier::new();
    let service = service(Arc::new(FakeModel::replying(&five_entries("Spanish"))))
        .with_notifier(Arc::new(notifier));

    let response = service.handle(&WordRequest::new("hola", "203.0.113.9")).await;
    assert_eq!(response.status_code, 200);

    let message = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification delivered")
        .expect("channel open");
    assert_eq!(message, "Requested word: hola --- User IP: 203.0.113.9");
}

#[tokio::test]
async fn test_notification_failure_does_not_affect_response() {
    let service = service(Arc::new(FakeModel::replying(&five_entries("Spanish"))))
        .with_notifier(Arc::new(BrokenNotifier));

    let response = service.handle(&WordRequest::new("hola", "203.0.113.9")).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(envelope_of(&response.body).message, SUCCESS_MESSAGE);
}

#[tokio::test]
async fn test_no_notification_for_rejected_word() {
    let (notifier, mut rx) = ChannelNotifier::new();
    let service = service(Arc::new(FakeModel::replying(&five_entries("Spanish"))))
        .with_notifier(Arc::new(notifier));

    let response = service.handle(&WordRequest::new("<b>", "203.0.113.9")).await;
    assert_eq!(response.status_code, 400);
    drop(service);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_service() {
    let service = Arc::new(service(Arc::new(FakeModel::replying(&five_entries("Spanish")))));

    let handles: Vec<_> = ["uno", "dos", "tres", "cuatro"]
        .into_iter()
        .map(|word| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.handle(&WordRequest::new(word, "")).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().status_code, 200);
    }
}
