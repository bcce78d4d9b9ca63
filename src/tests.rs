use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::{
    client::Credential,
    content::ValidationError,
    media::EncodedMedia,
    report::{ErrorKind, ErrorReport},
    session::{Outcome, Session},
    studio,
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
    GeneratedContent, Gemini, Model, Studio,
};

const BEACH_DAY: &str =
    r#"{"title":"Beach Day","caption":"Sun, sand, and smiles.","hashtags":["beach","summer","fun"]}"#;

/// Answers every request with a canned reply and remembers what it was sent.
#[derive(Clone)]
struct StubTransport {
    reply: Result<ApiResponse, String>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl StubTransport {
    fn model_says(text: &str) -> Self {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 1200, "candidatesTokenCount": 40, "totalTokenCount": 1240},
            "modelVersion": "gemini-2.5-flash"
        });
        Self::raw(200, body.to_string())
    }

    fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Ok(ApiResponse {
                status,
                body: body.into(),
            }),
            requests: Arc::default(),
        }
    }

    fn unreachable() -> Self {
        Self {
            reply: Err("connection refused".to_string()),
            requests: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_body(&self) -> Value {
        self.requests
            .lock()
            .unwrap()
            .last()
            .expect("no request was sent")
            .body
            .clone()
    }

    fn last_prompt(&self) -> String {
        self.last_body()["contents"][0]["parts"][0]["text"]
            .as_str()
            .expect("first part should be the prompt")
            .to_string()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn post_json(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.reply.clone().map_err(|message| TransportError::Unavailable { message })
    }
}

fn base_url() -> Url {
    Url::parse("https://gemini.test/v1beta/").unwrap()
}

fn studio_with(credential: Credential, stub: &StubTransport) -> Studio {
    let gemini = Gemini::with_model_and_base_url(credential, Model::Gemini25Flash, base_url())
        .with_transport(stub.clone());
    Studio::new(gemini)
}

fn studio(stub: &StubTransport) -> Studio {
    studio_with(Credential::from("test-key"), stub)
}

fn video() -> EncodedMedia {
    EncodedMedia::from_bytes("video/mp4".parse().unwrap(), b"\x00\x00\x00\x18ftypmp42")
}

#[tokio::test]
async fn generate_returns_model_content() {
    let stub = StubTransport::model_says(BEACH_DAY);

    let content = studio(&stub).generate(&video(), None).await.unwrap();

    assert_eq!(content.title, "Beach Day");
    assert_eq!(content.hashtags.len(), 3);
    assert_eq!(stub.calls(), 1);
}

#[tokio::test]
async fn generate_sends_structured_output_request() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let media = video();

    studio(&stub).generate(&media, None).await.unwrap();

    let requests = stub.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(
        request.url.as_str(),
        "https://gemini.test/v1beta/models/gemini-2.5-flash:generateContent"
    );
    assert_eq!(request.api_key, "test-key");
    assert!(!request.url.as_str().contains("test-key"));

    let body = &request.body;
    assert_eq!(body["contents"][0]["role"], "user");
    let inline = &body["contents"][0]["parts"][1]["inlineData"];
    assert_eq!(inline["mimeType"], "video/mp4");
    assert_eq!(inline["data"], media.data());

    let config = &body["generationConfig"];
    assert_eq!(config["responseMimeType"], "application/json");
    assert_eq!(config["responseSchema"], GeneratedContent::response_schema());
    assert!(config.get("temperature").is_none());
}

#[tokio::test]
async fn temperature_applies_to_generate_and_refine() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let studio = studio(&stub).with_temperature(0.5);
    let media = video();

    let draft = studio.generate(&media, None).await.unwrap();
    assert_eq!(stub.last_body()["generationConfig"]["temperature"], 0.5);

    studio.refine(&media, &draft, "Make it punchier").await.unwrap();
    let config = &stub.last_body()["generationConfig"];
    assert_eq!(config["temperature"], 0.5);
    assert_eq!(config["responseMimeType"], "application/json");
}

#[tokio::test]
async fn compliant_model_yields_five_to_ten_hashtags() {
    let reply = json!({
        "title": "Sunrise Run",
        "caption": "Early miles along the river. Worth every yawn.",
        "hashtags": ["running", "sunrise", "river", "fitness", "morning", "motivation", "runner"]
    });
    let stub = StubTransport::model_says(&reply.to_string());

    let content = studio(&stub).generate(&video(), Some("")).await.unwrap();

    assert!((5..=10).contains(&content.hashtags.len()));
}

#[tokio::test]
async fn generate_appends_context() {
    let stub = StubTransport::model_says(BEACH_DAY);

    studio(&stub)
        .generate(&video(), Some("Our dog's first time at the beach"))
        .await
        .unwrap();

    assert!(stub
        .last_prompt()
        .ends_with("Our dog's first time at the beach"));
}

#[tokio::test]
async fn refine_restates_prior_content_and_resends_video() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let media = video();
    let prior = GeneratedContent {
        title: "Golden Hour at Bondi".to_string(),
        caption: "Waves, warm light & one very happy dog.".to_string(),
        hashtags: vec!["bondi".to_string(), "goldenhour".to_string(), "doglife".to_string()],
    };

    let refined = studio(&stub)
        .refine(&media, &prior, "Make the caption shorter")
        .await
        .unwrap();

    assert_eq!(refined.title, "Beach Day");

    let prompt = stub.last_prompt();
    assert!(prompt.contains(&prior.title));
    assert!(prompt.contains(&prior.caption));
    for tag in &prior.hashtags {
        assert!(prompt.contains(tag.as_str()), "missing hashtag {tag}");
    }
    assert!(prompt.contains("Make the caption shorter"));

    let body = stub.last_body();
    assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], media.data());
    assert_eq!(
        body["generationConfig"]["responseSchema"],
        GeneratedContent::response_schema()
    );
}

#[tokio::test]
async fn missing_credential_fails_before_network() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let unset = Credential::Environment(vec!["CLIP_CAPTION_TEST_KEY_THAT_IS_NEVER_SET".to_string()]);

    let err = studio_with(unset, &stub)
        .generate(&video(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn blank_instruction_is_rejected_before_network() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let prior = crate::content::validate(BEACH_DAY).unwrap();

    let err = studio(&stub)
        .refine(&video(), &prior, "   ")
        .await
        .unwrap_err();

    assert!(matches!(err, studio::Error::EmptyInstruction));
    assert_eq!(stub.calls(), 0);
}

#[tokio::test]
async fn malformed_reply_is_a_parse_failure() {
    let stub = StubTransport::model_says("{not json");

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    assert!(matches!(
        err,
        studio::Error::Validation {
            source: ValidationError::MalformedJson { .. }
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Generation);
}

#[tokio::test]
async fn wrong_shape_is_a_schema_failure() {
    let stub = StubTransport::model_says(r#"{"title":"Beach Day","caption":"Sun."}"#);

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    assert!(matches!(
        err,
        studio::Error::Validation {
            source: ValidationError::SchemaMismatch { .. }
        }
    ));
}

#[tokio::test]
async fn blocked_prompt_is_an_empty_response() {
    let stub = StubTransport::raw(200, r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    match &err {
        studio::Error::EmptyResponse { block_reason, .. } => {
            assert_eq!(block_reason.as_deref(), Some("SAFETY"));
        }
        other => panic!("expected EmptyResponse, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Generation);
}

#[tokio::test]
async fn rejected_key_is_a_configuration_error() {
    let body = json!({
        "error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT",
            "details": [{
                "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                "reason": "API_KEY_INVALID",
                "domain": "googleapis.com"
            }]
        }
    });
    let stub = StubTransport::raw(400, body.to_string());

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn unsupported_video_is_a_media_error() {
    let body = json!({
        "error": {"code": 400, "message": "Unsupported MIME type: video/x-unknown", "status": "INVALID_ARGUMENT"}
    });
    let stub = StubTransport::raw(400, body.to_string());

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Media);
}

#[tokio::test]
async fn network_failure_is_unexpected() {
    let stub = StubTransport::unreachable();

    let err = studio(&stub).generate(&video(), None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert!(ErrorReport::from_error(&err).kind.is_retryable());
}

#[tokio::test]
async fn session_drives_generate_then_refine() {
    let stub = StubTransport::model_says(BEACH_DAY);
    let studio = studio(&stub);
    let mut session = Session::new();
    session.select_video(video());

    let pending = session.begin_generate().unwrap();
    let result = studio.generate(&pending.video, None).await;
    assert_eq!(session.complete(pending.ticket, result), Outcome::Applied);
    assert_eq!(session.content().unwrap().title, "Beach Day");

    session.edit_title("Beach Day!!").unwrap();

    let pending = session.begin_refine().unwrap();
    assert_eq!(pending.prior.title, "Beach Day!!");
    let result = studio
        .refine(&pending.video, &pending.prior, "Add more energy")
        .await;
    assert_eq!(session.complete(pending.ticket, result), Outcome::Applied);

    assert!(stub.last_prompt().contains("Beach Day!!"));
    assert_eq!(session.content().unwrap().title, "Beach Day");
    assert!(session.error().is_none());
}
