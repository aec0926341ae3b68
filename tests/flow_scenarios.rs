use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use mythic::client::{ModelClient, ModelError, RawResult, ResponseFormat};
use mythic::flow::FlowError;
use mythic::flow::classify::{ClassifySymbolInput, ClassifySymbolOutput, classify_symbol};
use mythic::flow::detect::{DetectHiddenSymbolsInput, detect_hidden_symbols};
use mythic::flow::illusion::generate_illusion;
use mythic::flow::{classify, detect};

const IMAGE: &str = "data:image/png;base64,AAAA";

/// A test double standing in for the hosted model. It records every call,
/// hands back a scripted result, and remembers the prompt and format it was
/// given so tests can assert on what actually went over the wire.
struct FakeModel {
    result: Mutex<Option<Result<Option<RawResult>, ModelError>>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_format: Mutex<Option<ResponseFormat>>,
}

impl FakeModel {
    fn returning(result: Result<Option<RawResult>, ModelError>) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_format: Mutex::new(None),
        }
    }

    fn structured(value: Value) -> Self {
        Self::returning(Ok(Some(RawResult::Structured(value))))
    }

    fn empty() -> Self {
        Self::returning(Ok(None))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    fn last_format(&self) -> Option<ResponseFormat> {
        self.last_format.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn call(
        &self,
        prompt: &str,
        format: &ResponseFormat,
    ) -> Result<Option<RawResult>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        *self.last_format.lock().unwrap() = Some(format.clone());
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("model called more than once")
    }
}

// Scenario A: a conforming reply comes back to the caller unchanged.
#[tokio::test]
async fn conforming_reply_is_returned_unchanged() {
    let model = FakeModel::structured(json!({"symbol": "Ouroboros", "confidence": 0.92}));
    let input = ClassifySymbolInput {
        image_data_uri: IMAGE.to_string(),
    };

    let output = classify_symbol(&model, &input).await.unwrap();
    assert_eq!(
        output,
        ClassifySymbolOutput {
            symbol: "Ouroboros".to_string(),
            confidence: 0.92,
        }
    );
    assert_eq!(model.calls(), 1);
}

// Scenario B: a reply missing a required field is an output validation
// failure, not a partial success.
#[tokio::test]
async fn missing_confidence_fails_output_validation() {
    let model = FakeModel::structured(json!({"symbol": "Ouroboros"}));
    let input = ClassifySymbolInput {
        image_data_uri: IMAGE.to_string(),
    };

    let err = classify_symbol(&model, &input).await.unwrap_err();
    match err {
        FlowError::OutputValidation { violations } => {
            assert_eq!(violations[0].field, "confidence");
        }
        other => panic!("expected output validation failure, got {other:?}"),
    }
}

// Scenario C: invalid input never reaches the model.
#[tokio::test]
async fn invalid_input_never_calls_the_model() {
    let model = FakeModel::empty();
    let err = classify::flow().invoke(&model, json!({})).await.unwrap_err();

    match err {
        FlowError::InputValidation { violations } => {
            assert_eq!(violations[0].field, "imageDataUri");
        }
        other => panic!("expected input validation failure, got {other:?}"),
    }
    assert_eq!(model.calls(), 0);
}

// Scenario D: the model answered with nothing usable.
#[tokio::test]
async fn empty_model_payload_is_an_empty_result() {
    let model = FakeModel::empty();
    let input = ClassifySymbolInput {
        image_data_uri: IMAGE.to_string(),
    };

    let err = classify_symbol(&model, &input).await.unwrap_err();
    assert!(matches!(err, FlowError::EmptyResult));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected_not_clamped() {
    let model = FakeModel::structured(json!({"symbol": "Ouroboros", "confidence": 1.2}));
    let input = ClassifySymbolInput {
        image_data_uri: IMAGE.to_string(),
    };

    let err = classify_symbol(&model, &input).await.unwrap_err();
    match err {
        FlowError::OutputValidation { violations } => {
            assert_eq!(violations[0].field, "confidence");
            assert!(violations[0].reason.contains("outside [0,1]"));
        }
        other => panic!("expected output validation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn detection_accepts_a_conforming_empty_symbol_list() {
    let model = FakeModel::structured(json!({
        "symbolsDetected": [],
        "analysis": "Nothing is hidden in this artwork."
    }));
    let input = DetectHiddenSymbolsInput {
        artwork_data_uri: IMAGE.to_string(),
    };

    let output = detect_hidden_symbols(&model, &input).await.unwrap();
    assert!(output.symbols_detected.is_empty());
    assert_eq!(output.analysis, "Nothing is hidden in this artwork.");
}

#[tokio::test]
async fn detection_prompt_embeds_the_artwork_and_declares_json() {
    let model = FakeModel::structured(json!({
        "symbolsDetected": ["Ouroboros"],
        "analysis": "A serpent in the border."
    }));
    let input = DetectHiddenSymbolsInput {
        artwork_data_uri: IMAGE.to_string(),
    };

    detect_hidden_symbols(&model, &input).await.unwrap();

    let prompt = model.last_prompt().unwrap();
    assert!(prompt.contains("art historian"));
    assert!(prompt.contains(IMAGE));

    match model.last_format().unwrap() {
        ResponseFormat::Json(schema) => {
            assert_eq!(
                schema["required"],
                json!(["symbolsDetected", "analysis"])
            );
        }
        other => panic!("expected a JSON response format, got {other:?}"),
    }
}

#[tokio::test]
async fn illusion_generation_asks_for_media_and_wraps_the_handle() {
    let model = FakeModel::returning(Ok(Some(RawResult::Media {
        uri: "data:image/png;base64,QUJD".to_string(),
    })));

    let output = generate_illusion(&model).await.unwrap();
    assert_eq!(output.media, "data:image/png;base64,QUJD");
    assert_eq!(
        model.last_format().unwrap(),
        ResponseFormat::TextAndImage
    );
    assert_eq!(
        model.last_prompt().unwrap(),
        "Generate an abstract optical illusion."
    );
}

#[tokio::test]
async fn illusion_without_media_is_an_empty_result() {
    let model = FakeModel::empty();
    let err = generate_illusion(&model).await.unwrap_err();
    assert!(matches!(err, FlowError::EmptyResult));
}

#[tokio::test]
async fn model_failure_surfaces_to_the_caller_unmodified() {
    let model = FakeModel::returning(Err(ModelError::Api("429: quota exhausted".into())));
    let err = generate_illusion(&model).await.unwrap_err();
    match err {
        FlowError::Model(ModelError::Api(msg)) => assert_eq!(msg, "429: quota exhausted"),
        other => panic!("expected a model error, got {other:?}"),
    }
}

#[tokio::test]
async fn detect_flow_rejects_non_data_uri_input_before_calling() {
    let model = FakeModel::empty();
    let err = detect::flow()
        .invoke(&model, json!({"artworkDataUri": "https://example.com/art.jpg"}))
        .await
        .unwrap_err();

    assert!(matches!(err, FlowError::InputValidation { .. }));
    assert_eq!(model.calls(), 0);
}
