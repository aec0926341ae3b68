//! Detects hidden symbols in an artwork and explains what they might mean.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::ModelClient;
use crate::flow::{Flow, FlowError, from_validated};
use crate::schema::{FieldSpec, FieldType, ShapeDescriptor};
use crate::template::PromptTemplate;

const PROMPT: &str = "\
You are an art historian specializing in detecting hidden symbols in artwork.

You will analyze the artwork and identify any hidden symbols present. Provide a list of the detected symbols and an analysis of their potential meanings within the context of the artwork.

Use the following as the primary source of information about the artwork.

Artwork: {{media url=artworkDataUri}}
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectHiddenSymbolsInput {
    /// A photo of the artwork as a `data:<mime>;base64,<data>` URI.
    pub artwork_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectHiddenSymbolsOutput {
    /// Symbols found in the artwork. May legitimately be empty.
    pub symbols_detected: Vec<String>,
    /// Analysis of the artwork and the detected symbols.
    pub analysis: String,
}

pub fn flow() -> Flow {
    let input = ShapeDescriptor::new("detect_hidden_symbols_input").field(
        FieldSpec::new("artworkDataUri", FieldType::DataUri)
            .describe("A photo of an artwork, as a data URI with a MIME type and base64 encoding."),
    );
    let output = ShapeDescriptor::new("detect_hidden_symbols_output")
        .field(
            FieldSpec::new("symbolsDetected", FieldType::StringList)
                .describe("List of detected symbols in the artwork."),
        )
        .field(
            FieldSpec::new("analysis", FieldType::String)
                .describe("An analysis of the artwork and the detected symbols."),
        );

    Flow::json(
        "detect_hidden_symbols",
        Some(input),
        output,
        PromptTemplate::new(PROMPT),
    )
}

pub async fn detect_hidden_symbols(
    client: &dyn ModelClient,
    input: &DetectHiddenSymbolsInput,
) -> Result<DetectHiddenSymbolsOutput, FlowError> {
    let raw = json!({"artworkDataUri": input.artwork_data_uri});
    let value = flow().invoke(client, raw).await?;
    from_validated(value)
}
