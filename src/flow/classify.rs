//! Classifies an image of a magical symbol and returns the predicted symbol
//! and confidence level.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::ModelClient;
use crate::flow::{Flow, FlowError, from_validated};
use crate::schema::{FieldSpec, FieldType, ShapeDescriptor};
use crate::template::PromptTemplate;

const PROMPT: &str = "\
You are an expert in identifying magical symbols. Analyze the provided image and identify the symbol. Return the symbol name and your confidence level.

Image: {{media url=imageDataUri}}

Respond with JSON format.
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifySymbolInput {
    /// The symbol image as a `data:<mime>;base64,<data>` URI.
    pub image_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifySymbolOutput {
    /// The predicted magical symbol.
    pub symbol: String,
    /// Confidence level of the prediction, in `[0, 1]`.
    pub confidence: f64,
}

pub fn flow() -> Flow {
    let input = ShapeDescriptor::new("classify_symbol_input").field(
        FieldSpec::new("imageDataUri", FieldType::DataUri).describe(
            "An image of a magical symbol, as a data URI with a MIME type and base64 encoding.",
        ),
    );
    let output = ShapeDescriptor::new("classify_symbol_output")
        .field(FieldSpec::new("symbol", FieldType::String).describe("The predicted magical symbol."))
        .field(
            FieldSpec::new("confidence", FieldType::UnitInterval)
                .describe("The confidence level of the prediction (0-1)."),
        );

    Flow::json(
        "classify_symbol",
        Some(input),
        output,
        PromptTemplate::new(PROMPT),
    )
}

pub async fn classify_symbol(
    client: &dyn ModelClient,
    input: &ClassifySymbolInput,
) -> Result<ClassifySymbolOutput, FlowError> {
    let raw = json!({"imageDataUri": input.image_data_uri});
    let value = flow().invoke(client, raw).await?;
    from_validated(value)
}
