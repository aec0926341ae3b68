//! Generates an abstract optical illusion image.
//!
//! The only flow with no caller input: the prompt is fixed and the model is
//! asked for both text and image modalities, because image-capable models
//! refuse an image-only response.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::ModelClient;
use crate::flow::{Flow, FlowError, from_validated};
use crate::schema::{FieldSpec, FieldType, ShapeDescriptor};
use crate::template::PromptTemplate;

const PROMPT: &str = "Generate an abstract optical illusion.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateIllusionOutput {
    /// The generated optical illusion as a data URI.
    pub media: String,
}

pub fn flow() -> Flow {
    let output = ShapeDescriptor::new("generate_illusion_output").field(
        FieldSpec::new("media", FieldType::DataUri)
            .describe("The generated optical illusion as a data URI."),
    );

    Flow::media("generate_illusion", output, PromptTemplate::new(PROMPT))
}

pub async fn generate_illusion(
    client: &dyn ModelClient,
) -> Result<GenerateIllusionOutput, FlowError> {
    let value = flow().invoke(client, json!({})).await?;
    from_validated(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_has_no_input_shape() {
        let flow = flow();
        assert!(flow.input_shape().is_none());
        assert_eq!(flow.output_shape().fields[0].name, "media");
    }

    #[test]
    fn output_requires_a_data_uri() {
        let ok = flow()
            .output_shape()
            .validate(&json!({"media": "data:image/png;base64,QUJD"}));
        assert!(ok.is_ok());

        let bad = flow()
            .output_shape()
            .validate(&json!({"media": "https://example.com/i.png"}));
        assert!(bad.is_err());
    }
}
