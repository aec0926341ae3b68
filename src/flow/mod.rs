//! Flow invocation: the one orchestration unit every feature goes through.
//!
//! A [`Flow`] bundles an input shape, an output shape, a prompt template and
//! a response format. [`Flow::invoke`] validates the caller's input, renders
//! the prompt, calls the model collaborator exactly once and validates what
//! came back. Any failure is surfaced to the caller unmodified; there is no
//! retry and no silent default.

pub mod classify;
pub mod detect;
pub mod illusion;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{ModelClient, ModelError, RawResult, ResponseFormat};
use crate::schema::{FieldType, ShapeDescriptor, Violation, join_violations};
use crate::template::{PromptTemplate, TemplateError};

#[derive(Debug, Error)]
pub enum FlowError {
    /// The caller-supplied input does not match the declared input shape.
    /// The model is never called when this fires.
    #[error("input validation failed: {}", join_violations(.violations))]
    InputValidation { violations: Vec<Violation> },
    /// The template and the validated payload disagree: a programming
    /// defect in the flow definition, not a caller fault.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// The collaborator answered but produced nothing usable.
    #[error("model returned no usable payload")]
    EmptyResult,
    /// The collaborator's payload does not conform to the output shape.
    #[error("output validation failed: {}", join_violations(.violations))]
    OutputValidation { violations: Vec<Violation> },
    /// The collaborator itself failed; surfaced unmodified.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// One named input-to-output orchestration unit wrapping a single model call.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    input: Option<ShapeDescriptor>,
    output: ShapeDescriptor,
    template: PromptTemplate,
    format: ResponseFormat,
}

impl Flow {
    /// A flow whose reply is structured JSON matching the output shape. The
    /// response-format hint handed to the model is generated straight from
    /// that shape.
    pub fn json(
        name: impl Into<String>,
        input: Option<ShapeDescriptor>,
        output: ShapeDescriptor,
        template: PromptTemplate,
    ) -> Self {
        let format = ResponseFormat::Json(output.to_json_schema());
        Self {
            name: name.into(),
            input,
            output,
            template,
            format,
        }
    }

    /// A flow whose reply is generated media. The model is asked for both a
    /// text and an image part; only the image part becomes the result.
    pub fn media(name: impl Into<String>, output: ShapeDescriptor, template: PromptTemplate) -> Self {
        Self {
            name: name.into(),
            input: None,
            output,
            template,
            format: ResponseFormat::TextAndImage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_shape(&self) -> Option<&ShapeDescriptor> {
        self.input.as_ref()
    }

    pub fn output_shape(&self) -> &ShapeDescriptor {
        &self.output
    }

    /// Run the flow once: validate input, render, call the model a single
    /// time, validate output. One suspension point, no retry, no recovery.
    #[tracing::instrument(
        name = "flow_invoke",
        skip_all,
        fields(flow = %self.name, invocation = %Uuid::new_v4())
    )]
    pub async fn invoke(
        &self,
        client: &dyn ModelClient,
        input: Value,
    ) -> Result<Value, FlowError> {
        if let Some(shape) = &self.input {
            shape
                .validate(&input)
                .map_err(|violations| FlowError::InputValidation { violations })?;
        }

        let prompt = self.template.render(&input)?;
        debug!(provider = client.provider(), "prompt rendered, calling model");

        let raw = client.call(&prompt, &self.format).await?;

        let value = match raw {
            None => return Err(FlowError::EmptyResult),
            Some(RawResult::Structured(value)) => {
                if self.format == ResponseFormat::TextAndImage {
                    return Err(FlowError::OutputValidation {
                        violations: vec![Violation {
                            field: "$".to_string(),
                            reason: "expected generated media, got structured JSON".to_string(),
                        }],
                    });
                }
                value
            }
            Some(RawResult::Media { uri }) => self.wrap_media(uri)?,
        };

        self.output
            .validate(&value)
            .map_err(|violations| FlowError::OutputValidation { violations })?;

        info!("flow completed");
        Ok(value)
    }

    /// Place a media handle under the output shape's media field so it
    /// validates like any structured result.
    fn wrap_media(&self, uri: String) -> Result<Value, FlowError> {
        if !matches!(self.format, ResponseFormat::TextAndImage) {
            return Err(FlowError::OutputValidation {
                violations: vec![Violation {
                    field: "$".to_string(),
                    reason: "expected structured JSON, got media".to_string(),
                }],
            });
        }
        let field = self
            .output
            .fields
            .iter()
            .find(|f| f.ty == FieldType::DataUri)
            .or_else(|| self.output.fields.first())
            .ok_or(FlowError::EmptyResult)?;

        let mut object = Map::new();
        object.insert(field.name.clone(), Value::String(uri));
        Ok(Value::Object(object))
    }
}

/// Deserialize an already-validated output value into its typed form.
pub(crate) fn from_validated<T: DeserializeOwned>(value: Value) -> Result<T, FlowError> {
    serde_json::from_value(value).map_err(|e| FlowError::OutputValidation {
        violations: vec![Violation {
            field: "$".to_string(),
            reason: e.to_string(),
        }],
    })
}
