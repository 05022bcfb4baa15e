//! Typed tool registry.
//!
//! Each tool declares its parameter and output types; the registry derives
//! JSON schemas from them and validates call arguments before the tool runs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use rag_core::{RagError, Result};

/// JSON object, as used for schemas and call arguments.
pub type JsonObject = Map<String, Value>;

/// A tool callable by name with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Call arguments.
    type Params: DeserializeOwned + JsonSchema + Send;

    /// Call result.
    type Output: Serialize + JsonSchema + Send;

    /// Stable name clients call the tool by.
    fn name(&self) -> &'static str;

    /// Usage notes shown to clients.
    fn description(&self) -> &'static str;

    /// Run the tool with validated arguments.
    async fn call(&self, params: Self::Params) -> Result<Self::Output>;
}

/// Name, description and schemas of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: JsonObject,
    pub output_schema: JsonObject,
}

#[async_trait]
trait DynTool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn call_json(&self, args: Value) -> Result<Value>;
}

struct TypedTool<T: Tool> {
    tool: T,
    descriptor: ToolDescriptor,
}

#[async_trait]
impl<T: Tool> DynTool for TypedTool<T> {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn call_json(&self, args: Value) -> Result<Value> {
        let params: T::Params = serde_json::from_value(args).map_err(|e| {
            RagError::invalid_argument(format!("{}: {}", self.descriptor.name, e))
        })?;

        let output = self.tool.call(params).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Tools indexed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Box<dyn DynTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; a second tool with the same name is rejected.
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<()> {
        let name = tool.name();
        if self.contains(name) {
            return Err(RagError::invalid_argument(format!(
                "Tool already registered: {}",
                name
            )));
        }

        let descriptor = ToolDescriptor {
            name,
            description: tool.description(),
            input_schema: schema_object::<T::Params>()?,
            output_schema: result_schema(schema_object::<T::Output>()?),
        };

        debug!("Registered tool {}", name);
        self.tools
            .insert(name, Box::new(TypedTool { tool, descriptor }));
        Ok(())
    }

    /// Descriptors of every tool, ordered by name.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name.
    ///
    /// Absent arguments are treated as an empty object. Arguments that do
    /// not deserialize into the tool's parameters fail with
    /// [`RagError::InvalidArgument`] before the tool runs.
    pub async fn call(&self, name: &str, args: Option<JsonObject>) -> Result<Value> {
        let tool = self.tools.get(name).ok_or_else(|| RagError::ToolNotFound {
            name: name.to_string(),
        })?;

        tool.call_json(Value::Object(args.unwrap_or_default())).await
    }
}

/// Root schema of `T` as a JSON object, without the `$schema` marker.
fn schema_object<T: JsonSchema>() -> Result<JsonObject> {
    match serde_json::to_value(schemars::schema_for!(T))? {
        Value::Object(mut map) => {
            map.remove("$schema");
            Ok(map)
        }
        other => Err(RagError::internal(format!(
            "Schema is not an object: {}",
            other
        ))),
    }
}

/// Schema of `{"result": <output>}`.
fn result_schema(mut output: JsonObject) -> JsonObject {
    let defs = output.remove("$defs");

    let mut schema = json!({
        "type": "object",
        "properties": { "result": output },
        "required": ["result"],
    });
    if let (Some(defs), Some(map)) = (defs, schema.as_object_mut()) {
        map.insert("$defs".to_string(), defs);
    }

    match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

/// Text items for a tool result: one per element of a list, otherwise one.
///
/// Strings are used as-is; other values are rendered as JSON.
pub fn result_texts(value: &Value) -> Vec<String> {
    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    match value {
        Value::Array(items) => items.iter().map(text).collect(),
        other => vec![text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo.
        text: String,

        #[serde(default = "default_times")]
        times: u32,
    }

    fn default_times() -> u32 {
        1
    }

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        type Params = EchoParams;
        type Output = Vec<String>;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Repeat text."
        }

        async fn call(&self, params: EchoParams) -> Result<Vec<String>> {
            Ok(vec![params.text; params.times as usize])
        }
    }

    struct Fails;

    #[async_trait]
    impl Tool for Fails {
        type Params = EchoParams;
        type Output = String;

        fn name(&self) -> &'static str {
            "fails"
        }

        fn description(&self) -> &'static str {
            "Always fails."
        }

        async fn call(&self, _params: EchoParams) -> Result<String> {
            Err(RagError::upstream("down"))
        }
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Echo).unwrap();
        registry.register(Fails).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_call_with_defaults() {
        let registry = registry();

        let value = registry.call("echo", args(json!({"text": "hi"}))).await.unwrap();
        assert_eq!(value, json!(["hi"]));

        let value = registry
            .call("echo", args(json!({"text": "hi", "times": 2})))
            .await
            .unwrap();
        assert_eq!(value, json!(["hi", "hi"]));
    }

    #[tokio::test]
    async fn test_wrong_type_is_invalid_argument() {
        let err = registry()
            .call("echo", args(json!({"text": 42})))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_negative_count_is_invalid_argument() {
        let err = registry()
            .call("echo", args(json!({"text": "hi", "times": -1})))
            .await
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let err = registry().call("echo", None).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert!(err.to_string().contains("text"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = registry().call("nope", None).await.unwrap_err();
        assert!(matches!(err, RagError::ToolNotFound { name } if name == "nope"));
    }

    #[tokio::test]
    async fn test_tool_errors_pass_through() {
        let err = registry()
            .call("fails", args(json!({"text": "x"})))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "UPSTREAM_SEARCH_FAILURE");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let err = registry.register(Echo).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("echo"));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_descriptors() {
        let registry = registry();
        let descriptors = registry.descriptors();
        let names: Vec<&str> = descriptors.iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "fails"]);

        let echo = descriptors[0];
        assert_eq!(echo.input_schema["type"], "object");
        assert_eq!(echo.input_schema["properties"]["text"]["type"], "string");
        assert_eq!(echo.input_schema["required"], json!(["text"]));
        assert!(!echo.input_schema.contains_key("$schema"));

        assert_eq!(echo.output_schema["type"], "object");
        assert_eq!(echo.output_schema["required"], json!(["result"]));
        assert_eq!(echo.output_schema["properties"]["result"]["type"], "array");
    }

    #[test]
    fn test_result_texts() {
        assert_eq!(result_texts(&json!("one")), vec!["one"]);
        assert_eq!(result_texts(&json!(["a", "b"])), vec!["a", "b"]);
        assert!(result_texts(&json!([])).is_empty());
        assert_eq!(result_texts(&json!({"k": 1})), vec![r#"{"k":1}"#]);
    }
}
