/// User Creation Tool
///
/// Typed tool: arguments are decoded into `UserInput` and the `UserResponse`
/// is returned both as JSON text and as structured content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::ToolResult;
use crate::core::registry::ToolRegistry;
use crate::core::schema::{ParameterSpec, ToolDescriptor};
use crate::core::tool::ToolDefinition;

pub const NAME: &str = "user_tool";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(NAME, "Create new user.")
        .with_parameter(
            ParameterSpec::string("firstName", "First name of the user")
                .alias("first_name")
                .required(),
        )
        .with_parameter(
            ParameterSpec::string("lastName", "Last name of the user")
                .alias("last_name")
                .required(),
        )
        .with_parameter(ParameterSpec::integer("age", "Age of the user in years"))
}

/// Build a user id of the form `<first initial>_<last name>_<uuid>`.
pub fn create_user(input: UserInput) -> Result<UserResponse, String> {
    let initial = input
        .first_name
        .chars()
        .next()
        .ok_or_else(|| "firstName must not be empty".to_string())?;

    Ok(UserResponse {
        id: format!("{}_{}_{}", initial, input.last_name, Uuid::new_v4()),
        created_at: Utc::now(),
    })
}

pub fn register(registry: &mut ToolRegistry) -> ToolResult<()> {
    registry.register(ToolDefinition::typed(descriptor(), create_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::middleware::MiddlewareChain;
    use crate::core::{CallRequest, CallResult, Dispatcher};
    use serde_json::{Value, json};

    fn dispatcher() -> Dispatcher {
        let mut registry = ToolRegistry::new();
        register(&mut registry).unwrap();
        Dispatcher::new(registry, &MiddlewareChain::new())
    }

    fn create(dispatcher: &Dispatcher, args: Value) -> CallResult {
        let Value::Object(arguments) = args else {
            panic!("expected object");
        };
        dispatcher.dispatch(&CallRequest::new(NAME, arguments)).unwrap()
    }

    fn decode(result: &CallResult) -> UserResponse {
        assert!(!result.is_error, "unexpected error: {:?}", result);
        serde_json::from_value(result.structured_content.clone().unwrap()).unwrap()
    }

    #[test]
    fn id_has_initial_last_name_and_uuid() {
        let dispatcher = dispatcher();
        let user = decode(&create(&dispatcher, json!({"firstName": "Jane", "lastName": "Doe"})));

        let suffix = user.id.strip_prefix("J_Doe_").expect("id prefix");
        assert!(Uuid::parse_str(suffix).is_ok(), "not a uuid: {}", suffix);
    }

    #[test]
    fn ids_are_unique_and_timestamps_non_decreasing() {
        let dispatcher = dispatcher();
        let args = json!({"firstName": "Jane", "lastName": "Doe", "age": 30});
        let first = decode(&create(&dispatcher, args.clone()));
        let second = decode(&create(&dispatcher, args));

        assert_ne!(first.id, second.id);
        assert!(second.created_at >= first.created_at);
    }

    #[test]
    fn text_content_mirrors_structured_output() {
        let dispatcher = dispatcher();
        let result = create(&dispatcher, json!({"firstName": "Ada", "lastName": "Lovelace"}));
        let text: Value = serde_json::from_str(result.first_text().unwrap()).unwrap();
        assert_eq!(Some(text), result.structured_content);
    }

    #[test]
    fn empty_first_name_is_an_error_result() {
        let dispatcher = dispatcher();
        let result = create(&dispatcher, json!({"firstName": "", "lastName": "Doe"}));
        assert_eq!(result, CallResult::error("Error: firstName must not be empty"));
    }

    #[test]
    fn negative_age_fails_input_decoding() {
        let dispatcher = dispatcher();
        let result = create(&dispatcher, json!({"firstName": "Jane", "lastName": "Doe", "age": -4}));
        assert!(result.is_error);
        assert!(result.first_text().unwrap().starts_with("Error: Invalid input:"));
    }

    #[test]
    fn snake_case_field_names_are_accepted() {
        let dispatcher = dispatcher();
        let result = create(&dispatcher, json!({"first_name": "Jane", "last_name": "Doe"}));
        let user = decode(&result);
        assert!(user.id.starts_with("J_Doe_"));

        let output = result.structured_content.unwrap();
        assert!(output.get("createdAt").is_some());
        assert!(output.get("created_at").is_none());

        let input: UserInput =
            serde_json::from_value(json!({"first_name": "Jane", "last_name": "Doe"})).unwrap();
        assert_eq!(input.first_name, "Jane");
    }

    #[test]
    fn multibyte_initial() {
        let user = create_user(UserInput {
            first_name: "Élodie".into(),
            last_name: "Durand".into(),
            age: None,
        })
        .unwrap();
        assert!(user.id.starts_with("É_Durand_"));
    }
}
