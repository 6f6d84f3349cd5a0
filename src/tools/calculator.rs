/// Calculator Tool
///
/// Integer arithmetic on `num1` and `num2`. Division truncates toward zero.

use tracing::debug;

use crate::core::error::ToolResult;
use crate::core::registry::ToolRegistry;
use crate::core::schema::{ParameterSpec, ToolDescriptor};
use crate::core::tool::{CallResult, ToolCall, ToolDefinition};

pub const NAME: &str = "calculator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Accepts both the word and the symbol for each operation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" | "+" => Some(Self::Add),
            "subtract" | "-" => Some(Self::Subtract),
            "multiply" | "*" => Some(Self::Multiply),
            "divide" | "/" => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcError {
    DivisionByZero,
    Overflow,
}

impl CalcError {
    fn message(&self) -> &'static str {
        match self {
            Self::DivisionByZero => "Error: Division by zero",
            Self::Overflow => "Error: Integer overflow",
        }
    }
}

pub fn evaluate(num1: i64, num2: i64, op: Operation) -> Result<i64, CalcError> {
    match op {
        Operation::Add => num1.checked_add(num2).ok_or(CalcError::Overflow),
        Operation::Subtract => num1.checked_sub(num2).ok_or(CalcError::Overflow),
        Operation::Multiply => num1.checked_mul(num2).ok_or(CalcError::Overflow),
        Operation::Divide if num2 == 0 => Err(CalcError::DivisionByZero),
        Operation::Divide => num1.checked_div(num2).ok_or(CalcError::Overflow),
    }
}

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(NAME, "Perform basic arithmetic operations")
        .with_parameter(ParameterSpec::integer("num1", "First number").required())
        .with_parameter(ParameterSpec::integer("num2", "Second number").required())
        .with_parameter(
            ParameterSpec::string(
                "operation",
                "Arithmetic operation to perform: add (+), subtract (-), multiply (*) or divide (/)",
            )
            .required(),
        )
}

pub fn handle(call: &ToolCall<'_>) -> ToolResult<CallResult> {
    let args = &call.arguments;
    let (Some(num1), Some(num2), Some(operation)) =
        (args.integer("num1"), args.integer("num2"), args.str("operation"))
    else {
        return Ok(CallResult::error("Error: Invalid input"));
    };

    let Some(op) = Operation::parse(operation) else {
        return Ok(CallResult::error("Error: Unknown operation"));
    };

    debug!(num1, num2, op = %op.symbol(), "Evaluating");

    Ok(match evaluate(num1, num2, op) {
        Ok(value) => CallResult::text(format!("Result: {}", value)),
        Err(e) => CallResult::error(e.message()),
    })
}

pub fn register(registry: &mut ToolRegistry) -> ToolResult<()> {
    registry.register(ToolDefinition::new(descriptor(), handle))
}
