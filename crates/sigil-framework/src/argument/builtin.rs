//! Arguments registered by [`ArgumentStore::with_defaults`](super::ArgumentStore::with_defaults).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use sigil_core::{DispatchResult, UserError, identifiers};

use super::{Argument, ArgumentContext};

static HYPERLINK_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?i:https?)://[^\s/?#]+[^\s]*$").ok());

static SNOWFLAKE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:<@!?(\d{17,20})>|(\d{17,20}))$").ok());

fn reject(argument: &str, parameter: &str, identifier: &'static str, message: &str) -> UserError {
    UserError::argument(argument, parameter, identifier, message)
}

// ─── string ───────────────────────────────────────────────────────────────────

/// Accepts any parameter; `minimum`/`maximum` bound its length in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringArgument;

#[async_trait]
impl Argument for StringArgument {
    type Output = String;

    fn name(&self) -> &str {
        "string"
    }

    async fn run(&self, parameter: &str, ctx: &ArgumentContext<'_>) -> DispatchResult<String> {
        let length = parameter.chars().count() as f64;

        if let Some(minimum) = ctx.minimum {
            if length < minimum {
                return Err(reject(
                    "string",
                    parameter,
                    identifiers::ARGUMENT_STRING_TOO_SHORT,
                    "The argument is too short.",
                )
                .with_context(json!({ "minimum": minimum }))
                .into());
            }
        }
        if let Some(maximum) = ctx.maximum {
            if length > maximum {
                return Err(reject(
                    "string",
                    parameter,
                    identifiers::ARGUMENT_STRING_TOO_LONG,
                    "The argument is too long.",
                )
                .with_context(json!({ "maximum": maximum }))
                .into());
            }
        }

        Ok(parameter.to_string())
    }
}

// ─── integer ──────────────────────────────────────────────────────────────────

/// Parses a signed 64-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerArgument;

#[async_trait]
impl Argument for IntegerArgument {
    type Output = i64;

    fn name(&self) -> &str {
        "integer"
    }

    async fn run(&self, parameter: &str, ctx: &ArgumentContext<'_>) -> DispatchResult<i64> {
        let parsed: i64 = parameter.parse().map_err(|_| {
            reject(
                "integer",
                parameter,
                identifiers::ARGUMENT_INTEGER,
                "The argument did not resolve to an integer.",
            )
        })?;

        check_bounds(
            "integer",
            parameter,
            parsed as f64,
            ctx,
            Bounds {
                too_small: identifiers::ARGUMENT_INTEGER_TOO_SMALL,
                too_big: identifiers::ARGUMENT_INTEGER_TOO_BIG,
            },
        )?;
        Ok(parsed)
    }
}

// ─── number / float ───────────────────────────────────────────────────────────

struct Bounds {
    too_small: &'static str,
    too_big: &'static str,
}

fn check_bounds(
    argument: &str,
    parameter: &str,
    value: f64,
    ctx: &ArgumentContext<'_>,
    bounds: Bounds,
) -> Result<(), UserError> {
    if let Some(minimum) = ctx.minimum {
        let below = if ctx.inclusive {
            value < minimum
        } else {
            value <= minimum
        };
        if below {
            return Err(reject(
                argument,
                parameter,
                bounds.too_small,
                &format!("The argument must be greater than {minimum}."),
            )
            .with_context(json!({ "minimum": minimum, "inclusive": ctx.inclusive })));
        }
    }

    if let Some(maximum) = ctx.maximum {
        let above = if ctx.inclusive {
            value > maximum
        } else {
            value >= maximum
        };
        if above {
            return Err(reject(
                argument,
                parameter,
                bounds.too_big,
                &format!("The argument must be less than {maximum}."),
            )
            .with_context(json!({ "maximum": maximum, "inclusive": ctx.inclusive })));
        }
    }

    Ok(())
}

fn parse_finite(parameter: &str) -> Option<f64> {
    parameter.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses any finite number.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberArgument;

#[async_trait]
impl Argument for NumberArgument {
    type Output = f64;

    fn name(&self) -> &str {
        "number"
    }

    async fn run(&self, parameter: &str, ctx: &ArgumentContext<'_>) -> DispatchResult<f64> {
        let parsed = parse_finite(parameter).ok_or_else(|| {
            reject(
                "number",
                parameter,
                identifiers::ARGUMENT_NUMBER,
                "The argument did not resolve to a valid number.",
            )
        })?;
        check_bounds(
            "number",
            parameter,
            parsed,
            ctx,
            Bounds {
                too_small: identifiers::ARGUMENT_NUMBER_TOO_SMALL,
                too_big: identifiers::ARGUMENT_NUMBER_TOO_BIG,
            },
        )?;
        Ok(parsed)
    }
}

/// Like [`NumberArgument`], but reports `float*` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatArgument;

#[async_trait]
impl Argument for FloatArgument {
    type Output = f64;

    fn name(&self) -> &str {
        "float"
    }

    async fn run(&self, parameter: &str, ctx: &ArgumentContext<'_>) -> DispatchResult<f64> {
        let parsed = parse_finite(parameter).ok_or_else(|| {
            reject(
                "float",
                parameter,
                identifiers::ARGUMENT_FLOAT,
                "The argument did not resolve to a valid floating point number.",
            )
        })?;
        check_bounds(
            "float",
            parameter,
            parsed,
            ctx,
            Bounds {
                too_small: identifiers::ARGUMENT_FLOAT_TOO_SMALL,
                too_big: identifiers::ARGUMENT_FLOAT_TOO_BIG,
            },
        )?;
        Ok(parsed)
    }
}

// ─── boolean ──────────────────────────────────────────────────────────────────

const TRUTHY: &[&str] = &["true", "yes", "y", "on", "1", "enable"];
const FALSY: &[&str] = &["false", "no", "n", "off", "0", "disable"];

/// Accepts `true/false`, `yes/no`, `on/off`, `1/0` and friends, in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanArgument;

#[async_trait]
impl Argument for BooleanArgument {
    type Output = bool;

    fn name(&self) -> &str {
        "boolean"
    }

    async fn run(&self, parameter: &str, _ctx: &ArgumentContext<'_>) -> DispatchResult<bool> {
        let lowered = parameter.to_lowercase();
        if TRUTHY.contains(&lowered.as_str()) {
            return Ok(true);
        }
        if FALSY.contains(&lowered.as_str()) {
            return Ok(false);
        }
        Err(reject(
            "boolean",
            parameter,
            identifiers::ARGUMENT_BOOLEAN,
            "The argument did not resolve to a boolean.",
        )
        .into())
    }
}

// ─── hyperlink ────────────────────────────────────────────────────────────────

/// Accepts `http`/`https` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperlinkArgument;

#[async_trait]
impl Argument for HyperlinkArgument {
    type Output = String;

    fn name(&self) -> &str {
        "hyperlink"
    }

    fn aliases(&self) -> &[&'static str] {
        &["url"]
    }

    async fn run(&self, parameter: &str, _ctx: &ArgumentContext<'_>) -> DispatchResult<String> {
        let valid = HYPERLINK_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(parameter));
        if valid {
            Ok(parameter.to_string())
        } else {
            Err(reject(
                "hyperlink",
                parameter,
                identifiers::ARGUMENT_HYPERLINK,
                "The argument did not resolve to a valid URL.",
            )
            .into())
        }
    }
}

// ─── snowflake ────────────────────────────────────────────────────────────────

/// Extracts an ID from a user mention (`<@ID>`, `<@!ID>`) or a raw ID.
///
/// This is the lookup-free half of a user resolver; hosts fetch the entity
/// themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeArgument;

impl SnowflakeArgument {
    fn extract(parameter: &str) -> Option<u64> {
        let captures = SNOWFLAKE_PATTERN.as_ref()?.captures(parameter)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))?
            .as_str()
            .parse()
            .ok()
    }
}

#[async_trait]
impl Argument for SnowflakeArgument {
    type Output = u64;

    fn name(&self) -> &str {
        "snowflake"
    }

    fn aliases(&self) -> &[&'static str] {
        &["userId"]
    }

    async fn run(&self, parameter: &str, _ctx: &ArgumentContext<'_>) -> DispatchResult<u64> {
        Self::extract(parameter).ok_or_else(|| {
            reject(
                "snowflake",
                parameter,
                identifiers::ARGUMENT_SNOWFLAKE,
                "The argument did not resolve to an ID.",
            )
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgOptions;
    use sigil_core::{DispatchError, PlainMessage};

    async fn run<A: Argument>(argument: A, parameter: &str, options: ArgOptions) -> DispatchResult<A::Output> {
        let message = PlainMessage::new("");
        let ctx = options.context(&message, "test");
        argument.run(parameter, &ctx).await
    }

    fn identifier(err: DispatchError) -> String {
        err.identifier().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_string_length_bounds() {
        let opts = ArgOptions::new().min(2.0).max(4.0);
        assert_eq!(run(StringArgument, "héé", opts).await.unwrap(), "héé");

        let err = run(StringArgument, "a", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_STRING_TOO_SHORT);

        let err = run(StringArgument, "abcde", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_STRING_TOO_LONG);
    }

    #[tokio::test]
    async fn test_integer() {
        assert_eq!(run(IntegerArgument, "-42", ArgOptions::new()).await.unwrap(), -42);

        let err = run(IntegerArgument, "4.2", ArgOptions::new()).await.unwrap_err();
        let user = err.as_user().unwrap();
        assert!(user.is(identifiers::ARGUMENT_INTEGER));
        assert_eq!(user.parameter(), Some("4.2"));
        assert_eq!(user.argument_name(), Some("integer"));
    }

    #[tokio::test]
    async fn test_integer_bounds_are_inclusive() {
        let opts = ArgOptions::new().min(1.0).max(10.0);
        assert_eq!(run(IntegerArgument, "1", opts).await.unwrap(), 1);
        assert_eq!(run(IntegerArgument, "10", opts).await.unwrap(), 10);

        let err = run(IntegerArgument, "0", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_INTEGER_TOO_SMALL);
        let err = run(IntegerArgument, "11", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_INTEGER_TOO_BIG);
    }

    #[tokio::test]
    async fn test_exclusive_bounds() {
        let opts = ArgOptions::new().min(0.0).max(1.0).exclusive();
        assert_eq!(run(FloatArgument, "0.5", opts).await.unwrap(), 0.5);

        let err = run(FloatArgument, "0", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_FLOAT_TOO_SMALL);
        let err = run(NumberArgument, "1", opts).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_NUMBER_TOO_BIG);
    }

    #[tokio::test]
    async fn test_number_rejects_non_finite() {
        for parameter in ["abc", "NaN", "inf"] {
            let err = run(NumberArgument, parameter, ArgOptions::new()).await.unwrap_err();
            assert_eq!(identifier(err), identifiers::ARGUMENT_NUMBER);
        }
    }

    #[tokio::test]
    async fn test_boolean() {
        for (parameter, expected) in [("YES", true), ("on", true), ("0", false), ("False", false)] {
            assert_eq!(
                run(BooleanArgument, parameter, ArgOptions::new()).await.unwrap(),
                expected
            );
        }
        let err = run(BooleanArgument, "maybe", ArgOptions::new()).await.unwrap_err();
        assert_eq!(identifier(err), identifiers::ARGUMENT_BOOLEAN);
    }

    #[tokio::test]
    async fn test_hyperlink() {
        assert!(run(HyperlinkArgument, "https://example.com/a?b=c", ArgOptions::new()).await.is_ok());
        assert!(run(HyperlinkArgument, "HTTP://example.com", ArgOptions::new()).await.is_ok());
        for parameter in ["ftp://example.com", "example.com", "https://"] {
            let err = run(HyperlinkArgument, parameter, ArgOptions::new()).await.unwrap_err();
            assert_eq!(identifier(err), identifiers::ARGUMENT_HYPERLINK);
        }
    }

    #[tokio::test]
    async fn test_snowflake() {
        let id = 123456789012345678_u64;
        for parameter in [format!("{id}"), format!("<@{id}>"), format!("<@!{id}>")] {
            assert_eq!(run(SnowflakeArgument, &parameter, ArgOptions::new()).await.unwrap(), id);
        }
        for parameter in ["<@123456789012345678", "12345", "abc"] {
            let err = run(SnowflakeArgument, parameter, ArgOptions::new()).await.unwrap_err();
            assert_eq!(identifier(err), identifiers::ARGUMENT_SNOWFLAKE);
        }
    }
}
