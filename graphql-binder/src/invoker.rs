//! Per-field invocation plans.
//!
//! A [`FieldInvoker`] is compiled once per field at build time. At request time it evaluates
//! its argument providers in order, picks the receiver and calls the resolved method.

use std::sync::Arc;

use serde_json::Value;

use crate::error::BuildError;
use crate::error::FieldError;
use crate::method::ArgumentValue;
use crate::method::Arguments;
use crate::method::InputConversion;
use crate::method::MethodDescriptor;
use crate::method::ParamType;
use crate::request::FieldValue;
use crate::request::RequestContext;
use crate::resolver::MethodSource;
use crate::resolver::ResolvedField;
use crate::runtime::Object;
use crate::runtime::RuntimeType;

/// A schema argument as the invoker needs to know it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub name: String,
    pub nullable: bool,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            nullable,
        }
    }
}

/// How a supplied argument value is turned into a call argument.
#[derive(Debug, Clone)]
pub(crate) enum Coercion {
    PassThrough,
    Convert(InputConversion),
    List(Box<Coercion>),
}

impl Coercion {
    fn for_param(param: &ParamType) -> Self {
        match param {
            ParamType::Input(conversion) => Coercion::Convert(conversion.clone()),
            ParamType::List(item) => match Coercion::for_param(item) {
                Coercion::PassThrough => Coercion::PassThrough,
                item => Coercion::List(Box::new(item)),
            },
            _ => Coercion::PassThrough,
        }
    }

    fn apply(&self, value: Value) -> Result<ArgumentValue, serde_json::Error> {
        match (self, value) {
            (Coercion::Convert(conversion), value @ Value::Object(_)) => {
                Ok(ArgumentValue::Input(Arc::from(conversion.convert(value)?)))
            }
            (Coercion::List(item), Value::Array(values)) => values
                .into_iter()
                .map(|value| item.apply(value))
                .collect::<Result<Vec<_>, _>>()
                .map(ArgumentValue::List),
            (_, Value::Null) => Ok(ArgumentValue::Null),
            (_, value) => Ok(ArgumentValue::Value(value)),
        }
    }
}

/// Produces one call argument from a request context.
#[derive(Debug, Clone)]
pub(crate) enum ArgumentProvider {
    /// The source object, checked against the data type a handler group augments.
    Source { data_type: RuntimeType },
    /// A schema argument, looked up by name.
    Argument {
        name: String,
        required: bool,
        coercion: Coercion,
    },
    /// The request context itself.
    RequestContext,
}

impl ArgumentProvider {
    fn provide(&self, field: &str, context: &RequestContext) -> Result<ArgumentValue, FieldError> {
        match self {
            ArgumentProvider::Source { data_type } => {
                let source = check_source(field, context.source(), *data_type)?;
                Ok(ArgumentValue::Source(source.clone()))
            }
            ArgumentProvider::Argument {
                name,
                required,
                coercion,
            } => match context.argument(name) {
                None | Some(Value::Null) if *required => Err(FieldError::MissingRequiredArgument {
                    field: field.to_string(),
                    argument: name.clone(),
                }),
                None => Ok(ArgumentValue::Null),
                Some(value) => {
                    coercion
                        .apply(value.clone())
                        .map_err(|err| FieldError::ArgumentConversion {
                            field: field.to_string(),
                            argument: name.clone(),
                            reason: err.to_string(),
                        })
                }
            },
            ArgumentProvider::RequestContext => Ok(ArgumentValue::Context(context.clone())),
        }
    }
}

/// Which object a resolved method is called on.
#[derive(Debug, Clone)]
pub(crate) enum Receiver {
    HandlerGroup(Object),
    Source { declaring_type: RuntimeType },
}

/// The compiled call plan of one schema field.
#[derive(Debug, Clone)]
pub struct FieldInvoker {
    field: String,
    method: MethodDescriptor,
    source: MethodSource,
    providers: Vec<ArgumentProvider>,
    receiver: Receiver,
}

impl FieldInvoker {
    pub(crate) fn build(
        type_name: &str,
        field: &str,
        resolved: &ResolvedField,
        arguments: &[ArgumentSpec],
    ) -> Result<Self, BuildError> {
        let method = resolved.method();
        let params = method.params();
        let mismatch = || BuildError::ArgumentCountMismatch {
            type_name: type_name.to_string(),
            field: field.to_string(),
            method: format!(
                "{}::{}",
                resolved.declaring_type().short_name(),
                method.name()
            ),
            parameters: params.len(),
            arguments: arguments.len(),
        };

        let mut providers = Vec::with_capacity(params.len());
        if resolved.receives_source() {
            let data_type = resolved.data_type().ok_or_else(mismatch)?;
            providers.push(ArgumentProvider::Source { data_type });
        }
        for (index, argument) in arguments.iter().enumerate() {
            let param = params
                .get(resolved.argument_index(index))
                .ok_or_else(mismatch)?;
            providers.push(ArgumentProvider::Argument {
                name: argument.name.clone(),
                required: !argument.nullable,
                coercion: Coercion::for_param(param),
            });
        }
        match params.get(providers.len()..).ok_or_else(mismatch)? {
            [] => {}
            [param] if param.is_request_context() => {
                providers.push(ArgumentProvider::RequestContext)
            }
            _ => return Err(mismatch()),
        }

        let receiver = match resolved.source() {
            MethodSource::HandlerGroup => {
                Receiver::HandlerGroup(resolved.handler_instance().cloned().ok_or_else(mismatch)?)
            }
            MethodSource::DataType => Receiver::Source {
                declaring_type: resolved.declaring_type(),
            },
        };

        Ok(Self {
            field: field.to_string(),
            method: method.clone(),
            source: resolved.source(),
            providers,
            receiver,
        })
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn source(&self) -> MethodSource {
        self.source
    }

    /// Number of call arguments; always the method's parameter count.
    pub fn arity(&self) -> usize {
        self.providers.len()
    }

    /// Computes the field value for one request.
    pub fn invoke(&self, context: &RequestContext) -> Result<FieldValue, FieldError> {
        let values = self
            .providers
            .iter()
            .map(|provider| provider.provide(&self.field, context))
            .collect::<Result<Vec<_>, _>>()?;
        let receiver = match &self.receiver {
            Receiver::HandlerGroup(instance) => instance,
            Receiver::Source { declaring_type } => {
                check_source(&self.field, context.source(), *declaring_type)?
            }
        };
        self.method.call(receiver, &Arguments::new(values))
    }
}

fn check_source<'a>(
    field: &str,
    source: Option<&'a Object>,
    expected: RuntimeType,
) -> Result<&'a Object, FieldError> {
    match source {
        Some(source) if source.runtime_type() == expected => Ok(source),
        _ => Err(FieldError::SourceTypeMismatch {
            field: field.to_string(),
            expected: expected.name().to_string(),
            found: source
                .map_or("no source object", |source| source.runtime_type().name())
                .to_string(),
        }),
    }
}
