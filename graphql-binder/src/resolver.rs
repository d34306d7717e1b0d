//! Matches schema fields to handler methods.
//!
//! For one target type the candidates are, first match wins:
//!
//! 1. a method named like the field,
//! 2. `is<Field>`, only when it returns a boolean,
//! 3. `get<Field>`,
//!
//! each taking either the expected number of parameters, or one more when that extra trailing
//! parameter is the request context.

use std::sync::Arc;

use tracing::debug;

use crate::binding::BindingContext;
use crate::binding::HandlerGroup;
use crate::display_helpers::DisplayAlternatives;
use crate::display_helpers::DisplaySlice;
use crate::error::BuildError;
use crate::method::MethodDescriptor;
use crate::method::MethodTable;
use crate::runtime::Object;
use crate::runtime::RuntimeType;

/// Where a resolved method is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSource {
    HandlerGroup,
    DataType,
}

/// A method matching a field, before any argument marshalling is planned.
#[derive(Debug, Clone)]
pub(crate) struct CandidateMethod {
    pub(crate) method: MethodDescriptor,
    pub(crate) declaring_type: RuntimeType,
    pub(crate) source: MethodSource,
}

/// The method chosen for one schema field, with the binding it was found in.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    binding: BindingContext,
    method: MethodDescriptor,
    declaring_type: RuntimeType,
    source: MethodSource,
}

impl ResolvedField {
    pub(crate) fn new(binding: BindingContext, candidate: CandidateMethod) -> Self {
        Self {
            binding,
            method: candidate.method,
            declaring_type: candidate.declaring_type,
            source: candidate.source,
        }
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn declaring_type(&self) -> RuntimeType {
        self.declaring_type
    }

    pub fn source(&self) -> MethodSource {
        self.source
    }

    /// True when the source object is passed as the first method argument.
    pub fn receives_source(&self) -> bool {
        self.source == MethodSource::HandlerGroup
            && matches!(self.binding, BindingContext::Data { .. })
    }

    /// The data type a handler group method expects in its first parameter.
    pub(crate) fn data_type(&self) -> Option<RuntimeType> {
        self.binding.data_type()
    }

    /// The handler group instance methods from a handler group are invoked on.
    pub(crate) fn handler_instance(&self) -> Option<&Object> {
        match (&self.binding, self.source) {
            (
                BindingContext::Root { group } | BindingContext::Data { group, .. },
                MethodSource::HandlerGroup,
            ) => Some(group.instance()),
            _ => None,
        }
    }

    /// Maps an index into the declared schema arguments to a method parameter position.
    pub fn argument_index(&self, index: usize) -> usize {
        if self.receives_source() {
            index + 1
        } else {
            index
        }
    }
}

pub(crate) struct MethodResolver<'a> {
    type_name: &'a str,
    field: &'a str,
}

impl<'a> MethodResolver<'a> {
    pub(crate) fn new(type_name: &'a str, field: &'a str) -> Self {
        Self { type_name, field }
    }

    /// Finds the method for a field with `argument_count` declared schema arguments.
    pub(crate) fn resolve(
        &self,
        binding: &BindingContext,
        argument_count: usize,
    ) -> Result<CandidateMethod, BuildError> {
        match binding {
            BindingContext::Root { group } => self
                .search(group.methods(), argument_count)
                .map(|method| from_group(group, method))
                .ok_or_else(|| {
                    self.no_such_method(&[argument_count], &[group.methods()])
                }),
            BindingContext::Data {
                group,
                data_methods,
                ..
            } => {
                // the data object is always passed first to the handler group
                if let Some(method) = self.search(group.methods(), argument_count + 1) {
                    return Ok(from_group(group, method));
                }
                let found = data_methods
                    .as_deref()
                    .and_then(|table| Some((table, self.search(table, argument_count)?)));
                match found {
                    Some((table, method)) => Ok(from_data_type(table, method)),
                    None => {
                        let mut searched = vec![group.methods()];
                        searched.extend(data_methods.as_deref());
                        Err(self.no_such_method(
                            &[argument_count + 1, argument_count],
                            &searched,
                        ))
                    }
                }
            }
            BindingContext::Direct { data_methods } => self
                .search(data_methods, argument_count)
                .map(|method| from_data_type(data_methods, method))
                .ok_or_else(|| {
                    self.no_such_method(&[argument_count], &[data_methods.as_ref()])
                }),
        }
    }

    /// Resolves a root field against several root handler groups, first match wins.
    pub(crate) fn resolve_root(
        &self,
        groups: &[Arc<HandlerGroup>],
        argument_count: usize,
    ) -> Result<(BindingContext, CandidateMethod), BuildError> {
        for group in groups {
            if let Some(method) = self.search(group.methods(), argument_count) {
                let binding = BindingContext::Root {
                    group: group.clone(),
                };
                return Ok((binding, from_group(group, method)));
            }
        }
        let searched: Vec<&MethodTable> = groups.iter().map(|group| group.methods()).collect();
        Err(self.no_such_method(&[argument_count], &searched))
    }

    fn candidate_names(&self) -> [String; 3] {
        let capitalized = capitalize(self.field);
        [
            self.field.to_string(),
            format!("is{capitalized}"),
            format!("get{capitalized}"),
        ]
    }

    fn search<'t>(
        &self,
        table: &'t MethodTable,
        argument_count: usize,
    ) -> Option<&'t MethodDescriptor> {
        let [exact, is, get] = self.candidate_names();
        let exact = table
            .methods_named(&exact)
            .find(|method| self.is_compatible(table, method, argument_count));
        if exact.is_some() {
            return exact;
        }
        let is = table.methods_named(&is).find(|method| {
            method.returns().is_boolean() && self.is_compatible(table, method, argument_count)
        });
        if is.is_some() {
            return is;
        }
        table
            .methods_named(&get)
            .find(|method| self.is_compatible(table, method, argument_count))
    }

    fn is_compatible(
        &self,
        table: &MethodTable,
        method: &MethodDescriptor,
        argument_count: usize,
    ) -> bool {
        let params = method.params();
        if params.len() == argument_count {
            return true;
        }
        if params.len() == argument_count + 1 {
            if params
                .last()
                .is_some_and(|param| param.is_request_context())
            {
                return true;
            }
            debug!(
                type_name = self.type_name,
                field = self.field,
                method = method.name(),
                declaring_type = table.runtime_type().name(),
                "rejecting candidate: its last parameter is not the request context"
            );
        }
        false
    }

    fn no_such_method(&self, counts: &[usize], searched: &[&MethodTable]) -> BuildError {
        let counts: Vec<String> = counts
            .iter()
            .map(|count| format!("{count} (+1 context)"))
            .collect();
        let searched: Vec<&str> = searched
            .iter()
            .map(|table| table.runtime_type().name())
            .collect();
        BuildError::NoSuchMethod {
            type_name: self.type_name.to_string(),
            field: self.field.to_string(),
            candidates: DisplayAlternatives(&self.candidate_names()).to_string(),
            expected: DisplayAlternatives(&counts).to_string(),
            searched: DisplaySlice(&searched).to_string(),
        }
    }
}

fn from_group(group: &HandlerGroup, method: &MethodDescriptor) -> CandidateMethod {
    CandidateMethod {
        method: method.clone(),
        declaring_type: group.runtime_type(),
        source: MethodSource::HandlerGroup,
    }
}

fn from_data_type(table: &MethodTable, method: &MethodDescriptor) -> CandidateMethod {
    CandidateMethod {
        method: method.clone(),
        declaring_type: table.runtime_type(),
        source: MethodSource::DataType,
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
