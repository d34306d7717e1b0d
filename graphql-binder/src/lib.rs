//! Binds a GraphQL schema document to application code.
//!
//! Every field of every reachable object type is matched to a method of a handler group or
//! of the data type backing the object, and gets a [`FieldInvoker`](invoker::FieldInvoker)
//! that turns request arguments into that method's parameters. Handler groups and data types
//! publish their methods through static [`MethodTable`]s.
//!
//! ```ignore
//! let schema = SchemaBuilder::parse(sdl)?
//!     .handler_group(QueryHandlers::default())
//!     .data_type::<User>()
//!     .build()?;
//! let result = schema.resolve_object("Query", None, &[FieldSelection::new("me")], Default::default());
//! ```

#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod binding;
pub mod configuration;
mod display_helpers;
pub mod error;
pub mod execution;
pub mod invoker;
pub mod method;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod runtime;
pub mod scalars;
pub mod schema;

pub use crate::binding::HandlerGroup;
pub use crate::binding::MutationRoot;
pub use crate::binding::QueryRoot;
pub use crate::binding::Resolver;
pub use crate::configuration::Dictionary;
pub use crate::configuration::Options;
pub use crate::error::BuildError;
pub use crate::error::FieldError;
pub use crate::error::GraphQLError;
pub use crate::execution::FieldSelection;
pub use crate::execution::ObjectResult;
pub use crate::method::Arguments;
pub use crate::method::MethodTable;
pub use crate::method::Methods;
pub use crate::method::ParamType;
pub use crate::method::ReturnType;
pub use crate::request::FieldValue;
pub use crate::request::RequestContext;
pub use crate::runtime::Object;
pub use crate::runtime::RuntimeType;
pub use crate::scalars::CustomScalar;
pub use crate::scalars::ScalarKind;
pub use crate::scalars::ScalarLibrary;
pub use crate::schema::Schema;
pub use crate::schema::SchemaBuilder;

const _: () = {
    const fn assert_thread_safe<T: Sync + Send>() {}

    assert_thread_safe::<Schema>();
    assert_thread_safe::<registry::TypeRegistry>();
    assert_thread_safe::<invoker::FieldInvoker>();
};
