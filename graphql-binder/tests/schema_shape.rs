use graphql_binder::FieldValue;
use graphql_binder::MethodTable;
use graphql_binder::Methods;
use graphql_binder::ParamType;
use graphql_binder::QueryRoot;
use graphql_binder::Resolver;
use graphql_binder::ReturnType;
use graphql_binder::RuntimeType;
use graphql_binder::ScalarKind;
use graphql_binder::SchemaBuilder;
use graphql_binder::schema::NamedType;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::fixtures;
use crate::fixtures::Filter;
use crate::fixtures::Role;

#[test]
fn roots_and_members() {
    let schema = fixtures::schema();
    assert_eq!(schema.query_type().name.as_str(), "Query");
    assert_eq!(
        schema
            .mutation_type()
            .map(|mutation| mutation.name.as_str()),
        Some("Mutation")
    );
    assert!(schema.query_type().runtime_type.is_none());

    let Some(NamedType::Union(search_result)) = schema.get("SearchResult") else {
        panic!("SearchResult should be a union");
    };
    let members: Vec<_> = search_result
        .members
        .iter()
        .map(|member| member.name.as_str())
        .collect();
    assert_eq!(members, ["User", "Post"]);

    let Some(NamedType::Interface(node)) = schema.get("Node") else {
        panic!("Node should be an interface");
    };
    let implementors: Vec<_> = node
        .implementors
        .iter()
        .map(|implementor| {
            let named = schema.type_of(implementor.handle).map(NamedType::name);
            (implementor.name.as_str(), named.map(|name| name.as_str()))
        })
        .collect();
    assert_eq!(
        implementors,
        [("User", Some("User")), ("Post", Some("Post"))]
    );

    let Some(user) = schema.get_object("User") else {
        panic!("User should be an object type");
    };
    let implements: Vec<_> = user
        .implements
        .iter()
        .map(|node| node.name.as_str())
        .collect();
    assert_eq!(implements, ["Node"]);
}

#[test]
fn handles_from_another_schema_resolve_to_nothing() {
    let schema = fixtures::schema();
    let small = SchemaBuilder::parse("type Query { me: Member } type Member { id: ID }")
        .map(|builder| {
            builder.handler_group(Directory).data_type::<Member>()
        })
        .and_then(SchemaBuilder::build)
        .unwrap_or_else(|error| panic!("{error}"));

    // scalars come last, so `ID` has a handle past every type of the small schema
    let Some(id) = schema
        .field("Query", "user")
        .and_then(|field| field.arguments.first())
        .map(|argument| argument.ty.named().handle)
    else {
        panic!("Query.user should take an id");
    };
    assert!(
        schema
            .type_of(id)
            .is_some_and(|named| named.name().as_str() == "ID")
    );
    assert!(small.type_of(id).is_none());
}

#[test]
fn cyclic_references_resolve_to_the_same_type() {
    let schema = fixtures::schema();
    let author = schema
        .field("Post", "author")
        .map(|field| field.ty.named().handle);
    let me = schema
        .field("Query", "me")
        .map(|field| field.ty.named().handle);
    assert!(author.is_some());
    assert_eq!(author, me);
    assert_eq!(
        schema
            .field("User", "posts")
            .map(|field| field.ty.to_string()),
        Some("[Post!]!".to_string())
    );
}

#[test]
fn registered_types_keep_their_runtime_types() {
    let schema = fixtures::schema();
    let registered: Vec<_> = schema
        .registered_types()
        .iter()
        .map(|registered| registered.name().as_str())
        .collect();
    assert_eq!(registered, ["Filter", "User", "Role", "Post"]);

    let Some(NamedType::Enum(role)) = schema.get("Role") else {
        panic!("Role should be an enum");
    };
    assert_eq!(role.runtime_type, Some(RuntimeType::of::<Role>()));

    let Some(NamedType::InputObject(filter)) = schema.get("Filter") else {
        panic!("Filter should be an input object");
    };
    assert_eq!(filter.runtime_type, Some(RuntimeType::of::<Filter>()));
    assert_eq!(
        filter
            .fields
            .iter()
            .map(|field| field.default_value.clone())
            .collect::<Vec<_>>(),
        [None, Some(json!([]))]
    );
}

#[test]
fn deprecations_and_defaults_are_kept() {
    let schema = fixtures::schema();
    let Some(role) = schema.field("User", "role") else {
        panic!("User.role should exist");
    };
    assert_eq!(role.deprecation.as_deref(), Some("Use `admin`"));

    let Some(greeting) = schema.field("User", "greeting") else {
        panic!("User.greeting should exist");
    };
    assert_eq!(
        greeting.description.as_deref(),
        Some("Computed by the user handlers")
    );
    assert_eq!(greeting.arguments[0].default_value, Some(json!("Hello")));

    let Some(NamedType::Enum(role)) = schema.get("Role") else {
        panic!("Role should be an enum");
    };
    let deprecations: Vec<_> = role
        .values
        .iter()
        .map(|value| value.deprecation.as_deref())
        .collect();
    assert_eq!(deprecations, [None, Some("No longer supported")]);
}

struct Directory;
struct Member;

impl Methods for Directory {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("me", [], ReturnType::object::<Member>(), |_, _| {
                Ok(FieldValue::object(Member))
            })
            .method(
                "members",
                [ParamType::Scalar(ScalarKind::String)],
                ReturnType::list(ReturnType::object::<Member>()),
                |_, _| Ok(FieldValue::List(vec![FieldValue::object(Member)])),
            )
            .build()
    }
}

impl Resolver for Directory {
    type Data = QueryRoot;
}

impl Methods for Member {
    fn method_table() -> MethodTable {
        MethodTable::builder::<Self>()
            .method("id", [], ReturnType::Scalar(ScalarKind::Id), |_, _| {
                Ok("m1".into())
            })
            .method("role", [], ReturnType::Structural, |_, _| {
                Ok("ADMIN".into())
            })
            .build()
    }
}

#[test]
fn schema_display() {
    let schema = SchemaBuilder::parse(
        r#"
        type Query {
          "The signed-in member"
          me: Member!
          members(role: Role = MEMBER): [Member!]!
        }

        type Member {
          id: ID!
          role: Role @deprecated(reason: "Use `admin`")
        }

        enum Role {
          ADMIN
          MEMBER @deprecated
        }
        "#,
    )
    .map(|builder| {
        builder.handler_group(Directory).data_type::<Member>()
    })
    .and_then(SchemaBuilder::build)
    .unwrap_or_else(|error| panic!("{error}"));

    assert_snapshot!(schema.to_string(), @r###"
    type Query {
      """The signed-in member"""
      me: Member!
      members(role: Role = MEMBER): [Member!]!
    }

    type Member {
      id: ID!
      role: Role @deprecated(reason: "Use `admin`")
    }

    enum Role {
      ADMIN
      MEMBER @deprecated(reason: "No longer supported")
    }

    scalar Int

    scalar Float

    scalar String

    scalar Boolean

    scalar ID
    "###);
}
